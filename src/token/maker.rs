//! Access token creation and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TokenError;
use super::payload::Payload;

/// Minimum secret length in bytes for symmetric signing.
pub const MIN_SECRET_SIZE: usize = 32;

/// Capability interface for token management, so the signing scheme can be
/// swapped without touching the HTTP boundary.
pub trait TokenMaker: Send + Sync {
    /// Create a token for `username` valid for `duration`, returning the
    /// signed token and the payload embedded in it.
    fn create_token(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<(String, Payload), TokenError>;

    /// Verify a token and return its payload.
    fn verify_token(&self, token: &str) -> Result<Payload, TokenError>;
}

/// JWT claims mirroring [`Payload`], using the registered claim names so
/// jsonwebtoken's own expiry validation applies.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    jti: Uuid,
    sub: String,
    iat: i64,
    exp: i64,
}

impl From<&Payload> for Claims {
    fn from(payload: &Payload) -> Self {
        Self {
            jti: payload.id,
            sub: payload.username.clone(),
            iat: payload.issued_at.timestamp(),
            exp: payload.expired_at.timestamp(),
        }
    }
}

impl TryFrom<Claims> for Payload {
    type Error = TokenError;

    fn try_from(claims: Claims) -> Result<Self, TokenError> {
        let issued_at = DateTime::<Utc>::from_timestamp(claims.iat, 0).ok_or(TokenError::Invalid)?;
        let expired_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(TokenError::Invalid)?;
        Ok(Payload {
            id: claims.jti,
            username: claims.sub,
            issued_at,
            expired_at,
        })
    }
}

/// HMAC-SHA256 JWT maker.
pub struct JwtMaker {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtMaker {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_SIZE {
            return Err(TokenError::SecretTooShort);
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }
}

impl TokenMaker for JwtMaker {
    fn create_token(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<(String, Payload), TokenError> {
        let payload = Payload::new(username, duration);
        let token = encode(&Header::default(), &Claims::from(&payload), &self.encoding_key)
            .map_err(|_| TokenError::Invalid)?;
        Ok((token, payload))
    }

    fn verify_token(&self, token: &str) -> Result<Payload, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        let payload = Payload::try_from(data.claims)?;
        payload.verify()?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maker() -> JwtMaker {
        JwtMaker::new(&"s".repeat(MIN_SECRET_SIZE)).unwrap()
    }

    #[test]
    fn round_trip_preserves_the_payload() {
        let maker = maker();
        let (token, created) = maker.create_token("alice", Duration::minutes(15)).unwrap();

        let verified = maker.verify_token(&token).unwrap();
        assert_eq!(verified.id, created.id);
        assert_eq!(verified.username, "alice");
        assert_eq!(
            verified.issued_at.timestamp(),
            created.issued_at.timestamp()
        );
        assert_eq!(
            verified.expired_at.timestamp(),
            created.expired_at.timestamp()
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let maker = maker();
        let (token, _) = maker.create_token("alice", Duration::minutes(-2)).unwrap();
        assert_eq!(maker.verify_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let maker = maker();
        let (token, _) = maker.create_token("alice", Duration::minutes(15)).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert_eq!(maker.verify_token(&tampered), Err(TokenError::Invalid));
    }

    #[test]
    fn token_from_a_different_secret_is_rejected() {
        let maker = maker();
        let other = JwtMaker::new(&"t".repeat(MIN_SECRET_SIZE)).unwrap();
        let (token, _) = other.create_token("alice", Duration::minutes(15)).unwrap();
        assert_eq!(maker.verify_token(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(matches!(
            JwtMaker::new("too-short"),
            Err(TokenError::SecretTooShort)
        ));
    }
}
