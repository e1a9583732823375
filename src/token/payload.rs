//! Token payload carried inside every access token.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TokenError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Unique token id, lets a token be revoked or traced individually.
    pub id: Uuid,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

impl Payload {
    pub fn new(username: impl Into<String>, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            issued_at: now,
            expired_at: now + duration,
        }
    }

    pub fn verify(&self) -> Result<(), TokenError> {
        if Utc::now() > self.expired_at {
            return Err(TokenError::Expired);
        }
        Ok(())
    }
}
