//! Access tokens for the HTTP boundary.

pub mod maker;
pub mod payload;

pub use maker::{JwtMaker, MIN_SECRET_SIZE, TokenMaker};
pub use payload::Payload;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
    #[error("secret key must be at least {} bytes", MIN_SECRET_SIZE)]
    SecretTooShort,
}
