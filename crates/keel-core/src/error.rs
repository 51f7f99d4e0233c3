//! Error types for the Keel core library

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    #[error("Base58 error: {0}")]
    Base58(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Unsupported key type byte: {0:#04x}")]
    UnsupportedKeyType(u8),
}
