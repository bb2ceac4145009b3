use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::Amount;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PayError {
    // Ledger errors
    InsufficientFunds { required: Amount, available: Amount },
    InvalidAmount(String),

    // Validation errors
    ValidationError(String),

    // Session errors
    LockStateError(String),

    // Storage errors
    StorageError(String),
    FileNotFound(String),

    // Application errors
    NotFound(String),

    // Generic errors
    Unknown(String),
}

impl fmt::Display for PayError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PayError::InsufficientFunds {
                required,
                available,
            } => write!(
                f,
                "Insufficient balance: required {}, available {}",
                required, available
            ),
            PayError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),

            PayError::ValidationError(msg) => write!(f, "Validation error: {}", msg),

            PayError::LockStateError(msg) => write!(f, "App lock error: {}", msg),

            PayError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            PayError::FileNotFound(msg) => write!(f, "File not found: {}", msg),

            PayError::NotFound(msg) => write!(f, "Not found: {}", msg),

            PayError::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl std::error::Error for PayError {}

pub type PayResult<T> = Result<T, PayError>;

// Conversion helpers
impl From<std::io::Error> for PayError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => PayError::FileNotFound(error.to_string()),
            _ => PayError::StorageError(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for PayError {
    fn from(error: serde_json::Error) -> Self {
        PayError::ValidationError(format!("JSON error: {}", error))
    }
}
