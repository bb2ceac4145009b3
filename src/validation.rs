use once_cell::sync::Lazy;
use regex::Regex;

use crate::amount::Amount;
use crate::errors::{PayError, PayResult};
use crate::session::IdentifierKind;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

// Indian mobile numbers: ten digits starting 6-9.
static MOBILE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[6-9]\d{9}$").unwrap());

static USER_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.]{3,30}$").unwrap());

static PIN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

/// Validate a login identifier against its declared kind.
pub fn validate_identifier(identifier: &str, kind: IdentifierKind) -> PayResult<()> {
    if identifier.is_empty() {
        return Err(PayError::ValidationError(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if identifier.len() > 100 {
        return Err(PayError::ValidationError("Identifier too long".to_string()));
    }

    let (pattern, label) = match kind {
        IdentifierKind::Email => (&*EMAIL_PATTERN, "email address"),
        IdentifierKind::Mobile => (&*MOBILE_PATTERN, "mobile number"),
        IdentifierKind::UserId => (&*USER_ID_PATTERN, "user id"),
    };

    if !pattern.is_match(identifier) {
        return Err(PayError::ValidationError(format!(
            "Not a valid {}",
            label
        )));
    }

    Ok(())
}

/// Validate a PIN: exactly four ASCII digits.
pub fn validate_pin(pin: &str) -> PayResult<()> {
    if !PIN_PATTERN.is_match(pin) {
        return Err(PayError::ValidationError(
            "PIN must be exactly 4 digits".to_string(),
        ));
    }
    Ok(())
}

/// Validate an amount entering the ledger: it must be positive.
pub fn validate_payment_amount(amount: Amount) -> PayResult<()> {
    if amount.is_zero() {
        return Err(PayError::InvalidAmount(
            "Amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Validate a payee/service label.
pub fn validate_label(label: &str) -> PayResult<()> {
    if label.trim().is_empty() {
        return Err(PayError::ValidationError(
            "Label cannot be empty".to_string(),
        ));
    }

    if label.len() > 80 {
        return Err(PayError::ValidationError("Label too long".to_string()));
    }

    Ok(())
}
