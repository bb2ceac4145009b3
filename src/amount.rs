//! Fixed-point money for the TFC Pay ledger.
//!
//! Amounts are stored as non-negative paise (1 rupee = 100 paise) to avoid
//! the floating-point drift a running balance would otherwise accumulate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{PayError, PayResult};

/// An amount of money in Indian rupees, held as paise.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount {
    paise: u64,
}

impl Amount {
    /// Paise per rupee.
    pub const PAISE_PER_RUPEE: u64 = 100;
    /// Maximum representable amount (1 trillion rupees).
    pub const MAX_RUPEES: u64 = 1_000_000_000_000;

    pub const ZERO: Amount = Amount { paise: 0 };

    /// Create an amount from raw paise.
    pub fn from_paise(paise: u64) -> PayResult<Self> {
        if paise > Self::MAX_RUPEES * Self::PAISE_PER_RUPEE {
            return Err(PayError::InvalidAmount("Amount too large".to_string()));
        }
        Ok(Amount { paise })
    }

    /// Create an amount from whole rupees.
    pub fn from_rupees(rupees: u64) -> PayResult<Self> {
        let paise = rupees
            .checked_mul(Self::PAISE_PER_RUPEE)
            .ok_or_else(|| PayError::InvalidAmount("Amount calculation overflow".to_string()))?;
        Self::from_paise(paise)
    }

    /// Parse an amount from decimal notation, e.g. `"250"` or `"99.50"`.
    /// At most two decimal places are accepted; negatives are rejected.
    pub fn parse(amount_str: &str) -> PayResult<Self> {
        if amount_str.is_empty() {
            return Err(PayError::InvalidAmount(
                "Amount cannot be empty".to_string(),
            ));
        }

        let parts: Vec<&str> = amount_str.split('.').collect();
        if parts.len() > 2 {
            return Err(PayError::InvalidAmount(
                "Invalid decimal format".to_string(),
            ));
        }

        let whole: u64 = parts[0]
            .parse()
            .map_err(|_| PayError::InvalidAmount("Invalid number format".to_string()))?;

        let fractional_paise = if parts.len() == 2 {
            let fractional_str = parts[1];
            if fractional_str.is_empty() || fractional_str.len() > 2 {
                return Err(PayError::InvalidAmount(
                    "Too many decimal places".to_string(),
                ));
            }
            let padded = format!("{:0<2}", fractional_str);
            padded
                .parse::<u64>()
                .map_err(|_| PayError::InvalidAmount("Invalid fractional part".to_string()))?
        } else {
            0
        };

        let paise = whole
            .checked_mul(Self::PAISE_PER_RUPEE)
            .and_then(|w| w.checked_add(fractional_paise))
            .ok_or_else(|| PayError::InvalidAmount("Amount overflow".to_string()))?;

        Self::from_paise(paise)
    }

    /// Raw paise.
    pub fn paise(&self) -> u64 {
        self.paise
    }

    /// Whole-rupee part.
    pub fn rupees(&self) -> u64 {
        self.paise / Self::PAISE_PER_RUPEE
    }

    /// Fractional paise part (0..=99).
    pub fn paise_part(&self) -> u64 {
        self.paise % Self::PAISE_PER_RUPEE
    }

    pub fn is_zero(&self) -> bool {
        self.paise == 0
    }

    /// Canonical decimal string: `"1250"` or `"99.50"`.
    pub fn as_string(&self) -> String {
        if self.paise_part() == 0 {
            self.rupees().to_string()
        } else {
            format!("{}.{:02}", self.rupees(), self.paise_part())
        }
    }

    /// Signed display string used on transaction records, e.g. `"+₹100"`.
    pub fn signed_display(&self, is_credit: bool) -> String {
        let sign = if is_credit { '+' } else { '-' };
        format!("{}₹{}", sign, self.as_string())
    }

    /// Display string with Indian digit grouping, e.g. `"₹12,34,567.50"`.
    pub fn display_grouped(&self) -> String {
        let grouped = indian_grouping(self.rupees());
        if self.paise_part() == 0 {
            format!("₹{}", grouped)
        } else {
            format!("₹{}.{:02}", grouped, self.paise_part())
        }
    }

    pub fn checked_add(&self, other: Amount) -> PayResult<Amount> {
        let sum = self
            .paise
            .checked_add(other.paise)
            .ok_or_else(|| PayError::InvalidAmount("Amount overflow in addition".to_string()))?;
        Amount::from_paise(sum)
    }

    /// Subtract, failing with `InsufficientFunds` if `other` exceeds `self`.
    pub fn checked_sub(&self, other: Amount) -> PayResult<Amount> {
        if other.paise > self.paise {
            return Err(PayError::InsufficientFunds {
                required: other,
                available: *self,
            });
        }
        Amount::from_paise(self.paise - other.paise)
    }

    /// Amount in words using Indian numbering (crore/lakh/thousand/hundred).
    pub fn in_words(&self) -> String {
        let rupee_words = integer_words(self.rupees());
        if self.paise_part() == 0 {
            format!("Rupees {} Only", rupee_words)
        } else {
            format!(
                "Rupees {} and {} Paise Only",
                rupee_words,
                two_digit_words(self.paise_part())
            )
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_grouped())
    }
}

impl FromStr for Amount {
    type Err = PayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

/// Render an amount as Indian-numbering words, e.g.
/// `"Rupees One Thousand Two Hundred and Fifty Only"`.
pub fn amount_in_words(amount: Amount) -> String {
    amount.in_words()
}

const ONES: [&str; 20] = [
    "Zero",
    "One",
    "Two",
    "Three",
    "Four",
    "Five",
    "Six",
    "Seven",
    "Eight",
    "Nine",
    "Ten",
    "Eleven",
    "Twelve",
    "Thirteen",
    "Fourteen",
    "Fifteen",
    "Sixteen",
    "Seventeen",
    "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "Ten", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

fn two_digit_words(n: u64) -> String {
    debug_assert!(n < 100);
    if n < 20 {
        ONES[n as usize].to_string()
    } else if n % 10 == 0 {
        TENS[(n / 10) as usize].to_string()
    } else {
        format!("{} {}", TENS[(n / 10) as usize], ONES[(n % 10) as usize])
    }
}

fn integer_words(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut parts: Vec<String> = Vec::new();

    let crore = n / 1_00_00_000;
    if crore > 0 {
        parts.push(format!("{} Crore", integer_words(crore)));
    }
    let lakh = (n / 1_00_000) % 100;
    if lakh > 0 {
        parts.push(format!("{} Lakh", two_digit_words(lakh)));
    }
    let thousand = (n / 1_000) % 100;
    if thousand > 0 {
        parts.push(format!("{} Thousand", two_digit_words(thousand)));
    }
    let hundred = (n / 100) % 10;
    if hundred > 0 {
        parts.push(format!("{} Hundred", ONES[hundred as usize]));
    }
    let tail = n % 100;
    if tail > 0 {
        let words = two_digit_words(tail);
        if parts.is_empty() {
            parts.push(words);
        } else {
            parts.push(format!("and {}", words));
        }
    }

    parts.join(" ")
}

fn indian_grouping(whole: u64) -> String {
    let digits = whole.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<String> = Vec::new();
    let head_bytes = head.as_bytes();
    let mut idx = head_bytes.len();
    while idx > 0 {
        let start = idx.saturating_sub(2);
        groups.push(head[start..idx].to_string());
        idx = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}
