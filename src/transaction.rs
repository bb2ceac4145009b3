use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// Service family a transaction belongs to. Serialized in snake_case to
/// match the persisted history format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    MobileRecharge,
    BillPayment,
    CcToBank,
    Wallet,
}

impl TransactionKind {
    /// Category label used when the caller does not supply one.
    pub fn default_category(&self) -> &'static str {
        match self {
            TransactionKind::MobileRecharge => "Recharge",
            TransactionKind::BillPayment => "Bills",
            TransactionKind::CcToBank => "Transfer",
            TransactionKind::Wallet => "Wallet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Pending,
    Failed,
}

/// Named icons the presentation layer knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Smartphone,
    Lightbulb,
    Flame,
    Droplet,
    Tv,
    CreditCard,
    Receipt,
    Wallet,
}

/// Icon reference carried on a transaction. Resolved by the presentation
/// layer; never persisted, always re-derived from `(kind, category)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionIcon {
    Named(IconKind),
    Asset(String),
}

impl Default for TransactionIcon {
    fn default() -> Self {
        TransactionIcon::Named(IconKind::Wallet)
    }
}

impl TransactionIcon {
    /// Deterministic icon for a transaction kind and category label.
    pub fn derive(kind: TransactionKind, category: &str) -> Self {
        let named = match kind {
            TransactionKind::MobileRecharge => IconKind::Smartphone,
            TransactionKind::CcToBank => IconKind::CreditCard,
            TransactionKind::Wallet => IconKind::Wallet,
            TransactionKind::BillPayment => {
                let category = category.to_ascii_lowercase();
                if category.contains("electric") {
                    IconKind::Lightbulb
                } else if category.contains("gas") {
                    IconKind::Flame
                } else if category.contains("water") {
                    IconKind::Droplet
                } else if category.contains("dth") || category.contains("tv") {
                    IconKind::Tv
                } else {
                    IconKind::Receipt
                }
            }
        };
        TransactionIcon::Named(named)
    }
}

/// A single ledger entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Payee or service label.
    pub name: String,
    /// Signed display string, e.g. `"+₹100"` or `"-₹250"`.
    pub amount: String,
    /// Local clock time at creation, e.g. `"04:25 PM"`.
    pub time: String,
    /// Local clock date at creation, e.g. `"23 Aug 2026"`.
    pub date: String,
    pub status: TransactionStatus,
    pub reference_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub is_credit: bool,
    #[serde(skip)]
    pub icon: TransactionIcon,
}

impl Transaction {
    pub fn new(
        name: impl Into<String>,
        amount: Amount,
        is_credit: bool,
        status: TransactionStatus,
        kind: TransactionKind,
        category: impl Into<String>,
    ) -> Self {
        let now = Local::now();
        let category = category.into();
        Self {
            id: generate_id("TXN"),
            name: name.into(),
            amount: amount.signed_display(is_credit),
            time: now.format("%I:%M %p").to_string(),
            date: now.format("%d %b %Y").to_string(),
            status,
            reference_id: generate_id("REF"),
            kind,
            icon: TransactionIcon::derive(kind, &category),
            category,
            is_credit,
        }
    }

    /// Restore the icon after deserialization; it is never persisted.
    pub fn rederive_icon(&mut self) {
        self.icon = TransactionIcon::derive(self.kind, &self.category);
    }
}

fn generate_id(prefix: &str) -> String {
    let millis = Local::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{}{}{:04}", prefix, millis, suffix)
}
