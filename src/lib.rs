// lib.rs - Core library structure for the TFC Pay wallet

pub mod amount;
pub mod context;
pub mod errors;
pub mod ledger;
pub mod session;
pub mod storage;
pub mod transaction;
pub mod validation;

// Re-export common types
pub use amount::{amount_in_words, Amount};
pub use context::{PayContext, SharedPayContext};
pub use errors::{PayError, PayResult};
pub use ledger::WalletLedger;
pub use session::{IdentifierKind, SessionManager, User};
pub use storage::{keys, FileStore, KvStore, MemoryStore};
pub use transaction::{
    IconKind, Transaction, TransactionIcon, TransactionKind, TransactionStatus,
};
