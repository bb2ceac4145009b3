use std::path::PathBuf;
use std::sync::Arc;
use std::sync::RwLock;

use crate::errors::{PayError, PayResult};
use crate::ledger::WalletLedger;
use crate::session::SessionManager;
use crate::storage::{FileStore, KvStore, MemoryStore};

/// Wires the storage tiers, the session manager, and the ledger together.
#[derive(Debug)]
pub struct PayContext {
    durable: Arc<dyn KvStore>,
    ephemeral: Arc<dyn KvStore>,
    session: SessionManager,
    ledger: WalletLedger,
}

impl PayContext {
    /// Default store file name under the data root.
    pub const STORE_FILENAME: &'static str = "tfc_pay.store";

    /// Build a context with a file-backed durable tier under `root_dir` and
    /// a fresh in-memory ephemeral tier, restoring any prior state.
    pub fn initialize(root_dir: PathBuf) -> PayResult<Self> {
        std::fs::create_dir_all(&root_dir)?;
        let durable: Arc<dyn KvStore> =
            Arc::new(FileStore::open(root_dir.join(Self::STORE_FILENAME)));
        let ephemeral: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        Ok(Self::with_stores(durable, ephemeral))
    }

    /// Build a context over injected stores (tests use in-memory fakes for
    /// both tiers).
    pub fn with_stores(durable: Arc<dyn KvStore>, ephemeral: Arc<dyn KvStore>) -> Self {
        let session = SessionManager::new(Arc::clone(&durable), Arc::clone(&ephemeral));
        let ledger = WalletLedger::new(Arc::clone(&durable));
        Self {
            durable,
            ephemeral,
            session,
            ledger,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn ledger(&self) -> &WalletLedger {
        &self.ledger
    }

    pub fn durable_store(&self) -> &Arc<dyn KvStore> {
        &self.durable
    }

    pub fn ephemeral_store(&self) -> &Arc<dyn KvStore> {
        &self.ephemeral
    }
}

/// Shared context handed to the UI shell.
#[derive(Clone)]
pub struct SharedPayContext(pub Arc<RwLock<PayContext>>);

impl SharedPayContext {
    pub fn new(inner: PayContext) -> Self {
        Self(Arc::new(RwLock::new(inner)))
    }

    pub fn read<F, T>(&self, op: F) -> PayResult<T>
    where
        F: FnOnce(&PayContext) -> PayResult<T>,
    {
        let guard = self
            .0
            .read()
            .map_err(|_| PayError::Unknown("Poisoned pay context".into()))?;
        op(&guard)
    }

    pub fn write<F, T>(&self, op: F) -> PayResult<T>
    where
        F: FnOnce(&mut PayContext) -> PayResult<T>,
    {
        let mut guard = self
            .0
            .write()
            .map_err(|_| PayError::Unknown("Poisoned pay context".into()))?;
        op(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::session::IdentifierKind;
    use crate::transaction::TransactionKind;

    #[test]
    fn with_stores_wires_session_and_ledger_to_same_durable_tier() {
        let durable: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let ephemeral: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let context = PayContext::with_stores(Arc::clone(&durable), ephemeral);

        context
            .session()
            .login("9999999999", IdentifierKind::Mobile, true)
            .unwrap();
        context
            .ledger()
            .add_money(Amount::from_rupees(100).unwrap())
            .unwrap();

        assert!(durable.get(crate::storage::keys::AUTH).is_some());
        assert!(durable.get(crate::storage::keys::WALLET_BALANCE).is_some());
    }

    #[test]
    fn shared_context_closure_access() {
        let durable: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let ephemeral: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let shared = SharedPayContext::new(PayContext::with_stores(durable, ephemeral));

        shared
            .write(|context| {
                context
                    .ledger()
                    .add_money(Amount::from_rupees(50).unwrap())?;
                context.ledger().process_payment(
                    Amount::from_rupees(20).unwrap(),
                    "Metro Card",
                    TransactionKind::BillPayment,
                    None,
                )?;
                Ok(())
            })
            .unwrap();

        let balance = shared.read(|context| Ok(context.ledger().balance())).unwrap();
        assert_eq!(balance, Amount::from_rupees(30).unwrap());
    }
}
