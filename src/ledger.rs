use std::sync::Arc;

use parking_lot::RwLock;

use crate::amount::Amount;
use crate::errors::PayResult;
use crate::storage::{keys, KvStore};
use crate::transaction::{Transaction, TransactionKind, TransactionStatus};
use crate::validation;

#[derive(Debug, Default)]
struct LedgerState {
    balance: Amount,
    previous_balance: Amount,
    /// Newest first.
    transactions: Vec<Transaction>,
}

/// The wallet ledger: one balance, an append-only transaction history, and
/// the only two mutation entry points.
///
/// Debits are a single atomic step: the sufficiency check and the balance
/// mutation happen under one write lock, so two near-simultaneous payments
/// can never both pass the check against the same stale balance.
#[derive(Debug, Clone)]
pub struct WalletLedger {
    state: Arc<RwLock<LedgerState>>,
    store: Arc<dyn KvStore>,
}

impl WalletLedger {
    /// Build a ledger over the durable store, restoring any prior balance
    /// and history. Corrupt stored state falls back to an empty ledger and
    /// is logged, never silently swallowed.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let state = Self::restore(store.as_ref());
        Self {
            state: Arc::new(RwLock::new(state)),
            store,
        }
    }

    fn restore(store: &dyn KvStore) -> LedgerState {
        let balance = match store.get(keys::WALLET_BALANCE) {
            Some(raw) => match Amount::parse(&raw) {
                Ok(balance) => balance,
                Err(err) => {
                    log::warn!("stored balance {:?} is malformed ({}); resetting", raw, err);
                    Amount::ZERO
                }
            },
            None => Amount::ZERO,
        };

        let transactions = match store.get(keys::TRANSACTIONS) {
            Some(raw) => match serde_json::from_str::<Vec<Transaction>>(&raw) {
                Ok(mut transactions) => {
                    for transaction in &mut transactions {
                        transaction.rederive_icon();
                    }
                    transactions
                }
                Err(err) => {
                    log::warn!("stored history is malformed ({}); resetting", err);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        LedgerState {
            balance,
            previous_balance: balance,
            transactions,
        }
    }

    /// Credit the wallet. Every credit pairs with exactly one new
    /// transaction record.
    pub fn add_money(&self, amount: Amount) -> PayResult<Transaction> {
        validation::validate_payment_amount(amount)?;

        let mut state = self.state.write();
        let new_balance = state.balance.checked_add(amount)?;

        let transaction = Transaction::new(
            "Add Money",
            amount,
            true,
            TransactionStatus::Success,
            TransactionKind::Wallet,
            "Add Money",
        );
        let mut staged = state.transactions.clone();
        staged.insert(0, transaction.clone());

        // Commit to memory only once the store has accepted the new state,
        // so a storage error cannot leave a credit the store never saw.
        self.persist(new_balance, &staged)?;
        state.balance = new_balance;
        state.transactions = staged;

        log::info!("credited {}; balance {}", amount, state.balance);
        Ok(transaction)
    }

    /// Debit the wallet if funds suffice; the check and the mutation are one
    /// atomic step. Insufficient funds leave the ledger untouched and return
    /// `PayError::InsufficientFunds`.
    pub fn process_payment(
        &self,
        amount: Amount,
        service_name: &str,
        kind: TransactionKind,
        category: Option<&str>,
    ) -> PayResult<Transaction> {
        validation::validate_payment_amount(amount)?;
        validation::validate_label(service_name)?;

        let mut state = self.state.write();
        let new_balance = state.balance.checked_sub(amount)?;

        let category = category.unwrap_or_else(|| kind.default_category());
        let transaction = Transaction::new(
            service_name,
            amount,
            false,
            TransactionStatus::Success,
            kind,
            category,
        );
        let mut staged = state.transactions.clone();
        staged.insert(0, transaction.clone());

        // Same ordering as add_money: a failed persist must not debit the
        // in-memory balance, or a retry would debit twice.
        self.persist(new_balance, &staged)?;
        state.balance = new_balance;
        state.transactions = staged;

        log::info!(
            "debited {} for {:?}; balance {}",
            amount,
            service_name,
            state.balance
        );
        Ok(transaction)
    }

    /// Snapshot the current balance as the last "seen" one. Purely an
    /// anchor for the rolling-counter display, not a checkpoint.
    pub fn on_balance_seen(&self) {
        let mut state = self.state.write();
        state.previous_balance = state.balance;
    }

    pub fn balance(&self) -> Amount {
        self.state.read().balance
    }

    pub fn previous_balance(&self) -> Amount {
        self.state.read().previous_balance
    }

    /// Transaction history, newest first.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.read().transactions.clone()
    }

    fn persist(&self, balance: Amount, transactions: &[Transaction]) -> PayResult<()> {
        self.store
            .set(keys::WALLET_BALANCE, &balance.as_string())?;
        self.store
            .set(keys::TRANSACTIONS, &serde_json::to_string(transactions)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PayError;
    use crate::storage::MemoryStore;
    use crate::transaction::{IconKind, TransactionIcon};

    fn rupees(n: u64) -> Amount {
        Amount::from_rupees(n).unwrap()
    }

    fn ledger() -> (WalletLedger, Arc<dyn KvStore>) {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        (WalletLedger::new(Arc::clone(&store)), store)
    }

    #[test]
    fn starts_empty() {
        let (ledger, _) = ledger();
        assert_eq!(ledger.balance(), Amount::ZERO);
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn add_money_credits_and_records() {
        let (ledger, _) = ledger();
        let transaction = ledger.add_money(rupees(500)).unwrap();

        assert_eq!(ledger.balance(), rupees(500));
        assert_eq!(transaction.amount, "+₹500");
        assert!(transaction.is_credit);
        assert_eq!(transaction.category, "Add Money");
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[test]
    fn add_money_rejects_zero() {
        let (ledger, _) = ledger();
        assert!(matches!(
            ledger.add_money(Amount::ZERO),
            Err(PayError::InvalidAmount(_))
        ));
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn insufficient_funds_leaves_ledger_untouched() {
        let (ledger, _) = ledger();
        ledger.add_money(rupees(100)).unwrap();

        let err = ledger
            .process_payment(rupees(250), "Airtel Prepaid", TransactionKind::MobileRecharge, None)
            .unwrap_err();
        assert!(matches!(err, PayError::InsufficientFunds { .. }));
        assert_eq!(ledger.balance(), rupees(100));
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[test]
    fn exact_balance_payment_drains_to_zero() {
        let (ledger, _) = ledger();
        ledger.add_money(rupees(250)).unwrap();

        let transaction = ledger
            .process_payment(rupees(250), "Airtel Prepaid", TransactionKind::MobileRecharge, None)
            .unwrap();
        assert_eq!(ledger.balance(), Amount::ZERO);
        assert_eq!(transaction.amount, "-₹250");
        assert_eq!(transaction.category, "Recharge");
    }

    #[test]
    fn replay_conserves_balance() {
        let (ledger, _) = ledger();
        let mut expected: u64 = 0;
        let mut successes = 0;

        for (credit, amount) in [
            (true, 1_000),
            (false, 250),
            (false, 900), // fails: only 750 left
            (true, 500),
            (false, 1_249),
            (false, 1), // drains to zero
            (false, 1), // fails: empty
        ] {
            if credit {
                ledger.add_money(rupees(amount)).unwrap();
                expected += amount;
                successes += 1;
            } else {
                match ledger.process_payment(
                    rupees(amount),
                    "Test Merchant",
                    TransactionKind::BillPayment,
                    Some("Electricity"),
                ) {
                    Ok(_) => {
                        expected -= amount;
                        successes += 1;
                    }
                    Err(PayError::InsufficientFunds { .. }) => {}
                    Err(other) => panic!("unexpected error: {}", other),
                }
            }
        }

        assert_eq!(ledger.balance(), rupees(expected));
        // every successful mutation pairs 1:1 with a record
        assert_eq!(ledger.transactions().len(), successes);
    }

    #[test]
    fn history_is_newest_first() {
        let (ledger, _) = ledger();
        ledger.add_money(rupees(100)).unwrap();
        ledger
            .process_payment(rupees(40), "Tata Power", TransactionKind::BillPayment, Some("Electricity"))
            .unwrap();

        let transactions = ledger.transactions();
        assert_eq!(transactions[0].name, "Tata Power");
        assert_eq!(transactions[1].name, "Add Money");
    }

    #[test]
    fn on_balance_seen_snapshots_previous() {
        let (ledger, _) = ledger();
        ledger.add_money(rupees(300)).unwrap();
        assert_eq!(ledger.previous_balance(), Amount::ZERO);

        ledger.on_balance_seen();
        assert_eq!(ledger.previous_balance(), rupees(300));
    }

    #[test]
    fn state_round_trips_through_store() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let ledger = WalletLedger::new(Arc::clone(&store));
        ledger.add_money(rupees(1_000)).unwrap();
        ledger
            .process_payment(rupees(249), "Airtel Prepaid", TransactionKind::MobileRecharge, None)
            .unwrap();

        // Simulated reload over the same store.
        let reloaded = WalletLedger::new(Arc::clone(&store));
        assert_eq!(reloaded.balance(), rupees(751));

        let original = ledger.transactions();
        let restored = reloaded.transactions();
        assert_eq!(original, restored);
        assert_eq!(
            restored[0].icon,
            TransactionIcon::Named(IconKind::Smartphone)
        );
    }

    /// Store whose writes can be switched to fail, for error-path tests.
    #[derive(Debug, Default)]
    struct BrokenDiskStore {
        inner: MemoryStore,
        fail_writes: std::sync::atomic::AtomicBool,
    }

    impl BrokenDiskStore {
        fn break_writes(&self) {
            self.fail_writes
                .store(true, std::sync::atomic::Ordering::SeqCst);
        }

        fn writes_broken(&self) -> bool {
            self.fail_writes.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    impl KvStore for BrokenDiskStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> PayResult<()> {
            if self.writes_broken() {
                return Err(PayError::StorageError("disk full".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> PayResult<()> {
            if self.writes_broken() {
                return Err(PayError::StorageError("disk full".to_string()));
            }
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_persist_does_not_commit_debit() {
        let store = Arc::new(BrokenDiskStore::default());
        let ledger = WalletLedger::new(Arc::clone(&store) as Arc<dyn KvStore>);
        ledger.add_money(rupees(1_000)).unwrap();

        store.break_writes();
        let err = ledger
            .process_payment(rupees(400), "Airtel Prepaid", TransactionKind::MobileRecharge, None)
            .unwrap_err();
        assert!(matches!(err, PayError::StorageError(_)));

        // The reported failure must not leave a half-applied debit behind.
        assert_eq!(ledger.balance(), rupees(1_000));
        assert_eq!(ledger.transactions().len(), 1);
        assert_eq!(store.get(keys::WALLET_BALANCE).as_deref(), Some("1000"));
    }

    #[test]
    fn failed_persist_does_not_commit_credit() {
        let store = Arc::new(BrokenDiskStore::default());
        let ledger = WalletLedger::new(Arc::clone(&store) as Arc<dyn KvStore>);
        ledger.add_money(rupees(250)).unwrap();

        store.break_writes();
        assert!(ledger.add_money(rupees(100)).is_err());
        assert_eq!(ledger.balance(), rupees(250));
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[test]
    fn malformed_stored_state_resets() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        store.set(keys::WALLET_BALANCE, "12.3.4").unwrap();
        store.set(keys::TRANSACTIONS, "[{broken").unwrap();

        let ledger = WalletLedger::new(store);
        assert_eq!(ledger.balance(), Amount::ZERO);
        assert!(ledger.transactions().is_empty());
    }
}
