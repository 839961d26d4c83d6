//! The in-memory ledger of transactions.
//!
//! [LedgerStore] keeps the canonical, insertion-ordered list of transactions for a session.
//! It does no I/O and no validation; callers decide what goes in. Mutations that may need to be
//! undone take a [Checkpoint] with [LedgerStore::begin] and later either
//! [commit](LedgerStore::commit) or [rollback](LedgerStore::rollback) it.

use std::{ops::Deref, sync::Arc};

use crate::{
    Error,
    transaction::{Transaction, TransactionId, TransactionType},
};

/// An immutable, point-in-time copy of the ledger contents.
///
/// Cloning a snapshot is cheap and later changes to the ledger never show up in it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot(Arc<[Transaction]>);

impl Snapshot {
    /// The transactions in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.0
    }
}

impl Deref for Snapshot {
    type Target = [Transaction];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Transaction>> for Snapshot {
    fn from(transactions: Vec<Transaction>) -> Self {
        Self(transactions.into())
    }
}

/// The ledger state captured before a reversible mutation.
#[derive(Debug)]
#[must_use = "a checkpoint should be committed or rolled back"]
pub struct Checkpoint(Snapshot);

/// The ordered collection of transactions for one session.
#[derive(Debug, Default)]
pub struct LedgerStore {
    transactions: Vec<Transaction>,
}

impl LedgerStore {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire contents of the ledger.
    pub fn replace_all(&mut self, transactions: impl Into<Vec<Transaction>>) {
        self.transactions = transactions.into();
    }

    /// Add `transaction` to the end of the ledger.
    ///
    /// # Errors
    /// Returns [Error::DuplicateId] if a transaction with the same ID is already in the ledger.
    pub fn append(&mut self, transaction: Transaction) -> Result<(), Error> {
        if self.contains(&transaction.id) {
            return Err(Error::DuplicateId(transaction.id));
        }

        self.transactions.push(transaction);

        Ok(())
    }

    /// Remove the transaction with `id`, doing nothing if there is no such transaction.
    pub fn remove_by_id(&mut self, id: &TransactionId) {
        self.transactions.retain(|transaction| &transaction.id != id);
    }

    /// Take an independent copy of the current contents.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.transactions.as_slice().into())
    }

    /// The current contents in insertion order.
    pub fn all(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Whether a transaction with `id` is in the ledger.
    pub fn contains(&self, id: &TransactionId) -> bool {
        self.transactions
            .iter()
            .any(|transaction| &transaction.id == id)
    }

    /// Whether the ledger holds at least one income transaction.
    pub fn has_income(&self) -> bool {
        self.transactions
            .iter()
            .any(|transaction| transaction.transaction_type == TransactionType::Income)
    }

    /// The number of transactions in the ledger.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Capture the current contents so a following mutation can be undone.
    pub fn begin(&self) -> Checkpoint {
        Checkpoint(self.snapshot())
    }

    /// Keep the changes made since `checkpoint` was taken.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        let Checkpoint(_) = checkpoint;
    }

    /// Restore the contents captured by `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.replace_all(checkpoint.0.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::LedgerStore;
    use crate::{
        Error,
        transaction::{Transaction, TransactionId, TransactionType},
    };

    fn transaction(id: &str, transaction_type: TransactionType) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            title: format!("transaction {id}"),
            amount: 10.0,
            transaction_type,
            category: "Misc".to_owned(),
            date: datetime!(2025-06-01 12:00:00 UTC),
        }
    }

    fn ids(store: &LedgerStore) -> Vec<&str> {
        store.all().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn append_keeps_insertion_order() {
        let mut store = LedgerStore::new();

        for id in ["c", "a", "b"] {
            store
                .append(transaction(id, TransactionType::Income))
                .unwrap();
        }

        assert_eq!(ids(&store), vec!["c", "a", "b"]);
    }

    #[test]
    fn append_rejects_duplicate_id() {
        let mut store = LedgerStore::new();
        store
            .append(transaction("a", TransactionType::Income))
            .unwrap();

        let result = store.append(transaction("a", TransactionType::Expense));

        assert_eq!(result, Err(Error::DuplicateId(TransactionId::new("a"))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].transaction_type, TransactionType::Income);
    }

    #[test]
    fn remove_missing_id_is_a_no_op() {
        let mut store = LedgerStore::new();
        store
            .append(transaction("a", TransactionType::Income))
            .unwrap();
        let before = store.snapshot();

        store.remove_by_id(&TransactionId::new("missing"));
        store.remove_by_id(&TransactionId::new("missing"));

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn snapshot_is_independent_of_later_mutations() {
        let mut store = LedgerStore::new();
        store
            .append(transaction("a", TransactionType::Income))
            .unwrap();

        let snapshot = store.snapshot();
        store.remove_by_id(&TransactionId::new("a"));
        store
            .append(transaction("b", TransactionType::Expense))
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, TransactionId::new("a"));
    }

    #[test]
    fn rollback_restores_checkpoint() {
        let mut store = LedgerStore::new();
        store
            .append(transaction("a", TransactionType::Income))
            .unwrap();
        let before = store.snapshot();

        let checkpoint = store.begin();
        store.replace_all(Vec::new());
        assert!(store.is_empty());
        store.rollback(checkpoint);

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn commit_keeps_changes() {
        let mut store = LedgerStore::new();

        let checkpoint = store.begin();
        store
            .append(transaction("a", TransactionType::Income))
            .unwrap();
        store.commit(checkpoint);

        assert_eq!(ids(&store), vec!["a"]);
    }

    #[test]
    fn has_income_checks_types() {
        let mut store = LedgerStore::new();
        assert!(!store.has_income());

        store
            .append(transaction("a", TransactionType::Expense))
            .unwrap();
        assert!(!store.has_income());

        store
            .append(transaction("b", TransactionType::Income))
            .unwrap();
        assert!(store.has_income());
    }
}
