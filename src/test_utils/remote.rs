use std::sync::{Arc, Mutex, MutexGuard};

use time::OffsetDateTime;
use tokio::sync::Notify;

use crate::{
    sync::{RemoteSync, SyncError, SyncOperation},
    transaction::{Transaction, TransactionDraft, TransactionId},
};

/// An in-memory stand-in for the persistence service.
///
/// Every call yields to the runtime once before answering, so concurrent callers get a chance to
/// interleave the way they would against the real service.
#[derive(Debug, Default)]
pub(crate) struct FakeRemote {
    state: Mutex<FakeState>,
    create_gate: Option<Arc<Notify>>,
}

#[derive(Debug, Default)]
struct FakeState {
    transactions: Vec<Transaction>,
    next_id: u64,
    assigned_id: Option<TransactionId>,
    failing: Vec<SyncOperation>,
    failing_deletes: Vec<TransactionId>,
    calls: Vec<SyncOperation>,
}

impl FakeRemote {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_transactions(transactions: Vec<Transaction>) -> Self {
        let remote = Self::default();
        remote.lock().transactions = transactions;
        remote
    }

    /// Make `create` wait for `gate` to be notified before storing anything.
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.create_gate = Some(gate);
        self
    }

    /// Fail every call of `operation` until [FakeRemote::recover] is called.
    pub(crate) fn fail(&self, operation: SyncOperation) {
        self.lock().failing.push(operation);
    }

    pub(crate) fn recover(&self, operation: SyncOperation) {
        self.lock().failing.retain(|failing| *failing != operation);
    }

    /// Fail deletes of `id` only.
    pub(crate) fn fail_delete_of(&self, id: TransactionId) {
        self.lock().failing_deletes.push(id);
    }

    /// Give the next created transaction `id` instead of a fresh one.
    pub(crate) fn assign_next_id(&self, id: TransactionId) {
        self.lock().assigned_id = Some(id);
    }

    pub(crate) fn calls(&self) -> Vec<SyncOperation> {
        self.lock().calls.clone()
    }

    pub(crate) fn stored(&self) -> Vec<Transaction> {
        self.lock().transactions.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake remote lock poisoned")
    }

    fn begin_call(&self, operation: SyncOperation) -> Result<(), SyncError> {
        let mut state = self.lock();
        state.calls.push(operation);

        if state.failing.contains(&operation) {
            Err(SyncError::new("service unavailable"))
        } else {
            Ok(())
        }
    }
}

impl RemoteSync for FakeRemote {
    async fn fetch_all(&self) -> Result<Vec<Transaction>, SyncError> {
        tokio::task::yield_now().await;
        self.begin_call(SyncOperation::FetchAll)?;

        Ok(self.stored())
    }

    async fn create(&self, draft: &TransactionDraft) -> Result<Transaction, SyncError> {
        if let Some(gate) = &self.create_gate {
            gate.notified().await;
        }
        tokio::task::yield_now().await;
        self.begin_call(SyncOperation::Create)?;

        let mut state = self.lock();
        let id = match state.assigned_id.take() {
            Some(id) => id,
            None => {
                state.next_id += 1;
                TransactionId::new(format!("remote-{}", state.next_id))
            }
        };
        let transaction = draft.clone().into_transaction(id, OffsetDateTime::now_utc());
        state.transactions.push(transaction.clone());

        Ok(transaction)
    }

    async fn delete_by_id(&self, id: &TransactionId) -> Result<(), SyncError> {
        tokio::task::yield_now().await;
        self.begin_call(SyncOperation::Delete)?;

        let mut state = self.lock();
        if state.failing_deletes.contains(id) {
            return Err(SyncError::new("service unavailable"));
        }

        state.transactions.retain(|transaction| &transaction.id != id);

        Ok(())
    }

    async fn clear_all(&self) -> Result<(), SyncError> {
        tokio::task::yield_now().await;
        self.begin_call(SyncOperation::Clear)?;

        self.lock().transactions.clear();

        Ok(())
    }
}
