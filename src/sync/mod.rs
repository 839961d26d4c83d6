//! The adapter between the ledger and the remote persistence service.
//!
//! [RemoteSync] describes the four operations the ledger needs from the persistence service.
//! Implementations normalise every failure into a [SyncError] whose message can be shown to the
//! user as is.

mod http;

use std::future::Future;

pub use http::HttpSync;

use crate::transaction::{Transaction, TransactionDraft, TransactionId};

/// The remote operations performed on behalf of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    /// List every transaction.
    FetchAll,
    /// Save a new transaction.
    Create,
    /// Delete a single transaction.
    Delete,
    /// Delete every transaction.
    Clear,
}

impl SyncOperation {
    /// The message reported when the service does not explain why `self` failed.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            SyncOperation::FetchAll => "Failed to fetch transactions",
            SyncOperation::Create => "Failed to add transaction",
            SyncOperation::Delete => "Failed to delete transaction",
            SyncOperation::Clear => "Failed to clear transactions",
        }
    }
}

/// A remote call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SyncError {
    /// A human-readable description of the failure.
    pub message: String,
}

impl SyncError {
    /// Create an error with the message reported by the persistence service.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Create an error with the generic message for `operation`.
    pub fn fallback(operation: SyncOperation) -> Self {
        Self::new(operation.fallback_message())
    }
}

/// Performs ledger mutations against the remote persistence service.
///
/// Every method makes exactly one attempt; retrying is up to the caller.
pub trait RemoteSync: Send + Sync {
    /// Get every stored transaction in order.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Transaction>, SyncError>> + Send;

    /// Save `draft`, returning the stored transaction with its authoritative ID.
    fn create(
        &self,
        draft: &TransactionDraft,
    ) -> impl Future<Output = Result<Transaction, SyncError>> + Send;

    /// Delete the transaction with `id`.
    fn delete_by_id(
        &self,
        id: &TransactionId,
    ) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Delete every stored transaction.
    fn clear_all(&self) -> impl Future<Output = Result<(), SyncError>> + Send;
}
