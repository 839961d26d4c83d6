//! Route handlers for the transaction collection of the persistence service.
//!
//! Successful responses carry JSON bodies, failures carry an [ErrorBody].

use std::sync::MutexGuard;

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    transaction::{
        TransactionDraft, TransactionId,
        core::{create_transaction, delete_all_transactions, delete_transaction, list_transactions},
    },
};

/// The JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A message that can be shown to the user.
    pub error: String,
}

/// The JSON body confirming a single transaction was deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedBody {
    /// The ID of the deleted transaction.
    pub id: TransactionId,
}

/// The JSON body confirming that every transaction was deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    /// A short confirmation message.
    pub message: String,
}

fn lock_connection(state: &AppState) -> Result<MutexGuard<'_, Connection>, Error> {
    state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// A route handler that responds with every transaction in insertion order.
pub async fn list_transactions_endpoint(State(state): State<AppState>) -> Response {
    let result = lock_connection(&state).and_then(|connection| list_transactions(&connection));

    match result {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => {
            tracing::error!("could not list transactions: {error}");
            error.into_response()
        }
    }
}

/// A route handler that saves a new transaction and responds with the stored record.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    Json(draft): Json<TransactionDraft>,
) -> Response {
    let draft = draft.trimmed();

    if let Err(errors) = draft.check() {
        tracing::debug!("rejected invalid transaction draft: {errors}");
        return Error::Validation(errors).into_response();
    }

    let result = lock_connection(&state).and_then(|connection| create_transaction(draft, &connection));

    match result {
        Ok(transaction) => {
            tracing::debug!("created transaction {}", transaction.id);
            Json(transaction).into_response()
        }
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            error.into_response()
        }
    }
}

/// A route handler for deleting a single transaction.
///
/// Deleting an ID that is not stored succeeds, so repeating a delete is harmless.
pub async fn delete_transaction_endpoint(
    State(state): State<AppState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let result =
        lock_connection(&state).and_then(|connection| delete_transaction(&transaction_id, &connection));

    match result {
        Ok(rows_affected) => {
            if rows_affected == 0 {
                tracing::debug!("transaction {transaction_id} was already deleted");
            }

            Json(DeletedBody { id: transaction_id }).into_response()
        }
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_response()
        }
    }
}

/// A route handler for deleting every transaction.
pub async fn delete_all_transactions_endpoint(State(state): State<AppState>) -> Response {
    let result = lock_connection(&state).and_then(|connection| delete_all_transactions(&connection));

    match result {
        Ok(rows_affected) => {
            tracing::debug!("cleared {rows_affected} transactions");
            Json(MessageBody {
                message: "All transactions cleared".to_owned(),
            })
            .into_response()
        }
        Err(error) => {
            tracing::error!("could not clear transactions: {error}");
            error.into_response()
        }
    }
}
