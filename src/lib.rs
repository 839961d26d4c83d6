//! Tally is a personal finance tracker.
//!
//! Users record income and expense transactions, see running totals and a breakdown of where the
//! money went by category.
//!
//! The core of this library is the transaction ledger:
//! - [LedgerStore] holds the transactions for a session,
//! - [MutationCoordinator] applies changes optimistically and keeps the ledger consistent with the
//!   remote persistence service through a [RemoteSync] adapter,
//! - and the [aggregation] functions derive totals and category breakdowns from the ledger.
//!
//! The library also provides the persistence service itself as a REST API that stores
//! transactions in SQLite, see [build_router].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

pub mod aggregation;
mod app_state;
mod coordinator;
pub mod currency;
mod db;
pub mod endpoints;
mod ledger;
mod logging;
mod routing;
pub mod sync;
#[cfg(test)]
mod test_utils;
pub mod transaction;

pub use app_state::AppState;
pub use coordinator::{ERROR_NOTICE_DURATION, MutationCoordinator};
pub use db::initialize as initialize_db;
pub use ledger::{Checkpoint, LedgerStore, Snapshot};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use sync::{HttpSync, RemoteSync, SyncError, SyncOperation};

use crate::transaction::{ErrorBody, FieldErrors, TransactionId};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A draft failed form validation.
    ///
    /// The draft never reaches the ledger.
    #[error("{0}")]
    Validation(FieldErrors),

    /// An expense was submitted before any income was recorded.
    ///
    /// The ledger is left untouched.
    #[error("Please add your income first.")]
    Precedence,

    /// A transaction with the same ID is already in the ledger.
    ///
    /// This indicates a consistency bug and should not happen when mutations go through the
    /// [MutationCoordinator].
    #[error("a transaction with the ID {0} is already in the ledger")]
    DuplicateId(TransactionId),

    /// A call to the persistence service failed.
    ///
    /// Any optimistic change has been rolled back by the time the caller sees this error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::Validation(_) | Error::Precedence => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateId(_) => StatusCode::CONFLICT,
            Error::Sync(_) => StatusCode::BAD_GATEWAY,
            Error::SqlError(_) | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            // SQL details are only intended for the server logs.
            Error::SqlError(_) => {
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{Error, transaction::TransactionDraft, transaction::TransactionType};

    #[test]
    fn validation_errors_are_bad_requests() {
        let errors =
            TransactionDraft::new("", 1.0, TransactionType::Income, "Pay").expect_err("want error");

        let response = Error::Validation(errors).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn sql_errors_are_internal_server_errors() {
        let response = Error::SqlError(rusqlite::Error::InvalidQuery).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_rows_map_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
