//! A [RemoteSync] implementation that talks JSON over HTTP to the persistence service.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::{
    endpoints::{self, format_endpoint},
    sync::{RemoteSync, SyncError, SyncOperation},
    transaction::{ErrorBody, Transaction, TransactionDraft, TransactionId},
};

/// API client for the transaction endpoints of the persistence service.
#[derive(Debug, Clone)]
pub struct HttpSync {
    client: Client,
    base_url: String,
}

impl HttpSync {
    /// Create a client for the service at `base_url`, e.g. "http://127.0.0.1:3000".
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client that sends requests with an existing `client`.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl RemoteSync for HttpSync {
    async fn fetch_all(&self) -> Result<Vec<Transaction>, SyncError> {
        let operation = SyncOperation::FetchAll;
        let response = self
            .client
            .get(self.url(endpoints::TRANSACTIONS_API))
            .send()
            .await;

        let response = check_response(response, operation).await?;
        decode_json(response, operation).await
    }

    async fn create(&self, draft: &TransactionDraft) -> Result<Transaction, SyncError> {
        let operation = SyncOperation::Create;
        let response = self
            .client
            .post(self.url(endpoints::TRANSACTIONS_API))
            .json(draft)
            .send()
            .await;

        let response = check_response(response, operation).await?;
        decode_json(response, operation).await
    }

    async fn delete_by_id(&self, id: &TransactionId) -> Result<(), SyncError> {
        let operation = SyncOperation::Delete;
        let path = format_endpoint(endpoints::TRANSACTION_API, id.as_str());
        let response = self.client.delete(self.url(&path)).send().await;

        check_response(response, operation).await.map(|_| ())
    }

    async fn clear_all(&self) -> Result<(), SyncError> {
        let operation = SyncOperation::Clear;
        let response = self
            .client
            .delete(self.url(endpoints::TRANSACTIONS_API))
            .send()
            .await;

        check_response(response, operation).await.map(|_| ())
    }
}

/// Turn transport failures and non-2xx responses into a [SyncError].
///
/// The message from the service's error body is used when there is one.
async fn check_response(
    response: reqwest::Result<Response>,
    operation: SyncOperation,
) -> Result<Response, SyncError> {
    let response = response.map_err(|error| {
        tracing::warn!("{operation:?} request could not be sent: {error}");
        SyncError::fallback(operation)
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let reported_message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .map(|body| body.error)
        .filter(|message| !message.is_empty());

    tracing::warn!("{operation:?} request failed with status {status}: {reported_message:?}");

    Err(match reported_message {
        Some(message) => SyncError::new(message),
        None => SyncError::fallback(operation),
    })
}

async fn decode_json<T: DeserializeOwned>(
    response: Response,
    operation: SyncOperation,
) -> Result<T, SyncError> {
    response.json::<T>().await.map_err(|error| {
        tracing::warn!("could not decode {operation:?} response: {error}");
        SyncError::fallback(operation)
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;
    use tokio::net::TcpListener;

    use crate::{
        AppState, MutationCoordinator, build_router,
        sync::{HttpSync, RemoteSync, SyncError},
        transaction::{TransactionDraft, TransactionId, TransactionType},
    };

    async fn spawn_server() -> String {
        let state = AppState::new(Connection::open_in_memory().unwrap()).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        format!("http://{addr}")
    }

    async fn unused_address() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        format!("http://{addr}")
    }

    fn draft(title: &str, amount: f64, transaction_type: TransactionType) -> TransactionDraft {
        TransactionDraft::new(title, amount, transaction_type, "Misc")
            .unwrap()
            .date(datetime!(2025-05-01 09:00:00 UTC))
    }

    #[tokio::test]
    async fn create_then_fetch_all() {
        let sync = HttpSync::new(&spawn_server().await);

        let income = sync
            .create(&draft("Pay", 1000.0, TransactionType::Income))
            .await
            .expect("could not create income");
        let expense = sync
            .create(&draft("Rent", 200.0, TransactionType::Expense))
            .await
            .expect("could not create expense");

        let got = sync.fetch_all().await.expect("could not fetch");

        assert!(!income.id.is_placeholder());
        assert_eq!(got, vec![income, expense]);
    }

    #[tokio::test]
    async fn delete_by_id_and_clear_all() {
        let sync = HttpSync::new(&spawn_server().await);
        let first = sync
            .create(&draft("a", 1.0, TransactionType::Income))
            .await
            .unwrap();
        let second = sync
            .create(&draft("b", 2.0, TransactionType::Income))
            .await
            .unwrap();

        sync.delete_by_id(&first.id).await.expect("could not delete");
        assert_eq!(sync.fetch_all().await.unwrap(), vec![second]);

        sync.clear_all().await.expect("could not clear");
        sync.clear_all().await.expect("could not clear twice");
        assert!(sync.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn uses_message_reported_by_service() {
        let sync = HttpSync::new(&spawn_server().await);
        let invalid = TransactionDraft {
            title: "Refund".to_owned(),
            amount: -5.0,
            transaction_type: TransactionType::Income,
            category: "Misc".to_owned(),
            date: None,
        };

        let result = sync.create(&invalid).await;

        assert_eq!(
            result,
            Err(SyncError::new("Amount must be greater than zero"))
        );
    }

    #[tokio::test]
    async fn deleting_missing_id_succeeds() {
        let sync = HttpSync::new(&spawn_server().await);

        let result = sync.delete_by_id(&TransactionId::new("missing")).await;

        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn repeated_delete_through_coordinator_reports_no_error() {
        let coordinator = MutationCoordinator::new(HttpSync::new(&spawn_server().await));
        let salary = coordinator
            .add(draft("Pay", 1000.0, TransactionType::Income))
            .await
            .expect("could not add");

        coordinator.delete(&salary.id).await.expect("first delete failed");
        coordinator
            .delete(&salary.id)
            .await
            .expect("second delete failed");

        assert!(coordinator.transactions().is_empty());
        assert_eq!(coordinator.error(), None);
    }

    #[tokio::test]
    async fn transport_failures_use_fallback_messages() {
        let sync = HttpSync::new(&unused_address().await);

        assert_eq!(
            sync.fetch_all().await,
            Err(SyncError::new("Failed to fetch transactions"))
        );
        assert_eq!(
            sync.create(&draft("a", 1.0, TransactionType::Income))
                .await
                .map(|_| ()),
            Err(SyncError::new("Failed to add transaction"))
        );
        assert_eq!(
            sync.delete_by_id(&TransactionId::new("a")).await,
            Err(SyncError::new("Failed to delete transaction"))
        );
        assert_eq!(
            sync.clear_all().await,
            Err(SyncError::new("Failed to clear transactions"))
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(
            HttpSync::new("http://localhost:3000/").base_url(),
            "http://localhost:3000"
        );
    }
}
