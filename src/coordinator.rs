//! Optimistic mutations of the ledger.
//!
//! The [MutationCoordinator] owns the [LedgerStore] for a session and is the only thing that
//! changes it. Each mutation is applied locally straight away, then confirmed with the
//! persistence service through a [RemoteSync] adapter. If the remote call fails the ledger is
//! rolled back to the state before the mutation and the failure is reported in a single,
//! auto-expiring error notice.
//!
//! Mutations are serialised: one mutation's checkpoint, apply, confirm or rollback cycle finishes
//! before the next one starts, so a late rollback can never overwrite a newer confirmed state.
//! Reads are not blocked while a remote call is pending and see the optimistic state.

use std::{
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use time::OffsetDateTime;
use tokio::{sync::watch, time::Instant};

use crate::{
    Error,
    aggregation::{CategoryTotal, Summary, category_breakdown},
    ledger::{LedgerStore, Snapshot},
    sync::RemoteSync,
    transaction::{Transaction, TransactionDraft, TransactionForm, TransactionId, TransactionType},
};

/// How long an error notice is shown before it expires on its own.
pub const ERROR_NOTICE_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct ErrorNotice {
    message: String,
    raised_at: Instant,
}

/// Counts an operation as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Applies ledger mutations optimistically and reconciles them with the persistence service.
#[derive(Debug)]
pub struct MutationCoordinator<R> {
    remote: R,
    store: Mutex<LedgerStore>,
    /// Held for the whole of a mutation so that mutations never interleave.
    writer: tokio::sync::Mutex<()>,
    notice: Mutex<Option<ErrorNotice>>,
    updates: watch::Sender<Snapshot>,
    placeholder_sequence: AtomicU64,
    in_flight: AtomicUsize,
}

impl<R: RemoteSync> MutationCoordinator<R> {
    /// Create a coordinator with an empty ledger that confirms mutations with `remote`.
    pub fn new(remote: R) -> Self {
        let (updates, _) = watch::channel(Snapshot::default());

        Self {
            remote,
            store: Mutex::new(LedgerStore::new()),
            writer: tokio::sync::Mutex::new(()),
            notice: Mutex::new(None),
            updates,
            placeholder_sequence: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// The adapter used to reach the persistence service.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Replace the ledger with every transaction stored by the persistence service.
    ///
    /// On failure the ledger is left as it was.
    ///
    /// # Errors
    /// Returns [Error::Sync] if the transactions could not be fetched.
    pub async fn load(&self) -> Result<(), Error> {
        let _in_flight = InFlight::start(&self.in_flight);
        let _writer = self.writer.lock().await;

        match self.remote.fetch_all().await {
            Ok(transactions) => {
                tracing::debug!("loaded {} transactions", transactions.len());
                self.update(|store| store.replace_all(transactions));
                self.clear_error();
                Ok(())
            }
            Err(error) => {
                self.report_error(&error.message);
                Err(error.into())
            }
        }
    }

    /// Validate `form` and add the resulting draft, see [MutationCoordinator::add].
    ///
    /// # Errors
    /// Returns [Error::Validation] without touching the ledger if the form is invalid, otherwise
    /// any error from [MutationCoordinator::add].
    pub async fn submit(&self, form: &TransactionForm) -> Result<Transaction, Error> {
        let draft = form.validate().map_err(Error::Validation)?;

        self.add(draft).await
    }

    /// Add a transaction.
    ///
    /// The transaction shows up in the ledger immediately under a placeholder ID. Once the
    /// persistence service has stored it, the placeholder is swapped for the stored transaction
    /// in a single update. If the service fails, the ledger is restored to how it was before.
    ///
    /// # Errors
    /// - [Error::Precedence] if `draft` is an expense and the ledger has no income yet, the
    ///   ledger is not touched and nothing is reported in the error notice,
    /// - [Error::Sync] if the persistence service failed,
    /// - or [Error::DuplicateId] if the service returned an ID that is already in the ledger.
    pub async fn add(&self, draft: TransactionDraft) -> Result<Transaction, Error> {
        let _in_flight = InFlight::start(&self.in_flight);
        let _writer = self.writer.lock().await;

        // A rejected draft must not notify subscribers, so this runs outside `update`.
        if draft.transaction_type == TransactionType::Expense && !self.lock_store().has_income() {
            return Err(Error::Precedence);
        }

        let placeholder_id = TransactionId::placeholder(
            self.placeholder_sequence.fetch_add(1, Ordering::SeqCst) + 1,
        );
        let provisional = draft
            .clone()
            .into_transaction(placeholder_id.clone(), OffsetDateTime::now_utc());

        let checkpoint = self.update(|store| {
            let checkpoint = store.begin();
            store.append(provisional)?;

            Ok::<_, Error>(checkpoint)
        })?;

        match self.remote.create(&draft).await {
            Ok(confirmed) => {
                let result = self.update(|store| {
                    store.remove_by_id(&placeholder_id);

                    match store.append(confirmed.clone()) {
                        Ok(()) => {
                            store.commit(checkpoint);
                            Ok(())
                        }
                        Err(error) => {
                            store.rollback(checkpoint);
                            Err(error)
                        }
                    }
                });

                match result {
                    Ok(()) => {
                        tracing::debug!("confirmed {placeholder_id} as {}", confirmed.id);
                        self.clear_error();
                        Ok(confirmed)
                    }
                    Err(error) => {
                        tracing::error!("could not confirm {placeholder_id}: {error}");
                        self.report_error(&error.to_string());
                        Err(error)
                    }
                }
            }
            Err(error) => {
                self.update(|store| store.rollback(checkpoint));
                self.report_error(&error.message);
                Err(error.into())
            }
        }
    }

    /// Delete the transaction with `id`.
    ///
    /// The transaction disappears from the ledger immediately and comes back if the persistence
    /// service fails to delete it.
    ///
    /// # Errors
    /// Returns [Error::Sync] if the persistence service failed.
    pub async fn delete(&self, id: &TransactionId) -> Result<(), Error> {
        let _in_flight = InFlight::start(&self.in_flight);
        let _writer = self.writer.lock().await;

        let checkpoint = self.update(|store| {
            let checkpoint = store.begin();
            store.remove_by_id(id);
            checkpoint
        });

        match self.remote.delete_by_id(id).await {
            Ok(()) => {
                self.lock_store().commit(checkpoint);
                self.clear_error();
                Ok(())
            }
            Err(error) => {
                self.update(|store| store.rollback(checkpoint));
                self.report_error(&error.message);
                Err(error.into())
            }
        }
    }

    /// Delete every transaction.
    ///
    /// The ledger is emptied immediately and restored if the persistence service fails.
    ///
    /// # Errors
    /// Returns [Error::Sync] if the persistence service failed.
    pub async fn clear(&self) -> Result<(), Error> {
        let _in_flight = InFlight::start(&self.in_flight);
        let _writer = self.writer.lock().await;

        let checkpoint = self.update(|store| {
            let checkpoint = store.begin();
            store.replace_all(Vec::new());
            checkpoint
        });

        match self.remote.clear_all().await {
            Ok(()) => {
                self.lock_store().commit(checkpoint);
                self.clear_error();
                Ok(())
            }
            Err(error) => {
                self.update(|store| store.rollback(checkpoint));
                self.report_error(&error.message);
                Err(error.into())
            }
        }
    }

    /// The current contents of the ledger, including unconfirmed additions.
    pub fn transactions(&self) -> Snapshot {
        self.lock_store().snapshot()
    }

    /// Get notified with a fresh [Snapshot] every time the ledger changes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    /// Income, expense and balance totals for the current ledger.
    pub fn summary(&self) -> Summary {
        Summary::of(&self.transactions())
    }

    /// The per-category totals for the current ledger.
    pub fn category_breakdown(&self) -> Vec<CategoryTotal> {
        category_breakdown(&self.transactions())
    }

    /// The most recent error message, unless it has been dismissed, superseded by a successful
    /// operation or has expired.
    pub fn error(&self) -> Option<String> {
        self.lock_notice()
            .as_ref()
            .filter(|notice| notice.raised_at.elapsed() < ERROR_NOTICE_DURATION)
            .map(|notice| notice.message.clone())
    }

    /// Hide the current error message.
    pub fn dismiss_error(&self) {
        self.clear_error();
    }

    /// Whether any operation is waiting to run or waiting on the persistence service.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Run `mutation` on the ledger and notify subscribers of the result as one update.
    fn update<T>(&self, mutation: impl FnOnce(&mut LedgerStore) -> T) -> T {
        let mut store = self.lock_store();
        let result = mutation(&mut store);
        self.updates.send_replace(store.snapshot());

        result
    }

    fn lock_store(&self) -> MutexGuard<'_, LedgerStore> {
        // The ledger is only changed through infallible operations, so it is consistent even if
        // another thread panicked while holding the lock.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_notice(&self) -> MutexGuard<'_, Option<ErrorNotice>> {
        self.notice.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report_error(&self, message: &str) {
        tracing::warn!("ledger mutation failed: {message}");

        *self.lock_notice() = Some(ErrorNotice {
            message: message.to_owned(),
            raised_at: Instant::now(),
        });
    }

    fn clear_error(&self) {
        *self.lock_notice() = None;
    }
}
