//! Transactions: the records kept in the ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, its ID and type, and `TransactionDraft` for unsaved transactions
//! - The form validation that turns user input into a draft
//! - Database functions and route handlers for the persistence service

mod api;
mod core;
mod form;

pub use api::{
    DeletedBody, ErrorBody, MessageBody, create_transaction_endpoint,
    delete_all_transactions_endpoint, delete_transaction_endpoint, list_transactions_endpoint,
};
pub use core::{
    ParseTransactionTypeError, Transaction, TransactionDraft, TransactionId, TransactionType,
    create_transaction_table, map_transaction_row,
};
pub use form::{FieldError, FieldErrors, TransactionForm};
