//! The validation contract between the form layer and the ledger.
//!
//! A [TransactionForm] holds the raw text the user typed. It only reaches the ledger once
//! [TransactionForm::validate] has turned it into a [TransactionDraft].

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::transaction::core::{TransactionDraft, TransactionType};

/// A validation message for a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The name of the form field, e.g. "amount".
    pub field: &'static str,
    /// The message to show next to the field.
    pub message: &'static str,
}

/// Every validation message for a form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub(crate) fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    pub(crate) fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }

    /// The message for `field`, if that field is invalid.
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message)
    }

    /// The names of the invalid fields.
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|error| error.field).collect()
    }

    /// Iterate over the field errors.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|error| error.message).collect();
        write!(f, "{}", messages.join(", "))
    }
}

/// The raw form data for creating a transaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionForm {
    /// Text detailing the transaction.
    pub title: String,
    /// The value of the transaction as typed by the user.
    pub amount: String,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// The category to file the transaction under.
    pub category: String,
}

impl TransactionForm {
    /// Validate the form, producing a draft that is ready for the ledger.
    ///
    /// Text fields are trimmed before they are checked.
    ///
    /// # Errors
    /// Returns a message for every invalid field.
    pub fn validate(&self) -> Result<TransactionDraft, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push("title", "Title is required");
        }

        let amount = self.amount.trim();
        let amount = if amount.is_empty() {
            errors.push("amount", "Amount is required");
            None
        } else {
            match amount.parse::<f64>() {
                Ok(amount) if !amount.is_finite() => {
                    errors.push("amount", "Amount must be a number");
                    None
                }
                Ok(amount) if amount <= 0.0 => {
                    errors.push("amount", "Amount must be greater than zero");
                    None
                }
                Ok(amount) => Some(amount),
                Err(_) => {
                    errors.push("amount", "Amount must be a number");
                    None
                }
            }
        };

        let transaction_type = self.transaction_type.trim();
        let transaction_type = if transaction_type.is_empty() {
            errors.push("type", "Type is required");
            None
        } else {
            match transaction_type.parse::<TransactionType>() {
                Ok(transaction_type) => Some(transaction_type),
                Err(_) => {
                    errors.push("type", "Type must be either income or expense");
                    None
                }
            }
        };

        let category = self.category.trim();
        if category.is_empty() {
            errors.push("category", "Category is required");
        }

        match (amount, transaction_type) {
            (Some(amount), Some(transaction_type)) if errors.0.is_empty() => Ok(TransactionDraft {
                title: title.to_owned(),
                amount,
                transaction_type,
                category: category.to_owned(),
                date: None,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TransactionForm;
    use crate::transaction::TransactionType;

    fn form(title: &str, amount: &str, transaction_type: &str, category: &str) -> TransactionForm {
        TransactionForm {
            title: title.to_owned(),
            amount: amount.to_owned(),
            transaction_type: transaction_type.to_owned(),
            category: category.to_owned(),
        }
    }

    #[test]
    fn valid_form_produces_trimmed_draft() {
        let draft = form(" Salary ", "1000.50", "income", " Work ")
            .validate()
            .expect("want valid draft");

        assert_eq!(draft.title, "Salary");
        assert_eq!(draft.amount, 1000.5);
        assert_eq!(draft.transaction_type, TransactionType::Income);
        assert_eq!(draft.category, "Work");
        assert_eq!(draft.date, None);
    }

    #[test]
    fn empty_form_reports_every_field() {
        let errors = TransactionForm::default()
            .validate()
            .expect_err("want errors for empty form");

        assert_eq!(errors.get("title"), Some("Title is required"));
        assert_eq!(errors.get("amount"), Some("Amount is required"));
        assert_eq!(errors.get("type"), Some("Type is required"));
        assert_eq!(errors.get("category"), Some("Category is required"));
    }

    #[test]
    fn amount_messages() {
        let cases = [
            ("abc", "Amount must be a number"),
            ("inf", "Amount must be a number"),
            ("0", "Amount must be greater than zero"),
            ("-12.5", "Amount must be greater than zero"),
        ];

        for (amount, want) in cases {
            let errors = form("Rent", amount, "expense", "Housing")
                .validate()
                .expect_err("want amount error");

            assert_eq!(errors.fields(), vec!["amount"], "amount {amount:?}");
            assert_eq!(errors.get("amount"), Some(want), "amount {amount:?}");
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let errors = form("Gift", "5", "transfer", "Other")
            .validate()
            .expect_err("want type error");

        assert_eq!(
            errors.get("type"),
            Some("Type must be either income or expense")
        );
    }

    #[test]
    fn errors_display_as_joined_messages() {
        let errors = form("", "1", "income", "").validate().unwrap_err();

        assert_eq!(
            errors.to_string(),
            "Title is required, Category is required"
        );
    }
}
