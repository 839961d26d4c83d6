//! Derived summaries of the ledger.
//!
//! All functions are pure and take the transactions in ledger order, so the same ledger contents
//! always produce the same totals, breakdown and colours.

use std::collections::HashMap;

use crate::transaction::{Transaction, TransactionType};

/// Income, expense and balance totals for a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    /// The sum of all income amounts.
    pub income: f64,
    /// The sum of all expense amounts.
    pub expense: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// The sum of all amounts irrespective of type.
    pub total: f64,
}

impl Summary {
    /// Compute the totals for `transactions`.
    pub fn of(transactions: &[Transaction]) -> Self {
        let income = total_by_type(transactions, TransactionType::Income);
        let expense = total_by_type(transactions, TransactionType::Expense);

        Self {
            income,
            expense,
            balance: income - expense,
            total: total_amount(transactions),
        }
    }
}

/// The total amount for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// The category name.
    pub category: String,
    /// The sum of the amounts of every transaction in the category.
    pub total: f64,
    /// The type of the first transaction seen in the category.
    ///
    /// Categories that mix income and expenses are labelled by whichever came first.
    pub transaction_type: TransactionType,
    /// A CSS colour for charting the category.
    pub colour: String,
}

/// Sum the amounts of the transactions with `transaction_type`, zero if there are none.
pub fn total_by_type(transactions: &[Transaction], transaction_type: TransactionType) -> f64 {
    transactions
        .iter()
        .filter(|transaction| transaction.transaction_type == transaction_type)
        .map(|transaction| transaction.amount)
        .sum()
}

/// Total income minus total expenses.
pub fn balance(transactions: &[Transaction]) -> f64 {
    total_by_type(transactions, TransactionType::Income)
        - total_by_type(transactions, TransactionType::Expense)
}

/// Sum the amounts of all transactions irrespective of type.
pub fn total_amount(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .map(|transaction| transaction.amount)
        .sum()
}

/// Group transactions by category, in the order each category first appears.
///
/// Income and expenses are summed together. Each category is labelled with the type of its first
/// transaction.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut breakdown: Vec<CategoryTotal> = Vec::new();
    let mut index_by_category: HashMap<&str, usize> = HashMap::new();

    for transaction in transactions {
        match index_by_category.get(transaction.category.as_str()) {
            Some(&index) => breakdown[index].total += transaction.amount,
            None => {
                index_by_category.insert(&transaction.category, breakdown.len());
                breakdown.push(CategoryTotal {
                    category: transaction.category.clone(),
                    total: transaction.amount,
                    transaction_type: transaction.transaction_type,
                    colour: category_colour(&transaction.category, transaction.transaction_type),
                });
            }
        }
    }

    breakdown
}

/// Pick a chart colour for `category`.
///
/// Income categories get a green hue and expense categories a red one. The exact shade is
/// derived from a hash of the category name so it stays the same between renders.
pub fn category_colour(category: &str, transaction_type: TransactionType) -> String {
    let hash = md5::compute(category);

    let hue = match transaction_type {
        TransactionType::Income => 120 + u16::from(hash[0]) % 100,
        TransactionType::Expense => u16::from(hash[0]) % 20,
    };
    let saturation = 70 + hash[1] % 10;
    let lightness = 50 + hash[2] % 10;

    format!("hsl({hue}, {saturation}%, {lightness}%)")
}
