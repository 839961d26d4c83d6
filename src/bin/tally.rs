use std::error::Error;

use clap::{Parser, Subcommand};
use time::macros::format_description;
use tracing_subscriber::EnvFilter;

use tally_rs::{
    HttpSync, MutationCoordinator,
    currency::format_currency,
    transaction::{TransactionForm, TransactionId},
};

/// Record income and expenses and see where the money went.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The base URL of the persistence service.
    #[arg(long, env = "TALLY_API_URL", default_value = "http://127.0.0.1:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every transaction.
    List,
    /// Add a transaction.
    Add {
        /// A short description of the transaction.
        #[arg(long)]
        title: String,
        /// The amount of money, e.g. 12.50.
        #[arg(long)]
        amount: String,
        /// Either "income" or "expense".
        #[arg(long = "type")]
        transaction_type: String,
        /// The category the transaction belongs to.
        #[arg(long)]
        category: String,
    },
    /// Delete the transaction with the given ID.
    Delete {
        /// The ID shown by `list`.
        id: String,
    },
    /// Delete every transaction.
    Clear,
    /// Show the income, expense and balance totals, and the total of all amounts.
    Summary,
    /// Show the total for each category.
    Breakdown,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let coordinator = MutationCoordinator::new(HttpSync::new(&args.api_url));
    coordinator.load().await?;

    match args.command {
        Command::List => print_transactions(&coordinator)?,
        Command::Add {
            title,
            amount,
            transaction_type,
            category,
        } => {
            let form = TransactionForm {
                title,
                amount,
                transaction_type,
                category,
            };
            let transaction = coordinator.submit(&form).await?;
            println!("Added {}", transaction.id);
        }
        Command::Delete { id } => {
            coordinator.delete(&TransactionId::new(id.clone())).await?;
            println!("Deleted {id}");
        }
        Command::Clear => {
            coordinator.clear().await?;
            println!("All transactions cleared");
        }
        Command::Summary => {
            let summary = coordinator.summary();
            println!("Income:   {:>14}", format_currency(summary.income));
            println!("Expenses: {:>14}", format_currency(summary.expense));
            println!("Balance:  {:>14}", format_currency(summary.balance));
            println!("Total:    {:>14}", format_currency(summary.total));
        }
        Command::Breakdown => {
            for category in coordinator.category_breakdown() {
                println!(
                    "{:<20} {:<8} {:>14}  {}",
                    category.category,
                    category.transaction_type,
                    format_currency(category.total),
                    category.colour
                );
            }
        }
    }

    Ok(())
}

fn print_transactions(coordinator: &MutationCoordinator<HttpSync>) -> Result<(), Box<dyn Error>> {
    let date_format = format_description!("[year]-[month]-[day]");
    let transactions = coordinator.transactions();

    if transactions.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    for transaction in transactions.iter() {
        println!(
            "{}  {}  {:<8} {:<16} {:<24} {:>14}",
            transaction.id,
            transaction.date.format(&date_format)?,
            transaction.transaction_type,
            transaction.category,
            transaction.title,
            format_currency(transaction.amount)
        );
    }

    Ok(())
}
