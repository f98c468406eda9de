//! `brokerdesk`: maintenance and reporting on the office books.

mod commands;
mod config;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use config::{Config, GlobalArgs};

#[derive(Debug, Parser)]
#[command(
    name = "brokerdesk",
    version,
    about = "Back office for a translation and notary brokerage"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an empty snapshot.
    Init {
        /// Overwrite an existing snapshot.
        #[arg(long)]
        force: bool,
    },
    /// Print cached values that disagree with their source rows.
    Audit,
    /// Recompute every cached value and save the books.
    Repair,
    /// Print a report as JSON.
    #[command(subcommand)]
    Report(Report),
}

#[derive(Debug, Subcommand)]
enum Report {
    /// Invoices with an outstanding amount.
    OpenInvoices {
        /// Reference day for overdue days (defaults to today).
        #[arg(long)]
        today: Option<chrono::NaiveDate>,
    },
    /// Invoiced, paid and outstanding amounts per client.
    Balances,
    /// Monthly revenue of one year.
    Revenue {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Orders in an open status with amounts left to invoice.
    Backlog,
}

fn main() -> anyhow::Result<ExitCode> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_args(&cli.global)?;
    brokerdesk_observability::init(config.log_format);
    tracing::debug!(data = %config.data.display(), "configuration loaded");

    match cli.command {
        Command::Init { force } => commands::init(&config, force),
        Command::Audit => commands::audit(&config),
        Command::Repair => commands::repair(&config),
        Command::Report(report) => commands::report(&config, report),
    }
}
