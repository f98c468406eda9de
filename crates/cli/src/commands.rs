use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, bail};
use chrono::{Datelike, Local};
use serde::Serialize;
use tracing::info;

use brokerdesk_office::{Books, Office};

use crate::Report;
use crate::config::Config;

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn open(config: &Config) -> anyhow::Result<Office> {
    let store = config.store();
    let books = store
        .load()
        .with_context(|| format!("cannot load books from {}", store.path().display()))?;
    Ok(Office::with_books(books, config.settings.clone()))
}

pub fn init(config: &Config, force: bool) -> anyhow::Result<ExitCode> {
    let store = config.store();
    if store.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", store.path().display());
    }
    store.save(&Books::new())?;
    info!(path = %store.path().display(), "books initialized");
    Ok(ExitCode::SUCCESS)
}

pub fn audit(config: &Config) -> anyhow::Result<ExitCode> {
    let findings = open(config)?.audit()?;
    print_json(&findings)?;
    if findings.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

pub fn repair(config: &Config) -> anyhow::Result<ExitCode> {
    let office = open(config)?;
    let summary = office.recompute_all()?;
    config.store().save(&office.snapshot()?)?;
    print_json(&summary)?;
    Ok(ExitCode::SUCCESS)
}

pub fn report(config: &Config, report: Report) -> anyhow::Result<ExitCode> {
    let office = open(config)?;
    let today = Local::now().date_naive();
    match report {
        Report::OpenInvoices { today: day } => {
            print_json(&office.open_invoices(day.unwrap_or(today))?)?
        }
        Report::Balances => print_json(&office.client_balances()?)?,
        Report::Revenue { year } => print_json(&office.revenue(year.unwrap_or(today.year()))?)?,
        Report::Backlog => print_json(&office.order_backlog()?)?,
    }
    Ok(ExitCode::SUCCESS)
}
