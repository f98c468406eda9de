//! Runtime configuration: `.env`, then environment, then flags.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Args;
use rust_decimal::Decimal;

use brokerdesk_catalog::Currency;
use brokerdesk_core::VatRate;
use brokerdesk_observability::LogFormat;
use brokerdesk_office::{OfficeSettings, SnapshotStore};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Snapshot file holding the books.
    #[arg(long, global = true, env = "BROKERDESK_DATA", default_value = "data/books.json")]
    pub data: PathBuf,

    /// Default document currency (ISO code).
    #[arg(long, global = true, env = "BROKERDESK_CURRENCY", default_value = "PLN")]
    pub currency: String,

    /// Default VAT rate: a percentage such as `23`, or `zw` for exempt.
    #[arg(long, global = true, env = "BROKERDESK_VAT_RATE", default_value = "23")]
    pub vat_rate: String,

    /// Days from issue date to due date.
    #[arg(long, global = true, env = "BROKERDESK_PAYMENT_DAYS", default_value_t = 14)]
    pub payment_days: u32,

    #[arg(long, global = true, env = "BROKERDESK_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data: PathBuf,
    pub settings: OfficeSettings,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_args(args: &GlobalArgs) -> anyhow::Result<Self> {
        if args.payment_days > 365 {
            bail!("payment days must be at most 365, got {}", args.payment_days);
        }
        let settings = OfficeSettings {
            currency: parse_currency(&args.currency)?,
            payment_days: args.payment_days,
            vat_rate: parse_vat_rate(&args.vat_rate)?,
        };
        Ok(Self {
            data: args.data.clone(),
            settings,
            log_format: args.log_format,
        })
    }

    pub fn store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.data)
    }
}

fn parse_currency(code: &str) -> anyhow::Result<Currency> {
    if code.trim().eq_ignore_ascii_case("PLN") {
        return Ok(Currency::pln());
    }
    let code = code.trim().to_ascii_uppercase();
    Currency::new(&code, code.as_str(), code.as_str())
        .with_context(|| format!("invalid currency {code:?}"))
}

pub fn parse_vat_rate(raw: &str) -> anyhow::Result<VatRate> {
    let raw = raw.trim().trim_end_matches('%');
    if raw.eq_ignore_ascii_case("zw") {
        return Ok(VatRate::Exempt);
    }
    let percent: Decimal = raw
        .parse()
        .with_context(|| format!("invalid vat rate {raw:?}"))?;
    Ok(VatRate::percent(percent)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rust_decimal_macros::dec;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        global: GlobalArgs,
    }

    fn config(args: &[&str]) -> anyhow::Result<Config> {
        let argv = std::iter::once("brokerdesk").chain(args.iter().copied());
        let cli = TestCli::try_parse_from(argv)?;
        Config::from_args(&cli.global)
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = config(&[
            "--currency",
            "eur",
            "--vat-rate",
            "8%",
            "--payment-days",
            "30",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cfg.settings.currency.code(), "EUR");
        assert_eq!(cfg.settings.vat_rate, VatRate::Percent(dec!(8)));
        assert_eq!(cfg.settings.payment_days, 30);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn exempt_rate_is_accepted() {
        assert_eq!(parse_vat_rate("zw").unwrap(), VatRate::Exempt);
        assert_eq!(parse_vat_rate(" 23 ").unwrap(), VatRate::Percent(dec!(23)));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(parse_vat_rate("150").is_err());
        assert!(parse_vat_rate("abc").is_err());
        assert!(config(&["--currency", "EURO"]).is_err());
        assert!(config(&["--payment-days", "400"]).is_err());
        assert!(config(&["--log-format", "xml"]).is_err());
    }
}
