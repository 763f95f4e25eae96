//! Report settings: built-in defaults with an optional TOML override file.
//!
//! ```toml
//! base_currency = "USD"
//! active_status = "Active"
//! top_n = 20
//! kpi_columns = ["Status", "End Date"]
//!
//! [rates]
//! USD = 1.0
//! EUR = 0.92
//! GBP = 0.77
//! CHF = 0.87
//! DKK = 6.75
//! NOK = 10.18
//! SEK = 10.06
//! ```
//!
//! The base stays USD and every display currency needs a rate; other codes
//! may be added for source amounts.

use crate::currency::{RateTable, BASE_CURRENCY};
use crate::error::{ReportError, Result};
use crate::schema::{display_label, Field};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_ACTIVE_STATUS: &str = "Active";
pub const DEFAULT_TOP_N: usize = 20;

/// Fields flagged as KPI-relevant in the data quality report.
static DEFAULT_KPI_FIELDS: Lazy<Vec<Field>> = Lazy::new(|| {
    vec![
        Field::Status,
        Field::StartDate,
        Field::EndDate,
        Field::AnnualSalesValue,
        Field::ActivatedDate,
        Field::PriceIncreaseDate,
        Field::NotificationDate,
        Field::ConsignmentValue,
        Field::CapitalValue,
        Field::TotalProcedureCommitments,
    ]
});

pub fn default_kpi_columns() -> Vec<String> {
    DEFAULT_KPI_FIELDS
        .iter()
        .map(|f| f.label().to_string())
        .collect()
}

/// Normalize user-supplied column names so raw export keys and labels both work.
pub fn resolve_columns(columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| display_label(c.trim()).to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawConfig {
    base_currency: String,
    active_status: String,
    top_n: usize,
    kpi_columns: Vec<String>,
    rates: BTreeMap<String, f64>,
}

impl Default for RawConfig {
    fn default() -> Self {
        let rates = RateTable::default();
        RawConfig {
            base_currency: BASE_CURRENCY.to_string(),
            active_status: DEFAULT_ACTIVE_STATUS.to_string(),
            top_n: DEFAULT_TOP_N,
            kpi_columns: default_kpi_columns(),
            rates: crate::currency::Currency::ALL
                .iter()
                .filter_map(|c| rates.rate(c.code()).map(|r| (c.code().to_string(), r)))
                .collect(),
        }
    }
}

/// Settings fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub rates: RateTable,
    pub active_status: String,
    pub top_n: usize,
    pub kpi_columns: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            rates: RateTable::default(),
            active_status: DEFAULT_ACTIVE_STATUS.to_string(),
            top_n: DEFAULT_TOP_N,
            kpi_columns: default_kpi_columns(),
        }
    }
}

impl ReportConfig {
    /// Parse a TOML document; missing keys fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] for malformed TOML, a base other than
    /// USD or an invalid rate table.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(s)?;
        // Amounts without a currency code are read in BASE_CURRENCY, so the
        // table has to pivot on it too.
        if raw.base_currency != BASE_CURRENCY {
            return Err(ReportError::Config(format!(
                "base_currency must be {BASE_CURRENCY}, found {}",
                raw.base_currency
            )));
        }
        let rates = RateTable::new(&raw.base_currency, raw.rates)?;
        Ok(ReportConfig {
            rates,
            active_status: raw.active_status,
            top_n: raw.top_n,
            kpi_columns: resolve_columns(&raw.kpi_columns),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg = Self::from_toml_str(&text)?;
        log::info!("loaded report configuration from {}", path.display());
        Ok(cfg)
    }

    /// `path` when given, otherwise the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = ReportConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.active_status, "Active");
        assert_eq!(cfg.top_n, 20);
        assert_eq!(cfg.rates, RateTable::default());
        assert!(cfg.kpi_columns.contains(&"End Date".to_string()));
    }

    #[test]
    fn overrides_and_resolves_raw_keys() {
        let cfg = ReportConfig::from_toml_str(
            r#"
            active_status = "Activated"
            top_n = 5
            kpi_columns = ["Contract_End_Date__c", "Status"]

            [rates]
            USD = 1.0
            EUR = 0.9
            GBP = 0.8
            CHF = 0.9
            DKK = 6.7
            NOK = 10.5
            SEK = 10.4
            JPY = 150.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.active_status, "Activated");
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.kpi_columns, vec!["End Date", "Status"]);
        assert_eq!(cfg.rates.rate("EUR"), Some(0.9));
        assert!(cfg.rates.supports("JPY"));
    }

    #[test]
    fn rejects_a_base_other_than_usd() {
        let err = ReportConfig::from_toml_str(
            r#"
            base_currency = "EUR"

            [rates]
            EUR = 1.0
            GBP = 0.84
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("base_currency"));
    }

    #[test]
    fn rejects_rates_missing_a_display_currency() {
        let err = ReportConfig::from_toml_str(
            "[rates]\nUSD = 1.0\nEUR = 0.9\nCHF = 0.9\nDKK = 6.7\nNOK = 10.5\nSEK = 10.4\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("GBP"));
    }

    #[test]
    fn rejects_rates_without_base() {
        let err = ReportConfig::from_toml_str("[rates]\nEUR = 0.9\n");
        assert!(err.is_err());
    }
}
