//! Display currencies and pivot conversion through a base currency.

use crate::error::{ReportError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const BASE_CURRENCY: &str = "USD";

/// Units of each currency per one unit of the base currency.
static DEFAULT_RATES: Lazy<BTreeMap<String, f64>> = Lazy::new(|| {
    [
        ("USD", 1.0),
        ("EUR", 0.92),
        ("GBP", 0.77),
        ("CHF", 0.87),
        ("DKK", 6.75),
        ("NOK", 10.18),
        ("SEK", 10.06),
    ]
    .into_iter()
    .map(|(code, rate)| (code.to_string(), rate))
    .collect()
});

/// Currencies a report can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Chf,
    Dkk,
    Nok,
    Sek,
}

impl Currency {
    pub const ALL: [Currency; 7] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Chf,
        Currency::Dkk,
        Currency::Nok,
        Currency::Sek,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Chf => "CHF",
            Currency::Dkk => "DKK",
            Currency::Nok => "NOK",
            Currency::Sek => "SEK",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == wanted)
            .ok_or_else(|| ReportError::UnknownDisplayCurrency(s.to_string()))
    }
}

/// Fixed FX table keyed by ISO code, expressed relative to `base`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    base: String,
    rates: BTreeMap<String, f64>,
}

impl Default for RateTable {
    fn default() -> Self {
        RateTable {
            base: BASE_CURRENCY.to_string(),
            rates: DEFAULT_RATES.clone(),
        }
    }
}

impl RateTable {
    /// Build a table, rejecting non-positive rates, a base that is not 1.0 and
    /// tables that cannot serve every display currency.
    pub fn new(base: &str, rates: BTreeMap<String, f64>) -> Result<Self> {
        match rates.get(base) {
            Some(r) if (*r - 1.0).abs() < f64::EPSILON => {}
            Some(r) => {
                return Err(ReportError::Config(format!(
                    "base currency {base} must have rate 1.0, found {r}"
                )))
            }
            None => {
                return Err(ReportError::Config(format!(
                    "base currency {base} is missing from the rate table"
                )))
            }
        }
        if let Some((code, rate)) = rates.iter().find(|(_, r)| !r.is_finite() || **r <= 0.0) {
            return Err(ReportError::Config(format!(
                "rate for {code} must be a positive number, found {rate}"
            )));
        }
        let missing: Vec<&str> = Currency::ALL
            .iter()
            .map(|c| c.code())
            .filter(|code| !rates.contains_key(*code))
            .collect();
        if !missing.is_empty() {
            return Err(ReportError::Config(format!(
                "display currencies missing from the rate table: {}",
                missing.join(", ")
            )));
        }
        Ok(RateTable {
            base: base.to_string(),
            rates,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn supports(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    /// Convert `amount` from one currency to another via the base currency.
    ///
    /// # Errors
    ///
    /// [`ReportError::UnsupportedCurrency`] if either code is missing from the table.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        let from_rate = self.lookup(from)?;
        let to_rate = self.lookup(to)?;
        let base_amount = if from == self.base {
            amount
        } else {
            amount / from_rate
        };
        if to == self.base {
            Ok(base_amount)
        } else {
            Ok(base_amount * to_rate)
        }
    }

    fn lookup(&self, code: &str) -> Result<f64> {
        self.rate(code)
            .ok_or_else(|| ReportError::UnsupportedCurrency {
                code: code.to_string(),
            })
    }
}
