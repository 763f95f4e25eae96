// Cell-level normalization: calendar dates, currency-tagged amounts and
// plain numeric commitments. Nothing in here returns an error; a cell that
// cannot be read becomes absent.
use crate::currency::BASE_CURRENCY;
use crate::util::{parse_date_safe, parse_f64_safe};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static CURRENCY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{3}").expect("valid regex"));
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.]").expect("valid regex"));

/// A monetary cell split into magnitude and currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Money {
    /// The cell as it appeared in the export.
    pub raw: String,
    pub amount: Option<f64>,
    pub currency: String,
}

pub fn parse_date(cell: Option<&str>) -> Option<NaiveDate> {
    parse_date_safe(cell)
}

/// Split a monetary cell like `"EUR 1,234.56"` or `"12'500.00 CHF"`.
///
/// Plain numbers are taken as-is in the base currency. Otherwise the first
/// run of three capital letters is the currency (base when there is none) and
/// every character except digits and `.` is stripped before parsing. A
/// remainder that still does not parse to a finite number, e.g. `"1.2.3"`,
/// yields no amount and the base currency.
pub fn parse_money(cell: &str) -> Money {
    let raw = cell.trim();
    if let Ok(v) = raw.parse::<f64>() {
        if v.is_finite() {
            return Money {
                raw: raw.to_string(),
                amount: Some(v),
                currency: BASE_CURRENCY.to_string(),
            };
        }
    }

    let currency = CURRENCY_CODE
        .find(raw)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| BASE_CURRENCY.to_string());
    let digits = NON_NUMERIC.replace_all(raw, "");
    if digits.is_empty() {
        return Money {
            raw: raw.to_string(),
            amount: None,
            currency,
        };
    }
    match digits.parse::<f64>() {
        Ok(v) if v.is_finite() => Money {
            raw: raw.to_string(),
            amount: Some(v),
            currency,
        },
        _ => Money {
            raw: raw.to_string(),
            amount: None,
            currency: BASE_CURRENCY.to_string(),
        },
    }
}

/// Numeric commitment columns carry no currency tag.
pub fn parse_number(cell: Option<&str>) -> Option<f64> {
    parse_f64_safe(cell)
}
