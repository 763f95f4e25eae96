//! Everything a single report computation depends on besides the base table.

use crate::config::resolve_columns;
use crate::currency::Currency;
use crate::filter::FilterCriteria;
use chrono::{Local, NaiveDate};

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub target_currency: Currency,
    pub filters: FilterCriteria,
    /// Overrides the configured KPI-relevant columns when set.
    pub kpi_columns: Option<Vec<String>>,
    /// Anchor for every time window.
    pub today: NaiveDate,
}

impl Default for ReportRequest {
    fn default() -> Self {
        ReportRequest {
            target_currency: Currency::default(),
            filters: FilterCriteria::default(),
            kpi_columns: None,
            today: Local::now().date_naive(),
        }
    }
}

impl ReportRequest {
    pub fn new(target_currency: Currency, today: NaiveDate) -> Self {
        ReportRequest {
            target_currency,
            today,
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: FilterCriteria) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_kpi_columns(mut self, columns: &[String]) -> Self {
        self.kpi_columns = if columns.is_empty() {
            None
        } else {
            Some(resolve_columns(columns))
        };
        self
    }
}
