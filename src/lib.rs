//! Contract portfolio reporting: load a CRM contract export, normalize it,
//! and compute data quality and KPI views for a chosen display currency.
//!
//! Data flows one way: raw CSV → [`loader`] → [`types::ContractTable`] →
//! [`filter::TableView`] → the independent views in [`reports`] and [`quality`].

pub mod bands;
pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod filter;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod quality;
pub mod reports;
pub mod request;
pub mod schema;
pub mod types;
pub mod util;

pub use config::ReportConfig;
pub use currency::{Currency, RateTable};
pub use error::{ReportError, Result};
pub use filter::{FilterCriteria, TableView};
pub use reports::{build_dashboard, Dashboard, Window};
pub use request::ReportRequest;
pub use schema::Field;
pub use types::{ContractRecord, ContractTable, SkipReason, ViewOutcome};
