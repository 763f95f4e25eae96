use crate::normalize::Money;
use crate::reports::Window;
use crate::schema::Field;
use crate::util::{format_money, format_opt_date, format_opt_money, format_opt_str};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

/// One normalized contract row.
///
/// `cells` mirrors the table columns (date columns already rewritten to ISO
/// form or cleared); the typed fields are the pipeline's view of the same row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContractRecord {
    pub cells: Vec<Option<String>>,
    pub contract_number: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub contract_type: Option<String>,
    pub business_unit: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub original_end_date: Option<NaiveDate>,
    pub activated_date: Option<NaiveDate>,
    pub canceled_date: Option<NaiveDate>,
    pub notification_date: Option<NaiveDate>,
    pub price_increase_date: Option<NaiveDate>,
    pub customer_signed_date: Option<NaiveDate>,
    pub last_evaluation_date: Option<NaiveDate>,
    pub annual_sales: Option<Money>,
    pub consignment_value: Option<f64>,
    pub capital_value: Option<f64>,
    pub total_procedure_commitments: Option<f64>,
}

impl ContractRecord {
    /// Text value of an identifier or categorical field.
    pub fn text(&self, field: Field) -> Option<&str> {
        let v = match field {
            Field::ContractNumber => &self.contract_number,
            Field::Id => &self.id,
            Field::Name => &self.name,
            Field::Description => &self.description,
            Field::ContractType => &self.contract_type,
            Field::BusinessUnit => &self.business_unit,
            Field::Region => &self.region,
            Field::Country => &self.country,
            Field::Status => &self.status,
            _ => return None,
        };
        v.as_deref()
    }

    pub fn date(&self, field: Field) -> Option<NaiveDate> {
        match field {
            Field::StartDate => self.start_date,
            Field::EndDate => self.end_date,
            Field::OriginalEndDate => self.original_end_date,
            Field::ActivatedDate => self.activated_date,
            Field::CanceledDate => self.canceled_date,
            Field::NotificationDate => self.notification_date,
            Field::PriceIncreaseDate => self.price_increase_date,
            Field::CustomerSignedDate => self.customer_signed_date,
            Field::LastEvaluationDate => self.last_evaluation_date,
            _ => None,
        }
    }

    /// Label used in rankings: description, falling back to name, then number.
    pub fn display_name(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.name.as_deref())
            .or(self.contract_number.as_deref())
    }

    pub fn is_missing(&self, column: usize) -> bool {
        self.cells.get(column).map_or(true, Option::is_none)
    }
}

/// The normalized base table. Read-only once the loader hands it out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContractTable {
    pub columns: Vec<String>,
    pub records: Vec<ContractRecord>,
    pub(crate) fields: BTreeMap<Field, usize>,
}

impl ContractTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn field_index(&self, field: Field) -> Option<usize> {
        self.fields.get(&field).copied()
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    /// `Ok` when every field is a column of this table.
    pub fn require(&self, fields: &[Field]) -> Result<(), SkipReason> {
        let missing: Vec<Field> = fields
            .iter()
            .copied()
            .filter(|f| !self.has_field(*f))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SkipReason::MissingColumns(missing))
        }
    }
}

/// Why a dashboard view has nothing to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    MissingColumns(Vec<Field>),
    NoCategoryValues(Field),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingColumns(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.label()).collect();
                write!(f, "not enough data: missing column(s) {}", names.join(", "))
            }
            SkipReason::NoCategoryValues(field) => {
                write!(f, "not enough data: no {} values present", field.label())
            }
        }
    }
}

/// Result of one dashboard view. A skipped view never affects the others.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ViewOutcome<T> {
    Ready(T),
    Skipped(SkipReason),
}

impl<T> ViewOutcome<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewOutcome::Ready(v) => Some(v),
            ViewOutcome::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ViewOutcome::Skipped(_))
    }
}

impl<T> From<Result<T, SkipReason>> for ViewOutcome<T> {
    fn from(r: Result<T, SkipReason>) -> Self {
        match r {
            Ok(v) => ViewOutcome::Ready(v),
            Err(reason) => ViewOutcome::Skipped(reason),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct MissingValueRow {
    #[serde(rename = "Column")]
    #[tabled(rename = "Column")]
    pub column: String,
    #[serde(rename = "Missing Values")]
    #[tabled(rename = "Missing Values")]
    pub missing_count: usize,
    #[serde(rename = "Missing Percentage")]
    #[tabled(rename = "Missing Percentage")]
    pub missing_percentage: f64,
    #[serde(rename = "KPI Relevant")]
    #[tabled(rename = "KPI Relevant")]
    pub kpi_relevant: bool,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CategoryMissingRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Column")]
    #[tabled(rename = "Column")]
    pub column: String,
    #[serde(rename = "Missing Values")]
    #[tabled(rename = "Missing Values")]
    pub missing_count: usize,
    #[serde(rename = "Missing Percentage")]
    #[tabled(rename = "Missing Percentage")]
    pub missing_percentage: f64,
    #[serde(rename = "Total Contracts")]
    #[tabled(rename = "Total Contracts")]
    pub category_rows: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ActivitySummary {
    pub total_contracts: usize,
    pub active_contracts: usize,
    pub active_percentage: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct RankedContract {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "ContractNumber")]
    #[tabled(rename = "Contract Number", display_with = "format_opt_str")]
    pub contract_number: Option<String>,
    #[serde(rename = "ContractName")]
    #[tabled(rename = "Contract Name", display_with = "format_opt_str")]
    pub name: Option<String>,
    #[serde(rename = "Country")]
    #[tabled(rename = "Country", display_with = "format_opt_str")]
    pub country: Option<String>,
    #[serde(rename = "ContractType")]
    #[tabled(rename = "Contract Type", display_with = "format_opt_str")]
    pub contract_type: Option<String>,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date", display_with = "format_opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value", display_with = "format_money")]
    pub value: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct MonthlyCount {
    #[serde(rename = "ActivationMonth")]
    #[tabled(rename = "Activation Month")]
    pub month: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SentNotActivated {
    pub count: usize,
    pub percentage: f64,
    pub top: Vec<RankedContract>,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct WindowBucket {
    #[serde(rename = "TimeFrame")]
    #[tabled(rename = "Time Frame")]
    pub window: Window,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: usize,
    #[serde(rename = "FollowedUp")]
    #[tabled(rename = "Followed Up")]
    pub followed_up: usize,
    #[serde(rename = "NotFollowedUp")]
    #[tabled(rename = "Not Followed Up")]
    pub not_followed_up: usize,
    #[serde(rename = "TotalValue")]
    #[tabled(rename = "Total Value", display_with = "format_money")]
    pub total_value: f64,
    #[serde(rename = "NotFollowedUpValue")]
    #[tabled(rename = "Not Followed Up Value", display_with = "format_money")]
    pub not_followed_up_value: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WindowBreakdown {
    pub buckets: Vec<WindowBucket>,
    pub top_this_year: Vec<RankedContract>,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CategoryTotal {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Contracts")]
    #[tabled(rename = "Contracts")]
    pub contracts: usize,
    #[serde(rename = "TotalValue")]
    #[tabled(rename = "Total Value", display_with = "format_money")]
    pub total_value: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ContractTableRow {
    #[serde(rename = "Contract Number")]
    #[tabled(rename = "Contract Number", display_with = "format_opt_str")]
    pub contract_number: Option<String>,
    #[serde(rename = "Contract Name")]
    #[tabled(rename = "Contract Name", display_with = "format_opt_str")]
    pub name: Option<String>,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status", display_with = "format_opt_str")]
    pub status: Option<String>,
    #[serde(rename = "Start Date")]
    #[tabled(rename = "Start Date", display_with = "format_opt_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "End Date")]
    #[tabled(rename = "End Date", display_with = "format_opt_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "Cluster")]
    #[tabled(rename = "Cluster", display_with = "format_opt_str")]
    pub region: Option<String>,
    #[serde(rename = "Country")]
    #[tabled(rename = "Country", display_with = "format_opt_str")]
    pub country: Option<String>,
    #[serde(rename = "Contract Type")]
    #[tabled(rename = "Contract Type", display_with = "format_opt_str")]
    pub contract_type: Option<String>,
    #[serde(rename = "Annual Sales Value")]
    #[tabled(rename = "Annual Sales Value", display_with = "format_opt_str")]
    pub annual_sales_raw: Option<String>,
    #[serde(rename = "Annual Sales Value (Converted)")]
    #[tabled(rename = "Converted", display_with = "format_opt_money")]
    pub annual_sales_converted: Option<f64>,
    #[serde(rename = "Price Increase Date")]
    #[tabled(rename = "Price Increase Date", display_with = "format_opt_date")]
    pub price_increase_date: Option<NaiveDate>,
    #[serde(rename = "Contract ID")]
    #[tabled(skip)]
    pub id: Option<String>,
    #[serde(rename = "Consignment Value")]
    #[tabled(skip)]
    pub consignment_value: Option<f64>,
    #[serde(rename = "Capital Value")]
    #[tabled(skip)]
    pub capital_value: Option<f64>,
    #[serde(rename = "Total Procedure Commitments")]
    #[tabled(skip)]
    pub total_procedure_commitments: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub currency: String,
    pub today: NaiveDate,
    pub total_contracts: usize,
    pub active_contracts: Option<usize>,
    pub active_percentage: Option<f64>,
    pub sent_not_activated: Option<usize>,
    pub expiring_value: Option<Vec<(Window, f64)>>,
    pub price_increase_value: Option<Vec<(Window, f64)>>,
    pub skipped_views: Vec<(String, String)>,
    pub unsupported_currencies: Vec<String>,
}
