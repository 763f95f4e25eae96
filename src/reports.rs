use crate::config::ReportConfig;
use crate::currency::{Currency, RateTable};
use crate::error::ReportError;
use crate::filter::TableView;
use crate::quality::{missing_by_category, missing_report};
use crate::request::ReportRequest;
use crate::schema::Field;
use crate::types::{
    ActivitySummary, CategoryMissingRow, CategoryTotal, ContractRecord, ContractTable,
    ContractTableRow, MissingValueRow, MonthlyCount, RankedContract, SentNotActivated,
    SummaryStats, ViewOutcome, WindowBreakdown, WindowBucket,
};
use crate::util::{percentage, round2};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A filtered contract together with its value in the display currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportRow<'a> {
    pub record: &'a ContractRecord,
    pub converted: Option<f64>,
}

/// Filtered rows with their converted values, plus every currency code the
/// rate table could not serve.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion<'a> {
    pub rows: Vec<ReportRow<'a>>,
    pub unsupported: BTreeSet<String>,
}

/// Attach converted sales values to every row of `view`.
///
/// A row gets a value only when it has both an amount and a currency the
/// rate table knows. Unknown codes leave the value absent and are logged
/// once each.
pub fn convert_rows<'a>(view: &TableView<'a>, rates: &RateTable, target: Currency) -> Conversion<'a> {
    let mut unsupported = BTreeSet::new();
    let rows = view
        .records
        .iter()
        .map(|&record| {
            let converted = record.annual_sales.as_ref().and_then(|m| {
                let amount = m.amount?;
                match rates.convert(amount, &m.currency, target.code()) {
                    Ok(v) => Some(v),
                    Err(ReportError::UnsupportedCurrency { code }) => {
                        unsupported.insert(code);
                        None
                    }
                    Err(e) => {
                        log::warn!("conversion failed: {}", e);
                        None
                    }
                }
            });
            ReportRow { record, converted }
        })
        .collect();
    for code in &unsupported {
        log::warn!(
            "currency '{}' is not in the rate table; affected sales values are left empty",
            code
        );
    }
    Conversion { rows, unsupported }
}

/// Forward-looking windows used for expiry and price-increase buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Window {
    #[serde(rename = "This Year")]
    ThisYear,
    #[serde(rename = "Next 3 Months")]
    Next90Days,
    #[serde(rename = "Next 6 Months")]
    Next180Days,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::ThisYear, Window::Next90Days, Window::Next180Days];

    pub fn label(self) -> &'static str {
        match self {
            Window::ThisYear => "This Year",
            Window::Next90Days => "Next 3 Months",
            Window::Next180Days => "Next 6 Months",
        }
    }

    /// Last day inside the window.
    pub fn end(self, today: NaiveDate) -> NaiveDate {
        match self {
            Window::ThisYear => NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today),
            Window::Next90Days => today + Duration::days(90),
            Window::Next180Days => today + Duration::days(180),
        }
    }

    /// `today <= date <= end`, and for `ThisYear` the same calendar year as today.
    pub fn contains(self, today: NaiveDate, date: NaiveDate) -> bool {
        if date < today || date > self.end(today) {
            return false;
        }
        match self {
            Window::ThisYear => date.year() == today.year(),
            Window::Next90Days | Window::Next180Days => true,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn is_active(record: &ContractRecord, active_status: &str) -> bool {
    record.status.as_deref() == Some(active_status)
}

pub fn activity_summary(rows: &[ReportRow<'_>], active_status: &str) -> ActivitySummary {
    let total = rows.len();
    let active = rows
        .iter()
        .filter(|r| is_active(r.record, active_status))
        .count();
    ActivitySummary {
        total_contracts: total,
        active_contracts: active,
        active_percentage: round2(percentage(active, total)),
    }
}

/// The `n` highest converted values, descending; rows without a value are dropped.
///
/// Ties keep input order. `date_field` picks the date shown next to each entry.
pub fn top_n<'r, 'a: 'r, I>(rows: I, n: usize, date_field: Option<Field>) -> Vec<RankedContract>
where
    I: IntoIterator<Item = &'r ReportRow<'a>>,
{
    let mut valued: Vec<(f64, &ContractRecord)> = rows
        .into_iter()
        .filter_map(|r| r.converted.map(|v| (v, r.record)))
        .collect();
    valued.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    valued
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(idx, (value, rec))| RankedContract {
            rank: idx + 1,
            contract_number: rec.contract_number.clone(),
            name: rec.display_name().map(str::to_string),
            country: rec.country.clone(),
            contract_type: rec.contract_type.clone(),
            date: date_field.and_then(|f| rec.date(f)),
            value,
        })
        .collect()
}

/// Activation counts per calendar month, oldest first.
pub fn monthly_activations(rows: &[ReportRow<'_>]) -> Vec<MonthlyCount> {
    let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for d in rows.iter().filter_map(|r| r.record.activated_date) {
        *counts.entry((d.year(), d.month())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((year, month), count)| MonthlyCount {
            month: format!("{year:04}-{month:02}"),
            count,
        })
        .collect()
}

/// Rows with a notification date whose status is not the active sentinel.
pub fn sent_not_activated<'r, 'a>(
    rows: &'r [ReportRow<'a>],
    active_status: &str,
) -> Vec<&'r ReportRow<'a>> {
    rows.iter()
        .filter(|r| r.record.notification_date.is_some() && !is_active(r.record, active_status))
        .collect()
}

/// Rows whose `field` date falls inside `window`.
pub fn rows_in_window<'r, 'a>(
    rows: &'r [ReportRow<'a>],
    field: Field,
    window: Window,
    today: NaiveDate,
) -> Vec<&'r ReportRow<'a>> {
    rows.iter()
        .filter(|r| {
            r.record
                .date(field)
                .is_some_and(|d| window.contains(today, d))
        })
        .collect()
}

fn sum_converted<'r, 'a: 'r>(rows: impl IntoIterator<Item = &'r ReportRow<'a>>) -> f64 {
    rows.into_iter().filter_map(|r| r.converted).sum()
}

/// Count and value per window for contracts keyed off `field`, split by follow-up.
///
/// A contract counts as followed up once it has a notification date.
pub fn window_breakdown(
    rows: &[ReportRow<'_>],
    field: Field,
    today: NaiveDate,
    top: usize,
) -> WindowBreakdown {
    let mut buckets = Vec::with_capacity(Window::ALL.len());
    let mut top_this_year = Vec::new();
    for window in Window::ALL {
        let members = rows_in_window(rows, field, window, today);
        let (followed, open): (Vec<_>, Vec<_>) = members
            .iter()
            .copied()
            .partition(|r| r.record.notification_date.is_some());
        buckets.push(WindowBucket {
            window,
            total: members.len(),
            followed_up: followed.len(),
            not_followed_up: open.len(),
            total_value: sum_converted(members.iter().copied()),
            not_followed_up_value: sum_converted(open.iter().copied()),
        });
        if window == Window::ThisYear {
            top_this_year = top_n(members.iter().copied(), top, Some(field));
        }
    }
    WindowBreakdown {
        buckets,
        top_this_year,
    }
}

/// Summed converted value per value of `field`, largest first.
pub fn category_totals(rows: &[ReportRow<'_>], field: Field) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for row in rows {
        let Some(key) = row.record.text(field) else {
            continue;
        };
        let e = groups.entry(key).or_insert((0, 0.0));
        e.0 += 1;
        e.1 += row.converted.unwrap_or(0.0);
    }
    let mut totals: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(category, (contracts, total_value))| CategoryTotal {
            category: category.to_string(),
            contracts,
            total_value,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.total_value
            .partial_cmp(&a.total_value)
            .unwrap_or(Ordering::Equal)
    });
    totals
}

/// Key columns of every filtered contract, newest start date first.
pub fn contract_table(rows: &[ReportRow<'_>]) -> Vec<ContractTableRow> {
    let mut sorted: Vec<&ReportRow<'_>> = rows.iter().collect();
    sorted.sort_by(|a, b| match (a.record.start_date, b.record.start_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sorted
        .into_iter()
        .map(|r| {
            let rec = r.record;
            ContractTableRow {
                contract_number: rec.contract_number.clone(),
                name: rec.name.clone(),
                status: rec.status.clone(),
                start_date: rec.start_date,
                end_date: rec.end_date,
                region: rec.region.clone(),
                country: rec.country.clone(),
                contract_type: rec.contract_type.clone(),
                annual_sales_raw: rec.annual_sales.as_ref().map(|m| m.raw.clone()),
                annual_sales_converted: r.converted,
                price_increase_date: rec.price_increase_date,
                id: rec.id.clone(),
                consignment_value: rec.consignment_value,
                capital_value: rec.capital_value,
                total_procedure_commitments: rec.total_procedure_commitments,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityOverview {
    /// Every column of the filtered table, most-missing first.
    pub all_columns: Vec<MissingValueRow>,
    pub kpi_columns: Vec<MissingValueRow>,
}

/// Every view of one report run.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub currency: Currency,
    pub today: NaiveDate,
    pub quality: QualityOverview,
    /// Computed on the unfiltered table.
    pub missing_by_cluster: ViewOutcome<Vec<CategoryMissingRow>>,
    pub missing_by_country: ViewOutcome<Vec<CategoryMissingRow>>,
    pub missing_by_business_unit: ViewOutcome<Vec<CategoryMissingRow>>,
    pub activity: ViewOutcome<ActivitySummary>,
    pub top_contracts: ViewOutcome<Vec<RankedContract>>,
    pub activations_per_month: ViewOutcome<Vec<MonthlyCount>>,
    pub top_active: ViewOutcome<Vec<RankedContract>>,
    pub sent_not_activated: ViewOutcome<SentNotActivated>,
    pub expiring: ViewOutcome<WindowBreakdown>,
    pub price_increase: ViewOutcome<WindowBreakdown>,
    pub sales_by_cluster: ViewOutcome<Vec<CategoryTotal>>,
    pub sales_by_type: ViewOutcome<Vec<CategoryTotal>>,
    pub contracts: Vec<ContractTableRow>,
    /// Source or target codes missing from the rate table.
    pub unsupported_currencies: Vec<String>,
}

impl Dashboard {
    /// Names and reasons of the views that had nothing to show.
    pub fn skipped_views(&self) -> Vec<(String, String)> {
        fn note<T>(out: &mut Vec<(String, String)>, name: &str, v: &ViewOutcome<T>) {
            if let ViewOutcome::Skipped(reason) = v {
                out.push((name.to_string(), reason.to_string()));
            }
        }
        let mut out = Vec::new();
        note(&mut out, "missing_by_cluster", &self.missing_by_cluster);
        note(&mut out, "missing_by_country", &self.missing_by_country);
        note(&mut out, "missing_by_business_unit", &self.missing_by_business_unit);
        note(&mut out, "activity", &self.activity);
        note(&mut out, "top_contracts", &self.top_contracts);
        note(&mut out, "activations_per_month", &self.activations_per_month);
        note(&mut out, "top_active", &self.top_active);
        note(&mut out, "sent_not_activated", &self.sent_not_activated);
        note(&mut out, "expiring", &self.expiring);
        note(&mut out, "price_increase", &self.price_increase);
        note(&mut out, "sales_by_cluster", &self.sales_by_cluster);
        note(&mut out, "sales_by_type", &self.sales_by_type);
        out
    }

    pub fn summary(&self) -> SummaryStats {
        let values = |v: &ViewOutcome<WindowBreakdown>| {
            v.ready().map(|b| {
                b.buckets
                    .iter()
                    .map(|w| (w.window, round2(w.total_value)))
                    .collect::<Vec<_>>()
            })
        };
        SummaryStats {
            currency: self.currency.code().to_string(),
            today: self.today,
            total_contracts: self.contracts.len(),
            active_contracts: self.activity.ready().map(|a| a.active_contracts),
            active_percentage: self.activity.ready().map(|a| a.active_percentage),
            sent_not_activated: self.sent_not_activated.ready().map(|s| s.count),
            expiring_value: values(&self.expiring),
            price_increase_value: values(&self.price_increase),
            skipped_views: self.skipped_views(),
            unsupported_currencies: self.unsupported_currencies.clone(),
        }
    }
}

/// Compute every view for `request` from the immutable base `table`.
pub fn build_dashboard(
    table: &ContractTable,
    config: &ReportConfig,
    request: &ReportRequest,
) -> Dashboard {
    let base = TableView::all(table);
    let view = base.filter(&request.filters);
    log::info!(
        "building report over {} of {} contracts in {}",
        view.len(),
        table.len(),
        request.target_currency
    );
    let Conversion { rows, unsupported } =
        convert_rows(&view, &config.rates, request.target_currency);
    let kpi_columns = request
        .kpi_columns
        .as_deref()
        .unwrap_or(config.kpi_columns.as_slice());
    let active = config.active_status.as_str();
    let n = config.top_n;
    let today = request.today;

    let all_columns = missing_report(&view, None, kpi_columns);
    let quality = QualityOverview {
        kpi_columns: all_columns
            .iter()
            .filter(|r| r.kpi_relevant)
            .cloned()
            .collect(),
        all_columns,
    };

    let dashboard = Dashboard {
        currency: request.target_currency,
        today,
        quality,
        missing_by_cluster: missing_by_category(table, Field::Region, kpi_columns).into(),
        missing_by_country: missing_by_category(table, Field::Country, kpi_columns).into(),
        missing_by_business_unit: missing_by_category(table, Field::BusinessUnit, kpi_columns)
            .into(),
        activity: table
            .require(&[Field::Status])
            .map(|()| activity_summary(&rows, active))
            .into(),
        top_contracts: table
            .require(&[Field::AnnualSalesValue])
            .map(|()| top_n(&rows, n, None))
            .into(),
        activations_per_month: table
            .require(&[Field::ActivatedDate])
            .map(|()| monthly_activations(&rows))
            .into(),
        top_active: table
            .require(&[Field::Status, Field::AnnualSalesValue])
            .map(|()| {
                top_n(
                    rows.iter().filter(|r| is_active(r.record, active)),
                    n,
                    Some(Field::ActivatedDate),
                )
            })
            .into(),
        sent_not_activated: table
            .require(&[Field::NotificationDate, Field::Status])
            .map(|()| {
                let sent = sent_not_activated(&rows, active);
                SentNotActivated {
                    count: sent.len(),
                    percentage: round2(percentage(sent.len(), rows.len())),
                    top: top_n(sent, n, Some(Field::NotificationDate)),
                }
            })
            .into(),
        expiring: table
            .require(&[Field::EndDate])
            .map(|()| window_breakdown(&rows, Field::EndDate, today, n))
            .into(),
        price_increase: table
            .require(&[Field::PriceIncreaseDate])
            .map(|()| window_breakdown(&rows, Field::PriceIncreaseDate, today, n))
            .into(),
        sales_by_cluster: table
            .require(&[Field::Region, Field::AnnualSalesValue])
            .map(|()| category_totals(&rows, Field::Region))
            .into(),
        sales_by_type: table
            .require(&[Field::ContractType, Field::AnnualSalesValue])
            .map(|()| category_totals(&rows, Field::ContractType))
            .into(),
        contracts: contract_table(&rows),
        unsupported_currencies: unsupported.into_iter().collect(),
    };
    for (name, reason) in dashboard.skipped_views() {
        log::warn!("view '{}' skipped: {}", name, reason);
    }
    dashboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterCriteria;
    use crate::normalize::parse_money;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2025, 3, 10)
    }

    fn rec(number: &str) -> ContractRecord {
        ContractRecord {
            contract_number: Some(number.to_string()),
            ..Default::default()
        }
    }

    fn row(record: &ContractRecord, converted: Option<f64>) -> ReportRow<'_> {
        ReportRow { record, converted }
    }

    #[test]
    fn windows_are_inclusive_and_anchored_to_today() {
        let t = today();
        assert!(Window::Next90Days.contains(t, t));
        assert!(Window::Next90Days.contains(t, t + Duration::days(90)));
        assert!(!Window::Next90Days.contains(t, t + Duration::days(91)));
        assert!(!Window::Next90Days.contains(t, t - Duration::days(1)));
        assert!(Window::Next180Days.contains(t, t + Duration::days(180)));
        assert!(Window::ThisYear.contains(t, ymd(2025, 12, 31)));
        assert!(!Window::ThisYear.contains(t, ymd(2026, 1, 1)));

        let late = ymd(2025, 11, 1);
        assert!(Window::Next90Days.contains(late, ymd(2026, 1, 15)));
        assert!(!Window::ThisYear.contains(late, ymd(2026, 1, 15)));
    }

    #[test]
    fn single_unfollowed_contract_lands_in_every_expiry_window() {
        let mut r = rec("C-1");
        r.end_date = Some(today() + Duration::days(10));
        let rows = vec![row(&r, Some(1000.0))];
        let b = window_breakdown(&rows, Field::EndDate, today(), 20);
        assert_eq!(b.buckets.len(), 3);
        for bucket in &b.buckets {
            assert_eq!(bucket.total, 1);
            assert_eq!(bucket.not_followed_up, 1);
            assert_eq!(bucket.followed_up, 0);
            assert_eq!(bucket.total_value, 1000.0);
            assert_eq!(bucket.not_followed_up_value, 1000.0);
        }
        assert_eq!(b.top_this_year.len(), 1);
    }

    #[test]
    fn expiry_buckets_split_on_notification_and_skip_null_values() {
        let t = today();
        let mut followed = rec("F");
        followed.end_date = Some(t + Duration::days(30));
        followed.notification_date = Some(t - Duration::days(5));
        let mut later = rec("L");
        later.end_date = Some(t + Duration::days(120));
        let mut past = rec("P");
        past.end_date = Some(t - Duration::days(1));
        let undated = rec("U");
        let rows = vec![
            row(&followed, Some(500.0)),
            row(&later, None),
            row(&past, Some(10.0)),
            row(&undated, Some(10.0)),
        ];
        let b = window_breakdown(&rows, Field::EndDate, t, 20);
        let three = &b.buckets[1];
        assert_eq!(three.window, Window::Next90Days);
        assert_eq!((three.total, three.followed_up, three.not_followed_up), (1, 1, 0));
        assert_eq!(three.total_value, 500.0);
        let six = &b.buckets[2];
        assert_eq!((six.total, six.not_followed_up), (2, 1));
        assert_eq!(six.total_value, 500.0);
        assert_eq!(six.not_followed_up_value, 0.0);
    }

    #[test]
    fn activity_on_empty_rows_is_zero_percent() {
        let summary = activity_summary(&[], "Active");
        assert_eq!(summary.total_contracts, 0);
        assert_eq!(summary.active_percentage, 0.0);
    }

    #[test]
    fn activity_counts_the_active_sentinel_only() {
        let mut a = rec("A");
        a.status = Some("Active".into());
        let mut b = rec("B");
        b.status = Some("Activated".into());
        let c = rec("C");
        let rows = vec![row(&a, None), row(&b, None), row(&c, None)];
        let summary = activity_summary(&rows, "Active");
        assert_eq!(summary.active_contracts, 1);
        assert_eq!(summary.active_percentage, 33.33);
    }

    #[test]
    fn sent_not_activated_includes_missing_status() {
        let t = today();
        let mut a = rec("A");
        a.notification_date = Some(t);
        a.status = Some("Active".into());
        let mut b = rec("B");
        b.notification_date = Some(t);
        let mut c = rec("C");
        c.notification_date = Some(t);
        c.status = Some("Draft".into());
        let d = rec("D");
        let rows = vec![row(&a, None), row(&b, None), row(&c, None), row(&d, None)];
        let sent = sent_not_activated(&rows, "Active");
        let numbers: Vec<_> = sent
            .iter()
            .map(|r| r.record.contract_number.as_deref().unwrap())
            .collect();
        assert_eq!(numbers, vec!["B", "C"]);
    }

    #[test]
    fn monthly_series_is_time_ordered() {
        let mut a = rec("A");
        a.activated_date = Some(ymd(2024, 11, 3));
        let mut b = rec("B");
        b.activated_date = Some(ymd(2024, 2, 28));
        let mut c = rec("C");
        c.activated_date = Some(ymd(2024, 11, 30));
        let d = rec("D");
        let rows = vec![row(&a, None), row(&b, None), row(&c, None), row(&d, None)];
        let series = monthly_activations(&rows);
        assert_eq!(
            series,
            vec![
                MonthlyCount { month: "2024-02".into(), count: 1 },
                MonthlyCount { month: "2024-11".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn category_totals_sort_descending_and_skip_null_keys() {
        let mut a = rec("A");
        a.region = Some("North".into());
        let mut b = rec("B");
        b.region = Some("South".into());
        let mut c = rec("C");
        c.region = Some("North".into());
        let d = rec("D");
        let rows = vec![
            row(&a, Some(10.0)),
            row(&b, Some(50.0)),
            row(&c, None),
            row(&d, Some(99.0)),
        ];
        let totals = category_totals(&rows, Field::Region);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, "South");
        assert_eq!(totals[0].total_value, 50.0);
        assert_eq!(totals[1].category, "North");
        assert_eq!(totals[1].contracts, 2);
        assert_eq!(totals[1].total_value, 10.0);
    }

    #[test]
    fn contract_table_puts_undated_rows_last() {
        let mut a = rec("A");
        a.start_date = Some(ymd(2023, 1, 1));
        let b = rec("B");
        let mut c = rec("C");
        c.start_date = Some(ymd(2024, 1, 1));
        let rows = vec![row(&a, None), row(&b, None), row(&c, None)];
        let table = contract_table(&rows);
        let order: Vec<_> = table
            .iter()
            .map(|r| r.contract_number.as_deref().unwrap())
            .collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn unknown_source_currency_leaves_value_empty() {
        let mut a = rec("A");
        a.annual_sales = Some(parse_money("1,234.56 EUR"));
        let mut b = rec("B");
        b.annual_sales = Some(parse_money("JPY 5000"));
        let mut c = rec("C");
        c.annual_sales = Some(parse_money("n/a"));
        let mut d = rec("D");
        d.annual_sales = Some(parse_money("12 JPY"));
        let mut e = rec("E");
        e.annual_sales = Some(parse_money("XYZ 7"));
        let table = ContractTable {
            records: vec![a, b, c, d, e],
            ..Default::default()
        };
        let view = TableView::all(&table);
        let conversion = convert_rows(&view, &RateTable::default(), Currency::Usd);
        let rows = &conversion.rows;
        assert!((rows[0].converted.unwrap() - 1341.913).abs() < 0.001);
        assert_eq!(rows[1].converted, None);
        assert_eq!(rows[2].converted, None);
        assert_eq!(rows[3].converted, None);
        let codes: Vec<&str> = conversion.unsupported.iter().map(String::as_str).collect();
        assert_eq!(codes, vec!["JPY", "XYZ"]);
    }

    #[test]
    fn dashboard_skips_views_without_their_columns() {
        let mut a = rec("A");
        a.status = Some("Active".into());
        let mut table = ContractTable {
            columns: vec!["Contract Number".into(), "Status".into()],
            records: vec![a],
            ..Default::default()
        };
        table.fields.insert(Field::ContractNumber, 0);
        table.fields.insert(Field::Status, 1);
        let request = ReportRequest::new(Currency::Eur, today())
            .with_filters(FilterCriteria::new().accept(Field::Status, ["Active"]));
        let dash = build_dashboard(&table, &ReportConfig::default(), &request);
        assert_eq!(dash.activity.ready().unwrap().active_percentage, 100.0);
        assert!(dash.expiring.is_skipped());
        assert!(dash.top_contracts.is_skipped());
        assert!(dash.missing_by_cluster.is_skipped());
        assert_eq!(dash.contracts.len(), 1);
        assert!(dash.skipped_views().iter().any(|(name, _)| name == "price_increase"));
        assert_eq!(dash.summary().active_contracts, Some(1));
    }

    proptest! {
        #[test]
        fn top_n_is_sorted_bounded_and_non_null(
            values in proptest::collection::vec(proptest::option::of(-1.0e6f64..1.0e6), 0..60),
            n in 0usize..30,
        ) {
            let records: Vec<ContractRecord> = (0..values.len()).map(|i| rec(&i.to_string())).collect();
            let rows: Vec<ReportRow<'_>> = records.iter().zip(&values).map(|(r, v)| row(r, *v)).collect();
            let ranked = top_n(&rows, n, None);
            let non_null = values.iter().filter(|v| v.is_some()).count();
            prop_assert_eq!(ranked.len(), n.min(non_null));
            prop_assert!(ranked.windows(2).all(|w| w[0].value >= w[1].value));
            prop_assert!(ranked.iter().enumerate().all(|(i, r)| r.rank == i + 1));
        }

        #[test]
        fn ninety_day_membership_matches_the_date_range(offset in -400i64..400, notified in any::<bool>()) {
            let t = today();
            let mut r = rec("X");
            r.end_date = Some(t + Duration::days(offset));
            if notified {
                r.notification_date = Some(t);
            }
            let rows = vec![row(&r, Some(1.0))];
            let b = window_breakdown(&rows, Field::EndDate, t, 5);
            let inside = (0..=90).contains(&offset);
            prop_assert_eq!(b.buckets[1].total == 1, inside);
            prop_assert_eq!(b.buckets[1].not_followed_up == 1, inside && !notified);
        }
    }
}
