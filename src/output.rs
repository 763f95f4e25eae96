use crate::error::Result;
use crate::reports::Dashboard;
use crate::types::{ActivitySummary, ViewOutcome};
use crate::util::{format_int, format_number};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Preview one view, or print why it was skipped.
fn preview_outcome<T>(title: &str, outcome: &ViewOutcome<Vec<T>>, max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", title);
    match outcome {
        ViewOutcome::Ready(rows) => preview_table_rows(rows, max_rows),
        ViewOutcome::Skipped(reason) => println!("({})\n", reason),
    }
}

fn write_outcome<T: Serialize>(dir: &Path, file: &str, outcome: &ViewOutcome<Vec<T>>) -> Result<()> {
    if let ViewOutcome::Ready(rows) = outcome {
        write_csv(&dir.join(file), rows)?;
    }
    Ok(())
}

/// Write one CSV per view and a `summary.json` into `dir`.
pub fn export_dashboard(dir: &Path, dash: &Dashboard) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    write_csv(&dir.join("missing_values.csv"), &dash.quality.all_columns)?;
    write_outcome(dir, "missing_by_cluster.csv", &dash.missing_by_cluster)?;
    write_outcome(dir, "missing_by_country.csv", &dash.missing_by_country)?;
    write_outcome(dir, "missing_by_business_unit.csv", &dash.missing_by_business_unit)?;
    write_outcome(dir, "top_contracts.csv", &dash.top_contracts)?;
    write_outcome(dir, "activations_per_month.csv", &dash.activations_per_month)?;
    write_outcome(dir, "top_active_contracts.csv", &dash.top_active)?;
    if let ViewOutcome::Ready(sent) = &dash.sent_not_activated {
        write_csv(&dir.join("top_sent_not_activated.csv"), &sent.top)?;
    }
    if let ViewOutcome::Ready(b) = &dash.expiring {
        write_csv(&dir.join("expiring_windows.csv"), &b.buckets)?;
        write_csv(&dir.join("top_expiring_this_year.csv"), &b.top_this_year)?;
    }
    if let ViewOutcome::Ready(b) = &dash.price_increase {
        write_csv(&dir.join("price_increase_windows.csv"), &b.buckets)?;
        write_csv(&dir.join("top_price_increase_this_year.csv"), &b.top_this_year)?;
    }
    write_outcome(dir, "sales_by_cluster.csv", &dash.sales_by_cluster)?;
    write_outcome(dir, "sales_by_type.csv", &dash.sales_by_type)?;
    write_csv(&dir.join("contracts.csv"), &dash.contracts)?;
    write_json(&dir.join("summary.json"), &dash.summary())?;
    log::info!("report files written to {}", dir.display());
    Ok(())
}

fn print_activity(activity: &ViewOutcome<ActivitySummary>) {
    match activity {
        ViewOutcome::Ready(a) => {
            println!("Total Contracts: {}", format_int(a.total_contracts));
            println!("Active Contracts: {}", format_int(a.active_contracts));
            println!("Active Contract Percentage: {}%\n", format_number(a.active_percentage, 2));
        }
        ViewOutcome::Skipped(reason) => println!("Contract activity: ({})\n", reason),
    }
}

/// Markdown previews of every view on stdout.
pub fn print_dashboard(dash: &Dashboard, max_rows: usize) {
    let cur = dash.currency;
    println!("Contract Report ({}, as of {})\n", cur, dash.today);
    if !dash.unsupported_currencies.is_empty() {
        println!(
            "Note: no rate for {}; those sales values are left empty.\n",
            dash.unsupported_currencies.join(", ")
        );
    }

    println!("Data Quality Analysis\n");
    println!("Missing Values in KPI Relevant Columns\n");
    preview_table_rows(&dash.quality.kpi_columns, dash.quality.kpi_columns.len());
    preview_outcome("Missing Data by Cluster (no filters applied)", &dash.missing_by_cluster, max_rows);

    println!("KPI Analysis\n");
    print_activity(&dash.activity);
    preview_outcome(&format!("Top Contracts per Annual Sales Value ({cur})"), &dash.top_contracts, max_rows);
    preview_outcome("Contracts Activated per Month", &dash.activations_per_month, max_rows);
    preview_outcome(&format!("Top Activated Contracts ({cur})"), &dash.top_active, max_rows);

    println!("Contracts Sent Out but Not Activated\n");
    match &dash.sent_not_activated {
        ViewOutcome::Ready(s) => {
            println!(
                "{} contracts ({}% of total)\n",
                format_int(s.count),
                format_number(s.percentage, 2)
            );
            preview_table_rows(&s.top, max_rows);
        }
        ViewOutcome::Skipped(reason) => println!("({})\n", reason),
    }

    for (title, outcome) in [
        ("Expiring Contracts Analysis", &dash.expiring),
        ("Price Increase Opportunities", &dash.price_increase),
    ] {
        println!("{} ({})\n", title, cur);
        match outcome {
            ViewOutcome::Ready(b) => {
                preview_table_rows(&b.buckets, b.buckets.len());
                println!("Top this year\n");
                preview_table_rows(&b.top_this_year, max_rows);
            }
            ViewOutcome::Skipped(reason) => println!("({})\n", reason),
        }
    }

    preview_outcome(&format!("Annual Sales Value by Cluster ({cur})"), &dash.sales_by_cluster, max_rows);
    preview_outcome(&format!("Annual Sales Value by Contract Type ({cur})"), &dash.sales_by_type, max_rows);

    println!("Contract Data Table\n");
    preview_table_rows(&dash.contracts, max_rows);
}
