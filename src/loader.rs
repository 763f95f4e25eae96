use crate::error::Result;
use crate::normalize::{parse_date, parse_money, parse_number};
use crate::schema::{rename_columns, Field};
use crate::types::{ContractRecord, ContractTable};
use crate::util::clean_cell;
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub parse_errors: usize,
    pub renamed_columns: usize,
    /// Non-empty date cells that could not be read, per column label.
    pub unparseable_dates: BTreeMap<String, usize>,
    /// Non-empty monetary cells without a usable amount.
    pub unparseable_amounts: usize,
}

pub fn load_and_clean(path: &Path) -> Result<(ContractTable, LoadReport)> {
    let file = std::fs::File::open(path)?;
    let out = load_from_reader(file)?;
    log::info!(
        "loaded {} contracts from {}",
        out.0.len(),
        path.display()
    );
    Ok(out)
}

/// Read a delimited contract export, rename its columns and normalize every row.
pub fn load_from_reader<R: Read>(reader: R) -> Result<(ContractTable, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let raw_headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let columns = rename_columns(&raw_headers);

    let mut report = LoadReport {
        renamed_columns: raw_headers
            .iter()
            .zip(&columns)
            .filter(|(raw, label)| raw != label)
            .count(),
        ..Default::default()
    };

    let fields = locate_fields(&columns);
    for field in Field::ALL {
        if !fields.contains_key(&field) {
            log::debug!("column '{}' not present in export", field.label());
        }
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                log::debug!("skipping unreadable row {}: {}", report.total_rows, e);
                report.parse_errors += 1;
                continue;
            }
        };
        records.push(normalize_row(&row, &columns, &fields, &mut report));
    }

    if report.parse_errors > 0 {
        log::warn!("{} rows could not be read and were skipped", report.parse_errors);
    }
    for (column, n) in &report.unparseable_dates {
        log::debug!("{} unparseable dates in '{}' cleared", n, column);
    }

    let table = ContractTable {
        columns,
        records,
        fields,
    };
    Ok((table, report))
}

fn locate_fields(columns: &[String]) -> BTreeMap<Field, usize> {
    Field::ALL
        .iter()
        .filter_map(|f| {
            columns
                .iter()
                .position(|c| c == f.label())
                .or_else(|| columns.iter().position(|c| c == f.source_key()))
                .map(|i| (*f, i))
        })
        .collect()
}

fn normalize_row(
    row: &StringRecord,
    columns: &[String],
    fields: &BTreeMap<Field, usize>,
    report: &mut LoadReport,
) -> ContractRecord {
    let mut cells: Vec<Option<String>> = (0..columns.len())
        .map(|i| clean_cell(row.get(i)))
        .collect();
    if row.len() > columns.len() {
        log::debug!("row has {} fields, header has {}", row.len(), columns.len());
    }

    let mut rec = ContractRecord::default();

    for (&field, &idx) in fields {
        let Some(cell) = cells[idx].clone() else {
            continue;
        };
        if field.is_date() {
            let parsed = parse_date(Some(&cell));
            match parsed {
                Some(d) => cells[idx] = Some(d.format("%Y-%m-%d").to_string()),
                None => {
                    *report
                        .unparseable_dates
                        .entry(columns[idx].clone())
                        .or_default() += 1;
                    cells[idx] = None;
                }
            }
            set_date(&mut rec, field, parsed);
            continue;
        }
        match field {
            Field::AnnualSalesValue => {
                let money = parse_money(&cell);
                if money.amount.is_none() {
                    report.unparseable_amounts += 1;
                }
                rec.annual_sales = Some(money);
            }
            Field::ConsignmentValue => rec.consignment_value = parse_number(Some(&cell)),
            Field::CapitalValue => rec.capital_value = parse_number(Some(&cell)),
            Field::TotalProcedureCommitments => {
                rec.total_procedure_commitments = parse_number(Some(&cell))
            }
            _ => set_text(&mut rec, field, cell),
        }
    }

    rec.cells = cells;
    rec
}

fn set_date(rec: &mut ContractRecord, field: Field, value: Option<chrono::NaiveDate>) {
    let slot = match field {
        Field::StartDate => &mut rec.start_date,
        Field::EndDate => &mut rec.end_date,
        Field::OriginalEndDate => &mut rec.original_end_date,
        Field::ActivatedDate => &mut rec.activated_date,
        Field::CanceledDate => &mut rec.canceled_date,
        Field::NotificationDate => &mut rec.notification_date,
        Field::PriceIncreaseDate => &mut rec.price_increase_date,
        Field::CustomerSignedDate => &mut rec.customer_signed_date,
        Field::LastEvaluationDate => &mut rec.last_evaluation_date,
        _ => return,
    };
    *slot = value;
}

fn set_text(rec: &mut ContractRecord, field: Field, value: String) {
    let slot = match field {
        Field::ContractNumber => &mut rec.contract_number,
        Field::Id => &mut rec.id,
        Field::Name => &mut rec.name,
        Field::Description => &mut rec.description,
        Field::ContractType => &mut rec.contract_type,
        Field::BusinessUnit => &mut rec.business_unit,
        Field::Region => &mut rec.region,
        Field::Country => &mut rec.country,
        Field::Status => &mut rec.status,
        _ => return,
    };
    *slot = Some(value);
}
