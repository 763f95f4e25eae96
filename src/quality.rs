// Missing-value metrics, globally and per category value.
use crate::filter::{distinct_values, TableView};
use crate::schema::Field;
use crate::types::{CategoryMissingRow, ContractTable, MissingValueRow, SkipReason};
use crate::util::{percentage, round2};
use std::cmp::Ordering;

/// Missing counts for `columns` (every table column when `None`), most-missing first.
///
/// Columns that are not part of the table are ignored. Rows whose column is
/// in `kpi_columns` get the `kpi_relevant` flag.
pub fn missing_report(
    view: &TableView<'_>,
    columns: Option<&[String]>,
    kpi_columns: &[String],
) -> Vec<MissingValueRow> {
    let table = view.table;
    let selected: Vec<(usize, &String)> = match columns {
        Some(cols) => cols
            .iter()
            .filter_map(|c| table.column_index(c).map(|i| (i, c)))
            .collect(),
        None => table.columns.iter().enumerate().collect(),
    };

    let total = view.len();
    let mut rows: Vec<MissingValueRow> = selected
        .into_iter()
        .map(|(idx, name)| {
            let missing = view.records.iter().filter(|r| r.is_missing(idx)).count();
            MissingValueRow {
                column: name.clone(),
                missing_count: missing,
                missing_percentage: round2(percentage(missing, total)),
                kpi_relevant: kpi_columns.contains(name),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.missing_percentage
            .partial_cmp(&a.missing_percentage)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

/// Missing percentages of `columns` within each value of `category`.
///
/// Category values are visited in order of first appearance; rows with no
/// category value are left out of every partition.
pub fn missing_by_category(
    table: &ContractTable,
    category: Field,
    columns: &[String],
) -> Result<Vec<CategoryMissingRow>, SkipReason> {
    table.require(&[category])?;
    let values = distinct_values(table, category);
    if values.is_empty() {
        return Err(SkipReason::NoCategoryValues(category));
    }
    let targets: Vec<(usize, &String)> = columns
        .iter()
        .filter_map(|c| table.column_index(c).map(|i| (i, c)))
        .collect();

    let mut out = Vec::with_capacity(values.len() * targets.len());
    for value in values {
        let members: Vec<_> = table
            .records
            .iter()
            .filter(|r| r.text(category) == Some(value.as_str()))
            .collect();
        let n = members.len();
        if n == 0 {
            continue;
        }
        for (idx, name) in &targets {
            let missing = members.iter().filter(|r| r.is_missing(*idx)).count();
            out.push(CategoryMissingRow {
                category: value.clone(),
                column: (*name).clone(),
                missing_count: missing,
                missing_percentage: round2(percentage(missing, n)),
                category_rows: n,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_from_reader;
    use proptest::prelude::*;

    const CSV: &str = "\
ContractRegion__c,Status,Contract_End_Date__c,AnnualSalesValue__c
North,Active,2024-01-01,100
North,,,200
South,Active,garbage,
,Draft,2024-02-01,50
";

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reports_counts_and_rounded_percentages() {
        let (table, _) = load_from_reader(CSV.as_bytes()).unwrap();
        let view = TableView::all(&table);
        let rows = missing_report(&view, None, &cols(&["End Date"]));
        assert_eq!(rows.len(), 4);
        let end = rows.iter().find(|r| r.column == "End Date").unwrap();
        assert_eq!(end.missing_count, 2);
        assert_eq!(end.missing_percentage, 50.0);
        assert!(end.kpi_relevant);
        let status = rows.iter().find(|r| r.column == "Status").unwrap();
        assert_eq!(status.missing_percentage, 25.0);
        assert!(!status.kpi_relevant);
        assert!(rows.windows(2).all(|w| w[0].missing_percentage >= w[1].missing_percentage));
    }

    #[test]
    fn selected_columns_skip_unknown_names() {
        let (table, _) = load_from_reader(CSV.as_bytes()).unwrap();
        let view = TableView::all(&table);
        let rows = missing_report(&view, Some(cols(&["Status", "Nope"]).as_slice()), &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].column, "Status");
    }

    #[test]
    fn empty_view_reports_zero_percent() {
        let (table, _) = load_from_reader("Status,StartDate\n".as_bytes()).unwrap();
        let view = TableView::all(&table);
        let rows = missing_report(&view, None, &[]);
        assert!(rows.iter().all(|r| r.missing_percentage == 0.0 && r.missing_count == 0));
    }

    #[test]
    fn partitions_by_present_category_values_only() {
        let (table, _) = load_from_reader(CSV.as_bytes()).unwrap();
        let rows =
            missing_by_category(&table, Field::Region, &cols(&["Status", "End Date", "Annual Sales Value"]))
                .unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.category == "North" || r.category == "South"));
        let north_status = rows
            .iter()
            .find(|r| r.category == "North" && r.column == "Status")
            .unwrap();
        assert_eq!(north_status.missing_percentage, 50.0);
        assert_eq!(north_status.category_rows, 2);
        let south_sales = rows
            .iter()
            .find(|r| r.category == "South" && r.column == "Annual Sales Value")
            .unwrap();
        assert_eq!(south_sales.missing_percentage, 100.0);
    }

    #[test]
    fn missing_category_column_is_skipped() {
        let (table, _) = load_from_reader(CSV.as_bytes()).unwrap();
        let err = missing_by_category(&table, Field::Country, &cols(&["Status"])).unwrap_err();
        assert_eq!(err, SkipReason::MissingColumns(vec![Field::Country]));

        let (table, _) = load_from_reader("ContractCountry__c,Status\n,Active\n".as_bytes()).unwrap();
        let err = missing_by_category(&table, Field::Country, &cols(&["Status"])).unwrap_err();
        assert_eq!(err, SkipReason::NoCategoryValues(Field::Country));
    }

    proptest! {
        #[test]
        fn percentages_agree_with_counts(cells in proptest::collection::vec(any::<bool>(), 1..200)) {
            let mut csv = String::from("Status,Other\n");
            for present in &cells {
                csv.push_str(if *present { "Active,x\n" } else { ",x\n" });
            }
            let (table, _) = load_from_reader(csv.as_bytes()).unwrap();
            let view = TableView::all(&table);
            let rows = missing_report(&view, Some(cols(&["Status"]).as_slice()), &[]);
            let row = &rows[0];
            let total = cells.len() as f64;
            prop_assert!((0.0..=100.0).contains(&row.missing_percentage));
            let back = (row.missing_percentage / 100.0 * total).round() as usize;
            prop_assert_eq!(back, row.missing_count);
        }
    }
}
