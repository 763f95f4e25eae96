//! Category filters over a read-only contract table.

use crate::schema::Field;
use crate::types::{ContractRecord, ContractTable};
use std::collections::{BTreeMap, BTreeSet};

/// Fields a report can be narrowed by.
pub const FILTERABLE: [Field; 5] = [
    Field::ContractType,
    Field::BusinessUnit,
    Field::Region,
    Field::Country,
    Field::Status,
];

/// Accepted values per column, combined with AND.
///
/// An empty (or absent) value set leaves that column unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    accepted: BTreeMap<Field, BTreeSet<String>>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add accepted values for `field`, extending any already present.
    pub fn accept<I, S>(mut self, field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted
            .entry(field)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn accepted(&self, field: Field) -> Option<&BTreeSet<String>> {
        self.accepted.get(&field).filter(|v| !v.is_empty())
    }

    pub fn is_unrestricted(&self) -> bool {
        self.accepted.values().all(BTreeSet::is_empty)
    }

    pub fn matches(&self, record: &ContractRecord) -> bool {
        self.accepted
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .all(|(field, values)| {
                record
                    .text(*field)
                    .is_some_and(|v| values.contains(v))
            })
    }
}

/// A borrowed, row-filtered window onto a [`ContractTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableView<'a> {
    pub table: &'a ContractTable,
    pub records: Vec<&'a ContractRecord>,
}

impl<'a> TableView<'a> {
    pub fn all(table: &'a ContractTable) -> Self {
        TableView {
            table,
            records: table.records.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep the rows matching `criteria`, in their original order.
    pub fn filter(&self, criteria: &FilterCriteria) -> TableView<'a> {
        TableView {
            table: self.table,
            records: self
                .records
                .iter()
                .copied()
                .filter(|r| criteria.matches(r))
                .collect(),
        }
    }
}

/// Distinct non-null values of a filterable column, in order of first appearance.
pub fn distinct_values(table: &ContractTable, field: Field) -> Vec<String> {
    let mut seen = BTreeSet::new();
    table
        .records
        .iter()
        .filter_map(|r| r.text(field))
        .filter(|v| seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(region: Option<&str>, kind: &str, status: &str) -> ContractRecord {
        ContractRecord {
            region: region.map(str::to_string),
            contract_type: Some(kind.to_string()),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    fn table() -> ContractTable {
        ContractTable {
            records: vec![
                record(Some("North"), "Rebate", "Active"),
                record(Some("South"), "Rebate", "Draft"),
                record(None, "Consignment", "Active"),
                record(Some("North"), "Consignment", "Expired"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn empty_criteria_keep_everything() {
        let t = table();
        let view = TableView::all(&t).filter(&FilterCriteria::new().accept(Field::Region, Vec::<String>::new()));
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn criteria_combine_with_and_and_keep_order() {
        let t = table();
        let criteria = FilterCriteria::new()
            .accept(Field::Region, ["North"])
            .accept(Field::ContractType, ["Rebate", "Consignment"]);
        let view = TableView::all(&t).filter(&criteria);
        assert_eq!(view.len(), 2);
        assert_eq!(view.records[0].status.as_deref(), Some("Active"));
        assert_eq!(view.records[1].status.as_deref(), Some("Expired"));
        assert_eq!(t.records.len(), 4);
    }

    #[test]
    fn null_values_never_match_a_restriction() {
        let t = table();
        let view = TableView::all(&t).filter(&FilterCriteria::new().accept(Field::Status, ["Active"]));
        assert_eq!(view.len(), 2);
        let view = view.filter(&FilterCriteria::new().accept(Field::Region, ["North", "South"]));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn distinct_values_follow_first_appearance() {
        let t = table();
        assert_eq!(distinct_values(&t, Field::Region), vec!["North", "South"]);
    }

    proptest! {
        #[test]
        fn filtering_is_idempotent(
            rows in proptest::collection::vec((0usize..3, 0usize..3), 0..40),
            wanted in proptest::collection::btree_set(0usize..3, 0..3),
        ) {
            let names = ["A", "B", "C"];
            let t = ContractTable {
                records: rows
                    .iter()
                    .map(|(r, s)| record(Some(names[*r]), "T", names[*s]))
                    .collect(),
                ..Default::default()
            };
            let criteria = FilterCriteria::new().accept(Field::Region, wanted.iter().map(|i| names[*i]));
            let once = TableView::all(&t).filter(&criteria);
            let twice = once.filter(&criteria);
            prop_assert_eq!(once, twice);
        }
    }
}
