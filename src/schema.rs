// Column naming for contract exports.
//
// CRM exports use field API names (`ContractRegion__c`, `Contract_End_Date__c`,
// ...). Everything downstream of the loader addresses columns by their display
// label instead, so the mapping below is the one place those names live.
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Semantic columns the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Field {
    ContractNumber,
    Id,
    Name,
    Description,
    ContractType,
    BusinessUnit,
    Region,
    Country,
    Status,
    StartDate,
    EndDate,
    OriginalEndDate,
    ActivatedDate,
    CanceledDate,
    NotificationDate,
    PriceIncreaseDate,
    CustomerSignedDate,
    LastEvaluationDate,
    AnnualSalesValue,
    ConsignmentValue,
    CapitalValue,
    TotalProcedureCommitments,
}

impl Field {
    pub const ALL: [Field; 22] = [
        Field::ContractNumber,
        Field::Id,
        Field::Name,
        Field::Description,
        Field::ContractType,
        Field::BusinessUnit,
        Field::Region,
        Field::Country,
        Field::Status,
        Field::StartDate,
        Field::EndDate,
        Field::OriginalEndDate,
        Field::ActivatedDate,
        Field::CanceledDate,
        Field::NotificationDate,
        Field::PriceIncreaseDate,
        Field::CustomerSignedDate,
        Field::LastEvaluationDate,
        Field::AnnualSalesValue,
        Field::ConsignmentValue,
        Field::CapitalValue,
        Field::TotalProcedureCommitments,
    ];

    pub const DATES: [Field; 9] = [
        Field::CustomerSignedDate,
        Field::CanceledDate,
        Field::NotificationDate,
        Field::StartDate,
        Field::EndDate,
        Field::OriginalEndDate,
        Field::PriceIncreaseDate,
        Field::LastEvaluationDate,
        Field::ActivatedDate,
    ];

    /// Key used by the CRM export.
    pub fn source_key(self) -> &'static str {
        match self {
            Field::ContractNumber => "ContractNumber",
            Field::Id => "Id",
            Field::Name => "Name",
            Field::Description => "Contract_Description__c",
            Field::ContractType => "EMEA_Type_of_contract__c",
            Field::BusinessUnit => "BUs_included_in_Contract__c",
            Field::Region => "ContractRegion__c",
            Field::Country => "ContractCountry__c",
            Field::Status => "Status",
            Field::StartDate => "StartDate",
            Field::EndDate => "Contract_End_Date__c",
            Field::OriginalEndDate => "Contract_Original_End_Date__c",
            Field::ActivatedDate => "ActivatedDate",
            Field::CanceledDate => "Canceled_Date__c",
            Field::NotificationDate => "EMEA_Notification_Date__c",
            Field::PriceIncreaseDate => "Price_Increase_Opportunity_Date__c",
            Field::CustomerSignedDate => "CustomerSignedDate",
            Field::LastEvaluationDate => "LastEvaluationDate__c",
            Field::AnnualSalesValue => "AnnualSalesValue__c",
            Field::ConsignmentValue => "ConsignmentValue__c",
            Field::CapitalValue => "CapitalValue__c",
            Field::TotalProcedureCommitments => "TotalProcedureCommitments__c",
        }
    }

    /// Human-readable column label used after loading.
    pub fn label(self) -> &'static str {
        match self {
            Field::ContractNumber => "Contract Number",
            Field::Id => "Contract ID",
            Field::Name => "Contract Name",
            Field::Description => "Contract Description",
            Field::ContractType => "Contract Type",
            Field::BusinessUnit => "Business Units",
            Field::Region => "Cluster",
            Field::Country => "Country",
            Field::Status => "Status",
            Field::StartDate => "Start Date",
            Field::EndDate => "End Date",
            Field::OriginalEndDate => "Original End Date",
            Field::ActivatedDate => "Activated Date",
            Field::CanceledDate => "Cancellation Date",
            Field::NotificationDate => "Notification Date",
            Field::PriceIncreaseDate => "Price Increase Date",
            Field::CustomerSignedDate => "Customer Signed Date",
            Field::LastEvaluationDate => "Last Evaluation Date",
            Field::AnnualSalesValue => "Annual Sales Value",
            Field::ConsignmentValue => "Consignment Value",
            Field::CapitalValue => "Capital Value",
            Field::TotalProcedureCommitments => "Total Procedure Commitments",
        }
    }

    pub fn is_date(self) -> bool {
        Field::DATES.contains(&self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Export keys that carry no pipeline semantics but still get a nicer label.
const PASSTHROUGH_LABELS: [(&str, &str); 4] = [
    ("AccountId", "Account ID"),
    ("Sold_To_Account_ID__c", "Sold-To Account ID"),
    ("Buying_Group__c", "Buying Group"),
    ("ExternalContractID__c", "External Contract ID"),
];

static LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    Field::ALL
        .iter()
        .map(|f| (f.source_key(), f.label()))
        .chain(PASSTHROUGH_LABELS)
        .collect()
});

/// Label for a raw export key; unmapped keys (including labels) come back unchanged.
pub fn display_label(key: &str) -> &str {
    LABELS.get(key).copied().unwrap_or(key)
}

/// Rename a header row to display labels.
///
/// The output has the same length and order as the input. When a label would
/// collide with a header already present, the raw key is kept for that column.
pub fn rename_columns(headers: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = headers.iter().cloned().collect();
    headers
        .iter()
        .map(|key| {
            let label = display_label(key);
            if label == key {
                return key.clone();
            }
            if taken.contains(label) {
                log::warn!("column '{}' kept its export name: label '{}' already present", key, label);
                return key.clone();
            }
            taken.insert(label.to_string());
            label.to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn maps_known_keys_and_passes_unknown_through() {
        assert_eq!(display_label("ContractRegion__c"), "Cluster");
        assert_eq!(display_label("AccountId"), "Account ID");
        assert_eq!(display_label("SomethingElse__c"), "SomethingElse__c");
    }

    #[test]
    fn renaming_is_idempotent() {
        let raw = headers(&["ContractNumber", "Status", "Contract_End_Date__c", "Foo"]);
        let once = rename_columns(&raw);
        let twice = rename_columns(&once);
        assert_eq!(once, twice);
        assert_eq!(once, headers(&["Contract Number", "Status", "End Date", "Foo"]));
    }

    #[test]
    fn collision_keeps_raw_key() {
        let raw = headers(&["Cluster", "ContractRegion__c"]);
        let renamed = rename_columns(&raw);
        assert_eq!(renamed, headers(&["Cluster", "ContractRegion__c"]));
    }

    #[test]
    fn labels_are_never_other_keys() {
        for (key, label) in LABELS.iter() {
            if key != label {
                assert!(!LABELS.contains_key(label), "label {label} is also a key");
            }
        }
    }
}
