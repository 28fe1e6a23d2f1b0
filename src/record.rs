use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Names of the tabs pulled from the account-management spreadsheet.
pub mod tables {
    pub const CONTRACT_COMPONENTS: &str = "ContractComponents";
    pub const CONSUMPTION: &str = "Consumption";
    pub const INVOICES: &str = "Invoices";
    pub const CLIENTS: &str = "Clients";
    pub const RECEIPTS: &str = "Receipts";
    pub const REVENUE_SUMMARY: &str = "RevenueSummary";
}

/// Column headers the engine knows about. Anything else is carried along
/// untouched and ignored.
pub mod fields {
    // ContractComponents
    pub const CLIENT_NAME: &str = "ClientName";
    pub const CUSTOMER_NAME: &str = "CustomerName";
    pub const ACCOUNT_MANAGER: &str = "AccountManager";
    pub const STATUS: &str = "Status";
    pub const CONTRACT_COMPONENT_ID: &str = "ContractComponentID";
    pub const DESCRIPTION: &str = "Description";
    pub const SUB_PRODUCT: &str = "SubProduct";
    pub const START_DATE: &str = "StartDate";
    pub const END_DATE: &str = "EndDate";
    pub const LICENSE_ORDERED: &str = "LicenseOrdered";
    pub const PRICE: &str = "Price";
    pub const AMOUNT: &str = "Amount";
    pub const VAT_APPLICABLE: &str = "VATApplicable";

    // Consumption
    pub const PRODUCT: &str = "Product";
    pub const MONTH: &str = "Month";
    pub const VOLUME: &str = "Volume";

    // Invoices
    pub const INVOICE_NUMBER: &str = "InvoiceNumber";
    pub const INVOICE_DATE: &str = "InvoiceDate";
    pub const INVOICE_AMOUNT: &str = "InvoiceAmount";
    pub const OUTSTANDING_AMOUNT: &str = "OutstandingAmount";

    // Clients
    pub const COMPANY_NAME: &str = "CompanyName";
    pub const DEAL_TYPE: &str = "DealType";
    pub const CUSTOMER_SUCCESS: &str = "CustomerSuccess";
    pub const EXECUTIVE_SPONSOR: &str = "ExecutiveSponsor";
    pub const SUPPORT_TYPE: &str = "SupportType";
    pub const DEAL_CATEGORY: &str = "DealCategory";
    pub const ACTIVE_COUNTRIES: &str = "ActiveCountries";
    pub const CONTRACTS_FOLDER: &str = "ContractsFolder";
    pub const CLIENT_SINCE: &str = "ClientSince";
    pub const LIFETIME_MONTHS: &str = "LifeTimemonths";
    pub const RENEWAL_DATE: &str = "RenewalDate";
    pub const MONTHS_TO_RENEWAL: &str = "MonthstoRenewal";
    pub const LICENSE_TYPE: &str = "LicenseType";
    pub const RENEWAL_TYPE: &str = "RenewalType";
    pub const ROLLOVER: &str = "Rollover";

    // Receipts
    pub const REVENUE_COLLECTION: &str = "RevenueCollection";

    // RevenueSummary
    pub const SUB_PRODUCT_NAME: &str = "SubProductName";
    pub const MRR: &str = "MRR";
    pub const REVENUE: &str = "Revenue";
}

/// One spreadsheet row: header name to cell text. Empty and missing cells
/// are indistinguishable to readers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Option<String>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.fields.insert(field.to_string(), Some(value.to_string()));
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Option<String>) {
        self.fields.insert(field.into(), value);
    }

    /// Cell text, or `None` when the field is missing, null or blank.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

/// Immutable snapshot of every fetched table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordStore {
    tables: BTreeMap<String, Vec<Record>>,
}

impl RecordStore {
    pub fn new(tables: impl IntoIterator<Item = Table>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| (t.name, t.records))
                .collect(),
        }
    }

    /// Rows of `name`; an unknown table reads as empty.
    pub fn table(&self, name: &str) -> &[Record] {
        self.tables.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn record_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn contract_components(&self) -> &[Record] {
        self.table(tables::CONTRACT_COMPONENTS)
    }

    pub fn consumption(&self) -> &[Record] {
        self.table(tables::CONSUMPTION)
    }

    pub fn invoices(&self) -> &[Record] {
        self.table(tables::INVOICES)
    }

    pub fn clients(&self) -> &[Record] {
        self.table(tables::CLIENTS)
    }

    pub fn receipts(&self) -> &[Record] {
        self.table(tables::RECEIPTS)
    }

    pub fn revenue_summary(&self) -> &[Record] {
        self.table(tables::REVENUE_SUMMARY)
    }
}

/// Business keys used to line up rows across tables. The same key lives
/// under different column headers depending on the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKey {
    ClientName,
    ContractComponentId,
    Product,
    Month,
}

impl JoinKey {
    pub fn field_for(&self, table: &str) -> &'static str {
        match (self, table) {
            (JoinKey::ClientName, tables::CLIENTS) => fields::COMPANY_NAME,
            (JoinKey::ClientName, tables::REVENUE_SUMMARY) => fields::CUSTOMER_NAME,
            (JoinKey::ClientName, _) => fields::CLIENT_NAME,
            (JoinKey::ContractComponentId, _) => fields::CONTRACT_COMPONENT_ID,
            (JoinKey::Product, tables::CONTRACT_COMPONENTS) => fields::SUB_PRODUCT,
            (JoinKey::Product, tables::REVENUE_SUMMARY) => fields::SUB_PRODUCT_NAME,
            (JoinKey::Product, _) => fields::PRODUCT,
            (JoinKey::Month, tables::INVOICES) => fields::INVOICE_DATE,
            (JoinKey::Month, _) => fields::MONTH,
        }
    }
}
