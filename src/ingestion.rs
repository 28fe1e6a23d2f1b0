//! Turns fetched sheet payloads into a [`RecordStore`]. Fetching itself
//! happens elsewhere; these functions only reshape what came back.

use crate::error::{AnalyticsError, Result};
use crate::record::{Record, RecordStore, Table};
use log::debug;
use std::io::Read;

/// Builds a table from a header row followed by data rows, the shape the
/// sheets values API returns. Short rows leave trailing fields absent and
/// empty cells are stored as absent.
pub fn table_from_rows<S: AsRef<str>>(name: &str, rows: &[Vec<S>]) -> Result<Table> {
    let Some((header, data)) = rows.split_first() else {
        return Ok(Table::new(name, Vec::new()));
    };

    let header: Vec<&str> = header.iter().map(|h| h.as_ref().trim()).collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(AnalyticsError::MissingHeader(name.to_string()));
    }

    let records = data
        .iter()
        .map(|row| record_from_cells(&header, row.iter().map(|c| c.as_ref())))
        .collect::<Vec<_>>();

    debug!("Loaded {} rows into table {}", records.len(), name);
    Ok(Table::new(name, records))
}

/// Same as [`table_from_rows`] for CSV text. Rows may have fewer or more
/// cells than the header.
pub fn table_from_csv<R: Read>(name: &str, reader: R) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(reader);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in csv_reader.records() {
        let row = result?;
        rows.push(row.iter().map(str::to_string).collect());
    }

    table_from_rows(name, &rows)
}

/// Parses `{ "<tab>": [ { "<field>": "<value>" | null, ... }, ... ] }`.
pub fn store_from_json(json: &str) -> Result<RecordStore> {
    let store: RecordStore = serde_json::from_str(json)?;
    debug!(
        "Parsed snapshot with {} tables and {} records",
        store.table_count(),
        store.record_count()
    );
    Ok(store)
}

/// Builds a store from one header-plus-rows grid per tab.
pub fn store_from_rows<S: AsRef<str>>(
    tabs: impl IntoIterator<Item = (String, Vec<Vec<S>>)>,
) -> Result<RecordStore> {
    let tables = tabs
        .into_iter()
        .map(|(name, rows)| table_from_rows(&name, &rows))
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordStore::new(tables))
}

fn record_from_cells<'c>(header: &[&str], cells: impl Iterator<Item = &'c str>) -> Record {
    let mut record = Record::new();
    let mut cells = cells;
    for field in header {
        let cell = cells.next().map(str::trim).filter(|c| !c.is_empty());
        if field.is_empty() {
            continue;
        }
        record.insert(*field, cell.map(str::to_string));
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{fields, tables};

    #[test]
    fn test_short_rows_leave_fields_absent() {
        let rows = vec![
            vec!["ClientName", "Status", "Amount"],
            vec!["Acme", "Active", "1,000"],
            vec!["Globex", ""],
        ];
        let table = table_from_rows(tables::CONTRACT_COMPONENTS, &rows).unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].get(fields::AMOUNT), Some("1,000"));
        assert_eq!(table.records[1].get(fields::STATUS), None);
        assert_eq!(table.records[1].get(fields::AMOUNT), None);
        assert_eq!(table.records[1].len(), 3);
    }

    #[test]
    fn test_empty_payload_is_empty_table() {
        let rows: Vec<Vec<String>> = Vec::new();
        let table = table_from_rows(tables::INVOICES, &rows).unwrap();
        assert!(table.records.is_empty());
    }

    #[test]
    fn test_blank_header_is_rejected() {
        let rows = vec![vec!["", " "], vec!["a", "b"]];
        let err = table_from_rows(tables::INVOICES, &rows).unwrap_err();
        assert!(matches!(err, AnalyticsError::MissingHeader(_)));
    }

    #[test]
    fn test_csv_ingestion() {
        let csv = "ContractComponentID,InvoiceAmount,OutstandingAmount\nC1,\"2,500\",0\nC2,\"1,000\"\n";
        let table = table_from_csv(tables::INVOICES, csv.as_bytes()).unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].get(fields::INVOICE_AMOUNT), Some("2,500"));
        assert_eq!(table.records[1].get(fields::OUTSTANDING_AMOUNT), None);
    }

    #[test]
    fn test_store_from_json() {
        let json = r#"{
            "Clients": [{"CompanyName": "Acme", "DealType": null}],
            "Receipts": [{"ClientName": "Acme", "RevenueCollection": "1,250"}]
        }"#;
        let store = store_from_json(json).unwrap();
        assert_eq!(store.table_count(), 2);
        assert_eq!(store.clients()[0].get(fields::DEAL_TYPE), None);
        assert_eq!(store.receipts()[0].get(fields::REVENUE_COLLECTION), Some("1,250"));
    }

    #[test]
    fn test_store_from_rows() {
        let tabs = vec![(
            tables::CLIENTS.to_string(),
            vec![vec!["CompanyName"], vec!["Acme"], vec!["Globex"]],
        )];
        let store = store_from_rows(tabs).unwrap();
        assert_eq!(store.clients().len(), 2);
    }
}
