//! # Account Analytics
//!
//! A library for turning loosely-typed spreadsheet tables (contracts,
//! consumption, invoices, clients, receipts, revenue) into the monthly
//! series and projections behind a customer-account dashboard.
//!
//! ## Core Concepts
//!
//! - **Records**: Rows keyed by column header, every cell an optional string
//! - **Series**: One bucket per calendar month of a range, zero-filled, with a value per category
//! - **Active Windows**: Contracts count on a date when it falls inside `StartDate..=EndDate`
//! - **Accrual**: Ordered licences spread evenly over the months the contracts cover
//! - **Run Rate**: Trailing daily consumption, used to project when licences run out
//!
//! ## Example
//!
//! ```rust,ignore
//! use account_analytics::*;
//! use chrono::NaiveDate;
//!
//! let store = store_from_json(r#"{
//!     "ContractComponents": [{
//!         "ClientName": "Acme", "ContractComponentID": "C1", "SubProduct": "X",
//!         "StartDate": "2024-01-01", "EndDate": "2024-12-31", "LicenseOrdered": "1,200"
//!     }],
//!     "Consumption": [{
//!         "ClientName": "Acme", "Product": "X", "Month": "2024-02-01", "Volume": "250"
//!     }]
//! }"#)?;
//!
//! let config = EngineConfig::default();
//! let filter = FilterSelection::new().with_client("Acme");
//! let overview = process_account_overview(
//!     &store,
//!     &config,
//!     &filter,
//!     NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
//! )?;
//!
//! let utilization = overview.utilization.unwrap();
//! assert_eq!(utilization.accrued, 300.0);
//! ```

pub mod accrual;
pub mod config;
pub mod correlate;
pub mod cumulative;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod kpi;
pub mod normalize;
pub mod record;
pub mod run_rate;
pub mod schema;
pub mod store;
pub mod subtotal;
pub mod utils;
pub mod views;
pub mod window;

pub use accrual::{project_accrual, AccrualProjection, ORDERED_CATEGORY};
pub use config::{EngineConfig, FilterSelection};
pub use correlate::{correlate, correlate_by_key, select_by_equality, unique_values};
pub use cumulative::to_cumulative;
pub use engine::{bucket_by_month, Bucketizer};
pub use error::{AnalyticsError, Result};
pub use ingestion::{store_from_json, store_from_rows, table_from_csv, table_from_rows};
pub use kpi::{annualize, current_period_value, percent_of_total, ShareMetric};
pub use normalize::{month_key_of, normalize_date, normalize_numeric};
pub use record::{fields, tables, JoinKey, Record, RecordStore, Table};
pub use run_rate::{daily_rate, project_exhaustion_date, trailing_daily_rate};
pub use schema::{MonthBucket, MonthKey, MonthRange, Series, UNSPECIFIED_CATEGORY};
pub use store::SnapshotStore;
pub use subtotal::{group_and_subtotal, GroupedSubtotal, SubtotalRollup};
pub use views::{AccountOverview, Dashboard};
pub use window::{filter_active, has_status, is_active, is_unsigned_prospect};

use chrono::NaiveDate;
use log::{debug, info};

/// Validates `config` and computes every dashboard block for `filter`.
pub fn process_account_overview<'s>(
    store: &'s RecordStore,
    config: &'s EngineConfig,
    filter: &FilterSelection,
    reference: NaiveDate,
) -> Result<AccountOverview<'s>> {
    config.validate()?;

    info!(
        "Processing account overview over {} tables ({} records)",
        store.table_count(),
        store.record_count()
    );
    debug!("Filter selection: {:?}", filter);

    Dashboard::new(store, config).overview(filter, reference)
}

/// Same as [`process_account_overview`], serialised to pretty JSON.
pub fn account_overview_json(
    store: &RecordStore,
    config: &EngineConfig,
    filter: &FilterSelection,
    reference: NaiveDate,
) -> Result<String> {
    let overview = process_account_overview(store, config, filter, reference)?;
    Ok(serde_json::to_string_pretty(&overview)?)
}
