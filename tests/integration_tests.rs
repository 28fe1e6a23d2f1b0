use account_analytics::*;
use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn export_to_csv(series: &Series, filename: &str) -> std::result::Result<PathBuf, Box<dyn std::error::Error>> {
    let path = std::env::temp_dir().join(filename);
    let mut file = File::create(&path)?;

    write!(file, "Month")?;
    for category in &series.categories {
        write!(file, ",{}", category)?;
    }
    writeln!(file)?;

    for bucket in &series.buckets {
        write!(file, "{}", bucket.month)?;
        for category in &series.categories {
            write!(file, ",{:.2}", bucket.get(category))?;
        }
        writeln!(file)?;
    }

    Ok(path)
}

fn day(year: i32, month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, d).unwrap()
}

fn month(text: &str) -> MonthKey {
    MonthKey::parse(text).unwrap()
}

fn usage(client: &str, product: &str, month: &str, volume: &str) -> Record {
    Record::new()
        .with(fields::CLIENT_NAME, client)
        .with(fields::PRODUCT, product)
        .with(fields::MONTH, month)
        .with(fields::VOLUME, volume)
}

#[test]
fn test_filter_selection_with_missing_client_metadata() {
    let store = RecordStore::new(vec![Table::new(
        tables::CONTRACT_COMPONENTS,
        vec![Record::new()
            .with(fields::CLIENT_NAME, "Acme")
            .with(fields::STATUS, "Active")],
    )]);
    let config = EngineConfig::default();
    let dashboard = Dashboard::new(&store, &config);
    let filter = FilterSelection::new().with_status("Active");

    let filtered = dashboard.filtered_components(&filter);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].get(fields::CLIENT_NAME), Some("Acme"));

    let key_info = dashboard.key_info(&filter).unwrap();
    assert_eq!(key_info.deal_type, "N/A");
    assert_eq!(key_info.executive_sponsor, "N/A");
    assert_eq!(key_info.contracts_folder, None);

    let health = dashboard.client_health(&filter).unwrap();
    assert_eq!(health.status, "N/A");
    assert_eq!(health.total_collection, 0.0);

    println!("✓ Filter selection test passed");
}

#[test]
fn test_monthly_buckets_and_cumulative_consumption() {
    let records = vec![
        usage("Acme", "X", "2024-01-15", "1,000"),
        usage("Acme", "X", "2024-02-10", "500"),
    ];
    let range = MonthRange::parse("2024-01:2024-02").unwrap();

    let series = bucket_by_month(&records, fields::MONTH, fields::PRODUCT, fields::VOLUME, &range);
    assert_eq!(series.categories, vec!["X"]);
    assert_eq!(series.len(), 2);
    assert_eq!(series.value(month("2024-01"), "X"), 1000.0);
    assert_eq!(series.value(month("2024-02"), "X"), 500.0);

    let cumulative = to_cumulative(&series);
    assert_eq!(cumulative.value(month("2024-01"), "X"), 1000.0);
    assert_eq!(cumulative.value(month("2024-02"), "X"), 1500.0);

    let path = export_to_csv(&cumulative, "test_cumulative_consumption.csv").unwrap();
    println!("✓ Bucketing test passed - output: {}", path.display());
}

#[test]
fn test_accrual_over_twelve_months() {
    let contracts = vec![
        Record::new()
            .with(fields::CLIENT_NAME, "Acme")
            .with(fields::SUB_PRODUCT, "X")
            .with(fields::START_DATE, "2024-01-01")
            .with(fields::END_DATE, "2024-06-30")
            .with(fields::LICENSE_ORDERED, "700"),
        Record::new()
            .with(fields::CLIENT_NAME, "Acme")
            .with(fields::SUB_PRODUCT, "X")
            .with(fields::START_DATE, "2024-03-01")
            .with(fields::END_DATE, "2024-12-31")
            .with(fields::LICENSE_ORDERED, "500"),
    ];

    let accrual = project_accrual(&contracts, fields::LICENSE_ORDERED).unwrap();
    assert_eq!(accrual.month_count(), 12);
    assert_eq!(accrual.total_ordered, 1200.0);
    assert_eq!(accrual.per_month_increment, 100.0);
    assert_eq!(accrual.final_value(), 1200.0);

    let series = accrual.to_series();
    assert_eq!(series.value(month("2024-01"), ORDERED_CATEGORY), 100.0);
    assert_eq!(series.value(month("2024-12"), ORDERED_CATEGORY), 1200.0);

    println!("✓ Accrual test passed");
}

#[test]
fn test_no_recent_consumption_has_no_exhaustion_date() {
    let consumption = vec![usage("Acme", "X", "2022-01-15", "900")];
    let reference = day(2024, 6, 15);

    let rate = daily_rate(&consumption, "Acme", "X", reference, 6).unwrap();
    assert_eq!(rate, 0.0);
    assert_eq!(project_exhaustion_date(500.0, rate, reference), None);

    println!("✓ Stalled consumption test passed");
}

#[test]
fn test_invoices_correlated_to_active_components() {
    let invoices = vec![
        Record::new()
            .with(fields::CONTRACT_COMPONENT_ID, "C1")
            .with(fields::INVOICE_AMOUNT, "2,500"),
        Record::new()
            .with(fields::CONTRACT_COMPONENT_ID, "C2")
            .with(fields::INVOICE_AMOUNT, "1,000"),
    ];
    let active = vec![Record::new().with(fields::CONTRACT_COMPONENT_ID, "C1")];

    let correlated = correlate(
        &invoices,
        tables::INVOICES,
        &active,
        tables::CONTRACT_COMPONENTS,
        JoinKey::ContractComponentId,
    );
    assert_eq!(correlated.len(), 1);
    assert_eq!(correlated[0].get(fields::CONTRACT_COMPONENT_ID), Some("C1"));

    let rollup = group_and_subtotal(
        correlated,
        fields::CONTRACT_COMPONENT_ID,
        &[fields::INVOICE_AMOUNT],
    );
    assert_eq!(rollup.total(fields::INVOICE_AMOUNT), 2500.0);

    println!("✓ Invoice correlation test passed");
}

#[test]
fn test_bucketing_is_idempotent_and_zero_filled() {
    let records = vec![
        usage("Acme", "X", "2024-01-05", "10"),
        usage("Acme", "Y", "2024-04-20", "7"),
        usage("Acme", "X", "2024-04-02", "3"),
        usage("Acme", "Z", "bad date", "1000"),
    ];
    let range = MonthRange::parse("2024-01:2024-05").unwrap();

    let first = bucket_by_month(&records, fields::MONTH, fields::PRODUCT, fields::VOLUME, &range);
    let second = bucket_by_month(&records, fields::MONTH, fields::PRODUCT, fields::VOLUME, &range);
    assert_eq!(first, second);

    let months: Vec<MonthKey> = first.months().collect();
    assert_eq!(months, range.months());
    for bucket in &first.buckets {
        for category in &first.categories {
            assert!(bucket.values.contains_key(category));
        }
    }
    assert_eq!(first.value(month("2024-02"), "X"), 0.0);
    assert_eq!(first.value(month("2024-03"), "Y"), 0.0);
    // Z never lands in a bucket but is still a category.
    assert!(first.categories.contains(&"Z".to_string()));
    assert_eq!(first.category_total("Z"), 0.0);
}

#[test]
fn test_cumulative_is_monotonic_for_non_negative_measures() {
    let records: Vec<Record> = (1..=12)
        .map(|m| usage("Acme", "X", &format!("2024-{:02}-10", m), &format!("{}", (m * 37) % 11)))
        .collect();
    let range = MonthRange::parse("2024-01:2024-12").unwrap();

    let series = bucket_by_month(&records, fields::MONTH, fields::PRODUCT, fields::VOLUME, &range);
    let cumulative = to_cumulative(&series);

    let values: Vec<f64> = cumulative.buckets.iter().map(|b| b.get("X")).collect();
    assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(cumulative.last_value("X"), series.category_total("X"));
}

#[test]
fn test_numeric_fail_soft() {
    assert_eq!(normalize_numeric(Some("abc")), 0.0);
    assert_eq!(normalize_numeric(Some("")), 0.0);
    assert_eq!(normalize_numeric(None), 0.0);
    assert_eq!(normalize_numeric(Some("1,234.5")), 1234.5);

    let rows = vec![
        Record::new()
            .with(fields::CONTRACT_COMPONENT_ID, "C1")
            .with(fields::AMOUNT, "n/a"),
        Record::new().with(fields::CONTRACT_COMPONENT_ID, "C1"),
        Record::new()
            .with(fields::CONTRACT_COMPONENT_ID, "C1")
            .with(fields::AMOUNT, "40"),
    ];
    let rollup = group_and_subtotal(&rows, fields::CONTRACT_COMPONENT_ID, &[fields::AMOUNT]);
    assert_eq!(rollup.total(fields::AMOUNT), 40.0);
}

#[test]
fn test_percent_of_total_is_bounded() {
    let range = MonthRange::parse("2024-03").unwrap();
    let records = vec![
        Record::new()
            .with(fields::CUSTOMER_NAME, "Acme")
            .with(fields::MONTH, "2024-03-01")
            .with(fields::MRR, "100"),
        Record::new()
            .with(fields::CUSTOMER_NAME, "Globex")
            .with(fields::MONTH, "2024-03-01")
            .with(fields::MRR, "300"),
        Record::new()
            .with(fields::CUSTOMER_NAME, "Initech")
            .with(fields::MONTH, "2024-03-01")
            .with(fields::MRR, "0"),
    ];
    let by_client = bucket_by_month(&records, fields::MONTH, fields::CUSTOMER_NAME, fields::MRR, &range);

    let mut sum = 0.0;
    for client in ["Acme", "Globex", "Initech"] {
        let share = ShareMetric::from_series(&by_client, client, range.start());
        assert!((0.0..=100.0).contains(&share.percent_of_total));
        sum += share.percent_of_total;
    }
    assert!((sum - 100.0).abs() < 1e-9);

    assert_eq!(percent_of_total(10.0, 0.0), 0.0);
}

#[test]
fn test_dashboard_from_csv_tabs() -> anyhow::Result<()> {
    let components = "\
ClientName,CustomerName,AccountManager,Status,ContractComponentID,Description,SubProduct,StartDate,EndDate,LicenseOrdered,Price,Amount
Acme,Acme Holdings,Dana,Active,C1,Platform licence,X,2024-01-01,2024-12-31,\"1,200\",10,\"12,000\"
Acme,Acme Holdings,Dana,Active,C2,Unsigned Prospect Contract,X,2024-01-01,2024-12-31,600,10,\"6,000\"
Acme,Acme Holdings,Dana,Expired,C0,Platform licence,X,2022-01-01,2022-12-31,300,10,\"3,000\"
Globex,Globex Corp,Lee,Active,G1,Platform licence,X,2024-01-01,2024-12-31,100,10,\"1,000\"
";
    let consumption = "\
ClientName,Product,Month,Volume
Acme,X,2024-01-31,100
Acme,X,2024-02-29,150
Acme,X,2024-03-31,200
Globex,X,2024-03-31,40
";
    let invoices = "\
ContractComponentID,InvoiceNumber,InvoiceDate,InvoiceAmount,OutstandingAmount
C1,INV-1,2024-01-15,\"3,000\",0
C1,INV-2,2024-04-15,\"3,000\",\"3,000\"
C0,INV-0,2022-01-15,\"3,000\",0
";
    let clients = "\
CompanyName,DealType,ClientSince,RenewalDate,ContractsFolder
Acme,Enterprise,01/05/2019,2024-12-31,https://example.com/acme
";

    let store = RecordStore::new(vec![
        table_from_csv(tables::CONTRACT_COMPONENTS, components.as_bytes())?,
        table_from_csv(tables::CONSUMPTION, consumption.as_bytes())?,
        table_from_csv(tables::INVOICES, invoices.as_bytes())?,
        table_from_csv(tables::CLIENTS, clients.as_bytes())?,
    ]);
    let snapshots = SnapshotStore::new(store);
    let snapshot = snapshots.snapshot();

    let config = EngineConfig::default();
    let filter = FilterSelection::new().with_client("Acme");
    let overview = process_account_overview(&snapshot, &config, &filter, day(2024, 6, 30))?;

    assert_eq!(overview.filter_options.statuses, vec!["Active", "Expired"]);
    assert_eq!(overview.key_info.as_ref().map(|k| k.deal_type.as_str()), Some("Enterprise"));

    let contract_ids: Vec<&str> = overview.contracts.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(contract_ids, vec!["C1"]);
    assert_eq!(overview.contracts.total(fields::AMOUNT), 12_000.0);

    let invoices = overview.invoices.as_ref().expect("client selected");
    assert_eq!(invoices.invoices.len(), 2);
    assert_eq!(invoices.invoice_total(), 6_000.0);
    assert_eq!(invoices.outstanding_total(), 3_000.0);

    // The prospect row is in force, so it counts toward the accrual line.
    let utilization = overview.utilization.as_ref().expect("active contracts");
    assert_eq!(utilization.contracted, 1_800.0);
    assert_eq!(utilization.accrued, 900.0);
    assert_eq!(utilization.consumed, 450.0);
    assert_eq!(utilization.remaining, 1_350.0);
    assert!(utilization.daily_rate > 0.0);
    assert!(utilization.full_utilization_date.is_some());

    let consumption = overview.consumption.as_ref().expect("client selected");
    assert_eq!(consumption.monthly.len(), config.consumption_history_months);
    assert_eq!(consumption.totals.get("X"), Some(&450.0));

    let path = export_to_csv(&utilization.chart, "test_utilization_chart.csv")
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    println!("✓ Dashboard test passed - output: {}", path.display());
    Ok(())
}

#[test]
fn test_snapshot_refresh_keeps_views_consistent() {
    let snapshots = SnapshotStore::new(RecordStore::new(vec![Table::new(
        tables::CONSUMPTION,
        vec![usage("Acme", "X", "2024-03-01", "10")],
    )]));
    let config = EngineConfig::default();

    let before = snapshots.snapshot();
    snapshots.replace(RecordStore::new(vec![Table::new(
        tables::CONSUMPTION,
        vec![
            usage("Acme", "X", "2024-03-01", "10"),
            usage("Acme", "X", "2024-03-02", "15"),
        ],
    )]));
    let after = snapshots.snapshot();

    let reference = day(2024, 3, 31);
    let filter = FilterSelection::new().with_client("Acme");
    let old_view = Dashboard::new(&before, &config)
        .consumption("Acme", &filter, reference)
        .unwrap();
    let new_view = Dashboard::new(&after, &config)
        .consumption("Acme", &filter, reference)
        .unwrap();
    assert_eq!(old_view.totals.get("X"), Some(&10.0));
    assert_eq!(new_view.totals.get("X"), Some(&25.0));
}

#[test]
fn test_schema_generation() {
    let series_schema = Series::schema_as_json().unwrap();
    assert!(series_schema.contains("categories"));
    assert!(series_schema.contains("buckets"));

    let config_schema = EngineConfig::schema_as_json().unwrap();
    assert!(config_schema.contains("run_rate_window_months"));
    assert!(config_schema.contains("prospect_description"));

    println!("✓ Schema generation test passed");
}
