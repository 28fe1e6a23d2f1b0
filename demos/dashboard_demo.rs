use account_analytics::*;
use chrono::NaiveDate;

const SNAPSHOT: &str = r#"{
    "ContractComponents": [
        {"ClientName": "Acme", "CustomerName": "Acme Holdings", "AccountManager": "Dana",
         "Status": "Active", "ContractComponentID": "C1", "Description": "Platform licence",
         "SubProduct": "Analytics", "StartDate": "2024-01-01", "EndDate": "2024-12-31",
         "LicenseOrdered": "1,200", "Price": "10", "Amount": "12,000"},
        {"ClientName": "Acme", "CustomerName": "Acme Holdings", "AccountManager": "Dana",
         "Status": "Active", "ContractComponentID": "C2", "Description": "Unsigned Prospect Contract",
         "SubProduct": "Analytics", "StartDate": "2024-07-01", "EndDate": "2025-06-30",
         "LicenseOrdered": "600", "Price": "10", "Amount": "6,000"},
        {"ClientName": "Globex", "CustomerName": "Globex Corp", "AccountManager": "Lee",
         "Status": "Active", "ContractComponentID": "G1", "Description": "Platform licence",
         "SubProduct": "Analytics", "StartDate": "2024-01-01", "EndDate": "2024-12-31",
         "LicenseOrdered": "300", "Price": "10", "Amount": "3,000"}
    ],
    "Consumption": [
        {"ClientName": "Acme", "Product": "Analytics", "Month": "2024-01-31", "Volume": "80"},
        {"ClientName": "Acme", "Product": "Analytics", "Month": "2024-02-29", "Volume": "95"},
        {"ClientName": "Acme", "Product": "Analytics", "Month": "2024-03-31", "Volume": "120"},
        {"ClientName": "Acme", "Product": "Analytics", "Month": "2024-04-30", "Volume": "140"}
    ],
    "Invoices": [
        {"ContractComponentID": "C1", "InvoiceNumber": "INV-1", "InvoiceDate": "2024-01-15",
         "InvoiceAmount": "6,000", "OutstandingAmount": "0"},
        {"ContractComponentID": "C1", "InvoiceNumber": "INV-2", "InvoiceDate": "2024-07-15",
         "InvoiceAmount": "6,000", "OutstandingAmount": "6,000"}
    ],
    "Clients": [
        {"CompanyName": "Acme", "DealType": "Enterprise", "CustomerSuccess": "Sam",
         "ClientSince": "2019-05-01", "RenewalDate": "2024-12-31", "LicenseType": "Named"}
    ],
    "Receipts": [
        {"ClientName": "Acme", "RevenueCollection": "6,000"}
    ],
    "RevenueSummary": [
        {"CustomerName": "Acme", "SubProductName": "Analytics", "Month": "2024-04-01",
         "MRR": "1,000", "Revenue": "1,000"},
        {"CustomerName": "Globex", "SubProductName": "Analytics", "Month": "2024-04-01",
         "MRR": "250", "Revenue": "250"}
    ]
}"#;

fn main() -> Result<()> {
    println!("📊 Account Dashboard Demo\n");

    let store = store_from_json(SNAPSHOT)?;
    let config = EngineConfig::default();
    let filter = FilterSelection::new().with_client("Acme");
    let reference = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap_or_default();

    let overview = process_account_overview(&store, &config, &filter, reference)?;

    if let Some(info) = &overview.key_info {
        println!("🏢 {} ({})", info.customer_name, info.commercial_name);
        println!("  Deal type:        {}", info.deal_type);
        println!("  Account manager:  {}", info.account_manager);
        println!("  Support type:     {}", info.support_type);
    }

    if let Some(health) = &overview.client_health {
        println!("\n💚 Client health");
        println!("  Renewal date:     {:?}", health.renewal_date);
        println!("  Total collection: {:>10.2}", health.total_collection);
    }

    if let Some(revenue) = &overview.revenue {
        println!("\n💰 Revenue ({})", revenue.month);
        println!(
            "  ARR: {:>10.2} of {:>10.2} ({:.1}%)",
            revenue.recurring.annualized,
            revenue.recurring.portfolio_annualized,
            revenue.recurring.percent_of_total
        );
    }

    if let Some(utilization) = &overview.utilization {
        println!("\n📈 Utilization of {}", utilization.product);
        for bucket in &utilization.chart.buckets {
            println!(
                "  {}: ordered {:>8.0}  consumed {:>8.0}",
                bucket.month,
                bucket.get(ORDERED_CATEGORY),
                bucket.get(views::CONSUMED_CATEGORY)
            );
        }
        println!("  Contracted:  {:>8.0}", utilization.contracted);
        println!("  Remaining:   {:>8.0}", utilization.remaining);
        println!("  Daily rate:  {:>8.2}", utilization.daily_rate);
        match utilization.full_utilization_date {
            Some(date) => println!("  Full utilization expected on {}", date),
            None => println!("  Full utilization date unavailable"),
        }
    }

    println!("\n📄 Active contracts");
    for group in &overview.contracts.groups {
        println!(
            "  {}: amount {:>10.2}  licences {:>6.0}",
            group.key,
            group.sum(fields::AMOUNT),
            group.sum(fields::LICENSE_ORDERED)
        );
    }

    if let Some(invoices) = &overview.invoices {
        println!("\n🧾 Invoices");
        println!("  Invoiced:    {:>10.2}", invoices.invoice_total());
        println!("  Outstanding: {:>10.2}", invoices.outstanding_total());
    }

    println!("\n✅ Done");
    Ok(())
}
