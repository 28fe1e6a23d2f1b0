//! The dashboard's blocks, each assembled from the engine primitives over
//! one snapshot, one filter selection and one reference date.

use crate::accrual::{project_accrual, ORDERED_CATEGORY};
use crate::config::{EngineConfig, FilterSelection};
use crate::correlate::{correlate_by_key, find_first, key_set, matches_all, unique_values};
use crate::cumulative::to_cumulative;
use crate::engine::{bucket_by_month, Bucketizer};
use crate::error::Result;
use crate::kpi::ShareMetric;
use crate::normalize::{date_field, numeric_field};
use crate::record::{fields, tables, JoinKey, Record, RecordStore};
use crate::run_rate::{daily_rate, project_exhaustion_date};
use crate::schema::{MonthBucket, MonthKey, MonthRange, Series};
use crate::subtotal::{group_and_subtotal, SubtotalRollup};
use crate::window::{filter_active_refs, is_unsigned_prospect};
use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;

/// Category name of the cumulative consumption line in utilization charts.
pub const CONSUMED_CATEGORY: &str = "LicenseConsumed";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub clients: Vec<String>,
    pub customers: Vec<String>,
    pub account_managers: Vec<String>,
    pub statuses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyInfo {
    pub customer_name: String,
    pub commercial_name: String,
    pub deal_type: String,
    pub account_manager: String,
    pub customer_success: String,
    pub executive_sponsor: String,
    pub support_type: String,
    pub deal_category: String,
    pub active_countries: String,
    pub contracts_folder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientHealth {
    pub client_since: Option<NaiveDate>,
    pub lifetime_months: String,
    pub renewal_date: Option<NaiveDate>,
    pub months_to_renewal: String,
    pub license_type: String,
    pub renewal_type: String,
    pub rollover: String,
    pub status: String,
    pub total_collection: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueGrowth {
    pub client: String,
    pub month: MonthKey,
    /// MRR share; annualised it is the client's ARR.
    pub recurring: ShareMetric,
    pub revenue: ShareMetric,
    /// Revenue per sub-product over the selected months, or the trailing
    /// history window when none are selected.
    pub monthly_revenue: Series,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionView {
    pub client: String,
    pub monthly: Series,
    /// All-time volume per product, regardless of the chart window.
    pub totals: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationAnalysis {
    pub client: String,
    pub product: String,
    /// Accrued ordered licences and cumulative consumption, month by month.
    pub chart: Series,
    pub contracted: f64,
    pub accrued: f64,
    pub consumed: f64,
    pub remaining: f64,
    pub daily_rate: f64,
    /// `None` when consumption has stalled and no date can be projected.
    pub full_utilization_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceView<'a> {
    pub active_component_ids: Vec<String>,
    pub invoices: Vec<&'a Record>,
    pub rollup: SubtotalRollup<'a>,
}

impl InvoiceView<'_> {
    pub fn invoice_total(&self) -> f64 {
        self.rollup.total(fields::INVOICE_AMOUNT)
    }

    pub fn outstanding_total(&self) -> f64 {
        self.rollup.total(fields::OUTSTANDING_AMOUNT)
    }
}

/// Every block for one selection, computed together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountOverview<'a> {
    pub reference_date: NaiveDate,
    pub filter_options: FilterOptions,
    pub key_info: Option<KeyInfo>,
    pub client_health: Option<ClientHealth>,
    pub revenue: Option<RevenueGrowth>,
    pub consumption: Option<ConsumptionView>,
    pub utilization: Option<UtilizationAnalysis>,
    pub contracts: SubtotalRollup<'a>,
    pub invoices: Option<InvoiceView<'a>>,
}

pub struct Dashboard<'s> {
    store: &'s RecordStore,
    config: &'s EngineConfig,
}

impl<'s> Dashboard<'s> {
    pub fn new(store: &'s RecordStore, config: &'s EngineConfig) -> Self {
        Self { store, config }
    }

    /// Contract components matching the client, customer, account manager
    /// and status picked in the filters.
    pub fn filtered_components(&self, filter: &FilterSelection) -> Vec<&'s Record> {
        let criteria = filter.criteria();
        self.store
            .contract_components()
            .iter()
            .filter(|r| matches_all(r, &criteria))
            .collect()
    }

    /// Dropdown choices, narrowed by what is already selected.
    pub fn filter_options(&self, filter: &FilterSelection) -> FilterOptions {
        let rows = self.filtered_components(filter);
        FilterOptions {
            clients: unique_values(rows.iter().copied(), fields::CLIENT_NAME),
            customers: unique_values(rows.iter().copied(), fields::CUSTOMER_NAME),
            account_managers: unique_values(rows.iter().copied(), fields::ACCOUNT_MANAGER),
            statuses: unique_values(rows.iter().copied(), fields::STATUS),
        }
    }

    /// Client of the first matching component, which the summary blocks
    /// describe when several clients match.
    pub fn lead_client(&self, filter: &FilterSelection) -> Option<&'s str> {
        self.filtered_components(filter)
            .into_iter()
            .next()
            .and_then(|r| r.get(fields::CLIENT_NAME))
    }

    fn client_metadata(&self, client: &str) -> Option<&'s Record> {
        find_first(
            self.store.clients(),
            JoinKey::ClientName.field_for(tables::CLIENTS),
            client,
        )
    }

    /// The months a chart covers: the selected range when there is one,
    /// else the last `default_months` up to `reference`.
    fn chart_range(
        &self,
        filter: &FilterSelection,
        reference: NaiveDate,
        default_months: usize,
    ) -> Result<MonthRange> {
        match filter.month_range {
            Some(range) => Ok(range),
            None => MonthRange::trailing(reference, default_months),
        }
    }

    fn text_or_na(&self, record: Option<&Record>, field: &str) -> String {
        record
            .and_then(|r| r.get(field))
            .unwrap_or(self.config.not_available.as_str())
            .to_string()
    }

    pub fn key_info(&self, filter: &FilterSelection) -> Option<KeyInfo> {
        let components = self.filtered_components(filter);
        let lead = *components.first()?;
        let client = lead.get(fields::CLIENT_NAME);
        let meta = client.and_then(|c| self.client_metadata(c));
        if meta.is_none() {
            debug!("No client metadata for {:?}", client);
        }

        Some(KeyInfo {
            customer_name: self.text_or_na(Some(lead), fields::CLIENT_NAME),
            commercial_name: self.text_or_na(Some(lead), fields::CUSTOMER_NAME),
            deal_type: self.text_or_na(meta, fields::DEAL_TYPE),
            account_manager: self.text_or_na(Some(lead), fields::ACCOUNT_MANAGER),
            customer_success: self.text_or_na(meta, fields::CUSTOMER_SUCCESS),
            executive_sponsor: self.text_or_na(meta, fields::EXECUTIVE_SPONSOR),
            support_type: self.text_or_na(meta, fields::SUPPORT_TYPE),
            deal_category: self.text_or_na(meta, fields::DEAL_CATEGORY),
            active_countries: self.text_or_na(meta, fields::ACTIVE_COUNTRIES),
            contracts_folder: meta
                .and_then(|m| m.get(fields::CONTRACTS_FOLDER))
                .map(str::to_string),
        })
    }

    pub fn client_health(&self, filter: &FilterSelection) -> Option<ClientHealth> {
        let client = self.lead_client(filter)?;
        let meta = self.client_metadata(client);

        let total_collection: f64 = self
            .store
            .receipts()
            .iter()
            .filter(|r| r.get(JoinKey::ClientName.field_for(tables::RECEIPTS)) == Some(client))
            .map(|r| numeric_field(r, fields::REVENUE_COLLECTION))
            .sum();

        Some(ClientHealth {
            client_since: meta.and_then(|m| date_field(m, fields::CLIENT_SINCE)),
            lifetime_months: self.text_or_na(meta, fields::LIFETIME_MONTHS),
            renewal_date: meta.and_then(|m| date_field(m, fields::RENEWAL_DATE)),
            months_to_renewal: self.text_or_na(meta, fields::MONTHS_TO_RENEWAL),
            license_type: self.text_or_na(meta, fields::LICENSE_TYPE),
            renewal_type: self.text_or_na(meta, fields::RENEWAL_TYPE),
            rollover: self.text_or_na(meta, fields::ROLLOVER),
            status: self.text_or_na(meta, fields::STATUS),
            total_collection,
        })
    }

    pub fn revenue_growth(
        &self,
        filter: &FilterSelection,
        reference: NaiveDate,
    ) -> Result<Option<RevenueGrowth>> {
        let Some(client) = self.lead_client(filter) else {
            return Ok(None);
        };
        let summary = self.store.revenue_summary();
        let client_field = JoinKey::ClientName.field_for(tables::REVENUE_SUMMARY);
        let month = MonthKey::from_date(reference);
        let current = MonthRange::single(month);

        let mrr_by_client = bucket_by_month(summary, fields::MONTH, client_field, fields::MRR, &current);
        let revenue_by_client =
            bucket_by_month(summary, fields::MONTH, client_field, fields::REVENUE, &current);

        let history = self.chart_range(filter, reference, self.config.revenue_history_months)?;
        let client_rows = summary.iter().filter(|r| r.get(client_field) == Some(client));
        let monthly_revenue = bucket_by_month(
            client_rows,
            fields::MONTH,
            JoinKey::Product.field_for(tables::REVENUE_SUMMARY),
            fields::REVENUE,
            &history,
        );

        Ok(Some(RevenueGrowth {
            client: client.to_string(),
            month,
            recurring: ShareMetric::from_series(&mrr_by_client, client, month),
            revenue: ShareMetric::from_series(&revenue_by_client, client, month),
            monthly_revenue,
        }))
    }

    pub fn consumption(
        &self,
        client: &str,
        filter: &FilterSelection,
        reference: NaiveDate,
    ) -> Result<ConsumptionView> {
        let rows: Vec<&Record> = self
            .store
            .consumption()
            .iter()
            .filter(|r| r.get(JoinKey::ClientName.field_for(tables::CONSUMPTION)) == Some(client))
            .collect();

        let history = self.chart_range(filter, reference, self.config.consumption_history_months)?;
        let bucketizer = Bucketizer::new(fields::MONTH, fields::PRODUCT, fields::VOLUME);

        Ok(ConsumptionView {
            client: client.to_string(),
            monthly: bucketizer.bucket(rows.iter().copied(), &history),
            totals: bucketizer.totals(rows.iter().copied()),
        })
    }

    /// Products the client has contract components for, in sheet order.
    pub fn client_products(&self, client: &str) -> Vec<String> {
        let rows = self
            .store
            .contract_components()
            .iter()
            .filter(|r| r.get(fields::CLIENT_NAME) == Some(client));
        unique_values(rows, JoinKey::Product.field_for(tables::CONTRACT_COMPONENTS))
    }

    pub fn utilization(
        &self,
        client: &str,
        product: &str,
        reference: NaiveDate,
    ) -> Result<Option<UtilizationAnalysis>> {
        let product_field = JoinKey::Product.field_for(tables::CONTRACT_COMPONENTS);
        let candidates = self.store.contract_components().iter().filter(|r| {
            r.get(fields::CLIENT_NAME) == Some(client) && r.get(product_field) == Some(product)
        });
        let active = filter_active_refs(candidates, reference, None);

        let Some(accrual) = project_accrual(active.iter().copied(), fields::LICENSE_ORDERED) else {
            debug!("No active contracts for {} / {} on {}", client, product, reference);
            return Ok(None);
        };

        let consumption = self.store.consumption();
        let usage = consumption.iter().filter(|r| {
            r.get(fields::CLIENT_NAME) == Some(client) && r.get(fields::PRODUCT) == Some(product)
        });
        let monthly = bucket_by_month(usage, fields::MONTH, fields::PRODUCT, fields::VOLUME, &accrual.window);
        let consumed_line = relabel(&to_cumulative(&monthly), product, CONSUMED_CATEGORY);
        let chart = accrual.to_series().merge(&consumed_line);

        let month = MonthKey::from_date(reference);
        let contracted = chart.last_value(ORDERED_CATEGORY);
        let accrued = chart.value(month, ORDERED_CATEGORY);
        let consumed = chart.value(month, CONSUMED_CATEGORY);
        let remaining = contracted - consumed;
        let rate = daily_rate(
            consumption,
            client,
            product,
            reference,
            self.config.run_rate_window_months,
        )?;

        Ok(Some(UtilizationAnalysis {
            client: client.to_string(),
            product: product.to_string(),
            chart,
            contracted,
            accrued,
            consumed,
            remaining,
            daily_rate: rate,
            full_utilization_date: project_exhaustion_date(remaining, rate, reference),
        }))
    }

    /// Active, signed contract components grouped by component id.
    pub fn contracts(&self, filter: &FilterSelection, reference: NaiveDate) -> SubtotalRollup<'s> {
        let prospect = self.config.prospect_description.as_str();
        let signed: &dyn Fn(&Record) -> bool = &|r| !is_unsigned_prospect(r, prospect);
        let active = filter_active_refs(self.filtered_components(filter), reference, Some(signed));

        group_and_subtotal(
            active,
            fields::CONTRACT_COMPONENT_ID,
            &[fields::LICENSE_ORDERED, fields::PRICE, fields::AMOUNT],
        )
    }

    /// Invoices raised against the client's currently active components.
    /// Prospect placeholders are not excluded here.
    pub fn invoices(&self, client: &str, reference: NaiveDate) -> InvoiceView<'s> {
        let components = self
            .store
            .contract_components()
            .iter()
            .filter(|r| r.get(fields::CLIENT_NAME) == Some(client));
        let active = filter_active_refs(components, reference, None);

        let id_field = JoinKey::ContractComponentId.field_for(tables::INVOICES);
        let active_component_ids = unique_values(active.iter().copied(), id_field);
        let parents = key_set(active.iter().copied(), id_field);
        let invoices = correlate_by_key(self.store.invoices(), &parents, id_field);
        let rollup = group_and_subtotal(
            invoices.iter().copied(),
            id_field,
            &[fields::INVOICE_AMOUNT, fields::OUTSTANDING_AMOUNT],
        );

        InvoiceView {
            active_component_ids,
            invoices,
            rollup,
        }
    }

    /// Computes every block. Client-scoped blocks (consumption, utilization,
    /// invoices) need an explicit client in the selection; utilization uses
    /// the selected product or else the client's first product.
    pub fn overview(
        &self,
        filter: &FilterSelection,
        reference: NaiveDate,
    ) -> Result<AccountOverview<'s>> {
        info!(
            "Building overview for {:?} as of {}",
            filter.client_name, reference
        );

        let client = filter.client_name.as_deref().filter(|c| !c.is_empty());

        let consumption = client
            .map(|c| self.consumption(c, filter, reference))
            .transpose()?;

        let utilization = match client {
            Some(c) => {
                let product = filter
                    .product
                    .clone()
                    .or_else(|| self.client_products(c).into_iter().next());
                match product {
                    Some(p) => self.utilization(c, &p, reference)?,
                    None => None,
                }
            }
            None => None,
        };

        Ok(AccountOverview {
            reference_date: reference,
            filter_options: self.filter_options(filter),
            key_info: self.key_info(filter),
            client_health: self.client_health(filter),
            revenue: self.revenue_growth(filter, reference)?,
            consumption,
            utilization,
            contracts: self.contracts(filter, reference),
            invoices: client.map(|c| self.invoices(c, reference)),
        })
    }
}

/// Copies `from` into a series whose only category is `to`. Any other
/// category is dropped, so `series` should hold a single product.
fn relabel(series: &Series, from: &str, to: &str) -> Series {
    Series {
        categories: vec![to.to_string()],
        buckets: series
            .buckets
            .iter()
            .map(|b| MonthBucket {
                month: b.month,
                values: BTreeMap::from([(to.to_string(), b.get(from))]),
            })
            .collect(),
    }
}
