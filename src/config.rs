use crate::error::{AnalyticsError, Result};
use crate::record::fields;
use crate::schema::MonthRange;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Upper bound for every window and history length, in months.
pub const MAX_WINDOW_MONTHS: usize = 1200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(
        description = "Months of consumption history before the reference date used for the daily run-rate. The window starts on the first day of the month this many months back."
    )]
    pub run_rate_window_months: i32,

    #[schemars(
        description = "Number of months (ending with the reference month) shown in the consumption chart. 13 covers the last twelve months plus the current one."
    )]
    pub consumption_history_months: usize,

    #[schemars(description = "Number of months (ending with the reference month) shown in the revenue chart")]
    pub revenue_history_months: usize,

    #[schemars(
        description = "Contract component Description marking placeholder rows for unsigned prospects. Those rows are left out of the contracts view."
    )]
    pub prospect_description: String,

    #[schemars(description = "Placeholder returned for descriptive fields with no value")]
    pub not_available: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            run_rate_window_months: 6,
            consumption_history_months: 13,
            revenue_history_months: 12,
            prospect_description: "Unsigned Prospect Contract".to_string(),
            not_available: "N/A".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.run_rate_window_months < 0 {
            return Err(AnalyticsError::InvalidConfig(format!(
                "run_rate_window_months must not be negative (got {})",
                self.run_rate_window_months
            )));
        }
        if self.run_rate_window_months as usize > MAX_WINDOW_MONTHS {
            return Err(AnalyticsError::InvalidConfig(format!(
                "run_rate_window_months must be at most {} (got {})",
                MAX_WINDOW_MONTHS, self.run_rate_window_months
            )));
        }
        let histories = [
            ("consumption_history_months", self.consumption_history_months),
            ("revenue_history_months", self.revenue_history_months),
        ];
        for (name, months) in histories {
            if months == 0 || months > MAX_WINDOW_MONTHS {
                return Err(AnalyticsError::InvalidConfig(format!(
                    "{} must be between 1 and {} (got {})",
                    name, MAX_WINDOW_MONTHS, months
                )));
            }
        }
        Ok(())
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(EngineConfig);
        serde_json::to_string_pretty(&schema)
    }
}

/// What the user has picked in the dashboard's dropdowns. Passed by value
/// into every query; `None` means "All".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FilterSelection {
    pub client_name: Option<String>,
    pub customer_name: Option<String>,
    pub account_manager: Option<String>,
    pub status: Option<String>,
    pub product: Option<String>,
    pub month_range: Option<MonthRange>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client_name = Some(client.into());
        self
    }

    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer_name = Some(customer.into());
        self
    }

    pub fn with_account_manager(mut self, manager: impl Into<String>) -> Self {
        self.account_manager = Some(manager.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    pub fn with_month_range(mut self, range: MonthRange) -> Self {
        self.month_range = Some(range);
        self
    }

    /// Equality criteria over ContractComponents columns. Product and month
    /// range are applied by the views that need them, not here.
    pub fn criteria(&self) -> BTreeMap<String, String> {
        let mut criteria = BTreeMap::new();
        let pairs = [
            (fields::CLIENT_NAME, &self.client_name),
            (fields::CUSTOMER_NAME, &self.customer_name),
            (fields::ACCOUNT_MANAGER, &self.account_manager),
            (fields::STATUS, &self.status),
        ];
        for (field, value) in pairs {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                criteria.insert(field.to_string(), value.to_string());
            }
        }
        criteria
    }
}
