use super::Decimal;
use super::accounts::Account;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{Request, RequestData};

pub const DEFAULT_TREND_MONTHS: u32 = 6;

/// Aggregate computed server-side; replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_assets: Decimal,
    pub net_worth: Decimal,
    pub monthly_fixed_expenses: Decimal,
    pub monthly_variable_expenses: Decimal,
    pub monthly_income: Decimal,
    pub net_monthly_cashflow: Decimal,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// Month labels (`YYYY-MM`) paired with net worth values, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetWorthTrend {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

impl NetWorthTrend {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn latest(&self) -> Option<(&str, f64)> {
        let label = self.labels.last()?;
        let value = self.data.last()?;
        Some((label.as_str(), *value))
    }
}

// Requests

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetSummary;

impl Request for GetSummary {
    type Data = ();
    type Response = Summary;

    fn endpoint(&self) -> Cow<'_, str> {
        "/summary/".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetNetWorthTrend {
    months: u32,
}

impl GetNetWorthTrend {
    pub fn new(months: u32) -> Self {
        Self { months }
    }
}

impl Default for GetNetWorthTrend {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_MONTHS)
    }
}

impl Request for GetNetWorthTrend {
    type Data = Self;
    type Response = NetWorthTrend;

    fn endpoint(&self) -> Cow<'_, str> {
        "/summary/net-worth-trend".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Query(self)
    }
}
