use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Amount, Related};
use crate::resource::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Id,
    pub name: String,
    pub category: Related,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_full_name: Option<String>,
    pub amount: Amount,
    #[serde(default)]
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub spent_amount: Option<Amount>,
    #[serde(default)]
    pub remaining_amount: Option<Amount>,
    #[serde(default)]
    pub percentage_used: Option<f64>,
    #[serde(default)]
    pub is_over_budget: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBudget {
    pub name: String,
    pub category_id: Id,
    pub amount: Amount,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}
