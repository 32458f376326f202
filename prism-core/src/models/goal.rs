use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Amount, Related};
use crate::resource::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    #[default]
    Savings,
    Debt,
    Investment,
    Purchase,
    Emergency,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goal_type: GoalType,
    pub target_amount: Amount,
    pub current_amount: Amount,
    #[serde(default)]
    pub remaining_amount: Option<Amount>,
    #[serde(default)]
    pub progress_percentage: Option<f64>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub linked_account: Option<Related>,
    #[serde(default)]
    pub linked_account_name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_goal_reached: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGoal {
    pub name: String,
    pub description: String,
    pub goal_type: GoalType,
    pub target_amount: Amount,
    pub current_amount: Amount,
    pub target_date: Option<NaiveDate>,
    pub linked_account_id: Option<Id>,
    pub is_active: bool,
}

/// Body of `update_progress`: the signed change to `current_amount`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub amount: Amount,
}
