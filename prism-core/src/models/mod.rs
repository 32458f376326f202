//! Record shapes exchanged with the backend.
//!
//! Read types mirror what the backend returns; write types (`New*`,
//! `*Update`) carry only client-settable fields. Monetary amounts are
//! decimal strings, as the backend sends them.

mod account;
mod budget;
mod category;
mod goal;
mod summary;
mod transaction;
mod user;

pub use account::{Account, AccountType, NewAccount};
pub use budget::{Budget, BudgetPeriod, NewBudget};
pub use category::{CategoriesByType, Category, CategoryGroup, CategoryType, NewCategory};
pub use goal::{Goal, GoalType, NewGoal, ProgressUpdate};
pub use summary::Summary;
pub use transaction::{NewTransaction, RecurringFrequency, Transaction};
pub use user::{PasswordChange, ProfileUpdate, Registration, User};

use serde::{Deserialize, Serialize};

use crate::resource::Id;

/// Decimal amount as sent by the backend, e.g. `"1250.00"`.
pub type Amount = String;

/// A reference to another record: either a bare id or an embedded summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Related {
    Id(Id),
    Embedded(RelatedRecord),
}

impl Related {
    pub fn id(&self) -> Id {
        match self {
            Self::Id(id) => *id,
            Self::Embedded(record) => record.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Embedded(record) => record.name.as_deref(),
        }
    }
}

/// Embedded form of [`Related`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedRecord {
    pub id: Id,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_accepts_both_forms() {
        let bare: Related = serde_json::from_str("4").unwrap();
        let embedded: Related =
            serde_json::from_str(r#"{"id": 4, "name": "Checking", "account_type": "checking"}"#)
                .unwrap();

        assert_eq!(bare.id(), 4);
        assert_eq!(embedded.id(), 4);
        assert_eq!(bare.name(), None);
        assert_eq!(embedded.name(), Some("Checking"));
    }
}
