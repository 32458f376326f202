use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Amount, Related};
use crate::resource::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringFrequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Id,
    pub account: Related,
    #[serde(default)]
    pub category: Option<Related>,
    pub amount: Amount,
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub transfer_to: Option<Related>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_frequency: Option<RecurringFrequency>,
    #[serde(default)]
    pub is_expense: bool,
    #[serde(default)]
    pub is_income: bool,
    #[serde(default)]
    pub is_transfer: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    pub account_id: Id,
    pub category_id: Option<Id>,
    pub amount: Amount,
    pub description: String,
    pub date: NaiveDate,
    pub notes: String,
    pub transfer_to_id: Option<Id>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
}

impl NewTransaction {
    pub fn new(
        account_id: Id,
        amount: impl Into<Amount>,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            account_id,
            category_id: None,
            amount: amount.into(),
            description: description.into(),
            date,
            notes: String::new(),
            transfer_to_id: None,
            is_recurring: false,
            recurring_frequency: None,
        }
    }

    pub fn category(mut self, category_id: Id) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_references() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": 10,
            "account": {"id": 1, "name": "Checking", "account_type": "checking"},
            "category": {"id": 5, "name": "Coffee", "full_name": "Food > Coffee"},
            "amount": "-4.50",
            "description": "Flat white",
            "date": "2024-03-04",
            "notes": "",
            "transfer_to": null,
            "is_recurring": false,
            "recurring_frequency": null,
            "is_expense": true
        }))
        .unwrap();

        assert_eq!(tx.account.id(), 1);
        assert_eq!(tx.category.as_ref().map(Related::id), Some(5));
        assert!(tx.is_expense);
        assert!(tx.transfer_to.is_none());
    }

    #[test]
    fn test_new_transaction_payload() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let new = NewTransaction::new(1, "-4.50", "Coffee", date).category(5);
        let payload = serde_json::to_value(new).unwrap();

        assert_eq!(payload["account_id"], 1);
        assert_eq!(payload["category_id"], 5);
        assert_eq!(payload["date"], "2024-03-04");
        assert!(payload.get("id").is_none());
    }
}
