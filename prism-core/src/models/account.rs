use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Amount;
use crate::resource::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
    Investment,
    Cash,
    Loan,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Id,
    pub name: String,
    pub account_type: AccountType,
    #[serde(default)]
    pub account_type_display: Option<String>,
    pub balance: Amount,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create or replace payload for an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub balance: Amount,
    pub is_active: bool,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            name: name.into(),
            account_type,
            balance: "0.00".to_string(),
            is_active: true,
        }
    }

    pub fn balance(mut self, balance: impl Into<Amount>) -> Self {
        self.balance = balance.into();
        self
    }
}

fn active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_from_backend() {
        let account: Account = serde_json::from_value(json!({
            "id": 1,
            "name": "Main Checking",
            "account_type": "checking",
            "account_type_display": "Checking",
            "balance": "1250.50",
            "is_active": true,
            "owner": "jane@example.com",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-02T10:00:00.123456Z"
        }))
        .unwrap();

        assert_eq!(account.account_type, AccountType::Checking);
        assert_eq!(account.balance, "1250.50");
        assert!(account.created_at.is_some());
    }

    #[test]
    fn test_unknown_account_type_is_other() {
        let kind: AccountType = serde_json::from_str("\"brokerage\"").unwrap();
        assert_eq!(kind, AccountType::Other);
    }

    #[test]
    fn test_new_account_has_no_server_fields() {
        let payload =
            serde_json::to_value(NewAccount::new("Savings", AccountType::Savings)).unwrap();
        assert_eq!(
            payload,
            json!({
                "name": "Savings",
                "account_type": "savings",
                "balance": "0.00",
                "is_active": true
            })
        );
    }
}
