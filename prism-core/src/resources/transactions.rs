use std::fmt;

use chrono::NaiveDate;

use crate::error::ApiError;
use crate::models::{NewTransaction, Transaction};
use crate::pagination::Page;
use crate::request::{QueryFilter, QueryParams, RequestDescriptor};
use crate::resource::{Id, Resource, ResourceClient};

/// `/api/v1/transactions/`
pub struct Transactions;

impl Resource for Transactions {
    const PATH: &'static str = "/api/v1/transactions/";
    type Item = Transaction;
    type Create = NewTransaction;
    type Update = NewTransaction;
    type Filter = TransactionFilter;
}

/// Value of the `type` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Income => "income",
            Self::Expense => "expense",
        })
    }
}

/// Filter for transaction listings.
///
/// Keys are encoded in the order the builder methods are called; unset and
/// empty values are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter(QueryParams);

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(self, account: impl Into<Option<Id>>) -> Self {
        self.set("account", account.into())
    }

    pub fn category(self, category: impl Into<Option<Id>>) -> Self {
        self.set("category", category.into())
    }

    pub fn kind(self, kind: impl Into<Option<TransactionKind>>) -> Self {
        self.set("type", kind.into())
    }

    /// Inclusive lower bound, sent as `YYYY-MM-DD`.
    pub fn start_date(self, date: impl Into<Option<NaiveDate>>) -> Self {
        self.set("start_date", date.into().map(iso_date))
    }

    /// Inclusive upper bound, sent as `YYYY-MM-DD`.
    pub fn end_date(self, date: impl Into<Option<NaiveDate>>) -> Self {
        self.set("end_date", date.into().map(iso_date))
    }

    pub fn search(self, term: impl Into<String>) -> Self {
        self.set("search", Some(term.into()))
    }

    pub fn ordering(self, ordering: impl Into<String>) -> Self {
        self.set("ordering", Some(ordering.into()))
    }

    pub fn page(self, page: impl Into<Option<u32>>) -> Self {
        self.set("page", page.into())
    }

    fn set<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        Self(self.0.with_opt(key, value))
    }
}

impl QueryFilter for TransactionFilter {
    fn query(&self) -> QueryParams {
        self.0.clone()
    }
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl ResourceClient<Transactions> {
    /// Transactions from the last 30 days, newest first, at most `limit`.
    pub async fn recent(&self, limit: u32) -> Result<Page<Transaction>, ApiError> {
        let request = RequestDescriptor::get(Self::action_path("recent"))
            .with_query(QueryParams::new().with("limit", limit));
        self.dispatcher().dispatch(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_set_fields_encoded() {
        let filter = TransactionFilter::new().category(3).search("");
        assert_eq!(filter.query().to_query_string(), "category=3");
    }

    #[test]
    fn test_call_order_preserved() {
        let filter = TransactionFilter::new()
            .search("rent")
            .kind(TransactionKind::Expense)
            .account(None::<Id>)
            .start_date(NaiveDate::from_ymd_opt(2024, 1, 1))
            .end_date(NaiveDate::from_ymd_opt(2024, 1, 31))
            .account(2);

        assert_eq!(
            filter.query().to_query_string(),
            "search=rent&type=expense&start_date=2024-01-01&end_date=2024-01-31&account=2"
        );
    }

    #[test]
    fn test_empty_filter() {
        assert!(TransactionFilter::new().query().is_empty());
    }
}
