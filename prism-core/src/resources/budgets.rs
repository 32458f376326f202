use crate::error::ApiError;
use crate::models::{Budget, NewBudget};
use crate::pagination::Page;
use crate::resource::{ListFilter, Resource, ResourceClient};

/// `/api/v1/budgets/`
pub struct Budgets;

impl Resource for Budgets {
    const PATH: &'static str = "/api/v1/budgets/";
    type Item = Budget;
    type Create = NewBudget;
    type Update = NewBudget;
    type Filter = ListFilter;
}

impl ResourceClient<Budgets> {
    /// Active budgets whose period contains today.
    pub async fn current(&self) -> Result<Page<Budget>, ApiError> {
        self.action("current").await
    }

    pub async fn over_budget(&self) -> Result<Page<Budget>, ApiError> {
        self.action("over_budget").await
    }
}
