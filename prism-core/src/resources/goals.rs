use crate::error::ApiError;
use crate::models::{Amount, Goal, NewGoal, ProgressUpdate};
use crate::pagination::Page;
use crate::resource::{Id, ListFilter, Resource, ResourceClient};

/// `/api/v1/goals/`
pub struct Goals;

impl Resource for Goals {
    const PATH: &'static str = "/api/v1/goals/";
    type Item = Goal;
    type Create = NewGoal;
    type Update = NewGoal;
    type Filter = ListFilter;
}

impl ResourceClient<Goals> {
    pub async fn active(&self) -> Result<Page<Goal>, ApiError> {
        self.action("active").await
    }

    pub async fn completed(&self) -> Result<Page<Goal>, ApiError> {
        self.action("completed").await
    }

    /// Active goals at 80% progress or more.
    pub async fn near_target(&self) -> Result<Page<Goal>, ApiError> {
        self.action("near_target").await
    }

    /// Add `amount` (negative to withdraw) to the goal's current amount.
    pub async fn update_progress(
        &self,
        id: Id,
        amount: impl Into<Amount>,
    ) -> Result<Goal, ApiError> {
        let body = ProgressUpdate {
            amount: amount.into(),
        };
        self.item_action(id, "update_progress", &body).await
    }
}
