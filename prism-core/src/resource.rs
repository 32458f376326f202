//! The uniform resource-access pattern.
//!
//! A [`Resource`] names a collection endpoint and its payload types;
//! [`ResourceClient`] turns that into list/get/create/update/delete calls,
//! all routed through the [`Dispatcher`].

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::dispatcher::Dispatcher;
use crate::error::ApiError;
use crate::models::Summary;
use crate::pagination::Page;
use crate::request::{QueryFilter, QueryParams, RequestDescriptor};

/// Backend primary key.
pub type Id = u64;

/// A REST collection under `/api/v1/`.
pub trait Resource {
    /// Collection path with trailing slash, e.g. `/api/v1/accounts/`.
    const PATH: &'static str;

    /// Record returned by reads.
    type Item: DeserializeOwned + Send;

    /// Payload for create.
    type Create: Serialize + Sync;

    /// Payload for full update.
    type Update: Serialize + Sync;

    /// Filter for collection reads.
    type Filter: QueryFilter + Sync;
}

/// Filter accepted by collections without dedicated filter keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter(QueryParams);

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(self, term: impl Into<String>) -> Self {
        self.param("search", term.into())
    }

    /// Sort key, `-` prefix for descending (e.g. `-created_at`).
    pub fn ordering(self, ordering: impl Into<String>) -> Self {
        self.param("ordering", ordering.into())
    }

    pub fn page(self, page: u32) -> Self {
        self.param("page", page)
    }

    /// Any other key the backend understands.
    pub fn param(self, key: impl Into<String>, value: impl ToString) -> Self {
        Self(self.0.with(key, value))
    }
}

impl QueryFilter for ListFilter {
    fn query(&self) -> QueryParams {
        self.0.clone()
    }
}

/// Client for one [`Resource`] collection.
pub struct ResourceClient<R: Resource> {
    dispatcher: Dispatcher,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self::new(self.dispatcher.clone())
    }
}

impl<R: Resource> fmt::Debug for ResourceClient<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("path", &R::PATH)
            .finish()
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            _resource: PhantomData,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Path of a single record.
    pub fn item_path(id: Id) -> String {
        format!("{}{}/", R::PATH, id)
    }

    /// Path of a collection-level action, e.g. `.../summary/`.
    pub fn action_path(action: &str) -> String {
        format!("{}{}/", R::PATH, action)
    }

    /// Path of a record-level action, e.g. `.../7/update_progress/`.
    pub fn item_action_path(id: Id, action: &str) -> String {
        format!("{}{}/{}/", R::PATH, id, action)
    }

    pub async fn list(&self, filter: &R::Filter) -> Result<Page<R::Item>, ApiError> {
        let request = RequestDescriptor::get(R::PATH).with_query(filter.query());
        self.dispatcher.dispatch(&request).await
    }

    pub async fn get(&self, id: Id) -> Result<R::Item, ApiError> {
        self.dispatcher
            .dispatch(&RequestDescriptor::get(Self::item_path(id)))
            .await
    }

    pub async fn create(&self, payload: &R::Create) -> Result<R::Item, ApiError> {
        let request = RequestDescriptor::post(R::PATH).json(payload)?;
        self.dispatcher.dispatch(&request).await
    }

    /// Replace a record (PUT).
    pub async fn update(&self, id: Id, payload: &R::Update) -> Result<R::Item, ApiError> {
        let request = RequestDescriptor::put(Self::item_path(id)).json(payload)?;
        self.dispatcher.dispatch(&request).await
    }

    /// Change some fields of a record (PATCH).
    pub async fn partial_update<P>(&self, id: Id, changes: &P) -> Result<R::Item, ApiError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let request = RequestDescriptor::patch(Self::item_path(id)).json(changes)?;
        self.dispatcher.dispatch(&request).await
    }

    pub async fn delete(&self, id: Id) -> Result<(), ApiError> {
        self.dispatcher
            .dispatch(&RequestDescriptor::delete(Self::item_path(id)))
            .await
    }

    /// Aggregate figures for the collection.
    pub async fn summary(&self) -> Result<Summary, ApiError> {
        self.action("summary").await
    }

    /// Follow the `next` cursor of `page`.
    pub async fn next_page(
        &self,
        page: &Page<R::Item>,
    ) -> Result<Option<Page<R::Item>>, ApiError> {
        self.follow(page.next.as_deref()).await
    }

    /// Follow the `previous` cursor of `page`.
    pub async fn previous_page(
        &self,
        page: &Page<R::Item>,
    ) -> Result<Option<Page<R::Item>>, ApiError> {
        self.follow(page.previous.as_deref()).await
    }

    /// Read every page matching `filter`, in order.
    ///
    /// Stops at the first `next` cursor that was already followed.
    pub async fn list_all(&self, filter: &R::Filter) -> Result<Vec<R::Item>, ApiError> {
        let mut page = self.list(filter).await?;
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        loop {
            let next = page.next.take();
            items.extend(page.results);
            let Some(cursor) = next else {
                break;
            };
            if !visited.insert(cursor.clone()) {
                tracing::warn!("{} cursor {} repeats; stopping", R::PATH, cursor);
                break;
            }
            match self.follow(Some(&cursor)).await? {
                Some(following) => page = following,
                None => break,
            }
        }
        Ok(items)
    }

    /// GET a collection-level action.
    pub async fn action<T: DeserializeOwned>(&self, action: &str) -> Result<T, ApiError> {
        self.dispatcher
            .dispatch(&RequestDescriptor::get(Self::action_path(action)))
            .await
    }

    /// POST a record-level action.
    pub async fn item_action<B, T>(&self, id: Id, action: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::post(Self::item_action_path(id, action)).json(body)?;
        self.dispatcher.dispatch(&request).await
    }

    async fn follow(&self, cursor: Option<&str>) -> Result<Option<Page<R::Item>>, ApiError> {
        match cursor {
            Some(url) => self
                .dispatcher
                .dispatch(&RequestDescriptor::get(url))
                .await
                .map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Widget;

    struct Widgets;

    impl Resource for Widgets {
        const PATH: &'static str = "/api/v1/widgets/";
        type Item = Widget;
        type Create = ();
        type Update = ();
        type Filter = ListFilter;
    }

    #[test]
    fn test_paths() {
        assert_eq!(ResourceClient::<Widgets>::item_path(12), "/api/v1/widgets/12/");
        assert_eq!(
            ResourceClient::<Widgets>::action_path("summary"),
            "/api/v1/widgets/summary/"
        );
        assert_eq!(
            ResourceClient::<Widgets>::item_action_path(3, "update_progress"),
            "/api/v1/widgets/3/update_progress/"
        );
    }

    #[test]
    fn test_list_filter_encoding() {
        let filter = ListFilter::new()
            .search("")
            .ordering("-created_at")
            .page(2)
            .param("is_active", true);

        assert_eq!(
            filter.query().to_query_string(),
            "ordering=-created_at&page=2&is_active=true"
        );
    }
}
