use crate::error::ApiError;
use crate::models::{CategoriesByType, Category, NewCategory};
use crate::pagination::Page;
use crate::resource::{ListFilter, Resource, ResourceClient};

/// `/api/v1/categories/`
pub struct Categories;

impl Resource for Categories {
    const PATH: &'static str = "/api/v1/categories/";
    type Item = Category;
    type Create = NewCategory;
    type Update = NewCategory;
    type Filter = ListFilter;
}

impl ResourceClient<Categories> {
    /// Top-level categories with their subcategories nested.
    pub async fn tree(&self) -> Result<Page<Category>, ApiError> {
        self.action("tree").await
    }

    /// Active categories grouped into income and expense.
    pub async fn by_type(&self) -> Result<CategoriesByType, ApiError> {
        self.action("by_type").await
    }
}
