use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Related;
use crate::resource::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    #[default]
    Expense,
    Income,
}

/// A category, possibly with nested subcategories (as returned by the tree view).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub category_type: CategoryType,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub parent: Option<Related>,
    #[serde(default)]
    pub subcategories: Vec<Category>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    /// This category and all its descendants, depth first.
    pub fn flatten(&self) -> Vec<&Category> {
        let mut out = vec![self];
        for child in &self.subcategories {
            out.extend(child.flatten());
        }
        out
    }
}

/// Active categories split by type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoriesByType {
    #[serde(default)]
    pub income: CategoryGroup,
    #[serde(default)]
    pub expense: CategoryGroup,
}

impl CategoriesByType {
    pub fn of(&self, category_type: CategoryType) -> &CategoryGroup {
        match category_type {
            CategoryType::Income => &self.income,
            CategoryType::Expense => &self.expense,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub count: u64,
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCategory {
    pub name: String,
    pub category_type: CategoryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub parent: Option<Id>,
}
