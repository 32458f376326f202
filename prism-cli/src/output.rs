//! Rendering of API records for the terminal.

use anyhow::Result;
use prism_core::Page;
use prism_core::models::{
    Account, Budget, CategoriesByType, Category, Goal, Summary, Transaction, User,
};
use serde::Serialize;

use crate::Format;

/// One-line text form of a record.
pub trait Row {
    fn row(&self) -> String;
}

impl Row for Account {
    fn row(&self) -> String {
        let status = if self.is_active { "" } else { " (inactive)" };
        format!(
            "#{:<5} {:<30} {:<12} {:>12}{}",
            self.id,
            self.name,
            format!("{:?}", self.account_type).to_lowercase(),
            self.balance,
            status
        )
    }
}

impl Row for Transaction {
    fn row(&self) -> String {
        let category = self
            .category
            .as_ref()
            .and_then(|c| c.name())
            .unwrap_or("-");
        format!(
            "#{:<5} {} {:>12}  {:<30} [{}]",
            self.id, self.date, self.amount, self.description, category
        )
    }
}

impl Row for Category {
    fn row(&self) -> String {
        format!(
            "#{:<5} {} ({})",
            self.id,
            self.full_name.as_deref().unwrap_or(&self.name),
            format!("{:?}", self.category_type).to_lowercase()
        )
    }
}

impl Row for Budget {
    fn row(&self) -> String {
        let spent = self.spent_amount.as_deref().unwrap_or("?");
        let flag = if self.is_over_budget { "  OVER" } else { "" };
        format!(
            "#{:<5} {:<24} {} / {}  {} .. {}{}",
            self.id, self.name, spent, self.amount, self.start_date, self.end_date, flag
        )
    }
}

impl Row for Goal {
    fn row(&self) -> String {
        let progress = self
            .progress_percentage
            .map(|p| format!("{:.0}%", p))
            .unwrap_or_else(|| "-".to_string());
        format!(
            "#{:<5} {:<30} {} / {} ({})",
            self.id, self.name, self.current_amount, self.target_amount, progress
        )
    }
}

impl Row for User {
    fn row(&self) -> String {
        format!("{} <{}>", self.display_name(), self.email)
    }
}

impl Row for Summary {
    fn row(&self) -> String {
        self.as_map()
            .iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => format!("{}: {}", key, s),
                other => format!("{}: {}", key, other),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn record<T: Row + Serialize>(value: &T, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Text => println!("{}", value.row()),
    }
    Ok(())
}

pub fn page<T: Row + Serialize>(page: &Page<T>, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(page)?),
        Format::Text => {
            print!("{}", rows(page.iter()));
            let more = if page.has_next() { ", more available" } else { "" };
            println!("({} of {}{})", page.len(), page.count, more);
        }
    }
    Ok(())
}

pub fn all<T: Row + Serialize>(items: &[T], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(items)?),
        Format::Text => {
            print!("{}", rows(items.iter()));
            println!("({} total)", items.len());
        }
    }
    Ok(())
}

/// Categories indented by depth.
pub fn tree(roots: &[Category], format: Format) -> Result<()> {
    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(roots)?);
        return Ok(());
    }

    fn walk(category: &Category, depth: usize, out: &mut String) {
        out.push_str(&format!("{}{} (#{})\n", "  ".repeat(depth), category.name, category.id));
        for child in &category.subcategories {
            walk(child, depth + 1, out);
        }
    }

    let mut out = String::new();
    for root in roots {
        walk(root, 0, &mut out);
    }
    print!("{}", out);
    Ok(())
}

/// Income then expense categories, each under a heading.
pub fn grouped(groups: &CategoriesByType, format: Format) -> Result<()> {
    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(groups)?);
        return Ok(());
    }
    for (heading, group) in [("Income", &groups.income), ("Expense", &groups.expense)] {
        println!("{} ({})", heading, group.count);
        print!("{}", rows(group.categories.iter()));
    }
    Ok(())
}

fn rows<'a, T: Row + 'a>(items: impl Iterator<Item = &'a T>) -> String {
    items.map(|item| format!("{}\n", item.row())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transaction_row() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": 12,
            "account": 1,
            "category": {"id": 3, "name": "Groceries"},
            "amount": "-42.10",
            "description": "Market",
            "date": "2024-03-04"
        }))
        .unwrap();

        let row = tx.row();
        assert!(row.starts_with("#12"));
        assert!(row.contains("2024-03-04"));
        assert!(row.ends_with("[Groceries]"));
    }

    #[test]
    fn test_summary_one_figure_per_line() {
        let summary: Summary =
            serde_json::from_value(json!({"total": "10.00", "count": 2})).unwrap();
        let row = summary.row();
        let lines: Vec<&str> = row.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.contains(&"count: 2"));
        assert!(lines.contains(&"total: 10.00"));
    }

    #[test]
    fn test_rows_one_per_line() {
        let users: Vec<User> = vec![
            serde_json::from_value(json!({"id": 1, "email": "a@example.com"})).unwrap(),
            serde_json::from_value(json!({"id": 2, "email": "b@example.com", "first_name": "Bo"}))
                .unwrap(),
        ];
        assert_eq!(
            rows(users.iter()),
            "a@example.com <a@example.com>\nBo <b@example.com>\n"
        );
    }
}
