//! Concrete resource clients.

mod accounts;
mod auth;
mod budgets;
mod categories;
mod goals;
mod transactions;
mod users;

pub use accounts::Accounts;
pub use auth::AuthClient;
pub use budgets::Budgets;
pub use categories::Categories;
pub use goals::Goals;
pub use transactions::{TransactionFilter, TransactionKind, Transactions};
pub use users::UserClient;
