//! # Prism Core
//!
//! Authenticated request layer for the Prism personal-finance API.
//!
//! This crate provides:
//! - A credential manager with single-flight renewal and terminal sign-out
//! - A dispatcher that attaches credentials and replays a request at most once
//! - Typed clients for accounts, transactions, categories, budgets, goals and users
//! - In-memory, file and (optionally) keyring-based credential storage
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use prism_core::{ClientConfig, PrismClient, TransactionFilter};
//!
//! async fn recent_groceries(client: &PrismClient) -> Result<(), prism_core::ApiError> {
//!     client.auth().login("jane@example.com", "s3cret").await?;
//!     let page = client
//!         .transactions()
//!         .list(&TransactionFilter::new().category(3).search("market"))
//!         .await?;
//!     for tx in page {
//!         println!("{} {}", tx.date, tx.amount);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod credential;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod pagination;
pub mod request;
pub mod resource;
pub mod resources;
pub mod session;
pub mod store;
pub mod transport;

// Re-export commonly used types at crate root
pub use client::PrismClient;

pub use config::{ClientConfig, ConfigError};

pub use credential::{CredentialPair, CredentialStore};

pub use dispatcher::Dispatcher;

pub use error::{ApiError, FieldErrors, PrismError};

pub use pagination::Page;

pub use request::{Method, QueryFilter, QueryParams, RequestDescriptor};

pub use resource::{Id, ListFilter, Resource, ResourceClient};

pub use resources::{
    Accounts,
    AuthClient,
    Budgets,
    Categories,
    Goals,
    TransactionFilter,
    TransactionKind,
    Transactions,
    UserClient,
};

pub use session::{
    AuthorizedRequest,
    CredentialManager,
    Replay,
    SessionEvent,
    SignOutReason,
};

pub use store::{
    Secret,
    SecretStore,
    StoreBackend,
    StoreError,
    MemoryStore,
    FileStore,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};

pub use tokio_util::sync::CancellationToken;
