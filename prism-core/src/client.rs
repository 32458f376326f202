//! One-stop entry point wiring store, session, transport and resource clients.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::credential::CredentialStore;
use crate::dispatcher::Dispatcher;
use crate::error::PrismError;
use crate::resource::ResourceClient;
use crate::resources::{
    Accounts, AuthClient, Budgets, Categories, Goals, Transactions, UserClient,
};
use crate::session::CredentialManager;
use crate::store::{SecretStore, StoreError, create_store};
use crate::transport::{HttpTransport, Transport};

/// Every resource client, sharing one credential manager.
#[derive(Debug, Clone)]
pub struct PrismClient {
    dispatcher: Dispatcher,
    accounts: ResourceClient<Accounts>,
    transactions: ResourceClient<Transactions>,
    categories: ResourceClient<Categories>,
    budgets: ResourceClient<Budgets>,
    goals: ResourceClient<Goals>,
    users: UserClient,
    auth: AuthClient,
}

impl PrismClient {
    /// Build a client from configuration, restoring any stored session.
    pub async fn from_config(config: &ClientConfig) -> Result<Self, PrismError> {
        let transport = HttpTransport::with_timeout(config.base_url()?, config.timeout())?;
        let store = create_store(config.store, Some(&config.credentials_path));
        tracing::debug!("Using backend at {}", transport.base_url());
        Ok(Self::connect(Arc::new(transport), store).await?)
    }

    /// Build a client over an arbitrary transport and secret store.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        store: Arc<dyn SecretStore>,
    ) -> Result<Self, StoreError> {
        let credentials =
            CredentialManager::load(CredentialStore::new(store), Arc::clone(&transport)).await?;
        Ok(Self::new(Dispatcher::new(credentials, transport)))
    }

    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            accounts: ResourceClient::new(dispatcher.clone()),
            transactions: ResourceClient::new(dispatcher.clone()),
            categories: ResourceClient::new(dispatcher.clone()),
            budgets: ResourceClient::new(dispatcher.clone()),
            goals: ResourceClient::new(dispatcher.clone()),
            users: UserClient::new(dispatcher.clone()),
            auth: AuthClient::new(dispatcher.clone()),
            dispatcher,
        }
    }

    pub fn session(&self) -> &CredentialManager {
        self.dispatcher.credentials()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn accounts(&self) -> &ResourceClient<Accounts> {
        &self.accounts
    }

    pub fn transactions(&self) -> &ResourceClient<Transactions> {
        &self.transactions
    }

    pub fn categories(&self) -> &ResourceClient<Categories> {
        &self.categories
    }

    pub fn budgets(&self) -> &ResourceClient<Budgets> {
        &self.budgets
    }

    pub fn goals(&self) -> &ResourceClient<Goals> {
        &self.goals
    }

    pub fn users(&self) -> &UserClient {
        &self.users
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }
}
