use crate::models::{Account, NewAccount};
use crate::resource::{ListFilter, Resource};

/// `/api/v1/accounts/`
pub struct Accounts;

impl Resource for Accounts {
    const PATH: &'static str = "/api/v1/accounts/";
    type Item = Account;
    type Create = NewAccount;
    type Update = NewAccount;
    type Filter = ListFilter;
}
