use crate::dispatcher::Dispatcher;
use crate::error::ApiError;
use crate::models::{PasswordChange, ProfileUpdate, User};
use crate::request::RequestDescriptor;

pub const PROFILE_PATH: &str = "/api/users/profile/";
pub const CHANGE_PASSWORD_PATH: &str = "/api/users/change-password/";

/// The signed-in user's own profile.
#[derive(Debug, Clone)]
pub struct UserClient {
    dispatcher: Dispatcher,
}

impl UserClient {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        self.dispatcher
            .dispatch(&RequestDescriptor::get(PROFILE_PATH))
            .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let request = RequestDescriptor::put(PROFILE_PATH).json(update)?;
        self.dispatcher.dispatch(&request).await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        let request = RequestDescriptor::post(CHANGE_PASSWORD_PATH).json(change)?;
        // The body is a confirmation message only.
        self.dispatcher
            .dispatch::<serde_json::Value>(&request)
            .await
            .map(|_| ())
    }
}
