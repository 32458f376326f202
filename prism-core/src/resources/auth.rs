//! Sign-in, registration, sign-out and explicit renewal.

use serde::{Deserialize, Serialize};

use crate::credential::CredentialPair;
use crate::dispatcher::Dispatcher;
use crate::error::ApiError;
use crate::models::{Registration, User};
use crate::request::RequestDescriptor;

pub const LOGIN_PATH: &str = "/api/auth/login/";
pub const REGISTER_PATH: &str = "/api/auth/register/";
pub const LOGOUT_PATH: &str = "/api/auth/logout/";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LogoutRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct IssuedTokens {
    access: String,
    refresh: String,
}

/// Token issuance response. Both shapes are in use.
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthResponse {
    Nested { user: User, tokens: IssuedTokens },
    Flat {
        access: String,
        refresh: String,
        user: User,
    },
}

impl AuthResponse {
    fn into_parts(self) -> (User, CredentialPair) {
        match self {
            Self::Nested { user, tokens } => {
                (user, CredentialPair::new(tokens.access, tokens.refresh))
            }
            Self::Flat {
                access,
                refresh,
                user,
            } => (user, CredentialPair::new(access, refresh)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    dispatcher: Dispatcher,
}

impl AuthClient {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Exchange email and password for a credential pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let request = RequestDescriptor::post(LOGIN_PATH).json(&LoginRequest { email, password })?;
        self.issue(&request).await
    }

    /// Create an account and sign in to it.
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let request = RequestDescriptor::post(REGISTER_PATH).json(registration)?;
        self.issue(&request).await
    }

    /// Tell the backend (best effort) and sign out locally.
    ///
    /// The local session is cleared whatever the backend says.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let credentials = self.dispatcher.credentials();

        if let Some(pair) = credentials.credentials() {
            let notify = RequestDescriptor::post(LOGOUT_PATH).json(&LogoutRequest {
                refresh: pair.refresh_token().expose(),
            });
            match notify {
                Ok(request) => match self.dispatcher.send_attached(&request).await {
                    Ok(response) if response.is_success() => {
                        tracing::debug!("Backend acknowledged logout");
                    }
                    Ok(response) => {
                        tracing::debug!("Backend logout returned {}; ignoring", response.status);
                    }
                    Err(e) => tracing::debug!("Backend logout failed: {}; ignoring", e),
                },
                Err(e) => tracing::debug!("Could not build logout request: {}", e),
            }
        }

        credentials.sign_out().await?;
        Ok(())
    }

    /// Renew the access credential now.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.dispatcher.credentials().renew().await
    }

    async fn issue(&self, request: &RequestDescriptor) -> Result<User, ApiError> {
        let response: AuthResponse = self.dispatcher.dispatch_anonymous(request).await?;
        let (user, pair) = response.into_parts();
        self.dispatcher.credentials().establish(pair).await?;
        tracing::info!("Signed in as {}", user.email);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_both_response_shapes() {
        let user = json!({"id": 1, "email": "jane@example.com"});

        let nested: AuthResponse = serde_json::from_value(json!({
            "user": user.clone(),
            "tokens": {"access": "a1", "refresh": "r1"}
        }))
        .unwrap();
        let flat: AuthResponse = serde_json::from_value(json!({
            "access": "a2", "refresh": "r2", "user": user
        }))
        .unwrap();

        let (_, pair) = nested.into_parts();
        assert_eq!(pair, CredentialPair::new("a1", "r1"));
        let (user, pair) = flat.into_parts();
        assert_eq!(pair, CredentialPair::new("a2", "r2"));
        assert_eq!(user.id, 1);
    }
}
