//! Authenticated request dispatch.
//!
//! Every resource call goes through [`Dispatcher::dispatch`]: attach the
//! credential, send, decode. A 401 hands control to the
//! [`CredentialManager`], which yields at most one replay.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::request::RequestDescriptor;
use crate::session::CredentialManager;
use crate::transport::{Transport, TransportError, TransportResponse};

#[derive(Clone)]
pub struct Dispatcher {
    credentials: CredentialManager,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(credentials: CredentialManager, transport: Arc<dyn Transport>) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// Perform `request` and decode a 2xx body into `T`.
    pub async fn dispatch<T: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
    ) -> Result<T, ApiError> {
        let response = self.exchange(request).await?;
        decode(request, &response)
    }

    /// Like [`dispatch`](Self::dispatch), abandoned as soon as `cancel` fires.
    ///
    /// Abandoning while a renewal is in progress withdraws only this
    /// request; the renewal itself carries on for everyone else.
    pub async fn dispatch_cancellable<T: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<T, ApiError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("{} cancelled", request);
                Err(ApiError::Cancelled)
            }
            result = self.dispatch(request) => result,
        }
    }

    /// Attach and send once, with no renewal on 401.
    ///
    /// Returns the raw response; only non-delivery is an error.
    pub async fn send_attached(
        &self,
        request: &RequestDescriptor,
    ) -> Result<TransportResponse, ApiError> {
        let attached = self.credentials.attach(request);
        self.send(&attached).await
    }

    /// Send without a credential and without renewal, e.g. login.
    ///
    /// A 401 here is an ordinary rejection.
    pub async fn dispatch_anonymous<T: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
    ) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        decode(request, &response)
    }

    async fn exchange(&self, request: &RequestDescriptor) -> Result<TransportResponse, ApiError> {
        let attempt = self.credentials.attach_tracked(request);
        let response = self.send(attempt.request()).await?;
        if !response.is_auth_failure() {
            return Ok(response);
        }

        tracing::debug!("{} unauthorized; awaiting renewal", request);
        let replay = self.credentials.on_auth_failure(attempt).await?;

        let response = self.send(replay.request()).await?;
        if response.is_auth_failure() {
            return Err(self.credentials.reject_replay(replay).await);
        }
        Ok(response)
    }

    async fn send(&self, request: &RequestDescriptor) -> Result<TransportResponse, ApiError> {
        self.transport.send(request).await.map_err(|e| match e {
            // Absolute URLs only come from response cursors.
            TransportError::ForeignOrigin { .. } => ApiError::Decode {
                path: request.path().to_string(),
                message: e.to_string(),
            },
            other => ApiError::NetworkUnavailable {
                message: other.to_string(),
            },
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(
    request: &RequestDescriptor,
    response: &TransportResponse,
) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(ApiError::from_response(response.status, &response.body));
    }

    let body = response.body.trim();
    let parsed = if body.is_empty() {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_str(body)
    };

    parsed.map_err(|e| ApiError::Decode {
        path: request.path().to_string(),
        message: e.to_string(),
    })
}
