//! Credential lifecycle: attach, single-flight renewal, sign-out.
//!
//! [`CredentialManager`] owns the current [`CredentialPair`] and the one
//! renewal episode that may be open at any time.
//!
//! # Renewal protocol
//!
//! 1. A request that fails with 401 calls
//!    [`on_auth_failure`](CredentialManager::on_auth_failure).
//! 2. If the credential changed since the request was sent, it is replayed
//!    straight away with the current one.
//! 3. Otherwise the caller joins the open episode, or opens one. Opening an
//!    episode spawns the refresh exchange on its own task, so cancelling the
//!    opener does not strand the other waiters.
//! 4. On success every waiter gets a [`Replay`] carrying the new credential.
//!    On rejection the pair is cleared, [`SessionEvent::SignedOut`] is
//!    emitted once and every waiter fails with [`ApiError::AuthExpired`].
//! 5. A replay that fails with 401 again goes to
//!    [`reject_replay`](CredentialManager::reject_replay), never back to
//!    `on_auth_failure`, which bounds every request to one replay.
//!
//! Lock order is always `episode` before `state`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

use crate::credential::{CredentialPair, CredentialStore};
use crate::error::ApiError;
use crate::request::RequestDescriptor;
use crate::store::StoreError;
use crate::transport::Transport;

/// Path of the token renewal endpoint.
pub const REFRESH_PATH: &str = "/api/auth/token/refresh/";

const EVENT_CAPACITY: usize = 16;

/// Lifecycle events the surrounding application reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A credential pair was installed by login, registration or renewal.
    CredentialEstablished,
    /// The credential pair was removed.
    SignedOut { reason: SignOutReason },
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// Explicit sign-out or logout.
    Requested,
    /// Renewal failed: the refresh exchange was refused or could not
    /// complete, or a replay was refused.
    RenewalFailed,
}

/// A request with the credential attached, tagged with the credential
/// generation it was sent under.
#[derive(Debug, Clone)]
pub struct AuthorizedRequest {
    original: RequestDescriptor,
    request: RequestDescriptor,
    generation: u64,
}

impl AuthorizedRequest {
    /// The descriptor as it goes on the wire.
    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    /// The descriptor as the caller built it.
    pub fn original(&self) -> &RequestDescriptor {
        &self.original
    }
}

/// The single permitted replay of a request after renewal.
///
/// Only [`CredentialManager::reject_replay`] accepts it, so a replay can
/// never open another renewal.
#[derive(Debug, Clone)]
pub struct Replay(AuthorizedRequest);

impl Replay {
    pub fn request(&self) -> &RequestDescriptor {
        self.0.request()
    }
}

#[derive(Debug)]
struct CredentialState {
    pair: Option<CredentialPair>,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Renewed,
    Rejected,
}

struct Waiter {
    id: u64,
    request: RequestDescriptor,
}

/// An open renewal: the refresh exchange in flight plus everyone waiting on it.
struct Episode {
    id: u64,
    generation: u64,
    waiters: Mutex<Vec<Waiter>>,
    resolution: watch::Sender<Option<Resolution>>,
}

impl Episode {
    fn new(id: u64, generation: u64) -> Self {
        let (resolution, _) = watch::channel(None);
        Self {
            id,
            generation,
            waiters: Mutex::new(Vec::new()),
            resolution,
        }
    }

    fn join(self: &Arc<Self>, id: u64, request: RequestDescriptor) -> WaiterGuard {
        self.waiters.lock().push(Waiter { id, request });
        WaiterGuard {
            episode: Arc::clone(self),
            id,
        }
    }

    fn resolve(&self, resolution: Resolution) {
        self.resolution.send_replace(Some(resolution));
    }
}

/// Removes a waiter from its episode when the waiting future completes or
/// is dropped.
struct WaiterGuard {
    episode: Arc<Episode>,
    id: u64,
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        self.episode.waiters.lock().retain(|w| w.id != self.id);
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

struct Inner {
    store: CredentialStore,
    transport: Arc<dyn Transport>,
    state: RwLock<CredentialState>,
    episode: Mutex<Option<Arc<Episode>>>,
    // Serializes writes to the backing store so it always ends up matching
    // the last in-memory state.
    persist_lock: tokio::sync::Mutex<()>,
    next_id: AtomicU64,
    refresh_exchanges: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

/// Owns the credential pair and the renewal state machine.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CredentialManager {
    inner: Arc<Inner>,
}

impl CredentialManager {
    /// Create a manager with no credential.
    pub fn new(store: CredentialStore, transport: Arc<dyn Transport>) -> Self {
        Self::with_pair(store, transport, None)
    }

    /// Create a manager, restoring any pair persisted in `store`.
    pub async fn load(
        store: CredentialStore,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, StoreError> {
        let pair = store.load().await?;
        if pair.is_some() {
            tracing::info!("Restored stored credential pair");
        }
        Ok(Self::with_pair(store, transport, pair))
    }

    fn with_pair(
        store: CredentialStore,
        transport: Arc<dyn Transport>,
        pair: Option<CredentialPair>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                state: RwLock::new(CredentialState {
                    pair,
                    generation: 0,
                }),
                episode: Mutex::new(None),
                persist_lock: tokio::sync::Mutex::new(()),
                next_id: AtomicU64::new(1),
                refresh_exchanges: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Whether a credential pair is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().pair.is_some()
    }

    /// Snapshot of the current pair.
    pub fn credentials(&self) -> Option<CredentialPair> {
        self.inner.state.read().pair.clone()
    }

    /// Number of refresh exchanges performed so far.
    pub fn refresh_exchanges(&self) -> u64 {
        self.inner.refresh_exchanges.load(Ordering::SeqCst)
    }

    /// Number of requests waiting on the open renewal episode.
    pub fn pending_waiters(&self) -> usize {
        self.inner
            .episode
            .lock()
            .as_ref()
            .map(|e| e.waiters.lock().len())
            .unwrap_or(0)
    }

    /// Whether a renewal episode is open.
    pub fn is_renewing(&self) -> bool {
        self.inner.episode.lock().is_some()
    }

    /// Copy of `descriptor` with the current access credential attached.
    ///
    /// Returns the descriptor unchanged when no credential is held.
    pub fn attach(&self, descriptor: &RequestDescriptor) -> RequestDescriptor {
        self.attach_tracked(descriptor).request
    }

    /// Like [`attach`](Self::attach), also recording the credential generation.
    pub fn attach_tracked(&self, descriptor: &RequestDescriptor) -> AuthorizedRequest {
        let state = self.inner.state.read();
        attach_with(&state, descriptor)
    }

    /// Install a freshly issued pair (login/registration).
    pub async fn establish(&self, pair: CredentialPair) -> Result<(), StoreError> {
        {
            let mut state = self.inner.state.write();
            state.pair = Some(pair);
            state.generation += 1;
        }
        tracing::info!("Credential pair established");
        let persisted = self.persist().await;
        self.emit(SessionEvent::CredentialEstablished);
        persisted
    }

    /// Clear the credential pair and emit [`SessionEvent::SignedOut`].
    ///
    /// Local state is always cleared; an error only reports that the
    /// backing store could not be updated.
    pub async fn sign_out(&self) -> Result<(), StoreError> {
        self.clear(SignOutReason::Requested).await
    }

    /// Handle a 401 for `failed`.
    ///
    /// Resolves to the replay to send, or to the error that ends the
    /// request. See the module docs for the protocol.
    pub async fn on_auth_failure(&self, failed: AuthorizedRequest) -> Result<Replay, ApiError> {
        self.await_credential(failed.generation, &failed.original)
            .await?;
        Ok(Replay(self.attach_tracked(&failed.original)))
    }

    /// Handle a 401 on a replay.
    ///
    /// The renewed credential was refused, so the session is over unless it
    /// has already been replaced in the meantime.
    pub async fn reject_replay(&self, replay: Replay) -> ApiError {
        let current = {
            let mut state = self.inner.state.write();
            if state.generation == replay.0.generation && state.pair.is_some() {
                state.pair = None;
                state.generation += 1;
                true
            } else {
                false
            }
        };

        if current {
            tracing::warn!("Replayed request {} rejected; signing out", replay.request());
            if let Err(e) = self.persist().await {
                tracing::error!("Failed to clear stored credentials: {}", e);
            }
            self.emit(SessionEvent::SignedOut {
                reason: SignOutReason::RenewalFailed,
            });
        }
        ApiError::AuthExpired
    }

    /// Renew the access credential now, joining an open episode if there is one.
    pub async fn renew(&self) -> Result<(), ApiError> {
        let generation = {
            let state = self.inner.state.read();
            if state.pair.is_none() {
                return Err(ApiError::AuthExpired);
            }
            state.generation
        };
        let marker = RequestDescriptor::post(REFRESH_PATH);
        self.await_credential(generation, &marker).await
    }

    /// Wait until a credential newer than `generation` is installed.
    async fn await_credential(
        &self,
        generation: u64,
        request: &RequestDescriptor,
    ) -> Result<(), ApiError> {
        let (episode, opened) = {
            let mut slot = self.inner.episode.lock();
            let state = self.inner.state.read();

            if state.generation != generation || state.pair.is_none() {
                // Credential changed while this request was in flight, or
                // there is nothing to renew.
                return if state.pair.is_some() {
                    Ok(())
                } else {
                    Err(ApiError::AuthExpired)
                };
            }

            match slot.as_ref() {
                Some(episode) => (Arc::clone(episode), false),
                None => {
                    let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
                    let episode = Arc::new(Episode::new(id, state.generation));
                    *slot = Some(Arc::clone(&episode));
                    (episode, true)
                }
            }
        };

        let waiter_id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let _guard = episode.join(waiter_id, request.clone());
        let mut resolution = episode.resolution.subscribe();

        if opened {
            tracing::info!("Opening renewal episode {} for {}", episode.id, request);
            let manager = self.clone();
            let episode = Arc::clone(&episode);
            tokio::spawn(async move { manager.run_episode(episode).await });
        } else {
            tracing::debug!("{} joined renewal episode {}", request, episode.id);
        }

        let outcome = resolution
            .wait_for(Option::is_some)
            .await
            .map(|r| r.clone())
            .ok()
            .flatten()
            .unwrap_or(Resolution::Rejected);

        match outcome {
            Resolution::Renewed => Ok(()),
            Resolution::Rejected => Err(ApiError::AuthExpired),
        }
    }

    async fn run_episode(&self, episode: Arc<Episode>) {
        let resolution = match self.exchange_refresh().await {
            Ok(pair) => self.install_renewed(&episode, pair).await,
            Err(resolution) => resolution,
        };

        match &resolution {
            Resolution::Renewed => {}
            Resolution::Rejected => {
                let cleared = {
                    let mut slot = self.inner.episode.lock();
                    let mut state = self.inner.state.write();
                    close(&mut slot, &episode);
                    if state.generation == episode.generation && state.pair.is_some() {
                        state.pair = None;
                        state.generation += 1;
                        true
                    } else {
                        false
                    }
                };
                if cleared {
                    if let Err(e) = self.persist().await {
                        tracing::error!("Failed to clear stored credentials: {}", e);
                    }
                    self.emit(SessionEvent::SignedOut {
                        reason: SignOutReason::RenewalFailed,
                    });
                }
            }
        }

        tracing::debug!(
            "Renewal episode {} resolved ({} waiters): {:?}",
            episode.id,
            episode.waiters.lock().len(),
            resolution
        );
        episode.resolve(resolution);
    }

    async fn install_renewed(&self, episode: &Arc<Episode>, pair: CredentialPair) -> Resolution {
        let installed = {
            let mut slot = self.inner.episode.lock();
            let mut state = self.inner.state.write();
            close(&mut slot, episode);
            if state.generation == episode.generation {
                state.pair = Some(pair);
                state.generation += 1;
                Some(true)
            } else {
                // Signed in or out while renewing; keep whatever is current.
                state.pair.as_ref().map(|_| false)
            }
        };

        match installed {
            Some(true) => {
                tracing::info!("Access credential renewed (episode {})", episode.id);
                if let Err(e) = self.persist().await {
                    tracing::error!("Failed to persist renewed credentials: {}", e);
                }
                self.emit(SessionEvent::CredentialEstablished);
                Resolution::Renewed
            }
            Some(false) => Resolution::Renewed,
            None => Resolution::Rejected,
        }
    }

    /// Exchange the refresh credential for a new access credential.
    ///
    /// Sent straight through the transport: it must never be attached or
    /// routed back into renewal.
    async fn exchange_refresh(&self) -> Result<CredentialPair, Resolution> {
        let Some(current) = self.credentials() else {
            tracing::warn!("No refresh credential held; renewal impossible");
            return Err(Resolution::Rejected);
        };

        self.inner.refresh_exchanges.fetch_add(1, Ordering::SeqCst);

        let request = RequestDescriptor::post(REFRESH_PATH)
            .json(&RefreshRequest {
                refresh: current.refresh_token().expose(),
            })
            .map_err(|_| Resolution::Rejected)?;

        let response = self.inner.transport.send(&request).await.map_err(|e| {
            tracing::warn!("Refresh exchange failed: {}", e);
            Resolution::Rejected
        })?;

        if !response.is_success() {
            tracing::warn!("Refresh credential rejected ({})", response.status);
            return Err(Resolution::Rejected);
        }

        let body: RefreshResponse = serde_json::from_str(&response.body).map_err(|e| {
            tracing::warn!("Malformed refresh response: {}", e);
            Resolution::Rejected
        })?;

        Ok(current.renewed(body.access, body.refresh))
    }

    async fn clear(&self, reason: SignOutReason) -> Result<(), StoreError> {
        {
            let mut state = self.inner.state.write();
            if state.pair.take().is_some() {
                state.generation += 1;
            }
        }
        tracing::info!("Signed out ({:?})", reason);
        let persisted = self.persist().await;
        self.emit(SessionEvent::SignedOut { reason });
        persisted
    }

    /// Write the current in-memory pair (or its absence) to the store.
    async fn persist(&self) -> Result<(), StoreError> {
        let _lock = self.inner.persist_lock.lock().await;
        let snapshot = self.credentials();
        match snapshot {
            Some(pair) => self.inner.store.save(&pair).await,
            None => self.inner.store.clear().await,
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("authenticated", &self.is_authenticated())
            .field("renewing", &self.is_renewing())
            .finish()
    }
}

fn attach_with(state: &CredentialState, descriptor: &RequestDescriptor) -> AuthorizedRequest {
    let request = match &state.pair {
        Some(pair) => descriptor.authorized(pair.authorization_header()),
        None => descriptor.clone(),
    };
    AuthorizedRequest {
        original: descriptor.clone(),
        request,
        generation: state.generation,
    }
}

fn close(slot: &mut Option<Arc<Episode>>, episode: &Arc<Episode>) {
    if slot.as_ref().is_some_and(|open| Arc::ptr_eq(open, episode)) {
        *slot = None;
    }
}
