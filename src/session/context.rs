//! Per-call context handed to every handler.
//!
//! Carries the active session (privately: callers go through the accessors
//! or the [`SessionManager`](super::SessionManager) data-slot API), the
//! per-request cancellation token, and the transport's shutdown capability.
//! There is no process-global shutdown signal; a handler that wants the
//! transport to stop trips the capability it was handed.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::Session;

/// Context for one dispatched request or notification.
///
/// Cheap to clone; clones share the same session and tokens.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    session: Option<Arc<Session>>,
    cancellation: CancellationToken,
    shutdown: CancellationToken,
}

impl RequestContext {
    /// An empty context with no session attached. Mostly useful in tests;
    /// transports always attach a session.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context carrying `session`.
    pub fn for_session(session: Arc<Session>) -> Self {
        Self {
            session: Some(session),
            ..Self::default()
        }
    }

    /// Attaches the token that cancels this request (client disconnect,
    /// session DELETE, transport teardown).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Attaches the transport shutdown capability.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// The session this call runs under, if any.
    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// True once the request has been cancelled. Handlers are expected to
    /// honor this cooperatively.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves when the request is cancelled.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

    /// Asks the owning transport to shut down. Idempotent.
    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }
}
