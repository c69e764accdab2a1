//! Process-local MCP sessions.
//!
//! A session is a per-peer state container identified by a UUIDv4. It carries
//! one opaque data slot whose only required capability is producing a
//! printable summary for diagnostics; handlers downcast it back to their own
//! type via [`SessionData::as_any`].
//!
//! Ownership: the transport that created a session owns its table. Stdio runs
//! with exactly one implicit session for the whole process; streamable HTTP
//! creates one per `Mcp-Session-Id` and deletes it on DELETE or process exit.

pub mod context;

pub use context::RequestContext;

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

/// Opaque per-session state supplied by the embedding application.
pub trait SessionData: Send + Sync + 'static {
    /// Printable summary used in diagnostics and structured logs.
    fn summary(&self) -> String;

    /// Downcast access for handlers that know the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// One peer's session: a UUID plus the opaque data slot.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    data: RwLock<Option<Arc<dyn SessionData>>>,
}

impl std::fmt::Debug for dyn SessionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionData({})", self.summary())
    }
}

impl Session {
    fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    fn with_id(id: Uuid) -> Self {
        Self {
            id,
            data: RwLock::new(None),
        }
    }

    /// The session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Reads the data slot.
    pub fn data(&self) -> Option<Arc<dyn SessionData>> {
        self.data.read().clone()
    }

    /// Replaces the data slot.
    pub fn set_data(&self, data: Arc<dyn SessionData>) {
        *self.data.write() = Some(data);
    }
}

/// UUID-keyed table of live sessions.
///
/// Create/delete/lookup may race across tasks; the table is a concurrent map
/// so no external locking is required. A given id maps to at most one active
/// session at any time.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<Uuid, Arc<Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a session under a fresh UUIDv4 and stores it in the table.
    pub fn create_session(&self) -> Arc<Session> {
        let session = Arc::new(Session::new());
        self.sessions.insert(session.id(), session.clone());
        session
    }

    /// Looks a session up by id.
    pub fn find_by_id(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Finds the session for `id`, creating it under that exact id when
    /// absent. Callers hold the id from a transport header, so the table key
    /// and the advertised id always agree.
    pub fn resolve_or_create(&self, id: Uuid) -> Arc<Session> {
        self.sessions
            .entry(id)
            .or_insert_with(|| Arc::new(Session::with_id(id)))
            .clone()
    }

    /// Removes a session from the table.
    pub fn delete(&self, id: Uuid) {
        self.sessions.remove(&id);
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Reads the data slot of the session attached to `ctx`.
    ///
    /// Returns `None` when the context carries no session or the session has
    /// since been deleted from this table.
    pub fn session_data(&self, ctx: &RequestContext) -> Option<Arc<dyn SessionData>> {
        let session = ctx.session()?;
        if !self.sessions.contains_key(&session.id()) {
            return None;
        }
        session.data()
    }

    /// Writes the data slot of the session attached to `ctx`.
    ///
    /// A context without a session, or one whose session was already deleted
    /// from this table, is ignored.
    pub fn set_session_data(&self, ctx: &RequestContext, data: Arc<dyn SessionData>) {
        if let Some(session) = ctx.session() {
            if self.sessions.contains_key(&session.id()) {
                session.set_data(data);
            }
        }
    }
}
