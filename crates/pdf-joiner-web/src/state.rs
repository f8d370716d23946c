use pdf_joiner_core::{AppConfig, MergeOptions, MergeOrchestrator, SelectionStore};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Session data for one browser's file selection
pub struct Session {
    pub selection: SelectionStore,
    /// Last time the session was touched (for idle expiry)
    pub last_active: Instant,
}

impl Session {
    fn new(selection: SelectionStore) -> Self {
        Self {
            selection,
            last_active: Instant::now(),
        }
    }
}

/// Global application state
pub struct AppState {
    /// Active sessions indexed by UUID
    sessions: RwLock<HashMap<Uuid, Session>>,
    /// Stateless merge engine shared by all requests
    pub orchestrator: MergeOrchestrator,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let orchestrator = MergeOrchestrator::new(&MergeOptions::from(&config.merge));

        Self {
            sessions: RwLock::new(HashMap::new()),
            orchestrator,
            config,
        }
    }

    /// Create a new, empty session.
    ///
    /// Returns the session ID as a string (for URL embedding).
    pub async fn create_session(&self) -> String {
        self.create_session_with(SelectionStore::new()).await
    }

    /// Create a session that starts from an existing selection.
    pub async fn create_session_with(&self, selection: SelectionStore) -> String {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(id, Session::new(selection));
        id.to_string()
    }

    /// Get a session by ID string.
    ///
    /// Returns `None` if the ID is not a valid UUID or session doesn't exist.
    pub async fn get_session(&self, id: &str) -> Option<SessionRef<'_>> {
        let uuid = Uuid::parse_str(id).ok()?;
        let sessions = self.sessions.read().await;
        if sessions.contains_key(&uuid) {
            Some(SessionRef {
                id: uuid,
                state: self,
            })
        } else {
            None
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than the configured TTL.
    ///
    /// Sessions with a merge in flight are kept. Returns how many were removed.
    pub async fn cleanup_idle_sessions(&self) -> usize {
        let max_idle = Duration::from_secs(self.config.session.ttl_seconds);
        self.cleanup_sessions_older_than(max_idle).await
    }

    async fn cleanup_sessions_older_than(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let before = sessions.len();

        sessions.retain(|_, session| {
            session.selection.is_merging() || now.duration_since(session.last_active) < max_idle
        });

        before - sessions.len()
    }
}

/// A borrowed reference to a session that provides safe access patterns.
///
/// Holding a lock guard across an `.await` point can deadlock and makes the
/// future non-`Send`. This type stores only the session ID and a reference
/// to the state, and acquires the lock inside synchronous closures:
///
/// ```ignore
/// // Lock is released before any await
/// let request = session.with_session_mut(|s| s.selection.begin_merge()).await?;
/// merge_in_background(request).await;
/// ```
pub struct SessionRef<'a> {
    id: Uuid,
    state: &'a AppState,
}

impl SessionRef<'_> {
    /// Access session data immutably within a closure.
    ///
    /// The closure runs synchronously while holding a read lock.
    /// The lock is released before this method returns.
    pub async fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Session) -> R,
    {
        let sessions = self.state.sessions.read().await;
        sessions.get(&self.id).map(f)
    }

    /// Access session data mutably within a closure.
    ///
    /// Also marks the session as active.
    pub async fn with_session_mut<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.state.sessions.write().await;
        sessions.get_mut(&self.id).map(|s| {
            s.last_active = Instant::now();
            f(s)
        })
    }
}
