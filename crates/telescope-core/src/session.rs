use crate::config::EngineConfig;
use crate::debounce::Debouncer;
use crate::error::{Error, Result};
use crate::navigator::ResultSetNavigator;
use crate::planner::FilterConfig;
use crate::preview::PreviewCoordinator;
use crate::surface::SurfaceSnapshot;
use ahash::AHashMap;
use std::fmt;
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// Host-chosen identifier of a search session (e.g. the editor window id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(pub u64);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A running search task. Dropping it aborts the task, and the task's
/// processes are killed when their handles drop.
#[derive(Debug)]
pub struct InFlightSearch {
    pub generation: u64,
    task: JoinHandle<()>,
}

impl InFlightSearch {
    pub fn new(generation: u64, task: JoinHandle<()>) -> Self {
        Self { generation, task }
    }
}

impl Drop for InFlightSearch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// All state of one live search
#[derive(Debug)]
pub struct SearchSession<H> {
    pub key: SessionKey,
    pub filters: FilterConfig,
    pub roots: Vec<PathBuf>,
    pub debouncer: Debouncer,
    pub navigator: ResultSetNavigator,
    pub preview: PreviewCoordinator<H>,
    pub in_flight: Option<InFlightSearch>,
    /// Query of the result set currently shown
    pub applied_query: Option<String>,
    /// Editor state to return to on cancel
    pub initial_state: SurfaceSnapshot<H>,
}

impl<H: Copy + Eq + fmt::Debug> SearchSession<H> {
    pub fn new(
        key: SessionKey,
        roots: Vec<PathBuf>,
        filters: FilterConfig,
        config: &EngineConfig,
        initial_state: SurfaceSnapshot<H>,
    ) -> Self {
        Self {
            key,
            filters,
            roots,
            debouncer: Debouncer::new(config.debounce_window()),
            navigator: ResultSetNavigator::new(config.selection),
            preview: PreviewCoordinator::new(config.highlight_name.clone()),
            in_flight: None,
            applied_query: None,
            initial_state,
        }
    }

    /// The query most recently typed, searched or not
    pub fn query(&self) -> &str {
        self.debouncer.latest_query()
    }

    /// Cancel the pending timer and abort the running search
    pub fn stop(&mut self) {
        self.debouncer.cancel();
        self.debouncer.supersede();
        self.in_flight = None;
    }
}

/// Owns every active session. There are no process-wide session maps; the
/// store is passed to whoever needs a session.
#[derive(Debug)]
pub struct SessionStore<H> {
    sessions: AHashMap<SessionKey, SearchSession<H>>,
}

impl<H> Default for SessionStore<H> {
    fn default() -> Self {
        Self {
            sessions: AHashMap::new(),
        }
    }
}

impl<H: Copy + Eq + fmt::Debug> SessionStore<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session, returning the one it replaced
    pub fn insert(&mut self, session: SearchSession<H>) -> Option<SearchSession<H>> {
        self.sessions.insert(session.key, session)
    }

    pub fn get(&self, key: SessionKey) -> Option<&SearchSession<H>> {
        self.sessions.get(&key)
    }

    pub fn get_mut(&mut self, key: SessionKey) -> Option<&mut SearchSession<H>> {
        self.sessions.get_mut(&key)
    }

    pub fn try_get_mut(&mut self, key: SessionKey) -> Result<&mut SearchSession<H>> {
        self.sessions
            .get_mut(&key)
            .ok_or(Error::UnknownSession(key))
    }

    pub fn remove(&mut self, key: SessionKey) -> Option<SearchSession<H>> {
        self.sessions.remove(&key)
    }

    pub fn contains(&self, key: SessionKey) -> bool {
        self.sessions.contains_key(&key)
    }

    /// The session whose preview is bound to (or waiting on) `handle`
    pub fn find_by_surface(&mut self, handle: H) -> Option<&mut SearchSession<H>> {
        self.sessions.values_mut().find(|s| s.preview.owns(handle))
    }

    pub fn keys(&self) -> impl Iterator<Item = SessionKey> + '_ {
        self.sessions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Hand `owner`'s preview surface over to it alone: every other session
    /// bound to (or waiting on) the same surface forgets it. Returns the
    /// sessions that were detached.
    pub fn claim_surface(&mut self, owner: SessionKey) -> Vec<SessionKey> {
        let Some(handle) = self
            .sessions
            .get(&owner)
            .and_then(|s| s.preview.bound_handle())
        else {
            return Vec::new();
        };

        self.sessions
            .values_mut()
            .filter(|s| s.key != owner)
            .filter_map(|s| s.preview.detach(handle).then_some(s.key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(key: u64) -> SearchSession<u32> {
        SearchSession::new(
            SessionKey(key),
            vec![PathBuf::from("/proj")],
            FilterConfig::default(),
            &EngineConfig::default(),
            SurfaceSnapshot::default(),
        )
    }

    #[test]
    fn test_store_insert_replace_remove() {
        let mut store = SessionStore::new();
        assert!(store.insert(session(1)).is_none());
        assert!(store.insert(session(2)).is_none());
        assert!(store.insert(session(1)).is_some());
        assert_eq!(store.len(), 2);

        assert!(store.remove(SessionKey(1)).is_some());
        assert!(!store.contains(SessionKey(1)));
        assert!(store.get(SessionKey(2)).is_some());
        assert!(matches!(
            store.try_get_mut(SessionKey(1)),
            Err(Error::UnknownSession(SessionKey(1)))
        ));
    }

    #[test]
    fn test_find_by_surface_without_preview() {
        let mut store = SessionStore::new();
        store.insert(session(7));
        assert!(store.find_by_surface(3).is_none());
    }

    #[tokio::test]
    async fn test_dropping_in_flight_aborts_task() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await
        });
        drop(InFlightSearch::new(1, task));
        // the sender only drops when the aborted task's future is dropped
        assert!(rx.await.is_err());
    }

    #[test]
    fn test_session_key_display() {
        assert_eq!(SessionKey(42).to_string(), "session-42");
    }
}
