//! The cooperative event loop owning every search session.
//!
//! All session state is touched from [`Engine::handle`] only. Debounce timers
//! and searches run as tokio tasks which post their outcome back into the
//! same queue as host commands, so there is no shared mutable state between
//! tasks. Results are accepted only when their generation is still the
//! session's current one.

use crate::config::EngineConfig;
use crate::debounce::{Ticket, TimerOutcome, TimerRequest};
use crate::path_utils;
use crate::planner::{FilterConfig, QueryPlanner, is_searchable};
use crate::preview::PreviewState;
use crate::runner::{SearchRunner, run_search};
use crate::session::{InFlightSearch, SearchSession, SessionKey, SessionStore};
use crate::surface::{EditorSurface, SurfaceSnapshot};
use crate::types::{ResultSet, SearchResult};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

#[derive(Debug)]
pub enum EngineEvent<H> {
    /// Start (or restart) a session searching `roots`
    Open {
        session: SessionKey,
        roots: Vec<PathBuf>,
        filters: FilterConfig,
    },
    QueryEdited {
        session: SessionKey,
        query: String,
    },
    /// Move the highlight, wrapping around the result list
    Navigate { session: SessionKey, delta: i64 },
    /// Highlight a specific row (mouse hover, list selection)
    Highlight { session: SessionKey, index: usize },
    /// A surface finished loading its content
    SurfaceLoaded { handle: H },
    /// Close the session, opening the highlighted result when `confirm`
    Dismiss { session: SessionKey, confirm: bool },
    Shutdown,
    TimerFired { session: SessionKey, token: u64 },
    SearchFinished {
        session: SessionKey,
        generation: u64,
        query: String,
        results: ResultSet,
    },
}

/// What the host should render
#[derive(Debug, Clone)]
pub enum EngineUpdate<H> {
    Results {
        session: SessionKey,
        query: String,
        results: ResultSet,
        highlighted: Option<usize>,
    },
    Highlighted {
        session: SessionKey,
        index: Option<usize>,
    },
    Confirmed {
        session: SessionKey,
        result: SearchResult,
        handle: H,
    },
    Dismissed { session: SessionKey },
}

pub struct Engine<R, S: EditorSurface> {
    config: EngineConfig,
    runner: Arc<R>,
    surface: S,
    sessions: SessionStore<S::Handle>,
    events_tx: UnboundedSender<EngineEvent<S::Handle>>,
    events_rx: UnboundedReceiver<EngineEvent<S::Handle>>,
    updates: UnboundedSender<EngineUpdate<S::Handle>>,
    shut_down: bool,
}

impl<R: SearchRunner, S: EditorSurface> Engine<R, S> {
    pub fn new(
        config: EngineConfig,
        runner: R,
        surface: S,
    ) -> (Self, UnboundedReceiver<EngineUpdate<S::Handle>>) {
        let (events_tx, events_rx) = unbounded_channel();
        let (updates, updates_rx) = unbounded_channel();

        let engine = Self {
            config: config.validated(),
            runner: Arc::new(runner),
            surface,
            sessions: SessionStore::new(),
            events_tx,
            events_rx,
            updates,
            shut_down: false,
        };

        (engine, updates_rx)
    }

    /// Queue handle for hosts posting events from other tasks
    pub fn sender(&self) -> UnboundedSender<EngineEvent<S::Handle>> {
        self.events_tx.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn session(&self, key: SessionKey) -> Option<&SearchSession<S::Handle>> {
        self.sessions.get(key)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Wait for the next queued event and handle it. Returns false after
    /// shutdown.
    pub async fn step(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle(event);
                !self.shut_down
            }
            None => false,
        }
    }

    pub async fn run(&mut self) {
        while self.step().await {}
        info!("Engine stopped");
    }

    pub fn handle(&mut self, event: EngineEvent<S::Handle>) {
        match event {
            EngineEvent::Open {
                session,
                roots,
                filters,
            } => self.open(session, roots, filters),
            EngineEvent::QueryEdited { session, query } => self.query_edited(session, query),
            EngineEvent::Navigate { session, delta } => self.navigate(session, delta),
            EngineEvent::Highlight { session, index } => self.highlight(session, index),
            EngineEvent::SurfaceLoaded { handle } => self.surface_loaded(handle),
            EngineEvent::Dismiss { session, confirm } => self.dismiss(session, confirm),
            EngineEvent::Shutdown => self.shutdown(),
            EngineEvent::TimerFired { session, token } => self.timer_fired(session, token),
            EngineEvent::SearchFinished {
                session,
                generation,
                query,
                results,
            } => self.search_finished(session, generation, query, results),
        }
    }

    fn open(&mut self, key: SessionKey, roots: Vec<PathBuf>, filters: FilterConfig) {
        let roots = path_utils::resolve_roots(&roots);
        info!(session = %key, ?roots, globs = %filters.globs, "Opening search session");

        if let Some(mut previous) = self.sessions.remove(key) {
            debug!(session = %key, "Replacing existing session");
            previous.stop();
            previous.preview.release(&mut self.surface, true);
            previous.initial_state.restore(&mut self.surface);
        }

        let initial_state = SurfaceSnapshot::capture(&self.surface);
        let session = SearchSession::new(key, roots, filters, &self.config, initial_state);
        self.sessions.insert(session);
    }

    fn query_edited(&mut self, key: SessionKey, query: String) {
        let session = match self.sessions.try_get_mut(key) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Ignoring query edit");
                return;
            }
        };

        let now = Instant::now();
        if !is_searchable(&query) {
            debug!(session = %key, query, "Query below minimum length, clearing results");
            session.debouncer.on_edit(&query, now);
            session.stop();
            apply_results(
                session,
                &mut self.surface,
                &self.updates,
                query,
                ResultSet::empty(),
            );
            return;
        }

        trace!(session = %key, query, "Query edited");
        if let Some(request) = session.debouncer.on_edit(&query, now) {
            self.arm_timer(key, request);
        }
    }

    fn arm_timer(&self, session: SessionKey, request: TimerRequest) {
        trace!(%session, token = request.token, "Arming debounce timer");
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(request.due).await;
            let _ = tx.send(EngineEvent::TimerFired {
                session,
                token: request.token,
            });
        });
    }

    fn timer_fired(&mut self, key: SessionKey, token: u64) {
        let Some(session) = self.sessions.get_mut(key) else {
            trace!(session = %key, "Timer for closed session");
            return;
        };

        match session.debouncer.on_timer(token, Instant::now()) {
            TimerOutcome::Ignored => {}
            TimerOutcome::Reschedule(request) => self.arm_timer(key, request),
            TimerOutcome::Fire(ticket) => self.start_search(key, ticket),
        }
    }

    fn start_search(&mut self, key: SessionKey, ticket: Ticket) {
        let Some(session) = self.sessions.get_mut(key) else {
            return;
        };

        let Some(plan) =
            QueryPlanner::new(&self.config).plan(&ticket.query, &session.filters, &session.roots)
        else {
            session.in_flight = None;
            apply_results(
                session,
                &mut self.surface,
                &self.updates,
                ticket.query,
                ResultSet::empty(),
            );
            return;
        };

        info!(
            session = %key,
            generation = ticket.generation,
            query = %ticket.query,
            mode = ?plan.mode,
            "Starting search"
        );

        let runner = Arc::clone(&self.runner);
        let tx = self.events_tx.clone();
        let generation = ticket.generation;
        let task = tokio::spawn(async move {
            let results = run_search(runner.as_ref(), &plan).await;
            let _ = tx.send(EngineEvent::SearchFinished {
                session: key,
                generation,
                query: plan.query,
                results,
            });
        });

        // replacing the previous search aborts it
        session.in_flight = Some(InFlightSearch::new(generation, task));
    }

    fn search_finished(
        &mut self,
        key: SessionKey,
        generation: u64,
        query: String,
        results: ResultSet,
    ) {
        let Some(session) = self.sessions.get_mut(key) else {
            trace!(session = %key, "Results for closed session");
            return;
        };

        if !session.debouncer.is_current(generation) {
            debug!(
                session = %key,
                generation,
                current = session.debouncer.generation(),
                "Discarding stale results"
            );
            return;
        }

        if session
            .in_flight
            .as_ref()
            .is_some_and(|f| f.generation == generation)
        {
            session.in_flight = None;
        }

        info!(session = %key, generation, count = results.len(), "Search finished");
        apply_results(session, &mut self.surface, &self.updates, query, results);
        self.claim_preview(key);
    }

    fn navigate(&mut self, key: SessionKey, delta: i64) {
        let session = match self.sessions.try_get_mut(key) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Ignoring navigation");
                return;
            }
        };

        let index = session.navigator.move_by(delta);
        show_highlighted(session, &mut self.surface);
        self.claim_preview(key);
        let _ = self.updates.send(EngineUpdate::Highlighted {
            session: key,
            index,
        });
    }

    fn highlight(&mut self, key: SessionKey, index: usize) {
        let session = match self.sessions.try_get_mut(key) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Ignoring highlight");
                return;
            }
        };

        if !session.navigator.set_highlighted(index) {
            trace!(session = %key, index, "Highlight out of range");
            return;
        }

        show_highlighted(session, &mut self.surface);
        self.claim_preview(key);
        let _ = self.updates.send(EngineUpdate::Highlighted {
            session: key,
            index: Some(index),
        });
    }

    /// A surface previews for one session at a time: the last session to
    /// show a result in it owns it.
    fn claim_preview(&mut self, key: SessionKey) {
        for other in self.sessions.claim_surface(key) {
            debug!(session = %key, from = %other, "Preview surface taken over");
        }
    }

    fn surface_loaded(&mut self, handle: S::Handle) {
        let Some(session) = self.sessions.find_by_surface(handle) else {
            trace!(?handle, "Loaded surface is not a preview");
            return;
        };

        if session.preview.surface_loaded(&mut self.surface, handle) == PreviewState::Applied {
            debug!(session = %session.key, ?handle, "Deferred preview applied");
        }
    }

    fn dismiss(&mut self, key: SessionKey, confirm: bool) {
        let Some(mut session) = self.sessions.remove(key) else {
            warn!(session = %key, "Dismiss for unknown session");
            return;
        };

        session.stop();

        let confirmed = confirm
            .then(|| session.navigator.current().cloned())
            .flatten();

        match confirmed {
            Some(result) => {
                info!(session = %key, location = %result.location(), "Result confirmed");
                let handle = session.preview.confirm(&mut self.surface, &result);
                let _ = self.updates.send(EngineUpdate::Confirmed {
                    session: key,
                    result,
                    handle,
                });
            }
            None => {
                info!(session = %key, "Search dismissed");
                session.preview.release(&mut self.surface, true);
                session.initial_state.restore(&mut self.surface);
                let _ = self.updates.send(EngineUpdate::Dismissed { session: key });
            }
        }
    }

    fn shutdown(&mut self) {
        info!(sessions = self.sessions.len(), "Shutting down engine");
        let keys: Vec<SessionKey> = self.sessions.keys().collect();
        for key in keys {
            self.dismiss(key, false);
        }
        self.shut_down = true;
    }
}

fn show_highlighted<S: EditorSurface>(session: &mut SearchSession<S::Handle>, surface: &mut S) {
    match session.navigator.highlighted() {
        Some(index) => {
            let state = session
                .preview
                .show(surface, session.navigator.results(), index);
            trace!(session = %session.key, index, ?state, "Preview");
        }
        None => session.preview.release(surface, true),
    }
}

fn apply_results<S: EditorSurface>(
    session: &mut SearchSession<S::Handle>,
    surface: &mut S,
    updates: &UnboundedSender<EngineUpdate<S::Handle>>,
    query: String,
    results: ResultSet,
) {
    session.navigator.set_results(results);
    session.applied_query = Some(query.clone());
    show_highlighted(session, surface);

    let _ = updates.send(EngineUpdate::Results {
        session: session.key,
        query,
        results: session.navigator.results().clone(),
        highlighted: session.navigator.highlighted(),
    });
}
