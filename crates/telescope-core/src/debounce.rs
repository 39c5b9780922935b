//! Per-session search coalescing.
//!
//! The debouncer is a pure state machine over `Instant`s: it decides when a
//! timer should be armed and whether an expired timer fires a search, but it
//! never sleeps itself. The engine turns [`TimerRequest`]s into tokio sleeps
//! and feeds expirations back through [`Debouncer::on_timer`].

use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Ask the host loop to call `on_timer(token, ..)` at `due`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub token: u64,
    pub due: Instant,
}

/// A search that should start now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// Monotonic per session. Results tagged with an older generation are stale.
    pub generation: u64,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The timer was cancelled or superseded
    Ignored,
    /// The spacing floor since the last search has not elapsed yet
    Reschedule(TimerRequest),
    Fire(Ticket),
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    latest_query: String,
    pending: Option<TimerRequest>,
    last_started: Option<Instant>,
    next_token: u64,
    generation: u64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            latest_query: String::new(),
            pending: None,
            last_started: None,
            next_token: 0,
            generation: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn latest_query(&self) -> &str {
        &self.latest_query
    }

    pub fn pending(&self) -> Option<TimerRequest> {
        self.pending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Record an edit. Returns a timer to arm when nothing is scheduled yet;
    /// an already pending timer will pick up this query when it fires.
    pub fn on_edit(&mut self, query: &str, now: Instant) -> Option<TimerRequest> {
        self.latest_query.clear();
        self.latest_query.push_str(query);

        if self.pending.is_some() {
            trace!(query, "Edit coalesced into pending search");
            return None;
        }

        Some(self.arm(now + self.window))
    }

    pub fn on_timer(&mut self, token: u64, now: Instant) -> TimerOutcome {
        match self.pending {
            Some(pending) if pending.token == token => {}
            _ => return TimerOutcome::Ignored,
        }

        if let Some(started) = self.last_started {
            let floor = started + self.window;
            if now < floor {
                trace!(?floor, "Search spacing floor not reached, rescheduling");
                return TimerOutcome::Reschedule(self.arm(floor));
            }
        }

        self.pending = None;
        self.last_started = Some(now);
        self.generation += 1;

        TimerOutcome::Fire(Ticket {
            generation: self.generation,
            query: self.latest_query.clone(),
        })
    }

    /// Invalidate every in-flight search without starting a new one
    pub fn supersede(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Drop the pending timer, if any
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    fn arm(&mut self, due: Instant) -> TimerRequest {
        self.next_token += 1;
        let request = TimerRequest {
            token: self.next_token,
            due,
        };
        self.pending = Some(request);
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    fn ms(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn test_first_edit_arms_timer() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        let request = debouncer.on_edit("foo", t0).unwrap();
        assert_eq!(request.due, ms(t0, 500));
        assert_eq!(debouncer.pending(), Some(request));
    }

    #[test]
    fn test_burst_converges_to_last_query() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        let mut requests = Vec::new();

        for i in 0..50u64 {
            let query = format!("query{i}");
            requests.extend(debouncer.on_edit(&query, ms(t0, i * 10)));
        }

        assert_eq!(requests.len(), 1, "only the first edit arms a timer");
        let request = requests[0];
        assert!(request.due < ms(t0, 1000));

        match debouncer.on_timer(request.token, request.due) {
            TimerOutcome::Fire(ticket) => {
                assert_eq!(ticket.query, "query49");
                assert_eq!(ticket.generation, 1);
            }
            other => panic!("expected fire, got {other:?}"),
        }
        assert!(debouncer.pending().is_none());
    }

    #[test]
    fn test_spacing_floor_reschedules() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        let first = debouncer.on_edit("abc", t0).unwrap();
        assert!(matches!(
            debouncer.on_timer(first.token, ms(t0, 500)),
            TimerOutcome::Fire(_)
        ));

        // Timer expires 200ms after the previous search started
        let second = debouncer.on_edit("abcd", ms(t0, 500)).unwrap();
        let outcome = debouncer.on_timer(second.token, ms(t0, 700));
        let TimerOutcome::Reschedule(retry) = outcome else {
            panic!("expected reschedule, got {outcome:?}");
        };
        assert_eq!(retry.due, ms(t0, 1000));

        // The superseded token is dead
        assert_eq!(
            debouncer.on_timer(second.token, ms(t0, 1000)),
            TimerOutcome::Ignored
        );

        debouncer.on_edit("abcde", ms(t0, 800));
        match debouncer.on_timer(retry.token, ms(t0, 1000)) {
            TimerOutcome::Fire(ticket) => {
                assert_eq!(ticket.query, "abcde");
                assert_eq!(ticket.generation, 2);
            }
            other => panic!("expected fire, got {other:?}"),
        }
    }

    #[test]
    fn test_cancel_ignores_expired_timer() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        let request = debouncer.on_edit("abc", t0).unwrap();
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        assert_eq!(
            debouncer.on_timer(request.token, request.due),
            TimerOutcome::Ignored
        );
    }

    #[test]
    fn test_supersede_invalidates_generation() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        let request = debouncer.on_edit("abc", t0).unwrap();
        let TimerOutcome::Fire(ticket) = debouncer.on_timer(request.token, request.due) else {
            panic!("expected fire");
        };
        assert!(debouncer.is_current(ticket.generation));
        debouncer.supersede();
        assert!(!debouncer.is_current(ticket.generation));
    }
}
