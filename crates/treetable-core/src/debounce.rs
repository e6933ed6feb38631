#![forbid(unsafe_code)]

//! Debouncing for search-as-you-type input.
//!
//! Bursts of keystrokes coalesce into a single filter pass: the latest term
//! wins, and it is released once no new term has arrived for the quiet
//! period. This is purely a performance measure; search passes are
//! idempotent, so running one early or twice is still correct.
//!
//! The caller supplies timestamps, which keeps the debouncer deterministic
//! under test.
//!
//! ```
//! use std::time::Duration;
//! use treetable_core::debounce::SearchDebouncer;
//! use web_time::Instant;
//!
//! let mut debouncer = SearchDebouncer::new(Duration::from_millis(200));
//! let t0 = Instant::now();
//! debouncer.push("f", t0);
//! debouncer.push("fo", t0 + Duration::from_millis(50));
//! debouncer.push("foo", t0 + Duration::from_millis(100));
//!
//! assert_eq!(debouncer.poll(t0 + Duration::from_millis(250)), None);
//! assert_eq!(debouncer.poll(t0 + Duration::from_millis(300)).as_deref(), Some("foo"));
//! assert!(!debouncer.is_pending());
//! ```

use std::time::Duration;

use web_time::Instant;

/// Coalesces search input, latest term wins.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    quiet: Duration,
    pending: Option<(String, Instant)>,
}

impl SearchDebouncer {
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    #[must_use]
    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Record a new term typed at `now`, replacing any pending one.
    pub fn push(&mut self, term: impl Into<String>, now: Instant) {
        self.pending = Some((term.into(), now));
    }

    /// Whether a term is waiting.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending term becomes due, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.quiet)
    }

    /// Release the pending term if its quiet period has elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let due = self.deadline().is_some_and(|deadline| now >= deadline);
        if due {
            self.pending.take().map(|(term, _)| term)
        } else {
            None
        }
    }

    /// Release the pending term immediately.
    pub fn flush(&mut self) -> Option<String> {
        self.pending.take().map(|(term, _)| term)
    }

    /// Drop the pending term.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
