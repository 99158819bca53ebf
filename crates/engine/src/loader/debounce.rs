//! Trailing-edge debounce state.
//!
//! Every push moves the deadline to `now + window`. Pushes that carry
//! arguments replace the pending set; argument-less pushes keep whatever is
//! pending. When the deadline passes, [`Debouncer::take_due`] drains the
//! pending arguments exactly once.

use std::time::Duration;

use tokio::time::Instant;

/// Default coalescing window for option load triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct Debouncer<A> {
    window: Duration,
    pending_args: Option<A>,
    deadline: Option<Instant>,
}

impl<A> Debouncer<A> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending_args: None,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a trigger at `now`.
    pub fn push(&mut self, args: Option<A>, now: Instant) {
        if let Some(args) = args {
            self.pending_args = Some(args);
        }
        self.deadline = Some(now + self.window);
    }

    /// Deadline of the pending fire, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Drain the pending fire when its deadline has passed.
    ///
    /// Returns `None` when nothing is due, `Some(None)` when the fire carries
    /// no arguments, and `Some(Some(args))` otherwise.
    pub fn take_due(&mut self, now: Instant) -> Option<Option<A>> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(self.pending_args.take())
            }
            _ => None,
        }
    }
}

impl<A> Default for Debouncer<A> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushes_inside_the_window_extend_the_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.push(Some("a"), start);
        debouncer.push(None, start + Duration::from_millis(60));

        assert_eq!(debouncer.take_due(start + Duration::from_millis(120)), None);
        assert_eq!(debouncer.take_due(start + Duration::from_millis(160)), Some(Some("a")));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn last_supplied_arguments_win() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.push(Some(1), start);
        debouncer.push(Some(2), start + Duration::from_millis(10));
        debouncer.push(None, start + Duration::from_millis(20));

        assert_eq!(debouncer.take_due(start + Duration::from_millis(200)), Some(Some(2)));
    }

    #[test]
    fn arguments_do_not_survive_a_fire() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.push(Some("search"), start);
        assert_eq!(debouncer.take_due(start + Duration::from_millis(100)), Some(Some("search")));

        debouncer.push(None, start + Duration::from_millis(300));
        assert_eq!(debouncer.take_due(start + Duration::from_millis(400)), Some(None));
    }

    #[test]
    fn nothing_is_due_without_a_push() {
        let mut debouncer: Debouncer<u8> = Debouncer::default();
        assert_eq!(debouncer.take_due(Instant::now()), None);
    }
}
