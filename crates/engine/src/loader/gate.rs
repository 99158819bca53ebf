//! Generation-tagged readiness gate.
//!
//! The gate tracks one live generation at a time. [`ReadinessGate::advance`]
//! resolves the live generation if it is still pending and installs the next
//! one, so every generation older than the live one is resolved. A waiter
//! captures the generation it cares about in a [`GateTicket`] and is released
//! once that generation resolves, whether by its own load settling or by a
//! newer trigger superseding it.

use std::future::Future;

use tokio::sync::watch;
use tracing::trace;

/// Snapshot of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateStatus {
    /// Live generation.
    pub generation: u64,
    /// Whether the live generation has resolved.
    pub resolved: bool,
    /// Number of resolutions performed so far, across all generations.
    pub settled: u64,
}

impl GateStatus {
    /// Whether `generation` has resolved.
    pub fn covers(&self, generation: u64) -> bool {
        generation < self.generation || (generation == self.generation && self.resolved)
    }
}

/// Handle naming one gate generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GateTicket {
    generation: u64,
}

impl GateTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
pub struct ReadinessGate {
    status: watch::Sender<GateStatus>,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessGate {
    /// Create a gate whose first generation (0) is pending.
    pub fn new() -> Self {
        let (status, _) = watch::channel(GateStatus {
            generation: 0,
            resolved: false,
            settled: 0,
        });
        Self { status }
    }

    pub fn status(&self) -> GateStatus {
        *self.status.borrow()
    }

    /// Ticket for the live generation.
    pub fn current(&self) -> GateTicket {
        GateTicket {
            generation: self.status().generation,
        }
    }

    /// Whether the live generation has resolved.
    pub fn is_open(&self) -> bool {
        self.status().resolved
    }

    pub fn is_resolved(&self, ticket: GateTicket) -> bool {
        self.status().covers(ticket.generation)
    }

    /// Resolve the live generation if pending, then install a new pending one.
    pub fn advance(&self) -> GateTicket {
        let mut next = 0;
        self.status.send_modify(|status| {
            if !status.resolved {
                status.settled += 1;
                trace!(generation = status.generation, "readiness gate superseded");
            }
            status.generation += 1;
            status.resolved = false;
            next = status.generation;
        });
        GateTicket { generation: next }
    }

    /// Resolve the generation named by `ticket`.
    ///
    /// Returns `false` when that generation was already resolved, either
    /// directly or because a newer generation superseded it.
    pub fn resolve(&self, ticket: GateTicket) -> bool {
        self.status.send_if_modified(|status| {
            if status.generation != ticket.generation || status.resolved {
                return false;
            }
            status.resolved = true;
            status.settled += 1;
            true
        })
    }

    /// Resolve whatever generation is live.
    pub fn resolve_current(&self) -> bool {
        self.resolve(self.current())
    }

    /// Future completing once the generation named by `ticket` has resolved.
    ///
    /// The returned future does not borrow the gate.
    pub fn wait(&self, ticket: GateTicket) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.status.subscribe();
        async move {
            // The sender outlives every receiver it hands out unless the
            // loader is dropped, in which case nothing is left to wait for.
            let _ = receiver.wait_for(|status| status.covers(ticket.generation)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_pending() {
        let gate = ReadinessGate::new();
        assert!(!gate.is_open());
        assert_eq!(gate.current().generation(), 0);
    }

    #[test]
    fn resolves_each_generation_once() {
        let gate = ReadinessGate::new();
        let first = gate.current();
        assert!(gate.resolve(first));
        assert!(!gate.resolve(first));
        assert_eq!(gate.status().settled, 1);
    }

    #[test]
    fn advance_resolves_the_pending_generation() {
        let gate = ReadinessGate::new();
        let first = gate.current();
        let second = gate.advance();

        assert!(gate.is_resolved(first));
        assert!(!gate.is_resolved(second));
        assert!(!gate.resolve(first), "superseded generation cannot resolve again");
        assert!(gate.resolve(second));
        assert_eq!(gate.status().settled, 2);
    }

    #[test]
    fn advance_after_resolution_does_not_double_count() {
        let gate = ReadinessGate::new();
        gate.resolve_current();
        let next = gate.advance();
        assert_eq!(gate.status().settled, 1);
        assert!(gate.resolve(next));
        assert_eq!(gate.status().settled, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn waiter_is_released_by_a_newer_trigger() {
        let gate = ReadinessGate::new();
        let ticket = gate.current();
        let waiter = tokio::spawn(gate.wait(ticket));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        gate.advance();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter released")
            .expect("waiter task");
    }

    #[tokio::test(start_paused = true)]
    async fn waiter_for_live_generation_waits_for_resolution() {
        let gate = ReadinessGate::new();
        let ticket = gate.advance();
        let waiter = tokio::spawn(gate.wait(ticket));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        gate.resolve(ticket);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter released")
            .expect("waiter task");
    }
}
