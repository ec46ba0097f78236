//! Scheduler — cancellable delayed callbacks with a teardown guard
//!
//! The engine's single concurrency primitive. "Concurrency" here means
//! interleaved, cancellable, delayed steps on one cooperative event loop:
//! a stage player schedules typed step payloads with a delay, the driver
//! advances the virtual clock, and due payloads come back in due-time
//! order for the owner to execute.
//!
//! Two guarantees carry the whole subsystem:
//!
//! - `tear_down()` is one-way and idempotent; after it, no payload is
//!   ever released again, no matter how many timers were pending.
//! - Payloads are released strictly in (due time, schedule order) — never
//!   reordered, even when a fast-forward drains them with zero delay.

use log::debug;

/// Handle for one scheduled timer
pub type TimerId = u64;

/// Timer id returned when scheduling is refused (after teardown)
pub const INVALID_TIMER: TimerId = 0;

/// One scheduled step awaiting release
#[derive(Debug)]
struct PendingTimer<T> {
    id: TimerId,
    /// Absolute due time on the scheduler's virtual clock (ms)
    due_at_ms: f64,
    /// Tie-break: schedule order among equal due times
    seq: u64,
    payload: T,
}

/// Virtual-clock timer set with a one-way teardown flag
#[derive(Debug)]
pub struct Scheduler<T> {
    pending: Vec<PendingTimer<T>>,
    now_ms: f64,
    next_id: TimerId,
    next_seq: u64,
    torn_down: bool,
    /// Payloads released so far (instrumentation for teardown tests)
    released: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            now_ms: 0.0,
            next_id: 1,
            next_seq: 0,
            torn_down: false,
            released: 0,
        }
    }

    /// Current virtual time (ms)
    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Whether teardown has been requested
    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Number of timers still pending
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Total payloads released over the scheduler's lifetime
    #[inline]
    pub fn released_count(&self) -> u64 {
        self.released
    }

    /// Schedule a payload `delay_ms` from now. Refused (and dropped) once
    /// torn down.
    pub fn schedule(&mut self, payload: T, delay_ms: f64) -> TimerId {
        if self.torn_down {
            debug!("schedule refused: scheduler is torn down");
            return INVALID_TIMER;
        }

        let id = self.next_id;
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;

        self.pending.push(PendingTimer {
            id,
            due_at_ms: self.now_ms + delay_ms.max(0.0),
            seq,
            payload,
        });
        id
    }

    /// Cancel one timer. Returns false if it was not pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Cancel every pending timer. Safe to call repeatedly.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// One-way teardown: cancels everything and refuses all future work.
    /// Safe to call repeatedly.
    pub fn tear_down(&mut self) {
        if !self.torn_down {
            debug!("scheduler teardown, {} timers dropped", self.pending.len());
        }
        self.torn_down = true;
        self.pending.clear();
    }

    /// Advance the virtual clock by `dt_ms` and release due payloads in
    /// (due time, schedule order). Releases nothing after teardown.
    pub fn advance(&mut self, dt_ms: f64) -> Vec<T> {
        if self.torn_down {
            return Vec::new();
        }
        self.now_ms += dt_ms.max(0.0);

        let now = self.now_ms;
        let mut due: Vec<PendingTimer<T>> = Vec::new();
        let mut remaining: Vec<PendingTimer<T>> = Vec::new();
        for timer in self.pending.drain(..) {
            if timer.due_at_ms <= now {
                due.push(timer);
            } else {
                remaining.push(timer);
            }
        }
        self.pending = remaining;

        due.sort_by(|a, b| {
            a.due_at_ms
                .partial_cmp(&b.due_at_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.seq.cmp(&b.seq))
        });

        self.released += due.len() as u64;
        due.into_iter().map(|t| t.payload).collect()
    }

    /// Release every pending payload immediately, in order, without
    /// advancing the clock — the zero-delay fast path. Releases nothing
    /// after teardown.
    pub fn drain_pending(&mut self) -> Vec<T> {
        if self.torn_down {
            return Vec::new();
        }

        let mut due: Vec<PendingTimer<T>> = self.pending.drain(..).collect();
        due.sort_by(|a, b| {
            a.due_at_ms
                .partial_cmp(&b.due_at_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.seq.cmp(&b.seq))
        });

        self.released += due.len() as u64;
        due.into_iter().map(|t| t.payload).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_in_due_order() {
        let mut sched: Scheduler<u32> = Scheduler::new();

        sched.schedule(3, 300.0);
        sched.schedule(1, 100.0);
        sched.schedule(2, 200.0);

        let due = sched.advance(250.0);
        assert_eq!(due, vec![1, 2]);
        assert_eq!(sched.pending_count(), 1);

        let due = sched.advance(100.0);
        assert_eq!(due, vec![3]);
    }

    #[test]
    fn test_fifo_among_equal_due_times() {
        let mut sched: Scheduler<u32> = Scheduler::new();

        sched.schedule(1, 100.0);
        sched.schedule(2, 100.0);
        sched.schedule(3, 100.0);

        assert_eq!(sched.advance(100.0), vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel_single() {
        let mut sched: Scheduler<u32> = Scheduler::new();

        let id = sched.schedule(1, 100.0);
        sched.schedule(2, 100.0);

        assert!(sched.cancel(id));
        assert!(!sched.cancel(id));
        assert_eq!(sched.advance(100.0), vec![2]);
    }

    #[test]
    fn test_nothing_after_teardown() {
        let mut sched: Scheduler<u32> = Scheduler::new();

        sched.schedule(1, 10.0);
        sched.schedule(2, 20.0);
        sched.tear_down();

        assert!(sched.advance(1000.0).is_empty());
        assert!(sched.drain_pending().is_empty());
        assert_eq!(sched.released_count(), 0);

        // Scheduling after teardown is refused
        assert_eq!(sched.schedule(3, 0.0), INVALID_TIMER);
        assert!(sched.advance(1000.0).is_empty());
    }

    #[test]
    fn test_teardown_idempotent() {
        let mut sched: Scheduler<u32> = Scheduler::new();
        sched.schedule(1, 10.0);

        sched.tear_down();
        sched.tear_down();
        sched.cancel_all();

        assert!(sched.is_torn_down());
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn test_drain_preserves_order() {
        let mut sched: Scheduler<u32> = Scheduler::new();

        sched.schedule(2, 500.0);
        sched.schedule(1, 100.0);
        sched.schedule(3, 900.0);

        assert_eq!(sched.drain_pending(), vec![1, 2, 3]);
        assert_eq!(sched.pending_count(), 0);
        assert_eq!(sched.released_count(), 3);
    }

    #[test]
    fn test_zero_delay_due_next_advance() {
        let mut sched: Scheduler<u32> = Scheduler::new();

        sched.schedule(1, 0.0);
        assert_eq!(sched.advance(0.0), vec![1]);
    }
}
