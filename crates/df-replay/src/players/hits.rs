//! Hit-Counter Elimination Player — stage 3
//!
//! A shared pointer lands on the target of each recorded spin, in strict
//! recorded order, incrementing that finalist's hit counter. Reaching
//! the hit threshold eliminates the finalist; the rank it takes is read
//! verbatim from the recorded elimination list — this player never
//! computes a rank. The pointer's angle is cosmetic: a slot position
//! plus jitter, derived from a display-only RNG.

use log::warn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use df_draw::{Elimination, Entry, SpinEvent, TicketId, HIT_THRESHOLD};

use crate::feedback::{CueKind, FeedbackBus};
use crate::players::{PlayerStatus, StagePlayer};
use crate::sched::Scheduler;
use crate::timing::ReplayTiming;

/// Scheduled steps of the hits player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Pointer lands on the target of the spin at this index
    Land(usize),
    /// Settle after the last spin
    Settle,
}

/// Ephemeral per-finalist presentation state
#[derive(Debug, Clone)]
pub struct FinalistState {
    pub entry: Entry,
    pub hits: u32,
    /// Recorded rank, set when the hit threshold is reached
    pub eliminated_rank: Option<u8>,
}

impl FinalistState {
    pub fn is_eliminated(&self) -> bool {
        self.eliminated_rank.is_some()
    }
}

/// Stage-3 player: five finalists reduced to three survivors
pub struct HitsPlayer {
    finalists: Vec<FinalistState>,
    spins: Vec<SpinEvent>,
    eliminations: Vec<Elimination>,
    timing: ReplayTiming,
    sched: Scheduler<Step>,
    rng: ChaCha8Rng,

    next_spin: usize,
    /// Cosmetic pointer angle in turns [0, 1)
    pointer_angle: f64,
    status: PlayerStatus,
}

impl HitsPlayer {
    pub fn new(
        finalists: Vec<Entry>,
        spins: Vec<SpinEvent>,
        eliminations: Vec<Elimination>,
        timing: ReplayTiming,
        display_seed: u64,
    ) -> Self {
        let finalists = finalists
            .into_iter()
            .map(|entry| FinalistState {
                entry,
                hits: 0,
                eliminated_rank: None,
            })
            .collect();
        Self {
            finalists,
            spins,
            eliminations,
            timing,
            sched: Scheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(display_seed),
            next_spin: 0,
            pointer_angle: 0.0,
            status: PlayerStatus::Idle,
        }
    }

    pub fn finalists(&self) -> &[FinalistState] {
        &self.finalists
    }

    /// Cosmetic pointer angle in turns [0, 1)
    pub fn pointer_angle(&self) -> f64 {
        self.pointer_angle
    }

    /// Finalists not yet eliminated, in finalist order
    pub fn survivors(&self) -> Vec<TicketId> {
        self.finalists
            .iter()
            .filter(|f| !f.is_eliminated())
            .map(|f| f.entry.ticket)
            .collect()
    }

    /// Apply one recorded spin to the counters. `animate` controls the
    /// cosmetic pointer and cues, never the outcome.
    fn apply_spin(&mut self, index: usize, animate: bool, fx: &mut FeedbackBus) {
        let target = self.spins[index].target;
        let slot_count = self.finalists.len().max(1) as f64;

        let Some(slot) = self.finalists.iter().position(|f| f.entry.ticket == target) else {
            // Validated upstream; a stray target only skips presentation
            warn!("spin {index} targets unknown ticket {target}");
            return;
        };

        if animate {
            // Land inside the target's slot, jitter within it
            let jitter = self.rng.random_range(0.1..0.9);
            self.pointer_angle = (slot as f64 + jitter) / slot_count;
        }

        let finalist = &mut self.finalists[slot];
        finalist.hits += 1;

        if finalist.hits == HIT_THRESHOLD {
            finalist.eliminated_rank = self
                .eliminations
                .iter()
                .find(|e| e.ticket == target)
                .map(|e| e.rank);
            if finalist.eliminated_rank.is_none() {
                warn!("threshold reached for {target} but no recorded elimination");
            }
            if animate {
                fx.emit(CueKind::Eliminated);
            }
        } else if animate {
            fx.emit(match finalist.hits {
                1 => CueKind::Hit1,
                _ => CueKind::Hit2,
            });
        }
    }

    fn execute(&mut self, step: Step, fx: &mut FeedbackBus) {
        match step {
            Step::Land(index) => {
                self.apply_spin(index, true, fx);
                self.next_spin = index + 1;

                if self.next_spin == self.spins.len() {
                    self.sched.schedule(
                        Step::Settle,
                        self.timing.spin_settle_ms + self.timing.stage_settle_ms,
                    );
                } else {
                    self.sched.schedule(
                        Step::Land(self.next_spin),
                        self.timing.spin_settle_ms + self.timing.spin_travel_ms,
                    );
                }
            }
            Step::Settle => self.status = PlayerStatus::Complete,
        }
    }
}

impl StagePlayer for HitsPlayer {
    fn start(&mut self, _fx: &mut FeedbackBus) {
        if self.status != PlayerStatus::Idle {
            return;
        }
        if self.spins.is_empty() {
            self.status = PlayerStatus::Complete;
            return;
        }
        self.status = PlayerStatus::Running;
        self.sched
            .schedule(Step::Land(0), self.timing.spin_travel_ms);
    }

    fn advance(&mut self, dt_ms: f64, fx: &mut FeedbackBus) -> PlayerStatus {
        for step in self.sched.advance(dt_ms) {
            self.execute(step, fx);
        }
        self.status
    }

    fn fast_forward(&mut self, fx: &mut FeedbackBus) {
        if self.sched.is_torn_down() || self.status == PlayerStatus::Complete {
            return;
        }
        self.sched.cancel_all();

        // Replay the remaining recorded spins with zero delay, no cues
        while self.next_spin < self.spins.len() {
            self.apply_spin(self.next_spin, false, fx);
            self.next_spin += 1;
        }
        self.status = PlayerStatus::Complete;
    }

    fn teardown(&mut self) {
        self.sched.tear_down();
    }

    fn status(&self) -> PlayerStatus {
        self.status
    }
}
