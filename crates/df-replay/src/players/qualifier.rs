//! Qualifier Lottery Player — stage 1
//!
//! A continuous "noise" tick cycles randomized display-only ticket
//! numbers while, at a slower cadence, the next qualifier from the
//! recorded stage-1 list is revealed and appended to the found list.
//! The noise is pure dressing: the reveal order is exactly the recorded
//! order, and an empty stage-1 list completes without ever starting the
//! noise loop.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use df_draw::Entry;

use crate::feedback::{CueKind, FeedbackBus};
use crate::players::{PlayerStatus, StagePlayer};
use crate::sched::{Scheduler, TimerId, INVALID_TIMER};
use crate::timing::ReplayTiming;

/// Scheduled steps of the qualifier player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Cycle the cosmetic noise value
    NoiseTick,
    /// Reveal the next recorded qualifier
    Reveal,
    /// Post-reveal settle before completion
    Settle,
}

/// Stage-1 player: large pool narrowed to the recorded qualifier list
pub struct QualifierPlayer {
    entries: Vec<Entry>,
    timing: ReplayTiming,
    sched: Scheduler<Step>,
    /// Cosmetic RNG — display values only, never outcome-affecting
    rng: ChaCha8Rng,

    /// Qualifiers revealed so far, in recorded order
    found: Vec<Entry>,
    next_index: usize,
    /// Current noise display value (a fake ticket number)
    noise_value: Option<u64>,
    noise_timer: TimerId,
    status: PlayerStatus,
}

impl QualifierPlayer {
    pub fn new(entries: Vec<Entry>, timing: ReplayTiming, display_seed: u64) -> Self {
        Self {
            entries,
            timing,
            sched: Scheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(display_seed),
            found: Vec::new(),
            next_index: 0,
            noise_value: None,
            noise_timer: INVALID_TIMER,
            status: PlayerStatus::Idle,
        }
    }

    /// Qualifiers revealed so far
    pub fn found(&self) -> &[Entry] {
        &self.found
    }

    /// Current cosmetic noise value, if the noise loop is running
    pub fn noise_value(&self) -> Option<u64> {
        self.noise_value
    }

    fn execute(&mut self, step: Step, fx: &mut FeedbackBus) {
        match step {
            Step::NoiseTick => {
                self.noise_value = Some(self.rng.random_range(100_000..1_000_000));
                fx.emit(CueKind::Tick);
                self.noise_timer = self.sched.schedule(Step::NoiseTick, self.timing.noise_tick_ms);
            }
            Step::Reveal => {
                // Pause the noise for the reveal moment, resume after
                self.sched.cancel(self.noise_timer);

                let entry = self.entries[self.next_index].clone();
                self.next_index += 1;
                self.found.push(entry);
                fx.emit(CueKind::RevealPass);

                if self.next_index == self.entries.len() {
                    self.noise_value = None;
                    fx.emit(CueKind::Win);
                    self.sched.schedule(Step::Settle, self.timing.stage_settle_ms);
                } else {
                    self.noise_timer =
                        self.sched.schedule(Step::NoiseTick, self.timing.noise_tick_ms);
                    self.sched
                        .schedule(Step::Reveal, self.timing.qualifier_reveal_ms);
                }
            }
            Step::Settle => {
                self.status = PlayerStatus::Complete;
            }
        }
    }
}

impl StagePlayer for QualifierPlayer {
    fn start(&mut self, _fx: &mut FeedbackBus) {
        if self.status != PlayerStatus::Idle {
            return;
        }
        if self.entries.is_empty() {
            // Never start the noise loop against an empty list
            self.status = PlayerStatus::Complete;
            return;
        }
        self.status = PlayerStatus::Running;
        self.noise_timer = self.sched.schedule(Step::NoiseTick, self.timing.noise_tick_ms);
        self.sched
            .schedule(Step::Reveal, self.timing.qualifier_reveal_ms);
    }

    fn advance(&mut self, dt_ms: f64, fx: &mut FeedbackBus) -> PlayerStatus {
        for step in self.sched.advance(dt_ms) {
            self.execute(step, fx);
        }
        self.status
    }

    fn fast_forward(&mut self, _fx: &mut FeedbackBus) {
        if self.sched.is_torn_down() || self.status == PlayerStatus::Complete {
            return;
        }
        self.sched.cancel_all();

        // Replay the remaining recorded list with zero delay, no cues
        while self.next_index < self.entries.len() {
            let entry = self.entries[self.next_index].clone();
            self.next_index += 1;
            self.found.push(entry);
        }
        self.noise_value = None;
        self.status = PlayerStatus::Complete;
    }

    fn teardown(&mut self) {
        self.sched.tear_down();
    }

    fn status(&self) -> PlayerStatus {
        self.status
    }
}
