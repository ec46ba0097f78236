//! Elimination-Reveal Player — stage 2
//!
//! Every stage-1 qualifier gets one reveal unit. Revealing a unit is an
//! idempotent one-way action; its pass/fail status is computed purely
//! from stage-2 set membership. Units can be revealed interactively by
//! the host in any order, or through the staggered "reveal remaining"
//! fast path, which compresses delay but preserves unit order and cue
//! pacing.

use std::collections::HashSet;

use df_draw::{Entry, TicketId};

use crate::feedback::{CueKind, FeedbackBus};
use crate::players::{PlayerStatus, StagePlayer};
use crate::sched::Scheduler;
use crate::timing::ReplayTiming;

/// Scheduled steps of the reveal player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Reveal the unit at this index (no-op if already revealed)
    Reveal(usize),
    /// Post-reveal settle before completion
    Settle,
}

/// One reveal unit: a qualifier whose finalist status is hidden until
/// revealed
#[derive(Debug, Clone)]
pub struct RevealUnit {
    pub entry: Entry,
    pub revealed: bool,
    /// Set at reveal time: true = finalist (present in stage 2)
    pub pass: bool,
}

/// Stage-2 player: qualifiers narrowed to the finalist subset
pub struct RevealPlayer {
    units: Vec<RevealUnit>,
    finalists: HashSet<TicketId>,
    timing: ReplayTiming,
    sched: Scheduler<Step>,
    settle_scheduled: bool,
    status: PlayerStatus,
}

impl RevealPlayer {
    pub fn new(qualifiers: Vec<Entry>, finalists: Vec<TicketId>, timing: ReplayTiming) -> Self {
        let units = qualifiers
            .into_iter()
            .map(|entry| RevealUnit {
                entry,
                revealed: false,
                pass: false,
            })
            .collect();
        Self {
            units,
            finalists: finalists.into_iter().collect(),
            timing,
            sched: Scheduler::new(),
            settle_scheduled: false,
            status: PlayerStatus::Idle,
        }
    }

    pub fn units(&self) -> &[RevealUnit] {
        &self.units
    }

    pub fn revealed_count(&self) -> usize {
        self.units.iter().filter(|u| u.revealed).count()
    }

    /// Reveal one unit. One-way and idempotent: returns false if the
    /// index is out of range or the unit was already revealed.
    pub fn reveal(&mut self, index: usize, fx: &mut FeedbackBus) -> bool {
        if self.sched.is_torn_down() || self.status == PlayerStatus::Complete {
            return false;
        }
        let Some(unit) = self.units.get_mut(index) else {
            return false;
        };
        if unit.revealed {
            return false;
        }

        unit.revealed = true;
        unit.pass = self.finalists.contains(&unit.entry.ticket);
        fx.emit(if unit.pass {
            CueKind::RevealPass
        } else {
            CueKind::RevealFail
        });

        self.schedule_settle_if_done();
        true
    }

    /// Fast path: schedule every not-yet-revealed unit with a fixed
    /// stagger, in unit order. Already-revealed units keep their status.
    pub fn reveal_remaining(&mut self) {
        if self.status != PlayerStatus::Running {
            return;
        }
        let mut slot = 0u32;
        for (index, unit) in self.units.iter().enumerate() {
            if !unit.revealed {
                self.sched.schedule(
                    Step::Reveal(index),
                    self.timing.reveal_stagger_ms * slot as f64,
                );
                slot += 1;
            }
        }
    }

    fn schedule_settle_if_done(&mut self) {
        if !self.settle_scheduled && self.units.iter().all(|u| u.revealed) {
            self.settle_scheduled = true;
            self.sched.schedule(Step::Settle, self.timing.stage_settle_ms);
        }
    }
}

impl StagePlayer for RevealPlayer {
    fn start(&mut self, _fx: &mut FeedbackBus) {
        if self.status != PlayerStatus::Idle {
            return;
        }
        if self.units.is_empty() {
            self.status = PlayerStatus::Complete;
            return;
        }
        self.status = PlayerStatus::Running;
    }

    fn advance(&mut self, dt_ms: f64, fx: &mut FeedbackBus) -> PlayerStatus {
        for step in self.sched.advance(dt_ms) {
            match step {
                Step::Reveal(index) => {
                    self.reveal(index, fx);
                }
                Step::Settle => self.status = PlayerStatus::Complete,
            }
        }
        self.status
    }

    fn fast_forward(&mut self, _fx: &mut FeedbackBus) {
        if self.sched.is_torn_down() || self.status == PlayerStatus::Complete {
            return;
        }
        self.sched.cancel_all();

        for unit in &mut self.units {
            if !unit.revealed {
                unit.revealed = true;
                unit.pass = self.finalists.contains(&unit.entry.ticket);
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{AudioCue, RecordingSink, SinkCall};

    fn qualifiers(n: u64) -> Vec<Entry> {
        (1..=n).map(|i| Entry::new(i, format!("q{i}"))).collect()
    }

    fn finalists() -> Vec<TicketId> {
        vec![TicketId(1), TicketId(3)]
    }

    fn player() -> RevealPlayer {
        RevealPlayer::new(qualifiers(4), finalists(), ReplayTiming::instant())
    }

    #[test]
    fn test_status_from_membership() {
        let mut player = player();
        let mut fx = FeedbackBus::null();
        player.start(&mut fx);

        assert!(player.reveal(0, &mut fx));
        assert!(player.reveal(1, &mut fx));

        assert!(player.units()[0].pass, "ticket 1 is a finalist");
        assert!(!player.units()[1].pass, "ticket 2 is not");
    }

    #[test]
    fn test_reveal_is_one_way() {
        let mut player = player();
        let sink = RecordingSink::new();
        let template = sink.clone();
        let mut fx = FeedbackBus::new(move || Box::new(template.clone()));
        player.start(&mut fx);

        assert!(player.reveal(0, &mut fx));
        let calls_after_first = sink.call_count();

        // Second reveal of the same unit: no state change, no cue
        assert!(!player.reveal(0, &mut fx));
        assert_eq!(sink.call_count(), calls_after_first);
    }

    #[test]
    fn test_reveal_remaining_skips_revealed() {
        let mut player = player();
        let sink = RecordingSink::new();
        let template = sink.clone();
        let mut fx = FeedbackBus::new(move || Box::new(template.clone()));
        player.start(&mut fx);

        player.reveal(2, &mut fx);
        let pass_before = player.units()[2].pass;

        player.reveal_remaining();
        for _ in 0..8 {
            if player.advance(0.0, &mut fx) == PlayerStatus::Complete {
                break;
            }
        }

        assert_eq!(player.status(), PlayerStatus::Complete);
        assert_eq!(player.revealed_count(), 4);
        // Already-revealed unit kept its status
        assert_eq!(player.units()[2].pass, pass_before);
        // 4 reveal cues total (audio+haptic pairs), not 5
        let audio_calls = sink
            .calls()
            .iter()
            .filter(|c| matches!(c, SinkCall::Play(AudioCue::Pass | AudioCue::Fail)))
            .count();
        assert_eq!(audio_calls, 4);
    }

    #[test]
    fn test_stagger_preserves_unit_order() {
        let mut player = RevealPlayer::new(qualifiers(3), finalists(), ReplayTiming::normal());
        let mut fx = FeedbackBus::null();
        player.start(&mut fx);
        player.reveal_remaining();

        // First unit due immediately, others staggered
        player.advance(0.0, &mut fx);
        assert!(player.units()[0].revealed);
        assert!(!player.units()[1].revealed);

        player.advance(120.0, &mut fx);
        assert!(player.units()[1].revealed);
        assert!(!player.units()[2].revealed);
    }

    #[test]
    fn test_empty_qualifiers_complete_immediately() {
        let mut player = RevealPlayer::new(Vec::new(), Vec::new(), ReplayTiming::instant());
        let mut fx = FeedbackBus::null();

        player.start(&mut fx);
        assert_eq!(player.status(), PlayerStatus::Complete);
    }

    #[test]
    fn test_completion_after_settle_delay() {
        let mut player = RevealPlayer::new(qualifiers(1), finalists(), ReplayTiming::normal());
        let mut fx = FeedbackBus::null();
        player.start(&mut fx);

        player.reveal(0, &mut fx);
        assert_eq!(player.status(), PlayerStatus::Running);

        player.advance(800.0, &mut fx);
        assert_eq!(player.status(), PlayerStatus::Complete);
    }

    #[test]
    fn test_fast_forward_preserves_existing_status() {
        let mut player = player();
        let mut fx = FeedbackBus::null();
        player.start(&mut fx);

        player.reveal(0, &mut fx);
        player.fast_forward(&mut fx);

        assert_eq!(player.status(), PlayerStatus::Complete);
        assert_eq!(player.revealed_count(), 4);
        assert!(player.units()[0].pass);
        assert!(player.units()[2].pass, "ticket 3 resolves as finalist");
    }

    #[test]
    fn test_no_reveal_after_teardown() {
        let mut player = player();
        let mut fx = FeedbackBus::null();
        player.start(&mut fx);
        player.reveal_remaining();

        player.teardown();
        player.advance(10_000.0, &mut fx);
        assert_eq!(player.revealed_count(), 0);
        assert!(!player.reveal(0, &mut fx));
    }
}
