//! Replay Controller — one-way stage progression
//!
//! Owns the four stage players and drives them through a fixed, one-way
//! sequence:
//!
//! ```text
//! Intro ──▶ Stage1 ──▶ Stage2 ──▶ Stage3 ──▶ Stage4 ──▶ Victory
//! ```
//!
//! There is no backward navigation. Time enters through `advance(dt_ms)`
//! only, so the same result replays identically at any tick rate, and the
//! controller is the single gate for pause (a paused controller simply
//! stops forwarding time). `skip_to_end` fast-forwards every remaining
//! stage with presentation cues suppressed and lands on Victory with the
//! same standings a full playback produces.

use std::hash::{DefaultHasher, Hash, Hasher};

use log::warn;

use df_draw::{DrawResult, Entry, Winner};

use crate::feedback::{CueKind, FeedbackBus};
use crate::players::{
    DuelPlayer, HitsPlayer, PlayerStatus, QualifierPlayer, RevealPlayer, StagePlayer,
};
use crate::sched::Scheduler;
use crate::timing::ReplayTiming;

/// Controller phase, strictly forward-advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReplayPhase {
    /// Title hold before the first stage
    Intro,
    /// Qualifier lottery
    Stage1,
    /// Finalist reveal
    Stage2,
    /// Hit-counter elimination
    Stage3,
    /// Survivor duel
    Stage4,
    /// Terminal summary — standings available
    Victory,
}

impl ReplayPhase {
    fn next(self) -> ReplayPhase {
        match self {
            ReplayPhase::Intro => ReplayPhase::Stage1,
            ReplayPhase::Stage1 => ReplayPhase::Stage2,
            ReplayPhase::Stage2 => ReplayPhase::Stage3,
            ReplayPhase::Stage3 => ReplayPhase::Stage4,
            ReplayPhase::Stage4 | ReplayPhase::Victory => ReplayPhase::Victory,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReplayPhase::Intro => "intro",
            ReplayPhase::Stage1 => "stage1",
            ReplayPhase::Stage2 => "stage2",
            ReplayPhase::Stage3 => "stage3",
            ReplayPhase::Stage4 => "stage4",
            ReplayPhase::Victory => "victory",
        }
    }
}

/// Complete rank → identity table, valid once the controller reaches
/// Victory. Derived from the replayed stage state, not copied from the
/// result's summary block, so skip and full playback are checked against
/// the same source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalStandings {
    pub rows: Vec<Winner>,
}

impl FinalStandings {
    pub fn rank_of(&self, ticket: df_draw::TicketId) -> Option<u8> {
        self.rows.iter().find(|w| w.ticket == ticket).map(|w| w.rank)
    }
}

/// Drives one draw result through the full stage sequence
pub struct ReplayController {
    result: DrawResult,
    timing: ReplayTiming,
    display_seed: u64,
    fx: FeedbackBus,

    phase: ReplayPhase,
    paused: bool,
    started: bool,
    torn_down: bool,

    intro: Scheduler<()>,
    stage1: Option<QualifierPlayer>,
    stage2: Option<RevealPlayer>,
    stage3: Option<HitsPlayer>,
    stage4: Option<DuelPlayer>,
}

impl ReplayController {
    pub fn new(result: DrawResult, timing: ReplayTiming, fx: FeedbackBus) -> Self {
        // Cosmetic-randomness seed: stable per draw so two replays of the
        // same result show the same noise and jitter
        let mut hasher = DefaultHasher::new();
        result.draw_id.hash(&mut hasher);
        result.seed.hash(&mut hasher);
        let display_seed = hasher.finish();

        Self {
            result,
            timing,
            display_seed,
            fx,
            phase: ReplayPhase::Intro,
            paused: false,
            started: false,
            torn_down: false,
            intro: Scheduler::new(),
            stage1: None,
            stage2: None,
            stage3: None,
            stage4: None,
        }
    }

    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn result(&self) -> &DrawResult {
        &self.result
    }

    pub fn stage1(&self) -> Option<&QualifierPlayer> {
        self.stage1.as_ref()
    }

    pub fn stage2(&self) -> Option<&RevealPlayer> {
        self.stage2.as_ref()
    }

    pub fn stage3(&self) -> Option<&HitsPlayer> {
        self.stage3.as_ref()
    }

    pub fn stage4(&self) -> Option<&DuelPlayer> {
        self.stage4.as_ref()
    }

    /// Begin playback: hold on the intro, then enter stage 1
    pub fn start(&mut self) {
        if self.started || self.torn_down {
            return;
        }
        self.started = true;
        self.intro.schedule((), self.timing.intro_hold_ms);
    }

    /// Forward `dt_ms` of wall time into the replay. Negative deltas are
    /// rejected; the virtual clock never rewinds.
    pub fn advance(&mut self, dt_ms: f64) {
        if dt_ms < 0.0 {
            warn!("rejecting negative clock delta {dt_ms}ms");
            return;
        }
        if self.torn_down || self.paused || !self.started {
            return;
        }

        self.fx.advance(dt_ms);

        if self.phase == ReplayPhase::Intro {
            if !self.intro.advance(dt_ms).is_empty() {
                self.enter(ReplayPhase::Stage1);
            }
            return;
        }

        let done = match self.phase {
            ReplayPhase::Stage1 => self
                .stage1
                .as_mut()
                .map(|p| p.advance(dt_ms, &mut self.fx) == PlayerStatus::Complete),
            ReplayPhase::Stage2 => self
                .stage2
                .as_mut()
                .map(|p| p.advance(dt_ms, &mut self.fx) == PlayerStatus::Complete),
            ReplayPhase::Stage3 => self
                .stage3
                .as_mut()
                .map(|p| p.advance(dt_ms, &mut self.fx) == PlayerStatus::Complete),
            ReplayPhase::Stage4 => self
                .stage4
                .as_mut()
                .map(|p| p.advance(dt_ms, &mut self.fx) == PlayerStatus::Complete),
            ReplayPhase::Intro | ReplayPhase::Victory => None,
        };

        if done == Some(true) {
            self.enter(self.phase.next());
        }
    }

    /// Freeze the virtual clock; stage state is untouched
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Stage-2 passthrough: reveal one card. Returns whether the call
    /// changed anything (repeat reveals are no-ops).
    pub fn reveal(&mut self, index: usize) -> bool {
        if self.torn_down || self.phase != ReplayPhase::Stage2 {
            return false;
        }
        match self.stage2.as_mut() {
            Some(player) => player.reveal(index, &mut self.fx),
            None => false,
        }
    }

    /// Stage-2 passthrough: auto-reveal everything still face down
    pub fn reveal_remaining(&mut self) {
        if self.torn_down || self.phase != ReplayPhase::Stage2 {
            return;
        }
        if let Some(player) = self.stage2.as_mut() {
            player.reveal_remaining();
        }
    }

    /// Fast-forward every remaining stage and land on Victory. Per-event
    /// cues are suppressed; the terminal fanfare fires once here.
    pub fn skip_to_end(&mut self) {
        if self.torn_down || !self.started || self.phase == ReplayPhase::Victory {
            return;
        }

        self.fx.reset_all();
        self.intro.cancel_all();

        while self.phase != ReplayPhase::Victory {
            let phase = if self.phase == ReplayPhase::Intro {
                ReplayPhase::Stage1
            } else {
                self.phase
            };
            self.ensure_player(phase);
            match phase {
                ReplayPhase::Stage1 => {
                    if let Some(p) = self.stage1.as_mut() {
                        p.fast_forward(&mut self.fx);
                    }
                }
                ReplayPhase::Stage2 => {
                    if let Some(p) = self.stage2.as_mut() {
                        p.fast_forward(&mut self.fx);
                    }
                }
                ReplayPhase::Stage3 => {
                    if let Some(p) = self.stage3.as_mut() {
                        p.fast_forward(&mut self.fx);
                    }
                }
                ReplayPhase::Stage4 => {
                    if let Some(p) = self.stage4.as_mut() {
                        p.fast_forward(&mut self.fx);
                    }
                }
                ReplayPhase::Intro | ReplayPhase::Victory => {}
            }
            self.phase = phase.next();
        }

        let announced = self.stage4.as_ref().is_some_and(|p| p.win_announced());
        if !announced {
            self.fx.emit(CueKind::Win);
        }
    }

    /// Permanent: cancel everything, release the cue sink, and refuse all
    /// further time and commands
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.intro.tear_down();
        if let Some(p) = self.stage1.as_mut() {
            p.teardown();
        }
        if let Some(p) = self.stage2.as_mut() {
            p.teardown();
        }
        if let Some(p) = self.stage3.as_mut() {
            p.teardown();
        }
        if let Some(p) = self.stage4.as_mut() {
            p.teardown();
        }
        self.fx.tear_down();
    }

    /// Complete standings, available once the controller reaches Victory
    pub fn standings(&self) -> Option<FinalStandings> {
        if self.phase != ReplayPhase::Victory {
            return None;
        }

        let mut rows: Vec<Winner> = Vec::new();
        if let Some(duel) = self.stage4.as_ref() {
            for (rank, ticket) in duel.ranks() {
                rows.push(Winner {
                    rank,
                    ticket,
                    display_name: self.result.display_name(ticket),
                });
            }
        }
        if let Some(hits) = self.stage3.as_ref() {
            for finalist in hits.finalists() {
                if let Some(rank) = finalist.eliminated_rank {
                    rows.push(Winner {
                        rank,
                        ticket: finalist.entry.ticket,
                        display_name: finalist.entry.display_name.clone(),
                    });
                }
            }
        }
        rows.sort_by_key(|w| w.rank);
        Some(FinalStandings { rows })
    }

    /// Construct (without starting twice) the player backing `phase`
    fn ensure_player(&mut self, phase: ReplayPhase) {
        match phase {
            ReplayPhase::Stage1 => {
                if self.stage1.is_none() {
                    let mut player = QualifierPlayer::new(
                        self.result.stage1.clone(),
                        self.timing,
                        self.display_seed,
                    );
                    player.start(&mut self.fx);
                    self.stage1 = Some(player);
                }
            }
            ReplayPhase::Stage2 => {
                if self.stage2.is_none() {
                    let mut player = RevealPlayer::new(
                        self.result.stage1.clone(),
                        self.result.stage2.clone(),
                        self.timing,
                    );
                    player.start(&mut self.fx);
                    self.stage2 = Some(player);
                }
            }
            ReplayPhase::Stage3 => {
                if self.stage3.is_none() {
                    let finalists: Vec<Entry> = self
                        .result
                        .stage2
                        .iter()
                        .map(|&ticket| {
                            self.result.entry(ticket).cloned().unwrap_or_else(|| Entry {
                                ticket,
                                display_name: ticket.to_string(),
                            })
                        })
                        .collect();
                    let mut player = HitsPlayer::new(
                        finalists,
                        self.result.stage3.spins.clone(),
                        self.result.stage3.eliminations.clone(),
                        self.timing,
                        self.display_seed.wrapping_add(3),
                    );
                    player.start(&mut self.fx);
                    self.stage3 = Some(player);
                }
            }
            ReplayPhase::Stage4 => {
                if self.stage4.is_none() {
                    // Survivors come from the replayed stage-3 state when it
                    // ran, the record otherwise (skip before stage 3)
                    let survivors = match self.stage3.as_ref() {
                        Some(hits) => hits.survivors(),
                        None => self.result.stage3_survivors(),
                    };
                    let mut player = DuelPlayer::new(
                        survivors,
                        self.result.stage4.clone(),
                        self.timing,
                        self.display_seed.wrapping_add(4),
                    );
                    player.start(&mut self.fx);
                    self.stage4 = Some(player);
                }
            }
            ReplayPhase::Intro | ReplayPhase::Victory => {}
        }
    }

    fn enter(&mut self, phase: ReplayPhase) {
        // The phase index only moves forward
        if phase <= self.phase && self.phase != ReplayPhase::Intro {
            warn!("ignoring stale transition to {}", phase.label());
            return;
        }
        self.phase = phase;
        self.ensure_player(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_draw::presets;

    fn controller(timing: ReplayTiming) -> ReplayController {
        ReplayController::new(presets::short_demo(), timing, FeedbackBus::null())
    }

    /// Drive in fixed ticks until Victory, auto-revealing stage 2
    fn run(ctrl: &mut ReplayController, tick_ms: f64) {
        ctrl.start();
        for _ in 0..10_000 {
            ctrl.advance(tick_ms);
            if ctrl.phase() == ReplayPhase::Stage2 {
                ctrl.reveal_remaining();
            }
            if ctrl.phase() == ReplayPhase::Victory {
                return;
            }
        }
        panic!("replay never reached victory");
    }

    #[test]
    fn test_full_playback_reaches_victory() {
        let mut ctrl = controller(ReplayTiming::turbo());
        run(&mut ctrl, 50.0);
        assert_eq!(ctrl.phase(), ReplayPhase::Victory);
        assert!(ctrl.standings().is_some());
    }

    #[test]
    fn test_tick_rate_does_not_change_standings() {
        let mut coarse = controller(ReplayTiming::turbo());
        run(&mut coarse, 250.0);

        let mut fine = controller(ReplayTiming::turbo());
        run(&mut fine, 16.0);

        assert_eq!(coarse.standings(), fine.standings());
    }

    #[test]
    fn test_skip_matches_full_playback() {
        let mut played = controller(ReplayTiming::instant());
        run(&mut played, 1.0);

        let mut skipped = controller(ReplayTiming::normal());
        skipped.start();
        skipped.advance(200.0); // mid-intro
        skipped.skip_to_end();

        assert_eq!(skipped.phase(), ReplayPhase::Victory);
        assert_eq!(played.standings(), skipped.standings());
    }

    #[test]
    fn test_standings_match_recorded_winners() {
        let result = presets::short_demo();
        let expected: Vec<(u8, u64)> = result.winners.iter().map(|w| (w.rank, w.ticket.0)).collect();

        let mut ctrl = controller(ReplayTiming::instant());
        run(&mut ctrl, 1.0);

        let standings = ctrl.standings().unwrap();
        let got: Vec<(u8, u64)> = standings.rows.iter().map(|w| (w.rank, w.ticket.0)).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_pause_freezes_progress() {
        let mut ctrl = controller(ReplayTiming::normal());
        ctrl.start();
        ctrl.pause();
        ctrl.advance(1_000_000.0);
        assert_eq!(ctrl.phase(), ReplayPhase::Intro);

        ctrl.resume();
        ctrl.advance(2_000.0);
        assert_eq!(ctrl.phase(), ReplayPhase::Stage1);
    }

    #[test]
    fn test_negative_delta_rejected() {
        let mut ctrl = controller(ReplayTiming::normal());
        ctrl.start();
        ctrl.advance(1_000.0);
        ctrl.advance(-500.0);
        ctrl.advance(600.0); // 1600ms total forward, past the 1500ms intro
        assert_eq!(ctrl.phase(), ReplayPhase::Stage1);
    }

    #[test]
    fn test_teardown_freezes_everything() {
        let mut ctrl = controller(ReplayTiming::turbo());
        ctrl.start();
        ctrl.advance(1_000.0);
        ctrl.teardown();

        let phase = ctrl.phase();
        ctrl.advance(1_000_000.0);
        ctrl.skip_to_end();
        assert_eq!(ctrl.phase(), phase);
        assert!(ctrl.standings().is_none());
    }

    #[test]
    fn test_skip_before_start_is_noop() {
        let mut ctrl = controller(ReplayTiming::normal());
        ctrl.skip_to_end();
        assert_eq!(ctrl.phase(), ReplayPhase::Intro);
    }

    #[test]
    fn test_reveal_outside_stage2_is_noop() {
        let mut ctrl = controller(ReplayTiming::normal());
        ctrl.start();
        assert!(!ctrl.reveal(0));
    }
}
