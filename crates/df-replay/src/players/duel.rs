//! Duel Player — stage 4
//!
//! The three stage-3 survivors trade recorded turns. Each turn's outcome
//! is fixed; the duel mechanism only animates toward a cosmetic target
//! position inside the half-zone that matches the outcome. Counters are
//! the whole of the ephemeral state: three favorable outcomes take the
//! next unassigned rank from the top, three unfavorable take the next
//! from the bottom (3rd assigned before 2nd as eliminations accumulate).
//!
//! When the recorded list runs out with a single player unranked, that
//! player takes the best remaining rank — rank 1 whenever it is free.
//! This mirrors the observed product behavior and is kept as an explicit
//! named rule rather than recomputed from anything.

use log::warn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use df_draw::{TicketId, TurnEvent, TurnOutcome};

use crate::feedback::{CueKind, FeedbackBus};
use crate::players::{PlayerStatus, StagePlayer};
use crate::sched::Scheduler;
use crate::timing::ReplayTiming;

/// Outcomes needed to take a rank (favorable or unfavorable)
pub const TURN_THRESHOLD: u32 = 3;

/// Scheduled steps of the duel player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Resolve the turn at this index
    Resolve(usize),
    /// Terminal celebration once all ranks are assigned
    Finish,
}

/// Ephemeral per-survivor duel state
#[derive(Debug, Clone)]
pub struct DuelState {
    pub ticket: TicketId,
    pub favorable: u32,
    pub unfavorable: u32,
    pub rank: Option<u8>,
}

/// Stage-4 player: three survivors ranked 1/2/3
pub struct DuelPlayer {
    players: Vec<DuelState>,
    turns: Vec<TurnEvent>,
    timing: ReplayTiming,
    sched: Scheduler<Step>,
    rng: ChaCha8Rng,

    next_turn: usize,
    /// Cosmetic mechanism position in [0, 1): favorable half below 0.5
    mechanism_pos: f64,
    won_emitted: bool,
    status: PlayerStatus,
}

impl DuelPlayer {
    pub fn new(
        survivors: Vec<TicketId>,
        turns: Vec<TurnEvent>,
        timing: ReplayTiming,
        display_seed: u64,
    ) -> Self {
        let players = survivors
            .into_iter()
            .map(|ticket| DuelState {
                ticket,
                favorable: 0,
                unfavorable: 0,
                rank: None,
            })
            .collect();
        Self {
            players,
            turns,
            timing,
            sched: Scheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(display_seed),
            next_turn: 0,
            mechanism_pos: 0.0,
            won_emitted: false,
            status: PlayerStatus::Idle,
        }
    }

    pub fn players(&self) -> &[DuelState] {
        &self.players
    }

    /// Cosmetic mechanism position in [0, 1)
    pub fn mechanism_pos(&self) -> f64 {
        self.mechanism_pos
    }

    /// Whether the terminal fanfare already fired (it does not on a
    /// fast-forward; the controller owns it there)
    pub fn win_announced(&self) -> bool {
        self.won_emitted
    }

    /// Assigned (rank, ticket) pairs so far
    pub fn ranks(&self) -> Vec<(u8, TicketId)> {
        let mut out: Vec<(u8, TicketId)> = self
            .players
            .iter()
            .filter_map(|p| p.rank.map(|r| (r, p.ticket)))
            .collect();
        out.sort_by_key(|(r, _)| *r);
        out
    }

    fn all_ranked(&self) -> bool {
        self.players.iter().all(|p| p.rank.is_some())
    }

    /// Smallest rank in 1..=N not yet assigned
    fn next_rank_from_top(&self) -> u8 {
        let n = self.players.len() as u8;
        (1..=n)
            .find(|r| !self.players.iter().any(|p| p.rank == Some(*r)))
            .unwrap_or(n)
    }

    /// Largest rank in 1..=N not yet assigned
    fn next_rank_from_bottom(&self) -> u8 {
        let n = self.players.len() as u8;
        (1..=n)
            .rev()
            .find(|r| !self.players.iter().any(|p| p.rank == Some(*r)))
            .unwrap_or(1)
    }

    /// Apply one recorded turn. `animate` controls cue emission and the
    /// cosmetic mechanism, never the outcome.
    fn apply_turn(&mut self, index: usize, animate: bool, fx: &mut FeedbackBus) {
        let turn = self.turns[index];

        if animate {
            // Land in the half-zone matching the recorded outcome; the
            // offset inside that half is cosmetic
            let offset = self.rng.random_range(0.05..0.45);
            self.mechanism_pos = match turn.outcome {
                TurnOutcome::Favorable => offset,
                TurnOutcome::Unfavorable => 0.5 + offset,
            };
            fx.emit(match turn.outcome {
                TurnOutcome::Favorable => CueKind::Favorable,
                TurnOutcome::Unfavorable => CueKind::Unfavorable,
            });
        }

        let top = self.next_rank_from_top();
        let bottom = self.next_rank_from_bottom();
        let Some(player) = self.players.iter_mut().find(|p| p.ticket == turn.player) else {
            warn!("turn {index} names unknown player {}", turn.player);
            return;
        };

        match turn.outcome {
            TurnOutcome::Favorable => {
                player.favorable += 1;
                if player.favorable == TURN_THRESHOLD && player.rank.is_none() {
                    player.rank = Some(top);
                }
            }
            TurnOutcome::Unfavorable => {
                player.unfavorable += 1;
                if player.unfavorable == TURN_THRESHOLD && player.rank.is_none() {
                    player.rank = Some(bottom);
                }
            }
        }

        self.assign_last_standing();
    }

    /// Named rule: once everyone else is ranked (or the turn list is
    /// exhausted), the single remaining player takes the best free rank.
    fn assign_last_standing(&mut self) {
        let unranked = self.players.iter().filter(|p| p.rank.is_none()).count();
        if unranked == 1 {
            let rank = self.next_rank_from_top();
            if let Some(player) = self.players.iter_mut().find(|p| p.rank.is_none()) {
                player.rank = Some(rank);
            }
        }
    }

    /// Exhausted-list fallback: rank whatever is left, best ranks first,
    /// in survivor order. With well-formed input at most one player is
    /// left and this is exactly the last-standing rule.
    fn rank_remaining(&mut self) {
        let unranked = self.players.iter().filter(|p| p.rank.is_none()).count();
        if unranked > 1 {
            warn!("turn list exhausted with {unranked} unranked players");
        }
        while !self.all_ranked() {
            let rank = self.next_rank_from_top();
            if let Some(player) = self.players.iter_mut().find(|p| p.rank.is_none()) {
                player.rank = Some(rank);
            }
        }
    }

    fn finish(&mut self, fx: &mut FeedbackBus) {
        if !self.won_emitted {
            self.won_emitted = true;
            fx.emit(CueKind::Win);
        }
        self.status = PlayerStatus::Complete;
    }

    fn execute(&mut self, step: Step, fx: &mut FeedbackBus) {
        match step {
            Step::Resolve(index) => {
                self.apply_turn(index, true, fx);
                self.next_turn = index + 1;

                if self.all_ranked() || self.next_turn == self.turns.len() {
                    if !self.all_ranked() {
                        self.rank_remaining();
                    }
                    self.sched.schedule(
                        Step::Finish,
                        self.timing.duel_settle_ms + self.timing.stage_settle_ms,
                    );
                } else {
                    self.sched.schedule(
                        Step::Resolve(self.next_turn),
                        self.timing.duel_settle_ms + self.timing.duel_travel_ms,
                    );
                }
            }
            Step::Finish => self.finish(fx),
        }
    }
}

impl StagePlayer for DuelPlayer {
    fn start(&mut self, fx: &mut FeedbackBus) {
        if self.status != PlayerStatus::Idle {
            return;
        }
        if self.turns.is_empty() {
            // Already decided before the duel starts: rank without ever
            // entering the animation loop
            self.rank_remaining();
            self.finish(fx);
            return;
        }
        self.status = PlayerStatus::Running;
        self.sched
            .schedule(Step::Resolve(0), self.timing.duel_travel_ms);
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

        let mut silent = FeedbackBus::null();
        while self.next_turn < self.turns.len() && !self.all_ranked() {
            self.apply_turn(self.next_turn, false, &mut silent);
            self.next_turn += 1;
        }
        if !self.all_ranked() {
            self.rank_remaining();
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
