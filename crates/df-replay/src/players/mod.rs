//! Stage players — one animation-timeline driver per draw stage
//!
//! Each player consumes its slice of the fixed `DrawResult` and replays
//! it at a fixed cadence: recorded events in strict recorded order, with
//! delays between them and cues on each. A player owns only ephemeral
//! presentation state (counters, indices, cosmetic angles); outcomes are
//! read from the record, never computed.

mod duel;
mod hits;
mod qualifier;
mod reveal;

pub use duel::{DuelPlayer, DuelState};
pub use hits::{FinalistState, HitsPlayer};
pub use qualifier::QualifierPlayer;
pub use reveal::{RevealPlayer, RevealUnit};

use crate::feedback::FeedbackBus;

/// Poll result of a stage player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// Not started yet
    Idle,
    /// Replaying recorded events
    Running,
    /// Every recorded event replayed and settle elapsed
    Complete,
}

/// Common surface of the four stage players
pub trait StagePlayer {
    /// Begin playback. An empty recorded input completes immediately.
    fn start(&mut self, fx: &mut FeedbackBus);

    /// Advance the player's virtual clock; due steps execute in recorded
    /// order. Returns the status after this slice of time.
    fn advance(&mut self, dt_ms: f64, fx: &mut FeedbackBus) -> PlayerStatus;

    /// Jump ephemeral state to its fully-replayed end value by replaying
    /// every remaining recorded event with zero delay. Per-event cues are
    /// suppressed; outcome state ends identical to full playback.
    fn fast_forward(&mut self, fx: &mut FeedbackBus);

    /// One-way cancellation: after this, no step executes and no state
    /// mutates.
    fn teardown(&mut self);

    /// Current status without advancing
    fn status(&self) -> PlayerStatus;
}
