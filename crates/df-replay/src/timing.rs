//! Replay timing profiles
//!
//! Delays are presentation pacing only — they never change which events
//! replay or in what order, so any two profiles (including instant)
//! reach the same terminal standings.

use serde::{Deserialize, Serialize};

/// Pacing configuration for one replay run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayTiming {
    /// Interval of the stage-1 noise tick loop (ms)
    pub noise_tick_ms: f64,

    /// Interval between stage-1 qualifier reveals (ms)
    pub qualifier_reveal_ms: f64,

    /// Stagger between units in the stage-2 "reveal remaining" fast path (ms)
    pub reveal_stagger_ms: f64,

    /// Stage-3 pointer travel time before landing (ms)
    pub spin_travel_ms: f64,

    /// Settle pause after a stage-3 landing (ms)
    pub spin_settle_ms: f64,

    /// Stage-4 duel mechanism travel time (ms)
    pub duel_travel_ms: f64,

    /// Settle pause after a duel turn resolves (ms)
    pub duel_settle_ms: f64,

    /// Fixed pause after a stage's last event before completion (ms)
    pub stage_settle_ms: f64,

    /// Intro bookend hold before stage 1 starts (ms)
    pub intro_hold_ms: f64,
}

impl Default for ReplayTiming {
    fn default() -> Self {
        Self::normal()
    }
}

impl ReplayTiming {
    /// Normal playback pacing
    pub fn normal() -> Self {
        Self {
            noise_tick_ms: 80.0,
            qualifier_reveal_ms: 900.0,
            reveal_stagger_ms: 120.0,
            spin_travel_ms: 1200.0,
            spin_settle_ms: 400.0,
            duel_travel_ms: 1000.0,
            duel_settle_ms: 500.0,
            stage_settle_ms: 800.0,
            intro_hold_ms: 1500.0,
        }
    }

    /// Fast pacing for impatient viewers
    pub fn turbo() -> Self {
        Self::normal().scaled(0.35)
    }

    /// Zero delays — every step fires on the next advance (tests, CLI)
    pub fn instant() -> Self {
        Self {
            noise_tick_ms: 0.0,
            qualifier_reveal_ms: 0.0,
            reveal_stagger_ms: 0.0,
            spin_travel_ms: 0.0,
            spin_settle_ms: 0.0,
            duel_travel_ms: 0.0,
            duel_settle_ms: 0.0,
            stage_settle_ms: 0.0,
            intro_hold_ms: 0.0,
        }
    }

    /// Scale every delay by `factor` (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            noise_tick_ms: self.noise_tick_ms * factor,
            qualifier_reveal_ms: self.qualifier_reveal_ms * factor,
            reveal_stagger_ms: self.reveal_stagger_ms * factor,
            spin_travel_ms: self.spin_travel_ms * factor,
            spin_settle_ms: self.spin_settle_ms * factor,
            duel_travel_ms: self.duel_travel_ms * factor,
            duel_settle_ms: self.duel_settle_ms * factor,
            stage_settle_ms: self.stage_settle_ms * factor,
            intro_hold_ms: self.intro_hold_ms * factor,
        }
    }

    /// Named profile lookup for the CLI
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "normal" => Some(Self::normal()),
            "turbo" => Some(Self::turbo()),
            "instant" => Some(Self::instant()),
            _ => None,
        }
    }
}
