//! DrawResult — the immutable record of one decided draw
//!
//! Created once by the upstream result-generation service, fetched
//! read-only at host mount and held for the page's lifetime. The replay
//! engine never mutates it; every visible outcome (who is eliminated,
//! which rank they take) is read from here verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque ticket identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One entry in the draw — a ticket plus its display identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Ticket identifier
    pub ticket: TicketId,

    /// Display name shown during playback
    pub display_name: String,
}

impl Entry {
    pub fn new(ticket: u64, display_name: impl Into<String>) -> Self {
        Self {
            ticket: TicketId(ticket),
            display_name: display_name.into(),
        }
    }
}

/// One recorded stage-3 spin: the pointer lands on `target` and its hit
/// counter increments by one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinEvent {
    /// Finalist ticket this spin lands on
    pub target: TicketId,
}

/// A recorded stage-3 elimination: `ticket` reached the hit threshold and
/// takes `rank`, assigned in elimination order from the bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    /// Eliminated finalist
    pub ticket: TicketId,

    /// Final rank, recorded verbatim — the engine never recomputes it
    pub rank: u8,
}

/// Stage 3 record: ordered spins plus the eliminations they produce
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stage3Record {
    /// Spins in strict recorded order
    pub spins: Vec<SpinEvent>,

    /// Eliminations in the order they occur
    #[serde(default)]
    pub eliminations: Vec<Elimination>,
}

/// Outcome of one duel turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Counts toward the player's favorable tally (3 wins rank 1)
    Favorable,
    /// Counts toward elimination (3 takes the next rank from the bottom)
    Unfavorable,
}

/// One recorded stage-4 duel turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEvent {
    /// Which survivor takes this turn
    pub player: TicketId,

    /// Recorded outcome — presentation derives from this, never the reverse
    pub outcome: TurnOutcome,
}

/// Final rank → identity mapping for the terminal summary screen.
/// Redundant with the stage records, kept because the summary renders
/// before any replay runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    /// Final rank, 1-based
    pub rank: u8,

    /// Winning ticket
    pub ticket: TicketId,

    /// Display identity
    pub display_name: String,
}

/// The immutable, pre-decided four-stage elimination outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawResult {
    /// Draw identifier
    pub draw_id: String,

    /// Opaque provenance token from the result-generation service.
    /// Not interpreted here — fairness is verified upstream.
    pub seed: String,

    /// When the outcome was decided
    pub decided_at: DateTime<Utc>,

    /// Stage 1: qualifiers drawn from the full ticket pool, in reveal order
    pub stage1: Vec<Entry>,

    /// Stage 2: the finalist subset of stage 1's output
    pub stage2: Vec<TicketId>,

    /// Stage 3: recorded spins and the eliminations they produce
    #[serde(default)]
    pub stage3: Stage3Record,

    /// Stage 4: recorded duel turns among the stage-3 survivors
    #[serde(default)]
    pub stage4: Vec<TurnEvent>,

    /// Final standings for the summary screen
    pub winners: Vec<Winner>,
}

impl DrawResult {
    /// Create an empty result shell (builder entry point, mostly for tests
    /// and presets)
    pub fn new(draw_id: impl Into<String>, seed: impl Into<String>) -> Self {
        Self {
            draw_id: draw_id.into(),
            seed: seed.into(),
            decided_at: Utc::now(),
            stage1: Vec::new(),
            stage2: Vec::new(),
            stage3: Stage3Record::default(),
            stage4: Vec::new(),
            winners: Vec::new(),
        }
    }

    /// Set qualifiers (builder pattern)
    pub fn with_stage1(mut self, entries: Vec<Entry>) -> Self {
        self.stage1 = entries;
        self
    }

    /// Set finalists
    pub fn with_stage2(mut self, finalists: Vec<TicketId>) -> Self {
        self.stage2 = finalists;
        self
    }

    /// Set stage-3 spins and eliminations
    pub fn with_stage3(mut self, record: Stage3Record) -> Self {
        self.stage3 = record;
        self
    }

    /// Set duel turns
    pub fn with_stage4(mut self, turns: Vec<TurnEvent>) -> Self {
        self.stage4 = turns;
        self
    }

    /// Set final standings
    pub fn with_winners(mut self, winners: Vec<Winner>) -> Self {
        self.winners = winners;
        self
    }

    /// Look up a qualifier entry by ticket
    pub fn entry(&self, ticket: TicketId) -> Option<&Entry> {
        self.stage1.iter().find(|e| e.ticket == ticket)
    }

    /// Display name for a ticket, falling back to the ticket number
    pub fn display_name(&self, ticket: TicketId) -> String {
        self.entry(ticket)
            .map(|e| e.display_name.clone())
            .unwrap_or_else(|| ticket.to_string())
    }

    /// Finalist tickets eliminated in stage 3, in elimination order
    pub fn stage3_eliminated(&self) -> Vec<TicketId> {
        self.stage3.eliminations.iter().map(|e| e.ticket).collect()
    }

    /// Finalists that survive stage 3 and enter the duel, in stage-2 order
    pub fn stage3_survivors(&self) -> Vec<TicketId> {
        let eliminated = self.stage3_eliminated();
        self.stage2
            .iter()
            .copied()
            .filter(|t| !eliminated.contains(t))
            .collect()
    }

    /// Recorded rank for a stage-3 eliminee, if any
    pub fn recorded_rank(&self, ticket: TicketId) -> Option<u8> {
        self.stage3
            .eliminations
            .iter()
            .find(|e| e.ticket == ticket)
            .map(|e| e.rank)
    }

    /// Total ranks the draw assigns (= finalist count). Saturates rather
    /// than truncates for absurdly large payloads; validation rejects
    /// those before any rank is used.
    pub fn rank_count(&self) -> u8 {
        u8::try_from(self.stage2.len()).unwrap_or(u8::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> DrawResult {
        DrawResult::new("draw-001", "seed-abc")
            .with_stage1(vec![
                Entry::new(10, "alice"),
                Entry::new(20, "bob"),
                Entry::new(30, "carol"),
                Entry::new(40, "dave"),
                Entry::new(50, "erin"),
            ])
            .with_stage2(vec![
                TicketId(10),
                TicketId(20),
                TicketId(30),
                TicketId(40),
                TicketId(50),
            ])
            .with_stage3(Stage3Record {
                spins: vec![
                    SpinEvent {
                        target: TicketId(40),
                    },
                    SpinEvent {
                        target: TicketId(40),
                    },
                    SpinEvent {
                        target: TicketId(40),
                    },
                ],
                eliminations: vec![Elimination {
                    ticket: TicketId(40),
                    rank: 5,
                }],
            })
    }

    #[test]
    fn test_survivors_exclude_eliminated() {
        let result = sample_result();
        let survivors = result.stage3_survivors();

        assert_eq!(survivors.len(), 4);
        assert!(!survivors.contains(&TicketId(40)));
        // Stage-2 order preserved
        assert_eq!(survivors[0], TicketId(10));
    }

    #[test]
    fn test_rank_count_saturates() {
        let result = sample_result();
        assert_eq!(result.rank_count(), 5);

        let huge =
            DrawResult::new("draw-huge", "seed").with_stage2((0..300).map(TicketId).collect());
        assert_eq!(huge.rank_count(), u8::MAX);
    }

    #[test]
    fn test_recorded_rank() {
        let result = sample_result();
        assert_eq!(result.recorded_rank(TicketId(40)), Some(5));
        assert_eq!(result.recorded_rank(TicketId(10)), None);
    }

    #[test]
    fn test_display_name_fallback() {
        let result = sample_result();
        assert_eq!(result.display_name(TicketId(10)), "alice");
        assert_eq!(result.display_name(TicketId(999)), "#999");
    }

    #[test]
    fn test_serialization_round_trip() {
        let result = sample_result();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("draw-001"));
        assert!(json.contains("alice"));

        let back: DrawResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_turn_outcome_tags() {
        let turn = TurnEvent {
            player: TicketId(10),
            outcome: TurnOutcome::Favorable,
        };
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("favorable"));
    }
}
