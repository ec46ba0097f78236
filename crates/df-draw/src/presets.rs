//! Built-in draw results for demos and tests
//!
//! Canned, well-formed `DrawResult` values with known standings, used by
//! the headless CLI and the replay test suite. Outcomes here are fixed by
//! construction — replaying them must always reproduce the same ranks.

use chrono::{TimeZone, Utc};

use crate::result::{
    DrawResult, Elimination, Entry, SpinEvent, Stage3Record, TicketId, TurnEvent, TurnOutcome,
    Winner,
};

/// Look up a preset by name
pub fn by_name(name: &str) -> Option<DrawResult> {
    match name {
        "grand_draw" | "full" => Some(grand_draw()),
        "short_demo" | "short" => Some(short_demo()),
        _ => None,
    }
}

/// Names of all built-in presets
pub fn names() -> &'static [&'static str] {
    &["grand_draw", "short_demo"]
}

/// Full-size scenario: 20 qualifiers, 5 finalists, two stage-3
/// eliminations (ranks 5 then 4), duel decided by three favorable turns.
///
/// Final standings: #110 first, #103 second, #118 third, #114 fourth,
/// #107 fifth.
pub fn grand_draw() -> DrawResult {
    let stage1: Vec<Entry> = (0..20)
        .map(|i| Entry::new(101 + i, format!("player-{:02}", i + 1)))
        .collect();

    let stage2 = vec![
        TicketId(103),
        TicketId(107),
        TicketId(110),
        TicketId(114),
        TicketId(118),
    ];

    // #107 reaches three hits first (rank 5), then #114 (rank 4)
    let spins = [107, 110, 107, 114, 107, 114, 103, 114]
        .into_iter()
        .map(|t| SpinEvent { target: TicketId(t) })
        .collect();

    let stage3 = Stage3Record {
        spins,
        eliminations: vec![
            Elimination {
                ticket: TicketId(107),
                rank: 5,
            },
            Elimination {
                ticket: TicketId(114),
                rank: 4,
            },
        ],
    };

    // #118 collects three unfavorable turns (rank 3), #110 three
    // favorable (rank 1), #103 is left standing when the list ends
    let stage4 = vec![
        turn(110, TurnOutcome::Favorable),
        turn(118, TurnOutcome::Unfavorable),
        turn(103, TurnOutcome::Favorable),
        turn(118, TurnOutcome::Unfavorable),
        turn(110, TurnOutcome::Favorable),
        turn(118, TurnOutcome::Unfavorable),
        turn(103, TurnOutcome::Unfavorable),
        turn(110, TurnOutcome::Favorable),
    ];

    let mut result = DrawResult::new("draw-grand-20", "seed-grand-draw")
        .with_stage1(stage1)
        .with_stage2(stage2)
        .with_stage3(stage3)
        .with_stage4(stage4)
        .with_winners(vec![
            winner(1, 110, "player-10"),
            winner(2, 103, "player-03"),
            winner(3, 118, "player-18"),
            winner(4, 114, "player-14"),
            winner(5, 107, "player-07"),
        ]);
    result.decided_at = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
    result
}

/// Small scenario for quick demos: 6 qualifiers, clean stage boundaries
pub fn short_demo() -> DrawResult {
    let stage1: Vec<Entry> = (1..=6).map(|i| Entry::new(i, format!("t{i}"))).collect();

    let stage2: Vec<TicketId> = (1..=5).map(TicketId).collect();

    let stage3 = Stage3Record {
        spins: [5, 5, 5, 4, 4, 4]
            .into_iter()
            .map(|t| SpinEvent { target: TicketId(t) })
            .collect(),
        eliminations: vec![
            Elimination {
                ticket: TicketId(5),
                rank: 5,
            },
            Elimination {
                ticket: TicketId(4),
                rank: 4,
            },
        ],
    };

    let stage4 = vec![
        turn(3, TurnOutcome::Unfavorable),
        turn(3, TurnOutcome::Unfavorable),
        turn(3, TurnOutcome::Unfavorable),
        turn(1, TurnOutcome::Favorable),
        turn(1, TurnOutcome::Favorable),
        turn(1, TurnOutcome::Favorable),
    ];

    let mut result = DrawResult::new("draw-short-6", "seed-short-demo")
        .with_stage1(stage1)
        .with_stage2(stage2)
        .with_stage3(stage3)
        .with_stage4(stage4)
        .with_winners(vec![
            winner(1, 1, "t1"),
            winner(2, 2, "t2"),
            winner(3, 3, "t3"),
            winner(4, 4, "t4"),
            winner(5, 5, "t5"),
        ]);
    result.decided_at = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
    result
}

fn turn(ticket: u64, outcome: TurnOutcome) -> TurnEvent {
    TurnEvent {
        player: TicketId(ticket),
        outcome,
    }
}

fn winner(rank: u8, ticket: u64, name: &str) -> Winner {
    Winner {
        rank,
        ticket: TicketId(ticket),
        display_name: name.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;

    #[test]
    fn test_all_presets_replayable() {
        for name in names() {
            let result = by_name(name).unwrap();
            assert!(
                validate::ensure_replayable(&result).is_ok(),
                "preset {name} must be replayable"
            );
        }
    }

    #[test]
    fn test_grand_draw_shape() {
        let result = grand_draw();

        assert_eq!(result.stage1.len(), 20);
        assert_eq!(result.stage2.len(), 5);
        assert_eq!(result.stage3.eliminations.len(), 2);
        assert_eq!(result.stage3_survivors().len(), 3);
        assert_eq!(result.winners.len(), 5);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(by_name("nope").is_none());
    }
}
