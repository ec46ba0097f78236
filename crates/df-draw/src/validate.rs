//! Structural sanity checks for a fetched DrawResult
//!
//! The engine treats the payload as opaque and does not re-verify
//! fairness; these checks only establish that replay can run: each
//! stage's candidate set is a subset of the prior stage's output, and the
//! assigned ranks form a permutation with no gaps or duplicates.
//!
//! Performed once at fetch/mount time, never re-checked per stage.

use std::collections::HashSet;

use crate::error::{DfResult, DrawError};
use crate::result::{DrawResult, TicketId};

/// Canonical finalist count entering stage 3
pub const FINALIST_COUNT: usize = 5;

/// Canonical survivor count entering the duel
pub const SURVIVOR_COUNT: usize = 3;

/// Validation report for a draw result
#[derive(Debug, Clone, Default)]
pub struct DrawValidation {
    pub has_qualifiers: bool,
    pub finalists_subset_of_qualifiers: bool,
    pub spin_targets_are_finalists: bool,
    pub eliminations_match_threshold: bool,
    pub duel_players_are_survivors: bool,
    pub ranks_form_permutation: bool,
    pub finalist_count: usize,
    pub survivor_count: usize,
}

impl DrawValidation {
    /// Check if the result is replayable
    pub fn is_valid(&self) -> bool {
        self.finalists_subset_of_qualifiers
            && self.spin_targets_are_finalists
            && self.eliminations_match_threshold
            && self.duel_players_are_survivors
            && self.ranks_form_permutation
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();

        if !self.has_qualifiers {
            warnings.push("Stage 1 has no qualifiers; replay completes immediately");
        }
        if self.finalist_count != FINALIST_COUNT {
            warnings.push("Finalist count differs from the canonical 5");
        }
        if self.survivor_count != SURVIVOR_COUNT {
            warnings.push("Survivor count differs from the canonical 3");
        }
        if !self.finalists_subset_of_qualifiers {
            warnings.push("Stage 2 names tickets outside stage 1's output");
        }
        if !self.spin_targets_are_finalists {
            warnings.push("Stage 3 spins target tickets outside stage 2");
        }
        if !self.eliminations_match_threshold {
            warnings.push("Stage 3 eliminations do not match spin hit counts");
        }
        if !self.duel_players_are_survivors {
            warnings.push("Stage 4 turns name non-survivors");
        }
        if !self.ranks_form_permutation {
            warnings.push("Assigned ranks are not a gap-free permutation");
        }

        warnings
    }
}

/// Hit count threshold at which a finalist is eliminated in stage 3
pub const HIT_THRESHOLD: u32 = 3;

/// Run the full validation report
pub fn validate(result: &DrawResult) -> DrawValidation {
    let qualifier_set: HashSet<TicketId> = result.stage1.iter().map(|e| e.ticket).collect();
    let finalist_set: HashSet<TicketId> = result.stage2.iter().copied().collect();

    let finalists_subset = result.stage2.iter().all(|t| qualifier_set.contains(t));
    let spins_ok = result
        .stage3
        .spins
        .iter()
        .all(|s| finalist_set.contains(&s.target));

    let survivors = result.stage3_survivors();
    let survivor_set: HashSet<TicketId> = survivors.iter().copied().collect();
    let duel_ok = result
        .stage4
        .iter()
        .all(|t| survivor_set.contains(&t.player));

    DrawValidation {
        has_qualifiers: !result.stage1.is_empty(),
        finalists_subset_of_qualifiers: finalists_subset,
        spin_targets_are_finalists: spins_ok,
        eliminations_match_threshold: eliminations_match(result),
        duel_players_are_survivors: duel_ok,
        ranks_form_permutation: ranks_form_permutation(result),
        finalist_count: result.stage2.len(),
        survivor_count: survivors.len(),
    }
}

/// Hard check — error out rather than let a stage player start against
/// malformed data
pub fn ensure_replayable(result: &DrawResult) -> DfResult<()> {
    if result.stage2.is_empty() {
        return Err(DrawError::MissingStage("stage2"));
    }

    let qualifier_set: HashSet<TicketId> = result.stage1.iter().map(|e| e.ticket).collect();
    for ticket in &result.stage2 {
        if !qualifier_set.contains(ticket) {
            return Err(DrawError::NotASubset(*ticket));
        }
    }

    let finalist_set: HashSet<TicketId> = result.stage2.iter().copied().collect();
    for spin in &result.stage3.spins {
        if !finalist_set.contains(&spin.target) {
            return Err(DrawError::NotASubset(spin.target));
        }
    }

    let survivor_set: HashSet<TicketId> = result.stage3_survivors().into_iter().collect();
    for turn in &result.stage4 {
        if !survivor_set.contains(&turn.player) {
            return Err(DrawError::NotASubset(turn.player));
        }
    }

    // At most one recorded elimination per finalist; bound the length
    // before indexing anything off it
    let n = result.stage2.len();
    if result.stage3.eliminations.len() > n {
        return Err(DrawError::Malformed(format!(
            "{} eliminations recorded against {} finalists",
            result.stage3.eliminations.len(),
            n
        )));
    }

    // Eliminations take the lowest ranks, bottom-up in elimination order,
    // and may only name finalists
    for (i, elim) in result.stage3.eliminations.iter().enumerate() {
        if !finalist_set.contains(&elim.ticket) {
            return Err(DrawError::NotASubset(elim.ticket));
        }
        if usize::from(elim.rank) != n - i {
            return Err(DrawError::EliminationOrder {
                ticket: elim.ticket,
                rank: elim.rank,
            });
        }
    }

    // Every recorded elimination must be the spin at which its target
    // reaches the threshold; otherwise replayed standings diverge from
    // the recorded winners
    if !eliminations_match(result) {
        return Err(DrawError::Malformed(
            "stage 3 eliminations do not match spin hit counts".into(),
        ));
    }

    ensure_rank_permutation(result)?;
    Ok(())
}

/// Every elimination must correspond to the spin at which the target's
/// hit counter reaches the threshold, in recorded order
fn eliminations_match(result: &DrawResult) -> bool {
    let mut hits: std::collections::HashMap<TicketId, u32> = std::collections::HashMap::new();
    let mut reached: Vec<TicketId> = Vec::new();

    for spin in &result.stage3.spins {
        let counter = hits.entry(spin.target).or_insert(0);
        *counter += 1;
        if *counter == HIT_THRESHOLD {
            reached.push(spin.target);
        }
    }

    let recorded: Vec<TicketId> = result.stage3.eliminations.iter().map(|e| e.ticket).collect();
    recorded == reached
}

fn ranks_form_permutation(result: &DrawResult) -> bool {
    let n = result.stage2.len();
    if result.winners.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for winner in &result.winners {
        let rank = winner.rank as usize;
        if rank == 0 || rank > n || seen[rank - 1] {
            return false;
        }
        seen[rank - 1] = true;
    }
    true
}

fn ensure_rank_permutation(result: &DrawResult) -> DfResult<()> {
    let n = result.stage2.len();
    if result.winners.len() != n {
        return Err(DrawError::RankGap { expected: n as u8 });
    }
    let mut seen = vec![false; n];
    for winner in &result.winners {
        let rank = winner.rank as usize;
        if rank == 0 || rank > n {
            return Err(DrawError::RankGap { expected: n as u8 });
        }
        if seen[rank - 1] {
            return Err(DrawError::DuplicateRank(winner.rank));
        }
        seen[rank - 1] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use crate::result::{Elimination, Winner};

    #[test]
    fn test_preset_is_valid() {
        let result = presets::grand_draw();
        let validation = validate(&result);

        assert!(validation.is_valid(), "warnings: {:?}", validation.warnings());
        assert_eq!(validation.finalist_count, FINALIST_COUNT);
        assert_eq!(validation.survivor_count, SURVIVOR_COUNT);
        assert!(ensure_replayable(&result).is_ok());
    }

    #[test]
    fn test_non_subset_finalist_rejected() {
        let mut result = presets::grand_draw();
        result.stage2[0] = TicketId(9999);

        assert!(matches!(
            ensure_replayable(&result),
            Err(DrawError::NotASubset(TicketId(9999)))
        ));
    }

    #[test]
    fn test_duplicate_rank_rejected() {
        let mut result = presets::grand_draw();
        let rank = result.winners[0].rank;
        result.winners[1].rank = rank;

        assert!(matches!(
            ensure_replayable(&result),
            Err(DrawError::DuplicateRank(_))
        ));
    }

    #[test]
    fn test_rank_gap_rejected() {
        let mut result = presets::grand_draw();
        result.winners.pop();

        assert!(matches!(
            ensure_replayable(&result),
            Err(DrawError::RankGap { .. })
        ));
    }

    #[test]
    fn test_elimination_order_must_be_bottom_up() {
        let mut result = presets::grand_draw();
        // Swap the two recorded elimination ranks: first eliminee must
        // take rank 5, not 4
        result.stage3.eliminations[0].rank = 4;
        result.stage3.eliminations[1].rank = 5;

        assert!(matches!(
            ensure_replayable(&result),
            Err(DrawError::EliminationOrder { .. })
        ));
    }

    #[test]
    fn test_eliminations_must_match_spin_hits() {
        let mut result = presets::grand_draw();
        result.stage3.eliminations = vec![Elimination {
            ticket: result.stage2[0],
            rank: 5,
        }];

        let validation = validate(&result);
        assert!(!validation.eliminations_match_threshold);
        // The hard gate rejects the same inconsistency
        assert!(matches!(
            ensure_replayable(&result),
            Err(DrawError::Malformed(_))
        ));
    }

    #[test]
    fn test_eliminations_without_threshold_spins_rejected() {
        // Recorded eliminations but no spin ever reaches the threshold:
        // replaying this would end with standings that contradict the
        // recorded winners
        let mut result = presets::grand_draw();
        result.stage3.spins.clear();

        assert!(matches!(
            ensure_replayable(&result),
            Err(DrawError::Malformed(_))
        ));
    }

    #[test]
    fn test_more_eliminations_than_finalists_rejected() {
        let mut result = presets::grand_draw();
        // 7 eliminations against 5 finalists, ranks counting down past 1
        result.stage3.eliminations = (0..7u8)
            .map(|i| Elimination {
                ticket: result.stage2[usize::from(i) % 5],
                rank: 5u8.saturating_sub(i),
            })
            .collect();

        assert!(matches!(
            ensure_replayable(&result),
            Err(DrawError::Malformed(_))
        ));
    }

    #[test]
    fn test_elimination_of_non_finalist_rejected() {
        let mut result = presets::grand_draw();
        result.stage3.eliminations[0].ticket = TicketId(9999);

        assert!(matches!(
            ensure_replayable(&result),
            Err(DrawError::NotASubset(TicketId(9999)))
        ));
    }

    #[test]
    fn test_missing_winners_detected() {
        let mut result = presets::grand_draw();
        result.winners = vec![Winner {
            rank: 1,
            ticket: result.stage2[0],
            display_name: "x".into(),
        }];

        let validation = validate(&result);
        assert!(!validation.ranks_form_permutation);
    }
}
