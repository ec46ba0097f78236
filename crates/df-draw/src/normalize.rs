//! Fetch-time normalization to the canonical DrawResult shape
//!
//! Peripheral pages historically produced two payload shapes: the current
//! tagged form (serialized `DrawResult`) and a flat legacy form with bare
//! ticket arrays and bull/bear turn strings. Both are migrated HERE, once,
//! when the payload is fetched — stage players only ever see the canonical
//! shape and never branch on format again.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::{DfResult, DrawError};
use crate::result::{
    DrawResult, Elimination, Entry, SpinEvent, Stage3Record, TicketId, TurnEvent, TurnOutcome,
    Winner,
};

/// Normalize a fetched payload into the canonical shape.
///
/// Accepts the current tagged form and the legacy flat form; anything
/// else is rejected as malformed.
pub fn normalize_value(value: Value) -> DfResult<DrawResult> {
    let obj = value
        .as_object()
        .ok_or_else(|| DrawError::Malformed("payload is not an object".into()))?;

    if obj.contains_key("stage1") {
        // Canonical form — deserialize directly
        return Ok(serde_json::from_value(value)?);
    }

    if obj.contains_key("qualifiers") {
        return normalize_legacy(obj);
    }

    Err(DrawError::UnknownFormat(
        obj.get("v")
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unversioned".into()),
    ))
}

/// Legacy flat form:
///
/// ```json
/// {
///   "id": "draw-7", "seed": "...", "decided_at": 1765000000,
///   "qualifiers": [{"ticket": 103, "name": "alice"}, ...],
///   "finalists": [103, 107, 110, 114, 118],
///   "spins": [107, 110, 107, ...],
///   "eliminated": [{"ticket": 107, "rank": 5}, ...],
///   "turns": [{"player": 110, "outcome": "bull"}, ...],
///   "winners": [{"rank": 1, "ticket": 110}, ...]
/// }
/// ```
fn normalize_legacy(obj: &serde_json::Map<String, Value>) -> DfResult<DrawResult> {
    let get_str = |key: &str| -> String {
        obj.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    let stage1 = obj
        .get("qualifiers")
        .and_then(|v| v.as_array())
        .ok_or(DrawError::MissingStage("qualifiers"))?
        .iter()
        .map(legacy_entry)
        .collect::<DfResult<Vec<Entry>>>()?;

    let stage2 = obj
        .get("finalists")
        .and_then(|v| v.as_array())
        .ok_or(DrawError::MissingStage("finalists"))?
        .iter()
        .map(|v| ticket(v).ok_or_else(|| DrawError::Malformed("finalist is not a ticket".into())))
        .collect::<DfResult<Vec<TicketId>>>()?;

    let spins = obj
        .get("spins")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(ticket)
                .map(|target| SpinEvent { target })
                .collect()
        })
        .unwrap_or_default();

    let eliminations = obj
        .get("eliminated")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(legacy_elimination).collect())
        .unwrap_or_default();

    let stage4 = obj
        .get("turns")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .map(legacy_turn)
                .collect::<DfResult<Vec<TurnEvent>>>()
        })
        .transpose()?
        .unwrap_or_default();

    let winners = obj
        .get("winners")
        .and_then(|v| v.as_array())
        .ok_or(DrawError::MissingStage("winners"))?
        .iter()
        .map(|v| legacy_winner(v, &stage1))
        .collect::<DfResult<Vec<Winner>>>()?;

    Ok(DrawResult {
        draw_id: get_str("id"),
        seed: get_str("seed"),
        decided_at: legacy_timestamp(obj.get("decided_at")),
        stage1,
        stage2,
        stage3: Stage3Record {
            spins,
            eliminations,
        },
        stage4,
        winners,
    })
}

fn ticket(value: &Value) -> Option<TicketId> {
    value.as_u64().map(TicketId)
}

fn legacy_entry(value: &Value) -> DfResult<Entry> {
    let obj = value
        .as_object()
        .ok_or_else(|| DrawError::Malformed("qualifier is not an object".into()))?;
    let ticket = obj
        .get("ticket")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| DrawError::Malformed("qualifier without ticket".into()))?;
    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    Ok(Entry::new(ticket, name))
}

fn legacy_elimination(value: &Value) -> Option<Elimination> {
    let obj = value.as_object()?;
    Some(Elimination {
        ticket: TicketId(obj.get("ticket")?.as_u64()?),
        rank: obj.get("rank")?.as_u64()? as u8,
    })
}

fn legacy_turn(value: &Value) -> DfResult<TurnEvent> {
    let obj = value
        .as_object()
        .ok_or_else(|| DrawError::Malformed("turn is not an object".into()))?;
    let player = obj
        .get("player")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| DrawError::Malformed("turn without player".into()))?;

    // Legacy payloads record outcomes as market direction
    let outcome = match obj.get("outcome").and_then(|v| v.as_str()) {
        Some("bull") | Some("favorable") => TurnOutcome::Favorable,
        Some("bear") | Some("unfavorable") => TurnOutcome::Unfavorable,
        other => {
            return Err(DrawError::Malformed(format!(
                "unknown turn outcome {other:?}"
            )));
        }
    };

    Ok(TurnEvent {
        player: TicketId(player),
        outcome,
    })
}

fn legacy_winner(value: &Value, stage1: &[Entry]) -> DfResult<Winner> {
    let obj = value
        .as_object()
        .ok_or_else(|| DrawError::Malformed("winner is not an object".into()))?;
    let rank = obj
        .get("rank")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| DrawError::Malformed("winner without rank".into()))? as u8;
    let ticket = TicketId(
        obj.get("ticket")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| DrawError::Malformed("winner without ticket".into()))?,
    );

    // Legacy winners carry no display name; resolve from the qualifier list
    let display_name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| {
            stage1
                .iter()
                .find(|e| e.ticket == ticket)
                .map(|e| e.display_name.clone())
        })
        .unwrap_or_else(|| ticket.to_string());

    Ok(Winner {
        rank,
        ticket,
        display_name,
    })
}

fn legacy_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(Utc::now),
        Some(Value::String(s)) => s
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
        _ => Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use crate::validate;
    use serde_json::json;

    #[test]
    fn test_canonical_form_passes_through() {
        let result = presets::grand_draw();
        let value = serde_json::to_value(&result).unwrap();

        let normalized = normalize_value(value).unwrap();
        assert_eq!(normalized, result);
    }

    #[test]
    fn test_legacy_form_migrates() {
        let payload = json!({
            "id": "draw-legacy-1",
            "seed": "0xfeed",
            "decided_at": 1765000000,
            "qualifiers": [
                {"ticket": 1, "name": "a"},
                {"ticket": 2, "name": "b"},
                {"ticket": 3, "name": "c"},
                {"ticket": 4, "name": "d"},
                {"ticket": 5, "name": "e"},
                {"ticket": 6, "name": "f"}
            ],
            "finalists": [1, 2, 3, 4, 5],
            "spins": [5, 5, 5, 4, 4, 4],
            "eliminated": [
                {"ticket": 5, "rank": 5},
                {"ticket": 4, "rank": 4}
            ],
            "turns": [
                {"player": 3, "outcome": "bear"},
                {"player": 3, "outcome": "bear"},
                {"player": 3, "outcome": "bear"},
                {"player": 1, "outcome": "bull"},
                {"player": 1, "outcome": "bull"},
                {"player": 1, "outcome": "bull"}
            ],
            "winners": [
                {"rank": 1, "ticket": 1},
                {"rank": 2, "ticket": 2},
                {"rank": 3, "ticket": 3},
                {"rank": 4, "ticket": 4},
                {"rank": 5, "ticket": 5}
            ]
        });

        let result = normalize_value(payload).unwrap();

        assert_eq!(result.draw_id, "draw-legacy-1");
        assert_eq!(result.stage1.len(), 6);
        assert_eq!(result.stage4[0].outcome, TurnOutcome::Unfavorable);
        assert_eq!(result.stage4[3].outcome, TurnOutcome::Favorable);
        // Winner names resolved from the qualifier list
        assert_eq!(result.winners[0].display_name, "a");
        assert!(validate::ensure_replayable(&result).is_ok());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let payload = json!({"v": 99, "something": []});
        assert!(matches!(
            normalize_value(payload),
            Err(DrawError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_unknown_turn_outcome_rejected() {
        let payload = json!({
            "id": "x", "seed": "s",
            "qualifiers": [{"ticket": 1, "name": "a"}],
            "finalists": [1],
            "turns": [{"player": 1, "outcome": "sideways"}],
            "winners": [{"rank": 1, "ticket": 1}]
        });
        assert!(matches!(
            normalize_value(payload),
            Err(DrawError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(normalize_value(json!([1, 2, 3])).is_err());
    }
}
