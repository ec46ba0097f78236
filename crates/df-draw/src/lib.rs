//! df-draw: Draw result model for DrawForge
//!
//! A `DrawResult` is the immutable, already-decided outcome of a four-stage
//! elimination draw: a large ticket pool narrowed to qualifiers, finalists,
//! survivors and finally three ranked winners. The replay engine (df-replay)
//! only ever *presents* this record — nothing here is recomputed at play
//! time.
//!
//! ## Key components
//!
//! - `DrawResult` — the canonical record, one per draw
//! - `validate` — structural subset/order/permutation checks
//! - `normalize` — one fetch-time migration from historical payload shapes
//! - `presets` — canned well-formed draws for demos and tests

pub mod error;
pub mod normalize;
pub mod presets;
pub mod result;
pub mod validate;

pub use error::{DfResult, DrawError};
pub use normalize::normalize_value;
pub use result::{
    DrawResult, Elimination, Entry, SpinEvent, Stage3Record, TicketId, TurnEvent, TurnOutcome,
    Winner,
};
pub use validate::{DrawValidation, FINALIST_COUNT, HIT_THRESHOLD, SURVIVOR_COUNT};
