//! df-replay: DrawForge Draw Replay Engine
//!
//! Takes one immutable, already-decided `DrawResult` and drives a
//! deterministic, cancellable, resumable, speed-independent playback of
//! it — four stage players sequenced by a one-way controller, discrete
//! events mapped to paired audio/haptic cues, with a hard guarantee that
//! nothing mutates or fires after teardown.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     DRAW REPLAY ENGINE                          │
//! ├────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  PlaybackHost ── fetch + normalize + validate once              │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  ReplayController   Intro → Qualifier → Reveal → Hits →         │
//! │       │             Duel → Victory   (one-way, monotonic)       │
//! │       ▼                                                         │
//! │  StagePlayer (one active at a time)                             │
//! │       │  schedules steps on its Scheduler<Step>                 │
//! │       ▼                                                         │
//! │  Scheduler ── virtual clock, teardown flag, cancel_all          │
//! │  FeedbackBus ── CueKind → (audio cue, haptic pulse)             │
//! │                                                                 │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never generates or re-derives randomness that could change
//! an outcome: every rank is read verbatim from the `DrawResult`, and the
//! only RNG in the crate is display-only jitter.

pub mod controller;
pub mod error;
pub mod feedback;
pub mod host;
pub mod players;
pub mod sched;
pub mod timing;

pub use controller::{FinalStandings, ReplayController, ReplayPhase};
pub use error::{ReplayError, ReplayResult};
pub use feedback::{
    AudioCue, CueKind, CueSink, FeedbackBus, HapticPulse, NullSink, RecordingSink, SinkCall,
};
pub use host::{HostView, Navigator, PlaybackHost, ResultSource, StayPut};
pub use players::{PlayerStatus, StagePlayer};
pub use sched::{Scheduler, TimerId};
pub use timing::ReplayTiming;
