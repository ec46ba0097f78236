//! Feedback Bus — discrete playback events to paired audio + haptic cues
//!
//! Every discrete moment of the replay (a noise tick, a reveal, a hit, a
//! duel turn, the win) maps to exactly one audio cue and, independently,
//! one haptic pulse. The bus owns the shared output handle for all four
//! stage players: lazily created on first use through an injected
//! factory, resumed if the platform suspended it, and fully disposable
//! via `reset_all()` — which also cancels any in-flight scheduled cue, so
//! nothing ever fires into a disposed handle.
//!
//! Haptic support is best-effort; a platform without it gets a silent
//! no-op, never an error.

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::sched::Scheduler;

// ═══════════════════════════════════════════════════════════════════════════════
// CUE TAXONOMY
// ═══════════════════════════════════════════════════════════════════════════════

/// Discrete playback event kinds the stage players emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    /// Noise tick during the qualifier lottery
    Tick,
    /// A reveal unit resolved as a finalist
    RevealPass,
    /// A reveal unit resolved as eliminated
    RevealFail,
    /// First hit on a finalist
    Hit1,
    /// Second hit on a finalist
    Hit2,
    /// A finalist reached the hit threshold
    Eliminated,
    /// Favorable duel turn
    Favorable,
    /// Unfavorable duel turn
    Unfavorable,
    /// Terminal celebration
    Win,
}

impl CueKind {
    /// The audio cue this event plays
    pub fn audio(self) -> AudioCue {
        match self {
            CueKind::Tick => AudioCue::Tick,
            CueKind::RevealPass => AudioCue::Pass,
            CueKind::RevealFail => AudioCue::Fail,
            CueKind::Hit1 => AudioCue::HitLow,
            CueKind::Hit2 => AudioCue::HitHigh,
            CueKind::Eliminated => AudioCue::Knockout,
            CueKind::Favorable => AudioCue::Bull,
            CueKind::Unfavorable => AudioCue::Bear,
            CueKind::Win => AudioCue::Fanfare,
        }
    }

    /// The haptic pulse this event triggers
    pub fn haptic(self) -> HapticPulse {
        match self {
            CueKind::Tick => HapticPulse::Light,
            CueKind::RevealPass => HapticPulse::Medium,
            CueKind::RevealFail => HapticPulse::Light,
            CueKind::Hit1 => HapticPulse::Light,
            CueKind::Hit2 => HapticPulse::Medium,
            CueKind::Eliminated => HapticPulse::Heavy,
            CueKind::Favorable => HapticPulse::Medium,
            CueKind::Unfavorable => HapticPulse::Medium,
            CueKind::Win => HapticPulse::Success,
        }
    }
}

/// Audio cue identifiers (asset slots, resolved by the host platform)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Tick,
    Pass,
    Fail,
    HitLow,
    HitHigh,
    Knockout,
    Bull,
    Bear,
    Fanfare,
}

/// Haptic pulse strengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticPulse {
    Light,
    Medium,
    Heavy,
    Success,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SINK
// ═══════════════════════════════════════════════════════════════════════════════

/// Output handle for audio + haptics, owned by the bus
pub trait CueSink {
    /// Play one audio cue
    fn play(&mut self, cue: AudioCue);

    /// Trigger one haptic pulse. Platforms without haptics no-op silently.
    fn pulse(&mut self, pulse: HapticPulse);

    /// Resume the handle if the platform suspended it (e.g. backgrounded
    /// audio context). Default: nothing to do.
    fn resume(&mut self) {}
}

/// Sink that discards everything (headless playback, muted host)
#[derive(Debug, Default)]
pub struct NullSink;

impl CueSink for NullSink {
    fn play(&mut self, _cue: AudioCue) {}
    fn pulse(&mut self, _pulse: HapticPulse) {}
}

/// Recorded sink call, for instrumentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCall {
    Play(AudioCue),
    Pulse(HapticPulse),
    Resume,
}

/// Test sink that records every call into a shared log
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Rc<RefCell<Vec<SinkCall>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared log handle; clones observe the same call stream
    pub fn log(&self) -> Rc<RefCell<Vec<SinkCall>>> {
        Rc::clone(&self.log)
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.log.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.log.borrow().len()
    }
}

impl CueSink for RecordingSink {
    fn play(&mut self, cue: AudioCue) {
        self.log.borrow_mut().push(SinkCall::Play(cue));
    }

    fn pulse(&mut self, pulse: HapticPulse) {
        self.log.borrow_mut().push(SinkCall::Pulse(pulse));
    }

    fn resume(&mut self) {
        self.log.borrow_mut().push(SinkCall::Resume);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUS
// ═══════════════════════════════════════════════════════════════════════════════

type SinkFactory = Box<dyn Fn() -> Box<dyn CueSink>>;

/// The shared feedback bus for all stage players
pub struct FeedbackBus {
    factory: SinkFactory,
    /// Lazily created on first emit, dropped by `reset_all`
    handle: Option<Box<dyn CueSink>>,
    /// Scheduled (delayed) cues; shares the engine's timer primitive so
    /// reset/teardown can cancel in-flight cues
    delayed: Scheduler<CueKind>,
    /// Total cues actually delivered to the handle
    emitted: u64,
}

impl FeedbackBus {
    /// Create a bus with an injected sink factory
    pub fn new(factory: impl Fn() -> Box<dyn CueSink> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            handle: None,
            delayed: Scheduler::new(),
            emitted: 0,
        }
    }

    /// Bus that plays into nothing (headless runs)
    pub fn null() -> Self {
        Self::new(|| Box::new(NullSink))
    }

    /// Whether the shared handle has been created yet
    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    /// Total cues delivered so far
    pub fn emitted_count(&self) -> u64 {
        self.emitted
    }

    /// Emit one cue now: audio and haptic, through the shared handle
    pub fn emit(&mut self, kind: CueKind) {
        if self.delayed.is_torn_down() {
            return;
        }
        trace!("cue {kind:?}");

        let fresh = self.handle.is_none();
        if fresh {
            self.handle = Some((self.factory)());
        }
        if let Some(handle) = self.handle.as_mut() {
            // An existing handle may have been suspended by the platform
            if !fresh {
                handle.resume();
            }
            handle.play(kind.audio());
            handle.pulse(kind.haptic());
            self.emitted += 1;
        }
    }

    /// Schedule a cue `delay_ms` from the bus's current time
    pub fn emit_after(&mut self, kind: CueKind, delay_ms: f64) {
        self.delayed.schedule(kind, delay_ms);
    }

    /// Advance the bus clock, firing any scheduled cues that came due
    pub fn advance(&mut self, dt_ms: f64) {
        for kind in self.delayed.advance(dt_ms) {
            self.emit(kind);
        }
    }

    /// Dispose the shared handle and cancel every in-flight scheduled
    /// cue. The bus stays usable: the next emit lazily creates a fresh
    /// handle.
    pub fn reset_all(&mut self) {
        self.delayed.cancel_all();
        self.handle = None;
    }

    /// Permanent shutdown at host unmount: dispose the handle and refuse
    /// all further cues.
    pub fn tear_down(&mut self) {
        self.delayed.tear_down();
        self.handle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_bus() -> (FeedbackBus, RecordingSink) {
        let sink = RecordingSink::new();
        let template = sink.clone();
        let bus = FeedbackBus::new(move || Box::new(template.clone()));
        (bus, sink)
    }

    #[test]
    fn test_lazy_handle_creation() {
        let (mut bus, sink) = recording_bus();
        assert!(!bus.is_initialized());

        bus.emit(CueKind::Tick);
        assert!(bus.is_initialized());
        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Play(AudioCue::Tick),
                SinkCall::Pulse(HapticPulse::Light)
            ]
        );
    }

    #[test]
    fn test_existing_handle_resumed() {
        let (mut bus, sink) = recording_bus();

        bus.emit(CueKind::Tick);
        bus.emit(CueKind::Win);

        // Second emit resumes before playing
        assert!(sink.calls().contains(&SinkCall::Resume));
    }

    #[test]
    fn test_reset_cancels_scheduled_cues() {
        let (mut bus, sink) = recording_bus();

        bus.emit_after(CueKind::Eliminated, 100.0);
        bus.reset_all();
        bus.advance(1000.0);

        assert_eq!(sink.call_count(), 0);
        assert!(!bus.is_initialized());
    }

    #[test]
    fn test_usable_after_reset() {
        let (mut bus, sink) = recording_bus();

        bus.emit(CueKind::Tick);
        bus.reset_all();
        bus.emit(CueKind::Win);

        assert!(sink.calls().contains(&SinkCall::Play(AudioCue::Fanfare)));
    }

    #[test]
    fn test_nothing_after_teardown() {
        let (mut bus, sink) = recording_bus();

        bus.emit_after(CueKind::Win, 50.0);
        bus.tear_down();
        bus.advance(1000.0);
        bus.emit(CueKind::Tick);

        assert_eq!(sink.call_count(), 0);
        assert_eq!(bus.emitted_count(), 0);
    }

    #[test]
    fn test_delayed_cue_fires_on_time() {
        let (mut bus, sink) = recording_bus();

        bus.emit_after(CueKind::RevealPass, 200.0);
        bus.advance(100.0);
        assert_eq!(sink.call_count(), 0);

        bus.advance(100.0);
        assert!(sink.calls().contains(&SinkCall::Play(AudioCue::Pass)));
    }

    #[test]
    fn test_every_kind_has_cue_pair() {
        // The map is total: no kind panics or falls through
        for kind in [
            CueKind::Tick,
            CueKind::RevealPass,
            CueKind::RevealFail,
            CueKind::Hit1,
            CueKind::Hit2,
            CueKind::Eliminated,
            CueKind::Favorable,
            CueKind::Unfavorable,
            CueKind::Win,
        ] {
            let _ = kind.audio();
            let _ = kind.haptic();
        }
    }
}
