//! Playback Host — mounts a replay around a fetched result
//!
//! The host is the seam between the engine and whatever surface embeds
//! it: it pulls the result from a [`ResultSource`], gates it through
//! replayability validation, runs a [`ReplayController`], and asks the
//! [`Navigator`] for a single forward navigation when the replay reaches
//! Victory.
//!
//! Failure is soft: a source error or an unreplayable result lands in
//! [`HostView::Unavailable`] with a message, never a panic, and the host
//! stays mounted so the surface can render the failure.

use log::{info, warn};

use df_draw::{validate, DrawResult};

use crate::controller::{FinalStandings, ReplayController, ReplayPhase};
use crate::error::{ReplayError, ReplayResult};
use crate::feedback::FeedbackBus;
use crate::timing::ReplayTiming;

/// Where a draw result comes from (file, preset, remote service)
pub trait ResultSource {
    fn fetch(&mut self, draw_id: &str) -> ReplayResult<DrawResult>;
}

/// Outward navigation seam. Called at most once per mount.
pub trait Navigator {
    fn go_to_summary(&mut self, standings: &FinalStandings);
}

/// No-op navigator for embeddings that render the summary in place
pub struct StayPut;

impl Navigator for StayPut {
    fn go_to_summary(&mut self, _standings: &FinalStandings) {}
}

/// What the embedding surface should render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostView {
    /// Replay in progress (covers intro through stage 4)
    Replay,
    /// Terminal summary
    Summary,
    /// Result could not be loaded or replayed
    Unavailable(String),
}

/// Owns one replay from mount to unmount
pub struct PlaybackHost {
    view: HostView,
    controller: Option<ReplayController>,
    navigator: Box<dyn Navigator>,
    navigated: bool,
    unmounted: bool,
}

impl PlaybackHost {
    /// Fetch, validate, and start a replay for `draw_id`
    pub fn mount(
        source: &mut dyn ResultSource,
        draw_id: &str,
        timing: ReplayTiming,
        fx: FeedbackBus,
        navigator: Box<dyn Navigator>,
    ) -> Self {
        let result = source
            .fetch(draw_id)
            .and_then(|result| match validate::ensure_replayable(&result) {
                Ok(()) => Ok(result),
                Err(e) => Err(ReplayError::Malformed(e)),
            });

        match result {
            Ok(result) => {
                info!(
                    "mounting replay for draw {} ({} qualifiers, {} finalists)",
                    result.draw_id,
                    result.stage1.len(),
                    result.stage2.len()
                );
                let mut controller = ReplayController::new(result, timing, fx);
                controller.start();
                Self {
                    view: HostView::Replay,
                    controller: Some(controller),
                    navigator,
                    navigated: false,
                    unmounted: false,
                }
            }
            Err(e) => {
                warn!("replay for draw {draw_id} unavailable: {e}");
                Self {
                    view: HostView::Unavailable(e.to_string()),
                    controller: None,
                    navigator,
                    navigated: false,
                    unmounted: false,
                }
            }
        }
    }

    pub fn view(&self) -> &HostView {
        &self.view
    }

    pub fn controller(&self) -> Option<&ReplayController> {
        self.controller.as_ref()
    }

    pub fn standings(&self) -> Option<FinalStandings> {
        self.controller.as_ref().and_then(|c| c.standings())
    }

    /// Forward wall time into the replay and fire the one-shot summary
    /// navigation when it completes
    pub fn tick(&mut self, dt_ms: f64) {
        if self.unmounted {
            return;
        }
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        controller.advance(dt_ms);
        self.check_victory();
    }

    pub fn pause(&mut self) {
        if let Some(c) = self.controller.as_mut() {
            c.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(c) = self.controller.as_mut() {
            c.resume();
        }
    }

    pub fn reveal(&mut self, index: usize) -> bool {
        match self.controller.as_mut() {
            Some(c) => c.reveal(index),
            None => false,
        }
    }

    pub fn reveal_remaining(&mut self) {
        if let Some(c) = self.controller.as_mut() {
            c.reveal_remaining();
        }
    }

    pub fn skip_to_end(&mut self) {
        if self.unmounted {
            return;
        }
        if let Some(c) = self.controller.as_mut() {
            c.skip_to_end();
        }
        self.check_victory();
    }

    /// Permanent: tears the controller down. Every call after this is a
    /// no-op, including ticks already in flight on the embedding side.
    pub fn unmount(&mut self) {
        if self.unmounted {
            return;
        }
        self.unmounted = true;
        if let Some(c) = self.controller.as_mut() {
            c.teardown();
        }
    }

    fn check_victory(&mut self) {
        let Some(controller) = self.controller.as_ref() else {
            return;
        };
        if controller.phase() != ReplayPhase::Victory || self.navigated {
            return;
        }
        self.navigated = true;
        self.view = HostView::Summary;
        if let Some(standings) = controller.standings() {
            self.navigator.go_to_summary(&standings);
        }
    }
}
