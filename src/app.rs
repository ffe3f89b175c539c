//! Main application module: setup verification and the frame loop.

use crate::{
    config::Config,
    constants::CAPTURE_RETRY_BACKOFF,
    error::{Error, Result},
    game::{EndReason, Game, GameEvent, GamePhase},
    scoring::FinalReport,
    session::SessionControl,
    target::MarkerId,
    vision::{Detection, FrameSource, Hud, MarkerDetector, RenderSink},
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Source of the current time for deadline checks
pub trait Clock {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// How a finished session went
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    /// Why the session ended
    pub reason: EndReason,
    /// Final score, absent if the session was aborted before it began
    pub report: Option<FinalReport>,
    /// Frames processed by the loop
    pub frames: u64,
}

/// Main application struct
pub struct WhackApp<S, D, R, G = StdRng, C = SystemClock>
where
    S: FrameSource,
    D: MarkerDetector<S::Frame>,
    R: RenderSink<S::Frame>,
    G: Rng,
    C: Clock,
{
    source: S,
    detector: D,
    renderer: R,
    game: Game<G>,
    control: SessionControl,
    clock: C,
    capture_retries: u32,
    setup_frames: usize,
    retry_backoff: Duration,
}

impl<S, D, R, G, C> WhackApp<S, D, R, G, C>
where
    S: FrameSource,
    D: MarkerDetector<S::Frame>,
    R: RenderSink<S::Frame>,
    G: Rng,
    C: Clock,
{
    /// Create the application from its collaborators
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: &Config,
        source: S,
        detector: D,
        renderer: R,
        control: SessionControl,
        rng: G,
        clock: C,
    ) -> Result<Self> {
        info!("Initializing Whack-A-Monkey application");
        config.validate()?;
        let game = Game::new(config.game.to_settings()?, rng)?;

        Ok(Self {
            source,
            detector,
            renderer,
            game,
            control,
            clock,
            capture_retries: config.camera.capture_retries,
            setup_frames: config.camera.setup_frames,
            retry_backoff: CAPTURE_RETRY_BACKOFF,
        })
    }

    /// Override the pause between failed capture attempts
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Check that every tracked marker is in view before playing
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingMarker`] naming the first tracked id not seen in
    /// any of the inspected frames, or a capture error.
    pub fn verify_setup(&mut self) -> Result<()> {
        info!("Verifying marker setup over {} frames", self.setup_frames);
        let mut seen = BTreeSet::new();
        for _ in 0..self.setup_frames {
            let frame = self.pull_frame()?;
            seen.extend(self.detector.detect(&frame)?.into_iter().map(|d| d.id));
        }

        if let Some(missing) = self
            .game
            .settings()
            .tracked_ids
            .iter()
            .find(|id| !seen.contains(*id))
        {
            return Err(Error::MissingMarker(*missing));
        }

        info!("All {} markers detected", self.game.settings().tracked_ids.len());
        Ok(())
    }

    /// Run the frame loop until the session ends
    ///
    /// # Errors
    ///
    /// Returns an error if capture keeps failing, detection or rendering fails,
    /// or a new target cannot be chosen.
    pub fn run(&mut self) -> Result<SessionSummary> {
        info!("Starting main game loop");
        let mut frames = 0u64;

        loop {
            let now = self.clock.now();
            for command in self.control.drain() {
                let events = self.game.handle_command(command, now)?;
                log_events(&events);
            }
            if self.game.phase() == GamePhase::Ended {
                break;
            }

            let frame = self.pull_frame()?;
            let detections = self.detector.detect(&frame)?;
            let visible = self.visible_ids(&detections);

            let now = self.clock.now();
            let outcome = self.game.process_frame(now, &visible)?;
            log_events(&outcome.events);
            frames += 1;
            if outcome.ended_session() {
                break;
            }

            let hud = self.hud(now);
            self.renderer
                .render(&frame, self.game.visible_target(now), &detections, &hud)?;
        }

        let reason = self
            .game
            .end_reason()
            .ok_or_else(|| Error::SessionState("loop exited before the session ended".to_string()))?;
        info!("Session over ({:?}) after {} frames", reason, frames);
        Ok(SessionSummary {
            reason,
            report: self.game.final_report(),
            frames,
        })
    }

    fn pull_frame(&mut self) -> Result<S::Frame> {
        let mut attempt = 1;
        loop {
            match self.source.next_frame() {
                Ok(frame) => return Ok(frame),
                Err(e) if attempt < self.capture_retries => {
                    warn!(
                        "Failed to read frame (attempt {}/{}): {}, retrying...",
                        attempt, self.capture_retries, e
                    );
                    attempt += 1;
                    if !self.retry_backoff.is_zero() {
                        std::thread::sleep(self.retry_backoff);
                    }
                }
                Err(e) => {
                    return Err(Error::FrameCapture(format!(
                        "giving up after {} attempts: {}",
                        self.capture_retries, e
                    )))
                }
            }
        }
    }

    fn visible_ids(&self, detections: &[Detection]) -> BTreeSet<MarkerId> {
        let tracked = &self.game.settings().tracked_ids;
        detections
            .iter()
            .map(|d| d.id)
            .filter(|id| {
                let known = tracked.contains(id);
                if !known {
                    debug!("Ignoring untracked marker {}", id);
                }
                known
            })
            .collect()
    }

    fn hud(&self, now: Instant) -> Hud {
        let time_left = self
            .game
            .target()
            .filter(|target| target.has_arrived(now))
            .map(|target| target.lifetime.saturating_sub(target.elapsed(now)));
        Hud {
            phase: self.game.phase(),
            board: self.game.board(),
            time_left,
        }
    }

    /// The game being played
    #[must_use]
    pub fn game(&self) -> &Game<G> {
        &self.game
    }
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::SessionStarted { .. } | GameEvent::SessionOver { .. } => info!("{:?}", event),
            GameEvent::TargetChanged { to, .. } => debug!("Monkey moved to marker {}", to),
            _ => debug!("{:?}", event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
