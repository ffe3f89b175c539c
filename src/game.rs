//! Game state machine: idle, active and ended phases.
//!
//! The game is driven entirely from the outside: session commands arrive via
//! [`Game::handle_command`] and every camera frame is fed to
//! [`Game::process_frame`] along with the set of detected marker ids and the
//! current time. Deadlines are checked against that time; nothing here blocks.

use crate::{
    constants::MAX_SETTING_DURATION,
    presence::PresenceTracker,
    scoring::{FinalReport, ScoreBoard, ScoringEngine, ScoringRules},
    target::{pick_new_target_id, MarkerId, Target},
    Error, Result,
};
use log::{debug, info, warn};
use rand::Rng;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Phase of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for the operator to start
    Idle,
    /// Gameplay
    Active,
    /// Terminal
    Ended,
}

/// External operator signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Start the session
    Begin,
    /// Stop the session immediately
    Abort,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// More monkeys ran away than the allowance permits
    MissesExhausted,
    /// The operator aborted the session
    Aborted,
}

/// Something that happened while handling a command or a frame
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// The session started; the first monkey appears after the preparation delay
    SessionStarted {
        /// Marker of the first monkey
        first_target: MarkerId,
        /// Delay before it appears
        arrives_in: Duration,
    },
    /// The target marker was occluded in time
    Hit(MarkerId),
    /// A marker other than the target was occluded
    WrongTouch(MarkerId),
    /// The target's lifetime ran out before it was caught
    Missed(MarkerId),
    /// A new monkey replaced the previous one
    TargetChanged {
        /// Previous marker
        from: MarkerId,
        /// New marker
        to: MarkerId,
    },
    /// The target lifetime was halved
    DifficultyRaised(Duration),
    /// The session reached its terminal phase
    SessionOver {
        /// Why it ended
        reason: EndReason,
        /// Final score, absent if the session never started
        report: Option<FinalReport>,
    },
}

/// Events produced by one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    /// Events in the order they happened
    pub events: Vec<GameEvent>,
}

impl FrameOutcome {
    /// Whether this frame ended the session
    #[must_use]
    pub fn ended_session(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, GameEvent::SessionOver { .. }))
    }
}

/// Tunables the state machine needs
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    /// Marker ids that can carry the monkey
    pub tracked_ids: Vec<MarkerId>,
    /// Presence window, in frames
    pub past: usize,
    /// Delay between the begin signal and the first monkey
    pub preparation_delay: Duration,
    /// Scoring and difficulty rules
    pub scoring: ScoringRules,
}

impl GameSettings {
    /// Check the settings can drive a game
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for fewer than two distinct ids, duplicate
    /// ids, a presence window shorter than two frames, or a lifetime or
    /// preparation delay that is zero or longer than [`MAX_SETTING_DURATION`].
    pub fn validate(&self) -> Result<()> {
        let distinct: BTreeSet<MarkerId> = self.tracked_ids.iter().copied().collect();
        if distinct.len() != self.tracked_ids.len() {
            return Err(Error::ConfigError("Tracked ids must be distinct".to_string()));
        }
        if distinct.len() < 2 {
            return Err(Error::ConfigError(
                "At least two tracked ids are required so a new monkey can always move".to_string(),
            ));
        }
        if self.past < 2 {
            return Err(Error::ConfigError(
                "Presence window must be at least 2 frames".to_string(),
            ));
        }
        if self.scoring.initial_lifetime.is_zero() {
            return Err(Error::ConfigError(
                "Monkey lifetime must be greater than 0".to_string(),
            ));
        }
        if self.scoring.initial_lifetime > MAX_SETTING_DURATION {
            return Err(Error::ConfigError(format!(
                "Monkey lifetime must not exceed {}s",
                MAX_SETTING_DURATION.as_secs()
            )));
        }
        if self.preparation_delay > MAX_SETTING_DURATION {
            return Err(Error::ConfigError(format!(
                "Preparation delay must not exceed {}s",
                MAX_SETTING_DURATION.as_secs()
            )));
        }
        Ok(())
    }
}

/// Whack-a-monkey state machine
pub struct Game<R: Rng> {
    settings: GameSettings,
    phase: GamePhase,
    target: Option<Target>,
    tracker: PresenceTracker,
    scoring: Option<ScoringEngine>,
    end_reason: Option<EndReason>,
    rng: R,
}

impl<R: Rng> Game<R> {
    /// Create an idle game
    ///
    /// # Errors
    ///
    /// Returns an error if the settings fail [`GameSettings::validate`].
    pub fn new(settings: GameSettings, rng: R) -> Result<Self> {
        settings.validate()?;
        let tracker = PresenceTracker::new(settings.tracked_ids.clone(), settings.past);
        Ok(Self {
            settings,
            phase: GamePhase::Idle,
            target: None,
            tracker,
            scoring: None,
            end_reason: None,
            rng,
        })
    }

    /// Apply an operator command
    ///
    /// Commands that make no sense in the current phase are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if starting the session fails.
    pub fn handle_command(&mut self, command: SessionCommand, now: Instant) -> Result<Vec<GameEvent>> {
        match (command, self.phase) {
            (SessionCommand::Begin, GamePhase::Idle) => Ok(vec![self.begin_session(now)?]),
            (SessionCommand::Abort, GamePhase::Idle | GamePhase::Active) => Ok(vec![self.abort_session()]),
            (command, phase) => {
                warn!("Ignoring {:?} while {:?}", command, phase);
                Ok(Vec::new())
            }
        }
    }

    /// Move from idle to active, scheduling the first monkey
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionState`] if the game is not idle.
    pub fn begin_session(&mut self, now: Instant) -> Result<GameEvent> {
        if self.phase != GamePhase::Idle {
            return Err(Error::SessionState(format!(
                "cannot begin a session while {:?}",
                self.phase
            )));
        }

        let scoring = ScoringEngine::new(self.settings.scoring.clone());
        self.tracker.reset();

        let first = pick_new_target_id(None, self.tracker.tracked(), &mut self.rng)?;
        let arrives_in = self.settings.preparation_delay;
        let arrived_at = now.checked_add(arrives_in).ok_or_else(|| {
            Error::ConfigError(format!(
                "preparation delay of {:.1}s is out of range",
                arrives_in.as_secs_f64()
            ))
        })?;
        self.target = Some(Target::new(first, scoring.lifetime(), arrived_at));
        self.scoring = Some(scoring);
        self.phase = GamePhase::Active;

        info!(
            "Starting session in {:.1}s, first monkey on marker {}",
            arrives_in.as_secs_f64(),
            first
        );
        Ok(GameEvent::SessionStarted {
            first_target: first,
            arrives_in,
        })
    }

    /// End the session on operator request
    pub fn abort_session(&mut self) -> GameEvent {
        info!("Session aborted by operator");
        self.finish(EndReason::Aborted)
    }

    /// Process one frame's detections
    ///
    /// # Errors
    ///
    /// Returns an error if a new target cannot be selected.
    pub fn process_frame(&mut self, now: Instant, visible: &BTreeSet<MarkerId>) -> Result<FrameOutcome> {
        let mut outcome = FrameOutcome::default();
        if self.phase != GamePhase::Active {
            debug!("Frame ignored while {:?}", self.phase);
            return Ok(outcome);
        }

        let Some(target) = self.target else {
            return Err(Error::SessionState("active session has no target".to_string()));
        };
        if !target.has_arrived(now) {
            return Ok(outcome);
        }

        if !target.is_caught {
            self.check_touches(target, visible, &mut outcome.events);
        }

        if let Some(target) = self.target {
            if target.is_expired(now) {
                self.advance_target(target, now, &mut outcome.events)?;
            }
        }

        Ok(outcome)
    }

    fn check_touches(&mut self, target: Target, visible: &BTreeSet<MarkerId>, events: &mut Vec<GameEvent>) {
        let vanished = self.tracker.record_and_find_vanished(visible);
        let Some(scoring) = self.scoring.as_mut() else {
            return;
        };

        for id in vanished {
            if id == target.id {
                self.target = Some(target.caught());
                scoring.on_hit();
                info!("Caught the monkey on marker {} ({} hits)", id, scoring.board().hits);
                events.push(GameEvent::Hit(id));
            } else {
                scoring.on_wrong_touch();
                debug!("Wrong marker {} touched ({} penalties)", id, scoring.board().penalties);
                events.push(GameEvent::WrongTouch(id));
            }
        }
    }

    fn advance_target(&mut self, target: Target, now: Instant, events: &mut Vec<GameEvent>) -> Result<()> {
        let Some(scoring) = self.scoring.as_mut() else {
            return Err(Error::SessionState("active session has no scoreboard".to_string()));
        };

        if !target.is_caught {
            info!("The monkey on marker {} ran away", target.id);
            events.push(GameEvent::Missed(target.id));
            if scoring.on_missed() {
                events.push(self.finish(EndReason::MissesExhausted));
                return Ok(());
            }
        }

        let hits = scoring.board().hits;
        if let Some(lifetime) = scoring.maybe_scale_difficulty(hits) {
            events.push(GameEvent::DifficultyRaised(lifetime));
        }

        let next = pick_new_target_id(Some(target.id), self.tracker.tracked(), &mut self.rng)?;
        self.target = Some(Target::new(next, scoring.lifetime(), now));
        info!("Changed monkey id to {}", next);
        events.push(GameEvent::TargetChanged {
            from: target.id,
            to: next,
        });
        Ok(())
    }

    fn finish(&mut self, reason: EndReason) -> GameEvent {
        self.phase = GamePhase::Ended;
        self.target = None;
        self.end_reason = Some(reason);
        GameEvent::SessionOver {
            reason,
            report: self.final_report(),
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Current target, including one scheduled but not yet arrived
    #[must_use]
    pub fn target(&self) -> Option<Target> {
        self.target
    }

    /// Marker the monkey should be drawn on at `now`, if any
    #[must_use]
    pub fn visible_target(&self, now: Instant) -> Option<MarkerId> {
        self.target
            .filter(|target| self.phase == GamePhase::Active && target.has_arrived(now))
            .map(|target| target.id)
    }

    /// Current scoreboard, once a session has started
    #[must_use]
    pub fn board(&self) -> Option<ScoreBoard> {
        self.scoring.as_ref().map(ScoringEngine::board)
    }

    /// Final report, once a session has started
    #[must_use]
    pub fn final_report(&self) -> Option<FinalReport> {
        self.scoring.as_ref().map(ScoringEngine::final_report)
    }

    /// Why the session ended, if it has
    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Settings the game was built with
    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }
}
