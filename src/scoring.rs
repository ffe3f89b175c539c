//! Score keeping, difficulty scaling and the end-of-game condition.

use log::info;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Per-session counters
///
/// Fields only ever grow. Every update replaces the whole record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBoard {
    /// Monkeys caught
    pub hits: u32,
    /// Wrong markers touched
    pub penalties: u32,
    /// Monkeys that ran away
    pub missed: u32,
}

/// Scoring rules for one session
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringRules {
    /// Misses tolerated; one more ends the session
    pub chances: u32,
    /// Hit counts at which the target lifetime is halved
    pub difficulty_thresholds: Vec<u32>,
    /// Multiplier applied to penalties in the final report only
    pub penalty_strength: f64,
    /// Target lifetime at the start of the session
    pub initial_lifetime: Duration,
}

/// Summary printed when a session ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalReport {
    /// Monkeys caught
    pub hits: u32,
    /// Raw wrong-touch count
    pub penalties: u32,
    /// Penalties multiplied by the configured strength
    pub weighted_penalties: f64,
    /// Monkeys that ran away
    pub missed: u32,
    /// Target lifetime when the session ended
    pub final_lifetime: Duration,
}

impl fmt::Display for FinalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*********************************")?;
        writeln!(f, "* Monkeys caught:\t{}\t*", self.hits)?;
        writeln!(f, "* Penalties:\t\t{}\t*", self.weighted_penalties)?;
        writeln!(f, "* Monkeys missed:\t{}\t*", self.missed)?;
        writeln!(f, "*********************************")?;
        write!(f, "time: {:.2}s", self.final_lifetime.as_secs_f64())
    }
}

/// Scoring engine owning the scoreboard and the current target lifetime
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    rules: ScoringRules,
    board: ScoreBoard,
    lifetime: Duration,
    triggered: BTreeSet<u32>,
    session_over: bool,
}

impl ScoringEngine {
    /// Create a scoring engine with a zeroed scoreboard
    #[must_use]
    pub fn new(rules: ScoringRules) -> Self {
        let lifetime = rules.initial_lifetime;
        Self {
            rules,
            board: ScoreBoard::default(),
            lifetime,
            triggered: BTreeSet::new(),
            session_over: false,
        }
    }

    /// Record a caught monkey
    pub fn on_hit(&mut self) {
        self.board = ScoreBoard {
            hits: self.board.hits + 1,
            ..self.board
        };
    }

    /// Record a touch on a marker that was not the target
    pub fn on_wrong_touch(&mut self) {
        self.board = ScoreBoard {
            penalties: self.board.penalties + 1,
            ..self.board
        };
    }

    /// Record a monkey that ran away
    ///
    /// Returns `true` exactly once: on the miss that exceeds the allowance.
    pub fn on_missed(&mut self) -> bool {
        self.board = ScoreBoard {
            missed: self.board.missed + 1,
            ..self.board
        };

        if self.board.missed > self.rules.chances && !self.session_over {
            self.session_over = true;
            return true;
        }
        false
    }

    /// Halve the lifetime if `current_hits` sits on a threshold not yet used
    ///
    /// Returns the new lifetime when scaling happened.
    pub fn maybe_scale_difficulty(&mut self, current_hits: u32) -> Option<Duration> {
        if !self.rules.difficulty_thresholds.contains(&current_hits) {
            return None;
        }
        if !self.triggered.insert(current_hits) {
            return None;
        }

        self.lifetime /= 2;
        info!(
            "Difficulty raised at {} hits: monkeys now stay {:.2}s",
            current_hits,
            self.lifetime.as_secs_f64()
        );
        Some(self.lifetime)
    }

    /// Current scoreboard
    #[must_use]
    pub fn board(&self) -> ScoreBoard {
        self.board
    }

    /// Lifetime given to the next target
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Whether the miss allowance has been exceeded
    #[must_use]
    pub fn is_session_over(&self) -> bool {
        self.session_over
    }

    /// Build the end-of-session report
    #[must_use]
    pub fn final_report(&self) -> FinalReport {
        FinalReport {
            hits: self.board.hits,
            penalties: self.board.penalties,
            weighted_penalties: f64::from(self.board.penalties) * self.rules.penalty_strength,
            missed: self.board.missed,
            final_lifetime: self.lifetime,
        }
    }
}
