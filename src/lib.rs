//! Whack-A-Monkey: an augmented-reality whack-a-mole game played with ArUco markers.
//!
//! A camera watches a set of printed fiducial markers. One of them carries a
//! virtual monkey; the player catches it by covering that marker with a hand
//! before the monkey runs away. Covering any other marker costs a penalty,
//! and letting too many monkeys escape ends the game.
//!
//! The pipeline for every frame is:
//! 1. Marker detection to find the visible marker ids
//! 2. Presence tracking to turn disappearances into touch events
//! 3. Scoring of hits, wrong touches and misses
//! 4. The game state machine moving the monkey when its time runs out
//! 5. Rendering the monkey over its marker
//!
//! # Examples
//!
//! ## Driving the state machine directly
//!
//! ```no_run
//! use std::collections::BTreeSet;
//! use std::time::{Duration, Instant};
//! use rand::{rngs::StdRng, SeedableRng};
//! use whack_a_monkey::{config::GameConfig, game::{Game, SessionCommand}, target::MarkerId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = GameConfig::default().to_settings()?;
//! let mut game = Game::new(settings, StdRng::seed_from_u64(7))?;
//!
//! let start = Instant::now();
//! game.handle_command(SessionCommand::Begin, start)?;
//!
//! let visible: BTreeSet<MarkerId> = [1, 6, 3, 4].into_iter().map(MarkerId).collect();
//! let outcome = game.process_frame(start + Duration::from_secs(6), &visible)?;
//! for event in outcome.events {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Presence tracking
//!
//! ```
//! use std::collections::BTreeSet;
//! use whack_a_monkey::{presence::PresenceTracker, target::MarkerId};
//!
//! let mut tracker = PresenceTracker::new(vec![MarkerId(1), MarkerId(2)], 4);
//! let both: BTreeSet<MarkerId> = [MarkerId(1), MarkerId(2)].into_iter().collect();
//! let only_two: BTreeSet<MarkerId> = [MarkerId(2)].into_iter().collect();
//!
//! tracker.record_and_find_vanished(&both);
//! tracker.record_and_find_vanished(&both);
//! assert_eq!(tracker.record_and_find_vanished(&only_two), vec![MarkerId(1)]);
//! ```

/// Main application module
pub mod app;

/// Configuration management
pub mod config;

/// Constants used throughout the application
pub mod constants;

/// Error types and result handling
pub mod error;

/// Game state machine
pub mod game;

/// Marker presence tracking for touch detection
pub mod presence;

/// Score keeping and difficulty scaling
pub mod scoring;

/// Operator begin/abort signals
pub mod session;

/// Marker ids, targets and target selection
pub mod target;

/// Camera, marker detection and rendering collaborators
pub mod vision;

pub use error::{Error, Result};
