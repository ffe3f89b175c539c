//! Configuration management for the whack-a-monkey game

use crate::{
    constants::{
        DEFAULT_CAPTURE_RETRIES, DEFAULT_CHANCES, DEFAULT_LEVEL2, DEFAULT_LEVEL3, DEFAULT_MONKEY_VISIBLE_SECS,
        DEFAULT_PAST, DEFAULT_PENALTY_STRENGTH, DEFAULT_PREPARATION_DELAY_SECS, DEFAULT_SETUP_FRAMES,
        DEFAULT_TRACKED_IDS, DEFAULT_WINDOW_TITLE,
    },
    game::GameSettings,
    scoring::ScoringRules,
    target::MarkerId,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gameplay configuration
    pub game: GameConfig,

    /// Camera configuration
    pub camera: CameraConfig,

    /// Marker detection configuration
    pub markers: MarkerConfig,

    /// Display configuration
    pub display: DisplayConfig,
}

/// Gameplay tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Marker ids that can carry the monkey
    pub tracked_ids: Vec<MarkerId>,

    /// Presence window, in frames
    pub past: usize,

    /// Seconds a monkey stays before running away
    pub monkey_visible: f64,

    /// Hit count for the first difficulty step
    pub level2: u32,

    /// Hit count for the second difficulty step
    pub level3: u32,

    /// Misses tolerated before the game ends
    pub chances: u32,

    /// Display multiplier for penalties
    pub penalty_strength: f64,

    /// Seconds between the begin signal and the first monkey
    pub preparation_delay: f64,
}

/// Camera parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera index (0 for the built-in webcam)
    pub index: i32,

    /// Capture attempts per frame before giving up
    pub capture_retries: u32,

    /// Frames inspected when verifying that every marker is visible
    pub setup_frames: usize,
}

/// Marker detection parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// ArUco dictionary the printed markers come from
    pub dictionary: MarkerDictionary,
}

/// Supported ArUco predefined dictionaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerDictionary {
    /// 4x4 bits, 50 markers
    #[serde(rename = "4x4_50")]
    Dict4x4_50,
    /// 4x4 bits, 250 markers
    #[serde(rename = "4x4_250")]
    Dict4x4_250,
    /// 5x5 bits, 50 markers
    #[serde(rename = "5x5_50")]
    Dict5x5_50,
    /// 5x5 bits, 250 markers
    #[default]
    #[serde(rename = "5x5_250")]
    Dict5x5_250,
    /// 6x6 bits, 250 markers
    #[serde(rename = "6x6_250")]
    Dict6x6_250,
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show the camera window
    pub enabled: bool,

    /// Window title
    pub window_title: String,

    /// Outline every detected marker, not only the monkey's
    pub draw_all_markers: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tracked_ids: DEFAULT_TRACKED_IDS.iter().copied().map(MarkerId).collect(),
            past: DEFAULT_PAST,
            monkey_visible: DEFAULT_MONKEY_VISIBLE_SECS,
            level2: DEFAULT_LEVEL2,
            level3: DEFAULT_LEVEL3,
            chances: DEFAULT_CHANCES,
            penalty_strength: DEFAULT_PENALTY_STRENGTH,
            preparation_delay: DEFAULT_PREPARATION_DELAY_SECS,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            capture_retries: DEFAULT_CAPTURE_RETRIES,
            setup_frames: DEFAULT_SETUP_FRAMES,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_title: DEFAULT_WINDOW_TITLE.to_string(),
            draw_all_markers: false,
        }
    }
}

impl GameConfig {
    /// Target lifetime as a duration
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative or not finite.
    pub fn monkey_visible(&self) -> Result<Duration> {
        seconds("monkey_visible", self.monkey_visible)
    }

    /// Preparation delay as a duration
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative or not finite.
    pub fn preparation_delay(&self) -> Result<Duration> {
        seconds("preparation_delay", self.preparation_delay)
    }

    /// Build the state machine settings
    ///
    /// # Errors
    ///
    /// Returns an error if a duration field is invalid.
    pub fn to_settings(&self) -> Result<GameSettings> {
        Ok(GameSettings {
            tracked_ids: self.tracked_ids.clone(),
            past: self.past,
            preparation_delay: self.preparation_delay()?,
            scoring: ScoringRules {
                chances: self.chances,
                difficulty_thresholds: vec![self.level2, self.level3],
                penalty_strength: self.penalty_strength,
                initial_lifetime: self.monkey_visible()?,
            },
        })
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| Error::ConfigError(format!("{name} must be a non-negative number of seconds: {e}")))
}

impl Config {
    /// Load configuration from a YAML (or JSON) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.game.to_settings()?.validate()?;

        if !self.game.penalty_strength.is_finite() {
            return Err(Error::ConfigError("penalty_strength must be finite".to_string()));
        }
        if self.game.level2 == self.game.level3 {
            log::warn!(
                "level2 and level3 are both {}; the lifetime will only be halved once",
                self.game.level2
            );
        }

        if self.camera.capture_retries == 0 {
            return Err(Error::ConfigError(
                "capture_retries must be greater than 0".to_string(),
            ));
        }
        if self.camera.setup_frames == 0 {
            return Err(Error::ConfigError("setup_frames must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Whack-A-Monkey Configuration

# Gameplay
game:
  tracked_ids: [1, 6, 3, 4]
  past: 10
  monkey_visible: 10.0
  level2: 5
  level3: 10
  chances: 3
  penalty_strength: 1.0
  preparation_delay: 5.0

# Camera
camera:
  index: 0
  capture_retries: 3
  setup_frames: 2

# Marker detection
markers:
  dictionary: "5x5_250"

# Display settings
display:
  enabled: true
  window_title: "Whack-A-Monkey"
  draw_all_markers: false
"#;
