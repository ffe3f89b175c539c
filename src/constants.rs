//! Constants used throughout the application

use std::time::Duration;

/// Default presence window, in frames
pub const DEFAULT_PAST: usize = 10;

/// Default target lifetime, in seconds
pub const DEFAULT_MONKEY_VISIBLE_SECS: f64 = 10.0;

/// Default hit count at which the lifetime is halved the first time
pub const DEFAULT_LEVEL2: u32 = 5;

/// Default hit count at which the lifetime is halved the second time
pub const DEFAULT_LEVEL3: u32 = 10;

/// Default number of misses tolerated before the game ends
pub const DEFAULT_CHANCES: u32 = 3;

/// Default display multiplier for penalties
pub const DEFAULT_PENALTY_STRENGTH: f64 = 1.0;

/// Default pause between the begin signal and the first target, in seconds
pub const DEFAULT_PREPARATION_DELAY_SECS: f64 = 5.0;

/// Default number of capture attempts per frame
pub const DEFAULT_CAPTURE_RETRIES: u32 = 3;

/// Default number of frames inspected by setup verification
pub const DEFAULT_SETUP_FRAMES: usize = 2;

/// Default tracked marker ids
pub const DEFAULT_TRACKED_IDS: [u32; 4] = [1, 6, 3, 4];

/// Default window title
pub const DEFAULT_WINDOW_TITLE: &str = "Whack-A-Monkey";

/// Upper bound for the monkey lifetime and the preparation delay
pub const MAX_SETTING_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Pause between failed capture attempts
pub const CAPTURE_RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Key codes returned by `highgui::wait_key`
pub const KEY_ESCAPE: i32 = 27;
pub const KEY_ENTER: i32 = 13;
pub const KEY_SPACE: i32 = 32;
pub const KEY_Q: i32 = b'q' as i32;
