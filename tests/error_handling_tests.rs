//! Error handling tests for all modules

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use whack_a_monkey::{
    error::{AppError, Result},
    game::{Game, GameSettings},
    scoring::ScoringRules,
    target::{pick_new_target_id, MarkerId},
};

fn single_id_settings() -> GameSettings {
    GameSettings {
        tracked_ids: vec![MarkerId(1)],
        past: 10,
        preparation_delay: std::time::Duration::ZERO,
        scoring: ScoringRules {
            chances: 3,
            difficulty_thresholds: vec![5, 10],
            penalty_strength: 1.0,
            initial_lifetime: std::time::Duration::from_secs(10),
        },
    }
}

#[test]
fn test_single_marker_universe_rejected_at_startup() {
    let result = Game::new(single_id_settings(), StdRng::seed_from_u64(0));
    match result {
        Err(AppError::ConfigError(msg)) => assert!(msg.contains("two tracked ids")),
        Err(other) => panic!("Expected ConfigError, got {other}"),
        Ok(_) => panic!("Expected ConfigError"),
    }
}

#[test]
fn test_target_selection_error() {
    let mut rng = StdRng::seed_from_u64(0);
    let result = pick_new_target_id(Some(MarkerId(1)), &[MarkerId(1)], &mut rng);
    match result {
        Err(AppError::TargetSelection(msg)) => assert!(msg.contains('1')),
        other => panic!("Expected TargetSelection, got {other:?}"),
    }
}

#[test]
fn test_begin_outside_idle_is_state_error() {
    let settings = GameSettings {
        tracked_ids: vec![MarkerId(1), MarkerId(2)],
        ..single_id_settings()
    };
    let mut game = Game::new(settings, StdRng::seed_from_u64(0)).unwrap();
    let now = Instant::now();
    game.begin_session(now).unwrap();
    assert!(matches!(game.begin_session(now), Err(AppError::SessionState(_))));
}

#[test]
fn test_error_display_formatting() {
    let errors = vec![
        AppError::InvalidInput("Test input error".to_string()),
        AppError::ConfigError("Test config error".to_string()),
        AppError::FrameCapture("Test capture error".to_string()),
        AppError::TargetSelection("Test selection error".to_string()),
        AppError::SessionState("Test state error".to_string()),
    ];

    for error in errors {
        let display = format!("{}", error);
        assert!(!display.is_empty());
        assert!(display.contains("Test"));
    }

    assert_eq!(
        AppError::MissingMarker(MarkerId(4)).to_string(),
        "Setup failed: marker 4 was not detected"
    );
}

#[test]
fn test_concurrent_error_handling() {
    use std::sync::Arc;
    use std::thread;

    // Test thread safety of error types
    let error = Arc::new(AppError::MissingMarker(MarkerId(6)));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let error_clone = Arc::clone(&error);
            thread::spawn(move || {
                let msg = format!("{}", error_clone);
                assert!(msg.contains("marker 6"));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_io_error_conversion() {
    fn read() -> Result<String> {
        Ok(std::fs::read_to_string("/definitely/not/here.yaml")?)
    }
    assert!(matches!(read(), Err(AppError::Io(_))));
}
