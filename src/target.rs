//! Marker identities, the active target and target selection.

use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Identity of an ArUco marker in the tracked set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub u32);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MarkerId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<i32> for MarkerId {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        u32::try_from(value)
            .map(Self)
            .map_err(|_| Error::InvalidInput(format!("Negative marker id: {value}")))
    }
}

/// The marker the player has to occlude (the "monkey")
///
/// A target is never mutated in place: catching it produces a new value via
/// [`Target::caught`], so readers always see a whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    /// Marker carrying the monkey
    pub id: MarkerId,
    /// How long the monkey stays before running away
    pub lifetime: Duration,
    /// Whether the player already caught this monkey
    pub is_caught: bool,
    /// When the monkey appeared
    pub arrived_at: Instant,
}

impl Target {
    /// Create a fresh, uncaught target
    #[must_use]
    pub fn new(id: MarkerId, lifetime: Duration, arrived_at: Instant) -> Self {
        Self {
            id,
            lifetime,
            is_caught: false,
            arrived_at,
        }
    }

    /// Copy of this target marked as caught
    #[must_use]
    pub fn caught(self) -> Self {
        Self {
            is_caught: true,
            ..self
        }
    }

    /// Time spent on screen so far, zero while the target has not arrived yet
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.arrived_at)
    }

    /// Whether the target's lifetime ran out
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.lifetime
    }

    /// Whether the target is on screen yet (it may be scheduled after a preparation delay)
    #[must_use]
    pub fn has_arrived(&self, now: Instant) -> bool {
        now >= self.arrived_at
    }
}

/// Pick a target id uniformly at random, never returning `excluding`
///
/// # Errors
///
/// Returns [`Error::TargetSelection`] if the universe is empty or if the only
/// candidate is the excluded id.
pub fn pick_new_target_id<R: Rng + ?Sized>(
    excluding: Option<MarkerId>,
    universe: &[MarkerId],
    rng: &mut R,
) -> Result<MarkerId> {
    let candidates: Vec<MarkerId> = universe
        .iter()
        .copied()
        .filter(|id| Some(*id) != excluding)
        .collect();

    candidates.choose(rng).copied().ok_or_else(|| {
        Error::TargetSelection(match excluding {
            Some(id) => format!("no marker other than {id} is tracked"),
            None => "no markers are tracked".to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ids(raw: &[u32]) -> Vec<MarkerId> {
        raw.iter().copied().map(MarkerId).collect()
    }

    #[test]
    fn test_pick_excludes_current() {
        let universe = ids(&[1, 6, 3, 4]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let id = pick_new_target_id(Some(MarkerId(6)), &universe, &mut rng).unwrap();
            assert_ne!(id, MarkerId(6));
            assert!(universe.contains(&id));
        }
    }

    #[test]
    fn test_pick_two_ids_alternates() {
        let universe = ids(&[1, 2]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            pick_new_target_id(Some(MarkerId(1)), &universe, &mut rng).unwrap(),
            MarkerId(2)
        );
    }

    #[test]
    fn test_pick_single_id_is_an_error() {
        let universe = ids(&[5]);
        let mut rng = StdRng::seed_from_u64(3);
        let result = pick_new_target_id(Some(MarkerId(5)), &universe, &mut rng);
        assert!(matches!(result, Err(Error::TargetSelection(_))));

        // Without an exclusion the single id is still a valid first target
        assert_eq!(pick_new_target_id(None, &universe, &mut rng).unwrap(), MarkerId(5));
    }

    #[test]
    fn test_pick_empty_universe() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(pick_new_target_id(None, &[], &mut rng).is_err());
    }

    #[test]
    fn test_target_lifecycle() {
        let start = Instant::now();
        let target = Target::new(MarkerId(3), Duration::from_secs(10), start);
        assert!(!target.is_caught);
        assert!(!target.is_expired(start + Duration::from_secs(9)));
        assert!(target.is_expired(start + Duration::from_secs(10)));

        let caught = target.caught();
        assert!(caught.is_caught);
        assert_eq!(caught.id, target.id);
        assert_eq!(caught.arrived_at, target.arrived_at);
    }

    #[test]
    fn test_scheduled_target_has_not_arrived() {
        let now = Instant::now();
        let target = Target::new(MarkerId(1), Duration::from_secs(1), now + Duration::from_secs(5));
        assert!(!target.has_arrived(now));
        assert_eq!(target.elapsed(now), Duration::ZERO);
        assert!(!target.is_expired(now));
    }

    #[test]
    fn test_marker_id_from_negative() {
        assert!(MarkerId::try_from(-1).is_err());
        assert_eq!(MarkerId::try_from(42).unwrap(), MarkerId(42));
    }

    proptest! {
        #[test]
        fn prop_pick_never_returns_excluded(
            raw in proptest::collection::btree_set(0u32..50, 2..10),
            seed in any::<u64>(),
        ) {
            let universe: Vec<MarkerId> = raw.into_iter().map(MarkerId).collect();
            let excluded = universe[0];
            let mut rng = StdRng::seed_from_u64(seed);
            let id = pick_new_target_id(Some(excluded), &universe, &mut rng).unwrap();
            prop_assert_ne!(id, excluded);
            prop_assert!(universe.contains(&id));
        }
    }
}
