//! Latest known position and fix throttling

use crate::bearing::distance_m;
use crate::types::{FixFilterSettings, GeoPoint};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use tokio::time::Instant;

/// Position as seen by a reader at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSnapshot {
    /// Best known position; `(0, 0)` until the first fix
    pub position: GeoPoint,
    /// Whether any fix has ever been recorded
    pub has_fix: bool,
}

/// Holds the current position and whether a fix was ever received
///
/// `has_fix` is false until the first [`record_fix`](Self::record_fix) and
/// never goes back to false. There is no staleness timeout: an old fix is
/// still a fix.
///
/// # Example
/// ```
/// use qibla_compass::{GeoPoint, LocationState};
///
/// let location = LocationState::new();
/// assert!(!location.snapshot().has_fix);
///
/// location.record_fix(GeoPoint::new(51.5074, -0.1278).unwrap());
/// assert!(location.snapshot().has_fix);
/// ```
#[derive(Debug, Default)]
pub struct LocationState {
    position: RwLock<GeoPoint>,
    has_fix: AtomicBool,
}

impl LocationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current position and mark the state as fixed
    pub fn record_fix(&self, point: GeoPoint) {
        *self
            .position
            .write()
            .unwrap_or_else(PoisonError::into_inner) = point;

        // Published after the position so a reader that sees the flag also
        // sees a recorded position
        self.has_fix.store(true, Ordering::Release);
    }

    /// Current position and fix flag; never blocks on I/O
    pub fn snapshot(&self) -> LocationSnapshot {
        let has_fix = self.has_fix.load(Ordering::Acquire);
        let position = *self
            .position
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        LocationSnapshot { position, has_fix }
    }
}

/// Drops fixes that arrive too soon or move too little
///
/// A fix passes when both the minimum interval has elapsed and the minimum
/// distance has been covered since the last fix that passed. The first fix
/// always passes.
#[derive(Debug, Clone)]
pub struct FixFilter {
    settings: FixFilterSettings,
    last_accepted: Option<(Instant, GeoPoint)>,
}

impl FixFilter {
    pub fn new(settings: FixFilterSettings) -> Self {
        Self {
            settings,
            last_accepted: None,
        }
    }

    /// Decide whether `point`, received at `now`, should be applied
    pub fn accept(&mut self, point: GeoPoint, now: Instant) -> bool {
        if let Some((at, last)) = self.last_accepted {
            if now.saturating_duration_since(at) < self.settings.min_interval() {
                return false;
            }
            if distance_m(last, point) < self.settings.min_distance_m {
                return false;
            }
        }

        self.last_accepted = Some((now, point));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(latitude, longitude).unwrap()
    }

    #[test]
    fn test_initial_snapshot() {
        let location = LocationState::new();
        let snapshot = location.snapshot();
        assert!(!snapshot.has_fix);
        assert_eq!(snapshot.position, GeoPoint::default());
    }

    #[test]
    fn test_fix_is_sticky() {
        let location = LocationState::new();
        location.record_fix(point(21.0, 39.0));
        assert!(location.snapshot().has_fix);

        for i in 0..100 {
            location.record_fix(point(i as f64 * 0.5, -(i as f64)));
            let snapshot = location.snapshot();
            assert!(snapshot.has_fix);
            assert_eq!(snapshot.position, point(i as f64 * 0.5, -(i as f64)));
        }

        // Reading never clears the flag either
        for _ in 0..10 {
            assert!(location.snapshot().has_fix);
        }
    }

    #[test]
    fn test_concurrent_fixes_are_never_torn() {
        let location = Arc::new(LocationState::new());
        let a = point(10.0, 20.0);
        let b = point(-30.0, -40.0);
        location.record_fix(a);

        let writer = {
            let location = Arc::clone(&location);
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    location.record_fix(if i % 2 == 0 { b } else { a });
                }
            })
        };

        for _ in 0..10_000 {
            let snapshot = location.snapshot();
            assert!(snapshot.has_fix);
            assert!(snapshot.position == a || snapshot.position == b);
        }

        writer.join().unwrap();
    }

    #[test]
    fn test_fix_filter_first_fix_always_passes() {
        let mut filter = FixFilter::new(FixFilterSettings {
            min_interval_ms: 60_000,
            min_distance_m: 1_000_000.0,
        });
        assert!(filter.accept(point(0.0, 0.0), Instant::now()));
    }

    #[test]
    fn test_fix_filter_interval() {
        let mut filter = FixFilter::new(FixFilterSettings {
            min_interval_ms: 500,
            min_distance_m: 0.0,
        });
        let start = Instant::now();

        assert!(filter.accept(point(0.0, 0.0), start));
        assert!(!filter.accept(point(0.001, 0.0), start + Duration::from_millis(100)));
        assert!(!filter.accept(point(0.002, 0.0), start + Duration::from_millis(499)));
        assert!(filter.accept(point(0.003, 0.0), start + Duration::from_millis(500)));
        assert!(!filter.accept(point(0.004, 0.0), start + Duration::from_millis(900)));
        assert!(filter.accept(point(0.005, 0.0), start + Duration::from_millis(1000)));
    }

    #[test]
    fn test_fix_filter_distance() {
        let mut filter = FixFilter::new(FixFilterSettings {
            min_interval_ms: 0,
            min_distance_m: 10.0,
        });
        let now = Instant::now();

        assert!(filter.accept(point(0.0, 0.0), now));
        // About 1.1 m north
        assert!(!filter.accept(point(0.00001, 0.0), now));
        // About 111 m north
        assert!(filter.accept(point(0.001, 0.0), now));
        assert!(!filter.accept(point(0.001, 0.0), now));
    }

    #[test]
    fn test_fix_filter_disabled() {
        let mut filter = FixFilter::new(FixFilterSettings {
            min_interval_ms: 0,
            min_distance_m: 0.0,
        });
        let now = Instant::now();
        for _ in 0..5 {
            assert!(filter.accept(point(1.0, 1.0), now));
        }
    }
}
