//! # Progress Interpolator
//!
//! Linear interpolation of progress within one stage:
//!
//! ```text
//! progress = min(target, start + (target - start) * elapsed / duration)
//! ```
//!
//! Integer math only: the division rounds down, so the interpolated value
//! reaches `target` exactly when `elapsed >= duration` and never earlier.

use crate::Progress;

/// Interpolate progress for `elapsed_ms` into a stage.
///
/// - `duration_ms == 0` yields `target` immediately
/// - A `target` at or below `start` yields `target`
/// - The result never exceeds `target`
#[must_use]
pub fn interpolate(start: Progress, target: Progress, duration_ms: u64, elapsed_ms: u64) -> Progress {
    if duration_ms == 0 || elapsed_ms >= duration_ms || target <= start {
        return target;
    }

    let span = u64::from(target.basis_points().saturating_sub(start.basis_points()));
    let advanced = span.saturating_mul(elapsed_ms) / duration_ms;
    let bp = u64::from(start.basis_points()).saturating_add(advanced);

    // advanced < span because elapsed < duration, so bp < target.
    u16::try_from(bp)
        .ok()
        .and_then(Progress::from_basis_points)
        .map(|p| p.min(target))
        .unwrap_or(target)
}

/// Stateful interpolation of a single stage.
///
/// Remembers the last emitted value so that successive samples never go
/// backwards, even when fed an elapsed time smaller than a previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInterpolation {
    start: Progress,
    target: Progress,
    duration_ms: u64,
    last: Progress,
}

impl StageInterpolation {
    /// Begin interpolating from `start` towards `target` over `duration_ms`.
    #[must_use]
    pub fn new(start: Progress, target: Progress, duration_ms: u64) -> Self {
        Self {
            start,
            target,
            duration_ms,
            last: start,
        }
    }

    /// Sample progress at `elapsed_ms` into the stage.
    pub fn sample(&mut self, elapsed_ms: u64) -> Progress {
        let value = interpolate(self.start, self.target, self.duration_ms, elapsed_ms).max(self.last);
        self.last = value;
        value
    }

    /// Last emitted value.
    #[must_use]
    pub fn last(&self) -> Progress {
        self.last
    }

    /// Target of this stage.
    #[must_use]
    pub fn target(&self) -> Progress {
        self.target
    }

    /// Check whether the target has been emitted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.last >= self.target
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(p: u8) -> Progress {
        Progress::from_percent(p).expect("valid percent")
    }

    #[test]
    fn midpoint() {
        assert_eq!(interpolate(pct(30), pct(70), 100, 50), pct(50));
    }

    #[test]
    fn rounds_down() {
        // 0 -> 100% over 300ms, 1ms in: 10000 / 300 = 33.33 basis points
        let p = interpolate(Progress::ZERO, Progress::COMPLETE, 300, 1);
        assert_eq!(p.basis_points(), 33);
    }

    #[test]
    fn zero_duration_yields_target() {
        assert_eq!(interpolate(pct(10), pct(40), 0, 0), pct(40));
    }

    #[test]
    fn never_exceeds_target() {
        assert_eq!(interpolate(pct(10), pct(40), 100, 10_000), pct(40));
    }

    #[test]
    fn target_not_above_start_yields_target() {
        assert_eq!(interpolate(pct(50), pct(50), 100, 10), pct(50));
    }

    #[test]
    fn stage_interpolation_never_decreases() {
        let mut stage = StageInterpolation::new(pct(0), pct(30), 100);
        let a = stage.sample(80);
        let b = stage.sample(20);
        assert!(b >= a);
        assert_eq!(b, a);
        assert!(!stage.is_complete());
        assert_eq!(stage.sample(100), pct(30));
        assert!(stage.is_complete());
    }

    #[test]
    fn stage_interpolation_starts_at_start() {
        let stage = StageInterpolation::new(pct(70), Progress::COMPLETE, 100);
        assert_eq!(stage.last(), pct(70));
        assert_eq!(stage.target(), Progress::COMPLETE);
    }
}
