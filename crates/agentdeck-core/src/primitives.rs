//! # Simulator Primitives
//!
//! Hardcoded defaults and validation limits for the agentdeck CORE.
//!
//! These values are compiled into the binary. Runtime configuration may
//! override the defaults but never the limits.

/// Basis points in one whole (100%).
///
/// Progress is stored as integer basis points so that interpolation stays
/// exact and deterministic: `10_000` is 100%, `1` is 0.01%.
pub const BASIS_POINTS_PER_WHOLE: u16 = 10_000;

/// Default polling cadence of the sequencer, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Default pause between reaching a stage target and entering the next stage.
///
/// Zero means the next stage starts on the same tick that completed the
/// previous one.
pub const DEFAULT_STAGE_PAUSE_MS: u64 = 0;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of stages in a single catalog.
pub const MAX_STAGES: usize = 64;

/// Maximum length for stage labels, in bytes.
pub const MAX_LABEL_LENGTH: usize = 256;

/// Maximum duration of a single stage (10 minutes).
pub const MAX_STAGE_DURATION_MS: u64 = 10 * 60 * 1000;

/// Maximum polling cadence. Anything slower stops looking like progress.
pub const MAX_TICK_INTERVAL_MS: u64 = 60 * 1000;

/// Maximum inter-stage pause.
pub const MAX_STAGE_PAUSE_MS: u64 = 60 * 1000;

/// Maximum length for entity and category selectors, in bytes.
pub const MAX_SELECTOR_LENGTH: usize = 128;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_is_ten_thousand_basis_points() {
        assert_eq!(BASIS_POINTS_PER_WHOLE, 10_000);
    }

    #[test]
    fn default_pause_fits_limit() {
        assert!(DEFAULT_STAGE_PAUSE_MS <= MAX_STAGE_PAUSE_MS);
        assert!(DEFAULT_TICK_INTERVAL_MS <= MAX_TICK_INTERVAL_MS);
    }
}
