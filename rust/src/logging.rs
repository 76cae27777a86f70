//! Logging macros for the schedulers with verbosity level control.
//!
//! Zero-cost when disabled (verbosity=0). Levels:
//! - 0: SILENT (only errors)
//! - 1: CHANGES (configuration switches, reconfigurations, placements, merges)
//! - 2: CHECKS (lookahead scores, merge comparisons)
//! - 3: DEBUG (cluster listings, window contents)

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at CHANGES level (verbosity >= 1).
///
/// Used for: configuration switches, reconfigurations, task placements, committed merges.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            eprintln!($($arg)*);
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
///
/// Used for: per-configuration lookahead scores, merge cost comparisons.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            eprintln!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
///
/// Used for: lookahead window contents, cluster listings after each pass.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(VERBOSITY_SILENT < VERBOSITY_CHANGES);
        assert!(VERBOSITY_CHANGES < VERBOSITY_CHECKS);
        assert!(VERBOSITY_CHECKS < VERBOSITY_DEBUG);
    }

    #[test]
    fn test_silent_macros_expand() {
        let verbosity = VERBOSITY_SILENT;
        log_changes!(verbosity, "switch to {}", "c1");
        log_checks!(verbosity, "score {} = {}", "c1", 4);
        log_debug!(verbosity, "window {:?}", [1, 2, 3]);
    }
}
