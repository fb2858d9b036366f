//! Configuration types for timeline scheduling.

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Day of month used as the completion anchor when none is configured.
pub const DEFAULT_COMPLETION_DAY: u32 = 15;

/// Configuration shared by the forward and backward schedulers.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
    /// Day of the completion month that the final phase ends on.
    pub completion_day: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            completion_day: DEFAULT_COMPLETION_DAY,
        }
    }
}

impl TimelineConfig {
    /// Default configuration with the given verbosity.
    pub fn with_verbosity(verbosity: u8) -> Self {
        Self {
            verbosity,
            ..Self::default()
        }
    }
}
