use thiserror::Error;

use crate::pwl::PwlError;

/// Errors produced while ingesting tuning data.
///
/// Missing keys are never errors (the defaults stand and a warning is
/// logged); only a structurally broken focus map fails the read, since the
/// engine cannot produce hardware lens settings without a usable map.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `map` key was present but not an array of numbers.
    #[error("focus map must be a flat array of numbers")]
    MapFormat,

    /// The `map` key held an odd number of values.
    #[error("focus map needs x/y pairs, got {0} values")]
    MapArity(usize),

    /// The map points were rejected.
    #[error("focus map: {0}")]
    Map(#[from] PwlError),
}
