//! Engine states and the status report published to the pipeline.

use serde::{Deserialize, Serialize};

/// Focus distance range the engine is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AfRange {
    /// Infinity to a moderate close distance; the everyday range.
    Normal,
    /// Close-up work.
    Macro,
    /// Union of normal and macro.
    Full,
}

impl AfRange {
    pub(crate) const COUNT: usize = 3;
}

/// Focus movement speed profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AfSpeed {
    /// Smooth movement, suitable while recording video.
    Normal,
    /// Aggressive movement for fastest acquisition.
    Fast,
}

impl AfSpeed {
    pub(crate) const COUNT: usize = 2;
}

/// Top-level focusing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AfMode {
    /// Lens moves only on explicit position commands.
    Manual,
    /// A single sweep runs on each trigger, then the lens holds.
    Auto,
    /// The engine re-focuses by itself as the scene changes.
    Continuous,
}

/// Pause control for continuous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AfPause {
    /// Stop immediately, abandoning any scan in flight.
    Immediate,
    /// Let a scan already under way finish, then hold.
    Deferred,
    /// Resume continuous operation.
    Resume,
}

/// Internal scan progression.
///
/// The ordering is meaningful: states from [`ScanState::Pdaf`] onwards drive
/// the lens, and states from [`ScanState::Coarse`] up to (not including)
/// [`ScanState::Settle`] are a contrast sweep that survives restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScanState {
    /// Nothing in progress.
    Idle,
    /// A scan has been requested and starts at the next frame.
    Trigger,
    /// Closed-loop phase-detection control.
    Pdaf,
    /// Coarse contrast sweep across the range.
    Coarse,
    /// Fine contrast sweep around the coarse peak.
    Fine,
    /// Holding still to confirm the result.
    Settle,
}

/// Focus state reported to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AfState {
    /// No scan has run or one was cancelled.
    Idle,
    /// A scan is in progress.
    Scanning,
    /// The last scan or closed-loop update converged.
    Focused,
    /// The last scan failed or the lens hit a range limit.
    Failed,
}

/// Pause state reported to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AfPauseState {
    /// Continuous operation (or a non-continuous mode).
    Running,
    /// Pause requested, a scan is still finishing.
    Pausing,
    /// Paused; the lens holds position.
    Paused,
}

/// Autofocus report published into frame metadata every `prepare`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AfStatus {
    /// Pause progression, only meaningful in continuous mode.
    pub pause_state: AfPauseState,
    /// Focus state as the application should see it.
    pub state: AfState,
    /// Lens position in hardware units, once one is known.
    pub lens_setting: Option<i32>,
}
