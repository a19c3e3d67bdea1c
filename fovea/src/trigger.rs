//! Scene-change trigger for continuous mode without phase detection.
//!
//! With no PDAF hardware there is nothing to tell the engine a refocus is
//! needed, so it watches a cheap scene statistic instead: the mean green
//! level of the AWB zones. A large jump arms the detector; once the level
//! settles again (and exposure is locked) a contrast scan starts. A fresh
//! AGC lock also starts one, covering scene changes expressed mostly as
//! brightness.

use log::debug;

/// Mean-level jump that arms the detector.
const ARM_DIFF: f64 = 1000.0;

/// Mean-level movement below which an armed detector fires.
const STABLE_DIFF: f64 = 400.0;

/// Watches AGC lock and the AWB scene mean for refocus-worthy changes.
#[derive(Debug, Clone, Default)]
pub struct SceneChangeTrigger {
    last_mean: f64,
    last_agc_locked: bool,
    trigger_when_stable: bool,
}

impl SceneChangeTrigger {
    /// Create an idle detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, as when a scan starts.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Drop the mean baseline so the next observation re-seeds it, as when
    /// a scan completes.
    pub fn clear_baseline(&mut self) {
        self.last_mean = 0.0;
    }

    /// Feed one frame of evidence. Returns true when a scan should start.
    ///
    /// `mean` of `None` means no usable AWB zones were seen this frame;
    /// the baseline is left untouched and only the AGC state is recorded.
    pub fn update(&mut self, agc_locked: bool, mean: Option<f64>) -> bool {
        let Some(mean) = mean else {
            self.last_agc_locked = agc_locked;
            return false;
        };

        let mut start = false;
        if agc_locked && self.last_mean != 0.0 {
            let diff = (mean - self.last_mean).abs();
            if diff > ARM_DIFF {
                debug!("scene mean jumped by {diff:.0}, armed");
                self.trigger_when_stable = true;
            }
            if self.trigger_when_stable && diff < STABLE_DIFF {
                start = true;
            } else if !self.last_agc_locked {
                // Exposure just locked; the scene may have been changing
                // the whole time it was converging.
                start = true;
            }
        }
        self.last_agc_locked = agc_locked;
        self.last_mean = mean;
        start
    }
}
