//! Tuning parameter model.
//!
//! All values may be overridden from the tuning document; anything the
//! document omits keeps the default below and logs a warning. The defaults
//! assume a phone-class voice-coil lens module updated at video rate.
//!
//! Focus positions are in dioptres (1/m) throughout; they are converted to
//! hardware units only at the status boundary, through [`Pwl`]. Frame counts
//! are relative to the statistics update rate, since most of the loop delay
//! is in the sensor and ISP rather than the lens mechanism.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::pwl::Pwl;
use crate::state::{AfRange, AfSpeed};

/// Default dioptre-to-hardware map installed when the document has none.
const DEFAULT_MAP: [(f64, f64); 2] = [(0.0, 445.0), (15.0, 925.0)];

/// Focus limits for one range selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeParams {
    /// Closest-to-infinity position, dioptres.
    pub focus_min: f64,
    /// Closest-focus position, dioptres.
    pub focus_max: f64,
    /// Position to start the first scan from, dioptres.
    pub focus_default: f64,
}

impl Default for RangeParams {
    fn default() -> Self {
        Self {
            focus_min: 0.0,
            focus_max: 12.0,
            focus_default: 1.0,
        }
    }
}

impl RangeParams {
    fn read(&mut self, params: &Value) {
        read_number(&mut self.focus_min, params, "min");
        read_number(&mut self.focus_max, params, "max");
        read_number(&mut self.focus_default, params, "default");
    }
}

/// Movement and convergence parameters for one speed selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedParams {
    /// Coarse scan step, dioptres.
    pub step_coarse: f64,
    /// Fine scan step, dioptres.
    pub step_fine: f64,
    /// Contrast fraction of the running maximum that ends a sweep.
    pub contrast_ratio: f64,
    /// Loop gain applied to the phase estimate; sign matches the lens.
    pub pdaf_gain: f64,
    /// Correction magnitude below which movement is attenuated, dioptres.
    pub pdaf_squelch: f64,
    /// Largest per-frame movement of the smoothed position, dioptres.
    pub max_slew: f64,
    /// Closed-loop iterations allowed for a triggered sweep.
    pub pdaf_frames: u32,
    /// Consecutive low-confidence frames before falling back to contrast.
    pub dropout_frames: u32,
    /// Frames to wait between scan steps and before the settle verdict.
    pub step_frames: u32,
}

impl Default for SpeedParams {
    fn default() -> Self {
        Self {
            step_coarse: 1.0,
            step_fine: 0.25,
            contrast_ratio: 0.75,
            pdaf_gain: -0.02,
            pdaf_squelch: 0.125,
            max_slew: 2.0,
            pdaf_frames: 20,
            dropout_frames: 6,
            step_frames: 4,
        }
    }
}

impl SpeedParams {
    fn read(&mut self, params: &Value) {
        read_number(&mut self.step_coarse, params, "step_coarse");
        read_number(&mut self.step_fine, params, "step_fine");
        read_number(&mut self.contrast_ratio, params, "contrast_ratio");
        read_number(&mut self.pdaf_gain, params, "pdaf_gain");
        read_number(&mut self.pdaf_squelch, params, "pdaf_squelch");
        read_number(&mut self.max_slew, params, "max_slew");
        read_number(&mut self.pdaf_frames, params, "pdaf_frames");
        read_number(&mut self.dropout_frames, params, "dropout_frames");
        read_number(&mut self.step_frames, params, "step_frames");
    }
}

/// Complete tuning set for the autofocus engine. Immutable after
/// [`AfConfig::initialise`].
#[derive(Debug, Clone, PartialEq)]
pub struct AfConfig {
    /// Focus limits, indexed by [`AfRange`].
    pub ranges: [RangeParams; AfRange::COUNT],
    /// Movement profiles, indexed by [`AfSpeed`].
    pub speeds: [SpeedParams; AfSpeed::COUNT],
    /// Confidence scale for closed-loop weighting and dropout detection.
    pub conf_epsilon: u32,
    /// Minimum region confidence for a phase sample to count at all.
    pub conf_thresh: u32,
    /// Ceiling applied to region confidence before weighting.
    pub conf_clip: u32,
    /// Frames of evidence to discard after a jump from an unknown position.
    pub skip_frames: u32,
    /// Dioptre-to-hardware lens map.
    pub map: Pwl,
}

impl Default for AfConfig {
    fn default() -> Self {
        Self {
            ranges: [RangeParams::default(); AfRange::COUNT],
            speeds: [SpeedParams::default(); AfSpeed::COUNT],
            conf_epsilon: 8,
            conf_thresh: 16,
            conf_clip: 512,
            skip_frames: 5,
            map: Pwl::new(),
        }
    }
}

impl AfConfig {
    /// Ingest the engine's tuning section.
    ///
    /// Missing keys keep their defaults; each omission is logged. The macro
    /// range inherits the normal range before its own keys apply, the full
    /// range defaults to their union, and the fast speed inherits the
    /// normal speed the same way.
    pub fn read(&mut self, params: &Value) -> Result<(), ConfigError> {
        if let Some(rr) = params.get("ranges") {
            if let Some(normal) = rr.get("normal") {
                self.ranges[AfRange::Normal as usize].read(normal);
            } else {
                warn!("missing range \"normal\"");
            }

            self.ranges[AfRange::Macro as usize] = self.ranges[AfRange::Normal as usize];
            if let Some(mac) = rr.get("macro") {
                self.ranges[AfRange::Macro as usize].read(mac);
            }

            let normal = self.ranges[AfRange::Normal as usize];
            let mac = self.ranges[AfRange::Macro as usize];
            self.ranges[AfRange::Full as usize] = RangeParams {
                focus_min: f64::min(normal.focus_min, mac.focus_min),
                focus_max: f64::max(normal.focus_max, mac.focus_max),
                focus_default: normal.focus_default,
            };
            if let Some(full) = rr.get("full") {
                self.ranges[AfRange::Full as usize].read(full);
            }
        } else {
            warn!("no ranges defined");
        }

        if let Some(ss) = params.get("speeds") {
            if let Some(normal) = ss.get("normal") {
                self.speeds[AfSpeed::Normal as usize].read(normal);
            } else {
                warn!("missing speed \"normal\"");
            }

            self.speeds[AfSpeed::Fast as usize] = self.speeds[AfSpeed::Normal as usize];
            if let Some(fast) = ss.get("fast") {
                self.speeds[AfSpeed::Fast as usize].read(fast);
            }
        } else {
            warn!("no speeds defined");
        }

        read_number(&mut self.conf_epsilon, params, "conf_epsilon");
        read_number(&mut self.conf_thresh, params, "conf_thresh");
        read_number(&mut self.conf_clip, params, "conf_clip");
        read_number(&mut self.skip_frames, params, "skip_frames");

        if let Some(map) = params.get("map") {
            self.map = Pwl::read(map)?;
        } else {
            warn!("no map defined");
        }

        Ok(())
    }

    /// Finish configuration, installing the default lens map if the tuning
    /// document supplied none.
    pub fn initialise(&mut self) {
        if self.map.is_empty() {
            self.map = Pwl::from_pairs(DEFAULT_MAP).expect("default map is strictly increasing");
        }
    }

    /// Parameters for a range selection.
    pub fn range(&self, r: AfRange) -> &RangeParams {
        &self.ranges[r as usize]
    }

    /// Parameters for a speed selection.
    pub fn speed(&self, s: AfSpeed) -> &SpeedParams {
        &self.speeds[s as usize]
    }
}

/// Overwrite `dest` from `params[name]` when present and well-typed,
/// otherwise keep the default and log the omission.
fn read_number<T: DeserializeOwned>(dest: &mut T, params: &Value, name: &str) {
    match params.get(name) {
        Some(value) => match serde_json::from_value::<T>(value.clone()) {
            Ok(v) => *dest = v,
            Err(_) => warn!("parameter {name:?} has the wrong type"),
        },
        None => warn!("missing parameter {name:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let mut cfg = AfConfig::default();
        cfg.initialise();
        assert_relative_eq!(cfg.range(AfRange::Normal).focus_max, 12.0);
        assert_eq!(cfg.speed(AfSpeed::Normal).pdaf_frames, 20);
        assert_eq!(cfg.conf_thresh, 16);
        assert_relative_eq!(cfg.map.eval(0.0), 445.0);
        assert_relative_eq!(cfg.map.eval(15.0), 925.0);
    }

    #[test]
    fn test_read_overrides_and_inheritance() {
        let mut cfg = AfConfig::default();
        cfg.read(&json!({
            "ranges": {
                "normal": { "min": 0.0, "max": 10.0, "default": 1.5 },
                "macro": { "min": 3.0, "max": 15.0 }
            },
            "speeds": {
                "normal": { "step_coarse": 2.0, "pdaf_frames": 10 },
                "fast": { "step_coarse": 3.0 }
            },
            "conf_epsilon": 4
        }))
        .expect("valid document");
        cfg.initialise();

        // Macro inherited the normal default.
        assert_relative_eq!(cfg.range(AfRange::Macro).focus_default, 1.5);
        // Full is the union of normal and macro.
        assert_relative_eq!(cfg.range(AfRange::Full).focus_min, 0.0);
        assert_relative_eq!(cfg.range(AfRange::Full).focus_max, 15.0);
        // Fast inherited normal's pdaf_frames but overrode the step.
        assert_eq!(cfg.speed(AfSpeed::Fast).pdaf_frames, 10);
        assert_relative_eq!(cfg.speed(AfSpeed::Fast).step_coarse, 3.0);
        assert_eq!(cfg.conf_epsilon, 4);
        // Untouched keys keep defaults.
        assert_eq!(cfg.conf_clip, 512);
    }

    #[test]
    fn test_read_custom_map() {
        let mut cfg = AfConfig::default();
        cfg.read(&json!({ "map": [0.0, 100.0, 10.0, 900.0] }))
            .expect("valid document");
        cfg.initialise();
        assert_relative_eq!(cfg.map.eval(5.0), 500.0);
    }

    #[test]
    fn test_read_bad_map_fails() {
        let mut cfg = AfConfig::default();
        assert!(cfg.read(&json!({ "map": [1.0, 2.0, 3.0] })).is_err());
        assert!(cfg.read(&json!({ "map": "wat" })).is_err());
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let mut cfg = AfConfig::default();
        cfg.read(&json!({})).expect("empty document is fine");
        cfg.initialise();
        assert_eq!(cfg.skip_frames, 5);
        assert_relative_eq!(cfg.speed(AfSpeed::Fast).max_slew, 2.0);
    }
}
