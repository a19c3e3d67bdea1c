//! Sensor mode description and AGC status.

use serde::{Deserialize, Serialize};

/// Active sensor readout mode.
///
/// Describes how the streamed image maps back onto the full pixel array:
/// the crop origin in native pixels plus the per-axis scale (binning or
/// skipping factor) applied during readout. Statistics grids are assumed to
/// cover the visible area described here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraMode {
    /// Left edge of the crop in native sensor pixels.
    pub crop_x: i32,
    /// Top edge of the crop in native sensor pixels.
    pub crop_y: i32,
    /// Output width in streamed pixels.
    pub width: u32,
    /// Output height in streamed pixels.
    pub height: u32,
    /// Horizontal native-pixels-per-streamed-pixel factor.
    pub scale_x: f64,
    /// Vertical native-pixels-per-streamed-pixel factor.
    pub scale_y: f64,
}

impl CameraMode {
    /// Width of the visible area in native sensor pixels.
    pub fn native_width(&self) -> u32 {
        (f64::from(self.width) * self.scale_x) as u32
    }

    /// Height of the visible area in native sensor pixels.
    pub fn native_height(&self) -> u32 {
        (f64::from(self.height) * self.scale_y) as u32
    }
}

/// AGC state published into frame metadata before the frame is processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgcPrepareStatus {
    /// Whether exposure/gain have converged.
    pub locked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_dimensions() {
        let mode = CameraMode {
            crop_x: 8,
            crop_y: 16,
            width: 2304,
            height: 1296,
            scale_x: 2.0,
            scale_y: 2.0,
        };
        assert_eq!(mode.native_width(), 4608);
        assert_eq!(mode.native_height(), 2592);
    }
}
