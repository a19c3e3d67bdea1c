//! Common utilities for autofocus engine tests.
//!
//! Frames are synthesised at the statistics level: a PDAF grid, a focus
//! grid and an AWB grid per frame, driven through `prepare`/`process` in
//! pipeline order (prepare consumes the statistics reduced by the previous
//! frame's process).

use fovea::{AfConfig, AfEngine, AfStatus, AF_STATUS_KEY, AGC_STATUS_KEY, PDAF_REGIONS_KEY};
use shared::algo::{Algorithm, IspStatistics};
use shared::camera_mode::AgcPrepareStatus;
use shared::metadata::Metadata;
use shared::regions::{AwbRegion, FocusRegion, PdafData, RegionGrid};

/// Initialise logging once per test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Tuning with immediate stepping: no startup skip, no inter-step waits,
/// and a slew limit large enough to never lag the scan. Scenario tests
/// override individual fields from here.
pub fn instant_config() -> AfConfig {
    let mut cfg = AfConfig::default();
    for speed in &mut cfg.speeds {
        speed.step_frames = 0;
        speed.max_slew = 100.0;
    }
    cfg.skip_frames = 0;
    cfg.initialise();
    cfg
}

/// A PDAF grid reporting the same sample in every region.
pub fn uniform_pdaf(phase: i16, conf: u16) -> RegionGrid<PdafData> {
    RegionGrid::filled(12, 16, PdafData { phase, conf })
}

/// Statistics with uniform contrast and a uniform usable AWB scene mean.
pub fn stats(contrast: u32, scene_mean: f64) -> IspStatistics {
    IspStatistics {
        focus_regions: RegionGrid::filled(8, 8, FocusRegion { val: contrast }),
        awb_regions: RegionGrid::filled(
            4,
            4,
            AwbRegion {
                g_sum: (scene_mean * 100.0) as u64,
                counted: 100,
                ..Default::default()
            },
        ),
    }
}

/// Everything fed into the engine for one frame.
pub struct Frame {
    /// PDAF grid embedded in the frame, if the sensor produced one.
    pub pdaf: Option<RegionGrid<PdafData>>,
    /// AGC lock state for the frame.
    pub agc_locked: bool,
    /// Contrast the ISP measures for this frame.
    pub contrast: u32,
    /// Scene mean green level the AWB grid reduces to.
    pub scene_mean: f64,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            pdaf: None,
            agc_locked: false,
            contrast: 100,
            scene_mean: 1000.0,
        }
    }
}

/// Run one frame through the engine in pipeline order and return the
/// published status.
pub fn run_frame(af: &mut AfEngine, frame: &Frame) -> AfStatus {
    let mut meta = Metadata::new();
    if let Some(pdaf) = &frame.pdaf {
        meta.set(PDAF_REGIONS_KEY, pdaf.clone());
    }
    meta.set(
        AGC_STATUS_KEY,
        AgcPrepareStatus {
            locked: frame.agc_locked,
        },
    );

    af.prepare(&mut meta);
    let status: AfStatus = meta
        .get(AF_STATUS_KEY)
        .expect("the engine always publishes a status");

    af.process(&stats(frame.contrast, frame.scene_mean), &mut meta);
    status
}

/// Run one frame whose contrast is a function of the lens position the
/// engine commanded in `prepare`, mimicking an ISP measuring the frame the
/// lens actually produced.
pub fn run_frame_on_scene(
    af: &mut AfEngine,
    pdaf: Option<RegionGrid<PdafData>>,
    scene: &mut dyn FnMut(f64) -> u32,
) -> AfStatus {
    let mut meta = Metadata::new();
    if let Some(pdaf) = pdaf {
        meta.set(PDAF_REGIONS_KEY, pdaf);
    }
    af.prepare(&mut meta);
    let status: AfStatus = meta
        .get(AF_STATUS_KEY)
        .expect("the engine always publishes a status");

    let contrast = scene(af.get_lens_position().unwrap_or(0.0));
    af.process(&stats(contrast, 1000.0), &mut meta);
    status
}
