//! FOVEA - Focus Orchestration Via Evidence Arbitration
//!
//! A hybrid autofocus engine for a camera ISP. Once per frame it arbitrates
//! between two sources of focus evidence - phase-detection samples embedded
//! in the sensor stream and contrast statistics computed by the ISP - and
//! emits a new lens position plus a focus state report.
//!
//! # Overview
//!
//! The engine supports three modes:
//! 1. **Manual** - the lens moves only on [`AfEngine::set_lens_position`]
//! 2. **Auto** - one sweep per [`AfEngine::trigger_scan`], then hold
//! 3. **Continuous** - the engine re-focuses by itself as the scene changes
//!
//! # Scan state machine
//!
//! ```text
//!              trigger_scan / set_mode(Continuous)
//!            ┌─────────┐
//!            │  Idle   │◄───────────────────────────────┐
//!            └────┬────┘                                │
//!                 │                                     │ triggered scan
//!            ┌────▼────┐  PDAF usable                   │ done
//!            │ Trigger ├──────────────┐                 │
//!            └────┬────┘              │                 │
//!                 │ no PDAF     ┌─────▼─────┐           │
//!                 │             │   Pdaf    ├───────────┤
//!                 │             └─────┬─────┘           │
//!                 │        confidence │ dropout         │
//!            ┌────▼────┐              │                 │
//!            │ Coarse  │◄─────────────┘                 │
//!            └────┬────┘                                │
//!                 │ past peak                           │
//!            ┌────▼────┐      ┌─────────┐  CAF + PDAF   │
//!            │  Fine   ├─────►│ Settle  ├───────────────┘
//!            └─────────┘      └─────────┘   back to Pdaf
//! ```
//!
//! A coarse or fine sweep can also end early when two phase samples allow
//! direct interpolation of the zero-phase lens position.
//!
//! # Frame pacing
//!
//! Phase data are available in `prepare`, but contrast statistics are not
//! available until `process`. The engine gambles on phase being present: it
//! synthesises the lens setting in `prepare` so closed-loop correction acts
//! with minimum latency, and during contrast sweeps it instead waits an
//! extra frame between steps so the statistics of the previous step have
//! arrived before the next decision.
//!
//! The engine never retains host statistics buffers; `process` reduces them
//! to scalars consumed by the following `prepare`.

use log::debug;
use serde_json::Value;

use shared::algo::{AlgoError, Algorithm, IspStatistics};
use shared::camera_mode::{AgcPrepareStatus, CameraMode};
use shared::geometry::Rectangle;
use shared::metadata::Metadata;
use shared::regions::{FocusRegion, PdafData, RegionGrid};

pub mod config;
pub mod error;
pub mod pwl;
pub mod reduce;
pub mod state;
pub mod trigger;
pub mod weights;

pub use crate::config::{AfConfig, RangeParams, SpeedParams};
pub use crate::error::ConfigError;
pub use crate::state::{
    AfMode, AfPause, AfPauseState, AfRange, AfSpeed, AfState, AfStatus, ScanState,
};

use crate::trigger::SceneChangeTrigger;
use crate::weights::{compute_weights, RegionWeights, MAX_WINDOWS};

/// Name the engine registers and is tuned under.
pub const NAME: &str = "fovea.af";

/// Metadata key carrying the sensor's PDAF grid into `prepare`.
pub const PDAF_REGIONS_KEY: &str = "pdaf.regions";
/// Metadata key carrying the AGC lock state into `prepare`.
pub const AGC_STATUS_KEY: &str = "agc.prepare_status";
/// Metadata key the engine publishes its [`AfStatus`] under.
pub const AF_STATUS_KEY: &str = "af.status";

/// AWB zones need at least this many counted pixels to vote on the scene
/// mean.
const SCENE_MIN_PIXELS: u32 = 16;
/// AWB zones darker than this mean green level are ignored.
const SCENE_MIN_GREEN: f64 = 32.0;

/// One sample collected during a contrast sweep.
#[derive(Debug, Clone, Copy)]
struct ScanRecord {
    focus: f64,
    contrast: f64,
    phase: f64,
    conf: f64,
}

/// Factory with the signature [`shared::algo::AlgorithmRegistry`] expects.
pub fn create() -> Box<dyn Algorithm> {
    Box::new(AfEngine::new())
}

/// The autofocus engine.
///
/// Hosts drive it through the [`Algorithm`] trait once per frame and mutate
/// it through the command surface between frames. All methods run to
/// completion in bounded time; lens I/O is the caller's job, using the
/// hardware setting published in [`AfStatus`].
pub struct AfEngine {
    cfg: AfConfig,

    range: AfRange,
    speed: AfSpeed,
    mode: AfMode,
    pause_flag: bool,

    /// Image area the statistics grids cover, from the sensor mode.
    stats_region: Rectangle,
    windows: Vec<Rectangle>,
    use_windows: bool,
    phase_weights: RegionWeights,
    contrast_weights: RegionWeights,

    scan_state: ScanState,
    /// Whether `fsmooth` is a meaningful lens position yet.
    initted: bool,
    /// Target lens position, dioptres.
    ftarget: f64,
    /// Slew-limited lens position actually commanded, dioptres.
    fsmooth: f64,
    /// Contrast reduced from the previous frame's statistics.
    prev_contrast: f64,
    /// Scene mean reduced from the previous frame's AWB statistics.
    scene_mean: Option<f64>,
    skip_count: u32,
    step_count: u32,
    drop_count: u32,

    scan_max_contrast: f64,
    scan_min_contrast: f64,
    scan_max_index: usize,
    scan_data: Vec<ScanRecord>,

    report_state: AfState,
    is_pdaf_enabled: bool,
    trigger: SceneChangeTrigger,
}

impl Default for AfEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AfEngine {
    /// Create an engine with default tuning. Call [`Algorithm::read`] and
    /// [`Algorithm::initialise`] before the first frame.
    pub fn new() -> Self {
        Self::with_config(AfConfig::default())
    }

    /// Create an engine with explicit tuning.
    pub fn with_config(cfg: AfConfig) -> Self {
        Self {
            cfg,
            range: AfRange::Normal,
            speed: AfSpeed::Normal,
            mode: AfMode::Manual,
            pause_flag: false,
            stats_region: Rectangle::default(),
            windows: Vec::new(),
            use_windows: false,
            // Plausible upper bounds for the PDAF and focus grids; the
            // real sizes arrive with the first statistics.
            phase_weights: RegionWeights::with_capacity(16 * 12),
            contrast_weights: RegionWeights::with_capacity(16 * 12),
            scan_state: ScanState::Idle,
            initted: false,
            ftarget: -1.0,
            fsmooth: -1.0,
            prev_contrast: 0.0,
            scene_mean: None,
            skip_count: 0,
            step_count: 0,
            drop_count: 0,
            scan_max_contrast: 0.0,
            scan_min_contrast: 1.0e9,
            scan_max_index: 0,
            scan_data: Vec::with_capacity(32),
            report_state: AfState::Idle,
            is_pdaf_enabled: false,
            trigger: SceneChangeTrigger::new(),
        }
    }

    /// Current scan progression (mainly for tests and diagnostics).
    pub fn scan_state(&self) -> ScanState {
        self.scan_state
    }

    /// Current mode.
    pub fn get_mode(&self) -> AfMode {
        self.mode
    }

    /// Smoothed lens position in dioptres, once one is known.
    pub fn get_lens_position(&self) -> Option<f64> {
        self.initted.then_some(self.fsmooth)
    }

    /// Lens position in hardware units, once one is known.
    pub fn lens_setting(&self) -> Option<i32> {
        self.initted.then(|| self.cfg.map.eval(self.fsmooth) as i32)
    }

    fn invalidate_weights(&mut self) {
        self.phase_weights.invalidate();
        self.contrast_weights.invalidate();
    }

    fn get_phase(&mut self, regions: &RegionGrid<PdafData>) -> Option<(f64, f64)> {
        let (rows, cols) = (regions.rows(), regions.cols());
        if !self.phase_weights.matches(rows, cols) {
            debug!("recompute phase weights {cols}x{rows}");
            compute_weights(
                &mut self.phase_weights,
                rows,
                cols,
                &self.stats_region,
                &self.windows,
                self.use_windows,
            );
        }
        reduce::reduce_phase(
            regions,
            &self.phase_weights,
            self.cfg.conf_thresh,
            self.cfg.conf_clip,
        )
    }

    fn get_contrast(&mut self, regions: &RegionGrid<FocusRegion>) -> f64 {
        let (rows, cols) = (regions.rows(), regions.cols());
        if !self.contrast_weights.matches(rows, cols) {
            debug!("recompute contrast weights {cols}x{rows}");
            compute_weights(
                &mut self.contrast_weights,
                rows,
                cols,
                &self.stats_region,
                &self.windows,
                self.use_windows,
            );
        }
        reduce::reduce_contrast(regions, &self.contrast_weights)
    }

    /// One closed-loop phase-detection iteration.
    fn do_pdaf(&mut self, mut phase: f64, conf: f64) {
        let speed = *self.cfg.speed(self.speed);
        let range = *self.cfg.range(self.range);

        // Apply loop gain.
        phase *= speed.pdaf_gain;

        if self.mode == AfMode::Continuous {
            // Scale down lens movement when the delta is small or the
            // confidence is low, to suppress wobble.
            phase *= conf / (conf + f64::from(self.cfg.conf_epsilon));
            if phase.abs() < speed.pdaf_squelch {
                let a = phase / speed.pdaf_squelch;
                phase *= a * a;
            }
        } else if self.step_count >= speed.step_frames {
            // Triggered sweep: allow early completion once the correction
            // drops into the squelch region.
            if phase.abs() < speed.pdaf_squelch {
                self.step_count = speed.step_frames;
            }
        } else {
            // Ramp movement down towards the end of the sequence so the
            // image is stable when the sweep reports.
            phase *= f64::from(self.step_count) / f64::from(speed.step_frames);
        }

        // Slew limit; failure is reported only against a range boundary.
        if phase < -speed.max_slew {
            phase = -speed.max_slew;
            self.report_state = if self.ftarget <= range.focus_min {
                AfState::Failed
            } else {
                AfState::Scanning
            };
        } else if phase > speed.max_slew {
            phase = speed.max_slew;
            self.report_state = if self.ftarget >= range.focus_max {
                AfState::Failed
            } else {
                AfState::Scanning
            };
        } else {
            self.report_state = AfState::Focused;
        }

        self.ftarget = self.fsmooth + phase;
    }

    /// Try to finish a contrast sweep from two phase samples.
    ///
    /// If the previous scan point carried a confident phase and the phase
    /// gradient along the sweep has the expected sign, interpolate or
    /// extrapolate the zero-phase lens position and jump there.
    fn early_termination_by_phase(&mut self, phase: f64) -> bool {
        if let Some(last) = self.scan_data.last() {
            if last.conf >= f64::from(self.cfg.conf_epsilon) {
                let old_focus = last.focus;
                let old_phase = last.phase;
                if (self.ftarget - old_focus) * (phase - old_phase) > 0.0 {
                    let param = phase / (phase - old_phase);
                    if (-3.0..=3.5).contains(&param) {
                        self.ftarget += param * (old_focus - self.ftarget);
                        debug!("early termination by phase: param={param:.3}");
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Quadratic interpolation of the contrast peak around sample `i`.
    ///
    /// The coefficient gives exact interpolation for a symmetric parabola
    /// while bounding the shift on asymmetric curves.
    fn find_peak(&self, i: usize) -> f64 {
        let mut f = self.scan_data[i].focus;

        if i > 0 && i + 1 < self.scan_data.len() {
            let drop_lo = self.scan_data[i].contrast - self.scan_data[i - 1].contrast;
            let drop_hi = self.scan_data[i].contrast - self.scan_data[i + 1].contrast;
            if 0.0 <= drop_lo && drop_lo < drop_hi {
                let r = drop_lo / drop_hi;
                f += 0.3125 * (1.0 - r) * (1.6 - r) * (self.scan_data[i - 1].focus - f);
            } else if 0.0 <= drop_hi && drop_hi < drop_lo {
                let r = drop_hi / drop_lo;
                f += 0.3125 * (1.0 - r) * (1.6 - r) * (self.scan_data[i + 1].focus - f);
            }
        }

        debug!("find_peak: {f:.3}");
        f
    }

    /// One step of the programmed coarse/fine contrast sweep.
    fn do_scan(&mut self, contrast: f64, phase: f64, conf: f64) {
        if self.scan_data.is_empty() || contrast > self.scan_max_contrast {
            self.scan_max_contrast = contrast;
            self.scan_max_index = self.scan_data.len();
        }
        if contrast < self.scan_min_contrast {
            self.scan_min_contrast = contrast;
        }
        self.scan_data.push(ScanRecord {
            focus: self.ftarget,
            contrast,
            phase,
            conf,
        });

        let speed = *self.cfg.speed(self.speed);
        let range = *self.cfg.range(self.range);

        if self.scan_state == ScanState::Coarse {
            if self.ftarget >= range.focus_max
                || contrast < speed.contrast_ratio * self.scan_max_contrast
            {
                // Coarse sweep done (range end or past the peak): jump to
                // just after the best contrast and sweep back finely.
                self.ftarget = f64::min(
                    self.ftarget,
                    self.find_peak(self.scan_max_index) + 2.0 * speed.step_fine,
                );
                self.scan_state = ScanState::Fine;
                self.scan_data.clear();
            } else {
                self.ftarget += speed.step_coarse;
            }
        } else if self.ftarget <= range.focus_min
            || self.scan_data.len() >= 5
            || contrast < speed.contrast_ratio * self.scan_max_contrast
        {
            self.ftarget = self.find_peak(self.scan_max_index);
            self.scan_state = ScanState::Settle;
        } else {
            self.ftarget -= speed.step_fine;
        }

        self.step_count = if self.ftarget == self.fsmooth {
            0
        } else {
            speed.step_frames
        };
    }

    /// Advance the state machine by one frame of evidence.
    fn do_af(&mut self, contrast: f64, phase: f64, conf: f64, agc_locked: bool) {
        // Discard evidence at startup and after lens jumps / mode changes.
        if self.skip_count > 0 {
            debug!("skip remaining: {}", self.skip_count);
            self.skip_count -= 1;
            return;
        }

        if self.mode == AfMode::Continuous
            && !self.is_pdaf_enabled
            && self.scan_state == ScanState::Idle
        {
            if self.trigger.update(agc_locked, self.scene_mean) {
                self.start_programmed_scan();
            }
        } else if self.scan_state == ScanState::Pdaf {
            // Closed-loop phase control whenever available, in continuous
            // mode and (for a bounded number of iterations) when
            // triggered. On sustained low confidence fall back to a
            // contrast sweep; requiring several bad frames avoids
            // nuisance scans.
            let gate = if self.drop_count > 0 { 1.0 } else { 0.25 };
            if conf > gate * f64::from(self.cfg.conf_epsilon) {
                self.do_pdaf(phase, conf);
                if self.step_count > 0 {
                    self.step_count -= 1;
                } else if self.mode != AfMode::Continuous {
                    self.scan_state = ScanState::Idle;
                }
                self.drop_count = 0;
            } else {
                self.drop_count += 1;
                if self.drop_count == self.cfg.speed(self.speed).dropout_frames {
                    self.start_programmed_scan();
                }
            }
        } else if self.scan_state >= ScanState::Coarse && self.fsmooth == self.ftarget {
            // Contrast sweep, armed only once the previous step has been
            // observed: statistics lag the lens by a frame, so each step
            // waits for its contrast before the next decision.
            if self.step_count > 0 {
                self.step_count -= 1;
            } else if self.scan_state == ScanState::Settle {
                let speed = self.cfg.speed(self.speed);
                let threshold = speed.contrast_ratio * self.scan_max_contrast;
                self.report_state =
                    if contrast >= threshold && self.scan_min_contrast <= threshold {
                        AfState::Focused
                    } else {
                        AfState::Failed
                    };
                self.scan_state = if self.mode == AfMode::Continuous
                    && !self.pause_flag
                    && speed.dropout_frames > 0
                    && self.is_pdaf_enabled
                {
                    ScanState::Pdaf
                } else {
                    ScanState::Idle
                };
                self.scan_data.clear();
                self.trigger.clear_baseline();
            } else if conf >= f64::from(self.cfg.conf_epsilon)
                && self.early_termination_by_phase(phase)
            {
                self.scan_state = ScanState::Settle;
                self.step_count = if self.mode == AfMode::Continuous {
                    0
                } else {
                    self.cfg.speed(self.speed).step_frames
                };
            } else {
                self.do_scan(contrast, phase, conf);
            }
        }
    }

    /// Shape `ftarget` into the commanded lens position.
    fn update_lens_position(&mut self) {
        if self.scan_state >= ScanState::Pdaf {
            let range = self.cfg.range(self.range);
            self.ftarget = self.ftarget.clamp(range.focus_min, range.focus_max);
        }

        if self.initted {
            // From a known position: slew-rate limit the movement.
            let max_slew = self.cfg.speed(self.speed).max_slew;
            self.fsmooth = self
                .ftarget
                .clamp(self.fsmooth - max_slew, self.fsmooth + max_slew);
        } else {
            // From an unknown position: jump straight there, then discard
            // evidence until the lens has physically settled.
            self.fsmooth = self.ftarget;
            self.initted = true;
            self.skip_count = self.cfg.skip_frames;
        }
    }

    /// Begin a scan: closed-loop phase control when the tuning allows it,
    /// otherwise a programmed contrast sweep.
    fn start_af(&mut self) {
        let speed = *self.cfg.speed(self.speed);
        if speed.dropout_frames > 0 && (self.mode == AfMode::Continuous || speed.pdaf_frames > 0) {
            if !self.initted {
                self.ftarget = self.cfg.range(self.range).focus_default;
                self.update_lens_position();
            }
            self.step_count = if self.mode == AfMode::Continuous {
                0
            } else {
                speed.pdaf_frames
            };
            self.scan_state = ScanState::Pdaf;
            self.scan_data.clear();
            self.drop_count = 0;
            self.report_state = AfState::Scanning;
        } else {
            self.start_programmed_scan();
        }
    }

    /// Begin a coarse contrast sweep from the near end of the range.
    fn start_programmed_scan(&mut self) {
        self.ftarget = self.cfg.range(self.range).focus_min;
        self.update_lens_position();
        self.scan_state = ScanState::Coarse;
        self.scan_max_contrast = 0.0;
        self.scan_min_contrast = 1.0e9;
        self.scan_max_index = 0;
        self.scan_data.clear();
        self.step_count = self.cfg.speed(self.speed).step_frames;
        self.report_state = AfState::Scanning;
        self.trigger.reset();
    }

    fn go_idle(&mut self) {
        self.scan_state = ScanState::Idle;
        self.report_state = AfState::Idle;
        self.scan_data.clear();
    }
}

impl Algorithm for AfEngine {
    fn name(&self) -> &'static str {
        NAME
    }

    fn read(&mut self, params: &Value) -> Result<(), AlgoError> {
        self.cfg.read(params)?;
        Ok(())
    }

    fn initialise(&mut self) {
        self.cfg.initialise();
    }

    fn switch_mode(&mut self, camera_mode: &CameraMode, _metadata: &mut Metadata) {
        // Assume the PDAF and focus statistics grids cover the visible
        // area of the new mode.
        self.stats_region = Rectangle::new(
            camera_mode.crop_x,
            camera_mode.crop_y,
            camera_mode.native_width(),
            camera_mode.native_height(),
        );
        debug!(
            "switch_mode: stats region {},{} {}x{}",
            self.stats_region.x, self.stats_region.y, self.stats_region.width,
            self.stats_region.height
        );
        self.invalidate_weights();

        if self.scan_state >= ScanState::Coarse && self.scan_state < ScanState::Settle {
            // A sweep was in progress and its contrast values are no
            // longer comparable; start it over.
            self.start_programmed_scan();
        }
        self.skip_count = self.cfg.skip_frames;
    }

    fn prepare(&mut self, image_metadata: &mut Metadata) {
        // A scan requested between frames starts here.
        if self.scan_state == ScanState::Trigger {
            self.start_af();
        }

        if self.initted {
            let mut phase = 0.0;
            let mut conf = 0.0;
            let (old_ss, old_st) = (self.scan_state, self.step_count);
            let (old_ft, old_fs) = (self.ftarget, self.fsmooth);

            if let Some(regions) = image_metadata.get::<RegionGrid<PdafData>>(PDAF_REGIONS_KEY) {
                if let Some((p, c)) = self.get_phase(&regions) {
                    phase = p;
                    conf = c;
                }
                self.is_pdaf_enabled = true;
            }
            let agc_locked = image_metadata
                .get::<AgcPrepareStatus>(AGC_STATUS_KEY)
                .unwrap_or_default()
                .locked;

            self.do_af(self.prev_contrast, phase, conf, agc_locked);
            self.update_lens_position();

            debug!(
                "{:?} sst {:?}->{:?} stp {}->{} ft {:.2}->{:.2} fs {:.2}->{:.2} \
                 cont={:.0} phase={:.2} conf={:.1}",
                self.report_state,
                old_ss,
                self.scan_state,
                old_st,
                self.step_count,
                old_ft,
                self.ftarget,
                old_fs,
                self.fsmooth,
                self.prev_contrast,
                phase,
                conf
            );
        }

        let pause_state = if self.pause_flag {
            if self.scan_state == ScanState::Idle {
                AfPauseState::Paused
            } else {
                AfPauseState::Pausing
            }
        } else {
            AfPauseState::Running
        };

        // A triggered sweep reports Scanning for its whole duration, even
        // through transient per-frame verdicts.
        let state = if self.mode == AfMode::Auto && self.scan_state != ScanState::Idle {
            AfState::Scanning
        } else {
            self.report_state
        };

        image_metadata.set(
            AF_STATUS_KEY,
            AfStatus {
                pause_state,
                state,
                lens_setting: self.lens_setting(),
            },
        );
    }

    fn process(&mut self, stats: &IspStatistics, _image_metadata: &mut Metadata) {
        self.prev_contrast = self.get_contrast(&stats.focus_regions);
        self.scene_mean =
            reduce::reduce_scene_mean(&stats.awb_regions, SCENE_MIN_PIXELS, SCENE_MIN_GREEN);
    }
}

/// Command surface. Hosts call these between frames; anything arriving
/// mid-frame takes effect at the next `prepare`.
impl AfEngine {
    /// Select the focus range.
    pub fn set_range(&mut self, range: AfRange) {
        debug!("set_range: {range:?}");
        self.range = range;
    }

    /// Select the speed profile. Switching during a triggered closed-loop
    /// sweep may extend the iteration budget but never shortens one in
    /// progress.
    pub fn set_speed(&mut self, speed: AfSpeed) {
        debug!("set_speed: {speed:?}");
        if self.scan_state == ScanState::Pdaf
            && self.cfg.speed(speed).pdaf_frames > self.cfg.speed(self.speed).pdaf_frames
        {
            self.step_count +=
                self.cfg.speed(speed).pdaf_frames - self.cfg.speed(self.speed).pdaf_frames;
        }
        self.speed = speed;
    }

    /// Enable or disable window metering. Weights are rebuilt on change.
    pub fn set_metering(&mut self, use_windows: bool) {
        if self.use_windows != use_windows {
            self.use_windows = use_windows;
            self.invalidate_weights();
        }
    }

    /// Replace the focus windows, keeping at most the first
    /// [`MAX_WINDOWS`].
    pub fn set_windows(&mut self, windows: &[Rectangle]) {
        self.windows.clear();
        for win in windows.iter().take(MAX_WINDOWS) {
            debug!("window: {},{} {}x{}", win.x, win.y, win.width, win.height);
            self.windows.push(*win);
        }
        if self.use_windows {
            self.invalidate_weights();
        }
    }

    /// Command a lens position in dioptres. Only acts in manual mode.
    /// Returns whether the commanded position changed.
    pub fn set_lens_position(&mut self, dioptres: f64) -> bool {
        if self.mode != AfMode::Manual {
            return false;
        }
        debug!("set_lens_position: {dioptres}");
        self.ftarget = self.cfg.map.domain().clip(dioptres);
        let changed = !(self.initted && self.fsmooth == self.ftarget);
        self.update_lens_position();
        self.report_state = if self.fsmooth == self.ftarget {
            AfState::Focused
        } else {
            AfState::Scanning
        };
        changed
    }

    /// Request one sweep. Only acts in auto mode while idle.
    pub fn trigger_scan(&mut self) {
        debug!("trigger_scan");
        if self.mode == AfMode::Auto && self.scan_state == ScanState::Idle {
            self.scan_state = ScanState::Trigger;
        }
    }

    /// Abandon a triggered sweep. Only acts in auto mode.
    pub fn cancel_scan(&mut self) {
        debug!("cancel_scan");
        if self.mode == AfMode::Auto {
            self.go_idle();
        }
    }

    /// Switch mode. Entering continuous mode arms a scan; leaving a mode
    /// abandons everything except an auto sweep already past its phase
    /// stage.
    pub fn set_mode(&mut self, mode: AfMode) {
        debug!("set_mode: {mode:?}");
        if self.mode != mode {
            self.mode = mode;
            self.pause_flag = false;
            if mode == AfMode::Continuous {
                self.scan_state = ScanState::Trigger;
            } else if mode != AfMode::Auto || self.scan_state < ScanState::Coarse {
                self.go_idle();
            }
        }
    }

    /// Pause, resume, or defer-pause continuous operation. Ignored in
    /// other modes.
    pub fn pause(&mut self, pause: AfPause) {
        debug!("pause: {pause:?}");
        if self.mode != AfMode::Continuous {
            return;
        }
        if pause == AfPause::Resume && self.pause_flag {
            self.pause_flag = false;
            if self.scan_state < ScanState::Coarse {
                self.scan_state = ScanState::Trigger;
            }
        } else if pause != AfPause::Resume && !self.pause_flag {
            self.pause_flag = true;
            if pause == AfPause::Immediate || self.scan_state < ScanState::Coarse {
                self.go_idle();
            }
        }
    }
}
