//! Algorithm capability trait and registry.
//!
//! Control algorithms are driven by the host pipeline through a narrow
//! interface: tuning ingestion at startup, a notification on sensor mode
//! switches, then `prepare`/`process` once per frame. `prepare` runs before
//! the ISP with sensor-embedded metadata; `process` runs after the ISP with
//! that frame's statistics. Algorithms must complete both callbacks in
//! bounded time and communicate only through the metadata bag.
//!
//! Hosts build an [`AlgorithmRegistry`] at program start and register each
//! algorithm they link in. There is no self-registration at load time; what
//! runs is exactly what the host registered.

use std::collections::HashMap;

use serde_json::Value;

use crate::camera_mode::CameraMode;
use crate::metadata::Metadata;
use crate::regions::{AwbRegion, FocusRegion, RegionGrid};

/// Statistics the ISP produces for one frame.
#[derive(Debug, Clone)]
pub struct IspStatistics {
    /// Focus figure-of-merit grid.
    pub focus_regions: RegionGrid<FocusRegion>,
    /// White-balance grid.
    pub awb_regions: RegionGrid<AwbRegion>,
}

/// Error type algorithms may surface from tuning ingestion.
pub type AlgoError = Box<dyn std::error::Error + Send + Sync>;

/// Per-frame control algorithm driven by the host pipeline.
///
/// The default method bodies do nothing, so an algorithm only implements the
/// callbacks it cares about.
pub trait Algorithm {
    /// Stable name the algorithm is registered and tuned under.
    fn name(&self) -> &'static str;

    /// Ingest the algorithm's section of the tuning document.
    fn read(&mut self, params: &Value) -> Result<(), AlgoError> {
        let _ = params;
        Ok(())
    }

    /// Complete initialisation after tuning has been read.
    fn initialise(&mut self) {}

    /// React to a sensor mode switch.
    fn switch_mode(&mut self, camera_mode: &CameraMode, metadata: &mut Metadata) {
        let _ = (camera_mode, metadata);
    }

    /// Run before the ISP processes the frame.
    fn prepare(&mut self, image_metadata: &mut Metadata) {
        let _ = image_metadata;
    }

    /// Run after the ISP has produced the frame's statistics.
    fn process(&mut self, stats: &IspStatistics, image_metadata: &mut Metadata) {
        let _ = (stats, image_metadata);
    }
}

/// Factory signature registered for each algorithm.
pub type AlgorithmFactory = fn() -> Box<dyn Algorithm>;

/// Explicit table of algorithm factories, populated by the host at startup.
#[derive(Default)]
pub struct AlgorithmRegistry {
    factories: HashMap<&'static str, AlgorithmFactory>,
}

impl AlgorithmRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any earlier registration.
    pub fn register(&mut self, name: &'static str, factory: AlgorithmFactory) {
        if self.factories.insert(name, factory).is_some() {
            log::warn!("algorithm {name:?} registered twice, keeping the newer factory");
        }
    }

    /// Instantiate the algorithm registered under `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn Algorithm>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Names of all registered algorithms, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}
