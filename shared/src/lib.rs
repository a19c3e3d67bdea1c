//! Shared interface types for ISP control algorithms.
//!
//! This crate contains the types exchanged between a camera host pipeline and
//! the per-frame control algorithms it drives: image-coordinate geometry,
//! region statistics grids, the frame metadata bag, sensor mode descriptions,
//! and the algorithm capability trait with its registry.
//!
//! Nothing in here performs I/O. The host owns the sensor, the ISP and the
//! lens driver; algorithms consume statistics and publish results through
//! [`metadata::Metadata`].

pub mod algo;
pub mod camera_mode;
pub mod geometry;
pub mod metadata;
pub mod regions;

pub use algo::{Algorithm, AlgorithmRegistry, IspStatistics};
pub use camera_mode::{AgcPrepareStatus, CameraMode};
pub use geometry::Rectangle;
pub use metadata::Metadata;
pub use regions::{AwbRegion, FocusRegion, PdafData, RegionGrid};
