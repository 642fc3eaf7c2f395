//! Signal-processing core for FMCW automotive radar.
//!
//! Raw chirp samples are matched-filtered and transformed into range
//! profiles, stacked across chirps into a range-Doppler map, cleaned of
//! stationary clutter, and complemented by a beamformed angle spectrum.
//! Every operation is available as a pure function under [`processing`];
//! [`pipeline::FramePipeline`] chains the stage wrappers for whole frames.

pub mod config;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use config::{ArrayGeometry, RadarConfig, Resolution};
pub use pipeline::{FrameInput, FrameOutput, FramePipeline};
pub use prelude::{ProcessingStage, RadarError, RadarResult};
