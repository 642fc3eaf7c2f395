pub mod angle;
pub mod chirp;
pub mod clutter;
pub mod doppler;
pub mod range;

pub use angle::{
    angular_resolution, digital_beamforming, scan_angle_deg, AntennaArray, BeamformStage,
    DEFAULT_ANGLE_BINS,
};
pub use chirp::{generate_chirp, matched_filter, ChirpParams};
pub use clutter::{
    adaptive_clutter_suppression, mti_filter, mti_filter_all, ClutterStage,
    DEFAULT_CLUTTER_THRESHOLD,
};
pub use doppler::{
    bin_to_velocity, doppler_transform, doppler_transform_rows, velocity_resolution, DopplerStage,
};
pub use range::{
    bin_to_range, range_resolution, range_resolution_with, range_transform, RangeStage,
    SPEED_OF_LIGHT,
};
