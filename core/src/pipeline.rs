use crate::config::{RadarConfig, Resolution};
use crate::prelude::{ProcessingStage, RadarResult};
use crate::processing::angle::BeamformStage;
use crate::processing::clutter::{mti_filter_all, ClutterStage};
use crate::processing::doppler::DopplerStage;
use crate::processing::range::RangeStage;
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::MetricsRecorder;
use ndarray::Array2;
use num_complex::Complex64;
use std::sync::Arc;

/// Raw samples of one frame.
#[derive(Debug, Clone)]
pub struct FrameInput {
    /// `chirps_per_frame × samples_per_chirp`, one chirp per row.
    pub chirps: Array2<Complex64>,
    /// One sample vector per antenna channel.
    pub antenna_signals: Vec<Vec<Complex64>>,
}

/// Everything one frame produces.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Chirp-major range profiles.
    pub range_profiles: Array2<Complex64>,
    /// Pulse-pair cancelled range profiles, one row fewer than `range_profiles`.
    pub mti: Array2<Complex64>,
    /// Range-major range-Doppler map, fftshifted along velocity: column
    /// `chirps_per_frame / 2` is zero Doppler, as in `bin_to_velocity`.
    pub range_doppler: Array2<Complex64>,
    /// `range_doppler` with the weak cells of the zero-velocity column removed.
    pub suppressed: Array2<Complex64>,
    pub angle_spectrum: Vec<f64>,
    pub resolution: Resolution,
}

/// Chains the range, Doppler, clutter and beamforming stages over frames.
pub struct FramePipeline {
    config: RadarConfig,
    resolution: Resolution,
    range: RangeStage,
    doppler: DopplerStage,
    clutter: ClutterStage,
    beamform: BeamformStage,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl FramePipeline {
    pub fn new(config: RadarConfig) -> RadarResult<Self> {
        config.validate()?;
        let resolution = config.resolution()?;

        let mut range = RangeStage::new();
        range.initialize(&config)?;
        let mut doppler = DopplerStage::new();
        doppler.initialize(&config)?;
        let mut clutter = ClutterStage::new();
        clutter.initialize(&config)?;
        let mut beamform = BeamformStage::new();
        beamform.initialize(&config)?;

        let logger = LogManager::new("FramePipeline");
        logger.record(&format!(
            "configured {}x{} frame, resolution {:.3} m / {:.3} m/s / {:.2} deg",
            config.chirps_per_frame,
            config.chirp.samples_per_chirp,
            resolution.range_m,
            resolution.velocity_mps,
            resolution.angle_deg
        ));

        Ok(Self {
            config,
            resolution,
            range,
            doppler,
            clutter,
            beamform,
            metrics: Arc::new(MetricsRecorder::new()),
            logger,
        })
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        Arc::clone(&self.metrics)
    }

    /// Updates the beamformer weights for subsequent frames.
    pub fn set_antenna_weights(&mut self, weights: Vec<Complex64>) -> RadarResult<()> {
        self.beamform.set_weights(weights)
    }

    pub fn process(&mut self, frame: &FrameInput) -> RadarResult<FrameOutput> {
        let outcome = self.run(frame);
        self.metrics.record_outcome(&outcome);
        if let Err(err) = &outcome {
            self.logger.reject(err);
        }
        outcome
    }

    fn run(&mut self, frame: &FrameInput) -> RadarResult<FrameOutput> {
        let range_profiles = self.range.execute(&frame.chirps)?;
        let range_doppler = self.doppler.execute(&range_profiles)?;
        let mti = mti_filter_all(range_profiles.view())?;
        let suppressed = self.clutter.execute(&range_doppler)?;
        let angle_spectrum = self.beamform.execute(&frame.antenna_signals)?;

        Ok(FrameOutput {
            range_profiles,
            mti,
            range_doppler,
            suppressed,
            angle_spectrum,
            resolution: self.resolution,
        })
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.range.cleanup();
        self.doppler.cleanup();
        self.clutter.cleanup();
        self.beamform.cleanup();
    }
}
