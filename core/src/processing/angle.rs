//! Digital beamforming over a uniform linear array.
//!
//! The beam pattern is scanned over `angle_bins` equally spaced angles from
//! −90° (inclusive) to +90° (exclusive). Each antenna channel contributes its
//! first sample only, so the spectrum describes a single snapshot.

use crate::config::RadarConfig;
use crate::prelude::{ensure_positive, ProcessingStage, RadarError, RadarResult};
use crate::telemetry::log::LogManager;
use log::debug;
use ndarray::Array2;
use num_complex::Complex64;
use std::f64::consts::PI;

pub const DEFAULT_ANGLE_BINS: usize = 180;

/// Receive array: element count, spacing in wavelengths and per-element
/// complex weights.
#[derive(Debug, Clone, PartialEq)]
pub struct AntennaArray {
    num_elements: usize,
    element_spacing: f64,
    weights: Vec<Complex64>,
}

impl AntennaArray {
    /// Array with unit weights on every element.
    pub fn new(num_elements: usize, element_spacing: f64) -> RadarResult<Self> {
        Self::with_weights(
            num_elements,
            element_spacing,
            vec![Complex64::new(1.0, 0.0); num_elements],
        )
    }

    pub fn with_weights(
        num_elements: usize,
        element_spacing: f64,
        weights: Vec<Complex64>,
    ) -> RadarResult<Self> {
        if num_elements == 0 {
            return Err(RadarError::Configuration(
                "antenna array needs at least one element".into(),
            ));
        }
        ensure_positive("element_spacing", element_spacing)?;
        if weights.len() != num_elements {
            return Err(RadarError::mismatch(
                "antenna weights",
                num_elements,
                weights.len(),
            ));
        }
        Ok(Self {
            num_elements,
            element_spacing,
            weights,
        })
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    pub fn element_spacing(&self) -> f64 {
        self.element_spacing
    }

    pub fn weights(&self) -> &[Complex64] {
        &self.weights
    }

    /// Replaces the element weights; the geometry stays as is.
    pub fn set_weights(&mut self, weights: Vec<Complex64>) -> RadarResult<()> {
        if weights.len() != self.num_elements {
            return Err(RadarError::mismatch(
                "antenna weights",
                self.num_elements,
                weights.len(),
            ));
        }
        self.weights = weights;
        Ok(())
    }
}

/// Scan angle in degrees for `index` out of `angle_bins`.
pub fn scan_angle_deg(index: usize, angle_bins: usize) -> RadarResult<f64> {
    if index >= angle_bins {
        return Err(RadarError::index("angle bin", index, angle_bins));
    }
    Ok(angle_at(index, angle_bins))
}

fn angle_at(index: usize, angle_bins: usize) -> f64 {
    -90.0 + 180.0 * index as f64 / angle_bins as f64
}

/// Weighted steering vectors, one row per scan angle.
fn steering_table(array: &AntennaArray, angle_bins: usize) -> Array2<Complex64> {
    Array2::from_shape_fn((angle_bins, array.num_elements), |(a, e)| {
        let angle_rad = angle_at(a, angle_bins) * PI / 180.0;
        let phase = 2.0 * PI * e as f64 * array.element_spacing * angle_rad.sin();
        array.weights[e] * Complex64::from_polar(1.0, phase)
    })
}

fn scan<S: AsRef<[Complex64]>>(steering: &Array2<Complex64>, antenna_signals: &[S]) -> Vec<f64> {
    let active = steering.ncols().min(antenna_signals.len());
    steering
        .outer_iter()
        .map(|row| {
            let mut sum = Complex64::new(0.0, 0.0);
            for (e, channel) in antenna_signals[..active].iter().enumerate() {
                if let Some(first) = channel.as_ref().first() {
                    sum += row[e] * first;
                }
            }
            sum.norm_sqr()
        })
        .collect()
}

/// Angular power spectrum `|Σₑ w[e]·exp(i·2π·e·d·sin θ)·x[e][0]|²`.
///
/// Elements beyond `min(num_elements, channel count)` are ignored and empty
/// channels contribute nothing. The sum runs in ascending element order.
pub fn digital_beamforming<S: AsRef<[Complex64]>>(
    antenna_signals: &[S],
    array: &AntennaArray,
    angle_bins: usize,
) -> RadarResult<Vec<f64>> {
    if angle_bins == 0 {
        return Err(RadarError::Configuration("angle_bins must be > 0".into()));
    }
    let empty = antenna_signals
        .iter()
        .take(array.num_elements)
        .filter(|channel| channel.as_ref().is_empty())
        .count();
    if empty > 0 {
        debug!("beamforming skips {} empty antenna channel(s)", empty);
    }
    Ok(scan(&steering_table(array, angle_bins), antenna_signals))
}

/// Null-to-null style beamwidth `(2 / (N·d))·(180/π)` in degrees.
pub fn angular_resolution(num_elements: usize, element_spacing: f64) -> RadarResult<f64> {
    let aperture = num_elements as f64 * element_spacing;
    if !aperture.is_finite() || aperture <= 0.0 {
        return Err(RadarError::Configuration(format!(
            "array aperture must be > 0, got {} elements x {} wavelengths",
            num_elements, element_spacing
        )));
    }
    Ok((2.0 / aperture) * (180.0 / PI))
}

/// Beamforming stage with the steering table cached per array configuration.
pub struct BeamformStage {
    array: Option<AntennaArray>,
    angle_bins: usize,
    steering: Option<Array2<Complex64>>,
    logger: LogManager,
}

impl BeamformStage {
    pub fn new() -> Self {
        Self {
            array: None,
            angle_bins: 0,
            steering: None,
            logger: LogManager::new("BeamformStage"),
        }
    }

    pub fn array(&self) -> Option<&AntennaArray> {
        self.array.as_ref()
    }

    /// Reconfigures the element weights and rebuilds the steering table.
    pub fn set_weights(&mut self, weights: Vec<Complex64>) -> RadarResult<()> {
        let array = self
            .array
            .as_mut()
            .ok_or(RadarError::NotInitialized("BeamformStage"))?;
        array.set_weights(weights)?;
        self.steering = Some(steering_table(array, self.angle_bins));
        self.logger.record("antenna weights updated");
        Ok(())
    }
}

impl Default for BeamformStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for BeamformStage {
    /// One sample vector per antenna channel.
    type Input = [Vec<Complex64>];
    /// Power per scan angle.
    type Output = Vec<f64>;

    fn initialize(&mut self, config: &RadarConfig) -> RadarResult<()> {
        if config.angle_bins == 0 {
            return Err(RadarError::Configuration("angle_bins must be > 0".into()));
        }
        let array = config.antenna_array()?;
        self.angle_bins = config.angle_bins;
        self.steering = Some(steering_table(&array, config.angle_bins));
        self.array = Some(array);
        Ok(())
    }

    fn execute(&mut self, input: &[Vec<Complex64>]) -> RadarResult<Vec<f64>> {
        let steering = self
            .steering
            .as_ref()
            .ok_or(RadarError::NotInitialized("BeamformStage"))?;

        let spectrum = scan(steering, input);
        let peak = spectrum
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (idx, &power)| {
                if power > best.1 {
                    (idx, power)
                } else {
                    best
                }
            });
        self.logger.record(&format!(
            "channels {} peak {:.1} deg power {:.4}",
            input.len(),
            angle_at(peak.0, self.angle_bins),
            peak.1
        ));
        Ok(spectrum)
    }

    fn cleanup(&mut self) {
        self.array = None;
        self.steering = None;
        self.angle_bins = 0;
    }
}
