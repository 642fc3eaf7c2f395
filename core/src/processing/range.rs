use crate::config::RadarConfig;
use crate::math::fft::FftHelper;
use crate::math::matrix::stack_rows;
use crate::math::stats::StatsHelper;
use crate::math::window::hamming;
use crate::prelude::{ensure_positive, ProcessingStage, RadarError, RadarResult};
use crate::processing::chirp::{generate_chirp, matched_filter};
use crate::telemetry::log::LogManager;
use ndarray::Array2;
use num_complex::Complex64;
use rayon::prelude::*;

/// Propagation speed used for range conversions, in m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Windows (optionally) and transforms one chirp into range bins.
///
/// Bin `k` corresponds to beat frequency `k·sample_rate/N`. The caller's
/// buffer is never modified.
pub fn range_transform(signal: &[Complex64], apply_window: bool) -> RadarResult<Vec<Complex64>> {
    if signal.is_empty() {
        return Err(RadarError::InsufficientData(
            "range transform needs at least one sample".into(),
        ));
    }
    let window = apply_window.then(|| hamming(signal.len()));
    let mut fft = FftHelper::new(signal.len());
    windowed_transform(&mut fft, signal, window.as_deref())
}

pub(crate) fn windowed_transform(
    fft: &mut FftHelper,
    signal: &[Complex64],
    window: Option<&[f64]>,
) -> RadarResult<Vec<Complex64>> {
    let mut buffer = signal.to_vec();
    if let Some(weights) = window {
        for (sample, weight) in buffer.iter_mut().zip(weights) {
            *sample *= *weight;
        }
    }
    fft.forward_in_place(&mut buffer)?;
    Ok(buffer)
}

/// `c / (2·bandwidth)` using the vacuum speed of light.
pub fn range_resolution(bandwidth: f64) -> RadarResult<f64> {
    range_resolution_with(bandwidth, SPEED_OF_LIGHT)
}

pub fn range_resolution_with(bandwidth: f64, propagation_speed: f64) -> RadarResult<f64> {
    ensure_positive("bandwidth", bandwidth)?;
    ensure_positive("propagation_speed", propagation_speed)?;
    Ok(propagation_speed / (2.0 * bandwidth))
}

pub fn bin_to_range(bin: usize, total_bins: usize, max_range: f64) -> RadarResult<f64> {
    if total_bins == 0 {
        return Err(RadarError::Configuration("total_bins must be > 0".into()));
    }
    if bin >= total_bins {
        return Err(RadarError::index("range bin", bin, total_bins));
    }
    Ok((bin as f64 * max_range) / total_bins as f64)
}

/// Range-compression stage: matched filter against the reference chirp,
/// then the range transform, for every chirp row of a frame.
pub struct RangeStage {
    reference: Vec<Complex64>,
    window: Option<Vec<f64>>,
    fft: Option<FftHelper>,
    logger: LogManager,
}

impl RangeStage {
    pub fn new() -> Self {
        Self {
            reference: Vec::new(),
            window: None,
            fft: None,
            logger: LogManager::new("RangeStage"),
        }
    }

    /// The reference chirp built during initialization.
    pub fn reference(&self) -> &[Complex64] {
        &self.reference
    }
}

impl Default for RangeStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for RangeStage {
    /// Raw samples, one chirp per row.
    type Input = Array2<Complex64>;
    /// Range profiles, one chirp per row.
    type Output = Array2<Complex64>;

    fn initialize(&mut self, config: &RadarConfig) -> RadarResult<()> {
        let samples = config.chirp.samples_per_chirp;
        self.reference = generate_chirp(&config.chirp)?;
        self.window = config.apply_window.then(|| hamming(samples));
        self.fft = Some(FftHelper::new(samples));
        Ok(())
    }

    fn execute(&mut self, input: &Array2<Complex64>) -> RadarResult<Array2<Complex64>> {
        let fft = self
            .fft
            .as_ref()
            .ok_or(RadarError::NotInitialized("RangeStage"))?;

        let (chirps, samples) = input.dim();
        if samples != self.reference.len() {
            let err = RadarError::mismatch("samples per chirp", self.reference.len(), samples);
            self.logger.reject(&err);
            return Err(err);
        }
        if chirps == 0 {
            return Err(RadarError::InsufficientData("frame has no chirps".into()));
        }

        let reference = &self.reference;
        let window = self.window.as_deref();
        let profiles = (0..chirps)
            .into_par_iter()
            .map_init(
                || fft.clone(),
                |fft, idx| -> RadarResult<Vec<Complex64>> {
                    let received = input.row(idx).to_vec();
                    let compressed = matched_filter(&received, reference)?;
                    windowed_transform(fft, &compressed, window)
                },
            )
            .collect::<RadarResult<Vec<_>>>()?;

        let matrix = stack_rows(&profiles)?;
        let peak = StatsHelper::peak_index(&profiles[0]);
        self.logger.record(&format!(
            "chirps {} bins {} first-chirp peak {:?} rms {:.4}",
            chirps,
            samples,
            peak,
            StatsHelper::rms(&profiles[0])
        ));
        Ok(matrix)
    }

    fn cleanup(&mut self) {
        self.reference.clear();
        self.window = None;
        self.fft = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::fft::dft_direct;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::PI;

    fn tone(len: usize, bin: usize) -> Vec<Complex64> {
        (0..len)
            .map(|n| Complex64::from_polar(1.0, 2.0 * PI * (bin * n) as f64 / len as f64))
            .collect()
    }

    #[test]
    fn range_resolution_for_150_mhz() {
        assert_relative_eq!(range_resolution(150e6).unwrap(), 0.9993, epsilon = 1e-4);
        assert!(range_resolution(0.0).is_err());
        assert_relative_eq!(range_resolution_with(1e6, 3e8).unwrap(), 150.0);
    }

    #[test]
    fn unwindowed_tone_peaks_at_its_bin() {
        for bin in [0, 3, 17, 31] {
            let spectrum = range_transform(&tone(32, bin), false).unwrap();
            assert_eq!(spectrum.len(), 32);
            assert_eq!(StatsHelper::peak_index(&spectrum), Some(bin));
            assert_relative_eq!(spectrum[bin].norm(), 32.0, epsilon = 1e-9);
            for (k, value) in spectrum.iter().enumerate() {
                if k != bin {
                    assert!(value.norm() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn windowed_transform_matches_direct_definition() {
        let signal: Vec<Complex64> = (0..10)
            .map(|n| Complex64::new((n as f64 * 0.7).cos(), n as f64 * 0.1))
            .collect();
        let weights = hamming(10);
        let windowed: Vec<Complex64> = signal.iter().zip(&weights).map(|(s, w)| *s * *w).collect();
        let expected = dft_direct(&windowed);
        let actual = range_transform(&signal, true).unwrap();
        for (a, e) in actual.iter().zip(&expected) {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-9);
        }
    }

    #[test]
    fn window_leaves_caller_buffer_untouched() {
        let signal = tone(16, 2);
        let copy = signal.clone();
        range_transform(&signal, true).unwrap();
        assert_eq!(signal, copy);
    }

    #[test]
    fn single_sample_window_is_identity() {
        let sample = [Complex64::new(0.25, -2.0)];
        assert_eq!(range_transform(&sample, true).unwrap(), sample.to_vec());
        assert!(matches!(
            range_transform(&[], true),
            Err(RadarError::InsufficientData(_))
        ));
    }

    #[test]
    fn bin_to_range_scales_linearly() {
        assert_relative_eq!(bin_to_range(64, 256, 200.0).unwrap(), 50.0);
        assert_eq!(bin_to_range(0, 256, 200.0).unwrap(), 0.0);
        assert!(matches!(
            bin_to_range(256, 256, 200.0),
            Err(RadarError::Index { .. })
        ));
        assert!(matches!(
            bin_to_range(0, 0, 200.0),
            Err(RadarError::Configuration(_))
        ));
    }

    #[test]
    fn range_stage_compresses_each_chirp() {
        let mut config = RadarConfig::default();
        config.chirp.samples_per_chirp = 16;
        config.chirps_per_frame = 3;

        let mut stage = RangeStage::new();
        stage.initialize(&config).unwrap();
        let reference = stage.reference().to_vec();
        let rows = vec![reference.clone(), reference.clone(), tone(16, 1)];
        let input = stack_rows(&rows).unwrap();

        let output = stage.execute(&input).unwrap();
        assert_eq!(output.dim(), (3, 16));

        let expected =
            range_transform(&matched_filter(&rows[2], &reference).unwrap(), true).unwrap();
        for (a, e) in output.row(2).iter().zip(&expected) {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-9);
        }
        assert_eq!(output.row(0), output.row(1));
        stage.cleanup();
    }

    #[test]
    fn range_stage_requires_initialization_and_matching_width() {
        let mut stage = RangeStage::new();
        let input = Array2::from_elem((2, 4), Complex64::new(1.0, 0.0));
        assert!(matches!(
            stage.execute(&input),
            Err(RadarError::NotInitialized(_))
        ));

        let mut config = RadarConfig::default();
        config.chirp.samples_per_chirp = 8;
        stage.initialize(&config).unwrap();
        assert!(matches!(
            stage.execute(&input),
            Err(RadarError::DimensionMismatch { .. })
        ));
    }
}
