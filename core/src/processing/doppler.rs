use crate::config::RadarConfig;
use crate::math::fft::FftHelper;
use crate::math::matrix::stack_rows;
use crate::math::stats::StatsHelper;
use crate::prelude::{ensure_positive, ProcessingStage, RadarError, RadarResult};
use crate::processing::range::windowed_transform;
use crate::telemetry::log::LogManager;
use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;
use rayon::prelude::*;

/// Velocity spectrum of one range bin across all chirps of a frame.
///
/// `range_profiles` is chirp-major (row = chirp, column = range bin). The
/// output has one bin per chirp, in natural transform order.
pub fn doppler_transform(
    range_profiles: ArrayView2<'_, Complex64>,
    range_bin: usize,
) -> RadarResult<Vec<Complex64>> {
    let (chirps, bins) = range_profiles.dim();
    if chirps == 0 {
        return Err(RadarError::InsufficientData(
            "doppler transform needs at least one range profile".into(),
        ));
    }
    if range_bin >= bins {
        return Err(RadarError::index("range bin", range_bin, bins));
    }
    let slow_time = range_profiles.column(range_bin).to_vec();
    let mut fft = FftHelper::new(chirps);
    windowed_transform(&mut fft, &slow_time, None)
}

/// Same as [`doppler_transform`] for profiles held as separate vectors.
pub fn doppler_transform_rows<R: AsRef<[Complex64]>>(
    range_profiles: &[R],
    range_bin: usize,
) -> RadarResult<Vec<Complex64>> {
    let matrix = stack_rows(range_profiles)?;
    doppler_transform(matrix.view(), range_bin)
}

/// `wavelength / (2·num_chirps·(frame_time/num_chirps))`.
///
/// Evaluated in this chirp-interval form, not as `wavelength / (2·frame_time)`.
pub fn velocity_resolution(wavelength: f64, num_chirps: usize, frame_time: f64) -> RadarResult<f64> {
    ensure_positive("wavelength", wavelength)?;
    ensure_positive("frame_time", frame_time)?;
    if num_chirps == 0 {
        return Err(RadarError::Configuration("num_chirps must be > 0".into()));
    }
    let chirps = num_chirps as f64;
    Ok(wavelength / (2.0 * chirps * (frame_time / chirps)))
}

/// Maps a velocity bin to m/s with bin `total_bins / 2` (integer division)
/// as zero velocity.
pub fn bin_to_velocity(bin: usize, total_bins: usize, max_velocity: f64) -> RadarResult<f64> {
    if total_bins == 0 {
        return Err(RadarError::Configuration("total_bins must be > 0".into()));
    }
    if bin >= total_bins {
        return Err(RadarError::index("velocity bin", bin, total_bins));
    }
    let centered = bin as f64 - (total_bins / 2) as f64;
    Ok((centered * 2.0 * max_velocity) / total_bins as f64)
}

/// Doppler stage producing the range-Doppler map of a frame.
///
/// Input is the chirp-major range-profile matrix from the range stage; the
/// output is range-major (row = range bin, column = velocity bin). Each row
/// is fftshifted, so column `chirps / 2` holds zero Doppler and the columns
/// line up with [`bin_to_velocity`]. [`doppler_transform`] itself keeps the
/// natural transform order.
pub struct DopplerStage {
    chirps_per_frame: usize,
    fft: Option<FftHelper>,
    logger: LogManager,
}

impl DopplerStage {
    pub fn new() -> Self {
        Self {
            chirps_per_frame: 0,
            fft: None,
            logger: LogManager::new("DopplerStage"),
        }
    }
}

impl Default for DopplerStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for DopplerStage {
    type Input = Array2<Complex64>;
    type Output = Array2<Complex64>;

    fn initialize(&mut self, config: &RadarConfig) -> RadarResult<()> {
        if config.chirps_per_frame == 0 {
            return Err(RadarError::Configuration(
                "chirps_per_frame must be > 0".into(),
            ));
        }
        self.chirps_per_frame = config.chirps_per_frame;
        self.fft = Some(FftHelper::new(config.chirps_per_frame));
        Ok(())
    }

    fn execute(&mut self, input: &Array2<Complex64>) -> RadarResult<Array2<Complex64>> {
        let fft = self
            .fft
            .as_ref()
            .ok_or(RadarError::NotInitialized("DopplerStage"))?;

        let (chirps, bins) = input.dim();
        if chirps != self.chirps_per_frame {
            let err = RadarError::mismatch("chirps per frame", self.chirps_per_frame, chirps);
            self.logger.reject(&err);
            return Err(err);
        }
        if bins == 0 {
            return Err(RadarError::InsufficientData("frame has no range bins".into()));
        }

        let centre = chirps / 2;
        let spectra = (0..bins)
            .into_par_iter()
            .map_init(
                || fft.clone(),
                |fft, bin| -> RadarResult<Vec<Complex64>> {
                    let slow_time = input.column(bin).to_vec();
                    let mut spectrum = windowed_transform(fft, &slow_time, None)?;
                    spectrum.rotate_right(centre);
                    Ok(spectrum)
                },
            )
            .collect::<RadarResult<Vec<_>>>()?;

        let map = stack_rows(&spectra)?;
        let strongest = spectra
            .iter()
            .map(|row| StatsHelper::rms(row))
            .fold(0.0_f64, f64::max);
        self.logger.record(&format!(
            "range bins {} velocity bins {} max row rms {:.4}",
            bins, chirps, strongest
        ));
        Ok(map)
    }

    fn cleanup(&mut self) {
        self.chirps_per_frame = 0;
        self.fft = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::PI;

    /// Eight chirps, four range bins; bin 2 carries a slow-time tone at
    /// Doppler bin 3, everything else is static.
    fn profiles() -> Array2<Complex64> {
        Array2::from_shape_fn((8, 4), |(chirp, bin)| {
            if bin == 2 {
                Complex64::from_polar(1.0, 2.0 * PI * (3 * chirp) as f64 / 8.0)
            } else {
                Complex64::new(bin as f64, 0.0)
            }
        })
    }

    #[test]
    fn doppler_output_length_matches_chirp_count() {
        let spectrum = doppler_transform(profiles().view(), 0).unwrap();
        assert_eq!(spectrum.len(), 8);
    }

    #[test]
    fn moving_bin_peaks_at_its_doppler_bin() {
        let spectrum = doppler_transform(profiles().view(), 2).unwrap();
        assert_eq!(StatsHelper::peak_index(&spectrum), Some(3));
        assert_relative_eq!(spectrum[3].norm(), 8.0, epsilon = 1e-9);

        let stationary = doppler_transform(profiles().view(), 1).unwrap();
        assert_abs_diff_eq!(stationary[0], Complex64::new(8.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn out_of_range_bin_is_an_index_error() {
        assert!(matches!(
            doppler_transform(profiles().view(), 4),
            Err(RadarError::Index { index: 4, len: 4, .. })
        ));
        let empty = Array2::<Complex64>::zeros((0, 4));
        assert!(matches!(
            doppler_transform(empty.view(), 0),
            Err(RadarError::InsufficientData(_))
        ));
    }

    #[test]
    fn ragged_profiles_are_rejected() {
        let rows = vec![vec![Complex64::new(1.0, 0.0); 4], vec![Complex64::new(1.0, 0.0); 3]];
        assert!(matches!(
            doppler_transform_rows(&rows, 0),
            Err(RadarError::DimensionMismatch { .. })
        ));
        let rows = vec![vec![Complex64::new(1.0, 0.0); 4]; 2];
        assert_eq!(doppler_transform_rows(&rows, 3).unwrap().len(), 2);
    }

    #[test]
    fn center_bin_maps_to_zero_velocity() {
        assert_eq!(bin_to_velocity(32, 64, 100.0).unwrap(), 0.0);
        assert_relative_eq!(bin_to_velocity(0, 64, 100.0).unwrap(), -100.0);
        // Odd bin counts floor the centre: 7 / 2 == 3.
        assert_relative_eq!(bin_to_velocity(3, 7, 70.0).unwrap(), 0.0);
        assert_relative_eq!(bin_to_velocity(6, 7, 70.0).unwrap(), 60.0);
        assert!(bin_to_velocity(64, 64, 100.0).is_err());
    }

    #[test]
    fn velocity_resolution_matches_simplified_form() {
        let wavelength = 299_792_458.0 / 77e9;
        let res = velocity_resolution(wavelength, 64, 64.0 * 40e-6).unwrap();
        assert_relative_eq!(res, wavelength / (2.0 * 64.0 * 40e-6), epsilon = 1e-12);
        assert!(velocity_resolution(wavelength, 0, 1.0).is_err());
        assert!(velocity_resolution(-1.0, 4, 1.0).is_err());
    }

    #[test]
    fn doppler_stage_centres_zero_velocity() {
        let mut config = RadarConfig::default();
        config.chirps_per_frame = 8;

        let mut stage = DopplerStage::new();
        stage.initialize(&config).unwrap();
        let map = stage.execute(&profiles()).unwrap();

        // Static bin 1 collapses into the centre column.
        assert_abs_diff_eq!(map[[1, 4]], Complex64::new(8.0, 0.0), epsilon = 1e-9);
        for velocity in (0..8).filter(|&v| v != 4) {
            assert_abs_diff_eq!(map[[1, velocity]].norm(), 0.0, epsilon = 1e-9);
        }
        assert_eq!(bin_to_velocity(4, 8, 10.0).unwrap(), 0.0);

        // Doppler bin 3 lands three columns right of centre, wrapping to 7.
        assert_eq!(StatsHelper::peak_index(&map.row(2).to_vec()), Some(7));
        assert_relative_eq!(map[[2, 7]].norm(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn doppler_stage_builds_range_major_map() {
        let mut config = RadarConfig::default();
        config.chirps_per_frame = 8;

        let mut stage = DopplerStage::new();
        stage.initialize(&config).unwrap();
        let map = stage.execute(&profiles()).unwrap();
        assert_eq!(map.dim(), (4, 8));

        let mut expected = doppler_transform(profiles().view(), 2).unwrap();
        expected.rotate_right(4);
        for (a, e) in map.row(2).iter().zip(&expected) {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-12);
        }

        let short = Array2::<Complex64>::zeros((4, 4));
        assert!(matches!(
            stage.execute(&short),
            Err(RadarError::DimensionMismatch { expected: 8, found: 4, .. })
        ));
        stage.cleanup();
        assert!(matches!(
            stage.execute(&profiles()),
            Err(RadarError::NotInitialized(_))
        ));
    }
}
