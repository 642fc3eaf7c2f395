use crate::config::RadarConfig;
use crate::prelude::{ProcessingStage, RadarError, RadarResult};
use crate::telemetry::log::LogManager;
use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

pub const DEFAULT_CLUTTER_THRESHOLD: f64 = 0.1;

/// Two-pulse canceller on one range bin: `out[p−1] = x[p] − x[p−1]`.
///
/// `pulse_data` holds one range profile per row.
pub fn mti_filter(
    pulse_data: ArrayView2<'_, Complex64>,
    range_bin: usize,
) -> RadarResult<Vec<Complex64>> {
    let (pulses, bins) = pulse_data.dim();
    if pulses < 2 {
        return Err(RadarError::InsufficientData(format!(
            "MTI needs at least 2 pulses, got {}",
            pulses
        )));
    }
    if range_bin >= bins {
        return Err(RadarError::index("range bin", range_bin, bins));
    }
    let column = pulse_data.column(range_bin);
    Ok(column
        .iter()
        .zip(column.iter().skip(1))
        .map(|(prev, next)| next - prev)
        .collect())
}

/// Runs [`mti_filter`] on every range bin; row `p` of the result is the
/// difference between pulses `p + 1` and `p`.
pub fn mti_filter_all(pulse_data: ArrayView2<'_, Complex64>) -> RadarResult<Array2<Complex64>> {
    let (pulses, bins) = pulse_data.dim();
    if pulses < 2 {
        return Err(RadarError::InsufficientData(format!(
            "MTI needs at least 2 pulses, got {}",
            pulses
        )));
    }
    let mut output = Array2::zeros((pulses - 1, bins));
    for bin in 0..bins {
        let cancelled = mti_filter(pulse_data, bin)?;
        for (cell, value) in output.column_mut(bin).iter_mut().zip(cancelled) {
            *cell = value;
        }
    }
    Ok(output)
}

/// Zeroes weak returns in the zero-velocity column of a range-Doppler map.
///
/// The map is range-major (row = range bin, column = velocity bin). Cells in
/// column `num_velocities / 2` whose magnitude is below `clutter_threshold`
/// become zero; every other cell is copied as is. The result is flattened
/// row-major.
pub fn adaptive_clutter_suppression(
    range_doppler_map: ArrayView2<'_, Complex64>,
    clutter_threshold: f64,
) -> RadarResult<Vec<Complex64>> {
    if !clutter_threshold.is_finite() || clutter_threshold < 0.0 {
        return Err(RadarError::Configuration(format!(
            "clutter_threshold must be finite and >= 0, got {}",
            clutter_threshold
        )));
    }
    let center = range_doppler_map.ncols() / 2;
    Ok(range_doppler_map
        .indexed_iter()
        .map(|((_, velocity), &value)| {
            if velocity == center && value.norm() < clutter_threshold {
                Complex64::new(0.0, 0.0)
            } else {
                value
            }
        })
        .collect())
}

/// Number of zero-velocity cells weak enough to be suppressed.
fn weak_centre_cells(map: ArrayView2<'_, Complex64>, clutter_threshold: f64) -> usize {
    if map.ncols() == 0 {
        return 0;
    }
    map.column(map.ncols() / 2)
        .iter()
        .filter(|value| value.norm() < clutter_threshold)
        .count()
}

/// Clutter stage applying [`adaptive_clutter_suppression`] to a full map.
pub struct ClutterStage {
    threshold: Option<f64>,
    logger: LogManager,
}

impl ClutterStage {
    pub fn new() -> Self {
        Self {
            threshold: None,
            logger: LogManager::new("ClutterStage"),
        }
    }
}

impl Default for ClutterStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for ClutterStage {
    type Input = Array2<Complex64>;
    type Output = Array2<Complex64>;

    fn initialize(&mut self, config: &RadarConfig) -> RadarResult<()> {
        if !config.clutter_threshold.is_finite() || config.clutter_threshold < 0.0 {
            return Err(RadarError::Configuration(format!(
                "clutter_threshold must be finite and >= 0, got {}",
                config.clutter_threshold
            )));
        }
        self.threshold = Some(config.clutter_threshold);
        Ok(())
    }

    fn execute(&mut self, input: &Array2<Complex64>) -> RadarResult<Array2<Complex64>> {
        let threshold = self
            .threshold
            .ok_or(RadarError::NotInitialized("ClutterStage"))?;

        let flat = adaptive_clutter_suppression(input.view(), threshold)?;
        let zeroed = weak_centre_cells(input.view(), threshold);
        self.logger.record(&format!(
            "threshold {:.3} suppressed {} of {} centre cells",
            threshold,
            zeroed,
            input.nrows()
        ));
        let found = flat.len();
        Array2::from_shape_vec(input.dim(), flat)
            .map_err(|_| RadarError::mismatch("range-Doppler cells", input.len(), found))
    }

    fn cleanup(&mut self) {
        self.threshold = None;
    }
}
