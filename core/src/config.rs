use crate::prelude::{ensure_positive, RadarError, RadarResult};
use crate::processing::angle::{angular_resolution, AntennaArray, DEFAULT_ANGLE_BINS};
use crate::processing::chirp::ChirpParams;
use crate::processing::clutter::DEFAULT_CLUTTER_THRESHOLD;
use crate::processing::doppler::velocity_resolution;
use crate::processing::range::{range_resolution, SPEED_OF_LIGHT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Geometry of a uniform linear receive array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrayGeometry {
    pub num_elements: usize,
    /// Inter-element spacing in wavelengths.
    pub element_spacing: f64,
}

/// Radar configuration shared by every frame-level stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarConfig {
    pub chirp: ChirpParams,
    /// RF carrier in Hz, used to derive the wavelength.
    pub carrier_frequency: f64,
    pub chirps_per_frame: usize,
    pub array: ArrayGeometry,
    #[serde(default = "default_angle_bins")]
    pub angle_bins: usize,
    #[serde(default = "default_clutter_threshold")]
    pub clutter_threshold: f64,
    #[serde(default = "default_apply_window")]
    pub apply_window: bool,
}

fn default_angle_bins() -> usize {
    DEFAULT_ANGLE_BINS
}

fn default_clutter_threshold() -> f64 {
    DEFAULT_CLUTTER_THRESHOLD
}

fn default_apply_window() -> bool {
    true
}

/// The three scalar resolution metrics of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub range_m: f64,
    pub velocity_mps: f64,
    pub angle_deg: f64,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            chirp: ChirpParams {
                start_frequency: 0.0,
                bandwidth: 150e6,
                chirp_duration: 40e-6,
                sample_rate: 6.4e6,
                samples_per_chirp: 256,
            },
            carrier_frequency: 77e9,
            chirps_per_frame: 64,
            array: ArrayGeometry {
                num_elements: 8,
                element_spacing: 0.5,
            },
            angle_bins: DEFAULT_ANGLE_BINS,
            clutter_threshold: DEFAULT_CLUTTER_THRESHOLD,
            apply_window: true,
        }
    }
}

impl RadarConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> RadarResult<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|source| RadarError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(contents: &str) -> RadarResult<Self> {
        let config: RadarConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RadarResult<()> {
        self.chirp.validate()?;
        ensure_positive("carrier_frequency", self.carrier_frequency)?;
        if self.chirps_per_frame == 0 {
            return Err(RadarError::Configuration(
                "chirps_per_frame must be > 0".into(),
            ));
        }
        if self.array.num_elements == 0 {
            return Err(RadarError::Configuration(
                "array.num_elements must be > 0".into(),
            ));
        }
        ensure_positive("array.element_spacing", self.array.element_spacing)?;
        if self.angle_bins == 0 {
            return Err(RadarError::Configuration("angle_bins must be > 0".into()));
        }
        if !self.clutter_threshold.is_finite() || self.clutter_threshold < 0.0 {
            return Err(RadarError::Configuration(format!(
                "clutter_threshold must be finite and >= 0, got {}",
                self.clutter_threshold
            )));
        }
        Ok(())
    }

    pub fn wavelength(&self) -> f64 {
        SPEED_OF_LIGHT / self.carrier_frequency
    }

    /// Duration of one frame of back-to-back chirps.
    pub fn frame_time(&self) -> f64 {
        self.chirps_per_frame as f64 * self.chirp.chirp_duration
    }

    /// Range covered by the full set of range bins.
    pub fn max_range(&self) -> f64 {
        self.chirp.sample_rate * self.chirp.chirp_duration * SPEED_OF_LIGHT
            / (2.0 * self.chirp.bandwidth)
    }

    /// Unambiguous velocity for the chirp repetition interval.
    pub fn max_velocity(&self) -> f64 {
        self.wavelength() / (4.0 * self.chirp.chirp_duration)
    }

    pub fn resolution(&self) -> RadarResult<Resolution> {
        Ok(Resolution {
            range_m: range_resolution(self.chirp.bandwidth)?,
            velocity_mps: velocity_resolution(
                self.wavelength(),
                self.chirps_per_frame,
                self.frame_time(),
            )?,
            angle_deg: angular_resolution(self.array.num_elements, self.array.element_spacing)?,
        })
    }

    /// Builds a unit-weight array from the configured geometry.
    pub fn antenna_array(&self) -> RadarResult<AntennaArray> {
        AntennaArray::new(self.array.num_elements, self.array.element_spacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const YAML: &str = "chirp:
  start_frequency: 0.0
  bandwidth: 150.0e6
  chirp_duration: 40.0e-6
  sample_rate: 6.4e6
  samples_per_chirp: 128
carrier_frequency: 77.0e9
chirps_per_frame: 32
array:
  num_elements: 4
  element_spacing: 0.5
";

    #[test]
    fn config_load_reads_yaml_and_applies_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(YAML.as_bytes()).unwrap();
        let path = temp.into_temp_path();
        let cfg = RadarConfig::load(&path).unwrap();
        assert_eq!(cfg.chirp.samples_per_chirp, 128);
        assert_eq!(cfg.array.num_elements, 4);
        assert_eq!(cfg.angle_bins, 180);
        assert_relative_eq!(cfg.clutter_threshold, 0.1);
        assert!(cfg.apply_window);
    }

    #[test]
    fn config_load_reports_missing_file() {
        let err = RadarConfig::load("/nonexistent/radar.yaml").unwrap_err();
        assert!(matches!(err, RadarError::Io { .. }));
    }

    #[test]
    fn config_rejects_invalid_values() {
        let yaml = YAML.replace("chirps_per_frame: 32", "chirps_per_frame: 0");
        assert!(matches!(
            RadarConfig::from_yaml_str(&yaml),
            Err(RadarError::Configuration(_))
        ));
        assert!(matches!(
            RadarConfig::from_yaml_str("chirp: [1, 2]"),
            Err(RadarError::Parse(_))
        ));

        let mut cfg = RadarConfig::default();
        cfg.clutter_threshold = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_config_resolution() {
        let cfg = RadarConfig::default();
        cfg.validate().unwrap();
        let res = cfg.resolution().unwrap();
        assert_relative_eq!(res.range_m, 0.999_308_193_3, epsilon = 1e-9);
        assert_relative_eq!(res.angle_deg, 28.647_889_756, epsilon = 1e-6);
        assert_relative_eq!(
            res.velocity_mps,
            cfg.wavelength() / (2.0 * cfg.frame_time()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn max_range_spans_all_range_bins() {
        let cfg = RadarConfig::default();
        let res = cfg.resolution().unwrap();
        let per_bin = cfg.max_range() / cfg.chirp.samples_per_chirp as f64;
        // 256 samples at 6.4 MHz over a 40 us sweep: one bin per resolution cell.
        assert_relative_eq!(per_bin, res.range_m, epsilon = 1e-9);
    }
}
