use crate::config::RadarConfig;

/// Error kinds surfaced by every processing operation.
#[derive(thiserror::Error, Debug)]
pub enum RadarError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("index {index} out of range for {what} of length {len}")]
    Index {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("dimension mismatch: expected {expected}, found {found} ({context})")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("stage not initialized: {0}")]
    NotInitialized(&'static str),
    #[error("reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type RadarResult<T> = Result<T, RadarError>;

impl RadarError {
    pub(crate) fn index(what: &'static str, index: usize, len: usize) -> Self {
        Self::Index { what, index, len }
    }

    pub(crate) fn mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }
}

/// Checks that a scalar parameter is finite and strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> RadarResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RadarError::Configuration(format!(
            "{name} must be finite and > 0, got {value}"
        )))
    }
}

/// Trait describing the frame-level signal-processing stages.
///
/// Stages are configured once from a [`RadarConfig`] and may then execute any
/// number of frames. `cleanup` drops cached state; a stage executed after
/// cleanup (or before initialization) fails with [`RadarError::NotInitialized`].
pub trait ProcessingStage {
    type Input: ?Sized;
    type Output;

    fn initialize(&mut self, config: &RadarConfig) -> RadarResult<()>;
    fn execute(&mut self, input: &Self::Input) -> RadarResult<Self::Output>;
    fn cleanup(&mut self);
}
