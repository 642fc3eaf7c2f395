use crate::prelude::RadarError;
use log::{info, warn};

/// Stage-scoped logger; every line is prefixed with the stage name.
pub struct LogManager {
    stage: &'static str,
}

impl LogManager {
    pub fn new(stage: &'static str) -> Self {
        Self { stage }
    }

    pub fn record(&self, message: &str) {
        info!("{}: {}", self.stage, message);
    }

    pub fn reject(&self, error: &RadarError) {
        warn!("{} rejected input: {}", self.stage, error);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("fmcwcore")
    }
}
