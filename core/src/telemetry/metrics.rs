use crate::prelude::RadarResult;
use std::sync::Mutex;

/// Frame counters shared by a pipeline and whoever polls it.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames: usize,
    pub errors: usize,
}

#[derive(Default)]
struct Metrics {
    frames: usize,
    errors: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_frame(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    /// Counts a finished frame or a failure depending on `outcome`.
    pub fn record_outcome<T>(&self, outcome: &RadarResult<T>) {
        match outcome {
            Ok(_) => self.record_frame(),
            Err(_) => self.record_error(),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            MetricsSnapshot {
                frames: metrics.frames,
                errors: metrics.errors,
            }
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
