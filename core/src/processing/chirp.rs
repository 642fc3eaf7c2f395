//! Linear FMCW chirp synthesis and matched filtering.

use crate::prelude::{ensure_positive, RadarError, RadarResult};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Waveform parameters of one linear frequency sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChirpParams {
    /// Sweep start frequency in Hz.
    pub start_frequency: f64,
    /// Swept bandwidth in Hz.
    pub bandwidth: f64,
    /// Sweep duration in seconds.
    pub chirp_duration: f64,
    /// ADC sample rate in Hz.
    pub sample_rate: f64,
    pub samples_per_chirp: usize,
}

impl ChirpParams {
    pub fn validate(&self) -> RadarResult<()> {
        if !self.start_frequency.is_finite() || self.start_frequency < 0.0 {
            return Err(RadarError::Configuration(format!(
                "start_frequency must be finite and >= 0, got {}",
                self.start_frequency
            )));
        }
        ensure_positive("bandwidth", self.bandwidth)?;
        ensure_positive("chirp_duration", self.chirp_duration)?;
        ensure_positive("sample_rate", self.sample_rate)?;
        if self.samples_per_chirp == 0 {
            return Err(RadarError::Configuration(
                "samples_per_chirp must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Sweep slope in Hz/s.
    pub fn slope(&self) -> f64 {
        self.bandwidth / self.chirp_duration
    }
}

/// Synthesizes the unit-magnitude reference chirp.
///
/// Sample `i` sits at `t = i / sample_rate` with phase
/// `2π·(f0·t + ½·slope·t²)`, the integral of `f(t) = f0 + slope·t`.
pub fn generate_chirp(params: &ChirpParams) -> RadarResult<Vec<Complex64>> {
    params.validate()?;
    let slope = params.slope();
    let chirp = (0..params.samples_per_chirp)
        .map(|i| {
            let t = i as f64 / params.sample_rate;
            let phase = 2.0 * PI * (params.start_frequency * t + 0.5 * slope * t * t);
            Complex64::from_polar(1.0, phase)
        })
        .collect();
    Ok(chirp)
}

/// Causal correlation of `received` against `reference`:
/// `out[n] = Σₖ received[n−k]·conj(reference[k])` for `0 ≤ n−k`.
///
/// Both buffers must have the same length; no truncation or padding is
/// applied. The output has the length of `received`.
pub fn matched_filter(
    received: &[Complex64],
    reference: &[Complex64],
) -> RadarResult<Vec<Complex64>> {
    if reference.is_empty() {
        return Err(RadarError::InsufficientData(
            "matched filter reference is empty".into(),
        ));
    }
    if received.len() != reference.len() {
        return Err(RadarError::mismatch(
            "received vs reference length",
            reference.len(),
            received.len(),
        ));
    }

    let conj_ref: Vec<Complex64> = reference.iter().map(|r| r.conj()).collect();
    let output = (0..received.len())
        .map(|n| {
            conj_ref[..=n]
                .iter()
                .enumerate()
                .map(|(k, r)| received[n - k] * r)
                .sum::<Complex64>()
        })
        .collect();
    Ok(output)
}
