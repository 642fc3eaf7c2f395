use crate::prelude::{RadarError, RadarResult};
use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner for reuse across frames.
///
/// The forward transform follows X[k] = Σₙ x[n]·exp(−2πi·k·n/N) with natural
/// bin ordering, matching [`dft_direct`]. Clones share the planned transform
/// and own their scratch, so one clone per worker thread is enough.
#[derive(Clone)]
pub struct FftHelper {
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex64::zero(); fft.get_inplace_scratch_len()];
        Self { fft, scratch }
    }

    pub fn len(&self) -> usize {
        self.fft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fft.len() == 0
    }

    /// Transforms `input` into a freshly allocated spectrum.
    pub fn forward(&mut self, input: &[Complex64]) -> RadarResult<Vec<Complex64>> {
        let mut buffer = input.to_vec();
        self.forward_in_place(&mut buffer)?;
        Ok(buffer)
    }

    /// The buffer must match the planned size exactly.
    pub fn forward_in_place(&mut self, buffer: &mut [Complex64]) -> RadarResult<()> {
        if buffer.len() != self.fft.len() {
            return Err(RadarError::mismatch(
                "transform length",
                self.fft.len(),
                buffer.len(),
            ));
        }
        if buffer.is_empty() {
            return Ok(());
        }
        self.fft.process_with_scratch(buffer, &mut self.scratch);
        Ok(())
    }
}

/// One-shot forward transform sized to `input`.
pub fn forward(input: &[Complex64]) -> RadarResult<Vec<Complex64>> {
    FftHelper::new(input.len()).forward(input)
}

/// Direct O(N²) DFT. Reference form for the fast path.
pub fn dft_direct(input: &[Complex64]) -> Vec<Complex64> {
    let n = input.len();
    (0..n)
        .map(|k| {
            input
                .iter()
                .enumerate()
                .map(|(idx, &x)| {
                    let angle = -2.0 * PI * (k * idx) as f64 / n as f64;
                    x * Complex64::from_polar(1.0, angle)
                })
                .sum::<Complex64>()
        })
        .collect()
}
