use std::f64::consts::PI;

/// Hamming taper `0.54 − 0.46·cos(2π·i/(N−1))`. A single-sample window is 1.
pub fn hamming(len: usize) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}
