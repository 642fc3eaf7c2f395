use num_complex::Complex64;

pub struct StatsHelper;

impl StatsHelper {
    pub fn rms(samples: &[Complex64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|v| v.norm_sqr()).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    /// Index of the strongest sample; the first one wins on ties.
    pub fn peak_index(samples: &[Complex64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, value) in samples.iter().enumerate() {
            let power = value.norm_sqr();
            match best {
                Some((_, current)) if power <= current => {}
                _ => best = Some((idx, power)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}
