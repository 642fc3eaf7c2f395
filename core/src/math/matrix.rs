use crate::prelude::{RadarError, RadarResult};
use ndarray::Array2;
use num_complex::Complex64;

/// Stacks per-chirp rows into a contiguous chirp-major matrix.
///
/// Row `r` of the result is `rows[r]`. Every row must have the same length as
/// the first one, otherwise the call fails with `DimensionMismatch`.
pub fn stack_rows<R: AsRef<[Complex64]>>(rows: &[R]) -> RadarResult<Array2<Complex64>> {
    let width = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);
    let mut flat = Vec::with_capacity(rows.len() * width);
    for row in rows {
        let row = row.as_ref();
        if row.len() != width {
            return Err(RadarError::mismatch("row length", width, row.len()));
        }
        flat.extend_from_slice(row);
    }
    let found = flat.len();
    Array2::from_shape_vec((rows.len(), width), flat)
        .map_err(|_| RadarError::mismatch("matrix elements", rows.len() * width, found))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn stack_rows_keeps_chirp_major_order() {
        let rows = vec![vec![c(1.0), c(2.0), c(3.0)], vec![c(4.0), c(5.0), c(6.0)]];
        let matrix = stack_rows(&rows).unwrap();
        assert_eq!(matrix.dim(), (2, 3));
        assert_eq!(matrix[[1, 0]], c(4.0));
        assert_eq!(matrix[[0, 2]], c(3.0));
    }

    #[test]
    fn stack_rows_rejects_ragged_input() {
        let rows = vec![vec![c(1.0), c(2.0)], vec![c(3.0)]];
        assert!(matches!(
            stack_rows(&rows),
            Err(RadarError::DimensionMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn stack_rows_accepts_empty_input() {
        let rows: Vec<Vec<Complex64>> = Vec::new();
        assert_eq!(stack_rows(&rows).unwrap().dim(), (0, 0));
    }
}
