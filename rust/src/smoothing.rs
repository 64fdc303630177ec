//! Noise smoothing of distance series.
//!
//! `SavitzkyGolay` fits a polynomial of order `polyorder` by least squares
//! over a sliding odd-length window and replaces the centre sample with the
//! fitted value. The first and last `window / 2` samples are taken from a
//! single polynomial fitted to the first and last full window respectively,
//! so the output has exactly as many samples as the input.

use nalgebra::DMatrix;
use ndarray::{s, Array1, ArrayView1};

use crate::error::{HoppingError, Result};

/// A pure series-to-series filter that preserves length.
pub trait Smoother: Sync {
    /// Smoothed copy of `series`.
    fn smooth(&self, series: ArrayView1<f64>) -> Result<Array1<f64>>;
}

/// Savitzky–Golay smoothing filter.
#[derive(Clone, Debug, PartialEq)]
pub struct SavitzkyGolay {
    window: usize,
    polyorder: usize,
    /// Least-squares projector, (polyorder + 1) × window.
    projector: DMatrix<f64>,
}

impl SavitzkyGolay {
    /// Create a filter; `window` must be odd and ≥ 3, `polyorder < window`.
    pub fn new(window: usize, polyorder: usize) -> Result<Self> {
        if window < 3 || window % 2 == 0 {
            return Err(HoppingError::window(format!(
                "window length must be odd and at least 3, got {}",
                window
            )));
        }
        if polyorder >= window {
            return Err(HoppingError::window(format!(
                "polyorder {} must be less than window length {}",
                polyorder, window
            )));
        }

        let projector = fit_projector(window, polyorder)?;
        Ok(Self {
            window,
            polyorder,
            projector,
        })
    }

    /// Window length in samples.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Polynomial order.
    pub fn polyorder(&self) -> usize {
        self.polyorder
    }
}

/// Pseudo-inverse of the Vandermonde matrix over offsets `-half..=half`.
///
/// Row `j` maps a window of samples to the `x^j` coefficient of the fitted
/// polynomial, with `x` measured from the window centre.
fn fit_projector(window: usize, polyorder: usize) -> Result<DMatrix<f64>> {
    let half = (window / 2) as f64;
    let vandermonde = DMatrix::from_fn(window, polyorder + 1, |i, j| {
        (i as f64 - half).powi(j as i32)
    });
    vandermonde
        .pseudo_inverse(1e-12)
        .map_err(|e| HoppingError::Numerical(e.to_string()))
}

/// Evaluate the polynomial fitted to `samples` at offset `x` from the window centre.
fn fit_and_eval(projector: &DMatrix<f64>, samples: ArrayView1<f64>, x: f64) -> f64 {
    let mut value = 0.0;
    let mut power = 1.0;
    for j in 0..projector.nrows() {
        let coeff: f64 = samples
            .iter()
            .enumerate()
            .map(|(i, &y)| projector[(j, i)] * y)
            .sum();
        value += coeff * power;
        power *= x;
    }
    value
}

impl Smoother for SavitzkyGolay {
    fn smooth(&self, series: ArrayView1<f64>) -> Result<Array1<f64>> {
        let n = series.len();
        let w = self.window;
        if w > n {
            return Err(HoppingError::window(format!(
                "window length {} exceeds series length {}",
                w, n
            )));
        }

        let projector = &self.projector;
        let half = w / 2;
        let mut out = Array1::<f64>::zeros(n);

        // interior: centre value of each sliding fit is row 0 of the projector
        for t in half..n - half {
            let window = series.slice(s![t - half..t + half + 1]);
            out[t] = window
                .iter()
                .enumerate()
                .map(|(i, &y)| projector[(0, i)] * y)
                .sum();
        }

        // edges: one fit over the first / last full window
        let head = series.slice(s![0..w]);
        for t in 0..half {
            out[t] = fit_and_eval(projector, head, t as f64 - half as f64);
        }
        let tail = series.slice(s![n - w..n]);
        for t in n - half..n {
            let offset = (t - (n - w)) as f64 - half as f64;
            out[t] = fit_and_eval(projector, tail, offset);
        }

        Ok(out)
    }
}

/// Leaves the series untouched; for trajectories that are already smooth.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSmoothing;

impl Smoother for NoSmoothing {
    fn smooth(&self, series: ArrayView1<f64>) -> Result<Array1<f64>> {
        Ok(series.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn test_rejects_even_or_short_window() {
        assert!(matches!(
            SavitzkyGolay::new(4, 2),
            Err(HoppingError::MalformedWindow(_))
        ));
        assert!(matches!(
            SavitzkyGolay::new(1, 0),
            Err(HoppingError::MalformedWindow(_))
        ));
        assert!(matches!(
            SavitzkyGolay::new(5, 5),
            Err(HoppingError::MalformedWindow(_))
        ));
    }

    #[test]
    fn test_rejects_window_longer_than_series() {
        let sg = SavitzkyGolay::new(7, 2).unwrap();
        let series = array![1.0, 2.0, 3.0];
        assert!(matches!(
            sg.smooth(series.view()),
            Err(HoppingError::MalformedWindow(_))
        ));
    }

    #[test]
    fn test_preserves_length() {
        let sg = SavitzkyGolay::new(5, 2).unwrap();
        let series = Array1::from_iter((0..17).map(|i| (i as f64 * 0.7).sin()));
        let out = sg.smooth(series.view()).unwrap();
        assert_eq!(out.len(), 17);
    }

    #[test]
    fn test_reproduces_quadratic_exactly() {
        // a polynomial of order <= polyorder passes through unchanged, edges included
        let sg = SavitzkyGolay::new(5, 2).unwrap();
        let series = Array1::from_iter((0..12).map(|i| {
            let x = i as f64;
            0.5 * x * x - 3.0 * x + 2.0
        }));
        let out = sg.smooth(series.view()).unwrap();
        for (a, b) in out.iter().zip(series.iter()) {
            assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_known_coefficients() {
        // classic 5-point quadratic weights: (-3, 12, 17, 12, -3) / 35
        let sg = SavitzkyGolay::new(5, 2).unwrap();
        let series = array![0.0, 0.0, 0.0, 0.0, 35.0, 0.0, 0.0, 0.0, 0.0];
        let out = sg.smooth(series.view()).unwrap();
        assert!((out[2] + 3.0).abs() < 1e-9);
        assert!((out[3] - 12.0).abs() < 1e-9);
        assert!((out[4] - 17.0).abs() < 1e-9);
        assert!((out[5] - 12.0).abs() < 1e-9);
        assert!((out[6] + 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_equal_to_length() {
        let sg = SavitzkyGolay::new(3, 1).unwrap();
        let series = array![1.0, 2.0, 3.0];
        let out = sg.smooth(series.view()).unwrap();
        for (a, b) in out.iter().zip(series.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_damps_alternating_noise() {
        let sg = SavitzkyGolay::new(7, 2).unwrap();
        let series = Array1::from_iter((0..30).map(|i| 3.0 + if i % 2 == 0 { 0.5 } else { -0.5 }));
        let out = sg.smooth(series.view()).unwrap();
        for t in 3..27 {
            assert!((out[t] - 3.0).abs() < 0.5);
        }
    }

    #[test]
    fn test_no_smoothing_is_identity() {
        let series = array![4.0, 1.0, 9.0];
        let out = NoSmoothing.smooth(series.view()).unwrap();
        assert_eq!(out, series);
    }
}
