//! Shapiro-Wilk W test (Royston 1995, AS R94).
//!
//! Coefficients are approximated from expected normal order statistics with
//! Royston's polynomial corrections; p-values use the exact distribution for
//! n = 3 and normalizing transformations of `1 - W` above that.

use std::f64::consts::{FRAC_PI_3, PI, SQRT_2};

use ensemble_core::errors::NormalityError;
use statrs::function::erf::{erfc, erfc_inv};

/// Smallest sample range treated as non-constant.
const MIN_RANGE: f64 = 1e-19;

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// Outcome of one test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilkResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// A Shapiro-Wilk test prepared for a fixed sample size.
///
/// The coefficients only depend on `n`, so a field test builds one of these
/// and reuses it for every voxel.
#[derive(Debug, Clone)]
pub struct ShapiroWilk {
    n: usize,
    /// Antisymmetric weights over the sorted sample, length `n`.
    weights: Vec<f64>,
}

/// `c[0] + c[1] x + c[2] x^2 + ...`
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

/// Standard normal quantile.
fn normal_quantile(p: f64) -> f64 {
    -SQRT_2 * erfc_inv(2.0 * p)
}

/// Standard normal upper tail probability.
fn normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / SQRT_2)
}

impl ShapiroWilk {
    pub fn new(n: usize) -> Result<Self, NormalityError> {
        if n < 3 {
            return Err(NormalityError::TooFewSamples {
                required: 3,
                actual: n,
            });
        }
        let half = half_coefficients(n);
        let mut weights = vec![0.0; n];
        for (i, &a) in half.iter().enumerate() {
            weights[i] = -a;
            weights[n - 1 - i] = a;
        }
        Ok(Self { n, weights })
    }

    pub fn sample_size(&self) -> usize {
        self.n
    }

    /// Run the test. `samples` is sorted in place.
    pub fn test(&self, samples: &mut [f64]) -> Result<ShapiroWilkResult, NormalityError> {
        if samples.len() != self.n {
            return Err(NormalityError::SampleSizeMismatch {
                expected: self.n,
                actual: samples.len(),
            });
        }
        if samples.iter().any(|x| !x.is_finite()) {
            return Err(NormalityError::NonFiniteSample);
        }
        samples.sort_by(f64::total_cmp);

        let low = samples[0];
        let range = samples[self.n - 1] - low;
        if range < MIN_RANGE {
            return Ok(ShapiroWilkResult {
                statistic: 1.0,
                p_value: 1.0,
            });
        }

        // W is the squared correlation between the weights and the sample.
        let n = self.n as f64;
        let mean_weight = self.weights.iter().sum::<f64>() / n;
        let mean_x = samples.iter().map(|&x| (x - low) / range).sum::<f64>() / n;
        let (mut ssa, mut ssx, mut sax) = (0.0, 0.0, 0.0);
        for (&w, &x) in self.weights.iter().zip(samples.iter()) {
            let dw = w - mean_weight;
            let dx = (x - low) / range - mean_x;
            ssa += dw * dw;
            ssx += dx * dx;
            sax += dw * dx;
        }
        let ssassx = (ssa * ssx).sqrt();
        let w1 = (ssassx - sax) * (ssassx + sax) / (ssa * ssx);
        let statistic = 1.0 - w1;

        Ok(ShapiroWilkResult {
            statistic,
            p_value: p_value(self.n, statistic, w1),
        })
    }
}

/// Convenience wrapper for a one-off test.
pub fn shapiro_wilk(samples: &[f64]) -> Result<ShapiroWilkResult, NormalityError> {
    let mut sorted = samples.to_vec();
    ShapiroWilk::new(samples.len())?.test(&mut sorted)
}

/// Positive coefficients `a[0..n/2]`, largest first.
fn half_coefficients(n: usize) -> Vec<f64> {
    let half = n / 2;
    if n == 3 {
        return vec![0.5f64.sqrt()];
    }
    let an = n as f64;
    let m: Vec<f64> = (1..=half)
        .map(|i| normal_quantile((i as f64 - 0.375) / (an + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;

    let mut a = vec![0.0; half];
    a[0] = a1;
    let (fac, first_scaled) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (fac, 2)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (fac, 1)
    };
    for (ai, mi) in a.iter_mut().zip(&m).skip(first_scaled) {
        *ai = -mi / fac;
    }
    a
}

fn p_value(n: usize, statistic: f64, w1: f64) -> f64 {
    if n == 3 {
        let w = statistic.clamp(0.75, 1.0);
        return ((6.0 / PI) * (w.sqrt().asin() - FRAC_PI_3)).clamp(0.0, 1.0);
    }
    if w1 <= 0.0 {
        return 1.0;
    }
    let an = n as f64;
    let (y, m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        let y = w1.ln();
        if y >= gamma {
            return 1e-99;
        }
        (-(gamma - y).ln(), poly(&C3, an), poly(&C4, an).exp())
    } else {
        let ln_n = an.ln();
        (w1.ln(), poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };
    normal_sf((y - m) / s).clamp(0.0, 1.0)
}
