//! # Numeric Root Finding
//!
//! Scalar root finding shared by every psychrometric inversion (relative
//! humidity from wet-bulb, dry-bulb from wet-bulb, apparatus dew point).
//!
//! Solvers never fail: when the bracket does not straddle a root, or the
//! iteration cap is hit before the tolerance, they return the best estimate
//! seen with `converged = false`. The caller turns that into a
//! [`ConvergenceWarning`] and keeps going.
//!
//! Also hosts the clamped linear interpolation used by every hour/latitude
//! table lookup.

use serde::{Deserialize, Serialize};

use crate::errors::ConvergenceWarning;

/// Outcome of a root search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootEstimate {
    /// Best argument found
    pub value: f64,
    /// f(value); zero at an exact root
    pub residual: f64,
    /// Function evaluations after the two bracket ends
    pub iterations: u32,
    /// True when |residual| < tolerance
    pub converged: bool,
}

impl RootEstimate {
    /// Convert a non-converged estimate into a warning for `solver`.
    pub fn warning(&self, solver: &str) -> Option<ConvergenceWarning> {
        if self.converged {
            None
        } else {
            Some(ConvergenceWarning {
                solver: solver.to_string(),
                iterations: self.iterations,
                residual: self.residual,
                estimate: self.value,
            })
        }
    }
}

/// A scalar root finder over a bracketing interval.
pub trait RootFinder {
    /// Find x in `[lo, hi]` with f(x) ≈ 0.
    fn find_root<F>(&self, f: F, lo: f64, hi: f64) -> RootEstimate
    where
        F: Fn(f64) -> f64;
}

/// Interval bisection with an absolute residual tolerance and an iteration cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bisection {
    /// Stop when |f(x)| is below this
    pub tolerance: f64,
    /// Hard cap on midpoint evaluations
    pub max_iterations: u32,
}

impl Default for Bisection {
    /// 0.01 residual, 50 iterations
    fn default() -> Self {
        Bisection {
            tolerance: 0.01,
            max_iterations: 50,
        }
    }
}

impl Bisection {
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Bisection {
            tolerance,
            max_iterations,
        }
    }
}

impl RootFinder for Bisection {
    fn find_root<F>(&self, f: F, lo: f64, hi: f64) -> RootEstimate
    where
        F: Fn(f64) -> f64,
    {
        let (mut lo, mut hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let mut f_lo = f(lo);
        let f_hi = f(hi);

        let mut best = if f_lo.abs() <= f_hi.abs() {
            (lo, f_lo)
        } else {
            (hi, f_hi)
        };
        if best.1.abs() < self.tolerance {
            return RootEstimate {
                value: best.0,
                residual: best.1,
                iterations: 0,
                converged: true,
            };
        }

        // Not bracketed: the closest end is all we can offer
        if f_lo.signum() == f_hi.signum() {
            return RootEstimate {
                value: best.0,
                residual: best.1,
                iterations: 0,
                converged: false,
            };
        }

        let mut iterations = 0;
        while iterations < self.max_iterations {
            iterations += 1;
            let mid = 0.5 * (lo + hi);
            let f_mid = f(mid);

            if f_mid.abs() < best.1.abs() {
                best = (mid, f_mid);
            }
            if f_mid.abs() < self.tolerance {
                return RootEstimate {
                    value: mid,
                    residual: f_mid,
                    iterations,
                    converged: true,
                };
            }

            if f_mid.signum() == f_lo.signum() {
                lo = mid;
                f_lo = f_mid;
            } else {
                hi = mid;
            }
        }

        RootEstimate {
            value: best.0,
            residual: best.1,
            iterations,
            converged: false,
        }
    }
}

/// Piecewise-linear interpolation over ascending `xs`, clamped to the end
/// values outside the table. Returns 0 for an empty table.
pub fn interpolate_clamped(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }
    for i in 1..n {
        if x <= xs[i] {
            let span = xs[i] - xs[i - 1];
            if span <= 0.0 {
                return ys[i];
            }
            let t = (x - xs[i - 1]) / span;
            return ys[i - 1] + t * (ys[i] - ys[i - 1]);
        }
    }
    ys[n - 1]
}
