//! Bounded exponential-decay fit of a diameter time series.
//!
//! The elasto-capillary regime thins as `D(t) = D0 * exp(-t / (3 * lambda))`.
//! Taking logs gives `ln D = ln D0 - t / (3 * lambda)`, which we fit in the
//! parameters `(D0, lambda)` with Levenberg-Marquardt. The solver is seeded
//! from an ordinary log-linear regression and stops at a hard iteration cap.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{
    FALLBACK_LAMBDA_GUESS, SOLVER_INITIAL_DAMPING, SOLVER_MAX_DAMPING, SOLVER_TOLERANCE,
};
use crate::error::{FilamentError, Result};
use crate::measure::{DiameterPoint, DiameterTimeSeries};

use super::config::FitConfig;
use super::window::select_window;

/// Outcome of fitting one series.
///
/// `converged == false` fits keep their best-effort parameters for
/// diagnostics; they must not be turned into a viscosity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Fitted diameter at t = 0, in mm.
    pub d0: f64,
    /// Relaxation time in seconds.
    pub relaxation_time: f64,
    /// Coefficient of determination of `ln D` against the model.
    pub r_squared: f64,
    pub converged: bool,
    pub iterations: usize,
    pub points_used: usize,
    /// Time of the first fitted point (s).
    pub window_start: f64,
    /// Time of the last fitted point (s).
    pub window_end: f64,
    /// Why the fit was not accepted, when `converged` is false.
    pub reason: Option<String>,
}

/// Fit the decay model to the part of `series` selected by `config.window`.
///
/// Fails with `InsufficientData` when the window holds fewer than
/// `config.min_points` usable points (at least two are always required).
/// Every other failure mode is reported through `FitResult::converged`.
pub fn fit_series(series: &DiameterTimeSeries, config: &FitConfig) -> Result<FitResult> {
    let window: Vec<&DiameterPoint> = select_window(series, &config.window)
        .iter()
        .filter(|p| p.diameter > 0.0)
        .collect();

    let required = config.min_points.max(2);
    if window.len() < required {
        return Err(FilamentError::InsufficientData {
            available: window.len(),
            required,
        });
    }

    let t: Vec<f64> = window.iter().map(|p| p.time).collect();
    let y: Vec<f64> = window.iter().map(|p| p.diameter.ln()).collect();

    let (intercept, slope) = linear_regression(&t, &y);
    let lambda_seed = config.initial_lambda.unwrap_or(if slope < 0.0 {
        -1.0 / (3.0 * slope)
    } else {
        FALLBACK_LAMBDA_GUESS
    });
    let seed = Vector2::new(intercept.exp(), lambda_seed);

    let solution = levenberg_marquardt(&t, &y, seed, config.max_iterations);
    let (d0, lambda) = (solution.params[0], solution.params[1]);
    let r_squared = r_squared(&t, &y, &solution.params);

    let reason = if !solution.converged {
        Some(format!(
            "solver did not converge within {} iterations",
            config.max_iterations
        ))
    } else if !(d0.is_finite() && lambda.is_finite() && d0 > 0.0) {
        Some("non-finite fit parameters".to_string())
    } else if lambda < config.lambda_min || lambda > config.lambda_max {
        Some(format!(
            "relaxation time {lambda:.3e} s outside [{:.3e}, {:.3e}] s",
            config.lambda_min, config.lambda_max
        ))
    } else if !(r_squared >= config.min_r_squared) {
        Some(format!(
            "R² {r_squared:.4} below minimum {:.4}",
            config.min_r_squared
        ))
    } else {
        None
    };

    debug!(
        d0,
        lambda,
        r_squared,
        iterations = solution.iterations,
        points = t.len(),
        converged = reason.is_none(),
        "Decay fit finished"
    );

    Ok(FitResult {
        d0,
        relaxation_time: lambda,
        r_squared,
        converged: reason.is_none(),
        iterations: solution.iterations,
        points_used: t.len(),
        window_start: t[0],
        window_end: t[t.len() - 1],
        reason,
    })
}

/// Model value `ln D0 - t / (3 lambda)`.
fn model(t: f64, params: &Vector2<f64>) -> f64 {
    params[0].ln() - t / (3.0 * params[1])
}

fn sum_squared_residuals(t: &[f64], y: &[f64], params: &Vector2<f64>) -> f64 {
    t.iter()
        .zip(y)
        .map(|(&ti, &yi)| (yi - model(ti, params)).powi(2))
        .sum()
}

fn r_squared(t: &[f64], y: &[f64], params: &Vector2<f64>) -> f64 {
    let mean = y.iter().sum::<f64>() / y.len() as f64;
    let total: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - sum_squared_residuals(t, y, params) / total
}

/// Ordinary least squares `y = a + b t`, returning `(a, b)`.
fn linear_regression(t: &[f64], y: &[f64]) -> (f64, f64) {
    let n = t.len() as f64;
    let t_mean = t.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&ti, &yi) in t.iter().zip(y) {
        sxx += (ti - t_mean).powi(2);
        sxy += (ti - t_mean) * (yi - y_mean);
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (y_mean - slope * t_mean, slope)
}

struct Solution {
    params: Vector2<f64>,
    iterations: usize,
    converged: bool,
}

/// Levenberg-Marquardt with Marquardt diagonal scaling. Steps that would
/// make `D0` or `lambda` non-positive are rejected like any other uphill
/// step.
fn levenberg_marquardt(
    t: &[f64],
    y: &[f64],
    seed: Vector2<f64>,
    max_iterations: usize,
) -> Solution {
    let mut params = seed;
    let mut sse = sum_squared_residuals(t, y, &params);
    let mut damping = SOLVER_INITIAL_DAMPING;

    for iteration in 1..=max_iterations {
        let mut jtj = Matrix2::<f64>::zeros();
        let mut jtr = Vector2::<f64>::zeros();
        for (&ti, &yi) in t.iter().zip(y) {
            let j = Vector2::new(
                1.0 / params[0],
                ti / (3.0 * params[1] * params[1]),
            );
            let r = yi - model(ti, &params);
            jtj += j * j.transpose();
            jtr += j * r;
        }

        loop {
            let mut lhs = jtj;
            for k in 0..2 {
                lhs[(k, k)] += damping * jtj[(k, k)].max(f64::MIN_POSITIVE);
            }
            let Some(step) = lhs.lu().solve(&jtr) else {
                damping *= 10.0;
                if damping > SOLVER_MAX_DAMPING {
                    return Solution {
                        params,
                        iterations: iteration,
                        converged: false,
                    };
                }
                continue;
            };

            let small_step = (0..2).all(|k| {
                step[k].abs() <= SOLVER_TOLERANCE * (params[k].abs() + SOLVER_TOLERANCE)
            });
            let candidate = params + step;
            let valid = candidate[0] > 0.0 && candidate[1] > 0.0;
            let candidate_sse = if valid {
                sum_squared_residuals(t, y, &candidate)
            } else {
                f64::INFINITY
            };

            if candidate_sse <= sse {
                params = candidate;
                sse = candidate_sse;
                damping = (damping / 10.0).max(f64::EPSILON);
                if small_step {
                    return Solution {
                        params,
                        iterations: iteration,
                        converged: true,
                    };
                }
                break;
            }

            if small_step {
                return Solution {
                    params,
                    iterations: iteration,
                    converged: true,
                };
            }
            damping *= 10.0;
            if damping > SOLVER_MAX_DAMPING {
                return Solution {
                    params,
                    iterations: iteration,
                    converged: false,
                };
            }
        }
    }

    Solution {
        params,
        iterations: max_iterations,
        converged: false,
    }
}
