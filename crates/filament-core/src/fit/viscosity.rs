use serde::{Deserialize, Serialize};

use super::config::PhysicalConstants;
use super::solver::FitResult;

/// Apparent extensional viscosity derived from a converged decay fit.
///
/// In the elasto-capillary regime the strain rate is constant,
/// `rate = 2 / (3 lambda)`, and the stress balance `eta_E * rate = sigma / D`
/// evaluated at the fitted initial diameter gives `eta_E = 3 sigma lambda /
/// (2 D0)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViscosityRecord {
    /// Extension rate in 1/s.
    pub strain_rate: f64,
    /// Fitted initial diameter over the needle diameter.
    pub normalized_d0: f64,
    /// Extensional viscosity over surface tension, in s/m.
    pub viscosity_over_surface_tension: f64,
    /// Extensional viscosity in Pa·s.
    pub extensional_viscosity: f64,
}

impl ViscosityRecord {
    /// Derive the record from `fit`. Returns `None` for a fit that did not
    /// converge or has non-positive parameters.
    pub fn from_fit(fit: &FitResult, constants: &PhysicalConstants) -> Option<Self> {
        if !fit.converged || !(fit.relaxation_time > 0.0) || !(fit.d0 > 0.0) {
            return None;
        }
        let d0_m = fit.d0 * 1e-3;
        let strain_rate = 2.0 / (3.0 * fit.relaxation_time);
        let viscosity_over_surface_tension = 1.0 / (strain_rate * d0_m);
        Some(Self {
            strain_rate,
            normalized_d0: fit.d0 / constants.needle_diameter_mm,
            viscosity_over_surface_tension,
            extensional_viscosity: constants.surface_tension * viscosity_over_surface_tension,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(converged: bool) -> FitResult {
        FitResult {
            d0: 1.0,
            relaxation_time: 0.01,
            r_squared: 0.99,
            converged,
            iterations: 3,
            points_used: 10,
            window_start: 0.0,
            window_end: 0.05,
            reason: None,
        }
    }

    #[test]
    fn viscosity_follows_stress_balance() {
        let constants = PhysicalConstants {
            surface_tension: 0.07,
            needle_diameter_mm: 0.5,
        };
        let rec = ViscosityRecord::from_fit(&fit(true), &constants).unwrap();
        // rate = 2/(0.03) = 66.67 1/s; eta/sigma = 1/(66.67 * 1e-3) = 15 s/m
        assert!((rec.strain_rate - 200.0 / 3.0).abs() < 1e-9);
        assert!((rec.viscosity_over_surface_tension - 15.0).abs() < 1e-9);
        assert!((rec.extensional_viscosity - 1.05).abs() < 1e-9);
        assert!((rec.normalized_d0 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn non_converged_fit_has_no_viscosity() {
        assert!(ViscosityRecord::from_fit(&fit(false), &PhysicalConstants::default()).is_none());
    }
}
