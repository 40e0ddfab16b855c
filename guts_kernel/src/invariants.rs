/// GUTS kernel: input validation
///
/// Every check returns `InvalidParameter` on the first failure instead of
/// letting NaN or infinity leak into damage and hazard comparisons.

use crate::domain::GutsParams;
use crate::state::ExposureState;
use crate::GutsError;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check every parameter constraint. Stops at the first failure.
pub fn validate_params(params: &GutsParams) -> Result<(), GutsError> {
    check_steps(params)?;
    check_rate("K_SR", params.k_sr)?;
    check_rate("K_CA", params.k_ca)?;
    check_rate("Kd_SD", params.kd_sd)?;
    check_rate("Kd_IT", params.kd_it)?;
    check_rate("MW_SD", params.mw_sd)?;
    check_rate("BW_SD", params.bw_sd)?;
    check_positive("MW_IT", params.mw_it)?;
    check_spread("F_S", params.f_s)?;
    Ok(())
}

/// Doses and damage must be finite and non-negative.
pub fn validate_state(state: &ExposureState) -> Result<(), GutsError> {
    check_non_negative("oral_dose", state.oral_dose)?;
    check_non_negative("contact_dose", state.contact_dose)?;
    check_non_negative("damage", state.damage)?;
    Ok(())
}

/// A draw fed to the threshold transform must lie strictly inside (0, 1).
pub fn validate_open_unit(name: &'static str, z: f64) -> Result<(), GutsError> {
    if !(z > 0.0 && z < 1.0) {
        return Err(GutsError::invalid(name, z, "must lie strictly between 0 and 1"));
    }
    Ok(())
}

/// Spread factor of the log-logistic threshold distribution.
pub fn validate_spread(f_s: f64) -> Result<(), GutsError> {
    check_spread("F_S", f_s)
}

/// Strictly positive, finite value (median thresholds, IT thresholds).
pub fn validate_positive(name: &'static str, v: f64) -> Result<(), GutsError> {
    check_positive(name, v)
}

/// Finite and `>= 0` (doses, damage, additions).
pub fn validate_non_negative(name: &'static str, v: f64) -> Result<(), GutsError> {
    check_non_negative(name, v)
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_steps(params: &GutsParams) -> Result<(), GutsError> {
    if params.steps_per_day == 0 {
        return Err(GutsError::invalid("T", 0.0, "must be a positive integer"));
    }
    Ok(())
}

fn check_rate(name: &'static str, v: f64) -> Result<(), GutsError> {
    if !v.is_finite() || v < 0.0 {
        return Err(GutsError::invalid(name, v, "must be finite and >= 0"));
    }
    Ok(())
}

fn check_positive(name: &'static str, v: f64) -> Result<(), GutsError> {
    if !v.is_finite() || v <= 0.0 {
        return Err(GutsError::invalid(name, v, "must be finite and > 0"));
    }
    Ok(())
}

fn check_spread(name: &'static str, v: f64) -> Result<(), GutsError> {
    if !v.is_finite() || v <= 1.0 {
        return Err(GutsError::invalid(name, v, "must be finite and > 1"));
    }
    Ok(())
}

fn check_non_negative(name: &'static str, v: f64) -> Result<(), GutsError> {
    if !v.is_finite() || v < 0.0 {
        return Err(GutsError::invalid(name, v, "must be finite and >= 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_of(err: GutsError) -> &'static str {
        match err {
            GutsError::InvalidParameter { name, .. } => name,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_default_params_valid() {
        assert!(validate_params(&GutsParams::default()).is_ok());
    }

    #[test]
    fn test_zero_steps_rejected() {
        let p = GutsParams {
            steps_per_day: 0,
            ..GutsParams::default()
        };
        assert_eq!(name_of(validate_params(&p).unwrap_err()), "T");
    }

    #[test]
    fn test_negative_rate_rejected() {
        let p = GutsParams {
            k_ca: -0.1,
            ..GutsParams::default()
        };
        assert_eq!(name_of(validate_params(&p).unwrap_err()), "K_CA");
    }

    #[test]
    fn test_nan_rate_rejected() {
        let p = GutsParams {
            kd_sd: f64::NAN,
            ..GutsParams::default()
        };
        assert_eq!(name_of(validate_params(&p).unwrap_err()), "Kd_SD");
    }

    #[test]
    fn test_spread_at_one_rejected() {
        let p = GutsParams {
            f_s: 1.0,
            ..GutsParams::default()
        };
        assert_eq!(name_of(validate_params(&p).unwrap_err()), "F_S");
    }

    #[test]
    fn test_zero_median_rejected() {
        let p = GutsParams {
            mw_it: 0.0,
            ..GutsParams::default()
        };
        assert_eq!(name_of(validate_params(&p).unwrap_err()), "MW_IT");
    }

    #[test]
    fn test_zero_rates_allowed() {
        let p = GutsParams {
            k_sr: 0.0,
            k_ca: 0.0,
            bw_sd: 0.0,
            mw_sd: 0.0,
            ..GutsParams::default()
        };
        assert!(validate_params(&p).is_ok());
    }

    #[test]
    fn test_state_checks() {
        assert!(validate_state(&ExposureState::unexposed()).is_ok());
        let bad = ExposureState::new(0.0, f64::INFINITY, 0.0);
        assert_eq!(name_of(validate_state(&bad).unwrap_err()), "contact_dose");
    }

    #[test]
    fn test_open_unit_boundaries() {
        assert!(validate_open_unit("z", 0.5).is_ok());
        assert!(validate_open_unit("z", 0.0).is_err());
        assert!(validate_open_unit("z", 1.0).is_err());
        assert!(validate_open_unit("z", f64::NAN).is_err());
    }
}
