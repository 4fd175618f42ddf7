//! Float validation shared by every constructor that takes raw `f64`s.

use crate::TlError;

/// Reject NaN and infinities.
pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, TlError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TlError::NonFinite { what, value: v })
    }
}

/// Finite and strictly greater than zero.
pub fn ensure_positive(v: f64, what: &'static str) -> Result<f64, TlError> {
    match ensure_finite(v, what)? {
        v if v > 0.0 => Ok(v),
        _ => Err(TlError::InvalidArg { what }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(f64::NAN, "temperature").unwrap_err();
        assert!(format!("{err}").contains("Non-finite"));
        assert_eq!(ensure_finite(-3.5, "temperature"), Ok(-3.5));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert_eq!(ensure_positive(0.5, "period"), Ok(0.5));
        assert_eq!(
            ensure_positive(0.0, "period"),
            Err(TlError::InvalidArg { what: "period" })
        );
        assert!(ensure_positive(-1.0, "period").is_err());
        assert!(matches!(
            ensure_positive(f64::INFINITY, "period"),
            Err(TlError::NonFinite { .. })
        ));
    }
}
