use serde::{Deserialize, Serialize};

/// Closeness tolerance for comparing numbers read back from the engine.
///
/// `a` is close to `b` when `|a - b| <= abs + rel * |b|`, with `b` the
/// reference value. The defaults match the usual `allclose` convention.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            abs: 1e-8,
            rel: 1e-5,
        }
    }
}

impl Tolerance {
    pub fn is_close(&self, actual: f64, reference: f64) -> bool {
        if actual == reference {
            return true;
        }
        if !actual.is_finite() || !reference.is_finite() {
            return false;
        }
        (actual - reference).abs() <= self.abs + self.rel * reference.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tolerance_matches_allclose() {
        let tol = Tolerance::default();
        assert!(tol.is_close(1.0, 1.0 + 1e-9));
        assert!(tol.is_close(100.0, 100.0005));
        assert!(!tol.is_close(1.0, 1.001));
        assert!(tol.is_close(0.0, 5e-9));
    }

    #[test]
    fn nan_is_never_close() {
        let tol = Tolerance::default();
        assert!(!tol.is_close(f64::NAN, f64::NAN));
        assert!(!tol.is_close(1.0, f64::NAN));
        assert!(tol.is_close(f64::INFINITY, f64::INFINITY));
    }
}
