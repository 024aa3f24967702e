//! Shared numerical primitives anchored on `nalgebra`.

use nalgebra::DVector;

/// Primary scalar type used across the crate.
pub type Scalar = f64;
/// Convenient alias for dynamically sized real vectors.
pub type Vector = DVector<Scalar>;

/// Returns the infinity norm (largest absolute entry) of a vector.
#[must_use]
pub fn inf_norm(v: &Vector) -> Scalar {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

/// Linearly interpolates between `(t0, v0)` and `(t1, v1)` at `t`.
///
/// Requires `t0 < t1`; `t` outside the bracket extrapolates.
#[must_use]
pub fn lerp(t0: Scalar, v0: Scalar, t1: Scalar, v1: Scalar, t: Scalar) -> Scalar {
    v0 + (v1 - v0) * (t - t0) / (t1 - t0)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn inf_norm_picks_largest_magnitude() {
        let v = Vector::from_vec(vec![1.0, -3.0, 2.0]);
        assert_relative_eq!(inf_norm(&v), 3.0);
    }

    #[test]
    fn lerp_hits_endpoints_and_midpoint() {
        assert_relative_eq!(lerp(0.0, 1.0, 2.0, 3.0, 0.0), 1.0);
        assert_relative_eq!(lerp(0.0, 1.0, 2.0, 3.0, 2.0), 3.0);
        assert_relative_eq!(lerp(0.0, 1.0, 2.0, 3.0, 1.0), 2.0);
    }
}
