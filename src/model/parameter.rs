//! Scalar and time-dependent model parameters.

use crate::errors::{HemoflowError, Result};
use crate::math::{lerp, Scalar};

/// A model parameter: either a constant scalar or a (possibly periodic)
/// time series sampled by linear interpolation.
///
/// Periodic parameters define the cardiac cycle period; the model checks
/// that all periodic parameters agree on it.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Global parameter id.
    pub id: usize,
    times: Vec<Scalar>,
    values: Vec<Scalar>,
    value: Scalar,
    is_constant: bool,
    is_periodic: bool,
    /// Period of the fundamental cycle, `tₙ − t₀` (0 for constants).
    pub cycle_period: Scalar,
    steady: bool,
    steady_value: Scalar,
}

impl Parameter {
    /// Creates a constant parameter.
    #[must_use]
    pub fn new_constant(id: usize, value: Scalar) -> Self {
        Self {
            id,
            times: Vec::new(),
            values: Vec::new(),
            value,
            is_constant: true,
            is_periodic: false,
            cycle_period: 0.0,
            steady: false,
            steady_value: 0.0,
        }
    }

    /// Creates a time-dependent parameter from a sampled series.
    ///
    /// A single-sample series degenerates to a constant. For periodic
    /// series the first and last value must coincide so the waveform is
    /// continuous across the cycle boundary.
    pub fn new_series(
        id: usize,
        times: Vec<Scalar>,
        values: Vec<Scalar>,
        periodic: bool,
    ) -> Result<Self> {
        if times.len() != values.len() {
            return Err(HemoflowError::Configuration(format!(
                "parameter {id}: {} sample times but {} values",
                times.len(),
                values.len()
            )));
        }
        if times.is_empty() {
            return Err(HemoflowError::Configuration(format!(
                "parameter {id}: empty time series"
            )));
        }
        if times.windows(2).any(|w| w[0] >= w[1]) {
            return Err(HemoflowError::Configuration(format!(
                "parameter {id}: sample times must be strictly increasing"
            )));
        }
        if values.len() == 1 {
            return Ok(Self::new_constant(id, values[0]));
        }
        if periodic && values.first() != values.last() {
            return Err(HemoflowError::Configuration(format!(
                "parameter {id}: periodic series must end on its starting value"
            )));
        }
        let cycle_period = times[times.len() - 1] - times[0];
        Ok(Self {
            id,
            times,
            values,
            value: 0.0,
            is_constant: false,
            is_periodic: periodic,
            cycle_period,
            steady: false,
            steady_value: 0.0,
        })
    }

    /// Samples the parameter at time `t`.
    ///
    /// Periodic series reduce `t` to the fundamental period first;
    /// aperiodic series clamp to their endpoints.
    #[must_use]
    pub fn get(&self, t: Scalar) -> Scalar {
        if self.steady {
            return self.steady_value;
        }
        if self.is_constant {
            return self.value;
        }

        let t0 = self.times[0];
        let tn = self.times[self.times.len() - 1];
        let t = if self.is_periodic {
            t - ((t - t0) / self.cycle_period).floor() * self.cycle_period
        } else {
            t.clamp(t0, tn)
        };

        // Index of the first sample time greater than t.
        let hi = self.times.partition_point(|&s| s <= t);
        if hi == 0 {
            return self.values[0];
        }
        if hi == self.times.len() {
            return self.values[self.values.len() - 1];
        }
        let lo = hi - 1;
        lerp(
            self.times[lo],
            self.values[lo],
            self.times[hi],
            self.values[hi],
            t,
        )
    }

    /// Collapses a time-dependent parameter to its mean over one period.
    ///
    /// The mean uses trapezoidal weighting over the canonical period; the
    /// original series is retained for [`Parameter::to_unsteady`].
    pub fn to_steady(&mut self) {
        if self.is_constant {
            return;
        }
        let mut integral = 0.0;
        for w in 0..self.times.len() - 1 {
            integral +=
                0.5 * (self.values[w] + self.values[w + 1]) * (self.times[w + 1] - self.times[w]);
        }
        self.steady_value = integral / self.cycle_period;
        self.steady = true;
    }

    /// Restores the time-dependent behavior after [`Parameter::to_steady`].
    pub fn to_unsteady(&mut self) {
        self.steady = false;
    }

    /// Replaces the value of a constant parameter.
    pub fn update(&mut self, value: Scalar) {
        self.value = value;
        self.is_constant = true;
    }

    /// True if the parameter carries no time dependence.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.is_constant
    }

    /// True if the parameter is a periodic series.
    #[must_use]
    pub fn is_periodic(&self) -> bool {
        self.is_periodic
    }
}

/// Read view of the model's current parameter values handed to blocks.
///
/// The value cache is refreshed by the model once per time step before any
/// block sees the new time; `time` and `cycle_period` feed blocks with
/// explicit activation functions (chambers, the heart model).
pub struct ParameterBank<'a> {
    /// Current value per global parameter id.
    pub values: &'a [Scalar],
    /// Time the cache was sampled at.
    pub time: Scalar,
    /// Cardiac cycle period of the model.
    pub cycle_period: Scalar,
}

impl std::ops::Index<usize> for ParameterBank<'_> {
    type Output = Scalar;

    fn index(&self, id: usize) -> &Scalar {
        &self.values[id]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn ramp(periodic: bool) -> Parameter {
        Parameter::new_series(0, vec![0.0, 0.5, 1.0], vec![0.0, 1.0, 0.0], periodic).unwrap()
    }

    #[test]
    fn constant_ignores_time() {
        let p = Parameter::new_constant(0, 3.5);
        assert_relative_eq!(p.get(0.0), 3.5);
        assert_relative_eq!(p.get(123.0), 3.5);
    }

    #[test]
    fn series_interpolates_linearly() {
        let p = ramp(true);
        assert_relative_eq!(p.get(0.25), 0.5);
        assert_relative_eq!(p.get(0.75), 0.5);
    }

    #[test]
    fn periodic_series_wraps_exactly() {
        let p = ramp(true);
        assert_relative_eq!(p.get(0.25), p.get(1.25));
        assert_relative_eq!(p.get(0.25), p.get(-0.75));
        assert_relative_eq!(p.get(0.1), p.get(0.1 + 7.0 * p.cycle_period));
    }

    #[test]
    fn aperiodic_series_clamps_to_endpoints() {
        let p = Parameter::new_series(0, vec![0.0, 1.0], vec![2.0, 4.0], false).unwrap();
        assert_relative_eq!(p.get(-5.0), 2.0);
        assert_relative_eq!(p.get(5.0), 4.0);
    }

    #[test]
    fn steady_takes_trapezoidal_mean_and_restores() {
        let mut p = ramp(true);
        p.to_steady();
        // Triangle waveform 0 -> 1 -> 0 over one period: mean 0.5.
        assert_relative_eq!(p.get(0.0), 0.5);
        assert_relative_eq!(p.get(0.9), 0.5);
        p.to_unsteady();
        assert_relative_eq!(p.get(0.25), 0.5);
        assert_relative_eq!(p.get(0.5), 1.0);
    }

    #[test]
    fn rejects_malformed_series() {
        assert!(Parameter::new_series(0, vec![0.0, 0.0], vec![1.0, 2.0], false).is_err());
        assert!(Parameter::new_series(0, vec![0.0, 1.0], vec![1.0], false).is_err());
        assert!(Parameter::new_series(0, vec![0.0, 1.0], vec![1.0, 2.0], true).is_err());
    }

    #[test]
    fn single_sample_series_degenerates_to_constant() {
        let p = Parameter::new_series(0, vec![0.0], vec![2.0], true).unwrap();
        assert!(p.is_constant());
        assert_relative_eq!(p.get(10.0), 2.0);
    }
}
