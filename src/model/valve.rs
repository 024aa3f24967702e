//! Diode-like valve implemented as a nonlinear resistor.
//!
//! The resistance blends smoothly between the open and closed values by a
//! sigmoid in the pressure gradient. With `y = [P_in, Q_in, P_out,
//! Q_out]`:
//!
//! ```text
//! P_in − P_out − Rv·Q_in = 0,   Rv = Rmin + (Rmax − Rmin)·½(1 + tanh(k·(P_out − P_in)))
//! Q_in − Q_out = 0
//! ```
//!
//! The linear half of the resistance lives in `F`; the tanh half lives in
//! `c` with its three pressure/flow derivatives in `dC`.

use crate::algebra::system::SparseSystem;
use crate::math::Vector;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;

/// Sigmoid valve; parameters `[Rmax, Rmin, k]`.
#[derive(Debug, Clone, Default)]
pub struct Valve {}

impl Valve {
    /// Maximum (closed) resistance parameter index.
    pub const RMAX: usize = 0;
    /// Minimum (open) resistance parameter index.
    pub const RMIN: usize = 1;
    /// Sigmoid steepness parameter index.
    pub const STEEPNESS: usize = 2;

    /// Creates the element.
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    pub(crate) fn update_constant(
        &self,
        w: &Wiring,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
    ) {
        let rmax = parameters[w.params[Self::RMAX]];
        let rmin = parameters[w.params[Self::RMIN]];

        system.f.set(w.eqns[0], w.vars[0], 1.0);
        system.f.set(w.eqns[0], w.vars[1], -0.5 * (rmax + rmin));
        system.f.set(w.eqns[0], w.vars[2], -1.0);

        system.f.set(w.eqns[1], w.vars[1], 1.0);
        system.f.set(w.eqns[1], w.vars[3], -1.0);
    }

    pub(crate) fn update_solution(
        &mut self,
        w: &Wiring,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
        y: &Vector,
    ) {
        let rmax = parameters[w.params[Self::RMAX]];
        let rmin = parameters[w.params[Self::RMIN]];
        let steepness = parameters[w.params[Self::STEEPNESS]];

        let q_in = y[w.vars[1]];
        let gradient = steepness * (y[w.vars[2]] - y[w.vars[0]]);
        let tanh = gradient.tanh();
        let sech2 = 1.0 - tanh * tanh;
        let delta_r = rmax - rmin;

        system.c[w.eqns[0]] = -0.5 * q_in * delta_r * tanh;
        system
            .dc
            .set(w.eqns[0], w.vars[0], 0.5 * steepness * q_in * delta_r * sech2);
        system.dc.set(w.eqns[0], w.vars[1], -0.5 * delta_r * tanh);
        system
            .dc
            .set(w.eqns[0], w.vars[2], -0.5 * steepness * q_in * delta_r * sech2);
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        TripletsContributions::new(5, 0, 3)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn residual_at(p_in: f64, p_out: f64, q: f64) -> f64 {
        let mut system = SparseSystem::new(4);
        let vars = vec![0, 1, 2, 3];
        let eqns = vec![0, 1];
        let params = vec![0, 1, 2];
        let values = vec![1e5, 1.0, 100.0];
        let bank = ParameterBank {
            values: &values,
            time: 0.0,
            cycle_period: 1.0,
        };
        let w = Wiring {
            vars: &vars,
            eqns: &eqns,
            params: &params,
            steady: false,
        };
        let mut valve = Valve::new();
        valve.update_constant(&w, &mut system, &bank);
        let y = Vector::from_vec(vec![p_in, q, p_out, q]);
        valve.update_solution(&w, &mut system, &bank, &y);
        system.update_residual(&y, &Vector::zeros(4));
        system.residual[0]
    }

    #[test]
    fn forward_gradient_sees_open_resistance() {
        // P_in >> P_out: Rv -> Rmin, so P_in - P_out - Rmin*Q ~ 0.
        let r = residual_at(11.0, 1.0, 10.0);
        assert_relative_eq!(r, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn reverse_gradient_sees_closed_resistance() {
        // P_out >> P_in: Rv -> Rmax, tiny leakage flow balances.
        let q = -10.0 / 1e5;
        let r = residual_at(1.0, 11.0, q);
        assert_relative_eq!(r, 0.0, epsilon = 1e-9);
    }
}
