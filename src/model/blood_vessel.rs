//! Resistor-capacitor-inductor vessel segment with optional stenosis.
//!
//! Governing equations, with the capacitor pressure `P_c` as internal
//! variable and `y = [P_in, Q_in, P_out, Q_out, P_c]`:
//!
//! ```text
//! P_in − (R + S·|Q_in|)·Q_in − P_c = 0
//! Q_in − C·Ṗ_c − Q_out = 0
//! P_c − L·Q̇_out − P_out = 0
//! ```
//!
//! The stenosis term makes the effective resistance `R + S·|Q_in|`, so the
//! pressure drop is `S·Q_in·|Q_in|` — odd in the flow sign. Its Jacobian
//! contribution `−S·|Q_in|` enters through `dF`.

use crate::algebra::system::SparseSystem;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;
use crate::math::Vector;

/// Parameter order: resistance, capacitance, inductance, stenosis
/// coefficient.
#[derive(Debug, Clone, Default)]
pub struct BloodVessel {}

impl BloodVessel {
    /// Local parameter indices.
    pub const RESISTANCE: usize = 0;
    /// Capacitance.
    pub const CAPACITANCE: usize = 1;
    /// Inductance.
    pub const INDUCTANCE: usize = 2;
    /// Stenosis coefficient.
    pub const STENOSIS_COEFFICIENT: usize = 3;

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
        let r = parameters[w.params[Self::RESISTANCE]];
        let c = parameters[w.params[Self::CAPACITANCE]];
        let l = parameters[w.params[Self::INDUCTANCE]];

        // P_in - (R + S|Q_in|) Q_in - P_c = 0
        system.f.set(w.eqns[0], w.vars[0], 1.0);
        system.f.set(w.eqns[0], w.vars[1], -r);
        system.f.set(w.eqns[0], w.vars[4], -1.0);

        // Q_in - C dP_c/dt - Q_out = 0
        system.f.set(w.eqns[1], w.vars[1], 1.0);
        system.f.set(w.eqns[1], w.vars[3], -1.0);
        system.e.set(w.eqns[1], w.vars[4], -c);

        // P_c - L dQ_out/dt - P_out = 0
        system.f.set(w.eqns[2], w.vars[4], 1.0);
        system.f.set(w.eqns[2], w.vars[2], -1.0);
        system.e.set(w.eqns[2], w.vars[3], -l);
    }

    pub(crate) fn update_solution(
        &mut self,
        w: &Wiring,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
        y: &Vector,
    ) {
        let stenosis = parameters[w.params[Self::STENOSIS_COEFFICIENT]];
        if stenosis == 0.0 {
            return;
        }
        let r = parameters[w.params[Self::RESISTANCE]];
        let q_abs = y[w.vars[1]].abs();
        let fac = -stenosis * q_abs;
        system.f.set(w.eqns[0], w.vars[1], fac - r);
        system.df.set(w.eqns[0], w.vars[1], fac);
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        TripletsContributions::new(7, 2, 1)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn stamp(stenosis: f64, q: f64) -> (SparseSystem, Vec<usize>, Vec<usize>) {
        let mut system = SparseSystem::new(8);
        let vars = vec![0, 1, 2, 3, 4];
        let eqns = vec![5, 6, 7];
        let params = vec![0, 1, 2, 3];
        let values = vec![100.0, 0.5, 2.0, stenosis];
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
        let mut vessel = BloodVessel::new();
        vessel.update_constant(&w, &mut system, &bank);
        let mut y = Vector::zeros(8);
        y[1] = q;
        vessel.update_solution(&w, &mut system, &bank, &y);
        (system, vars, eqns)
    }

    #[test]
    fn linear_vessel_stamps_rcl_rows() {
        let (system, vars, eqns) = stamp(0.0, 0.0);
        assert_relative_eq!(system.f.get(eqns[0], vars[1]), -100.0);
        assert_relative_eq!(system.e.get(eqns[1], vars[4]), -0.5);
        assert_relative_eq!(system.e.get(eqns[2], vars[3]), -2.0);
        assert_eq!(system.df.nnz(), 0);
    }

    #[test]
    fn stenosis_adds_flow_dependent_resistance() {
        let (system, vars, eqns) = stamp(3.0, -2.0);
        // R_eff = R + S|Q| regardless of the flow sign.
        assert_relative_eq!(system.f.get(eqns[0], vars[1]), -106.0);
        assert_relative_eq!(system.df.get(eqns[0], vars[1]), -6.0);
    }
}
