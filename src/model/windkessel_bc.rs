//! RCR Windkessel boundary condition with distal pressure.
//!
//! Proximal resistance `Rp` in series with a parallel capacitance `C` and
//! distal resistance `Rd` terminating at the distal pressure `Pd`. With
//! the capacitor pressure `P_c` as internal variable and
//! `y = [P, Q, P_c]`:
//!
//! ```text
//! P − Rp·Q − P_c = 0
//! Rd·Q − P_c − Rd·C·Ṗ_c + Pd = 0
//! ```
//!
//! The second row is the `Rd`-scaled form of
//! `C·Ṗ_c + (P_c − Pd)/Rd − Q = 0`.

use crate::algebra::system::SparseSystem;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;

/// RCR Windkessel; parameters `[Rp, C, Rd, Pd]`. The capacitance sits at
/// index 1, which the model's steady toggle relies on.
#[derive(Debug, Clone, Default)]
pub struct WindkesselBc {}

impl WindkesselBc {
    /// Proximal resistance parameter index.
    pub const PROXIMAL_RESISTANCE: usize = 0;
    /// Capacitance parameter index.
    pub const CAPACITANCE: usize = 1;
    /// Distal resistance parameter index.
    pub const DISTAL_RESISTANCE: usize = 2;
    /// Distal pressure parameter index.
    pub const DISTAL_PRESSURE: usize = 3;

    /// Creates the element.
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    pub(crate) fn update_constant(&self, w: &Wiring, system: &mut SparseSystem) {
        system.f.set(w.eqns[0], w.vars[0], 1.0);
        system.f.set(w.eqns[0], w.vars[2], -1.0);
        system.f.set(w.eqns[1], w.vars[2], -1.0);
    }

    pub(crate) fn update_time(
        &mut self,
        w: &Wiring,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
    ) {
        let rp = parameters[w.params[Self::PROXIMAL_RESISTANCE]];
        let c = parameters[w.params[Self::CAPACITANCE]];
        let rd = parameters[w.params[Self::DISTAL_RESISTANCE]];
        let pd = parameters[w.params[Self::DISTAL_PRESSURE]];

        system.e.set(w.eqns[1], w.vars[2], -rd * c);
        system.f.set(w.eqns[0], w.vars[1], -rp);
        system.f.set(w.eqns[1], w.vars[1], rd);
        system.c[w.eqns[1]] = pd;
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        TripletsContributions::new(5, 1, 0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::math::Vector;

    #[test]
    fn steady_residual_vanishes_at_operating_point() {
        let mut system = SparseSystem::new(3);
        let vars = vec![0, 1, 2];
        let eqns = vec![0, 1, 2];
        let params = vec![0, 1, 2, 3];
        let values = vec![10.0, 1.0, 100.0, 0.0];
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
        let mut wk = WindkesselBc::new();
        wk.update_constant(&w, &mut system);
        wk.update_time(&w, &mut system, &bank);

        // Q = 1: P_c = Rd, P = Rp + Rd, static capacitor.
        let y = Vector::from_vec(vec![110.0, 1.0, 100.0]);
        let ydot = Vector::zeros(3);
        system.update_residual(&y, &ydot);
        assert_relative_eq!(system.residual[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(system.residual[1], 0.0, epsilon = 1e-12);
    }
}
