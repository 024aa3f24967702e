//! Junction with per-port resistances and a common internal pressure.
//!
//! Every inlet and outlet connects to the internal node `P_C` through its
//! own resistance:
//!
//! ```text
//! P_in,i − R_i·Q_in,i − P_C = 0      ∀ i ∈ inlets
//! P_C − R_j·Q_out,j − P_out,j = 0    ∀ j ∈ outlets
//! Σᵢ Q_in,i = Σⱼ Q_out,j
//! ```

use crate::algebra::system::SparseSystem;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;

/// Resistive junction; one resistance parameter per port, inlets first.
#[derive(Debug, Clone, Default)]
pub struct ResistiveJunction {
    pub(crate) num_inlets: usize,
    pub(crate) num_outlets: usize,
}

impl ResistiveJunction {
    /// Creates the element; port counts are filled in during DOF setup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn update_constant(
        &self,
        w: &Wiring,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
    ) {
        let num_ports = self.num_inlets + self.num_outlets;
        let pressure_c = w.vars[2 * num_ports];

        for i in 0..self.num_inlets {
            let r = parameters[w.params[i]];
            system.f.set(w.eqns[i], w.vars[2 * i], 1.0);
            system.f.set(w.eqns[i], w.vars[2 * i + 1], -r);
            system.f.set(w.eqns[i], pressure_c, -1.0);
        }
        for j in self.num_inlets..num_ports {
            let r = parameters[w.params[j]];
            system.f.set(w.eqns[j], w.vars[2 * j], -1.0);
            system.f.set(w.eqns[j], w.vars[2 * j + 1], -r);
            system.f.set(w.eqns[j], pressure_c, 1.0);
        }

        // Conservation of mass.
        let mass = w.eqns[num_ports];
        for i in 0..self.num_inlets {
            system.f.set(mass, w.vars[2 * i + 1], 1.0);
        }
        for j in self.num_inlets..num_ports {
            system.f.set(mass, w.vars[2 * j + 1], -1.0);
        }
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        let n = self.num_inlets + self.num_outlets;
        TripletsContributions::new(4 * n, 0, 0)
    }
}
