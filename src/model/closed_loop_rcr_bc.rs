//! RCR boundary condition with through-flow for closed-loop circuits.
//!
//! Unlike the terminating Windkessel, both sides of the RCR chain are
//! wired into the network, so the distal flow is a solution variable and
//! the element can feed a venous return path. With `y = [P_in, Q_in,
//! P_out, Q_out, P_c]`:
//!
//! ```text
//! P_in − Rp·Q_in − P_c = 0
//! Q_in − Q_out − C·Ṗ_c = 0
//! P_c − Rd·Q_out − P_out = 0
//! ```

use crate::algebra::system::SparseSystem;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;

/// Closed-loop RCR; parameters `[Rp, C, Rd]`. The capacitance sits at
/// index 1, which the model's steady toggle relies on.
#[derive(Debug, Clone, Default)]
pub struct ClosedLoopRcrBc {
    /// True if this boundary condition feeds the closed-loop venous
    /// return (used when wiring the heart inlet junction).
    pub closed_loop_outlet: bool,
}

impl ClosedLoopRcrBc {
    /// Proximal resistance parameter index.
    pub const PROXIMAL_RESISTANCE: usize = 0;
    /// Capacitance parameter index.
    pub const CAPACITANCE: usize = 1;
    /// Distal resistance parameter index.
    pub const DISTAL_RESISTANCE: usize = 2;

    /// Creates the element.
    #[must_use]
    pub fn new(closed_loop_outlet: bool) -> Self {
        Self { closed_loop_outlet }
    }

    pub(crate) fn update_constant(
        &self,
        w: &Wiring,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
    ) {
        let rp = parameters[w.params[Self::PROXIMAL_RESISTANCE]];
        let c = parameters[w.params[Self::CAPACITANCE]];
        let rd = parameters[w.params[Self::DISTAL_RESISTANCE]];

        system.f.set(w.eqns[0], w.vars[0], 1.0);
        system.f.set(w.eqns[0], w.vars[1], -rp);
        system.f.set(w.eqns[0], w.vars[4], -1.0);

        system.f.set(w.eqns[1], w.vars[1], 1.0);
        system.f.set(w.eqns[1], w.vars[3], -1.0);
        system.e.set(w.eqns[1], w.vars[4], -c);

        system.f.set(w.eqns[2], w.vars[4], 1.0);
        system.f.set(w.eqns[2], w.vars[3], -rd);
        system.f.set(w.eqns[2], w.vars[2], -1.0);
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        TripletsContributions::new(8, 1, 0)
    }
}
