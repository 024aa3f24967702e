//! Prescribed flow boundary condition.
//!
//! ```text
//! Q = Q̂(t)
//! ```
//!
//! With `y = [P, Q]`: `F = [0, 1]`, `c = [−Q̂(t)]`.

use crate::algebra::system::SparseSystem;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;

/// Prescribed flow; one (possibly time-dependent) parameter `Q̂`.
#[derive(Debug, Clone, Default)]
pub struct FlowReferenceBc {}

impl FlowReferenceBc {
    /// Creates the element.
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    pub(crate) fn update_constant(&self, w: &Wiring, system: &mut SparseSystem) {
        system.f.set(w.eqns[0], w.vars[1], 1.0);
    }

    pub(crate) fn update_time(
        &mut self,
        w: &Wiring,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
    ) {
        system.c[w.eqns[0]] = -parameters[w.params[0]];
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        TripletsContributions::new(1, 0, 0)
    }
}
