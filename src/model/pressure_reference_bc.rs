//! Prescribed pressure boundary condition.
//!
//! ```text
//! P = P̂(t)
//! ```
//!
//! With `y = [P, Q]`: `F = [1, 0]`, `c = [−P̂(t)]`.

use crate::algebra::system::SparseSystem;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;

/// Prescribed pressure; one (possibly time-dependent) parameter `P̂`.
#[derive(Debug, Clone, Default)]
pub struct PressureReferenceBc {}

impl PressureReferenceBc {
    /// Creates the element.
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    pub(crate) fn update_constant(&self, w: &Wiring, system: &mut SparseSystem) {
        system.f.set(w.eqns[0], w.vars[0], 1.0);
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
