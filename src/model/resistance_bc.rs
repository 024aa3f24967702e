//! Resistance boundary condition against a distal pressure.
//!
//! ```text
//! P − R(t)·Q − Pd(t) = 0
//! ```

use crate::algebra::system::SparseSystem;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;

/// Resistance to a prescribed distal pressure; parameters `[R, Pd]`,
/// both possibly time-dependent.
#[derive(Debug, Clone, Default)]
pub struct ResistanceBc {}

impl ResistanceBc {
    /// Resistance parameter index.
    pub const RESISTANCE: usize = 0;
    /// Distal pressure parameter index.
    pub const DISTAL_PRESSURE: usize = 1;

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
        system
            .f
            .set(w.eqns[0], w.vars[1], -parameters[w.params[Self::RESISTANCE]]);
        system.c[w.eqns[0]] = -parameters[w.params[Self::DISTAL_PRESSURE]];
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        TripletsContributions::new(2, 0, 0)
    }
}
