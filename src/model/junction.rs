//! Junction with arbitrary inlets and outlets.
//!
//! Across all ports of the junction, mass is conserved and pressure is
//! continuous:
//!
//! ```text
//! Σᵢ Q_in,i = Σⱼ Q_out,j
//! P_i = P_j    for all port pairs i ≠ j
//! ```
//!
//! With `y = [P_in,1, Q_in,1, …, P_out,1, Q_out,1, …]`, the first
//! `n_ports − 1` equations tie every other port's pressure to the first
//! inlet pressure; the last row carries the signed flow sum.

use crate::algebra::system::SparseSystem;
use crate::model::block::{TripletsContributions, Wiring};

/// Mass-conservation / pressure-continuity junction.
#[derive(Debug, Clone, Default)]
pub struct Junction {
    pub(crate) num_inlets: usize,
    pub(crate) num_outlets: usize,
}

impl Junction {
    /// Creates the element; port counts are filled in during DOF setup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn update_constant(&self, w: &Wiring, system: &mut SparseSystem) {
        stamp_junction(w, system, self.num_inlets, self.num_outlets);
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        let n = self.num_inlets + self.num_outlets;
        TripletsContributions::new((n - 1) * 2 + n, 0, 0)
    }
}

/// Stamps pressure continuity and mass conservation over `n_in + n_out`
/// ports. Shared with the blood-vessel junction, whose "outlets" are its
/// synthesized internal nodes.
pub(crate) fn stamp_junction(
    w: &Wiring,
    system: &mut SparseSystem,
    num_inlets: usize,
    num_outlets: usize,
) {
    let num_ports = num_inlets + num_outlets;

    // Continuous pressure condition.
    for i in 0..num_ports - 1 {
        system.f.set(w.eqns[i], w.vars[0], 1.0);
        system.f.set(w.eqns[i], w.vars[2 * i + 2], -1.0);
    }

    // Conservation of mass.
    let mass = w.eqns[num_ports - 1];
    for i in (1..num_inlets * 2).step_by(2) {
        system.f.set(mass, w.vars[i], 1.0);
    }
    for i in ((num_inlets * 2) + 1..num_ports * 2).step_by(2) {
        system.f.set(mass, w.vars[i], -1.0);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn two_inlet_one_outlet_rows() {
        let mut system = SparseSystem::new(9);
        let vars = vec![0, 1, 2, 3, 4, 5]; // P1 Q1 P2 Q2 P3 Q3
        let eqns = vec![6, 7, 8];
        let w = Wiring {
            vars: &vars,
            eqns: &eqns,
            params: &[],
            steady: false,
        };
        let junction = Junction {
            num_inlets: 2,
            num_outlets: 1,
        };
        junction.update_constant(&w, &mut system);

        // P1 = P2, P1 = P3
        assert_relative_eq!(system.f.get(6, 0), 1.0);
        assert_relative_eq!(system.f.get(6, 2), -1.0);
        assert_relative_eq!(system.f.get(7, 0), 1.0);
        assert_relative_eq!(system.f.get(7, 4), -1.0);
        // Q1 + Q2 - Q3 = 0
        assert_relative_eq!(system.f.get(8, 1), 1.0);
        assert_relative_eq!(system.f.get(8, 3), 1.0);
        assert_relative_eq!(system.f.get(8, 5), -1.0);
    }
}
