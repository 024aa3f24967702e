//! Open-loop coronary boundary condition.
//!
//! Kim et al. (2010) coronary outlet: proximal resistance `Ra` into a
//! capacitance `Ca`, arterial micro-resistance `Ram` into the
//! intramyocardial capacitance `Cim` (referenced to the intramyocardial
//! pressure `Pim(t)`), and venous resistance `Rv` to the venous pressure
//! `Pv(t)`. The internal unknown is the intramyocardial capacitor volume
//! `V_im = Cim·(P_b − Pim)` with `P_b` the pressure between `Ram` and
//! `Rv`. With `y = [P, Q, V_im]`:
//!
//! ```text
//! Rv·Cim·V̇_im + Rv·Cim·Ca·Ṗ − Rv·Cim·Ca·Ra·Q̇ − Rv·Cim·Q + V_im
//!     + Cim·(Pim − Pv) = 0
//! −Ram·Ca·Cim·Ṗ + Ram·Ra·Ca·Cim·Q̇ − Cim·P + Cim·(Ra + Ram)·Q + V_im
//!     + Cim·Pim = 0
//! ```
//!
//! In steady mode the capacitors are open and the element reduces to the
//! series resistance against `Pv`, with the volume pinned to its steady
//! operating point:
//!
//! ```text
//! P − (Ra + Ram + Rv)·Q − Pv = 0
//! V_im − Cim·(Rv·Q + Pv − Pim) = 0
//! ```

use crate::algebra::system::SparseSystem;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;

/// Open-loop coronary; parameters `[Ra, Ram, Rv, Ca, Cim, Pim, Pv]` with
/// `Pim` and `Pv` possibly time-dependent.
#[derive(Debug, Clone, Default)]
pub struct OpenLoopCoronaryBc {}

impl OpenLoopCoronaryBc {
    /// Proximal resistance parameter index.
    pub const RA: usize = 0;
    /// Arterial micro-resistance parameter index.
    pub const RAM: usize = 1;
    /// Venous resistance parameter index.
    pub const RV: usize = 2;
    /// Proximal capacitance parameter index.
    pub const CA: usize = 3;
    /// Intramyocardial capacitance parameter index.
    pub const CIM: usize = 4;
    /// Intramyocardial pressure parameter index.
    pub const PIM: usize = 5;
    /// Venous pressure parameter index.
    pub const PV: usize = 6;

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
        let ra = parameters[w.params[Self::RA]];
        let ram = parameters[w.params[Self::RAM]];
        let rv = parameters[w.params[Self::RV]];
        let ca = parameters[w.params[Self::CA]];
        let cim = parameters[w.params[Self::CIM]];

        if w.steady {
            system.f.set(w.eqns[0], w.vars[0], 1.0);
            system.f.set(w.eqns[0], w.vars[1], -(ra + ram + rv));
            system.f.set(w.eqns[1], w.vars[2], 1.0);
            system.f.set(w.eqns[1], w.vars[1], -cim * rv);
        } else {
            system.e.set(w.eqns[0], w.vars[0], rv * cim * ca);
            system.e.set(w.eqns[0], w.vars[1], -rv * cim * ca * ra);
            system.e.set(w.eqns[0], w.vars[2], rv * cim);
            system.f.set(w.eqns[0], w.vars[1], -rv * cim);
            system.f.set(w.eqns[0], w.vars[2], 1.0);

            system.e.set(w.eqns[1], w.vars[0], -ram * ca * cim);
            system.e.set(w.eqns[1], w.vars[1], ram * ra * ca * cim);
            system.f.set(w.eqns[1], w.vars[0], -cim);
            system.f.set(w.eqns[1], w.vars[1], cim * (ra + ram));
            system.f.set(w.eqns[1], w.vars[2], 1.0);
        }
    }

    pub(crate) fn update_time(
        &mut self,
        w: &Wiring,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
    ) {
        let cim = parameters[w.params[Self::CIM]];
        let pim = parameters[w.params[Self::PIM]];
        let pv = parameters[w.params[Self::PV]];

        if w.steady {
            system.c[w.eqns[0]] = -pv;
            system.c[w.eqns[1]] = cim * (pim - pv);
        } else {
            system.c[w.eqns[0]] = cim * (pim - pv);
            system.c[w.eqns[1]] = cim * pim;
        }
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        TripletsContributions::new(5, 5, 0)
    }
}
