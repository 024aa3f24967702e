//! Closed-loop coronary boundary condition.
//!
//! Same circuit as the open-loop coronary, but the venous side connects
//! back into the closed loop (the distal pressure and flow are solution
//! variables) and the intramyocardial pressure is proportional to the
//! ventricular pressure of the heart block: `Pim = im·P_ventricle`, with
//! `P_LV` scaled by `iml` for left coronaries and `P_RV` scaled by `imr`
//! for right coronaries. With `y = [P_in, Q_in, P_out, Q_out, V_im]`:
//!
//! ```text
//! V̇_im + Ca·Ṗ_in − Ca·Ra·Q̇_in − Q_in + Q_out = 0
//! Ram·Ca·Ṗ_in − Ram·Ca·Ra·Q̇_in + P_in − (Ra + Ram)·Q_in − P_out
//!     − Rv·Q_out = 0
//! V_im − Cim·(P_out + Rv·Q_out) + Cim·im·P_v(y) = 0
//! ```
//!
//! The ventricular term lives in `c` with its derivative in `dC`; the
//! ventricle variable id and the scaling parameter are resolved once the
//! heart block's DOFs are known.

use crate::algebra::system::SparseSystem;
use crate::math::Vector;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;

/// Which ventricle drives the intramyocardial pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoronarySide {
    /// Left coronary arteries (`iml`·P_LV).
    Left,
    /// Right coronary arteries (`imr`·P_RV).
    Right,
}

/// Closed-loop coronary; parameters `[Ra, Ram, Rv, Ca, Cim]`.
#[derive(Debug, Clone)]
pub struct ClosedLoopCoronaryBc {
    /// Coronary side.
    pub side: CoronarySide,
    /// Global variable id of the driving ventricular pressure, resolved
    /// during model finalization.
    pub ventricle_var_id: Option<usize>,
    /// Global parameter id of the intramyocardial scaling (`iml`/`imr`),
    /// resolved during model finalization.
    pub im_param_id: Option<usize>,
}

impl ClosedLoopCoronaryBc {
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

    /// Creates the element for the given side.
    #[must_use]
    pub fn new(side: CoronarySide) -> Self {
        Self {
            side,
            ventricle_var_id: None,
            im_param_id: None,
        }
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

        system.e.set(w.eqns[0], w.vars[4], 1.0);
        system.e.set(w.eqns[0], w.vars[0], ca);
        system.e.set(w.eqns[0], w.vars[1], -ca * ra);
        system.f.set(w.eqns[0], w.vars[1], -1.0);
        system.f.set(w.eqns[0], w.vars[3], 1.0);

        system.e.set(w.eqns[1], w.vars[0], ram * ca);
        system.e.set(w.eqns[1], w.vars[1], -ram * ca * ra);
        system.f.set(w.eqns[1], w.vars[0], 1.0);
        system.f.set(w.eqns[1], w.vars[1], -(ra + ram));
        system.f.set(w.eqns[1], w.vars[2], -1.0);
        system.f.set(w.eqns[1], w.vars[3], -rv);

        system.f.set(w.eqns[2], w.vars[4], 1.0);
        system.f.set(w.eqns[2], w.vars[2], -cim);
        system.f.set(w.eqns[2], w.vars[3], -cim * rv);
    }

    pub(crate) fn update_solution(
        &mut self,
        w: &Wiring,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
        y: &Vector,
    ) {
        let cim = parameters[w.params[Self::CIM]];
        let ventricle = self
            .ventricle_var_id
            .expect("closed-loop coronary used before finalization");
        let im = parameters[self
            .im_param_id
            .expect("closed-loop coronary used before finalization")];

        system.c[w.eqns[2]] = cim * im * y[ventricle];
        system.dc.set(w.eqns[2], ventricle, cim * im);
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        TripletsContributions::new(9, 5, 1)
    }
}
