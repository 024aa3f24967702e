//! Cardiac chamber with time-varying elastance (Kerckhoffs et al., 2006).
//!
//! The chamber pressure follows a twitch-activated elastance acting on
//! the chamber volume relative to a rest volume, with an inductive
//! outflow. With the chamber volume `Vc` as internal variable and
//! `y = [P_in, Q_in, P_out, Q_out, Vc]`:
//!
//! ```text
//! P_in − E(t)·(Vc − Vrest(t)) = 0
//! Q_in − Q_out − V̇c = 0
//! P_in − P_out − L·Q̇_out = 0
//! ```
//!
//! with the activation `a(t) = ½(1 − cos(2π·t_c/t_twitch))` for contract
//! time `t_c = (t mod T) − t_active ∈ [0, t_twitch]` and zero otherwise,
//! `E(t) = (Emax − Emin)·a + Emin`, and
//! `Vrest(t) = (1 − a)·(Vrd − Vrs) + Vrs`.

use std::f64::consts::PI;

use crate::algebra::system::SparseSystem;
use crate::math::Scalar;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;

/// Elastance chamber; parameters
/// `[Emax, Emin, Vrd, Vrs, t_active, t_twitch, L]`.
#[derive(Debug, Clone, Default)]
pub struct ChamberKerckhoffs {}

#[allow(missing_docs)]
impl ChamberKerckhoffs {
    pub const EMAX: usize = 0;
    pub const EMIN: usize = 1;
    pub const VRD: usize = 2;
    pub const VRS: usize = 3;
    pub const TACTIVE: usize = 4;
    pub const TTWITCH: usize = 5;
    pub const IMPEDANCE: usize = 6;
}

impl ChamberKerckhoffs {
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
        let l = parameters[w.params[Self::IMPEDANCE]];

        system.f.set(w.eqns[0], w.vars[0], 1.0);

        system.f.set(w.eqns[1], w.vars[1], 1.0);
        system.f.set(w.eqns[1], w.vars[3], -1.0);
        system.e.set(w.eqns[1], w.vars[4], -1.0);

        system.f.set(w.eqns[2], w.vars[0], 1.0);
        system.f.set(w.eqns[2], w.vars[2], -1.0);
        system.e.set(w.eqns[2], w.vars[3], -l);
    }

    pub(crate) fn update_time(
        &mut self,
        w: &Wiring,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
    ) {
        let (elastance, vrest) = self.elastance_values(w, parameters);
        system.f.set(w.eqns[0], w.vars[4], -elastance);
        system.c[w.eqns[0]] = elastance * vrest;
    }

    /// Twitch activation, elastance and rest volume at the current time.
    fn elastance_values(&self, w: &Wiring, parameters: &ParameterBank) -> (Scalar, Scalar) {
        let p = |i: usize| parameters[w.params[i]];
        let t_in_cycle = parameters.time.rem_euclid(parameters.cycle_period);

        let t_contract = (t_in_cycle - p(Self::TACTIVE)).max(0.0);
        let t_twitch = p(Self::TTWITCH);
        let act = if t_contract <= t_twitch {
            0.5 * (1.0 - (2.0 * PI * t_contract / t_twitch).cos())
        } else {
            0.0
        };

        let elastance = (p(Self::EMAX) - p(Self::EMIN)) * act + p(Self::EMIN);
        let vrest = (1.0 - act) * (p(Self::VRD) - p(Self::VRS)) + p(Self::VRS);
        (elastance, vrest)
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        TripletsContributions::new(6, 2, 0)
    }
}
