//! Heart and pulmonary circulation model.
//!
//! Models the mechanics of the four heart chambers and the pulmonary
//! circulation: atria with activation-weighted elastance and exponential
//! pressure-volume relaxation terms, ventricles with a Fourier-mode
//! elastance waveform, chamber in/outflow resistances and inductances,
//! pulmonary and aortic capacitances, and discrete valves between the
//! chambers. The block sits between the venous return (inlet) and the
//! aorta (outlet) and owns twelve internal unknowns.
//!
//! Solution layout `y = [P_in(=P_RA), Q_in, P_out(=P_ao), Q_out, V_RA,
//! Q_RA, P_RV, V_RV, Q_RV, P_pul, P_LA, V_LA, Q_LA, P_LV, V_LV, Q_LV]`
//! with fourteen equations: the atrial and ventricular pressure-volume
//! relations, chamber volume balances, chamber outflow momentum
//! equations, the pulmonary pressure equation and the aortic pressure
//! equation.

use std::f64::consts::PI;

use crate::algebra::state::State;
use crate::algebra::system::SparseSystem;
use crate::math::{Scalar, Vector};
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::parameter::ParameterBank;

/// Fourier modes (cosine, sine) of the normalized ventricular elastance.
const ELASTANCE_MODES: [[Scalar; 2]; 25] = [
    [0.283748803, 0.000000000],
    [0.031830626, -0.374299825],
    [-0.209472400, -0.018127770],
    [0.020520047, 0.073971113],
    [0.008316883, -0.047249597],
    [-0.041677660, 0.003212163],
    [0.000867323, 0.019441411],
    [-0.001675379, -0.005565534],
    [-0.011252277, 0.003401432],
    [-0.000414677, 0.008376795],
    [0.000253749, -0.000071880],
    [-0.002584966, 0.001566861],
    [0.000584752, 0.003143555],
    [0.000028502, -0.000024787],
    [0.000022961, -0.000007476],
    [0.000018735, -0.000001281],
    [0.000015573, 0.000001781],
    [0.000013133, 0.000003494],
    [0.000011199, 0.000004507],
    [0.000009634, 0.000005117],
    [0.000008343, 0.000005481],
    [0.000007265, 0.000005687],
    [0.000006354, 0.000005789],
    [0.000005575, 0.000005821],
    [0.000004903, 0.000005805],
];

/// Heart and pulmonary circulation; 27 parameters in the order of the
/// associated constants.
#[derive(Debug, Clone, Default)]
pub struct ClosedLoopHeartPulmonary {
    // Activation and elastance values refreshed once per time step and
    // combined with solution-dependent expressions in each iteration.
    aa: Scalar,
    elv: Scalar,
    erv: Scalar,
}

#[allow(missing_docs)]
impl ClosedLoopHeartPulmonary {
    pub const TSA: usize = 0;
    pub const TPWAVE: usize = 1;
    pub const ERV_S: usize = 2;
    pub const ELV_S: usize = 3;
    pub const IML: usize = 4;
    pub const IMR: usize = 5;
    pub const LRA_V: usize = 6;
    pub const RRA_V: usize = 7;
    pub const LRV_A: usize = 8;
    pub const RRV_A: usize = 9;
    pub const LLA_V: usize = 10;
    pub const RLA_V: usize = 11;
    pub const LLV_A: usize = 12;
    pub const RLV_AO: usize = 13;
    pub const VRV_U: usize = 14;
    pub const VLV_U: usize = 15;
    pub const RPD: usize = 16;
    pub const CP: usize = 17;
    pub const CPA: usize = 18;
    pub const KXP_RA: usize = 19;
    pub const KXV_RA: usize = 20;
    pub const KXP_LA: usize = 21;
    pub const KXV_LA: usize = 22;
    pub const EMAX_RA: usize = 23;
    pub const EMAX_LA: usize = 24;
    pub const VASO_RA: usize = 25;
    pub const VASO_LA: usize = 26;

    /// Number of parameters the block expects.
    pub const NUM_PARAMS: usize = 27;
}

impl ClosedLoopHeartPulmonary {
    /// Creates the element.
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
        let p = |i: usize| parameters[w.params[i]];

        // Aortic pressure
        system.e.set(w.eqns[1], w.vars[2], p(Self::CPA));
        // Right atrium volume
        system.e.set(w.eqns[2], w.vars[4], 1.0);
        // Right atrium outflow
        system.e.set(w.eqns[3], w.vars[5], p(Self::LRA_V));
        // Right ventricle volume
        system.e.set(w.eqns[5], w.vars[7], 1.0);
        // Right ventricle outflow
        system.e.set(w.eqns[6], w.vars[8], p(Self::LRV_A));
        // Pulmonary pressure
        system.e.set(w.eqns[7], w.vars[9], p(Self::CP));
        // Left atrium volume
        system.e.set(w.eqns[9], w.vars[11], 1.0);
        // Left atrium outflow
        system.e.set(w.eqns[10], w.vars[12], p(Self::LLA_V));
        // Left ventricle volume
        system.e.set(w.eqns[12], w.vars[14], 1.0);
        // Left ventricle outflow
        system.e.set(w.eqns[13], w.vars[15], p(Self::LLV_A));
    }

    pub(crate) fn update_time(
        &mut self,
        w: &Wiring,
        _system: &mut SparseSystem,
        parameters: &ParameterBank,
    ) {
        self.update_activation_and_elastance(w, parameters);
    }

    pub(crate) fn update_solution(
        &mut self,
        w: &Wiring,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
        y: &mut Vector,
    ) {
        let p = |i: usize| parameters[w.params[i]];

        let (psi_ra, psi_la, psi_ra_deriv, psi_la_deriv) = self.atrial_relaxation(w, parameters, y);
        let valves = self.valve_positions(w, y);
        let aa = self.aa;

        // Right atrium pressure
        system.f.set(w.eqns[0], w.vars[0], 1.0);
        system.f.set(w.eqns[0], w.vars[4], -aa * p(Self::EMAX_RA));
        system.c[w.eqns[0]] = aa * p(Self::EMAX_RA) * p(Self::VASO_RA) + psi_ra * (aa - 1.0);
        system.dc.set(w.eqns[0], w.vars[4], psi_ra_deriv * (aa - 1.0));

        // Aortic pressure
        system.f.set(w.eqns[1], w.vars[15], -valves[15]);
        system.f.set(w.eqns[1], w.vars[3], 1.0);

        // Right atrium volume
        system.f.set(w.eqns[2], w.vars[5], valves[5]);
        system.f.set(w.eqns[2], w.vars[1], -1.0);

        // Right atrium outflow
        system.f.set(w.eqns[3], w.vars[5], p(Self::RRA_V) * valves[5]);
        system.f.set(w.eqns[3], w.vars[0], -1.0);
        system.f.set(w.eqns[3], w.vars[6], 1.0);

        // Right ventricle pressure
        system.f.set(w.eqns[4], w.vars[6], 1.0);
        system.f.set(w.eqns[4], w.vars[7], -self.erv);
        system.c[w.eqns[4]] = self.erv * p(Self::VRV_U);

        // Right ventricle volume
        system.f.set(w.eqns[5], w.vars[5], -valves[5]);
        system.f.set(w.eqns[5], w.vars[8], valves[8]);

        // Right ventricle outflow
        system.f.set(w.eqns[6], w.vars[6], -1.0);
        system.f.set(w.eqns[6], w.vars[9], 1.0);
        system.f.set(w.eqns[6], w.vars[8], p(Self::RRV_A) * valves[8]);

        // Pulmonary pressure
        system.f.set(w.eqns[7], w.vars[8], -valves[8]);
        system.f.set(w.eqns[7], w.vars[9], 1.0 / p(Self::RPD));
        system.f.set(w.eqns[7], w.vars[10], -1.0 / p(Self::RPD));

        // Left atrium pressure
        system.f.set(w.eqns[8], w.vars[10], 1.0);
        system.f.set(w.eqns[8], w.vars[11], -aa * p(Self::EMAX_LA));
        system.c[w.eqns[8]] = aa * p(Self::EMAX_LA) * p(Self::VASO_LA) + psi_la * (aa - 1.0);
        system.dc.set(w.eqns[8], w.vars[11], psi_la_deriv * (aa - 1.0));

        // Left atrium volume
        system.f.set(w.eqns[9], w.vars[8], -valves[8]);
        system.f.set(w.eqns[9], w.vars[12], valves[12]);

        // Left atrium outflow
        system.f.set(w.eqns[10], w.vars[10], -1.0);
        system.f.set(w.eqns[10], w.vars[13], 1.0);
        system.f.set(w.eqns[10], w.vars[12], p(Self::RLA_V) * valves[12]);

        // Left ventricle pressure
        system.f.set(w.eqns[11], w.vars[13], 1.0);
        system.f.set(w.eqns[11], w.vars[14], -self.elv);
        system.c[w.eqns[11]] = self.elv * p(Self::VLV_U);

        // Left ventricle volume
        system.f.set(w.eqns[12], w.vars[12], -valves[12]);
        system.f.set(w.eqns[12], w.vars[15], valves[15]);

        // Left ventricle outflow
        system.f.set(w.eqns[13], w.vars[13], -1.0);
        system.f.set(w.eqns[13], w.vars[2], 1.0);
        system.f.set(w.eqns[13], w.vars[15], p(Self::RLV_AO) * valves[15]);
    }

    /// Atrial activation and ventricular elastance waveforms at the
    /// current time.
    fn update_activation_and_elastance(&mut self, w: &Wiring, parameters: &ParameterBank) {
        let p = |i: usize| parameters[w.params[i]];
        let t_cardiac = parameters.cycle_period;
        let tsa = t_cardiac * p(Self::TSA);
        let tpwave = t_cardiac / p(Self::TPWAVE);
        let t_in_cycle = parameters.time.rem_euclid(t_cardiac);

        self.aa = if t_in_cycle <= tpwave {
            0.5 * (1.0 - (2.0 * PI * (t_in_cycle - tpwave + tsa) / tsa).cos())
        } else if t_in_cycle >= (t_cardiac - tsa) + tpwave && t_in_cycle < t_cardiac {
            0.5 * (1.0 - (2.0 * PI * (t_in_cycle - tpwave - (t_cardiac - tsa)) / tsa).cos())
        } else {
            0.0
        };

        let mut elastance = 0.0;
        for (mode, coeffs) in ELASTANCE_MODES.iter().enumerate() {
            let phase = 2.0 * PI * mode as Scalar * t_in_cycle / t_cardiac;
            elastance += coeffs[0] * phase.cos() - coeffs[1] * phase.sin();
        }
        self.elv = elastance * p(Self::ELV_S);
        self.erv = elastance * p(Self::ERV_S);
    }

    /// Exponential atrial pressure-volume terms and their volume
    /// derivatives.
    fn atrial_relaxation(
        &self,
        w: &Wiring,
        parameters: &ParameterBank,
        y: &Vector,
    ) -> (Scalar, Scalar, Scalar, Scalar) {
        let p = |i: usize| parameters[w.params[i]];
        let ra_volume = y[w.vars[4]];
        let la_volume = y[w.vars[11]];

        let exp_ra = ((ra_volume - p(Self::VASO_RA)) * p(Self::KXV_RA)).exp();
        let exp_la = ((la_volume - p(Self::VASO_LA)) * p(Self::KXV_LA)).exp();

        let psi_ra = p(Self::KXP_RA) * (exp_ra - 1.0);
        let psi_la = p(Self::KXP_LA) * (exp_la - 1.0);
        let psi_ra_deriv = p(Self::KXP_RA) * exp_ra * p(Self::KXV_RA);
        let psi_la_deriv = p(Self::KXP_LA) * exp_la * p(Self::KXV_LA);
        (psi_ra, psi_la, psi_ra_deriv, psi_la_deriv)
    }

    /// Discrete valve positions between the chambers. A closed valve
    /// zeroes its resistance row and clamps the reverse flow in the
    /// iterate.
    fn valve_positions(&self, w: &Wiring, y: &mut Vector) -> [Scalar; 16] {
        let mut valves = [1.0; 16];

        // RA to RV
        let pressure_ra = y[w.vars[0]];
        let pressure_rv = y[w.vars[6]];
        if pressure_ra <= pressure_rv && y[w.vars[5]] <= 0.0 {
            valves[5] = 0.0;
            y[w.vars[5]] = 0.0;
        }

        // RV to pulmonary
        let pressure_pulmonary = y[w.vars[9]];
        if pressure_rv <= pressure_pulmonary && y[w.vars[8]] <= 0.0 {
            valves[8] = 0.0;
            y[w.vars[8]] = 0.0;
        }

        // LA to LV
        let pressure_la = y[w.vars[10]];
        let pressure_lv = y[w.vars[13]];
        if pressure_la <= pressure_lv && y[w.vars[12]] <= 0.0 {
            valves[12] = 0.0;
            y[w.vars[12]] = 0.0;
        }

        // LV to aorta
        let pressure_aorta = y[w.vars[2]];
        if pressure_lv <= pressure_aorta && y[w.vars[15]] <= 0.0 {
            valves[15] = 0.0;
            y[w.vars[15]] = 0.0;
        }

        valves
    }

    /// Fixed initial chamber volumes and pulmonary pressure.
    pub(crate) fn assign_initial_conditions(&self, vars: &[usize], state: &mut State) {
        state.y[vars[4]] = 38.43; // RA volume
        state.y[vars[7]] = 96.07; // RV volume
        state.y[vars[11]] = 38.43; // LA volume
        state.y[vars[14]] = 96.07; // LV volume
        state.y[vars[9]] = 8.0; // Pulmonary pressure
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        TripletsContributions::new(33, 10, 2)
    }
}
