//! The block contract: local stamps into the global system.
//!
//! A block is a physical element of the network. It owns its parameter
//! ids, the nodes incident to its inlets and outlets, and — after DOF
//! setup — the global variable and equation indices its stamps touch.
//! The per-element algebra lives in one module per element; dispatch is a
//! match over a closed set of variants so the hot loop stays inlinable.

use crate::algebra::state::State;
use crate::algebra::system::SparseSystem;
use crate::errors::{HemoflowError, Result};
use crate::math::Vector;
use crate::model::blood_vessel::BloodVessel;
use crate::model::blood_vessel_junction::BloodVesselJunction;
use crate::model::chamber_kerckhoffs::ChamberKerckhoffs;
use crate::model::closed_loop_coronary_bc::{ClosedLoopCoronaryBc, CoronarySide};
use crate::model::closed_loop_heart_pulmonary::ClosedLoopHeartPulmonary;
use crate::model::closed_loop_rcr_bc::ClosedLoopRcrBc;
use crate::model::dofhandler::DofHandler;
use crate::model::flow_reference_bc::FlowReferenceBc;
use crate::model::junction::Junction;
use crate::model::node::Node;
use crate::model::open_loop_coronary_bc::OpenLoopCoronaryBc;
use crate::model::parameter::ParameterBank;
use crate::model::pressure_reference_bc::PressureReferenceBc;
use crate::model::resistance_bc::ResistanceBc;
use crate::model::resistive_junction::ResistiveJunction;
use crate::model::valve::Valve;
use crate::model::windkessel_bc::WindkesselBc;

/// Coarse block category used for policy decisions (result export,
/// closed-loop outlet identification).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockClass {
    /// Vessel segments (exported in vessel-based results).
    Vessel,
    /// Junction elements.
    Junction,
    /// Boundary conditions.
    BoundaryCondition,
    /// Cardiac chambers.
    Chamber,
    /// Closed-loop elements (heart/pulmonary, closed-loop BCs).
    ClosedLoop,
    /// External solver coupling interfaces.
    ExternalCoupling,
}

/// Number of triplets a block contributes to each system matrix.
///
/// `d` counts the solution-derivative matrices (dE + dF + dC) together.
#[derive(Debug, Clone, Copy, Default)]
pub struct TripletsContributions {
    /// Entries in `F`.
    pub f: usize,
    /// Entries in `E`.
    pub e: usize,
    /// Entries in the derivative matrices.
    pub d: usize,
}

impl TripletsContributions {
    /// Creates a triplet declaration.
    #[must_use]
    pub const fn new(f: usize, e: usize, d: usize) -> Self {
        Self { f, e, d }
    }

    /// Accumulates another declaration.
    pub fn add(&mut self, other: Self) {
        self.f += other.f;
        self.e += other.e;
        self.d += other.d;
    }
}

/// DOF layout a block requests during setup.
pub(crate) struct DofRequest {
    pub num_equations: usize,
    pub internal_vars: Vec<&'static str>,
}

/// Global indices and flags handed to an element when stamping.
pub struct Wiring<'a> {
    /// Variable indices: per port `[pressure, flow]` (inlets first), then
    /// internal variables.
    pub vars: &'a [usize],
    /// Equation indices owned by the block.
    pub eqns: &'a [usize],
    /// Global parameter ids of the block.
    pub params: &'a [usize],
    /// Steady-mode flag of the block.
    pub steady: bool,
}

/// The per-element payload of a block.
#[derive(Debug, Clone)]
pub enum Element {
    /// RCL vessel segment with optional stenosis.
    BloodVessel(BloodVessel),
    /// Pressure-continuity / mass-conservation junction.
    Junction(Junction),
    /// Junction with per-port resistances.
    ResistiveJunction(ResistiveJunction),
    /// Junction of RCL branches, expanded into hidden vessels.
    BloodVesselJunction(BloodVesselJunction),
    /// Prescribed flow boundary condition.
    FlowReferenceBc(FlowReferenceBc),
    /// Prescribed pressure boundary condition.
    PressureReferenceBc(PressureReferenceBc),
    /// Resistance against a distal pressure.
    ResistanceBc(ResistanceBc),
    /// RCR Windkessel with distal pressure.
    WindkesselBc(WindkesselBc),
    /// Open-loop coronary boundary condition.
    OpenLoopCoronaryBc(OpenLoopCoronaryBc),
    /// Closed-loop coronary boundary condition.
    ClosedLoopCoronaryBc(ClosedLoopCoronaryBc),
    /// Closed-loop RCR boundary condition.
    ClosedLoopRcrBc(ClosedLoopRcrBc),
    /// Four-chamber heart plus pulmonary circulation.
    ClosedLoopHeartPulmonary(ClosedLoopHeartPulmonary),
    /// Time-varying elastance chamber.
    ChamberKerckhoffs(ChamberKerckhoffs),
    /// Diode-like valve with sigmoid resistance.
    Valve(Valve),
}

impl Element {
    /// RCL vessel segment.
    #[must_use]
    pub fn blood_vessel() -> Self {
        Self::BloodVessel(BloodVessel::new())
    }
    /// Mass/pressure junction.
    #[must_use]
    pub fn junction() -> Self {
        Self::Junction(Junction::new())
    }
    /// Resistive junction.
    #[must_use]
    pub fn resistive_junction() -> Self {
        Self::ResistiveJunction(ResistiveJunction::new())
    }
    /// Blood-vessel junction.
    #[must_use]
    pub fn blood_vessel_junction() -> Self {
        Self::BloodVesselJunction(BloodVesselJunction::new())
    }
    /// Prescribed flow.
    #[must_use]
    pub fn flow_reference() -> Self {
        Self::FlowReferenceBc(FlowReferenceBc::new())
    }
    /// Prescribed pressure.
    #[must_use]
    pub fn pressure_reference() -> Self {
        Self::PressureReferenceBc(PressureReferenceBc::new())
    }
    /// Resistance boundary condition.
    #[must_use]
    pub fn resistance() -> Self {
        Self::ResistanceBc(ResistanceBc::new())
    }
    /// RCR Windkessel boundary condition.
    #[must_use]
    pub fn windkessel() -> Self {
        Self::WindkesselBc(WindkesselBc::new())
    }
    /// Open-loop coronary boundary condition.
    #[must_use]
    pub fn open_loop_coronary() -> Self {
        Self::OpenLoopCoronaryBc(OpenLoopCoronaryBc::new())
    }
    /// Closed-loop coronary boundary condition for the given side.
    #[must_use]
    pub fn closed_loop_coronary(side: CoronarySide) -> Self {
        Self::ClosedLoopCoronaryBc(ClosedLoopCoronaryBc::new(side))
    }
    /// Closed-loop RCR boundary condition.
    #[must_use]
    pub fn closed_loop_rcr(closed_loop_outlet: bool) -> Self {
        Self::ClosedLoopRcrBc(ClosedLoopRcrBc::new(closed_loop_outlet))
    }
    /// Heart and pulmonary circulation model.
    #[must_use]
    pub fn heart_pulmonary() -> Self {
        Self::ClosedLoopHeartPulmonary(ClosedLoopHeartPulmonary::new())
    }
    /// Time-varying elastance chamber.
    #[must_use]
    pub fn chamber_kerckhoffs() -> Self {
        Self::ChamberKerckhoffs(ChamberKerckhoffs::new())
    }
    /// Diode-like valve.
    #[must_use]
    pub fn valve() -> Self {
        Self::Valve(Valve::new())
    }

    /// Default class of the element.
    #[must_use]
    pub fn default_class(&self) -> BlockClass {
        match self {
            Self::BloodVessel(_) | Self::Valve(_) => BlockClass::Vessel,
            Self::Junction(_) | Self::ResistiveJunction(_) | Self::BloodVesselJunction(_) => {
                BlockClass::Junction
            }
            Self::FlowReferenceBc(_)
            | Self::PressureReferenceBc(_)
            | Self::ResistanceBc(_)
            | Self::WindkesselBc(_)
            | Self::OpenLoopCoronaryBc(_) => BlockClass::BoundaryCondition,
            Self::ClosedLoopCoronaryBc(_)
            | Self::ClosedLoopRcrBc(_)
            | Self::ClosedLoopHeartPulmonary(_) => BlockClass::ClosedLoop,
            Self::ChamberKerckhoffs(_) => BlockClass::Chamber,
        }
    }
}

/// A physical element wired into the global system.
#[derive(Debug, Clone)]
pub struct Block {
    /// Global block id.
    pub id: usize,
    /// Block name (unique within the model).
    pub name: String,
    /// Coarse category for policy decisions.
    pub class: BlockClass,
    /// Global ids of the parameters feeding the block's algebra.
    pub global_param_ids: Vec<usize>,
    /// Nodes upstream of the block.
    pub inlet_nodes: Vec<usize>,
    /// Nodes downstream of the block.
    pub outlet_nodes: Vec<usize>,
    /// Global variable indices, per port `[pressure, flow]` then internals.
    pub global_var_ids: Vec<usize>,
    /// Global equation indices owned by the block.
    pub global_eqn_ids: Vec<usize>,
    /// Steady-mode flag (set by the model's steady toggle).
    pub steady: bool,
    /// Per-element payload.
    pub element: Element,
}

impl Block {
    /// Creates an unwired block.
    #[must_use]
    pub fn new(
        id: usize,
        name: impl Into<String>,
        class: BlockClass,
        element: Element,
        global_param_ids: Vec<usize>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            class,
            global_param_ids,
            inlet_nodes: Vec::new(),
            outlet_nodes: Vec::new(),
            global_var_ids: Vec::new(),
            global_eqn_ids: Vec::new(),
            steady: false,
            element,
        }
    }

    /// Registers the block's equations and internal variables and collects
    /// the port DOFs from its incident nodes.
    ///
    /// Nodes must have been set up already; their DOFs are collected per
    /// port as `[pressure, flow]`, inlets before outlets, followed by the
    /// block's internal variables.
    pub fn setup_dofs(&mut self, dofhandler: &mut DofHandler, nodes: &[Node]) -> Result<()> {
        let request = self.element.setup(
            self.inlet_nodes.len(),
            self.outlet_nodes.len(),
            &self.name,
        )?;

        self.global_var_ids.clear();
        let port_nodes: Vec<usize> = match &self.element {
            // The blood-vessel junction stamps over its inlet and its
            // synthesized internal nodes; the true outlets belong to the
            // hidden child vessels.
            Element::BloodVesselJunction(bvj) => self
                .inlet_nodes
                .iter()
                .chain(bvj.internal_nodes.iter())
                .copied()
                .collect(),
            _ => self
                .inlet_nodes
                .iter()
                .chain(self.outlet_nodes.iter())
                .copied()
                .collect(),
        };
        for &node_id in &port_nodes {
            self.global_var_ids.push(nodes[node_id].pres_dof);
            self.global_var_ids.push(nodes[node_id].flow_dof);
        }
        for internal in &request.internal_vars {
            self.global_var_ids
                .push(dofhandler.register_variable(format!("{internal}:{}", self.name)));
        }

        self.global_eqn_ids = (0..request.num_equations)
            .map(|_| dofhandler.register_equation())
            .collect();
        Ok(())
    }

    fn wiring(&self) -> Wiring<'_> {
        Wiring {
            vars: &self.global_var_ids,
            eqns: &self.global_eqn_ids,
            params: &self.global_param_ids,
            steady: self.steady,
        }
    }

    /// Writes the entries of `E` and `F` that depend on neither time nor
    /// solution. Called exactly once after assembly.
    pub fn update_constant(&self, system: &mut SparseSystem, parameters: &ParameterBank) {
        let w = self.wiring();
        match &self.element {
            Element::BloodVessel(e) => e.update_constant(&w, system, parameters),
            Element::Junction(e) => e.update_constant(&w, system),
            Element::ResistiveJunction(e) => e.update_constant(&w, system, parameters),
            Element::BloodVesselJunction(e) => e.update_constant(&w, system),
            Element::FlowReferenceBc(e) => e.update_constant(&w, system),
            Element::PressureReferenceBc(e) => e.update_constant(&w, system),
            Element::ResistanceBc(e) => e.update_constant(&w, system),
            Element::WindkesselBc(e) => e.update_constant(&w, system),
            Element::OpenLoopCoronaryBc(e) => e.update_constant(&w, system, parameters),
            Element::ClosedLoopCoronaryBc(e) => e.update_constant(&w, system, parameters),
            Element::ClosedLoopRcrBc(e) => e.update_constant(&w, system, parameters),
            Element::ClosedLoopHeartPulmonary(e) => e.update_constant(&w, system, parameters),
            Element::ChamberKerckhoffs(e) => e.update_constant(&w, system, parameters),
            Element::Valve(e) => e.update_constant(&w, system, parameters),
        }
    }

    /// Writes the entries of `E`, `F` and `c` that depend on time-varying
    /// parameters. Called once per time step, after the model refreshed
    /// the parameter value cache.
    pub fn update_time(&mut self, system: &mut SparseSystem, parameters: &ParameterBank) {
        let w = Wiring {
            vars: &self.global_var_ids,
            eqns: &self.global_eqn_ids,
            params: &self.global_param_ids,
            steady: self.steady,
        };
        match &mut self.element {
            Element::FlowReferenceBc(e) => e.update_time(&w, system, parameters),
            Element::PressureReferenceBc(e) => e.update_time(&w, system, parameters),
            Element::ResistanceBc(e) => e.update_time(&w, system, parameters),
            Element::WindkesselBc(e) => e.update_time(&w, system, parameters),
            Element::OpenLoopCoronaryBc(e) => e.update_time(&w, system, parameters),
            Element::ClosedLoopHeartPulmonary(e) => e.update_time(&w, system, parameters),
            Element::ChamberKerckhoffs(e) => e.update_time(&w, system, parameters),
            _ => {}
        }
    }

    /// Writes the solution-dependent entries (nonlinear elements). Called
    /// every Newton iteration; may clamp unphysical iterate components
    /// (heart valve gating).
    pub fn update_solution(
        &mut self,
        system: &mut SparseSystem,
        parameters: &ParameterBank,
        y: &mut Vector,
        _ydot: &Vector,
    ) {
        let w = Wiring {
            vars: &self.global_var_ids,
            eqns: &self.global_eqn_ids,
            params: &self.global_param_ids,
            steady: self.steady,
        };
        match &mut self.element {
            Element::BloodVessel(e) => e.update_solution(&w, system, parameters, y),
            Element::ClosedLoopCoronaryBc(e) => e.update_solution(&w, system, parameters, y),
            Element::ClosedLoopHeartPulmonary(e) => e.update_solution(&w, system, parameters, y),
            Element::Valve(e) => e.update_solution(&w, system, parameters, y),
            _ => {}
        }
    }

    /// The block's triplet declaration (valid after DOF setup).
    #[must_use]
    pub fn num_triplets(&self) -> TripletsContributions {
        self.element.num_triplets()
    }

    /// Writes block-specific initial conditions into `state`.
    pub fn assign_initial_conditions(&self, state: &mut State) {
        if let Element::ClosedLoopHeartPulmonary(e) = &self.element {
            e.assign_initial_conditions(&self.global_var_ids, state);
        }
    }
}

impl Element {
    pub(crate) fn setup(
        &mut self,
        n_inlets: usize,
        n_outlets: usize,
        name: &str,
    ) -> Result<DofRequest> {
        let two_port = |label: &str| -> Result<()> {
            if n_inlets == 1 && n_outlets == 1 {
                Ok(())
            } else {
                Err(HemoflowError::Graph(format!(
                    "{label} block '{name}' requires exactly one inlet and one outlet \
                     ({n_inlets} inlets, {n_outlets} outlets)"
                )))
            }
        };
        let one_port = |label: &str| -> Result<()> {
            if n_inlets + n_outlets == 1 {
                Ok(())
            } else {
                Err(HemoflowError::Graph(format!(
                    "{label} block '{name}' must connect to exactly one node \
                     ({n_inlets} inlets, {n_outlets} outlets)"
                )))
            }
        };

        match self {
            Self::BloodVessel(_) => {
                two_port("blood vessel")?;
                Ok(DofRequest {
                    num_equations: 3,
                    internal_vars: vec!["pressure_c"],
                })
            }
            Self::Junction(e) => {
                if n_inlets == 0 || n_outlets == 0 {
                    return Err(HemoflowError::Graph(format!(
                        "junction '{name}' must have at least one inlet and one outlet"
                    )));
                }
                e.num_inlets = n_inlets;
                e.num_outlets = n_outlets;
                Ok(DofRequest {
                    num_equations: n_inlets + n_outlets,
                    internal_vars: vec![],
                })
            }
            Self::ResistiveJunction(e) => {
                if n_inlets == 0 || n_outlets == 0 {
                    return Err(HemoflowError::Graph(format!(
                        "resistive junction '{name}' must have at least one inlet and one outlet"
                    )));
                }
                e.num_inlets = n_inlets;
                e.num_outlets = n_outlets;
                Ok(DofRequest {
                    num_equations: n_inlets + n_outlets + 1,
                    internal_vars: vec!["pressure_c"],
                })
            }
            Self::BloodVesselJunction(e) => {
                if n_inlets != 1 || n_outlets == 0 {
                    return Err(HemoflowError::Graph(format!(
                        "blood vessel junction '{name}' requires one inlet and at least one \
                         outlet ({n_inlets} inlets, {n_outlets} outlets)"
                    )));
                }
                // Ports for stamping: the inlet plus one internal node per
                // outlet, synthesized during model finalization.
                Ok(DofRequest {
                    num_equations: 1 + e.internal_nodes.len(),
                    internal_vars: vec![],
                })
            }
            Self::FlowReferenceBc(_) => {
                one_port("flow reference")?;
                Ok(DofRequest {
                    num_equations: 1,
                    internal_vars: vec![],
                })
            }
            Self::PressureReferenceBc(_) => {
                one_port("pressure reference")?;
                Ok(DofRequest {
                    num_equations: 1,
                    internal_vars: vec![],
                })
            }
            Self::ResistanceBc(_) => {
                one_port("resistance")?;
                Ok(DofRequest {
                    num_equations: 1,
                    internal_vars: vec![],
                })
            }
            Self::WindkesselBc(_) => {
                one_port("windkessel")?;
                Ok(DofRequest {
                    num_equations: 2,
                    internal_vars: vec!["pressure_c"],
                })
            }
            Self::OpenLoopCoronaryBc(_) => {
                one_port("open-loop coronary")?;
                Ok(DofRequest {
                    num_equations: 2,
                    internal_vars: vec!["volume_im"],
                })
            }
            Self::ClosedLoopCoronaryBc(_) => {
                two_port("closed-loop coronary")?;
                Ok(DofRequest {
                    num_equations: 3,
                    internal_vars: vec!["volume_im"],
                })
            }
            Self::ClosedLoopRcrBc(_) => {
                two_port("closed-loop RCR")?;
                Ok(DofRequest {
                    num_equations: 3,
                    internal_vars: vec!["pressure_c"],
                })
            }
            Self::ClosedLoopHeartPulmonary(_) => {
                two_port("heart/pulmonary")?;
                Ok(DofRequest {
                    num_equations: 14,
                    internal_vars: vec![
                        "V_RA", "Q_RA", "P_RV", "V_RV", "Q_RV", "P_pul", "P_LA", "V_LA", "Q_LA",
                        "P_LV", "V_LV", "Q_LV",
                    ],
                })
            }
            Self::ChamberKerckhoffs(_) => {
                two_port("chamber")?;
                Ok(DofRequest {
                    num_equations: 3,
                    internal_vars: vec!["Vc"],
                })
            }
            Self::Valve(_) => {
                two_port("valve")?;
                Ok(DofRequest {
                    num_equations: 2,
                    internal_vars: vec![],
                })
            }
        }
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        match self {
            Self::BloodVessel(e) => e.num_triplets(),
            Self::Junction(e) => e.num_triplets(),
            Self::ResistiveJunction(e) => e.num_triplets(),
            Self::BloodVesselJunction(e) => e.num_triplets(),
            Self::FlowReferenceBc(e) => e.num_triplets(),
            Self::PressureReferenceBc(e) => e.num_triplets(),
            Self::ResistanceBc(e) => e.num_triplets(),
            Self::WindkesselBc(e) => e.num_triplets(),
            Self::OpenLoopCoronaryBc(e) => e.num_triplets(),
            Self::ClosedLoopCoronaryBc(e) => e.num_triplets(),
            Self::ClosedLoopRcrBc(e) => e.num_triplets(),
            Self::ClosedLoopHeartPulmonary(e) => e.num_triplets(),
            Self::ChamberKerckhoffs(e) => e.num_triplets(),
            Self::Valve(e) => e.num_triplets(),
        }
    }
}
