//! The 0D model: blocks, nodes, parameters, and assembly orchestration.

use std::collections::HashMap;

use tracing::debug;

use crate::algebra::state::State;
use crate::algebra::system::SparseSystem;
use crate::errors::{HemoflowError, Result};
use crate::math::{Scalar, Vector};
use crate::model::block::{Block, BlockClass, Element, TripletsContributions};
use crate::model::closed_loop_coronary_bc::CoronarySide;
use crate::model::closed_loop_heart_pulmonary::ClosedLoopHeartPulmonary;
use crate::model::dofhandler::DofHandler;
use crate::model::node::Node;
use crate::model::parameter::{Parameter, ParameterBank};

/// A complete 0D model.
///
/// Blocks, nodes and parameters are owned by value in arenas and
/// cross-referenced by integer ids. Hidden blocks (children synthesized
/// by compound elements) live in a separate arena so that external
/// iteration skips them while DOF layout and assembly include them.
#[derive(Debug, Default)]
pub struct Model {
    /// Degree-of-freedom handler; written only during finalization.
    pub dofhandler: DofHandler,
    /// Cardiac cycle period; negative until a periodic parameter or the
    /// heart block claims it.
    pub cardiac_cycle_period: Scalar,
    /// Current simulation time (set by `update_time`).
    pub time: Scalar,
    blocks: Vec<Block>,
    hidden_blocks: Vec<Block>,
    block_index: HashMap<String, usize>,
    nodes: Vec<Node>,
    parameters: Vec<Parameter>,
    parameter_values: Vec<Scalar>,
    param_value_cache: HashMap<usize, Scalar>,
    finalized: bool,
}

impl Model {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cardiac_cycle_period: -1.0,
            ..Self::default()
        }
    }

    /// Adds a constant parameter and returns its id.
    pub fn add_parameter(&mut self, value: Scalar) -> usize {
        let id = self.parameters.len();
        let parameter = Parameter::new_constant(id, value);
        self.parameter_values.push(parameter.get(0.0));
        self.parameters.push(parameter);
        id
    }

    /// Adds a time-dependent parameter and returns its id.
    ///
    /// Periodic parameters claim the cardiac cycle period; conflicting
    /// claims fail with a configuration error.
    pub fn add_parameter_series(
        &mut self,
        times: Vec<Scalar>,
        values: Vec<Scalar>,
        periodic: bool,
    ) -> Result<usize> {
        let id = self.parameters.len();
        let parameter = Parameter::new_series(id, times, values, periodic)?;
        if periodic && !parameter.is_constant() {
            self.assign_cycle_period(parameter.cycle_period)?;
        }
        self.parameter_values.push(parameter.get(0.0));
        self.parameters.push(parameter);
        Ok(id)
    }

    /// Claims the cardiac cycle period, checking consistency with any
    /// previous claim.
    pub fn assign_cycle_period(&mut self, period: Scalar) -> Result<()> {
        if self.cardiac_cycle_period > 0.0 && self.cardiac_cycle_period != period {
            return Err(HemoflowError::Configuration(format!(
                "inconsistent cardiac cycle period: {} vs {}",
                self.cardiac_cycle_period, period
            )));
        }
        self.cardiac_cycle_period = period;
        Ok(())
    }

    /// Adds a block with the element's default class and returns its id.
    pub fn add_block(
        &mut self,
        element: Element,
        param_ids: &[usize],
        name: &str,
        internal: bool,
    ) -> Result<usize> {
        let class = element.default_class();
        self.add_block_with_class(element, class, param_ids, name, internal)
    }

    /// Adds a block with an explicit class tag (external coupling blocks).
    pub fn add_block_with_class(
        &mut self,
        element: Element,
        class: BlockClass,
        param_ids: &[usize],
        name: &str,
        internal: bool,
    ) -> Result<usize> {
        if self.finalized {
            return Err(HemoflowError::Configuration(format!(
                "cannot add block '{name}' to a finalized model"
            )));
        }
        if self.block_index.contains_key(name) {
            return Err(HemoflowError::Configuration(format!(
                "duplicate block name '{name}'"
            )));
        }
        for &id in param_ids {
            if id >= self.parameters.len() {
                return Err(HemoflowError::Configuration(format!(
                    "block '{name}' references unknown parameter {id}"
                )));
            }
        }
        let id = self.blocks.len() + self.hidden_blocks.len();
        debug!(name, ?class, id, "adding block");
        let block = Block::new(id, name, class, element, param_ids.to_vec());
        self.block_index.insert(name.to_string(), id);
        if internal {
            self.hidden_blocks.push(block);
        } else if self.hidden_blocks.is_empty() {
            self.blocks.push(block);
        } else {
            return Err(HemoflowError::Configuration(format!(
                "block '{name}' added after internal blocks"
            )));
        }
        Ok(id)
    }

    /// Adds a node between one upstream and one downstream block.
    pub fn add_node(
        &mut self,
        inlet_blocks: &[usize],
        outlet_blocks: &[usize],
        name: &str,
    ) -> Result<usize> {
        if self.finalized {
            return Err(HemoflowError::Configuration(format!(
                "cannot add node '{name}' to a finalized model"
            )));
        }
        if inlet_blocks.len() != 1 || outlet_blocks.len() != 1 {
            return Err(HemoflowError::Graph(format!(
                "node '{name}' must connect exactly one upstream and one downstream block"
            )));
        }
        let node_id = self.nodes.len();
        debug!(name, node_id, "adding node");
        for &block_id in inlet_blocks {
            self.block_mut(block_id)?.outlet_nodes.push(node_id);
        }
        for &block_id in outlet_blocks {
            self.block_mut(block_id)?.inlet_nodes.push(node_id);
        }
        self.nodes.push(Node::new(node_id, name));
        Ok(node_id)
    }

    /// Finalizes the model: expands compound blocks, assigns DOFs, and
    /// resolves model-dependent parameters. No structural changes are
    /// possible afterwards.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Err(HemoflowError::Configuration(
                "model already finalized".into(),
            ));
        }

        self.expand_compound_blocks()?;

        debug!("setting up degrees of freedom of nodes");
        for node in &mut self.nodes {
            node.setup_dofs(&mut self.dofhandler);
        }
        debug!("setting up degrees of freedom of blocks");
        for block in self.blocks.iter_mut().chain(self.hidden_blocks.iter_mut()) {
            block.setup_dofs(&mut self.dofhandler, &self.nodes)?;
        }

        self.resolve_model_dependent_params()?;

        if self.cardiac_cycle_period < 0.0 {
            self.cardiac_cycle_period = 1.0;
        }

        let (nv, ne) = (
            self.dofhandler.num_variables(),
            self.dofhandler.num_equations(),
        );
        if nv != ne {
            return Err(HemoflowError::Configuration(format!(
                "assembled system is not square: {nv} variables, {ne} equations"
            )));
        }

        self.finalized = true;
        Ok(())
    }

    /// Synthesizes hidden nodes and child vessels for blood-vessel
    /// junctions.
    fn expand_compound_blocks(&mut self) -> Result<()> {
        struct Expansion {
            block_index: usize,
            name: String,
            outlets: Vec<usize>,
            param_ids: Vec<usize>,
        }

        let mut expansions = Vec::new();
        for (index, block) in self.blocks.iter().enumerate() {
            if matches!(block.element, Element::BloodVesselJunction(_)) {
                if block.inlet_nodes.len() != 1 {
                    return Err(HemoflowError::Graph(format!(
                        "blood vessel junction '{}' requires exactly one inlet",
                        block.name
                    )));
                }
                let n_out = block.outlet_nodes.len();
                if block.global_param_ids.len() != 4 * n_out {
                    return Err(HemoflowError::Configuration(format!(
                        "blood vessel junction '{}' expects {} parameters (R, C, L, stenosis \
                         per outlet), got {}",
                        block.name,
                        4 * n_out,
                        block.global_param_ids.len()
                    )));
                }
                expansions.push(Expansion {
                    block_index: index,
                    name: block.name.clone(),
                    outlets: block.outlet_nodes.clone(),
                    param_ids: block.global_param_ids.clone(),
                });
            }
        }

        for expansion in expansions {
            let n_out = expansion.outlets.len();
            let mut internal_nodes = Vec::with_capacity(n_out);
            let mut vessels = Vec::with_capacity(n_out);
            for (i, &outlet) in expansion.outlets.iter().enumerate() {
                let node_id = self.nodes.len();
                self.nodes
                    .push(Node::new(node_id, format!("{}:{i}", expansion.name)));
                internal_nodes.push(node_id);

                let child_params = [
                    expansion.param_ids[i],
                    expansion.param_ids[n_out + i],
                    expansion.param_ids[2 * n_out + i],
                    expansion.param_ids[3 * n_out + i],
                ];
                let child_id = self.add_block(
                    Element::blood_vessel(),
                    &child_params,
                    &format!("{}_bv{i}", expansion.name),
                    true,
                )?;
                let child = self
                    .hidden_blocks
                    .last_mut()
                    .expect("child block just added");
                child.inlet_nodes.push(node_id);
                child.outlet_nodes.push(outlet);
                vessels.push(child_id);
            }

            if let Element::BloodVesselJunction(bvj) =
                &mut self.blocks[expansion.block_index].element
            {
                bvj.internal_nodes = internal_nodes;
                bvj.vessels = vessels;
            }
        }
        Ok(())
    }

    /// Resolves block parameters that depend on other blocks' DOFs, e.g.
    /// coronary blocks reading the heart's ventricular pressures.
    fn resolve_model_dependent_params(&mut self) -> Result<()> {
        let heart = self.blocks.iter().find_map(|block| {
            if matches!(block.element, Element::ClosedLoopHeartPulmonary(_)) {
                Some((
                    block.global_var_ids.clone(),
                    block.global_param_ids.clone(),
                    block.name.clone(),
                ))
            } else {
                None
            }
        });

        for block in &mut self.blocks {
            if let Element::ClosedLoopCoronaryBc(coronary) = &mut block.element {
                let Some((heart_vars, heart_params, _)) = &heart else {
                    return Err(HemoflowError::Configuration(format!(
                        "closed-loop coronary '{}' requires a heart/pulmonary block",
                        block.name
                    )));
                };
                match coronary.side {
                    CoronarySide::Left => {
                        coronary.ventricle_var_id = Some(heart_vars[13]);
                        coronary.im_param_id =
                            Some(heart_params[ClosedLoopHeartPulmonary::IML]);
                    }
                    CoronarySide::Right => {
                        coronary.ventricle_var_id = Some(heart_vars[6]);
                        coronary.im_param_id =
                            Some(heart_params[ClosedLoopHeartPulmonary::IMR]);
                    }
                }
            }
        }
        Ok(())
    }

    /// Sums the per-block triplet declarations for sparse reservation.
    #[must_use]
    pub fn get_num_triplets(&self) -> TripletsContributions {
        let mut total = TripletsContributions::default();
        for block in self.blocks.iter().chain(self.hidden_blocks.iter()) {
            total.add(block.num_triplets());
        }
        total
    }

    /// Drives the constant stamps of all blocks. Called exactly once per
    /// assembled system.
    pub fn update_constant(&mut self, system: &mut SparseSystem) {
        let bank = ParameterBank {
            values: &self.parameter_values,
            time: self.time,
            cycle_period: self.cardiac_cycle_period,
        };
        for block in self.blocks.iter().chain(self.hidden_blocks.iter()) {
            block.update_constant(system, &bank);
        }
    }

    /// Resamples every parameter at `time` and drives the time-dependent
    /// stamps of all blocks.
    pub fn update_time(&mut self, system: &mut SparseSystem, time: Scalar) {
        self.time = time;
        for parameter in &self.parameters {
            self.parameter_values[parameter.id] = parameter.get(time);
        }
        let bank = ParameterBank {
            values: &self.parameter_values,
            time: self.time,
            cycle_period: self.cardiac_cycle_period,
        };
        for block in self.blocks.iter_mut().chain(self.hidden_blocks.iter_mut()) {
            block.update_time(system, &bank);
        }
    }

    /// Drives the solution-dependent stamps of all blocks.
    ///
    /// `y` is mutable because discrete valve gating may clamp reverse
    /// flows in the current iterate.
    pub fn update_solution(&mut self, system: &mut SparseSystem, y: &mut Vector, ydot: &Vector) {
        let bank = ParameterBank {
            values: &self.parameter_values,
            time: self.time,
            cycle_period: self.cardiac_cycle_period,
        };
        for block in self.blocks.iter_mut().chain(self.hidden_blocks.iter_mut()) {
            block.update_solution(system, &bank, y, ydot);
        }
    }

    /// Converts parameters and blocks to steady behavior: time-dependent
    /// parameters collapse to their period means and Windkessel-class
    /// capacitances are zeroed (cached for restoration).
    pub fn to_steady(&mut self) {
        for parameter in &mut self.parameters {
            parameter.to_steady();
        }
        let mut capacitance_ids = Vec::new();
        for block in self.blocks.iter_mut().chain(self.hidden_blocks.iter_mut()) {
            block.steady = true;
            if matches!(
                block.element,
                Element::WindkesselBc(_) | Element::ClosedLoopRcrBc(_)
            ) {
                capacitance_ids.push(block.global_param_ids[1]);
            }
        }
        for id in capacitance_ids {
            let value = self.parameters[id].get(0.0);
            self.param_value_cache.insert(id, value);
            self.parameters[id].update(0.0);
        }
    }

    /// Restores unsteady behavior after [`Model::to_steady`].
    pub fn to_unsteady(&mut self) {
        for parameter in &mut self.parameters {
            parameter.to_unsteady();
        }
        for (id, value) in std::mem::take(&mut self.param_value_cache) {
            debug!(id, value, "restoring capacitance");
            self.parameters[id].update(value);
        }
        for block in self.blocks.iter_mut().chain(self.hidden_blocks.iter_mut()) {
            block.steady = false;
        }
    }

    /// Writes block-specific initial conditions into `state`.
    pub fn assign_initial_conditions(&self, state: &mut State) {
        for block in self.blocks.iter().chain(self.hidden_blocks.iter()) {
            block.assign_initial_conditions(state);
        }
    }

    /// Publicly visible blocks (hidden children excluded).
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// All nodes, including synthesized internal ones.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// A block by global id (public or hidden).
    #[must_use]
    pub fn get_block(&self, id: usize) -> Option<&Block> {
        if id < self.blocks.len() {
            self.blocks.get(id)
        } else {
            self.hidden_blocks.get(id - self.blocks.len())
        }
    }

    fn block_mut(&mut self, id: usize) -> Result<&mut Block> {
        let public = self.blocks.len();
        let block = if id < public {
            self.blocks.get_mut(id)
        } else {
            self.hidden_blocks.get_mut(id - public)
        };
        block.ok_or_else(|| HemoflowError::Graph(format!("unknown block id {id}")))
    }

    /// A block id by name.
    #[must_use]
    pub fn block_id(&self, name: &str) -> Option<usize> {
        self.block_index.get(name).copied()
    }

    /// Number of blocks; `internal` includes the hidden arena.
    #[must_use]
    pub fn num_blocks(&self, internal: bool) -> usize {
        if internal {
            self.blocks.len() + self.hidden_blocks.len()
        } else {
            self.blocks.len()
        }
    }

    /// Current cached value of a parameter.
    #[must_use]
    pub fn get_parameter_value(&self, id: usize) -> Scalar {
        self.parameter_values[id]
    }

    /// Replaces the value of a (constant) parameter.
    pub fn update_parameter_value(&mut self, id: usize, value: Scalar) {
        self.parameters[id].update(value);
        self.parameter_values[id] = value;
    }

    /// True if the model contains a heart/pulmonary block.
    #[must_use]
    pub fn has_heart_block(&self) -> bool {
        self.blocks
            .iter()
            .any(|b| matches!(b.element, Element::ClosedLoopHeartPulmonary(_)))
    }
}
