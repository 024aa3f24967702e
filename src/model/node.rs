//! Connection points between block ends.

use crate::model::dofhandler::DofHandler;

/// A node pairs the flow and pressure unknowns shared between exactly one
/// upstream block end and one downstream block end.
#[derive(Debug, Clone)]
pub struct Node {
    /// Global node id.
    pub id: usize,
    /// Node name, used for DOF labels.
    pub name: String,
    /// Global index of the flow variable.
    pub flow_dof: usize,
    /// Global index of the pressure variable.
    pub pres_dof: usize,
}

impl Node {
    /// Creates a node with unassigned DOFs.
    #[must_use]
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            flow_dof: usize::MAX,
            pres_dof: usize::MAX,
        }
    }

    /// Registers the flow and pressure variables of this node.
    ///
    /// Nodes contribute no equations.
    pub fn setup_dofs(&mut self, dofhandler: &mut DofHandler) {
        self.flow_dof = dofhandler.register_variable(format!("flow:{}", self.name));
        self.pres_dof = dofhandler.register_variable(format!("pressure:{}", self.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_flow_then_pressure() {
        let mut dof = DofHandler::new();
        let mut node = Node::new(0, "inflow:vessel");
        node.setup_dofs(&mut dof);
        assert_eq!(node.flow_dof, 0);
        assert_eq!(node.pres_dof, 1);
        assert_eq!(dof.variables[0], "flow:inflow:vessel");
        assert_eq!(dof.variables[1], "pressure:inflow:vessel");
    }
}
