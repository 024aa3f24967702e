//! Junction whose branches are full RCL blood vessels.
//!
//! At model finalization the junction synthesizes one hidden node and one
//! hidden [`BloodVessel`](crate::model::blood_vessel::BloodVessel) child
//! per outlet. The junction itself contributes pressure continuity and
//! mass conservation over its inlet and the hidden nodes; the children
//! carry the RCL (and stenosis) algebra from the hidden nodes to the true
//! outlets. Hidden nodes and blocks participate in DOF layout and
//! assembly but are skipped by result export.
//!
//! Parameter layout: `[R₀…R_{N−1}, C₀…C_{N−1}, L₀…L_{N−1}, S₀…S_{N−1}]`
//! for `N` outlets.

use crate::algebra::system::SparseSystem;
use crate::model::block::{TripletsContributions, Wiring};
use crate::model::junction::stamp_junction;

/// Junction of RCL branches, expanded into hidden child vessels.
#[derive(Debug, Clone, Default)]
pub struct BloodVesselJunction {
    /// Hidden child vessel block ids (one per outlet).
    pub vessels: Vec<usize>,
    /// Hidden node ids between the junction and its children.
    pub internal_nodes: Vec<usize>,
}

impl BloodVesselJunction {
    /// Creates the element; children are synthesized during finalization.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn update_constant(&self, w: &Wiring, system: &mut SparseSystem) {
        // Continuity and mass conservation over inlet + internal nodes;
        // the hidden children stamp themselves.
        stamp_junction(w, system, 1, self.internal_nodes.len());
    }

    pub(crate) fn num_triplets(&self) -> TripletsContributions {
        let n = 1 + self.internal_nodes.len();
        TripletsContributions::new((n - 1) * 2 + n, 0, 0)
    }
}
