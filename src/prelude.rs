//! Common exports for downstream crates.

pub use crate::algebra::{Integrator, SparseSystem, State};
pub use crate::errors::{HemoflowError, Result};
pub use crate::math::Scalar;
pub use crate::model::{Block, BlockClass, Element, Model};
pub use crate::solve::{run_simulation, SimulationParameters, SimulationResults};
