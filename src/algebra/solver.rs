//! Direct linear solvers for the Newton update.
//!
//! The solver interface is split into a symbolic phase (structure analysis,
//! run once per sparsity pattern), a numeric phase (factorization, run once
//! per Newton iteration) and a solve phase. For repeated solves with the
//! same structure — every Newton iteration of every time step — the
//! symbolic analysis is cached and reused.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CscMatrix;

use crate::math::Scalar;

/// Error types for direct solvers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SolverError {
    /// Matrix is singular or numerically singular.
    #[error("matrix is singular")]
    SingularMatrix,
    /// Matrix structure is invalid or inconsistent.
    #[error("invalid matrix: {0}")]
    InvalidMatrix(String),
    /// Solver phases called out of order.
    #[error("{0}")]
    PhaseOrder(&'static str),
}

/// Trait for direct sparse linear solvers: solve `A·x = b`.
///
/// 1. **Symbolic phase**: analyze the matrix structure. The result can be
///    reused for matrices with the same sparsity pattern but different
///    values.
/// 2. **Numeric phase**: factor the matrix using the symbolic analysis.
/// 3. **Solve phase**: apply the factors to a right-hand side.
pub trait DirectSolver {
    /// Analyzes the matrix structure and prepares for factorization.
    ///
    /// Only the pattern is inspected; values are ignored.
    fn symbolic(&mut self, matrix: &CscMatrix<Scalar>) -> Result<(), SolverError>;

    /// Performs the numerical factorization.
    ///
    /// The structure must match the one passed to [`DirectSolver::symbolic`].
    fn numeric(&mut self, matrix: &CscMatrix<Scalar>) -> Result<(), SolverError>;

    /// Solves `A·x = b` using the current factorization.
    fn solve(&self, rhs: &DVector<Scalar>) -> Result<DVector<Scalar>, SolverError>;

    /// Returns the solver name for logging.
    fn name(&self) -> &str;

    /// Returns true if the solver has been factored and is ready to solve.
    fn is_ready(&self) -> bool;
}

/// Baseline direct solver using dense conversion and `nalgebra` LU.
///
/// Assembled 0D systems are small (tens to hundreds of unknowns), which is
/// the regime where dense factorization of the sparse Jacobian is
/// competitive and robust. Larger backends (KLU-style supernodal LU) can be
/// swapped in behind [`DirectSolver`] without touching the integrator.
pub struct BaselineLuSolver {
    lu: Option<nalgebra::LU<Scalar, nalgebra::Dyn, nalgebra::Dyn>>,
    dimension: Option<usize>,
}

impl BaselineLuSolver {
    /// Creates an unfactored solver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lu: None,
            dimension: None,
        }
    }

    fn csc_to_dense(csc: &CscMatrix<Scalar>) -> DMatrix<Scalar> {
        let mut dense = DMatrix::zeros(csc.nrows(), csc.ncols());
        for (row, col, &value) in csc.triplet_iter() {
            dense[(row, col)] = value;
        }
        dense
    }
}

impl Default for BaselineLuSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectSolver for BaselineLuSolver {
    fn symbolic(&mut self, matrix: &CscMatrix<Scalar>) -> Result<(), SolverError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(SolverError::InvalidMatrix(format!(
                "matrix must be square: {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        self.dimension = Some(matrix.nrows());
        self.lu = None;
        Ok(())
    }

    fn numeric(&mut self, matrix: &CscMatrix<Scalar>) -> Result<(), SolverError> {
        let dim = self
            .dimension
            .ok_or(SolverError::PhaseOrder("numeric() requires symbolic()"))?;
        if matrix.nrows() != dim {
            return Err(SolverError::InvalidMatrix(
                "matrix dimensions changed since symbolic phase".into(),
            ));
        }

        let lu = Self::csc_to_dense(matrix).lu();

        // Reject numerically singular factors via the U diagonal.
        let u = lu.u();
        let min_diag = (0..dim)
            .map(|i| u[(i, i)].abs())
            .fold(Scalar::INFINITY, Scalar::min);
        if !(min_diag > 1e-14) {
            return Err(SolverError::SingularMatrix);
        }

        self.lu = Some(lu);
        Ok(())
    }

    fn solve(&self, rhs: &DVector<Scalar>) -> Result<DVector<Scalar>, SolverError> {
        let lu = self
            .lu
            .as_ref()
            .ok_or(SolverError::PhaseOrder("solve() requires numeric()"))?;
        lu.solve(rhs).ok_or(SolverError::SingularMatrix)
    }

    fn name(&self) -> &str {
        "BaselineLU"
    }

    fn is_ready(&self) -> bool {
        self.lu.is_some()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra_sparse::CooMatrix;

    use super::*;

    fn csc_from(triplets: &[(usize, usize, Scalar)], n: usize) -> CscMatrix<Scalar> {
        let mut coo = CooMatrix::new(n, n);
        for &(i, j, v) in triplets {
            coo.push(i, j, v);
        }
        CscMatrix::from(&coo)
    }

    #[test]
    fn baseline_solver_simple_system() {
        // [2, 1; 1, 2] * [x; y] = [3; 3] => x = y = 1
        let matrix = csc_from(&[(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 2.0)], 2);
        let rhs = DVector::from_vec(vec![3.0, 3.0]);

        let mut solver = BaselineLuSolver::new();
        solver.symbolic(&matrix).unwrap();
        solver.numeric(&matrix).unwrap();
        assert!(solver.is_ready());

        let x = solver.solve(&rhs).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn symbolic_analysis_survives_value_changes() {
        let mut solver = BaselineLuSolver::new();
        let a = csc_from(&[(0, 0, 2.0), (1, 1, 4.0)], 2);
        solver.symbolic(&a).unwrap();
        solver.numeric(&a).unwrap();

        // Same pattern, new values: only the numeric phase reruns.
        let b = csc_from(&[(0, 0, 8.0), (1, 1, 2.0)], 2);
        solver.numeric(&b).unwrap();
        let x = solver.solve(&DVector::from_vec(vec![8.0, 8.0])).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn baseline_solver_rejects_singular_matrix() {
        let matrix = csc_from(&[(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 1.0)], 2);
        let mut solver = BaselineLuSolver::new();
        solver.symbolic(&matrix).unwrap();
        assert!(matches!(
            solver.numeric(&matrix),
            Err(SolverError::SingularMatrix)
        ));
    }

    #[test]
    fn phases_must_run_in_order() {
        let solver = BaselineLuSolver::new();
        assert!(matches!(
            solver.solve(&DVector::zeros(2)),
            Err(SolverError::PhaseOrder(_))
        ));
    }
}
