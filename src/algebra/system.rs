//! Sparse DAE system `E·ẏ + F·y + c = 0` with its Newton workspace.
//!
//! Blocks stamp their local contributions into the five system matrices
//! through value-addressable coordinate stores. The sparsity pattern is
//! data-dependent but fixed after the first complete assembly pass: once
//! [`SparseSystem::freeze`] runs, writes may only overwrite existing
//! coordinates, the union Jacobian pattern is final, and the solver's
//! symbolic analysis is computed exactly once.

use std::collections::{BTreeMap, HashMap};

use nalgebra_sparse::CscMatrix;

use crate::algebra::solver::{BaselineLuSolver, DirectSolver, SolverError};
use crate::errors::{HemoflowError, Result};
use crate::math::{Scalar, Vector};

/// Square sparse matrix addressed by `(row, col)` with a freezable pattern.
///
/// Before [`CoordMatrix::freeze`] a write allocates the coordinate;
/// afterwards writing an unknown coordinate panics — the assembly contract
/// requires all structural nonzeros to be stamped during the pattern pass.
#[derive(Debug, Clone)]
pub struct CoordMatrix {
    dim: usize,
    index: HashMap<(usize, usize), usize>,
    coords: Vec<(usize, usize)>,
    values: Vec<Scalar>,
    frozen: bool,
}

impl CoordMatrix {
    fn new(dim: usize) -> Self {
        Self {
            dim,
            index: HashMap::new(),
            coords: Vec::new(),
            values: Vec::new(),
            frozen: false,
        }
    }

    fn reserve(&mut self, nnz: usize) {
        self.index.reserve(nnz);
        self.coords.reserve(nnz);
        self.values.reserve(nnz);
    }

    /// Sets entry `(row, col)` to `value`, allocating it if the pattern is
    /// still open.
    pub fn set(&mut self, row: usize, col: usize, value: Scalar) {
        assert!(row < self.dim && col < self.dim, "coordinate out of range");
        if let Some(&slot) = self.index.get(&(row, col)) {
            self.values[slot] = value;
        } else {
            assert!(
                !self.frozen,
                "write to ({row}, {col}) outside the frozen sparsity pattern"
            );
            let slot = self.values.len();
            self.index.insert((row, col), slot);
            self.coords.push((row, col));
            self.values.push(value);
        }
    }

    /// Returns entry `(row, col)`, zero if not in the pattern.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Scalar {
        self.index
            .get(&(row, col))
            .map_or(0.0, |&slot| self.values[slot])
    }

    /// Number of structural nonzeros.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Accumulates `out -= A·x`.
    fn sub_mul(&self, x: &Vector, out: &mut Vector) {
        for (slot, &(row, col)) in self.coords.iter().enumerate() {
            out[row] -= self.values[slot] * x[col];
        }
    }
}

/// Per-matrix slot → position in the union Jacobian value array.
struct SlotMap(Vec<usize>);

/// Frozen Jacobian pattern plus the cached solver.
struct JacobianWorkspace {
    csc: CscMatrix<Scalar>,
    map_f: SlotMap,
    map_e: SlotMap,
    map_de: SlotMap,
    map_df: SlotMap,
    map_dc: SlotMap,
    solver: BaselineLuSolver,
}

/// The assembled DAE system and its Newton workspace.
pub struct SparseSystem {
    n: usize,
    /// Matrix multiplying `ẏ`.
    pub e: CoordMatrix,
    /// Matrix multiplying `y`.
    pub f: CoordMatrix,
    /// Solution derivative of the `E·ẏ` term, `∂(E·ẏ)/∂y`.
    pub de: CoordMatrix,
    /// Solution derivative of the `F·y` term, `∂(F·y)/∂y`.
    pub df: CoordMatrix,
    /// Solution derivative of the constant term, `∂c/∂y`.
    pub dc: CoordMatrix,
    /// Constant vector `c`.
    pub c: Vector,
    /// Newton residual `−(E·ẏ + F·y + c)`.
    pub residual: Vector,
    /// Newton increment `Δy` from the last solve.
    pub dy: Vector,
    jacobian: Option<JacobianWorkspace>,
}

impl SparseSystem {
    /// Creates an empty system of size `n`.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            n,
            e: CoordMatrix::new(n),
            f: CoordMatrix::new(n),
            de: CoordMatrix::new(n),
            df: CoordMatrix::new(n),
            dc: CoordMatrix::new(n),
            c: Vector::zeros(n),
            residual: Vector::zeros(n),
            dy: Vector::zeros(n),
            jacobian: None,
        }
    }

    /// System dimension.
    #[must_use]
    pub fn size(&self) -> usize {
        self.n
    }

    /// Reserves capacity from the summed per-block triplet declarations.
    pub fn reserve(&mut self, triplets_f: usize, triplets_e: usize, triplets_d: usize) {
        self.f.reserve(triplets_f);
        self.e.reserve(triplets_e);
        self.de.reserve(triplets_d);
        self.df.reserve(triplets_d);
        self.dc.reserve(triplets_d);
    }

    /// Updates the residual `−(E·ẏ + F·y + c)` for the given iterate.
    pub fn update_residual(&mut self, y: &Vector, ydot: &Vector) {
        debug_assert_eq!(y.len(), self.n);
        debug_assert_eq!(ydot.len(), self.n);
        for i in 0..self.n {
            self.residual[i] = -self.c[i];
        }
        self.e.sub_mul(ydot, &mut self.residual);
        self.f.sub_mul(y, &mut self.residual);
    }

    /// Fixes the sparsity pattern, builds the union Jacobian structure, and
    /// runs the solver's symbolic analysis once.
    pub fn freeze(&mut self) -> Result<()> {
        self.e.freeze();
        self.f.freeze();
        self.de.freeze();
        self.df.freeze();
        self.dc.freeze();

        // Union pattern in column-major order.
        let mut union: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for m in [&self.f, &self.e, &self.de, &self.df, &self.dc] {
            for &(row, col) in &m.coords {
                union.entry((col, row)).or_insert(0);
            }
        }
        for (position, (_, slot)) in union.iter_mut().enumerate() {
            *slot = position;
        }

        let nnz = union.len();
        let mut col_offsets = vec![0usize; self.n + 1];
        let mut row_indices = vec![0usize; nnz];
        for (&(col, row), &position) in &union {
            col_offsets[col + 1] += 1;
            row_indices[position] = row;
        }
        for col in 0..self.n {
            col_offsets[col + 1] += col_offsets[col];
        }

        let csc = CscMatrix::try_from_csc_data(
            self.n,
            self.n,
            col_offsets,
            row_indices,
            vec![0.0; nnz],
        )
        .map_err(|e| HemoflowError::LinearSolve(format!("invalid jacobian pattern: {e:?}")))?;

        let slot_map = |m: &CoordMatrix| {
            SlotMap(
                m.coords
                    .iter()
                    .map(|&(row, col)| union[&(col, row)])
                    .collect(),
            )
        };

        let mut workspace = JacobianWorkspace {
            map_f: slot_map(&self.f),
            map_e: slot_map(&self.e),
            map_de: slot_map(&self.de),
            map_df: slot_map(&self.df),
            map_dc: slot_map(&self.dc),
            solver: BaselineLuSolver::new(),
            csc,
        };
        workspace
            .solver
            .symbolic(&workspace.csc)
            .map_err(solve_error)?;
        self.jacobian = Some(workspace);
        Ok(())
    }

    /// Assembles the Jacobian `F + dE + dF + dC + e_coeff·E`.
    ///
    /// `e_coeff` is the generalized-α coupling coefficient
    /// `αm / (αf·γ·Δt)` relating the increment of `ẏ` to the increment of
    /// `y` within a Newton iteration.
    ///
    /// # Panics
    ///
    /// Panics if called before [`SparseSystem::freeze`].
    pub fn update_jacobian(&mut self, e_coeff: Scalar) {
        let workspace = self
            .jacobian
            .as_mut()
            .expect("update_jacobian requires a frozen system");
        let values = workspace.csc.values_mut();
        values.fill(0.0);
        for (slot, &position) in workspace.map_f.0.iter().enumerate() {
            values[position] += self.f.values[slot];
        }
        for (slot, &position) in workspace.map_de.0.iter().enumerate() {
            values[position] += self.de.values[slot];
        }
        for (slot, &position) in workspace.map_df.0.iter().enumerate() {
            values[position] += self.df.values[slot];
        }
        for (slot, &position) in workspace.map_dc.0.iter().enumerate() {
            values[position] += self.dc.values[slot];
        }
        for (slot, &position) in workspace.map_e.0.iter().enumerate() {
            values[position] += e_coeff * self.e.values[slot];
        }
    }

    /// Solves `J·Δy = residual` into [`SparseSystem::dy`], reusing the
    /// cached symbolic analysis.
    pub fn solve(&mut self) -> Result<()> {
        let workspace = self
            .jacobian
            .as_mut()
            .ok_or_else(|| HemoflowError::LinearSolve("solve on an unfrozen system".into()))?;
        workspace
            .solver
            .numeric(&workspace.csc)
            .map_err(solve_error)?;
        self.dy = workspace.solver.solve(&self.residual).map_err(solve_error)?;
        Ok(())
    }
}

fn solve_error(e: SolverError) -> HemoflowError {
    HemoflowError::LinearSolve(e.to_string())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    /// 2-DOF system: E = I on dof 1, F = [[2, 0], [0, 1]], c = [-4, 0].
    fn small_system() -> SparseSystem {
        let mut sys = SparseSystem::new(2);
        sys.f.set(0, 0, 2.0);
        sys.f.set(1, 1, 1.0);
        sys.e.set(1, 1, 1.0);
        sys.c[0] = -4.0;
        sys
    }

    #[test]
    fn residual_combines_all_terms() {
        let mut sys = small_system();
        let y = Vector::from_vec(vec![1.0, 2.0]);
        let ydot = Vector::from_vec(vec![0.0, 3.0]);
        sys.update_residual(&y, &ydot);
        // r = -(E ydot + F y + c)
        assert_relative_eq!(sys.residual[0], -(2.0 - 4.0));
        assert_relative_eq!(sys.residual[1], -(3.0 + 2.0));
    }

    #[test]
    fn jacobian_scales_e_by_coefficient() {
        let mut sys = small_system();
        sys.freeze().unwrap();
        sys.update_jacobian(10.0);
        sys.update_residual(&Vector::zeros(2), &Vector::zeros(2));
        // J = [[2, 0], [0, 1 + 10]], r = [4, 0] => dy = [2, 0]
        sys.solve().unwrap();
        assert_relative_eq!(sys.dy[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(sys.dy[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn value_overwrites_are_allowed_after_freeze() {
        let mut sys = small_system();
        sys.freeze().unwrap();
        sys.f.set(0, 0, 5.0);
        assert_relative_eq!(sys.f.get(0, 0), 5.0);
    }

    #[test]
    #[should_panic(expected = "frozen sparsity pattern")]
    fn new_coordinates_are_rejected_after_freeze() {
        let mut sys = small_system();
        sys.freeze().unwrap();
        sys.f.set(0, 1, 1.0);
    }

    #[test]
    fn derivative_matrices_enter_the_jacobian() {
        let mut sys = SparseSystem::new(1);
        sys.f.set(0, 0, 1.0);
        sys.df.set(0, 0, 2.0);
        sys.dc.set(0, 0, 3.0);
        sys.freeze().unwrap();
        sys.update_jacobian(0.0);
        sys.c[0] = -12.0;
        sys.update_residual(&Vector::zeros(1), &Vector::zeros(1));
        // J = 1 + 2 + 3 = 6, r = 12 => dy = 2
        sys.solve().unwrap();
        assert_relative_eq!(sys.dy[0], 2.0, epsilon = 1e-12);
    }
}
