//! Generalized-α time integration.
//!
//! Flow rate and pressure in 0D vascular models are governed by the
//! nonlinear differential-algebraic system
//!
//! ```text
//! E(y, t)·ẏ + F(y, t)·y + c(y, t) = 0
//! ```
//!
//! solved implicitly with the generalized-α method (Jansen, Whiting &
//! Hulbert, 2000). Each step launches a predictor followed by a
//! multi-corrector Newton iteration evaluated at the intermediate times
//! `t_{n+αf}` (for `y`) and `t_{n+αm}` (for `ẏ`):
//!
//! 1. **Predictor**: `y_{n+1} = y_n`, `ẏ_{n+1} = ((γ−1)/γ)·ẏ_n`.
//! 2. **Initiator**: `y_αf = y_n + αf·(y_{n+1} − y_n)`,
//!    `ẏ_αm = ẏ_n + αm·(ẏ_{n+1} − ẏ_n)`.
//! 3. **Multi-corrector**: Newton iterations on the residual at
//!    `(y_αf, ẏ_αm, t_{n+αf})`, with `ẏ_αm` incremented by
//!    `Δy·αm/(αf·γ·Δt)`.
//! 4. **Update**: `y_{n+1} = y_n + (y_αf − y_n)/αf`,
//!    `ẏ_{n+1} = ẏ_n + (ẏ_αm − ẏ_n)/αm`.
//!
//! The spectral radius `ρ ∈ (0, 1]` controls high-frequency damping;
//! `αm = ½(3−ρ)/(1+ρ)`, `αf = 1/(1+ρ)`, `γ = ½ + αm − αf`.

use crate::algebra::state::State;
use crate::algebra::system::SparseSystem;
use crate::errors::{HemoflowError, Result};
use crate::math::{inf_norm, Scalar};
use crate::model::Model;

/// Generalized-α integrator owning the assembled system.
pub struct Integrator {
    alpha_m: Scalar,
    alpha_f: Scalar,
    gamma: Scalar,
    time_step_size: Scalar,
    ydot_init_coeff: Scalar,
    e_coeff: Scalar,
    atol: Scalar,
    max_iter: usize,
    size: usize,
    y_af: crate::math::Vector,
    ydot_am: crate::math::Vector,
    system: SparseSystem,
    n_steps: usize,
    n_nonlin_iter: usize,
}

impl Integrator {
    /// Creates an integrator for `model` and performs the one-time system
    /// assembly.
    ///
    /// The sparsity pattern is established by a single pass of
    /// `update_constant`, `update_time` at `t = 0` and `update_solution`
    /// with a zero guess, then frozen; the symbolic factorization is
    /// computed once from that pattern.
    pub fn new(
        model: &mut Model,
        time_step_size: Scalar,
        rho: Scalar,
        atol: Scalar,
        max_iter: usize,
    ) -> Result<Self> {
        if !(rho > 0.0 && rho <= 1.0) {
            return Err(HemoflowError::Configuration(format!(
                "spectral radius must be in (0, 1], got {rho}"
            )));
        }
        if time_step_size <= 0.0 {
            return Err(HemoflowError::Configuration(format!(
                "time step size must be positive, got {time_step_size}"
            )));
        }

        let alpha_m = 0.5 * (3.0 - rho) / (1.0 + rho);
        let alpha_f = 1.0 / (1.0 + rho);
        let gamma = 0.5 + alpha_m - alpha_f;

        let size = model.dofhandler.size();
        let mut system = SparseSystem::new(size);
        let triplets = model.get_num_triplets();
        system.reserve(triplets.f, triplets.e, triplets.d);

        // Pattern pass: stamp every structural nonzero once, then freeze.
        model.update_constant(&mut system);
        model.update_time(&mut system, 0.0);
        let mut y0 = crate::math::Vector::zeros(size);
        let ydot0 = crate::math::Vector::zeros(size);
        model.update_solution(&mut system, &mut y0, &ydot0);
        system.freeze()?;

        Ok(Self {
            alpha_m,
            alpha_f,
            gamma,
            time_step_size,
            ydot_init_coeff: (gamma - 1.0) / gamma,
            e_coeff: alpha_m / (alpha_f * gamma * time_step_size),
            atol,
            max_iter,
            size,
            y_af: crate::math::Vector::zeros(size),
            ydot_am: crate::math::Vector::zeros(size),
            system,
            n_steps: 0,
            n_nonlin_iter: 0,
        })
    }

    /// Advances the state from `t` to `t + Δt`.
    ///
    /// # Errors
    ///
    /// [`HemoflowError::Dimension`] if the state size does not match the
    /// system, [`HemoflowError::NonlinearDivergence`] if the Newton loop
    /// exhausts its iteration budget, and
    /// [`HemoflowError::LinearSolve`] on a singular Jacobian.
    pub fn step(&mut self, model: &mut Model, state: &State, time: Scalar) -> Result<State> {
        if state.y.len() != self.size || state.ydot.len() != self.size {
            return Err(HemoflowError::Dimension {
                expected: self.size,
                got: state.y.len(),
            });
        }

        // Predictor: y_{n+1} = y_n, ydot_{n+1} = (gamma - 1)/gamma * ydot_n.
        // Initiator collapses to y_af = y_n and the ydot blend below.
        self.y_af.copy_from(&state.y);
        self.ydot_am.copy_from(&state.ydot);
        self.ydot_am *= 1.0 + self.alpha_m * (self.ydot_init_coeff - 1.0);

        let t_af = time + self.alpha_f * self.time_step_size;
        model.update_time(&mut self.system, t_af);

        let mut converged = false;
        for iteration in 0..self.max_iter {
            model.update_solution(&mut self.system, &mut self.y_af, &self.ydot_am);
            self.system.update_residual(&self.y_af, &self.ydot_am);

            let residual_norm = inf_norm(&self.system.residual);
            if residual_norm < self.atol {
                self.n_nonlin_iter += iteration;
                converged = true;
                break;
            }
            if iteration == self.max_iter - 1 {
                return Err(HemoflowError::NonlinearDivergence {
                    time,
                    residual: residual_norm,
                    iterations: iteration + 1,
                });
            }

            self.system.update_jacobian(self.e_coeff);
            self.system.solve()?;

            self.y_af += &self.system.dy;
            self.ydot_am.axpy(self.e_coeff, &self.system.dy, 1.0);
        }
        debug_assert!(converged);

        // Corrector update back to t_{n+1}.
        let mut next = State::zero(self.size);
        next.y = &state.y + (&self.y_af - &state.y) / self.alpha_f;
        next.ydot = &state.ydot + (&self.ydot_am - &state.ydot) / self.alpha_m;

        self.n_steps += 1;
        Ok(next)
    }

    /// Refreshes Δt-derived coefficients and the constant/time-dependent
    /// stamps after an external time-step change (coupled simulations).
    pub fn update_params(&mut self, model: &mut Model, time_step_size: Scalar) {
        self.time_step_size = time_step_size;
        self.e_coeff = self.alpha_m / (self.alpha_f * self.gamma * time_step_size);
        model.update_constant(&mut self.system);
        model.update_time(&mut self.system, 0.0);
    }

    /// Mean number of nonlinear iterations per completed step.
    #[must_use]
    pub fn avg_nonlin_iter(&self) -> f64 {
        if self.n_steps == 0 {
            0.0
        } else {
            self.n_nonlin_iter as f64 / self.n_steps as f64
        }
    }

    /// Number of completed steps.
    #[must_use]
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Time step size the integrator was built with.
    #[must_use]
    pub fn time_step_size(&self) -> Scalar {
        self.time_step_size
    }

    /// Read access to the assembled system (convergence witnesses, tests).
    #[must_use]
    pub fn system(&self) -> &SparseSystem {
        &self.system
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn generalized_alpha_constants() {
        // rho = 0.1: alpha_m = 0.5*(2.9/1.1), alpha_f = 1/1.1
        let rho: Scalar = 0.1;
        let alpha_m = 0.5 * (3.0 - rho) / (1.0 + rho);
        let alpha_f = 1.0 / (1.0 + rho);
        let gamma = 0.5 + alpha_m - alpha_f;
        assert_relative_eq!(alpha_m, 1.318181818181818, epsilon = 1e-12);
        assert_relative_eq!(alpha_f, 0.909090909090909, epsilon = 1e-12);
        assert_relative_eq!(gamma, 0.909090909090909, epsilon = 1e-12);
        // e_coeff at dt = 0.01
        let e_coeff = alpha_m / (alpha_f * gamma * 0.01);
        assert_relative_eq!(e_coeff, 159.5, epsilon = 1e-9);
    }
}
