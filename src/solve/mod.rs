//! Simulation parameters and the time-stepping driver.

use serde::Deserialize;
use tracing::{debug, info};

use crate::algebra::{Integrator, State};
use crate::errors::{HemoflowError, Result};
use crate::math::Scalar;
use crate::model::Model;

/// Spectral radius of the generalized-α scheme used for 0D models.
pub const SPECTRAL_RADIUS: Scalar = 0.1;

/// Number of large steady steps used to relax toward the steady initial
/// condition.
const STEADY_INIT_STEPS: usize = 31;

/// Simulation control parameters, read from the `simulation_parameters`
/// section of the configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Number of cardiac cycles to simulate.
    pub number_of_cardiac_cycles: usize,
    /// Number of time steps per cardiac cycle.
    pub number_of_time_pts_per_cardiac_cycle: usize,
    /// Total number of time points (coupled simulations only).
    pub number_of_time_pts: usize,
    /// Absolute tolerance for the nonlinear iteration.
    pub absolute_tolerance: Scalar,
    /// Maximum number of nonlinear iterations per time step.
    pub maximum_nonlinear_iterations: usize,
    /// Start from the steady solution of the steady-mode model.
    pub steady_initial: bool,
    /// Write every n-th time step to the output.
    pub output_interval: usize,
    /// Write only the mean values over the recorded steps.
    pub output_mean_only: bool,
    /// Output per variable instead of per vessel.
    pub output_variable_based: bool,
    /// Include time derivatives in the output.
    pub output_derivative: bool,
    /// Write all cardiac cycles instead of only the last one.
    pub output_all_cycles: bool,
    /// The simulation is driven by an external solver.
    pub coupled_simulation: bool,
    /// External time step size (coupled simulations).
    pub external_step_size: Scalar,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            number_of_cardiac_cycles: 0,
            number_of_time_pts_per_cardiac_cycle: 0,
            number_of_time_pts: 0,
            absolute_tolerance: 1e-8,
            maximum_nonlinear_iterations: 30,
            steady_initial: true,
            output_interval: 1,
            output_mean_only: false,
            output_variable_based: false,
            output_derivative: false,
            output_all_cycles: false,
            coupled_simulation: false,
            external_step_size: 0.1,
        }
    }
}

impl SimulationParameters {
    /// Validates the time-stepping settings.
    pub fn validate(&self) -> Result<()> {
        if self.coupled_simulation {
            if self.number_of_time_pts < 2 {
                return Err(HemoflowError::Configuration(
                    "coupled simulations require number_of_time_pts >= 2".into(),
                ));
            }
        } else if self.number_of_cardiac_cycles == 0
            || self.number_of_time_pts_per_cardiac_cycle < 2
        {
            return Err(HemoflowError::Configuration(
                "number_of_cardiac_cycles and number_of_time_pts_per_cardiac_cycle \
                 must be set"
                    .into(),
            ));
        }
        if self.output_interval == 0 {
            return Err(HemoflowError::Configuration(
                "output_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Time steps per cycle for the configured mode.
    #[must_use]
    pub fn pts_per_cycle(&self) -> usize {
        if self.coupled_simulation {
            self.number_of_time_pts
        } else {
            self.number_of_time_pts_per_cardiac_cycle
        }
    }

    /// Total number of simulated time points.
    #[must_use]
    pub fn num_time_steps(&self) -> usize {
        if self.coupled_simulation {
            self.number_of_time_pts
        } else {
            (self.number_of_time_pts_per_cardiac_cycle - 1) * self.number_of_cardiac_cycles + 1
        }
    }

    /// Time step size for the given model.
    #[must_use]
    pub fn time_step_size(&self, model: &Model) -> Scalar {
        if self.coupled_simulation {
            self.external_step_size / (self.number_of_time_pts as Scalar - 1.0)
        } else {
            model.cardiac_cycle_period / (self.pts_per_cycle() as Scalar - 1.0)
        }
    }
}

/// Recorded simulation output: times with their states.
#[derive(Debug, Clone, Default)]
pub struct SimulationResults {
    /// Recorded time points.
    pub times: Vec<Scalar>,
    /// Recorded states, one per time point.
    pub states: Vec<State>,
}

/// Runs a simulation on a finalized model.
///
/// 1. Optionally relaxes to the steady solution first (rejected when the
///    model contains a heart/pulmonary block).
/// 2. Integrates `(pts_per_cycle − 1) · cycles` steps with `ρ = 0.1`.
/// 3. Records every `output_interval`-th step; unless `output_all_cycles`
///    is set, only the last cycle is kept and its times are rebased to
///    zero.
pub fn run_simulation(
    model: &mut Model,
    params: &SimulationParameters,
    mut state: State,
) -> Result<SimulationResults> {
    params.validate()?;

    if params.steady_initial && model.has_heart_block() {
        return Err(HemoflowError::Configuration(
            "steady initial condition is not compatible with a heart/pulmonary block".into(),
        ));
    }

    if params.steady_initial {
        debug!("calculating steady initial condition");
        let dt_steady = model.cardiac_cycle_period / 10.0;
        model.to_steady();
        let mut integrator = Integrator::new(
            model,
            dt_steady,
            SPECTRAL_RADIUS,
            params.absolute_tolerance,
            params.maximum_nonlinear_iterations,
        )?;
        for step in 0..STEADY_INIT_STEPS {
            state = integrator.step(model, &state, dt_steady * step as Scalar)?;
        }
        model.to_unsteady();
    }

    let time_step_size = params.time_step_size(model);
    let num_time_steps = params.num_time_steps();
    debug!(time_step_size, num_time_steps, "setting up time integration");
    let mut integrator = Integrator::new(
        model,
        time_step_size,
        SPECTRAL_RADIUS,
        params.absolute_tolerance,
        params.maximum_nonlinear_iterations,
    )?;

    let last_cycle_only = !params.output_all_cycles && !params.coupled_simulation;
    let start_last_cycle = num_time_steps.saturating_sub(params.pts_per_cycle());

    let mut results = SimulationResults::default();
    let mut time = 0.0;
    if !last_cycle_only || start_last_cycle == 0 {
        results.times.push(time);
        results.states.push(state.clone());
    }

    let mut interval_counter = 0;
    for step in 1..num_time_steps {
        state = integrator.step(model, &state, time)?;
        time = time_step_size * step as Scalar;
        interval_counter += 1;
        if interval_counter == params.output_interval
            || (last_cycle_only && step == start_last_cycle)
        {
            if !last_cycle_only || step >= start_last_cycle {
                results.times.push(time);
                results.states.push(state.clone());
            }
            interval_counter = 0;
        }
    }

    if last_cycle_only {
        if let Some(&start_time) = results.times.first() {
            for t in &mut results.times {
                *t -= start_time;
            }
        }
    }

    info!(
        steps = integrator.n_steps(),
        mean_nonlinear_iterations = integrator.avg_nonlin_iter(),
        "time integration finished"
    );
    Ok(results)
}
