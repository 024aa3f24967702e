//! End-to-end integration of assembled models through the generalized-α
//! integrator.

use hemoflow::algebra::{Integrator, SparseSystem, State};
use hemoflow::math::inf_norm;
use hemoflow::model::{Element, Model};
use hemoflow::solve::{run_simulation, SimulationParameters};

const RHO: f64 = 0.1;
const ATOL: f64 = 1e-8;
const MAX_ITER: usize = 30;

fn dof(model: &Model, label: &str) -> usize {
    model
        .dofhandler
        .variable_index(label)
        .unwrap_or_else(|| panic!("missing variable {label}"))
}

/// Single segment with prescribed inflow and a resistance outlet.
fn resistor_chain(q: f64, r_vessel: f64, stenosis: f64, r_out: f64) -> Model {
    let mut model = Model::new();
    let q = model.add_parameter(q);
    let r = model.add_parameter(r_vessel);
    let c = model.add_parameter(0.0);
    let l = model.add_parameter(0.0);
    let s = model.add_parameter(stenosis);
    let rd = model.add_parameter(r_out);
    let pd = model.add_parameter(0.0);

    let inflow = model
        .add_block(Element::flow_reference(), &[q], "INFLOW", false)
        .unwrap();
    let vessel = model
        .add_block(Element::blood_vessel(), &[r, c, l, s], "vessel", false)
        .unwrap();
    let outlet = model
        .add_block(Element::resistance(), &[rd, pd], "OUT", false)
        .unwrap();
    model
        .add_node(&[inflow], &[vessel], "INFLOW:vessel")
        .unwrap();
    model.add_node(&[vessel], &[outlet], "vessel:OUT").unwrap();
    model.finalize().unwrap();
    model
}

/// Prescribed inflow into an RCR Windkessel.
fn windkessel_model(q: f64, rp: f64, c: f64, rd: f64) -> Model {
    let mut model = Model::new();
    let q = model.add_parameter(q);
    let rp = model.add_parameter(rp);
    let c = model.add_parameter(c);
    let rd = model.add_parameter(rd);
    let pd = model.add_parameter(0.0);
    let inflow = model
        .add_block(Element::flow_reference(), &[q], "INFLOW", false)
        .unwrap();
    let outlet = model
        .add_block(Element::windkessel(), &[rp, c, rd, pd], "RCR", false)
        .unwrap();
    model.add_node(&[inflow], &[outlet], "INFLOW:RCR").unwrap();
    model.finalize().unwrap();
    model
}

/// Residual of the assembled (unfrozen) system at a given state.
fn residual_norm(model: &mut Model, state: &State) -> f64 {
    let mut system = SparseSystem::new(model.dofhandler.size());
    let triplets = model.get_num_triplets();
    system.reserve(triplets.f, triplets.e, triplets.d);
    model.update_constant(&mut system);
    model.update_time(&mut system, 0.0);
    let mut y = state.y.clone();
    model.update_solution(&mut system, &mut y, &state.ydot);
    system.update_residual(&y, &state.ydot);
    inf_norm(&system.residual)
}

#[test]
fn resistor_chain_reaches_exact_steady_values() {
    // Q = 1 through R = 100 into R = 100 against Pd = 0.
    let mut model = resistor_chain(1.0, 100.0, 0.0, 100.0);
    let mut integrator = Integrator::new(&mut model, 0.01, RHO, ATOL, MAX_ITER).unwrap();

    let mut state = State::zero(model.dofhandler.size());
    for step in 0..10 {
        state = integrator.step(&mut model, &state, 0.01 * step as f64).unwrap();
        // Convergence witness: the returned iterate satisfies the residual
        // tolerance.
        assert!(inf_norm(&integrator.system().residual) < ATOL);
    }

    assert!((state.y[dof(&model, "flow:INFLOW:vessel")] - 1.0).abs() < 1e-7);
    assert!((state.y[dof(&model, "flow:vessel:OUT")] - 1.0).abs() < 1e-7);
    assert!((state.y[dof(&model, "pressure:INFLOW:vessel")] - 200.0).abs() < 1e-7);
    assert!((state.y[dof(&model, "pressure:vessel:OUT")] - 100.0).abs() < 1e-7);
}

#[test]
fn stationary_model_produces_stationary_steps() {
    let mut model = resistor_chain(1.0, 100.0, 0.0, 100.0);
    let mut integrator = Integrator::new(&mut model, 0.01, RHO, ATOL, MAX_ITER).unwrap();

    let mut state = State::zero(model.dofhandler.size());
    for step in 0..20 {
        state = integrator.step(&mut model, &state, 0.01 * step as f64).unwrap();
    }
    let next = integrator.step(&mut model, &state, 0.2).unwrap();
    let diff = inf_norm(&(&next.y - &state.y));
    assert!(diff < 10.0 * ATOL, "state drifted by {diff}");
}

#[test]
fn windkessel_step_response_brackets_proximal_and_total_resistance() {
    // Early time: the capacitor is uncharged, P ~ Rp Q. A few tiny steps
    // let the predictor transient of the algebraic variables decay.
    let mut model = windkessel_model(1.0, 10.0, 1.0, 100.0);
    let dt = 1e-6;
    let mut integrator = Integrator::new(&mut model, dt, RHO, ATOL, MAX_ITER).unwrap();
    let mut state = State::zero(model.dofhandler.size());
    for step in 0..8 {
        state = integrator.step(&mut model, &state, dt * step as f64).unwrap();
    }
    let p_early = state.y[dof(&model, "pressure:INFLOW:RCR")];
    assert!(
        (p_early - 10.0).abs() < 1e-4,
        "early-time pressure {p_early}"
    );

    // Late time: the capacitor is an open circuit, P -> Rp + Rd.
    let mut model = windkessel_model(1.0, 10.0, 1.0, 100.0);
    let mut integrator = Integrator::new(&mut model, 1.0, RHO, ATOL, MAX_ITER).unwrap();
    let mut state = State::zero(model.dofhandler.size());
    for step in 0..2000 {
        state = integrator.step(&mut model, &state, step as f64).unwrap();
    }
    let p_late = state.y[dof(&model, "pressure:INFLOW:RCR")];
    assert!((p_late - 110.0).abs() < 1e-4, "late-time pressure {p_late}");
}

#[test]
fn junction_conserves_mass_and_pressure() {
    // Two prescribed inflows (2 and 3) through identical resistors into a
    // junction, one outlet resistor against P = 0.
    let mut model = Model::new();
    let q1 = model.add_parameter(2.0);
    let q2 = model.add_parameter(3.0);
    let r = model.add_parameter(50.0);
    let zero = model.add_parameter(0.0);

    let in1 = model
        .add_block(Element::flow_reference(), &[q1], "IN1", false)
        .unwrap();
    let in2 = model
        .add_block(Element::flow_reference(), &[q2], "IN2", false)
        .unwrap();
    let mut vessel = |model: &mut Model, name: &str| {
        model
            .add_block(Element::blood_vessel(), &[r, zero, zero, zero], name, false)
            .unwrap()
    };
    let v1 = vessel(&mut model, "v1");
    let v2 = vessel(&mut model, "v2");
    let v3 = vessel(&mut model, "v3");
    let junction = model.add_block(Element::junction(), &[], "J0", false).unwrap();
    let out = model
        .add_block(Element::pressure_reference(), &[zero], "OUT", false)
        .unwrap();

    model.add_node(&[in1], &[v1], "IN1:v1").unwrap();
    model.add_node(&[in2], &[v2], "IN2:v2").unwrap();
    model.add_node(&[v1], &[junction], "v1:J0").unwrap();
    model.add_node(&[v2], &[junction], "v2:J0").unwrap();
    model.add_node(&[junction], &[v3], "J0:v3").unwrap();
    model.add_node(&[v3], &[out], "v3:OUT").unwrap();
    model.finalize().unwrap();

    // DOF count invariant: variables == equations == |y|.
    let nv = model.dofhandler.num_variables();
    assert_eq!(nv, model.dofhandler.num_equations());
    assert_eq!(nv, 2 * model.nodes().len() + 3); // + one P_c per vessel

    let mut integrator = Integrator::new(&mut model, 0.01, RHO, ATOL, MAX_ITER).unwrap();
    let mut state = State::zero(nv);
    for step in 0..10 {
        state = integrator.step(&mut model, &state, 0.01 * step as f64).unwrap();
    }

    let q_in1 = state.y[dof(&model, "flow:v1:J0")];
    let q_in2 = state.y[dof(&model, "flow:v2:J0")];
    let q_out = state.y[dof(&model, "flow:J0:v3")];
    assert!((q_out - 5.0).abs() < 1e-8, "outlet flow {q_out}");
    assert!((q_in1 + q_in2 - q_out).abs() < ATOL);

    let p1 = state.y[dof(&model, "pressure:v1:J0")];
    let p2 = state.y[dof(&model, "pressure:v2:J0")];
    let p3 = state.y[dof(&model, "pressure:J0:v3")];
    assert!((p1 - p2).abs() < ATOL);
    assert!((p1 - p3).abs() < ATOL);
}

#[test]
fn periodic_inflow_is_tracked_across_cycles() {
    // Triangle waveform 0 -> 1 -> 0 over one second, driven for two cycles.
    let mut model = Model::new();
    let q = model
        .add_parameter_series(vec![0.0, 0.5, 1.0], vec![0.0, 1.0, 0.0], true)
        .unwrap();
    let r = model.add_parameter(100.0);
    let c = model.add_parameter(0.0);
    let l = model.add_parameter(0.0);
    let s = model.add_parameter(0.0);
    let rd = model.add_parameter(100.0);
    let pd = model.add_parameter(0.0);
    let inflow = model
        .add_block(Element::flow_reference(), &[q], "INFLOW", false)
        .unwrap();
    let vessel = model
        .add_block(Element::blood_vessel(), &[r, c, l, s], "vessel", false)
        .unwrap();
    let outlet = model
        .add_block(Element::resistance(), &[rd, pd], "OUT", false)
        .unwrap();
    model
        .add_node(&[inflow], &[vessel], "INFLOW:vessel")
        .unwrap();
    model.add_node(&[vessel], &[outlet], "vessel:OUT").unwrap();
    model.finalize().unwrap();

    let dt = 0.05;
    let mut integrator = Integrator::new(&mut model, dt, RHO, ATOL, MAX_ITER).unwrap();
    let mut state = State::zero(model.dofhandler.size());
    let flow = dof(&model, "flow:INFLOW:vessel");

    let mut q_at = |steps: usize, state: &mut State, integrator: &mut Integrator| {
        let start = integrator.n_steps();
        for step in start..steps {
            *state = integrator.step(&mut model, state, dt * step as f64).unwrap();
        }
        state.y[flow]
    };

    // t = 0.25 lies on the rising ramp: Q = 0.5.
    let q_first = q_at(5, &mut state, &mut integrator);
    assert!((q_first - 0.5).abs() < 1e-4, "first-cycle flow {q_first}");

    // One period later the waveform wraps: Q(1.25) = Q(0.25).
    let q_second = q_at(25, &mut state, &mut integrator);
    assert!((q_second - 0.5).abs() < 1e-4, "second-cycle flow {q_second}");
}

#[test]
fn stenosis_pressure_drop_is_quadratic_in_flow() {
    // Pure stenosis segment: dp = S Q |Q| = 4 for S = 1, Q = 2.
    let mut model = Model::new();
    let q = model.add_parameter(2.0);
    let zero = model.add_parameter(0.0);
    let s = model.add_parameter(1.0);
    let inflow = model
        .add_block(Element::flow_reference(), &[q], "INFLOW", false)
        .unwrap();
    let vessel = model
        .add_block(
            Element::blood_vessel(),
            &[zero, zero, zero, s],
            "stenosis",
            false,
        )
        .unwrap();
    let outlet = model
        .add_block(Element::pressure_reference(), &[zero], "OUT", false)
        .unwrap();
    model
        .add_node(&[inflow], &[vessel], "INFLOW:stenosis")
        .unwrap();
    model
        .add_node(&[vessel], &[outlet], "stenosis:OUT")
        .unwrap();
    model.finalize().unwrap();

    let mut integrator = Integrator::new(&mut model, 0.01, RHO, ATOL, MAX_ITER).unwrap();
    let mut state = State::zero(model.dofhandler.size());
    for step in 0..10 {
        state = integrator.step(&mut model, &state, 0.01 * step as f64).unwrap();
    }

    let p_in = state.y[dof(&model, "pressure:INFLOW:stenosis")];
    let p_out = state.y[dof(&model, "pressure:stenosis:OUT")];
    assert!((p_in - p_out - 4.0).abs() < 1e-6, "drop {}", p_in - p_out);
    assert!(
        integrator.avg_nonlin_iter() <= 3.0,
        "needed {} Newton iterations",
        integrator.avg_nonlin_iter()
    );
}

#[test]
fn steady_initialization_is_consistent_with_the_unsteady_model() {
    // Relax the steady-mode Windkessel model, then check the state against
    // the restored unsteady model.
    let mut model = windkessel_model(1.0, 10.0, 1.0, 100.0);

    model.to_steady();
    let dt = model.cardiac_cycle_period / 10.0;
    let mut integrator = Integrator::new(&mut model, dt, RHO, ATOL, MAX_ITER).unwrap();
    let mut state = State::zero(model.dofhandler.size());
    for step in 0..31 {
        state = integrator.step(&mut model, &state, dt * step as f64).unwrap();
    }
    model.to_unsteady();

    assert!(residual_norm(&mut model, &state) < 10.0 * ATOL);
    let p = state.y[dof(&model, "pressure:INFLOW:RCR")];
    assert!((p - 110.0).abs() < 1e-6, "steady pressure {p}");
}

#[test]
fn nonlinear_divergence_is_reported() {
    let mut model = resistor_chain(1.0, 100.0, 0.0, 100.0);
    // One iteration is never enough to converge from a cold start.
    let mut integrator = Integrator::new(&mut model, 0.01, RHO, ATOL, 1).unwrap();
    let state = State::zero(model.dofhandler.size());
    let error = integrator.step(&mut model, &state, 0.0).unwrap_err();
    assert!(matches!(
        error,
        hemoflow::errors::HemoflowError::NonlinearDivergence { .. }
    ));
}

#[test]
fn driver_runs_the_full_loop_with_steady_initialization() {
    let mut model = windkessel_model(1.0, 10.0, 1.0, 100.0);
    let params = SimulationParameters {
        number_of_cardiac_cycles: 2,
        number_of_time_pts_per_cardiac_cycle: 11,
        ..SimulationParameters::default()
    };
    let state = State::zero(model.dofhandler.size());
    let results = run_simulation(&mut model, &params, state).unwrap();

    // Last cycle only: 11 recorded points, rebased to t = 0.
    assert_eq!(results.times.len(), 11);
    assert!(results.times[0].abs() < 1e-12);
    // Steady initialization puts the model at its operating point already.
    let p = results.states[0].y[dof(&model, "pressure:INFLOW:RCR")];
    assert!((p - 110.0).abs() < 1e-4, "initialized pressure {p}");
}
