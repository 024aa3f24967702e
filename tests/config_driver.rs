//! Configuration-driven end-to-end runs.

use hemoflow::io::{config, writer};
use hemoflow::solve::run_simulation;

fn chain_config() -> serde_json::Value {
    serde_json::json!({
        "simulation_parameters": {
            "number_of_cardiac_cycles": 2,
            "number_of_time_pts_per_cardiac_cycle": 11
        },
        "boundary_conditions": [
            {
                "bc_name": "INFLOW",
                "bc_type": "FLOW",
                "bc_values": {"Q": 1.0}
            },
            {
                "bc_name": "OUT",
                "bc_type": "RESISTANCE",
                "bc_values": {"R": 100.0, "Pd": 0.0}
            }
        ],
        "vessels": [
            {
                "vessel_id": 0,
                "vessel_name": "branch0_seg0",
                "zero_d_element_type": "BloodVessel",
                "zero_d_element_values": {"R_poiseuille": 100.0},
                "boundary_conditions": {"inlet": "INFLOW", "outlet": "OUT"}
            }
        ]
    })
}

#[test]
fn json_config_runs_to_the_analytic_solution() {
    let config_value = chain_config();
    let params = config::load_simulation_params(&config_value).unwrap();
    let mut model = config::load_model(&config_value).unwrap();
    let state = config::load_initial_condition(&config_value, &model).unwrap();

    let results = run_simulation(&mut model, &params, state).unwrap();
    let last = results.states.last().unwrap();

    let p_in = last.y[model
        .dofhandler
        .variable_index("pressure:INFLOW:branch0_seg0")
        .unwrap()];
    let p_out = last.y[model
        .dofhandler
        .variable_index("pressure:branch0_seg0:OUT")
        .unwrap()];
    assert!((p_in - 200.0).abs() < 1e-6, "inlet pressure {p_in}");
    assert!((p_out - 100.0).abs() < 1e-6, "outlet pressure {p_out}");
}

#[test]
fn vessel_csv_reports_the_converged_values() {
    let config_value = chain_config();
    let params = config::load_simulation_params(&config_value).unwrap();
    let mut model = config::load_model(&config_value).unwrap();
    let state = config::load_initial_condition(&config_value, &model).unwrap();
    let results = run_simulation(&mut model, &params, state).unwrap();

    let csv = writer::to_vessel_csv(&results, &model, false, false);
    let last_line = csv.lines().last().unwrap();
    let fields: Vec<&str> = last_line.split(',').collect();
    assert_eq!(fields[0], "branch0_seg0");
    let flow_in: f64 = fields[2].parse().unwrap();
    let pressure_in: f64 = fields[4].parse().unwrap();
    assert!((flow_in - 1.0).abs() < 1e-6);
    assert!((pressure_in - 200.0).abs() < 1e-6);

    let mean_csv = writer::to_vessel_csv(&results, &model, true, false);
    assert_eq!(mean_csv.lines().count(), 2); // header + one vessel

    let json_text = writer::to_json(&results, &model, false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json_text).unwrap();
    assert!(value["y"].get("flow:INFLOW:branch0_seg0").is_some());
}

#[test]
fn blood_vessel_junction_config_conserves_flow() {
    let config_value = serde_json::json!({
        "simulation_parameters": {
            "number_of_cardiac_cycles": 1,
            "number_of_time_pts_per_cardiac_cycle": 21,
            "steady_initial": false,
            "output_all_cycles": true
        },
        "boundary_conditions": [
            {"bc_name": "INFLOW", "bc_type": "FLOW", "bc_values": {"Q": 5.0}},
            {"bc_name": "OUT1", "bc_type": "RESISTANCE", "bc_values": {"R": 100.0, "Pd": 0.0}},
            {"bc_name": "OUT2", "bc_type": "RESISTANCE", "bc_values": {"R": 100.0, "Pd": 0.0}}
        ],
        "vessels": [
            {
                "vessel_id": 0,
                "vessel_name": "parent",
                "zero_d_element_type": "BloodVessel",
                "zero_d_element_values": {"R_poiseuille": 10.0},
                "boundary_conditions": {"inlet": "INFLOW"}
            },
            {
                "vessel_id": 1,
                "vessel_name": "left",
                "zero_d_element_type": "BloodVessel",
                "zero_d_element_values": {"R_poiseuille": 10.0},
                "boundary_conditions": {"outlet": "OUT1"}
            },
            {
                "vessel_id": 2,
                "vessel_name": "right",
                "zero_d_element_type": "BloodVessel",
                "zero_d_element_values": {"R_poiseuille": 10.0},
                "boundary_conditions": {"outlet": "OUT2"}
            }
        ],
        "junctions": [
            {
                "junction_name": "J0",
                "junction_type": "BloodVesselJunction",
                "inlet_vessels": [0],
                "outlet_vessels": [1, 2],
                "junction_values": {
                    "R_poiseuille": [20.0, 20.0]
                }
            }
        ]
    });

    let params = config::load_simulation_params(&config_value).unwrap();
    let mut model = config::load_model(&config_value).unwrap();
    let state = config::load_initial_condition(&config_value, &model).unwrap();
    let results = run_simulation(&mut model, &params, state).unwrap();
    let last = results.states.last().unwrap();

    let flow = |label: &str| last.y[model.dofhandler.variable_index(label).unwrap()];
    let q_in = flow("flow:parent:J0");
    let q_left = flow("flow:J0:left");
    let q_right = flow("flow:J0:right");
    assert!((q_in - 5.0).abs() < 1e-6, "junction inflow {q_in}");
    assert!(
        (q_left + q_right - q_in).abs() < 1e-6,
        "junction imbalance {} vs {}",
        q_left + q_right,
        q_in
    );
    // Symmetric branches split the flow evenly.
    assert!((q_left - 2.5).abs() < 1e-6, "left flow {q_left}");
}
