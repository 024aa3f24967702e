//! Result export: vessel-based CSV, variable-based CSV, and JSON.
//!
//! Vessel-based output reports the inlet/outlet flows and pressures of
//! every vessel-class block; variable-based output reports every solution
//! variable by its DOF label. Hidden blocks are skipped in both.

use std::fmt::Write as _;

use serde_json::json;

use crate::errors::Result;
use crate::math::Scalar;
use crate::model::{BlockClass, Model};
use crate::solve::SimulationResults;

/// Writes per-vessel flows and pressures as CSV.
#[must_use]
pub fn to_vessel_csv(
    results: &SimulationResults,
    model: &Model,
    mean_only: bool,
    with_derivative: bool,
) -> String {
    let mut out = String::new();
    if mean_only {
        out.push_str("name,flow_in,flow_out,pressure_in,pressure_out\n");
    } else if with_derivative {
        out.push_str(
            "name,time,flow_in,flow_out,pressure_in,pressure_out,\
             d_flow_in,d_flow_out,d_pressure_in,d_pressure_out\n",
        );
    } else {
        out.push_str("name,time,flow_in,flow_out,pressure_in,pressure_out\n");
    }

    for block in model.blocks() {
        if block.class != BlockClass::Vessel {
            continue;
        }
        // Port DOFs: [P_in, Q_in, P_out, Q_out, ...]
        let (p_in, q_in, p_out, q_out) = (
            block.global_var_ids[0],
            block.global_var_ids[1],
            block.global_var_ids[2],
            block.global_var_ids[3],
        );
        if mean_only {
            let n = results.states.len() as Scalar;
            let mean = |dof: usize| -> Scalar {
                results.states.iter().map(|s| s.y[dof]).sum::<Scalar>() / n
            };
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                block.name,
                mean(q_in),
                mean(q_out),
                mean(p_in),
                mean(p_out)
            );
        } else {
            for (time, state) in results.times.iter().zip(&results.states) {
                let _ = write!(
                    out,
                    "{},{},{},{},{},{}",
                    block.name, time, state.y[q_in], state.y[q_out], state.y[p_in], state.y[p_out]
                );
                if with_derivative {
                    let _ = write!(
                        out,
                        ",{},{},{},{}",
                        state.ydot[q_in], state.ydot[q_out], state.ydot[p_in], state.ydot[p_out]
                    );
                }
                out.push('\n');
            }
        }
    }
    out
}

/// Writes every solution variable as CSV, one row per variable and time.
#[must_use]
pub fn to_variable_csv(
    results: &SimulationResults,
    model: &Model,
    mean_only: bool,
    with_derivative: bool,
) -> String {
    let mut out = String::new();
    if mean_only {
        out.push_str("name,y\n");
    } else if with_derivative {
        out.push_str("name,time,y,ydot\n");
    } else {
        out.push_str("name,time,y\n");
    }

    for (dof, label) in model.dofhandler.variables.iter().enumerate() {
        if mean_only {
            let n = results.states.len() as Scalar;
            let mean = results.states.iter().map(|s| s.y[dof]).sum::<Scalar>() / n;
            let _ = writeln!(out, "{label},{mean}");
        } else {
            for (time, state) in results.times.iter().zip(&results.states) {
                if with_derivative {
                    let _ = writeln!(
                        out,
                        "{label},{time},{},{}",
                        state.y[dof], state.ydot[dof]
                    );
                } else {
                    let _ = writeln!(out, "{label},{time},{}", state.y[dof]);
                }
            }
        }
    }
    out
}

/// Writes the recorded time series as JSON keyed by DOF label.
pub fn to_json(
    results: &SimulationResults,
    model: &Model,
    with_derivative: bool,
) -> Result<String> {
    let mut y = serde_json::Map::new();
    let mut ydot = serde_json::Map::new();
    for (dof, label) in model.dofhandler.variables.iter().enumerate() {
        let series: Vec<Scalar> = results.states.iter().map(|s| s.y[dof]).collect();
        y.insert(label.clone(), json!(series));
        if with_derivative {
            let series: Vec<Scalar> = results.states.iter().map(|s| s.ydot[dof]).collect();
            ydot.insert(label.clone(), json!(series));
        }
    }

    let mut output = json!({
        "time": results.times,
        "y": y,
    });
    if with_derivative {
        output["ydot"] = json!(ydot);
    }
    Ok(serde_json::to_string_pretty(&output)?)
}
