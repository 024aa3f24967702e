//! Configuration reader: JSON → model, simulation parameters, state.
//!
//! The configuration follows the svZeroD JSON conventions: vessels,
//! junctions and boundary conditions are declared by name/id and wired
//! through connection references; the reader turns every connection into
//! a node and finalizes the model. Scalar-or-array tolerance applies to
//! every `bc_values` entry that may be time-dependent.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::algebra::State;
use crate::errors::{HemoflowError, Result};
use crate::math::Scalar;
use crate::model::{BlockClass, CoronarySide, Element, Model};
use crate::solve::SimulationParameters;

/// Heart parameter names in block parameter order.
const HEART_PARAMS: [&str; 27] = [
    "Tsa", "tpwave", "Erv_s", "Elv_s", "iml", "imr", "Lra_v", "Rra_v", "Lrv_a", "Rrv_a", "Lla_v",
    "Rla_v", "Llv_a", "Rlv_ao", "Vrv_u", "Vlv_u", "Rpd", "Cp", "Cpa", "Kxp_ra", "Kxv_ra", "Kxp_la",
    "Kxv_la", "Emax_ra", "Emax_la", "Vaso_ra", "Vaso_la",
];

/// Reads the `simulation_parameters` section.
pub fn load_simulation_params(config: &Value) -> Result<SimulationParameters> {
    let section = config.get("simulation_parameters").ok_or_else(|| {
        HemoflowError::Configuration("missing simulation_parameters section".into())
    })?;
    let params: SimulationParameters = serde_json::from_value(section.clone())?;
    params.validate()?;
    Ok(params)
}

/// Builds the model from a configuration.
pub fn load_model(config: &Value) -> Result<Model> {
    let mut model = Model::new();
    let mut connections: Vec<(String, String)> = Vec::new();

    load_vessels(config, &mut model, &mut connections)?;
    let closed_loop_bcs = load_boundary_conditions(config, &mut model)?;
    load_junctions(config, &mut model, &mut connections)?;
    load_chambers(config, &mut model)?;
    load_valves(config, &mut model, &mut connections)?;
    load_external_coupling(config, &mut model, &mut connections)?;
    load_closed_loop(config, &mut model, &mut connections, &closed_loop_bcs)?;

    for (upstream, downstream) in &connections {
        let inlet = model.block_id(upstream).ok_or_else(|| {
            HemoflowError::Graph(format!("connection references unknown block '{upstream}'"))
        })?;
        let outlet = model.block_id(downstream).ok_or_else(|| {
            HemoflowError::Graph(format!("connection references unknown block '{downstream}'"))
        })?;
        model.add_node(&[inlet], &[outlet], &format!("{upstream}:{downstream}"))?;
    }

    model.finalize()?;
    Ok(model)
}

/// Builds the initial state: block-specific initial conditions plus the
/// optional `initial_condition` / `initial_condition_d` overrides keyed
/// by DOF label.
pub fn load_initial_condition(config: &Value, model: &Model) -> Result<State> {
    let mut state = State::zero(model.dofhandler.size());
    model.assign_initial_conditions(&mut state);

    if let Some(overrides) = config.get("initial_condition").and_then(Value::as_object) {
        for (index, label) in model.dofhandler.variables.iter().enumerate() {
            if let Some(value) = overrides.get(label).and_then(Value::as_f64) {
                state.y[index] = value;
            }
        }
    }
    if let Some(overrides) = config.get("initial_condition_d").and_then(Value::as_object) {
        for (index, label) in model.dofhandler.variables.iter().enumerate() {
            if let Some(value) = overrides.get(label).and_then(Value::as_f64) {
                state.ydot[index] = value;
            }
        }
    }
    Ok(state)
}

fn section<'a>(config: &'a Value, key: &str) -> &'a [Value] {
    config
        .get(key)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

fn require_f64(value: &Value, key: &str, context: &str) -> Result<Scalar> {
    value.get(key).and_then(Value::as_f64).ok_or_else(|| {
        HemoflowError::Configuration(format!("{context}: missing required parameter '{key}'"))
    })
}

fn optional_f64(value: &Value, key: &str, default: Scalar) -> Scalar {
    value.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn require_str<'a>(value: &'a Value, key: &str, context: &str) -> Result<&'a str> {
    value.get(key).and_then(Value::as_str).ok_or_else(|| {
        HemoflowError::Configuration(format!("{context}: missing required field '{key}'"))
    })
}

/// Reads a value that may be a scalar or an array of samples.
fn scalar_or_array(value: &Value, key: &str, context: &str) -> Result<Vec<Scalar>> {
    match value.get(key) {
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| {
                entry.as_f64().ok_or_else(|| {
                    HemoflowError::Configuration(format!("{context}: non-numeric entry in '{key}'"))
                })
            })
            .collect(),
        Some(entry) => entry.as_f64().map(|v| vec![v]).ok_or_else(|| {
            HemoflowError::Configuration(format!("{context}: non-numeric value for '{key}'"))
        }),
        None => Err(HemoflowError::Configuration(format!(
            "{context}: missing required parameter '{key}'"
        ))),
    }
}

fn optional_scalar_or_array(
    value: &Value,
    key: &str,
    context: &str,
    default: Scalar,
) -> Result<Vec<Scalar>> {
    if value.get(key).is_none() {
        return Ok(vec![default]);
    }
    scalar_or_array(value, key, context)
}

/// Adds a (possibly time-dependent) parameter sampled at `times`.
fn add_sampled_parameter(
    model: &mut Model,
    times: &[Scalar],
    values: Vec<Scalar>,
    context: &str,
) -> Result<usize> {
    if values.len() == 1 {
        return Ok(model.add_parameter(values[0]));
    }
    if times.len() != values.len() {
        return Err(HemoflowError::Configuration(format!(
            "{context}: {} values sampled at {} time points",
            values.len(),
            times.len()
        )));
    }
    model.add_parameter_series(times.to_vec(), values, true)
}

fn load_vessels(
    config: &Value,
    model: &mut Model,
    connections: &mut Vec<(String, String)>,
) -> Result<()> {
    for vessel in section(config, "vessels") {
        let name = require_str(vessel, "vessel_name", "vessel")?.to_string();
        let kind = require_str(vessel, "zero_d_element_type", &name)?;
        if kind != "BloodVessel" {
            return Err(HemoflowError::Configuration(format!(
                "vessel '{name}': unknown zero_d_element_type '{kind}'"
            )));
        }
        let values = vessel
            .get("zero_d_element_values")
            .ok_or_else(|| {
                HemoflowError::Configuration(format!("vessel '{name}': missing element values"))
            })?;
        let r = require_f64(values, "R_poiseuille", &name)?;
        let c = optional_f64(values, "C", 0.0);
        let l = optional_f64(values, "L", 0.0);
        let stenosis = optional_f64(values, "stenosis_coefficient", 0.0);
        let params = [
            model.add_parameter(r),
            model.add_parameter(c),
            model.add_parameter(l),
            model.add_parameter(stenosis),
        ];
        model.add_block(Element::blood_vessel(), &params, &name, false)?;
        debug!(%name, "created vessel");

        if let Some(bcs) = vessel.get("boundary_conditions") {
            if let Some(inlet) = bcs.get("inlet").and_then(Value::as_str) {
                connections.push((inlet.to_string(), name.clone()));
            }
            if let Some(outlet) = bcs.get("outlet").and_then(Value::as_str) {
                connections.push((name.clone(), outlet.to_string()));
            }
        }
    }
    Ok(())
}

fn load_boundary_conditions(config: &Value, model: &mut Model) -> Result<Vec<String>> {
    let mut closed_loop_bcs = Vec::new();
    for bc in section(config, "boundary_conditions") {
        let name = require_str(bc, "bc_name", "boundary condition")?.to_string();
        let kind = require_str(bc, "bc_type", &name)?;
        let values = bc.get("bc_values").ok_or_else(|| {
            HemoflowError::Configuration(format!("boundary condition '{name}': missing bc_values"))
        })?;
        let times = optional_scalar_or_array(values, "t", &name, 0.0)?;

        match kind {
            "RCR" => {
                let params = [
                    model.add_parameter(require_f64(values, "Rp", &name)?),
                    model.add_parameter(require_f64(values, "C", &name)?),
                    model.add_parameter(require_f64(values, "Rd", &name)?),
                    model.add_parameter(require_f64(values, "Pd", &name)?),
                ];
                model.add_block(Element::windkessel(), &params, &name, false)?;
            }
            "ClosedLoopRCR" => {
                let params = [
                    model.add_parameter(require_f64(values, "Rp", &name)?),
                    model.add_parameter(require_f64(values, "C", &name)?),
                    model.add_parameter(require_f64(values, "Rd", &name)?),
                ];
                let outlet = values
                    .get("closed_loop_outlet")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if outlet {
                    closed_loop_bcs.push(name.clone());
                }
                model.add_block(Element::closed_loop_rcr(outlet), &params, &name, false)?;
            }
            "FLOW" => {
                let q = scalar_or_array(values, "Q", &name)?;
                let param = add_sampled_parameter(model, &times, q, &name)?;
                model.add_block(Element::flow_reference(), &[param], &name, false)?;
            }
            "PRESSURE" => {
                let p = scalar_or_array(values, "P", &name)?;
                let param = add_sampled_parameter(model, &times, p, &name)?;
                model.add_block(Element::pressure_reference(), &[param], &name, false)?;
            }
            "RESISTANCE" => {
                let r = scalar_or_array(values, "R", &name)?;
                let pd = optional_scalar_or_array(values, "Pd", &name, 0.0)?;
                let params = [
                    add_sampled_parameter(model, &times, r, &name)?,
                    add_sampled_parameter(model, &times, pd, &name)?,
                ];
                model.add_block(Element::resistance(), &params, &name, false)?;
            }
            "CORONARY" => {
                let pim = scalar_or_array(values, "Pim", &name)?;
                let pv = scalar_or_array(values, "P_v", &name)?;
                let params = [
                    model.add_parameter(require_f64(values, "Ra1", &name)?),
                    model.add_parameter(require_f64(values, "Ra2", &name)?),
                    model.add_parameter(require_f64(values, "Rv1", &name)?),
                    model.add_parameter(require_f64(values, "Ca", &name)?),
                    model.add_parameter(require_f64(values, "Cc", &name)?),
                    add_sampled_parameter(model, &times, pim, &name)?,
                    add_sampled_parameter(model, &times, pv, &name)?,
                ];
                model.add_block(Element::open_loop_coronary(), &params, &name, false)?;
            }
            "ClosedLoopCoronary" => {
                let params = [
                    model.add_parameter(require_f64(values, "Ra", &name)?),
                    model.add_parameter(require_f64(values, "Ram", &name)?),
                    model.add_parameter(require_f64(values, "Rv", &name)?),
                    model.add_parameter(require_f64(values, "Ca", &name)?),
                    model.add_parameter(require_f64(values, "Cim", &name)?),
                ];
                let side = match require_str(values, "side", &name)? {
                    "left" => CoronarySide::Left,
                    "right" => CoronarySide::Right,
                    other => {
                        return Err(HemoflowError::Configuration(format!(
                            "boundary condition '{name}': unknown coronary side '{other}'"
                        )))
                    }
                };
                closed_loop_bcs.push(name.clone());
                model.add_block(Element::closed_loop_coronary(side), &params, &name, false)?;
            }
            other => {
                return Err(HemoflowError::Configuration(format!(
                    "boundary condition '{name}': unknown bc_type '{other}'"
                )))
            }
        }
        debug!(%name, kind, "created boundary condition");
    }
    Ok(closed_loop_bcs)
}

fn load_junctions(
    config: &Value,
    model: &mut Model,
    connections: &mut Vec<(String, String)>,
) -> Result<()> {
    // Vessel ids referenced by junctions.
    let mut vessel_id_map: HashMap<i64, String> = HashMap::new();
    for vessel in section(config, "vessels") {
        if let (Some(id), Some(name)) = (
            vessel.get("vessel_id").and_then(Value::as_i64),
            vessel.get("vessel_name").and_then(Value::as_str),
        ) {
            vessel_id_map.insert(id, name.to_string());
        }
    }
    let resolve = |id: i64| -> Result<String> {
        vessel_id_map.get(&id).cloned().ok_or_else(|| {
            HemoflowError::Graph(format!("junction references unknown vessel id {id}"))
        })
    };

    for junction in section(config, "junctions") {
        let name = require_str(junction, "junction_name", "junction")?.to_string();
        let kind = require_str(junction, "junction_type", &name)?;
        let n_outlets = junction
            .get("outlet_vessels")
            .or_else(|| junction.get("outlet_blocks"))
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        match kind {
            "NORMAL_JUNCTION" | "internal_junction" => {
                model.add_block(Element::junction(), &[], &name, false)?;
            }
            "resistive_junction" => {
                let values = junction.get("junction_values").ok_or_else(|| {
                    HemoflowError::Configuration(format!(
                        "junction '{name}': missing junction_values"
                    ))
                })?;
                let resistances = scalar_or_array(values, "R", &name)?;
                let params: Vec<usize> = resistances
                    .into_iter()
                    .map(|r| model.add_parameter(r))
                    .collect();
                model.add_block(Element::resistive_junction(), &params, &name, false)?;
            }
            "BloodVesselJunction" => {
                let values = junction.get("junction_values").ok_or_else(|| {
                    HemoflowError::Configuration(format!(
                        "junction '{name}': missing junction_values"
                    ))
                })?;
                let r = scalar_or_array(values, "R_poiseuille", &name)?;
                let zeros = vec![0.0; n_outlets];
                let c = values
                    .get("C")
                    .map(|_| scalar_or_array(values, "C", &name))
                    .transpose()?
                    .unwrap_or_else(|| zeros.clone());
                let l = values
                    .get("L")
                    .map(|_| scalar_or_array(values, "L", &name))
                    .transpose()?
                    .unwrap_or_else(|| zeros.clone());
                let s = values
                    .get("stenosis_coefficient")
                    .map(|_| scalar_or_array(values, "stenosis_coefficient", &name))
                    .transpose()?
                    .unwrap_or(zeros);
                let params: Vec<usize> = r
                    .into_iter()
                    .chain(c)
                    .chain(l)
                    .chain(s)
                    .map(|v| model.add_parameter(v))
                    .collect();
                model.add_block(Element::blood_vessel_junction(), &params, &name, false)?;
            }
            other => {
                return Err(HemoflowError::Configuration(format!(
                    "junction '{name}': unknown junction_type '{other}'"
                )))
            }
        }

        for inlet in junction
            .get("inlet_vessels")
            .and_then(Value::as_array)
            .map_or(&[] as &[Value], Vec::as_slice)
        {
            let id = inlet.as_i64().ok_or_else(|| {
                HemoflowError::Configuration(format!("junction '{name}': non-integer vessel id"))
            })?;
            connections.push((resolve(id)?, name.clone()));
        }
        for outlet in junction
            .get("outlet_vessels")
            .and_then(Value::as_array)
            .map_or(&[] as &[Value], Vec::as_slice)
        {
            let id = outlet.as_i64().ok_or_else(|| {
                HemoflowError::Configuration(format!("junction '{name}': non-integer vessel id"))
            })?;
            connections.push((name.clone(), resolve(id)?));
        }
        // Chambers and other non-vessel blocks connect by name.
        for inlet in junction
            .get("inlet_blocks")
            .and_then(Value::as_array)
            .map_or(&[] as &[Value], Vec::as_slice)
        {
            if let Some(upstream) = inlet.as_str() {
                connections.push((upstream.to_string(), name.clone()));
            }
        }
        for outlet in junction
            .get("outlet_blocks")
            .and_then(Value::as_array)
            .map_or(&[] as &[Value], Vec::as_slice)
        {
            if let Some(downstream) = outlet.as_str() {
                connections.push((name.clone(), downstream.to_string()));
            }
        }
        debug!(%name, kind, "created junction");
    }
    Ok(())
}

fn load_chambers(config: &Value, model: &mut Model) -> Result<()> {
    for chamber in section(config, "chambers") {
        let name = require_str(chamber, "name", "chamber")?.to_string();
        let kind = require_str(chamber, "type", &name)?;
        if kind != "ChamberElastanceInductor" {
            return Err(HemoflowError::Configuration(format!(
                "chamber '{name}': unknown chamber type '{kind}'"
            )));
        }
        let values = chamber.get("values").ok_or_else(|| {
            HemoflowError::Configuration(format!("chamber '{name}': missing values"))
        })?;
        let params = [
            model.add_parameter(require_f64(values, "Emax", &name)?),
            model.add_parameter(require_f64(values, "Emin", &name)?),
            model.add_parameter(require_f64(values, "Vrd", &name)?),
            model.add_parameter(require_f64(values, "Vrs", &name)?),
            model.add_parameter(require_f64(values, "t_active", &name)?),
            model.add_parameter(require_f64(values, "t_twitch", &name)?),
            model.add_parameter(optional_f64(values, "Impedance", 0.0)),
        ];
        model.add_block(Element::chamber_kerckhoffs(), &params, &name, false)?;
        debug!(%name, "created chamber");
    }
    Ok(())
}

fn load_valves(
    config: &Value,
    model: &mut Model,
    connections: &mut Vec<(String, String)>,
) -> Result<()> {
    for valve in section(config, "valves") {
        let name = require_str(valve, "name", "valve")?.to_string();
        let kind = require_str(valve, "type", &name)?;
        if kind != "ValveTanh" {
            return Err(HemoflowError::Configuration(format!(
                "valve '{name}': unknown valve type '{kind}'"
            )));
        }
        let values = valve.get("params").ok_or_else(|| {
            HemoflowError::Configuration(format!("valve '{name}': missing params"))
        })?;
        let params = [
            model.add_parameter(require_f64(values, "Rmax", &name)?),
            model.add_parameter(require_f64(values, "Rmin", &name)?),
            model.add_parameter(require_f64(values, "Steepness", &name)?),
        ];
        model.add_block(Element::valve(), &params, &name, false)?;
        connections.push((
            require_str(valve, "upstream_block", &name)?.to_string(),
            name.clone(),
        ));
        connections.push((
            name.clone(),
            require_str(valve, "downstream_block", &name)?.to_string(),
        ));
        debug!(%name, "created valve");
    }
    Ok(())
}

fn load_external_coupling(
    config: &Value,
    model: &mut Model,
    connections: &mut Vec<(String, String)>,
) -> Result<()> {
    let mut bc_type_map: HashMap<String, String> = HashMap::new();
    for bc in section(config, "boundary_conditions") {
        if let (Some(name), Some(kind)) = (
            bc.get("bc_name").and_then(Value::as_str),
            bc.get("bc_type").and_then(Value::as_str),
        ) {
            bc_type_map.insert(name.to_string(), kind.to_string());
        }
    }

    for coupling in section(config, "external_solver_coupling_blocks") {
        let name = require_str(coupling, "name", "coupling block")?.to_string();
        let kind = require_str(coupling, "type", &name)?;
        let location = require_str(coupling, "location", &name)?;
        let connected_block = require_str(coupling, "connected_block", &name)?.to_string();
        let values = coupling.get("values").ok_or_else(|| {
            HemoflowError::Configuration(format!("coupling block '{name}': missing values"))
        })?;
        let times = optional_scalar_or_array(values, "t", &name, 0.0)?;

        let element = match kind {
            "FLOW" => {
                let q = scalar_or_array(values, "Q", &name)?;
                let param = add_sampled_parameter(model, &times, q, &name)?;
                (Element::flow_reference(), param)
            }
            "PRESSURE" => {
                let p = scalar_or_array(values, "P", &name)?;
                let param = add_sampled_parameter(model, &times, p, &name)?;
                (Element::pressure_reference(), param)
            }
            other => {
                return Err(HemoflowError::Configuration(format!(
                    "coupling block '{name}': type must be FLOW or PRESSURE, got '{other}'"
                )))
            }
        };
        model.add_block_with_class(
            element.0,
            BlockClass::ExternalCoupling,
            &[element.1],
            &name,
            false,
        )?;
        debug!(%name, kind, "created coupling block");

        let connected_type = if connected_block == "ClosedLoopHeartAndPulmonary" {
            "ClosedLoopHeartAndPulmonary".to_string()
        } else {
            bc_type_map.get(&connected_block).cloned().ok_or_else(|| {
                HemoflowError::Graph(format!(
                    "coupling block '{name}': unknown connected block '{connected_block}'"
                ))
            })?
        };

        match location {
            "inlet" => {
                const VALID: [&str; 6] = [
                    "RESISTANCE",
                    "RCR",
                    "ClosedLoopRCR",
                    "SimplifiedRCR",
                    "CORONARY",
                    "ClosedLoopCoronary",
                ];
                if !VALID.contains(&connected_type.as_str()) {
                    return Err(HemoflowError::Graph(format!(
                        "coupling block '{name}': invalid inlet connection type \
                         '{connected_type}'"
                    )));
                }
                connections.push((name.clone(), connected_block));
            }
            "outlet" => {
                const VALID: [&str; 2] = ["ClosedLoopRCR", "ClosedLoopHeartAndPulmonary"];
                if !VALID.contains(&connected_type.as_str()) {
                    return Err(HemoflowError::Graph(format!(
                        "coupling block '{name}': invalid outlet connection type \
                         '{connected_type}'"
                    )));
                }
                // The heart connection is created with the heart block.
                if connected_type == "ClosedLoopRCR" {
                    connections.push((connected_block, name.clone()));
                }
            }
            other => {
                return Err(HemoflowError::Configuration(format!(
                    "coupling block '{name}': location must be inlet or outlet, got '{other}'"
                )))
            }
        }
    }
    Ok(())
}

fn load_closed_loop(
    config: &Value,
    model: &mut Model,
    connections: &mut Vec<(String, String)>,
    closed_loop_bcs: &[String],
) -> Result<()> {
    let mut heart_present = false;
    for closed_loop in section(config, "closed_loop_blocks") {
        let kind = require_str(closed_loop, "closed_loop_type", "closed loop block")?;
        if kind != "ClosedLoopHeartAndPulmonary" {
            return Err(HemoflowError::Configuration(format!(
                "unknown closed_loop_type '{kind}'"
            )));
        }
        if heart_present {
            return Err(HemoflowError::Configuration(
                "only one ClosedLoopHeartAndPulmonary block can be included".into(),
            ));
        }
        heart_present = true;

        let cycle_period = require_f64(closed_loop, "cardiac_cycle_period", "heart block")?;
        model.assign_cycle_period(cycle_period)?;

        let heart_values = closed_loop.get("parameters").ok_or_else(|| {
            HemoflowError::Configuration("heart block: missing parameters".into())
        })?;
        let mut params = Vec::with_capacity(HEART_PARAMS.len());
        for key in HEART_PARAMS {
            params.push(model.add_parameter(require_f64(heart_values, key, "heart block")?));
        }
        model.add_block(Element::heart_pulmonary(), &params, "CLH", false)?;

        // Junction collecting the venous return into the heart.
        model.add_block(Element::junction(), &[], "J_heart_inlet", false)?;
        connections.push(("J_heart_inlet".to_string(), "CLH".to_string()));
        for bc in closed_loop_bcs {
            connections.push((bc.clone(), "J_heart_inlet".to_string()));
        }

        // Junction distributing the aortic outflow.
        model.add_block(Element::junction(), &[], "J_heart_outlet", false)?;
        connections.push(("CLH".to_string(), "J_heart_outlet".to_string()));
        for outlet in closed_loop
            .get("outlet_blocks")
            .and_then(Value::as_array)
            .map_or(&[] as &[Value], Vec::as_slice)
        {
            if let Some(block) = outlet.as_str() {
                connections.push(("J_heart_outlet".to_string(), block.to_string()));
            }
        }
        debug!("created heart/pulmonary closed loop");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Value {
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
    fn loads_a_minimal_model() {
        let config = minimal_config();
        let params = load_simulation_params(&config).unwrap();
        assert_eq!(params.number_of_cardiac_cycles, 2);

        let model = load_model(&config).unwrap();
        assert_eq!(model.num_blocks(false), 3);
        assert_eq!(model.dofhandler.num_variables(), 5);

        let state = load_initial_condition(&config, &model).unwrap();
        assert_eq!(state.len(), 5);
    }

    #[test]
    fn initial_condition_overrides_by_label() {
        let mut config = minimal_config();
        config["initial_condition"] =
            serde_json::json!({"flow:INFLOW:branch0_seg0": 2.5});
        let model = load_model(&config).unwrap();
        let state = load_initial_condition(&config, &model).unwrap();
        let index = model
            .dofhandler
            .variable_index("flow:INFLOW:branch0_seg0")
            .unwrap();
        assert_eq!(state.y[index], 2.5);
    }

    #[test]
    fn unknown_bc_type_is_rejected() {
        let mut config = minimal_config();
        config["boundary_conditions"][0]["bc_type"] = Value::String("MAGIC".into());
        assert!(matches!(
            load_model(&config),
            Err(HemoflowError::Configuration(_))
        ));
    }

    #[test]
    fn dangling_connection_is_a_graph_error() {
        let mut config = minimal_config();
        config["vessels"][0]["boundary_conditions"]["outlet"] =
            Value::String("MISSING".into());
        assert!(matches!(load_model(&config), Err(HemoflowError::Graph(_))));
    }
}
