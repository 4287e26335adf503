//! Reference component shipped with the harness.

use chrono::Local;
use gantry_types::ValueMap;
use serde_json::{Value, json};

use crate::loader::{Component, ComputeArgs, SetupArgs};

/// Minimal conforming component: `compute` reads `inputs["x"]` and
/// returns `outputs["fx"] = x + 1` with a timestamped message. `setup`
/// echoes the supplied dictionaries back unchanged.
pub struct Adder;

fn timestamp() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

impl Component for Adder {
    fn setup(&self, args: &SetupArgs<'_>) -> anyhow::Result<ValueMap> {
        let mut response = ValueMap::new();
        if !args.inputs.is_empty() {
            response.insert("inputs".to_string(), Value::Object(args.inputs.clone()));
        }
        if !args.outputs.is_empty() {
            response.insert("outputs".to_string(), Value::Object(args.outputs.clone()));
        }
        if !args.partials.is_empty() {
            response.insert("partials".to_string(), Value::Object(args.partials.clone()));
        }
        response.insert(
            "message".to_string(),
            Value::String(format!("{}: Adder setup completed.", timestamp())),
        );
        Ok(response)
    }

    fn compute(&self, args: &ComputeArgs<'_>) -> anyhow::Result<ValueMap> {
        let x = args
            .inputs
            .get("x")
            .and_then(Value::as_f64)
            .ok_or_else(|| anyhow::anyhow!("input `x` missing or not numeric"))?;

        let mut response = ValueMap::new();
        response.insert("outputs".to_string(), json!({"fx": x + 1.0}));
        response.insert(
            "message".to_string(),
            Value::String(format!("{}: Adder compute completed.", timestamp())),
        );
        Ok(response)
    }
}
