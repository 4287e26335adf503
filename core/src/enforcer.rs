//! Contract enforcement for component responses.
//!
//! The enforcer sits between the loaded component and the caller: every
//! raw response passes through [`enforce_setup`] or [`enforce_compute`]
//! before anything is handed back. The rules differ deliberately between
//! the two operations:
//!
//! - `setup` demands that non-empty caller-supplied `inputs`/`outputs`
//!   come back with exactly the same key set, and that `partials` come
//!   back as a mapping when expected (no key-set check at setup time).
//!   Any other top-level key seeds the returned state dictionary.
//! - `compute` checks key sets only when the caller supplied a non-empty
//!   dictionary; a response carrying `outputs`/`partials` the caller
//!   never declared is accepted and forwarded. Callers rely on this
//!   leniency when outputs were not pre-declared, so it is preserved
//!   rather than tightened. Every other top-level key is a parameter
//!   update and must already exist in `setup_data`.
//!
//! Violations are fatal to the current invocation and never retried.

use gantry_types::{ContractError, Field, ValueMap, key_sets_match, take_message};
use serde_json::Value;

/// Validate a `setup` response against the caller-supplied dictionaries.
///
/// Returns the extracted message (empty string when absent) and the
/// state dictionary: validated `inputs`/`outputs`, `partials` when
/// present, and every additional seeded key, verbatim.
pub fn enforce_setup(
    mut response: ValueMap,
    inputs: &ValueMap,
    outputs: &ValueMap,
    partials: &ValueMap,
) -> Result<(String, ValueMap), ContractError> {
    let message = take_message(&mut response);
    let mut state = ValueMap::new();

    take_echoed(&mut response, &mut state, inputs, Field::Inputs)?;
    take_echoed(&mut response, &mut state, outputs, Field::Outputs)?;

    match response.remove("partials") {
        Some(value @ Value::Object(_)) => {
            state.insert("partials".to_string(), value);
        }
        Some(_) | None if !partials.is_empty() => {
            return Err(ContractError::SetupPartialsMissing);
        }
        Some(other) => {
            state.insert("partials".to_string(), other);
        }
        None => {}
    }

    // Remaining top-level keys seed the component's setup_data.
    state.append(&mut response);
    Ok((message, state))
}

/// Validate a `compute` response against `setup_data` and the supplied
/// key sets. Returns the message and a partial state dictionary holding
/// only the keys that changed.
pub fn enforce_compute(
    mut response: ValueMap,
    setup_data: &ValueMap,
    outputs: &ValueMap,
    partials: &ValueMap,
) -> Result<(String, ValueMap), ContractError> {
    let message = take_message(&mut response);
    let mut changed = ValueMap::new();

    take_matching(&mut response, &mut changed, outputs, Field::Outputs)?;
    take_matching(&mut response, &mut changed, partials, Field::Partials)?;

    // Anything left is a parameter update: values may change, keys may not.
    for (key, value) in response {
        if !setup_data.contains_key(&key) {
            return Err(ContractError::IllegalComputeOutput { key });
        }
        changed.insert(key, value);
    }
    Ok((message, changed))
}

/// Setup rule: a non-empty supplied dictionary must be echoed back with
/// an identical key set; an empty one places no demand on the response.
fn take_echoed(
    response: &mut ValueMap,
    state: &mut ValueMap,
    supplied: &ValueMap,
    field: Field,
) -> Result<(), ContractError> {
    let key = field.to_string();
    match response.remove(&key) {
        Some(Value::Object(returned)) => {
            if !supplied.is_empty() && !key_sets_match(supplied, &returned) {
                return Err(ContractError::SetupKeysMutated(field));
            }
            state.insert(key, Value::Object(returned));
            Ok(())
        }
        Some(other) if supplied.is_empty() => {
            state.insert(key, other);
            Ok(())
        }
        Some(_) | None if !supplied.is_empty() => Err(ContractError::SetupKeysMutated(field)),
        _ => Ok(()),
    }
}

/// Compute rule: key sets are compared only when the caller supplied a
/// non-empty dictionary; otherwise the returned value is forwarded.
fn take_matching(
    response: &mut ValueMap,
    changed: &mut ValueMap,
    supplied: &ValueMap,
    field: Field,
) -> Result<(), ContractError> {
    let key = field.to_string();
    let Some(value) = response.remove(&key) else {
        return Ok(());
    };
    if supplied.is_empty() {
        changed.insert(key, value);
        return Ok(());
    }
    match value {
        Value::Object(returned) if key_sets_match(supplied, &returned) => {
            changed.insert(key, Value::Object(returned));
            Ok(())
        }
        _ => Err(ContractError::ComputeKeysMutated(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ValueMap {
        value.as_object().expect("test value is an object").clone()
    }

    mod setup {
        use super::*;

        #[test]
        fn conforming_response_preserves_key_sets() {
            let inputs = map(json!({"x": 2.0}));
            let outputs = map(json!({"fx": null}));
            let response = map(json!({
                "inputs": {"x": 2.0},
                "outputs": {"fx": null},
                "message": "ready",
            }));

            let (message, state) =
                enforce_setup(response, &inputs, &outputs, &ValueMap::new()).unwrap();
            assert_eq!(message, "ready");
            assert_eq!(state["inputs"], json!({"x": 2.0}));
            assert_eq!(state["outputs"], json!({"fx": null}));
        }

        #[test]
        fn renamed_input_key_is_a_violation() {
            let inputs = map(json!({"x": 2.0}));
            let response = map(json!({"inputs": {"y": 2.0}, "outputs": {}}));
            let err = enforce_setup(response, &inputs, &ValueMap::new(), &ValueMap::new())
                .unwrap_err();
            assert_eq!(err, ContractError::SetupKeysMutated(Field::Inputs));
        }

        #[test]
        fn dropped_outputs_key_is_a_violation() {
            let outputs = map(json!({"fx": null, "gx": null}));
            let response = map(json!({"outputs": {"fx": 1.0}}));
            let err = enforce_setup(response, &ValueMap::new(), &outputs, &ValueMap::new())
                .unwrap_err();
            assert_eq!(err, ContractError::SetupKeysMutated(Field::Outputs));
        }

        #[test]
        fn added_outputs_key_is_a_violation() {
            let outputs = map(json!({"fx": null}));
            let response = map(json!({"outputs": {"fx": 1.0, "extra": 2.0}}));
            let err = enforce_setup(response, &ValueMap::new(), &outputs, &ValueMap::new())
                .unwrap_err();
            assert_eq!(err, ContractError::SetupKeysMutated(Field::Outputs));
        }

        #[test]
        fn missing_inputs_with_nonempty_supplied_is_a_violation() {
            let inputs = map(json!({"x": 2.0}));
            let response = ValueMap::new();
            let err = enforce_setup(response, &inputs, &ValueMap::new(), &ValueMap::new())
                .unwrap_err();
            assert_eq!(err, ContractError::SetupKeysMutated(Field::Inputs));
        }

        #[test]
        fn non_mapping_inputs_is_a_violation() {
            let inputs = map(json!({"x": 2.0}));
            let response = map(json!({"inputs": [1, 2, 3]}));
            let err = enforce_setup(response, &inputs, &ValueMap::new(), &ValueMap::new())
                .unwrap_err();
            assert_eq!(err, ContractError::SetupKeysMutated(Field::Inputs));
        }

        #[test]
        fn expected_partials_must_be_present() {
            let partials = map(json!({"fx": {"x": null}}));
            let response = map(json!({}));
            let err = enforce_setup(response, &ValueMap::new(), &ValueMap::new(), &partials)
                .unwrap_err();
            assert_eq!(err, ContractError::SetupPartialsMissing);
        }

        #[test]
        fn partials_key_set_is_not_checked_at_setup() {
            let partials = map(json!({"fx": {"x": null}}));
            let response = map(json!({"partials": {"completely": "different"}}));
            let (_, state) =
                enforce_setup(response, &ValueMap::new(), &ValueMap::new(), &partials).unwrap();
            assert_eq!(state["partials"], json!({"completely": "different"}));
        }

        #[test]
        fn extra_keys_seed_setup_data() {
            let response = map(json!({"iteration": 0, "mesh_file": "wing.dat"}));
            let (message, state) =
                enforce_setup(response, &ValueMap::new(), &ValueMap::new(), &ValueMap::new())
                    .unwrap();
            assert_eq!(message, "");
            assert_eq!(state["iteration"], json!(0));
            assert_eq!(state["mesh_file"], json!("wing.dat"));
        }

        #[test]
        fn empty_supplied_dictionaries_place_no_demand() {
            let response = map(json!({"outputs": {"fx": null}}));
            let (_, state) =
                enforce_setup(response, &ValueMap::new(), &map(json!({"fx": null})), &ValueMap::new())
                    .unwrap();
            assert_eq!(state.len(), 1);
            assert_eq!(state["outputs"], json!({"fx": null}));
        }
    }

    mod compute {
        use super::*;

        #[test]
        fn matching_outputs_and_partials_round_trip() {
            let outputs = map(json!({"fx": null}));
            let partials = map(json!({"fx": {"x": null}}));
            let response = map(json!({
                "outputs": {"fx": 3.0},
                "partials": {"fx": {"x": 1.0}},
                "message": "done",
            }));

            let (message, changed) =
                enforce_compute(response, &ValueMap::new(), &outputs, &partials).unwrap();
            assert_eq!(message, "done");
            assert_eq!(changed.len(), 2);
            assert_eq!(changed["outputs"], json!({"fx": 3.0}));
            assert_eq!(changed["partials"], json!({"fx": {"x": 1.0}}));
        }

        #[test]
        fn mutated_outputs_key_set_is_a_violation() {
            let outputs = map(json!({"fx": null}));
            let response = map(json!({"outputs": {"gx": 3.0}}));
            let err = enforce_compute(response, &ValueMap::new(), &outputs, &ValueMap::new())
                .unwrap_err();
            assert_eq!(err, ContractError::ComputeKeysMutated(Field::Outputs));
        }

        #[test]
        fn mutated_partials_key_set_is_a_violation() {
            let partials = map(json!({"fx": {"x": null}}));
            let response = map(json!({"partials": {"fx": {"x": 1.0}, "gx": {}}}));
            let err = enforce_compute(response, &ValueMap::new(), &ValueMap::new(), &partials)
                .unwrap_err();
            assert_eq!(err, ContractError::ComputeKeysMutated(Field::Partials));
        }

        #[test]
        fn undeclared_outputs_are_accepted_and_forwarded() {
            // Lenient asymmetry: the caller passed no outputs, the
            // component returned some anyway.
            let response = map(json!({"outputs": {"surprise": 1.0}}));
            let (_, changed) =
                enforce_compute(response, &ValueMap::new(), &ValueMap::new(), &ValueMap::new())
                    .unwrap();
            assert_eq!(changed["outputs"], json!({"surprise": 1.0}));
        }

        #[test]
        fn missing_outputs_in_response_is_accepted() {
            let outputs = map(json!({"fx": null}));
            let response = map(json!({"message": "nothing to report"}));
            let (message, changed) =
                enforce_compute(response, &ValueMap::new(), &outputs, &ValueMap::new()).unwrap();
            assert_eq!(message, "nothing to report");
            assert!(changed.is_empty());
        }

        #[test]
        fn known_parameter_update_is_forwarded() {
            let setup_data = map(json!({"iteration": 0}));
            let response = map(json!({"iteration": 5}));
            let (_, changed) =
                enforce_compute(response, &setup_data, &ValueMap::new(), &ValueMap::new())
                    .unwrap();
            assert_eq!(changed["iteration"], json!(5));
        }

        #[test]
        fn new_state_key_fails_naming_the_key() {
            let setup_data = map(json!({"iteration": 0}));
            let response = map(json!({"stowaway": true}));
            let err = enforce_compute(response, &setup_data, &ValueMap::new(), &ValueMap::new())
                .unwrap_err();
            assert_eq!(
                err,
                ContractError::IllegalComputeOutput {
                    key: "stowaway".to_string()
                }
            );
            assert_eq!(err.to_string(), "illegal compute output `stowaway`");
        }

        #[test]
        fn changed_keys_only_nothing_else_leaks() {
            let outputs = map(json!({"fx": null}));
            let response = map(json!({"outputs": {"fx": 3.0}, "message": "ok"}));
            let (_, changed) =
                enforce_compute(response, &ValueMap::new(), &outputs, &ValueMap::new()).unwrap();
            assert_eq!(changed.keys().collect::<Vec<_>>(), vec!["outputs"]);
        }
    }
}
