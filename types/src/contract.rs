//! Contract dictionary types and violation errors.
//!
//! The key-set invariant is central: `inputs`, `outputs`, and `partials`
//! each have a fixed key set established by the caller before `setup` is
//! ever invoked, and a component may change values but never the keys.
//! [`ContractError`] messages name exactly which field and operation
//! failed, since they are the only diagnostic the caller receives.

use serde_json::Value;
use thiserror::Error;

/// String-keyed JSON mapping used for every contract dictionary.
pub type ValueMap = serde_json::Map<String, Value>;

/// Response key extracted and returned separately from state.
pub const MESSAGE_KEY: &str = "message";

/// Contract dictionary a violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Inputs,
    Outputs,
    Partials,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Inputs => "inputs",
            Self::Outputs => "outputs",
            Self::Partials => "partials",
        })
    }
}

/// A component response that fails the key-set or type invariants.
///
/// Fatal to the current invocation; the harness never retries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    /// Setup dropped, renamed, or added a key in a supplied dictionary,
    /// or omitted the dictionary entirely.
    #[error("{0} not returned or keys mutated by setup")]
    SetupKeysMutated(Field),

    /// Setup omitted `partials` (or returned a non-mapping) when the
    /// caller supplied partials. No key-set check applies at setup time.
    #[error("partials not returned by setup")]
    SetupPartialsMissing,

    /// Compute returned a dictionary whose key set differs from the one
    /// the caller supplied.
    #[error("{0} not returned or keys mutated by compute")]
    ComputeKeysMutated(Field),

    /// Compute tried to introduce a state key that does not already
    /// exist in `setup_data`. Updates may change values, never keys.
    #[error("illegal compute output `{key}`")]
    IllegalComputeOutput { key: String },
}

/// True when both mappings have exactly the same key set.
#[must_use]
pub fn key_sets_match(a: &ValueMap, b: &ValueMap) -> bool {
    a.len() == b.len() && a.keys().all(|k| b.contains_key(k))
}

/// Remove and return the `message` key from a response.
///
/// Absent or non-string messages yield an empty string; a component is
/// never required to say anything.
#[must_use]
pub fn take_message(response: &mut ValueMap) -> String {
    match response.remove(MESSAGE_KEY) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}
