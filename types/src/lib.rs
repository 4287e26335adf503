//! Shared contract types for the Gantry component harness.
//!
//! A component exchanges data with the harness exclusively through
//! string-keyed JSON mappings: `inputs`, `outputs`, `partials`, `params`,
//! and the `setup_data` state threaded between calls. This crate defines
//! the mapping alias, the helpers the contract enforcer is built on, and
//! the error type raised when a component response violates the contract.
//!
//! Filename sanitization for remotely declared input files lives in
//! [`sanitize`]; everything that crosses from a parameter set into a
//! filesystem or URL path goes through it first.

mod contract;
mod sanitize;

pub use contract::{
    ContractError, Field, MESSAGE_KEY, ValueMap, key_sets_match, take_message,
};
pub use sanitize::sanitize_file_name;
