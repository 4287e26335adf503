//! Core of the Gantry component harness.
//!
//! # Architecture
//!
//! Three cooperating stages run per invocation request:
//!
//! 1. [`loader`] - obtains a fresh handle to the component's `setup` and
//!    `compute` entry points on every call, so edits to the component
//!    definition take effect without restarting the host process.
//! 2. [`enforcer`] - validates the shape of every component response
//!    against the caller-supplied dictionaries before it is handed back.
//! 3. [`sync`] - pulls the component's files from the remote artifact
//!    store before `setup` and pushes declared outputs after `compute`.
//!
//! [`Harness`] wires the three together behind the two operations a
//! caller sees: `setup` once per component lifecycle, then `compute`
//! zero or more times with the evolving `setup_data` threaded through.
//!
//! Everything is sequential: one invocation at a time per harness
//! instance, remote calls blocking the operation until complete.

pub mod enforcer;
mod errors;
mod harness;
pub mod install;
pub mod loader;
mod reference;
pub mod sync;

pub use errors::HarnessError;
pub use harness::{ComputeOutcome, ComputeRequest, Harness, SetupOutcome, SetupRequest};
pub use loader::{
    COMPUTE_UNIT, Component, ComponentHandle, ComponentLoader, ComputeArgs, DirectoryLoader,
    LoadError, Registry, SETUP_UNIT, SetupArgs,
};
pub use reference::Adder;
