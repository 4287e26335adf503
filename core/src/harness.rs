//! The two operations a caller sees.
//!
//! `setup` runs once per component lifecycle: pull phase, dependency
//! install, fresh load, user `setup`, contract enforcement. `compute`
//! runs zero or more times with the evolving `setup_data`: fresh load,
//! user `compute`, contract enforcement, push phase. Each call reloads
//! the component; nothing from a previous load survives.

use std::path::PathBuf;

use gantry_config::HarnessConfig;
use gantry_types::ValueMap;
use serde::{Deserialize, Serialize};

use crate::enforcer;
use crate::errors::HarnessError;
use crate::install;
use crate::loader::{ComponentLoader, ComputeArgs, SetupArgs};
use crate::sync::Synchronizer;

/// Caller-supplied dictionaries for one `setup` invocation.
#[derive(Debug, Default, Deserialize)]
pub struct SetupRequest {
    #[serde(default)]
    pub inputs: ValueMap,
    #[serde(default)]
    pub outputs: ValueMap,
    #[serde(default)]
    pub partials: ValueMap,
    #[serde(default)]
    pub params: ValueMap,
}

/// Caller-supplied dictionaries for one `compute` invocation.
#[derive(Debug, Default, Deserialize)]
pub struct ComputeRequest {
    #[serde(default)]
    pub setup_data: ValueMap,
    #[serde(default)]
    pub params: ValueMap,
    #[serde(default)]
    pub inputs: ValueMap,
    #[serde(default)]
    pub outputs: ValueMap,
    #[serde(default)]
    pub partials: ValueMap,
    #[serde(default)]
    pub options: ValueMap,
    #[serde(default = "default_root_folder")]
    pub root_folder: PathBuf,
}

fn default_root_folder() -> PathBuf {
    PathBuf::from(".")
}

/// Result of a `setup` invocation: the component's message and the
/// validated state dictionary that becomes `setup_data`.
#[derive(Debug, Serialize)]
pub struct SetupOutcome {
    pub message: String,
    pub data: ValueMap,
}

/// Result of a `compute` invocation: the message and only the keys that
/// changed (`outputs`, `partials`, and/or parameter updates).
#[derive(Debug, Serialize)]
pub struct ComputeOutcome {
    pub message: String,
    pub data: ValueMap,
}

/// Host harness for one component instance.
///
/// Single-threaded by design: one invocation at a time, every remote
/// call blocking the operation until complete.
pub struct Harness<L> {
    config: HarnessConfig,
    loader: L,
    sync: Synchronizer,
}

impl<L: ComponentLoader> Harness<L> {
    pub fn new(config: HarnessConfig, loader: L) -> Result<Self, HarnessError> {
        let sync = Synchronizer::from_config(&config)?;
        Ok(Self {
            config,
            loader,
            sync,
        })
    }

    /// Initialize the component: synchronize files, install
    /// dependencies, then run and validate the user's `setup`.
    pub async fn setup(&self, request: SetupRequest) -> Result<SetupOutcome, HarnessError> {
        tracing::info!(component = %self.config.component_name(), "Starting setup");
        self.sync.pull(&request.params).await?;
        install::install_dependencies(&self.config, &self.sync.inputs_dir()).await?;

        let handle = self.loader.load()?;
        let response = handle
            .setup
            .setup(&SetupArgs {
                inputs: &request.inputs,
                outputs: &request.outputs,
                partials: &request.partials,
                params: &request.params,
            })
            .map_err(HarnessError::Component)?;

        let (message, data) = enforcer::enforce_setup(
            response,
            &request.inputs,
            &request.outputs,
            &request.partials,
        )?;
        Ok(SetupOutcome { message, data })
    }

    /// Run and validate the user's `compute`, then push its outputs.
    pub async fn compute(&self, request: ComputeRequest) -> Result<ComputeOutcome, HarnessError> {
        tracing::info!(component = %self.config.component_name(), "Starting compute");
        let handle = self.loader.load()?;
        let response = handle
            .compute
            .compute(&ComputeArgs {
                setup_data: &request.setup_data,
                params: &request.params,
                inputs: &request.inputs,
                outputs: &request.outputs,
                partials: &request.partials,
                options: &request.options,
                root_folder: &request.root_folder,
            })
            .map_err(HarnessError::Component)?;

        let (message, data) = enforcer::enforce_compute(
            response,
            &request.setup_data,
            &request.outputs,
            &request.partials,
        )?;

        self.sync.push(&request.params).await?;
        Ok(ComputeOutcome { message, data })
    }
}
