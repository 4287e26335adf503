//! Component loading.
//!
//! A component is untrusted, user-authored logic exposing two entry
//! points, `setup` and `compute`. The harness treats it as a black box
//! behind the [`Component`] trait and obtains a fresh [`ComponentHandle`]
//! through a [`ComponentLoader`] on **every** invocation - any previously
//! returned handle is discarded, so edits to the component definition
//! take effect without restarting the host process.
//!
//! The concrete [`DirectoryLoader`] re-reads the two unit descriptors
//! (`setup.json`, `compute.json`) from the component directory on each
//! load and resolves the named entry against a [`Registry`] of component
//! constructors. Load failures propagate unmasked; the harness never
//! papers over a broken component definition.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gantry_types::ValueMap;
use serde::Deserialize;
use thiserror::Error;

/// Descriptor file naming the entry point used for `setup` calls.
pub const SETUP_UNIT: &str = "setup.json";

/// Descriptor file naming the entry point used for `compute` calls.
pub const COMPUTE_UNIT: &str = "compute.json";

/// Arguments handed to a component's `setup` entry point.
#[derive(Debug)]
pub struct SetupArgs<'a> {
    pub inputs: &'a ValueMap,
    pub outputs: &'a ValueMap,
    pub partials: &'a ValueMap,
    pub params: &'a ValueMap,
}

/// Arguments handed to a component's `compute` entry point.
#[derive(Debug)]
pub struct ComputeArgs<'a> {
    pub setup_data: &'a ValueMap,
    pub params: &'a ValueMap,
    pub inputs: &'a ValueMap,
    pub outputs: &'a ValueMap,
    pub partials: &'a ValueMap,
    pub options: &'a ValueMap,
    pub root_folder: &'a Path,
}

/// The interface every user component must satisfy.
///
/// Both methods return the raw response mapping; the contract enforcer
/// validates it afterwards. Errors are arbitrary user-code failures and
/// propagate unmodified.
pub trait Component {
    fn setup(&self, args: &SetupArgs<'_>) -> anyhow::Result<ValueMap>;
    fn compute(&self, args: &ComputeArgs<'_>) -> anyhow::Result<ValueMap>;
}

/// A freshly loaded pair of entry points, valid for one invocation.
pub struct ComponentHandle {
    /// Unit resolved from [`SETUP_UNIT`].
    pub setup: Box<dyn Component>,
    /// Unit resolved from [`COMPUTE_UNIT`].
    pub compute: Box<dyn Component>,
}

impl std::fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentHandle").finish_non_exhaustive()
    }
}

/// Explicit load-or-fail operation, invoked fresh per call.
pub trait ComponentLoader {
    fn load(&self) -> Result<ComponentHandle, LoadError>;
}

/// A component definition that failed to resolve.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read component unit {unit}: {source}")]
    Read {
        unit: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse component unit {unit}: {source}")]
    Parse {
        unit: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("component unit {unit} names unknown entry `{entry}`")]
    UnknownEntry { unit: String, entry: String },
}

#[derive(Debug, Deserialize)]
struct UnitDescriptor {
    entry: String,
}

type Constructor = fn() -> Box<dyn Component>;

/// Name-to-constructor map the loader resolves entry points against.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<String, Constructor>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the components shipped in-tree.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("adder", || Box::new(crate::reference::Adder));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, constructor: Constructor) {
        self.entries.insert(name.into(), constructor);
    }

    fn construct(&self, unit: &str, entry: &str) -> Result<Box<dyn Component>, LoadError> {
        let constructor = self.entries.get(entry).ok_or_else(|| LoadError::UnknownEntry {
            unit: unit.to_string(),
            entry: entry.to_string(),
        })?;
        Ok(constructor())
    }
}

/// Loader that re-resolves both unit descriptors from `dir` on every
/// call. Nothing is cached between loads.
pub struct DirectoryLoader {
    dir: PathBuf,
    registry: Registry,
}

impl DirectoryLoader {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, registry: Registry) -> Self {
        Self {
            dir: dir.into(),
            registry,
        }
    }

    fn resolve_unit(&self, unit: &str) -> Result<Box<dyn Component>, LoadError> {
        let path = self.dir.join(unit);
        let raw = std::fs::read_to_string(&path).map_err(|source| LoadError::Read {
            unit: unit.to_string(),
            source,
        })?;
        let descriptor: UnitDescriptor =
            serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
                unit: unit.to_string(),
                source,
            })?;
        tracing::debug!(unit, entry = %descriptor.entry, "Resolved component unit");
        self.registry.construct(unit, &descriptor.entry)
    }
}

impl ComponentLoader for DirectoryLoader {
    fn load(&self) -> Result<ComponentHandle, LoadError> {
        Ok(ComponentHandle {
            setup: self.resolve_unit(SETUP_UNIT)?,
            compute: self.resolve_unit(COMPUTE_UNIT)?,
        })
    }
}
