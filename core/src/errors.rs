//! Harness failure taxonomy.

use gantry_store::StoreError;
use gantry_types::ContractError;
use thiserror::Error;

use crate::loader::LoadError;

/// Any failure that aborts the current invocation.
///
/// Nothing here is retried internally; the caller decides whether to
/// re-invoke the whole operation.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Component response violated the key-set or type contract.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// The component failed to resolve or load.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A remote store call failed (transport, status, or save rejection).
    #[error("artifact sync failed: {0}")]
    Store(#[from] StoreError),

    /// The one-shot dependency install subprocess failed.
    #[error("dependency install failed: {0}")]
    Install(String),

    /// User code raised inside `setup` or `compute`. Propagated without
    /// added context or recovery.
    #[error("{0}")]
    Component(anyhow::Error),

    /// Local working-directory preparation failed.
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}
