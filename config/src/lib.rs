//! Configuration for the Gantry harness.
//!
//! All process-wide environment lookups happen here, once, at startup.
//! The rest of the harness receives an explicit [`HarnessConfig`] and
//! never consults ambient globals. Optional collaborators (the remote
//! artifact store, the package installer) are represented as capability
//! flags: when the backing variable is unset the corresponding harness
//! phase is a no-op, not an error.
//!
//! # Environment variables
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `GANTRY_USER_FILES_PATH` | Base path for component working dirs; its final segment is the auth token |
//! | `GANTRY_API_HOST` | Artifact store base URL; enables the remote-store capability |
//! | `GANTRY_PACKAGE_INDEX` | Package index host; enables dependency installation |
//! | `GANTRY_COMPONENT_NAME` | This component's identity on the store |

use std::path::{Path, PathBuf};

/// Fallback component identity when `GANTRY_COMPONENT_NAME` is unset.
pub const DEFAULT_COMPONENT_NAME: &str = "component";

/// Subdirectory of the working dir that receives pulled files.
pub const INPUTS_DIR: &str = "inputs";

/// Optional collaborators the harness may talk to.
///
/// A disabled capability turns the corresponding phase into a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Pull/push files against the remote artifact store.
    pub remote_store: bool,
    /// Run the one-shot dependency install subprocess.
    pub install_dependencies: bool,
}

/// Explicit configuration struct, constructed once at process start.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    user_files_path: PathBuf,
    api_host: Option<String>,
    package_index: Option<String>,
    component_name: String,
}

impl HarnessConfig {
    /// Build the configuration from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset, so `GANTRY_API_HOST=""` leaves
    /// the remote-store capability disabled.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let user_files_path = get("GANTRY_USER_FILES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let component_name =
            get("GANTRY_COMPONENT_NAME").unwrap_or_else(|| DEFAULT_COMPONENT_NAME.to_string());

        let config = Self {
            user_files_path,
            api_host: get("GANTRY_API_HOST"),
            package_index: get("GANTRY_PACKAGE_INDEX"),
            component_name,
        };
        tracing::debug!(
            component = %config.component_name,
            remote_store = config.capabilities().remote_store,
            install_dependencies = config.capabilities().install_dependencies,
            "Harness configuration resolved"
        );
        config
    }

    /// Construct from explicit parts. Used by tests and embedders that
    /// do not configure through the environment.
    #[must_use]
    pub fn from_parts(
        user_files_path: impl Into<PathBuf>,
        api_host: Option<String>,
        package_index: Option<String>,
        component_name: impl Into<String>,
    ) -> Self {
        Self {
            user_files_path: user_files_path.into(),
            api_host,
            package_index,
            component_name: component_name.into(),
        }
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            remote_store: self.api_host.is_some(),
            install_dependencies: self.package_index.is_some(),
        }
    }

    /// Auth token embedded as the final segment of the user-files path,
    /// forwarded as a header on every remote store call.
    #[must_use]
    pub fn auth_token(&self) -> Option<&str> {
        self.user_files_path.file_name().and_then(|s| s.to_str())
    }

    #[must_use]
    pub fn api_host(&self) -> Option<&str> {
        self.api_host.as_deref()
    }

    #[must_use]
    pub fn package_index(&self) -> Option<&str> {
        self.package_index.as_deref()
    }

    #[must_use]
    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    /// Per-component working directory, exclusively owned by the
    /// current invocation sequence.
    #[must_use]
    pub fn working_dir(&self) -> PathBuf {
        self.user_files_path.join(&self.component_name)
    }

    /// Local directory remote pulls land in.
    #[must_use]
    pub fn inputs_dir(&self) -> PathBuf {
        self.working_dir().join(INPUTS_DIR)
    }

    /// Resolve a declared output-directory fragment under the working
    /// directory. The fragment is a single path component; separators in
    /// it would already have been rejected by filename sanitization.
    #[must_use]
    pub fn resolve_output_dir(&self, fragment: &str) -> PathBuf {
        self.working_dir().join(fragment)
    }

    #[must_use]
    pub fn user_files_path(&self) -> &Path {
        &self.user_files_path
    }
}
