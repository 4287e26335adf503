//! Artifact synchronization around the setup/compute boundary.
//!
//! The pull phase runs inside `setup` before user code executes: it
//! recreates the declared output directory empty, then fetches the
//! component's two unit descriptors, its dependency manifest, and every
//! declared user input file into the local `inputs/` directory. A file
//! absent on the store is skipped, not an error.
//!
//! The push phase runs inside `compute` after user code succeeds: every
//! file found recursively under the declared output directory is
//! uploaded with the `outputs` subfolder marker. The first failing
//! upload aborts the push with that file's detail; files already
//! uploaded stay uploaded; there is no rollback and no partial-success
//! bookkeeping.
//!
//! When the remote-store capability is disabled both phases reduce to
//! local directory preparation.

use std::path::{Path, PathBuf};

use gantry_config::HarnessConfig;
use gantry_store::{ArtifactStore, INPUTS_SUBFOLDER, OUTPUTS_SUBFOLDER};
use gantry_types::{ValueMap, sanitize_file_name};
use serde_json::Value;

use crate::errors::HarnessError;
use crate::install::DEPENDENCY_MANIFEST;
use crate::loader::{COMPUTE_UNIT, SETUP_UNIT};

/// Parameter naming the directory `compute` writes its artifacts to.
pub const OUTPUT_DIRECTORY_PARAM: &str = "output_directory";

/// Parameter listing the input files to pull from the store.
pub const USER_INPUT_FILES_PARAM: &str = "user_input_files";

/// Reconciles the local working directory with the remote store.
pub struct Synchronizer {
    config: HarnessConfig,
    store: Option<ArtifactStore>,
}

impl Synchronizer {
    /// Build from config; the store client exists only when the
    /// remote-store capability is enabled.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, HarnessError> {
        let store = match config.api_host() {
            Some(host) => Some(ArtifactStore::new(
                host,
                config.auth_token().unwrap_or_default(),
            )?),
            None => None,
        };
        Ok(Self {
            config: config.clone(),
            store,
        })
    }

    /// Local directory pulled files land in.
    #[must_use]
    pub fn inputs_dir(&self) -> PathBuf {
        self.config.inputs_dir()
    }

    /// Declared output directory resolved from `params`, if any.
    ///
    /// The fragment passes through filename sanitization, so it can
    /// never climb out of the component's working directory.
    #[must_use]
    pub fn output_dir(&self, params: &ValueMap) -> Option<PathBuf> {
        params
            .get(OUTPUT_DIRECTORY_PARAM)
            .and_then(Value::as_str)
            .map(sanitize_file_name)
            .filter(|fragment| !fragment.is_empty())
            .map(|fragment| self.config.resolve_output_dir(&fragment))
    }

    /// Create the inputs directory and recreate the declared output
    /// directory empty, so `compute` never sees stale artifacts from a
    /// prior run. Safe to invoke repeatedly.
    pub fn prepare_directories(&self, params: &ValueMap) -> Result<(), HarnessError> {
        std::fs::create_dir_all(self.inputs_dir())?;
        if let Some(dir) = self.output_dir(params) {
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
            }
            std::fs::create_dir_all(&dir)?;
            tracing::debug!(dir = %dir.display(), "Recreated output directory");
        }
        Ok(())
    }

    /// Pull phase: directory preparation plus the fixed remote file set.
    pub async fn pull(&self, params: &ValueMap) -> Result<(), HarnessError> {
        self.prepare_directories(params)?;
        let Some(store) = &self.store else {
            tracing::debug!("Remote store capability disabled; pull skipped");
            return Ok(());
        };

        let component = self.config.component_name();
        let inputs_dir = self.inputs_dir();
        let mut names: Vec<String> = vec![
            SETUP_UNIT.to_string(),
            COMPUTE_UNIT.to_string(),
            DEPENDENCY_MANIFEST.to_string(),
        ];
        names.extend(declared_input_files(params));

        for name in names {
            if store.check_file_exists(&name, component).await? {
                store
                    .download_file(&name, component, INPUTS_SUBFOLDER, &inputs_dir.join(&name))
                    .await?;
            } else {
                tracing::debug!(file = %name, "Not present on store; skipped");
            }
        }
        Ok(())
    }

    /// Push phase: upload everything under the declared output directory.
    pub async fn push(&self, params: &ValueMap) -> Result<(), HarnessError> {
        let Some(store) = &self.store else {
            tracing::debug!("Remote store capability disabled; push skipped");
            return Ok(());
        };
        let Some(dir) = self.output_dir(params) else {
            return Ok(());
        };
        // Same skip-on-absence posture the pull phase takes for missing
        // remote files: no directory means nothing to push.
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "Output directory absent; push skipped");
            return Ok(());
        }

        let component = self.config.component_name();
        for path in collect_files(&dir)? {
            let name = relative_name(&dir, &path);
            store
                .upload_file(&path, &name, component, OUTPUTS_SUBFOLDER)
                .await?;
        }
        Ok(())
    }
}

/// Declared input filenames, sanitized, empty results dropped.
///
/// Entries may be plain strings or objects carrying a `filename` key.
fn declared_input_files(params: &ValueMap) -> Vec<String> {
    let Some(entries) = params.get(USER_INPUT_FILES_PARAM).and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(name) => Some(name.as_str()),
            Value::Object(spec) => spec.get("filename").and_then(Value::as_str),
            _ => None,
        })
        .map(sanitize_file_name)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Every regular file under `dir`, recursively, in deterministic order.
fn collect_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Path relative to the output directory, `/`-separated for the store.
fn relative_name(dir: &Path, path: &Path) -> String {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ValueMap {
        value.as_object().unwrap().clone()
    }

    fn synchronizer_at(root: &Path) -> Synchronizer {
        let config = HarnessConfig::from_parts(root, None, None, "adder");
        Synchronizer::from_config(&config).unwrap()
    }

    #[test]
    fn declared_files_accept_strings_and_specs() {
        let params = map(json!({
            "user_input_files": [
                "mesh.dat",
                {"filename": "loads.csv"},
                {"filename": "../../etc/passwd"},
                42,
            ]
        }));
        assert_eq!(
            declared_input_files(&params),
            vec!["mesh.dat", "loads.csv", "....etcpasswd"]
        );
    }

    #[test]
    fn output_dir_fragment_is_sanitized() {
        let root = tempfile::tempdir().unwrap();
        let sync = synchronizer_at(root.path());
        let params = map(json!({"output_directory": "../escape"}));
        let dir = sync.output_dir(&params).unwrap();
        assert!(dir.starts_with(root.path().join("adder")));
        assert!(dir.ends_with("..escape"));
    }

    #[test]
    fn directory_preparation_is_idempotent_and_clears_stale_files() {
        let root = tempfile::tempdir().unwrap();
        let sync = synchronizer_at(root.path());
        let params = map(json!({"output_directory": "outputs"}));

        sync.prepare_directories(&params).unwrap();
        let out_dir = sync.output_dir(&params).unwrap();
        std::fs::write(out_dir.join("stale.csv"), "leftover").unwrap();

        // Second preparation must leave an empty directory again.
        sync.prepare_directories(&params).unwrap();
        let remaining: Vec<_> = std::fs::read_dir(&out_dir).unwrap().collect();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn pull_without_store_is_directory_prep_only() {
        let root = tempfile::tempdir().unwrap();
        let sync = synchronizer_at(root.path());
        let params = map(json!({"output_directory": "outputs"}));
        sync.pull(&params).await.unwrap();
        assert!(sync.inputs_dir().is_dir());
        assert!(sync.output_dir(&params).unwrap().is_dir());
    }

    #[tokio::test]
    async fn push_with_missing_output_directory_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let config = HarnessConfig::from_parts(
            root.path(),
            Some("http://127.0.0.1:9".to_string()),
            None,
            "adder",
        );
        let sync = Synchronizer::from_config(&config).unwrap();

        // The declared directory was never created; push must return
        // cleanly without issuing any upload.
        let params = map(json!({"output_directory": "outputs"}));
        sync.push(&params).await.unwrap();
    }

    #[test]
    fn relative_name_uses_forward_slashes() {
        let dir = Path::new("/work/outputs");
        let path = Path::new("/work/outputs/nested/fx.csv");
        assert_eq!(relative_name(dir, path), "nested/fx.csv");
    }
}
