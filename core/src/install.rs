//! One-shot dependency installation for user code.
//!
//! Runs the package installer as a single subprocess against the
//! configured index, to completion, with output captured rather than
//! streamed. Not part of the core contract logic; it exists so a pulled
//! dependency manifest takes effect before the component runs.

use std::path::Path;

use gantry_config::HarnessConfig;

use crate::errors::HarnessError;

/// Dependency manifest pulled alongside the component units.
pub const DEPENDENCY_MANIFEST: &str = "requirements.txt";

const INSTALLER_PROGRAM: &str = "pip";

/// Install the component's dependencies if the capability is enabled
/// and a manifest was pulled. Otherwise a no-op.
pub async fn install_dependencies(
    config: &HarnessConfig,
    inputs_dir: &Path,
) -> Result<(), HarnessError> {
    let Some(index) = config.package_index() else {
        return Ok(());
    };
    let manifest = inputs_dir.join(DEPENDENCY_MANIFEST);
    if !manifest.is_file() {
        tracing::debug!("No dependency manifest pulled; install skipped");
        return Ok(());
    }
    run_installer(INSTALLER_PROGRAM, &manifest, index).await
}

async fn run_installer(program: &str, manifest: &Path, index: &str) -> Result<(), HarnessError> {
    let output = tokio::process::Command::new(program)
        .arg("install")
        .arg("-r")
        .arg(manifest)
        .arg("-i")
        .arg(index)
        .output()
        .await
        .map_err(|e| HarnessError::Install(format!("failed to spawn {program}: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    tracing::info!(
        program,
        status = %output.status,
        stdout = %stdout.trim(),
        stderr = %stderr.trim(),
        "Dependency install finished"
    );

    if !output.status.success() {
        return Err(HarnessError::Install(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}
