//! Gantry CLI - runs one component operation per invocation.
//!
//! Reads a JSON invocation request from a file (or stdin with `-`),
//! executes it against the component configured through the
//! environment, and prints the outcome as JSON on stdout. Logs go to
//! stderr so stdout stays machine-readable.
//!
//! ```text
//! gantry request.json
//! echo '{"op":"compute","inputs":{"x":2.0},"outputs":{"fx":null}}' | gantry -
//! ```

use std::io::Read;

use anyhow::{Context, Result, bail};
use gantry_config::HarnessConfig;
use gantry_core::{ComputeRequest, DirectoryLoader, Harness, Registry, SetupRequest};
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// One invocation request, discriminated by its `op` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Request {
    Setup(SetupRequest),
    Compute(ComputeRequest),
}

impl Request {
    fn operation(&self) -> &'static str {
        match self {
            Self::Setup(_) => "setup",
            Self::Compute(_) => "compute",
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn read_request(source: &str) -> Result<Request> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("failed to read request file {source}"))?
    };
    serde_json::from_str(&raw).context("invalid invocation request")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let (Some(source), None) = (args.next(), args.next()) else {
        bail!("usage: gantry <request.json | ->");
    };
    let request = read_request(&source)?;

    let config = HarnessConfig::from_env();
    tracing::info!(
        op = request.operation(),
        component = %config.component_name(),
        "Running invocation request"
    );
    let loader = DirectoryLoader::new(config.inputs_dir(), Registry::builtin());
    let harness = Harness::new(config, loader)?;

    let rendered = match request {
        Request::Setup(setup) => serde_json::to_string_pretty(&harness.setup(setup).await?)?,
        Request::Compute(compute) => serde_json::to_string_pretty(&harness.compute(compute).await?)?,
    };
    println!("{rendered}");
    Ok(())
}
