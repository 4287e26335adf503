//! HTTP client for the remote artifact store.
//!
//! The store is an external collaborator consumed only through a small
//! request/response contract:
//!
//! | Operation | Method | Purpose |
//! |-----------|--------|---------|
//! | `checkfilesexist` | GET | test remote presence of a named file |
//! | `getfiles` | GET (streamed) | download a file's bytes |
//! | `uploadfile` | POST (multipart) | upload a local file |
//!
//! Every request carries the caller's auth token as a header. Calls block
//! the invoking operation until complete; there is no timeout beyond the
//! transport connect timeout and no internal retry loop. Per-file
//! failure detail is surfaced through [`StoreError`] for an external
//! retry policy to consume.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Header carrying the path-embedded auth token segment.
pub const AUTH_TOKEN_HEADER: &str = "token";

/// Subfolder marker for pulled input files.
pub const INPUTS_SUBFOLDER: &str = "inputs";

/// Subfolder marker for pushed output files.
pub const OUTPUTS_SUBFOLDER: &str = "outputs";

const CONNECT_TIMEOUT_SECS: u64 = 30;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// A failed interaction with the artifact store.
///
/// `Transport` and `Status` carry the raw failure; `SaveRejected` is the
/// distinct case where the store accepted the request but reported that
/// its own validation checks failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection-level failure before a status was received.
    #[error("artifact store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response; `body` is the remote's error body, capped.
    #[error("artifact store returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// 2xx response with an explicit `filesaved: false`.
    #[error("artifact store rejected {file_name}: failed checks {checks:?}")]
    SaveRejected {
        file_name: String,
        checks: Vec<String>,
    },

    /// Local filesystem failure while staging a download or upload.
    #[error("local file error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct CheckFilesExistResponse {
    file_exists: bool,
}

#[derive(Debug, Deserialize)]
struct UploadFileResponse {
    filesaved: bool,
    #[serde(default)]
    checks_failed: Vec<String>,
}

/// Client bound to one store host and one auth token.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ArtifactStore {
    /// Build a client for `base_url`, forwarding `token` on every call.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    /// GET `checkfilesexist`: is `file_name` present for this component?
    pub async fn check_file_exists(
        &self,
        file_name: &str,
        component_name: &str,
    ) -> Result<bool, StoreError> {
        let response = self
            .client
            .get(self.endpoint("checkfilesexist"))
            .header(AUTH_TOKEN_HEADER, &self.token)
            .query(&[("file_name", file_name), ("component_name", component_name)])
            .send()
            .await?;
        let response = error_for_status(response).await?;
        let parsed: CheckFilesExistResponse = response.json().await?;
        Ok(parsed.file_exists)
    }

    /// GET `getfiles`: stream a remote file's bytes into `dest`.
    pub async fn download_file(
        &self,
        file: &str,
        component_name: &str,
        subfolder: &str,
        dest: &Path,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .get(self.endpoint("getfiles"))
            .header(AUTH_TOKEN_HEADER, &self.token)
            .query(&[
                ("file", file),
                ("component_name", component_name),
                ("subfolder", subfolder),
            ])
            .send()
            .await?;
        let response = error_for_status(response).await?;

        let mut out = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            out.write_all(&chunk?).await?;
        }
        out.flush().await?;
        tracing::debug!(file, dest = %dest.display(), "Downloaded remote file");
        Ok(())
    }

    /// POST `uploadfile`: upload `local_path` as a multipart request.
    ///
    /// A 2xx response reporting `filesaved: false` raises
    /// [`StoreError::SaveRejected`] naming the failed checks.
    pub async fn upload_file(
        &self,
        local_path: &Path,
        file_name: &str,
        component_name: &str,
        subfolder: &str,
    ) -> Result<(), StoreError> {
        let bytes = tokio::fs::read(local_path).await?;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("file_name", file_name.to_string())
            .text("component_name", component_name.to_string())
            .text("subfolder", subfolder.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint("uploadfile"))
            .header(AUTH_TOKEN_HEADER, &self.token)
            .multipart(form)
            .send()
            .await?;
        let response = error_for_status(response).await?;

        let parsed: UploadFileResponse = response.json().await?;
        if !parsed.filesaved {
            return Err(StoreError::SaveRejected {
                file_name: file_name.to_string(),
                checks: parsed.checks_failed,
            });
        }
        tracing::debug!(file_name, subfolder, "Uploaded file to artifact store");
        Ok(())
    }

    fn endpoint(&self, operation: &str) -> String {
        format!("{}/{operation}", self.base_url)
    }
}

/// Convert a non-2xx response into [`StoreError::Status`] with the
/// remote's error body attached, capped to avoid unbounded reads.
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = read_capped_error_body(response).await;
    Err(StoreError::Status { status, body })
}

async fn read_capped_error_body(response: reqwest::Response) -> String {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
