//! Client for the code scan service's CCA file-scan endpoint.
//!
//! One call archives a workspace directory, uploads the archive as a
//! multipart form together with a JSON scan-configuration envelope, and
//! interprets the response's success flag. No retries at this layer; retry
//! policy belongs to the orchestrating caller.

pub mod error;
pub mod types;

pub use error::{Result, ScanError};
pub use types::{Asset, JobResult, Message, ScanConfig, ScanInformation, ScanResponse};

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use codescan_archive::{build_archive, ArchiveFilter};

/// Path appended to the service base URL for file-based scans.
const SCAN_FILE_PATH: &str = "/cca/v1.0/scan/file";

/// Fixed name of the archive produced at the workspace root.
pub const ARCHIVE_NAME: &str = "workspace.zip";

/// Transport settings. Certificate verification is on by default; turning it
/// off is for debugging against self-signed test instances only.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            accept_invalid_certs: false,
        }
    }
}

pub struct ScanClient {
    client: reqwest::Client,
    base_url: String,
}

impl ScanClient {
    pub fn new(base_url: &str, token: &str, options: ClientOptions) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| {
                ScanError::Config("access token contains invalid header characters".to_string())
            })?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Scan the process working directory. The working directory is "the
    /// workspace" in a CI context; resolution failure is its own error.
    pub async fn scan_current_dir(&self, language: &str) -> Result<ScanResponse> {
        let workspace =
            std::env::current_dir().map_err(|e| ScanError::Workspace(e.to_string()))?;
        self.scan_project(&workspace, language).await
    }

    /// Archive `workspace` into `workspace.zip` at its root, upload it for
    /// scanning, and return the parsed response.
    ///
    /// A well-formed response with `success == false` is returned as
    /// [`ScanError::Rejected`], carrying the service's result code and the
    /// full ordered message list.
    pub async fn scan_project(&self, workspace: &Path, language: &str) -> Result<ScanResponse> {
        let archive_path = workspace.join(ARCHIVE_NAME);

        info!(workspace = %workspace.display(), "Archiving workspace");
        let filter = ArchiveFilter::default_rules();
        build_archive(workspace, &archive_path, &filter)?;

        let contents =
            std::fs::read(&archive_path).map_err(|e| ScanError::ArchiveUnreadable {
                path: archive_path.clone(),
                message: e.to_string(),
            })?;
        debug!(bytes = contents.len(), "Archive read back for upload");

        let envelope = serde_json::to_string(&ScanConfig::file_scan(language))?;

        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(ARCHIVE_NAME)
            .mime_str("application/zip")?;
        let form = reqwest::multipart::Form::new()
            .part("FileUploadContent", part)
            .text("ScanConfig", envelope);

        let url = format!("{}{}", self.base_url, SCAN_FILE_PATH);
        info!(%url, "Uploading archive for scanning");
        let resp = self.client.post(&url).multipart(form).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ScanError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let response: ScanResponse = serde_json::from_str(&body)?;

        if response.success {
            info!(
                job_id = response.result.job_id.as_deref().unwrap_or(""),
                "Scan submission accepted"
            );
            Ok(response)
        } else {
            Err(ScanError::Rejected {
                result_code: response.result.result_code.unwrap_or_default(),
                messages: response.result.messages,
            })
        }
    }
}
