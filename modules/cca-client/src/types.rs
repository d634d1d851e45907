//! Wire types for the CCA file-scan API.
//!
//! Field names match the service's JSON exactly; response fields that are
//! only present on one side of the success flag are optional.

use serde::{Deserialize, Serialize};

/// JSON envelope sent in the `ScanConfig` multipart field.
#[derive(Debug, Clone, Serialize)]
pub struct ScanConfig {
    pub engine_type: String,
    pub scan_information: ScanInformation,
    pub asset: Asset,
    pub configuration: serde_json::Value,
    pub scan_scope: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanInformation {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Asset {
    pub file_format: String,
    /// The service expects the string `"true"`, not a JSON boolean.
    pub recursive: String,
    pub language: String,
}

impl ScanConfig {
    /// Envelope for a file-based scan of an uploaded ZIP archive.
    /// Configuration and scope are extension points this step never uses;
    /// they are always empty objects.
    pub fn file_scan(language: &str) -> Self {
        Self {
            engine_type: "FILE".to_string(),
            scan_information: ScanInformation {
                name: "scenario".to_string(),
                description: "a scan with extracted source".to_string(),
            },
            asset: Asset {
                file_format: "ZIP".to_string(),
                recursive: "true".to_string(),
                language: language.to_string(),
            },
            configuration: serde_json::Value::Object(Default::default()),
            scan_scope: serde_json::Value::Object(Default::default()),
        }
    }
}

/// Scan submission response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(default)]
    pub result: JobResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobResult {
    /// Present only on success.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Present only on failure.
    #[serde(default)]
    pub result_code: Option<i64>,
    /// Present only on success.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// One diagnostic message from a rejected submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub sequence: i64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub param1: Option<String>,
    #[serde(default)]
    pub param2: Option<String>,
    #[serde(default)]
    pub param3: Option<String>,
    #[serde(default)]
    pub param4: Option<String>,
}
