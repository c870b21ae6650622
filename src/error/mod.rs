//! Error types for Docker Hub API operations
//!
//! Every failure surfaced by the request pipeline falls into one of four
//! classes so callers can tell credential problems, network problems,
//! request problems and API-contract problems apart. All payloads are
//! cloneable: a single token fetch may be awaited by many callers and its
//! failure is handed to each of them.

use serde::Deserialize;

pub type Result<T> = std::result::Result<T, Error>;

/// Error codes defined by the Docker Registry HTTP API v2. Codes the
/// protocol adds later decode as `Other` rather than failing the whole
/// error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BlobUnknown,
    BlobUploadInvalid,
    BlobUploadUnknown,
    DigestInvalid,
    ManifestBlobUnknown,
    ManifestInvalid,
    ManifestUnknown,
    ManifestUnverified,
    NameInvalid,
    NameUnknown,
    SizeInvalid,
    TagInvalid,
    Unauthorized,
    Denied,
    Unsupported,
    Other,
}

impl ErrorCode {
    fn from_wire(code: &str) -> Self {
        match code {
            "BLOB_UNKNOWN" => ErrorCode::BlobUnknown,
            "BLOB_UPLOAD_INVALID" => ErrorCode::BlobUploadInvalid,
            "BLOB_UPLOAD_UNKNOWN" => ErrorCode::BlobUploadUnknown,
            "DIGEST_INVALID" => ErrorCode::DigestInvalid,
            "MANIFEST_BLOB_UNKNOWN" => ErrorCode::ManifestBlobUnknown,
            "MANIFEST_INVALID" => ErrorCode::ManifestInvalid,
            "MANIFEST_UNKNOWN" => ErrorCode::ManifestUnknown,
            "MANIFEST_UNVERIFIED" => ErrorCode::ManifestUnverified,
            "NAME_INVALID" => ErrorCode::NameInvalid,
            "NAME_UNKNOWN" => ErrorCode::NameUnknown,
            "SIZE_INVALID" => ErrorCode::SizeInvalid,
            "TAG_INVALID" => ErrorCode::TagInvalid,
            "UNAUTHORIZED" => ErrorCode::Unauthorized,
            "DENIED" => ErrorCode::Denied,
            "UNSUPPORTED" => ErrorCode::Unsupported,
            _ => ErrorCode::Other,
        }
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(ErrorCode::from_wire(&code))
    }
}

/// One error record from a registry error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

/// The `{"errors": [...]}` envelope the registry wraps error details in.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Credentials rejected by the auth endpoint, or a second consecutive
    /// 401 after a token refresh.
    #[error("authentication failed{}: {reason}", fmt_status(.status))]
    Authentication {
        status: Option<u16>,
        reason: String,
    },

    /// Connection, timeout or 5xx failure. Retryable by the caller; the
    /// pipeline itself never retries these.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A well-formed 4xx other than the 401 refresh path. Carries the
    /// decoded error body verbatim and, for 429, the Retry-After value.
    #[error("request failed with status {status}{}", fmt_detail(.errors))]
    Request {
        status: u16,
        errors: Vec<ApiError>,
        retry_after: Option<u64>,
    },

    /// The server answered 2xx but the body did not match the expected
    /// shape.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// Client misconfiguration detected before any request was sent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Exit status for command-line front ends, one per error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Authentication { .. } => 2,
            Error::Transport(_) => 3,
            Error::Request { .. } => 4,
            Error::Decode(_) => 5,
            Error::Config(_) => 6,
        }
    }

    /// First registry error code in the response body, if any.
    pub fn api_error_code(&self) -> Option<ErrorCode> {
        match self {
            Error::Request { errors, .. } => errors.first().map(|e| e.code),
            _ => None,
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!(" (status {})", status),
        None => String::new(),
    }
}

fn fmt_detail(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let detail: Vec<String> = errors
        .iter()
        .map(|e| format!("{:?}: {}", e.code, e.message))
        .collect();
    format!(": {}", detail.join("; "))
}
