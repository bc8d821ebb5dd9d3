use thiserror::Error;

/// Errors raised while fetching the interface description or the version
/// document from the upstream API.
///
/// None of these are fatal after startup: the caller keeps whatever state
/// it had and retries on the next poll tick.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure, timeout, or connection refused
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-2xx status
    #[error("Upstream returned HTTP {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// Body was not valid JSON
    #[error("Response from {url} is not valid JSON: {reason}")]
    Decode { url: String, reason: String },

    /// Document is JSON but is not a usable interface description
    #[error("Invalid interface description: {0}")]
    Validation(String),

    /// Version document carried none of the recognised fields
    #[error("Version document from {0} has no version, commit or date field")]
    MissingVersion(String),
}

impl FetchError {
    /// Failure class used as a structured log field.
    ///
    /// Transport-level problems (network, status) are reported as
    /// `transport`; anything wrong with the document itself is `validation`.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } | FetchError::Status { .. } => "transport",
            FetchError::Decode { .. }
            | FetchError::Validation(_)
            | FetchError::MissingVersion(_) => "validation",
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == "validation"
    }
}

/// The tool generator rejected a sanitized description
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Path item for '{0}' is not an object")]
    InvalidPathItem(String),

    #[error("Operation {method} {path} is malformed: {reason}")]
    InvalidOperation {
        method: String,
        path: String,
        reason: String,
    },

    #[error("Tool name '{name}' generated for both {first} and {second}")]
    DuplicateToolName {
        name: String,
        first: String,
        second: String,
    },

    #[error("Interface description contains no operations")]
    NoOperations,

    /// The blocking build task panicked or was cancelled
    #[error("Catalogue build task failed: {0}")]
    Aborted(String),
}

/// Errors that prevent the process from serving at all
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load interface description: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to build tool registry: {0}")]
    Build(#[from] BuildError),

    #[error("Failed to create upstream HTTP client: {0}")]
    Transport(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Invalid listen address {0}")]
    InvalidListenAddr(String),

    #[error("UPSTREAM_API_TOKEN contains characters not allowed in an HTTP header")]
    InvalidToken,
}

/// The STDIO bridge could not reach the remote server
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
}

/// Failure of a single tool invocation against the upstream API
///
/// # Error Conversion
///
/// Converted to `rmcp::ErrorData` so the calling client receives a
/// protocol-level error:
///
/// | InvokeError            | MCP Error Code    |
/// |------------------------|-------------------|
/// | UnknownTool            | METHOD_NOT_FOUND  |
/// | InvalidArguments       | INVALID_PARAMS    |
/// | Upstream (4xx)         | INVALID_PARAMS    |
/// | Upstream (other)       | INTERNAL_ERROR    |
/// | Request                | INTERNAL_ERROR    |
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },
}

impl From<InvokeError> for rmcp::ErrorData {
    fn from(err: InvokeError) -> Self {
        use rmcp::model::ErrorCode;

        let code = match &err {
            InvokeError::UnknownTool(_) => ErrorCode::METHOD_NOT_FOUND,
            InvokeError::InvalidArguments(_) => ErrorCode::INVALID_PARAMS,
            InvokeError::Upstream { status, .. } if (400..500).contains(status) => {
                ErrorCode::INVALID_PARAMS
            }
            InvokeError::Upstream { .. } | InvokeError::Request(_) => ErrorCode::INTERNAL_ERROR,
        };

        let data = match &err {
            InvokeError::Upstream { status, body } => Some(serde_json::json!({
                "status": status,
                "body": body,
            })),
            _ => None,
        };

        rmcp::ErrorData {
            code,
            message: err.to_string().into(),
            data,
        }
    }
}
