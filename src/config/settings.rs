use crate::error::ConfigError;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Process configuration, read from command-line flags or the environment.
///
/// Every flag has an environment fallback so the server can be configured
/// through a `.env` file.
#[derive(Debug, Clone, Parser)]
#[command(name = "specmcp", version, about = "Serve a REST API as live MCP tools")]
pub struct Config {
    /// Base URL of the upstream REST API
    #[arg(long, env = "UPSTREAM_BASE_URL", default_value = "http://localhost:8000")]
    pub upstream_base_url: String,

    /// Interface description URL, defaults to `{base}/openapi`
    #[arg(long, env = "OPENAPI_SPEC_URL")]
    pub openapi_spec_url: Option<String>,

    /// Version document URL, defaults to `{base}/v1/version`
    #[arg(long, env = "VERSION_URL")]
    pub version_url: Option<String>,

    #[arg(long, env = "MCP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "MCP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds between upstream version checks
    #[arg(long, env = "VERSION_CHECK_INTERVAL", default_value_t = 600)]
    pub version_check_interval: u64,

    /// Seconds a session stays tracked after its last request
    #[arg(long, env = "ACTIVE_SESSION_TTL", default_value_t = 600)]
    pub session_ttl: u64,

    #[arg(long, env = "MAX_TRACKED_SESSIONS", default_value_t = 10_000)]
    pub max_sessions: usize,

    /// Bearer credential sent with every tool invocation
    #[arg(long, env = "UPSTREAM_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Timeout in seconds for tool invocations against the upstream
    #[arg(long, env = "UPSTREAM_TIMEOUT", default_value_t = 30)]
    pub upstream_timeout: u64,

    #[arg(long, env = "MCP_SERVER_NAME", default_value = "OpenAPI MCP")]
    pub server_name: String,
}

impl Config {
    /// Configuration pointing at `base_url` with every other value defaulted
    pub fn for_upstream(base_url: impl Into<String>) -> Self {
        Self {
            upstream_base_url: base_url.into(),
            openapi_spec_url: None,
            version_url: None,
            host: "0.0.0.0".to_string(),
            port: 8080,
            version_check_interval: 600,
            session_ttl: 600,
            max_sessions: 10_000,
            api_token: None,
            upstream_timeout: 30,
            server_name: "OpenAPI MCP".to_string(),
        }
    }

    fn base(&self) -> &str {
        self.upstream_base_url.trim_end_matches('/')
    }

    pub fn spec_url(&self) -> String {
        self.openapi_spec_url
            .clone()
            .unwrap_or_else(|| format!("{}/openapi", self.base()))
    }

    pub fn version_url(&self) -> String {
        self.version_url
            .clone()
            .unwrap_or_else(|| format!("{}/v1/version", self.base()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.version_check_interval)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(format!("{}:{}", self.host, self.port)))?;
        Ok(SocketAddr::from((ip, self.port)))
    }

    /// Rejects values that would make the server unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("UPSTREAM_BASE_URL", &self.upstream_base_url)?;
        check_url("OPENAPI_SPEC_URL", &self.spec_url())?;
        check_url("VERSION_URL", &self.version_url())?;

        if self.version_check_interval == 0 {
            return Err(ConfigError::Zero("VERSION_CHECK_INTERVAL"));
        }
        if self.session_ttl == 0 {
            return Err(ConfigError::Zero("ACTIVE_SESSION_TTL"));
        }
        if self.max_sessions == 0 {
            return Err(ConfigError::Zero("MAX_TRACKED_SESSIONS"));
        }
        if self.upstream_timeout == 0 {
            return Err(ConfigError::Zero("UPSTREAM_TIMEOUT"));
        }

        if let Some(token) = &self.api_token {
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ConfigError::InvalidToken)?;
        }

        self.listen_addr()?;
        Ok(())
    }
}

/// Configuration of the STDIO bridge to a running server
#[derive(Debug, Clone, Parser)]
#[command(
    name = "specmcp-proxy",
    version,
    about = "Expose a remote MCP server to stdio-only clients"
)]
pub struct ProxyConfig {
    /// Streamable HTTP endpoint of the remote server
    #[arg(long, env = "MCP_SERVER_URL", default_value = "http://localhost:8080/mcp")]
    pub server_url: String,
}

impl ProxyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("MCP_SERVER_URL", &self.server_url)
    }
}

fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
        }),
    }
}
