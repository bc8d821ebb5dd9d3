use clap::Parser;
use serial_test::serial;
use specmcp::config::{Config, ProxyConfig};
use specmcp::error::ConfigError;
use std::{collections::HashMap, env, time::Duration};

const VARS: &[&str] = &[
    "UPSTREAM_BASE_URL",
    "OPENAPI_SPEC_URL",
    "VERSION_URL",
    "MCP_HOST",
    "MCP_PORT",
    "VERSION_CHECK_INTERVAL",
    "ACTIVE_SESSION_TTL",
    "MAX_TRACKED_SESSIONS",
    "UPSTREAM_API_TOKEN",
    "UPSTREAM_TIMEOUT",
    "MCP_SERVER_NAME",
    "MCP_SERVER_URL",
];

#[derive(Default)]
struct EnvGuard {
    original: HashMap<String, Option<String>>,
}

impl EnvGuard {
    /// Starts from an environment with none of the server's variables set
    fn clean() -> Self {
        let mut guard = Self::default();
        for key in VARS {
            guard.remove(key);
        }
        guard
    }

    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.original
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
        env::set_var(key, value.into());
    }

    fn remove(&mut self, key: &str) {
        self.original
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
        env::remove_var(key);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.original.drain() {
            match value {
                Some(v) => env::set_var(&key, v),
                None => env::remove_var(&key),
            }
        }
    }
}

#[test]
#[serial]
fn test_defaults() {
    let _guard = EnvGuard::clean();

    let config = Config::try_parse_from(["specmcp"]).unwrap();

    assert_eq!(config.upstream_base_url, "http://localhost:8000");
    assert_eq!(config.spec_url(), "http://localhost:8000/openapi");
    assert_eq!(config.version_url(), "http://localhost:8000/v1/version");
    assert_eq!(config.poll_interval(), Duration::from_secs(600));
    assert_eq!(config.session_ttl(), Duration::from_secs(600));
    assert_eq!(config.max_sessions, 10_000);
    assert_eq!(config.upstream_timeout(), Duration::from_secs(30));
    assert_eq!(config.listen_addr().unwrap().to_string(), "0.0.0.0:8080");
    assert!(config.api_token.is_none());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_environment_overrides() {
    let mut guard = EnvGuard::clean();
    guard.set("UPSTREAM_BASE_URL", "https://token-api.example.com/");
    guard.set("VERSION_CHECK_INTERVAL", "30");
    guard.set("MCP_PORT", "9090");
    guard.set("MCP_HOST", "127.0.0.1");
    guard.set("UPSTREAM_API_TOKEN", "secret");
    guard.set("ACTIVE_SESSION_TTL", "120");

    let config = Config::try_parse_from(["specmcp"]).unwrap();

    // Trailing slash does not double up
    assert_eq!(config.spec_url(), "https://token-api.example.com/openapi");
    assert_eq!(config.poll_interval(), Duration::from_secs(30));
    assert_eq!(config.session_ttl(), Duration::from_secs(120));
    assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:9090");
    assert_eq!(config.api_token.as_deref(), Some("secret"));
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_flags_take_precedence_over_environment() {
    let mut guard = EnvGuard::clean();
    guard.set("MCP_PORT", "9090");

    let config = Config::try_parse_from(["specmcp", "--port", "7000"]).unwrap();

    assert_eq!(config.port, 7000);
}

#[test]
#[serial]
fn test_non_numeric_interval_is_rejected() {
    let mut guard = EnvGuard::clean();
    guard.set("VERSION_CHECK_INTERVAL", "often");

    assert!(Config::try_parse_from(["specmcp"]).is_err());
}

#[test]
#[serial]
fn test_proxy_targets_local_server_by_default() {
    let mut guard = EnvGuard::clean();

    let config = ProxyConfig::try_parse_from(["proxy"]).unwrap();
    assert_eq!(config.server_url, "http://localhost:8080/mcp");

    guard.set("MCP_SERVER_URL", "https://mcp.example.com/mcp");
    let config = ProxyConfig::try_parse_from(["proxy"]).unwrap();
    assert_eq!(config.server_url, "https://mcp.example.com/mcp");
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = Config::for_upstream("not a url");
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidUrl {
            name: "UPSTREAM_BASE_URL",
            ..
        })
    ));

    config = Config::for_upstream("ftp://example.com");
    assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

    config = Config::for_upstream("http://localhost:8000");
    config.version_check_interval = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Zero("VERSION_CHECK_INTERVAL"))
    ));

    config = Config::for_upstream("http://localhost:8000");
    config.host = "not-an-ip".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidListenAddr(_))
    ));

    config = Config::for_upstream("http://localhost:8000");
    config.api_token = Some("line\nbreak".to_string());
    assert!(matches!(config.validate(), Err(ConfigError::InvalidToken)));
}
