//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The Google client secret is loaded from the GOOGLE_CLIENT_SECRET env
//! var or client_secret_file, never stored in the TOML directly to avoid
//! leaking secrets.

use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub google: GoogleConfig,
    #[serde(default)]
    pub tokens: TokenConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// State-file locations for the durable stores
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub accounts_path: PathBuf,
    pub tokens_path: PathBuf,
}

/// Google OAuth client settings
#[derive(Debug, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    /// Default redirect URI for the authorization flow; sign-in requests
    /// may carry their own origin, re-consent exchanges use this one.
    pub redirect_uri: String,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file containing the client secret (alternative to the
    /// GOOGLE_CLIENT_SECRET env var)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
}

/// Session credential lifetimes
#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: default_access_ttl_secs(),
            refresh_ttl_secs: default_refresh_ttl_secs(),
        }
    }
}

fn default_max_connections() -> usize {
    1000
}

fn default_access_ttl_secs() -> u64 {
    900
}

fn default_refresh_ttl_secs() -> u64 {
    2_592_000
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. GOOGLE_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.google.client_id.is_empty() {
            return Err(common::Error::Config("google.client_id must be set".into()));
        }

        // Validate redirect_uri is a valid URL with http(s) scheme
        if !config.google.redirect_uri.starts_with("http://")
            && !config.google.redirect_uri.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "google.redirect_uri must start with http:// or https://, got: {}",
                config.google.redirect_uri
            )));
        }

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if config.tokens.access_ttl_secs == 0 || config.tokens.refresh_ttl_secs == 0 {
            return Err(common::Error::Config(
                "token TTLs must be greater than 0".into(),
            ));
        }

        // Resolve client secret: env var takes precedence over file
        if let Ok(secret) = std::env::var("GOOGLE_CLIENT_SECRET") {
            config.google.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.google.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.google.client_secret = Some(Secret::new(secret));
            }
        }

        if config.google.client_secret.is_none() {
            return Err(common::Error::Config(
                "google client secret not configured (set GOOGLE_CLIENT_SECRET or google.client_secret_file)"
                    .into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("identity-api.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn valid_toml() -> &'static str {
        r#"
[server]
listen_addr = "127.0.0.1:8080"

[storage]
accounts_path = "/var/lib/identity/accounts.json"
tokens_path = "/var/lib/identity/tokens.json"

[google]
client_id = "client-123.apps.googleusercontent.com"
redirect_uri = "https://app.example.com/auth/google/callback"
"#
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        unsafe { set_env("GOOGLE_CLIENT_SECRET", "gsec-test-123") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("GOOGLE_CLIENT_SECRET") };

        assert_eq!(config.server.listen_addr.port(), 8080);
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(
            config.google.client_id,
            "client-123.apps.googleusercontent.com"
        );
        assert_eq!(config.tokens.access_ttl_secs, 900);
        assert_eq!(config.tokens.refresh_ttl_secs, 2_592_000);
        assert_eq!(
            config.google.client_secret.as_ref().unwrap().expose(),
            "gsec-test-123"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_secret_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("client_secret");
        std::fs::write(&secret_path, "gsec-file-456\n").unwrap();

        let toml_content = format!(
            r#"
[server]
listen_addr = "127.0.0.1:8080"

[storage]
accounts_path = "/tmp/accounts.json"
tokens_path = "/tmp/tokens.json"

[google]
client_id = "cid"
redirect_uri = "https://app.example.com/cb"
client_secret_file = "{}"
"#,
            secret_path.display()
        );
        let path = write_config(&dir, &toml_content);

        unsafe { remove_env("GOOGLE_CLIENT_SECRET") };
        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.google.client_secret.as_ref().unwrap().expose(),
            "gsec-file-456"
        );
    }

    #[test]
    fn test_secret_env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("client_secret");
        std::fs::write(&secret_path, "gsec-file-value").unwrap();

        let toml_content = format!(
            r#"
[server]
listen_addr = "127.0.0.1:8080"

[storage]
accounts_path = "/tmp/accounts.json"
tokens_path = "/tmp/tokens.json"

[google]
client_id = "cid"
redirect_uri = "https://app.example.com/cb"
client_secret_file = "{}"
"#,
            secret_path.display()
        );
        let path = write_config(&dir, &toml_content);

        unsafe { set_env("GOOGLE_CLIENT_SECRET", "gsec-env-value") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("GOOGLE_CLIENT_SECRET") };

        assert_eq!(
            config.google.client_secret.as_ref().unwrap().expose(),
            "gsec-env-value"
        );
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        unsafe { remove_env("GOOGLE_CLIENT_SECRET") };
        let result = Config::load(&path);
        assert!(result.is_err(), "config without a client secret must fail");
        let err = result.unwrap_err().to_string();
        assert!(
            err.contains("client secret not configured"),
            "error message should explain the issue, got: {err}"
        );
    }

    #[test]
    fn test_whitespace_only_secret_file_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("client_secret");
        std::fs::write(&secret_path, "  \n  ").unwrap();

        let toml_content = format!(
            r#"
[server]
listen_addr = "127.0.0.1:8080"

[storage]
accounts_path = "/tmp/accounts.json"
tokens_path = "/tmp/tokens.json"

[google]
client_id = "cid"
redirect_uri = "https://app.example.com/cb"
client_secret_file = "{}"
"#,
            secret_path.display()
        );
        let path = write_config(&dir, &toml_content);

        unsafe { remove_env("GOOGLE_CLIENT_SECRET") };
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_invalid_redirect_uri_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let toml_content = r#"
[server]
listen_addr = "127.0.0.1:8080"

[storage]
accounts_path = "/tmp/accounts.json"
tokens_path = "/tmp/tokens.json"

[google]
client_id = "cid"
redirect_uri = "app.example.com/cb"
"#;
        let path = write_config(&dir, toml_content);

        unsafe { set_env("GOOGLE_CLIENT_SECRET", "gsec") };
        let result = Config::load(&path);
        unsafe { remove_env("GOOGLE_CLIENT_SECRET") };

        assert!(result.is_err(), "redirect_uri without scheme must be rejected");
        let err = format!("{}", result.unwrap_err());
        assert!(
            err.contains("redirect_uri must start with http"),
            "error message should explain the issue, got: {err}"
        );
    }

    #[test]
    fn test_zero_token_ttl_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let toml_content = r#"
[server]
listen_addr = "127.0.0.1:8080"

[storage]
accounts_path = "/tmp/accounts.json"
tokens_path = "/tmp/tokens.json"

[google]
client_id = "cid"
redirect_uri = "https://app.example.com/cb"

[tokens]
access_ttl_secs = 0
"#;
        let path = write_config(&dir, toml_content);

        unsafe { set_env("GOOGLE_CLIENT_SECRET", "gsec") };
        let result = Config::load(&path);
        unsafe { remove_env("GOOGLE_CLIENT_SECRET") };

        assert!(result.is_err(), "access_ttl_secs = 0 must be rejected");
    }

    #[test]
    fn test_zero_max_connections_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let toml_content = r#"
[server]
listen_addr = "127.0.0.1:8080"
max_connections = 0

[storage]
accounts_path = "/tmp/accounts.json"
tokens_path = "/tmp/tokens.json"

[google]
client_id = "cid"
redirect_uri = "https://app.example.com/cb"
"#;
        let path = write_config(&dir, toml_content);

        unsafe { set_env("GOOGLE_CLIENT_SECRET", "gsec") };
        let result = Config::load(&path);
        unsafe { remove_env("GOOGLE_CLIENT_SECRET") };

        assert!(result.is_err(), "max_connections = 0 must be rejected");
    }

    #[test]
    fn test_resolve_path_cli_arg() {
        let path = Config::resolve_path(Some("/custom/path.toml"));
        assert_eq!(path, PathBuf::from("/custom/path.toml"));
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        let path = Config::resolve_path(None);
        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(path, PathBuf::from("/env/path.toml"));
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CONFIG_PATH") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("identity-api.toml"));
    }

    #[test]
    fn test_resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/should-lose.toml") };
        let path = Config::resolve_path(Some("/cli/wins.toml"));
        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(
            path,
            PathBuf::from("/cli/wins.toml"),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );
    }

    #[test]
    fn test_custom_token_ttls() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let toml_content = r#"
[server]
listen_addr = "127.0.0.1:8080"

[storage]
accounts_path = "/tmp/accounts.json"
tokens_path = "/tmp/tokens.json"

[google]
client_id = "cid"
redirect_uri = "https://app.example.com/cb"

[tokens]
access_ttl_secs = 300
refresh_ttl_secs = 86400
"#;
        let path = write_config(&dir, toml_content);

        unsafe { set_env("GOOGLE_CLIENT_SECRET", "gsec") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("GOOGLE_CLIENT_SECRET") };

        assert_eq!(config.tokens.access_ttl_secs, 300);
        assert_eq!(config.tokens.refresh_ttl_secs, 86400);
    }
}
