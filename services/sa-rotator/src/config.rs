//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! `SA_CREDENTIAL_DIR` and `SA_ACTIVE_CREDENTIAL` override the pool paths so
//! the same file can be shipped to every host.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub pool: PoolConfig,
    #[serde(default)]
    pub client: ClientConfig,
    pub admin: AdminConfig,
}

/// How rate-limit reports are answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    /// Advance to the next non-stale account in directory order
    Rolling,
    /// Blacklist the failing account and draw a random replacement
    #[default]
    Reactive,
}

impl RotationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationMode::Rolling => "rolling",
            RotationMode::Reactive => "reactive",
        }
    }
}

/// Credential pool settings
#[derive(Debug, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub credential_dir: PathBuf,
    #[serde(default)]
    pub active_credential: String,
    #[serde(default = "default_max_preloaded")]
    pub max_preloaded: usize,
    #[serde(default = "default_preload_count")]
    pub preload_count: usize,
    #[serde(default = "default_refill_interval")]
    pub refill_interval_secs: u64,
    #[serde(default)]
    pub mode: RotationMode,
}

/// Settings for preloaded HTTP clients
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

/// Operator API listener
#[derive(Debug, Deserialize)]
pub struct AdminConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_max_preloaded() -> usize {
    16
}

fn default_preload_count() -> usize {
    8
}

fn default_refill_interval() -> u64 {
    300
}

fn default_timeout() -> u64 {
    60
}

fn default_max_connections() -> usize {
    64
}

impl PoolConfig {
    pub fn refill_interval(&self) -> Duration {
        Duration::from_secs(self.refill_interval_secs)
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file, overlay environment variables,
    /// then validate.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(dir) = std::env::var("SA_CREDENTIAL_DIR") {
            config.pool.credential_dir = PathBuf::from(dir);
        }
        if let Ok(active) = std::env::var("SA_ACTIVE_CREDENTIAL") {
            config.pool.active_credential = active;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        let pool = &self.pool;
        if pool.credential_dir.as_os_str().is_empty() {
            return Err(common::Error::invalid(
                "pool.credential_dir",
                "must be set in the file or via SA_CREDENTIAL_DIR",
            ));
        }
        if pool.active_credential.trim().is_empty() {
            return Err(common::Error::invalid(
                "pool.active_credential",
                "must be set in the file or via SA_ACTIVE_CREDENTIAL",
            ));
        }
        if pool.max_preloaded == 0 {
            return Err(common::Error::invalid(
                "pool.max_preloaded",
                "must be greater than 0",
            ));
        }
        if pool.preload_count > pool.max_preloaded {
            return Err(common::Error::invalid(
                "pool.preload_count",
                format!(
                    "must not exceed max_preloaded ({}), got {}",
                    pool.max_preloaded, pool.preload_count
                ),
            ));
        }
        if pool.refill_interval_secs == 0 {
            return Err(common::Error::invalid(
                "pool.refill_interval_secs",
                "must be greater than 0",
            ));
        }
        if self.client.timeout_secs == 0 {
            return Err(common::Error::invalid(
                "client.timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.admin.max_connections == 0 {
            return Err(common::Error::invalid(
                "admin.max_connections",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("sa-rotator.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that touch process environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_overrides() {
        unsafe {
            remove_env("SA_CREDENTIAL_DIR");
            remove_env("SA_ACTIVE_CREDENTIAL");
        }
    }

    fn valid_toml() -> &'static str {
        r#"
[pool]
credential_dir = "/etc/sa"
active_credential = "/etc/sa/sa-0.json"

[admin]
listen_addr = "127.0.0.1:9090"
"#
    }

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa-rotator.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_valid_config_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let (_dir, path) = write_config(valid_toml());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.pool.credential_dir, PathBuf::from("/etc/sa"));
        assert_eq!(config.pool.active_credential, "/etc/sa/sa-0.json");
        assert_eq!(config.pool.max_preloaded, 16);
        assert_eq!(config.pool.preload_count, 8);
        assert_eq!(config.pool.refill_interval(), Duration::from_secs(300));
        assert_eq!(config.pool.mode, RotationMode::Reactive);
        assert_eq!(config.client.timeout(), Duration::from_secs(60));
        assert_eq!(config.admin.max_connections, 64);
    }

    #[test]
    fn test_load_rolling_mode_and_custom_values() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let (_dir, path) = write_config(
            r#"
[pool]
credential_dir = "/etc/sa"
active_credential = "/etc/sa/sa-0.json"
max_preloaded = 4
preload_count = 4
refill_interval_secs = 30
mode = "rolling"

[client]
timeout_secs = 10

[admin]
listen_addr = "0.0.0.0:9191"
max_connections = 8
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.pool.mode, RotationMode::Rolling);
        assert_eq!(config.pool.mode.as_str(), "rolling");
        assert_eq!(config.pool.max_preloaded, 4);
        assert_eq!(config.pool.preload_count, 4);
        assert_eq!(config.client.timeout_secs, 10);
        assert_eq!(config.admin.listen_addr.port(), 9191);
        assert_eq!(config.admin.max_connections, 8);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let (_dir, path) = write_config(&valid_toml().replace(
            "active_credential = \"/etc/sa/sa-0.json\"",
            "active_credential = \"/etc/sa/sa-0.json\"\nmode = \"sideways\"",
        ));

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, common::Error::Toml(_)), "got: {err}");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/sa-rotator.toml"));
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let (_dir, path) = write_config("not valid {{{{ toml");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_env_overrides_pool_paths() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let (_dir, path) = write_config(valid_toml());

        unsafe {
            set_env("SA_CREDENTIAL_DIR", "/srv/accounts");
            set_env("SA_ACTIVE_CREDENTIAL", "/srv/accounts/sa-7.json");
        }
        let config = Config::load(&path).unwrap();
        clear_overrides();

        assert_eq!(config.pool.credential_dir, PathBuf::from("/srv/accounts"));
        assert_eq!(config.pool.active_credential, "/srv/accounts/sa-7.json");
    }

    #[test]
    fn test_env_supplies_missing_pool_paths() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let (_dir, path) = write_config(
            r#"
[pool]

[admin]
listen_addr = "127.0.0.1:9090"
"#,
        );

        clear_overrides();
        let err = Config::load(&path).unwrap_err();
        assert!(
            err.to_string().contains("pool.credential_dir"),
            "got: {err}"
        );

        unsafe {
            set_env("SA_CREDENTIAL_DIR", "/srv/accounts");
            set_env("SA_ACTIVE_CREDENTIAL", "/srv/accounts/sa-0.json");
        }
        let config = Config::load(&path).unwrap();
        clear_overrides();
        assert_eq!(config.pool.credential_dir, PathBuf::from("/srv/accounts"));
    }

    #[test]
    fn test_preload_count_above_max_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let (_dir, path) = write_config(&valid_toml().replace(
            "active_credential = \"/etc/sa/sa-0.json\"",
            "active_credential = \"/etc/sa/sa-0.json\"\nmax_preloaded = 2\npreload_count = 3",
        ));

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("pool.preload_count"), "got: {err}");
    }

    #[test]
    fn test_zero_values_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let cases = [
            ("max_preloaded = 0\npreload_count = 0", "pool.max_preloaded"),
            ("refill_interval_secs = 0", "pool.refill_interval_secs"),
        ];
        for (extra, field) in cases {
            let (_dir, path) = write_config(&valid_toml().replace(
                "active_credential = \"/etc/sa/sa-0.json\"",
                &format!("active_credential = \"/etc/sa/sa-0.json\"\n{extra}"),
            ));
            let err = Config::load(&path).unwrap_err();
            assert!(err.to_string().contains(field), "expected {field}, got: {err}");
        }

        let (_dir, path) = write_config(&format!("{}\n[client]\ntimeout_secs = 0\n", valid_toml()));
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("client.timeout_secs"), "got: {err}");

        let (_dir, path) = write_config(&valid_toml().replace(
            "listen_addr = \"127.0.0.1:9090\"",
            "listen_addr = \"127.0.0.1:9090\"\nmax_connections = 0",
        ));
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("admin.max_connections"), "got: {err}");
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
        assert_eq!(path, PathBuf::from("/env/path.toml"));
        unsafe { remove_env("CONFIG_PATH") };
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CONFIG_PATH") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("sa-rotator.toml"));
    }

    #[test]
    fn test_resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/should-lose.toml") };
        let path = Config::resolve_path(Some("/cli/wins.toml"));
        assert_eq!(
            path,
            PathBuf::from("/cli/wins.toml"),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );
        unsafe { remove_env("CONFIG_PATH") };
    }
}
