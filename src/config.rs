use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use snafu::ResultExt as _;

use crate::csrf::CsrfConfig;
use crate::database::DatabaseConfig;
use crate::error::{ApplicationError, ConfigLoadSnafu};
use crate::maintenance::StoragePaths;

/// Everything the binary reads from the environment (and `.env`).
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(flatten)]
    pub database: DatabaseConfig,
    #[serde(flatten)]
    pub csrf: CsrfConfig,
    #[serde(flatten)]
    pub storage: StoragePaths,
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("storage/logs")
}

impl Config {
    pub fn from_env() -> Result<Config, ApplicationError> {
        envy::from_env::<Config>().context(ConfigLoadSnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Backend;

    fn load(vars: &[(&str, &str)]) -> Config {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()));
        envy::from_iter(vars).unwrap()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]);

        assert_eq!(config.host, default_host());
        assert_eq!(config.log_dir, PathBuf::from("storage/logs"));
        assert_eq!(config.database.backend, Backend::Surreal);
        assert_eq!(config.database.endpoint, "mem://");
        assert_eq!(config.csrf, CsrfConfig::default());
        assert_eq!(config.storage, StoragePaths::default());
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("HOST_ADDRESS", "0.0.0.0:8080"),
            ("DATABASE_BACKEND", "memory"),
            ("SURREAL_USERNAME", "root"),
            ("CSRF_HEADER", "X-XSRF-TOKEN"),
            ("CSRF_COOKIE", "adboard_xsrf"),
            ("CSRF_SESSION_KEY", "_token"),
            ("SESSION_DIR", "/var/lib/adboard/sessions"),
        ]);

        assert_eq!(config.host.port(), 8080);
        assert_eq!(config.database.backend, Backend::Memory);
        assert_eq!(config.database.username.as_deref(), Some("root"));
        assert_eq!(config.csrf.header_name, "X-XSRF-TOKEN");
        assert_eq!(config.csrf.cookie_name, "adboard_xsrf");
        assert_eq!(config.csrf.session_key, "_token");
        assert_eq!(
            config.storage.session_dir,
            PathBuf::from("/var/lib/adboard/sessions")
        );
    }
}
