use std::path::PathBuf;

use promptlog_lib::DEFAULT_DB_PATH;
use serde::Deserialize;
use tracing::warn;

/// Optional `promptlog.toml` configuration. Every key may be overridden by a
/// CLI flag or its environment variable.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct ServeConfig {
    pub port: Option<u16>,
    pub hostname: Option<String>,
    pub db_path: Option<String>,
}

/// Fully resolved settings for `promptlog serve`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub hostname: String,
    pub port: u16,
    pub db_path: PathBuf,
}

// ── Default value functions ──────────────────────────

fn default_port() -> u16 {
    3000
}

fn default_hostname() -> String {
    "0.0.0.0".to_string()
}

impl ServeConfig {
    /// Load configuration from a TOML file, falling back to defaults if the file
    /// doesn't exist or cannot be parsed.
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                warn!(path, error = %e, "failed to parse config, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// CLI args (which already carry env overrides) take precedence over the
    /// config file, which takes precedence over defaults.
    pub fn resolve_db_path(&self, db_arg: Option<String>) -> PathBuf {
        PathBuf::from(
            db_arg
                .or_else(|| self.db_path.clone())
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
        )
    }

    pub fn resolve(
        self,
        db_arg: Option<String>,
        port_arg: Option<u16>,
        hostname_arg: Option<String>,
    ) -> ServerSettings {
        let db_path = self.resolve_db_path(db_arg);
        ServerSettings {
            hostname: hostname_arg
                .or(self.hostname)
                .unwrap_or_else(default_hostname),
            port: port_arg.or(self.port).unwrap_or_else(default_port),
            db_path,
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_or_args() {
        let settings = ServeConfig::default().resolve(None, None, None);
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.hostname, "0.0.0.0");
        assert_eq!(settings.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(settings.addr(), "0.0.0.0:3000");
    }

    #[test]
    fn file_values_fill_in_missing_args() {
        let config = ServeConfig::parse(
            r#"
port = 8088
hostname = "127.0.0.1"
db_path = "/var/lib/promptlog/db.json"
"#,
        )
        .unwrap();

        let settings = config.resolve(None, None, None);
        assert_eq!(settings.port, 8088);
        assert_eq!(settings.hostname, "127.0.0.1");
        assert_eq!(settings.db_path, PathBuf::from("/var/lib/promptlog/db.json"));
    }

    #[test]
    fn args_override_file() {
        let config = ServeConfig::parse("port = 8088\ndb_path = \"a.json\"").unwrap();
        let settings = config.resolve(Some("b.json".into()), Some(9000), Some("localhost".into()));
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.hostname, "localhost");
        assert_eq!(settings.db_path, PathBuf::from("b.json"));
    }

    #[test]
    fn missing_or_invalid_file_falls_back_to_defaults() {
        assert_eq!(
            ServeConfig::load("/definitely/not/here/promptlog.toml"),
            ServeConfig::default()
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promptlog.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();
        assert_eq!(
            ServeConfig::load(path.to_str().unwrap()),
            ServeConfig::default()
        );
    }
}
