//! Environment configuration.
//!
//! `.env` is loaded first; real environment variables win over it, and
//! command-line flags win over both.

use std::env;
use std::path::{Path, PathBuf};

use brainwave_core::model::StudentId;
use dotenvy::dotenv;
use thiserror::Error;

pub const DEFAULT_DB_URL: &str = "sqlite:brainwave.sqlite3";
pub const DEFAULT_STATIC_ROOT: &str = "public";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid BRAINWAVE_STUDENT_ID value: {raw}")]
    InvalidStudentId { raw: String },
    #[error("invalid BRAINWAVE_PORT value: {raw}")]
    InvalidPort { raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_url: String,
    pub student_id: Option<StudentId>,
    pub static_root: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_url = set("BRAINWAVE_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.to_string());
        let student_id = set("BRAINWAVE_STUDENT_ID")
            .map(|raw| {
                raw.parse::<StudentId>()
                    .map_err(|_| ConfigError::InvalidStudentId { raw })
            })
            .transpose()?;
        let static_root = set("BRAINWAVE_STATIC_ROOT")
            .map_or_else(|| PathBuf::from(DEFAULT_STATIC_ROOT), PathBuf::from);
        let port = set("BRAINWAVE_PORT")
            .map(|raw| {
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort { raw })
            })
            .transpose()?
            .unwrap_or(DEFAULT_PORT);
        let rust_log = set("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            db_url,
            student_id,
            static_root,
            port,
            rust_log,
        })
    }
}

/// Turn a relative `sqlite:` path into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_url, DEFAULT_DB_URL);
        assert_eq!(config.student_id, None);
        assert_eq!(config.static_root, PathBuf::from("public"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn variables_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("BRAINWAVE_DB_URL", "sqlite::memory:"),
            ("BRAINWAVE_STUDENT_ID", " 12 "),
            ("BRAINWAVE_PORT", "9000"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.db_url, "sqlite::memory:");
        assert_eq!(config.student_id, Some(StudentId::new(12)));
        assert_eq!(config.port, 9000);
        assert_eq!(config.rust_log, "debug");
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = Config::from_lookup(lookup(&[("BRAINWAVE_STUDENT_ID", "  ")])).unwrap();
        assert_eq!(config.student_id, None);
    }

    #[test]
    fn bad_values_are_reported() {
        let err = Config::from_lookup(lookup(&[("BRAINWAVE_PORT", "http")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPort { raw: "http".into() });
        let err = Config::from_lookup(lookup(&[("BRAINWAVE_STUDENT_ID", "ada")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStudentId { .. }));
    }

    #[test]
    fn sqlite_urls_are_made_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("sqlite:///tmp/a.db"), "sqlite:///tmp/a.db");
        assert_eq!(normalize_sqlite_url("sqlite:/tmp/a.db"), "sqlite:///tmp/a.db");
        assert!(normalize_sqlite_url("sqlite:brainwave.sqlite3").starts_with("sqlite:///"));
    }
}
