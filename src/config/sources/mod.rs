//! Concrete [`ConfigSource`](super::ConfigSource) implementations.
//!
//! Provides file-based sources (YAML, JSON, TOML) gated by feature flags,
//! [`for_path`] to pick one from a file extension, and the
//! [`parse_config_str`] helper for format-specific deserialization.

use std::path::{Path, PathBuf};

pub mod file_source;

#[cfg(feature = "yaml")]
pub mod yaml;

#[cfg(feature = "json")]
pub mod json;

#[cfg(feature = "toml")]
pub mod toml_source;

use crate::config::model::Config;
use crate::config::ConfigSource;
use crate::error::CorrelidError;

/// Files probed in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "correlid.yaml",
    "correlid.yml",
    "correlid.json",
    "correlid.toml",
];

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Config, CorrelidError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| CorrelidError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| CorrelidError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| CorrelidError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(CorrelidError::UnsupportedFormat(other.to_string())),
    }
}

/// Pick the file source matching `path`'s extension.
pub fn for_path(path: PathBuf) -> Result<Box<dyn ConfigSource>, CorrelidError> {
    match extension(&path).as_str() {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Ok(Box::new(yaml::new(path))),

        #[cfg(feature = "json")]
        "json" => Ok(Box::new(json::new(path))),

        #[cfg(feature = "toml")]
        "toml" => Ok(Box::new(toml_source::new(path))),

        other => Err(CorrelidError::UnsupportedFormat(other.to_string())),
    }
}

/// First of [`DEFAULT_CONFIG_FILES`] present in `dir`.
#[must_use]
pub fn autodetect(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = parse_config_str("ini", "", "correlid.ini").unwrap_err();
        assert!(matches!(err, CorrelidError::UnsupportedFormat(ext) if ext == "ini"));
    }

    #[test]
    fn for_path_rejects_unknown_extension() {
        let result = for_path(PathBuf::from("correlid.conf"));
        assert!(matches!(result, Err(CorrelidError::UnsupportedFormat(_))));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_parse_error_names_the_file() {
        let err = parse_config_str("yaml", "correlation: [", "bad.yaml").unwrap_err();
        assert!(err.to_string().starts_with("Config parse error in bad.yaml"));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_sets_options() {
        let config = parse_config_str(
            "yml",
            "correlation:\n  request_header: X-Request-Token\n  enforce_header: true\nprovider: trace-id\n",
            "correlid.yml",
        )
        .unwrap();
        assert_eq!(config.correlation.request_header, "X-Request-Token");
        assert!(config.correlation.enforce_header);
        assert_eq!(config.provider, crate::config::model::ProviderKind::TraceId);
    }

    #[test]
    fn autodetect_finds_nothing_in_an_empty_dir() {
        let dir = std::env::temp_dir().join(format!("correlid-autodetect-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(autodetect(&dir).is_none());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
