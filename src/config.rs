use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Top-level Config — all fields have defaults, unknown keys silently ignored.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout in seconds. 0 = no timeout.
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the project API used to resolve recipes and
    /// collections that are not cached locally.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the default data directory for store files.
    pub data_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            remote: RemoteConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout: 30 }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { base_url: None }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: None }
    }
}

// ---------------------------------------------------------------------------
// Overlay config — partial deserialization for field-level merging.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct OverlayConfig {
    http: OverlayHttpConfig,
    remote: OverlayRemoteConfig,
    storage: OverlayStorageConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct OverlayHttpConfig {
    timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct OverlayRemoteConfig {
    base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct OverlayStorageConfig {
    data_dir: Option<PathBuf>,
}

impl Config {
    /// Apply overlay values over self. Only `Some` fields are overridden.
    fn merge(mut self, overlay: OverlayConfig) -> Self {
        if let Some(v) = overlay.http.timeout {
            self.http.timeout = v;
        }
        if let Some(v) = overlay.remote.base_url {
            self.remote.base_url = Some(v);
        }
        if let Some(v) = overlay.storage.data_dir {
            self.storage.data_dir = Some(v);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Path resolution
// ---------------------------------------------------------------------------

const CONFIG_DIR_NAME: &str = "galley";
const CONFIG_FILE_NAME: &str = "config.toml";

fn global_config_path() -> Option<PathBuf> {
    if let Ok(dir) = env::var("XDG_CONFIG_HOME") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir).join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

// ---------------------------------------------------------------------------
// Tilde expansion
// ---------------------------------------------------------------------------

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Some(s) = path.to_str() {
        if let Some(rest) = s.strip_prefix('~') {
            if let Ok(home) = env::var("HOME") {
                return PathBuf::from(home).join(rest.strip_prefix('/').unwrap_or(rest));
            }
        }
    }
    path.clone()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.http.timeout > 600 {
            errors.push(format!(
                "http.timeout = {} is out of range (0..=600)",
                self.http.timeout
            ));
        }

        if let Some(ref url) = self.remote.base_url {
            if reqwest::Url::parse(url).is_err() {
                errors.push(format!("remote.base_url = \"{}\" is not a valid URL", url));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors.join("; ")))
        }
    }

    /// Expand tilde in all path fields. Called after merging, before validation.
    fn expand_paths(&mut self) {
        if let Some(ref path) = self.storage.data_dir {
            self.storage.data_dir = Some(expand_tilde(path));
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn load_overlay(path: &PathBuf) -> Result<OverlayConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::storage(format!("could not read \"{}\": {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Validation(format!("failed to parse \"{}\": {}", path.display(), e)))
}

/// Load configuration from the global config file. A missing file is
/// silently skipped (all defaults apply); parse and validation errors
/// are returned as `Err`.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    if let Some(path) = global_config_path() {
        if path.exists() {
            let overlay = load_overlay(&path)?;
            config = config.merge(overlay);
        }
    }

    config.expand_paths();
    config.validate()?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http.timeout, 30);
        assert!(config.remote.base_url.is_none());
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_parse_valid_toml() {
        let toml_str = r#"
[http]
timeout = 10

[remote]
base_url = "https://api.example.com"

[storage]
data_dir = "/var/lib/galley"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.http.timeout, 10);
        assert_eq!(
            config.remote.base_url.as_deref(),
            Some("https://api.example.com")
        );
        assert_eq!(
            config.storage.data_dir,
            Some(PathBuf::from("/var/lib/galley"))
        );
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
[http]
timeout = 5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.http.timeout, 5);
        // All other fields retain defaults
        assert!(config.remote.base_url.is_none());
    }

    #[test]
    fn test_parse_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.http.timeout, 30);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let toml_str = r#"
[http]
timeout = 15
unknown_field = "hello"

[unknown_section]
key = "value"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.http.timeout, 15);
    }

    // -- Merge tests --

    #[test]
    fn test_merge_empty_overlay() {
        let base = Config::default();
        let overlay = OverlayConfig::default();
        let merged = base.merge(overlay);
        assert_eq!(merged.http.timeout, 30);
        assert!(merged.remote.base_url.is_none());
    }

    #[test]
    fn test_merge_partial_overlay() {
        let mut base = Config::default();
        base.remote.base_url = Some("https://global.example.com".into());

        // Overlay only overrides timeout, not base_url
        let overlay_str = r#"
[http]
timeout = 60
"#;
        let overlay: OverlayConfig = toml::from_str(overlay_str).unwrap();
        let merged = base.merge(overlay);
        assert_eq!(merged.http.timeout, 60);
        // base_url survives from the base layer
        assert_eq!(
            merged.remote.base_url.as_deref(),
            Some("https://global.example.com")
        );
    }

    // -- Validation tests --

    #[test]
    fn test_validate_defaults_pass() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_out_of_range() {
        let mut config = Config::default();
        config.http.timeout = 999;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http.timeout"));
        assert!(err.to_string().contains("999"));
    }

    #[test]
    fn test_validate_invalid_base_url() {
        let mut config = Config::default();
        config.remote.base_url = Some("not a url".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("remote.base_url"));
    }

    #[test]
    fn test_validate_zero_timeout_valid() {
        let mut config = Config::default();
        config.http.timeout = 0;
        assert!(config.validate().is_ok());
    }

    // -- Tilde expansion tests --

    #[test]
    fn test_expand_tilde() {
        let home = env::var("HOME").unwrap_or_else(|_| "/home/test".into());
        let path = PathBuf::from("~/data/galley");
        let expanded = expand_tilde(&path);
        assert_eq!(expanded, PathBuf::from(format!("{}/data/galley", home)));
    }

    #[test]
    fn test_expand_tilde_no_tilde() {
        let path = PathBuf::from("/absolute/path/galley");
        let expanded = expand_tilde(&path);
        assert_eq!(expanded, path);
    }
}
