//! CLI utilities for binaries
//!
//! Handles configuration path resolution and endpoint arguments.

use hyperlink::ConnectionMode;
use std::path::PathBuf;

/// Type of configuration to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Supervisor configuration (config/hyperlink.yaml)
    Supervisor,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Supervisor => "config/hyperlink.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Get the environment variable name for this config type
    pub fn env_var_name(&self) -> &str {
        "HYPERLINK_CONFIG_PATH"
    }
}

/// Load configuration path from environment or use default
///
/// # Examples
/// ```
/// use hyperlink_realtime::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Supervisor);
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    if let ConfigType::Custom(path) = &config_type {
        return PathBuf::from(path);
    }
    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// One `label=url[@mode]` endpoint argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointArg {
    pub label: String,
    pub url: String,
    pub mode: Option<ConnectionMode>,
}

/// Parse `label=url[@mode]`
///
/// The `@mode` suffix is only taken when it names a known mode, so URLs
/// with userinfo (`wss://user@host`) pass through untouched.
pub fn parse_endpoint(arg: &str) -> Result<EndpointArg, String> {
    let (label, rest) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected label=url[@mode], got '{}'", arg))?;

    let label = label.trim();
    if label.is_empty() {
        return Err(format!("empty label in '{}'", arg));
    }

    let (url, mode) = match rest.rsplit_once('@') {
        Some((url, suffix)) => match suffix.parse::<ConnectionMode>() {
            Ok(mode) => (url, Some(mode)),
            Err(_) => (rest, None),
        },
        None => (rest, None),
    };

    let url = url.trim();
    if url.is_empty() {
        return Err(format!("empty url for label '{}'", label));
    }

    Ok(EndpointArg {
        label: label.to_string(),
        url: url.to_string(),
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_type_paths() {
        assert_eq!(ConfigType::Supervisor.default_path(), "config/hyperlink.yaml");

        let custom = ConfigType::Custom("custom/path.yaml".to_string());
        assert_eq!(custom.default_path(), "custom/path.yaml");
    }

    #[test]
    fn test_parse_endpoint_plain() {
        let arg = parse_endpoint("prices=wss://feed.example.com/prices").unwrap();
        assert_eq!(arg.label, "prices");
        assert_eq!(arg.url, "wss://feed.example.com/prices");
        assert_eq!(arg.mode, None);
    }

    #[test]
    fn test_parse_endpoint_with_mode() {
        let arg = parse_endpoint("quote=https://api.example.com/q@oneshot").unwrap();
        assert_eq!(arg.url, "https://api.example.com/q");
        assert_eq!(arg.mode, Some(ConnectionMode::OneShot));
    }

    #[test]
    fn test_parse_endpoint_keeps_userinfo() {
        let arg = parse_endpoint("feed=wss://user@host.example.com/ws").unwrap();
        assert_eq!(arg.url, "wss://user@host.example.com/ws");
        assert_eq!(arg.mode, None);
    }

    #[test]
    fn test_parse_endpoint_rejects_malformed() {
        assert!(parse_endpoint("no-separator").is_err());
        assert!(parse_endpoint("=https://x.example").is_err());
        assert!(parse_endpoint("label=").is_err());
    }
}
