//! Endpoint registry: label → URL and error policy

use crate::mode::ErrorMode;
use std::collections::HashMap;

/// Caller-chosen identifier for one logical connection
pub type Label = String;

/// Registered endpoint for a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub label: Label,
    pub url: String,
    pub error_mode: ErrorMode,
}

#[derive(Debug, Default)]
struct Entry {
    url: Option<String>,
    error_mode: Option<ErrorMode>,
}

/// Mapping from label to its configured endpoint
///
/// Pure state. An error mode may be set before the URL is registered; it
/// is kept and applies once the label gets a URL.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    entries: HashMap<Label, Entry>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite the URL for `label`
    ///
    /// The error mode defaults to [`ErrorMode::AutoReconnect`] if it was
    /// never set. No transport is started.
    pub fn register(&mut self, label: &str, url: impl Into<String>) {
        let entry = self.entries.entry(label.to_string()).or_default();
        entry.url = Some(url.into());
        entry.error_mode.get_or_insert(ErrorMode::default());
    }

    /// Store the error policy for `label`
    pub fn set_error_mode(&mut self, label: &str, mode: ErrorMode) {
        self.entries.entry(label.to_string()).or_default().error_mode = Some(mode);
    }

    /// URL registered for `label`
    pub fn lookup(&self, label: &str) -> Option<&str> {
        self.entries.get(label)?.url.as_deref()
    }

    /// Error policy for `label`, defaulting when unset
    pub fn error_mode(&self, label: &str) -> ErrorMode {
        self.entries
            .get(label)
            .and_then(|entry| entry.error_mode)
            .unwrap_or_default()
    }

    /// Full endpoint configuration, if a URL is registered
    pub fn config(&self, label: &str) -> Option<EndpointConfig> {
        let url = self.lookup(label)?;
        Some(EndpointConfig {
            label: label.to_string(),
            url: url.to_string(),
            error_mode: self.error_mode(label),
        })
    }

    pub fn is_registered(&self, label: &str) -> bool {
        self.lookup(label).is_some()
    }

    /// All labels with a registered URL, sorted
    pub fn labels(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.url.is_some())
            .map(|(label, _)| label.clone())
            .collect();
        labels.sort();
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = EndpointRegistry::new();
        assert_eq!(registry.lookup("API_1"), None);

        registry.register("API_1", "https://api.example.com");
        assert_eq!(registry.lookup("API_1"), Some("https://api.example.com"));
        assert_eq!(registry.error_mode("API_1"), ErrorMode::AutoReconnect);

        registry.register("API_1", "wss://feed.example.com");
        assert_eq!(registry.lookup("API_1"), Some("wss://feed.example.com"));
    }

    #[test]
    fn test_error_mode_before_registration_is_kept() {
        let mut registry = EndpointRegistry::new();
        registry.set_error_mode("API_1", ErrorMode::HatOnly);

        assert!(!registry.is_registered("API_1"));
        assert!(registry.config("API_1").is_none());
        assert!(registry.labels().is_empty());

        registry.register("API_1", "https://api.example.com");
        let config = registry.config("API_1").unwrap();
        assert_eq!(config.error_mode, ErrorMode::HatOnly);
        assert_eq!(config.label, "API_1");
    }

    #[test]
    fn test_reregistration_keeps_error_mode() {
        let mut registry = EndpointRegistry::new();
        registry.register("feed", "ws://a");
        registry.set_error_mode("feed", ErrorMode::HatOnly);
        registry.register("feed", "ws://b");

        assert_eq!(registry.error_mode("feed"), ErrorMode::HatOnly);
    }

    #[test]
    fn test_labels_sorted() {
        let mut registry = EndpointRegistry::new();
        registry.register("b", "ws://b");
        registry.register("a", "ws://a");
        assert_eq!(registry.labels(), vec!["a".to_string(), "b".to_string()]);
    }
}
