//! Runtime configuration for order presentation.

use std::env;
use std::time::Duration;

/// How long a copy confirmation stays visible before auto-dismissing.
const DEFAULT_NOTICE_DISMISS_MS: u64 = 3_000;

/// Presentation configuration supplied by the host at composition time.
#[derive(Debug, Clone)]
pub struct OrderUiConfig {
    /// Display name of the connected LSP, used in failure messages.
    pub lsp_display_name: Option<String>,
    /// Auto-dismiss duration for transient confirmation notices.
    pub notice_dismiss: Duration,
}

impl Default for OrderUiConfig {
    fn default() -> Self {
        Self {
            lsp_display_name: None,
            notice_dismiss: Duration::from_millis(DEFAULT_NOTICE_DISMISS_MS),
        }
    }
}

impl OrderUiConfig {
    /// Build a configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    ///
    /// Recognized variables: `LSPS1_LSP_DISPLAY_NAME`,
    /// `LSPS1_NOTICE_DISMISS_MS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = env::var("LSPS1_LSP_DISPLAY_NAME") {
            config.lsp_display_name = non_empty(&name);
        }

        if let Ok(raw) = env::var("LSPS1_NOTICE_DISMISS_MS") {
            if let Some(dismiss) = parse_millis(&raw) {
                config.notice_dismiss = dismiss;
            }
        }

        config
    }

    /// LSP name to show in user-facing messages.
    pub fn lsp_name(&self) -> &str {
        self.lsp_display_name.as_deref().unwrap_or("the LSP")
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_millis(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{OrderUiConfig, non_empty, parse_millis};

    #[test]
    fn default_config_uses_generic_lsp_name() {
        let config = OrderUiConfig::default();
        assert_eq!(config.lsp_name(), "the LSP");
        assert_eq!(config.notice_dismiss, Duration::from_millis(3_000));
    }

    #[test]
    fn configured_lsp_name_is_preferred() {
        let config = OrderUiConfig {
            lsp_display_name: Some("Olympus".to_string()),
            ..OrderUiConfig::default()
        };
        assert_eq!(config.lsp_name(), "Olympus");
    }

    #[test]
    fn non_empty_rejects_blank_values() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty(" Olympus "), Some("Olympus".to_string()));
    }

    #[test]
    fn parse_millis_rejects_garbage() {
        assert_eq!(parse_millis("1500"), Some(Duration::from_millis(1_500)));
        assert_eq!(parse_millis("fast"), None);
        assert_eq!(parse_millis("-1"), None);
    }
}
