use std::time::Duration;

use gptcard_core::CoreSettings;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPERATURE: f64 = 0.0;
pub const DEFAULT_MAX_TOKENS: u32 = 7;
pub const DEFAULT_MODEL: &str = "text-davinci-003";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Completion service settings as stored by the options page.
///
/// Every field may be missing; the accessors apply the defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GptConfig {
    pub api_key: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub model: Option<String>,
    pub api_base: Option<String>,
}

impl GptConfig {
    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Zero is treated as unset, same as a missing value.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
            .filter(|tokens| *tokens > 0)
            .unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn api_base(&self) -> &str {
        self.api_base
            .as_deref()
            .filter(|base| !base.trim().is_empty())
            .unwrap_or(DEFAULT_API_BASE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentScriptSettings {
    /// Selector of the container all cards live under.
    pub root_selector: String,
    pub core: CoreSettings,
}

impl Default for ContentScriptSettings {
    fn default() -> Self {
        Self {
            root_selector: "#root".to_string(),
            core: CoreSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: GptConfig = ron::from_str("(api_key: \"sk-test\")").unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(config.max_tokens(), DEFAULT_MAX_TOKENS);
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
    }

    #[test]
    fn zero_max_tokens_means_default() {
        let config = GptConfig {
            max_tokens: Some(0),
            ..GptConfig::default()
        };
        assert_eq!(config.max_tokens(), DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn explicit_values_are_kept() {
        let config: GptConfig =
            ron::from_str("(api_key: \"k\", max_tokens: Some(64), temperature: Some(0.7))").unwrap();
        assert_eq!(config.max_tokens(), 64);
        assert_eq!(config.temperature(), 0.7);
    }
}
