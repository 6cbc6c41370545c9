use std::str::FromStr;

use serde_derive::Deserialize;

use crate::configs::deserialize_optional_data_or_env;

#[derive(Debug, Clone)]
pub struct GeneralConfig {
    /// Default `tracing` filter, extended by `RUST_LOG` directives
    pub log_filter: String,
    pub log_format: LogFormat,
}

#[derive(Deserialize, PartialEq, Eq, Debug, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format")),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CommonGeneralConfig {
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub log_filter: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub log_format: Option<LogFormat>,
}

impl CommonGeneralConfig {
    pub fn default_log_filter() -> String {
        "info".to_string()
    }
}

impl From<CommonGeneralConfig> for GeneralConfig {
    fn from(common_config: CommonGeneralConfig) -> Self {
        Self {
            log_filter: common_config
                .log_filter
                .unwrap_or_else(CommonGeneralConfig::default_log_filter),
            log_format: common_config.log_format.unwrap_or_default(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        CommonGeneralConfig::default().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_accepts_known_values_only() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("pretty".parse::<LogFormat>().is_err());
    }

    #[test]
    fn defaults_to_compact_info_logs() {
        let config = GeneralConfig::default();
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.log_format, LogFormat::Compact);
    }
}
