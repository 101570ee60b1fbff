use engine::app::RunMode;
use error_stack::{Report, ResultExt};
use std::path::PathBuf;

pub const PORT_ENV: &str = "PORT";
pub const SEED_FILE_ENV: &str = "PORTAL_SEED_FILE";
pub const INTENT_FILE_ENV: &str = "PORTAL_INTENT_FILE";
pub const METRICS_ENABLED_ENV: &str = "PORTAL_METRICS_ENABLED";
pub const RUN_MODE_ENV: &str = "PORTAL_ENV";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SEED_FILE: &str = "data/seed-data.json";
const DEFAULT_INTENT_FILE: &str = "data/intent-mapping.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535")]
    Port,
    #[error("PORTAL_METRICS_ENABLED must be true or false")]
    MetricsEnabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub seed_file: PathBuf,
    pub intent_file: PathBuf,
    pub metrics_enabled: bool,
    pub run_mode: RunMode,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Report<ConfigError>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset keys take their defaults,
    /// set keys must parse.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Report<ConfigError>> {
        let port = match lookup(PORT_ENV) {
            Some(port) => port
                .trim()
                .parse()
                .change_context(ConfigError::Port)
                .attach_with(|| format!("value: {port}"))?,
            None => DEFAULT_PORT,
        };

        let metrics_enabled = match lookup(METRICS_ENABLED_ENV) {
            Some(value) => parse_flag(&value)
                .ok_or_else(|| Report::new(ConfigError::MetricsEnabled))
                .attach_with(|| format!("value: {value}"))?,
            None => false,
        };

        Ok(Self {
            port,
            seed_file: lookup(SEED_FILE_ENV)
                .unwrap_or_else(|| DEFAULT_SEED_FILE.to_string())
                .into(),
            intent_file: lookup(INTENT_FILE_ENV)
                .unwrap_or_else(|| DEFAULT_INTENT_FILE.to_string())
                .into(),
            metrics_enabled,
            run_mode: lookup(RUN_MODE_ENV)
                .map(|mode| RunMode::parse(&mode))
                .unwrap_or_default(),
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn unset_variables_take_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(
            AppConfig {
                port: 3000,
                seed_file: PathBuf::from("data/seed-data.json"),
                intent_file: PathBuf::from("data/intent-mapping.json"),
                metrics_enabled: false,
                run_mode: RunMode::Production,
            },
            config
        );
    }

    #[test]
    fn set_variables_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            (PORT_ENV, "8080"),
            (SEED_FILE_ENV, "/srv/seed.json"),
            (INTENT_FILE_ENV, "/srv/intents.json"),
            (METRICS_ENABLED_ENV, "TRUE"),
            (RUN_MODE_ENV, "development"),
        ]))
        .unwrap();

        assert_eq!(8080, config.port);
        assert_eq!(PathBuf::from("/srv/seed.json"), config.seed_file);
        assert_eq!(PathBuf::from("/srv/intents.json"), config.intent_file);
        assert!(config.metrics_enabled);
        assert_eq!(RunMode::Development, config.run_mode);
    }

    #[test]
    fn unknown_run_mode_is_production() {
        let config = AppConfig::from_lookup(lookup(&[(RUN_MODE_ENV, "staging")])).unwrap();

        assert_eq!(RunMode::Production, config.run_mode);
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(PORT_ENV, "http")])).unwrap_err();

        assert!(matches!(err.current_context(), ConfigError::Port));
    }

    #[test]
    fn unknown_metrics_flag_is_rejected() {
        let err =
            AppConfig::from_lookup(lookup(&[(METRICS_ENABLED_ENV, "sometimes")])).unwrap_err();

        assert!(matches!(err.current_context(), ConfigError::MetricsEnabled));
    }
}
