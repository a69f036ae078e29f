//! Provider configuration
//!
//! Every setting is read from the provider block first and falls back to an
//! environment variable. Unknown values are rejected: the client cannot be
//! built from values that are only known after apply.

use crate::api::DEFAULT_BASE_URL;
use secrecy::SecretString;
use std::time::Duration;
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::value::{FromDynamic, Value};

pub const ENV_API_KEY: &str = "MERAKI_DASHBOARD_API_KEY";
pub const ENV_BASE_URL: &str = "MERAKI_BASE_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "MERAKI_REQUEST_TIMEOUT";
pub const ENV_INSECURE: &str = "MERAKI_INSECURE";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: i64 = 60;
pub const DEFAULT_NETWORK_DELETE_RETRY_INTERVAL_SECS: i64 = 1;

/// Resolved provider settings
pub struct MerakiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub request_timeout: Duration,
    pub network_delete_retry_interval: Duration,
    pub insecure: bool,
}

impl std::fmt::Debug for MerakiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerakiConfig")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field(
                "network_delete_retry_interval",
                &self.network_delete_retry_interval,
            )
            .field("insecure", &self.insecure)
            .finish_non_exhaustive()
    }
}

impl MerakiConfig {
    pub fn from_config(config: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let mut diagnostics = vec![];

        let api_key = read::<String>(config, "api_key", &mut diagnostics)
            .or_else(|| env_string(ENV_API_KEY))
            .filter(|key| !key.is_empty());

        let base_url = read::<String>(config, "base_url", &mut diagnostics)
            .or_else(|| env_string(ENV_BASE_URL))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let request_timeout = match read::<i64>(config, "request_timeout", &mut diagnostics) {
            Some(secs) => Some(secs),
            None => env_parsed::<i64>(ENV_REQUEST_TIMEOUT, &mut diagnostics),
        }
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout <= 0 {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid request_timeout",
                    format!("request_timeout must be positive, got {}", request_timeout),
                )
                .with_attribute(AttributePath::new("request_timeout")),
            );
        }

        let retry_interval =
            read::<i64>(config, "network_delete_retry_interval", &mut diagnostics)
                .unwrap_or(DEFAULT_NETWORK_DELETE_RETRY_INTERVAL_SECS);
        if retry_interval < 0 {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid network_delete_retry_interval",
                    format!(
                        "network_delete_retry_interval must not be negative, got {}",
                        retry_interval
                    ),
                )
                .with_attribute(AttributePath::new("network_delete_retry_interval")),
            );
        }

        let insecure = match read::<bool>(config, "insecure", &mut diagnostics) {
            Some(insecure) => Some(insecure),
            None => env_parsed::<bool>(ENV_INSECURE, &mut diagnostics),
        }
        .unwrap_or(false);

        let api_key = match api_key {
            Some(key) => key,
            None => {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing API key",
                        format!(
                            "api_key is required (set in provider config or {} env var)",
                            ENV_API_KEY
                        ),
                    )
                    .with_attribute(AttributePath::new("api_key")),
                );
                return Err(diagnostics);
            }
        };

        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url,
            request_timeout: Duration::from_secs(request_timeout as u64),
            network_delete_retry_interval: Duration::from_secs(retry_interval as u64),
            insecure,
        })
    }
}

fn read<T: FromDynamic>(
    config: &DynamicValue,
    name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<T> {
    let path = AttributePath::new(name);
    match config.get::<T>(&path) {
        Ok(Value::Known(value)) => Some(value),
        Ok(Value::Null) => None,
        Ok(Value::Unknown) => {
            diagnostics.push(
                Diagnostic::error(
                    format!("Unknown value for {}", name),
                    format!(
                        "The provider cannot be configured while {} is unknown; \
                         set it to a value known before apply",
                        name
                    ),
                )
                .with_attribute(path),
            );
            None
        }
        Err(e) => {
            diagnostics.push(
                Diagnostic::error(format!("Invalid value for {}", name), e.to_string())
                    .with_attribute(path),
            );
            None
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            diagnostics.push(Diagnostic::error(
                format!("Invalid {} environment variable", key),
                format!("Could not parse '{}'", raw),
            ));
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use tfplug::types::Dynamic;
    use tfplug::value::ObjectBuilder;

    fn clear_env() {
        for key in [ENV_API_KEY, ENV_BASE_URL, ENV_REQUEST_TIMEOUT, ENV_INSECURE] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn config_values_win_over_environment() {
        clear_env();
        std::env::set_var(ENV_API_KEY, "from-env");
        std::env::set_var(ENV_BASE_URL, "https://env.example.com/api/v1");

        let config: DynamicValue = ObjectBuilder::new()
            .set("api_key", "from-config")
            .set("request_timeout", 5i64)
            .set("insecure", true)
            .into();
        let resolved = MerakiConfig::from_config(&config).unwrap();

        assert_eq!(resolved.api_key.expose_secret(), "from-config");
        assert_eq!(resolved.base_url, "https://env.example.com/api/v1");
        assert_eq!(resolved.request_timeout, Duration::from_secs(5));
        assert!(resolved.insecure);
        clear_env();
    }

    #[test]
    #[serial]
    fn environment_fills_missing_values() {
        clear_env();
        std::env::set_var(ENV_API_KEY, "from-env");
        std::env::set_var(ENV_REQUEST_TIMEOUT, "15");
        std::env::set_var(ENV_INSECURE, "true");

        let resolved = MerakiConfig::from_config(&DynamicValue::object()).unwrap();

        assert_eq!(resolved.api_key.expose_secret(), "from-env");
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.request_timeout, Duration::from_secs(15));
        assert_eq!(resolved.network_delete_retry_interval, Duration::from_secs(1));
        assert!(resolved.insecure);
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_api_key_is_reported_on_the_attribute() {
        clear_env();

        let diagnostics = MerakiConfig::from_config(&DynamicValue::object()).unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].detail.contains("api_key is required"));
        assert_eq!(
            diagnostics[0].attribute.as_ref().unwrap().to_string(),
            "api_key"
        );
    }

    #[test]
    #[serial]
    fn unknown_values_are_rejected() {
        clear_env();

        let config: DynamicValue = ObjectBuilder::new()
            .set("api_key", "key")
            .set("base_url", Dynamic::Unknown)
            .into();
        let diagnostics = MerakiConfig::from_config(&config).unwrap_err();

        assert!(diagnostics[0].summary.contains("Unknown value for base_url"));
    }

    #[test]
    #[serial]
    fn bad_environment_values_are_errors() {
        clear_env();
        std::env::set_var(ENV_API_KEY, "key");
        std::env::set_var(ENV_REQUEST_TIMEOUT, "soon");

        let diagnostics = MerakiConfig::from_config(&DynamicValue::object()).unwrap_err();
        assert!(diagnostics[0].summary.contains(ENV_REQUEST_TIMEOUT));
        clear_env();
    }

    #[test]
    #[serial]
    fn non_positive_timeout_is_rejected() {
        clear_env();
        let config: DynamicValue = ObjectBuilder::new()
            .set("api_key", "key")
            .set("request_timeout", 0i64)
            .into();
        let diagnostics = MerakiConfig::from_config(&config).unwrap_err();
        assert_eq!(
            diagnostics[0].attribute.as_ref().unwrap().to_string(),
            "request_timeout"
        );
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = MerakiConfig {
            api_key: SecretString::from("super-secret"),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            network_delete_retry_interval: Duration::from_secs(1),
            insecure: false,
        };
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
