use reqwest::Url;
use service_core::config::{self as core_config, get_env, get_optional_env};
use service_core::error::AppError;
use std::time::Duration;

const DEFAULT_DISCOVERY_VERSION: &str = "2023-03-31";
const DEFAULT_WATSONX_URL: &str = "https://us-south.ml.cloud.ibm.com";
const DEFAULT_WATSONX_MODEL_ID: &str = "ibm/granite-3-8b-instruct";
const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub common: core_config::Config,
    /// `None` when any required Discovery variable is missing or invalid.
    pub discovery: Option<DiscoveryConfig>,
    /// `None` when any required watsonx.ai variable is missing or invalid.
    pub generation: Option<GenerationConfig>,
    pub iam_url: String,
    pub gateway_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub api_key: String,
    pub url: String,
    pub project_id: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub url: String,
    pub project_id: String,
    pub model_id: String,
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let gateway_timeout =
            Duration::from_secs(parse_timeout_secs(get_optional_env("GATEWAY_TIMEOUT_SECS")));

        let iam_url = get_env("IAM_URL", Some(DEFAULT_IAM_URL))?;
        let (iam_url, discovery, generation) = match parse_base_url("IAM_URL", &iam_url) {
            Some(iam_url) => (
                iam_url,
                DiscoveryConfig::from_env()?,
                GenerationConfig::from_env()?,
            ),
            None => {
                tracing::warn!("IAM_URL is invalid; hosted gateways are disabled");
                (iam_url, None, None)
            }
        };

        Ok(ChatConfig {
            common,
            discovery,
            generation,
            iam_url,
            gateway_timeout,
        })
    }
}

impl DiscoveryConfig {
    fn from_env() -> Result<Option<Self>, AppError> {
        let (Some(api_key), Some(url), Some(project_id)) = (
            get_optional_env("DISCOVERY_API_KEY"),
            get_optional_env("DISCOVERY_URL"),
            get_optional_env("DISCOVERY_PROJECT_ID"),
        ) else {
            tracing::warn!("Discovery credentials not set; chat will answer as not configured");
            return Ok(None);
        };

        let version = get_env("DISCOVERY_VERSION", Some(DEFAULT_DISCOVERY_VERSION))?;
        Ok(Self::new(api_key, &url, project_id, version))
    }

    /// `None` when `url` is not an absolute http(s) URL.
    pub fn new(api_key: String, url: &str, project_id: String, version: String) -> Option<Self> {
        let Some(url) = parse_base_url("DISCOVERY_URL", url) else {
            tracing::warn!("Discovery URL is invalid; chat will answer as not configured");
            return None;
        };

        Some(DiscoveryConfig {
            api_key,
            url,
            project_id,
            version,
        })
    }
}

impl GenerationConfig {
    fn from_env() -> Result<Option<Self>, AppError> {
        let (Some(api_key), Some(project_id)) = (
            get_optional_env("WATSONX_API_KEY"),
            get_optional_env("WATSONX_PROJECT_ID"),
        ) else {
            tracing::warn!("watsonx.ai credentials not set; chat will use keyword answers");
            return Ok(None);
        };

        let Some(url) = parse_base_url(
            "WATSONX_URL",
            &get_env("WATSONX_URL", Some(DEFAULT_WATSONX_URL))?,
        ) else {
            tracing::warn!("watsonx.ai URL is invalid; chat will use keyword answers");
            return Ok(None);
        };

        Ok(Some(GenerationConfig {
            api_key,
            url,
            project_id,
            model_id: get_env("WATSONX_MODEL_ID", Some(DEFAULT_WATSONX_MODEL_ID))?,
        }))
    }
}

/// Validate an absolute `http`/`https` base URL and strip trailing slashes.
pub fn parse_base_url(key: &str, raw: &str) -> Option<String> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Some(raw.trim_end_matches('/').to_string())
        }
        Ok(url) => {
            tracing::warn!(key, scheme = url.scheme(), "Ignoring non-HTTP URL");
            None
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed URL");
            None
        }
    }
}

/// Positive whole seconds, or the default with a warning.
fn parse_timeout_secs(raw: Option<String>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_GATEWAY_TIMEOUT_SECS;
    };

    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        Ok(_) => {
            tracing::warn!(
                default = DEFAULT_GATEWAY_TIMEOUT_SECS,
                "GATEWAY_TIMEOUT_SECS must be positive; using default"
            );
            DEFAULT_GATEWAY_TIMEOUT_SECS
        }
        Err(e) => {
            tracing::warn!(
                value = %raw,
                error = %e,
                default = DEFAULT_GATEWAY_TIMEOUT_SECS,
                "GATEWAY_TIMEOUT_SECS is not a number; using default"
            );
            DEFAULT_GATEWAY_TIMEOUT_SECS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_discovery_url_is_unavailable() {
        let config = DiscoveryConfig::new(
            "key".to_string(),
            "not a url",
            "proj".to_string(),
            DEFAULT_DISCOVERY_VERSION.to_string(),
        );
        assert!(config.is_none());
    }

    #[test]
    fn schemeless_host_is_rejected() {
        assert_eq!(parse_base_url("DISCOVERY_URL", "localhost:8080"), None);
        assert_eq!(parse_base_url("DISCOVERY_URL", "ftp://example.com"), None);
    }

    #[test]
    fn valid_url_loses_trailing_slash() {
        assert_eq!(
            parse_base_url("IAM_URL", "https://iam.cloud.ibm.com/").as_deref(),
            Some("https://iam.cloud.ibm.com")
        );
    }

    #[test]
    fn discovery_config_keeps_valid_url() {
        let config = DiscoveryConfig::new(
            "key".to_string(),
            "https://api.us-south.discovery.watson.cloud.ibm.com/instances/abc/",
            "proj".to_string(),
            DEFAULT_DISCOVERY_VERSION.to_string(),
        )
        .unwrap();
        assert_eq!(
            config.url,
            "https://api.us-south.discovery.watson.cloud.ibm.com/instances/abc"
        );
    }

    #[test]
    fn timeout_defaults_when_unset() {
        assert_eq!(parse_timeout_secs(None), DEFAULT_GATEWAY_TIMEOUT_SECS);
    }

    #[test]
    fn timeout_rejects_zero_and_garbage() {
        assert_eq!(
            parse_timeout_secs(Some("0".to_string())),
            DEFAULT_GATEWAY_TIMEOUT_SECS
        );
        assert_eq!(
            parse_timeout_secs(Some("soon".to_string())),
            DEFAULT_GATEWAY_TIMEOUT_SECS
        );
    }

    #[test]
    fn timeout_accepts_positive_seconds() {
        assert_eq!(parse_timeout_secs(Some("30".to_string())), 30);
    }
}
