//! API and Flow Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sponsor_core::{AppLinks, Result, SponsorError};

/// Which deployment of the remote API to talk to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    Local,
    Dev,
    #[serde(rename = "prod")]
    Production,
}

impl ApiMode {
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Local => "http://localhost:3000/dev/api",
            Self::Dev => "https://api-dev.cloudrescuefoundation.org/api",
            Self::Production => "https://api.cloudrescuefoundation.org/api",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Production => "prod",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Some(Self::Local),
            "dev" | "development" => Some(Self::Dev),
            "prod" | "production" => Some(Self::Production),
            _ => None,
        }
    }

    /// Local and private-network hosts use the dev API (test payment credentials)
    pub fn detect(hostname: &str) -> Self {
        let is_local = hostname == "localhost"
            || hostname == "127.0.0.1"
            || hostname.starts_with("192.168.")
            || hostname.starts_with("10.");
        if is_local { Self::Dev } else { Self::Production }
    }
}

/// Remote API client configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub base_url: String,
    pub mode: ApiMode,
    /// Request timeout in seconds (ignored in the browser)
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::for_mode(ApiMode::Production)
    }
}

impl ApiConfig {
    pub fn for_mode(mode: ApiMode) -> Self {
        Self {
            base_url: mode.base_url().into(),
            mode,
            timeout_secs: 30,
        }
    }

    /// Auto-detect from the page's hostname
    pub fn for_host(hostname: &str) -> Self {
        Self::for_mode(ApiMode::detect(hostname))
    }

    /// Create from environment variables
    ///
    /// `SPONSOR_API_MODE` forces a deployment, `SPONSOR_API_BASE_URL`
    /// overrides the URL outright, `SPONSOR_HTTP_TIMEOUT_SECS` sets the timeout.
    pub fn from_env() -> Result<Self> {
        let mode = match std::env::var("SPONSOR_API_MODE") {
            Ok(raw) => ApiMode::parse(&raw)
                .ok_or_else(|| SponsorError::Config(format!("unknown SPONSOR_API_MODE: {raw}")))?,
            Err(_) => ApiMode::Production,
        };

        let mut config = Self::for_mode(mode);

        if let Ok(base_url) = std::env::var("SPONSOR_API_BASE_URL") {
            url::Url::parse(&base_url).map_err(|e| {
                SponsorError::Config(format!("invalid SPONSOR_API_BASE_URL: {e}"))
            })?;
            config.base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Some(timeout) = std::env::var("SPONSOR_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
        {
            config.timeout_secs = timeout;
        }

        Ok(config)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Backend settings the host publishes to the browser
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub api_base_url: String,
    pub mode: ApiMode,
}

impl From<&ApiConfig> for ClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            api_base_url: config.base_url.clone(),
            mode: config.mode,
        }
    }
}

impl From<ClientConfig> for ApiConfig {
    fn from(client: ClientConfig) -> Self {
        Self {
            base_url: client.api_base_url,
            ..Self::for_mode(client.mode)
        }
    }
}

/// Timing and routing knobs of the checkout flow
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// How long to wait before re-forcing the checkout redirect
    pub redirect_grace: Duration,

    /// How long the app gets to take focus after a deep link
    pub app_handoff_timeout: Duration,

    pub app_links: AppLinks,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            redirect_grace: Duration::from_millis(100),
            app_handoff_timeout: Duration::from_secs(2),
            app_links: AppLinks::default(),
        }
    }
}

impl FlowConfig {
    /// No waiting; for tests and harnesses
    pub fn immediate() -> Self {
        Self {
            redirect_grace: Duration::ZERO,
            app_handoff_timeout: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_detection() {
        assert_eq!(ApiMode::detect("localhost"), ApiMode::Dev);
        assert_eq!(ApiMode::detect("192.168.1.20"), ApiMode::Dev);
        assert_eq!(ApiMode::detect("10.0.0.4"), ApiMode::Dev);
        assert_eq!(ApiMode::detect("cloudrescuefoundation.org"), ApiMode::Production);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(ApiMode::parse("PROD"), Some(ApiMode::Production));
        assert_eq!(ApiMode::parse("local"), Some(ApiMode::Local));
        assert_eq!(ApiMode::parse("staging"), None);
    }

    #[test]
    fn test_endpoint_join() {
        let mut config = ApiConfig::for_mode(ApiMode::Dev);
        assert_eq!(
            config.endpoint("/public/dogs/d1"),
            "https://api-dev.cloudrescuefoundation.org/api/public/dogs/d1"
        );
        config.base_url.push('/');
        assert_eq!(
            config.endpoint("/auth/me"),
            "https://api-dev.cloudrescuefoundation.org/api/auth/me"
        );
    }

    #[test]
    fn test_client_config_wire_format() {
        let client = ClientConfig::from(&ApiConfig::for_mode(ApiMode::Local));
        let json = serde_json::to_value(&client).unwrap();
        assert_eq!(json["apiBaseUrl"], "http://localhost:3000/dev/api");
        assert_eq!(json["mode"], "local");

        let back: ApiConfig = serde_json::from_value::<ClientConfig>(json).unwrap().into();
        assert_eq!(back, ApiConfig::for_mode(ApiMode::Local));
    }
}
