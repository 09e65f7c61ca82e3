//! API Wiring
//!
//! The hosting server publishes which backend the pages should talk to at
//! `/api/config`. Static hosting without that endpoint falls back to
//! hostname detection.

use std::sync::Arc;

use sponsor_core::{Result, SponsorError};
use sponsor_payments::{ApiConfig, ClientConfig, HttpSponsorApi, PageServices};

use crate::browser::{self, BrowserNavigator, LocalStorageTokens};

const CONFIG_PATH: &str = "/api/config";

/// Resolve the backend configuration for this page
pub async fn runtime_config() -> ApiConfig {
    match fetch_config().await {
        Ok(config) => {
            tracing::info!(mode = config.mode.as_str(), base_url = %config.base_url, "API configured by host");
            config
        }
        Err(e) => {
            let hostname = browser::hostname();
            tracing::debug!(error = %e, %hostname, "No host config, detecting from hostname");
            ApiConfig::for_host(&hostname)
        }
    }
}

async fn fetch_config() -> Result<ApiConfig> {
    let url = browser::current_url()
        .and_then(|page| page.join(CONFIG_PATH).ok())
        .ok_or_else(|| SponsorError::Config("page URL unavailable".into()))?;

    let response = reqwest::get(url)
        .await
        .map_err(|e| SponsorError::Config(e.to_string()))?;
    if !response.status().is_success() {
        return Err(SponsorError::Config(format!("HTTP {}", response.status())));
    }

    response
        .json::<ClientConfig>()
        .await
        .map(ApiConfig::from)
        .map_err(|e| SponsorError::Config(e.to_string()))
}

/// Browser-backed collaborators for the flow
pub async fn services() -> Result<PageServices> {
    let api = HttpSponsorApi::new(runtime_config().await)?;
    Ok(PageServices {
        api: Arc::new(api),
        navigator: Arc::new(BrowserNavigator),
        tokens: Arc::new(LocalStorageTokens),
    })
}
