//! Application State

use std::path::PathBuf;
use std::sync::Arc;

use sponsor_core::Result;
use sponsor_payments::ApiConfig;

/// Host settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// Directory holding the built frontend (`index.html`, WASM bundle)
    pub static_dir: PathBuf,

    /// Backend the pages are pointed at
    pub api: ApiConfig,
}

impl ServerConfig {
    /// `BIND_ADDR`, `SPONSOR_STATIC_DIR` and the `SPONSOR_API_*` variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            static_dir: std::env::var("SPONSOR_STATIC_DIR")
                .map_or_else(|_| PathBuf::from("static"), PathBuf::from),
            api: ApiConfig::from_env()?,
        })
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(api: ApiConfig) -> Self {
        Self { api: Arc::new(api) }
    }
}
