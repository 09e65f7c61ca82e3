//! Browser Bindings
//!
//! `window.location`, `localStorage` and timers behind the flow's seams.
//! Nothing here holds a JS handle, so the types stay `Send + Sync`.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;
use wasm_bindgen::JsValue;

use sponsor_core::{Result, SponsorError, TokenStore, token::AUTH_TOKEN_KEY};
use sponsor_payments::Navigator;

/// Current page URL
pub fn current_url() -> Option<Url> {
    let href = web_sys::window()?.location().href().ok()?;
    Url::parse(&href).ok()
}

pub fn user_agent() -> String {
    web_sys::window()
        .and_then(|w| w.navigator().user_agent().ok())
        .unwrap_or_default()
}

pub fn hostname() -> String {
    web_sys::window()
        .and_then(|w| w.location().hostname().ok())
        .unwrap_or_default()
}

/// Rewrite the address bar without navigating
pub fn replace_history(url: &Url) {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    if history
        .replace_state_with_url(&JsValue::NULL, "", Some(url.as_str()))
        .is_err()
    {
        tracing::warn!("history.replaceState failed");
    }
}

/// `window.location` navigator
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Navigator for BrowserNavigator {
    fn current_url(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().href().ok())
            .unwrap_or_default()
    }

    fn assign(&self, url: &str) {
        if let Some(window) = web_sys::window() {
            if window.location().assign(url).is_err() {
                tracing::warn!(url, "location.assign failed");
            }
        }
    }

    fn replace(&self, url: &str) {
        if let Some(window) = web_sys::window() {
            if window.location().replace(url).is_err() {
                tracing::warn!(url, "location.replace failed");
            }
        }
    }

    fn has_focus(&self) -> bool {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.has_focus().ok())
            .unwrap_or(true)
    }

    async fn pause(&self, duration: Duration) {
        #[cfg(target_arch = "wasm32")]
        set_timeout(duration).await;
        #[cfg(not(target_arch = "wasm32"))]
        let _ = duration;
    }
}

/// Resolve after `duration` via `setTimeout`
#[cfg(target_arch = "wasm32")]
async fn set_timeout(duration: Duration) {
    let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window().is_some_and(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                .is_ok()
        });
        if !scheduled {
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Token persisted in `localStorage` under `authToken`
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorageTokens;

impl LocalStorageTokens {
    fn storage() -> Result<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or_else(|| SponsorError::Storage("localStorage unavailable".into()))
    }
}

impl TokenStore for LocalStorageTokens {
    fn load(&self) -> Option<String> {
        Self::storage().ok()?.get_item(AUTH_TOKEN_KEY).ok().flatten()
    }

    fn save(&self, token: &str) -> Result<()> {
        Self::storage()?
            .set_item(AUTH_TOKEN_KEY, token)
            .map_err(|_| SponsorError::Storage("localStorage.setItem failed".into()))
    }

    fn clear(&self) -> Result<()> {
        Self::storage()?
            .remove_item(AUTH_TOKEN_KEY)
            .map_err(|_| SponsorError::Storage("localStorage.removeItem failed".into()))
    }
}
