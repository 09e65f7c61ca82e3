//! Browser Navigation Seam
//!
//! The flow never touches `window.location` directly; the UI layer supplies
//! a [`Navigator`] and tests supply `RecordingNavigator`.

use std::time::Duration;

use async_trait::async_trait;

/// Browser navigation and timing primitives used by the flow
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Navigator: Send + Sync {
    /// Current location
    fn current_url(&self) -> String;

    /// Navigate, keeping the current page in history
    fn assign(&self, url: &str);

    /// Navigate, replacing the current history entry
    fn replace(&self, url: &str);

    /// Whether this page still has focus (an app that opened would take it)
    fn has_focus(&self) -> bool;

    /// Suspend the calling step without blocking the UI
    async fn pause(&self, duration: Duration);
}

/// Navigate to `target`; if the location has not changed after `grace`, force it.
///
/// Forcing twice to the same URL is harmless, the target never changes.
pub async fn redirect_with_grace(navigator: &dyn Navigator, target: &str, grace: Duration) {
    tracing::info!(url = target, "Redirecting to hosted checkout");
    navigator.assign(target);
    navigator.pause(grace).await;

    if navigator.current_url() != target {
        tracing::warn!(url = target, "Redirect did not occur, forcing");
        navigator.replace(target);
    }
}
