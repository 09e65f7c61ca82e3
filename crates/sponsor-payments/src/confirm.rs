//! Return From Hosted Checkout
//!
//! Confirms the payment when the browser comes back and routes the user to
//! the app (deep link) or the web success page. Confirmation failures are
//! terminal and never retried automatically.

use std::sync::Arc;

use url::Url;

use sponsor_core::{
    Platform, Result, ReturnParams, SponsorError, TokenStore, platform::return_instructions,
};

use crate::api::SponsorApi;
use crate::config::FlowConfig;
use crate::navigate::Navigator;

/// Where the user was sent after a confirmed payment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnRoute {
    /// App deep link attempted; `instructions` is set when the app did not take over
    DeepLink {
        url: String,
        platform: Platform,
        instructions: Option<String>,
    },
    /// Navigated to the local success page
    SuccessPage { url: String },
}

impl ReturnRoute {
    pub fn url(&self) -> &str {
        match self {
            Self::DeepLink { url, .. } | Self::SuccessPage { url } => url,
        }
    }
}

/// Handles the browser's return from the hosted checkout
pub struct ReturnHandler {
    api: Arc<dyn SponsorApi>,
    navigator: Arc<dyn Navigator>,
    tokens: Arc<dyn TokenStore>,
    config: FlowConfig,
}

impl ReturnHandler {
    pub fn new(
        api: Arc<dyn SponsorApi>,
        navigator: Arc<dyn Navigator>,
        tokens: Arc<dyn TokenStore>,
        config: FlowConfig,
    ) -> Self {
        Self {
            api,
            navigator,
            tokens,
            config,
        }
    }

    /// Confirm the payment named in `return_url` and route the user onward
    pub async fn handle(&self, return_url: &Url, user_agent: &str) -> Result<ReturnRoute> {
        let params = ReturnParams::from_url(return_url);

        let payment_intent_id = params
            .payment_intent_id
            .as_deref()
            .ok_or_else(|| SponsorError::Confirmation("missing payment intent id".into()))?;
        let token = self
            .tokens
            .load()
            .ok_or_else(|| SponsorError::Confirmation("not signed in".into()))?;

        let renewal_adoption_id = params.renewal_adoption_id();
        let record = self
            .api
            .confirm_payment(payment_intent_id, renewal_adoption_id, &token)
            .await
            .inspect_err(|e| tracing::error!(error = %e, payment_intent_id, "Confirmation failed"))?;

        let adoption_id = record
            .adoption_id
            .or_else(|| params.adoption_id.clone())
            .ok_or_else(|| SponsorError::Confirmation("no adoption id returned".into()))?;
        let renewal = params.renewal;

        tracing::info!(%adoption_id, renewal, "Payment confirmed");
        Ok(self.route(return_url, &adoption_id, renewal, user_agent).await)
    }

    async fn route(
        &self,
        return_url: &Url,
        adoption_id: &str,
        renewal: bool,
        user_agent: &str,
    ) -> ReturnRoute {
        let platform = Platform::from_user_agent(user_agent);
        let links = &self.config.app_links;

        if let Some(deep_link) = links.deep_link(platform, adoption_id, renewal) {
            tracing::info!(?platform, url = %deep_link, "Opening app");
            self.navigator.assign(&deep_link);
            self.navigator.pause(self.config.app_handoff_timeout).await;

            // The app takes focus when it opens
            let instructions = self
                .navigator
                .has_focus()
                .then(|| return_instructions(renewal));
            if instructions.is_some() {
                tracing::info!("App did not open, showing return instructions");
            }

            return ReturnRoute::DeepLink {
                url: deep_link,
                platform,
                instructions,
            };
        }

        let url = links.success_page_url(return_url, adoption_id, renewal);
        self.navigator.assign(&url);
        ReturnRoute::SuccessPage { url }
    }
}
