//! HTTP Sponsorship API Client
//!
//! reqwest-backed implementation of [`SponsorApi`] for the rescue backend.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};

use sponsor_core::{
    Adoption, CheckoutSessionHandle, ConfirmationRecord, Dog, PaymentIntentRecord, Result,
    SponsorError, SponsorshipSubject,
    model::{AdoptionEnvelope, DogEnvelope},
};

use crate::api::{CheckoutSessionRequest, SponsorApi, TokenStatus};
use crate::config::ApiConfig;

/// Why a call failed, before it is mapped to a flow error kind
#[derive(Debug)]
struct ApiFailure {
    status: Option<StatusCode>,
    message: String,
}

impl ApiFailure {
    fn transport(err: &reqwest::Error) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
        }
    }

    /// Message from the error body, else the supplied fallback
    fn message_or(&self, fallback: &str) -> String {
        if self.status.is_none() || self.message.is_empty() {
            fallback.to_string()
        } else {
            self.message.clone()
        }
    }

    fn status_code(&self) -> String {
        self.status
            .map_or_else(|| "network error".into(), |s| s.as_u16().to_string())
    }
}

/// HTTP client for the rescue backend
pub struct HttpSponsorApi {
    client: Client,
    config: ApiConfig,
}

impl HttpSponsorApi {
    /// Create a new client
    pub fn new(config: ApiConfig) -> Result<Self> {
        let builder = Client::builder();

        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(std::time::Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| SponsorError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ApiConfig::from_env()?)
    }

    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn authorized(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and decode a JSON body, folding every failure into `ApiFailure`
    async fn send_json(request: RequestBuilder) -> std::result::Result<Value, ApiFailure> {
        let response = request.send().await.map_err(|e| ApiFailure::transport(&e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiFailure {
                status: Some(status),
                message: error_message(&body, status),
            });
        }

        response.json::<Value>().await.map_err(|e| ApiFailure {
            status: Some(status),
            message: format!("invalid response body: {e}"),
        })
    }
}

/// Pull `message`/`error` out of an error body; fall back to the raw text or status
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        let field = parsed
            .get("message")
            .or_else(|| parsed.get("error"))
            .and_then(Value::as_str);
        if let Some(message) = field {
            return message.to_string();
        }
    }

    let text = body.trim();
    if text.is_empty() {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )
    } else {
        text.to_string()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl SponsorApi for HttpSponsorApi {
    async fn fetch_dog(&self, dog_id: &str) -> Result<Dog> {
        let url = self.config.endpoint(&format!("/public/dogs/{dog_id}"));
        tracing::debug!(%url, "Fetching dog");

        let body = Self::send_json(self.client.get(&url)).await.map_err(|f| {
            tracing::error!(dog_id, status = %f.status_code(), error = %f.message, "Dog fetch failed");
            SponsorError::Load(format!(
                "Failed to load dog information (HTTP {})",
                f.status_code()
            ))
        })?;

        serde_json::from_value::<DogEnvelope>(body)
            .map(DogEnvelope::into_dog)
            .map_err(|e| SponsorError::Load(format!("Failed to load dog information ({e})")))
    }

    async fn fetch_adoption(&self, adoption_id: &str, token: Option<&str>) -> Result<Adoption> {
        let url = self.config.endpoint(&format!("/adoptions/{adoption_id}"));
        let request = Self::authorized(self.client.get(&url), token);

        let body = Self::send_json(request).await.map_err(|f| {
            tracing::error!(adoption_id, status = %f.status_code(), error = %f.message, "Adoption fetch failed");
            SponsorError::Load("Failed to load adoption information".into())
        })?;

        serde_json::from_value::<AdoptionEnvelope>(body)
            .map(AdoptionEnvelope::into_adoption)
            .map_err(|e| SponsorError::Load(format!("Failed to load adoption information ({e})")))
    }

    async fn create_payment_intent(
        &self,
        subject: &SponsorshipSubject,
        token: &str,
    ) -> Result<PaymentIntentRecord> {
        let (path, body) = match subject {
            SponsorshipSubject::Renewal { adoption_id, weeks } => {
                (format!("/adoptions/{adoption_id}/renew"), json!({ "weeks": weeks }))
            }
            SponsorshipSubject::Specific { dog_id } => {
                ("/adoptions/specific".into(), json!({ "dogId": dog_id }))
            }
            SponsorshipSubject::SizeTier { dog_id } => {
                ("/adoptions/sized".into(), json!({ "dogId": dog_id }))
            }
            SponsorshipSubject::Random => ("/adoptions/random".into(), json!({})),
        };

        let url = self.config.endpoint(&path);
        tracing::info!(%url, mode = %subject.mode(), "Creating payment intent");

        let response = Self::send_json(self.client.post(&url).bearer_auth(token).json(&body))
            .await
            .map_err(|f| {
                tracing::error!(status = %f.status_code(), error = %f.message, "Payment intent creation failed");
                let fallback = if subject.is_renewal() {
                    "Failed to create renewal payment".to_string()
                } else {
                    format!("Failed to create payment intent (HTTP {})", f.status_code())
                };
                SponsorError::PaymentInitialization(f.message_or(&fallback))
            })?;

        PaymentIntentRecord::from_response(&response).ok_or_else(|| {
            SponsorError::PaymentInitialization(
                "Failed to initialize payment - missing paymentIntentId".into(),
            )
        })
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
        token: &str,
    ) -> Result<CheckoutSessionHandle> {
        let url = self.config.endpoint("/payments/create-checkout-session");
        tracing::info!(payment_intent_id = %request.payment_intent_id, "Creating checkout session");

        let response = Self::send_json(self.client.post(&url).bearer_auth(token).json(request))
            .await
            .map_err(|f| {
                tracing::error!(status = %f.status_code(), error = %f.message, "Checkout session creation failed");
                SponsorError::CheckoutSession(f.message_or("Failed to create checkout session"))
            })?;

        match serde_json::from_value::<CheckoutSessionHandle>(response) {
            Ok(handle) if !handle.redirect_url.is_empty() => Ok(handle),
            _ => Err(SponsorError::CheckoutSession(
                "Failed to get checkout URL from server".into(),
            )),
        }
    }

    async fn confirm_payment(
        &self,
        payment_intent_id: &str,
        renewal_adoption_id: Option<&str>,
        token: &str,
    ) -> Result<ConfirmationRecord> {
        let path = renewal_adoption_id.map_or_else(
            || "/adoptions/confirm".to_string(),
            |id| format!("/adoptions/{id}/confirm-renewal"),
        );
        let url = self.config.endpoint(&path);
        tracing::info!(%url, payment_intent_id, "Confirming payment");

        let body = json!({ "paymentIntentId": payment_intent_id });
        let response = Self::send_json(self.client.post(&url).bearer_auth(token).json(&body))
            .await
            .map_err(|f| {
                tracing::error!(status = %f.status_code(), error = %f.message, "Payment confirmation failed");
                SponsorError::Confirmation(f.message_or("Failed to confirm payment"))
            })?;

        Ok(ConfirmationRecord::from_response(&response))
    }

    async fn verify_token(&self, token: &str) -> Result<TokenStatus> {
        let url = self.config.endpoint("/auth/me");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SponsorError::Load(format!("auth check failed: {e}")))?;

        if response.status().is_success() {
            Ok(TokenStatus::Valid)
        } else {
            tracing::warn!(status = %response.status(), "Auth token rejected");
            Ok(TokenStatus::Rejected)
        }
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }
}
