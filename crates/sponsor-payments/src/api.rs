//! Remote Sponsorship API
//!
//! Abstraction over the rescue backend (Strategy pattern). The HTTP client
//! talks to the real API; `MockSponsorApi` stands in for tests.
//!
//! Every method reports failures with the error kind of the flow step it
//! serves, so transport errors and non-success responses look the same to
//! callers.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use sponsor_core::{
    Adoption, CheckoutSessionHandle, ConfirmationRecord, Dog, PaymentIntentRecord, Result,
    SponsorshipSubject,
};

/// Outcome of verifying a token against `/auth/me`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Rejected,
}

/// Free-form metadata attached to the hosted checkout session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutMetadata {
    pub dog_id: String,
    #[serde(rename = "type")]
    pub sponsorship_type: String,
    pub adoption_id: String,
    pub action: String,
}

impl CheckoutMetadata {
    pub fn for_subject(subject: &SponsorshipSubject) -> Self {
        match subject {
            SponsorshipSubject::Renewal { adoption_id, .. } => Self {
                adoption_id: adoption_id.clone(),
                action: "renew".into(),
                ..Self::default()
            },
            other => Self {
                dog_id: other.dog_id().unwrap_or_default().to_string(),
                sponsorship_type: other.mode().as_str().to_string(),
                ..Self::default()
            },
        }
    }
}

/// Body of `POST /payments/create-checkout-session`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_intent_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub description: String,
    pub metadata: CheckoutMetadata,
}

/// Remote API consumed by the checkout flow
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait SponsorApi: Send + Sync {
    /// `GET /public/dogs/{id}`; fails with `Load`
    async fn fetch_dog(&self, dog_id: &str) -> Result<Dog>;

    /// `GET /adoptions/{id}` (authenticated); fails with `Load`
    async fn fetch_adoption(&self, adoption_id: &str, token: Option<&str>) -> Result<Adoption>;

    /// `POST /adoptions/specific|sized|random` or `POST /adoptions/{id}/renew`;
    /// fails with `PaymentInitialization`
    async fn create_payment_intent(
        &self,
        subject: &SponsorshipSubject,
        token: &str,
    ) -> Result<PaymentIntentRecord>;

    /// `POST /payments/create-checkout-session`; fails with `CheckoutSession`
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
        token: &str,
    ) -> Result<CheckoutSessionHandle>;

    /// `POST /adoptions/confirm` or `POST /adoptions/{id}/confirm-renewal`;
    /// fails with `Confirmation`
    async fn confirm_payment(
        &self,
        payment_intent_id: &str,
        renewal_adoption_id: Option<&str>,
        token: &str,
    ) -> Result<ConfirmationRecord>;

    /// `GET /auth/me`; transport failures are errors, rejections are not
    async fn verify_token(&self, token: &str) -> Result<TokenStatus>;

    /// Base URL requests are sent to
    fn base_url(&self) -> &str;
}
