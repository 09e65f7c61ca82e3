//! Test Harness
//!
//! In-memory stand-ins for the remote API and the browser. They record every
//! call so tests can assert on what was (and was not) sent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use sponsor_core::{
    Adoption, CheckoutSessionHandle, ConfirmationRecord, Dog, PaymentIntentRecord, Result,
    SponsorError, SponsorshipSubject,
};

use crate::api::{CheckoutSessionRequest, SponsorApi, TokenStatus};
use crate::navigate::Navigator;

/// A call received by [`MockSponsorApi`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiCall {
    FetchDog(String),
    FetchAdoption { id: String, token: Option<String> },
    CreateIntent(SponsorshipSubject),
    CreateCheckout(CheckoutSessionRequest),
    Confirm { payment_intent_id: String, renewal_adoption_id: Option<String> },
    VerifyToken(String),
}

/// Scriptable in-memory sponsorship API
pub struct MockSponsorApi {
    dogs: HashMap<String, Dog>,
    adoptions: HashMap<String, Adoption>,
    checkout_url: Option<String>,
    intent_id: Option<String>,
    confirmed_adoption_id: Option<String>,
    intent_error: Option<String>,
    checkout_error: Option<String>,
    confirm_error: Option<String>,
    tokens_valid: bool,
    intent_gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl Default for MockSponsorApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSponsorApi {
    pub fn new() -> Self {
        Self {
            dogs: HashMap::new(),
            adoptions: HashMap::new(),
            checkout_url: Some("https://checkout.example/c/cs_test_1".into()),
            intent_id: Some("pi_test_1".into()),
            confirmed_adoption_id: Some("adoption_1".into()),
            intent_error: None,
            checkout_error: None,
            confirm_error: None,
            tokens_valid: true,
            intent_gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_dog(mut self, id: &str, dog: Dog) -> Self {
        self.dogs.insert(id.into(), dog);
        self
    }

    pub fn with_adoption(mut self, id: &str, adoption: Adoption) -> Self {
        self.adoptions.insert(id.into(), adoption);
        self
    }

    /// Intent responses carry no identifier
    pub fn without_intent_id(mut self) -> Self {
        self.intent_id = None;
        self
    }

    /// Checkout responses carry no redirect URL
    pub fn without_checkout_url(mut self) -> Self {
        self.checkout_url = None;
        self
    }

    pub fn with_checkout_url(mut self, url: &str) -> Self {
        self.checkout_url = Some(url.into());
        self
    }

    /// Adoption id reported by confirmation (`None`: response omits it)
    pub fn with_confirmed_adoption(mut self, id: Option<&str>) -> Self {
        self.confirmed_adoption_id = id.map(String::from);
        self
    }

    pub fn failing_intent(mut self, message: &str) -> Self {
        self.intent_error = Some(message.into());
        self
    }

    pub fn failing_checkout(mut self, message: &str) -> Self {
        self.checkout_error = Some(message.into());
        self
    }

    pub fn failing_confirmation(mut self, message: &str) -> Self {
        self.confirm_error = Some(message.into());
        self
    }

    pub fn rejecting_tokens(mut self) -> Self {
        self.tokens_valid = false;
        self
    }

    /// Hold every intent creation until `gate` is notified
    pub fn holding_intents(mut self, gate: Arc<Notify>) -> Self {
        self.intent_gate = Some(gate);
        self
    }

    fn record(&self, call: ApiCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    pub fn intent_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ApiCall::CreateIntent(_)))
            .count()
    }

    pub fn checkout_requests(&self) -> Vec<CheckoutSessionRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::CreateCheckout(request) => Some(request),
                _ => None,
            })
            .collect()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl SponsorApi for MockSponsorApi {
    async fn fetch_dog(&self, dog_id: &str) -> Result<Dog> {
        self.record(ApiCall::FetchDog(dog_id.into()));
        self.dogs
            .get(dog_id)
            .cloned()
            .ok_or_else(|| SponsorError::Load("Failed to load dog information (HTTP 404)".into()))
    }

    async fn fetch_adoption(&self, adoption_id: &str, token: Option<&str>) -> Result<Adoption> {
        self.record(ApiCall::FetchAdoption {
            id: adoption_id.into(),
            token: token.map(String::from),
        });
        if token.is_none() {
            return Err(SponsorError::Load("Failed to load adoption information".into()));
        }
        self.adoptions
            .get(adoption_id)
            .cloned()
            .ok_or_else(|| SponsorError::Load("Failed to load adoption information".into()))
    }

    async fn create_payment_intent(
        &self,
        subject: &SponsorshipSubject,
        _token: &str,
    ) -> Result<PaymentIntentRecord> {
        self.record(ApiCall::CreateIntent(subject.clone()));
        if let Some(gate) = &self.intent_gate {
            gate.notified().await;
        }
        if let Some(message) = &self.intent_error {
            return Err(SponsorError::PaymentInitialization(message.clone()));
        }
        let payment_intent_id = self.intent_id.clone().ok_or_else(|| {
            SponsorError::PaymentInitialization(
                "Failed to initialize payment - missing paymentIntentId".into(),
            )
        })?;
        Ok(PaymentIntentRecord {
            payment_intent_id,
            amount: None,
            currency: Some("usd".into()),
        })
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
        _token: &str,
    ) -> Result<CheckoutSessionHandle> {
        self.record(ApiCall::CreateCheckout(request.clone()));
        if let Some(message) = &self.checkout_error {
            return Err(SponsorError::CheckoutSession(message.clone()));
        }
        let redirect_url = self.checkout_url.clone().ok_or_else(|| {
            SponsorError::CheckoutSession("Failed to get checkout URL from server".into())
        })?;
        Ok(CheckoutSessionHandle {
            redirect_url,
            session_id: Some("cs_test_1".into()),
        })
    }

    async fn confirm_payment(
        &self,
        payment_intent_id: &str,
        renewal_adoption_id: Option<&str>,
        _token: &str,
    ) -> Result<ConfirmationRecord> {
        self.record(ApiCall::Confirm {
            payment_intent_id: payment_intent_id.into(),
            renewal_adoption_id: renewal_adoption_id.map(String::from),
        });
        if let Some(message) = &self.confirm_error {
            return Err(SponsorError::Confirmation(message.clone()));
        }
        Ok(ConfirmationRecord {
            adoption_id: self.confirmed_adoption_id.clone(),
        })
    }

    async fn verify_token(&self, token: &str) -> Result<TokenStatus> {
        self.record(ApiCall::VerifyToken(token.into()));
        Ok(if self.tokens_valid {
            TokenStatus::Valid
        } else {
            TokenStatus::Rejected
        })
    }

    fn base_url(&self) -> &str {
        "mock://sponsor-api"
    }
}

/// A navigation performed through [`RecordingNavigator`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavEvent {
    Assign(String),
    Replace(String),
    Pause(Duration),
}

/// Browser stand-in that records navigation instead of performing it
pub struct RecordingNavigator {
    location: Mutex<String>,
    events: Mutex<Vec<NavEvent>>,
    assign_takes_effect: AtomicBool,
    keeps_focus: AtomicBool,
}

impl RecordingNavigator {
    pub fn new(start_url: &str) -> Self {
        Self {
            location: Mutex::new(start_url.into()),
            events: Mutex::new(Vec::new()),
            assign_takes_effect: AtomicBool::new(true),
            keeps_focus: AtomicBool::new(true),
        }
    }

    /// `assign` is recorded but the location does not change
    pub fn stuck(self) -> Self {
        self.assign_takes_effect.store(false, Ordering::Release);
        self
    }

    /// A deep link hands focus to the app
    pub fn app_installed(self) -> Self {
        self.keeps_focus.store(false, Ordering::Release);
        self
    }

    pub fn events(&self) -> Vec<NavEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Every URL navigated to, in order
    pub fn targets(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                NavEvent::Assign(url) | NavEvent::Replace(url) => Some(url),
                NavEvent::Pause(_) => None,
            })
            .collect()
    }

    fn push(&self, event: NavEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn set_location(&self, url: &str) {
        if let Ok(mut location) = self.location.lock() {
            *location = url.into();
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Navigator for RecordingNavigator {
    fn current_url(&self) -> String {
        self.location.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn assign(&self, url: &str) {
        self.push(NavEvent::Assign(url.into()));
        if self.assign_takes_effect.load(Ordering::Acquire) {
            self.set_location(url);
        }
    }

    fn replace(&self, url: &str) {
        self.push(NavEvent::Replace(url.into()));
        self.set_location(url);
    }

    fn has_focus(&self) -> bool {
        self.keeps_focus.load(Ordering::Acquire)
    }

    async fn pause(&self, duration: Duration) {
        self.push(NavEvent::Pause(duration));
    }
}
