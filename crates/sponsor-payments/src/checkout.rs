//! Hosted Checkout Orchestration
//!
//! Implements the "hosted checkout" approach for sponsorship payments:
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │    Idle     │──▶│  CreatingIntent  │──▶│ CreatingCheckout │──▶│  Redirecting │
//! └─────────────┘   └──────────────────┘   │     Session      │   └──────────────┘
//!        ▲                   │             └──────────────────┘          │
//!        └───── failure ─────┴─────────────────────┘                     ▼
//!                                                            hosted checkout page
//! ```
//!
//! The orchestrator is not reentrant: a busy flag makes a second initiation
//! while one is in flight a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use url::Url;
use url::form_urlencoded;

use sponsor_core::{
    CheckoutSession, CheckoutSessionHandle, PaymentIntentRecord, Result, SponsorError,
    SponsorshipSubject,
};

use crate::api::{CheckoutMetadata, CheckoutSessionRequest, SponsorApi};
use crate::config::FlowConfig;
use crate::navigate::{Navigator, redirect_with_grace};

/// Placeholder the payment provider substitutes with its session id
pub const CHECKOUT_SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Payment initiation state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentState {
    Idle,
    CreatingIntent,
    CreatingCheckoutSession,
    Redirecting,
}

/// Result of a payment initiation request
#[derive(Clone, Debug, PartialEq)]
pub enum PaymentOutcome {
    /// Browser sent to the hosted checkout page
    Redirected {
        intent: PaymentIntentRecord,
        checkout: CheckoutSessionHandle,
    },
    /// Another initiation is already running; nothing was done
    AlreadyInFlight,
}

/// Return and cancel URLs for the hosted checkout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutUrls {
    /// Success URL embeds the intent id and the provider session placeholder;
    /// renewals also carry their adoption so the return page confirms the
    /// right thing. Cancel goes back to the page as it was.
    pub fn build(page_url: &Url, success_path: &str, intent_id: &str, subject: &SponsorshipSubject) -> Self {
        let origin = page_url.origin().ascii_serialization();

        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("paymentIntentId", intent_id);
        let query = query.finish();

        let mut success_url = format!(
            "{origin}{success_path}?{query}&session_id={CHECKOUT_SESSION_PLACEHOLDER}"
        );
        if let Some(adoption_id) = subject.renewal_adoption_id() {
            let mut renewal = form_urlencoded::Serializer::new(String::new());
            renewal.append_pair("adoptionId", adoption_id);
            renewal.append_pair("action", "renew");
            success_url.push('&');
            success_url.push_str(&renewal.finish());
        }

        Self {
            success_url,
            cancel_url: page_url.to_string(),
        }
    }
}

/// Releases the busy flag when the initiation ends, however it ends
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drives intent creation, checkout session creation and the redirect
pub struct PaymentOrchestrator {
    api: Arc<dyn SponsorApi>,
    navigator: Arc<dyn Navigator>,
    config: FlowConfig,
    busy: AtomicBool,
    state: Mutex<PaymentState>,
}

impl PaymentOrchestrator {
    pub fn new(api: Arc<dyn SponsorApi>, navigator: Arc<dyn Navigator>, config: FlowConfig) -> Self {
        Self {
            api,
            navigator,
            config,
            busy: AtomicBool::new(false),
            state: Mutex::new(PaymentState::Idle),
        }
    }

    pub fn state(&self) -> PaymentState {
        self.state.lock().map_or(PaymentState::Idle, |s| *s)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn set_state(&self, next: PaymentState) {
        if let Ok(mut state) = self.state.lock() {
            tracing::debug!(from = ?*state, to = ?next, "Payment state");
            *state = next;
        }
    }

    /// Start payment for a loaded session.
    ///
    /// `description` labels the checkout line; `page_url` is the sponsor page
    /// (token already stripped) used for the return and cancel URLs. Any
    /// failure leaves the orchestrator `Idle` and ready for a fresh attempt.
    pub async fn initiate(
        &self,
        session: &CheckoutSession,
        description: &str,
        page_url: &Url,
    ) -> Result<PaymentOutcome> {
        let token = session
            .auth_token
            .as_deref()
            .ok_or(SponsorError::AuthenticationRequired)?;
        let subject = session
            .subject
            .as_ref()
            .filter(|_| session.is_payable())
            .ok_or_else(|| SponsorError::InvalidParameters("no sponsorship loaded".into()))?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Payment already in flight, ignoring");
            return Ok(PaymentOutcome::AlreadyInFlight);
        }
        // Released after the redirect too: if the browser never leaves, or
        // restores this page from history, the button must work again.
        let _guard = BusyGuard { flag: &self.busy };

        match self.run(subject, session, token, description, page_url).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(error = %e, "Payment initiation failed");
                self.set_state(PaymentState::Idle);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        subject: &SponsorshipSubject,
        session: &CheckoutSession,
        token: &str,
        description: &str,
        page_url: &Url,
    ) -> Result<PaymentOutcome> {
        self.set_state(PaymentState::CreatingIntent);
        tracing::info!(
            mode = %subject.mode(),
            amount_cents = session.quote().amount_cents(),
            "Initiating payment"
        );
        let intent = self.api.create_payment_intent(subject, token).await?;
        tracing::info!(payment_intent_id = %intent.payment_intent_id, "Payment intent created");

        self.set_state(PaymentState::CreatingCheckoutSession);
        let urls = CheckoutUrls::build(
            page_url,
            &self.config.app_links.success_path,
            &intent.payment_intent_id,
            subject,
        );
        let request = CheckoutSessionRequest {
            amount: session.amount,
            payment_intent_id: intent.payment_intent_id.clone(),
            success_url: urls.success_url,
            cancel_url: urls.cancel_url,
            description: description.to_string(),
            metadata: CheckoutMetadata::for_subject(subject),
        };
        let checkout = self.api.create_checkout_session(&request, token).await?;

        self.set_state(PaymentState::Redirecting);
        redirect_with_grace(
            self.navigator.as_ref(),
            &checkout.redirect_url,
            self.config.redirect_grace,
        )
        .await;

        Ok(PaymentOutcome::Redirected { intent, checkout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockSponsorApi, NavEvent, RecordingNavigator};
    use rust_decimal_macros::dec;
    use sponsor_core::pricing::{self, PricingBasis};

    const PAGE: &str = "https://rescue.org/sponsor.html?dogId=d1&type=specific";

    fn loaded_session(token: Option<&str>) -> CheckoutSession {
        let mut session = CheckoutSession::new(token.map(String::from));
        session.apply_quote(
            SponsorshipSubject::Specific { dog_id: "d1".into() },
            pricing::resolve(&PricingBasis::Specific).unwrap(),
            Some("Rex".into()),
        );
        session
    }

    fn orchestrator(api: Arc<MockSponsorApi>, navigator: Arc<RecordingNavigator>) -> PaymentOrchestrator {
        PaymentOrchestrator::new(api, navigator, FlowConfig::immediate())
    }

    #[tokio::test]
    async fn test_initiate_redirects_to_checkout() {
        let api = Arc::new(MockSponsorApi::new());
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let orchestrator = orchestrator(api.clone(), navigator.clone());
        let page = Url::parse(PAGE).unwrap();

        let outcome = orchestrator
            .initiate(&loaded_session(Some("tok")), "Sponsor Rex", &page)
            .await
            .unwrap();

        assert!(matches!(outcome, PaymentOutcome::Redirected { .. }));
        assert_eq!(orchestrator.state(), PaymentState::Redirecting);
        assert!(!orchestrator.is_busy());

        let requests = api.checkout_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount, dec!(59.99));
        assert_eq!(requests[0].payment_intent_id, "pi_test_1");
        assert_eq!(requests[0].description, "Sponsor Rex");
        assert_eq!(requests[0].cancel_url, PAGE);

        assert_eq!(
            navigator.events(),
            vec![
                NavEvent::Assign("https://checkout.example/c/cs_test_1".into()),
                NavEvent::Pause(std::time::Duration::ZERO),
            ]
        );
    }

    #[tokio::test]
    async fn test_stuck_redirect_forced_once() {
        let api = Arc::new(MockSponsorApi::new());
        let navigator = Arc::new(RecordingNavigator::new(PAGE).stuck());
        let orchestrator = orchestrator(api, navigator.clone());

        orchestrator
            .initiate(&loaded_session(Some("tok")), "Sponsor Rex", &Url::parse(PAGE).unwrap())
            .await
            .unwrap();

        let target = "https://checkout.example/c/cs_test_1".to_string();
        assert_eq!(navigator.targets(), vec![target.clone(), target]);
    }

    #[tokio::test]
    async fn test_missing_token_makes_no_calls() {
        let api = Arc::new(MockSponsorApi::new());
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let orchestrator = orchestrator(api.clone(), navigator.clone());

        let err = orchestrator
            .initiate(&loaded_session(None), "Sponsor Rex", &Url::parse(PAGE).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err, SponsorError::AuthenticationRequired);
        assert_eq!(api.call_count(), 0);
        assert!(navigator.events().is_empty());
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_unloaded_session_rejected() {
        let api = Arc::new(MockSponsorApi::new());
        let orchestrator = orchestrator(api.clone(), Arc::new(RecordingNavigator::new(PAGE)));

        let err = orchestrator
            .initiate(&CheckoutSession::new(Some("tok".into())), "x", &Url::parse(PAGE).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, SponsorError::InvalidParameters(_)));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_checkout_url_rearms() {
        let api = Arc::new(MockSponsorApi::new().without_checkout_url());
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let orchestrator = orchestrator(api.clone(), navigator.clone());

        let err = orchestrator
            .initiate(&loaded_session(Some("tok")), "Sponsor Rex", &Url::parse(PAGE).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, SponsorError::CheckoutSession(_)));
        assert!(err.is_retryable());
        assert_eq!(orchestrator.state(), PaymentState::Idle);
        assert!(!orchestrator.is_busy());
        assert!(navigator.events().is_empty());
    }

    #[test]
    fn test_success_url_keeps_placeholder() {
        let page = Url::parse("https://rescue.org/sponsor.html?dogId=d1&type=specific").unwrap();
        let urls = CheckoutUrls::build(
            &page,
            "/sponsor-success.html",
            "pi_123",
            &SponsorshipSubject::Specific { dog_id: "d1".into() },
        );
        assert_eq!(
            urls.success_url,
            "https://rescue.org/sponsor-success.html?paymentIntentId=pi_123&session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(urls.cancel_url, page.as_str());
    }

    #[test]
    fn test_renewal_success_url_carries_adoption() {
        let page = Url::parse("http://localhost:8080/sponsor.html?adoptionId=a1&action=renew&weeks=2").unwrap();
        let urls = CheckoutUrls::build(
            &page,
            "/sponsor-success.html",
            "pi_9",
            &SponsorshipSubject::Renewal {
                adoption_id: "a1".into(),
                weeks: 2,
            },
        );
        assert_eq!(
            urls.success_url,
            "http://localhost:8080/sponsor-success.html?paymentIntentId=pi_9&session_id={CHECKOUT_SESSION_ID}&adoptionId=a1&action=renew"
        );
    }

    #[test]
    fn test_busy_guard_releases_on_drop() {
        let flag = AtomicBool::new(true);
        drop(BusyGuard { flag: &flag });
        assert!(!flag.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_initiate_again_after_redirect() {
        let api = Arc::new(MockSponsorApi::new());
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let orchestrator = orchestrator(api.clone(), navigator.clone());
        let page = Url::parse(PAGE).unwrap();
        let session = loaded_session(Some("tok"));

        for _ in 0..2 {
            let outcome = orchestrator.initiate(&session, "Sponsor Rex", &page).await.unwrap();
            assert!(matches!(outcome, PaymentOutcome::Redirected { .. }));
        }
        assert_eq!(api.intent_calls(), 2);
        assert_eq!(navigator.targets().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_intent_id_fails_first_step() {
        let api = Arc::new(MockSponsorApi::new().without_intent_id());
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let orchestrator = orchestrator(api.clone(), navigator.clone());

        let err = orchestrator
            .initiate(&loaded_session(Some("tok")), "Sponsor Rex", &Url::parse(PAGE).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, SponsorError::PaymentInitialization(_)));
        assert!(err.is_retryable());
        assert!(api.checkout_requests().is_empty());
        assert!(navigator.events().is_empty());
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_checkout_failure_rearms_and_retries() {
        let api = Arc::new(MockSponsorApi::new().failing_checkout("Checkout service unavailable"));
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let orchestrator = orchestrator(api.clone(), navigator.clone());
        let page = Url::parse(PAGE).unwrap();
        let session = loaded_session(Some("tok"));

        let err = orchestrator.initiate(&session, "Sponsor Rex", &page).await.unwrap_err();
        assert_eq!(err, SponsorError::CheckoutSession("Checkout service unavailable".into()));
        assert_eq!(orchestrator.state(), PaymentState::Idle);
        assert!(!orchestrator.is_busy());

        orchestrator.initiate(&session, "Sponsor Rex", &page).await.unwrap_err();
        assert_eq!(api.intent_calls(), 2);
        assert!(navigator.events().is_empty());
    }

    #[tokio::test]
    async fn test_redirects_to_returned_checkout_url() {
        let api = Arc::new(MockSponsorApi::new().with_checkout_url("https://pay.example/session/abc"));
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let orchestrator = orchestrator(api, navigator.clone());

        orchestrator
            .initiate(&loaded_session(Some("tok")), "Sponsor Rex", &Url::parse(PAGE).unwrap())
            .await
            .unwrap();

        assert_eq!(navigator.targets(), vec!["https://pay.example/session/abc".to_string()]);
    }
}
