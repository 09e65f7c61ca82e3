//! Sponsor Page Flow
//!
//! The explicit, owned state of one sponsor page load. UI callbacks map to
//! the command methods here; each returns a `Result` instead of touching the
//! DOM.

use std::sync::{Arc, Mutex, MutexGuard};

use url::Url;

use sponsor_core::{
    CheckoutSession, ContextBuilder, EntryParams, Quote, Result, SponsorError, TokenStore,
    token::token_preview,
};

use crate::api::{SponsorApi, TokenStatus};
use crate::checkout::{PaymentOrchestrator, PaymentOutcome, PaymentState};
use crate::config::FlowConfig;
use crate::loader::{LoadedSponsorship, SponsorshipLoader};
use crate::navigate::Navigator;

/// Collaborators injected by the host (browser, tests)
#[derive(Clone)]
pub struct PageServices {
    pub api: Arc<dyn SponsorApi>,
    pub navigator: Arc<dyn Navigator>,
    pub tokens: Arc<dyn TokenStore>,
}

/// One sponsor page load
pub struct SponsorFlow {
    services: PageServices,
    params: EntryParams,
    page_url: Url,
    session: Mutex<CheckoutSession>,
    loaded: Mutex<Option<LoadedSponsorship>>,
    loader: SponsorshipLoader,
    orchestrator: PaymentOrchestrator,
}

impl SponsorFlow {
    /// Build the page context from the entry URL. Never fails and makes no calls.
    pub fn new(entry_url: &Url, services: PageServices, config: FlowConfig) -> Self {
        let context = ContextBuilder::new(services.tokens.as_ref()).build(entry_url);

        Self {
            loader: SponsorshipLoader::new(services.api.clone()),
            orchestrator: PaymentOrchestrator::new(
                services.api.clone(),
                services.navigator.clone(),
                config,
            ),
            session: Mutex::new(CheckoutSession::new(context.auth_token)),
            loaded: Mutex::new(None),
            params: context.params,
            page_url: context.cleaned_url,
            services,
        }
    }

    fn session_mut(&self) -> Result<MutexGuard<'_, CheckoutSession>> {
        self.session
            .lock()
            .map_err(|_| SponsorError::Storage("checkout session lock poisoned".into()))
    }

    fn update(&self, f: impl FnOnce(&mut CheckoutSession)) {
        if let Ok(mut session) = self.session.lock() {
            f(&mut session);
        }
    }

    /// Entry URL without the handoff token; write back with `history.replaceState`
    pub const fn page_url(&self) -> &Url {
        &self.page_url
    }

    pub const fn params(&self) -> &EntryParams {
        &self.params
    }

    /// Snapshot of the session state
    pub fn session(&self) -> Result<CheckoutSession> {
        Ok(self.session_mut()?.clone())
    }

    pub fn payment_state(&self) -> PaymentState {
        self.orchestrator.state()
    }

    pub fn api_base_url(&self) -> &str {
        self.services.api.base_url()
    }

    /// Check the token against `/auth/me` without blocking the page.
    ///
    /// A rejected token is removed; network trouble keeps it so payment can
    /// still be attempted. Returns whether the token is known to be valid.
    pub async fn verify_token(&self) -> bool {
        let Some(token) = self.token() else {
            tracing::warn!("No auth token found");
            return false;
        };

        match self.services.api.verify_token(&token).await {
            Ok(TokenStatus::Valid) => {
                tracing::info!("Auth token verified");
                true
            }
            Ok(TokenStatus::Rejected) => {
                tracing::warn!("Auth token invalid, removing from storage");
                if let Err(e) = self.clear_token() {
                    tracing::warn!(error = %e, "Failed to clear rejected token");
                }
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Auth check error, continuing");
                false
            }
        }
    }

    /// Load and price the subject. Errors halt the page and are recorded.
    pub async fn load(&self) -> Result<Quote> {
        let token = self.session_mut()?.auth_token.clone();
        self.update(|s| {
            s.set_loading(true);
            s.clear_error();
        });

        match self.loader.load(&self.params, token.as_deref()).await {
            Ok(loaded) => {
                let quote = loaded.quote.clone();
                self.update(|s| {
                    s.apply_quote(loaded.subject.clone(), quote.clone(), loaded.subject_name());
                    s.set_loading(false);
                });
                if let Ok(mut slot) = self.loaded.lock() {
                    *slot = Some(loaded);
                }
                Ok(quote)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error loading sponsorship data");
                self.update(|s| s.fail(e.user_message()));
                Err(e)
            }
        }
    }

    /// Loaded subject, once `load` succeeded
    pub fn loaded(&self) -> Option<LoadedSponsorship> {
        self.loaded.lock().ok().and_then(|l| l.clone())
    }

    /// Title for the quote card
    pub fn headline(&self) -> Option<String> {
        self.loaded().map(|l| l.headline())
    }

    /// Pay button handler.
    ///
    /// A second press while a payment is in flight is ignored. The button is
    /// re-armed once the attempt ends: failures record the message, and a
    /// redirect that leaves the page usable (navigation blocked, restored
    /// from history) can be retried. Retrying always starts over.
    pub async fn pay(&self) -> Result<PaymentOutcome> {
        let snapshot = {
            let mut session = self.session_mut()?;
            if self.orchestrator.is_busy() {
                return Ok(PaymentOutcome::AlreadyInFlight);
            }
            session.clear_error();
            session.set_loading(true);
            session.clone()
        };
        let description = self
            .loaded()
            .map_or_else(|| "Dog Sponsorship".to_string(), |l| l.description());

        match self
            .orchestrator
            .initiate(&snapshot, &description, &self.page_url)
            .await
        {
            Ok(outcome @ PaymentOutcome::Redirected { .. }) => {
                self.update(|s| s.set_loading(false));
                Ok(outcome)
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.update(|s| s.fail(e.user_message()));
                Err(e)
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.session
            .lock()
            .ok()
            .and_then(|s| s.auth_token.clone())
            .or_else(|| self.services.tokens.load())
    }

    /// Store a token and use it for this page
    pub fn set_token(&self, token: &str) -> Result<()> {
        self.services.tokens.save(token)?;
        self.session_mut()?.auth_token = Some(token.to_string());
        tracing::info!(token = %token_preview(token), "Auth token set");
        Ok(())
    }

    pub fn clear_token(&self) -> Result<()> {
        self.services.tokens.clear()?;
        self.session_mut()?.auth_token = None;
        tracing::info!("Auth token cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ApiCall, MockSponsorApi, RecordingNavigator};
    use rust_decimal_macros::dec;
    use sponsor_core::{Adoption, Dog, DogSize, MemoryTokenStore};
    use tokio::sync::Notify;

    struct Harness {
        api: Arc<MockSponsorApi>,
        navigator: Arc<RecordingNavigator>,
        tokens: Arc<MemoryTokenStore>,
        flow: SponsorFlow,
    }

    fn harness(query: &str, api: MockSponsorApi, tokens: MemoryTokenStore) -> Harness {
        let entry = Url::parse(&format!("https://rescue.org/sponsor.html?{query}")).unwrap();
        let api = Arc::new(api);
        let navigator = Arc::new(RecordingNavigator::new(entry.as_str()));
        let tokens = Arc::new(tokens);
        let services = PageServices {
            api: api.clone(),
            navigator: navigator.clone(),
            tokens: tokens.clone(),
        };
        Harness {
            flow: SponsorFlow::new(&entry, services, FlowConfig::immediate()),
            api,
            navigator,
            tokens,
        }
    }

    fn rex(size: Option<DogSize>) -> Dog {
        Dog {
            name: "Rex".into(),
            size,
            ..Dog::default()
        }
    }

    #[tokio::test]
    async fn test_url_token_persisted_and_stripped() {
        let h = harness(
            "dogId=d1&type=specific&token=abc",
            MockSponsorApi::new(),
            MemoryTokenStore::new(),
        );

        assert_eq!(h.tokens.load().as_deref(), Some("abc"));
        assert_eq!(h.flow.token().as_deref(), Some("abc"));
        assert_eq!(
            h.flow.page_url().as_str(),
            "https://rescue.org/sponsor.html?dogId=d1&type=specific"
        );
        assert_eq!(h.api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_pricing_per_mode() {
        let cases = [
            ("dogId=d1&type=specific", dec!(59.99), "5 weeks"),
            ("dogId=d1&type=sized", dec!(9.99), "per week"),
            ("type=random", dec!(9.90), "per week"),
            ("adoptionId=a1&action=renew&weeks=3", dec!(29.70), "3 weeks"),
            ("adoptionId=a1&action=renew&weeks=abc", dec!(9.90), "1 week"),
        ];

        for (query, amount, label) in cases {
            let api = MockSponsorApi::new()
                .with_dog("d1", rex(Some(DogSize::Small)))
                .with_adoption("a1", Adoption::default());
            let h = harness(query, api, MemoryTokenStore::with_token("tok"));

            let quote = h.flow.load().await.unwrap();
            assert_eq!(quote.amount, amount, "{query}");
            assert_eq!(quote.duration_label, label, "{query}");

            let session = h.flow.session().unwrap();
            assert!(!session.loading);
            assert!(session.last_error.is_none());
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_session_unpriced() {
        let h = harness("dogId=missing&type=specific", MockSponsorApi::new(), MemoryTokenStore::with_token("tok"));

        let err = h.flow.load().await.unwrap_err();
        assert!(matches!(err, SponsorError::Load(_)));

        let session = h.flow.session().unwrap();
        assert!(session.subject.is_none());
        assert_eq!(session.amount, dec!(0));
        assert!(!session.loading);
        assert_eq!(
            session.last_error.as_deref(),
            Some("Failed to load dog information (HTTP 404). Please try again.")
        );

        // Nothing loaded, nothing to pay for
        assert!(matches!(h.flow.pay().await, Err(SponsorError::InvalidParameters(_))));
        assert_eq!(h.api.intent_calls(), 0);
    }

    #[tokio::test]
    async fn test_pay_without_token_makes_no_calls() {
        let h = harness("type=random", MockSponsorApi::new(), MemoryTokenStore::new());
        h.flow.load().await.unwrap();

        let err = h.flow.pay().await.unwrap_err();
        assert_eq!(err, SponsorError::AuthenticationRequired);
        assert_eq!(h.api.call_count(), 0);
        assert!(h.navigator.events().is_empty());
        assert_eq!(
            h.flow.session().unwrap().last_error.as_deref(),
            Some("Authentication required. Please sign in from the app and try again.")
        );
    }

    #[tokio::test]
    async fn test_concurrent_pay_creates_one_intent() {
        let gate = Arc::new(Notify::new());
        let api = MockSponsorApi::new()
            .with_dog("d1", rex(Some(DogSize::Large)))
            .holding_intents(gate.clone());
        let h = harness("dogId=d1&type=sized", api, MemoryTokenStore::with_token("tok"));
        h.flow.load().await.unwrap();

        let second = async {
            while h.api.intent_calls() == 0 {
                tokio::task::yield_now().await;
            }
            let outcome = h.flow.pay().await;
            gate.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(h.flow.pay(), second);

        assert!(matches!(first, Ok(PaymentOutcome::Redirected { .. })));
        assert!(matches!(second, Ok(PaymentOutcome::AlreadyInFlight)));
        assert_eq!(h.api.intent_calls(), 1);
        assert_eq!(h.api.checkout_requests().len(), 1);
        assert_eq!(h.navigator.targets(), vec!["https://checkout.example/c/cs_test_1".to_string()]);
    }

    #[tokio::test]
    async fn test_retry_after_failure_starts_over() {
        let api = MockSponsorApi::new()
            .with_dog("d1", rex(None))
            .failing_intent("Failed to initialize payment");
        let h = harness("dogId=d1&type=specific", api, MemoryTokenStore::with_token("tok"));
        h.flow.load().await.unwrap();

        for attempt in 1..=2 {
            let err = h.flow.pay().await.unwrap_err();
            assert!(matches!(err, SponsorError::PaymentInitialization(_)));
            assert_eq!(h.api.intent_calls(), attempt);
            assert_eq!(h.flow.payment_state(), PaymentState::Idle);

            let session = h.flow.session().unwrap();
            assert!(!session.loading);
            assert_eq!(
                session.last_error.as_deref(),
                Some("Failed to initialize payment. Please try again.")
            );
        }
        assert!(h.api.checkout_requests().is_empty());
    }

    #[tokio::test]
    async fn test_renewal_checkout_carries_adoption() {
        let api = MockSponsorApi::new().with_adoption(
            "a1",
            Adoption {
                weekly_fee: Some(dec!(15.99)),
                ..Adoption::default()
            },
        );
        let h = harness("adoptionId=a1&action=renew&weeks=2", api, MemoryTokenStore::with_token("tok"));
        h.flow.load().await.unwrap();
        h.flow.pay().await.unwrap();

        assert!(h.api.calls().contains(&ApiCall::CreateIntent(
            sponsor_core::SponsorshipSubject::Renewal {
                adoption_id: "a1".into(),
                weeks: 2,
            }
        )));
        let request = &h.api.checkout_requests()[0];
        assert_eq!(request.amount, dec!(31.98));
        assert_eq!(request.description, "Dog Sponsorship");
        assert_eq!(request.metadata.adoption_id, "a1");
        assert!(request.success_url.ends_with("&adoptionId=a1&action=renew"));
    }

    #[tokio::test]
    async fn test_pay_again_after_redirect() {
        let h = harness("type=random", MockSponsorApi::new(), MemoryTokenStore::with_token("tok"));
        h.flow.load().await.unwrap();

        let first = h.flow.pay().await.unwrap();
        assert!(matches!(first, PaymentOutcome::Redirected { .. }));
        let session = h.flow.session().unwrap();
        assert!(!session.loading);
        assert!(session.last_error.is_none());

        let second = h.flow.pay().await.unwrap();
        assert!(matches!(second, PaymentOutcome::Redirected { .. }));
        assert_eq!(h.api.intent_calls(), 2);
    }

    #[tokio::test]
    async fn test_set_token_enables_payment() {
        let h = harness("type=random", MockSponsorApi::new(), MemoryTokenStore::new());
        h.flow.load().await.unwrap();
        assert!(h.flow.token().is_none());

        h.flow.set_token("fresh").unwrap();
        assert_eq!(h.tokens.load().as_deref(), Some("fresh"));
        assert_eq!(h.flow.token().as_deref(), Some("fresh"));

        h.flow.pay().await.unwrap();
        assert_eq!(h.api.intent_calls(), 1);
    }

    #[test]
    fn test_api_base_url_reports_backend() {
        let h = harness("type=random", MockSponsorApi::new(), MemoryTokenStore::new());
        assert_eq!(h.flow.api_base_url(), "mock://sponsor-api");
    }

    #[tokio::test]
    async fn test_rejected_token_cleared() {
        let h = harness(
            "type=random",
            MockSponsorApi::new().rejecting_tokens(),
            MemoryTokenStore::with_token("stale"),
        );

        assert!(!h.flow.verify_token().await);
        assert!(h.tokens.load().is_none());
        assert!(h.flow.token().is_none());
    }

    #[tokio::test]
    async fn test_valid_token_kept() {
        let h = harness("type=random", MockSponsorApi::new(), MemoryTokenStore::with_token("tok"));

        assert!(h.flow.verify_token().await);
        assert_eq!(h.tokens.load().as_deref(), Some("tok"));
        assert_eq!(h.api.calls(), vec![ApiCall::VerifyToken("tok".into())]);
    }
}
