//! Sponsor Page

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use sponsor_core::CheckoutSession;
use sponsor_payments::{FlowConfig, LoadedSponsorship, PaymentOutcome, SponsorFlow};

use crate::api;
use crate::browser;
use crate::components::{ErrorBanner, QuoteCard};

#[component]
pub fn SponsorPage() -> impl IntoView {
    let (flow, set_flow) = signal(None::<Arc<SponsorFlow>>);
    let (session, set_session) = signal(None::<CheckoutSession>);
    let (loaded, set_loaded) = signal(None::<LoadedSponsorship>);
    let (setup_error, set_setup_error) = signal(None::<String>);
    let (submitting, set_submitting) = signal(false);

    let publish = move |flow: &SponsorFlow| {
        set_session.set(flow.session().ok());
        set_loaded.set(flow.loaded());
    };

    spawn_local(async move {
        let Some(entry) = browser::current_url() else {
            set_setup_error.set(Some("Unable to read page address.".into()));
            return;
        };
        let services = match api::services().await {
            Ok(services) => services,
            Err(e) => {
                set_setup_error.set(Some(e.user_message()));
                return;
            }
        };

        let page = Arc::new(SponsorFlow::new(&entry, services, FlowConfig::default()));
        browser::replace_history(page.page_url());
        set_flow.set(Some(page.clone()));

        let verifier = page.clone();
        spawn_local(async move {
            verifier.verify_token().await;
        });

        set_session.set(page.session().ok());
        // Failures are recorded on the session
        let _ = page.load().await;
        publish(&page);
    });

    let pay = move |_| {
        let Some(page) = flow.get_untracked() else {
            return;
        };
        set_submitting.set(true);
        spawn_local(async move {
            match page.pay().await {
                Ok(PaymentOutcome::Redirected { .. }) => {
                    tracing::info!("Left for hosted checkout");
                }
                Ok(PaymentOutcome::AlreadyInFlight) => {}
                Err(e) => tracing::warn!(error = %e, "Payment not started"),
            }
            set_submitting.set(false);
            publish(&page);
        });
    };

    let error = move || {
        setup_error
            .get()
            .or_else(|| session.get().and_then(|s| s.last_error))
    };
    let busy = move || submitting.get() || session.get().is_some_and(|s| s.loading);
    let payable = move || session.get().is_some_and(|s| s.is_payable());

    view! {
        <div class="sponsor">
            {move || error().map(|message| view! { <ErrorBanner message=message /> })}

            <section id="sponsor-info">
                {move || loaded.get().map(|loaded| view! { <QuoteCard loaded=loaded /> })}
                <Show when=move || busy() && loaded.get().is_none()>
                    <div class="loading">"Loading..."</div>
                </Show>
            </section>

            <Show when=payable>
                <button
                    id="continue-button"
                    class="btn btn-primary"
                    on:click=pay
                    disabled=busy
                >
                    {move || if busy() { "Processing..." } else { "Continue to Payment" }}
                </button>
            </Show>
        </div>
    }
}
