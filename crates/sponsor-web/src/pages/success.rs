//! Sponsor Success Page
//!
//! Landing page for the hosted checkout's return. First visit confirms the
//! payment; the desktop redirect lands here again with only the adoption id.

use leptos::prelude::*;
use leptos::task::spawn_local;

use sponsor_core::ReturnParams;
use sponsor_payments::{FlowConfig, ReturnHandler, ReturnRoute};

use crate::api;
use crate::browser;
use crate::components::ErrorBanner;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Status {
    Confirming,
    Leaving,
    Instructions(String),
    Completed { renewal: bool },
    Failed(String),
}

#[component]
pub fn SuccessPage() -> impl IntoView {
    let (status, set_status) = signal(Status::Confirming);

    spawn_local(async move {
        let Some(url) = browser::current_url() else {
            set_status.set(Status::Failed("Unable to read page address.".into()));
            return;
        };

        let params = ReturnParams::from_url(&url);
        if params.is_completed_landing() {
            set_status.set(Status::Completed {
                renewal: params.renewal,
            });
            return;
        }

        let services = match api::services().await {
            Ok(services) => services,
            Err(e) => {
                set_status.set(Status::Failed(e.user_message()));
                return;
            }
        };
        let handler = ReturnHandler::new(
            services.api,
            services.navigator,
            services.tokens,
            FlowConfig::default(),
        );

        let next = match handler.handle(&url, &browser::user_agent()).await {
            Ok(ReturnRoute::DeepLink {
                instructions: Some(text),
                ..
            }) => Status::Instructions(text),
            Ok(_) => Status::Leaving,
            Err(e) => Status::Failed(e.user_message()),
        };
        set_status.set(next);
    });

    view! {
        <div class="success">
            {move || match status.get() {
                Status::Confirming => view! {
                    <p class="loading">"Confirming your payment..."</p>
                }.into_any(),
                Status::Leaving => view! {
                    <p class="loading">"Payment confirmed. Redirecting..."</p>
                }.into_any(),
                Status::Instructions(text) => view! {
                    <div class="instructions">
                        {text.lines().map(|line| view! { <p>{line.to_string()}</p> }).collect_view()}
                    </div>
                }.into_any(),
                Status::Completed { renewal } => view! {
                    <div class="confirmed">
                        <h1>"Thank you!"</h1>
                        <p>
                            {if renewal {
                                "Your sponsorship has been renewed successfully!"
                            } else {
                                "Your sponsorship has been confirmed!"
                            }}
                        </p>
                        <a href="/" class="btn">"Back to home"</a>
                    </div>
                }.into_any(),
                Status::Failed(message) => view! { <ErrorBanner message=message /> }.into_any(),
            }}
        </div>
    }
}
