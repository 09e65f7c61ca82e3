//! Main App Component

use leptos::prelude::*;
use leptos_router::{StaticSegment, components::*};

use crate::pages::{SponsorPage, SuccessPage};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    view! {
        <Router>
            <main class="app">
                <Routes fallback=|| view! { <p>"Page not found"</p> }>
                    <Route path=StaticSegment("sponsor.html") view=SponsorPage />
                    <Route path=StaticSegment("sponsor") view=SponsorPage />
                    <Route path=StaticSegment("sponsor-success.html") view=SuccessPage />
                    <Route path=StaticSegment("sponsor-success") view=SuccessPage />
                </Routes>
            </main>
        </Router>
    }
}
