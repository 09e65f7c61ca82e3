//! UI Components

use leptos::prelude::*;

use sponsor_core::{Dog, SponsorshipSubject};
use sponsor_payments::LoadedSponsorship;

/// Inline error message
#[component]
pub fn ErrorBanner(message: String) -> impl IntoView {
    view! {
        <div class="error-message" role="alert">{message}</div>
    }
}

/// Price summary for the loaded subject
#[component]
pub fn QuoteCard(loaded: LoadedSponsorship) -> impl IntoView {
    let headline = loaded.headline();
    let amount = loaded.quote.display_amount();
    let duration = loaded.quote.duration_label.clone();

    let (amount_label, duration_text, blurb) = match &loaded.subject {
        SponsorshipSubject::Random => (
            "Weekly Amount",
            duration,
            Some("We'll match you with a dog in need of sponsorship!".to_string()),
        ),
        SponsorshipSubject::SizeTier { .. } => ("Weekly Amount", duration, None),
        SponsorshipSubject::Renewal { weeks, .. } => (
            "Total Amount",
            format!("for {duration}"),
            Some(format!(
                "Extend your sponsorship for {weeks} more week{}.",
                if *weeks == 1 { "" } else { "s" }
            )),
        ),
        SponsorshipSubject::Specific { .. } => ("Total Amount", format!("for {duration}"), None),
    };

    let details = loaded.dog.map(|dog| view! { <DogDetails dog=dog /> });

    view! {
        <div class="quote-card">
            <h2>{headline}</h2>
            {blurb.map(|text| view! { <p class="blurb">{text}</p> })}
            {details}
            <div class="quote-total">
                <span class="label">{amount_label}</span>
                <span class="amount">{amount}</span>
            </div>
            <p class="duration">{duration_text}</p>
        </div>
    }
}

#[component]
fn DogDetails(dog: Dog) -> impl IntoView {
    let breed = dog
        .breed
        .as_ref()
        .and_then(|b| b.name())
        .unwrap_or("Mixed")
        .to_string();
    let age = match &dog.age {
        Some(serde_json::Value::Number(n)) => format!("{n} years"),
        Some(serde_json::Value::String(s)) if !s.is_empty() => format!("{s} years"),
        _ => "Unknown".to_string(),
    };
    let size = dog
        .effective_size()
        .cloned()
        .map_or_else(|| "Unknown".to_string(), String::from);
    let shelter = dog
        .shelter
        .as_ref()
        .and_then(|s| s.name.clone())
        .unwrap_or_else(|| "Unknown".into());
    let alt = dog.name.clone();
    let photo = dog
        .primary_image_url
        .map(|src| view! { <img class="dog-photo" src=src alt=alt /> });

    view! {
        <div class="dog-details">
            {photo}
            <dl>
                <dt>"Breed:"</dt><dd>{breed}</dd>
                <dt>"Age:"</dt><dd>{age}</dd>
                <dt>"Size:"</dt><dd>{size}</dd>
                <dt>"Shelter:"</dt><dd>{shelter}</dd>
            </dl>
        </div>
    }
}
