//! Sponsorship Loader
//!
//! Runs exactly one of four loading strategies and prices the result.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use sponsor_core::{
    Adoption, Dog, EntryParams, PricingBasis, Quote, Result, SponsorError, SponsorshipSubject,
    pricing,
};

use crate::api::SponsorApi;

/// A resolved, priced sponsorship subject
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedSponsorship {
    pub subject: SponsorshipSubject,
    pub quote: Quote,
    pub dog: Option<Dog>,
    pub adoption: Option<Adoption>,
}

impl LoadedSponsorship {
    /// Title for the quote card
    pub fn headline(&self) -> String {
        match (&self.subject, &self.dog) {
            (SponsorshipSubject::Renewal { .. }, _) => "Renew Sponsorship".into(),
            (SponsorshipSubject::Random, _) => "Sponsor a Random Dog".into(),
            (_, Some(dog)) if !dog.name.is_empty() => format!("Sponsor {}", dog.name),
            _ => "Dog Sponsorship".into(),
        }
    }

    /// Checkout line description
    pub fn description(&self) -> String {
        match &self.dog {
            Some(dog) if !dog.name.is_empty() => format!("Sponsor {}", dog.name),
            _ => "Dog Sponsorship".into(),
        }
    }

    pub fn subject_name(&self) -> Option<String> {
        self.dog
            .as_ref()
            .map(|d| d.name.clone())
            .filter(|n| !n.is_empty())
    }
}

/// Loads and prices the sponsorship subject selected by the entry parameters
pub struct SponsorshipLoader {
    api: Arc<dyn SponsorApi>,
}

impl SponsorshipLoader {
    pub fn new(api: Arc<dyn SponsorApi>) -> Self {
        Self { api }
    }

    /// Resolve the mode and load it; invalid parameters never reach the network
    pub async fn load(&self, params: &EntryParams, token: Option<&str>) -> Result<LoadedSponsorship> {
        let subject = params.resolve_subject().inspect_err(|e| {
            tracing::warn!(error = %e, "No sponsorship strategy matches entry parameters");
        })?;
        self.load_subject(subject, token).await
    }

    pub async fn load_subject(
        &self,
        subject: SponsorshipSubject,
        token: Option<&str>,
    ) -> Result<LoadedSponsorship> {
        tracing::info!(mode = %subject.mode(), "Loading sponsorship");

        let (basis, dog, adoption) = match &subject {
            SponsorshipSubject::Specific { dog_id } => {
                let dog = self.api.fetch_dog(dog_id).await?;
                (PricingBasis::Specific, Some(dog), None)
            }
            SponsorshipSubject::SizeTier { dog_id } => {
                let dog = self.api.fetch_dog(dog_id).await?;
                let size = dog.effective_size().cloned();
                tracing::debug!(?size, "Pricing by size tier");
                (PricingBasis::Sized(size), Some(dog), None)
            }
            SponsorshipSubject::Random => (PricingBasis::Random, None, None),
            SponsorshipSubject::Renewal { adoption_id, weeks } => {
                let adoption = self.api.fetch_adoption(adoption_id, token).await?;
                if adoption.weekly_fee.is_some_and(|fee| fee < Decimal::ZERO) {
                    return Err(SponsorError::Load(
                        "Failed to load adoption information (invalid weekly fee)".into(),
                    ));
                }
                let basis = PricingBasis::Renewal {
                    weekly_fee: adoption.weekly_fee,
                    weeks: *weeks,
                };
                (basis, None, Some(adoption))
            }
        };

        let quote = pricing::resolve(&basis).ok_or_else(|| {
            tracing::warn!(?basis, "Sponsorship total out of range");
            SponsorError::Load("Failed to load adoption information (total out of range)".into())
        })?;

        let loaded = LoadedSponsorship {
            subject,
            quote,
            dog,
            adoption,
        };

        tracing::info!(
            amount = %loaded.quote.amount,
            duration = %loaded.quote.duration_label,
            "Sponsorship priced"
        );
        Ok(loaded)
    }
}
