//! Domain Models
//!
//! Sponsorship subjects, remote API records and the per-page checkout session.
//! Monetary values use `rust_decimal`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::Quote;

/// Sponsorship mode, as carried in the `type` entry parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectMode {
    Specific,
    #[serde(rename = "sized")]
    SizeTier,
    Random,
    #[serde(rename = "renew")]
    Renewal,
}

impl SubjectMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Specific => "specific",
            Self::SizeTier => "sized",
            Self::Random => "random",
            Self::Renewal => "renew",
        }
    }

    /// Parse a new-sponsorship `type` value. Renewals are selected by `action`, not `type`.
    pub fn from_type_param(s: &str) -> Option<Self> {
        match s {
            "specific" => Some(Self::Specific),
            "sized" => Some(Self::SizeTier),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubjectMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is being paid for
///
/// Exactly one of a dog subject or a renewal context is ever populated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum SponsorshipSubject {
    Specific { dog_id: String },
    #[serde(rename = "sized")]
    SizeTier { dog_id: String },
    Random,
    #[serde(rename = "renew")]
    Renewal { adoption_id: String, weeks: u32 },
}

impl SponsorshipSubject {
    pub const fn mode(&self) -> SubjectMode {
        match self {
            Self::Specific { .. } => SubjectMode::Specific,
            Self::SizeTier { .. } => SubjectMode::SizeTier,
            Self::Random => SubjectMode::Random,
            Self::Renewal { .. } => SubjectMode::Renewal,
        }
    }

    pub fn dog_id(&self) -> Option<&str> {
        match self {
            Self::Specific { dog_id } | Self::SizeTier { dog_id } => Some(dog_id),
            _ => None,
        }
    }

    pub fn renewal_adoption_id(&self) -> Option<&str> {
        match self {
            Self::Renewal { adoption_id, .. } => Some(adoption_id),
            _ => None,
        }
    }

    pub const fn is_renewal(&self) -> bool {
        matches!(self, Self::Renewal { .. })
    }
}

/// Dog size classification
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DogSize {
    Small,
    Medium,
    Large,
    Other(String),
}

impl From<String> for DogSize {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SMALL" => Self::Small,
            "MEDIUM" => Self::Medium,
            "LARGE" => Self::Large,
            _ => Self::Other(s),
        }
    }
}

impl From<DogSize> for String {
    fn from(size: DogSize) -> Self {
        match size {
            DogSize::Small => "SMALL".into(),
            DogSize::Medium => "MEDIUM".into(),
            DogSize::Large => "LARGE".into(),
            DogSize::Other(s) => s,
        }
    }
}

/// Breed as returned by the API: either a plain name or a nested record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Breed {
    Name(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        size: Option<DogSize>,
    },
}

impl Breed {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Detailed { name, .. } => name.as_deref(),
        }
    }

    pub const fn size(&self) -> Option<&DogSize> {
        match self {
            Self::Name(_) => None,
            Self::Detailed { size, .. } => size.as_ref(),
        }
    }
}

/// Shelter reference embedded in a dog record
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelterRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// A dog record from the public read endpoint
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dog {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub size: Option<DogSize>,

    #[serde(default)]
    pub breed: Option<Breed>,

    #[serde(default)]
    pub age: Option<serde_json::Value>,

    #[serde(default)]
    pub primary_image_url: Option<String>,

    #[serde(default, rename = "shelterId")]
    pub shelter: Option<ShelterRef>,
}

impl Dog {
    /// Size from the record, falling back to the breed's size
    pub fn effective_size(&self) -> Option<&DogSize> {
        self.size
            .as_ref()
            .or_else(|| self.breed.as_ref().and_then(Breed::size))
    }
}

/// Dog response body: either `{ "dog": {...} }` or the bare record
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum DogEnvelope {
    Wrapped { dog: Dog },
    Bare(Dog),
}

impl DogEnvelope {
    pub fn into_dog(self) -> Dog {
        match self {
            Self::Wrapped { dog } | Self::Bare(dog) => dog,
        }
    }
}

/// An existing adoption, loaded for renewal
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adoption {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub weekly_fee: Option<Decimal>,

    #[serde(default)]
    pub dog_id: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

/// Adoption response body: either `{ "adoption": {...} }` or the bare record
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum AdoptionEnvelope {
    Wrapped { adoption: Adoption },
    Bare(Adoption),
}

impl AdoptionEnvelope {
    pub fn into_adoption(self) -> Adoption {
        match self {
            Self::Wrapped { adoption } | Self::Bare(adoption) => adoption,
        }
    }
}

/// Server-side payment intent, opaque beyond its identifier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRecord {
    pub payment_intent_id: String,

    #[serde(default)]
    pub amount: Option<serde_json::Value>,

    #[serde(default)]
    pub currency: Option<String>,
}

impl PaymentIntentRecord {
    /// Extract the intent from a sponsorship/renewal response.
    ///
    /// The record normally sits under `payment`; a top-level
    /// `paymentIntentId` is accepted as well. Returns `None` when no
    /// non-empty identifier is present.
    pub fn from_response(body: &serde_json::Value) -> Option<Self> {
        let candidate = body
            .get("payment")
            .filter(|p| p.get("paymentIntentId").is_some())
            .unwrap_or(body);

        let record: Self = serde_json::from_value(candidate.clone()).ok()?;
        if record.payment_intent_id.trim().is_empty() {
            return None;
        }
        Some(record)
    }
}

/// Hosted checkout session, consumed once to redirect the browser
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionHandle {
    #[serde(rename = "url")]
    pub redirect_url: String,

    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Result of confirming a payment on return
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfirmationRecord {
    pub adoption_id: Option<String>,
}

impl ConfirmationRecord {
    /// Read `adoption.id`, falling back to `adoptionId`
    pub fn from_response(body: &serde_json::Value) -> Self {
        let nested = body
            .get("adoption")
            .and_then(|a| a.get("id").or_else(|| a.get("_id")))
            .and_then(serde_json::Value::as_str);
        let flat = body.get("adoptionId").and_then(serde_json::Value::as_str);

        Self {
            adoption_id: nested.or(flat).map(String::from),
        }
    }
}

/// Unique checkout session identifier (one per page load)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-page checkout state
///
/// Created once from the entry URL, mutated in sequence by the loader and
/// payment steps, discarded on navigation away.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub id: SessionId,

    /// `None` until mode resolution succeeds
    pub subject: Option<SponsorshipSubject>,

    #[serde(skip_serializing)]
    pub auth_token: Option<String>,

    pub amount: Decimal,

    pub duration_label: String,

    /// Display name of the sponsored dog, when one was fetched
    pub subject_name: Option<String>,

    pub loading: bool,

    pub last_error: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn new(auth_token: Option<String>) -> Self {
        Self {
            id: SessionId::new(),
            subject: None,
            auth_token,
            amount: Decimal::ZERO,
            duration_label: String::new(),
            subject_name: None,
            loading: false,
            last_error: None,
            created_at: Utc::now(),
        }
    }

    /// Record a priced subject
    pub fn apply_quote(
        &mut self,
        subject: SponsorshipSubject,
        quote: Quote,
        subject_name: Option<String>,
    ) {
        self.subject = Some(subject);
        self.amount = quote.amount;
        self.duration_label = quote.duration_label;
        self.subject_name = subject_name;
        self.last_error = None;
    }

    /// Loaded with a non-negative amount
    pub fn is_payable(&self) -> bool {
        self.subject.is_some() && self.amount >= Decimal::ZERO
    }

    pub fn quote(&self) -> Quote {
        Quote {
            amount: self.amount,
            duration_label: self.duration_label.clone(),
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Record a user-visible failure and release the loading flag
    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}
