//! Checkout Context
//!
//! Parses the sponsor page's entry URL and resolves the active auth token.
//! No network calls and no failure modes: missing parameters simply stay
//! unset until mode resolution rejects them.

use url::Url;

use crate::error::{Result, SponsorError};
use crate::model::{SponsorshipSubject, SubjectMode};
use crate::token::{TokenStore, token_preview};

/// Query parameter carrying the app's bearer token
pub const TOKEN_PARAM: &str = "token";

/// Raw entry parameters of the sponsor page
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryParams {
    pub dog_id: Option<String>,
    pub sponsorship_type: Option<String>,
    pub adoption_id: Option<String>,
    pub action: Option<String>,
    pub weeks: Option<String>,
    pub token: Option<String>,
}

impl EntryParams {
    /// Read parameters from a URL. Empty values count as absent.
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            let value = value.into_owned();
            match key.as_ref() {
                "dogId" => params.dog_id = Some(value),
                "type" => params.sponsorship_type = Some(value),
                "adoptionId" => params.adoption_id = Some(value),
                "action" => params.action = Some(value),
                "weeks" => params.weeks = Some(value),
                TOKEN_PARAM => params.token = Some(value),
                _ => {}
            }
        }
        params
    }

    pub fn is_renewal(&self) -> bool {
        self.adoption_id.is_some() && self.action.as_deref() == Some("renew")
    }

    /// Requested renewal weeks; anything unparseable, zero or absent is 1
    ///
    /// A count too large for `u32` is rejected rather than defaulted.
    pub fn requested_weeks(&self) -> Result<u32> {
        self.weeks.as_deref().map_or(Ok(1), parse_weeks)
    }

    /// Pick the single loading strategy these parameters select
    pub fn resolve_subject(&self) -> Result<SponsorshipSubject> {
        if let (Some(adoption_id), true) = (&self.adoption_id, self.is_renewal()) {
            return Ok(SponsorshipSubject::Renewal {
                adoption_id: adoption_id.clone(),
                weeks: self.requested_weeks()?,
            });
        }

        let mode = self
            .sponsorship_type
            .as_deref()
            .and_then(SubjectMode::from_type_param);

        match (mode, &self.dog_id) {
            (Some(SubjectMode::Random), _) => Ok(SponsorshipSubject::Random),
            (Some(SubjectMode::Specific), Some(dog_id)) => Ok(SponsorshipSubject::Specific {
                dog_id: dog_id.clone(),
            }),
            (Some(SubjectMode::SizeTier), Some(dog_id)) => Ok(SponsorshipSubject::SizeTier {
                dog_id: dog_id.clone(),
            }),
            _ => Err(SponsorError::InvalidParameters(format!(
                "type={:?} dogId={:?} adoptionId={:?} action={:?}",
                self.sponsorship_type, self.dog_id, self.adoption_id, self.action
            ))),
        }
    }
}

/// Leading-digit integer parse; non-positive or unparseable yields 1
fn parse_weeks(raw: &str) -> Result<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return Ok(1);
    }
    match digits.parse::<u32>() {
        Ok(0) => Ok(1),
        Ok(weeks) => Ok(weeks),
        Err(_) => Err(SponsorError::InvalidParameters(format!(
            "weeks={raw:?} is out of range"
        ))),
    }
}

/// Outcome of building the page context
#[derive(Clone, Debug)]
pub struct PageContext {
    pub params: EntryParams,

    /// Active bearer token (URL handoff first, then storage)
    pub auth_token: Option<String>,

    /// Entry URL with the token stripped, for `history.replaceState`
    pub cleaned_url: Url,

    /// Whether the token arrived via the URL
    pub token_from_url: bool,
}

/// Builds the page context from the entry URL and token storage
pub struct ContextBuilder<'a> {
    tokens: &'a dyn TokenStore,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(tokens: &'a dyn TokenStore) -> Self {
        Self { tokens }
    }

    pub fn build(&self, entry_url: &Url) -> PageContext {
        let params = EntryParams::from_url(entry_url);

        let (auth_token, token_from_url) = match params.token.clone() {
            Some(token) => {
                tracing::info!(token = %token_preview(&token), "Token found in URL, persisting");
                if let Err(e) = self.tokens.save(&token) {
                    // Still usable for this page load
                    tracing::warn!(error = %e, "Failed to persist handoff token");
                }
                (Some(token), true)
            }
            None => (self.tokens.load(), false),
        };

        tracing::debug!(
            has_token = auth_token.is_some(),
            renewal = params.is_renewal(),
            "Built sponsor page context"
        );

        PageContext {
            cleaned_url: strip_query_param(entry_url, TOKEN_PARAM),
            params,
            auth_token,
            token_from_url,
        }
    }
}

/// Copy of `url` without any `name` query parameter, other parameters kept in order
pub fn strip_query_param(url: &Url, name: &str) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != name)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut cleaned = url.clone();
    if kept.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(kept);
    }
    cleaned
}
