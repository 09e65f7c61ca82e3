//! Error Types

use thiserror::Error;

/// Result type alias for sponsorship operations
pub type Result<T> = std::result::Result<T, SponsorError>;

/// Sponsorship checkout errors
///
/// Each variant belongs to the step that produced it. Transport failures are
/// folded into the variant of the failing step rather than reported separately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SponsorError {
    /// Entry parameters matched no loading strategy
    #[error("Invalid sponsorship parameters: {0}")]
    InvalidParameters(String),

    /// Subject (dog or adoption) could not be fetched
    #[error("Load error: {0}")]
    Load(String),

    /// No auth token available when payment was initiated
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Payment intent creation failed
    #[error("Payment initialization failed: {0}")]
    PaymentInitialization(String),

    /// Hosted checkout session creation failed
    #[error("Checkout session error: {0}")]
    CheckoutSession(String),

    /// Payment confirmation on return failed
    #[error("Confirmation failed: {0}")]
    Confirmation(String),

    /// Token storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SponsorError {
    /// Check if the user may retry the failed step
    ///
    /// Only payment initiation failures re-arm the pay button.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationRequired | Self::PaymentInitialization(_) | Self::CheckoutSession(_)
        )
    }

    /// Check if the error ends the flow with no retry path
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmation(_))
    }

    /// Get user-facing message
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidParameters(_) => {
                "Invalid sponsorship parameters. Please try again from the app.".into()
            }
            Self::Load(msg) | Self::PaymentInitialization(msg) | Self::CheckoutSession(msg) => {
                format!("{msg}. Please try again.")
            }
            Self::AuthenticationRequired => {
                "Authentication required. Please sign in from the app and try again.".into()
            }
            Self::Confirmation(msg) => {
                format!("Failed to confirm payment ({msg}). Please contact support.")
            }
            Self::Storage(_) => "Could not save your session in this browser.".into(),
            Self::Config(_) => "Service configuration error.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(SponsorError::PaymentInitialization("x".into()).is_retryable());
        assert!(SponsorError::CheckoutSession("x".into()).is_retryable());
        assert!(!SponsorError::Load("x".into()).is_retryable());
        assert!(!SponsorError::Confirmation("x".into()).is_retryable());
    }

    #[test]
    fn test_confirmation_asks_for_support() {
        let err = SponsorError::Confirmation("HTTP 500".into());
        assert!(err.is_terminal());
        assert!(err.user_message().contains("contact support"));
        assert!(err.user_message().contains("HTTP 500"));
    }

    #[test]
    fn test_load_message_surfaces_cause() {
        let err = SponsorError::Load("Failed to load dog information (HTTP 404)".into());
        assert_eq!(
            err.user_message(),
            "Failed to load dog information (HTTP 404). Please try again."
        );
    }
}
