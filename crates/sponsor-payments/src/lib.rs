//! # sponsor-payments
//!
//! Networked steps of the sponsorship checkout: loading the subject, creating
//! the payment intent and hosted checkout session, redirecting, and confirming
//! the payment once the browser comes back.
//!
//! ## Hosted Checkout
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ Sponsor Page│────▶│ Hosted Checkout │────▶│  Success Page   │
//! │  (quote)    │     │      Page       │     │ (confirm, route)│
//! └─────────────┘     └─────────────────┘     └─────────────────┘
//!        │                                        │          │
//!   intent + session                           desktop     mobile
//!   created first                                 ▼          ▼
//!                                           web success   app deep link
//! ```
//!
//! Every remote call goes through [`SponsorApi`] and every browser action
//! through [`Navigator`], so the whole flow runs in tests against
//! [`mock::MockSponsorApi`] and [`mock::RecordingNavigator`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sponsor_payments::{ApiConfig, FlowConfig, HttpSponsorApi, PageServices, SponsorFlow};
//!
//! let api = Arc::new(HttpSponsorApi::new(ApiConfig::for_host("rescue.org"))?);
//! let flow = SponsorFlow::new(&entry_url, PageServices { api, navigator, tokens }, FlowConfig::default());
//!
//! flow.load().await?;
//! flow.pay().await?; // browser is now on the hosted checkout page
//! ```

pub mod api;
pub mod checkout;
pub mod client;
pub mod config;
pub mod confirm;
pub mod loader;
pub mod mock;
pub mod navigate;
pub mod page;

pub use api::{CheckoutMetadata, CheckoutSessionRequest, SponsorApi, TokenStatus};
pub use checkout::{CheckoutUrls, PaymentOrchestrator, PaymentOutcome, PaymentState};
pub use client::HttpSponsorApi;
pub use config::{ApiConfig, ApiMode, ClientConfig, FlowConfig};
pub use confirm::{ReturnHandler, ReturnRoute};
pub use loader::{LoadedSponsorship, SponsorshipLoader};
pub use navigate::{Navigator, redirect_with_grace};
pub use page::{PageServices, SponsorFlow};

pub use sponsor_core::{Result, SponsorError};
