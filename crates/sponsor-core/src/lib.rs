//! # sponsor-core
//!
//! Domain types and pure logic for the dog sponsorship checkout flow.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Context    │──▶│    Loader    │──▶│   Payment    │──▶│    Return    │
//! │   Builder    │   │  + Pricing   │   │ Orchestrator │   │   Handler    │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//!    URL + token       dog/adoption       intent, hosted     confirm, deep
//!                      → amount           checkout redirect  link / success
//! ```
//!
//! This crate holds the parts with no I/O: entry-parameter parsing, mode
//! resolution, the price table, token storage and platform routing. The
//! networked steps live in `sponsor-payments`.

pub mod context;
pub mod error;
pub mod model;
pub mod platform;
pub mod pricing;
pub mod token;

pub use context::{ContextBuilder, EntryParams, PageContext};
pub use error::{Result, SponsorError};
pub use model::{
    Adoption, CheckoutSession, CheckoutSessionHandle, ConfirmationRecord, Dog, DogSize,
    PaymentIntentRecord, SponsorshipSubject, SubjectMode,
};
pub use platform::{AppLinks, Platform, ReturnParams};
pub use pricing::{PricingBasis, Quote};
pub use token::{MemoryTokenStore, TokenStore};
