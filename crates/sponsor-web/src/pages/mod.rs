//! Page Components

mod sponsor;
mod success;

pub use sponsor::SponsorPage;
pub use success::SuccessPage;
