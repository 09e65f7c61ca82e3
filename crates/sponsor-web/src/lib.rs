//! Sponsor Web Frontend
//!
//! Leptos-based WASM pages for the sponsor checkout and its return landing.

mod api;
mod app;
mod browser;
mod components;
mod pages;

pub use app::App;
pub use browser::{BrowserNavigator, LocalStorageTokens};

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
