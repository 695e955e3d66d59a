//! Terminal UI for browsing movies.

mod browser;
/// Browser state and key actions.
pub mod state;
mod ui;

pub use browser::run_browser;
