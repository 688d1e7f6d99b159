//! HTTP intake for GitHub webhooks.

mod server;
mod signature;

pub use server::{serve, AppState};
