// Public fallible APIs in this crate share one concrete error contract
// (`NewsdeskError`); per-function `# Errors` boilerplate would only repeat it.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod client;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod search;
pub mod store;

pub use client::Newsdesk;
pub use error::{NewsdeskError, Result};
pub use models::{SearchPage, SearchRequest};
