//! # lumen-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for routine management and playback
//!   (`/api/routines`, `/api/trigger/{id}`, `/api/status`, …)
//! - Preview colors as sRGB hex for user interfaces (`/api/color/preview`)
//! - Stream routine lifecycle events as server-sent events
//!   (`/api/events/stream`)
//! - Map application results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `lumen-app` (for port traits, services and the routine engine)
//! and `lumen-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
mod error;
pub mod router;
pub mod state;

pub use error::ApiError;

#[cfg(test)]
mod test_support;
