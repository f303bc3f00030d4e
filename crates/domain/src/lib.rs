//! # lumen-domain
//!
//! Pure domain model for the lumen lighting routine scheduler.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **Color Model** (color temperature, CIE xy, hex and hue/saturation conversions)
//! - Define **Light commands** (what is sent to a light and what it reports back)
//! - Define **Routines** (tracks of waypoints and instant events) and their sampling
//! - Define **Events** (lifecycle records)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod color;
pub mod event;
pub mod light;
pub mod routine;
