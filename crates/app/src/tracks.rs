//! Track processors.
//!
//! Each processor looks at one track of a running routine and works out what
//! the lights should be told on this tick. They never touch the session
//! registry: the engine applies their plans only while the session is still
//! the current one.

pub mod fade;
pub mod instant;

pub use fade::{FadeStep, Override, OverrideReason};
pub use instant::InstantFire;
