//! # lumen-app
//!
//! Application layer: use-cases, the routine engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceControl`: send commands to lights and read their state
//!   - `RoutineRepository`: CRUD for routine definitions
//!   - `EventPublisher`: publish lifecycle events
//! - Define **driving/inbound ports** as use-case structs:
//!   - `RoutineService`: create, update, list, get, delete routines
//!   - `RoutineEngine`: start, cancel and report on running routines
//! - Provide **in-process infrastructure** (event bus, best-effort dispatch) that doesn't need IO
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `lumen-domain` only (plus `tokio` for channels, timers and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatch;
pub mod event_bus;
pub mod ports;
pub mod routine_engine;
pub mod services;
pub mod session;
pub mod tracks;

#[cfg(test)]
mod testing;
