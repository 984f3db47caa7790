//! Keygen Core - Platform-independent logic for the key generator viewer
//!
//! This crate provides everything the viewer does that does not touch the
//! browser or the renderer:
//! - Service endpoint configuration and URL resolution
//! - Wire types of the generation service
//! - The generate/download workflow state machine and session state
//! - Request-sequenced replacement of the displayed model
//! - STL decoding and recentering

pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod protocol;
pub mod service;
pub mod session;
pub mod viewport;

pub use config::{LogLevel, ServiceConfig};
pub use controller::{GenerationController, GenerationPhase, ModelRequest, Status};
pub use error::{ControllerError, GenerateError, ModelError};
pub use geometry::{Bounds, KeyGeometry};
pub use loader::{Install, LoadToken, ModelSlot};
pub use protocol::GenerateResponse;
pub use service::{load_geometry, KeyService};
pub use session::Session;
pub use viewport::Viewport;
