//! Service Layer
//!
//! Orchestrates domain logic and coordinates with external dependencies.

pub mod generation_service;

pub use generation_service::{GenerationPorts, GenerationService, GenerationSettings};
