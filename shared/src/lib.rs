//! Shared types and domain logic for the Farm Nursery Management Platform
//!
//! This crate contains the domain models shared between the backend and
//! auxiliary tooling, plus the pure sowing-schedule kernel: time-window
//! resolution, booking aggregation, and the progress-preserving merge.

pub mod aggregation;
pub mod models;
pub mod validation;
pub mod window;

pub use aggregation::*;
pub use models::*;
pub use validation::*;
pub use window::*;
