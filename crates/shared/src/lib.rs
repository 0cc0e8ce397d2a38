//! Shared utilities for the PetTrack backend.
//!
//! This crate provides validation helpers used by the domain and API crates:
//! - Coordinate range checks
//! - Entity identifier rules
//! - Timestamp parsing for location uploads

pub mod validation;
