//! Domain layer for PetTrack.
//!
//! Contains the geofence models, the containment kernel, the transition
//! evaluator and the ingestion pipeline, plus the storage interfaces they
//! depend on.

pub mod models;
pub mod services;
pub mod store;
