//! HTTP route handlers.

pub mod boundaries;
pub mod entities;
pub mod health;
pub mod locations;
pub mod notifications;
