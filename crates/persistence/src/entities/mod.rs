//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod boundary;
pub mod containment_state;
pub mod location;
pub mod notification;
pub mod tracked_entity;

pub use boundary::BoundaryEntity;
pub use containment_state::ContainmentStateEntity;
pub use location::LocationEntity;
pub use notification::NotificationEntity;
pub use tracked_entity::TrackedEntityEntity;
