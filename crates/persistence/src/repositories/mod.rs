//! Repository implementations for database operations.

pub mod boundary;
pub mod containment_state;
pub mod location;
pub mod notification;
pub mod tracked_entity;

pub use boundary::BoundaryRepository;
pub use containment_state::ContainmentStateRepository;
pub use location::LocationRepository;
pub use notification::NotificationRepository;
pub use tracked_entity::TrackedEntityRepository;
