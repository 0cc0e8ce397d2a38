//! Domain models for PetTrack.

pub mod boundary;
pub mod containment;
pub mod coordinate;
pub mod entity;
pub mod location;
pub mod notification;

pub use boundary::{Boundary, BoundaryError, BoundaryPolygon};
pub use containment::{ContainmentStatus, EntityContainmentState, EntityState};
pub use coordinate::Coordinate;
pub use entity::{EntityId, TrackedEntity};
pub use location::{LocationRecord, LocationSample, RawLocationSample};
pub use notification::{Notification, NotificationEvent, NotificationKind};
