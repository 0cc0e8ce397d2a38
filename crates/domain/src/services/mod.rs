//! Domain services for PetTrack.
//!
//! Services contain the geofence logic that operates on domain models. Only
//! [`ingestion`] touches storage; the geometry kernel and the evaluator are
//! pure.

pub mod boundary_set;
pub mod entity_locks;
pub mod evaluator;
pub mod geometry;
pub mod ingestion;

pub use boundary_set::BoundarySet;
pub use entity_locks::EntityLocks;
pub use evaluator::{
    BoundaryTransition, Evaluation, EvaluationPolicy, GeofenceEvaluator, SkippedBoundary,
    Transition,
};
pub use geometry::{
    contains, contains_validated, try_contains, validate_polygon, vertex_count, GeometryError,
};
pub use ingestion::{
    EvaluationStatus, EvaluationSummary, IngestError, IngestOutcome, IngestionPipeline,
};
