//! Location ingestion pipeline.
//!
//! Validates an upload, persists it, then evaluates it against the entity's
//! boundaries inside the entity's exclusive scope. Once the sample is stored
//! the ingest succeeds: failures after that point degrade the evaluation
//! instead of losing the sample.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::boundary_set::BoundarySet;
use super::entity_locks::EntityLocks;
use super::evaluator::{BoundaryTransition, Evaluation, EvaluationPolicy, GeofenceEvaluator};
use crate::models::location::TimestampInput;
use crate::models::{
    Coordinate, EntityId, LocationRecord, LocationSample, Notification,
    RawLocationSample,
};
use crate::store::{GeofenceStore, StoreError};
use shared::validation;

/// Reasons an ingest is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    #[error("Batch mixes entities: expected {expected}, found {found}")]
    MixedEntities { expected: EntityId, found: EntityId },

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StoreError),
}

impl IngestError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::InvalidCoordinate(_) => "invalid_coordinate",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
            Self::UnknownEntity(_) => "unknown_entity",
            Self::MixedEntities { .. } => "mixed_entities",
            Self::StorageFailure(_) => "storage_failure",
        }
    }
}

/// How far evaluation got for an ingested sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Evaluated,
    NoBoundaries,
    Degraded,
}

impl EvaluationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evaluated => "evaluated",
            Self::NoBoundaries => "no_boundaries",
            Self::Degraded => "degraded",
        }
    }
}

/// Evaluation result reported to the ingest caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub status: EvaluationStatus,
    pub contained: Option<bool>,
    pub transitions: Vec<BoundaryTransition>,
    pub skipped_boundaries: Vec<Uuid>,
    pub notifications: Vec<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
}

impl EvaluationSummary {
    fn degraded(reason: String) -> Self {
        Self {
            status: EvaluationStatus::Degraded,
            contained: None,
            transitions: Vec::new(),
            skipped_boundaries: Vec::new(),
            notifications: Vec::new(),
            degraded_reason: Some(reason),
        }
    }

    fn from_evaluation(
        status: EvaluationStatus,
        evaluation: Evaluation,
        notifications: Vec<Notification>,
        degraded_reason: Option<String>,
    ) -> Self {
        Self {
            status,
            contained: evaluation.contained,
            transitions: evaluation.transitions,
            skipped_boundaries: evaluation.skipped.iter().map(|s| s.boundary_id).collect(),
            notifications,
            degraded_reason,
        }
    }
}

/// Result of a successful ingest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub location: LocationRecord,
    pub evaluation: EvaluationSummary,
}

/// Records location samples and drives geofence evaluation.
pub struct IngestionPipeline {
    store: Arc<dyn GeofenceStore>,
    evaluator: GeofenceEvaluator,
    locks: EntityLocks,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn GeofenceStore>, policy: EvaluationPolicy) -> Self {
        Self {
            store,
            evaluator: GeofenceEvaluator::new(policy),
            locks: EntityLocks::new(),
        }
    }

    pub fn policy(&self) -> EvaluationPolicy {
        self.evaluator.policy()
    }

    /// Validates an upload into a [`LocationSample`].
    ///
    /// A missing timestamp defaults to `received_at`.
    pub fn validate_sample(
        raw: &RawLocationSample,
        received_at: DateTime<Utc>,
    ) -> Result<LocationSample, IngestError> {
        let entity_id = raw
            .entity_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(IngestError::MissingField("entityId"))?;
        let latitude = raw.latitude.ok_or(IngestError::MissingField("latitude"))?;
        let longitude = raw.longitude.ok_or(IngestError::MissingField("longitude"))?;

        // An id that fails the format rules can never have been registered.
        if validation::validate_entity_id(entity_id).is_err() {
            return Err(IngestError::UnknownEntity(EntityId::new(entity_id)));
        }

        let coordinate = Coordinate::validated(latitude, longitude).map_err(|_| {
            IngestError::InvalidCoordinate(format!(
                "latitude {latitude} must be within [-90, 90] and longitude {longitude} within [-180, 180]"
            ))
        })?;

        let observed_at = match &raw.timestamp {
            None => received_at,
            Some(TimestampInput::Millis(millis)) => validation::millis_to_datetime(*millis)
                .map_err(|_| IngestError::InvalidTimestamp(millis.to_string()))?,
            Some(TimestampInput::FractionalMillis(millis)) => {
                let whole = millis.trunc();
                if !whole.is_finite() || whole.abs() >= i64::MAX as f64 {
                    return Err(IngestError::InvalidTimestamp(millis.to_string()));
                }
                validation::millis_to_datetime(whole as i64)
                    .map_err(|_| IngestError::InvalidTimestamp(millis.to_string()))?
            }
            Some(TimestampInput::Text(text)) => validation::parse_timestamp(text)
                .map_err(|_| IngestError::InvalidTimestamp(text.clone()))?,
        };

        Ok(LocationSample {
            entity_id: EntityId::new(entity_id),
            coordinate,
            observed_at,
            received_at,
        })
    }

    /// Ingests a single upload.
    pub async fn ingest(&self, raw: RawLocationSample) -> Result<IngestOutcome, IngestError> {
        let sample = Self::validate_sample(&raw, Utc::now())?;
        self.ensure_entity(&sample.entity_id).await?;

        let _guard = self.locks.acquire(&sample.entity_id).await;
        let boundaries = self.load_boundaries(&sample.entity_id).await;
        self.ingest_locked(sample, boundaries.as_ref()).await
    }

    /// Ingests a batch for one entity.
    ///
    /// Every sample is validated before any is stored. Samples are then
    /// processed in array order under a single hold of the entity's scope,
    /// against one boundary snapshot taken when the scope is acquired.
    /// A storage failure stops the batch; samples before it stay recorded.
    pub async fn ingest_batch(
        &self,
        entity_id: Option<String>,
        raws: Vec<RawLocationSample>,
    ) -> Result<Vec<IngestOutcome>, IngestError> {
        let received_at = Utc::now();
        let mut samples = Vec::with_capacity(raws.len());
        for mut raw in raws {
            if raw.entity_id.is_none() {
                raw.entity_id = entity_id.clone();
            }
            samples.push(Self::validate_sample(&raw, received_at)?);
        }

        let Some(expected) = samples.first().map(|s| s.entity_id.clone()) else {
            return Ok(Vec::new());
        };
        if let Some(other) = samples.iter().find(|s| s.entity_id != expected) {
            return Err(IngestError::MixedEntities {
                expected,
                found: other.entity_id.clone(),
            });
        }
        if let Some(declared) = entity_id.as_deref().map(str::trim) {
            if declared != expected.as_str() {
                return Err(IngestError::MixedEntities {
                    expected: EntityId::new(declared),
                    found: expected,
                });
            }
        }

        self.ensure_entity(&expected).await?;

        let _guard = self.locks.acquire(&expected).await;
        let boundaries = self.load_boundaries(&expected).await;
        let mut outcomes = Vec::with_capacity(samples.len());
        for sample in samples {
            outcomes.push(self.ingest_locked(sample, boundaries.as_ref()).await?);
        }

        tracing::info!(
            entity_id = %expected,
            count = outcomes.len(),
            "Location batch ingested"
        );
        Ok(outcomes)
    }

    async fn ensure_entity(&self, entity_id: &EntityId) -> Result<(), IngestError> {
        match self.store.entity_exists(entity_id).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::debug!(entity_id = %entity_id, "Rejecting sample for unknown entity");
                Err(IngestError::UnknownEntity(entity_id.clone()))
            }
            Err(e) => {
                tracing::error!(entity_id = %entity_id, error = %e, "Entity lookup failed");
                Err(e.into())
            }
        }
    }

    /// Stores and evaluates a sample. The caller holds the entity's scope.
    async fn ingest_locked(
        &self,
        mut sample: LocationSample,
        boundaries: Result<&BoundarySet, &StoreError>,
    ) -> Result<IngestOutcome, IngestError> {
        // Stamp arrival inside the scope so evaluation order and
        // `received_at` order agree.
        let now = Utc::now();
        if now > sample.received_at {
            sample.received_at = now;
        }

        let location = self.store.append_location(&sample).await.map_err(|e| {
            tracing::error!(
                entity_id = %sample.entity_id,
                error = %e,
                "Failed to store location sample"
            );
            IngestError::from(e)
        })?;

        let evaluation = self.evaluate_and_commit(&sample, boundaries).await;

        tracing::debug!(
            entity_id = %sample.entity_id,
            location_id = location.id,
            status = evaluation.status.as_str(),
            notifications = evaluation.notifications.len(),
            "Location sample ingested"
        );

        Ok(IngestOutcome {
            location,
            evaluation,
        })
    }

    async fn load_boundaries(&self, entity_id: &EntityId) -> Result<BoundarySet, StoreError> {
        BoundarySet::boundaries_for(self.store.as_ref(), entity_id)
            .await
            .map_err(|e| {
                tracing::error!(
                    entity_id = %entity_id,
                    error = %e,
                    "Failed to load boundaries, evaluation degraded"
                );
                e
            })
    }

    async fn evaluate_and_commit(
        &self,
        sample: &LocationSample,
        boundaries: Result<&BoundarySet, &StoreError>,
    ) -> EvaluationSummary {
        let boundaries = match boundaries {
            Ok(boundaries) => boundaries,
            Err(e) => {
                return EvaluationSummary::degraded(format!("could not load boundaries: {e}"));
            }
        };
        let prior = match self.store.load_containment_state(&sample.entity_id).await {
            Ok(prior) => prior,
            Err(e) => {
                tracing::error!(
                    entity_id = %sample.entity_id,
                    error = %e,
                    "Failed to load containment state, evaluation degraded"
                );
                return EvaluationSummary::degraded(format!(
                    "could not load containment state: {e}"
                ));
            }
        };

        let evaluation = self.evaluator.evaluate(sample, boundaries, &prior);
        let status = if boundaries.is_empty() {
            EvaluationStatus::NoBoundaries
        } else {
            EvaluationStatus::Evaluated
        };

        if evaluation.state == prior && !evaluation.has_events() {
            return EvaluationSummary::from_evaluation(status, evaluation, Vec::new(), None);
        }

        match self
            .store
            .commit_evaluation(&sample.entity_id, &evaluation.state, &evaluation.events)
            .await
        {
            Ok(notifications) => {
                EvaluationSummary::from_evaluation(status, evaluation, notifications, None)
            }
            Err(e) => {
                tracing::error!(
                    entity_id = %sample.entity_id,
                    error = %e,
                    dropped_events = evaluation.events.len(),
                    "Failed to commit evaluation, evaluation degraded"
                );
                EvaluationSummary::from_evaluation(
                    EvaluationStatus::Degraded,
                    evaluation,
                    Vec::new(),
                    Some(format!("could not persist evaluation: {e}")),
                )
            }
        }
    }
}

impl std::fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("policy", &self.evaluator.policy())
            .field("locks", &self.locks)
            .finish()
    }
}
