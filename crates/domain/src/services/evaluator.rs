//! Geofence transition evaluation.
//!
//! The evaluator compares a sample's containment in each boundary with the
//! entity's prior state and decides which notifications fire. It is a pure
//! function of `(sample, boundaries, prior state)`: every timestamp it writes
//! comes from the sample, so re-evaluating the same inputs yields the same
//! state and events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::boundary_set::BoundarySet;
use super::geometry::{self, GeometryError};
use crate::models::{
    BoundaryPolygon, ContainmentStatus, EntityState, LocationSample, NotificationEvent,
    NotificationKind,
};

/// Which transitions produce notifications.
///
/// Exits always notify. Entry notifications are opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationPolicy {
    #[serde(default)]
    pub notify_on_entry: bool,
}

impl EvaluationPolicy {
    pub fn exits_only() -> Self {
        Self {
            notify_on_entry: false,
        }
    }

    pub fn with_entry_notifications() -> Self {
        Self {
            notify_on_entry: true,
        }
    }
}

/// Classification of one boundary's status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// First evaluation against this boundary.
    Baseline,
    Exit,
    Entry,
    Unchanged,
}

impl Transition {
    pub fn classify(previous: ContainmentStatus, current: ContainmentStatus) -> Self {
        use ContainmentStatus::*;
        match (previous, current) {
            (Unknown, _) => Self::Baseline,
            (Inside, Outside) => Self::Exit,
            (Outside, Inside) => Self::Entry,
            _ => Self::Unchanged,
        }
    }
}

/// The outcome for one evaluated boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryTransition {
    pub boundary_id: Uuid,
    pub previous: ContainmentStatus,
    pub current: ContainmentStatus,
    pub transition: Transition,
}

/// A boundary left out of the evaluation because its polygon is malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBoundary {
    pub boundary_id: Uuid,
    pub reason: GeometryError,
}

/// Result of evaluating one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// State to persist. Skipped boundaries keep their prior rows; rows for
    /// boundaries outside the active set are dropped.
    pub state: EntityState,
    pub events: Vec<NotificationEvent>,
    pub transitions: Vec<BoundaryTransition>,
    pub skipped: Vec<SkippedBoundary>,
    /// Whether the sample lies inside any evaluated boundary. `None` when no
    /// boundary could be evaluated.
    pub contained: Option<bool>,
}

impl Evaluation {
    fn unevaluated(state: EntityState, skipped: Vec<SkippedBoundary>) -> Self {
        Self {
            state,
            events: Vec::new(),
            transitions: Vec::new(),
            skipped,
            contained: None,
        }
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Decides containment transitions and the notifications they fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeofenceEvaluator {
    policy: EvaluationPolicy,
}

impl GeofenceEvaluator {
    pub fn new(policy: EvaluationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> EvaluationPolicy {
        self.policy
    }

    /// Evaluates a sample against the entity's boundaries and prior state.
    pub fn evaluate(
        &self,
        sample: &LocationSample,
        boundaries: &BoundarySet,
        prior: &EntityState,
    ) -> Evaluation {
        let at = sample.received_at;
        let mut state = EntityState::from_rows(sample.entity_id.clone(), prior.rows().cloned());

        if boundaries.entity_id() != &sample.entity_id {
            tracing::warn!(
                entity_id = %sample.entity_id,
                boundary_set_entity_id = %boundaries.entity_id(),
                "Boundary set belongs to another entity, skipping evaluation"
            );
            return Evaluation::unevaluated(state, Vec::new());
        }

        let active = boundaries.ids();
        state.retain_boundaries(|id| active.contains(&id));

        if boundaries.is_empty() {
            return Evaluation::unevaluated(state, Vec::new());
        }

        let mut transitions = Vec::with_capacity(boundaries.len());
        let mut skipped = Vec::new();

        for (boundary, defect) in boundaries.checked() {
            match defect {
                None => {
                    let inside = geometry::contains_validated(sample.coordinate, boundary);
                    let previous = state.status_of(boundary.boundary_id);
                    let current = ContainmentStatus::from_contained(inside);
                    state.set(boundary.boundary_id, current, at);
                    transitions.push(BoundaryTransition {
                        boundary_id: boundary.boundary_id,
                        previous,
                        current,
                        transition: Transition::classify(previous, current),
                    });
                }
                Some(reason) => {
                    tracing::warn!(
                        entity_id = %sample.entity_id,
                        boundary_id = %boundary.boundary_id,
                        error = %reason,
                        "Skipping malformed boundary"
                    );
                    skipped.push(SkippedBoundary {
                        boundary_id: boundary.boundary_id,
                        reason: reason.clone(),
                    });
                }
            }
        }

        if transitions.is_empty() {
            return Evaluation::unevaluated(state, skipped);
        }

        let was_inside_any = transitions
            .iter()
            .any(|t| t.previous == ContainmentStatus::Inside);
        let was_outside_any = transitions
            .iter()
            .any(|t| t.previous == ContainmentStatus::Outside);
        let inside_any = transitions
            .iter()
            .any(|t| t.current == ContainmentStatus::Inside);

        let mut events = Vec::new();
        if was_inside_any && !inside_any {
            events.push(self.aggregate_event(
                sample,
                boundaries,
                &transitions,
                NotificationKind::Exit,
            ));
        } else if self.policy.notify_on_entry && !was_inside_any && was_outside_any && inside_any
        {
            events.push(self.aggregate_event(
                sample,
                boundaries,
                &transitions,
                NotificationKind::Entry,
            ));
        }

        if !events.is_empty() {
            tracing::info!(
                entity_id = %sample.entity_id,
                kind = %events[0].kind,
                boundary_id = ?events[0].boundary_id,
                "Geofence transition detected"
            );
        }

        Evaluation {
            state,
            events,
            transitions,
            skipped,
            contained: Some(inside_any),
        }
    }

    fn aggregate_event(
        &self,
        sample: &LocationSample,
        boundaries: &BoundarySet,
        transitions: &[BoundaryTransition],
        kind: NotificationKind,
    ) -> NotificationEvent {
        let wanted = match kind {
            NotificationKind::Exit => Transition::Exit,
            NotificationKind::Entry => Transition::Entry,
        };
        let mut involved: Vec<&BoundaryPolygon> = transitions
            .iter()
            .filter(|t| t.transition == wanted)
            .filter_map(|t| boundaries.get(t.boundary_id))
            .collect();

        let single = if involved.len() == 1 {
            involved.pop()
        } else {
            None
        };

        NotificationEvent {
            entity_id: sample.entity_id.clone(),
            boundary_id: single.map(|b| b.boundary_id),
            kind,
            message: transition_message(sample, kind, single),
            triggered_at: sample.received_at,
            seen: false,
        }
    }
}

fn transition_message(
    sample: &LocationSample,
    kind: NotificationKind,
    boundary: Option<&BoundaryPolygon>,
) -> String {
    let entity = &sample.entity_id;
    match (kind, boundary) {
        (NotificationKind::Exit, Some(b)) => {
            format!("{entity} has left the boundary area \"{}\".", b.name)
        }
        (NotificationKind::Exit, None) => {
            format!("{entity} has left all designated boundary areas.")
        }
        (NotificationKind::Entry, Some(b)) => {
            format!("{entity} has returned to the boundary area \"{}\".", b.name)
        }
        (NotificationKind::Entry, None) => {
            format!("{entity} has returned to a designated boundary area.")
        }
    }
}
