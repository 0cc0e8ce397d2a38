//! Tracked entity (collared animal) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Identifier of a tracked entity, e.g. a collar or dog ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A mobile entity whose location is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    pub entity_id: EntityId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Request payload for registering a tracked entity.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntityRequest {
    #[validate(length(min = 1, max = 64, message = "Entity ID must be 1-64 characters"))]
    pub entity_id: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

impl CreateEntityRequest {
    /// Trims both fields so length rules apply to what gets stored.
    pub fn normalized(mut self) -> Self {
        self.entity_id = self.entity_id.trim().to_string();
        self.name = self.name.trim().to_string();
        self
    }

    /// Runs the derived field checks plus the entity ID character rules.
    pub fn validate_all(&self) -> Result<(), validator::ValidationErrors> {
        let mut result = self.validate();
        if let Err(e) = shared::validation::validate_entity_id(&self.entity_id) {
            let mut errors = result.err().unwrap_or_else(validator::ValidationErrors::new);
            errors.add("entityId", e);
            result = Err(errors);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_is_transparent_in_json() {
        let id = EntityId::new("d1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"d1\"");
        let back: EntityId = serde_json::from_str("\"d1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId::from("rex").to_string(), "rex");
    }

    #[test]
    fn test_create_entity_request_validation() {
        let ok = CreateEntityRequest {
            entity_id: "d1".to_string(),
            name: "Rex".to_string(),
        };
        assert!(ok.validate_all().is_ok());

        let bad_id = CreateEntityRequest {
            entity_id: "bad id".to_string(),
            name: "Rex".to_string(),
        };
        assert!(bad_id.validate().is_ok());
        assert!(bad_id.validate_all().is_err());

        let empty_name = CreateEntityRequest {
            entity_id: "d1".to_string(),
            name: String::new(),
        };
        assert!(empty_name.validate_all().is_err());

        let blank_name = CreateEntityRequest {
            entity_id: " d1 ".to_string(),
            name: "   ".to_string(),
        }
        .normalized();
        assert_eq!(blank_name.entity_id, "d1");
        assert!(blank_name.validate_all().is_err());
    }
}
