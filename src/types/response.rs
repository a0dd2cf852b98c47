use std::any::{type_name, TypeId};

use serde_json::Value;

use crate::{
    error::{PlannerError, Result},
    schemas::{CompletionSchema, SchemaHandle},
    types::itinerary::TripPlan,
};

/// Coerce a parsed JSON object into a [`TripPlan`], reporting the JSON path of any shape error.
pub fn coerce_trip_plan(payload: &Value) -> Result<TripPlan> {
    deserialize_structured_response::<TripPlan>(payload, TripPlan::schema())
}

pub fn deserialize_structured_response<T>(payload: &Value, schema: &SchemaHandle) -> Result<T>
where
    T: CompletionSchema,
{
    ensure_schema_matches::<T>(schema)?;

    serde_path_to_error::deserialize(payload).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        PlannerError::Validation(format!(
            "failed to read `{}` at {}: {}",
            schema.schema_name(),
            location,
            err.inner()
        ))
    })
}

fn ensure_schema_matches<T: 'static>(schema: &SchemaHandle) -> Result<()> {
    if schema.type_id() != TypeId::of::<T>() {
        return Err(PlannerError::Validation(format!(
            "schema `{}` does not match target type `{}`",
            schema.schema_name(),
            type_name::<T>(),
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_error_reports_path() {
        let err = coerce_trip_plan(&json!({
            "destination": "京都",
            "itinerary": "day one: 清水寺"
        }))
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("itinerary"), "{message}");
        assert!(message.contains("expected a list"), "{message}");
    }

    #[test]
    fn test_single_string_activity_is_promoted() {
        let plan = coerce_trip_plan(&json!({
            "itinerary": [{"day": 1, "activities": "清水寺"}]
        }))
        .unwrap();

        assert_eq!(plan.itinerary[0].activities[0].name, "清水寺");
    }

    #[test]
    fn test_missing_sections_default() {
        let plan = coerce_trip_plan(&json!({"destination": "京都"})).unwrap();
        assert!(plan.itinerary.is_empty());
        assert!(plan.suggestions.is_none());
    }
}
