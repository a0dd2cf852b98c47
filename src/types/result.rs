use serde::{Deserialize, Serialize};

use super::itinerary::{Activity, DayPlan, TripPlan};

/// Trip details gathered from the traveller before the model call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Raw text the traveller typed; scanned for must-include attractions
    pub user_text: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    /// ISO-8601 start date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travelers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_city: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
}

impl PlanRequest {
    pub fn new(destination: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            user_text: user_text.into(),
            ..Self::default()
        }
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = Some(days);
        self
    }

    pub fn with_start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_travelers(mut self, travelers: u32) -> Self {
        self.travelers = Some(travelers);
        self
    }

    pub fn with_departure_city(mut self, city: impl Into<String>) -> Self {
        self.departure_city = Some(city.into());
        self
    }

    pub fn with_preferences<I, S>(mut self, preferences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferences = preferences.into_iter().map(Into::into).collect();
        self
    }
}

/// Output of the response reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub destination: String,
    pub itinerary: Vec<DayPlan>,
    /// Model suggestions, with a coverage warning appended when requested attractions are missing
    pub suggestions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    /// Echo of the caller's budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    /// Echo of the caller's traveller count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travelers: Option<u32>,
    /// Echo of the caller's preferences
    #[serde(default)]
    pub preferences: Vec<String>,
    /// Requested attractions no activity name mentions
    #[serde(default)]
    pub missing_entities: Vec<String>,
    /// Advisory schema violations found in the raw model object (e.g. `"free"` in a price field)
    #[serde(default)]
    pub contract_issues: Vec<String>,
}

impl ReconciliationResult {
    /// Copy the caller's budget, traveller count and preferences onto the result.
    pub fn echo_request(mut self, request: &PlanRequest) -> Self {
        self.budget = request.budget;
        self.travelers = request.travelers;
        self.preferences = request.preferences.clone();
        self
    }

    pub fn day_count(&self) -> usize {
        self.itinerary.len()
    }

    pub fn has_coverage_gap(&self) -> bool {
        !self.missing_entities.is_empty()
    }

    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.itinerary.iter().flat_map(|day| day.activities.iter())
    }

    /// Non-transport activities the map cannot place.
    pub fn unmappable_activities(&self) -> impl Iterator<Item = &Activity> {
        self.itinerary.iter().flat_map(|day| day.unmappable_activities())
    }

    /// Storage form of the itinerary.
    pub fn to_trip_plan(&self) -> TripPlan {
        TripPlan {
            destination: Some(self.destination.clone()),
            days: u32::try_from(self.itinerary.len()).ok(),
            itinerary: self.itinerary.clone(),
            suggestions: Some(self.suggestions.clone()),
            total_cost: self.total_cost,
        }
    }
}
