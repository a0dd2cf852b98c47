use crate::completion_schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::lenient;

/// Structured trip plan the model is asked to return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[completion_schema(name = "TripPlan")]
pub struct TripPlan {
    /// Destination city or region (e.g., "东京" or "Tokyo, Japan")
    #[serde(default, deserialize_with = "lenient::text")]
    pub destination: Option<String>,
    /// Number of days covered by the itinerary
    #[serde(
        default,
        deserialize_with = "lenient::count",
        skip_serializing_if = "Option::is_none"
    )]
    pub days: Option<u32>,
    /// Day-by-day plan in chronological order
    #[serde(default, deserialize_with = "lenient::seq")]
    pub itinerary: Vec<DayPlan>,
    /// Practical advice for the whole trip (weather, tickets, local transport)
    #[serde(default, deserialize_with = "lenient::text")]
    pub suggestions: Option<String>,
    /// Estimated total cost for the whole trip; numeric, 0 when free
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_cost: Option<f64>,
}

/// One day of the itinerary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DayPlan {
    /// 1-based day counter; absent when the model left it out or it was unreadable
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    /// Calendar date, ISO-8601 when known
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Short theme or summary of the day
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Activities in visiting order
    #[serde(default, deserialize_with = "lenient::named_seq")]
    pub activities: Vec<Activity>,
    /// Where to stay that night
    #[serde(default, deserialize_with = "lenient::record", skip_serializing_if = "Option::is_none")]
    pub accommodation: Option<Accommodation>,
    /// Meals in order
    #[serde(default, deserialize_with = "lenient::named_seq")]
    pub meals: Vec<Meal>,
    /// Inter-city legs travelled on this day
    #[serde(default, deserialize_with = "lenient::opt_seq", skip_serializing_if = "Option::is_none")]
    pub transport: Option<Vec<TransportLeg>>,
    /// Free-text notes for the day
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Kind of an activity. Unknown labels read as `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Attraction,
    Restaurant,
    Shopping,
    /// Movement inside the city on the same day (metro, taxi, walk)
    Transport,
    Entertainment,
    #[default]
    Other,
}

impl ActivityKind {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "attraction" | "sightseeing" | "sight" | "landmark" | "景点" | "观光" => {
                ActivityKind::Attraction
            }
            "restaurant" | "food" | "dining" | "meal" | "餐饮" | "美食" => ActivityKind::Restaurant,
            "shopping" | "shop" | "购物" => ActivityKind::Shopping,
            "transport" | "transportation" | "transit" | "交通" => ActivityKind::Transport,
            "entertainment" | "show" | "nightlife" | "娱乐" => ActivityKind::Entertainment,
            _ => ActivityKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Attraction => "attraction",
            ActivityKind::Restaurant => "restaurant",
            ActivityKind::Shopping => "shopping",
            ActivityKind::Transport => "transport",
            ActivityKind::Entertainment => "entertainment",
            ActivityKind::Other => "other",
        }
    }
}

impl<'de> Deserialize<'de> for ActivityKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .map(ActivityKind::from_label)
            .unwrap_or_default())
    }
}

/// A single stop in a day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Activity {
    /// Name of the place or activity
    #[serde(default, deserialize_with = "lenient::required_text")]
    pub name: String,
    /// attraction, restaurant, shopping, transport, entertainment or other
    #[serde(rename = "type", default)]
    pub kind: ActivityKind,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// [longitude, latitude]
    #[serde(default, deserialize_with = "lenient::coordinates", skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Human readable duration, e.g. "2小时"
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Spend for this stop; numeric, 0 when free
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Entry ticket price; numeric, 0 when free
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub ticket_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub tips: Option<String>,
}

impl Activity {
    pub fn new(name: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Whether a map marker can be drawn. Intra-day transport never needs one.
    pub fn is_mappable(&self) -> bool {
        self.kind == ActivityKind::Transport || self.coordinates.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Accommodation {
    #[serde(default, deserialize_with = "lenient::required_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// [longitude, latitude]
    #[serde(default, deserialize_with = "lenient::coordinates", skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Nightly rate; numeric
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub price_per_night: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MealKind {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    #[default]
    Other,
}

impl<'de> Deserialize<'de> for MealKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        let label = value
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        Ok(match label.as_str() {
            "breakfast" | "早餐" => MealKind::Breakfast,
            "lunch" | "午餐" => MealKind::Lunch,
            "dinner" | "晚餐" => MealKind::Dinner,
            "snack" | "小吃" | "夜宵" => MealKind::Snack,
            _ => MealKind::Other,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Meal {
    /// breakfast, lunch, dinner, snack or other
    #[serde(rename = "type", default)]
    pub kind: MealKind,
    /// Restaurant or dish name
    #[serde(default, deserialize_with = "lenient::required_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// [longitude, latitude]
    #[serde(default, deserialize_with = "lenient::coordinates", skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Average spend per person; numeric, 0 when free
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub price_per_person: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Inter-city leg (flight, train, coach).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransportLeg {
    /// Departure hub or city
    #[serde(default, deserialize_with = "lenient::required_text")]
    pub from: String,
    /// Arrival hub or city
    #[serde(default, deserialize_with = "lenient::required_text")]
    pub to: String,
    #[serde(default, deserialize_with = "lenient::coordinates", skip_serializing_if = "Option::is_none")]
    pub from_coordinates: Option<Coordinates>,
    #[serde(default, deserialize_with = "lenient::coordinates", skip_serializing_if = "Option::is_none")]
    pub to_coordinates: Option<Coordinates>,
    /// flight, train, coach, ...
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    /// Ticket price; numeric
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// `[longitude, latitude]` in WGS-84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates(pub f64, pub f64);

impl Coordinates {
    /// Returns `None` for non-finite or out-of-range values.
    pub fn new(lng: f64, lat: f64) -> Option<Self> {
        let in_range = lng.is_finite()
            && lat.is_finite()
            && (-180.0..=180.0).contains(&lng)
            && (-90.0..=90.0).contains(&lat);
        in_range.then_some(Self(lng, lat))
    }

    pub fn lng(&self) -> f64 {
        self.0
    }

    pub fn lat(&self) -> f64 {
        self.1
    }
}

impl DayPlan {
    pub fn activity_names(&self) -> impl Iterator<Item = &str> {
        self.activities.iter().map(|a| a.name.as_str())
    }

    /// Non-transport activities without coordinates; these cannot be drawn on a map.
    pub fn unmappable_activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter().filter(|a| !a.is_mappable())
    }
}
