pub mod itinerary;
pub mod lenient;
pub mod response;
pub mod result;

pub use itinerary::{
    Accommodation, Activity, ActivityKind, Coordinates, DayPlan, Meal, MealKind, TransportLeg,
    TripPlan,
};
pub use response::{coerce_trip_plan, deserialize_structured_response};
pub use result::{PlanRequest, ReconciliationResult};
