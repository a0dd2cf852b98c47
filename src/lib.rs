//! trip-agent-rs: turn unreliable LLM travel-planning output into checked itineraries
//!
//! The crate extracts the attractions a traveller explicitly asked for, asks a
//! chat-completion model for a day-by-day plan, and reconciles whatever text
//! comes back (fenced, prose-wrapped, double-encoded, truncated) into a typed
//! [`ReconciliationResult`], warning when requested attractions are missing.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use trip_agent_rs::{PlanRequest, TripPlanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let planner = TripPlanner::from_env()?;
//!     let request = PlanRequest::new("东京", "三天东京，一定要去东京塔和浅草寺").with_days(3);
//!
//!     let result = planner.plan(&request).await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! Reconciling a saved response needs no network:
//!
//! ```rust
//! use trip_agent_rs::{extract_required_attractions, reconcile};
//!
//! let required = extract_required_attractions("我想去东京塔");
//! let raw = "```json\n{\"destination\":\"东京\",\"itinerary\":[{\"day\":1,\"activities\":[{\"name\":\"东京塔\"}]}]}\n```";
//! let result = reconcile(raw, &required, "东京").unwrap();
//! assert!(result.missing_entities.is_empty());
//! ```

extern crate self as trip_agent_rs;

pub mod core;
pub mod error;
pub mod extract;
pub mod geo;
pub mod reconcile;
pub mod schemas;
pub mod services;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "relay")]
pub mod relay;

pub use crate::core::{PlannerConfig, Slot, SlotFiller, TripPlanner};
pub use error::{PlannerError, Result};
pub use extract::{extract_required_attractions, RequiredEntitySet};
pub use geo::{resolve_coordinates, resolve_hub, HubCategory, TransportHub};
pub use reconcile::{reconcile, Reconciler, ReconcilerConfig};
pub use schemas::{CompletionSchema, SchemaHandle};
pub use services::llm_client::{CompletionBackend, LlmClient};
pub use tripagent_macros::completion_schema;
pub use types::{
    Accommodation, Activity, ActivityKind, Coordinates, DayPlan, Meal, MealKind, PlanRequest,
    ReconciliationResult, TransportLeg, TripPlan,
};

pub use schemas as schema;
