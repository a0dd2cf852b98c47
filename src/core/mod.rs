pub mod conversation;
pub mod planner;

pub use conversation::{Slot, SlotFiller};
pub use planner::{PlannerConfig, TripPlanner, DEFAULT_MODEL, DEFAULT_TIMEOUT};
