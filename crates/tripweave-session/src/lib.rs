//! Itinerary assembly and the per-session planning pipeline.
//!
//! A [`Session`] ties the travel MDP, the Q-learning agent and the preference
//! model together with an activity [`Catalog`]. [`Session::generate_itinerary`]
//! runs the agent stages in a fixed order and returns the itinerary with
//! everything the stages found along the way.

mod budget;
mod catalog;
mod config;
mod error;
mod handle;
mod itinerary;
pub mod pipeline;
mod session;
mod snapshot;

pub use budget::{BudgetBreakdown, BudgetRecord};
pub use catalog::{Activity, Catalog, City, CrowdTag, Destination};
pub use config::SessionConfig;
pub use error::SessionError;
pub use handle::SessionHandle;
pub use itinerary::{
    DayPlan, Itinerary, MAX_ACTIVITIES_PER_DAY, MAX_TRIP_DAYS, ScheduledActivity, TripParams,
    assemble, city_index, select_activities,
};
pub use pipeline::{AgentStage, ReplanReason};
pub use session::{
    DEFAULT_PERSONA, DEFAULT_THEME, GenerationReport, ReplanReport, RestoreReport, Session,
};
pub use snapshot::{SavedPreference, SessionSnapshot};
