//! Posting writer support: post parameters and balanced posting plans.

pub mod params;
pub mod plan;

pub use params::PostParams;
pub use plan::{PlanTotals, PostingError, PostingPlan, PostingPlanner};
