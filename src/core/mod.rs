//! Core matching, grouping and pairing modules

pub mod footprint;
pub mod normalize;
pub mod dedup;
pub mod assembly;
pub mod coherence;
pub mod planner;

// Re-export main types
pub use assembly::AssembledGroup;
pub use coherence::CoherenceMatcher;
pub use footprint::Footprint;
pub use planner::WorkPlan;
