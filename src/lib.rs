//! sarplan: Deterministic Work-Order Planning for Sentinel-1 Acquisitions
//!
//! This library turns a flat, unordered list of Sentinel-1 acquisition
//! identifiers into reproducible processing work orders: deduplicated
//! single-scene jobs, multi-scene slice-assembly jobs where one pass was
//! recorded in sequential acquisitions, and 6/12-day scene pairs for
//! interferometric coherence.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    CoherenceJob, OrbitDirection, PlanError, PlanResult, Platform, PolarizationMode,
    ProcessingJob, ProductType, RunContext, SceneRecord, SlicePairing,
};

pub use crate::core::planner::{generate_file_list, generate_plan, write_plan, WorkPlan};
pub use crate::core::Footprint;
