//! Container placement on a fixed N x N grid.
//!
//! [`PlacementEngine::place`] first tries to drop the new container into free
//! space without touching anything else. If no preferred size fits, it
//! searches every admissible re-layout of all containers and returns the one
//! with the lowest wasted-space / fragmentation / aspect-ratio score.

pub mod config;
mod engine;
pub mod types;

pub use config::{EngineConfig, FactorizationFallback, SearchBudget, DEFAULT_MAX_GRID_SIZE};
pub use engine::{OccupancyGrid, PlacementEngine, SizePreferences};
pub use types::*;
