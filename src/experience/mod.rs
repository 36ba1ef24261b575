//! Experience Log
//!
//! Append-mostly record of agent interactions and their outcomes, queryable
//! by semantic similarity plus exact-match filters.
//!
//! Components:
//! - Types: Experience, Feedback, Rating
//! - Filters: query descriptor applied over semantic hits
//! - Semantic: store seam plus an in-memory reference backend
//! - Store: the log itself

pub mod filters;
pub mod semantic;
pub mod store;
pub mod types;

pub use filters::ExperienceFilters;
pub use semantic::{InMemorySemanticStore, SemanticMatch, SemanticRecord, SemanticStore};
pub use store::{ExperienceStore, StoreConfig};
pub use types::{Experience, Feedback, Rating};
