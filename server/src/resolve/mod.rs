//! Update resolution: version sets, candidate predicates and the decision engine

pub mod engine;
pub mod predicates;
pub mod source;
pub mod version_set;

pub use engine::{Decision, UpdateEngine};
pub use source::{BundleSource, CandidateQuery, MemorySource};
pub use version_set::VersionSet;
