//! Content-based predicate engine.

mod engine;

pub use engine::{FilterEngine, FilterVerdict, FilteringSummary};
