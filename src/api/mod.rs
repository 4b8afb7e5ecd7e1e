//! HTTP surface: router, handlers, middleware, response types.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod types;

use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::Pipeline;

pub use router::{create_router, MAX_BODY_BYTES};

/// Shared state behind every handler: the immutable configuration and the
/// compiled pipeline.
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let pipeline = Pipeline::new(&config)?;
        Ok(Self { config, pipeline })
    }
}
