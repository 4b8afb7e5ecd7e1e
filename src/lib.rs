//! FlowBridge — content-aware HTTP webhook router.
//!
//! JSON documents arrive at `POST /webhook`, are admitted or dropped by a
//! configurable predicate engine, routed by the value of a nominated field,
//! and forwarded to the selected upstream with a bounded timeout. The
//! response mirrors the terminal outcome of the pipeline.

pub mod api;
pub mod config;
pub mod context;
pub mod fields;
pub mod filter;
pub mod forward;
pub mod logging;
pub mod pipeline;
pub mod routing;
pub mod server;
