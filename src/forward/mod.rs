//! Bounded one-shot HTTP forwarding.

mod client;

pub use client::{ForwardOutcome, Forwarder};
