//! Observability module for the token verifier.
//!
//! Provides metrics definitions and the Prometheus recorder setup.

pub mod metrics;
