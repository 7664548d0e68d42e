//! Token Verification (TV) Service Library
//!
//! This library provides the credential-verification core behind the NFC
//! badge reader client: a token is presented once, checked against the trust
//! authority, and every re-presentation of the same identifier yields the
//! same decision.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP middleware layers
//! - `models` - Data models
//! - `observability` - Metrics definitions
//! - `routes` - Router and application state
//! - `services` - Business logic layer (verifier, trust-authority client)
//! - `store` - Verification record store
//! - `tasks` - Background maintenance tasks

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
pub mod store;
pub mod tasks;
