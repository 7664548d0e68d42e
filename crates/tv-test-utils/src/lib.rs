//! Test utilities for the token verifier.
//!
//! Provides `TestTvServer` for spawning real server instances in tests.

mod server_harness;

pub use server_harness::TestTvServer;
