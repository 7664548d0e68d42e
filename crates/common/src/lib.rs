//! Shared vocabulary between the NFC client and the verification service.
//!
//! The NFC client decodes the same NDEF text-record payload on-device before
//! posting the token text; keeping the codec and the decision kinds here
//! means both sides agree on the byte-level format and the outcome taxonomy.
//!
//! # Modules
//!
//! - `ndef` - NDEF text-record codec
//! - `types` - Verification decision kinds

pub mod ndef;
pub mod types;
