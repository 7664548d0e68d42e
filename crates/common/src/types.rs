//! Verification decision kinds shared with the NFC client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of verifying a presented token.
///
/// `Valid`, `Invalid` and `Expired` are terminal: once committed for a token
/// identifier they do not change on re-presentation. `Malformed` is produced
/// before any record exists and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    /// The trust authority vouched for the token.
    Valid,
    /// The trust authority rejected the token.
    Invalid,
    /// The token carried an expiry that has passed.
    Expired,
    /// The token failed structural validation.
    Malformed,
}

impl DecisionKind {
    /// Whether this decision is permanent for the token identifier.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DecisionKind::Malformed)
    }

    /// Wire representation, matching the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Valid => "valid",
            DecisionKind::Invalid => "invalid",
            DecisionKind::Expired => "expired",
            DecisionKind::Malformed => "malformed",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
