use chrono::{DateTime, Utc};
use common::types::DecisionKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on a token identifier, in bytes.
///
/// Applies to the identifier portion only, before any expiry suffix.
pub const MAX_TOKEN_ID_BYTES: usize = 256;

/// A bearer token as presented by the client.
///
/// The raw value is captured once and never mutated; the identifier and the
/// optional expiry are derived from it at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    raw: String,
    id: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Structural failures while parsing a presented token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenFormatError {
    #[error("Token identifier is empty")]
    EmptyIdentifier,

    #[error("Token identifier exceeds {MAX_TOKEN_ID_BYTES} bytes")]
    IdentifierTooLong,

    #[error("Token expiry is not a valid timestamp")]
    InvalidExpiry,
}

impl Token {
    /// Parse the raw token text.
    ///
    /// The text is an opaque identifier, optionally suffixed with
    /// `#<unix-seconds>` carrying an expiry. Tokens without the suffix never
    /// expire.
    pub fn parse(raw: &str) -> Result<Self, TokenFormatError> {
        let (id, expiry) = match raw.split_once('#') {
            Some((id, suffix)) => {
                let seconds: i64 = suffix
                    .parse()
                    .map_err(|_| TokenFormatError::InvalidExpiry)?;
                let expires_at = DateTime::<Utc>::from_timestamp(seconds, 0)
                    .ok_or(TokenFormatError::InvalidExpiry)?;
                (id, Some(expires_at))
            }
            None => (raw, None),
        };

        if id.is_empty() {
            return Err(TokenFormatError::EmptyIdentifier);
        }
        if id.len() > MAX_TOKEN_ID_BYTES {
            return Err(TokenFormatError::IdentifierTooLong);
        }

        Ok(Token {
            raw: raw.to_string(),
            id: id.to_string(),
            expires_at: expiry,
        })
    }

    /// The token text exactly as presented.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The logical identifier the store is keyed by.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The encoded expiry, if the token carries one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the token's expiry, if any, has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Per-identifier verification outcome, owned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRecord {
    pub token_id: String,
    pub decision: DecisionKind,
    pub first_verified_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub attempts: u64,
}

/// The decision returned to the caller. Created fresh per call; the store
/// persists the derived [`VerificationRecord`], never this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationDecision {
    pub decision: DecisionKind,
    pub message: String,
    #[serde(rename = "tokenId")]
    pub token_id: String,
}

impl VerificationDecision {
    pub fn new(decision: DecisionKind, message: impl Into<String>, token_id: impl Into<String>) -> Self {
        Self {
            decision,
            message: message.into(),
            token_id: token_id.into(),
        }
    }

    /// Rebuild the caller-facing decision from a stored record.
    pub fn from_record(record: &VerificationRecord) -> Self {
        let message = match record.decision {
            DecisionKind::Valid => "Token accepted by trust authority",
            DecisionKind::Invalid => "Token rejected by trust authority",
            DecisionKind::Expired => "Token has expired",
            DecisionKind::Malformed => "Token is malformed",
        };
        Self::new(record.decision, message, record.token_id.clone())
    }
}

/// Request envelope for the verify endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// Readiness probe response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_token() {
        let token = Token::parse("abc123").unwrap();
        assert_eq!(token.id(), "abc123");
        assert_eq!(token.raw(), "abc123");
        assert_eq!(token.expires_at(), None);
        assert!(!token.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_parse_token_with_expiry() {
        let token = Token::parse("abc123#1700000000").unwrap();
        assert_eq!(token.id(), "abc123");
        assert_eq!(
            token.expires_at(),
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0)
        );
    }

    #[test]
    fn test_parse_empty_token() {
        assert_eq!(Token::parse(""), Err(TokenFormatError::EmptyIdentifier));
    }

    #[test]
    fn test_parse_empty_identifier_with_expiry() {
        assert_eq!(
            Token::parse("#1700000000"),
            Err(TokenFormatError::EmptyIdentifier)
        );
    }

    #[test]
    fn test_parse_identifier_at_bound() {
        let id = "a".repeat(MAX_TOKEN_ID_BYTES);
        let token = Token::parse(&id).unwrap();
        assert_eq!(token.id().len(), MAX_TOKEN_ID_BYTES);
    }

    #[test]
    fn test_parse_identifier_over_bound() {
        let id = "a".repeat(MAX_TOKEN_ID_BYTES + 1);
        assert_eq!(Token::parse(&id), Err(TokenFormatError::IdentifierTooLong));
    }

    #[test]
    fn test_parse_non_numeric_expiry() {
        assert_eq!(
            Token::parse("abc123#tomorrow"),
            Err(TokenFormatError::InvalidExpiry)
        );
    }

    #[test]
    fn test_is_expired_at_boundary() {
        let token = Token::parse("abc123#1700000000").unwrap();
        let exact = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        assert!(token.is_expired_at(exact));
        assert!(!token.is_expired_at(exact - chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_decision_serializes_with_camel_case_token_id() {
        let decision = VerificationDecision::new(DecisionKind::Valid, "ok", "abc123");
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["decision"], "valid");
        assert_eq!(json["tokenId"], "abc123");
        assert!(json.get("token_id").is_none());
    }

    #[test]
    fn test_decision_from_record() {
        let record = VerificationRecord {
            token_id: "abc123".to_string(),
            decision: DecisionKind::Invalid,
            first_verified_at: Utc::now(),
            last_seen_at: Utc::now(),
            attempts: 3,
        };

        let decision = VerificationDecision::from_record(&record);
        assert_eq!(decision.decision, DecisionKind::Invalid);
        assert_eq!(decision.token_id, "abc123");
    }

    #[test]
    fn test_verify_request_requires_token_field() {
        let result: Result<VerifyRequest, _> = serde_json::from_str("{}");
        assert!(result.is_err());

        let request: VerifyRequest = serde_json::from_str(r#"{"token":"abc123"}"#).unwrap();
        assert_eq!(request.token, "abc123");
    }
}
