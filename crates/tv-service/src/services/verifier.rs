//! Token verification pipeline.
//!
//! Checks run in cost order — structural, expiry, cache, authoritative — so
//! cheap rejects short-circuit before any store or authority access:
//!
//! 1. Structural validation (identifier present, within bound). Failures are
//!    `malformed` and never touch the store.
//! 2. Expiry, when the token encodes one. Expired presentations are recorded
//!    for replay audit but never reach the authority.
//! 3. Store lookup. A terminal record answers immediately; re-presenting the
//!    same physical tag always yields the same decision.
//! 4. The authoritative check, outside any store lock. The result is
//!    committed via `upsert`, which prefers a record committed by a racing
//!    caller in the meantime.

use crate::errors::TvError;
use crate::models::{Token, TokenFormatError, VerificationDecision, MAX_TOKEN_ID_BYTES};
use crate::services::authority::TrustAuthority;
use crate::store::VerificationStore;
use chrono::Utc;
use common::types::DecisionKind;
use tracing::{debug, info};

/// Verify a presented token and return the caller-facing decision.
///
/// Negative outcomes (`malformed`, `expired`, `invalid`) are expected and
/// returned as decisions; only collaborator failures surface as `TvError`.
pub async fn verify(
    store: &VerificationStore,
    authority: &dyn TrustAuthority,
    raw_token: &str,
) -> Result<VerificationDecision, TvError> {
    let token = match Token::parse(raw_token) {
        Ok(token) => token,
        Err(reason) => {
            debug!(
                target: "tv.services.verifier",
                reason = %reason,
                "Rejecting malformed token"
            );
            return Ok(malformed_decision(raw_token, &reason));
        }
    };

    if token.is_expired_at(Utc::now()) {
        let record = store.upsert(token.id(), DecisionKind::Expired);
        info!(
            target: "tv.services.verifier",
            token_id = %record.token_id,
            decision = %record.decision,
            attempts = record.attempts,
            "Expired token presented"
        );
        return Ok(VerificationDecision::from_record(&record));
    }

    if let Some(existing) = store.lookup(token.id()) {
        // Replay of a settled identifier: count the attempt, keep the answer.
        let record = store.upsert(token.id(), existing.decision);
        info!(
            target: "tv.services.verifier",
            token_id = %record.token_id,
            decision = %record.decision,
            attempts = record.attempts,
            "Token re-presented"
        );
        return Ok(VerificationDecision::from_record(&record));
    }

    let authentic = authority.authenticate(token.id()).await?;
    let decision = if authentic {
        DecisionKind::Valid
    } else {
        DecisionKind::Invalid
    };

    let record = store.upsert(token.id(), decision);
    info!(
        target: "tv.services.verifier",
        token_id = %record.token_id,
        decision = %record.decision,
        attempts = record.attempts,
        "Token verified"
    );

    Ok(VerificationDecision::from_record(&record))
}

/// Build the `malformed` decision for an unparsable token.
///
/// The identifier echo is bounded: oversized raw values echo as empty so the
/// response never reflects unbounded input.
fn malformed_decision(raw: &str, reason: &TokenFormatError) -> VerificationDecision {
    let echo = if raw.len() <= MAX_TOKEN_ID_BYTES {
        raw
    } else {
        ""
    };
    VerificationDecision::new(DecisionKind::Malformed, reason.to_string(), echo)
}
