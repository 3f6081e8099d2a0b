//! Identity token carried in a registration's check-in QR code.
//!
//! Wire format: base64url without padding of
//! `{"type":"camp_registration","id":"<uuid>","issuedAt":<epoch millis>}`.
//! The bare JSON is accepted as well.
//!
//! The token is not signed. Anyone holding it can resolve the registration,
//! so callers must authenticate the staff member acting on a decoded token.

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::Deserialize;

pub const TOKEN_TYPE: &str = "camp_registration";

#[derive(Deserialize)]
struct TokenPayload {
    #[serde(rename = "type")]
    token_type: String,
    id: String,
    #[serde(rename = "issuedAt")]
    issued_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedToken {
    pub registration_id: AggregateId,
    pub issued_at: DateTime<Utc>,
}

pub fn encode(registration_id: AggregateId, issued_at: DateTime<Utc>) -> String {
    let payload = serde_json::json!({
        "type": TOKEN_TYPE,
        "id": registration_id.to_string(),
        "issuedAt": issued_at.timestamp_millis(),
    });
    URL_SAFE_NO_PAD.encode(payload.to_string())
}

/// Decodes a token. Anything malformed or foreign yields `None`.
pub fn decode(token: &str) -> Option<DecodedToken> {
    let token = token.trim();
    let json = if token.starts_with('{') {
        token.as_bytes().to_vec()
    } else {
        URL_SAFE_NO_PAD
            .decode(token.trim_end_matches('='))
            .or_else(|_| STANDARD.decode(token))
            .ok()?
    };

    let payload: TokenPayload = serde_json::from_slice(&json).ok()?;
    if payload.token_type != TOKEN_TYPE {
        return None;
    }

    Some(DecodedToken {
        registration_id: AggregateId::parse(&payload.id)?,
        issued_at: DateTime::from_timestamp_millis(payload.issued_at)?,
    })
}
