// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! QR confirmation tokens for deliveries.
//!
//! A token is minted when a delivery departs and presented back at the
//! destination. The string is opaque to everyone outside this module; the
//! payload inside names the delivery, request, facility and recipient, plus
//! a random nonce so no two issued tokens compare equal.

use hemolink::TokenPayload;
use thiserror::Error;

/// Confirmation token errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The payload could not be serialized.
    #[error("Token could not be encoded: {reason}")]
    Encoding { reason: String },

    /// The presented string is not a token this system issued.
    #[error("Token is not a valid confirmation token: {reason}")]
    Malformed { reason: String },
}

/// Mints a confirmation token for a departing delivery.
///
/// # Arguments
///
/// * `delivery_id` - The delivery the token confirms
/// * `request_id` - The request the delivery fulfills
/// * `facility_id` - The destination facility
/// * `recipient_id` - The recipient the token is issued to
///
/// # Errors
///
/// Returns `TokenError::Encoding` if the payload cannot be serialized.
pub fn issue_confirmation_token(
    delivery_id: i64,
    request_id: i64,
    facility_id: i64,
    recipient_id: i64,
) -> Result<String, TokenError> {
    let payload: TokenPayload = TokenPayload {
        delivery_id,
        request_id,
        facility_id,
        recipient_id,
        nonce: rand::random::<u64>(),
    };
    encode_token(&payload)
}

/// Serializes a token payload into its opaque string form.
///
/// # Errors
///
/// Returns `TokenError::Encoding` if the payload cannot be serialized.
pub fn encode_token(payload: &TokenPayload) -> Result<String, TokenError> {
    serde_json::to_string(payload).map_err(|err| TokenError::Encoding {
        reason: err.to_string(),
    })
}

/// Decodes a presented token back into its payload.
///
/// Decoding validates shape only; whether the payload matches the delivery
/// record is checked at confirmation time.
///
/// # Errors
///
/// Returns `TokenError::Malformed` if the string is not an issued token.
pub fn decode_token(token: &str) -> Result<TokenPayload, TokenError> {
    serde_json::from_str(token).map_err(|err| TokenError::Malformed {
        reason: err.to_string(),
    })
}
