//! Stateless reauthorization tickets
//!
//! A ticket is the serialized `(user, password)` pair, hex-encoded, carried
//! in a request field (typically a hidden form input) so the restricted tier
//! can reverify credentials without any server-side restricted state.
//!
//! The encoded pair carries the raw password so it can be replayed through
//! credential verification. Treat ticket values like passwords: keep them in
//! POST bodies, never in URLs or logs.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Render-data message for an undecodable ticket
pub const INVALID_TICKET: &str = "Invalid ticket";

#[derive(Serialize, Deserialize)]
struct TicketPair {
    user: String,
    password: String,
}

/// Encode a credential pair into a ticket value
pub fn encode(user: &str, password: &str) -> Result<String> {
    let pair = TicketPair {
        user: user.to_string(),
        password: password.to_string(),
    };
    Ok(hex::encode(serde_json::to_vec(&pair)?))
}

/// Decode a ticket value back into its credential pair
pub fn decode(raw: &str) -> Result<(String, String)> {
    let bytes = hex::decode(raw).map_err(|_| Error::Login(INVALID_TICKET.to_string()))?;
    let pair: TicketPair =
        serde_json::from_slice(&bytes).map_err(|_| Error::Login(INVALID_TICKET.to_string()))?;
    Ok((pair.user, pair.password))
}
