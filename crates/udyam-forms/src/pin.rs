//! PIN code lookup model
//!
//! Reply format of the India Post lookup service and the tickets the wizard
//! hands out for in-flight lookups.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// District and state resolved for a PIN code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinLocation {
    pub district: String,
    pub state: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("invalid PIN code: {0}")]
    InvalidPin(String),

    #[error("PIN lookup returned status {0}")]
    NotFound(String),

    #[error("malformed lookup reply: {0}")]
    Malformed(String),

    #[error("lookup transport error: {0}")]
    Transport(String),
}

/// Handle for one lookup started by the wizard. Only the ticket with the
/// latest generation may write its result back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinLookupTicket {
    pub pin: String,
    pub generation: u64,
}

pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == crate::PIN_CODE_LEN && pin.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PostalReply {
    #[serde(default)]
    status: String,
    #[serde(default)]
    post_office: Option<Vec<PostOffice>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PostOffice {
    #[serde(default)]
    district: String,
    #[serde(default)]
    state: String,
}

/// Parse `GET /pincode/{pin}`: an array whose first element carries
/// `Status` and the list of post offices.
pub fn parse_postal_reply(body: &str) -> Result<PinLocation, LookupError> {
    let replies: Vec<PostalReply> =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;
    let first = replies
        .into_iter()
        .next()
        .ok_or_else(|| LookupError::Malformed("empty reply".into()))?;
    if first.status != "Success" {
        return Err(LookupError::NotFound(first.status));
    }
    let office = first
        .post_office
        .and_then(|offices| offices.into_iter().next())
        .ok_or_else(|| LookupError::Malformed("no post office in reply".into()))?;
    Ok(PinLocation { district: office.district, state: office.state })
}
