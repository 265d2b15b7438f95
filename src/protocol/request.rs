use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::Operation;
use crate::{Error, Result};

/// A call to one remote operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum Request {
    GetBasicInfo { user_id: i64 },
    GetUserProfile { user_id: i64 },
    ViewCraftbook { user_id: i64 },
    GetGearInfo { user_id: i64 },
    GetStock { user_id: i64 },
    GuildInfo { user_id: i64 },
    TradeTerminal {
        user_id: i64,
        item_code: String,
        quantity: u32,
        price: u32,
    },
}

impl Request {
    pub fn operation(&self) -> Operation {
        // ---
        match self {
            Request::GetBasicInfo { .. } => Operation::GetBasicInfo,
            Request::GetUserProfile { .. } => Operation::GetUserProfile,
            Request::ViewCraftbook { .. } => Operation::ViewCraftbook,
            Request::GetGearInfo { .. } => Operation::GetGearInfo,
            Request::GetStock { .. } => Operation::GetStock,
            Request::GuildInfo { .. } => Operation::GuildInfo,
            Request::TradeTerminal { .. } => Operation::TradeTerminal,
        }
    }

    pub fn user_id(&self) -> i64 {
        // ---
        match self {
            Request::GetBasicInfo { user_id }
            | Request::GetUserProfile { user_id }
            | Request::ViewCraftbook { user_id }
            | Request::GetGearInfo { user_id }
            | Request::GetStock { user_id }
            | Request::GuildInfo { user_id }
            | Request::TradeTerminal { user_id, .. } => *user_id,
        }
    }
}

/// Serialize a request to the bytes published on the wire.
pub fn encode(request: &Request) -> Result<Bytes> {
    // ---
    serde_json::to_vec(request)
        .map(Bytes::from)
        .map_err(|e| Error::InvalidArgument(format!("failed to encode {}: {e}", request.operation())))
}
