//! Request/response codec.
//!
//! Requests and replies are JSON objects tagged with the operation name:
//!
//! ```text
//! request: {"action": "GetBasicInfo", "payload": {"user_id": 42}}
//! reply:   {"action": "GetBasicInfo", "result": "Ok", "payload": {...}}
//! ```
//!
//! Neither carries a correlation identifier. The engine treats both as opaque
//! bytes; only this module knows their shape.

mod request;
mod response;

pub use request::{encode, Request};
pub use response::{
    //
    decode,
    BasicInfo,
    GuildInfo,
    Response,
    TradeReceipt,
    UserProfile,
};
