use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote operations offered by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    GetBasicInfo,
    GetUserProfile,
    ViewCraftbook,
    GetGearInfo,
    GetStock,
    GuildInfo,
    TradeTerminal,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::GetBasicInfo,
        Operation::GetUserProfile,
        Operation::ViewCraftbook,
        Operation::GetGearInfo,
        Operation::GetStock,
        Operation::GuildInfo,
        Operation::TradeTerminal,
    ];

    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            Operation::GetBasicInfo => "GetBasicInfo",
            Operation::GetUserProfile => "GetUserProfile",
            Operation::ViewCraftbook => "ViewCraftbook",
            Operation::GetGearInfo => "GetGearInfo",
            Operation::GetStock => "GetStock",
            Operation::GuildInfo => "GuildInfo",
            Operation::TradeTerminal => "TradeTerminal",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
