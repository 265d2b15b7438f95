use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::types::{
    //
    Action,
    Castle,
    Class,
    GearSet,
    GearSlot,
    Gear,
    Guild,
    GuildRolesSet,
    GuildStock,
    Operation,
    Recipe,
    RecipeBook,
    SecondaryClass,
    Status,
    Stock,
};
use crate::{Error, Result};

/// Result string of a successful reply.
const RESULT_OK: &str = "Ok";

/// A decoded reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    BasicInfo(BasicInfo),
    UserProfile(Box<UserProfile>),
    Craftbook(RecipeBook),
    GearInfo(GearSet),
    Stock(Stock),
    GuildInfo(Box<GuildInfo>),
    TradeTerminal(TradeReceipt),
    /// The remote side understood the request and refused it.
    Rejected { operation: Operation, result: String },
}

impl Response {
    pub fn operation(&self) -> Operation {
        // ---
        match self {
            Response::BasicInfo(_) => Operation::GetBasicInfo,
            Response::UserProfile(_) => Operation::GetUserProfile,
            Response::Craftbook(_) => Operation::ViewCraftbook,
            Response::GearInfo(_) => Operation::GetGearInfo,
            Response::Stock(_) => Operation::GetStock,
            Response::GuildInfo(_) => Operation::GuildInfo,
            Response::TradeTerminal(_) => Operation::TradeTerminal,
            Response::Rejected { operation, .. } => *operation,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub class: Class,
    pub atk: i32,
    pub def: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_name: String,
    pub class: Class,
    pub castle: Castle,
    pub level: u32,
    pub atk: i32,
    pub def: i32,
    pub exp: u64,
    pub gold: i64,
    #[serde(default)]
    pub pouches: u32,
    pub status: Status,
    pub action: Action,
    #[serde(default)]
    pub guild: Option<Guild>,
    #[serde(default)]
    pub secondary_class: Option<SecondaryClass>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildInfo {
    pub guild: Guild,
    pub castle: Castle,
    pub level: u32,
    pub glory: u32,
    pub roles: GuildRolesSet,
    pub stock: GuildStock,
}

/// Confirmation of an order placed on the trade terminal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub item_code: String,
    pub quantity: u32,
    pub price: u32,
}

//
// Wire shapes
//

#[derive(Deserialize)]
struct Reply {
    action: Operation,
    result: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct CraftbookPayload {
    recipes: Vec<Recipe>,
}

#[derive(Deserialize)]
struct GearPayload {
    gear: BTreeMap<GearSlot, Gear>,
}

#[derive(Deserialize)]
struct StockPayload {
    stock: HashMap<String, u32>,
    codes: HashMap<String, String>,
}

#[derive(Deserialize)]
struct GuildPayload {
    guild: Guild,
    castle: Castle,
    level: u32,
    #[serde(default)]
    glory: u32,
    #[serde(default)]
    roles: GuildRolesSet,
    #[serde(default)]
    stock: HashMap<String, u32>,
    #[serde(default)]
    codes: HashMap<String, String>,
    #[serde(default)]
    stock_size: u32,
    #[serde(default)]
    stock_limit: u32,
}

fn payload<T: DeserializeOwned>(operation: Operation, value: serde_json::Value) -> Result<T> {
    // ---
    serde_json::from_value(value)
        .map_err(|e| Error::DecodeFailure(format!("{operation} payload: {e}")))
}

fn compile_stock(by_name: &HashMap<String, u32>, names: &HashMap<String, String>) -> Result<Stock> {
    // ---
    Stock::compile(by_name, names)
        .and_then(|cells| Stock::new(cells))
        .map_err(|e| Error::DecodeFailure(format!("stock payload: {e}")))
}

/// Parse reply bytes into a [`Response`].
///
/// A well-formed reply whose `result` is not `"Ok"` decodes to
/// [`Response::Rejected`].
///
/// # Errors
///
/// Returns [`Error::DecodeFailure`] if the bytes are not a reply, name an
/// unknown operation, or carry a payload that does not fit the operation.
pub fn decode(bytes: &[u8]) -> Result<Response> {
    // ---
    let reply: Reply =
        serde_json::from_slice(bytes).map_err(|e| Error::DecodeFailure(format!("malformed reply: {e}")))?;

    let operation = reply.action;
    if reply.result != RESULT_OK {
        return Ok(Response::Rejected {
            operation,
            result: reply.result,
        });
    }

    let response = match operation {
        Operation::GetBasicInfo => Response::BasicInfo(payload(operation, reply.payload)?),
        Operation::GetUserProfile => Response::UserProfile(Box::new(payload(operation, reply.payload)?)),
        Operation::ViewCraftbook => {
            let book: CraftbookPayload = payload(operation, reply.payload)?;
            let recipes = RecipeBook::new(book.recipes)
                .map_err(|e| Error::DecodeFailure(format!("craftbook payload: {e}")))?;
            Response::Craftbook(recipes)
        }
        Operation::GetGearInfo => {
            let gear: GearPayload = payload(operation, reply.payload)?;
            Response::GearInfo(GearSet::from(gear.gear))
        }
        Operation::GetStock => {
            let stock: StockPayload = payload(operation, reply.payload)?;
            Response::Stock(compile_stock(&stock.stock, &stock.codes)?)
        }
        Operation::GuildInfo => {
            let info: GuildPayload = payload(operation, reply.payload)?;
            let stock = compile_stock(&info.stock, &info.codes)?;
            Response::GuildInfo(Box::new(GuildInfo {
                guild: info.guild,
                castle: info.castle,
                level: info.level,
                glory: info.glory,
                roles: info.roles,
                stock: GuildStock {
                    stock,
                    size: info.stock_size,
                    limit: info.stock_limit,
                },
            }))
        }
        Operation::TradeTerminal => Response::TradeTerminal(payload(operation, reply.payload)?),
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::types::{GuildRole, Quantity};
    use serde_json::json;

    fn bytes(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_basic_info() {
        // ---
        let reply = bytes(json!({
            "action": "GetBasicInfo",
            "result": "Ok",
            "payload": {"class": "knight", "atk": 120, "def": 80}
        }));

        assert_eq!(
            decode(&reply).unwrap(),
            Response::BasicInfo(BasicInfo {
                class: Class::Knight,
                atk: 120,
                def: 80
            })
        );
    }

    #[test]
    fn test_rejected_result() {
        // ---
        let reply = bytes(json!({"action": "GetStock", "result": "Forbidden"}));

        let response = decode(&reply).unwrap();
        assert_eq!(response.operation(), Operation::GetStock);
        assert!(matches!(response, Response::Rejected { ref result, .. } if result == "Forbidden"));
    }

    #[test]
    fn test_guild_info() {
        // ---
        let reply = bytes(json!({
            "action": "GuildInfo",
            "result": "Ok",
            "payload": {
                "guild": {"name": "Wolves", "tag": "WLF"},
                "castle": "amber",
                "level": 12,
                "glory": 3400,
                "roles": ["Creator", "Treasurer"],
                "stock": {"Thread": 300},
                "codes": {"01": "Thread"},
                "stock_size": 300,
                "stock_limit": 10000
            }
        }));

        let Response::GuildInfo(info) = decode(&reply).unwrap() else {
            panic!("expected guild info");
        };
        assert_eq!(info.guild.full_name(), "[WLF]Wolves");
        assert!(info.roles.contains(GuildRole::Treasurer));
        assert_eq!(info.stock.limit, 10000);
        assert_eq!(info.stock.stock.get("01").unwrap().quantity, Quantity::Exact(300));
    }

    #[test]
    fn test_gear_info_fills_missing_slots() {
        // ---
        let reply = bytes(json!({
            "action": "GetGearInfo",
            "result": "Ok",
            "payload": {"gear": {"weapon": {"name": "Sword", "atk": 5}}}
        }));

        let Response::GearInfo(gear) = decode(&reply).unwrap() else {
            panic!("expected gear info");
        };
        assert_eq!(gear.get(GearSlot::Weapon).unwrap().atk(), 5);
        assert!(gear.get(GearSlot::Ring).is_none());
    }

    #[test]
    fn test_decode_failures() {
        // ---
        let cases = [
            b"not json".to_vec(),
            bytes(json!({"action": "Teleport", "result": "Ok"})),
            bytes(json!({"action": "GetBasicInfo", "result": "Ok", "payload": {"class": "wizard"}})),
            bytes(json!({
                "action": "ViewCraftbook",
                "result": "Ok",
                "payload": {"recipes": [
                    {"id": "a1", "name": "Sword", "price": 1},
                    {"id": "a1", "name": "Sword", "price": 2}
                ]}
            })),
        ];

        for case in cases {
            assert!(matches!(decode(&case), Err(Error::DecodeFailure(_))));
        }
    }
}
