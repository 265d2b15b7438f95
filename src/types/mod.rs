//! Domain value types exchanged with the API.
//!
//! Plain immutable records validated at construction. Enumerations that
//! carry a display glyph expose it through `icon()`.

mod character;
mod gear;
mod guild;
mod operation;
mod stock;

pub use character::{Action, Castle, Class, SecondaryClass, Status};
pub use gear::{Condition, Gear, GearSet, GearSlot, Quality};
pub use guild::{Guild, GuildRole, GuildRolesSet};
pub use operation::Operation;
pub use stock::{GuildStock, Quantity, QuantityRange, Recipe, RecipeBook, Stock, StockCell};
