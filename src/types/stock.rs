//! Inventories and recipes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{Error, Result};

/// Inclusive range of possible item counts, `start < end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RangeFields")]
pub struct QuantityRange {
    start: u32,
    end: u32,
}

#[derive(Deserialize)]
struct RangeFields {
    start: u32,
    end: u32,
}

impl TryFrom<RangeFields> for QuantityRange {
    type Error = Error;

    fn try_from(r: RangeFields) -> Result<Self> {
        QuantityRange::new(r.start, r.end)
    }
}

impl QuantityRange {
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] unless `start < end`.
    pub fn new(start: u32, end: u32) -> Result<Self> {
        // ---
        if start >= end {
            return Err(Error::InvalidArgument(format!(
                "invalid quantity range {start}..={end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn set_start(&mut self, start: u32) -> Result<()> {
        *self = Self::new(start, self.end)?;
        Ok(())
    }

    pub fn set_end(&mut self, end: u32) -> Result<()> {
        *self = Self::new(self.start, end)?;
        Ok(())
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.start..=self.end).contains(&value)
    }
}

/// How many of an item are held: known exactly, or only within a range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Exact(u32),
    Range(QuantityRange),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockCell {
    pub code: String,
    pub name: String,
    pub quantity: Quantity,
}

impl StockCell {
    pub fn new(code: impl Into<String>, name: impl Into<String>, quantity: Quantity) -> Self {
        // ---
        Self {
            code: code.into(),
            name: name.into(),
            quantity,
        }
    }
}

/// Items held, keyed by item code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stock {
    cells: BTreeMap<String, StockCell>,
}

impl Stock {
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if two cells share an item code.
    pub fn new(cells: impl IntoIterator<Item = StockCell>) -> Result<Self> {
        // ---
        let mut stock = Stock::default();
        for cell in cells {
            if stock.contains(&cell.code) {
                return Err(Error::InvalidArgument(format!(
                    "duplication of item with code {:?}",
                    cell.code
                )));
            }
            stock.insert(cell);
        }
        Ok(stock)
    }

    /// Turn a name-keyed inventory into code-keyed cells.
    ///
    /// `by_name` maps item names to counts; `names` maps item codes to item
    /// names. Several codes may share one name, in which case the count has
    /// to be spread over them:
    ///
    /// - one code: it gets the full count;
    /// - as many codes as items: each code gets exactly one;
    /// - otherwise every code holds at least one and at most
    ///   `count - codes + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a name has no code, or if the
    /// count is smaller than the number of codes sharing the name.
    pub fn compile(by_name: &HashMap<String, u32>, names: &HashMap<String, String>) -> Result<Vec<StockCell>> {
        // ---
        let mut codes_by_name: HashMap<&str, Vec<&str>> = HashMap::new();
        for (code, name) in names {
            codes_by_name.entry(name.as_str()).or_default().push(code.as_str());
        }
        for codes in codes_by_name.values_mut() {
            codes.sort_unstable();
        }

        let mut cells = Vec::new();
        for (name, &count) in by_name {
            let codes = codes_by_name
                .get(name.as_str())
                .ok_or_else(|| Error::InvalidArgument(format!("no item code for {name:?}")))?;
            let shared = codes.len() as u32;

            if shared == 1 {
                cells.push(StockCell::new(codes[0], name.as_str(), Quantity::Exact(count)));
            } else if count == shared {
                cells.extend(
                    codes
                        .iter()
                        .map(|code| StockCell::new(*code, name.as_str(), Quantity::Exact(1))),
                );
            } else {
                let upper = count.saturating_add(1).checked_sub(shared).ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "{count} x {name:?} cannot be spread over {shared} codes"
                    ))
                })?;
                let range = QuantityRange::new(1, upper)?;
                cells.extend(
                    codes
                        .iter()
                        .map(|code| StockCell::new(*code, name.as_str(), Quantity::Range(range))),
                );
            }
        }
        Ok(cells)
    }

    pub fn get(&self, code: &str) -> Option<&StockCell> {
        self.cells.get(code)
    }

    /// Insert or replace the cell for its code.
    pub fn insert(&mut self, cell: StockCell) -> Option<StockCell> {
        self.cells.insert(cell.code.clone(), cell)
    }

    pub fn remove(&mut self, code: &str) -> Option<StockCell> {
        self.cells.remove(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.cells.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StockCell> + '_ {
        self.cells.values()
    }
}

/// Stock of a guild, with its capacity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuildStock {
    pub stock: Stock,
    pub size: u32,
    pub limit: u32,
}

/// Crafting recipe.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RecipeFields")]
pub struct Recipe {
    id: String,
    name: String,
    price: u32,
}

#[derive(Deserialize)]
struct RecipeFields {
    id: String,
    name: String,
    price: u32,
}

impl TryFrom<RecipeFields> for Recipe {
    type Error = Error;

    fn try_from(r: RecipeFields) -> Result<Self> {
        Recipe::new(r.id, r.name, r.price)
    }
}

impl Recipe {
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `id` or `name` is empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: u32) -> Result<Self> {
        // ---
        let id = id.into();
        let name = name.into();
        if id.is_empty() || name.is_empty() {
            return Err(Error::InvalidArgument("recipe id and name must not be empty".into()));
        }
        Ok(Self { id, name, price })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u32 {
        self.price
    }
}

/// Recipes known to a player, keyed by item id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipeBook {
    recipes: BTreeMap<String, Recipe>,
}

impl RecipeBook {
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if two recipes share an item id.
    pub fn new(recipes: impl IntoIterator<Item = Recipe>) -> Result<Self> {
        // ---
        let mut book = RecipeBook::default();
        for recipe in recipes {
            if book.contains(recipe.id()) {
                return Err(Error::InvalidArgument(format!(
                    "duplication of recipe for item with id {:?}",
                    recipe.id()
                )));
            }
            book.insert(recipe);
        }
        Ok(book)
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    pub fn insert(&mut self, recipe: Recipe) -> Option<Recipe> {
        self.recipes.insert(recipe.id.clone(), recipe)
    }

    pub fn remove(&mut self, id: &str) -> Option<Recipe> {
        self.recipes.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.recipes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> + '_ {
        self.recipes.values()
    }
}
