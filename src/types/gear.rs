//! Equipment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[default]
    Normal,
    Reinforced,
    #[serde(rename = "broken")]
    Broken,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    Common,
    Fine,
    High,
    Great,
    Excellent,
    Masterpiece,
    #[serde(rename = "Epic Fine")]
    EpicFine,
    #[serde(rename = "Epic High")]
    EpicHigh,
    #[serde(rename = "Epic Great")]
    EpicGreat,
    #[serde(rename = "Epic Excellent")]
    EpicExcellent,
    #[serde(rename = "Epic Masterpiece")]
    EpicMasterpiece,
}

/// One piece of equipment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GearFields")]
pub struct Gear {
    name: String,
    atk: i32,
    def: i32,
    condition: Condition,
    quality: Quality,
    mana: i32,
}

#[derive(Deserialize)]
struct GearFields {
    name: String,
    #[serde(default)]
    atk: i32,
    #[serde(default)]
    def: i32,
    #[serde(default)]
    condition: Condition,
    #[serde(default)]
    quality: Quality,
    #[serde(default)]
    mana: i32,
}

impl TryFrom<GearFields> for Gear {
    type Error = Error;

    fn try_from(g: GearFields) -> Result<Self> {
        Gear::new(g.name, g.atk, g.def, g.condition, g.quality, g.mana)
    }
}

impl Gear {
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is empty.
    pub fn new(
        name: impl Into<String>,
        atk: i32,
        def: i32,
        condition: Condition,
        quality: Quality,
        mana: i32,
    ) -> Result<Self> {
        // ---
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument("gear name must not be empty".into()));
        }
        Ok(Self {
            name,
            atk,
            def,
            condition,
            quality,
            mana,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atk(&self) -> i32 {
        self.atk
    }

    pub fn def(&self) -> i32 {
        self.def
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn mana(&self) -> i32 {
        self.mana
    }
}

/// Equipment slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GearSlot {
    Weapon,
    Offhand,
    Head,
    Body,
    Hands,
    Feet,
    Coat,
    Amulet,
    Ring,
}

impl GearSlot {
    pub const ALL: [GearSlot; 9] = [
        GearSlot::Weapon,
        GearSlot::Offhand,
        GearSlot::Head,
        GearSlot::Body,
        GearSlot::Hands,
        GearSlot::Feet,
        GearSlot::Coat,
        GearSlot::Amulet,
        GearSlot::Ring,
    ];

    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            GearSlot::Weapon => "weapon",
            GearSlot::Offhand => "offhand",
            GearSlot::Head => "head",
            GearSlot::Body => "body",
            GearSlot::Hands => "hands",
            GearSlot::Feet => "feet",
            GearSlot::Coat => "coat",
            GearSlot::Amulet => "amulet",
            GearSlot::Ring => "ring",
        }
    }
}

impl fmt::Display for GearSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equipment worn by a player, keyed by slot.
///
/// Every slot is always present; an empty slot holds `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<GearSlot, Gear>", into = "BTreeMap<GearSlot, Gear>")]
pub struct GearSet {
    slots: BTreeMap<GearSlot, Option<Gear>>,
}

impl Default for GearSet {
    fn default() -> Self {
        // ---
        Self {
            slots: GearSlot::ALL.iter().map(|s| (*s, None)).collect(),
        }
    }
}

impl GearSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: GearSlot) -> Option<&Gear> {
        self.slots.get(&slot).and_then(Option::as_ref)
    }

    /// Put `gear` into `slot`, returning what was there before.
    pub fn set(&mut self, slot: GearSlot, gear: Gear) -> Option<Gear> {
        self.slots.insert(slot, Some(gear)).flatten()
    }

    /// Empty `slot`, returning what was there.
    pub fn remove(&mut self, slot: GearSlot) -> Option<Gear> {
        self.slots.insert(slot, None).flatten()
    }

    /// Every slot with its content, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (GearSlot, Option<&Gear>)> + '_ {
        self.slots.iter().map(|(slot, gear)| (*slot, gear.as_ref()))
    }
}

impl From<BTreeMap<GearSlot, Gear>> for GearSet {
    fn from(worn: BTreeMap<GearSlot, Gear>) -> Self {
        // ---
        let mut set = GearSet::new();
        for (slot, gear) in worn {
            set.set(slot, gear);
        }
        set
    }
}

impl From<GearSet> for BTreeMap<GearSlot, Gear> {
    fn from(set: GearSet) -> Self {
        set.slots
            .into_iter()
            .filter_map(|(slot, gear)| gear.map(|g| (slot, g)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_gear_set_has_every_slot() {
        // ---
        let mut set = GearSet::new();
        assert_eq!(set.iter().count(), GearSlot::ALL.len());
        assert!(set.iter().all(|(_, g)| g.is_none()));

        let sword = Gear::new("Sword", 10, 0, Condition::Normal, Quality::Fine, 0).unwrap();
        assert!(set.set(GearSlot::Weapon, sword.clone()).is_none());
        assert_eq!(set.get(GearSlot::Weapon), Some(&sword));
        assert_eq!(set.remove(GearSlot::Weapon), Some(sword));
        assert!(set.get(GearSlot::Weapon).is_none());
    }

    #[test]
    fn test_wire_spellings() {
        // ---
        let gear: Gear = serde_json::from_str(
            r#"{"name":"Hunter Bow","atk":31,"condition":"broken","quality":"Epic High"}"#,
        )
        .unwrap();
        assert_eq!(gear.condition(), Condition::Broken);
        assert_eq!(gear.quality(), Quality::EpicHigh);
        assert_eq!(gear.def(), 0);

        assert!(serde_json::from_str::<Gear>(r#"{"name":""}"#).is_err());
    }
}
