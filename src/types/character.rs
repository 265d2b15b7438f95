//! Character classes, castles, and player state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Character class, each with its display glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Class {
    Warrior,
    Knight,
    Sentinel,
    Ranger,
    Berserker,
    Collector,
    Blacksmith,
    Alchemist,
    Noble,
}

impl Class {
    pub const fn icon(&self) -> &'static str {
        // ---
        match self {
            Class::Warrior => "\u{1F423}",
            Class::Knight => "\u{2694}\u{FE0F}",
            Class::Sentinel => "\u{1F6E1}",
            Class::Ranger => "\u{1F3F9}",
            Class::Berserker => "\u{1FA78}",
            Class::Collector => "\u{1F4E6}",
            Class::Blacksmith => "\u{2692}",
            Class::Alchemist => "\u{2697}\u{FE0F}",
            Class::Noble => "\u{1F3A9}",
        }
    }

    pub const fn name(&self) -> &'static str {
        // ---
        match self {
            Class::Warrior => "warrior",
            Class::Knight => "knight",
            Class::Sentinel => "sentinel",
            Class::Ranger => "ranger",
            Class::Berserker => "berserker",
            Class::Collector => "collector",
            Class::Blacksmith => "blacksmith",
            Class::Alchemist => "alchemist",
            Class::Noble => "noble",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.icon())
    }
}

/// Castle a player belongs to, each with its display glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Castle {
    Oplot,
    Rassvet,
    Skala,
    Tortuga,
    Night,
    Ferma,
    Amber,
}

impl Castle {
    pub const fn icon(&self) -> &'static str {
        // ---
        match self {
            Castle::Oplot => "\u{2618}\u{FE0F}",
            Castle::Rassvet => "\u{1F339}",
            Castle::Skala => "\u{1F5A4}",
            Castle::Tortuga => "\u{1F422}",
            Castle::Night => "\u{1F987}",
            Castle::Ferma => "\u{1F346}",
            Castle::Amber => "\u{1F341}",
        }
    }

    pub const fn name(&self) -> &'static str {
        // ---
        match self {
            Castle::Oplot => "oplot",
            Castle::Rassvet => "rassvet",
            Castle::Skala => "skala",
            Castle::Tortuga => "tortuga",
            Castle::Night => "night",
            Castle::Ferma => "ferma",
            Castle::Amber => "amber",
        }
    }
}

impl fmt::Display for Castle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.icon())
    }
}

/// A class learned in addition to the main one, with its level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecondaryClass {
    pub class: Class,
    pub level: u32,
}

impl SecondaryClass {
    pub fn new(class: Class, level: u32) -> Self {
        Self { class, level }
    }
}

/// Renders as the class glyph followed by the level in superscript digits.
impl fmt::Display for SecondaryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        f.write_str(self.class.icon())?;
        for digit in self.level.to_string().chars() {
            let superscript = match digit {
                '0' => '\u{2070}',
                '1' => '\u{00B9}',
                '2' => '\u{00B2}',
                '3' => '\u{00B3}',
                '4' => '\u{2074}',
                '5' => '\u{2075}',
                '6' => '\u{2076}',
                '7' => '\u{2077}',
                '8' => '\u{2078}',
                _ => '\u{2079}',
            };
            write!(f, "{superscript}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Idle,
    Busy,
}

/// What a player is currently doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Idle,
    Conflict,
    Quest,
    Shop,
}
