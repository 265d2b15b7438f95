//! Guilds and guild roles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::BitOr;

use crate::types::Castle;
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GuildFields")]
pub struct Guild {
    name: String,
    tag: Option<String>,
    emoji: Option<String>,
}

impl Guild {
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is empty.
    pub fn new(name: impl Into<String>, tag: Option<String>, emoji: Option<String>) -> Result<Self> {
        // ---
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument("guild name must not be empty".into()));
        }
        Ok(Self { name, tag, emoji })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn emoji(&self) -> Option<&str> {
        self.emoji.as_deref()
    }

    /// `[TAG]Name`, or just the name for an untagged guild.
    pub fn full_name(&self) -> String {
        // ---
        match &self.tag {
            Some(tag) => format!("[{tag}]{}", self.name),
            None => self.name.clone(),
        }
    }

    /// [`full_name`](Self::full_name) prefixed by the guild emoji, falling
    /// back to the castle glyph.
    pub fn full_name_with_castle(&self, castle: Castle) -> String {
        // ---
        let prefix = self.emoji.as_deref().unwrap_or(castle.icon());
        format!("{prefix}{}", self.full_name())
    }
}

#[derive(Deserialize)]
struct GuildFields {
    name: String,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    emoji: Option<String>,
}

impl TryFrom<GuildFields> for Guild {
    type Error = Error;

    fn try_from(fields: GuildFields) -> Result<Self> {
        Guild::new(fields.name, fields.tag, fields.emoji)
    }
}

/// Role of a member inside a guild.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GuildRole {
    NoRole,
    Creator,
    Squire,
    Bartender,
    Treasurer,
}

impl fmt::Display for GuildRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        let name = match self {
            GuildRole::NoRole => "NoRole",
            GuildRole::Creator => "Creator",
            GuildRole::Squire => "Squire",
            GuildRole::Bartender => "Bartender",
            GuildRole::Treasurer => "Treasurer",
        };
        f.write_str(name)
    }
}

/// Set of guild roles.
///
/// `NoRole` is never stored; [`contains`](Self::contains) reports it exactly
/// when the set is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<GuildRole>", into = "Vec<GuildRole>")]
pub struct GuildRolesSet {
    roles: BTreeSet<GuildRole>,
}

impl GuildRolesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, role: GuildRole) -> bool {
        // ---
        match role {
            GuildRole::NoRole => self.roles.is_empty(),
            role => self.roles.contains(&role),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = GuildRole> + '_ {
        self.roles.iter().copied()
    }
}

impl FromIterator<GuildRole> for GuildRolesSet {
    fn from_iter<I: IntoIterator<Item = GuildRole>>(iter: I) -> Self {
        // ---
        Self {
            roles: iter.into_iter().filter(|r| *r != GuildRole::NoRole).collect(),
        }
    }
}

impl From<Vec<GuildRole>> for GuildRolesSet {
    fn from(roles: Vec<GuildRole>) -> Self {
        roles.into_iter().collect()
    }
}

impl From<GuildRolesSet> for Vec<GuildRole> {
    fn from(set: GuildRolesSet) -> Self {
        set.roles.into_iter().collect()
    }
}

impl From<GuildRole> for GuildRolesSet {
    fn from(role: GuildRole) -> Self {
        std::iter::once(role).collect()
    }
}

impl BitOr for GuildRole {
    type Output = GuildRolesSet;

    fn bitor(self, rhs: GuildRole) -> GuildRolesSet {
        [self, rhs].into_iter().collect()
    }
}

impl BitOr<GuildRole> for GuildRolesSet {
    type Output = GuildRolesSet;

    fn bitor(mut self, rhs: GuildRole) -> GuildRolesSet {
        // ---
        if rhs != GuildRole::NoRole {
            self.roles.insert(rhs);
        }
        self
    }
}

impl BitOr for GuildRolesSet {
    type Output = GuildRolesSet;

    fn bitor(mut self, rhs: GuildRolesSet) -> GuildRolesSet {
        self.roles.extend(rhs.roles);
        self
    }
}

impl fmt::Display for GuildRolesSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        if self.roles.is_empty() {
            return write!(f, "{}", GuildRole::NoRole);
        }
        let names: Vec<String> = self.roles.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_full_name() {
        // ---
        let tagged = Guild::new("Wolves", Some("WLF".into()), None).unwrap();
        assert_eq!(tagged.full_name(), "[WLF]Wolves");
        assert_eq!(
            tagged.full_name_with_castle(Castle::Skala),
            "\u{1F5A4}[WLF]Wolves"
        );

        let with_emoji = Guild::new("Cats", None, Some("\u{1F431}".into())).unwrap();
        assert_eq!(with_emoji.full_name_with_castle(Castle::Skala), "\u{1F431}Cats");

        assert!(Guild::new("", None, None).is_err());
    }

    #[test]
    fn test_roles_set() {
        // ---
        let none = GuildRolesSet::new();
        assert!(none.contains(GuildRole::NoRole));
        assert_eq!(none.to_string(), "NoRole");

        let set = GuildRole::Creator | GuildRole::Treasurer | GuildRole::NoRole;
        assert_eq!(set.len(), 2);
        assert!(set.contains(GuildRole::Creator));
        assert!(!set.contains(GuildRole::Squire));
        assert!(!set.contains(GuildRole::NoRole));
        assert_eq!(set.to_string(), "{Creator, Treasurer}");
    }

    #[test]
    fn test_roles_wire_form() {
        // ---
        let set: GuildRolesSet = serde_json::from_str(r#"["Squire","NoRole","Squire"]"#).unwrap();
        assert_eq!(set, GuildRolesSet::from(GuildRole::Squire));
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["Squire"]"#);
    }
}
