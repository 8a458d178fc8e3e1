use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Coarse category of an action's effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessLevel {
    List,
    Read,
    Write,
    Tagging,
    PermissionsManagement,
    #[default]
    Unknown,
}

impl AccessLevel {
    /// All levels in display order
    pub const ALL: [AccessLevel; 6] = [
        AccessLevel::List,
        AccessLevel::Read,
        AccessLevel::Write,
        AccessLevel::Tagging,
        AccessLevel::PermissionsManagement,
        AccessLevel::Unknown,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AccessLevel::List => "List",
            AccessLevel::Read => "Read",
            AccessLevel::Write => "Write",
            AccessLevel::Tagging => "Tagging",
            AccessLevel::PermissionsManagement => "Permissions management",
            AccessLevel::Unknown => "Unknown",
        }
    }

    /// Lenient parse: case and surrounding whitespace are ignored, anything
    /// unrecognized maps to [`AccessLevel::Unknown`].
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(AccessLevel::Unknown)
    }

    /// Derive a level from annotation properties.
    ///
    /// Precedence is List, Write, Permissions management, Tagging; an action
    /// with none of those flags set, including one without properties, is a
    /// Read action.
    #[must_use]
    pub fn from_properties(properties: &BTreeMap<ActionProperty, bool>) -> Self {
        let set = |prop: ActionProperty| properties.get(&prop).copied().unwrap_or(false);
        if set(ActionProperty::IsList) {
            AccessLevel::List
        } else if set(ActionProperty::IsWrite) {
            AccessLevel::Write
        } else if set(ActionProperty::IsPermissionManagement) {
            AccessLevel::PermissionsManagement
        } else if set(ActionProperty::IsTaggingOnly) {
            AccessLevel::Tagging
        } else {
            AccessLevel::Read
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "list" => Ok(AccessLevel::List),
            "read" => Ok(AccessLevel::Read),
            "write" => Ok(AccessLevel::Write),
            "tagging" => Ok(AccessLevel::Tagging),
            "permissions management" | "permissions-management" | "permissions_management" => {
                Ok(AccessLevel::PermissionsManagement)
            }
            "unknown" => Ok(AccessLevel::Unknown),
            _ => Err(format!("unknown access level '{}'", raw.trim())),
        }
    }
}

impl Serialize for AccessLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AccessLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AccessLevel::parse_lenient(&raw))
    }
}

/// Capability flags carried in an action's annotation properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionProperty {
    IsList,
    IsRead,
    IsWrite,
    IsPermissionManagement,
    IsTaggingOnly,
}

impl ActionProperty {
    pub const ALL: [ActionProperty; 5] = [
        ActionProperty::IsList,
        ActionProperty::IsRead,
        ActionProperty::IsWrite,
        ActionProperty::IsPermissionManagement,
        ActionProperty::IsTaggingOnly,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionProperty::IsList => "IsList",
            ActionProperty::IsRead => "IsRead",
            ActionProperty::IsWrite => "IsWrite",
            ActionProperty::IsPermissionManagement => "IsPermissionManagement",
            ActionProperty::IsTaggingOnly => "IsTaggingOnly",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|prop| prop.as_str() == key)
    }
}
