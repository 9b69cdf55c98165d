//! Named permission flags and their bitmask codec.
//!
//! Bit positions are part of the stored data format: a flag's position must
//! never change once released, and new flags are only ever appended.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single grantable capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    /// Adjust the stocked amount of an item.
    EditItemAmount,
    /// Create, edit and delete items.
    ManageItems,
    /// Request loans of items.
    LoanItems,
    /// Create users and change other users' credentials and permissions.
    ManageUsers,
}

impl Permission {
    /// Every flag, in bit order.
    pub const ALL: [Permission; 4] = [
        Self::EditItemAmount,
        Self::ManageItems,
        Self::LoanItems,
        Self::ManageUsers,
    ];

    /// The flag's bit position.
    pub fn position(&self) -> u32 {
        match self {
            Self::EditItemAmount => 0,
            Self::ManageItems => 1,
            Self::LoanItems => 2,
            Self::ManageUsers => 3,
        }
    }

    /// The flag as a single-bit mask.
    pub fn bit(&self) -> u64 {
        1 << self.position()
    }

    /// Return the flag name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EditItemAmount => "EDIT_ITEM_AMOUNT",
            Self::ManageItems => "MANAGE_ITEMS",
            Self::LoanItems => "LOAN_ITEMS",
            Self::ManageUsers => "MANAGE_USERS",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Permission {
    type Err = invenfinder_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                invenfinder_core::AppError::validation(format!("Invalid permission: '{s}'"))
            })
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Fold a set of flags into a bitmask.
pub fn encode(flags: impl IntoIterator<Item = Permission>) -> u64 {
    flags.into_iter().fold(0, |mask, flag| mask | flag.bit())
}

/// Expand a bitmask into the named flags it carries. Bits without a name
/// are ignored.
pub fn decode(mask: u64) -> BTreeSet<Permission> {
    Permission::ALL
        .into_iter()
        .filter(|flag| mask & flag.bit() != 0)
        .collect()
}

/// Every required bit is granted. An empty requirement is always met.
pub fn has_all(required: u64, granted: u64) -> bool {
    granted & required == required
}

/// At least one required bit is granted. An empty requirement is always met.
pub fn has_any(required: u64, granted: u64) -> bool {
    required == 0 || granted & required != 0
}
