use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// What kind of class a compilation unit holds.
///
/// Only consulted by the orchestrator's non-scheduling operations (listing
/// test classes, status output). The scheduler never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitRole {
    Standard,
    Abstract,
    Interface,
    Enum,
    UnitTest,
}

impl Default for UnitRole {
    fn default() -> Self {
        UnitRole::Standard
    }
}

impl fmt::Display for UnitRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitRole::Standard => "standard",
            UnitRole::Abstract => "abstract",
            UnitRole::Interface => "interface",
            UnitRole::Enum => "enum",
            UnitRole::UnitTest => "unit_test",
        };
        f.write_str(s)
    }
}

impl FromStr for UnitRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "class" => Ok(UnitRole::Standard),
            "abstract" => Ok(UnitRole::Abstract),
            "interface" => Ok(UnitRole::Interface),
            "enum" => Ok(UnitRole::Enum),
            "unit_test" | "unittest" | "test" => Ok(UnitRole::UnitTest),
            other => Err(format!(
                "invalid unit role: {other} (expected standard, abstract, interface, enum or unit_test)"
            )),
        }
    }
}

/// Mode for storing source content hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashStorageMode {
    /// Store hashes in a file (`.incbuild/hashes`).
    File,
    /// Store hashes in memory only (lost on restart).
    Memory,
}

impl Default for HashStorageMode {
    fn default() -> Self {
        HashStorageMode::Memory
    }
}
