use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DomainError, DomainResult};

/// Isolation policy requested by the caller.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SandboxSelector {
    /// Flatpak spawn inside Flatpak, bubblewrap otherwise.
    #[default]
    Auto = 0,
    Bwrap = 1,
    FlatpakSpawn = 2,
    NotSandboxed = 3,
}

/// Mechanism a selector resolves to for a given environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SandboxMechanism {
    Bwrap,
    FlatpakSpawn,
    NotSandboxed,
}

impl SandboxSelector {
    pub const ALL: [Self; 4] = [Self::Auto, Self::Bwrap, Self::FlatpakSpawn, Self::NotSandboxed];

    #[must_use]
    pub const fn value(self) -> i32 {
        self as i32
    }

    pub fn from_value(value: i32) -> DomainResult<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| DomainError::UnknownEnumValue {
                type_name: "SandboxSelector",
                value: value.to_string(),
            })
    }

    #[must_use]
    pub const fn nick(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Bwrap => "bwrap",
            Self::FlatpakSpawn => "flatpak-spawn",
            Self::NotSandboxed => "not-sandboxed",
        }
    }

    #[must_use]
    pub const fn resolve(self, inside_flatpak: bool) -> SandboxMechanism {
        match self {
            Self::Auto if inside_flatpak => SandboxMechanism::FlatpakSpawn,
            Self::Auto | Self::Bwrap => SandboxMechanism::Bwrap,
            Self::FlatpakSpawn => SandboxMechanism::FlatpakSpawn,
            Self::NotSandboxed => SandboxMechanism::NotSandboxed,
        }
    }
}

impl SandboxMechanism {
    #[must_use]
    pub const fn is_sandboxed(self) -> bool {
        !matches!(self, Self::NotSandboxed)
    }
}

impl fmt::Display for SandboxSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nick())
    }
}

impl fmt::Display for SandboxMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bwrap => "bwrap",
            Self::FlatpakSpawn => "flatpak-spawn",
            Self::NotSandboxed => "not-sandboxed",
        };
        f.write_str(name)
    }
}

impl FromStr for SandboxSelector {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|selector| selector.nick() == wanted)
            .ok_or_else(|| DomainError::UnknownEnumValue {
                type_name: "SandboxSelector",
                value: s.to_string(),
            })
    }
}
