//! Identifiers for module instances, targets, and styles.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identity of a module instance.
    ///
    /// Two styles share a module instance only when they carry the same
    /// `ModuleId`; matching module types is not enough.
    ModuleId
);

string_id!(
    /// Identity of a target, unique within its module instance.
    TargetId
);

string_id!(
    /// Identity of a style.
    StyleId
);

/// A target addressed across a whole style: `(module instance, target)`.
///
/// Ordering is by module id, then target id. Serialized as the string
/// `module.target` so it can key JSON maps.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct TargetRef {
    pub module: ModuleId,
    pub target: TargetId,
}

impl TargetRef {
    pub fn new(module: impl Into<ModuleId>, target: impl Into<TargetId>) -> Self {
        Self {
            module: module.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.target)
    }
}

/// A `module.target` string without a separator or with an empty side.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid target reference '{0}', expected 'module.target'")]
pub struct ParseTargetRefError(pub String);

impl FromStr for TargetRef {
    type Err = ParseTargetRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((module, target)) if !module.is_empty() && !target.is_empty() => {
                Ok(Self::new(module, target))
            }
            _ => Err(ParseTargetRefError(s.to_string())),
        }
    }
}

impl TryFrom<String> for TargetRef {
    type Error = ParseTargetRefError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TargetRef> for String {
    fn from(r: TargetRef) -> Self {
        r.to_string()
    }
}
