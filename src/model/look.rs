//! Combinations ("looks") and weight maps.

use super::ids::TargetRef;
use std::collections::{btree_set, BTreeMap, BTreeSet};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Resolved weight per target, covering every target of a style.
pub type WeightMap = BTreeMap<TargetRef, f64>;

/// A set of simultaneously active targets.
///
/// Identity is the target set alone: two combinations built in different
/// orders compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Combination(BTreeSet<TargetRef>);

impl Combination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: TargetRef) -> bool {
        self.0.insert(target)
    }

    pub fn contains(&self, target: &TargetRef) -> bool {
        self.0.contains(target)
    }

    /// Whether every listed target is active.
    pub fn contains_all<'a>(&self, targets: impl IntoIterator<Item = &'a TargetRef>) -> bool {
        targets.into_iter().all(|t| self.0.contains(t))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, TargetRef> {
        self.0.iter()
    }

    pub fn targets(&self) -> &BTreeSet<TargetRef> {
        &self.0
    }
}

impl FromIterator<TargetRef> for Combination {
    fn from_iter<I: IntoIterator<Item = TargetRef>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<TargetRef> for Combination {
    fn extend<I: IntoIterator<Item = TargetRef>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Combination {
    type Item = &'a TargetRef;
    type IntoIter = btree_set::Iter<'a, TargetRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(neutral)");
        }
        for (i, target) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{target}")?;
        }
        Ok(())
    }
}
