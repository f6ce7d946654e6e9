//! Exclusion and weight-constraint rules.
//!
//! Exclusions are stored with their two ends in sorted order, so `{a, b}`
//! and `{b, a}` are the same rule and set-union on a [`RuleSet`] stays
//! idempotent.

use super::ids::{ModuleId, TargetId, TargetRef};
use super::look::WeightMap;
use super::style::Style;
use crate::error::{Result, ValidationError};
use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing weights against a constraint maximum.
pub const WEIGHT_EPSILON: f64 = 1e-9;

/// Two targets of one module instance that may not be active together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InternalExclusion {
    pub module: ModuleId,
    pub a: TargetId,
    pub b: TargetId,
}

impl InternalExclusion {
    pub fn new(module: impl Into<ModuleId>, a: impl Into<TargetId>, b: impl Into<TargetId>) -> Self {
        let (a, b) = (a.into(), b.into());
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            module: module.into(),
            a,
            b,
        }
    }

    pub fn refs(&self) -> (TargetRef, TargetRef) {
        (
            TargetRef::new(self.module.clone(), self.a.clone()),
            TargetRef::new(self.module.clone(), self.b.clone()),
        )
    }
}

/// Two targets in different module instances that may not be active together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CrossExclusion {
    pub a: TargetRef,
    pub b: TargetRef,
}

impl CrossExclusion {
    pub fn new(a: TargetRef, b: TargetRef) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }
}

/// Clamps the weights of a target set while all of them are active.
///
/// `targets` and `max_weights` are parallel lists. When the lengths agree
/// the pairs are kept sorted by target so that equal constraints written
/// in different orders compare equal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightConstraint {
    pub targets: Vec<TargetRef>,
    pub max_weights: Vec<f64>,
}

impl WeightConstraint {
    pub fn new(targets: Vec<TargetRef>, max_weights: Vec<f64>) -> Self {
        if targets.len() != max_weights.len() {
            return Self {
                targets,
                max_weights,
            };
        }
        let mut pairs: Vec<(TargetRef, f64)> = targets.into_iter().zip(max_weights).collect();
        pairs.sort_by(|x, y| x.0.cmp(&y.0));
        let (targets, max_weights) = pairs.into_iter().unzip();
        Self {
            targets,
            max_weights,
        }
    }

    /// `(target, max)` pairs.
    pub fn limits(&self) -> impl Iterator<Item = (&TargetRef, f64)> {
        self.targets.iter().zip(self.max_weights.iter().copied())
    }

    /// Whether every referenced target satisfies `is_active`.
    pub fn applies(&self, mut is_active: impl FnMut(&TargetRef) -> bool) -> bool {
        self.targets.iter().all(|t| is_active(t))
    }

    fn validate_against(&self, style: &Style) -> Result<()> {
        if self.targets.len() != self.max_weights.len() {
            return Err(ValidationError::ConstraintLengthMismatch {
                targets: self.targets.len(),
                max_weights: self.max_weights.len(),
            });
        }
        if self.targets.len() < 2 {
            return Err(ValidationError::ConstraintTooSmall(self.targets.len()));
        }
        let mut seen = BTreeSet::new();
        for (target, max) in self.limits() {
            style.check_target(target)?;
            if !seen.insert(target) {
                return Err(ValidationError::ConstraintRepeatsTarget(target.clone()));
            }
            if !max.is_finite() || !(0.0..=1.0).contains(&max) {
                return Err(ValidationError::MaxWeightOutOfRange {
                    target: target.clone(),
                    value: max,
                });
            }
        }
        Ok(())
    }
}

/// Any rule a style can carry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Rule {
    Internal(InternalExclusion),
    Cross(CrossExclusion),
    Constraint(WeightConstraint),
}

impl Rule {
    /// Internal exclusion between two targets of `module`.
    pub fn internal(
        module: impl Into<ModuleId>,
        a: impl Into<TargetId>,
        b: impl Into<TargetId>,
    ) -> Self {
        Rule::Internal(InternalExclusion::new(module, a, b))
    }

    /// Cross-module exclusion between two targets.
    pub fn cross(a: TargetRef, b: TargetRef) -> Self {
        Rule::Cross(CrossExclusion::new(a, b))
    }

    /// Weight constraint over parallel target and max-weight lists.
    pub fn constraint(targets: Vec<TargetRef>, max_weights: Vec<f64>) -> Self {
        Rule::Constraint(WeightConstraint::new(targets, max_weights))
    }

    /// Stable textual id, e.g. `crown.volumeIn_X_crown.volumeOut`.
    ///
    /// Exclusions join their ends with `_X_`; constraints join their
    /// targets with `_W_` and append the max weights.
    pub fn id(&self) -> String {
        match self {
            Rule::Internal(ex) => {
                let (a, b) = ex.refs();
                format!("{a}_X_{b}")
            }
            Rule::Cross(ex) => format!("{}_X_{}", ex.a, ex.b),
            Rule::Constraint(c) => {
                let targets: Vec<String> = c.targets.iter().map(|t| t.to_string()).collect();
                let maxes: Vec<String> = c.max_weights.iter().map(|m| m.to_string()).collect();
                format!("{}_{}", targets.join("_W_"), maxes.join("_"))
            }
        }
    }

    /// Module instances the rule refers to.
    pub fn modules(&self) -> BTreeSet<ModuleId> {
        match self {
            Rule::Internal(ex) => BTreeSet::from([ex.module.clone()]),
            Rule::Cross(ex) => BTreeSet::from([ex.a.module.clone(), ex.b.module.clone()]),
            Rule::Constraint(c) => c.targets.iter().map(|t| t.module.clone()).collect(),
        }
    }

    /// Checks that every reference resolves inside `style` and the rule is
    /// well formed.
    pub fn validate_against(&self, style: &Style) -> Result<()> {
        match self {
            Rule::Internal(ex) => {
                let (a, b) = ex.refs();
                style.check_target(&a)?;
                style.check_target(&b)?;
                if a == b {
                    return Err(ValidationError::SelfExclusion(a));
                }
                Ok(())
            }
            Rule::Cross(ex) => {
                style.check_target(&ex.a)?;
                style.check_target(&ex.b)?;
                if ex.a == ex.b {
                    return Err(ValidationError::SelfExclusion(ex.a.clone()));
                }
                if ex.a.module == ex.b.module {
                    return Err(ValidationError::SameModuleCrossExclusion {
                        a: ex.a.clone(),
                        b: ex.b.clone(),
                    });
                }
                Ok(())
            }
            Rule::Constraint(c) => c.validate_against(style),
        }
    }
}

/// A rule broken by a concrete weight map.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RuleViolation {
    /// Both ends of an exclusion are active.
    Excluded {
        rule_id: String,
        a: TargetRef,
        b: TargetRef,
    },
    /// A constrained target exceeds its maximum while the whole
    /// constraint set is active.
    OverLimit {
        rule_id: String,
        target: TargetRef,
        weight: f64,
        max: f64,
    },
}

/// Internal exclusions, cross-module exclusions, and weight constraints.
///
/// Insertion is set-union: adding a rule that is already present is a
/// no-op.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleSet {
    pub internal: Vec<InternalExclusion>,
    pub cross: Vec<CrossExclusion>,
    pub constraints: Vec<WeightConstraint>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, rule: Rule) -> Self {
        self.insert(rule);
        self
    }

    /// Adds the rule if absent. Returns `true` when the set changed.
    pub fn insert(&mut self, rule: Rule) -> bool {
        if self.contains(&rule) {
            return false;
        }
        match rule {
            Rule::Internal(ex) => self.internal.push(ex),
            Rule::Cross(ex) => self.cross.push(ex),
            Rule::Constraint(c) => self.constraints.push(c),
        }
        true
    }

    pub fn contains(&self, rule: &Rule) -> bool {
        match rule {
            Rule::Internal(ex) => self.internal.contains(ex),
            Rule::Cross(ex) => self.cross.contains(ex),
            Rule::Constraint(c) => self.constraints.contains(c),
        }
    }

    /// Removes the rule. Returns whether it was present.
    pub fn remove(&mut self, rule: &Rule) -> bool {
        fn take<T: PartialEq>(items: &mut Vec<T>, item: &T) -> bool {
            let before = items.len();
            items.retain(|x| x != item);
            items.len() != before
        }
        match rule {
            Rule::Internal(ex) => take(&mut self.internal, ex),
            Rule::Cross(ex) => take(&mut self.cross, ex),
            Rule::Constraint(c) => take(&mut self.constraints, c),
        }
    }

    pub fn len(&self) -> usize {
        self.internal.len() + self.cross.len() + self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All rules, internal exclusions first, then cross-module exclusions,
    /// then constraints.
    pub fn iter(&self) -> impl Iterator<Item = Rule> + '_ {
        let internal = self.internal.iter().cloned().map(Rule::Internal);
        let cross = self.cross.iter().cloned().map(Rule::Cross);
        let constraints = self.constraints.iter().cloned().map(Rule::Constraint);
        internal.chain(cross).chain(constraints)
    }

    /// Internal exclusions declared on one module instance.
    pub fn internal_for<'a>(
        &'a self,
        module: &'a ModuleId,
    ) -> impl Iterator<Item = &'a InternalExclusion> + 'a {
        self.internal.iter().filter(move |ex| &ex.module == module)
    }

    /// Every exclusion edge, internal and cross-module, as target pairs.
    pub fn exclusion_pairs(&self) -> Vec<(TargetRef, TargetRef)> {
        self.internal
            .iter()
            .map(InternalExclusion::refs)
            .chain(self.cross.iter().map(|ex| (ex.a.clone(), ex.b.clone())))
            .collect()
    }

    /// Lists every rule the weight map breaks. A target counts as active
    /// when its weight is above zero; missing targets are inactive.
    pub fn violations(&self, weights: &WeightMap) -> Vec<RuleViolation> {
        let weight = |t: &TargetRef| weights.get(t).copied().unwrap_or(0.0);
        let active = |t: &TargetRef| weight(t) > 0.0;
        let mut out = Vec::new();

        for ex in &self.internal {
            let (a, b) = ex.refs();
            if active(&a) && active(&b) {
                out.push(RuleViolation::Excluded {
                    rule_id: Rule::Internal(ex.clone()).id(),
                    a,
                    b,
                });
            }
        }
        for ex in &self.cross {
            if active(&ex.a) && active(&ex.b) {
                out.push(RuleViolation::Excluded {
                    rule_id: Rule::Cross(ex.clone()).id(),
                    a: ex.a.clone(),
                    b: ex.b.clone(),
                });
            }
        }
        for c in &self.constraints {
            if !c.applies(active) {
                continue;
            }
            for (target, max) in c.limits() {
                let w = weight(target);
                if w > max + WEIGHT_EPSILON {
                    out.push(RuleViolation::OverLimit {
                        rule_id: Rule::Constraint(c.clone()).id(),
                        target: target.clone(),
                        weight: w,
                        max,
                    });
                }
            }
        }
        out
    }
}
