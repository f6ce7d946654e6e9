//! Per-combination weight resolution.

use crate::model::{Combination, Style, TargetRef, WeightConstraint, WeightMap};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Resolves target weights for combinations of one style.
///
/// Active targets start at 1.0 and inactive ones at 0.0. Each constraint
/// whose whole target set is active then lowers its targets to
/// `min(current, max)`. Repeated mins commute, so the order constraints
/// are listed in never matters and the most restrictive one wins.
///
/// # Examples
///
/// ```
/// use u_lookbook::model::{Combination, ModuleInstance, ModuleType, Rule, Style, TargetRef};
/// use u_lookbook::weights::WeightResolver;
///
/// let crown_len = TargetRef::new("crown", "lengthen");
/// let bang_len = TargetRef::new("bang", "lengthen");
/// let mut style = Style::new("bob")
///     .with_module(ModuleInstance::new("crown", ModuleType::Crown).with_targets(["lengthen"]))
///     .with_module(ModuleInstance::new("bang", ModuleType::Bang).with_targets(["lengthen"]));
/// style
///     .add_rule(Rule::constraint(vec![crown_len.clone(), bang_len.clone()], vec![0.7, 1.0]))
///     .unwrap();
///
/// let resolver = WeightResolver::new(&style);
/// let both: Combination = [crown_len.clone(), bang_len].into_iter().collect();
/// assert_eq!(resolver.resolve(&both)[&crown_len], 0.7);
/// ```
#[derive(Debug, Clone)]
pub struct WeightResolver<'a> {
    universe: Vec<TargetRef>,
    constraints: &'a [WeightConstraint],
}

impl<'a> WeightResolver<'a> {
    /// Resolver over every target and constraint of `style`.
    pub fn new(style: &'a Style) -> Self {
        Self {
            universe: style.target_refs(),
            constraints: &style.rules.constraints,
        }
    }

    /// Resolver over an explicit target universe and constraint list.
    pub fn from_parts(universe: Vec<TargetRef>, constraints: &'a [WeightConstraint]) -> Self {
        Self {
            universe,
            constraints,
        }
    }

    /// Weight of every universe target for one combination.
    ///
    /// Active targets outside the universe are included at their resolved
    /// weight as well.
    pub fn resolve(&self, combination: &Combination) -> WeightMap {
        let mut weights: WeightMap = self
            .universe
            .iter()
            .map(|t| (t.clone(), if combination.contains(t) { 1.0 } else { 0.0 }))
            .collect();
        for t in combination {
            weights.entry(t.clone()).or_insert(1.0);
        }
        self.clamp(&mut weights, |t| combination.contains(t));
        weights
    }

    /// Re-resolves an already resolved weight map.
    ///
    /// A target is active when its weight is above zero. Applying this to
    /// the output of [`resolve`](Self::resolve) returns it unchanged.
    pub fn reapply(&self, weights: &WeightMap) -> WeightMap {
        let active: Combination = weights
            .iter()
            .filter(|&(_, &w)| w > 0.0)
            .map(|(t, _)| t.clone())
            .collect();
        let mut out = weights.clone();
        self.clamp(&mut out, |t| active.contains(t));
        out
    }

    /// Resolves many combinations, preserving order.
    #[cfg(not(feature = "parallel"))]
    pub fn resolve_all(&self, combinations: &[Combination]) -> Vec<WeightMap> {
        combinations.iter().map(|c| self.resolve(c)).collect()
    }

    /// Resolves many combinations in parallel, preserving order.
    #[cfg(feature = "parallel")]
    pub fn resolve_all(&self, combinations: &[Combination]) -> Vec<WeightMap> {
        combinations.par_iter().map(|c| self.resolve(c)).collect()
    }

    fn clamp(&self, weights: &mut WeightMap, is_active: impl Fn(&TargetRef) -> bool) {
        for constraint in self.constraints {
            if !constraint.applies(&is_active) {
                continue;
            }
            for (target, max) in constraint.limits() {
                if let Some(w) = weights.get_mut(target) {
                    *w = w.min(max);
                }
            }
        }
    }
}

/// Resolves one combination against a style's constraints.
pub fn resolve_weights(style: &Style, combination: &Combination) -> WeightMap {
    WeightResolver::new(style).resolve(combination)
}
