//! Union a newly authored rule into every style sharing its modules.

use super::catalog::StyleCatalog;
use crate::error::{Result, ValidationError};
use crate::model::{Rule, Style, StyleId};
use std::collections::BTreeSet;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A non-fatal problem met while propagating.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PropagationWarning {
    /// Other styles could not be looked up; only the origin was written.
    CatalogUnavailable { reason: String },
    /// A sharing style rejected the rule and was left untouched.
    Incompatible {
        style: StyleId,
        error: String,
    },
}

/// Result of a propagation.
///
/// The engine does not persist anything: the host writes `origin` and
/// every style in `updated` back to its own store.
#[derive(Debug, Clone)]
pub struct PropagationOutcome {
    /// Originating style with the rule applied.
    pub origin: Style,
    /// Whether the origin's rule set grew.
    pub origin_changed: bool,
    /// Other styles that gained the rule.
    pub updated: Vec<Style>,
    /// Other styles that already had it.
    pub unchanged: Vec<StyleId>,
    pub warnings: Vec<PropagationWarning>,
}

impl PropagationOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Ids of every style whose rule set changed, origin first.
    pub fn changed_ids(&self) -> Vec<StyleId> {
        let origin = self.origin_changed.then(|| self.origin.id.clone());
        origin
            .into_iter()
            .chain(self.updated.iter().map(|s| s.id.clone()))
            .collect()
    }
}

/// Additive rule propagation across styles.
///
/// Styles share a rule when they contain the *same* module instances (by
/// id, not by module type). Propagation never removes rules; removal is a
/// per-style action through [`Style::remove_rule`].
///
/// # Examples
///
/// ```
/// use u_lookbook::model::{ModuleInstance, ModuleType, Rule, Style};
/// use u_lookbook::propagation::{InMemoryCatalog, RulePropagator};
///
/// let crown = ModuleInstance::new("crown01", ModuleType::Crown)
///     .with_targets(["volumeIn", "volumeOut"]);
/// let bob = Style::new("bob").with_module(crown.clone());
/// let lob = Style::new("lob").with_module(crown);
/// let catalog: InMemoryCatalog = [bob.clone(), lob].into_iter().collect();
///
/// let rule = Rule::internal("crown01", "volumeIn", "volumeOut");
/// let outcome = RulePropagator::propagate(&bob, rule, &catalog).unwrap();
/// assert!(outcome.origin_changed);
/// assert_eq!(outcome.updated.len(), 1);
/// ```
pub struct RulePropagator;

impl RulePropagator {
    /// Adds `rule` to `origin` and to every other catalog style containing
    /// all the module instances the rule references.
    ///
    /// Fails only when the rule is invalid for the origin. Catalog failures
    /// and per-style incompatibilities are reported as warnings.
    pub fn propagate<C>(origin: &Style, rule: Rule, catalog: &C) -> Result<PropagationOutcome>
    where
        C: StyleCatalog + ?Sized,
    {
        rule.validate_against(origin)?;

        let mut updated_origin = origin.clone();
        let origin_changed = updated_origin.rules.insert(rule.clone());

        let mut outcome = PropagationOutcome {
            origin: updated_origin,
            origin_changed,
            updated: Vec::new(),
            unchanged: Vec::new(),
            warnings: Vec::new(),
        };

        let modules = rule.modules();
        let candidates = match catalog.find_styles_containing(&modules) {
            Ok(styles) => styles,
            Err(err) => {
                warn!(
                    style = %origin.id,
                    rule = %rule.id(),
                    error = %err,
                    "rule propagation degraded to origin only"
                );
                outcome.warnings.push(PropagationWarning::CatalogUnavailable {
                    reason: err.to_string(),
                });
                return Ok(outcome);
            }
        };

        let mut seen: BTreeSet<StyleId> = BTreeSet::new();
        seen.insert(origin.id.clone());

        for mut style in candidates {
            if !seen.insert(style.id.clone()) {
                continue;
            }
            if !modules.iter().all(|m| style.contains_module(m)) {
                debug!(style = %style.id, "catalog returned style without shared modules");
                continue;
            }
            match style.add_rule(rule.clone()) {
                Ok(true) => outcome.updated.push(style),
                Ok(false) => outcome.unchanged.push(style.id),
                Err(err) => {
                    warn!(style = %style.id, rule = %rule.id(), error = %err, "rule rejected by sharing style");
                    outcome.warnings.push(incompatible(style.id, &err));
                }
            }
        }

        debug!(
            style = %origin.id,
            rule = %rule.id(),
            updated = outcome.updated.len(),
            unchanged = outcome.unchanged.len(),
            warnings = outcome.warnings.len(),
            "propagated rule"
        );
        Ok(outcome)
    }
}

fn incompatible(style: StyleId, error: &ValidationError) -> PropagationWarning {
    PropagationWarning::Incompatible {
        style,
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleInstance, ModuleType, TargetRef};
    use crate::propagation::{CatalogError, InMemoryCatalog};
    use std::collections::BTreeSet;

    fn crown(id: &str) -> ModuleInstance {
        ModuleInstance::new(id, ModuleType::Crown)
            .with_targets(["lengthen", "curly", "volumeIn", "volumeOut"])
    }

    fn bang(id: &str) -> ModuleInstance {
        ModuleInstance::new(id, ModuleType::Bang).with_targets(["lengthen", "frizzle", "spread"])
    }

    fn catalog() -> InMemoryCatalog {
        [
            Style::new("bob").with_module(crown("crown01")).with_module(bang("bang01")),
            Style::new("lob").with_module(crown("crown01")).with_module(bang("bang01")),
            Style::new("pixie").with_module(crown("crown01")).with_module(bang("bang02")),
            Style::new("shag").with_module(crown("crown02")).with_module(bang("bang01")),
        ]
        .into_iter()
        .collect()
    }

    fn origin(catalog: &InMemoryCatalog) -> Style {
        catalog.get(&StyleId::from("bob")).cloned().unwrap()
    }

    struct Offline;

    impl StyleCatalog for Offline {
        fn find_styles_containing(
            &self,
            _modules: &BTreeSet<crate::model::ModuleId>,
        ) -> std::result::Result<Vec<Style>, CatalogError> {
            Err(CatalogError::new("index not loaded"))
        }
    }

    #[test]
    fn test_internal_rule_reaches_styles_sharing_instance() {
        let catalog = catalog();
        let rule = Rule::internal("crown01", "volumeIn", "volumeOut");
        let outcome = RulePropagator::propagate(&origin(&catalog), rule.clone(), &catalog).unwrap();

        assert!(outcome.origin_changed);
        assert!(outcome.origin.rules.contains(&rule));
        let ids: Vec<_> = outcome.updated.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["lob", "pixie"]);
        assert!(outcome.updated.iter().all(|s| s.rules.contains(&rule)));
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_cross_rule_needs_both_instances() {
        let catalog = catalog();
        let rule = Rule::cross(
            TargetRef::new("crown01", "volumeOut"),
            TargetRef::new("bang01", "spread"),
        );
        let outcome = RulePropagator::propagate(&origin(&catalog), rule, &catalog).unwrap();
        let ids: Vec<_> = outcome.updated.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["lob"]);
    }

    #[test]
    fn test_propagating_twice_is_idempotent() {
        let mut catalog = catalog();
        let rule = Rule::internal("crown01", "volumeIn", "volumeOut");

        let first = RulePropagator::propagate(&origin(&catalog), rule.clone(), &catalog).unwrap();
        catalog.insert(first.origin.clone());
        for style in &first.updated {
            catalog.insert(style.clone());
        }
        let sizes: Vec<usize> = ["bob", "lob", "pixie"]
            .iter()
            .map(|id| catalog.get(&StyleId::from(*id)).unwrap().rules.len())
            .collect();

        let second = RulePropagator::propagate(&origin(&catalog), rule, &catalog).unwrap();
        assert!(!second.origin_changed);
        assert!(second.updated.is_empty());
        assert_eq!(second.unchanged.len(), 2);
        assert_eq!(second.origin.rules.len(), sizes[0]);
        assert!(second.changed_ids().is_empty());
    }

    #[test]
    fn test_invalid_rule_for_origin_is_fatal() {
        let catalog = catalog();
        let rule = Rule::internal("crown01", "volumeIn", "missing");
        assert!(RulePropagator::propagate(&origin(&catalog), rule, &catalog).is_err());
    }

    #[test]
    fn test_catalog_failure_keeps_origin_write() {
        let catalog = catalog();
        let rule = Rule::internal("crown01", "volumeIn", "volumeOut");
        let outcome = RulePropagator::propagate(&origin(&catalog), rule.clone(), &Offline).unwrap();
        assert!(outcome.origin.rules.contains(&rule));
        assert!(outcome.updated.is_empty());
        assert!(outcome.is_degraded());
        assert!(matches!(
            outcome.warnings[0],
            PropagationWarning::CatalogUnavailable { .. }
        ));
    }

    #[test]
    fn test_incompatible_style_is_reported_and_untouched() {
        let bob = Style::new("bob").with_module(crown("crown01"));
        // same instance id, but this style's copy lacks a target
        let odd = Style::new("odd").with_module(
            ModuleInstance::new("crown01", ModuleType::Crown).with_targets(["volumeIn"]),
        );
        let catalog: InMemoryCatalog = [bob.clone(), odd].into_iter().collect();
        let rule = Rule::internal("crown01", "volumeIn", "volumeOut");

        let outcome = RulePropagator::propagate(&bob, rule, &catalog).unwrap();
        assert!(outcome.updated.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(
            &outcome.warnings[0],
            PropagationWarning::Incompatible { style, .. } if style.as_str() == "odd"
        ));
        assert!(catalog.get(&StyleId::from("odd")).unwrap().rules.is_empty());
    }

    #[test]
    fn test_origin_not_in_catalog_still_written() {
        let catalog = InMemoryCatalog::new();
        let bob = Style::new("bob").with_module(crown("crown01"));
        let rule = Rule::internal("crown01", "curly", "lengthen");
        let outcome = RulePropagator::propagate(&bob, rule, &catalog).unwrap();
        assert_eq!(outcome.changed_ids(), vec![StyleId::from("bob")]);
    }
}
