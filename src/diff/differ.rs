//! Timeline vs. recomputation comparison.

use crate::combination::CombinationGenerator;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::{Combination, RuleViolation, Style, TargetRef, WeightMap, WEIGHT_EPSILON};
use crate::timeline::{FrameRange, Timeline, TimelineEntry};
use crate::weights::WeightResolver;
use std::collections::HashSet;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An existing timeline block whose combination the new rules no longer
/// produce.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InvalidRange {
    /// Entry index in the existing timeline.
    pub index: usize,
    pub frames: FrameRange,
    pub combination: Combination,
    /// Rules the block's keyed weights break under the new rule set.
    pub violations: Vec<RuleViolation>,
    /// Targets the style no longer has.
    pub unknown_targets: Vec<TargetRef>,
}

/// A block whose combination survives but resolves to different weights.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReweightedRange {
    pub index: usize,
    pub frames: FrameRange,
    pub combination: Combination,
    pub previous: WeightMap,
    pub current: WeightMap,
}

/// What a regeneration would change.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiffReport {
    /// Blocks of the existing timeline that regeneration would remove,
    /// in timeline order.
    pub invalid: Vec<InvalidRange>,
    pub reweighted: Vec<ReweightedRange>,
    /// Combinations the new rules produce that the timeline lacks, in
    /// generation order.
    pub added: Vec<Combination>,
}

impl DiffReport {
    /// Nothing would be removed or reweighted.
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty() && self.reweighted.is_empty()
    }

    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    /// Invalid frame ranges with adjacent blocks coalesced.
    pub fn merged_ranges(&self) -> Vec<FrameRange> {
        let mut merged: Vec<FrameRange> = Vec::new();
        for range in self.invalid.iter().map(|r| r.frames) {
            match merged.last_mut() {
                Some(last) if last.end >= range.start => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }
        merged
    }

    /// Frames covered by invalid blocks.
    pub fn invalid_frames(&self) -> i64 {
        self.invalid.iter().map(|r| r.frames.len()).sum()
    }
}

/// Read-only preview of a destructive regenerate.
///
/// Recomputes combinations and weights for the style's current rules and
/// compares them with an existing timeline by target-set identity. The
/// existing timeline is never modified.
pub struct RegenerationDiffer;

impl RegenerationDiffer {
    /// Compares `existing` with what `style` generates under `config`.
    ///
    /// `config` should carry the generator options the existing timeline
    /// was built with; otherwise filtered combinations show up as invalid
    /// or added.
    pub fn diff(existing: &Timeline, style: &Style, config: &EngineConfig) -> Result<DiffReport> {
        let fresh = CombinationGenerator::generate(style, config)?;
        let fresh_set: HashSet<&Combination> = fresh.iter().collect();
        let resolver = WeightResolver::new(style);
        let universe: HashSet<TargetRef> = style.target_refs().into_iter().collect();

        let mut report = DiffReport::default();
        for entry in &existing.entries {
            if fresh_set.contains(&entry.combination) {
                let current = resolver.resolve(&entry.combination);
                if !same_weights(&entry.weights, &current) {
                    report.reweighted.push(ReweightedRange {
                        index: entry.index,
                        frames: entry.frames,
                        combination: entry.combination.clone(),
                        previous: entry.weights.clone(),
                        current,
                    });
                }
            } else {
                report.invalid.push(invalid_range(entry, style, &universe));
            }
        }

        // Looks the old budget left off were still generated by the old rules.
        let overflowed = existing
            .overflow
            .iter()
            .flat_map(|o| o.excluded.iter().map(|e| &e.combination));
        let existing_set: HashSet<&Combination> =
            existing.combinations().chain(overflowed).collect();
        report.added = fresh
            .iter()
            .filter(|c| !existing_set.contains(c))
            .cloned()
            .collect();

        debug!(
            style = %style.id,
            invalid = report.invalid.len(),
            reweighted = report.reweighted.len(),
            added = report.added.len(),
            "diffed timeline against new rules"
        );
        Ok(report)
    }
}

fn invalid_range(
    entry: &TimelineEntry,
    style: &Style,
    universe: &HashSet<TargetRef>,
) -> InvalidRange {
    InvalidRange {
        index: entry.index,
        frames: entry.frames,
        combination: entry.combination.clone(),
        violations: style.rules.violations(&entry.weights),
        unknown_targets: entry
            .combination
            .iter()
            .filter(|t| !universe.contains(*t))
            .cloned()
            .collect(),
    }
}

/// Missing targets count as 0.
fn same_weights(a: &WeightMap, b: &WeightMap) -> bool {
    let get = |m: &WeightMap, t: &TargetRef| m.get(t).copied().unwrap_or(0.0);
    a.keys()
        .chain(b.keys())
        .all(|t| (get(a, t) - get(b, t)).abs() <= WEIGHT_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleInstance, ModuleType, Rule};
    use crate::Regenerator;

    fn style() -> Style {
        Style::new("bob")
            .with_module(
                ModuleInstance::new("crown", ModuleType::Crown)
                    .with_targets(["lengthen", "curly", "volumeIn", "volumeOut"]),
            )
            .with_module(
                ModuleInstance::new("bang", ModuleType::Bang)
                    .with_targets(["lengthen", "frizzle", "spread"]),
            )
    }

    #[test]
    fn test_same_rules_is_clean() {
        let config = EngineConfig::default();
        let timeline = Regenerator::run(&style(), &config).unwrap();
        let report = RegenerationDiffer::diff(&timeline, &style(), &config).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.added_count(), 0);
        assert!(report.merged_ranges().is_empty());
    }

    #[test]
    fn test_overflowed_looks_are_not_added() {
        let config = EngineConfig::default().with_max_frames(100);
        let crown = Style::new("crown_only").with_module(
            ModuleInstance::new("crown", ModuleType::Crown)
                .with_targets(["lengthen", "curly", "volumeIn", "volumeOut"]),
        );
        let timeline = Regenerator::run(&crown, &config).unwrap();
        assert_eq!(timeline.len(), 10);
        assert_eq!(timeline.overflow.as_ref().unwrap().excluded_count(), 6);

        let report = RegenerationDiffer::diff(&timeline, &crown, &config).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.added_count(), 0);

        // a rule that removes overflowed looks adds nothing either
        let mut ruled = crown.clone();
        ruled
            .add_rule(Rule::internal("crown", "volumeIn", "volumeOut"))
            .unwrap();
        let report = RegenerationDiffer::diff(&timeline, &ruled, &config).unwrap();
        assert_eq!(report.added_count(), 0);
    }

    #[test]
    fn test_new_exclusion_flags_ranges() {
        let config = EngineConfig::default();
        let old = style();
        let timeline = Regenerator::run(&old, &config).unwrap();

        let mut new = old.clone();
        new.add_rule(Rule::internal("crown", "volumeIn", "volumeOut"))
            .unwrap();
        let report = RegenerationDiffer::diff(&timeline, &new, &config).unwrap();

        // 16 crown subsets drop to 12, times 8 bang subsets
        assert_eq!(report.invalid.len(), 4 * 8);
        assert_eq!(report.added_count(), 0);
        assert!(report.reweighted.is_empty());
        for range in &report.invalid {
            assert!(range
                .combination
                .contains_all(&[TargetRef::new("crown", "volumeIn"), TargetRef::new("crown", "volumeOut")]));
            assert_eq!(range.violations.len(), 1);
            assert_eq!(
                timeline.entries[range.index].frames,
                range.frames
            );
        }
        assert_eq!(report.invalid_frames(), 32 * 10);
        // the timeline itself is untouched
        assert_eq!(timeline.len(), 128);
    }

    #[test]
    fn test_constraint_reports_reweighted() {
        let config = EngineConfig::default();
        let old = style();
        let timeline = Regenerator::run(&old, &config).unwrap();

        let mut new = old.clone();
        new.add_rule(Rule::constraint(
            vec![TargetRef::new("bang", "lengthen"), TargetRef::new("crown", "lengthen")],
            vec![1.0, 0.7],
        ))
        .unwrap();
        let report = RegenerationDiffer::diff(&timeline, &new, &config).unwrap();

        assert!(report.invalid.is_empty());
        // crown.lengthen and bang.lengthen together: 8 crown x 4 bang subsets
        assert_eq!(report.reweighted.len(), 32);
        let first = &report.reweighted[0];
        assert_eq!(first.current[&TargetRef::new("crown", "lengthen")], 0.7);
        assert_eq!(first.previous[&TargetRef::new("crown", "lengthen")], 1.0);
    }

    #[test]
    fn test_removed_exclusion_reports_added() {
        let config = EngineConfig::default();
        let mut old = style();
        old.add_rule(Rule::internal("crown", "volumeIn", "volumeOut"))
            .unwrap();
        let timeline = Regenerator::run(&old, &config).unwrap();

        let report = RegenerationDiffer::diff(&timeline, &style(), &config).unwrap();
        assert!(report.invalid.is_empty());
        assert_eq!(report.added_count(), 32);
    }

    #[test]
    fn test_removed_target_is_unknown() {
        let config = EngineConfig::default();
        let timeline = Regenerator::run(&style(), &config).unwrap();
        let new = Style::new("bob")
            .with_module(
                ModuleInstance::new("crown", ModuleType::Crown)
                    .with_targets(["lengthen", "curly", "volumeIn", "volumeOut"]),
            )
            .with_module(
                ModuleInstance::new("bang", ModuleType::Bang).with_targets(["lengthen", "frizzle"]),
            );
        let report = RegenerationDiffer::diff(&timeline, &new, &config).unwrap();
        assert_eq!(report.invalid.len(), 64);
        assert!(report
            .invalid
            .iter()
            .all(|r| r.unknown_targets == vec![TargetRef::new("bang", "spread")]));
    }

    #[test]
    fn test_merged_ranges_coalesce_adjacent() {
        let range = |index: usize, start: i64| InvalidRange {
            index,
            frames: FrameRange::new(start, start + 10),
            combination: Combination::new(),
            violations: Vec::new(),
            unknown_targets: Vec::new(),
        };
        let report = DiffReport {
            invalid: vec![range(0, 0), range(1, 10), range(3, 30)],
            ..DiffReport::default()
        };
        assert_eq!(
            report.merged_ranges(),
            vec![FrameRange::new(0, 20), FrameRange::new(30, 40)]
        );
    }
}
