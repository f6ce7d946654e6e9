//! Property-based tests for u-lookbook.
//!
//! These tests verify, over randomly shaped styles:
//! - Local subsets are independent sets and include the empty set
//! - Generated combinations never contain an excluded pair
//! - Weight resolution is idempotent
//! - Generation and assembly are deterministic
//! - The timeline never exceeds its frame budget
//! - Rule propagation is idempotent

use proptest::prelude::*;
use u_lookbook::combination::CombinationGenerator;
use u_lookbook::exclusion::ExclusionGraph;
use u_lookbook::model::{ModuleInstance, ModuleType, Rule, Style, MAX_MODULES_PER_STYLE};
use u_lookbook::propagation::{InMemoryCatalog, RulePropagator};
use u_lookbook::weights::WeightResolver;
use u_lookbook::{EngineConfig, Regenerator};

// =============================================================================
// Style strategy
// =============================================================================

/// Raw material for one random style.
#[derive(Debug, Clone)]
struct StyleSeed {
    sizes: Vec<usize>,
    internal_bits: Vec<bool>,
    cross: Vec<(usize, usize)>,
    constraint: Option<(usize, usize, f64, f64)>,
}

/// Pairs `(i, j)` with `i < j` over `n` targets, in a fixed order.
fn pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

fn style_seed_strategy() -> impl Strategy<Value = StyleSeed> {
    (
        prop::collection::vec(1usize..=4, 1..=MAX_MODULES_PER_STYLE),
        prop::collection::vec(any::<bool>(), MAX_MODULES_PER_STYLE * 6),
        prop::collection::vec((0usize..16, 0usize..16), 0..4),
        prop::option::of((0usize..16, 0usize..16, 0.0f64..=1.0, 0.0f64..=1.0)),
    )
        .prop_map(|(sizes, internal_bits, cross, constraint)| StyleSeed {
            sizes,
            internal_bits,
            cross,
            constraint,
        })
}

fn build_style(seed: &StyleSeed) -> Style {
    let mut style = Style::new("prop");
    for (m, &size) in seed.sizes.iter().enumerate() {
        let ty = ModuleType::ALL[m];
        let ids: Vec<String> = (0..size).map(|i| format!("t{i}")).collect();
        style = style.with_module(ModuleInstance::new(ty.as_str(), ty).with_targets(ids));
    }

    for (m, &size) in seed.sizes.iter().enumerate() {
        let module = ModuleType::ALL[m].as_str();
        for (k, (i, j)) in pairs(size).into_iter().enumerate() {
            if seed.internal_bits[m * 6 + k] {
                style
                    .add_rule(Rule::internal(module, format!("t{i}"), format!("t{j}")))
                    .expect("generated internal exclusion is valid");
            }
        }
    }

    let refs = style.target_refs();
    for &(a, b) in &seed.cross {
        let (a, b) = (&refs[a % refs.len()], &refs[b % refs.len()]);
        if a.module != b.module {
            style
                .add_rule(Rule::cross(a.clone(), b.clone()))
                .expect("generated cross exclusion is valid");
        }
    }

    if let Some((a, b, max_a, max_b)) = seed.constraint {
        let (a, b) = (&refs[a % refs.len()], &refs[b % refs.len()]);
        if a != b {
            style
                .add_rule(Rule::constraint(vec![a.clone(), b.clone()], vec![max_a, max_b]))
                .expect("generated constraint is valid");
        }
    }
    style
}

fn style_strategy() -> impl Strategy<Value = Style> {
    style_seed_strategy().prop_map(|seed| build_style(&seed))
}

// =============================================================================
// Exclusion and generation properties
// =============================================================================

proptest! {
    /// Every local subset is independent and the empty set is present
    #[test]
    fn local_subsets_are_independent(style in style_strategy()) {
        for module in &style.modules {
            let graph = ExclusionGraph::build(module, style.rules.internal_for(&module.id)).unwrap();
            let subsets = graph.valid_local_subsets();
            prop_assert!(subsets.iter().any(|s| s.is_empty()));
            for subset in &subsets {
                prop_assert!(graph.is_independent(subset));
                for ex in style.rules.internal_for(&module.id) {
                    prop_assert!(!(subset.contains(&ex.a) && subset.contains(&ex.b)));
                }
            }
        }
    }

    /// No combination contains both ends of an exclusion
    #[test]
    fn combinations_respect_exclusions(style in style_strategy()) {
        let combos = CombinationGenerator::generate(&style, &EngineConfig::default()).unwrap();
        prop_assert!(!combos.is_empty());
        for combo in &combos {
            for (a, b) in style.rules.exclusion_pairs() {
                prop_assert!(!(combo.contains(&a) && combo.contains(&b)));
            }
        }
    }

    /// Combinations are unique by target set
    #[test]
    fn combinations_are_unique(style in style_strategy()) {
        let combos = CombinationGenerator::generate(&style, &EngineConfig::default()).unwrap();
        let unique: std::collections::HashSet<_> = combos.iter().collect();
        prop_assert_eq!(unique.len(), combos.len());
    }

    /// Identical inputs give identical order; identical seeds give identical shuffles
    #[test]
    fn generation_is_deterministic(style in style_strategy(), seed in any::<u64>()) {
        let config = EngineConfig::default();
        let a = CombinationGenerator::generate(&style, &config).unwrap();
        let b = CombinationGenerator::generate(&style, &config).unwrap();
        prop_assert_eq!(a, b);

        let seeded = config.with_order_seed(seed);
        let a = CombinationGenerator::generate(&style, &seeded).unwrap();
        let b = CombinationGenerator::generate(&style, &seeded).unwrap();
        prop_assert_eq!(a, b);
    }
}

// =============================================================================
// Weight properties
// =============================================================================

proptest! {
    /// Resolving an already resolved map changes nothing
    #[test]
    fn resolution_is_idempotent(style in style_strategy()) {
        let combos = CombinationGenerator::generate(&style, &EngineConfig::default()).unwrap();
        let resolver = WeightResolver::new(&style);
        for combo in &combos {
            let once = resolver.resolve(combo);
            let twice = resolver.reapply(&once);
            prop_assert_eq!(&once, &twice);
        }
    }

    /// Resolved weights stay in [0, 1] and absent targets are 0
    #[test]
    fn weights_in_domain(style in style_strategy()) {
        let combos = CombinationGenerator::generate(&style, &EngineConfig::default()).unwrap();
        let resolver = WeightResolver::new(&style);
        for combo in &combos {
            let weights = resolver.resolve(combo);
            prop_assert_eq!(weights.len(), style.target_count());
            for (target, &w) in &weights {
                prop_assert!((0.0..=1.0).contains(&w));
                if !combo.contains(target) {
                    prop_assert_eq!(w, 0.0);
                }
            }
        }
    }
}

// =============================================================================
// Timeline properties
// =============================================================================

proptest! {
    /// The timeline never exceeds max_frames and nothing is silently dropped
    #[test]
    fn timeline_within_budget(
        style in style_strategy(),
        step in 1u32..=20,
        max_frames in 0u32..=400,
    ) {
        let config = EngineConfig::default()
            .with_frame_step(step)
            .with_max_frames(max_frames);
        let total = CombinationGenerator::generate(&style, &config).unwrap().len();
        let timeline = Regenerator::run(&style, &config).unwrap();

        prop_assert!(timeline.total_frames() <= u64::from(max_frames));
        let excluded = timeline.overflow.as_ref().map_or(0, |o| o.excluded_count());
        prop_assert_eq!(timeline.len() + excluded, total);
        for (i, entry) in timeline.entries.iter().enumerate() {
            prop_assert_eq!(entry.frames.start, i as i64 * i64::from(step));
            prop_assert_eq!(entry.frames.len(), i64::from(step));
        }
    }

    /// Two runs produce the same timeline
    #[test]
    fn timeline_is_deterministic(style in style_strategy()) {
        let config = EngineConfig::default();
        let a = Regenerator::run(&style, &config).unwrap();
        let b = Regenerator::run(&style, &config).unwrap();
        prop_assert_eq!(a, b);
    }
}

// =============================================================================
// Propagation properties
// =============================================================================

proptest! {
    /// Propagating the same rule twice leaves rule-set sizes unchanged
    #[test]
    fn propagation_is_idempotent(seed in style_seed_strategy(), pick in 0usize..16) {
        let origin = build_style(&seed);
        let mut sibling = build_style(&seed);
        sibling.id = "sibling".into();
        let mut catalog: InMemoryCatalog = [origin.clone(), sibling].into_iter().collect();

        let refs = origin.target_refs();
        let module = refs[pick % refs.len()].module.clone();
        let n = origin.module(&module).map_or(0, |m| m.targets.len());
        if n < 2 {
            let self_exclusion = Rule::internal(module, "t0", "t0");
            prop_assert!(RulePropagator::propagate(&origin, self_exclusion, &catalog).is_err());
            return Ok(());
        }
        let rule = Rule::internal(module, "t0", format!("t{}", n - 1));

        let first = RulePropagator::propagate(&origin, rule.clone(), &catalog).unwrap();
        catalog.insert(first.origin.clone());
        for style in &first.updated {
            catalog.insert(style.clone());
        }
        let sizes: Vec<usize> = ["prop", "sibling"]
            .iter()
            .map(|id| catalog.get(&(*id).into()).unwrap().rules.len())
            .collect();

        let origin = catalog.get(&"prop".into()).cloned().unwrap();
        let second = RulePropagator::propagate(&origin, rule, &catalog).unwrap();
        prop_assert!(!second.origin_changed);
        prop_assert!(second.updated.is_empty());
        prop_assert_eq!(second.origin.rules.len(), sizes[0]);
        prop_assert_eq!(sizes[0], sizes[1]);
    }
}

// =============================================================================
// Overflow boundary
// =============================================================================

/// One module with 10 unconstrained targets: 1024 looks.
fn wide_style() -> Style {
    Style::new("wide")
        .with_module(
            ModuleInstance::new("crown", ModuleType::Crown)
                .with_targets((0..10).map(|i| format!("t{i}"))),
        )
}

#[test]
fn overflow_boundary_600_and_601() {
    let style = wide_style();
    let combos = CombinationGenerator::generate(&style, &EngineConfig::default()).unwrap();
    assert_eq!(combos.len(), 1024);
    let universe = style.target_refs();
    let config = EngineConfig::default();

    let looks = |n: usize| u_lookbook::resolve_looks(&style, combos[..n].to_vec());

    let fit = u_lookbook::timeline::TimelineAssembler::assemble(&universe, looks(600), &config)
        .unwrap();
    assert_eq!(fit.len(), 600);
    assert!(fit.overflow.is_none());

    let over = u_lookbook::timeline::TimelineAssembler::assemble(&universe, looks(601), &config)
        .unwrap();
    assert_eq!(over.len(), 600);
    let report = over.overflow.expect("overflow report");
    assert_eq!(report.excluded_count(), 1);
    assert_eq!(report.excluded[0].index, 600);
    assert_eq!(report.excluded[0].combination, combos[600]);
}

#[cfg(feature = "serde")]
#[test]
fn timeline_serde_round_trip() {
    let style = wide_style();
    let config = EngineConfig::default().with_max_frames(100);
    let timeline = Regenerator::run(&style, &config).unwrap();
    let json = serde_json::to_string(&timeline).unwrap();
    let back: u_lookbook::timeline::Timeline = serde_json::from_str(&json).unwrap();
    assert_eq!(timeline, back);
}
