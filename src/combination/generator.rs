//! Combination generation across a style.

use crate::config::EngineConfig;
use crate::error::{Result, ValidationError};
use crate::exclusion::ExclusionGraph;
use crate::model::{Combination, CrossExclusion, Style, TargetId, TargetRef, MAX_CANDIDATES};
use crate::random::{create_rng, shuffle};
use tracing::debug;

/// Result of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// Valid combinations in emission order.
    pub combinations: Vec<Combination>,

    /// Number of cartesian-product tuples examined.
    pub candidates: usize,

    /// Candidates rejected by a cross-module exclusion.
    pub rejected: usize,

    /// Valid candidates dropped by `skip_empty` or `max_active_targets`.
    pub filtered: usize,
}

/// One module's locally valid subsets, as target refs.
struct LocalChoices {
    subsets: Vec<Vec<TargetRef>>,
}

/// Enumerates every valid combination of a style.
///
/// # Examples
///
/// ```
/// use u_lookbook::combination::CombinationGenerator;
/// use u_lookbook::model::{ModuleInstance, ModuleType, Rule, Style, TargetRef};
/// use u_lookbook::EngineConfig;
///
/// let mut style = Style::new("bob")
///     .with_module(ModuleInstance::new("crown", ModuleType::Crown).with_targets(["volumeOut"]))
///     .with_module(ModuleInstance::new("bang", ModuleType::Bang).with_targets(["spread"]));
/// style
///     .add_rule(Rule::cross(
///         TargetRef::new("crown", "volumeOut"),
///         TargetRef::new("bang", "spread"),
///     ))
///     .unwrap();
///
/// let looks = CombinationGenerator::generate(&style, &EngineConfig::default()).unwrap();
/// // {}, {volumeOut}, {spread}; never both
/// assert_eq!(looks.len(), 3);
/// ```
pub struct CombinationGenerator;

impl CombinationGenerator {
    /// Generates the style's combinations.
    pub fn generate(style: &Style, config: &EngineConfig) -> Result<Vec<Combination>> {
        Self::run(style, config).map(|r| r.combinations)
    }

    /// Generates the style's combinations and reports counts.
    ///
    /// Validates the style first; a malformed rule aborts before any
    /// combination is produced, and so does a style whose cartesian
    /// product would exceed [`MAX_CANDIDATES`].
    pub fn run(style: &Style, config: &EngineConfig) -> Result<GenerationResult> {
        style.validate()?;
        config.validate()?;

        let locals = local_choices(style)?;
        let mut result = cartesian_merge(&locals, &style.rules.cross, config);

        sort_by_module_order(style, &mut result.combinations);
        debug_assert!(
            result.combinations.windows(2).all(|w| w[0] != w[1]),
            "cartesian merge produced a duplicate combination"
        );
        if let Some(seed) = config.order_seed {
            let mut rng = create_rng(seed);
            shuffle(&mut result.combinations, &mut rng);
        }

        debug!(
            style = %style.id,
            candidates = result.candidates,
            rejected = result.rejected,
            filtered = result.filtered,
            emitted = result.combinations.len(),
            "generated combinations"
        );
        Ok(result)
    }
}

fn local_choices(style: &Style) -> Result<Vec<LocalChoices>> {
    let graphs = style
        .modules
        .iter()
        .map(|module| ExclusionGraph::build(module, style.rules.internal_for(&module.id)))
        .collect::<Result<Vec<_>>>()?;
    let masks: Vec<Vec<u32>> = graphs.iter().map(ExclusionGraph::valid_masks).collect();

    let count = masks
        .iter()
        .try_fold(1usize, |acc, m| acc.checked_mul(m.len()))
        .unwrap_or(usize::MAX);
    if count > MAX_CANDIDATES {
        return Err(ValidationError::TooManyCandidates {
            style: style.id.clone(),
            count,
            limit: MAX_CANDIDATES,
        });
    }

    Ok(graphs
        .iter()
        .zip(masks)
        .map(|(graph, masks)| {
            let module = &graph.module().id;
            let subsets = masks
                .into_iter()
                .map(|mask| {
                    graph
                        .targets_of(mask)
                        .map(|t| TargetRef::new(module.clone(), t.clone()))
                        .collect()
                })
                .collect();
            LocalChoices { subsets }
        })
        .collect())
}

/// Walks the cartesian product of local subsets in style order, merging
/// each tuple and keeping the merged sets that pass every cross-module
/// exclusion and the config filters.
fn cartesian_merge(
    locals: &[LocalChoices],
    cross: &[CrossExclusion],
    config: &EngineConfig,
) -> GenerationResult {
    let mut result = GenerationResult {
        combinations: Vec::new(),
        candidates: 0,
        rejected: 0,
        filtered: 0,
    };
    // Every module has at least the empty subset, so each list is non-empty.
    let mut cursor = vec![0usize; locals.len()];
    loop {
        let candidate: Combination = locals
            .iter()
            .zip(&cursor)
            .flat_map(|(local, &i)| local.subsets[i].iter().cloned())
            .collect();
        result.candidates += 1;

        if cross
            .iter()
            .any(|ex| candidate.contains(&ex.a) && candidate.contains(&ex.b))
        {
            result.rejected += 1;
        } else if (config.skip_empty && candidate.is_empty())
            || config
                .max_active_targets
                .is_some_and(|max| candidate.len() > max)
        {
            result.filtered += 1;
        } else {
            // Module ids are unique and each module's subsets are distinct,
            // so merged candidates never repeat.
            result.combinations.push(candidate);
        }

        // Advance the odometer; the last module turns fastest.
        let mut pos = locals.len();
        loop {
            if pos == 0 {
                return result;
            }
            pos -= 1;
            cursor[pos] += 1;
            if cursor[pos] < locals[pos].subsets.len() {
                break;
            }
            cursor[pos] = 0;
        }
    }
}

/// Sorts combinations lexicographically by `(module position, target id)`.
fn sort_by_module_order(style: &Style, combinations: &mut [Combination]) {
    combinations.sort_by_cached_key(|c| {
        let mut key: Vec<(usize, TargetId)> = c
            .iter()
            .map(|t| {
                let pos = style.module_index(&t.module).unwrap_or(usize::MAX);
                (pos, t.target.clone())
            })
            .collect();
        key.sort();
        key
    });
}
