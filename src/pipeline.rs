//! Full regeneration: generate, resolve, assemble.
//!
//! Hosts usually call this off their interactive thread. Cancellation is
//! cooperative and coarse: the flag is checked before each stage, and a
//! stage that has started always finishes.

use crate::combination::CombinationGenerator;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::{Combination, Style};
use crate::timeline::{ResolvedLook, Timeline, TimelineAssembler};
use crate::weights::WeightResolver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Runs Generator → Resolver → Assembler for one style.
///
/// # Examples
///
/// ```
/// use u_lookbook::model::{ModuleInstance, ModuleType, Rule, Style};
/// use u_lookbook::{EngineConfig, Regenerator};
///
/// let mut style = Style::new("bob").with_module(
///     ModuleInstance::new("crown", ModuleType::Crown)
///         .with_targets(["lengthen", "curly", "volumeIn", "volumeOut"]),
/// );
/// style.add_rule(Rule::internal("crown", "volumeIn", "volumeOut")).unwrap();
///
/// let timeline = Regenerator::run(&style, &EngineConfig::default()).unwrap();
/// assert_eq!(timeline.len(), 12);
/// assert_eq!(timeline.end_frame(), 120);
/// ```
pub struct Regenerator;

impl Regenerator {
    /// Regenerates the style's timeline.
    pub fn run(style: &Style, config: &EngineConfig) -> Result<Timeline> {
        let combinations = CombinationGenerator::generate(style, config)?;
        let looks = resolve_looks(style, combinations);
        TimelineAssembler::assemble(&style.target_refs(), looks, config)
    }

    /// Regenerates with an optional cancellation flag.
    ///
    /// Returns `Ok(None)` when the flag was set before a stage started.
    /// Validation errors surface before any stage runs.
    pub fn run_with_cancel(
        style: &Style,
        config: &EngineConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Option<Timeline>> {
        style.validate()?;
        config.validate()?;

        let cancelled = || {
            cancel
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
        };

        if cancelled() {
            debug!(style = %style.id, "regeneration cancelled before generation");
            return Ok(None);
        }
        let combinations = CombinationGenerator::generate(style, config)?;

        if cancelled() {
            debug!(style = %style.id, "regeneration cancelled before weight resolution");
            return Ok(None);
        }
        let looks = resolve_looks(style, combinations);

        if cancelled() {
            debug!(style = %style.id, "regeneration cancelled before assembly");
            return Ok(None);
        }
        let timeline = TimelineAssembler::assemble(&style.target_refs(), looks, config)?;
        Ok(Some(timeline))
    }
}

/// Shorthand for [`Regenerator::run`].
pub fn regenerate(style: &Style, config: &EngineConfig) -> Result<Timeline> {
    Regenerator::run(style, config)
}

/// Shorthand for [`Regenerator::run_with_cancel`].
pub fn regenerate_with_cancel(
    style: &Style,
    config: &EngineConfig,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<Option<Timeline>> {
    Regenerator::run_with_cancel(style, config, cancel)
}

/// Pairs each combination with its resolved weights, keeping order.
pub fn resolve_looks(style: &Style, combinations: Vec<Combination>) -> Vec<ResolvedLook> {
    let resolver = WeightResolver::new(style);
    let weights = resolver.resolve_all(&combinations);
    combinations
        .into_iter()
        .zip(weights)
        .map(|(combination, weights)| ResolvedLook {
            combination,
            weights,
        })
        .collect()
}
