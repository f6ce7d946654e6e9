//! Frame layout and budget enforcement.

use super::types::{
    ExcludedLook, FrameRange, KeyKind, OverflowReport, ResolvedLook, StepKey, Timeline,
    TimelineEntry,
};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::TargetRef;
use tracing::{debug, warn};

/// Lays resolved combinations out on a bounded timeline.
///
/// Combination `i` occupies
/// `[start_frame + i * frame_step, start_frame + (i + 1) * frame_step)`.
/// When the combinations need more than `max_frames`, the longest prefix
/// of whole blocks that fits is kept and the rest is listed in an
/// [`OverflowReport`].
///
/// # Examples
///
/// ```
/// use u_lookbook::model::{Combination, TargetRef, WeightMap};
/// use u_lookbook::timeline::{ResolvedLook, TimelineAssembler};
/// use u_lookbook::EngineConfig;
///
/// let universe = vec![TargetRef::new("crown", "curly")];
/// let looks = vec![
///     ResolvedLook { combination: Combination::new(), weights: WeightMap::new() },
///     ResolvedLook { combination: Combination::new(), weights: WeightMap::new() },
/// ];
/// let config = EngineConfig::default().with_max_frames(10);
/// let timeline = TimelineAssembler::assemble(&universe, looks, &config).unwrap();
/// assert_eq!(timeline.len(), 1);
/// assert_eq!(timeline.overflow.unwrap().excluded_count(), 1);
/// ```
pub struct TimelineAssembler;

impl TimelineAssembler {
    /// Assembles a timeline. `universe` lists every target of the style and
    /// is what each block resets to 0.
    pub fn assemble(
        universe: &[TargetRef],
        looks: Vec<ResolvedLook>,
        config: &EngineConfig,
    ) -> Result<Timeline> {
        config.validate()?;

        let step = i64::from(config.frame_step);
        let capacity = config.capacity();
        let required_frames = looks.len() as u64 * u64::from(config.frame_step);

        let mut looks = looks;
        let overflow = if looks.len() > capacity {
            let excluded: Vec<ExcludedLook> = looks
                .split_off(capacity)
                .into_iter()
                .enumerate()
                .map(|(offset, look)| ExcludedLook {
                    index: capacity + offset,
                    combination: look.combination,
                })
                .collect();
            warn!(
                required_frames,
                max_frames = config.max_frames,
                excluded = excluded.len(),
                "timeline exceeds frame budget"
            );
            Some(OverflowReport {
                required_frames,
                max_frames: config.max_frames,
                fitted: capacity,
                excluded,
            })
        } else {
            None
        };

        let mut entries = Vec::with_capacity(looks.len());
        let mut keys = Vec::new();
        for (index, look) in looks.into_iter().enumerate() {
            // validate() keeps start_frame + max_frames in range
            let start = config.start_frame + index as i64 * step;
            push_block_keys(&mut keys, start, universe, &look);
            entries.push(TimelineEntry {
                index,
                frames: FrameRange::new(start, start + step),
                combination: look.combination,
                weights: look.weights,
            });
        }

        debug!(
            entries = entries.len(),
            keys = keys.len(),
            start_frame = config.start_frame,
            "assembled timeline"
        );

        Ok(Timeline {
            frame_step: config.frame_step,
            start_frame: config.start_frame,
            max_frames: config.max_frames,
            entries,
            keys,
            overflow,
        })
    }
}

/// Reset every target, then key the block's non-zero weights. Both land on
/// the block's first frame and hold until the next block.
fn push_block_keys(keys: &mut Vec<StepKey>, frame: i64, universe: &[TargetRef], look: &ResolvedLook) {
    keys.extend(universe.iter().map(|target| StepKey {
        frame,
        target: target.clone(),
        weight: 0.0,
        kind: KeyKind::Reset,
    }));
    keys.extend(
        look.weights
            .iter()
            .filter(|&(_, &w)| w > 0.0)
            .map(|(target, &weight)| StepKey {
                frame,
                target: target.clone(),
                weight,
                kind: KeyKind::Set,
            }),
    );
}
