//! Exclusion graph over one module instance's targets.

use crate::error::{Result, ValidationError};
use crate::model::{
    InternalExclusion, ModuleInstance, TargetId, TargetRef, MAX_TARGETS_PER_MODULE,
    TARGET_ENVELOPE,
};
use std::collections::BTreeSet;
use tracing::warn;

/// Undirected graph whose vertices are a module's targets and whose edges
/// are its internal exclusions.
///
/// Vertices are the module's target positions; each vertex stores its
/// neighbours as a bitmask, which bounds a module at
/// [`MAX_TARGETS_PER_MODULE`] targets.
///
/// # Examples
///
/// ```
/// use u_lookbook::exclusion::ExclusionGraph;
/// use u_lookbook::model::{InternalExclusion, ModuleInstance, ModuleType};
///
/// let crown = ModuleInstance::new("crown", ModuleType::Crown)
///     .with_targets(["lengthen", "curly", "volumeIn", "volumeOut"]);
/// let edges = [InternalExclusion::new("crown", "volumeIn", "volumeOut")];
/// let graph = ExclusionGraph::build(&crown, &edges).unwrap();
/// // 16 subsets minus the 4 that contain both volume targets
/// assert_eq!(graph.valid_local_subsets().len(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct ExclusionGraph<'m> {
    module: &'m ModuleInstance,
    adjacency: Vec<u32>,
    edges: usize,
}

impl<'m> ExclusionGraph<'m> {
    /// Builds the graph, rejecting any edge that does not resolve to two
    /// distinct targets of `module`.
    pub fn build<'r, I>(module: &'m ModuleInstance, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'r InternalExclusion>,
    {
        let n = module.targets.len();
        if n > MAX_TARGETS_PER_MODULE {
            return Err(ValidationError::TooManyTargets {
                module: module.id.clone(),
                count: n,
                limit: MAX_TARGETS_PER_MODULE,
            });
        }
        if n > TARGET_ENVELOPE {
            warn!(
                module = %module.id,
                targets = n,
                envelope = TARGET_ENVELOPE,
                "module exceeds the target envelope; subset enumeration grows as 2^n"
            );
        }

        let mut adjacency = vec![0u32; n];
        let mut count = 0;
        for edge in edges {
            if edge.module != module.id {
                return Err(ValidationError::UnknownModule(edge.module.clone()));
            }
            let a = Self::index_of(module, &edge.a)?;
            let b = Self::index_of(module, &edge.b)?;
            if a == b {
                return Err(ValidationError::SelfExclusion(TargetRef::new(
                    module.id.clone(),
                    edge.a.clone(),
                )));
            }
            if adjacency[a] & (1 << b) == 0 {
                count += 1;
            }
            adjacency[a] |= 1 << b;
            adjacency[b] |= 1 << a;
        }

        Ok(Self {
            module,
            adjacency,
            edges: count,
        })
    }

    fn index_of(module: &ModuleInstance, target: &TargetId) -> Result<usize> {
        module.target_index(target).ok_or_else(|| {
            ValidationError::UnknownTarget(TargetRef::new(module.id.clone(), target.clone()))
        })
    }

    pub fn module(&self) -> &'m ModuleInstance {
        self.module
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of distinct exclusion edges.
    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Whether an edge joins the two targets. Unknown ids are never excluded.
    pub fn are_excluded(&self, a: &TargetId, b: &TargetId) -> bool {
        match (self.module.target_index(a), self.module.target_index(b)) {
            (Some(i), Some(j)) => self.adjacency[i] & (1 << j) != 0,
            _ => false,
        }
    }

    fn mask_is_independent(&self, mask: u32) -> bool {
        let mut rest = mask;
        while rest != 0 {
            let i = rest.trailing_zeros() as usize;
            if self.adjacency[i] & mask != 0 {
                return false;
            }
            rest &= rest - 1;
        }
        true
    }

    /// Whether no two targets of `subset` are joined by an edge.
    pub fn is_independent(&self, subset: &BTreeSet<TargetId>) -> bool {
        let mut mask = 0u32;
        for id in subset {
            match self.module.target_index(id) {
                Some(i) => mask |= 1 << i,
                None => return false,
            }
        }
        self.mask_is_independent(mask)
    }

    /// Bitmasks (bit `i` = the module's `i`-th target) of every independent
    /// set, ascending. Always starts with the empty mask.
    pub(crate) fn valid_masks(&self) -> Vec<u32> {
        let n = self.adjacency.len();
        (0..(1u32 << n))
            .filter(|&mask| self.mask_is_independent(mask))
            .collect()
    }

    /// Every target subset, including the empty one, that contains no
    /// excluded pair.
    pub fn valid_local_subsets(&self) -> Vec<BTreeSet<TargetId>> {
        self.valid_masks()
            .into_iter()
            .map(|mask| self.targets_of(mask).cloned().collect())
            .collect()
    }

    /// Targets selected by a mask, in module order.
    pub(crate) fn targets_of(&self, mask: u32) -> impl Iterator<Item = &'m TargetId> + '_ {
        let module = self.module;
        (0..self.adjacency.len())
            .filter(move |i| mask & (1 << i) != 0)
            .map(move |i| &module.targets[i].id)
    }
}

/// Builds the module's exclusion graph and enumerates its valid subsets.
///
/// Only edges declared on `module` are used; edges for other modules in
/// the iterator are skipped.
pub fn valid_local_subsets<'r, I>(module: &ModuleInstance, edges: I) -> Result<Vec<BTreeSet<TargetId>>>
where
    I: IntoIterator<Item = &'r InternalExclusion>,
{
    let own = edges.into_iter().filter(|e| e.module == module.id);
    Ok(ExclusionGraph::build(module, own)?.valid_local_subsets())
}
