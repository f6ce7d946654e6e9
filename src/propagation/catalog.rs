//! Style lookup capability used by propagation.

use crate::model::{ModuleId, Style, StyleId};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// The catalog could not answer a lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("style catalog unavailable: {0}")]
pub struct CatalogError(pub String);

impl CatalogError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Finds styles by the module instances they contain.
///
/// Implemented by the host over whatever store holds its styles. The
/// engine only reads through this trait.
pub trait StyleCatalog {
    /// Every known style containing all of `modules` (by instance id).
    fn find_styles_containing(
        &self,
        modules: &BTreeSet<ModuleId>,
    ) -> Result<Vec<Style>, CatalogError>;
}

impl StyleCatalog for [Style] {
    fn find_styles_containing(
        &self,
        modules: &BTreeSet<ModuleId>,
    ) -> Result<Vec<Style>, CatalogError> {
        Ok(self
            .iter()
            .filter(|s| modules.iter().all(|m| s.contains_module(m)))
            .cloned()
            .collect())
    }
}

impl StyleCatalog for Vec<Style> {
    fn find_styles_containing(
        &self,
        modules: &BTreeSet<ModuleId>,
    ) -> Result<Vec<Style>, CatalogError> {
        self.as_slice().find_styles_containing(modules)
    }
}

/// Styles kept in memory with a module-instance → style index.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    styles: BTreeMap<StyleId, Style>,
    index: BTreeMap<ModuleId, BTreeSet<StyleId>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a style and reindexes its modules.
    pub fn insert(&mut self, style: Style) {
        self.remove(&style.id);
        for module in &style.modules {
            self.index
                .entry(module.id.clone())
                .or_default()
                .insert(style.id.clone());
        }
        self.styles.insert(style.id.clone(), style);
    }

    pub fn remove(&mut self, id: &StyleId) -> Option<Style> {
        let style = self.styles.remove(id)?;
        for module in &style.modules {
            if let Some(ids) = self.index.get_mut(&module.id) {
                ids.remove(id);
                if ids.is_empty() {
                    self.index.remove(&module.id);
                }
            }
        }
        Some(style)
    }

    pub fn get(&self, id: &StyleId) -> Option<&Style> {
        self.styles.get(id)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Ids of styles using a module instance.
    pub fn styles_using(&self, module: &ModuleId) -> impl Iterator<Item = &StyleId> {
        self.index.get(module).into_iter().flatten()
    }
}

impl FromIterator<Style> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Style>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for style in iter {
            catalog.insert(style);
        }
        catalog
    }
}

impl StyleCatalog for InMemoryCatalog {
    fn find_styles_containing(
        &self,
        modules: &BTreeSet<ModuleId>,
    ) -> Result<Vec<Style>, CatalogError> {
        let mut ids: Option<BTreeSet<StyleId>> = None;
        for module in modules {
            let using: BTreeSet<StyleId> = self.styles_using(module).cloned().collect();
            ids = Some(match ids {
                None => using,
                Some(acc) => acc.intersection(&using).cloned().collect(),
            });
        }
        Ok(ids
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.styles.get(id).cloned())
            .collect())
    }
}
