//! Module instances and styles.

use super::ids::{ModuleId, StyleId, TargetId, TargetRef};
use super::rules::{Rule, RuleSet};
use crate::error::{Result, ValidationError};
use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A style holds at most this many module instances.
pub const MAX_MODULES_PER_STYLE: usize = 4;

/// Targets per module that local subset enumeration is tuned for.
///
/// Larger modules still work but are logged, since the subset count
/// doubles with each extra target.
pub const TARGET_ENVELOPE: usize = 4;

/// Hard limit on targets per module.
pub const MAX_TARGETS_PER_MODULE: usize = 16;

/// Upper bound on cartesian-product candidates per style, the product of
/// every module's valid subset count. Equal to four modules of four free
/// targets each.
pub const MAX_CANDIDATES: usize = 1 << 16;

/// Module categories. A style holds at most one instance of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ModuleType {
    Scalp,
    Crown,
    Tail,
    Bang,
}

impl ModuleType {
    pub const ALL: [ModuleType; 4] = [
        ModuleType::Scalp,
        ModuleType::Crown,
        ModuleType::Tail,
        ModuleType::Bang,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Scalp => "scalp",
            ModuleType::Crown => "crown",
            ModuleType::Tail => "tail",
            ModuleType::Bang => "bang",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deformation-weight channel owned by a module instance.
///
/// Weights live in `[0, 1]` and rest at 0.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Target {
    pub id: TargetId,
    /// Display name shown by hosts. Defaults to the id.
    pub name: String,
}

impl Target {
    pub fn new(id: impl Into<TargetId>) -> Self {
        let id = id.into();
        let name = id.to_string();
        Self { id, name }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A concrete module slot: an id, its category, and its ordered targets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModuleInstance {
    pub id: ModuleId,
    pub module_type: ModuleType,
    pub targets: Vec<Target>,
}

impl ModuleInstance {
    pub fn new(id: impl Into<ModuleId>, module_type: ModuleType) -> Self {
        Self {
            id: id.into(),
            module_type,
            targets: Vec::new(),
        }
    }

    /// Builder: appends targets by id.
    pub fn with_targets<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TargetId>,
    {
        self.targets.extend(ids.into_iter().map(Target::new));
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    /// Position of a target in this module's ordered list.
    pub fn target_index(&self, id: &TargetId) -> Option<usize> {
        self.targets.iter().position(|t| &t.id == id)
    }

    pub fn has_target(&self, id: &TargetId) -> bool {
        self.target_index(id).is_some()
    }

    /// References to every target, in module order.
    pub fn target_refs(&self) -> impl Iterator<Item = TargetRef> + '_ {
        self.targets
            .iter()
            .map(move |t| TargetRef::new(self.id.clone(), t.id.clone()))
    }

    fn validate(&self) -> Result<()> {
        if self.targets.len() > MAX_TARGETS_PER_MODULE {
            return Err(ValidationError::TooManyTargets {
                module: self.id.clone(),
                count: self.targets.len(),
                limit: MAX_TARGETS_PER_MODULE,
            });
        }
        let mut seen = BTreeSet::new();
        for target in &self.targets {
            if !seen.insert(&target.id) {
                return Err(ValidationError::DuplicateTarget {
                    module: self.id.clone(),
                    target: target.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// An ordered set of module instances plus the rules that apply to them.
///
/// # Examples
///
/// ```
/// use u_lookbook::model::{ModuleInstance, ModuleType, Rule, Style};
///
/// let crown = ModuleInstance::new("crown", ModuleType::Crown)
///     .with_targets(["lengthen", "curly", "volumeIn", "volumeOut"]);
/// let mut style = Style::new("short_bob").with_module(crown);
/// style
///     .add_rule(Rule::internal("crown", "volumeIn", "volumeOut"))
///     .unwrap();
/// assert!(style.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Style {
    pub id: StyleId,
    pub modules: Vec<ModuleInstance>,
    pub rules: RuleSet,
}

impl Style {
    pub fn new(id: impl Into<StyleId>) -> Self {
        Self {
            id: id.into(),
            modules: Vec::new(),
            rules: RuleSet::default(),
        }
    }

    pub fn with_module(mut self, module: ModuleInstance) -> Self {
        self.modules.push(module);
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn module(&self, id: &ModuleId) -> Option<&ModuleInstance> {
        self.modules.iter().find(|m| &m.id == id)
    }

    /// Position of a module in style order.
    pub fn module_index(&self, id: &ModuleId) -> Option<usize> {
        self.modules.iter().position(|m| &m.id == id)
    }

    pub fn contains_module(&self, id: &ModuleId) -> bool {
        self.module_index(id).is_some()
    }

    pub fn module_ids(&self) -> BTreeSet<ModuleId> {
        self.modules.iter().map(|m| m.id.clone()).collect()
    }

    /// Checks that a reference names an existing module and target.
    pub fn check_target(&self, target: &TargetRef) -> Result<()> {
        let module = self
            .module(&target.module)
            .ok_or_else(|| ValidationError::UnknownModule(target.module.clone()))?;
        if !module.has_target(&target.target) {
            return Err(ValidationError::UnknownTarget(target.clone()));
        }
        Ok(())
    }

    /// Every target of the style, in style order then module order.
    pub fn target_refs(&self) -> Vec<TargetRef> {
        self.modules.iter().flat_map(|m| m.target_refs()).collect()
    }

    pub fn target_count(&self) -> usize {
        self.modules.iter().map(|m| m.targets.len()).sum()
    }

    /// Validates the rule against this style and adds it if absent.
    ///
    /// Returns `Ok(true)` when the rule set changed.
    pub fn add_rule(&mut self, rule: Rule) -> Result<bool> {
        rule.validate_against(self)?;
        Ok(self.rules.insert(rule))
    }

    /// Removes a rule from this style only. Returns whether it was present.
    pub fn remove_rule(&mut self, rule: &Rule) -> bool {
        self.rules.remove(rule)
    }

    /// Checks the style's shape and every rule it carries.
    pub fn validate(&self) -> Result<()> {
        if self.modules.len() > MAX_MODULES_PER_STYLE {
            return Err(ValidationError::TooManyModules {
                style: self.id.clone(),
                count: self.modules.len(),
                limit: MAX_MODULES_PER_STYLE,
            });
        }

        let mut ids = BTreeSet::new();
        let mut types = BTreeSet::new();
        for module in &self.modules {
            if !ids.insert(&module.id) {
                return Err(ValidationError::DuplicateModule {
                    style: self.id.clone(),
                    module: module.id.clone(),
                });
            }
            if !types.insert(module.module_type) {
                return Err(ValidationError::DuplicateModuleType {
                    style: self.id.clone(),
                    module_type: module.module_type,
                });
            }
            module.validate()?;
        }

        for rule in self.rules.iter() {
            rule.validate_against(self)?;
        }
        Ok(())
    }
}
