//! Property cascading logic.
//!
//! Matched declarations are collapsed into one value per longhand property
//! before anything is written: shorthands expand first, then later
//! declarations override earlier ones for the same longhand. The collapsed
//! values are written at the Css tier in one batch.

use std::collections::{BTreeMap, BTreeSet};

use horizon_bridge_core::property::PropertyRegistry;
use horizon_bridge_core::{NodeId, PropertyError, PropertyId, PropertyValue, ValueSource, ViewTree};

use super::scope::UnknownPropertyPolicy;
use crate::ast::Declaration;
use crate::logging::targets;
use crate::rules::RuleSet;
use crate::{Error, Result};

/// CSS-wide keywords that reset a property to its non-stylesheet value.
const RESET_KEYWORDS: [&str; 2] = ["initial", "unset"];

/// Declared values collected from matched rules, keyed by longhand.
///
/// `None` clears the Css tier for that property.
#[derive(Debug)]
pub struct Cascade<'r> {
    registry: &'r PropertyRegistry,
    policy: UnknownPropertyPolicy,
    values: BTreeMap<PropertyId, Option<PropertyValue>>,
}

impl<'r> Cascade<'r> {
    /// Create an empty cascade resolving names through `registry`.
    pub fn new(registry: &'r PropertyRegistry, policy: UnknownPropertyPolicy) -> Self {
        Self {
            registry,
            policy,
            values: BTreeMap::new(),
        }
    }

    /// Cascade every declaration of `rule`, in order.
    pub fn declare_rule(&mut self, rule: &RuleSet) -> Result<()> {
        for declaration in rule.declarations() {
            self.declare(declaration)?;
        }
        Ok(())
    }

    /// Cascade one declaration over what was declared before.
    ///
    /// Conversion failures propagate; values collected earlier are kept.
    pub fn declare(&mut self, declaration: &Declaration) -> Result<()> {
        let value = declaration.value.trim();
        if RESET_KEYWORDS.iter().any(|k| value.eq_ignore_ascii_case(k)) {
            return match self.registry.css_targets(&declaration.property) {
                Some(targets) => {
                    for id in targets {
                        self.values.insert(id, None);
                    }
                    Ok(())
                }
                None => self.unknown(&declaration.property),
            };
        }

        match self.registry.resolve_declaration(&declaration.property, value) {
            Ok(assignments) => {
                for assignment in assignments {
                    self.values.insert(assignment.property, Some(assignment.value));
                }
                Ok(())
            }
            Err(PropertyError::UnknownProperty { name }) => self.unknown(&name),
            Err(err) => Err(err.into()),
        }
    }

    fn unknown(&self, name: &str) -> Result<()> {
        match self.policy {
            UnknownPropertyPolicy::Ignore => {
                tracing::debug!(target: targets::CASCADE, property = name, "ignoring unknown property");
                Ok(())
            }
            UnknownPropertyPolicy::Error => Err(Error::unknown_property(name)),
        }
    }

    /// Longhands with a declared value or reset.
    pub fn properties(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.values.keys().copied()
    }

    /// The value declared for `property`: `Some(None)` for a reset.
    pub fn declared(&self, property: PropertyId) -> Option<Option<&PropertyValue>> {
        self.values.get(&property).map(Option::as_ref)
    }

    /// Number of longhands touched.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Write the collapsed values at the Css tier and clear `stale` ones.
    ///
    /// Native pushes for `node` are batched across the whole write.
    pub fn write(self, tree: &mut ViewTree, node: NodeId, stale: &BTreeSet<PropertyId>) -> Result<()> {
        let mut batch = tree.batch(node)?;
        for &property in stale {
            batch.clear_value(node, property, ValueSource::Css)?;
        }
        for (property, value) in self.values {
            match value {
                Some(value) => batch.set_value(node, property, ValueSource::Css, value)?,
                None => batch.clear_value(node, property, ValueSource::Css)?,
            }
        }
        Ok(())
    }
}
