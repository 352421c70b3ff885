//! Per-attribute compatibility rules.
//!
//! A rule widens matching for one attribute beyond plain equality. The
//! registry is an explicitly passed context object so that selection stays a
//! pure function of its arguments; nothing here is process-global.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::attributes::AttributeValue;
use crate::util::Name;

/// Decides whether a candidate value satisfies a requested value for one
/// attribute. Consulted only when the two values are not equal; equality
/// always matches with full credit before any rule runs.
pub trait CompatibilityRule: Send + Sync {
    fn compatible(&self, requested: &AttributeValue, candidate: &AttributeValue) -> bool;
}

/// Registry of compatibility rules, keyed by attribute name.
#[derive(Default)]
pub struct RuleRegistry {
    rules: HashMap<Name, Arc<dyn CompatibilityRule>>,
}

impl RuleRegistry {
    /// Create an empty registry (equality-only matching).
    pub fn new() -> Self {
        RuleRegistry::default()
    }

    /// Register a rule for an attribute, replacing any previous rule.
    pub fn register(&mut self, attribute: impl Into<Name>, rule: Arc<dyn CompatibilityRule>) {
        self.rules.insert(attribute.into(), rule);
    }

    /// Look up the rule for an attribute.
    pub fn rule_for(&self, attribute: Name) -> Option<&dyn CompatibilityRule> {
        self.rules.get(&attribute).map(|r| r.as_ref())
    }
}

/// Declares groups of values that are interchangeable for matching.
///
/// A candidate is compatible with a request when both values appear in the
/// same group.
pub struct EquivalentValues {
    groups: Vec<Vec<AttributeValue>>,
}

impl EquivalentValues {
    pub fn new(groups: Vec<Vec<AttributeValue>>) -> Self {
        EquivalentValues { groups }
    }
}

impl CompatibilityRule for EquivalentValues {
    fn compatible(&self, requested: &AttributeValue, candidate: &AttributeValue) -> bool {
        self.groups
            .iter()
            .any(|group| group.contains(requested) && group.contains(candidate))
    }
}

/// Integer attributes where any candidate at or above the requested value is
/// acceptable (e.g. a minimum language level).
pub struct AtLeast;

impl CompatibilityRule for AtLeast {
    fn compatible(&self, requested: &AttributeValue, candidate: &AttributeValue) -> bool {
        match (requested, candidate) {
            (AttributeValue::Int(wanted), AttributeValue::Int(found)) => found >= wanted,
            _ => false,
        }
    }
}
