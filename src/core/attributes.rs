//! Attribute sets and the compatibility matching rule.
//!
//! Attributes are the dimensions that distinguish variants (usage,
//! build-type, linkage...). A consumer requests an attribute set; a
//! producer's variants each carry one. Matching compares the two under the
//! compatibility rules in scope and yields a structured result the selector
//! can score and report on.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::error::ConfigurationError;
use crate::core::rules::RuleRegistry;
use crate::util::Name;

/// Credit granted per requested attribute the producer matches exactly.
const FULL_CREDIT: u32 = 2;
/// Credit granted when a registered rule accepts a non-equal value.
const PARTIAL_CREDIT: u32 = 1;

/// A typed attribute value.
///
/// Values are comparable and hashable. Richer compatibility than plain
/// equality is expressed through [`crate::core::rules::CompatibilityRule`],
/// not by adding structure here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Str(Name),
    Bool(bool),
    Int(i64),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Str(s) => write!(f, "{}", s),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Str(Name::new(s))
    }
}

impl From<Name> for AttributeValue {
    fn from(n: Name) -> Self {
        AttributeValue::Str(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

/// One attribute the producer carries with a value the consumer's request
/// rejects. Carried in errors so diagnostics need not re-match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub attribute: Name,
    pub requested: AttributeValue,
    pub found: AttributeValue,
}

/// Outcome of matching a producer attribute set against a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Every requested attribute is present with an equal value.
    Exact,
    /// No requested attribute is rejected, but at least one is missing on
    /// the producer or matched only through a compatibility rule.
    Compatible {
        /// Sum of per-attribute credit; higher is closer to the request.
        score: u32,
        /// Requested attributes the producer does not declare at all.
        missing: Vec<Name>,
    },
    /// At least one requested attribute carries an incompatible value.
    Incompatible { mismatches: Vec<Mismatch> },
}

impl MatchResult {
    /// Whether this result keeps the candidate in consideration.
    pub fn is_compatible(&self) -> bool {
        !matches!(self, MatchResult::Incompatible { .. })
    }
}

/// A mapping from attribute name to value, at most one value per name.
///
/// Mutable during the configuration phase; frozen at the first resolution
/// that reaches it. The freeze flag uses interior mutability so resolution,
/// which holds only shared references, can set it — after which concurrent
/// reads need no synchronization.
#[derive(Debug, Default)]
pub struct AttributeSet {
    entries: IndexMap<Name, AttributeValue>,
    frozen: AtomicBool,
}

impl Clone for AttributeSet {
    fn clone(&self) -> Self {
        AttributeSet {
            entries: self.entries.clone(),
            frozen: AtomicBool::new(self.is_frozen()),
        }
    }
}

impl AttributeSet {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        AttributeSet::default()
    }

    /// Build a set from (name, value) pairs. Convenient for requests.
    pub fn of<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<Name>,
        V: Into<AttributeValue>,
    {
        let mut set = AttributeSet::new();
        for (name, value) in pairs {
            set.entries.insert(name.into(), value.into());
        }
        set
    }

    /// Set an attribute value.
    ///
    /// Before the freeze this inserts or overwrites. After the freeze,
    /// re-setting the identical value is accepted (idempotent) and anything
    /// else fails with `ConflictingAttribute`.
    pub fn set(
        &mut self,
        name: impl Into<Name>,
        value: impl Into<AttributeValue>,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        let value = value.into();

        if self.is_frozen() {
            match self.entries.get(&name) {
                Some(existing) if *existing == value => return Ok(()),
                Some(existing) => {
                    return Err(ConfigurationError::ConflictingAttribute {
                        attribute: name,
                        existing: *existing,
                        requested: value,
                    })
                }
                None => {
                    return Err(ConfigurationError::FrozenState {
                        what: format!("attribute `{}`", name),
                    })
                }
            }
        }

        self.entries.insert(name, value);
        Ok(())
    }

    /// Get the value for an attribute, if set.
    pub fn get(&self, name: impl Into<Name>) -> Option<&AttributeValue> {
        self.entries.get(&name.into())
    }

    /// Check if an attribute is set.
    pub fn contains(&self, name: impl Into<Name>) -> bool {
        self.entries.contains_key(&name.into())
    }

    /// Iterate (name, value) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Name, &AttributeValue)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze this set. Idempotent; callable through a shared reference.
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }

    /// Whether the set has been frozen by a resolution.
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Match this (producer) attribute set against a consumer request.
    ///
    /// Per requested attribute: an equal value earns full credit; a missing
    /// attribute is "don't care" (no credit, but no rejection); a value a
    /// registered rule accepts earns partial credit; anything else rejects
    /// the candidate outright. Producer attributes the consumer never asked
    /// about are ignored here — the selector uses them only to break ties.
    pub fn matches(&self, requested: &AttributeSet, rules: &RuleRegistry) -> MatchResult {
        let mut score = 0u32;
        let mut exact = true;
        let mut missing = Vec::new();
        let mut mismatches = Vec::new();

        for (name, wanted) in requested.iter() {
            match self.entries.get(&name) {
                None => {
                    missing.push(name);
                    exact = false;
                }
                Some(found) if found == wanted => {
                    score += FULL_CREDIT;
                }
                Some(found) => {
                    let rule_ok = rules
                        .rule_for(name)
                        .is_some_and(|rule| rule.compatible(wanted, found));
                    if rule_ok {
                        score += PARTIAL_CREDIT;
                        exact = false;
                    } else {
                        mismatches.push(Mismatch {
                            attribute: name,
                            requested: *wanted,
                            found: *found,
                        });
                    }
                }
            }
        }

        if !mismatches.is_empty() {
            MatchResult::Incompatible { mismatches }
        } else if exact {
            MatchResult::Exact
        } else {
            MatchResult::Compatible { score, missing }
        }
    }

    /// Snapshot the entries as a plain vector, for error payloads.
    pub fn to_pairs(&self) -> Vec<(Name, AttributeValue)> {
        self.entries.iter().map(|(n, v)| (*n, *v)).collect()
    }
}

impl PartialEq for AttributeSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for AttributeSet {}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_before_freeze() {
        let mut attrs = AttributeSet::new();
        attrs.set("usage", "api").unwrap();
        attrs.set("usage", "runtime").unwrap();

        assert_eq!(attrs.get("usage"), Some(&AttributeValue::from("runtime")));
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_frozen_set_rejects_differing_value() {
        let mut attrs = AttributeSet::new();
        attrs.set("usage", "api").unwrap();
        attrs.freeze();

        // Same value is idempotent
        attrs.set("usage", "api").unwrap();

        let err = attrs.set("usage", "runtime").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::ConflictingAttribute { attribute, .. }
                if attribute.as_str() == "usage"
        ));

        // A brand-new attribute cannot appear after the freeze either
        let err = attrs.set("build-type", "debug").unwrap_err();
        assert!(matches!(err, ConfigurationError::FrozenState { .. }));
    }

    #[test]
    fn test_exact_match() {
        let producer = AttributeSet::of([("usage", "api"), ("build-type", "release")]);
        let requested = AttributeSet::of([("usage", "api")]);

        let rules = RuleRegistry::new();
        assert_eq!(producer.matches(&requested, &rules), MatchResult::Exact);
    }

    #[test]
    fn test_missing_attribute_is_compatible_with_penalty() {
        let producer = AttributeSet::of([("usage", "api")]);
        let requested = AttributeSet::of([("usage", "api"), ("build-type", "debug")]);

        let rules = RuleRegistry::new();
        match producer.matches(&requested, &rules) {
            MatchResult::Compatible { score, missing } => {
                assert_eq!(score, FULL_CREDIT);
                assert_eq!(missing, vec![Name::new("build-type")]);
            }
            other => panic!("expected Compatible, got {:?}", other),
        }
    }

    #[test]
    fn test_unequal_value_without_rule_is_incompatible() {
        let producer = AttributeSet::of([("usage", "runtime")]);
        let requested = AttributeSet::of([("usage", "api")]);

        let rules = RuleRegistry::new();
        match producer.matches(&requested, &rules) {
            MatchResult::Incompatible { mismatches } => {
                assert_eq!(mismatches.len(), 1);
                assert_eq!(mismatches[0].attribute.as_str(), "usage");
                assert_eq!(mismatches[0].found, AttributeValue::from("runtime"));
            }
            other => panic!("expected Incompatible, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_producer_attributes_do_not_eliminate() {
        let producer = AttributeSet::of([("usage", "api"), ("linkage", "shared")]);
        let requested = AttributeSet::of([("usage", "api")]);

        let rules = RuleRegistry::new();
        assert!(producer.matches(&requested, &rules).is_compatible());
    }

    #[test]
    fn test_empty_request_matches_exactly() {
        let producer = AttributeSet::of([("usage", "api")]);
        let requested = AttributeSet::new();

        let rules = RuleRegistry::new();
        assert_eq!(producer.matches(&requested, &rules), MatchResult::Exact);
    }

    #[test]
    fn test_monotonicity_adding_request_never_widens() {
        let producer = AttributeSet::of([("usage", "runtime")]);
        let rules = RuleRegistry::new();

        let narrow = AttributeSet::of([("usage", "api")]);
        assert!(!producer.matches(&narrow, &rules).is_compatible());

        let mut wider = narrow.clone();
        wider.set("build-type", "debug").unwrap();
        assert!(!producer.matches(&wider, &rules).is_compatible());
    }

    #[test]
    fn test_value_serialization() {
        let value = AttributeValue::from("api");
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"api\"");

        let value = AttributeValue::from(7i64);
        assert_eq!(serde_json::to_string(&value).unwrap(), "7");
    }
}
