//! Variant selection.
//!
//! Given a producer configuration and a consumer's requested attribute set,
//! the selector enumerates the producer's effective variants (declared plus
//! inherited), scores each against the request, and returns the unique best
//! match. Selection is pure and deterministic - two calls with identical
//! producer state and request return identical results, including identical
//! candidate ordering in errors. Ties are never broken arbitrarily.

pub mod errors;

use std::cmp::Reverse;

pub use errors::{RejectedCandidate, SelectionError, TiedCandidate};

use crate::core::artifact::ArtifactSet;
use crate::core::attributes::{AttributeSet, MatchResult};
use crate::core::configuration::{ConfigurationId, ConfigurationSet, EffectiveVariant};
use crate::core::rules::RuleRegistry;
use crate::util::Name;

/// The variant a selection resolved to, with its effective artifacts.
#[derive(Debug, Clone)]
pub struct SelectedVariant {
    /// Variant name.
    pub name: Name,
    /// The producer configuration the selection ran against.
    pub configuration: Name,
    /// The configuration that declared the variant.
    pub declared_on: Name,
    /// Whether the variant was inherited through an extends edge.
    pub inherited: bool,
    /// The variant's attributes, frozen.
    pub attributes: AttributeSet,
    /// Effective artifacts: producer base artifacts plus the variant's own.
    pub artifacts: ArtifactSet,
}

/// The matching engine. Holds the compatibility rule context; selection
/// itself is a pure function of (producer state, requested attributes) and
/// that context.
#[derive(Default)]
pub struct VariantSelector {
    rules: RuleRegistry,
}

impl VariantSelector {
    /// Create a selector with the given rule context.
    pub fn new(rules: RuleRegistry) -> Self {
        VariantSelector { rules }
    }

    /// The rule context in scope for this selector.
    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Select the unique best-matching variant of `producer` for the
    /// requested attributes.
    ///
    /// The first call against a producer freezes every attribute set in its
    /// extends subgraph; later calls are plain reads and may run
    /// concurrently. Disambiguation order among compatible candidates:
    /// exact matches first, then higher match score, then fewer
    /// unrequested attributes, then locally declared over inherited.
    /// Anything still tied is an error, never an arbitrary pick.
    pub fn select(
        &self,
        set: &ConfigurationSet,
        producer: ConfigurationId,
        requested: &AttributeSet,
    ) -> Result<SelectedVariant, SelectionError> {
        set.freeze(producer);
        let configuration = set.get(producer).name();

        let mut live: Vec<(EffectiveVariant, bool, u32)> = Vec::new();
        let mut rejected: Vec<RejectedCandidate> = Vec::new();

        for candidate in set.effective_variants(producer) {
            let result = candidate.attributes.matches(requested, &self.rules);
            tracing::debug!(
                configuration = configuration.as_str(),
                variant = candidate.name.as_str(),
                result = ?result,
                "matched candidate"
            );
            match result {
                MatchResult::Exact => live.push((candidate, true, u32::MAX)),
                MatchResult::Compatible { score, .. } => live.push((candidate, false, score)),
                MatchResult::Incompatible { mismatches } => rejected.push(RejectedCandidate {
                    name: candidate.name,
                    declared_on: candidate.declared_on,
                    attributes: candidate.attributes.to_pairs(),
                    mismatches,
                }),
            }
        }

        if live.is_empty() {
            return Err(SelectionError::NoMatchingVariant {
                configuration,
                requested: requested.to_pairs(),
                candidates: rejected,
            });
        }

        let best_key = live
            .iter()
            .map(|(candidate, exact, score)| rank(candidate, *exact, *score, requested))
            .max()
            .unwrap();

        let mut winners: Vec<EffectiveVariant> = live
            .into_iter()
            .filter(|(candidate, exact, score)| {
                rank(candidate, *exact, *score, requested) == best_key
            })
            .map(|(candidate, _, _)| candidate)
            .collect();

        if winners.len() > 1 {
            return Err(SelectionError::AmbiguousVariant {
                configuration,
                requested: requested.to_pairs(),
                candidates: winners
                    .iter()
                    .map(|candidate| TiedCandidate {
                        name: candidate.name,
                        declared_on: candidate.declared_on,
                        inherited: candidate.inherited,
                        attributes: candidate.attributes.to_pairs(),
                    })
                    .collect(),
            });
        }

        let winner = winners.remove(0);
        tracing::debug!(
            configuration = configuration.as_str(),
            variant = winner.name.as_str(),
            inherited = winner.inherited,
            "selected variant"
        );

        Ok(SelectedVariant {
            name: winner.name,
            configuration,
            declared_on: winner.declared_on,
            inherited: winner.inherited,
            attributes: winner.attributes,
            artifacts: winner.artifacts,
        })
    }
}

/// Disambiguation key; larger is better. Compared lexicographically:
/// exactness, match score, fewest extra attributes, locality.
fn rank(
    candidate: &EffectiveVariant,
    exact: bool,
    score: u32,
    requested: &AttributeSet,
) -> (bool, u32, Reverse<usize>, bool) {
    let extra = candidate
        .attributes
        .iter()
        .filter(|(name, _)| !requested.contains(*name))
        .count();
    (exact, score, Reverse(extra), !candidate.inherited)
}
