//! Slipway - variant-aware artifact resolution for build configurations.
//!
//! This crate models the outgoing variant graph of a build unit: the
//! artifacts a buildable component publishes, organized into mutually
//! exclusive variants distinguished by attributes, and the deterministic
//! selection of the single best-matching variant for a consumer's request.
//!
//! Configurations live in a [`ConfigurationSet`] arena, may extend one
//! another (the relation is kept acyclic at insertion time), and are frozen
//! by the first [`VariantSelector::select`] call that reaches them. After
//! the freeze, resolution is a pure read and may run concurrently.

pub mod core;
pub mod selector;
pub mod util;

pub use crate::core::{
    artifact::{ArtifactDescriptor, ArtifactIdentity, ArtifactSet, ArtifactSource, FileSource},
    attributes::{AttributeSet, AttributeValue, MatchResult, Mismatch},
    configuration::{Configuration, ConfigurationId, ConfigurationSet, EffectiveVariant},
    error::ConfigurationError,
    rules::{AtLeast, CompatibilityRule, EquivalentValues, RuleRegistry},
    variant::Variant,
};

pub use crate::selector::{SelectedVariant, SelectionError, VariantSelector};
pub use crate::util::{Diagnostic, Name};
