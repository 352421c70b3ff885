//! Core data model for Slipway.
//!
//! This module contains the foundational types of the outgoing variant
//! graph:
//! - Artifact descriptors and ordered artifact sets
//! - Typed attribute sets with freeze-on-resolution semantics
//! - Variants and configurations, including the extends relation
//! - The pluggable per-attribute compatibility rule registry

pub mod artifact;
pub mod attributes;
pub mod configuration;
pub mod error;
pub mod rules;
pub mod variant;

pub use artifact::{ArtifactDescriptor, ArtifactIdentity, ArtifactSet, ArtifactSource, FileSource};
pub use attributes::{AttributeSet, AttributeValue, MatchResult, Mismatch};
pub use configuration::{Configuration, ConfigurationId, ConfigurationSet, EffectiveVariant};
pub use error::ConfigurationError;
pub use rules::{AtLeast, CompatibilityRule, EquivalentValues, RuleRegistry};
pub use variant::Variant;
