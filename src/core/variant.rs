//! A variant: one mutually-exclusive usage of a configuration's output.

use std::fmt;

use crate::core::artifact::{ArtifactDescriptor, ArtifactSet};
use crate::core::attributes::{AttributeSet, AttributeValue};
use crate::core::error::ConfigurationError;
use crate::util::Name;

/// A named bundle of attributes and artifacts belonging to one
/// configuration.
///
/// Variants are created through their owning configuration and configured
/// during the build's configuration phase. The first resolution against the
/// owning configuration freezes the variant; mutation after that fails.
#[derive(Debug, Clone)]
pub struct Variant {
    name: Name,
    attributes: AttributeSet,
    artifacts: ArtifactSet,
}

impl Variant {
    pub(crate) fn new(name: Name) -> Self {
        Variant {
            name,
            attributes: AttributeSet::new(),
            artifacts: ArtifactSet::new(),
        }
    }

    /// The variant name, unique within its owning configuration.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Set one attribute on this variant.
    pub fn set_attribute(
        &mut self,
        name: impl Into<Name>,
        value: impl Into<AttributeValue>,
    ) -> Result<(), ConfigurationError> {
        self.attributes.set(name, value)
    }

    /// The attributes that define this variant.
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Add an artifact specific to this variant.
    pub fn add_artifact(&mut self, descriptor: ArtifactDescriptor) -> Result<(), ConfigurationError> {
        if self.attributes.is_frozen() {
            return Err(ConfigurationError::FrozenState {
                what: format!("variant `{}`", self.name),
            });
        }
        self.artifacts.add(descriptor)
    }

    /// The artifacts declared directly on this variant. The effective set
    /// additionally includes the owning configuration's base artifacts and
    /// is computed at resolution time.
    pub fn own_artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Freeze the variant's attribute set. Idempotent.
    pub(crate) fn freeze(&self) {
        self.attributes.freeze();
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.attributes)
    }
}
