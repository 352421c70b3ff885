//! Configuration-time error types and diagnostics.

use thiserror::Error;

use crate::core::artifact::ArtifactIdentity;
use crate::core::attributes::AttributeValue;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::Name;

/// Error raised while building the configuration/variant model.
///
/// All of these are reported synchronously to the caller of the mutating
/// operation; none are retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("duplicate artifact `{identity}`")]
    DuplicateArtifact { identity: ArtifactIdentity },

    #[error("conflicting value for frozen attribute `{attribute}`")]
    ConflictingAttribute {
        attribute: Name,
        existing: AttributeValue,
        requested: AttributeValue,
    },

    #[error("{what} is frozen after first resolution")]
    FrozenState { what: String },

    #[error("extending would create a cycle")]
    CyclicExtension { cycle: Vec<Name> },

    #[error("variant `{variant}` already exists on configuration `{configuration}`")]
    DuplicateVariant {
        configuration: Name,
        variant: Name,
    },

    #[error("configuration `{configuration}` already exists")]
    DuplicateConfiguration { configuration: Name },
}

impl ConfigurationError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ConfigurationError::DuplicateArtifact { identity } => {
                Diagnostic::error(format!("artifact `{}` is already declared", identity))
                    .with_suggestion("Give the second artifact a distinct name or qualifier")
            }

            ConfigurationError::ConflictingAttribute {
                attribute,
                existing,
                requested,
            } => Diagnostic::error(format!(
                "attribute `{}` is frozen with value `{}`",
                attribute, existing
            ))
            .with_context(format!("attempted to set it to `{}`", requested))
            .with_suggestion(suggestions::ALREADY_RESOLVED),

            ConfigurationError::FrozenState { what } => {
                Diagnostic::error(format!("{} can no longer be mutated", what))
                    .with_context("the owning configuration has already been resolved")
                    .with_suggestion(suggestions::ALREADY_RESOLVED)
            }

            ConfigurationError::CyclicExtension { cycle } => {
                let path: Vec<&str> = cycle.iter().map(|n| n.as_str()).collect();
                Diagnostic::error("cycle detected in the extends relation")
                    .with_context(format!("cycle: {}", path.join(" -> ")))
                    .with_suggestion(suggestions::BREAK_CYCLE)
            }

            ConfigurationError::DuplicateVariant {
                configuration,
                variant,
            } => Diagnostic::error(format!(
                "variant `{}` is already declared on `{}`",
                variant, configuration
            ))
            .with_suggestion("Configure the existing variant instead of re-creating it"),

            ConfigurationError::DuplicateConfiguration { configuration } => {
                Diagnostic::error(format!(
                    "a configuration named `{}` already exists",
                    configuration
                ))
                .with_suggestion("Pick a unique configuration name")
            }
        }
    }
}
