//! Artifact descriptors and ordered artifact sets.
//!
//! A descriptor names an artifact and carries an opaque materialization
//! capability; this core never invokes it. Producing the underlying file is
//! the concern of the surrounding task-execution machinery, and only happens
//! after a variant has been selected.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigurationError;
use crate::util::Name;

/// The identity of an artifact within a set: name plus an optional
/// classifier-like qualifier. The type tag is deliberately not part of the
/// identity; two artifacts may not share a (name, qualifier) pair even if
/// their types differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactIdentity {
    pub name: Name,
    pub qualifier: Option<Name>,
}

impl ArtifactIdentity {
    /// Create an identity without a qualifier.
    pub fn new(name: impl Into<Name>) -> Self {
        ArtifactIdentity {
            name: name.into(),
            qualifier: None,
        }
    }

    /// Create an identity with a qualifier (e.g. "sources", "headers").
    pub fn with_qualifier(name: impl Into<Name>, qualifier: impl Into<Name>) -> Self {
        ArtifactIdentity {
            name: name.into(),
            qualifier: Some(qualifier.into()),
        }
    }
}

impl fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier {
            Some(q) => write!(f, "{}:{}", self.name, q),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Capability to materialize an artifact into a file.
///
/// The resolution core treats this as opaque: it is stored, selected, and
/// handed back to the caller, never invoked here.
pub trait ArtifactSource: Send + Sync {
    /// Produce the file backing this artifact.
    fn produce(&self) -> PathBuf;
}

/// The trivial source: an already-known file path.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

impl ArtifactSource for FileSource {
    fn produce(&self) -> PathBuf {
        self.path.clone()
    }
}

/// A descriptor for one publishable artifact. Immutable once added to a set.
#[derive(Clone)]
pub struct ArtifactDescriptor {
    identity: ArtifactIdentity,
    artifact_type: Name,
    source: Arc<dyn ArtifactSource>,
}

impl ArtifactDescriptor {
    /// Create a descriptor from its identity, type tag, and source.
    pub fn new(
        identity: ArtifactIdentity,
        artifact_type: impl Into<Name>,
        source: Arc<dyn ArtifactSource>,
    ) -> Self {
        ArtifactDescriptor {
            identity,
            artifact_type: artifact_type.into(),
            source,
        }
    }

    /// Shorthand for a plain file artifact, typed by its extension.
    pub fn file(name: impl Into<Name>, artifact_type: impl Into<Name>, path: impl Into<PathBuf>) -> Self {
        ArtifactDescriptor::new(
            ArtifactIdentity::new(name),
            artifact_type,
            Arc::new(FileSource::new(path)),
        )
    }

    /// The identity used for set membership.
    pub fn identity(&self) -> ArtifactIdentity {
        self.identity
    }

    /// The type tag used for compatibility checks by consumers.
    pub fn artifact_type(&self) -> Name {
        self.artifact_type
    }

    /// The materialization capability. Never called by this crate.
    pub fn source(&self) -> &Arc<dyn ArtifactSource> {
        &self.source
    }
}

impl fmt::Debug for ArtifactDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactDescriptor")
            .field("identity", &self.identity)
            .field("type", &self.artifact_type.as_str())
            .finish()
    }
}

impl fmt::Display for ArtifactDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identity, self.artifact_type)
    }
}

/// An ordered, append-only collection of artifact descriptors with set
/// semantics on identity. Iteration order is declaration order, which keeps
/// effective-artifact listings deterministic.
#[derive(Clone, Default)]
pub struct ArtifactSet {
    entries: Vec<ArtifactDescriptor>,
}

impl ArtifactSet {
    /// Create an empty set.
    pub fn new() -> Self {
        ArtifactSet::default()
    }

    /// Append a descriptor. Fails if an artifact with the same identity is
    /// already present.
    pub fn add(&mut self, descriptor: ArtifactDescriptor) -> Result<(), ConfigurationError> {
        if self.contains(&descriptor.identity()) {
            return Err(ConfigurationError::DuplicateArtifact {
                identity: descriptor.identity(),
            });
        }
        self.entries.push(descriptor);
        Ok(())
    }

    /// Union with another set, producing a new set. Entries of `self` come
    /// first; entries of `other` whose identity is already present are
    /// skipped. Used to compute effective artifacts (base before local).
    pub fn union(&self, other: &ArtifactSet) -> ArtifactSet {
        let mut result = self.clone();
        for descriptor in other.iter() {
            if !result.contains(&descriptor.identity()) {
                result.entries.push(descriptor.clone());
            }
        }
        result
    }

    /// Check membership by identity.
    pub fn contains(&self, identity: &ArtifactIdentity) -> bool {
        self.entries.iter().any(|d| d.identity() == *identity)
    }

    /// Iterate descriptors in declaration order. Restartable.
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactDescriptor> {
        self.entries.iter()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ArtifactSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}
