//! Configurations, the extends relation, and effective-variant resolution.
//!
//! A configuration owns a base artifact set (included by every variant) and
//! a named collection of variants. Configurations may extend one another;
//! extending inherits artifacts and variants, with local declarations
//! shadowing inherited ones of the same name. The extends relation is kept
//! acyclic by checking at edge-insertion time, never at resolution time.
//!
//! All configurations of a build unit live in a [`ConfigurationSet`] arena
//! and refer to each other by [`ConfigurationId`]. Mutation goes through
//! `&mut` access to the arena; resolution only needs `&`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::artifact::{ArtifactDescriptor, ArtifactSet};
use crate::core::attributes::AttributeSet;
use crate::core::error::ConfigurationError;
use crate::core::variant::Variant;
use crate::util::Name;

/// Handle to a configuration inside its owning [`ConfigurationSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigurationId(usize);

impl ConfigurationId {
    fn node(self) -> NodeIndex {
        // Nodes are added in creation order and never removed, so the
        // arena index doubles as the graph index.
        NodeIndex::new(self.0)
    }
}

/// A named, resolvable grouping of artifacts and variants.
#[derive(Debug)]
pub struct Configuration {
    name: Name,
    artifacts: ArtifactSet,
    variants: IndexMap<Name, Variant>,
    extends: Vec<ConfigurationId>,
    frozen: AtomicBool,
}

impl Configuration {
    fn new(name: Name) -> Self {
        Configuration {
            name,
            artifacts: ArtifactSet::new(),
            variants: IndexMap::new(),
            extends: Vec::new(),
            frozen: AtomicBool::new(false),
        }
    }

    /// The configuration name.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Add a base artifact, included by every variant of this configuration
    /// and inherited by every configuration extending it.
    ///
    /// Deliberately allowed even after the configuration has been resolved:
    /// base artifacts are re-unioned at every resolution rather than
    /// snapshotted, so a late addition still reaches all variants.
    pub fn add_artifact(&mut self, descriptor: ArtifactDescriptor) -> Result<(), ConfigurationError> {
        self.artifacts.add(descriptor)
    }

    /// The base artifacts declared directly on this configuration.
    pub fn base_artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Create a new variant and return a handle for configuring it.
    pub fn create_variant(&mut self, name: impl Into<Name>) -> Result<&mut Variant, ConfigurationError> {
        let name = name.into();

        if self.is_frozen() {
            return Err(ConfigurationError::FrozenState {
                what: format!("configuration `{}`", self.name),
            });
        }
        if self.variants.contains_key(&name) {
            return Err(ConfigurationError::DuplicateVariant {
                configuration: self.name,
                variant: name,
            });
        }

        let entry = self.variants.entry(name).or_insert_with(|| Variant::new(name));
        Ok(entry)
    }

    /// Create a variant and apply a configuration closure to it once.
    pub fn variant_with(
        &mut self,
        name: impl Into<Name>,
        configure: impl FnOnce(&mut Variant) -> Result<(), ConfigurationError>,
    ) -> Result<(), ConfigurationError> {
        let variant = self.create_variant(name)?;
        configure(variant)
    }

    /// Look up a locally declared variant.
    pub fn variant(&self, name: impl Into<Name>) -> Option<&Variant> {
        self.variants.get(&name.into())
    }

    /// Mutable access to a locally declared variant.
    pub fn variant_mut(&mut self, name: impl Into<Name>) -> Option<&mut Variant> {
        self.variants.get_mut(&name.into())
    }

    /// Iterate locally declared variants in declaration order.
    pub fn variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants.values()
    }

    /// The configurations this one extends, in declaration order.
    pub fn extends(&self) -> &[ConfigurationId] {
        &self.extends
    }

    /// Whether a resolution has frozen this configuration.
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
        for variant in self.variants.values() {
            variant.freeze();
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One entry of a configuration's effective variant set: a declared or
/// inherited variant together with its effective artifacts, as seen from
/// the configuration being resolved.
#[derive(Debug, Clone)]
pub struct EffectiveVariant {
    /// Variant name. Unique within the effective set.
    pub name: Name,
    /// Name of the configuration that declared the variant.
    pub declared_on: Name,
    /// False when the variant is declared locally on the resolved
    /// configuration, true when it came in through an extends edge.
    pub inherited: bool,
    /// Snapshot of the variant's attributes.
    pub attributes: AttributeSet,
    /// Effective artifacts: the resolved configuration's effective base
    /// artifacts unioned with the variant's own.
    pub artifacts: ArtifactSet,
}

/// Arena owning every configuration of a build unit, together with the
/// extends graph over them.
#[derive(Debug, Default)]
pub struct ConfigurationSet {
    configs: Vec<Configuration>,
    names: HashMap<Name, ConfigurationId>,
    graph: DiGraph<ConfigurationId, ()>,
}

impl ConfigurationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        ConfigurationSet::default()
    }

    /// Create a new configuration. Names are unique within the set.
    pub fn create(&mut self, name: impl Into<Name>) -> Result<ConfigurationId, ConfigurationError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(ConfigurationError::DuplicateConfiguration {
                configuration: name,
            });
        }

        let id = ConfigurationId(self.configs.len());
        self.configs.push(Configuration::new(name));
        self.names.insert(name, id);
        let node = self.graph.add_node(id);
        debug_assert_eq!(node, id.node());
        Ok(id)
    }

    /// Shared access to a configuration.
    pub fn get(&self, id: ConfigurationId) -> &Configuration {
        &self.configs[id.0]
    }

    /// Mutable access to a configuration.
    pub fn get_mut(&mut self, id: ConfigurationId) -> &mut Configuration {
        &mut self.configs[id.0]
    }

    /// Look up a configuration by name.
    pub fn id_of(&self, name: impl Into<Name>) -> Option<ConfigurationId> {
        self.names.get(&name.into()).copied()
    }

    /// Number of configurations.
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Declare that `child` extends `parent`, inheriting its artifacts and
    /// variants.
    ///
    /// The edge is rejected immediately when it would close a cycle; the
    /// error names the cycle and nothing is inserted, so no cycle is ever
    /// observable by resolution.
    pub fn extend_from(
        &mut self,
        child: ConfigurationId,
        parent: ConfigurationId,
    ) -> Result<(), ConfigurationError> {
        let child_cfg = self.get(child);
        if child_cfg.is_frozen() {
            return Err(ConfigurationError::FrozenState {
                what: format!("configuration `{}`", child_cfg.name()),
            });
        }

        if child == parent || has_path_connecting(&self.graph, parent.node(), child.node(), None) {
            return Err(ConfigurationError::CyclicExtension {
                cycle: self.cycle_path(child, parent),
            });
        }

        self.configs[child.0].extends.push(parent);
        self.graph.add_edge(child.node(), parent.node(), ());
        Ok(())
    }

    /// Name the cycle that adding child -> parent would close:
    /// child, parent, ..., child following declared extends order.
    fn cycle_path(&self, child: ConfigurationId, parent: ConfigurationId) -> Vec<Name> {
        let mut cycle = vec![self.get(child).name()];
        let mut path = Vec::new();
        self.find_path(parent, child, &mut HashSet::new(), &mut path);
        // find_path ends on `child` itself, which closes the cycle; this
        // also covers the self-extension case.
        cycle.extend(path.iter().map(|&id| self.get(id).name()));
        cycle
    }

    fn find_path(
        &self,
        from: ConfigurationId,
        to: ConfigurationId,
        visited: &mut HashSet<ConfigurationId>,
        path: &mut Vec<ConfigurationId>,
    ) -> bool {
        if !visited.insert(from) {
            return false;
        }
        path.push(from);
        if from == to {
            return true;
        }
        for &next in self.get(from).extends() {
            if self.find_path(next, to, visited, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// The effective base artifacts of a configuration: its own base
    /// artifacts plus, depth-first in declared extends order, those of every
    /// configuration it extends. Recomputed on every call so late additions
    /// always show up.
    pub fn effective_base_artifacts(&self, id: ConfigurationId) -> ArtifactSet {
        let mut visited = HashSet::new();
        let mut result = ArtifactSet::new();
        self.collect_base_artifacts(id, &mut visited, &mut result);
        result
    }

    fn collect_base_artifacts(
        &self,
        id: ConfigurationId,
        visited: &mut HashSet<ConfigurationId>,
        out: &mut ArtifactSet,
    ) {
        if !visited.insert(id) {
            return;
        }
        *out = out.union(self.get(id).base_artifacts());
        for &parent in self.get(id).extends() {
            self.collect_base_artifacts(parent, visited, out);
        }
    }

    /// The effective variant set of a configuration: its own variants plus
    /// those inherited through extends edges.
    ///
    /// Enumeration is a pre-order depth-first walk, locals in declaration
    /// order first, then each extended configuration in declared order. The
    /// first occurrence of a name wins, so a local variant shadows any
    /// inherited one and the leftmost extends edge wins on collision. Each
    /// entry's artifacts are the resolved configuration's effective base
    /// artifacts unioned with the variant's own.
    pub fn effective_variants(&self, id: ConfigurationId) -> Vec<EffectiveVariant> {
        let base = self.effective_base_artifacts(id);

        let mut collected: IndexMap<Name, (Name, bool)> = IndexMap::new();
        let mut variants: Vec<(Name, &Variant)> = Vec::new();
        let mut visited = HashSet::new();
        self.collect_variants(id, id, &mut visited, &mut collected, &mut variants);

        variants
            .into_iter()
            .map(|(name, variant)| {
                let (declared_on, inherited) = collected[&name];
                tracing::trace!(
                    variant = name.as_str(),
                    declared_on = declared_on.as_str(),
                    inherited,
                    "effective variant"
                );
                EffectiveVariant {
                    name,
                    declared_on,
                    inherited,
                    attributes: variant.attributes().clone(),
                    artifacts: base.union(variant.own_artifacts()),
                }
            })
            .collect()
    }

    fn collect_variants<'a>(
        &'a self,
        root: ConfigurationId,
        id: ConfigurationId,
        visited: &mut HashSet<ConfigurationId>,
        collected: &mut IndexMap<Name, (Name, bool)>,
        variants: &mut Vec<(Name, &'a Variant)>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let cfg = self.get(id);
        for variant in cfg.variants() {
            if !collected.contains_key(&variant.name()) {
                collected.insert(variant.name(), (cfg.name(), id != root));
                variants.push((variant.name(), variant));
            }
        }
        for &parent in cfg.extends() {
            self.collect_variants(root, parent, visited, collected, variants);
        }
    }

    /// Freeze every attribute set reachable from `id` through extends
    /// edges. Idempotent; callable through a shared reference, which is what
    /// lets concurrent resolutions share a frozen subgraph without locking.
    pub fn freeze(&self, id: ConfigurationId) {
        let mut visited = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let cfg = self.get(current);
            cfg.freeze();
            stack.extend(cfg.extends().iter().copied());
        }
    }
}
