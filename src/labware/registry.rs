use std::collections::HashMap;
use std::io::BufRead;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info, warn};

use super::{builtin, elwx, LabwareDefinition, LabwareError};

/// Outcome of [`LabwareRegistry::register`]
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// No definition existed under this name
    Added,
    /// An existing definition was replaced (last write wins)
    Replaced {
        /// The definition that was overridden
        previous: Arc<LabwareDefinition>,
    },
}

impl Registration {
    /// Whether an existing entry was overridden
    pub fn is_replacement(&self) -> bool {
        matches!(self, Registration::Replaced { .. })
    }
}

/// Table of known labware types, keyed by type name.
///
/// The registry is the only shared mutable state in the crate. Lookups take a
/// shared lock and never block each other; [`register`](Self::register)
/// takes an exclusive lock. Definitions are stored behind `Arc` and swapped
/// whole, so a reader sees either the old or the new definition.
#[derive(Debug)]
pub struct LabwareRegistry {
    entries: RwLock<HashMap<String, Arc<LabwareDefinition>>>,
}

impl LabwareRegistry {
    /// A registry with no definitions
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A registry seeded with the built-in labware table
    pub fn with_builtin() -> Self {
        let registry = Self::empty();
        for definition in builtin::builtin_definitions() {
            registry.insert(definition);
        }
        debug!("Seeded labware registry with {} built-in types", registry.len());
        registry
    }

    /// Resolve a labware type by name
    pub fn lookup(&self, name: &str) -> Result<Arc<LabwareDefinition>, LabwareError> {
        self.get(name)
            .ok_or_else(|| LabwareError::UnknownLabware(name.to_string()))
    }

    /// Resolve a labware type by name, if registered
    pub fn get(&self, name: &str) -> Option<Arc<LabwareDefinition>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(name).cloned()
    }

    /// Whether a type is registered
    pub fn contains(&self, name: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(name)
    }

    /// Add or replace a definition.
    ///
    /// Replacing an existing name is not an error: the new definition wins and
    /// a warning is logged. Registering an identical definition again leaves
    /// the registry in the same state.
    pub fn register(&self, definition: LabwareDefinition) -> Registration {
        let name = definition.name().to_string();
        match self.insert(definition) {
            None => {
                debug!("Registered labware type {}", name);
                Registration::Added
            }
            Some(previous) => {
                warn!("Labware type {} was already registered; replacing it", name);
                Registration::Replaced { previous }
            }
        }
    }

    /// Parse an `EchoLabware` XML document and register every plate in it
    pub fn load_elwx<R: BufRead>(
        &self,
        reader: R,
    ) -> Result<Vec<(String, Registration)>, LabwareError> {
        let definitions = elwx::read_labware_xml(reader)?;
        let registrations: Vec<_> = definitions
            .into_iter()
            .map(|definition| {
                let name = definition.name().to_string();
                (name, self.register(definition))
            })
            .collect();
        info!("Loaded {} labware definitions", registrations.len());
        Ok(registrations)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// All definitions, sorted by name
    pub fn snapshot(&self) -> Vec<Arc<LabwareDefinition>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut definitions: Vec<_> = entries.values().cloned().collect();
        definitions.sort_by(|a, b| a.name().cmp(b.name()));
        definitions
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the registry holds no definitions
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, definition: LabwareDefinition) -> Option<Arc<LabwareDefinition>> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(definition.name().to_string(), Arc::new(definition))
    }
}

impl Default for LabwareRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
