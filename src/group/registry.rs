//! Group Registry
//!
//! Name to group lookup shared by the application and the peer server.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ConfigError;
use crate::group::Group;

// == Group Registry ==
/// Registry of the groups served by this node.
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: Arc<RwLock<HashMap<String, Arc<Group>>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group under its name, rejecting a name that is already taken.
    pub(crate) fn insert(&self, group: Arc<Group>) -> Result<(), ConfigError> {
        let mut groups = self.groups.write();
        if groups.contains_key(group.name()) {
            return Err(ConfigError::DuplicateGroup(group.name().to_string()));
        }
        groups.insert(group.name().to_string(), group);
        Ok(())
    }

    /// Returns the named group.
    pub fn get(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// Returns every registered group, sorted by name.
    pub fn groups(&self) -> Vec<Arc<Group>> {
        let mut groups: Vec<_> = self.groups.read().values().cloned().collect();
        groups.sort_by(|a, b| a.name().cmp(b.name()));
        groups
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}
