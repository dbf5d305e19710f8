use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::model::Simulation;

/// Address of a collapsible row. Tasks are leaves and have no key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
    Host(String),
    Vm(String),
}

impl NodeKey {
    pub fn id(&self) -> &str {
        match self {
            NodeKey::Host(id) | NodeKey::Vm(id) => id,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Host(id) => write!(f, "host-{id}"),
            NodeKey::Vm(id) => write!(f, "vm-{id}"),
        }
    }
}

/// Set of collapsed rows. A collapsed row still renders; only its children are hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseStore {
    collapsed: BTreeSet<NodeKey>,
}

impl CollapseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, key: &NodeKey) -> bool {
        self.collapsed.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn toggle(&mut self, key: NodeKey) {
        if !self.collapsed.remove(&key) {
            debug!(%key, "collapse");
            self.collapsed.insert(key);
        } else {
            debug!(%key, "expand");
        }
    }

    /// Collapse everything when nothing is collapsed, otherwise expand everything
    pub fn toggle_all(&mut self, all_known_keys: impl IntoIterator<Item = NodeKey>) {
        if self.collapsed.is_empty() {
            self.collapsed = all_known_keys.into_iter().collect();
            debug!(count = self.collapsed.len(), "collapse all");
        } else {
            self.collapsed.clear();
            debug!("expand all");
        }
    }

    /// Every host and VM key of a simulation, in traversal order
    pub fn known_keys(simulation: &Simulation) -> Vec<NodeKey> {
        let mut keys = Vec::with_capacity(simulation.hosts.len() + simulation.vm_count());
        for (host_key, host) in &simulation.hosts {
            keys.push(NodeKey::Host(host_key.clone()));
            keys.extend(host.vms.keys().map(|vm_key| NodeKey::Vm(vm_key.clone())));
        }
        keys
    }
}
