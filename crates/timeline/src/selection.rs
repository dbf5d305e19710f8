//! Mapping a clicked `(kind, id)` back to the entity record.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collapse::NodeKey;
use crate::model::{Cloudlet, Host, Simulation, Vm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Host,
    Vm,
    Cloudlet,
}

/// What the view reports on click, and what the selection stores
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub id: String,
}

impl ItemRef {
    pub fn new(kind: ItemKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn host(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Host, id)
    }

    pub fn vm(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Vm, id)
    }

    pub fn cloudlet(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Cloudlet, id)
    }
}

impl From<&NodeKey> for ItemRef {
    fn from(key: &NodeKey) -> Self {
        match key {
            NodeKey::Host(id) => ItemRef::host(id.clone()),
            NodeKey::Vm(id) => ItemRef::vm(id.clone()),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ItemKind::Host => "host",
            ItemKind::Vm => "vm",
            ItemKind::Cloudlet => "cloudlet",
        };
        write!(f, "{kind}-{}", self.id)
    }
}

/// A resolved entity together with the map key it was found under
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selected<'a> {
    Host { key: &'a str, host: &'a Host },
    Vm { key: &'a str, vm: &'a Vm },
    Cloudlet { key: &'a str, cloudlet: &'a Cloudlet },
}

impl Selected<'_> {
    pub fn item(&self) -> ItemRef {
        match self {
            Selected::Host { key, .. } => ItemRef::host(*key),
            Selected::Vm { key, .. } => ItemRef::vm(*key),
            Selected::Cloudlet { key, .. } => ItemRef::cloudlet(*key),
        }
    }
}

/// Linear lookup in traversal order; the first match wins when ids repeat
/// across hosts (or VMs).
pub fn resolve<'a>(kind: ItemKind, id: &str, simulation: &'a Simulation) -> Option<Selected<'a>> {
    match kind {
        ItemKind::Host => simulation
            .hosts
            .get_key_value(id)
            .map(|(key, host)| Selected::Host {
                key: key.as_str(),
                host,
            }),
        ItemKind::Vm => simulation
            .hosts
            .values()
            .find_map(|host| host.vms.get_key_value(id))
            .map(|(key, vm)| Selected::Vm {
                key: key.as_str(),
                vm,
            }),
        ItemKind::Cloudlet => simulation
            .hosts
            .values()
            .flat_map(|host| host.vms.values())
            .find_map(|vm| vm.cloudlets.get_key_value(id))
            .map(|(key, cloudlet)| Selected::Cloudlet {
                key: key.as_str(),
                cloudlet,
            }),
    }
}

pub fn resolve_ref<'a>(item: &ItemRef, simulation: &'a Simulation) -> Option<Selected<'a>> {
    resolve(item.kind, &item.id, simulation)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Host(usize),
    Vm(usize, usize),
    Cloudlet(usize, usize, usize),
}

/// Flat id index built once per loaded simulation.
///
/// Resolves with the same first-match policy as [`resolve`], in O(1).
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    locations: HashMap<ItemRef, Location>,
    duplicates: Vec<ItemRef>,
}

impl EntityIndex {
    pub fn build(simulation: &Simulation) -> Self {
        let mut index = Self::default();
        for (h, (host_key, host)) in simulation.hosts.iter().enumerate() {
            index.insert(ItemRef::host(host_key.clone()), Location::Host(h));
            for (v, (vm_key, vm)) in host.vms.iter().enumerate() {
                index.insert(ItemRef::vm(vm_key.clone()), Location::Vm(h, v));
                for (c, cloudlet_key) in vm.cloudlets.keys().enumerate() {
                    index.insert(ItemRef::cloudlet(cloudlet_key.clone()), Location::Cloudlet(h, v, c));
                }
            }
        }
        if !index.duplicates.is_empty() {
            warn!(
                count = index.duplicates.len(),
                "duplicate ids in trace, selection resolves to the first occurrence"
            );
        }
        index
    }

    fn insert(&mut self, item: ItemRef, location: Location) {
        if self.locations.contains_key(&item) {
            self.duplicates.push(item);
        } else {
            self.locations.insert(item, location);
        }
    }

    /// Ids that occur more than once for their kind, in the order they were found
    pub fn duplicates(&self) -> &[ItemRef] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// `simulation` must be the one the index was built from
    pub fn resolve<'a>(&self, item: &ItemRef, simulation: &'a Simulation) -> Option<Selected<'a>> {
        match *self.locations.get(item)? {
            Location::Host(h) => {
                let (key, host) = simulation.hosts.get_index(h)?;
                Some(Selected::Host {
                    key: key.as_str(),
                    host,
                })
            }
            Location::Vm(h, v) => {
                let (key, vm) = simulation.hosts.get_index(h)?.1.vms.get_index(v)?;
                Some(Selected::Vm {
                    key: key.as_str(),
                    vm,
                })
            }
            Location::Cloudlet(h, v, c) => {
                let (key, cloudlet) = simulation
                    .hosts
                    .get_index(h)?
                    .1
                    .vms
                    .get_index(v)?
                    .1
                    .cloudlets
                    .get_index(c)?;
                Some(Selected::Cloudlet {
                    key: key.as_str(),
                    cloudlet,
                })
            }
        }
    }
}
