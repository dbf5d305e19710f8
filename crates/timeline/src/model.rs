//! In-memory simulation trace as written by the recorder.
//!
//! Everything here is read-only once loaded. Maps keep the insertion order of
//! the source file, which is also the on-screen sibling order.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TraceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub started_at: String,
    /// Total simulated time in seconds
    pub duration: f64,
    #[serde(default)]
    pub hosts: IndexMap<String, Host>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub id: i64,
    #[serde(default)]
    pub start_times_seconds: Vec<f64>,
    #[serde(default)]
    pub end_times_seconds: Vec<f64>,
    #[serde(default)]
    pub num_cpu_cores: i64,
    #[serde(default)]
    pub vms: IndexMap<String, Vm>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vm {
    pub id: i64,
    #[serde(default)]
    pub start_times_seconds: Vec<f64>,
    #[serde(default)]
    pub end_times_seconds: Vec<f64>,
    #[serde(default)]
    pub num_cpu_cores: i64,
    #[serde(default)]
    pub cloudlets: IndexMap<String, Cloudlet>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cloudlet {
    pub id: i64,
    pub start_time: f64,
    /// Zero (or negative) while the task has not finished
    #[serde(default)]
    pub finish_time: f64,
    #[serde(default)]
    pub length: i64,
    #[serde(default)]
    pub finished_length: i64,
    #[serde(default)]
    pub execution_time: f64,
    #[serde(default)]
    pub num_cpu_cores: i64,
    pub vm_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub simulation_time: f64,
    pub cpu_utilization: f64,
    pub ram_usage: f64,
}

/// A start/end pair used to place a lifetime bar.
///
/// `end` is `None` while the entity is still running at the end of the trace.
pub trait Lifetime {
    fn start(&self) -> f64;
    fn end(&self) -> Option<f64>;
}

impl Lifetime for Host {
    // Hosts may come and go in segments; only the first one is placed.
    fn start(&self) -> f64 {
        self.start_times_seconds.first().copied().unwrap_or(0.0)
    }

    fn end(&self) -> Option<f64> {
        self.end_times_seconds.first().copied()
    }
}

impl Lifetime for Vm {
    fn start(&self) -> f64 {
        self.start_times_seconds.first().copied().unwrap_or(0.0)
    }

    fn end(&self) -> Option<f64> {
        self.end_times_seconds.first().copied()
    }
}

impl Lifetime for Cloudlet {
    fn start(&self) -> f64 {
        self.start_time
    }

    fn end(&self) -> Option<f64> {
        (self.finish_time > 0.0).then_some(self.finish_time)
    }
}

impl Cloudlet {
    /// True when the task claims a different owner than the VM that lists it
    pub fn is_orphan_in(&self, vm: &Vm) -> bool {
        self.vm_id != vm.id
    }
}

/// Location of a cloudlet whose declared owner does not match its parent VM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanCloudlet {
    pub host: String,
    pub vm: String,
    pub cloudlet: String,
    pub declared_vm_id: i64,
}

impl Simulation {
    pub fn from_json(content: &str) -> Result<Self, TraceError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn vm_count(&self) -> usize {
        self.hosts.values().map(|h| h.vms.len()).sum()
    }

    pub fn cloudlet_count(&self) -> usize {
        self.hosts
            .values()
            .flat_map(|h| h.vms.values())
            .map(|vm| vm.cloudlets.len())
            .sum()
    }

    /// All cloudlets that break the parent-reference invariant, in traversal order
    pub fn orphans(&self) -> Vec<OrphanCloudlet> {
        let mut orphans = Vec::new();
        for (host_key, host) in &self.hosts {
            for (vm_key, vm) in &host.vms {
                for (cloudlet_key, cloudlet) in &vm.cloudlets {
                    if cloudlet.is_orphan_in(vm) {
                        orphans.push(OrphanCloudlet {
                            host: host_key.clone(),
                            vm: vm_key.clone(),
                            cloudlet: cloudlet_key.clone(),
                            declared_vm_id: cloudlet.vm_id,
                        });
                    }
                }
            }
        }
        orphans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = r#"{
        "id": "sim-1",
        "name": "two hosts",
        "startedAt": "2025-01-01T00:00:00Z",
        "duration": 42.5,
        "hosts": {
            "7": {
                "id": 7,
                "startTimesSeconds": [0.0],
                "endTimesSeconds": [],
                "numCpuCores": 8,
                "vms": {
                    "1": {
                        "id": 1,
                        "startTimesSeconds": [2.0],
                        "endTimesSeconds": [30.0],
                        "numCpuCores": 2,
                        "cloudlets": {
                            "4": {
                                "id": 4,
                                "startTime": 3.0,
                                "finishTime": 0.0,
                                "length": 10000,
                                "finishedLength": 2500,
                                "executionTime": 0.0,
                                "numCpuCores": 1,
                                "vmId": 1
                            }
                        },
                        "metrics": []
                    }
                },
                "metrics": [
                    { "simulationTime": 1.0, "cpuUtilization": 12.5, "ramUsage": 512 }
                ]
            },
            "3": {
                "id": 3,
                "startTimesSeconds": [5.0, 20.0],
                "endTimesSeconds": [10.0, 25.0],
                "numCpuCores": 4
            }
        }
    }"#;

    #[test]
    fn test_parse_recorder_output() {
        let sim = Simulation::from_json(TRACE).unwrap();
        assert_eq!(sim.name, "two hosts");
        assert_eq!(sim.duration, 42.5);
        // Source order, not numeric order
        let keys: Vec<&str> = sim.hosts.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["7", "3"]);
        assert_eq!(sim.vm_count(), 1);
        assert_eq!(sim.cloudlet_count(), 1);
        assert_eq!(sim.hosts["7"].metrics[0].ram_usage, 512.0);
        assert!(sim.hosts["3"].vms.is_empty());
    }

    #[test]
    fn test_lifetimes_use_first_segment() {
        let sim = Simulation::from_json(TRACE).unwrap();
        let host = &sim.hosts["3"];
        assert_eq!(host.start(), 5.0);
        assert_eq!(host.end(), Some(10.0));
        assert_eq!(sim.hosts["7"].end(), None);
    }

    #[test]
    fn test_unfinished_cloudlet_has_no_end() {
        let sim = Simulation::from_json(TRACE).unwrap();
        let cloudlet = &sim.hosts["7"].vms["1"].cloudlets["4"];
        assert_eq!(cloudlet.start(), 3.0);
        assert_eq!(cloudlet.end(), None);
    }

    #[test]
    fn test_negative_length_is_accepted() {
        // Cloudlets that run until the simulation ends are recorded with length -1
        let trace = r#"{
            "id": "s", "name": "open ended", "duration": 10.0,
            "hosts": { "h": { "id": 0, "vms": { "v": { "id": 0, "cloudlets": {
                "c": { "id": 0, "startTime": 1.0, "length": -1, "finishedLength": -1, "vmId": 0 }
            } } } } }
        }"#;
        let sim = Simulation::from_json(trace).unwrap();
        let cloudlet = &sim.hosts["h"].vms["v"].cloudlets["c"];
        assert_eq!(cloudlet.length, -1);
        assert_eq!(cloudlet.finished_length, -1);
        assert!(sim.orphans().is_empty());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = Simulation::from_json("{ \"id\": 1 ").unwrap_err();
        assert!(matches!(err, TraceError::Json(_)));
    }

    #[test]
    fn test_orphans() {
        let mut sim = Simulation::from_json(TRACE).unwrap();
        assert!(sim.orphans().is_empty());

        sim.hosts["7"].vms["1"].cloudlets["4"].vm_id = 99;
        let orphans = sim.orphans();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].cloudlet, "4");
        assert_eq!(orphans[0].declared_vm_id, 99);
    }
}
