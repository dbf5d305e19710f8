//! Display model for the info panel.

use crate::model::{Cloudlet, Lifetime, Metric, Vm};
use crate::selection::{ItemRef, Selected};

/// One decimal; anything negative is shown as the `-1.0` sentinel
pub fn format_time(seconds: f64) -> String {
    if seconds < 0.0 {
        return "-1.0".to_string();
    }
    format!("{seconds:.1}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    pub label: &'static str,
    pub value: String,
}

impl Fact {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// A child listed under its parent; selecting it selects the child
#[derive(Debug, Clone, PartialEq)]
pub struct ChildLink {
    pub item: ItemRef,
    pub title: String,
    pub subtitle: String,
    pub span: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDetails {
    pub item: ItemRef,
    pub title: String,
    pub description: &'static str,
    pub facts: Vec<Fact>,
    pub metrics: Vec<Metric>,
    pub children: Vec<ChildLink>,
}

fn span(start: f64, end: f64) -> String {
    format!("{} - {}", format_time(start), format_time(end))
}

fn joined(times: &[f64]) -> String {
    times.iter().map(|t| format_time(*t)).collect::<Vec<_>>().join(", ")
}

/// Facts shared by hosts and VMs. Both can stop and start again, so every
/// segment is listed when there is more than one.
fn lifetime_facts(
    cores: i64,
    children: Fact,
    lifetime: &impl Lifetime,
    starts: &[f64],
    ends: &[f64],
) -> Vec<Fact> {
    let mut facts = vec![
        Fact::new("CPU Cores", format!("{cores} cores")),
        children,
        Fact::new("Start Time", format!("{} seconds", format_time(lifetime.start()))),
        Fact::new(
            "End Time",
            lifetime
                .end()
                .map(|end| format!("{} seconds", format_time(end)))
                .unwrap_or_else(|| "running".to_string()),
        ),
    ];
    if starts.len() > 1 || ends.len() > 1 {
        facts.push(Fact::new("Start Times", joined(starts)));
        facts.push(Fact::new("End Times", joined(ends)));
    }
    facts
}

fn vm_link(key: &str, vm: &Vm) -> ChildLink {
    ChildLink {
        item: ItemRef::vm(key),
        title: format!("VM {}", vm.id),
        subtitle: format!("{} cloudlets", vm.cloudlets.len()),
        span: span(vm.start(), vm.end().unwrap_or(0.0)),
    }
}

fn cloudlet_link(key: &str, cloudlet: &Cloudlet) -> ChildLink {
    ChildLink {
        item: ItemRef::cloudlet(key),
        title: format!("Cloudlet {}", cloudlet.id),
        subtitle: format!("Length: {} MI", cloudlet.length),
        span: span(cloudlet.start_time, cloudlet.finish_time),
    }
}

impl ItemDetails {
    pub fn from_selected(selected: &Selected<'_>) -> Self {
        match *selected {
            Selected::Host { host, .. } => Self {
                item: selected.item(),
                title: format!("Host {}", host.id),
                description: "Physical machine hosting VMs",
                facts: lifetime_facts(
                    host.num_cpu_cores,
                    Fact::new("VMs", format!("{} VMs", host.vms.len())),
                    host,
                    &host.start_times_seconds,
                    &host.end_times_seconds,
                ),
                metrics: host.metrics.clone(),
                children: host
                    .vms
                    .iter()
                    .map(|(vm_key, vm)| vm_link(vm_key, vm))
                    .collect(),
            },
            Selected::Vm { vm, .. } => Self {
                item: selected.item(),
                title: format!("VM {}", vm.id),
                description: "Virtual machine running cloudlets",
                facts: lifetime_facts(
                    vm.num_cpu_cores,
                    Fact::new("Cloudlets", format!("{} cloudlets", vm.cloudlets.len())),
                    vm,
                    &vm.start_times_seconds,
                    &vm.end_times_seconds,
                ),
                metrics: vm.metrics.clone(),
                children: vm
                    .cloudlets
                    .iter()
                    .map(|(cloudlet_key, cloudlet)| cloudlet_link(cloudlet_key, cloudlet))
                    .collect(),
            },
            Selected::Cloudlet { cloudlet, .. } => Self {
                item: selected.item(),
                title: format!("Cloudlet {}", cloudlet.id),
                description: "Computational task running on a VM",
                facts: vec![
                    Fact::new("CPU Cores", format!("{} cores", cloudlet.num_cpu_cores)),
                    Fact::new("Length", format!("{} MI", cloudlet.length)),
                    Fact::new("Finished Length", format!("{} MI", cloudlet.finished_length)),
                    Fact::new("Start Time", format!("{} seconds", format_time(cloudlet.start_time))),
                    Fact::new("Finish Time", format!("{} seconds", format_time(cloudlet.finish_time))),
                    Fact::new(
                        "Execution Time",
                        format!("{} seconds", format_time(cloudlet.execution_time)),
                    ),
                    Fact::new("VM", format!("VM {}", cloudlet.vm_id)),
                ],
                metrics: Vec::new(),
                children: Vec::new(),
            },
        }
    }

    pub fn fact(&self, label: &str) -> Option<&str> {
        self.facts
            .iter()
            .find(|fact| fact.label == label)
            .map(|fact| fact.value.as_str())
    }
}
