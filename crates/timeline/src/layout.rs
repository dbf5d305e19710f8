//! Nested lifetime bars for hosts → VMs → cloudlets.
//!
//! Coordinates are content space: x = 0 is simulated second zero, y = 0 is
//! the top of the first host bar (the ruler sits above, outside this space).

use tracing::warn;

use crate::collapse::{CollapseStore, NodeKey};
use crate::config::TimelineConfig;
use crate::mapper::lifetime_span;
use crate::markers::Ruler;
use crate::model::{Cloudlet, Host, Simulation, Vm};
use crate::selection::ItemRef;
use crate::types::{Position, Rect, Size};
use crate::zoom::ContentExtent;

/// Chevron state of a host or VM row
#[derive(Debug, Clone, PartialEq)]
pub struct Toggle {
    pub key: NodeKey,
    pub collapsed: bool,
    /// Rendered even when false; the chevron is always available
    pub has_children: bool,
    pub bounds: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarNode {
    pub item: ItemRef,
    pub label: String,
    /// Whole bar, enclosing every visible descendant vertically
    pub bounds: Rect,
    /// The label row at the top of the bar
    pub header: Rect,
    /// Clickable area: `bounds`, but never narrower than the configured
    /// minimum so zero-length lifetimes stay selectable
    pub hit: Rect,
    pub toggle: Option<Toggle>,
    pub children: Vec<BarNode>,
}

impl BarNode {
    pub fn is_collapsed(&self) -> bool {
        self.toggle.as_ref().is_some_and(|t| t.collapsed)
    }
}

/// What a pointer lands on
#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    Toggle(NodeKey),
    Item(ItemRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLayout {
    pub ruler: Ruler,
    pub bars: Vec<BarNode>,
    pub content: Size,
}

struct Placer<'a> {
    config: &'a TimelineConfig,
    collapsed: &'a CollapseStore,
    duration: f64,
    scale: f64,
}

impl Placer<'_> {
    fn bar(
        &self,
        item: ItemRef,
        label: String,
        offset: f64,
        width: f64,
        top: f64,
        toggle_key: Option<NodeKey>,
        has_children: bool,
    ) -> BarNode {
        let row = self.config.row_height;
        let toggle = toggle_key.map(|key| Toggle {
            collapsed: self.collapsed.is_collapsed(&key),
            key,
            has_children,
            bounds: Rect::new(offset, top, row, row),
        });
        let bounds = Rect::new(offset, top, width, row);
        BarNode {
            item,
            label,
            bounds,
            header: bounds,
            hit: bounds.with_min_width(self.config.min_hit_width),
            toggle,
            children: Vec::new(),
        }
    }

    /// Stacks `children` under the header and grows the bar to enclose them
    fn enclose(&self, mut node: BarNode, children: Vec<BarNode>) -> BarNode {
        if let Some(last) = children.last() {
            let bottom = last.bounds.bottom() + self.config.bar_padding;
            node.bounds.size.height = bottom - node.bounds.top();
            node.hit.size.height = node.bounds.size.height;
        }
        node.children = children;
        node
    }

    fn host(&self, key: &str, host: &Host, top: f64) -> BarNode {
        let span = lifetime_span(host, self.duration, self.scale, self.config.bar_convention);
        let node_key = NodeKey::Host(key.to_string());
        let collapsed = self.collapsed.is_collapsed(&node_key);
        let node = self.bar(
            ItemRef::host(key),
            format!("Host {}", host.id),
            span.offset,
            span.width,
            top,
            Some(node_key),
            !host.vms.is_empty(),
        );
        if collapsed {
            return node;
        }

        let mut cursor = top + self.config.row_height;
        let mut children = Vec::with_capacity(host.vms.len());
        for (vm_key, vm) in &host.vms {
            let child = self.vm(key, vm_key, vm, cursor);
            cursor = child.bounds.bottom() + self.config.row_gap;
            children.push(child);
        }
        self.enclose(node, children)
    }

    fn vm(&self, host_key: &str, key: &str, vm: &Vm, top: f64) -> BarNode {
        let span = lifetime_span(vm, self.duration, self.scale, self.config.bar_convention);
        let node_key = NodeKey::Vm(key.to_string());
        let collapsed = self.collapsed.is_collapsed(&node_key);
        let node = self.bar(
            ItemRef::vm(key),
            format!("VM {}", vm.id),
            span.offset,
            span.width,
            top,
            Some(node_key),
            !vm.cloudlets.is_empty(),
        );
        if collapsed {
            return node;
        }

        let mut cursor = top + self.config.row_height;
        let mut children = Vec::with_capacity(vm.cloudlets.len());
        for (cloudlet_key, cloudlet) in &vm.cloudlets {
            if cloudlet.is_orphan_in(vm) {
                warn!(
                    host = host_key,
                    vm = key,
                    cloudlet = cloudlet_key.as_str(),
                    declared_vm = cloudlet.vm_id,
                    "skipping cloudlet whose owner does not match its VM"
                );
                continue;
            }
            let child = self.cloudlet(cloudlet_key, cloudlet, cursor);
            cursor = child.bounds.bottom() + self.config.row_gap;
            children.push(child);
        }
        self.enclose(node, children)
    }

    fn cloudlet(&self, key: &str, cloudlet: &Cloudlet, top: f64) -> BarNode {
        let span = lifetime_span(cloudlet, self.duration, self.scale, self.config.bar_convention);
        self.bar(
            ItemRef::cloudlet(key),
            format!("Cloudlet {}", cloudlet.id),
            span.offset,
            span.width,
            top,
            None,
            false,
        )
    }
}

impl TimelineLayout {
    /// Pure function of its inputs; call it on every state change.
    ///
    /// `viewport_width` is the width of the scrolling region and only feeds
    /// label decimation.
    pub fn compute(
        simulation: &Simulation,
        scale: f64,
        viewport_width: f64,
        collapsed: &CollapseStore,
        config: &TimelineConfig,
    ) -> Self {
        let ruler = Ruler::new(simulation.duration, viewport_width, scale);
        let placer = Placer {
            config,
            collapsed,
            duration: simulation.duration,
            scale,
        };

        let mut bars = Vec::with_capacity(simulation.hosts.len());
        let mut cursor = 0.0;
        for (key, host) in &simulation.hosts {
            let bar = placer.host(key, host, cursor);
            cursor = bar.bounds.bottom() + config.host_gap;
            bars.push(bar);
        }
        let height = bars.last().map(|b| b.bounds.bottom()).unwrap_or(0.0);

        Self {
            content: Size::new(ruler.content_width(), height),
            ruler,
            bars,
        }
    }

    /// Scrollable extent for the zoom controller
    pub fn extent(&self) -> ContentExtent {
        ContentExtent {
            seconds: self.ruler.end as f64 + 1.0,
            height: self.content.height,
        }
    }

    /// Depth-first walk in render order, with nesting depth (hosts are 0)
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BarNode)> {
        let mut stack: Vec<(usize, &BarNode)> = self.bars.iter().rev().map(|b| (0, b)).collect();
        std::iter::from_fn(move || {
            let (depth, node) = stack.pop()?;
            stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
            Some((depth, node))
        })
    }

    pub fn find(&self, item: &ItemRef) -> Option<&BarNode> {
        self.iter().map(|(_, node)| node).find(|node| &node.item == item)
    }

    /// Innermost element under `point`. A hit on a child never also reports
    /// its ancestors, and a chevron wins over the bar it sits on.
    pub fn hit_test(&self, point: Position) -> Option<Hit> {
        self.bars.iter().find_map(|bar| hit_node(bar, point))
    }
}

fn hit_node(node: &BarNode, point: Position) -> Option<Hit> {
    if let Some(hit) = node.children.iter().find_map(|child| hit_node(child, point)) {
        return Some(hit);
    }
    if let Some(toggle) = &node.toggle {
        if toggle.bounds.contains(point) {
            return Some(Hit::Toggle(toggle.key.clone()));
        }
    }
    node.hit
        .contains(point)
        .then(|| Hit::Item(node.item.clone()))
}
