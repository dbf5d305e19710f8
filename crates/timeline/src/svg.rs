use std::path::Path;

use crate::config::TimelineConfig;
use crate::error::TraceError;
use crate::layout::{BarNode, TimelineLayout};
use crate::selection::ItemRef;

const FILLS: [&str; 3] = ["#cfe3f7", "#d6f0d2", "#fbe3c4"];

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Full, unscrolled picture of a layout: ruler on top, bars below, gutter on the left
pub fn render_svg(layout: &TimelineLayout, selection: Option<&ItemRef>, config: &TimelineConfig) -> String {
    let left = config.gutter;
    let top = config.ruler_height;
    let width = left + layout.content.width;
    let height = top + layout.content.height;

    let mut svg = format!(
        r#"<svg width="{}" height="{}" xmlns="http://www.w3.org/2000/svg">
<rect width="100%" height="100%" fill="white"/>
"#,
        width, height
    );

    for tick in layout.ruler.ticks() {
        let x = left + tick.x;
        let (stroke, y1) = if tick.label.is_some() {
            ("#b0b0b0", top * 0.5)
        } else {
            ("#e4e4e4", top * 0.75)
        };
        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"/>
"#,
            x, y1, x, height, stroke
        ));
        if let Some(label) = &tick.label {
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" font-family="Arial" font-size="11" text-anchor="middle">{}</text>
"#,
                x,
                top * 0.4,
                escape(label)
            ));
        }
    }

    for (depth, node) in layout.iter() {
        push_bar(&mut svg, node, depth, selection, left, top);
    }

    svg.push_str("</svg>");
    svg
}

fn push_bar(svg: &mut String, node: &BarNode, depth: usize, selection: Option<&ItemRef>, left: f64, top: f64) {
    let bounds = node.bounds;
    let fill = FILLS[depth.min(FILLS.len() - 1)];
    let (stroke, stroke_width) = if selection == Some(&node.item) {
        ("#1f6feb", 2)
    } else {
        ("#6b6b6b", 1)
    };
    svg.push_str(&format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="3" fill="{}" stroke="{}" stroke-width="{}"/>
"#,
        left + bounds.left(),
        top + bounds.top(),
        bounds.size.width,
        bounds.size.height,
        fill,
        stroke,
        stroke_width
    ));

    let header = node.header;
    let mut label_x = left + header.left() + 4.0;
    if let Some(toggle) = &node.toggle {
        let chevron = if toggle.collapsed { "▸" } else { "▾" };
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="Arial" font-size="12" text-anchor="middle">{}</text>
"#,
            left + toggle.bounds.left() + toggle.bounds.size.width / 2.0,
            top + toggle.bounds.top() + toggle.bounds.size.height / 2.0 + 4.0,
            chevron
        ));
        label_x += toggle.bounds.size.width;
    }
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" font-family="Arial" font-size="12">{}</text>
"#,
        label_x,
        top + header.top() + header.size.height / 2.0 + 4.0,
        escape(&node.label)
    ));
}

pub fn write_svg(
    layout: &TimelineLayout,
    selection: Option<&ItemRef>,
    config: &TimelineConfig,
    path: impl AsRef<Path>,
) -> Result<(), TraceError> {
    let path = path.as_ref();
    std::fs::write(path, render_svg(layout, selection, config)).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collapse::{CollapseStore, NodeKey};
    use crate::model::Simulation;

    const TRACE: &str = r#"{
        "id": "s", "name": "svg", "duration": 30.0,
        "hosts": {
            "h1": {
                "id": 1, "startTimesSeconds": [0.0], "endTimesSeconds": [30.0],
                "vms": {
                    "v1": {
                        "id": 11, "startTimesSeconds": [2.0], "endTimesSeconds": [20.0],
                        "cloudlets": {
                            "c1": { "id": 5, "startTime": 3.0, "finishTime": 9.0, "vmId": 11 }
                        }
                    }
                }
            }
        }
    }"#;

    fn layout(collapsed: &CollapseStore) -> (TimelineLayout, TimelineConfig) {
        let config = TimelineConfig::default();
        let simulation = Simulation::from_json(TRACE).unwrap();
        let layout = TimelineLayout::compute(&simulation, 50.0, 1000.0, collapsed, &config);
        (layout, config)
    }

    #[test]
    fn test_renders_ruler_and_bars() {
        let (layout, config) = layout(&CollapseStore::new());
        let svg = render_svg(&layout, None, &config);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        // background + host + vm + cloudlet
        assert_eq!(svg.matches("<rect").count(), 4);
        // 0..=30 seconds
        assert_eq!(svg.matches("<line").count(), 31);
        assert!(svg.contains(">0:30</text>"));
        assert!(svg.contains(">Cloudlet 5</text>"));
    }

    #[test]
    fn test_collapsed_host_hides_children() {
        let mut collapsed = CollapseStore::new();
        collapsed.toggle(NodeKey::Host("h1".into()));
        let (layout, config) = layout(&collapsed);
        let svg = render_svg(&layout, None, &config);
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains("▸"));
        assert!(!svg.contains("VM 11"));
    }

    #[test]
    fn test_selection_is_highlighted() {
        let (layout, config) = layout(&CollapseStore::new());
        let svg = render_svg(&layout, Some(&ItemRef::vm("v1")), &config);
        assert_eq!(svg.matches("#1f6feb").count(), 1);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & \"c\">"), "a&lt;b &amp; &quot;c&quot;&gt;");
    }
}
