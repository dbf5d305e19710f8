use cloudscope_timeline::*;
use tracing_test::traced_test;

const TRACE: &str = r#"{
    "id": "sim-42",
    "name": "three tier",
    "startedAt": "2025-03-01T12:00:00Z",
    "duration": 95.0,
    "hosts": {
        "h1": {
            "id": 1,
            "startTimesSeconds": [0.0],
            "endTimesSeconds": [95.0],
            "numCpuCores": 32,
            "vms": {
                "v1": {
                    "id": 1,
                    "startTimesSeconds": [1.0],
                    "endTimesSeconds": [60.0],
                    "numCpuCores": 8,
                    "cloudlets": {
                        "c1": { "id": 1, "startTime": 2.0, "finishTime": 30.0, "length": 20000, "vmId": 1 },
                        "c2": { "id": 2, "startTime": 5.0, "finishTime": 0.0, "length": 40000, "vmId": 1 }
                    }
                },
                "v2": {
                    "id": 2,
                    "startTimesSeconds": [10.0],
                    "endTimesSeconds": [],
                    "cloudlets": {
                        "c3": { "id": 3, "startTime": 12.0, "finishTime": 20.0, "vmId": 2 }
                    }
                }
            }
        },
        "h2": {
            "id": 2,
            "startTimesSeconds": [20.0],
            "endTimesSeconds": [80.0],
            "vms": {
                "v3": {
                    "id": 3,
                    "startTimesSeconds": [25.0],
                    "endTimesSeconds": [70.0],
                    "cloudlets": {
                        "c4": { "id": 4, "startTime": 30.0, "finishTime": 40.0, "vmId": 3 }
                    }
                }
            }
        }
    }
}"#;

fn simulation() -> Simulation {
    Simulation::from_json(TRACE).unwrap()
}

#[test]
fn test_resolve_cloudlet_belongs_to_its_vm() {
    let simulation = simulation();
    let Some(Selected::Cloudlet { cloudlet, .. }) = resolve(ItemKind::Cloudlet, "c1", &simulation)
    else {
        panic!("c1 not found");
    };
    let Some(Selected::Vm { vm, .. }) = resolve(ItemKind::Vm, "v1", &simulation) else {
        panic!("v1 not found");
    };
    assert_eq!(cloudlet.vm_id, vm.id);
}

#[test]
fn test_resolve_missing_is_not_found() {
    let simulation = simulation();
    assert!(resolve(ItemKind::Vm, "missing", &simulation).is_none());
    assert!(resolve(ItemKind::Host, "v1", &simulation).is_none());
    assert!(resolve_ref(&ItemRef::cloudlet("c9"), &simulation).is_none());
}

#[test]
fn test_index_agrees_with_linear_lookup() {
    let simulation = simulation();
    let index = EntityIndex::build(&simulation);
    assert_eq!(index.len(), 2 + 3 + 4);
    assert!(index.duplicates().is_empty());
    for (_, node) in TimelineLayout::compute(
        &simulation,
        50.0,
        1000.0,
        &CollapseStore::new(),
        &TimelineConfig::default(),
    )
    .iter()
    {
        assert_eq!(
            index.resolve(&node.item, &simulation),
            resolve_ref(&node.item, &simulation)
        );
    }
}

#[traced_test]
#[test]
fn test_duplicate_ids_resolve_to_first_occurrence() {
    let mut simulation = simulation();
    let copy = simulation.hosts["h1"].vms["v1"].clone();
    let mut renamed = copy.clone();
    renamed.id = 99;
    for cloudlet in renamed.cloudlets.values_mut() {
        cloudlet.vm_id = 99;
    }
    simulation.hosts["h2"].vms.insert("v1".to_string(), renamed);

    let index = EntityIndex::build(&simulation);
    // the VM key and both of its cloudlet keys repeat
    assert_eq!(index.duplicates().len(), 3);
    assert!(logs_contain("duplicate ids in trace"));

    let Some(Selected::Vm { vm, .. }) = index.resolve(&ItemRef::vm("v1"), &simulation) else {
        panic!("v1 not found");
    };
    assert_eq!(vm.id, copy.id);
    assert_eq!(
        resolve_ref(&ItemRef::vm("v1"), &simulation),
        index.resolve(&ItemRef::vm("v1"), &simulation)
    );
}

#[test]
fn test_end_to_end_ruler() {
    let simulation = simulation();
    let layout = TimelineLayout::compute(
        &simulation,
        50.0,
        1000.0,
        &CollapseStore::new(),
        &TimelineConfig::default(),
    );
    assert_eq!(layout.ruler.end, 100);
    assert_eq!(visible_marker_slots(1000.0, 50.0), 20.0);
    assert_eq!(layout.ruler.stride, 5);

    let labels: Vec<String> = layout.ruler.ticks().filter_map(|tick| tick.label).collect();
    assert_eq!(labels.len(), 21);
    assert_eq!(labels[1], "0:05");
    assert_eq!(labels.last().map(String::as_str), Some("1:40"));
}

#[test]
fn test_collapsing_host_hides_descendants() {
    let simulation = simulation();
    let config = TimelineConfig::default();
    let mut collapsed = CollapseStore::new();
    collapsed.toggle(NodeKey::Host("h1".into()));
    let layout = TimelineLayout::compute(&simulation, 50.0, 1000.0, &collapsed, &config);

    let visible: Vec<String> = layout.iter().map(|(_, node)| node.item.to_string()).collect();
    assert_eq!(visible, vec!["host-h1", "host-h2", "vm-v3", "cloudlet-c4"]);

    let host = layout.find(&ItemRef::host("h1")).unwrap();
    let toggle = host.toggle.as_ref().unwrap();
    assert!(toggle.collapsed);
    assert_eq!(
        layout.hit_test(Position::new(toggle.bounds.left() + 1.0, toggle.bounds.top() + 1.0)),
        Some(Hit::Toggle(NodeKey::Host("h1".into())))
    );
}

#[test]
fn test_collapsing_vm_keeps_siblings() {
    let simulation = simulation();
    let mut collapsed = CollapseStore::new();
    collapsed.toggle(NodeKey::Vm("v1".into()));
    let layout = TimelineLayout::compute(
        &simulation,
        50.0,
        1000.0,
        &collapsed,
        &TimelineConfig::default(),
    );
    assert!(layout.find(&ItemRef::cloudlet("c1")).is_none());
    assert!(layout.find(&ItemRef::cloudlet("c3")).is_some());
    assert!(layout.find(&ItemRef::vm("v1")).unwrap().is_collapsed());
}

#[test]
fn test_bars_never_have_negative_width() {
    let mut simulation = simulation();
    // inverted interval
    simulation.hosts["h2"].vms["v3"].cloudlets["c4"].finish_time = 31.0;
    simulation.hosts["h2"].vms["v3"].cloudlets["c4"].start_time = 35.0;
    for convention in [BarConvention::ExclusiveFinalInstant, BarConvention::Exact] {
        let config = TimelineConfig {
            bar_convention: convention,
            ..TimelineConfig::default()
        };
        let layout = TimelineLayout::compute(&simulation, 20.0, 800.0, &CollapseStore::new(), &config);
        assert!(layout.iter().all(|(_, node)| node.bounds.size.width >= 0.0));
    }
}

#[traced_test]
#[test]
fn test_orphan_cloudlet_is_skipped_and_logged() {
    let mut simulation = simulation();
    simulation.hosts["h1"].vms["v2"].cloudlets["c3"].vm_id = 7;
    assert_eq!(simulation.orphans().len(), 1);

    let layout = TimelineLayout::compute(
        &simulation,
        50.0,
        1000.0,
        &CollapseStore::new(),
        &TimelineConfig::default(),
    );
    assert!(layout.find(&ItemRef::cloudlet("c3")).is_none());
    assert!(layout.find(&ItemRef::vm("v2")).is_some());
    assert!(logs_contain("skipping cloudlet whose owner does not match its VM"));
}

#[test]
fn test_click_selects_and_reports_details() {
    let simulation = simulation();
    let config = TimelineConfig::default();
    let viewport = Viewport::new(
        Position::new(config.gutter, config.ruler_height),
        Size::new(1000.0, 600.0),
    );
    let state = ViewState::new(&config)
        .apply(TimelineEvent::ViewportResized(viewport), &simulation, &config)
        .state;

    let layout = state.layout(&simulation, &config);
    let bar = layout.find(&ItemRef::cloudlet("c2")).unwrap();
    let screen = Position::new(
        viewport.origin.x + bar.bounds.left() + 40.0,
        viewport.origin.y + bar.bounds.top() + 2.0,
    );

    let transition = state.apply(TimelineEvent::Clicked(screen), &simulation, &config);
    assert!(transition.selection_changed);
    let selected = transition
        .state
        .selection
        .as_ref()
        .and_then(|item| resolve_ref(item, &simulation))
        .unwrap();
    let details = ItemDetails::from_selected(&selected);
    assert_eq!(details.title, "Cloudlet 2");
    assert_eq!(details.fact("Finish Time"), Some("0.0 seconds"));
    assert_eq!(details.fact("Length"), Some("40000 MI"));
}

#[test]
fn test_svg_snapshot_contains_every_visible_bar() {
    let simulation = simulation();
    let config = TimelineConfig::default();
    let layout = TimelineLayout::compute(&simulation, 20.0, 1000.0, &CollapseStore::new(), &config);
    let svg = render_svg(&layout, Some(&ItemRef::host("h2")), &config);
    for (_, node) in layout.iter() {
        assert!(svg.contains(&format!(">{}</text>", node.label)), "{} missing", node.label);
    }
}

#[test]
fn test_config_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("cloudscope-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("timeline.json");
    std::fs::write(&path, r#"{ "default_scale": 80, "row_height": 24 }"#).unwrap();

    let config = TimelineConfig::from_path(&path).unwrap();
    assert_eq!(config.default_scale, 80.0);
    assert_eq!(config.row_height, 24.0);
    assert_eq!(ViewState::new(&config).zoom.scale, 80.0);

    let missing = TimelineConfig::from_path(dir.join("nope.json")).unwrap_err();
    assert!(matches!(missing, TraceError::Io { .. }));
    std::fs::remove_dir_all(&dir).unwrap();
}
