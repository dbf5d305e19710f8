use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use cloudscope_timeline::{
    CollapseStore, EntityIndex, Simulation, TimelineConfig, TimelineLayout, write_svg,
};
use gpui::*;
use gpui_component::{
    ActiveTheme, Root,
    resizable::{h_resizable, resizable_panel},
};
use gpui_component_assets::Assets;
use timelineview::{InfoPanel, ItemSelected, TimelineView};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cloudscope")]
#[command(about = "Browse host, VM and cloudlet lifetimes of a recorded cloud simulation")]
struct Cli {
    /// Simulation trace (JSON)
    trace: PathBuf,

    /// Timeline settings (JSON); missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the fully expanded timeline as SVG and exit without opening a window
    #[arg(long, value_name = "FILE")]
    export_svg: Option<PathBuf>,

    /// Viewport width used for the SVG export
    #[arg(long, default_value_t = 1200.0)]
    width: f64,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

actions!(cloudscope, [Open]);

fn load(cli: &Cli) -> Result<(Simulation, TimelineConfig)> {
    let config = match &cli.config {
        Some(path) => TimelineConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => TimelineConfig::default(),
    };
    Ok((read_trace(&cli.trace)?, config))
}

/// Loads a trace and reports what will not be drawn
fn read_trace(path: &Path) -> Result<Simulation> {
    let simulation = Simulation::from_path(path)
        .with_context(|| format!("failed to load trace {}", path.display()))?;

    for orphan in simulation.orphans() {
        warn!(
            host = %orphan.host,
            vm = %orphan.vm,
            cloudlet = %orphan.cloudlet,
            declared_vm_id = orphan.declared_vm_id,
            "cloudlet is listed under a VM with a different id and will not be drawn"
        );
    }
    let index = EntityIndex::build(&simulation);
    info!(
        name = %simulation.name,
        hosts = simulation.hosts.len(),
        vms = simulation.vm_count(),
        cloudlets = simulation.cloudlet_count(),
        duplicates = index.duplicates().len(),
        duration = simulation.duration,
        "trace loaded"
    );
    Ok(simulation)
}

fn export_svg(simulation: &Simulation, config: &TimelineConfig, width: f64, path: &Path) -> Result<()> {
    let layout = TimelineLayout::compute(
        simulation,
        config.default_scale,
        width,
        &CollapseStore::new(),
        config,
    );
    write_svg(&layout, None, config, path)
        .with_context(|| format!("failed to export {}", path.display()))?;
    info!(path = %path.display(), bars = layout.iter().count(), "timeline exported");
    Ok(())
}

/// Timeline on the left, details of the selection on the right.
struct Workbench {
    focus_handle: FocusHandle,
    timeline: Entity<TimelineView>,
    info: Entity<InfoPanel>,
    _subscriptions: Vec<Subscription>,
}

impl Workbench {
    fn new(
        simulation: Arc<Simulation>,
        config: TimelineConfig,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let timeline = cx.new(|_| TimelineView::new(simulation.clone(), config));
        let info = cx.new(|_| InfoPanel::new(simulation));

        let _subscriptions = vec![
            cx.subscribe(&timeline, |this, _, event: &ItemSelected, cx| {
                this.info
                    .update(cx, |panel, cx| panel.show(event.0.as_ref(), cx));
            }),
            cx.subscribe_in(&info, window, |this, _, event: &ItemSelected, window, cx| {
                let item = event.0.clone();
                this.timeline
                    .update(cx, |timeline, cx| timeline.select(item, window, cx));
            }),
        ];

        let focus_handle = cx.focus_handle();
        window.focus(&focus_handle);

        Self {
            focus_handle,
            timeline,
            info,
            _subscriptions,
        }
    }

    fn on_action_open(&mut self, _: &Open, window: &mut Window, cx: &mut Context<Self>) {
        let path = cx.prompt_for_paths(PathPromptOptions {
            files: true,
            directories: false,
            multiple: false,
            prompt: Some("Open simulation trace".into()),
        });

        cx.spawn_in(window, async move |this, window| {
            let path = path.await.ok()?.ok()??.into_iter().next()?;
            let simulation = match read_trace(&path) {
                Ok(simulation) => Arc::new(simulation),
                Err(err) => {
                    error!("{err:#}");
                    return None;
                }
            };

            window
                .update(|window, cx| {
                    _ = this.update(cx, |this, cx| this.replace_simulation(simulation, window, cx));
                })
                .ok();
            Some(())
        })
        .detach();
    }

    /// Swaps the trace in both panes; zoom, collapse and selection start over
    fn replace_simulation(
        &mut self,
        simulation: Arc<Simulation>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        window.set_window_title(&format!("cloudscope: {}", simulation.name));
        self.info
            .update(cx, |panel, cx| panel.set_simulation(simulation.clone(), cx));
        self.timeline
            .update(cx, |timeline, cx| timeline.set_simulation(simulation, cx));
    }
}

impl Render for Workbench {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        div()
            .id("workbench")
            .track_focus(&self.focus_handle)
            .on_action(cx.listener(Self::on_action_open))
            .size_full()
            .bg(cx.theme().background)
            .child(
                h_resizable("container")
                    .child(
                        resizable_panel().child(
                            div()
                                .id("timeline")
                                .relative()
                                .size_full()
                                .overflow_hidden()
                                .child(self.timeline.clone()),
                        ),
                    )
                    .child(
                        resizable_panel().child(
                            div()
                                .id("details")
                                .size_full()
                                .border_l_1()
                                .border_color(cx.theme().border)
                                .child(self.info.clone()),
                        ),
                    ),
            )
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let (simulation, config) = load(&cli)?;

    if let Some(path) = &cli.export_svg {
        return export_svg(&simulation, &config, cli.width, path);
    }

    let title = format!("cloudscope: {}", simulation.name);
    let simulation = Arc::new(simulation);
    let app = Application::new().with_assets(Assets);

    app.run(move |cx| {
        gpui_component::init(cx);
        cx.bind_keys([KeyBinding::new("secondary-o", Open, None)]);
        cx.activate(true);

        let options = WindowOptions {
            titlebar: Some(TitlebarOptions {
                title: Some(title.into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let opened = cx.open_window(options, |window, cx| {
            let view = cx.new(|cx| Workbench::new(simulation, config, window, cx));
            cx.new(|cx| Root::new(view.into(), window, cx))
        });
        if let Err(err) = opened {
            error!(%err, "failed to open window");
            cx.quit();
        }
    });
    Ok(())
}
