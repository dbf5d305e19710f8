//! The single mutable thing in the viewer, modelled as a value.
//!
//! Every input (slider, pinch, wheel, drag, click, resize, animation frame)
//! becomes a [`TimelineEvent`] and goes through [`ViewState::apply`], which
//! returns a fresh state. Events are applied in arrival order; the last one wins.

use std::time::Duration;

use tracing::debug;

use crate::collapse::{CollapseStore, NodeKey};
use crate::config::TimelineConfig;
use crate::layout::{Hit, TimelineLayout};
use crate::mapper::time_at;
use crate::model::Simulation;
use crate::selection::{ItemRef, resolve_ref};
use crate::types::Position;
use crate::zoom::{ScrollTween, Viewport, ZoomController, ZoomState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Started,
    Moved,
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// A different simulation replaced the current one
    SimulationLoaded,
    ViewportResized(Viewport),
    /// Absolute scale from the slider
    SliderChanged(f64),
    /// Signed number of zoom-button steps
    ZoomStep(f64),
    /// Multiplicative scale change around a screen point
    Pinch {
        factor: f64,
        focal: Position,
        phase: GesturePhase,
    },
    /// Wheel scrolling in pixels
    Scrolled(Position),
    /// Drag panning; `delta` is the pointer movement since the last event
    Drag { delta: Position, phase: GesturePhase },
    /// Pointer position in screen space, `None` once it leaves the timeline
    PointerMoved(Option<Position>),
    ToggleCollapse(NodeKey),
    ToggleAll,
    Select(Option<ItemRef>),
    /// Click at a screen point, resolved through the layout's hit test
    Clicked(Position),
    /// Smoothly bring `(seconds, content y)` to the viewport centre
    RecenterOn(Position),
    /// Bring a bar to the viewport centre
    Reveal(ItemRef),
    AnimationFrame(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveTween {
    pub tween: ScrollTween,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub zoom: ZoomState,
    pub viewport: Viewport,
    pub collapsed: CollapseStore,
    pub selection: Option<ItemRef>,
    /// Simulated seconds under the pointer
    pub cursor: Option<f64>,
    pub tween: Option<ActiveTween>,
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ViewState,
    pub selection_changed: bool,
}

impl ViewState {
    pub fn new(config: &TimelineConfig) -> Self {
        Self {
            zoom: ZoomState::new(config),
            viewport: Viewport::default(),
            collapsed: CollapseStore::new(),
            selection: None,
            cursor: None,
            tween: None,
        }
    }

    pub fn layout(&self, simulation: &Simulation, config: &TimelineConfig) -> TimelineLayout {
        TimelineLayout::compute(
            simulation,
            self.zoom.scale,
            self.viewport.size.width,
            &self.collapsed,
            config,
        )
    }

    /// Screen point to content space
    pub fn to_content(&self, screen: Position) -> Position {
        Position::new(
            screen.x - self.viewport.origin.x + self.zoom.scroll.x,
            screen.y - self.viewport.origin.y + self.zoom.scroll.y,
        )
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    pub fn apply(
        &self,
        event: TimelineEvent,
        simulation: &Simulation,
        config: &TimelineConfig,
    ) -> Transition {
        let mut next = self.clone();
        match event {
            TimelineEvent::SimulationLoaded => {
                next = ViewState {
                    viewport: self.viewport,
                    ..ViewState::new(config)
                };
            }
            TimelineEvent::ViewportResized(viewport) => {
                next.viewport = viewport;
                next.zoom = next.controller(simulation, config).refit(&next.zoom);
            }
            TimelineEvent::SliderChanged(scale) => {
                next.tween = None;
                next.zoom = next
                    .controller(simulation, config)
                    .set_scale_absolute(&next.zoom, scale);
            }
            TimelineEvent::ZoomStep(steps) => {
                next.tween = None;
                next.zoom = next
                    .controller(simulation, config)
                    .step(&next.zoom, steps * config.zoom_step);
            }
            TimelineEvent::Pinch {
                factor,
                focal,
                phase,
            } => {
                next.tween = None;
                next.zoom.is_interacting = phase != GesturePhase::Ended;
                let controller = next.controller(simulation, config);
                next.zoom = controller.zoom_at_focal_point(
                    &next.zoom,
                    factor,
                    focal,
                    next.viewport.origin,
                    next.zoom.scroll,
                );
            }
            TimelineEvent::Scrolled(delta) => {
                next.tween = None;
                next.zoom = next.controller(simulation, config).pan_by(&next.zoom, delta);
            }
            TimelineEvent::Drag { delta, phase } => {
                next.tween = None;
                next.zoom.is_interacting = phase != GesturePhase::Ended;
                // Content follows the pointer
                let scroll = Position::new(-delta.x, -delta.y);
                next.zoom = next.controller(simulation, config).pan_by(&next.zoom, scroll);
            }
            TimelineEvent::PointerMoved(point) => {
                next.cursor = point.and_then(|p| {
                    let inside = p.x >= self.viewport.origin.x
                        && p.x <= self.viewport.origin.x + self.viewport.size.width;
                    inside.then(|| {
                        time_at(p.x, self.viewport.origin.x, self.zoom.scroll.x, self.zoom.scale)
                    })
                });
            }
            TimelineEvent::ToggleCollapse(key) => {
                next.collapsed.toggle(key);
                next.zoom = next.controller(simulation, config).refit(&next.zoom);
            }
            TimelineEvent::ToggleAll => {
                next.collapsed.toggle_all(CollapseStore::known_keys(simulation));
                next.zoom = next.controller(simulation, config).refit(&next.zoom);
            }
            TimelineEvent::Select(item) => {
                next.selection = item.filter(|item| resolve_ref(item, simulation).is_some());
            }
            TimelineEvent::Clicked(screen) => {
                // The ruler strip covers whatever is scrolled up under it
                if screen.y < self.viewport.origin.y {
                    return self.apply(TimelineEvent::Select(None), simulation, config);
                }
                let layout = self.layout(simulation, config);
                match layout.hit_test(self.to_content(screen)) {
                    Some(Hit::Toggle(key)) => {
                        return self.apply(TimelineEvent::ToggleCollapse(key), simulation, config);
                    }
                    Some(Hit::Item(item)) => {
                        return self.apply(TimelineEvent::Select(Some(item)), simulation, config);
                    }
                    None => {
                        return self.apply(TimelineEvent::Select(None), simulation, config);
                    }
                }
            }
            TimelineEvent::RecenterOn(target) => {
                let tween = next.controller(simulation, config).recenter_on(&next.zoom, target);
                next.tween = Some(ActiveTween {
                    tween,
                    elapsed: Duration::ZERO,
                });
            }
            TimelineEvent::Reveal(item) => {
                let layout = self.layout(simulation, config);
                if let Some(bar) = layout.find(&item) {
                    let bounds = bar.bounds;
                    let target = Position::new(
                        (bounds.left() + bounds.size.width / 2.0) / self.zoom.scale,
                        bounds.top() + config.row_height / 2.0,
                    );
                    return self.apply(TimelineEvent::RecenterOn(target), simulation, config);
                }
            }
            TimelineEvent::AnimationFrame(dt) => {
                if let Some(active) = next.tween {
                    let elapsed = active.elapsed + dt;
                    let controller = next.controller(simulation, config);
                    next.zoom.scroll =
                        controller.clamp_scroll(active.tween.sample(elapsed), next.zoom.scale);
                    next.tween = (!active.tween.is_finished(elapsed)).then_some(ActiveTween {
                        tween: active.tween,
                        elapsed,
                    });
                }
            }
        }

        let selection_changed = next.selection != self.selection;
        if selection_changed {
            debug!(selection = ?next.selection, "selection changed");
        }
        Transition {
            state: next,
            selection_changed,
        }
    }

    fn controller<'a>(
        &self,
        simulation: &Simulation,
        config: &'a TimelineConfig,
    ) -> ZoomController<'a> {
        let extent = self.layout(simulation, config).extent();
        ZoomController::new(config, extent, self.viewport)
    }
}
