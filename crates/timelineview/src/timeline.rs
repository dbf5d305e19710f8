use std::sync::Arc;
use std::time::Instant;

use cloudscope_timeline::{
    BarNode, GesturePhase, ItemRef, Position, Rect, Simulation, Size, TimelineConfig,
    TimelineEvent, TimelineLayout, ViewState, Viewport, format_time,
};
use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::ActiveTheme;
use tracing::debug;

const SLIDER_WIDTH: f32 = 160.0;
/// Bar colours for hosts, VMs and cloudlets
const DEPTH_COLORS: [u32; 3] = [0x3b82f6, 0x10b981, 0xf59e0b];

/// Emitted whenever the selection changes; `None` clears it
#[derive(Clone, Debug, PartialEq)]
pub struct ItemSelected(pub Option<ItemRef>);

pub struct TimelineView {
    simulation: Arc<Simulation>,
    config: TimelineConfig,
    state: ViewState,
    /// Window-space bounds of the scrolling region, ruler included
    bounds: Bounds<Pixels>,
    drag_last: Option<Point<Pixels>>,
    slider_bounds: Bounds<Pixels>,
    slider_dragging: bool,
    /// Set while a recenter animation is scheduled
    last_frame: Option<Instant>,
}

impl EventEmitter<ItemSelected> for TimelineView {}

fn to_f64(value: Pixels) -> f64 {
    (value / px(1.0)) as f64
}

fn to_px(value: f64) -> Pixels {
    px(value as f32)
}

fn position(point: Point<Pixels>) -> Position {
    Position::new(to_f64(point.x), to_f64(point.y))
}

impl TimelineView {
    pub fn new(simulation: Arc<Simulation>, config: TimelineConfig) -> Self {
        Self {
            state: ViewState::new(&config),
            simulation,
            config,
            bounds: Bounds::default(),
            drag_last: None,
            slider_bounds: Bounds::default(),
            slider_dragging: false,
            last_frame: None,
        }
    }

    /// Replaces the trace wholesale and resets zoom, collapse and selection
    pub fn set_simulation(&mut self, simulation: Arc<Simulation>, cx: &mut Context<Self>) {
        self.simulation = simulation;
        self.dispatch(TimelineEvent::SimulationLoaded, cx);
    }

    /// Selection requested from outside the timeline; the bar is scrolled into view
    pub fn select(&mut self, item: Option<ItemRef>, window: &mut Window, cx: &mut Context<Self>) {
        self.dispatch(TimelineEvent::Select(item), cx);
        if let Some(item) = self.state.selection.clone() {
            self.reveal(item, window, cx);
        }
    }

    fn reveal(&mut self, item: ItemRef, window: &mut Window, cx: &mut Context<Self>) {
        self.dispatch(TimelineEvent::Reveal(item), cx);
        if self.state.is_animating() && self.last_frame.is_none() {
            self.last_frame = Some(Instant::now());
            cx.on_next_frame(window, |this, window, cx| this.animate(window, cx));
        }
    }

    fn animate(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let Some(last) = self.last_frame else {
            return;
        };
        if !self.state.is_animating() {
            self.last_frame = None;
            return;
        }
        let now = Instant::now();
        self.last_frame = Some(now);
        self.dispatch(TimelineEvent::AnimationFrame(now - last), cx);
        cx.on_next_frame(window, |this, window, cx| this.animate(window, cx));
    }

    fn dispatch(&mut self, event: TimelineEvent, cx: &mut Context<Self>) {
        let transition = self.state.apply(event, &self.simulation, &self.config);
        self.state = transition.state;
        if transition.selection_changed {
            cx.emit(ItemSelected(self.state.selection.clone()));
        }
        cx.notify();
    }

    fn resize(&mut self, bounds: Bounds<Pixels>, cx: &mut Context<Self>) {
        self.bounds = bounds;
        let gutter = self.config.gutter;
        let ruler = self.config.ruler_height;
        let viewport = Viewport::new(
            Position::new(to_f64(bounds.origin.x) + gutter, to_f64(bounds.origin.y) + ruler),
            Size::new(
                (to_f64(bounds.size.width) - gutter).max(0.0),
                (to_f64(bounds.size.height) - ruler).max(0.0),
            ),
        );
        debug!(width = viewport.size.width, height = viewport.size.height, "timeline resized");
        self.dispatch(TimelineEvent::ViewportResized(viewport), cx);
    }

    fn on_scroll(&mut self, event: &ScrollWheelEvent, _window: &mut Window, cx: &mut Context<Self>) {
        let delta = event.delta.pixel_delta(px(16.0));
        if event.modifiers.control || event.modifiers.platform {
            // One wheel notch (16px) is one zoom factor
            let factor = self.config.wheel_zoom_factor.powf(to_f64(delta.y) / 16.0);
            let phase = match (&event.delta, event.touch_phase) {
                (ScrollDelta::Lines(_), _) | (_, TouchPhase::Ended) => GesturePhase::Ended,
                (_, TouchPhase::Started) => GesturePhase::Started,
                (_, TouchPhase::Moved) => GesturePhase::Moved,
            };
            self.dispatch(
                TimelineEvent::Pinch {
                    factor,
                    focal: position(event.position),
                    phase,
                },
                cx,
            );
        } else {
            let scroll = Position::new(-to_f64(delta.x), -to_f64(delta.y));
            self.dispatch(TimelineEvent::Scrolled(scroll), cx);
        }
    }

    /// Empty space: clears the selection and starts panning
    fn start_drag(&mut self, event: &MouseDownEvent, _window: &mut Window, cx: &mut Context<Self>) {
        self.drag_last = Some(event.position);
        self.dispatch(TimelineEvent::Select(None), cx);
        self.dispatch(
            TimelineEvent::Drag {
                delta: Position::default(),
                phase: GesturePhase::Started,
            },
            cx,
        );
    }

    fn end_drag(&mut self, cx: &mut Context<Self>) {
        self.slider_dragging = false;
        if self.drag_last.take().is_some() {
            self.dispatch(
                TimelineEvent::Drag {
                    delta: Position::default(),
                    phase: GesturePhase::Ended,
                },
                cx,
            );
        }
    }

    fn on_mouse_move(&mut self, event: &MouseMoveEvent, _window: &mut Window, cx: &mut Context<Self>) {
        let pressed = event.pressed_button == Some(MouseButton::Left);
        if !pressed && (self.slider_dragging || self.drag_last.is_some()) {
            self.end_drag(cx);
        }

        if self.slider_dragging {
            self.slide_to(event.position.x, cx);
        } else if let Some(last) = self.drag_last {
            let delta = Position::new(
                to_f64(event.position.x - last.x),
                to_f64(event.position.y - last.y),
            );
            self.drag_last = Some(event.position);
            self.dispatch(
                TimelineEvent::Drag {
                    delta,
                    phase: GesturePhase::Moved,
                },
                cx,
            );
        }

        let pointer = self
            .bounds
            .contains(&event.position)
            .then(|| position(event.position));
        if pointer.is_some() || self.state.cursor.is_some() {
            self.dispatch(TimelineEvent::PointerMoved(pointer), cx);
        }
    }

    fn slide_to(&mut self, x: Pixels, cx: &mut Context<Self>) {
        let width = to_f64(self.slider_bounds.size.width);
        if width <= 0.0 {
            return;
        }
        let fraction = (to_f64(x - self.slider_bounds.origin.x) / width).clamp(0.0, 1.0);
        let scale = self.config.min_scale + fraction * (self.config.max_scale - self.config.min_scale);
        self.dispatch(TimelineEvent::SliderChanged(scale), cx);
    }

    fn render_slider(&self, cx: &mut Context<Self>) -> Div {
        let range = self.config.max_scale - self.config.min_scale;
        let fraction = if range > 0.0 {
            ((self.state.zoom.scale - self.config.min_scale) / range) as f32
        } else {
            0.0
        };
        let entity = cx.entity();
        let tracker = canvas(
            |_bounds, _window, _cx| (),
            move |bounds, _state, _window, cx| {
                cx.update_entity(&entity, |view, _| view.slider_bounds = bounds);
            },
        )
        .absolute()
        .size_full();

        div()
            .relative()
            .w(px(SLIDER_WIDTH))
            .h(px(16.0))
            .flex()
            .items_center()
            .cursor_pointer()
            .child(tracker)
            .child(div().w_full().h(px(4.0)).rounded(px(2.0)).bg(cx.theme().border))
            .child(
                div()
                    .absolute()
                    .left(px(0.0))
                    .w(px(SLIDER_WIDTH * fraction))
                    .h(px(4.0))
                    .rounded(px(2.0))
                    .bg(cx.theme().primary),
            )
            .child(
                div()
                    .absolute()
                    .left(px(SLIDER_WIDTH * fraction - 6.0))
                    .size(px(12.0))
                    .rounded_full()
                    .bg(cx.theme().background)
                    .border_1()
                    .border_color(cx.theme().primary),
            )
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, event: &MouseDownEvent, _window, cx| {
                    cx.stop_propagation();
                    this.slider_dragging = true;
                    this.slide_to(event.position.x, cx);
                }),
            )
    }

    fn render_toolbar(&self, cx: &mut Context<Self>) -> Div {
        let text_color = cx.theme().foreground;
        let border_color = cx.theme().border;
        let hover_color = cx.theme().secondary;

        let zoom_out = parameter_button("-", text_color, border_color, cx, |this, cx| {
            this.dispatch(TimelineEvent::ZoomStep(-1.0), cx);
        });
        let zoom_in = parameter_button("+", text_color, border_color, cx, |this, cx| {
            this.dispatch(TimelineEvent::ZoomStep(1.0), cx);
        });
        let collapse_label = if self.state.collapsed.is_empty() {
            "Collapse all"
        } else {
            "Expand all"
        };
        let collapse_button = div()
            .px(px(8.0))
            .py(px(4.0))
            .text_color(text_color)
            .border(px(1.0))
            .border_color(border_color)
            .rounded(px(4.0))
            .cursor_pointer()
            .hover(|this| this.bg(hover_color))
            .child(collapse_label)
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, _e: &MouseDownEvent, _w, cx| {
                    this.dispatch(TimelineEvent::ToggleAll, cx);
                }),
            );
        let cursor = self
            .state
            .cursor
            .map(|seconds| format!("{} s", format_time(seconds)))
            .unwrap_or_default();

        div()
            .w_full()
            .flex()
            .items_center()
            .gap_2()
            .p(px(8.0))
            .border_b_1()
            .border_color(border_color)
            .text_color(text_color)
            .text_size(px(12.0))
            .child(zoom_out)
            .child(self.render_slider(cx))
            .child(zoom_in)
            .child(format!("{:.0} px/s", self.state.zoom.scale))
            .child(div().w(px(8.0)))
            .child(collapse_button)
            .child(div().flex_1())
            .child(div().text_color(cx.theme().muted_foreground).child(cursor))
    }

    fn render_bar(
        &self,
        depth: usize,
        node: &BarNode,
        scroll: Position,
        cx: &mut Context<Self>,
    ) -> Div {
        let base: Hsla = rgb(DEPTH_COLORS[depth.min(DEPTH_COLORS.len() - 1)]).into();
        let selected = self.state.selection.as_ref() == Some(&node.item);
        let border_color = if selected {
            cx.theme().primary
        } else {
            base.opacity(0.7)
        };
        let bounds = node.hit;
        let row = to_px(self.config.row_height);

        let chevron = node.toggle.as_ref().map(|toggle| {
            let key = toggle.key.clone();
            div()
                .size(row)
                .flex_none()
                .flex()
                .items_center()
                .justify_center()
                .cursor_pointer()
                .when(!toggle.has_children, |this| this.opacity(0.4))
                .child(if toggle.collapsed { "▸" } else { "▾" })
                .on_mouse_down(
                    MouseButton::Left,
                    cx.listener(move |this, _e: &MouseDownEvent, _w, cx| {
                        cx.stop_propagation();
                        this.dispatch(TimelineEvent::ToggleCollapse(key.clone()), cx);
                    }),
                )
        });

        let header = div()
            .h(row)
            .flex()
            .items_center()
            .whitespace_nowrap()
            .text_size(px(11.0))
            .text_color(cx.theme().foreground)
            .when(chevron.is_none(), |this| this.pl(px(6.0)))
            .children(chevron)
            .child(node.label.clone());

        let item = node.item.clone();
        div()
            .absolute()
            .left(to_px(self.config.gutter + bounds.left() - scroll.x))
            .top(to_px(bounds.top() - scroll.y))
            .w(to_px(bounds.size.width))
            .h(to_px(bounds.size.height))
            .bg(base.opacity(0.18))
            .border_1()
            .border_color(border_color)
            .when(selected, |this| this.border_2())
            .rounded(px(3.0))
            .cursor_pointer()
            .child(header)
            // Children are painted later and handle the press first
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(move |this, event: &MouseDownEvent, window, cx| {
                    cx.stop_propagation();
                    if event.click_count >= 2 {
                        this.reveal(item.clone(), window, cx);
                    } else {
                        this.dispatch(TimelineEvent::Select(Some(item.clone())), cx);
                    }
                }),
            )
    }

    /// Tick labels in the ruler strip, plus one gridline per visible second
    fn render_ruler(
        &self,
        layout: &TimelineLayout,
        scroll: Position,
        cx: &mut Context<Self>,
    ) -> (Div, Vec<Div>) {
        let gutter = self.config.gutter;
        let ruler_height = to_px(self.config.ruler_height);
        let width = self.state.viewport.size.width;
        let border = cx.theme().border;

        let mut labels = Vec::new();
        let mut gridlines = Vec::new();
        for tick in layout.ruler.visible_ticks(scroll.x, width) {
            let x = gutter + tick.x - scroll.x;
            gridlines.push(
                div()
                    .absolute()
                    .left(to_px(x))
                    .top(px(0.0))
                    .bottom(px(0.0))
                    .w(px(1.0))
                    .bg(if tick.label.is_some() {
                        border
                    } else {
                        border.opacity(0.4)
                    }),
            );
            if let Some(label) = tick.label {
                labels.push(
                    div()
                        .absolute()
                        .left(to_px(x - 30.0))
                        .w(px(60.0))
                        .top(px(0.0))
                        .h(ruler_height)
                        .flex()
                        .items_center()
                        .justify_center()
                        .whitespace_nowrap()
                        .child(label),
                );
            }
        }

        let ruler = div()
            .absolute()
            .top(px(0.0))
            .left(px(0.0))
            .right(px(0.0))
            .h(ruler_height)
            .bg(cx.theme().background)
            .border_b_1()
            .border_color(border)
            .text_size(px(11.0))
            .text_color(cx.theme().muted_foreground)
            .children(labels);
        (ruler, gridlines)
    }
}

fn parameter_button<F>(
    label: &str,
    text_color: Hsla,
    border_color: Hsla,
    cx: &mut Context<TimelineView>,
    on_press: F,
) -> Div
where
    F: Fn(&mut TimelineView, &mut Context<TimelineView>) + 'static,
{
    div()
        .child(label.to_string())
        .px(px(8.0))
        .py(px(2.0))
        .text_color(text_color)
        .border(px(1.0))
        .border_color(border_color)
        .rounded(px(4.0))
        .cursor_pointer()
        .on_mouse_down(
            MouseButton::Left,
            cx.listener(move |this, _event: &MouseDownEvent, _window, cx| {
                on_press(this, cx);
            }),
        )
}

impl Render for TimelineView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let layout = self.state.layout(&self.simulation, &self.config);
        let scroll = self.state.zoom.scroll;
        let viewport = self.state.viewport;

        // Keep the viewport in sync with the region's on-screen bounds
        let entity = cx.entity();
        let bounds_tracker = canvas(
            |_bounds, _window, _cx| (),
            move |bounds, _state, _window, cx| {
                cx.update_entity(&entity, |view, cx| {
                    if view.bounds != bounds {
                        view.resize(bounds, cx);
                    }
                });
            },
        )
        .absolute()
        .size_full();

        let visible = Rect::new(scroll.x, scroll.y, viewport.size.width, viewport.size.height);
        let bars: Vec<Div> = layout
            .iter()
            .filter(|(_, node)| node.hit.intersects(&visible))
            .map(|(depth, node)| self.render_bar(depth, node, scroll, cx))
            .collect();
        let (ruler, gridlines) = self.render_ruler(&layout, scroll, cx);

        let cursor_line = self.state.cursor.map(|seconds| {
            div()
                .absolute()
                .left(to_px(self.config.gutter + seconds * self.state.zoom.scale - scroll.x))
                .top(px(0.0))
                .bottom(px(0.0))
                .w(px(1.0))
                .bg(cx.theme().primary.opacity(0.6))
        });

        // Bars are clipped below the ruler so nothing scrolled under it takes clicks
        let body = div()
            .absolute()
            .top(to_px(self.config.ruler_height))
            .left(px(0.0))
            .right(px(0.0))
            .bottom(px(0.0))
            .overflow_hidden()
            .children(gridlines)
            .children(bars);

        let region = div()
            .relative()
            .flex_1()
            .w_full()
            .overflow_hidden()
            .cursor(if self.drag_last.is_some() {
                CursorStyle::ClosedHand
            } else {
                CursorStyle::Arrow
            })
            .on_mouse_down(MouseButton::Left, cx.listener(Self::start_drag))
            .on_scroll_wheel(cx.listener(Self::on_scroll))
            .child(bounds_tracker)
            .child(body)
            .child(ruler)
            .children(cursor_line);

        div()
            .size_full()
            .flex()
            .flex_col()
            .bg(cx.theme().background)
            .on_mouse_move(cx.listener(Self::on_mouse_move))
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, _e: &MouseUpEvent, _w, cx| this.end_drag(cx)),
            )
            .child(self.render_toolbar(cx))
            .child(region)
    }
}
