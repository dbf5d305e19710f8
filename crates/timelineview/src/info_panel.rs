use std::sync::Arc;

use cloudscope_timeline::{
    ChildLink, ItemDetails, ItemKind, ItemRef, Simulation, format_time, resolve_ref,
};
use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::ActiveTheme;

use crate::timeline::ItemSelected;

/// Details of the selected host, VM or cloudlet. Clicking a child link emits
/// [`ItemSelected`] for that child.
pub struct InfoPanel {
    simulation: Arc<Simulation>,
    details: Option<ItemDetails>,
}

impl EventEmitter<ItemSelected> for InfoPanel {}

impl InfoPanel {
    pub fn new(simulation: Arc<Simulation>) -> Self {
        Self {
            simulation,
            details: None,
        }
    }

    pub fn set_simulation(&mut self, simulation: Arc<Simulation>, cx: &mut Context<Self>) {
        self.simulation = simulation;
        self.details = None;
        cx.notify();
    }

    pub fn show(&mut self, item: Option<&ItemRef>, cx: &mut Context<Self>) {
        self.details = item
            .and_then(|item| resolve_ref(item, &self.simulation))
            .map(|selected| ItemDetails::from_selected(&selected));
        cx.notify();
    }

    fn render_link(&self, link: &ChildLink, cx: &mut Context<Self>) -> Div {
        let item = link.item.clone();
        let background = cx.theme().secondary;
        let muted = cx.theme().muted_foreground;
        div()
            .p(px(8.0))
            .rounded(px(6.0))
            .bg(background)
            .cursor_pointer()
            .hover(|this| this.bg(background.opacity(0.6)))
            .flex()
            .items_center()
            .justify_between()
            .child(
                div()
                    .flex()
                    .flex_col()
                    .child(div().font_weight(FontWeight::MEDIUM).child(link.title.clone()))
                    .child(
                        div()
                            .text_size(px(11.0))
                            .text_color(muted)
                            .child(link.subtitle.clone()),
                    ),
            )
            .child(
                div()
                    .text_size(px(11.0))
                    .text_color(muted)
                    .child(link.span.clone()),
            )
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(move |_this, _e: &MouseDownEvent, _w, cx| {
                    cx.emit(ItemSelected(Some(item.clone())));
                }),
            )
    }
}

fn section(title: &'static str) -> Div {
    div()
        .mt(px(12.0))
        .mb(px(4.0))
        .text_size(px(12.0))
        .font_weight(FontWeight::MEDIUM)
        .child(title)
}

impl Render for InfoPanel {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let Some(details) = self.details.clone() else {
            return div()
                .id("info-panel")
                .size_full()
                .flex()
                .items_center()
                .justify_center()
                .text_color(cx.theme().muted_foreground)
                .child("Select a resource to view details");
        };

        let border = cx.theme().border;
        let muted = cx.theme().muted_foreground;
        let card = cx.theme().secondary;

        let facts = details.facts.iter().map(|fact| {
            div()
                .py(px(6.0))
                .flex()
                .justify_between()
                .border_b_1()
                .border_color(border)
                .child(div().text_color(muted).child(fact.label))
                .child(div().font_weight(FontWeight::MEDIUM).child(fact.value.clone()))
        });

        let metrics = details.metrics.iter().map(|metric| {
            div()
                .p(px(8.0))
                .rounded(px(6.0))
                .bg(card)
                .flex()
                .flex_col()
                .gap_1()
                .child(
                    div()
                        .text_size(px(11.0))
                        .text_color(muted)
                        .child(format!("Time: {}", format_time(metric.simulation_time))),
                )
                .child(format!("CPU Utilization {:.1} %", metric.cpu_utilization))
                .child(format!("RAM Usage {:.1} MB", metric.ram_usage))
        });

        let links: Vec<Div> = details
            .children
            .iter()
            .map(|link| self.render_link(link, cx))
            .collect();
        let links_title = match details.item.kind {
            ItemKind::Host => "Virtual Machines",
            ItemKind::Vm => "Cloudlets",
            ItemKind::Cloudlet => "",
        };

        div()
            .id("info-panel")
            .size_full()
            .overflow_y_scroll()
            .p(px(16.0))
            .text_size(px(12.0))
            .text_color(cx.theme().foreground)
            .child(
                div()
                    .text_size(px(16.0))
                    .font_weight(FontWeight::SEMIBOLD)
                    .child(details.title.clone()),
            )
            .child(div().text_color(muted).child(details.description))
            .child(div().mt(px(8.0)).flex().flex_col().children(facts))
            .when(!details.metrics.is_empty(), |this| {
                this.child(section("Metrics"))
                    .child(div().flex().flex_col().gap_2().children(metrics))
            })
            .when(!links.is_empty(), |this| {
                this.child(section(links_title))
                    .child(div().flex().flex_col().gap_2().children(links))
            })
    }
}
