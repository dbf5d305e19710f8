//! Engine behind the cloudscope timeline: maps a recorded simulation onto
//! nested lifetime bars and a time ruler, and folds every user input into a
//! [`ViewState`]. Nothing here depends on a UI toolkit.

mod collapse;
mod config;
mod details;
mod error;
mod layout;
mod mapper;
mod markers;
mod model;
mod selection;
mod state;
mod svg;
mod types;
mod zoom;

pub use collapse::{CollapseStore, NodeKey};
pub use config::TimelineConfig;
pub use details::{ChildLink, Fact, ItemDetails, format_time};
pub use error::TraceError;
pub use layout::{BarNode, Hit, TimelineLayout, Toggle};
pub use mapper::{BarConvention, BarSpan, bar_span, bar_width, lifetime_span, time_at, to_pixels, to_seconds};
pub use markers::{Ruler, Tick, decimation_stride, format_clock, ruler_end, visible_marker_slots};
pub use model::{Cloudlet, Host, Lifetime, Metric, OrphanCloudlet, Simulation, Vm};
pub use selection::{EntityIndex, ItemKind, ItemRef, Selected, resolve, resolve_ref};
pub use state::{ActiveTween, GesturePhase, TimelineEvent, Transition, ViewState};
pub use svg::{render_svg, write_svg};
pub use types::{Position, Rect, Size};
pub use zoom::{ContentExtent, ScrollTween, Viewport, ZoomController, ZoomState, focal_scroll};
