mod info_panel;
mod timeline;

pub use info_panel::InfoPanel;
pub use timeline::{ItemSelected, TimelineView};
