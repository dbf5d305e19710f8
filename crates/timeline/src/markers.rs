//! Time-axis ticks and adaptive label decimation.

/// `(visible slots upper bound, stride)`, checked in order with a strict `<`
const STRIDE_TABLE: [(f64, u32); 4] = [(12.0, 1), (20.0, 2), (60.0, 5), (120.0, 10)];
const WIDEST_STRIDE: u32 = 20;

/// How many one-second slots fit into the available width at this scale
pub fn visible_marker_slots(available_width_px: f64, scale: f64) -> f64 {
    available_width_px / scale
}

/// Seconds between labeled ticks for a given number of visible slots
pub fn decimation_stride(visible_marker_slots: f64) -> u32 {
    STRIDE_TABLE
        .iter()
        .find(|(limit, _)| visible_marker_slots < *limit)
        .map(|(_, stride)| *stride)
        .unwrap_or(WIDEST_STRIDE)
}

/// Last tick of the ruler: the duration rounded up to a multiple of ten
pub fn ruler_end(duration: f64) -> u32 {
    if !duration.is_finite() || duration <= 0.0 {
        return 0;
    }
    ((duration / 10.0).ceil() * 10.0) as u32
}

/// `m:ss`, or `h:m:ss` once the clock passes an hour
pub fn format_clock(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub second: u32,
    /// Content-space x of the gridline
    pub x: f64,
    /// Only decimated ticks carry a label
    pub label: Option<String>,
}

/// Gridlines and labels for the current scale and viewport width.
///
/// Cheap to build; rebuild on every scale or width change instead of caching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ruler {
    pub end: u32,
    pub stride: u32,
    pub scale: f64,
}

impl Ruler {
    pub fn new(duration: f64, available_width_px: f64, scale: f64) -> Self {
        let stride = decimation_stride(visible_marker_slots(available_width_px, scale));
        Self {
            end: ruler_end(duration),
            stride,
            scale,
        }
    }

    pub fn is_labeled(&self, second: u32) -> bool {
        second % self.stride == 0
    }

    fn tick(&self, second: u32) -> Tick {
        Tick {
            second,
            x: second as f64 * self.scale,
            label: self.is_labeled(second).then(|| format_clock(second)),
        }
    }

    /// Every integer second from zero through `end`
    pub fn ticks(&self) -> impl Iterator<Item = Tick> + '_ {
        (0..=self.end).map(|second| self.tick(second))
    }

    /// Ticks intersecting `[scroll_x, scroll_x + viewport_width]`, one slot of slack each side
    pub fn visible_ticks(&self, scroll_x: f64, viewport_width: f64) -> impl Iterator<Item = Tick> + '_ {
        let first = (scroll_x / self.scale).floor().max(1.0) as u32 - 1;
        let last = (((scroll_x + viewport_width) / self.scale).ceil().max(0.0) as u32 + 1).min(self.end);
        (first..=last).map(|second| self.tick(second))
    }

    /// Content width needed to show the full ruler
    pub fn content_width(&self) -> f64 {
        (self.end as f64 + 1.0) * self.scale
    }
}
