//! Scale and scroll handling for the timeline.
//!
//! All functions take absolute values (current scale, current scroll) and
//! return new absolute values, so calling them once per input event never
//! accumulates error.

use std::time::Duration;

use tracing::debug;

use crate::config::TimelineConfig;
use crate::types::{Position, Size};

/// The scrolling region on screen. `origin` is where content x = 0 is drawn
/// when unscrolled (any fixed gutter is already added in).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub origin: Position,
    pub size: Size,
}

impl Viewport {
    pub fn new(origin: Position, size: Size) -> Self {
        Self { origin, size }
    }
}

/// Scrollable extent of the content: horizontally in seconds (it scales),
/// vertically in pixels (it does not).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContentExtent {
    pub seconds: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    /// Pixels per simulated second
    pub scale: f64,
    pub scroll: Position,
    /// A pinch or drag is in progress; only shortens transitions
    pub is_interacting: bool,
}

impl ZoomState {
    pub fn new(config: &TimelineConfig) -> Self {
        Self {
            scale: config.clamp_scale(config.default_scale),
            scroll: Position::default(),
            is_interacting: false,
        }
    }

    pub fn transition(&self, config: &TimelineConfig) -> Duration {
        config.transition(self.is_interacting)
    }
}

/// Scroll offset that keeps the content under `focal` fixed while the scale
/// changes from `old_scale` to `new_scale`. Unclamped.
pub fn focal_scroll(
    old_scale: f64,
    new_scale: f64,
    focal: f64,
    viewport_origin: f64,
    current_scroll: f64,
) -> f64 {
    let logical = (focal - viewport_origin + current_scroll) / old_scale;
    logical * new_scale - (focal - viewport_origin)
}

/// Binds the zoom math to one configuration, content size and viewport
pub struct ZoomController<'a> {
    pub config: &'a TimelineConfig,
    pub extent: ContentExtent,
    pub viewport: Viewport,
}

impl<'a> ZoomController<'a> {
    pub fn new(config: &'a TimelineConfig, extent: ContentExtent, viewport: Viewport) -> Self {
        Self {
            config,
            extent,
            viewport,
        }
    }

    pub fn max_scroll(&self, scale: f64) -> Position {
        Position::new(
            (self.extent.seconds * scale - self.viewport.size.width).max(0.0),
            (self.extent.height - self.viewport.size.height).max(0.0),
        )
    }

    pub fn clamp_scroll(&self, scroll: Position, scale: f64) -> Position {
        let max = self.max_scroll(scale);
        Position::new(scroll.x.clamp(0.0, max.x), scroll.y.clamp(0.0, max.y))
    }

    /// Slider path: clamps the scale and keeps the time at the left edge in place
    pub fn set_scale_absolute(&self, state: &ZoomState, new_scale: f64) -> ZoomState {
        let scale = self.config.clamp_scale(new_scale);
        let x = focal_scroll(
            state.scale,
            scale,
            self.viewport.origin.x,
            self.viewport.origin.x,
            state.scroll.x,
        );
        debug!(from = state.scale, to = scale, "scale set");
        ZoomState {
            scale,
            scroll: self.clamp_scroll(Position::new(x, state.scroll.y), scale),
            ..*state
        }
    }

    /// Zoom buttons: additive step around the viewport centre
    pub fn step(&self, state: &ZoomState, delta: f64) -> ZoomState {
        let centre = Position::new(
            self.viewport.origin.x + self.viewport.size.width / 2.0,
            self.viewport.origin.y,
        );
        let target = self.config.clamp_scale(state.scale + delta);
        self.zoom_at_focal_point(state, target / state.scale, centre, self.viewport.origin, state.scroll)
    }

    /// Pinch and ctrl-wheel path. The content under `focal` stays under it
    /// unless the result has to be clamped at the content edges.
    pub fn zoom_at_focal_point(
        &self,
        state: &ZoomState,
        delta_scale_factor: f64,
        focal: Position,
        viewport_origin: Position,
        current_scroll: Position,
    ) -> ZoomState {
        let old_scale = state.scale;
        let new_scale = self.config.clamp_scale(old_scale * delta_scale_factor);
        let x = focal_scroll(old_scale, new_scale, focal.x, viewport_origin.x, current_scroll.x);
        let scroll = self.clamp_scroll(Position::new(x, current_scroll.y), new_scale);
        debug!(
            from = old_scale,
            to = new_scale,
            focal_x = focal.x,
            scroll_x = scroll.x,
            "zoom at focal point"
        );
        ZoomState {
            scale: new_scale,
            scroll,
            ..*state
        }
    }

    pub fn pan_by(&self, state: &ZoomState, delta: Position) -> ZoomState {
        let scroll = Position::new(state.scroll.x + delta.x, state.scroll.y + delta.y);
        ZoomState {
            scroll: self.clamp_scroll(scroll, state.scale),
            ..*state
        }
    }

    /// Scroll offset putting `target` (x in seconds, y in content pixels) at
    /// the viewport centre
    pub fn recenter_target(&self, state: &ZoomState, target: Position) -> Position {
        let scroll = Position::new(
            target.x * state.scale - self.viewport.size.width / 2.0,
            target.y - self.viewport.size.height / 2.0,
        );
        self.clamp_scroll(scroll, state.scale)
    }

    /// Smooth scroll towards `target`; sample the tween once per frame
    pub fn recenter_on(&self, state: &ZoomState, target: Position) -> ScrollTween {
        ScrollTween {
            from: state.scroll,
            to: self.recenter_target(state, target),
            duration: state.transition(self.config),
        }
    }

    /// Re-clamps after the viewport or content changed size
    pub fn refit(&self, state: &ZoomState) -> ZoomState {
        ZoomState {
            scroll: self.clamp_scroll(state.scroll, state.scale),
            ..*state
        }
    }
}

/// Eased interpolation between two scroll offsets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTween {
    pub from: Position,
    pub to: Position,
    pub duration: Duration,
}

impl ScrollTween {
    pub fn sample(&self, elapsed: Duration) -> Position {
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        // ease-out cubic
        let eased = 1.0 - (1.0 - t).powi(3);
        Position::new(
            self.from.x + (self.to.x - self.from.x) * eased,
            self.from.y + (self.to.y - self.from.y) * eased,
        )
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(config: &TimelineConfig) -> ZoomController<'_> {
        ZoomController::new(
            config,
            ContentExtent {
                seconds: 101.0,
                height: 900.0,
            },
            Viewport::new(Position::new(100.0, 40.0), Size::new(800.0, 400.0)),
        )
    }

    fn state(scale: f64, scroll_x: f64) -> ZoomState {
        ZoomState {
            scale,
            scroll: Position::new(scroll_x, 0.0),
            is_interacting: false,
        }
    }

    fn logical_under(state: &ZoomState, focal_x: f64, origin_x: f64) -> f64 {
        (focal_x - origin_x + state.scroll.x) / state.scale
    }

    #[test]
    fn test_focal_point_is_stationary() {
        let config = TimelineConfig::default();
        let zoom = controller(&config);
        let before = state(50.0, 1200.0);
        let focal = Position::new(430.0, 200.0);

        for factor in [1.1, 0.9, 1.5, 0.75, 2.0] {
            let after = zoom.zoom_at_focal_point(&before, factor, focal, zoom.viewport.origin, before.scroll);
            let drift = (logical_under(&after, focal.x, 100.0) - logical_under(&before, focal.x, 100.0))
                * after.scale;
            assert!(drift.abs() < 1.0, "factor {factor} drifted {drift}px");
        }
    }

    #[test]
    fn test_repeated_zoom_converges() {
        let config = TimelineConfig::default();
        let zoom = controller(&config);
        let focal = Position::new(500.0, 100.0);
        let mut current = state(50.0, 600.0);
        let anchor = logical_under(&current, focal.x, 100.0);
        for _ in 0..40 {
            current = zoom.zoom_at_focal_point(&current, 1.1, focal, zoom.viewport.origin, current.scroll);
        }
        // Pinned at max scale and the same content still under the pointer
        assert_eq!(current.scale, 200.0);
        let drift = (logical_under(&current, focal.x, 100.0) - anchor) * current.scale;
        assert!(drift.abs() < 1.0);
    }

    #[test]
    fn test_scale_is_clamped() {
        let config = TimelineConfig::default();
        let zoom = controller(&config);
        let start = state(50.0, 0.0);
        assert_eq!(zoom.set_scale_absolute(&start, 1.0).scale, 20.0);
        assert_eq!(zoom.set_scale_absolute(&start, 900.0).scale, 200.0);
        let out = zoom.zoom_at_focal_point(&start, 0.01, Position::new(300.0, 0.0), zoom.viewport.origin, start.scroll);
        assert_eq!(out.scale, 20.0);
    }

    #[test]
    fn test_scroll_clamped_to_content() {
        let config = TimelineConfig::default();
        let zoom = controller(&config);
        // content 101s * 50 = 5050px, viewport 800px
        let at_end = zoom.pan_by(&state(50.0, 4000.0), Position::new(5000.0, 5000.0));
        assert_eq!(at_end.scroll, Position::new(4250.0, 500.0));
        let at_start = zoom.pan_by(&state(50.0, 100.0), Position::new(-500.0, -10.0));
        assert_eq!(at_start.scroll, Position::new(0.0, 0.0));
    }

    #[test]
    fn test_narrow_content_pins_to_zero() {
        let config = TimelineConfig::default();
        let zoom = ZoomController::new(
            &config,
            ContentExtent {
                seconds: 5.0,
                height: 10.0,
            },
            Viewport::new(Position::default(), Size::new(800.0, 400.0)),
        );
        let out = zoom.zoom_at_focal_point(&state(50.0, 0.0), 1.5, Position::new(700.0, 0.0), Position::default(), Position::default());
        assert_eq!(out.scroll.x, 0.0);
    }

    #[test]
    fn test_slider_keeps_left_edge_time() {
        let config = TimelineConfig::default();
        let zoom = controller(&config);
        let before = state(50.0, 1000.0); // left edge at 20s
        let after = zoom.set_scale_absolute(&before, 100.0);
        assert_eq!(after.scroll.x, 2000.0);
    }

    #[test]
    fn test_step_zoom() {
        let config = TimelineConfig::default();
        let zoom = controller(&config);
        let after = zoom.step(&state(50.0, 0.0), 10.0);
        assert!((after.scale - 60.0).abs() < 1e-9);
        let floor = zoom.step(&state(20.0, 0.0), -10.0);
        assert_eq!(floor.scale, 20.0);
    }

    #[test]
    fn test_recenter() {
        let config = TimelineConfig::default();
        let zoom = controller(&config);
        let current = state(50.0, 0.0);
        let target = zoom.recenter_target(&current, Position::new(40.0, 450.0));
        assert_eq!(target, Position::new(1600.0, 250.0));

        let tween = zoom.recenter_on(&current, Position::new(40.0, 450.0));
        assert_eq!(tween.sample(Duration::ZERO), current.scroll);
        assert_eq!(tween.sample(tween.duration), target);
        let halfway = tween.sample(tween.duration / 2);
        assert!(halfway.x > 800.0 && halfway.x < 1600.0);
    }

    #[test]
    fn test_interaction_shortens_tween() {
        let config = TimelineConfig::default();
        let zoom = controller(&config);
        let mut current = state(50.0, 0.0);
        let relaxed = zoom.recenter_on(&current, Position::new(10.0, 0.0)).duration;
        current.is_interacting = true;
        let busy = zoom.recenter_on(&current, Position::new(10.0, 0.0)).duration;
        assert!(busy < relaxed);
    }
}
