//! Conversions between simulated seconds and horizontal pixels.
//!
//! `scale` is always pixels per simulated second and strictly positive; the
//! zoom controller is the only producer of scales and clamps them first.

use serde::{Deserialize, Serialize};

use crate::model::Lifetime;

/// How a `[start, end)` interval turns into a bar width
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarConvention {
    /// `(end - start - 1) * scale`: the final sampled instant is not drawn,
    /// leaving a one-second gap between back-to-back entities.
    #[default]
    ExclusiveFinalInstant,
    /// `(end - start) * scale`
    Exact,
}

/// Horizontal placement of a lifetime bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarSpan {
    pub offset: f64,
    pub width: f64,
}

pub fn to_pixels(seconds: f64, scale: f64) -> f64 {
    seconds * scale
}

pub fn to_seconds(pixels: f64, scale: f64) -> f64 {
    pixels / scale
}

/// Pixel width of `[start, end)`; never negative, even for inverted intervals
pub fn bar_width(start: f64, end: f64, scale: f64, convention: BarConvention) -> f64 {
    let seconds = match convention {
        BarConvention::ExclusiveFinalInstant => end - start - 1.0,
        BarConvention::Exact => end - start,
    };
    (seconds * scale).max(0.0)
}

/// Places an interval whose end may still be open; open ends run to `duration`
pub fn bar_span(
    start: f64,
    end: Option<f64>,
    duration: f64,
    scale: f64,
    convention: BarConvention,
) -> BarSpan {
    let end = end.unwrap_or(duration);
    BarSpan {
        offset: to_pixels(start, scale),
        width: bar_width(start, end, scale, convention),
    }
}

pub fn lifetime_span(
    entity: &impl Lifetime,
    duration: f64,
    scale: f64,
    convention: BarConvention,
) -> BarSpan {
    bar_span(entity.start(), entity.end(), duration, scale, convention)
}

/// Simulation time under a screen x coordinate
pub fn time_at(screen_x: f64, viewport_origin_x: f64, scroll_x: f64, scale: f64) -> f64 {
    to_seconds(screen_x - viewport_origin_x + scroll_x, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for scale in [20.0, 37.5, 50.0, 133.3, 200.0] {
            for seconds in [0.0, 0.1, 1.0, 9.99, 95.0, 3600.0, 86_400.5] {
                let back = to_seconds(to_pixels(seconds, scale), scale);
                assert!((back - seconds).abs() < 1e-9, "{seconds} @ {scale} -> {back}");
            }
        }
    }

    #[test]
    fn test_exclusive_final_instant() {
        let span = bar_span(2.0, Some(10.0), 100.0, 50.0, BarConvention::ExclusiveFinalInstant);
        assert_eq!(span.offset, 100.0);
        assert_eq!(span.width, 350.0);
    }

    #[test]
    fn test_exact_convention() {
        let span = bar_span(2.0, Some(10.0), 100.0, 50.0, BarConvention::Exact);
        assert_eq!(span.width, 400.0);
    }

    #[test]
    fn test_open_end_runs_to_duration() {
        let span = bar_span(10.0, None, 95.0, 20.0, BarConvention::ExclusiveFinalInstant);
        assert_eq!(span.offset, 200.0);
        assert_eq!(span.width, (95.0 - 10.0 - 1.0) * 20.0);
    }

    #[test]
    fn test_width_never_negative() {
        for convention in [BarConvention::ExclusiveFinalInstant, BarConvention::Exact] {
            // identical, sub-second, and inverted intervals
            for (start, end) in [(5.0, 5.0), (5.0, 5.5), (5.0, 6.0), (9.0, 3.0)] {
                let width = bar_width(start, end, 50.0, convention);
                assert!(width >= 0.0, "{start}..{end} {convention:?} -> {width}");
            }
        }
        assert_eq!(bar_width(5.0, 5.0, 50.0, BarConvention::ExclusiveFinalInstant), 0.0);
        assert_eq!(bar_width(9.0, 3.0, 50.0, BarConvention::Exact), 0.0);
    }

    #[test]
    fn test_time_at_pointer() {
        // 30px into a viewport at x=100, scrolled 470px, 50px/s -> 10s
        assert_eq!(time_at(130.0, 100.0, 470.0, 50.0), 10.0);
    }
}
