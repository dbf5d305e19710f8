use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TraceError;
use crate::mapper::BarConvention;

/// Tunables for the timeline. Every field has a default, so a config file only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Pixels per simulated second
    pub min_scale: f64,
    pub max_scale: f64,
    pub default_scale: f64,
    /// Scale change of the zoom buttons
    pub zoom_step: f64,
    /// Multiplicative scale change per wheel notch while pinching
    pub wheel_zoom_factor: f64,
    pub row_height: f64,
    /// Narrowest clickable bar, so instantaneous lifetimes can be selected
    pub min_hit_width: f64,
    pub row_gap: f64,
    pub bar_padding: f64,
    pub host_gap: f64,
    pub ruler_height: f64,
    /// Space left of second zero so the first label is not clipped
    pub gutter: f64,
    pub bar_convention: BarConvention,
    pub transition_ms: u64,
    pub interactive_transition_ms: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_scale: 20.0,
            max_scale: 200.0,
            default_scale: 50.0,
            zoom_step: 10.0,
            wheel_zoom_factor: 1.1,
            row_height: 28.0,
            min_hit_width: 8.0,
            row_gap: 8.0,
            bar_padding: 4.0,
            host_gap: 16.0,
            ruler_height: 32.0,
            gutter: 16.0,
            bar_convention: BarConvention::default(),
            transition_ms: 240,
            interactive_transition_ms: 60,
        }
    }
}

impl TimelineConfig {
    pub fn from_json(content: &str) -> Result<Self, TraceError> {
        let config: Self = serde_json::from_str(content)?;
        if let Err(err) = config.validate() {
            warn!(%err, "rejecting timeline config");
            return Err(err);
        }
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), TraceError> {
        if self.min_scale.is_nan() || self.min_scale <= 0.0 {
            return Err(TraceError::Config(format!(
                "min_scale must be positive, got {}",
                self.min_scale
            )));
        }
        if self.min_scale > self.max_scale {
            return Err(TraceError::Config(format!(
                "min_scale {} exceeds max_scale {}",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.min_scale..=self.max_scale).contains(&self.default_scale) {
            return Err(TraceError::Config(format!(
                "default_scale {} outside {}..={}",
                self.default_scale, self.min_scale, self.max_scale
            )));
        }
        if self.wheel_zoom_factor.is_nan() || self.wheel_zoom_factor <= 1.0 {
            return Err(TraceError::Config(format!(
                "wheel_zoom_factor must be greater than 1, got {}",
                self.wheel_zoom_factor
            )));
        }
        if self.row_height <= 0.0 {
            return Err(TraceError::Config("row_height must be positive".into()));
        }
        if self.min_hit_width.is_nan() || self.min_hit_width < 0.0 {
            return Err(TraceError::Config(format!(
                "min_hit_width must not be negative, got {}",
                self.min_hit_width
            )));
        }
        Ok(())
    }

    pub fn clamp_scale(&self, scale: f64) -> f64 {
        if scale.is_nan() {
            return self.default_scale;
        }
        scale.clamp(self.min_scale, self.max_scale)
    }

    pub fn transition(&self, interacting: bool) -> Duration {
        if interacting {
            Duration::from_millis(self.interactive_transition_ms)
        } else {
            Duration::from_millis(self.transition_ms)
        }
    }
}
