// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene configuration.

use std::time::Duration;

use lamina_render::Propagation;

/// Environment variable enabling the FPS overlay, in seconds per update.
pub const SHOW_FPS_ENV: &str = "LAMINA_SHOW_FPS";

/// Configuration for a [`CompositingScene`](crate::CompositingScene).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConfig {
    /// Whether painting starts enabled.
    pub active: bool,
    /// How commit damage is reported to the client.
    pub damage_propagation: Propagation,
    /// Update interval of the FPS overlay, or `None` to disable it.
    pub fps_interval: Option<Duration>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            active: false,
            damage_propagation: Propagation::None,
            fps_interval: None,
        }
    }
}

impl SceneConfig {
    /// Painting enabled, no damage reporting, no overlay.
    pub const ACTIVE: Self = Self {
        active: true,
        damage_propagation: Propagation::None,
        fps_interval: None,
    };

    /// Returns this config with the given damage propagation.
    #[must_use]
    pub const fn with_damage_propagation(mut self, propagation: Propagation) -> Self {
        self.damage_propagation = propagation;
        self
    }

    /// Returns this config with the FPS overlay updating every `interval`.
    #[must_use]
    pub const fn with_fps_interval(mut self, interval: Duration) -> Self {
        self.fps_interval = Some(interval);
        self
    }

    /// Returns the default config, with the FPS overlay taken from
    /// [`SHOW_FPS_ENV`].
    #[must_use]
    pub fn from_env() -> Self {
        let fps_interval = std::env::var(SHOW_FPS_ENV)
            .ok()
            .and_then(|v| parse_fps_interval(&v));
        Self {
            fps_interval,
            ..Self::default()
        }
    }
}

/// Parses a positive number of seconds.
fn parse_fps_interval(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if !(secs.is_finite() && secs > 0.0) {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_inactive_without_damage() {
        let config = SceneConfig::default();
        assert!(!config.active);
        assert_eq!(config.damage_propagation, Propagation::None);
        assert_eq!(config.fps_interval, None);
    }

    #[test]
    fn fps_interval_parsing() {
        assert_eq!(parse_fps_interval("1"), Some(Duration::from_secs(1)));
        assert_eq!(parse_fps_interval(" 0.5 "), Some(Duration::from_millis(500)));
        assert_eq!(parse_fps_interval("0"), None);
        assert_eq!(parse_fps_interval("-2"), None);
        assert_eq!(parse_fps_interval("inf"), None);
        assert_eq!(parse_fps_interval("yes"), None);
    }
}
