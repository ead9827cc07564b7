//! Timer configuration
//!
//! All process-wide settings (colour, bell mode, phase lengths) live here and
//! are handed to the components at startup. Nothing is read from files.

use serde::Serialize;
use std::io::IsTerminal;
use std::time::Duration;
use tracing::warn;

use crate::alert::{AlertSpec, BellMode};
use crate::render::DEFAULT_BAR_WIDTH;

/// Environment variable overriding the platform bell mode
pub const BELL_ENV: &str = "POMODORO_BELL";

/// Environment variable disabling colour output
pub const NO_COLOR_ENV: &str = "NO_COLOR";

/// Effective settings for one run of the timer
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Length of a work phase
    pub work: Duration,
    /// Length of a short break
    pub short_break: Duration,
    /// Length of a long break
    pub long_break: Duration,
    /// Every Nth break is a long one
    pub long_break_every: u64,
    /// Upper bound on the progress bar width in cells
    pub bar_width: usize,
    /// Emit ANSI colour codes
    pub color: bool,
    pub bell: BellMode,
    pub work_alert: AlertSpec,
    pub short_break_alert: AlertSpec,
    pub long_break_alert: AlertSpec,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work: Duration::from_secs(25 * 60),
            short_break: Duration::from_secs(5 * 60),
            long_break: Duration::from_secs(15 * 60),
            long_break_every: 4,
            bar_width: DEFAULT_BAR_WIDTH,
            color: false,
            bell: BellMode::platform_default(),
            work_alert: AlertSpec::new(1, 800, 400, 0.08),
            short_break_alert: AlertSpec::new(1, 900, 170, 0.06),
            long_break_alert: AlertSpec::new(1, 950, 200, 0.07),
        }
    }
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(std::io::stdout().is_terminal(), |key| {
            std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
        })
    }

    /// Build the configuration from a TTY flag and a variable lookup.
    ///
    /// Colour is enabled when `is_tty` holds and `NO_COLOR` is unset.
    /// An unparseable `POMODORO_BELL` is reported and ignored.
    pub fn from_lookup(is_tty: bool, var: impl Fn(&str) -> Option<String>) -> Self {
        let color = is_tty && var(NO_COLOR_ENV).is_none();
        let bell = match var(BELL_ENV) {
            Some(value) => value.parse::<BellMode>().unwrap_or_else(|e| {
                warn!("{}; using platform default", e);
                BellMode::platform_default()
            }),
            None => BellMode::platform_default(),
        };

        Self {
            color,
            bell,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_durations() {
        let config = Config::default();
        assert_eq!(config.work.as_secs(), 1500);
        assert_eq!(config.short_break.as_secs(), 300);
        assert_eq!(config.long_break.as_secs(), 900);
        assert_eq!(config.long_break_every, 4);
        assert_eq!(config.bar_width, 40);
    }

    #[test]
    fn test_phase_alerts() {
        let config = Config::default();
        assert_eq!(config.work_alert.frequency_hz, 800);
        assert_eq!(config.work_alert.duration_ms, 400);
        assert_eq!(config.short_break_alert.frequency_hz, 900);
        assert_eq!(config.long_break_alert.frequency_hz, 950);
        assert_eq!(config.long_break_alert.repeat, 1);
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_bell_env_override() {
        let config = Config::from_lookup(true, lookup(&[(BELL_ENV, "off")]));
        assert_eq!(config.bell, BellMode::Off);

        let config = Config::from_lookup(true, lookup(&[(BELL_ENV, "Auto")]));
        assert_eq!(config.bell, BellMode::Auto);

        let config = Config::from_lookup(true, lookup(&[]));
        assert_eq!(config.bell, BellMode::platform_default());
    }

    #[test]
    fn test_invalid_bell_env_falls_back() {
        let config = Config::from_lookup(true, lookup(&[(BELL_ENV, "loud")]));
        assert_eq!(config.bell, BellMode::platform_default());
    }

    #[test]
    fn test_no_color_disables_color() {
        assert!(Config::from_lookup(true, lookup(&[])).color);
        let config = Config::from_lookup(true, lookup(&[(NO_COLOR_ENV, "1")]));
        assert!(!config.color);
        assert!(!Config::from_lookup(false, lookup(&[])).color);
    }

    #[test]
    fn test_config_serializes() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("\"long_break_every\":4"));
        assert!(json.contains("\"bell\""));
    }
}
