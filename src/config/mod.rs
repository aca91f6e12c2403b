mod cli;
mod file;
mod mode;

pub use cli::Cli;
pub use mode::{Mode, ScrollAxisPriority};

use std::path::PathBuf;

use crate::error::ConfigError;
use file::FileConfig;

/// Per-side edge thresholds, resolved from `edge_threshold` plus overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Thresholds {
    fn min(&self) -> f64 {
        self.left.min(self.right).min(self.top).min(self.bottom)
    }
}

/// Fully merged, validated configuration. Constructed once at startup and
/// read-only thereafter (§3 Lifecycles).
#[derive(Debug, Clone)]
pub struct Config {
    pub edge_threshold: f64,
    pub thresholds: Thresholds,
    pub edge_hysteresis: f64,
    pub hold_ms: u64,
    pub pulse_ms: u64,
    pub pulse_step: f64,
    pub max_speed: f64,
    pub mode: Mode,
    pub natural_scroll: bool,
    pub diagonal_scroll: bool,
    pub two_finger_scroll: bool,
    pub scroll_axis_priority: ScrollAxisPriority,
    pub deadzone: f64,
    pub accel_exponent: f64,
    pub pressure_boost: f64,
    pub button_zone: f64,
    pub button_cooldown_ms: u64,
    pub grab: bool,
    pub forced_devnode: Option<PathBuf>,
    pub ignored_devnodes: Vec<PathBuf>,
    pub verbose: bool,
}

impl Config {
    /// Merge CLI args over the config file over built-in defaults, per
    /// spec.md §6: `$HOME/.config/edge-motion.conf` loads first, then an
    /// explicit `--config PATH` overrides its fields, then CLI flags
    /// override both.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut file_config = FileConfig::default();

        if let Some(home_path) = file::default_config_path() {
            if let Some(loaded) = file::load_from_path(&home_path)? {
                file_config = loaded;
            }
        }

        if let Some(explicit_path) = &cli.config {
            if let Some(loaded) = file::load_from_path(explicit_path)? {
                file_config = merge_file_configs(file_config, loaded);
            }
        }

        Ok(Self::merge(cli, &file_config))
    }

    fn merge(cli: &Cli, file: &FileConfig) -> Self {
        let edge_threshold = cli.edge_threshold.or(file.edge_threshold).unwrap_or(0.06);

        let thresholds = Thresholds {
            left: cli.threshold_left.or(file.threshold_left).unwrap_or(edge_threshold),
            right: cli.threshold_right.or(file.threshold_right).unwrap_or(edge_threshold),
            top: cli.threshold_top.or(file.threshold_top).unwrap_or(edge_threshold),
            bottom: cli.threshold_bottom.or(file.threshold_bottom).unwrap_or(edge_threshold),
        };

        Self {
            edge_threshold,
            thresholds,
            edge_hysteresis: cli.edge_hysteresis.or(file.edge_hysteresis).unwrap_or(0.015),
            hold_ms: cli.hold_ms.or(file.hold_ms).unwrap_or(80),
            pulse_ms: cli.pulse_ms.or(file.pulse_ms).unwrap_or(10),
            pulse_step: cli.pulse_step.or(file.pulse_step).unwrap_or(1.5),
            max_speed: cli.max_speed.or(file.max_speed).unwrap_or(3.0),
            mode: cli.mode.or(file.mode).unwrap_or_default(),
            natural_scroll: resolve_bool(cli.natural_scroll, cli.no_natural_scroll, file.natural_scroll, false),
            diagonal_scroll: resolve_bool(cli.diagonal_scroll, cli.no_diagonal_scroll, file.diagonal_scroll, false),
            two_finger_scroll: resolve_bool(
                cli.two_finger_scroll,
                cli.no_two_finger_scroll,
                file.two_finger_scroll,
                false,
            ),
            scroll_axis_priority: cli.scroll_axis_priority.or(file.scroll_axis_priority).unwrap_or_default(),
            deadzone: cli.deadzone.or(file.deadzone).unwrap_or(0.0),
            accel_exponent: cli.accel_exponent.or(file.accel_exponent).unwrap_or(1.0),
            pressure_boost: cli.pressure_boost.or(file.pressure_boost).unwrap_or(0.0),
            button_zone: cli.button_zone.or(file.button_zone).unwrap_or(0.14),
            button_cooldown_ms: cli.button_cooldown_ms.or(file.button_cooldown_ms).unwrap_or(180),
            grab: resolve_bool(cli.grab, cli.no_grab, file.grab, false),
            forced_devnode: cli.forced_devnode.clone().or_else(|| file.forced_devnode.clone()),
            ignored_devnodes: if !cli.ignored_devnodes.is_empty() {
                cli.ignored_devnodes.clone()
            } else {
                file.ignored_devnodes.clone()
            },
            verbose: cli.verbose,
        }
    }

    /// Validate every range/relationship rule in spec.md §3's option table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("edge_threshold", self.edge_threshold, 0.01, 0.5)?;
        for (name, value) in [
            ("threshold_left", self.thresholds.left),
            ("threshold_right", self.thresholds.right),
            ("threshold_top", self.thresholds.top),
            ("threshold_bottom", self.thresholds.bottom),
        ] {
            check_range(name, value, 0.01, 0.5)?;
        }

        let min_threshold = self.thresholds.min();
        if self.edge_hysteresis < 0.0 || self.edge_hysteresis >= min_threshold {
            return Err(ConfigError::new(format!(
                "edge_hysteresis ({}) must be in [0, {}) (below every active threshold, per I6)",
                self.edge_hysteresis, min_threshold
            )));
        }

        if self.pulse_ms == 0 {
            return Err(ConfigError::new("pulse_ms must be > 0"));
        }
        if self.pulse_step <= 0.0 {
            return Err(ConfigError::new("pulse_step must be > 0"));
        }
        if self.max_speed < 1.0 {
            return Err(ConfigError::new("max_speed must be >= 1"));
        }

        if self.deadzone < 0.0 || self.deadzone >= 0.5 {
            return Err(ConfigError::new("deadzone must be in [0, 0.5)"));
        }
        let max_side_threshold = self
            .thresholds
            .left
            .max(self.thresholds.right)
            .max(self.thresholds.top)
            .max(self.thresholds.bottom);
        if self.deadzone + max_side_threshold > 0.5 {
            return Err(ConfigError::new(
                "deadzone + side_threshold must be <= 0.5 for every side",
            ));
        }

        if self.accel_exponent < 0.0 {
            return Err(ConfigError::new("accel_exponent must be >= 0"));
        }
        check_range("pressure_boost", self.pressure_boost, 0.0, 2.0)?;
        check_range("button_zone", self.button_zone, 0.0, 0.4)?;

        Ok(())
    }

    /// Serialize back to the `key = value` text format this config was
    /// parsed from, for the round-trip property in spec.md §8.
    pub fn to_file_string(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("edge_threshold = {}\n", self.edge_threshold));
        out.push_str(&format!("threshold_left = {}\n", self.thresholds.left));
        out.push_str(&format!("threshold_right = {}\n", self.thresholds.right));
        out.push_str(&format!("threshold_top = {}\n", self.thresholds.top));
        out.push_str(&format!("threshold_bottom = {}\n", self.thresholds.bottom));
        out.push_str(&format!("edge_hysteresis = {}\n", self.edge_hysteresis));
        out.push_str(&format!("hold_ms = {}\n", self.hold_ms));
        out.push_str(&format!("pulse_ms = {}\n", self.pulse_ms));
        out.push_str(&format!("pulse_step = {}\n", self.pulse_step));
        out.push_str(&format!("max_speed = {}\n", self.max_speed));
        out.push_str(&format!("mode = {}\n", self.mode));
        out.push_str(&format!("natural_scroll = {}\n", self.natural_scroll));
        out.push_str(&format!("diagonal_scroll = {}\n", self.diagonal_scroll));
        out.push_str(&format!("two_finger_scroll = {}\n", self.two_finger_scroll));
        out.push_str(&format!("scroll_axis_priority = {}\n", self.scroll_axis_priority));
        out.push_str(&format!("deadzone = {}\n", self.deadzone));
        out.push_str(&format!("accel_exponent = {}\n", self.accel_exponent));
        out.push_str(&format!("pressure_boost = {}\n", self.pressure_boost));
        out.push_str(&format!("button_zone = {}\n", self.button_zone));
        out.push_str(&format!("button_cooldown_ms = {}\n", self.button_cooldown_ms));
        out.push_str(&format!("grab = {}\n", self.grab));
        if let Some(devnode) = &self.forced_devnode {
            out.push_str(&format!("forced_devnode = {}\n", devnode.display()));
        }
        if !self.ignored_devnodes.is_empty() {
            let joined = self
                .ignored_devnodes
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("ignored_devnodes = {joined}\n"));
        }
        out
    }

    /// Parse a config built entirely from file text (used by the round-trip
    /// test and `--config`), applying the same defaults `load` would for
    /// any field the text omits.
    pub fn from_file_str(content: &str) -> Result<Self, ConfigError> {
        let file_config = file::parse(content, "<config>")?;
        let cli = cli_defaults();
        Ok(Self::merge(&cli, &file_config))
    }
}

fn resolve_bool(on_flag: bool, off_flag: bool, file_value: Option<bool>, default: bool) -> bool {
    if off_flag {
        false
    } else if on_flag {
        true
    } else {
        file_value.unwrap_or(default)
    }
}

fn merge_file_configs(base: FileConfig, override_: FileConfig) -> FileConfig {
    FileConfig {
        edge_threshold: override_.edge_threshold.or(base.edge_threshold),
        threshold_left: override_.threshold_left.or(base.threshold_left),
        threshold_right: override_.threshold_right.or(base.threshold_right),
        threshold_top: override_.threshold_top.or(base.threshold_top),
        threshold_bottom: override_.threshold_bottom.or(base.threshold_bottom),
        edge_hysteresis: override_.edge_hysteresis.or(base.edge_hysteresis),
        hold_ms: override_.hold_ms.or(base.hold_ms),
        pulse_ms: override_.pulse_ms.or(base.pulse_ms),
        pulse_step: override_.pulse_step.or(base.pulse_step),
        max_speed: override_.max_speed.or(base.max_speed),
        mode: override_.mode.or(base.mode),
        natural_scroll: override_.natural_scroll.or(base.natural_scroll),
        diagonal_scroll: override_.diagonal_scroll.or(base.diagonal_scroll),
        two_finger_scroll: override_.two_finger_scroll.or(base.two_finger_scroll),
        scroll_axis_priority: override_.scroll_axis_priority.or(base.scroll_axis_priority),
        deadzone: override_.deadzone.or(base.deadzone),
        accel_exponent: override_.accel_exponent.or(base.accel_exponent),
        pressure_boost: override_.pressure_boost.or(base.pressure_boost),
        button_zone: override_.button_zone.or(base.button_zone),
        button_cooldown_ms: override_.button_cooldown_ms.or(base.button_cooldown_ms),
        grab: override_.grab.or(base.grab),
        forced_devnode: override_.forced_devnode.or(base.forced_devnode),
        ignored_devnodes: if override_.ignored_devnodes.is_empty() {
            base.ignored_devnodes
        } else {
            override_.ignored_devnodes
        },
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value < min || value > max {
        Err(ConfigError::new(format!(
            "{name} ({value}) must be in [{min}, {max}]"
        )))
    } else {
        Ok(())
    }
}

/// A `Cli` with every field at its "unset" value, used to feed `merge`
/// when there's no real CLI invocation (round-trip tests, `from_file_str`).
fn cli_defaults() -> Cli {
    use clap::Parser;
    Cli::parse_from(["edge-motion"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = Config::from_file_str("").unwrap();
        assert_eq!(config.edge_threshold, 0.06);
        assert_eq!(config.edge_hysteresis, 0.015);
        assert_eq!(config.hold_ms, 80);
        assert_eq!(config.pulse_ms, 10);
        assert_eq!(config.pulse_step, 1.5);
        assert_eq!(config.max_speed, 3.0);
        assert_eq!(config.mode, Mode::Motion);
        assert_eq!(config.button_zone, 0.14);
        assert_eq!(config.button_cooldown_ms, 180);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_hysteresis_equal_to_threshold() {
        let config = Config::from_file_str("edge_threshold = 0.1\nedge_hysteresis = 0.1\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_hysteresis_above_min_active_threshold() {
        let content = "threshold_left = 0.05\nthreshold_right = 0.2\nedge_hysteresis = 0.08\n";
        let config = Config::from_file_str(content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn accepts_hysteresis_below_min_active_threshold() {
        let content = "threshold_left = 0.05\nthreshold_right = 0.2\nedge_hysteresis = 0.01\n";
        let config = Config::from_file_str(content).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_deadzone_plus_threshold_over_half() {
        let content = "deadzone = 0.4\nedge_threshold = 0.2\n";
        let config = Config::from_file_str(content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn round_trips_through_file_format() {
        let original = Config::from_file_str(
            "edge_threshold = 0.2\nmode = scroll\nnatural_scroll = true\npulse_step = 2.5\n",
        )
        .unwrap();
        let text = original.to_file_string();
        let reloaded = Config::from_file_str(&text).unwrap();
        assert_eq!(original.edge_threshold, reloaded.edge_threshold);
        assert_eq!(original.mode, reloaded.mode);
        assert_eq!(original.natural_scroll, reloaded.natural_scroll);
        assert_eq!(original.pulse_step, reloaded.pulse_step);
    }

    #[test]
    fn out_of_range_edge_threshold_is_rejected() {
        let config = Config::from_file_str("edge_threshold = 0.9\n").unwrap();
        assert!(config.validate().is_err());
    }
}
