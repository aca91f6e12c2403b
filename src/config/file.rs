//! `key = value` config file parsing, per the edge-motion file format:
//! one `key = value` pair per line, `#` starts a full-line or trailing
//! comment, blank lines are ignored, keys/values are whitespace-trimmed.
//! An unparsable line aborts startup pointing at `file:line`.

use std::path::{Path, PathBuf};

use super::mode::{Mode, ScrollAxisPriority};
use crate::error::ConfigError;

/// All fields optional: this is merged under CLI overrides in `Config::load`.
#[derive(Debug, Default, Clone)]
pub struct FileConfig {
    pub edge_threshold: Option<f64>,
    pub threshold_left: Option<f64>,
    pub threshold_right: Option<f64>,
    pub threshold_top: Option<f64>,
    pub threshold_bottom: Option<f64>,
    pub edge_hysteresis: Option<f64>,
    pub hold_ms: Option<u64>,
    pub pulse_ms: Option<u64>,
    pub pulse_step: Option<f64>,
    pub max_speed: Option<f64>,
    pub mode: Option<Mode>,
    pub natural_scroll: Option<bool>,
    pub diagonal_scroll: Option<bool>,
    pub two_finger_scroll: Option<bool>,
    pub scroll_axis_priority: Option<ScrollAxisPriority>,
    pub deadzone: Option<f64>,
    pub accel_exponent: Option<f64>,
    pub pressure_boost: Option<f64>,
    pub button_zone: Option<f64>,
    pub button_cooldown_ms: Option<u64>,
    pub grab: Option<bool>,
    pub forced_devnode: Option<PathBuf>,
    pub ignored_devnodes: Vec<PathBuf>,
}

/// Parse the content of a config file. `display_path` is used only for
/// `file:line` error messages.
pub fn parse(content: &str, display_path: &str) -> Result<FileConfig, ConfigError> {
    let mut config = FileConfig::default();

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::new(format!(
                "{display_path}:{line_no}: expected `key = value`, got '{line}'"
            )));
        };

        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            return Err(ConfigError::new(format!(
                "{display_path}:{line_no}: empty key"
            )));
        }

        apply_field(&mut config, key, value)
            .map_err(|msg| ConfigError::new(format!("{display_path}:{line_no}: {msg}")))?;
    }

    Ok(config)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn apply_field(config: &mut FileConfig, key: &str, value: &str) -> Result<(), String> {
    match key {
        "edge_threshold" => config.edge_threshold = Some(parse_f64(value)?),
        "threshold_left" => config.threshold_left = Some(parse_f64(value)?),
        "threshold_right" => config.threshold_right = Some(parse_f64(value)?),
        "threshold_top" => config.threshold_top = Some(parse_f64(value)?),
        "threshold_bottom" => config.threshold_bottom = Some(parse_f64(value)?),
        "edge_hysteresis" => config.edge_hysteresis = Some(parse_f64(value)?),
        "hold_ms" => config.hold_ms = Some(parse_u64(value)?),
        "pulse_ms" => config.pulse_ms = Some(parse_u64(value)?),
        "pulse_step" => config.pulse_step = Some(parse_f64(value)?),
        "max_speed" => config.max_speed = Some(parse_f64(value)?),
        "mode" => config.mode = Some(value.parse()?),
        "natural_scroll" => config.natural_scroll = Some(parse_bool(value)?),
        "diagonal_scroll" => config.diagonal_scroll = Some(parse_bool(value)?),
        "two_finger_scroll" => config.two_finger_scroll = Some(parse_bool(value)?),
        "scroll_axis_priority" => config.scroll_axis_priority = Some(value.parse()?),
        "deadzone" => config.deadzone = Some(parse_f64(value)?),
        "accel_exponent" => config.accel_exponent = Some(parse_f64(value)?),
        "pressure_boost" => config.pressure_boost = Some(parse_f64(value)?),
        "button_zone" => config.button_zone = Some(parse_f64(value)?),
        "button_cooldown_ms" => config.button_cooldown_ms = Some(parse_u64(value)?),
        "grab" => config.grab = Some(parse_bool(value)?),
        "forced_devnode" => config.forced_devnode = Some(PathBuf::from(value)),
        "ignored_devnodes" => {
            config.ignored_devnodes = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        other => return Err(format!("unrecognized key '{other}'")),
    }
    Ok(())
}

fn parse_f64(value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|_| format!("'{value}' is not a valid number"))
}

fn parse_u64(value: &str) -> Result<u64, String> {
    value
        .parse::<u64>()
        .map_err(|_| format!("'{value}' is not a valid non-negative integer"))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("'{other}' is not a valid boolean")),
    }
}

/// Load and parse a config file from an explicit path. A missing file is
/// not an error (returns `Ok(None)`); a present-but-unparsable file is.
pub fn load_from_path(path: &Path) -> Result<Option<FileConfig>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::new(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    parse(&content, &path.display().to_string()).map(Some)
}

/// The default config file search path: `$HOME/.config/edge-motion.conf`.
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config").join("edge-motion.conf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comments_and_whitespace() {
        let content = "\n# a comment\n  edge_threshold = 0.1  # inline note\nhold_ms=50\n";
        let config = parse(content, "test.conf").unwrap();
        assert_eq!(config.edge_threshold, Some(0.1));
        assert_eq!(config.hold_ms, Some(50));
    }

    #[test]
    fn rejects_line_without_equals_with_file_line_pointer() {
        let err = parse("not-a-kv-pair\n", "edge-motion.conf").unwrap_err();
        assert!(err.to_string().contains("edge-motion.conf:1"));
    }

    #[test]
    fn reports_correct_line_number_for_later_errors() {
        let content = "hold_ms = 10\npulse_ms = oops\n";
        let err = parse(content, "cfg").unwrap_err();
        assert!(err.to_string().contains("cfg:2"));
    }

    #[test]
    fn parses_ignored_devnodes_list() {
        let config = parse("ignored_devnodes = /dev/input/event3, /dev/input/event4\n", "cfg").unwrap();
        assert_eq!(
            config.ignored_devnodes,
            vec![PathBuf::from("/dev/input/event3"), PathBuf::from("/dev/input/event4")]
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = parse("not_a_real_key = 1\n", "cfg").unwrap_err();
        assert!(err.to_string().contains("unrecognized key"));
    }
}
