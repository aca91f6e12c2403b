//! Emission mode and scroll-axis-priority enums, parsed the same way
//! as a CLI flag value and a config-file value.

use std::fmt;
use std::str::FromStr;

/// What the pulser emits while armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Emit REL_X / REL_Y.
    #[default]
    Motion,
    /// Emit REL_WHEEL / REL_HWHEEL.
    Scroll,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Motion => write!(f, "motion"),
            Mode::Scroll => write!(f, "scroll"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "motion" => Ok(Mode::Motion),
            "scroll" => Ok(Mode::Scroll),
            other => Err(format!("invalid mode '{other}'. Valid values: motion, scroll")),
        }
    }
}

/// Which scroll axis wins when `diagonal_scroll` is off and both axes
/// would otherwise fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollAxisPriority {
    #[default]
    Dominant,
    Horizontal,
    Vertical,
}

impl fmt::Display for ScrollAxisPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollAxisPriority::Dominant => write!(f, "dominant"),
            ScrollAxisPriority::Horizontal => write!(f, "horizontal"),
            ScrollAxisPriority::Vertical => write!(f, "vertical"),
        }
    }
}

impl FromStr for ScrollAxisPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dominant" => Ok(ScrollAxisPriority::Dominant),
            "horizontal" => Ok(ScrollAxisPriority::Horizontal),
            "vertical" => Ok(ScrollAxisPriority::Vertical),
            other => Err(format!(
                "invalid scroll-axis-priority '{other}'. Valid values: dominant, horizontal, vertical"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_display_and_from_str() {
        for m in [Mode::Motion, Mode::Scroll] {
            assert_eq!(m.to_string().parse::<Mode>().unwrap(), m);
        }
    }

    #[test]
    fn scroll_axis_priority_round_trips() {
        for p in [
            ScrollAxisPriority::Dominant,
            ScrollAxisPriority::Horizontal,
            ScrollAxisPriority::Vertical,
        ] {
            assert_eq!(p.to_string().parse::<ScrollAxisPriority>().unwrap(), p);
        }
    }

    #[test]
    fn invalid_mode_is_rejected() {
        assert!("diagonal".parse::<Mode>().is_err());
    }
}
