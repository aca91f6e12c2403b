use clap::Parser;
use std::path::PathBuf;

use super::mode::{Mode, ScrollAxisPriority};

#[derive(Parser)]
#[command(name = "edge-motion")]
#[command(about = "Turn a touchpad's edge band into continuous relative motion or scroll")]
#[command(version)]
pub struct Cli {
    /// Print one line per candidate touchpad and exit.
    #[arg(long)]
    pub list_devices: bool,

    /// Base edge band as a fraction of axis length.
    #[arg(long)]
    pub edge_threshold: Option<f64>,

    /// Left-edge threshold override.
    #[arg(long)]
    pub threshold_left: Option<f64>,

    /// Right-edge threshold override.
    #[arg(long)]
    pub threshold_right: Option<f64>,

    /// Top-edge threshold override.
    #[arg(long)]
    pub threshold_top: Option<f64>,

    /// Bottom-edge threshold override.
    #[arg(long)]
    pub threshold_bottom: Option<f64>,

    /// Band subtracted from a side's threshold before it releases once latched.
    #[arg(long)]
    pub edge_hysteresis: Option<f64>,

    /// Debounce before arming, in milliseconds.
    #[arg(long)]
    pub hold_ms: Option<u64>,

    /// Pulse period, in milliseconds.
    #[arg(long)]
    pub pulse_ms: Option<u64>,

    /// Base relative delta emitted per pulse.
    #[arg(long)]
    pub pulse_step: Option<f64>,

    /// Speed multiplier at full edge penetration (depth=1).
    #[arg(long)]
    pub max_speed: Option<f64>,

    /// Emission mode: motion or scroll.
    #[arg(long, value_parser = clap::value_parser!(Mode))]
    pub mode: Option<Mode>,

    /// Invert the sign of vertical scroll ticks.
    #[arg(long)]
    pub natural_scroll: bool,

    /// Don't invert the sign of vertical scroll ticks.
    #[arg(long)]
    pub no_natural_scroll: bool,

    /// Allow both scroll axes to fire in the same pulse.
    #[arg(long)]
    pub diagonal_scroll: bool,

    /// Only allow one scroll axis to fire per pulse.
    #[arg(long)]
    pub no_diagonal_scroll: bool,

    /// Require at least two active touch slots before scrolling.
    #[arg(long)]
    pub two_finger_scroll: bool,

    /// Allow scrolling with a single active touch slot.
    #[arg(long)]
    pub no_two_finger_scroll: bool,

    /// Which scroll axis wins when diagonal_scroll is off: dominant, horizontal, vertical.
    #[arg(long, value_parser = clap::value_parser!(ScrollAxisPriority))]
    pub scroll_axis_priority: Option<ScrollAxisPriority>,

    /// Central zone (around 0.5 on each axis) that snaps the normalized coordinate to center.
    #[arg(long)]
    pub deadzone: Option<f64>,

    /// Exponent applied to edge-penetration depth to compute the speed factor.
    #[arg(long)]
    pub accel_exponent: Option<f64>,

    /// Pressure contribution to the speed factor, 0 disables it.
    #[arg(long)]
    pub pressure_boost: Option<f64>,

    /// Bottom fraction of the pad that suppresses edge motion (button row).
    #[arg(long)]
    pub button_zone: Option<f64>,

    /// Suppression window after a mouse button release, in milliseconds.
    #[arg(long)]
    pub button_cooldown_ms: Option<u64>,

    /// Exclusively grab the source touchpad device.
    #[arg(long)]
    pub grab: bool,

    /// Don't grab the source touchpad device even if requested by the config file.
    #[arg(long)]
    pub no_grab: bool,

    /// Skip candidate scoring and use this device node.
    #[arg(long)]
    pub forced_devnode: Option<PathBuf>,

    /// Never select this device node as a candidate. May be repeated.
    #[arg(long = "ignore")]
    pub ignored_devnodes: Vec<PathBuf>,

    /// Raise the log level to debug.
    #[arg(long)]
    pub verbose: bool,

    /// Path to a `key = value` config file.
    #[arg(long, env = "EDGE_MOTION_CONFIG")]
    pub config: Option<PathBuf>,
}
