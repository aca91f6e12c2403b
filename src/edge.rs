//! The edge-decision engine (§4.2): turns the current `TouchState` plus
//! `AxisRange`s into a direction and speed, with per-side hysteresis, a
//! center deadzone, bottom button-zone suppression, and hold-to-arm timing.
//! Runs once per Controller tick; carries no state beyond what's needed to
//! evaluate the next tick (`last_on_x/y`, `entered_at`).

use crate::clock::Tick;
use crate::config::{Config, Mode};
use crate::touch_source::state::{AxisRange, TouchState};

/// `(dir_x, dir_y, speed_factor, armed)` plus the hysteresis/hold memory
/// needed to evaluate the next tick (§3 EdgeDecision).
#[derive(Debug, Clone, Copy)]
pub struct EdgeDecision {
    pub dir_x: i8,
    pub dir_y: i8,
    pub speed_factor: f64,
    pub armed: bool,
    entered_at: Option<Tick>,
    last_on_x: bool,
    last_on_y: bool,
}

impl Default for EdgeDecision {
    fn default() -> Self {
        Self {
            dir_x: 0,
            dir_y: 0,
            speed_factor: 0.0,
            armed: false,
            entered_at: None,
            last_on_x: false,
            last_on_y: false,
        }
    }
}

impl EdgeDecision {
    pub fn new() -> Self {
        Self::default()
    }

    fn zero(&mut self) {
        self.dir_x = 0;
        self.dir_y = 0;
        self.speed_factor = 0.0;
        self.armed = false;
        self.entered_at = None;
        self.last_on_x = false;
        self.last_on_y = false;
    }

    /// Recompute the decision for one Controller tick. Mutates `touch` only
    /// to zero `last_x/last_y` when the axis range is invalid (I5).
    pub fn tick(
        &mut self,
        touch: &mut TouchState,
        config: &Config,
        axis_x: AxisRange,
        axis_y: AxisRange,
        pressure_range: Option<(i32, i32)>,
        now: Tick,
    ) {
        let (Some(raw_x), Some(raw_y)) = (touch.last_x, touch.last_y) else {
            self.zero();
            return;
        };

        if config.mode == Mode::Scroll && config.two_finger_scroll && touch.active_fingers < 2 {
            self.zero();
            return;
        }

        let suppressed = touch.click_down
            || touch
                .edge_suppress_until
                .map(|until| now < until)
                .unwrap_or(false);
        if suppressed {
            self.zero();
            return;
        }

        if !axis_x.is_valid() || !axis_y.is_valid() {
            touch.last_x = None;
            touch.last_y = None;
            self.zero();
            return;
        }

        let mut nx = axis_x.normalize(raw_x);
        let mut ny = axis_y.normalize(raw_y);

        if ny >= 1.0 - config.button_zone {
            nx = 0.5;
            ny = 0.5;
        }

        if (nx - 0.5).abs() < config.deadzone {
            nx = 0.5;
        }
        if (ny - 0.5).abs() < config.deadzone {
            ny = 0.5;
        }

        let t = config.thresholds;
        self.dir_x = resolve_axis_direction(nx, t.left, t.right, config.edge_hysteresis, self.last_on_x);
        self.dir_y = resolve_axis_direction(ny, t.top, t.bottom, config.edge_hysteresis, self.last_on_y);
        self.last_on_x = self.dir_x != 0;
        self.last_on_y = self.dir_y != 0;

        let depth_x = axis_depth(nx, t.left, t.right);
        let depth_y = axis_depth(ny, t.top, t.bottom);
        let mut speed_factor = depth_x.max(depth_y);

        if config.accel_exponent != 1.0 && speed_factor > 0.0 {
            speed_factor = speed_factor.powf(config.accel_exponent);
        }

        if config.pressure_boost > 0.0 {
            if let (Some((min, max)), Some(pressure)) = (pressure_range, touch.last_pressure) {
                if max > min {
                    let p = ((pressure - min) as f64 / (max - min) as f64).clamp(0.0, 1.0);
                    speed_factor = (speed_factor * (1.0 + p * config.pressure_boost)).min(1.0);
                }
            }
        }
        self.speed_factor = speed_factor;

        if self.dir_x != 0 || self.dir_y != 0 {
            let entered_at = *self.entered_at.get_or_insert(now);
            self.armed = now.elapsed_ms(entered_at) >= config.hold_ms;
        } else {
            self.entered_at = None;
            self.armed = false;
        }
    }

    /// Milliseconds elapsed since the hold-to-arm timer started, if a
    /// nonzero direction is currently latched. Used by the Controller to
    /// size the next poll timeout (§4.5 step 4).
    pub fn ms_since_entered(&self, now: Tick) -> Option<u64> {
        self.entered_at.map(|entered| now.elapsed_ms(entered))
    }

    /// Whether publishing this decision over the prior one should signal
    /// the Pulser (§4.2: any field changed, `|Δspeed_factor| > 1e-4` for the real).
    pub fn differs_enough(&self, previous: &EdgeDecision) -> bool {
        self.armed != previous.armed
            || self.dir_x != previous.dir_x
            || self.dir_y != previous.dir_y
            || (self.speed_factor - previous.speed_factor).abs() > 1e-4
    }
}

/// `enter`/`leave` band test for one axis, shared between X (left/right)
/// and Y (top/bottom). `near_min` tests the "low" side (left or top),
/// `near_max` the "high" side (right or bottom); direction sign is -1 for
/// the low side, +1 for the high side.
fn resolve_axis_direction(n: f64, near_min: f64, near_max: f64, hysteresis: f64, last_on: bool) -> i8 {
    if last_on {
        let leave_min = near_min - hysteresis;
        let leave_max = near_max - hysteresis;

        if n >= 1.0 - leave_max {
            1
        } else if n <= leave_min {
            -1
        } else {
            0
        }
    } else if n >= 1.0 - near_max {
        1
    } else if n <= near_min {
        -1
    } else {
        0
    }
}

fn axis_depth(n: f64, near_min: f64, near_max: f64) -> f64 {
    let depth_max_side = if near_max > 0.0 {
        (n - (1.0 - near_max)) / near_max
    } else {
        0.0
    };
    let depth_min_side = if near_min > 0.0 { (near_min - n) / near_min } else { 0.0 };
    depth_max_side.max(depth_min_side).max(0.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cli;
    use clap::Parser;

    fn config_with(mutate: impl FnOnce(&mut Config)) -> Config {
        let cli = Cli::parse_from(["edge-motion"]);
        let mut config = Config::load(&cli).unwrap();
        mutate(&mut config);
        config
    }

    fn axis() -> AxisRange {
        AxisRange { min: 0, max: 1000 }
    }

    #[test]
    fn right_edge_arms_after_hold_ms() {
        let config = config_with(|c| {
            c.thresholds.left = 0.1;
            c.thresholds.right = 0.1;
            c.thresholds.top = 0.1;
            c.thresholds.bottom = 0.1;
            c.edge_hysteresis = 0.02;
            c.hold_ms = 80;
        });
        let mut touch = TouchState::new(1);
        touch.last_x = Some(950);
        touch.last_y = Some(500);

        let mut decision = EdgeDecision::new();
        let start = Tick::now();
        decision.tick(&mut touch, &config, axis(), axis(), None, start);
        assert_eq!(decision.dir_x, 1);
        assert!(!decision.armed);

        let later = start.plus_ms(85);
        decision.tick(&mut touch, &config, axis(), axis(), None, later);
        assert!(decision.armed);
    }

    #[test]
    fn hysteresis_keeps_direction_latched_inside_leave_band() {
        let config = config_with(|c| {
            c.thresholds.left = 0.1;
            c.thresholds.right = 0.1;
            c.thresholds.top = 0.1;
            c.thresholds.bottom = 0.1;
            c.edge_hysteresis = 0.02;
        });
        let mut touch = TouchState::new(1);
        touch.last_x = Some(950);
        touch.last_y = Some(500);
        let mut decision = EdgeDecision::new();
        decision.tick(&mut touch, &config, axis(), axis(), None, Tick::now());
        assert_eq!(decision.dir_x, 1);

        touch.last_x = Some(925);
        decision.tick(&mut touch, &config, axis(), axis(), None, Tick::now());
        assert_eq!(decision.dir_x, 1, "0.925 is still within the leave band");

        touch.last_x = Some(900);
        decision.tick(&mut touch, &config, axis(), axis(), None, Tick::now());
        assert_eq!(decision.dir_x, 0, "0.90 falls below the leave band, edge releases");
    }

    #[test]
    fn missing_coordinates_force_zero() {
        let config = config_with(|_| {});
        let mut touch = TouchState::new(1);
        let mut decision = EdgeDecision::new();
        decision.tick(&mut touch, &config, axis(), axis(), None, Tick::now());
        assert_eq!(decision.dir_x, 0);
        assert_eq!(decision.dir_y, 0);
        assert!(!decision.armed);
    }

    #[test]
    fn button_zone_suppresses_bottom_edge() {
        let config = config_with(|c| {
            c.button_zone = 0.14;
            c.thresholds.bottom = 0.1;
        });
        let mut touch = TouchState::new(1);
        touch.last_x = Some(500);
        touch.last_y = Some(950);
        let mut decision = EdgeDecision::new();
        decision.tick(&mut touch, &config, axis(), axis(), None, Tick::now());
        assert_eq!(decision.dir_y, 0);
    }

    #[test]
    fn click_down_suppresses_motion() {
        let config = config_with(|c| c.thresholds.right = 0.1);
        let mut touch = TouchState::new(1);
        touch.last_x = Some(950);
        touch.last_y = Some(500);
        touch.click_down = true;
        let mut decision = EdgeDecision::new();
        decision.tick(&mut touch, &config, axis(), axis(), None, Tick::now());
        assert_eq!(decision.dir_x, 0);
    }

    #[test]
    fn two_finger_scroll_gate_blocks_single_finger() {
        let config = config_with(|c| {
            c.mode = Mode::Scroll;
            c.two_finger_scroll = true;
            c.thresholds.right = 0.1;
        });
        let mut touch = TouchState::new(1);
        touch.last_x = Some(950);
        touch.last_y = Some(500);
        touch.active_fingers = 1;
        let mut decision = EdgeDecision::new();
        decision.tick(&mut touch, &config, axis(), axis(), None, Tick::now());
        assert_eq!(decision.dir_x, 0);

        touch.active_fingers = 2;
        decision.tick(&mut touch, &config, axis(), axis(), None, Tick::now());
        assert_eq!(decision.dir_x, 1);
    }

    #[test]
    fn invalid_axis_range_forces_zero_and_clears_last_xy() {
        let config = config_with(|_| {});
        let mut touch = TouchState::new(1);
        touch.last_x = Some(950);
        touch.last_y = Some(500);
        let invalid = AxisRange { min: 10, max: 10 };
        let mut decision = EdgeDecision::new();
        decision.tick(&mut touch, &config, invalid, axis(), None, Tick::now());
        assert_eq!(decision.dir_x, 0);
        assert_eq!(touch.last_x, None);
    }

    #[test]
    fn pressure_boost_increases_speed_factor() {
        let config = config_with(|c| {
            c.thresholds.right = 0.1;
            c.pressure_boost = 1.0;
        });
        let mut touch = TouchState::new(1);
        touch.last_x = Some(950);
        touch.last_y = Some(500);
        touch.last_pressure = Some(100);

        let mut without_pressure = EdgeDecision::new();
        without_pressure.tick(&mut touch.clone(), &config, axis(), axis(), None, Tick::now());

        let mut with_pressure = EdgeDecision::new();
        with_pressure.tick(&mut touch, &config, axis(), axis(), Some((0, 100)), Tick::now());

        assert!(with_pressure.speed_factor >= without_pressure.speed_factor);
    }
}
