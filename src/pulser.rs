//! C4 Pulser: the background execution context that, while armed,
//! periodically turns `SharedCommand` into relative motion or scroll
//! ticks on `RelativeSink` (§4.3, §5).

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::config::{Config, Mode, ScrollAxisPriority};
use crate::relative_sink::RelativeSink;

/// The four fields the Controller publishes and the Pulser consumes
/// (§3 SharedCommand). Plain `Copy` data guarded by one mutex.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Command {
    pub armed: bool,
    pub dir_x: i8,
    pub dir_y: i8,
    pub speed_factor: f64,
}

/// One mutex, one condition variable, latest-value semantics — no queue
/// (§9 Design notes: pulses are interchangeable).
pub struct SharedCommand {
    state: Mutex<Command>,
    condvar: Condvar,
}

impl SharedCommand {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(Command::default()),
            condvar: Condvar::new(),
        })
    }

    /// Replace the command and wake the Pulser. The lock is held only for
    /// the assignment itself, never across a sink write or poll (§5).
    pub fn publish(&self, command: Command) {
        let mut guard = self.state.lock().unwrap();
        *guard = command;
        drop(guard);
        self.condvar.notify_one();
    }

    pub fn snapshot(&self) -> Command {
        *self.state.lock().unwrap()
    }
}

/// Run the Pulser loop until `running` clears. Blocks in `condvar.wait`
/// (untimed while disarmed, timed to `pulse_ms` while armed); never reads
/// from the source (§5 Scheduling model).
pub fn run(shared: Arc<SharedCommand>, running: &'static AtomicBool, config: Config, mut sink: Option<RelativeSink>) {
    let mut guard = shared.state.lock().unwrap();

    loop {
        guard = shared
            .condvar
            .wait_while(guard, |c| !c.armed && running.load(Ordering::Relaxed))
            .unwrap();

        if !running.load(Ordering::Relaxed) {
            return;
        }

        let command = *guard;
        drop(guard);

        if sink.is_none() {
            match RelativeSink::create() {
                Ok(recreated) => sink = Some(recreated),
                Err(e) => log::warn!("sink recreation failed, will retry on next arm: {e}"),
            }
        }

        let emit_result = emit_pulse(sink.as_ref(), &config, command);

        guard = shared.state.lock().unwrap();
        if emit_result.is_err() {
            log::warn!("sink write failed, disarming until next successful arm");
            guard.armed = false;
            sink = None;
            shared.condvar.notify_all();
        }

        if guard.armed {
            let (next_guard, _timeout) = shared
                .condvar
                .wait_timeout(guard, Duration::from_millis(config.pulse_ms))
                .unwrap();
            guard = next_guard;
        }
    }
}

fn emit_pulse(sink: Option<&RelativeSink>, config: &Config, command: Command) -> crate::error::Result<()> {
    let Some((sx, sy)) = compute_step(command.dir_x, command.dir_y, command.speed_factor, config.pulse_step, config.max_speed) else {
        return Ok(());
    };

    let Some(sink) = sink else { return Ok(()) };

    match config.mode {
        Mode::Motion => sink.emit_motion(sx, sy),
        Mode::Scroll => {
            let (hwheel, wheel) = apply_scroll_axes(sx, sy, config.diagonal_scroll, config.scroll_axis_priority);
            let wheel = if config.natural_scroll { wheel } else { -wheel };
            sink.emit_scroll(hwheel, wheel)
        }
    }
}

/// `step = round(pulse_step * (1 + speed_factor*(max_speed-1)))` clamped to
/// `[1, 100]`; `sx/sy` are that step distributed along the direction
/// vector. Returns `None` if the vector length is effectively zero (§4.3 step 3).
fn compute_step(dir_x: i8, dir_y: i8, speed_factor: f64, pulse_step: f64, max_speed: f64) -> Option<(i32, i32)> {
    let dx = dir_x as f64;
    let dy = dir_y as f64;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-9 {
        return None;
    }

    let step = (pulse_step * (1.0 + speed_factor * (max_speed - 1.0))).round().clamp(1.0, 100.0);
    let sx = (dx / len * step).round() as i32;
    let sy = (dy / len * step).round() as i32;
    Some((sx, sy))
}

/// Axis selection for scroll mode when `diagonal_scroll` is off (§4.3 step 4).
fn apply_scroll_axes(sx: i32, sy: i32, diagonal_scroll: bool, priority: ScrollAxisPriority) -> (i32, i32) {
    if diagonal_scroll {
        return (sx, sy);
    }

    match priority {
        ScrollAxisPriority::Horizontal => (sx, 0),
        ScrollAxisPriority::Vertical => (0, sy),
        ScrollAxisPriority::Dominant => {
            if sx.abs() >= sy.abs() {
                (sx, 0)
            } else {
                (0, sy)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_direction_yields_no_step() {
        assert_eq!(compute_step(0, 0, 0.0, 1.5, 3.0), None);
    }

    #[test]
    fn step_scales_with_speed_factor_and_clamps() {
        let (sx, _) = compute_step(1, 0, 0.5, 2.0, 2.0).unwrap();
        assert_eq!(sx, 3);

        let (sx, _) = compute_step(1, 0, 1.0, 2.0, 1000.0).unwrap();
        assert_eq!(sx, 100, "step must clamp to 100");
    }

    #[test]
    fn diagonal_scroll_off_dominant_picks_larger_axis() {
        assert_eq!(apply_scroll_axes(4, 2, false, ScrollAxisPriority::Dominant), (4, 0));
        assert_eq!(apply_scroll_axes(2, 4, false, ScrollAxisPriority::Dominant), (0, 4));
    }

    #[test]
    fn dominant_tie_keeps_horizontal() {
        assert_eq!(apply_scroll_axes(3, 3, false, ScrollAxisPriority::Dominant), (3, 0));
    }

    #[test]
    fn horizontal_and_vertical_priority_zero_the_other_axis() {
        assert_eq!(apply_scroll_axes(3, 3, false, ScrollAxisPriority::Horizontal), (3, 0));
        assert_eq!(apply_scroll_axes(3, 3, false, ScrollAxisPriority::Vertical), (0, 3));
    }

    #[test]
    fn diagonal_scroll_keeps_both_axes() {
        assert_eq!(apply_scroll_axes(3, 5, true, ScrollAxisPriority::Dominant), (3, 5));
    }
}
