//! C2 TouchSource: finds, opens and reads the real touchpad device node,
//! exposing per-frame `TouchState` snapshots to the Controller.

pub mod device;
pub mod state;

use std::fs::File;
use std::io::Read;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::touch_source::state::{AxisRange, TouchState, EV_ABS, EV_KEY, EV_SYN, SYN_REPORT};
use crate::clock::Tick;

const INPUT_EVENT_SIZE: usize = 24;
const SYN_DROPPED: u16 = 3;

/// What the Controller should do after a `poll`/read attempt (§4.1 Errors,
/// §4.5 step 6).
pub enum ReadOutcome {
    /// No complete frame yet; keep polling.
    Pending,
    /// A frame boundary (`SYN_REPORT`) was reached; `TouchState` is current.
    Frame,
    /// The source is gone: read error, or a poll error flag was set.
    Disconnected,
}

/// The open device plus derived axis/slot metadata (§3 DeviceBinding).
pub struct TouchSource {
    file: File,
    pub axis_x: AxisRange,
    pub axis_y: AxisRange,
    pub pressure_range: Option<(i32, i32)>,
    pub touch: TouchState,
    draining: bool,
}

impl TouchSource {
    /// Run enumeration/scoring (or honor `forced_devnode`), open, and
    /// optionally grab. Returns `Ok(None)` if no candidate is available.
    pub fn open(config: &Config) -> Result<Option<Self>> {
        let devnode = if let Some(forced) = &config.forced_devnode {
            forced.clone()
        } else {
            let candidates = device::enumerate_candidates(&config.ignored_devnodes)?;
            match device::pick_best(&candidates) {
                Some(best) => best.devnode.clone(),
                None => return Ok(None),
            }
        };

        Self::open_path(&devnode, config).map(Some)
    }

    fn open_path(devnode: &PathBuf, config: &Config) -> Result<Self> {
        let file = device::open_nonblocking(devnode)?;
        let fd = file.as_raw_fd();

        if config.grab {
            if !device::try_grab(fd) {
                log::warn!("exclusive grab of {} failed after retries, continuing in shared mode", devnode.display());
            }
        }

        let x = device::axis_x_range(fd);
        let y = device::axis_y_range(fd);
        let axis_x = AxisRange { min: x.min, max: x.max };
        let axis_y = AxisRange { min: y.min, max: y.max };
        let pressure_range = device::read_pressure_range(fd);
        let slot_count = device::read_slot_count(fd);

        Ok(Self {
            file,
            axis_x,
            axis_y,
            pressure_range,
            touch: TouchState::new(slot_count),
            draining: false,
        })
    }

    pub fn raw_fd(&self) -> std::os::unix::io::RawFd {
        self.file.as_raw_fd()
    }

    /// Drain whatever is currently available on the fd, processing complete
    /// frames into `self.touch`. Call after `poll` reports `POLLIN`, or
    /// (while sync-draining) on every tick until `EAGAIN`.
    pub fn drain(&mut self, config: &Config, now: Tick) -> ReadOutcome {
        let mut buf = [0u8; INPUT_EVENT_SIZE];
        let mut saw_frame = false;

        loop {
            match self.file.read_exact(&mut buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    self.draining = false;
                    return if saw_frame { ReadOutcome::Frame } else { ReadOutcome::Pending };
                }
                Err(_) => return ReadOutcome::Disconnected,
            }

            let Some((ty, code, value)) = parse_event(&buf) else {
                continue;
            };

            if ty == EV_SYN && code == SYN_DROPPED {
                self.draining = true;
                continue;
            }

            if ty == EV_ABS {
                self.touch.process_abs(code, value, config.button_cooldown_ms, now);
            } else if ty == EV_KEY {
                self.touch.process_key(code, value, config.button_cooldown_ms, now);
            } else if ty == EV_SYN && code == SYN_REPORT {
                self.touch.resolve_frame();
                saw_frame = true;
                if !self.draining {
                    return ReadOutcome::Frame;
                }
            }
        }
    }

    /// Reset slot/derived state on rebind, keeping the binding open (used
    /// after a resync or a reconnect resets the TouchSource entirely).
    pub fn reset_state(&mut self) {
        let slot_count = self.touch.slot_count();
        self.touch = TouchState::new(slot_count);
    }
}

impl Drop for TouchSource {
    fn drop(&mut self) {
        device::ungrab(self.file.as_raw_fd());
    }
}

fn parse_event(buf: &[u8; INPUT_EVENT_SIZE]) -> Option<(u16, u16, i32)> {
    let ty = u16::from_le_bytes([buf[16], buf[17]]);
    let code = u16::from_le_bytes([buf[18], buf[19]]);
    let value = i32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]);
    Some((ty, code, value))
}
