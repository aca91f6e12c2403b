//! Candidate enumeration, opening, grabbing and reading of the real kernel
//! touchpad device node (§4.1). Enumeration goes through `udev`, following
//! the same `Enumerator`/`property_value`/`devnode` pattern used elsewhere
//! in this codebase for other device classes; opening and grabbing talk
//! directly to the kernel evdev ioctls via `libc`, since that surface has
//! no higher-level wrapper here.

use std::fs::File;
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::touch_source::state::{ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_PRESSURE, ABS_MT_SLOT, ABS_X, ABS_Y, ABS_PRESSURE};

/// One touchpad candidate found during enumeration (§4.1 Enumeration).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub devnode: PathBuf,
    pub name: String,
    pub integrated: bool,
    pub finger_tool: bool,
    pub mouse_like: bool,
    pub axis_x: AbsInfo,
    pub axis_y: AbsInfo,
    pub area: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AbsInfo {
    pub min: i32,
    pub max: i32,
}

impl AbsInfo {
    fn span(&self) -> i64 {
        (self.max as i64 - self.min as i64).max(0)
    }
}

/// Enumerate every udev device tagged as a touchpad, excluding
/// `ignored_devnodes`, and build a scored candidate for each.
pub fn enumerate_candidates(ignored: &[PathBuf]) -> Result<Vec<Candidate>> {
    let mut enumerator = udev::Enumerator::new()?;
    enumerator.match_subsystem("input")?;

    let mut candidates = Vec::new();
    for device in enumerator.scan_devices()? {
        if device.property_value("ID_INPUT_TOUCHPAD").map(|v| v != "1").unwrap_or(true) {
            continue;
        }
        let Some(devnode) = device.devnode().map(Path::to_path_buf) else {
            continue;
        };
        if !devnode.to_string_lossy().contains("event") || ignored.iter().any(|p| p == &devnode) {
            continue;
        }

        let Ok((axis_x, axis_y)) = read_axis_ranges(&devnode) else {
            continue;
        };
        if axis_x.span() <= 0 || axis_y.span() <= 0 {
            continue;
        }

        let name = device
            .property_value("NAME")
            .map(|v| v.to_string_lossy().trim_matches('"').to_string())
            .or_else(|| device.sysname().to_str().map(str::to_string))
            .unwrap_or_else(|| devnode.display().to_string());

        let integrated = device
            .property_value("ID_INPUT_TOUCHPAD_INTEGRATION")
            .map(|v| v == "internal")
            .unwrap_or(false);
        let mouse_like = device.property_value("ID_INPUT_MOUSE").map(|v| v == "1").unwrap_or(false);
        let finger_tool = device
            .property_value("ID_INPUT_TOUCHPAD")
            .map(|v| v == "1")
            .unwrap_or(false);

        candidates.push(Candidate {
            devnode,
            name,
            integrated,
            finger_tool,
            mouse_like,
            axis_x,
            axis_y,
            area: axis_x.span() * axis_y.span(),
        });
    }

    Ok(candidates)
}

/// Lexicographic scoring key from §4.1: `(integrated, finger_tool, !mouse_like, area)`.
fn score_key(candidate: &Candidate) -> (bool, bool, bool, i64) {
    (candidate.integrated, candidate.finger_tool, !candidate.mouse_like, candidate.area)
}

/// Pick the best-scoring candidate, ties broken by iteration order (first wins).
pub fn pick_best(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().max_by_key(|c| score_key(c))
}

const EVIOCGRAB: libc::c_ulong = 0x4004_4590;

fn eviocgabs(abs: u16) -> libc::c_ulong {
    0x8018_4540 + abs as libc::c_ulong
}

#[repr(C)]
#[derive(Default)]
struct InputAbsinfo {
    value: i32,
    minimum: i32,
    maximum: i32,
    fuzz: i32,
    flat: i32,
    resolution: i32,
}

fn query_abs(fd: RawFd, code: u16) -> Option<AbsInfo> {
    let mut info = InputAbsinfo::default();
    let ret = unsafe { libc::ioctl(fd, eviocgabs(code), &mut info as *mut InputAbsinfo) };
    if ret < 0 || info.maximum <= info.minimum {
        return None;
    }
    Some(AbsInfo { min: info.minimum, max: info.maximum })
}

/// Read the X/Y axis ranges for a candidate node, preferring multi-touch
/// position axes and falling back to single-touch `ABS_X/Y` (§4.1).
fn read_axis_ranges(path: &Path) -> std::io::Result<(AbsInfo, AbsInfo)> {
    let file = std::fs::OpenOptions::new().read(true).open(path)?;
    let fd = file.as_raw_fd();
    Ok((axis_x_range(fd), axis_y_range(fd)))
}

/// Same lookup as `read_axis_ranges`, against an already-open fd.
pub fn axis_x_range(fd: RawFd) -> AbsInfo {
    query_abs(fd, ABS_MT_POSITION_X).or_else(|| query_abs(fd, ABS_X)).unwrap_or_default()
}

pub fn axis_y_range(fd: RawFd) -> AbsInfo {
    query_abs(fd, ABS_MT_POSITION_Y).or_else(|| query_abs(fd, ABS_Y)).unwrap_or_default()
}

/// Read the pressure axis range, if the device reports one (§4.1: min != max).
pub fn read_pressure_range(fd: RawFd) -> Option<(i32, i32)> {
    query_abs(fd, ABS_MT_PRESSURE)
        .or_else(|| query_abs(fd, ABS_PRESSURE))
        .map(|info| (info.min, info.max))
}

/// The number of reported `ABS_MT_SLOT` channels, defaulting to 1 if unreported.
pub fn read_slot_count(fd: RawFd) -> usize {
    query_abs(fd, ABS_MT_SLOT)
        .map(|info| (info.max - info.min + 1).max(1) as usize)
        .unwrap_or(1)
}

/// Open the chosen node non-blocking. The returned `File` owns the fd and
/// closes it on drop (§5 Resource policy: scoped acquire/release).
pub fn open_nonblocking(path: &Path) -> std::io::Result<File> {
    let fd = unsafe {
        libc::open(
            path_cstr(path).as_ptr(),
            libc::O_RDONLY | libc::O_NONBLOCK,
        )
    };
    if fd < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(unsafe { File::from_raw_fd(fd) })
}

fn path_cstr(path: &Path) -> std::ffi::CString {
    std::ffi::CString::new(path.as_os_str().as_encoded_bytes()).expect("device path contains a NUL byte")
}

/// Acquire an exclusive grab, retrying up to 3 times with exponential
/// backoff (10ms, 20ms, 40ms) per §4.1.
pub fn try_grab(fd: RawFd) -> bool {
    let mut delay_ms = 10;
    for attempt in 0..3 {
        let ret = unsafe { libc::ioctl(fd, EVIOCGRAB, 1i32) };
        if ret == 0 {
            return true;
        }
        if attempt < 2 {
            thread::sleep(Duration::from_millis(delay_ms));
            delay_ms *= 2;
        }
    }
    false
}

pub fn ungrab(fd: RawFd) {
    unsafe {
        libc::ioctl(fd, EVIOCGRAB, 0i32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(integrated: bool, finger_tool: bool, mouse_like: bool, area: i64) -> Candidate {
        Candidate {
            devnode: PathBuf::from("/dev/input/eventX"),
            name: "test".into(),
            integrated,
            finger_tool,
            mouse_like,
            axis_x: AbsInfo { min: 0, max: 1000 },
            axis_y: AbsInfo { min: 0, max: 1000 },
            area,
        }
    }

    #[test]
    fn integrated_beats_larger_external() {
        let internal = candidate(true, true, false, 100);
        let external = candidate(false, true, false, 10_000_000);
        let best = pick_best(&[internal.clone(), external]).unwrap();
        assert_eq!(best.devnode, internal.devnode);
    }

    #[test]
    fn non_mouse_like_wins_ties_otherwise_equal() {
        let touchpad = candidate(false, true, false, 500);
        let mouse = candidate(false, true, true, 500);
        let best = pick_best(&[mouse, touchpad.clone()]).unwrap();
        assert_eq!(best.mouse_like, false);
    }
}
