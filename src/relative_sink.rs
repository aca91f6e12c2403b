//! C3 RelativeSink: the synthetic relative-pointing device the Pulser
//! drives. Built the same way the teacher builds its uinput devices
//! (`UinputDevice::builder()...build(name)?`), but with `EV_REL` axes
//! instead of the teacher's `EV_ABS` touch/pen surfaces.

use std::thread;
use std::time::Duration;

use evdevil::event::{Rel, RelEvent};
use evdevil::uinput::UinputDevice;
use evdevil::{Bus, InputId};

use crate::error::Result;

const VENDOR: u16 = 0x1234;
const PRODUCT: u16 = 0x5678;
const VERSION: u16 = 1;
const SETTLE: Duration = Duration::from_millis(50);

/// Owns the virtual device's uinput fd; destroyed (closed) on drop.
pub struct RelativeSink {
    device: UinputDevice,
}

impl RelativeSink {
    /// Create the virtual device and sleep ~50ms so the kernel and any
    /// user-space consumers enumerate it before the first emission (§4.4).
    pub fn create() -> Result<Self> {
        let device = UinputDevice::builder()?
            .with_input_id(InputId::new(Bus::from_raw(0x06), VENDOR, PRODUCT, VERSION))?
            .with_rel_axes([Rel::X, Rel::Y, Rel::WHEEL, Rel::HWHEEL])?
            .build("edge-motion-virtual-mouse")?;

        thread::sleep(SETTLE);

        Ok(Self { device })
    }

    /// Emit `REL_X`/`REL_Y` (motion mode), skipping axes that are zero, per
    /// §4.3 step 4. Retries on `EINTR`; sleeps 1ms and retries once on
    /// `EAGAIN`/`EWOULDBLOCK`; any other error is fatal for this pulse.
    pub fn emit_motion(&self, dx: i32, dy: i32) -> Result<()> {
        let mut events = Vec::with_capacity(2);
        if dx != 0 {
            events.push(RelEvent::new(Rel::X, dx).into());
        }
        if dy != 0 {
            events.push(RelEvent::new(Rel::Y, dy).into());
        }
        self.write_with_retry(&events)
    }

    /// Emit `REL_HWHEEL`/`REL_WHEEL` (scroll mode), skipping axes that are
    /// zero, per §4.3 step 4.
    pub fn emit_scroll(&self, hwheel: i32, wheel: i32) -> Result<()> {
        let mut events = Vec::with_capacity(2);
        if hwheel != 0 {
            events.push(RelEvent::new(Rel::HWHEEL, hwheel).into());
        }
        if wheel != 0 {
            events.push(RelEvent::new(Rel::WHEEL, wheel).into());
        }
        self.write_with_retry(&events)
    }

    fn write_with_retry(&self, events: &[evdevil::event::InputEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        loop {
            match self.device.writer().write(events) {
                Ok(writer) => return writer.finish().map_err(Into::into),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(1));
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
