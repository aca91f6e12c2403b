//! Optional resource-usage watchdog (§6 external collaborator). Samples
//! this process's own RSS and CPU usage every tick it's due, and trips a
//! fatal stop after `resource_grace_checks` consecutive over-threshold
//! samples. Not a separate execution context — ticked from inside the
//! Controller loop (§5 Resource policy).

use std::process::Command as ProcessCommand;
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};

const SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy)]
pub struct WatchdogConfig {
    pub max_rss_mb: u64,
    pub max_cpu_percent: f32,
    pub resource_grace_checks: u32,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            max_rss_mb: 256,
            max_cpu_percent: 90.0,
            resource_grace_checks: 5,
        }
    }
}

pub struct Watchdog {
    config: WatchdogConfig,
    system: System,
    pid: Pid,
    last_sample: Instant,
    consecutive_breaches: u32,
}

impl Watchdog {
    pub fn new(config: WatchdogConfig) -> Self {
        let pid = Pid::from_u32(std::process::id());
        let system = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
        );
        Self {
            config,
            system,
            pid,
            last_sample: Instant::now(),
            consecutive_breaches: 0,
        }
    }

    /// Call once per Controller tick. Returns `true` exactly once, when
    /// this sample breaks the grace window — the caller should stop.
    pub fn tick(&mut self) -> bool {
        if self.last_sample.elapsed() < SAMPLE_INTERVAL {
            return false;
        }
        self.last_sample = Instant::now();

        self.system.refresh_process(self.pid);
        let Some(process) = self.system.process(self.pid) else {
            return false;
        };

        let rss_mb = process.memory() / 1024 / 1024;
        let cpu_percent = process.cpu_usage();

        if rss_mb > self.config.max_rss_mb || cpu_percent > self.config.max_cpu_percent {
            self.consecutive_breaches += 1;
        } else {
            self.consecutive_breaches = 0;
        }

        if self.consecutive_breaches >= self.config.resource_grace_checks {
            log::error!(
                "resource watchdog tripped: rss={}MB cpu={:.1}% (limits {}MB / {:.1}%)",
                rss_mb, cpu_percent, self.config.max_rss_mb, self.config.max_cpu_percent
            );
            maybe_show_dialog(rss_mb, cpu_percent);
            return true;
        }

        false
    }
}

/// Best-effort, fire-and-forget GUI error popup, gated on `DISPLAY` being
/// set (§9 Design notes). Never blocks teardown: the child is spawned and
/// immediately dropped.
fn maybe_show_dialog(rss_mb: u64, cpu_percent: f32) {
    if std::env::var_os("DISPLAY").is_none() {
        return;
    }

    let message = format!(
        "edge-motion stopped: resource usage exceeded limits (rss={}MB, cpu={:.1}%)",
        rss_mb, cpu_percent
    );

    let _ = ProcessCommand::new("zenity")
        .arg("--error")
        .arg("--text")
        .arg(message)
        .spawn();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_match_spec() {
        let config = WatchdogConfig::default();
        assert_eq!(config.max_rss_mb, 256);
        assert_eq!(config.max_cpu_percent, 90.0);
        assert_eq!(config.resource_grace_checks, 5);
    }

    #[test]
    fn fresh_watchdog_does_not_trip_immediately() {
        let mut watchdog = Watchdog::new(WatchdogConfig::default());
        assert!(!watchdog.tick(), "first tick is within the 1000ms sample interval");
    }
}
