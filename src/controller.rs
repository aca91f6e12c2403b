//! C5 Controller: the main loop. Owns the `TouchSource` binding and
//! `TouchState`, runs the edge-decision engine, publishes to
//! `SharedCommand`, and drives reconnect/watchdog handling (§4.5, §5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::clock::Tick;
use crate::config::Config;
use crate::edge::EdgeDecision;
use crate::error::Result;
use crate::pulser::{self, Command, SharedCommand};
use crate::relative_sink::RelativeSink;
use crate::touch_source::{ReadOutcome, TouchSource};
use crate::watchdog::{Watchdog, WatchdogConfig};

const RECONNECT_AFTER_DISCONNECT_MS: u64 = 200;
const REOPEN_POLL_MS: u64 = 250;

pub struct Controller {
    config: Config,
    source: Option<TouchSource>,
    decision: EdgeDecision,
    next_reopen_at: Option<Tick>,
    shared: Arc<SharedCommand>,
    watchdog: Watchdog,
    pulser_handle: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self> {
        let source = TouchSource::open(&config)?;
        if source.is_none() {
            return Err("no touchpad candidate found".into());
        }

        let shared = SharedCommand::new();
        let sink = RelativeSink::create()?;
        let pulser_handle = spawn_pulser(Arc::clone(&shared), config.clone(), sink);

        Ok(Self {
            config,
            source,
            decision: EdgeDecision::new(),
            next_reopen_at: None,
            shared,
            watchdog: Watchdog::new(WatchdogConfig::default()),
            pulser_handle: Some(pulser_handle),
        })
    }

    /// Run until `running` clears or a fatal condition (watchdog trip) occurs.
    pub fn run(&mut self, running: &'static AtomicBool) {
        let mut previous_command = Command::default();

        while running.load(Ordering::Relaxed) {
            if self.watchdog.tick() {
                running.store(false, Ordering::Relaxed);
                break;
            }

            let now = Tick::now();

            if let Some(source) = &mut self.source {
                self.decision.tick(
                    &mut source.touch,
                    &self.config,
                    source.axis_x,
                    source.axis_y,
                    source.pressure_range,
                    now,
                );
            } else {
                self.decision = EdgeDecision::new();
            }

            let command = Command {
                armed: self.decision.armed,
                dir_x: self.decision.dir_x,
                dir_y: self.decision.dir_y,
                speed_factor: self.decision.speed_factor,
            };
            if command != previous_command {
                self.shared.publish(command);
                previous_command = command;
            }

            let timeout_ms = self.poll_timeout_ms(now);
            self.poll_and_drain(timeout_ms, now);

            if self.source.is_none() {
                self.maybe_reopen(now);
            }
        }

        self.shutdown();
    }

    fn poll_timeout_ms(&self, now: Tick) -> i32 {
        if self.source.is_none() {
            let target = self.next_reopen_at.unwrap_or(now);
            return now.until_ms(target).min(i32::MAX as u64) as i32;
        }

        if self.decision.dir_x != 0 || self.decision.dir_y != 0 {
            if let Some(elapsed) = self.decision.ms_since_entered(now) {
                if !self.decision.armed {
                    return self.config.hold_ms.saturating_sub(elapsed).min(i32::MAX as u64) as i32;
                }
            }
        }

        -1
    }

    fn poll_and_drain(&mut self, timeout_ms: i32, now: Tick) {
        let Some(source) = self.source.as_mut() else {
            std::thread::sleep(std::time::Duration::from_millis(timeout_ms.max(0) as u64));
            return;
        };

        let mut pollfd = libc::pollfd {
            fd: source.raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };

        let ready = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
        if ready <= 0 {
            return;
        }

        let disconnected = if pollfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
            true
        } else if pollfd.revents & libc::POLLIN != 0 {
            matches!(source.drain(&self.config, now), ReadOutcome::Disconnected)
        } else {
            false
        };

        if disconnected {
            self.disconnect(now);
        }
    }

    fn disconnect(&mut self, now: Tick) {
        log::warn!("touchpad source disconnected, entering reconnect loop");
        self.source = None;
        self.shared.publish(Command::default());
        self.next_reopen_at = Some(now.plus_ms(RECONNECT_AFTER_DISCONNECT_MS));
    }

    fn maybe_reopen(&mut self, now: Tick) {
        let Some(target) = self.next_reopen_at else { return };
        if now < target {
            return;
        }

        match TouchSource::open(&self.config) {
            Ok(Some(mut source)) => {
                source.reset_state();
                self.source = Some(source);
                self.decision = EdgeDecision::new();
                self.next_reopen_at = None;
                log::info!("touchpad source reconnected");
            }
            Ok(None) | Err(_) => {
                self.next_reopen_at = Some(now.plus_ms(REOPEN_POLL_MS));
            }
        }
    }

    fn shutdown(&mut self) {
        self.shared.publish(Command::default());
        if let Some(handle) = self.pulser_handle.take() {
            let _ = handle.join();
        }
    }
}

fn spawn_pulser(shared: Arc<SharedCommand>, config: Config, sink: RelativeSink) -> JoinHandle<()> {
    std::thread::spawn(move || pulser::run(shared, &crate::RUNNING, config, Some(sink)))
}
