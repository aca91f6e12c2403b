mod clock;
mod config;
mod controller;
mod edge;
mod error;
mod pulser;
mod relative_sink;
mod touch_source;
mod watchdog;

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use config::{Cli, Config};
use controller::Controller;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// The sole process-wide static (§9 Design notes): set only by the signal
/// handler, read by the Controller and Pulser to know when to stop.
pub static RUNNING: AtomicBool = AtomicBool::new(true);

extern "C" fn handle_shutdown_signal(_signum: libc::c_int) {
    RUNNING.store(false, Ordering::Relaxed);
}

fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGINT, handle_shutdown_signal as usize);
        libc::signal(libc::SIGTERM, handle_shutdown_signal as usize);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_devices {
        std::process::exit(run_list_devices(&cli));
    }

    let config = match Config::load(&cli).and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("\nRun with --help for usage information");
            std::process::exit(2);
        }
    };

    install_signal_handlers();

    if let Err(e) = run(config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

/// `--list-devices`: print one line per candidate, exit 0 on success / 1
/// if none are found (§6 Subcommands / modes).
fn run_list_devices(cli: &Cli) -> i32 {
    let ignored = cli.ignored_devnodes.clone();
    let candidates = match touch_source::device::enumerate_candidates(&ignored) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error enumerating devices: {e}");
            return 1;
        }
    };

    if candidates.is_empty() {
        eprintln!("No touchpad candidates found");
        return 1;
    }

    for candidate in &candidates {
        println!(
            "{}\t{}\tintegrated={}\tarea={}\trange=[{}..{}]x[{}..{}]",
            candidate.devnode.display(),
            candidate.name,
            if candidate.integrated { "yes" } else { "no" },
            candidate.area,
            candidate.axis_x.min,
            candidate.axis_x.max,
            candidate.axis_y.min,
            candidate.axis_y.max,
        );
    }

    0
}

fn run(config: Config) -> Result<()> {
    log::info!(
        "Starting edge-motion: mode={}, edge_threshold={}, hold_ms={}, pulse_ms={}, grab={}",
        config.mode, config.edge_threshold, config.hold_ms, config.pulse_ms, config.grab
    );

    let mut controller = Controller::new(config)?;
    controller.run(&RUNNING);
    Ok(())
}
