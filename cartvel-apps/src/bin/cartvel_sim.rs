use std::{
    io::{self, Write},
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use cartvel_apps::{forward_twists, utils::init_tracing, ReportLine, SimConfig};
use cartvel_controller::{CartesianVelocityController, ControlLoop, StateReport};
use cartvel_hw::TracingJointHandle;
use clap::Parser;
use schemars::schema_for;
use tracing::{debug, info, warn};

/// Runs the Cartesian velocity controller against simulated joints.
///
/// Reads twists from stdin as `vx vy vz wx wy wz` lines and writes state
/// reports to stdout as JSON lines.
#[derive(Debug, Parser)]
#[clap(name = env!("CARGO_BIN_NAME"))]
struct Args {
    /// Path to the setting file.
    #[clap(short, long, value_parser)]
    config_path: Option<PathBuf>,
    /// Stop after this many seconds. Without it the simulation stops when
    /// stdin is closed.
    #[clap(long)]
    duration_secs: Option<f64>,
    /// Print the default setting file and exit.
    #[clap(long)]
    show_default_config: bool,
    /// Print the JSON schema of the setting file and exit.
    #[clap(long)]
    show_schema: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    debug!(?args);

    if args.show_default_config {
        print!("{}", toml::to_string(&SimConfig::default())?);
        return Ok(());
    }
    if args.show_schema {
        println!("{}", serde_json::to_string_pretty(&schema_for!(SimConfig))?);
        return Ok(());
    }

    let deadline = match args.duration_secs {
        Some(secs) => Some(
            Instant::now()
                + Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("invalid --duration-secs {secs}"))?,
        ),
        None => None,
    };
    let config = match &args.config_path {
        Some(path) => SimConfig::new(path)?,
        None => SimConfig::default(),
    };

    let chain = config.create_chain()?;
    // Per-call joint traces are visible with `RUST_LOG=cartvel_hw=trace`.
    let joints: Vec<_> = config
        .create_joints(&chain)?
        .into_iter()
        .map(TracingJointHandle::new)
        .collect();
    let (report_tx, report_rx) = flume::unbounded::<StateReport>();
    let controller = CartesianVelocityController::new(
        &config.controller,
        chain,
        joints,
        config.command_interface.writer(),
        report_tx,
    )?;
    let commander = controller.twist_commander();
    let handle = ControlLoop::spawn(controller, config.control_period()?)?;

    let (stdin_done_tx, stdin_done_rx) = flume::bounded::<()>(1);
    thread::Builder::new()
        .name("cartvel-stdin".into())
        .spawn(move || {
            match forward_twists(io::stdin().lock(), &commander) {
                Ok(sent) => debug!("stdin closed after {sent} twists"),
                Err(e) => warn!("failed to read stdin: {e}"),
            }
            commander.stop();
            drop(stdin_done_tx);
        })?;

    let mut stdout = io::stdout().lock();
    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        if deadline.is_none() && stdin_done_rx.is_disconnected() {
            break;
        }
        match report_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(report) => {
                serde_json::to_writer(&mut stdout, &ReportLine::from(&report))?;
                writeln!(stdout)?;
                stdout.flush()?;
            }
            Err(flume::RecvTimeoutError::Timeout) => {}
            // Reporting is disabled.
            Err(flume::RecvTimeoutError::Disconnected) => thread::sleep(Duration::from_millis(50)),
        }
    }

    let cycles = handle.cycles();
    let controller = handle.stop();
    info!(
        "ran {cycles} cycles, final pose {:?}",
        controller.achieved_pose().translation.vector
    );
    Ok(())
}
