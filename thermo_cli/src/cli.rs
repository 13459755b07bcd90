//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "thermo", version, about = "Heater controller link CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/thermo.toml")]
    pub config: PathBuf,

    /// Talk to the built-in simulated heater instead of a serial port
    #[arg(long, action = ArgAction::SetTrue)]
    pub sim: bool,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Heater output switch position.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputMode {
    On,
    Off,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream live telemetry from the device
    Watch {
        /// Stop after this many seconds (default: run until Ctrl-C)
        #[arg(long, value_name = "SECONDS")]
        duration_s: Option<u64>,

        /// Command this setpoint (deg C) once connected; clamped to the
        /// configured range
        #[arg(long, value_name = "DEG_C")]
        setpoint: Option<f32>,

        /// Forward the configured PID coefficients once connected
        #[arg(long, action = ArgAction::SetTrue)]
        send_pid: bool,

        /// Write the session snapshot to this JSON file on exit
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },
    /// Issue one or more directives and exit
    Set {
        /// Setpoint in deg C; clamped to the configured range
        #[arg(long, value_name = "DEG_C")]
        setpoint: Option<f32>,

        /// Switch the heater output
        #[arg(long, value_enum, value_name = "MODE")]
        output: Option<OutputMode>,

        /// Forward the configured PID coefficients
        #[arg(long, action = ArgAction::SetTrue)]
        pid: bool,
    },
    /// List serial ports visible to the process
    Ports,
    /// Quick health check against the simulated heater
    SelfCheck,
}
