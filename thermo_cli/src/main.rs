mod cli;
mod error_fmt;
mod watch;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);
    let _ = color_eyre::install();

    match run(args) {
        Ok(()) => {}
        Err(err) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", error_fmt::format_error_json(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            std::process::exit(error_fmt::exit_code_for_error(&err));
        }
    }
}

fn run(args: Cli) -> eyre::Result<()> {
    let cfg = load_config(&args.config)?;
    init_tracing(&args, &cfg.logging)?;
    tracing::debug!(config = ?args.config, sim = args.sim, "starting");

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })
        .wrap_err("install Ctrl-C handler")?;
    }

    match args.cmd {
        Commands::Watch {
            duration_s,
            setpoint,
            send_pid,
            save,
        } => watch::run_watch(
            &cfg,
            args.sim,
            duration_s,
            setpoint,
            send_pid,
            save.as_deref(),
            shutdown,
        ),
        Commands::Set {
            setpoint,
            output,
            pid,
        } => watch::run_set(&cfg, args.sim, setpoint, output, pid),
        Commands::Ports => watch::run_ports(),
        Commands::SelfCheck => watch::run_self_check(),
    }
}

fn load_config(path: &Path) -> eyre::Result<thermo_config::Config> {
    if !path.exists() {
        // Defaults keep --sim workflows working without any file on disk.
        return Ok(thermo_config::Config::default());
    }
    let text =
        std::fs::read_to_string(path).wrap_err_with(|| format!("read config {path:?}"))?;
    let cfg = thermo_config::load_toml(&text)
        .map_err(|e| eyre::eyre!("parse config {path:?}: {e}"))?;
    cfg.validate()?;
    Ok(cfg)
}

fn init_tracing(args: &Cli, logging: &thermo_config::Logging) -> eyre::Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let level = logging.level.as_deref().unwrap_or(&args.log_level);
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .map_err(|e| eyre::eyre!("invalid log level `{level}`: {e}"))?;

    let file_layer = match &logging.file {
        Some(file) => {
            let path = Path::new(file);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path.file_name().unwrap_or(path.as_os_str());
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(
                    dir.unwrap_or(Path::new(".")),
                    name,
                ),
                Some("hourly") => tracing_appender::rolling::hourly(
                    dir.unwrap_or(Path::new(".")),
                    name,
                ),
                _ => tracing_appender::rolling::never(dir.unwrap_or(Path::new(".")), name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if args.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}
