//! herakles-process-explorer
//!
//! Process explorer with engine and protection classification.
//! This is the main entry point that sets up logging and dispatches subcommands.

mod cli;
mod commands;
mod config;

use clap::{Parser, ValueEnum};
use tracing::{debug, error, info, Level};

use cli::{Args, Commands, LogLevel};
use commands::watch::WatchOptions;
use commands::{
    command_check, command_config, command_generate_testdata, command_inspect, command_list,
    command_signatures, command_watch,
};
use config::{resolve_config, show_config, validate_effective_config, Config};

/// CLI level if given, then the config's `log_level`, then warn.
fn effective_log_level(config: &Config, args: &Args) -> LogLevel {
    args.log_level
        .or_else(|| {
            config
                .log_level
                .as_deref()
                .and_then(|s| LogLevel::from_str(s, true).ok())
        })
        .unwrap_or(LogLevel::Warn)
}

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config, args: &Args) {
    let level = effective_log_level(config, args);
    let log_level = match level {
        LogLevel::Off => return,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Sizes the global rayon pool used by parallel scans.
fn configure_parallelism(config: &Config) {
    if let Some(threads) = config.parallelism {
        if threads > 0 {
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
                Ok(()) => debug!("Rayon thread pool configured with {} threads", threads),
                Err(e) => error!("Failed to set rayon thread pool: {}", e),
            }
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config, &args);
    configure_parallelism(&config);

    match args.command {
        Some(Commands::List {
            filter,
            sort,
            format,
            limit,
        }) => command_list(filter, sort, format, limit, &config)?,

        Some(Commands::Watch {
            filter,
            sort,
            interval_ms,
            frames,
            limit,
            select,
        }) => {
            let opts = WatchOptions {
                filter,
                sort,
                interval_ms,
                frames,
                limit,
                select,
            };
            command_watch(opts, &config).await?
        }

        Some(Commands::Inspect { pid, format }) => command_inspect(pid, format, &config)?,

        Some(Commands::Signatures { verbose }) => command_signatures(verbose, &config)?,

        Some(Commands::Check {
            proc,
            privileges,
            all,
        }) => {
            if !command_check(proc, privileges, all, &config)? {
                std::process::exit(1);
            }
        }

        Some(Commands::GenerateTestdata {
            output,
            count,
            with_system,
        }) => command_generate_testdata(output, count, with_system)?,

        Some(Commands::Config {
            output,
            format,
            commented,
        }) => command_config(output, format, commented)?,

        // No subcommand: one listing with the configured view
        None => command_list(None, None, cli::OutputFormat::Table, None, &config)?,
    }

    Ok(())
}
