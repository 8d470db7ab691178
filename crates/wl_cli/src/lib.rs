mod cmd;
mod ctx;
mod error;
mod render;
mod signals;
mod table;

use std::{
    fmt,
    io::{self, IsTerminal as _, Write as _},
    num::NonZeroI32,
    path::PathBuf,
    process::ExitCode,
};

use clap::{
    ArgAction, Parser,
    builder::{BoolValueParser, TypedValueParser as _},
};
use cmd::{Commands, Success};
use comfy_table::{Cell, CellAlignment, Row};
use ctx::Ctx;
use error::{Error, Result};
use serde_json::{Map, Value};
use tracing::{error, trace};
use wl_config::Config;

/// Chat with the WorldLink banking assistant.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten, next_help_heading = "Global Options")]
    globals: Globals,

    #[command(subcommand, next_help_heading = "Options")]
    command: Commands,
}

#[derive(Debug, clap::Args)]
pub struct Globals {
    /// Override a configuration value for the duration of the command.
    #[arg(short, long, value_name = "KEY=VALUE", global = true, action = ArgAction::Append)]
    config: Vec<String>,

    /// Load configuration from this file, instead of searching for one.
    #[arg(long, value_name = "PATH", global = true)]
    config_file: Option<PathBuf>,

    /// Increase verbosity of logging.
    ///
    /// Can be specified multiple times to increase verbosity.
    ///
    /// Defaults to printing "error" messages. For each increase in verbosity,
    /// the log level is set to "warn", "info", "debug", and "trace"
    /// respectively.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress all output, including errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[arg(
        long = "no-color",
        alias = "no-colors",
        global = true,
        default_value_t = false,
        value_parser = BoolValueParser::new().map(|v| !v),
        help = "Disable color in the output.",
    )]
    colors: bool,
}

impl fmt::Display for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entry(&"config", &self.globals.config)
            .entry(&"config_file", &self.globals.config_file)
            .entry(&"verbose", &self.globals.verbose)
            .entry(&"quiet", &self.globals.quiet)
            .finish()
    }
}

#[must_use]
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let is_tty = io::stdout().is_terminal();
    let quiet = cli.globals.quiet;

    configure_logging(cli.globals.verbose, quiet);
    trace!(command = cli.command.name(), arguments = %cli, "Starting CLI run.");

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Error::from)
        .and_then(|runtime| runtime.block_on(run_inner(cli)));

    let (code, output) = match result {
        Ok(output) if is_tty => (0, output_to_string(output)),
        Ok(output) => (0, parse_json_output(output)),
        Err(error) => parse_error(error, is_tty),
    };

    if !quiet && !output.is_empty() {
        let mut stdout = io::stdout().lock();
        if let Err(error) = writeln!(stdout, "{output}") {
            error!(%error, "Failed to write output.");
        }
    }

    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

async fn run_inner(cli: Cli) -> Result<Success> {
    let config = load_config(&cli.globals)?;
    let mut ctx = Ctx::new(cli.globals, config)?;

    cli.command.run(&mut ctx).await.map_err(Into::into)
}

fn output_to_string(output: Success) -> String {
    match output {
        Success::Ok => String::new(),
        Success::Message(msg) => msg,
        Success::Table { header, rows } => table::list(header, rows),
        Success::Details { title, rows } => table::details(title.as_deref(), rows),
        Success::Json(value) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
        }
    }
}

fn parse_json_output(output: Success) -> String {
    let value = match output {
        Success::Ok => return String::new(),
        Success::Message(msg) => serde_json::json!({ "message": msg }),
        Success::Table { header, rows } => table::list_json(&header, rows),
        Success::Details { title, rows } => table::details_json(title.as_deref(), rows),
        Success::Json(value) => value,
    };

    serde_json::to_string(&value).unwrap_or_else(|_| value.to_string())
}

fn parse_error(error: Error, is_tty: bool) -> (i32, String) {
    let cmd::Error {
        code,
        message,
        metadata,
    } = cmd::Error::from(error);
    let message = message.map(strip_ansi_escapes::strip_str);

    if is_tty {
        return (
            code.into(),
            table::details(
                message.as_deref(),
                metadata
                    .into_iter()
                    .map(|(k, v)| {
                        let v = match v {
                            Value::String(v) => v,
                            v => v.to_string(),
                        };

                        let mut row = Row::new();
                        row.add_cell(Cell::new(k).set_alignment(CellAlignment::Right))
                            .add_cell(Cell::new(v).set_alignment(CellAlignment::Left));
                        row
                    })
                    .collect::<Vec<_>>(),
            ),
        );
    }

    let metadata = metadata
        .into_iter()
        .filter(|(k, _)| !k.is_empty())
        .collect::<Map<_, _>>();

    let error = serde_json::json!({
        "message": message,
        "metadata": metadata,
        "code": code.get(),
    });

    (code.into(), error.to_string())
}

/// Load the configuration, applying CLI overrides last.
fn load_config(globals: &Globals) -> Result<Config> {
    let overrides = globals
        .config
        .iter()
        .map(|assignment| wl_config::parse_assignment(assignment))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    trace!(overrides = ?overrides, "Applying CLI config overrides.");

    wl_config::load(globals.config_file.as_deref(), std::env::vars(), &overrides)
        .map_err(Into::into)
}

fn configure_logging(verbose: u8, quiet: bool) {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::fmt;

    let mut level = match verbose {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    if quiet {
        level = LevelFilter::OFF;
    }

    let mut filter = vec!["off".to_owned()];
    for krate in ["chat", "cli", "client", "config", "conversation", "sse"] {
        filter.push(format!("wl_{krate}={level}"));
    }

    let format = fmt::format().with_target(false).compact();

    if level < LevelFilter::DEBUG {
        tracing_subscriber::fmt()
            .event_format(format)
            .without_time()
            .with_ansi(true)
            .with_target(false)
            .with_writer(io::stderr)
            .with_env_filter(filter.join(","))
            .init();
    } else {
        tracing_subscriber::fmt()
            .event_format(format)
            .with_ansi(true)
            .with_target(false)
            .with_writer(io::stderr)
            .with_env_filter(filter.join(","))
            .init();
    }
}
