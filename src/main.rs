use bematech_usb::{
    config::{Config, LogSettings},
    logging,
    printer::{Printer, UNKNOWN_COMMAND_SET},
};

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

/// Interactive menu over the printer operations.
mod ui;

#[derive(Parser)]
#[command(version, about = "Drive a Bematech USB thermal receipt printer")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// USB product ID of the printer, decimal or 0x-prefixed hex
    #[arg(short, long, value_parser = parse_product_id)]
    product_id: Option<u16>,

    /// Log filter, e.g. "debug" or "bematech_usb=trace"
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive console (default)
    Console,
    /// Print the product info fields
    Info,
    /// Print the command set identifier
    CommandSet,
    /// Send raw printer commands from a file, or from stdin with "-"
    Print { file: PathBuf },
    /// Reset the printer and reconnect
    Reset,
}

fn parse_product_id(value: &str) -> Result<u16, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };

    parsed.map_err(|e| format!("invalid product ID {:?}: {}", value, e))
}

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Open the printer, run `f` and close it again, whatever `f` returned.
fn with_open<F>(mut printer: Printer, f: F) -> AppResult<()>
where
    F: FnOnce(&mut Printer) -> AppResult<()>,
{
    printer.open()?;

    let result = f(&mut printer);
    printer.close();

    result
}

fn run(command: Command, config: Config) -> AppResult<()> {
    let printer = Printer::with_settings(config.product_id, config.session)?;

    match command {
        Command::Console => ui::App::run(printer),

        Command::Info => with_open(printer, |printer| {
            let info = printer.product_info();

            if info.is_empty() {
                return Err("The printer answered none of the product info queries.".into());
            }

            for (field, _) in info.iter() {
                println!("{}: {}", field, info.text(field).unwrap_or_default());
            }

            Ok(())
        }),

        Command::CommandSet => with_open(printer, |printer| match printer.command_set() {
            UNKNOWN_COMMAND_SET => Err("The printer did not report its command set.".into()),

            command_set => {
                println!("{}", command_set);
                Ok(())
            }
        }),

        Command::Print { file } => {
            let data = if file.as_os_str() == "-" {
                let mut data = Vec::new();
                io::stdin().read_to_end(&mut data)?;
                data
            } else {
                fs::read(&file)?
            };

            with_open(printer, |printer| Ok(printer.send_command(&data)?))
        }

        Command::Reset => with_open(printer, |printer| Ok(printer.reset()?)),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match Config::load_or_default(args.config.as_deref()) {
        Ok(config) => config,

        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Some(product_id) = args.product_id {
        config.product_id = product_id;
    }

    if let Some(level) = &args.log_level {
        config.log.level = level.clone();
    }

    // The console owns the terminal, so it always logs to a file.
    let is_console = matches!(args.command, None | Some(Command::Console));
    let log_file = match (&config.log.file, is_console) {
        (Some(file), _) => Some(file.clone()),
        (None, true) => Some(LogSettings::default_file()),
        (None, false) => None,
    };

    if let Err(err) = logging::setup_logging(&config.log.level, log_file.as_deref()) {
        eprintln!("{}", err);
        return ExitCode::FAILURE;
    }

    match run(args.command.unwrap_or(Command::Console), config) {
        Ok(()) => ExitCode::SUCCESS,

        Err(err) => {
            error!("{}", err);
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
