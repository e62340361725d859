//! Logging setup

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to open the log file: {0}")]
    File(#[from] io::Error),

    #[error("A global logger is already installed.")]
    AlreadyInstalled,
}

/// Install the tracing subscriber. `RUST_LOG` takes precedence over `default_level`.
/// With a `file`, output goes there without colors instead of stderr.
pub fn setup_logging(default_level: &str, file: Option<&Path>) -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| Error::Filter(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = match file {
        Some(path) => {
            let file = open_log_file(path)?;

            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
        }

        None => registry
            .with(fmt::layer().with_writer(io::stderr))
            .try_init(),
    };

    result.map_err(|_| Error::AlreadyInstalled)
}

fn open_log_file(path: &Path) -> Result<File, io::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    OpenOptions::new().create(true).append(true).open(path)
}
