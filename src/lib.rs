#[macro_use]
extern crate bitflags;

/// Find a Bematech thermal printer on the USB bus, attach it and talk its command protocol.
pub mod printer;

/// Load the TOML configuration of the operator tool.
pub mod config;

/// Install the tracing subscriber.
pub mod logging;
