use tracing::warn;

/// USB Vendor ID for Bematech printers
pub const VENDOR_ID: u16 = 0x0b1b;

/// Endpoints used until discovery has resolved the real ones.
pub const DEFAULT_WRITE_ENDPOINT: u8 = 0x01;
pub const DEFAULT_READ_ENDPOINT: u8 = 0x82;

/// A snapshot of the USB bus tree, independent of the USB library.
pub mod topology;

/// Find the configuration, interface, alternate setting and bulk endpoints of a printer.
mod scan;
pub use scan::{select_endpoints, EndpointSelection};

/// The seam to the USB library.
mod backend;
pub use backend::{RusbBackend, UsbBackend, UsbHandle};

/// There are different printer families with variable USB parameters.
mod model;
pub use model::{ControlStep, Model, Quirks};

mod settings;
pub use settings::{RetryPolicy, Settings};

/// Search the bus for the printer, attach it and detach it again.
mod attach;
pub use attach::Error as AttachError;

/// Raw transfers on the opened device.
mod io;
pub use io::Error as TransferError;

/// Handshakes and the raw command passthrough.
mod command;

/// Queries for the command set and product metadata.
mod info;
pub use info::{Error as QueryError, InfoField, ProductInfo, UNKNOWN_COMMAND_SET};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    /// Also kept after a failed handshake while the interface is still claimed.
    Opening,
    Open,
    Resetting,
}

pub struct Printer<B: UsbBackend = RusbBackend> {
    backend: B,
    product_id: u16,
    settings: Settings,
    state: SessionState,
    handle: Option<B::Handle>,
    model: Model,
    interface_number: Option<u8>,
    in_addr: u8,
    out_addr: u8,
}

impl Printer {
    /// Initialize libusb and create an unopened session for the given product.
    pub fn new(product_id: u16) -> Result<Self, rusb::Error> {
        Self::with_settings(product_id, Settings::default())
    }

    pub fn with_settings(product_id: u16, settings: Settings) -> Result<Self, rusb::Error> {
        Ok(Self::with_backend(RusbBackend::init()?, product_id, settings))
    }
}

impl<B: UsbBackend> Printer<B> {
    pub fn with_backend(backend: B, product_id: u16, settings: Settings) -> Self {
        Self {
            backend,
            product_id,
            settings,
            state: SessionState::Closed,
            handle: None,
            model: Model::from(product_id),
            interface_number: None,
            in_addr: DEFAULT_READ_ENDPOINT,
            out_addr: DEFAULT_WRITE_ENDPOINT,
        }
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// Select another printer family. An open session keeps its model until the next `open`.
    pub fn set_product_id(&mut self, product_id: u16) {
        self.product_id = product_id;

        if self.handle.is_none() {
            self.model = Model::from(product_id);
        } else if product_id != self.model.product_id() {
            warn!(
                "Product ID changed to {:#06x} while {} is open; reopen to apply",
                product_id, self.model
            );
        }
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn read_endpoint(&self) -> u8 {
        self.in_addr
    }

    pub fn write_endpoint(&self) -> u8 {
        self.out_addr
    }

    pub fn interface_number(&self) -> Option<u8> {
        self.interface_number
    }
}

impl<B: UsbBackend> Drop for Printer<B> {
    fn drop(&mut self) {
        self.close();
    }
}
