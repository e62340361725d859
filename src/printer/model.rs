use std::fmt::Display;
use std::time::Duration;

/// Interface class of the vendor-specific printer family.
const CLASS_VENDOR_SPECIFIC: u8 = 0xff;

/// Interface class of the CDC based printer families.
const CLASS_DATA: u8 = 0x0a;

/// Time the CDC printers need after a reset before they enumerate again.
pub(super) const SETTLE_DELAY: Duration = Duration::from_secs(7);

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Quirks: u8 {
        /// Send the product reset opcode when closing the session.
        const RESET_ON_CLOSE = 0b0000_0001;
        /// Wait for the settle delay between close and open when resetting.
        const SETTLE_AFTER_RESET = 0b0000_0010;
    }
}

/// A vendor control request issued during the initialization handshake.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ControlStep {
    pub request: u8,
    pub value: u16,
}

/// There are different printer families with variable USB parameters.
/// They are told apart by the USB product ID.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Model {
    /// Product ID 1: vendor-specific interface class, small device buffer.
    VendorClass,
    /// Product ID 3: CDC data interface, needs a reset and settle time around reconnects.
    CdcData,
    /// Any other product ID of the vendor. Handled like a plain CDC data printer.
    Other(u16),
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Model::*;

        match self {
            VendorClass => write!(f, "vendor-class printer (PID {:#06x})", self.product_id()),
            CdcData => write!(f, "CDC printer (PID {:#06x})", self.product_id()),
            Other(pid) => write!(f, "unknown printer (PID {:#06x})", pid),
        }
    }
}

impl From<u16> for Model {
    fn from(value: u16) -> Self {
        use Model::*;

        match value {
            0x0001 => VendorClass,
            0x0003 => CdcData,
            other => Other(other),
        }
    }
}

impl Model {
    pub fn product_id(&self) -> u16 {
        use Model::*;

        match self {
            VendorClass => 0x0001,
            CdcData => 0x0003,
            Other(pid) => *pid,
        }
    }

    /// The interface class an alternate setting must have to be used.
    pub fn interface_class(&self) -> u8 {
        match self {
            Model::VendorClass => CLASS_VENDOR_SPECIFIC,
            _ => CLASS_DATA,
        }
    }

    /// Largest chunk handed to a single bulk transfer; also the bulk read size.
    pub fn buffer_size(&self) -> usize {
        match self {
            Model::VendorClass => 64,
            _ => 1024,
        }
    }

    /// Control requests to issue before the data channel is used.
    pub fn handshake(&self) -> &'static [ControlStep] {
        use Model::*;

        match self {
            VendorClass => &[
                ControlStep {
                    request: 0x00,
                    value: 0xffff,
                },
                ControlStep {
                    request: 0x01,
                    value: 0x0007,
                },
            ],
            CdcData => &[ControlStep {
                request: 0x22,
                value: 0x0003,
            }],
            Other(_) => &[],
        }
    }

    pub fn quirks(&self) -> Quirks {
        match self {
            Model::CdcData => Quirks::RESET_ON_CLOSE | Quirks::SETTLE_AFTER_RESET,
            _ => Quirks::empty(),
        }
    }
}
