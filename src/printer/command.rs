use super::{backend::UsbBackend, io::Error, Printer};

use tracing::debug;

/// Switch the printer into the mode used by this driver.
pub(super) const SET_MODE: [u8; 4] = [0x1d, 0xf9, 0x35, 0x00];

/// ESC @, initialize the printer.
pub(super) const RESET: [u8; 2] = [0x1b, 0x40];

/// Return to the mode the printer was in before `SET_MODE`.
pub(super) const RESTORE: [u8; 4] = [0x1d, 0xf9, 0x1f, 0x31];

/// Reboot the printer. It drops off the bus for a few seconds afterwards.
pub(super) const PRODUCT_RESET: [u8; 3] = [0x1d, 0xf8, 0x46];

impl<B: UsbBackend> Printer<B> {
    /// Run the control handshake of the model, then the pre-command sequence.
    pub(super) fn initialize(&self) -> Result<(), Error> {
        for step in self.model.handshake() {
            debug!(
                "Handshake control request {:#04x} (value {:#06x})",
                step.request, step.value
            );
            self.control_request(step.request, step.value, &[])?;
        }

        self.send_pre_command()
    }

    fn send_pre_command(&self) -> Result<(), Error> {
        self.write(&SET_MODE)?;
        self.write(&RESET)?;

        Ok(())
    }

    pub(super) fn send_post_command(&self) -> Result<(), Error> {
        self.write(&RESTORE)
    }

    pub(super) fn send_product_reset(&self) -> Result<(), Error> {
        self.write(&PRODUCT_RESET)
    }

    /// Pass raw printer opcodes (print jobs, formatting commands, ...) through to the printer.
    pub fn send_command(&self, data: &[u8]) -> Result<(), Error> {
        self.write(data)
    }
}
