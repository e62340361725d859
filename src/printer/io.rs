use super::{
    backend::{UsbBackend, UsbHandle},
    Printer,
};

use rusb::{Direction, Recipient, RequestType};
use thiserror::Error;
use tracing::{debug, warn};

/// Largest reply accepted on the interrupt path.
const INTERRUPT_READ_SIZE: usize = 254;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The printer has not been opened.")]
    NotOpen,

    #[error("Bulk write to endpoint {endpoint:#04x} failed after {written} of {total} bytes: {source}")]
    BulkWrite {
        endpoint: u8,
        written: usize,
        total: usize,
        source: rusb::Error,
    },

    #[error("Bulk write to endpoint {endpoint:#04x} accepted no data after {written} of {total} bytes.")]
    ZeroLengthWrite {
        endpoint: u8,
        written: usize,
        total: usize,
    },

    #[error("Bulk read from endpoint {endpoint:#04x} failed: {source}")]
    BulkRead { endpoint: u8, source: rusb::Error },

    #[error("Control request {request:#04x} (value {value:#06x}) failed: {source}")]
    Control {
        request: u8,
        value: u16,
        source: rusb::Error,
    },

    #[error("Interrupt read from endpoint {endpoint:#04x} failed: {source}")]
    InterruptRead { endpoint: u8, source: rusb::Error },
}

impl<B: UsbBackend> Printer<B> {
    fn open_handle(&self) -> Result<&B::Handle, Error> {
        self.handle.as_ref().ok_or(Error::NotOpen)
    }

    /// Send `data` to the write endpoint in chunks of the device buffer size.
    /// The first failing chunk aborts the transfer; chunks already sent stay sent.
    pub fn write(&self, data: &[u8]) -> Result<(), Error> {
        let handle = self.open_handle()?;
        let chunk_size = self.model.buffer_size();
        let timeout = self.settings.transfer_timeout();

        let mut written = 0;

        while written < data.len() {
            let end = data.len().min(written + chunk_size);

            let chunk_written = handle
                .write_bulk(self.out_addr, &data[written..end], timeout)
                .map_err(|source| Error::BulkWrite {
                    endpoint: self.out_addr,
                    written,
                    total: data.len(),
                    source,
                })?;

            if chunk_written == 0 {
                return Err(Error::ZeroLengthWrite {
                    endpoint: self.out_addr,
                    written,
                    total: data.len(),
                });
            }

            // Short writes are continued from where the device stopped.
            written += chunk_written;
        }

        Ok(())
    }

    /// One bulk read of the device buffer size.
    pub fn try_read(&self, endpoint: u8) -> Result<Vec<u8>, Error> {
        let handle = self.open_handle()?;
        let mut buf = vec![0u8; self.model.buffer_size()];

        let len = handle
            .read_bulk(endpoint, &mut buf, self.settings.transfer_timeout())
            .map_err(|source| Error::BulkRead { endpoint, source })?;

        buf.truncate(len);
        Ok(buf)
    }

    /// Like `try_read`, but an error or timeout yields an empty reply.
    pub fn read(&self, endpoint: u8) -> Vec<u8> {
        self.try_read(endpoint).unwrap_or_else(|err| {
            warn!("{}", err);
            Vec::new()
        })
    }

    /// Vendor request to the device, addressed to the claimed interface.
    pub fn control_request(&self, request: u8, value: u16, payload: &[u8]) -> Result<(), Error> {
        let handle = self.open_handle()?;
        let request_type = rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);
        let index = self.interface_number.unwrap_or_default() as u16;

        handle
            .write_control(
                request_type,
                request,
                value,
                index,
                payload,
                self.settings.transfer_timeout(),
            )
            .map_err(|source| Error::Control {
                request,
                value,
                source,
            })?;

        debug!("Control request {:#04x} (value {:#06x}) sent", request, value);

        Ok(())
    }

    pub fn try_interrupt_read(&self, endpoint: u8) -> Result<Vec<u8>, Error> {
        let handle = self.open_handle()?;
        let mut buf = [0u8; INTERRUPT_READ_SIZE];

        let len = handle
            .read_interrupt(endpoint, &mut buf, self.settings.interrupt_timeout())
            .map_err(|source| Error::InterruptRead { endpoint, source })?;

        debug!("Interrupt read of {} bytes from {:#04x}", len, endpoint);

        Ok(buf[..len].to_vec())
    }

    /// Not used by the command flow. An error or timeout yields an empty reply.
    pub fn interrupt_read(&self, endpoint: u8) -> Vec<u8> {
        self.try_interrupt_read(endpoint).unwrap_or_else(|err| {
            warn!("{}", err);
            Vec::new()
        })
    }
}
