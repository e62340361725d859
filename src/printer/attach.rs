use super::{
    backend::{UsbBackend, UsbHandle},
    io::Error as TransferError,
    model::{Model, Quirks, SETTLE_DELAY},
    scan::select_endpoints,
    settings::{RetryPolicy, Settings},
    Printer, SessionState, DEFAULT_READ_ENDPOINT, DEFAULT_WRITE_ENDPOINT, VENDOR_ID,
};

use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

/// Endpoint cleared on close in addition to the bulk pair.
const AUX_ENDPOINT: u8 = 0x83;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No printer with vendor ID {vendor_id:#06x} and product ID {product_id:#06x} offers a usable bulk output endpoint.")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("Failed to enumerate the USB devices: {0}")]
    Enumeration(#[source] rusb::Error),

    #[error("Failed to open the USB device: {0}")]
    Open(#[source] rusb::Error),

    #[error("Failed to set configuration {configuration}: {source}")]
    Configuration {
        configuration: u8,
        source: rusb::Error,
    },

    #[error("Failed to claim interface {interface}: {source}")]
    InterfaceClaim { interface: u8, source: rusb::Error },

    #[error("Failed to select alternate setting {setting} of interface {interface}: {source}")]
    AltSetting {
        interface: u8,
        setting: u8,
        source: rusb::Error,
    },

    #[error("The printer rejected the initialization handshake: {0}")]
    Initialization(#[from] TransferError),
}

/// Run `op` until it stops reporting `Busy` or the policy is exhausted.
/// The last error is returned in both failure cases.
fn retry_busy<F>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<(), rusb::Error>
where
    F: FnMut() -> Result<(), rusb::Error>,
{
    let mut attempt = 1;

    loop {
        match op() {
            Err(rusb::Error::Busy) if attempt < policy.max_attempts => {
                debug!(
                    "{} is busy (attempt {}/{}), retrying",
                    what, attempt, policy.max_attempts
                );
                thread::sleep(policy.backoff());
                attempt += 1;
            }

            other => return other,
        }
    }
}

/// How long `reset` waits between close and open, if at all.
fn settle_delay(model: Model, settings: &Settings) -> Option<Duration> {
    if !model.quirks().contains(Quirks::SETTLE_AFTER_RESET) {
        return None;
    }

    Some(settings.settle_delay().unwrap_or(SETTLE_DELAY))
}

impl<B: UsbBackend> Printer<B> {
    /// Find the printer on the bus, claim it and run the initialization handshake.
    /// Does nothing if the session is already open.
    pub fn open(&mut self) -> Result<(), Error> {
        if self.state == SessionState::Open {
            return Ok(());
        }

        // A handle left behind by a failed handshake must go first. The restore and
        // product reset commands are skipped: the latter would reboot the printer under us.
        if self.handle.is_some() {
            self.release();
        }

        self.state = SessionState::Opening;

        let result = self.attach();

        match &result {
            Ok(()) => {
                self.state = SessionState::Open;
                info!(
                    "Opened {} (interface {}, write {:#04x}, read {:#04x})",
                    self.model,
                    self.interface_number.unwrap_or_default(),
                    self.out_addr,
                    self.in_addr
                );
            }

            Err(err) => {
                warn!("Failed to open {}: {}", self.model, err);

                // Without a stored handle there is nothing left to release.
                if self.handle.is_none() {
                    self.state = SessionState::Closed;
                }
            }
        }

        result
    }

    fn attach(&mut self) -> Result<(), Error> {
        let model = Model::from(self.product_id);
        self.model = model;

        let topology = self.backend.topology().map_err(Error::Enumeration)?;

        let selection = select_endpoints(
            &topology,
            VENDOR_ID,
            self.product_id,
            model.interface_class(),
        )
        .ok_or(Error::DeviceNotFound {
            vendor_id: VENDOR_ID,
            product_id: self.product_id,
        })?;

        debug!(
            "Selected device {:03}:{:03}, configuration {}, interface {}, alternate setting {}, write {:#04x}, read {:?}, protocol {}",
            selection.bus_number,
            selection.device_address,
            selection.configuration,
            selection.interface_number,
            selection.setting_number,
            selection.write_endpoint,
            selection.read_endpoint,
            selection.protocol_code
        );

        let device = topology
            .devices()
            .find(|d| {
                d.bus_number == selection.bus_number && d.address == selection.device_address
            })
            .ok_or(Error::DeviceNotFound {
                vendor_id: VENDOR_ID,
                product_id: self.product_id,
            })?;

        // Try to open the USB device, giving us a handle.
        // Until it is stored, dropping it on an early return closes the device again.
        let mut handle = self.backend.open(device).map_err(Error::Open)?;

        handle
            .set_active_configuration(selection.configuration)
            .map_err(|source| Error::Configuration {
                configuration: selection.configuration,
                source,
            })?;

        let policy = self.settings.claim_retry;
        let interface = selection.interface_number;
        let setting = selection.setting_number;

        retry_busy(&policy, "Interface claim", || handle.claim_interface(interface))
            .map_err(|source| Error::InterfaceClaim { interface, source })?;

        if let Err(source) = retry_busy(&policy, "Alternate setting", || {
            handle.set_alternate_setting(interface, setting)
        }) {
            if let Err(err) = handle.release_interface(interface) {
                debug!("Failed to release interface {}: {}", interface, err);
            }

            return Err(Error::AltSetting {
                interface,
                setting,
                source,
            });
        }

        self.handle = Some(handle);
        self.interface_number = Some(interface);
        self.out_addr = selection.write_endpoint;
        self.in_addr = selection.read_endpoint.unwrap_or(DEFAULT_READ_ENDPOINT);

        self.initialize()?;

        Ok(())
    }

    /// Restore the printer and release the device.
    /// Every step is best effort: failures are logged, never returned.
    pub fn close(&mut self) {
        if self.handle.is_none() {
            return;
        }

        if let Err(err) = self.send_post_command() {
            warn!("Failed to restore the printer mode: {}", err);
        }

        if self.model.quirks().contains(Quirks::RESET_ON_CLOSE) {
            if let Err(err) = self.send_product_reset() {
                warn!("Failed to send the product reset: {}", err);
            }
        }

        self.release();

        info!("Closed {}", self.model);
    }

    /// Clear the endpoints, release the interface and drop the handle without talking to the printer.
    fn release(&mut self) {
        let (in_addr, out_addr, interface) = (self.in_addr, self.out_addr, self.interface_number);

        if let Some(mut handle) = self.handle.take() {
            for endpoint in [in_addr, out_addr, AUX_ENDPOINT] {
                if let Err(err) = handle.clear_halt(endpoint) {
                    warn!("Failed to clear endpoint {:#04x}: {}", endpoint, err);
                }
            }

            if let Some(interface) = interface {
                if let Err(err) = handle.release_interface(interface) {
                    warn!("Failed to release interface {}: {}", interface, err);
                }
            }

            // Dropping the handle closes the device.
            drop(handle);
        }

        self.interface_number = None;
        self.in_addr = DEFAULT_READ_ENDPOINT;
        self.out_addr = DEFAULT_WRITE_ENDPOINT;
        self.state = SessionState::Closed;
    }

    /// Close the session, give the printer time to come back if it needs it and open it again.
    pub fn reset(&mut self) -> Result<(), Error> {
        if self.handle.is_some() {
            self.state = SessionState::Resetting;
        }

        self.close();

        if let Some(delay) = settle_delay(Model::from(self.product_id), &self.settings) {
            info!("Waiting {:?} for the printer to settle", delay);
            thread::sleep(delay);
        }

        self.open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_ms: 0,
        }
    }

    #[test]
    fn busy_is_retried_until_success() {
        let calls = Cell::new(0);

        let result = retry_busy(&fast_policy(5), "test", || {
            calls.set(calls.get() + 1);

            if calls.get() < 3 {
                Err(rusb::Error::Busy)
            } else {
                Ok(())
            }
        });

        assert!(result.is_ok());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn busy_gives_up_after_max_attempts() {
        let calls = Cell::new(0);

        let result = retry_busy(&fast_policy(4), "test", || {
            calls.set(calls.get() + 1);
            Err(rusb::Error::Busy)
        });

        assert_eq!(result, Err(rusb::Error::Busy));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn other_errors_are_not_retried() {
        let calls = Cell::new(0);

        let result = retry_busy(&fast_policy(10), "test", || {
            calls.set(calls.get() + 1);
            Err(rusb::Error::Access)
        });

        assert_eq!(result, Err(rusb::Error::Access));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn settle_delay_defaults_for_cdc_printers() {
        let settings = Settings::default();

        assert_eq!(settle_delay(Model::CdcData, &settings), Some(SETTLE_DELAY));
        assert_eq!(SETTLE_DELAY, Duration::from_secs(7));
    }

    #[test]
    fn settle_delay_can_be_overridden() {
        let settings = Settings {
            settle_delay_ms: Some(1500),
            ..Settings::default()
        };

        assert_eq!(
            settle_delay(Model::CdcData, &settings),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn other_models_do_not_settle() {
        let settings = Settings {
            settle_delay_ms: Some(1500),
            ..Settings::default()
        };

        assert_eq!(settle_delay(Model::VendorClass, &settings), None);
        assert_eq!(settle_delay(Model::Other(7), &Settings::default()), None);
    }
}
