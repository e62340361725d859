use super::topology::{DeviceEntry, Topology};

use std::time::Duration;

use rusb::{Context, DeviceHandle, UsbContext};
use tracing::debug;

/// Enumerates the bus and opens devices found there.
pub trait UsbBackend {
    type Handle: UsbHandle;

    fn topology(&self) -> Result<Topology, rusb::Error>;

    fn open(&self, device: &DeviceEntry) -> Result<Self::Handle, rusb::Error>;
}

/// The raw transfer primitives of an opened device.
/// Dropping the handle closes the device.
pub trait UsbHandle {
    fn set_active_configuration(&mut self, config: u8) -> Result<(), rusb::Error>;

    fn claim_interface(&mut self, iface: u8) -> Result<(), rusb::Error>;

    fn release_interface(&mut self, iface: u8) -> Result<(), rusb::Error>;

    fn set_alternate_setting(&mut self, iface: u8, setting: u8) -> Result<(), rusb::Error>;

    fn clear_halt(&mut self, endpoint: u8) -> Result<(), rusb::Error>;

    fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration)
        -> Result<usize, rusb::Error>;

    fn read_bulk(&self, endpoint: u8, buf: &mut [u8], timeout: Duration)
        -> Result<usize, rusb::Error>;

    fn read_interrupt(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error>;

    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error>;
}

/// libusb through `rusb`. Creating it initializes the library, dropping it shuts it down again.
pub struct RusbBackend {
    context: Context,
}

impl RusbBackend {
    /// Initialize a libusb context. Every call creates an independent context, so this can be called repeatedly.
    pub fn init() -> Result<Self, rusb::Error> {
        Ok(Self {
            context: Context::new()?,
        })
    }

    pub fn shutdown(self) {
        drop(self);
    }
}

impl UsbBackend for RusbBackend {
    type Handle = DeviceHandle<Context>;

    fn topology(&self) -> Result<Topology, rusb::Error> {
        Topology::scan(&self.context)
    }

    fn open(&self, device: &DeviceEntry) -> Result<Self::Handle, rusb::Error> {
        let handle = self
            .context
            .devices()?
            .iter()
            .find(|d| d.bus_number() == device.bus_number && d.address() == device.address)
            .ok_or(rusb::Error::NoDevice)?
            .open()?;

        // Not supported on every platform; claiming will fail later if the kernel still holds the interface.
        if let Err(err) = handle.set_auto_detach_kernel_driver(true) {
            debug!("Automatic kernel driver detach unavailable: {}", err);
        }

        Ok(handle)
    }
}

impl<T: UsbContext> UsbHandle for DeviceHandle<T> {
    fn set_active_configuration(&mut self, config: u8) -> Result<(), rusb::Error> {
        DeviceHandle::set_active_configuration(self, config)
    }

    fn claim_interface(&mut self, iface: u8) -> Result<(), rusb::Error> {
        DeviceHandle::claim_interface(self, iface)
    }

    fn release_interface(&mut self, iface: u8) -> Result<(), rusb::Error> {
        DeviceHandle::release_interface(self, iface)
    }

    fn set_alternate_setting(&mut self, iface: u8, setting: u8) -> Result<(), rusb::Error> {
        DeviceHandle::set_alternate_setting(self, iface, setting)
    }

    fn clear_halt(&mut self, endpoint: u8) -> Result<(), rusb::Error> {
        DeviceHandle::clear_halt(self, endpoint)
    }

    fn write_bulk(
        &self,
        endpoint: u8,
        buf: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        DeviceHandle::write_bulk(self, endpoint, buf, timeout)
    }

    fn read_bulk(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        DeviceHandle::read_bulk(self, endpoint, buf, timeout)
    }

    fn read_interrupt(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        DeviceHandle::read_interrupt(self, endpoint, buf, timeout)
    }

    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        DeviceHandle::write_control(self, request_type, request, value, index, buf, timeout)
    }
}
