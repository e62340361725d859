//! Scripted USB backend for driving a `Printer` without hardware.

#![allow(dead_code)]

use bematech_usb::printer::topology::{
    AltSetting, ConfigurationEntry, DeviceEntry, EndpointEntry, InterfaceEntry, Topology,
};
use bematech_usb::printer::{Printer, RetryPolicy, Settings, UsbBackend, UsbHandle};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use rusb::TransferType;

pub const VENDOR_ID: u16 = 0x0b1b;
pub const CLASS_VENDOR_SPECIFIC: u8 = 0xff;
pub const CLASS_DATA: u8 = 0x0a;

/// Every call that reached the mock handle, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open,
    SetConfiguration(u8),
    ClaimInterface(u8),
    SetAltSetting(u8, u8),
    ReleaseInterface(u8),
    ClearHalt(u8),
    BulkWrite(u8, Vec<u8>),
    BulkRead(u8, usize),
    InterruptRead(u8, usize),
    Control {
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
    },
    Close,
}

#[derive(Default)]
pub struct Script {
    pub calls: Vec<Call>,
    pub open_error: Option<rusb::Error>,
    pub configuration_error: Option<rusb::Error>,
    /// Number of `Busy` answers before the claim succeeds.
    pub claim_busy: u32,
    pub claim_error: Option<rusb::Error>,
    pub alt_busy: u32,
    pub alt_error: Option<rusb::Error>,
    pub control_error: Option<rusb::Error>,
    pub clear_halt_error: Option<rusb::Error>,
    /// Zero-based index of the bulk write (counted over the whole session) that fails.
    pub fail_write_at: Option<usize>,
    /// Bulk write (same counting) that accepts only the given number of bytes.
    pub short_write_at: Option<(usize, usize)>,
    /// Length of every buffer offered to a bulk write, accepted or not.
    pub offered: Vec<usize>,
    pub writes_seen: usize,
    pub replies: VecDeque<Result<Vec<u8>, rusb::Error>>,
    pub interrupt_replies: VecDeque<Result<Vec<u8>, rusb::Error>>,
}

impl Script {
    pub fn bulk_writes(&self) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::BulkWrite(_, data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }
}

pub struct MockBackend {
    pub topology: Topology,
    pub script: Rc<RefCell<Script>>,
}

pub struct MockHandle {
    script: Rc<RefCell<Script>>,
}

impl MockBackend {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            script: Rc::new(RefCell::new(Script::default())),
        }
    }
}

impl UsbBackend for MockBackend {
    type Handle = MockHandle;

    fn topology(&self) -> Result<Topology, rusb::Error> {
        Ok(self.topology.clone())
    }

    fn open(&self, _device: &DeviceEntry) -> Result<MockHandle, rusb::Error> {
        let mut script = self.script.borrow_mut();
        script.calls.push(Call::Open);

        if let Some(err) = script.open_error {
            return Err(err);
        }

        Ok(MockHandle {
            script: Rc::clone(&self.script),
        })
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.script.borrow_mut().calls.push(Call::Close);
    }
}

impl UsbHandle for MockHandle {
    fn set_active_configuration(&mut self, config: u8) -> Result<(), rusb::Error> {
        let mut script = self.script.borrow_mut();
        script.calls.push(Call::SetConfiguration(config));
        script.configuration_error.map_or(Ok(()), Err)
    }

    fn claim_interface(&mut self, iface: u8) -> Result<(), rusb::Error> {
        let mut script = self.script.borrow_mut();
        script.calls.push(Call::ClaimInterface(iface));

        if script.claim_busy > 0 {
            script.claim_busy -= 1;
            return Err(rusb::Error::Busy);
        }

        script.claim_error.map_or(Ok(()), Err)
    }

    fn release_interface(&mut self, iface: u8) -> Result<(), rusb::Error> {
        self.script
            .borrow_mut()
            .calls
            .push(Call::ReleaseInterface(iface));
        Ok(())
    }

    fn set_alternate_setting(&mut self, iface: u8, setting: u8) -> Result<(), rusb::Error> {
        let mut script = self.script.borrow_mut();
        script.calls.push(Call::SetAltSetting(iface, setting));

        if script.alt_busy > 0 {
            script.alt_busy -= 1;
            return Err(rusb::Error::Busy);
        }

        script.alt_error.map_or(Ok(()), Err)
    }

    fn clear_halt(&mut self, endpoint: u8) -> Result<(), rusb::Error> {
        let mut script = self.script.borrow_mut();
        script.calls.push(Call::ClearHalt(endpoint));
        script.clear_halt_error.map_or(Ok(()), Err)
    }

    fn write_bulk(
        &self,
        endpoint: u8,
        buf: &[u8],
        _timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        let mut script = self.script.borrow_mut();
        let idx = script.writes_seen;
        script.writes_seen += 1;
        script.offered.push(buf.len());

        if script.fail_write_at == Some(idx) {
            return Err(rusb::Error::Pipe);
        }

        let accepted = match script.short_write_at {
            Some((at, len)) if at == idx => len.min(buf.len()),
            _ => buf.len(),
        };

        if accepted > 0 {
            script
                .calls
                .push(Call::BulkWrite(endpoint, buf[..accepted].to_vec()));
        }

        Ok(accepted)
    }

    fn read_bulk(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        let mut script = self.script.borrow_mut();
        script.calls.push(Call::BulkRead(endpoint, buf.len()));

        match script.replies.pop_front() {
            Some(Ok(reply)) => {
                let len = reply.len().min(buf.len());
                buf[..len].copy_from_slice(&reply[..len]);
                Ok(len)
            }
            Some(Err(err)) => Err(err),
            None => Err(rusb::Error::Timeout),
        }
    }

    fn read_interrupt(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        let mut script = self.script.borrow_mut();
        script.calls.push(Call::InterruptRead(endpoint, buf.len()));

        match script.interrupt_replies.pop_front() {
            Some(Ok(reply)) => {
                let len = reply.len().min(buf.len());
                buf[..len].copy_from_slice(&reply[..len]);
                Ok(len)
            }
            Some(Err(err)) => Err(err),
            None => Err(rusb::Error::Timeout),
        }
    }

    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &[u8],
        _timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        let mut script = self.script.borrow_mut();
        script.calls.push(Call::Control {
            request_type,
            request,
            value,
            index,
        });

        script.control_error.map_or(Ok(buf.len()), Err)
    }
}

pub fn bulk(address: u8) -> EndpointEntry {
    EndpointEntry::new(address, TransferType::Bulk)
}

pub fn interrupt(address: u8) -> EndpointEntry {
    EndpointEntry::new(address, TransferType::Interrupt)
}

/// A single printer with one configuration and one interface holding `alt_settings`.
pub fn printer_device(
    product_id: u16,
    config_value: u8,
    alt_settings: Vec<AltSetting>,
) -> DeviceEntry {
    DeviceEntry {
        bus_number: 1,
        address: 5,
        vendor_id: VENDOR_ID,
        product_id,
        configurations: vec![ConfigurationEntry {
            value: config_value,
            interfaces: vec![InterfaceEntry { alt_settings }],
        }],
    }
}

pub fn alt_setting(
    interface_number: u8,
    setting_number: u8,
    class_code: u8,
    endpoints: Vec<EndpointEntry>,
) -> AltSetting {
    AltSetting {
        interface_number,
        setting_number,
        class_code,
        protocol_code: 0,
        endpoints,
    }
}

pub fn topology_with(devices: Vec<DeviceEntry>) -> Topology {
    let mut topology = Topology::default();

    for device in devices {
        topology.insert(device);
    }

    topology
}

/// The CDC printer (product ID 3) on interface 1 with endpoints 0x02 / 0x81.
pub fn cdc_topology() -> Topology {
    topology_with(vec![printer_device(
        3,
        1,
        vec![alt_setting(
            1,
            0,
            CLASS_DATA,
            vec![bulk(0x02), bulk(0x81)],
        )],
    )])
}

/// The vendor-class printer (product ID 1) on interface 0 with endpoints 0x01 / 0x82.
pub fn vendor_class_topology() -> Topology {
    topology_with(vec![printer_device(
        1,
        1,
        vec![alt_setting(
            0,
            0,
            CLASS_VENDOR_SPECIFIC,
            vec![bulk(0x01), bulk(0x82), interrupt(0x83)],
        )],
    )])
}

/// Settings that never sleep.
pub fn fast_settings() -> Settings {
    Settings {
        settle_delay_ms: Some(0),
        claim_retry: RetryPolicy {
            max_attempts: 5,
            backoff_ms: 0,
        },
        ..Settings::default()
    }
}

pub fn printer(topology: Topology, product_id: u16) -> (Printer<MockBackend>, Rc<RefCell<Script>>) {
    printer_with(topology, product_id, fast_settings())
}

pub fn printer_with(
    topology: Topology,
    product_id: u16,
    settings: Settings,
) -> (Printer<MockBackend>, Rc<RefCell<Script>>) {
    let backend = MockBackend::new(topology);
    let script = Rc::clone(&backend.script);

    (Printer::with_backend(backend, product_id, settings), script)
}

/// Open the printer and forget the calls made while opening.
pub fn opened(topology: Topology, product_id: u16) -> (Printer<MockBackend>, Rc<RefCell<Script>>) {
    let (mut printer, script) = printer(topology, product_id);
    printer.open().expect("mock printer should open");

    {
        let mut script = script.borrow_mut();
        script.calls.clear();
        script.offered.clear();
        script.writes_seen = 0;
    }

    (printer, script)
}
