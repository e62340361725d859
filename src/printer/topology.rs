use rusb::{Direction, TransferType, UsbContext};

use tracing::debug;

/// An owned snapshot of the USB bus tree.
/// The descriptor scanner only reads it, so it can be built from `rusb` or by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub buses: Vec<Bus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bus {
    pub number: u8,
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceEntry {
    pub bus_number: u8,
    pub address: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub configurations: Vec<ConfigurationEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationEntry {
    /// `bConfigurationValue`, the value passed to "set configuration".
    pub value: u8,
    pub interfaces: Vec<InterfaceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceEntry {
    pub alt_settings: Vec<AltSetting>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AltSetting {
    pub interface_number: u8,
    pub setting_number: u8,
    pub class_code: u8,
    pub protocol_code: u8,
    pub endpoints: Vec<EndpointEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointEntry {
    pub address: u8,
    pub transfer_type: TransferType,
}

impl EndpointEntry {
    pub fn new(address: u8, transfer_type: TransferType) -> Self {
        Self {
            address,
            transfer_type,
        }
    }

    /// The direction is encoded in bit 7 of the endpoint address.
    pub fn direction(&self) -> Direction {
        if self.address & 0x80 != 0 {
            Direction::In
        } else {
            Direction::Out
        }
    }

    pub fn is_bulk(&self) -> bool {
        self.transfer_type == TransferType::Bulk
    }
}

impl Topology {
    /// Walk every device known to `context` and record its descriptors.
    /// Devices whose descriptors cannot be read are skipped.
    pub fn scan<T: UsbContext>(context: &T) -> Result<Self, rusb::Error> {
        let mut topology = Topology::default();

        for device in context.devices()?.iter() {
            let Ok(device_desc) = device.device_descriptor() else {
                debug!(
                    "Skipping device {:03}:{:03} without readable device descriptor",
                    device.bus_number(),
                    device.address()
                );
                continue;
            };

            let mut entry = DeviceEntry {
                bus_number: device.bus_number(),
                address: device.address(),
                vendor_id: device_desc.vendor_id(),
                product_id: device_desc.product_id(),
                configurations: Vec::with_capacity(device_desc.num_configurations() as usize),
            };

            for idx in 0..device_desc.num_configurations() {
                let config_desc = match device.config_descriptor(idx) {
                    Ok(desc) => desc,

                    Err(err) => {
                        debug!(
                            "Skipping configuration {} of device {:03}:{:03}: {}",
                            idx, entry.bus_number, entry.address, err
                        );
                        continue;
                    }
                };

                let interfaces = config_desc
                    .interfaces()
                    .map(|interface| InterfaceEntry {
                        alt_settings: interface
                            .descriptors()
                            .map(|interface_desc| AltSetting {
                                interface_number: interface_desc.interface_number(),
                                setting_number: interface_desc.setting_number(),
                                class_code: interface_desc.class_code(),
                                protocol_code: interface_desc.protocol_code(),
                                endpoints: interface_desc
                                    .endpoint_descriptors()
                                    .map(|endpoint_desc| {
                                        EndpointEntry::new(
                                            endpoint_desc.address(),
                                            endpoint_desc.transfer_type(),
                                        )
                                    })
                                    .collect(),
                            })
                            .collect(),
                    })
                    .collect();

                entry.configurations.push(ConfigurationEntry {
                    value: config_desc.number(),
                    interfaces,
                });
            }

            topology.insert(entry);
        }

        Ok(topology)
    }

    /// Add a device to its bus, creating the bus on first use.
    pub fn insert(&mut self, device: DeviceEntry) {
        match self
            .buses
            .iter_mut()
            .find(|bus| bus.number == device.bus_number)
        {
            Some(bus) => bus.devices.push(device),

            None => self.buses.push(Bus {
                number: device.bus_number,
                devices: vec![device],
            }),
        }
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.buses.iter().flat_map(|bus| bus.devices.iter())
    }
}
