use super::topology::{AltSetting, Topology};

use rusb::Direction;

/// Where a printer was found and which endpoints to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSelection {
    pub bus_number: u8,
    pub device_address: u8,
    pub configuration: u8,
    pub interface_number: u8,
    pub setting_number: u8,
    pub write_endpoint: u8,
    pub read_endpoint: Option<u8>,
    pub protocol_code: u8,
}

/// Search the topology for the first alternate setting of a matching device that offers a bulk output endpoint.
/// The search stops at the first hit, even if a later alternate setting would offer both directions.
pub fn select_endpoints(
    topology: &Topology,
    vendor_id: u16,
    product_id: u16,
    expected_class: u8,
) -> Option<EndpointSelection> {
    topology
        .devices()
        .filter(|device| device.vendor_id == vendor_id && device.product_id == product_id)
        .find_map(|device| {
            device.configurations.iter().find_map(|config| {
                config
                    .interfaces
                    .iter()
                    .flat_map(|interface| interface.alt_settings.iter())
                    .filter(|alt| alt.class_code == expected_class)
                    .find_map(|alt| {
                        let (write_endpoint, read_endpoint) = bulk_endpoints(alt);

                        Some(EndpointSelection {
                            bus_number: device.bus_number,
                            device_address: device.address,
                            configuration: config.value,
                            interface_number: alt.interface_number,
                            setting_number: alt.setting_number,
                            write_endpoint: write_endpoint?,
                            read_endpoint,
                            protocol_code: alt.protocol_code,
                        })
                    })
            })
        })
}

/// Walk the endpoints in descriptor order. Later bulk endpoints replace earlier ones of the same direction.
fn bulk_endpoints(alt: &AltSetting) -> (Option<u8>, Option<u8>) {
    let (mut write_endpoint, mut read_endpoint) = (None, None);

    for endpoint in alt.endpoints.iter().filter(|e| e.is_bulk()) {
        match endpoint.direction() {
            Direction::In => read_endpoint = Some(endpoint.address),
            Direction::Out => write_endpoint = Some(endpoint.address),
        }
    }

    (write_endpoint, read_endpoint)
}
