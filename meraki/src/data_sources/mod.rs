//! Read-only listings backing the provider's data sources

pub mod device_switch_ports;
pub mod network_appliance_vlans;
pub mod network_devices;
pub mod networks;
pub mod organizations;

pub use device_switch_ports::DeviceSwitchPortsDataSource;
pub use network_appliance_vlans::NetworkApplianceVlansDataSource;
pub use network_devices::NetworkDevicesDataSource;
pub use networks::NetworksDataSource;
pub use organizations::OrganizationsDataSource;

use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};

pub(crate) fn computed(name: &str, type_: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, type_)
        .description(description)
        .computed()
        .build()
}

pub(crate) fn lookup_key(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .required()
        .build()
}
