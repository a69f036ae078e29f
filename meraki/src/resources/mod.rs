pub(crate) mod common;

pub mod appliance_firewall_l3_rules;
pub mod appliance_vlan;
pub mod appliance_vlans_settings;
pub mod device;
pub mod network;
pub mod network_devices_claim;
pub mod network_snmp;
pub mod network_syslog_servers;
pub mod organization;
pub mod organization_admin;
pub mod organization_snmp;
pub mod switch_port;

pub use appliance_firewall_l3_rules::ApplianceFirewallL3RulesResource;
pub use appliance_vlan::ApplianceVlanResource;
pub use appliance_vlans_settings::ApplianceVlansSettingsResource;
pub use device::DeviceResource;
pub use network::NetworkResource;
pub use network_devices_claim::NetworkDevicesClaimResource;
pub use network_snmp::NetworkSnmpResource;
pub use network_syslog_servers::NetworkSyslogServersResource;
pub use organization::OrganizationResource;
pub use organization_admin::OrganizationAdminResource;
pub use organization_snmp::OrganizationSnmpResource;
pub use switch_port::SwitchPortResource;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::api::test_support::client_for;
    use crate::MerakiProviderData;
    use std::any::Any;
    use std::sync::Arc;
    use std::time::Duration;

    /// Provider data pointing at a mock server
    pub fn provider_data_for(server: &mockito::Server) -> Arc<dyn Any + Send + Sync> {
        provider_data_with_retry(server, Duration::from_millis(1))
    }

    pub fn provider_data_with_retry(
        server: &mockito::Server,
        network_delete_retry_interval: Duration,
    ) -> Arc<dyn Any + Send + Sync> {
        Arc::new(MerakiProviderData::new(
            client_for(server),
            network_delete_retry_interval,
        ))
    }
}
