use async_trait::async_trait;
use std::collections::BTreeMap;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource,
    DataSourceMetadataRequest, DataSourceMetadataResponse, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedTypeBuilder, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tfplug::value::ObjectBuilder;

use super::{computed, lookup_key};
use crate::api::appliance::Vlan;
use crate::resources::appliance_vlan::split_nameservers;
use crate::resources::common::{api_error, attr, configure, invalid_value, provider_data, required};
use crate::MerakiProviderData;

/// VLANs configured on a network's appliance
#[derive(Default)]
pub struct NetworkApplianceVlansDataSource {
    provider_data: Option<MerakiProviderData>,
}

impl NetworkApplianceVlansDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn list(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let network_id =
            attr::<String>(config, "network_id").map_err(|e| invalid_value("configuration", e))?;
        let network_id = required(&network_id, "network_id")?;

        let vlans = data
            .client
            .appliance()
            .list_vlans(network_id)
            .await
            .map_err(|e| api_error("Failed to list VLANs", &e))?;

        tracing::debug!(%network_id, count = vlans.len(), "listed VLANs");
        let vlans: Vec<Dynamic> = vlans.into_iter().map(vlan).collect();

        Ok(ObjectBuilder::new()
            .set("id", network_id)
            .set("network_id", network_id)
            .set("vlans", vlans)
            .into())
    }
}

fn vlan(vlan: Vlan) -> Dynamic {
    let fixed: BTreeMap<String, Dynamic> = vlan
        .fixed_ip_assignments
        .unwrap_or_default()
        .into_iter()
        .map(|(mac, assignment)| {
            let assignment = ObjectBuilder::new()
                .set("ip", assignment.ip)
                .set("name", assignment.name)
                .build();
            (mac, assignment)
        })
        .collect();
    let reserved: Vec<Dynamic> = vlan
        .reserved_ip_ranges
        .into_iter()
        .map(|range| {
            ObjectBuilder::new()
                .set("start", range.start)
                .set("end", range.end)
                .set("comment", range.comment)
                .build()
        })
        .collect();

    ObjectBuilder::new()
        .set("vlan_id", vlan.id.parse::<i64>().ok())
        .set("name", vlan.name)
        .set("subnet", vlan.subnet)
        .set("appliance_ip", vlan.appliance_ip)
        .set("group_policy_id", vlan.group_policy_id)
        .set("interface_id", vlan.interface_id)
        .set("fixed_ip_assignments", fixed)
        .set("reserved_ip_ranges", reserved)
        .set(
            "dns_nameservers",
            vlan.dns_nameservers.as_deref().map(split_nameservers),
        )
        .set("dhcp_handling", vlan.dhcp_handling)
        .set("dhcp_lease_time", vlan.dhcp_lease_time)
        .set("dhcp_boot_options_enabled", vlan.dhcp_boot_options_enabled)
        .build()
}

#[async_trait]
impl DataSource for NetworkApplianceVlansDataSource {
    fn type_name(&self) -> &str {
        "meraki_network_appliance_vlans"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let string = |name: &str, description: &str| {
            computed(name, AttributeType::String, description)
        };
        let schema = SchemaBuilder::new()
            .version(0)
            .description("VLANs of a network's security appliance")
            .attribute(computed("id", AttributeType::String, "Network ID"))
            .attribute(lookup_key("network_id", "Network to list"))
            .attribute(
                AttributeBuilder::nested(
                    "vlans",
                    NestedTypeBuilder::list()
                        .attribute(computed("vlan_id", AttributeType::Number, "VLAN ID"))
                        .attribute(string("name", "VLAN name"))
                        .attribute(string("subnet", "Subnet in CIDR notation"))
                        .attribute(string("appliance_ip", "Appliance IP on the VLAN"))
                        .attribute(string("group_policy_id", "Group policy ID"))
                        .attribute(string("interface_id", "Interface ID"))
                        .attribute(
                            AttributeBuilder::nested(
                                "fixed_ip_assignments",
                                NestedTypeBuilder::map()
                                    .attribute(string("ip", "Assigned IP"))
                                    .attribute(string("name", "Client name"))
                                    .build(),
                            )
                            .description("Fixed IP assignments keyed by MAC address")
                            .computed()
                            .build(),
                        )
                        .attribute(
                            AttributeBuilder::nested(
                                "reserved_ip_ranges",
                                NestedTypeBuilder::list()
                                    .attribute(string("start", "First reserved IP"))
                                    .attribute(string("end", "Last reserved IP"))
                                    .attribute(string("comment", "Comment"))
                                    .build(),
                            )
                            .description("Reserved IP ranges")
                            .computed()
                            .build(),
                        )
                        .attribute(computed(
                            "dns_nameservers",
                            AttributeType::list_of(AttributeType::String),
                            "DNS name servers",
                        ))
                        .attribute(string("dhcp_handling", "DHCP handling"))
                        .attribute(string("dhcp_lease_time", "DHCP lease time"))
                        .attribute(computed(
                            "dhcp_boot_options_enabled",
                            AttributeType::Bool,
                            "Whether DHCP boot options are enabled",
                        ))
                        .build(),
                )
                .description("VLANs")
                .computed()
                .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse::default()
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let result = self.list(&request.config).await;
        ReadDataSourceResponse::from_result(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for NetworkApplianceVlansDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        ConfigureDataSourceResponse {
            diagnostics: configure(request.provider_data, &mut self.provider_data),
        }
    }
}
