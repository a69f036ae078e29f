use async_trait::async_trait;
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
use crate::api::switch::SwitchPort;
use crate::resources::common::{api_error, attr, configure, invalid_value, provider_data, required};
use crate::MerakiProviderData;

#[derive(Default)]
pub struct DeviceSwitchPortsDataSource {
    provider_data: Option<MerakiProviderData>,
}

impl DeviceSwitchPortsDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn list(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let serial =
            attr::<String>(config, "serial").map_err(|e| invalid_value("configuration", e))?;
        let serial = required(&serial, "serial")?;

        let ports = data
            .client
            .switch()
            .list_ports(serial)
            .await
            .map_err(|e| api_error("Failed to list switch ports", &e))?;

        tracing::debug!(%serial, count = ports.len(), "listed switch ports");
        let ports: Vec<Dynamic> = ports.into_iter().map(port).collect();

        Ok(ObjectBuilder::new()
            .set("id", serial)
            .set("serial", serial)
            .set("ports", ports)
            .into())
    }
}

fn port(port: SwitchPort) -> Dynamic {
    ObjectBuilder::new()
        .set("port_id", port.port_id)
        .set("name", port.name)
        .set("tags", port.tags)
        .set("enabled", port.enabled)
        .set("poe_enabled", port.poe_enabled)
        .set("type", port.port_type)
        .set("vlan", port.vlan)
        .set("voice_vlan", port.voice_vlan)
        .set("allowed_vlans", port.allowed_vlans)
        .set("isolation_enabled", port.isolation_enabled)
        .set("rstp_enabled", port.rstp_enabled)
        .set("stp_guard", port.stp_guard)
        .set("link_negotiation", port.link_negotiation)
        .set("access_policy_type", port.access_policy_type)
        .set("udld", port.udld)
        .build()
}

#[async_trait]
impl DataSource for DeviceSwitchPortsDataSource {
    fn type_name(&self) -> &str {
        "meraki_device_switch_ports"
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
        let string = |name: &str| computed(name, AttributeType::String, "");
        let boolean = |name: &str| computed(name, AttributeType::Bool, "");
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Ports of a switch")
            .attribute(computed("id", AttributeType::String, "Switch serial"))
            .attribute(lookup_key("serial", "Serial of the switch"))
            .attribute(
                AttributeBuilder::nested(
                    "ports",
                    NestedTypeBuilder::list()
                        .attribute(string("port_id"))
                        .attribute(string("name"))
                        .attribute(computed(
                            "tags",
                            AttributeType::set_of(AttributeType::String),
                            "",
                        ))
                        .attribute(boolean("enabled"))
                        .attribute(boolean("poe_enabled"))
                        .attribute(string("type"))
                        .attribute(computed("vlan", AttributeType::Number, ""))
                        .attribute(computed("voice_vlan", AttributeType::Number, ""))
                        .attribute(string("allowed_vlans"))
                        .attribute(boolean("isolation_enabled"))
                        .attribute(boolean("rstp_enabled"))
                        .attribute(string("stp_guard"))
                        .attribute(string("link_negotiation"))
                        .attribute(string("access_policy_type"))
                        .attribute(string("udld"))
                        .build(),
                )
                .description("Switch ports")
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
impl DataSourceWithConfigure for DeviceSwitchPortsDataSource {
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
