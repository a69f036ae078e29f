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
use crate::api::devices::Device;
use crate::resources::common::{api_error, attr, configure, invalid_value, provider_data, required};
use crate::MerakiProviderData;

/// Devices claimed into a network
#[derive(Default)]
pub struct NetworkDevicesDataSource {
    provider_data: Option<MerakiProviderData>,
}

impl NetworkDevicesDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn list(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let network_id =
            attr::<String>(config, "network_id").map_err(|e| invalid_value("configuration", e))?;
        let network_id = required(&network_id, "network_id")?;

        let devices = data
            .client
            .devices()
            .list_network(network_id)
            .await
            .map_err(|e| api_error("Failed to list network devices", &e))?;

        tracing::debug!(%network_id, count = devices.len(), "listed network devices");
        let devices: Vec<Dynamic> = devices.into_iter().map(device).collect();

        Ok(ObjectBuilder::new()
            .set("id", network_id)
            .set("network_id", network_id)
            .set("devices", devices)
            .into())
    }
}

fn device(device: Device) -> Dynamic {
    ObjectBuilder::new()
        .set("serial", device.serial)
        .set("name", device.name)
        .set("mac", device.mac)
        .set("model", device.model)
        .set("lat", device.lat)
        .set("lng", device.lng)
        .set("address", device.address)
        .set("notes", device.notes)
        .set("tags", device.tags)
        .set("firmware", device.firmware)
        .set("lan_ip", device.lan_ip)
        .set("url", device.url)
        .set("product_type", device.product_type)
        .build()
}

#[async_trait]
impl DataSource for NetworkDevicesDataSource {
    fn type_name(&self) -> &str {
        "meraki_network_devices"
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
            .description("Devices in a network")
            .attribute(computed("id", AttributeType::String, "Network ID"))
            .attribute(lookup_key("network_id", "Network to list"))
            .attribute(
                AttributeBuilder::nested(
                    "devices",
                    NestedTypeBuilder::list()
                        .attribute(string("serial", "Serial number"))
                        .attribute(string("name", "Device name"))
                        .attribute(string("mac", "MAC address"))
                        .attribute(string("model", "Model"))
                        .attribute(computed("lat", AttributeType::Number, "Latitude"))
                        .attribute(computed("lng", AttributeType::Number, "Longitude"))
                        .attribute(string("address", "Physical address"))
                        .attribute(string("notes", "Notes"))
                        .attribute(computed(
                            "tags",
                            AttributeType::set_of(AttributeType::String),
                            "Device tags",
                        ))
                        .attribute(string("firmware", "Firmware version"))
                        .attribute(string("lan_ip", "LAN IP address"))
                        .attribute(string("url", "Dashboard URL"))
                        .attribute(string("product_type", "Product type"))
                        .build(),
                )
                .description("Devices")
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
impl DataSourceWithConfigure for NetworkDevicesDataSource {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::provider_data_for;
    use mockito::Server;
    use tfplug::types::AttributePath;

    #[tokio::test]
    async fn read_lists_devices() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/networks/N_1/devices")
            .with_body(
                r#"[{
                    "serial": "Q234-ABCD-5678",
                    "name": "Core switch",
                    "mac": "00:11:22:33:44:55",
                    "model": "MS120-8",
                    "networkId": "N_1",
                    "lat": 37.418,
                    "lng": -122.098,
                    "tags": ["core"],
                    "lanIp": "10.0.0.2"
                }]"#,
            )
            .create_async()
            .await;

        let mut data_source = NetworkDevicesDataSource::new();
        data_source
            .configure(
                Context::new(),
                ConfigureDataSourceRequest {
                    provider_data: Some(provider_data_for(&server)),
                },
            )
            .await;

        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "meraki_network_devices".into(),
                    config: ObjectBuilder::new().set("network_id", "N_1").into(),
                    provider_meta: None,
                    client_capabilities: Default::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let first = AttributePath::new("devices").index(0);
        assert_eq!(
            response
                .state
                .get_string(&first.clone().attribute("model"))
                .unwrap(),
            "MS120-8"
        );
        assert_eq!(
            response
                .state
                .get_number(&first.clone().attribute("lat"))
                .unwrap(),
            37.418
        );
        assert!(response
            .state
            .get::<String>(&first.attribute("firmware"))
            .unwrap()
            .is_null());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_failure_becomes_diagnostic() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/networks/N_1/devices")
            .with_status(403)
            .with_body(r#"{"errors":["Forbidden"]}"#)
            .create_async()
            .await;

        let mut data_source = NetworkDevicesDataSource::new();
        data_source
            .configure(
                Context::new(),
                ConfigureDataSourceRequest {
                    provider_data: Some(provider_data_for(&server)),
                },
            )
            .await;

        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "meraki_network_devices".into(),
                    config: ObjectBuilder::new().set("network_id", "N_1").into(),
                    provider_meta: None,
                    client_capabilities: Default::default(),
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].detail.contains("Forbidden"));
    }
}
