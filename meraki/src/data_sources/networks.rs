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
use crate::api::networks::Network;
use crate::resources::common::{api_error, attr, configure, invalid_value, provider_data, required};
use crate::MerakiProviderData;

/// Networks of one organization
#[derive(Default)]
pub struct NetworksDataSource {
    provider_data: Option<MerakiProviderData>,
}

impl NetworksDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn list(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let organization_id = attr::<String>(config, "organization_id")
            .map_err(|e| invalid_value("configuration", e))?;
        let organization_id = required(&organization_id, "organization_id")?;

        let networks = data
            .client
            .networks()
            .list(organization_id)
            .await
            .map_err(|e| api_error("Failed to list networks", &e))?;

        tracing::debug!(%organization_id, count = networks.len(), "listed networks");
        let networks: Vec<Dynamic> = networks.into_iter().map(network).collect();

        Ok(ObjectBuilder::new()
            .set("id", organization_id)
            .set("organization_id", organization_id)
            .set("networks", networks)
            .into())
    }
}

fn network(network: Network) -> Dynamic {
    ObjectBuilder::new()
        .set("id", network.id)
        .set("name", network.name)
        .set("product_types", network.product_types)
        .set("time_zone", network.time_zone)
        .set("tags", network.tags)
        .set("notes", network.notes)
        .set("url", network.url)
        .set(
            "is_bound_to_config_template",
            network.is_bound_to_config_template,
        )
        .build()
}

#[async_trait]
impl DataSource for NetworksDataSource {
    fn type_name(&self) -> &str {
        "meraki_networks"
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
        let strings = || AttributeType::set_of(AttributeType::String);
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Networks in an organization")
            .attribute(computed("id", AttributeType::String, "Organization ID"))
            .attribute(lookup_key("organization_id", "Organization to list"))
            .attribute(
                AttributeBuilder::nested(
                    "networks",
                    NestedTypeBuilder::list()
                        .attribute(computed("id", AttributeType::String, "Network ID"))
                        .attribute(computed("name", AttributeType::String, "Network name"))
                        .attribute(computed("product_types", strings(), "Product types"))
                        .attribute(computed("time_zone", AttributeType::String, "Time zone"))
                        .attribute(computed("tags", strings(), "Network tags"))
                        .attribute(computed("notes", AttributeType::String, "Notes"))
                        .attribute(computed("url", AttributeType::String, "Dashboard URL"))
                        .attribute(computed(
                            "is_bound_to_config_template",
                            AttributeType::Bool,
                            "Whether the network follows a configuration template",
                        ))
                        .build(),
                )
                .description("Networks")
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
impl DataSourceWithConfigure for NetworksDataSource {
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
    async fn read_lists_networks_of_organization() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/organizations/123/networks")
            .with_body(
                r#"[{
                    "id": "N_1",
                    "organizationId": "123",
                    "name": "Branch",
                    "productTypes": ["appliance", "switch"],
                    "timeZone": "Europe/Berlin",
                    "tags": ["branch"],
                    "notes": null,
                    "url": "https://n1.meraki.com/n/1",
                    "isBoundToConfigTemplate": false
                }]"#,
            )
            .create_async()
            .await;

        let mut data_source = NetworksDataSource::new();
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
                    type_name: "meraki_networks".into(),
                    config: ObjectBuilder::new().set("organization_id", "123").into(),
                    provider_meta: None,
                    client_capabilities: Default::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let first = AttributePath::new("networks").index(0);
        assert_eq!(
            response
                .state
                .get_string(&first.clone().attribute("name"))
                .unwrap(),
            "Branch"
        );
        assert_eq!(
            response
                .state
                .get_list(&first.attribute("product_types"))
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            response.state.get_string(&AttributePath::new("id")).unwrap(),
            "123"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn read_requires_organization_id() {
        let mut server = Server::new_async().await;
        let mut data_source = NetworksDataSource::new();
        data_source
            .configure(
                Context::new(),
                ConfigureDataSourceRequest {
                    provider_data: Some(provider_data_for(&server)),
                },
            )
            .await;
        let mock = server.mock("GET", mockito::Matcher::Any).expect(0).create_async().await;

        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "meraki_networks".into(),
                    config: ObjectBuilder::new().set("organization_id", Dynamic::Null).into(),
                    provider_meta: None,
                    client_capabilities: Default::default(),
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        mock.assert_async().await;
    }
}
