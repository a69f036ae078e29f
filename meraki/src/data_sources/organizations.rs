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

use super::computed;
use crate::api::organizations::Organization;
use crate::resources::common::{api_error, configure, provider_data};
use crate::MerakiProviderData;

/// Lists every organization the API key can access
#[derive(Default)]
pub struct OrganizationsDataSource {
    provider_data: Option<MerakiProviderData>,
}

impl OrganizationsDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn list(&self) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let organizations = data
            .client
            .organizations()
            .list()
            .await
            .map_err(|e| api_error("Failed to list organizations", &e))?;

        tracing::debug!(count = organizations.len(), "listed organizations");
        let organizations: Vec<Dynamic> = organizations.into_iter().map(organization).collect();

        Ok(ObjectBuilder::new()
            .set("id", "organizations")
            .set("organizations", organizations)
            .into())
    }
}

fn organization(org: Organization) -> Dynamic {
    ObjectBuilder::new()
        .set("id", org.id)
        .set("name", org.name)
        .set("url", org.url)
        .set("api_enabled", org.api.map(|api| api.enabled))
        .build()
}

#[async_trait]
impl DataSource for OrganizationsDataSource {
    fn type_name(&self) -> &str {
        "meraki_organizations"
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
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Organizations accessible with the configured API key")
            .attribute(computed("id", AttributeType::String, "Placeholder identifier"))
            .attribute(
                AttributeBuilder::nested(
                    "organizations",
                    NestedTypeBuilder::list()
                        .attribute(computed("id", AttributeType::String, "Organization ID"))
                        .attribute(computed("name", AttributeType::String, "Organization name"))
                        .attribute(computed("url", AttributeType::String, "Dashboard URL"))
                        .attribute(computed(
                            "api_enabled",
                            AttributeType::Bool,
                            "Whether API access is enabled",
                        ))
                        .build(),
                )
                .description("Organizations")
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
        let result = self.list().await;
        ReadDataSourceResponse::from_result(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for OrganizationsDataSource {
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
    async fn read_lists_organizations() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/organizations")
            .with_body(
                r#"[
                    {"id": "1", "name": "Acme", "url": "https://n1.meraki.com/o/1", "api": {"enabled": true}},
                    {"id": "2", "name": "Globex"}
                ]"#,
            )
            .create_async()
            .await;

        let mut data_source = OrganizationsDataSource::new();
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
                    type_name: "meraki_organizations".into(),
                    config: DynamicValue::null(),
                    provider_meta: None,
                    client_capabilities: Default::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let orgs = AttributePath::new("organizations");
        assert_eq!(
            response
                .state
                .get_string(&orgs.clone().index(1).attribute("name"))
                .unwrap(),
            "Globex"
        );
        assert!(response
            .state
            .get_bool(&orgs.index(0).attribute("api_enabled"))
            .unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn read_without_configure_reports_error() {
        let response = OrganizationsDataSource::new()
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "meraki_organizations".into(),
                    config: DynamicValue::null(),
                    provider_meta: None,
                    client_capabilities: Default::default(),
                },
            )
            .await;
        assert_eq!(response.diagnostics.len(), 1);
    }
}
