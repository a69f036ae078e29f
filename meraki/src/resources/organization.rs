use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::value::{ObjectBuilder, Value};

use super::common::{api_error, attr, configure, invalid_value, provider_data, required};
use crate::api::organizations::{Organization, OrganizationApi, OrganizationRequest};
use crate::MerakiProviderData;

#[derive(Default)]
pub struct OrganizationResource {
    provider_data: Option<MerakiProviderData>,
}

impl OrganizationResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
struct OrganizationModel {
    id: Value<String>,
    name: Value<String>,
    api_enabled: Value<bool>,
    url: Value<String>,
}

impl OrganizationModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            id: attr(value, "id")?,
            name: attr(value, "name")?,
            api_enabled: attr(value, "api_enabled")?,
            url: attr(value, "url")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("id", self.id.clone())
            .set("name", self.name.clone())
            .set("api_enabled", self.api_enabled.clone())
            .set("url", self.url.clone())
            .into()
    }

    fn request(&self) -> OrganizationRequest {
        OrganizationRequest {
            name: self.name.cloned_option(),
            api: self
                .api_enabled
                .cloned_option()
                .map(|enabled| OrganizationApi { enabled }),
        }
    }

    fn apply(&mut self, organization: Organization) {
        self.id = Value::Known(organization.id);
        self.name = Value::Known(organization.name);
        self.api_enabled = organization.api.map(|api| api.enabled).into();
        self.url = organization.url.into();
    }
}

#[async_trait]
impl Resource for OrganizationResource {
    fn type_name(&self) -> &str {
        "meraki_organization"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages a Meraki organization")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Organization ID")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Organization name")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_enabled", AttributeType::Bool)
                    .description("Whether Dashboard API access is enabled")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("url", AttributeType::String)
                    .description("Dashboard URL of the organization")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse::default()
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        CreateResourceResponse::from_result(self.create_organization(&request.planned_state).await)
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_organization(&request.current_state).await;
        ReadResourceResponse::from_result(result, request)
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_organization(&request.prior_state, &request.planned_state)
            .await;
        UpdateResourceResponse::from_result(result, request.prior_state)
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse::from_result(self.delete_organization(&request.prior_state).await)
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl OrganizationResource {
    async fn create_organization(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            OrganizationModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        required(&model.name, "name")?;

        let organization = data
            .client
            .organizations()
            .create(&model.request())
            .await
            .map_err(|e| api_error("Failed to create organization", &e))?;

        tracing::info!(organization_id = %organization.id, "created organization");
        model.apply(organization);
        Ok(model.to_value())
    }

    async fn read_organization(
        &self,
        current: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            OrganizationModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let organization_id = required(&model.id, "id")?.to_string();

        match data.client.organizations().get(&organization_id).await {
            Ok(organization) => {
                model.apply(organization);
                Ok(Some(model.to_value()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(api_error("Failed to read organization", &e)),
        }
    }

    async fn update_organization(
        &self,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let prior =
            OrganizationModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let mut model =
            OrganizationModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let organization_id = required(&prior.id, "id")?.to_string();

        let organization = data
            .client
            .organizations()
            .update(&organization_id, &model.request())
            .await
            .map_err(|e| api_error("Failed to update organization", &e))?;

        model.apply(organization);
        Ok(model.to_value())
    }

    async fn delete_organization(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let model =
            OrganizationModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let organization_id = required(&model.id, "id")?;

        match data.client.organizations().delete(organization_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(api_error("Failed to delete organization", &e)),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for OrganizationResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        ConfigureResourceResponse {
            diagnostics: configure(request.provider_data, &mut self.provider_data),
        }
    }
}

#[async_trait]
impl ResourceWithImportState for OrganizationResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::provider_data_for;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tfplug::types::Dynamic;

    async fn configured(server: &Server) -> OrganizationResource {
        let mut resource = OrganizationResource::new();
        resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: Some(provider_data_for(server)),
                },
            )
            .await;
        resource
    }

    #[tokio::test]
    async fn create_sends_api_flag_only_when_set() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/organizations")
            .match_body(Matcher::Json(json!({"name": "Acme"})))
            .with_status(201)
            .with_body(
                r#"{"id":"O1","name":"Acme","url":"https://n1.meraki.com/o/x/manage/organization/overview","api":{"enabled":true}}"#,
            )
            .create_async()
            .await;

        let resource = configured(&server).await;
        let planned: DynamicValue = ObjectBuilder::new()
            .set("id", Dynamic::Unknown)
            .set("name", "Acme")
            .set("api_enabled", Dynamic::Unknown)
            .set("url", Dynamic::Unknown)
            .into();
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "meraki_organization".into(),
                    config: planned.clone(),
                    planned_state: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response.new_state.get_string(&AttributePath::new("id")).unwrap(),
            "O1"
        );
        assert!(response
            .new_state
            .get_bool(&AttributePath::new("api_enabled"))
            .unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_tolerates_missing_organization() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/organizations/O1")
            .with_status(404)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "meraki_organization".into(),
                    prior_state: ObjectBuilder::new().set("id", "O1").into(),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;
        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn import_sets_id() {
        let resource = OrganizationResource::new();
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "meraki_organization".into(),
                    id: "O1".into(),
                    client_capabilities: Default::default(),
                },
            )
            .await;
        assert_eq!(
            response.imported_resources[0]
                .state
                .get_string(&AttributePath::new("id"))
                .unwrap(),
            "O1"
        );
    }
}
