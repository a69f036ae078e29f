//! Organization administrator resource
//!
//! The API has no endpoint for a single admin, so reads list the
//! organization's admins and pick the one with a matching id.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import::import_state_composite_id;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedTypeBuilder, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::StringOneOfValidator;
use tfplug::value::{FromDynamic, IntoDynamic, ObjectBuilder, ObjectReader, Value};

use super::common::{
    api_error, attr, configure, invalid_value, list_like_prior, provider_data, required,
};
use crate::api::admins::{Admin, AdminNetwork, AdminTag, CreateAdminRequest, UpdateAdminRequest};
use crate::MerakiProviderData;

const ORG_ACCESS: &[&str] = &["full", "read-only", "enterprise", "none"];
const NETWORK_ACCESS: &[&str] = &[
    "full",
    "read-only",
    "guest-ambassador",
    "monitor-only",
    "ssid-admin",
];
const AUTHENTICATION_METHODS: &[&str] = &["Email", "Cisco SecureX Sign-On"];

#[derive(Default)]
pub struct OrganizationAdminResource {
    provider_data: Option<MerakiProviderData>,
}

impl OrganizationAdminResource {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Privilege on networks carrying a tag
#[derive(Debug, Clone, PartialEq)]
struct TagPrivilege {
    tag: Value<String>,
    access: Value<String>,
}

impl FromDynamic for TagPrivilege {
    fn from_dynamic(value: &Dynamic) -> tfplug::Result<Self> {
        let obj = ObjectReader::new(value)?;
        Ok(Self {
            tag: obj.get("tag")?,
            access: obj.get("access")?,
        })
    }
}

impl IntoDynamic for TagPrivilege {
    fn into_dynamic(self) -> Dynamic {
        ObjectBuilder::new()
            .set("tag", self.tag)
            .set("access", self.access)
            .build()
    }
}

/// Privilege on a single network
#[derive(Debug, Clone, PartialEq)]
struct NetworkPrivilege {
    id: Value<String>,
    access: Value<String>,
}

impl FromDynamic for NetworkPrivilege {
    fn from_dynamic(value: &Dynamic) -> tfplug::Result<Self> {
        let obj = ObjectReader::new(value)?;
        Ok(Self {
            id: obj.get("id")?,
            access: obj.get("access")?,
        })
    }
}

impl IntoDynamic for NetworkPrivilege {
    fn into_dynamic(self) -> Dynamic {
        ObjectBuilder::new()
            .set("id", self.id)
            .set("access", self.access)
            .build()
    }
}

#[derive(Debug, Clone, Default)]
struct AdminModel {
    id: Value<String>,
    organization_id: Value<String>,
    name: Value<String>,
    email: Value<String>,
    org_access: Value<String>,
    authentication_method: Value<String>,
    tags: Value<Vec<TagPrivilege>>,
    networks: Value<Vec<NetworkPrivilege>>,
    account_status: Value<String>,
    two_factor_auth_enabled: Value<bool>,
    has_api_key: Value<bool>,
}

impl AdminModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            id: attr(value, "id")?,
            organization_id: attr(value, "organization_id")?,
            name: attr(value, "name")?,
            email: attr(value, "email")?,
            org_access: attr(value, "org_access")?,
            authentication_method: attr(value, "authentication_method")?,
            tags: attr(value, "tags")?,
            networks: attr(value, "networks")?,
            account_status: attr(value, "account_status")?,
            two_factor_auth_enabled: attr(value, "two_factor_auth_enabled")?,
            has_api_key: attr(value, "has_api_key")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("id", self.id.clone())
            .set("organization_id", self.organization_id.clone())
            .set("name", self.name.clone())
            .set("email", self.email.clone())
            .set("org_access", self.org_access.clone())
            .set("authentication_method", self.authentication_method.clone())
            .set("tags", self.tags.clone())
            .set("networks", self.networks.clone())
            .set("account_status", self.account_status.clone())
            .set("two_factor_auth_enabled", self.two_factor_auth_enabled.clone())
            .set("has_api_key", self.has_api_key.clone())
            .into()
    }

    fn api_tags(&self) -> Vec<AdminTag> {
        self.tags
            .as_option()
            .map(|tags| {
                tags.iter()
                    .map(|t| AdminTag {
                        tag: t.tag.cloned_option().unwrap_or_default(),
                        access: t.access.cloned_option().unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn api_networks(&self) -> Vec<AdminNetwork> {
        self.networks
            .as_option()
            .map(|networks| {
                networks
                    .iter()
                    .map(|n| AdminNetwork {
                        id: n.id.cloned_option().unwrap_or_default(),
                        access: n.access.cloned_option().unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn apply(&mut self, organization_id: &str, admin: Admin) {
        self.id = Value::Known(admin.id);
        self.organization_id = Value::Known(organization_id.to_string());
        self.name = Value::Known(admin.name);
        self.email = Value::Known(admin.email);
        self.org_access = Value::Known(admin.org_access);
        self.authentication_method = admin.authentication_method.into();
        let tags = admin
            .tags
            .into_iter()
            .map(|t| TagPrivilege {
                tag: Value::Known(t.tag),
                access: Value::Known(t.access),
            })
            .collect();
        self.tags = list_like_prior(&self.tags, tags);
        let networks = admin
            .networks
            .into_iter()
            .map(|n| NetworkPrivilege {
                id: Value::Known(n.id),
                access: Value::Known(n.access),
            })
            .collect();
        self.networks = list_like_prior(&self.networks, networks);
        self.account_status = admin.account_status.into();
        self.two_factor_auth_enabled = admin.two_factor_auth_enabled.into();
        self.has_api_key = admin.has_api_key.into();
    }
}

#[async_trait]
impl Resource for OrganizationAdminResource {
    fn type_name(&self) -> &str {
        "meraki_organization_admin"
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
            .description("Manages a dashboard administrator of an organization")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Admin ID")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_id", AttributeType::String)
                    .description("Organization ID")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Admin name")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("email", AttributeType::String)
                    .description("Admin email address")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("org_access", AttributeType::String)
                    .description("Organization privilege: full, read-only, enterprise or none")
                    .required()
                    .validator(StringOneOfValidator::new(ORG_ACCESS))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("authentication_method", AttributeType::String)
                    .description("Email or Cisco SecureX Sign-On")
                    .optional()
                    .computed()
                    .validator(StringOneOfValidator::new(AUTHENTICATION_METHODS))
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "tags",
                    NestedTypeBuilder::list()
                        .attribute(
                            AttributeBuilder::new("tag", AttributeType::String)
                                .description("Network tag")
                                .required()
                                .build(),
                        )
                        .attribute(
                            AttributeBuilder::new("access", AttributeType::String)
                                .description("Privilege on networks with the tag")
                                .required()
                                .validator(StringOneOfValidator::new(NETWORK_ACCESS))
                                .build(),
                        )
                        .build(),
                )
                .description("Privileges on tagged networks")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "networks",
                    NestedTypeBuilder::list()
                        .attribute(
                            AttributeBuilder::new("id", AttributeType::String)
                                .description("Network ID")
                                .required()
                                .build(),
                        )
                        .attribute(
                            AttributeBuilder::new("access", AttributeType::String)
                                .description("Privilege on the network")
                                .required()
                                .validator(StringOneOfValidator::new(NETWORK_ACCESS))
                                .build(),
                        )
                        .build(),
                )
                .description("Privileges on individual networks")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("account_status", AttributeType::String)
                    .description("Status of the admin's account")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("two_factor_auth_enabled", AttributeType::Bool)
                    .description("Whether two-factor authentication is enabled")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("has_api_key", AttributeType::Bool)
                    .description("Whether the admin has an API key")
                    .computed()
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
        CreateResourceResponse::from_result(self.create_admin(&request.planned_state).await)
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_admin(&request.current_state).await;
        ReadResourceResponse::from_result(result, request)
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_admin(&request.prior_state, &request.planned_state)
            .await;
        UpdateResourceResponse::from_result(result, request.prior_state)
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse::from_result(self.delete_admin(&request.prior_state).await)
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl OrganizationAdminResource {
    async fn create_admin(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            AdminModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let organization_id = required(&model.organization_id, "organization_id")?.to_string();

        let request = CreateAdminRequest {
            email: required(&model.email, "email")?.to_string(),
            name: required(&model.name, "name")?.to_string(),
            org_access: required(&model.org_access, "org_access")?.to_string(),
            tags: model.tags.is_known().then(|| model.api_tags()),
            networks: model.networks.is_known().then(|| model.api_networks()),
            authentication_method: model.authentication_method.cloned_option(),
        };

        let admin = data
            .client
            .admins()
            .create(&organization_id, &request)
            .await
            .map_err(|e| api_error("Failed to create organization admin", &e))?;

        tracing::info!(%organization_id, admin_id = %admin.id, "created organization admin");
        model.apply(&organization_id, admin);
        Ok(model.to_value())
    }

    async fn read_admin(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model = AdminModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let organization_id = required(&model.organization_id, "organization_id")?.to_string();
        let admin_id = required(&model.id, "id")?.to_string();

        match data.client.admins().find(&organization_id, &admin_id).await {
            Ok(Some(admin)) => {
                model.apply(&organization_id, admin);
                Ok(Some(model.to_value()))
            }
            Ok(None) => {
                tracing::info!(%organization_id, %admin_id, "admin no longer exists, removing from state");
                Ok(None)
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(api_error("Failed to read organization admin", &e)),
        }
    }

    async fn update_admin(
        &self,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let prior = AdminModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let mut model =
            AdminModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let organization_id = required(&model.organization_id, "organization_id")?.to_string();
        let admin_id = required(&prior.id, "id")?.to_string();

        // Unset privilege lists are sent empty so removed entries are revoked
        let request = UpdateAdminRequest {
            name: model.name.cloned_option(),
            org_access: model.org_access.cloned_option(),
            tags: Some(model.api_tags()),
            networks: Some(model.api_networks()),
        };

        let admin = data
            .client
            .admins()
            .update(&organization_id, &admin_id, &request)
            .await
            .map_err(|e| api_error("Failed to update organization admin", &e))?;

        model.apply(&organization_id, admin);
        Ok(model.to_value())
    }

    async fn delete_admin(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let model = AdminModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let organization_id = required(&model.organization_id, "organization_id")?;
        let admin_id = required(&model.id, "id")?;

        match data.client.admins().delete(organization_id, admin_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(api_error("Failed to delete organization admin", &e)),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for OrganizationAdminResource {
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
impl ResourceWithImportState for OrganizationAdminResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        import_state_composite_id(&ctx, &["organization_id", "id"], &request, &mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::provider_data_for;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tfplug::types::AttributePath;

    const ADMINS_JSON: &str = r#"[
        {"id":"A1","name":"Miles","email":"miles@example.com","orgAccess":"none",
         "tags":[{"tag":"west","access":"read-only"}],"networks":[],
         "authenticationMethod":"Email","accountStatus":"ok",
         "twoFactorAuthEnabled":false,"hasApiKey":false},
        {"id":"A2","name":"Other","email":"other@example.com","orgAccess":"full"}
    ]"#;

    async fn configured(server: &Server) -> OrganizationAdminResource {
        let mut resource = OrganizationAdminResource::new();
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

    fn state(id: &str) -> DynamicValue {
        ObjectBuilder::new()
            .set("organization_id", "O1")
            .set("id", id)
            .into()
    }

    fn read_request(current_state: DynamicValue) -> ReadResourceRequest {
        ReadResourceRequest {
            type_name: "meraki_organization_admin".into(),
            current_state,
            private: vec![],
            provider_meta: None,
            client_capabilities: Default::default(),
        }
    }

    #[tokio::test]
    async fn read_picks_admin_from_list() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/organizations/O1/admins")
            .with_body(ADMINS_JSON)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource.read(Context::new(), read_request(state("A1"))).await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let new_state = response.new_state.unwrap();
        assert_eq!(
            new_state.get_string(&AttributePath::new("email")).unwrap(),
            "miles@example.com"
        );
        assert_eq!(
            new_state
                .get_string(&AttributePath::new("tags").index(0).attribute("access"))
                .unwrap(),
            "read-only"
        );
        // No network privileges and none configured
        assert!(new_state
            .get::<Vec<Dynamic>>(&AttributePath::new("networks"))
            .unwrap()
            .is_null());
    }

    #[tokio::test]
    async fn read_of_removed_admin_clears_state() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/organizations/O1/admins")
            .with_body(ADMINS_JSON)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource.read(Context::new(), read_request(state("A9"))).await;
        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.is_none());
    }

    #[tokio::test]
    async fn update_revokes_unset_privileges() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/organizations/O1/admins/A1")
            .match_body(Matcher::Json(json!({
                "name": "Miles",
                "orgAccess": "read-only",
                "tags": [],
                "networks": []
            })))
            .with_body(
                r#"{"id":"A1","name":"Miles","email":"miles@example.com","orgAccess":"read-only"}"#,
            )
            .create_async()
            .await;

        let resource = configured(&server).await;
        let planned: DynamicValue = ObjectBuilder::new()
            .set("organization_id", "O1")
            .set("id", "A1")
            .set("name", "Miles")
            .set("email", "miles@example.com")
            .set("org_access", "read-only")
            .into();
        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "meraki_organization_admin".into(),
                    prior_state: state("A1"),
                    planned_state: planned.clone(),
                    config: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn import_splits_organization_and_admin() {
        let resource = OrganizationAdminResource::new();
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "meraki_organization_admin".into(),
                    id: "O1/A1".into(),
                    client_capabilities: Default::default(),
                },
            )
            .await;
        let state = &response.imported_resources[0].state;
        assert_eq!(state.get_string(&AttributePath::new("organization_id")).unwrap(), "O1");
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "A1");
    }
}
