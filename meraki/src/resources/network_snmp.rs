//! Network SNMP settings

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::RequiresReplace;
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
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::StringOneOfValidator;
use tfplug::value::{FromDynamic, IntoDynamic, ObjectBuilder, ObjectReader, Value};

use super::common::{
    api_error, attr, configure, invalid_value, list_like_prior, provider_data, required,
};
use crate::api::snmp::{NetworkSnmp, SnmpUser};
use crate::MerakiProviderData;

const ACCESS_MODES: &[&str] = &["none", "community", "users"];

#[derive(Default)]
pub struct NetworkSnmpResource {
    provider_data: Option<MerakiProviderData>,
}

impl NetworkSnmpResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct UserModel {
    username: Value<String>,
    passphrase: Value<String>,
}

impl FromDynamic for UserModel {
    fn from_dynamic(value: &Dynamic) -> tfplug::Result<Self> {
        let obj = ObjectReader::new(value)?;
        Ok(Self {
            username: obj.get("username")?,
            passphrase: obj.get("passphrase")?,
        })
    }
}

impl IntoDynamic for UserModel {
    fn into_dynamic(self) -> Dynamic {
        ObjectBuilder::new()
            .set("username", self.username)
            .set("passphrase", self.passphrase)
            .build()
    }
}

#[derive(Debug, Clone, Default)]
struct NetworkSnmpModel {
    network_id: Value<String>,
    access: Value<String>,
    community_string: Value<String>,
    users: Value<Vec<UserModel>>,
}

impl NetworkSnmpModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            network_id: attr(value, "network_id")?,
            access: attr(value, "access")?,
            community_string: attr(value, "community_string")?,
            users: attr(value, "users")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("network_id", self.network_id.clone())
            .set("access", self.access.clone())
            .set("community_string", self.community_string.clone())
            .set("users", self.users.clone())
            .into()
    }

    fn settings(&self) -> NetworkSnmp {
        NetworkSnmp {
            access: self.access.cloned_option().unwrap_or_else(|| "none".to_string()),
            community_string: self.community_string.cloned_option(),
            users: self
                .users
                .as_option()
                .map(|users| {
                    users
                        .iter()
                        .map(|u| SnmpUser {
                            username: u.username.cloned_option().unwrap_or_default(),
                            passphrase: u.passphrase.cloned_option().unwrap_or_default(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    fn apply(&mut self, snmp: NetworkSnmp) {
        self.access = Value::Known(snmp.access);
        if snmp.community_string.is_some() || !self.community_string.is_known() {
            self.community_string = snmp.community_string.into();
        }
        let users = snmp
            .users
            .into_iter()
            .map(|u| UserModel {
                username: Value::Known(u.username),
                passphrase: Value::Known(u.passphrase),
            })
            .collect();
        self.users = list_like_prior(&self.users, users);
    }
}

#[async_trait]
impl Resource for NetworkSnmpResource {
    fn type_name(&self) -> &str {
        "meraki_network_snmp"
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
            .description("Manages the SNMP settings of a network")
            .attribute(
                AttributeBuilder::new("network_id", AttributeType::String)
                    .description("Network ID")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("access", AttributeType::String)
                    .description("SNMP access: none, community or users")
                    .required()
                    .validator(StringOneOfValidator::new(ACCESS_MODES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("community_string", AttributeType::String)
                    .description("SNMP community string when access is community")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "users",
                    NestedTypeBuilder::list()
                        .attribute(
                            AttributeBuilder::new("username", AttributeType::String)
                                .description("SNMP username")
                                .required()
                                .build(),
                        )
                        .attribute(
                            AttributeBuilder::new("passphrase", AttributeType::String)
                                .description("SNMP passphrase")
                                .required()
                                .sensitive()
                                .build(),
                        )
                        .build(),
                )
                .description("SNMP users when access is users")
                .optional()
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
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        if let Ok(Value::Known(access)) = attr::<String>(&request.config, "access") {
            let community = attr::<String>(&request.config, "community_string");
            if access == "community" && matches!(community, Ok(Value::Null)) {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing community string",
                        "community_string is required when access is \"community\"",
                    )
                    .with_attribute(AttributePath::new("community_string")),
                );
            }
            let users = attr::<Vec<Dynamic>>(&request.config, "users");
            if access == "users" && matches!(users, Ok(Value::Null)) {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing SNMP users",
                        "users is required when access is \"users\"",
                    )
                    .with_attribute(AttributePath::new("users")),
                );
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        CreateResourceResponse::from_result(self.put_settings(&request.planned_state).await)
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_settings(&request.current_state).await;
        ReadResourceResponse::from_result(result, request)
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self.put_settings(&request.planned_state).await;
        UpdateResourceResponse::from_result(result, request.prior_state)
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse::from_result(self.disable(&request.prior_state).await)
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl NetworkSnmpResource {
    async fn put_settings(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            NetworkSnmpModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let network_id = required(&model.network_id, "network_id")?.to_string();

        let snmp = data
            .client
            .snmp()
            .update_network(&network_id, &model.settings())
            .await
            .map_err(|e| api_error("Failed to update network SNMP settings", &e))?;

        model.apply(snmp);
        Ok(model.to_value())
    }

    async fn read_settings(
        &self,
        current: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            NetworkSnmpModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let network_id = required(&model.network_id, "network_id")?.to_string();

        match data.client.snmp().get_network(&network_id).await {
            Ok(snmp) => {
                model.apply(snmp);
                Ok(Some(model.to_value()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(api_error("Failed to read network SNMP settings", &e)),
        }
    }

    async fn disable(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let model =
            NetworkSnmpModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let network_id = required(&model.network_id, "network_id")?;

        let settings = NetworkSnmp {
            access: "none".to_string(),
            ..Default::default()
        };
        match data.client.snmp().update_network(network_id, &settings).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(api_error("Failed to disable network SNMP", &e)),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for NetworkSnmpResource {
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
impl ResourceWithImportState for NetworkSnmpResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        import_state_passthrough_id(&ctx, AttributePath::new("network_id"), &request, &mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::provider_data_for;
    use mockito::{Matcher, Server};
    use serde_json::json;

    async fn configured(server: &Server) -> NetworkSnmpResource {
        let mut resource = NetworkSnmpResource::new();
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
    async fn create_with_users() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/networks/N_1/snmp")
            .match_body(Matcher::Json(json!({
                "access": "users",
                "users": [{"username": "ops", "passphrase": "opspass123"}]
            })))
            .with_body(
                r#"{"access":"users","users":[{"username":"ops","passphrase":"opspass123"}]}"#,
            )
            .create_async()
            .await;

        let resource = configured(&server).await;
        let users = Dynamic::List(vec![ObjectBuilder::new()
            .set("username", "ops")
            .set("passphrase", "opspass123")
            .build()]);
        let planned: DynamicValue = ObjectBuilder::new()
            .set("network_id", "N_1")
            .set("access", "users")
            .set("users", users)
            .into();
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "meraki_network_snmp".into(),
                    config: planned.clone(),
                    planned_state: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response
                .new_state
                .get_string(&AttributePath::new("users").index(0).attribute("username"))
                .unwrap(),
            "ops"
        );
        assert!(response
            .new_state
            .get::<String>(&AttributePath::new("community_string"))
            .unwrap()
            .is_null());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_sets_access_none() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/networks/N_1/snmp")
            .match_body(Matcher::Json(json!({"access": "none"})))
            .with_body(r#"{"access":"none"}"#)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "meraki_network_snmp".into(),
                    prior_state: ObjectBuilder::new()
                        .set("network_id", "N_1")
                        .set("access", "community")
                        .set("community_string", "public")
                        .into(),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn community_access_needs_community_string() {
        let resource = NetworkSnmpResource::new();
        let response = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "meraki_network_snmp".into(),
                    config: ObjectBuilder::new()
                        .set("network_id", "N_1")
                        .set("access", "community")
                        .into(),
                    client_capabilities: Default::default(),
                },
            )
            .await;
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Missing community string");
    }
}
