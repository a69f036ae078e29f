//! Syslog servers of a network

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
use tfplug::validator::NumberRangeValidator;
use tfplug::value::{FromDynamic, IntoDynamic, ObjectBuilder, ObjectReader, Value};

use super::common::{
    api_error, attr, configure, invalid_value, list_like_prior, provider_data, required,
};
use crate::api::syslog::{SyslogServer, SyslogServers};
use crate::MerakiProviderData;

#[derive(Default)]
pub struct NetworkSyslogServersResource {
    provider_data: Option<MerakiProviderData>,
}

impl NetworkSyslogServersResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ServerModel {
    host: Value<String>,
    port: Value<i64>,
    roles: Value<Vec<String>>,
}

impl FromDynamic for ServerModel {
    fn from_dynamic(value: &Dynamic) -> tfplug::Result<Self> {
        let obj = ObjectReader::new(value)?;
        Ok(Self {
            host: obj.get("host")?,
            port: obj.get("port")?,
            roles: obj.get("roles")?,
        })
    }
}

impl IntoDynamic for ServerModel {
    fn into_dynamic(self) -> Dynamic {
        ObjectBuilder::new()
            .set("host", self.host)
            .set("port", self.port)
            .set("roles", self.roles)
            .build()
    }
}

impl From<SyslogServer> for ServerModel {
    fn from(server: SyslogServer) -> Self {
        Self {
            host: Value::Known(server.host),
            port: server.port.parse::<i64>().ok().into(),
            roles: Value::Known(server.roles),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SyslogModel {
    network_id: Value<String>,
    servers: Value<Vec<ServerModel>>,
}

impl SyslogModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            network_id: attr(value, "network_id")?,
            servers: attr(value, "servers")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("network_id", self.network_id.clone())
            .set("servers", self.servers.clone())
            .into()
    }

    fn settings(&self) -> SyslogServers {
        let servers = self
            .servers
            .as_option()
            .map(|servers| {
                servers
                    .iter()
                    .map(|s| SyslogServer {
                        host: s.host.cloned_option().unwrap_or_default(),
                        port: s.port.as_option().map(i64::to_string).unwrap_or_default(),
                        roles: s.roles.cloned_option().unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        SyslogServers { servers }
    }

    fn apply(&mut self, servers: SyslogServers) {
        let servers = servers.servers.into_iter().map(ServerModel::from).collect();
        self.servers = list_like_prior(&self.servers, servers);
    }
}

#[async_trait]
impl Resource for NetworkSyslogServersResource {
    fn type_name(&self) -> &str {
        "meraki_network_syslog_servers"
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
            .description("Manages the syslog servers of a network")
            .attribute(
                AttributeBuilder::new("network_id", AttributeType::String)
                    .description("Network ID")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "servers",
                    NestedTypeBuilder::list()
                        .attribute(
                            AttributeBuilder::new("host", AttributeType::String)
                                .description("IP address of the syslog server")
                                .required()
                                .build(),
                        )
                        .attribute(
                            AttributeBuilder::new("port", AttributeType::Number)
                                .description("Port of the syslog server")
                                .required()
                                .validator(NumberRangeValidator::between(1.0, 65535.0))
                                .build(),
                        )
                        .attribute(
                            AttributeBuilder::new(
                                "roles",
                                AttributeType::set_of(AttributeType::String),
                            )
                            .description("Event types sent to the server, e.g. \"Flows\"")
                            .required()
                            .build(),
                        )
                        .build(),
                )
                .description("Syslog servers")
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
        _request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse::default()
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        CreateResourceResponse::from_result(self.put_servers(&request.planned_state).await)
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_servers(&request.current_state).await;
        ReadResourceResponse::from_result(result, request)
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self.put_servers(&request.planned_state).await;
        UpdateResourceResponse::from_result(result, request.prior_state)
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse::from_result(self.clear(&request.prior_state).await)
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl NetworkSyslogServersResource {
    async fn put_servers(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            SyslogModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let network_id = required(&model.network_id, "network_id")?.to_string();

        let servers = data
            .client
            .syslog()
            .update(&network_id, &model.settings())
            .await
            .map_err(|e| api_error("Failed to update syslog servers", &e))?;

        model.apply(servers);
        Ok(model.to_value())
    }

    async fn read_servers(
        &self,
        current: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model = SyslogModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let network_id = required(&model.network_id, "network_id")?.to_string();

        match data.client.syslog().get(&network_id).await {
            Ok(servers) => {
                model.apply(servers);
                Ok(Some(model.to_value()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(api_error("Failed to read syslog servers", &e)),
        }
    }

    async fn clear(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let model = SyslogModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let network_id = required(&model.network_id, "network_id")?;

        match data
            .client
            .syslog()
            .update(network_id, &SyslogServers::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(api_error("Failed to clear syslog servers", &e)),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for NetworkSyslogServersResource {
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
impl ResourceWithImportState for NetworkSyslogServersResource {
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
