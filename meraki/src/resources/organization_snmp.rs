//! Organization SNMP settings
//!
//! A settings object: create and update both PUT the settings, delete turns
//! SNMP v2c and v3 off.

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
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{StringLengthValidator, StringOneOfValidator};
use tfplug::value::{ObjectBuilder, Value};

use super::common::{api_error, attr, configure, invalid_value, list_like_prior, provider_data, required};
use crate::api::snmp::OrganizationSnmp;
use crate::MerakiProviderData;

#[derive(Default)]
pub struct OrganizationSnmpResource {
    provider_data: Option<MerakiProviderData>,
}

impl OrganizationSnmpResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
struct OrganizationSnmpModel {
    organization_id: Value<String>,
    v2c_enabled: Value<bool>,
    v3_enabled: Value<bool>,
    v3_auth_mode: Value<String>,
    v3_auth_pass: Value<String>,
    v3_priv_mode: Value<String>,
    v3_priv_pass: Value<String>,
    peer_ips: Value<Vec<String>>,
    hostname: Value<String>,
    port: Value<i64>,
    v2_community_string: Value<String>,
    v3_user: Value<String>,
}

impl OrganizationSnmpModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            organization_id: attr(value, "organization_id")?,
            v2c_enabled: attr(value, "v2c_enabled")?,
            v3_enabled: attr(value, "v3_enabled")?,
            v3_auth_mode: attr(value, "v3_auth_mode")?,
            v3_auth_pass: attr(value, "v3_auth_pass")?,
            v3_priv_mode: attr(value, "v3_priv_mode")?,
            v3_priv_pass: attr(value, "v3_priv_pass")?,
            peer_ips: attr(value, "peer_ips")?,
            hostname: attr(value, "hostname")?,
            port: attr(value, "port")?,
            v2_community_string: attr(value, "v2_community_string")?,
            v3_user: attr(value, "v3_user")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("organization_id", self.organization_id.clone())
            .set("v2c_enabled", self.v2c_enabled.clone())
            .set("v3_enabled", self.v3_enabled.clone())
            .set("v3_auth_mode", self.v3_auth_mode.clone())
            .set("v3_auth_pass", self.v3_auth_pass.clone())
            .set("v3_priv_mode", self.v3_priv_mode.clone())
            .set("v3_priv_pass", self.v3_priv_pass.clone())
            .set("peer_ips", self.peer_ips.clone())
            .set("hostname", self.hostname.clone())
            .set("port", self.port.clone())
            .set("v2_community_string", self.v2_community_string.clone())
            .set("v3_user", self.v3_user.clone())
            .into()
    }

    fn settings(&self) -> OrganizationSnmp {
        OrganizationSnmp {
            v2c_enabled: self.v2c_enabled.cloned_option(),
            v3_enabled: self.v3_enabled.cloned_option(),
            v3_auth_mode: self.v3_auth_mode.cloned_option(),
            v3_auth_pass: self.v3_auth_pass.cloned_option(),
            v3_priv_mode: self.v3_priv_mode.cloned_option(),
            v3_priv_pass: self.v3_priv_pass.cloned_option(),
            peer_ips: Some(self.peer_ips.cloned_option().unwrap_or_default()),
            ..Default::default()
        }
    }

    /// The API never returns the v3 passwords; they stay as planned
    fn apply(&mut self, snmp: OrganizationSnmp) {
        self.v2c_enabled = snmp.v2c_enabled.into();
        self.v3_enabled = snmp.v3_enabled.into();
        self.v3_auth_mode = snmp.v3_auth_mode.into();
        self.v3_priv_mode = snmp.v3_priv_mode.into();
        self.peer_ips = list_like_prior(&self.peer_ips, snmp.peer_ips.unwrap_or_default());
        self.hostname = snmp.hostname.into();
        self.port = snmp.port.into();
        self.v2_community_string = snmp.v2_community_string.into();
        self.v3_user = snmp.v3_user.into();
        if self.v3_auth_pass.is_unknown() {
            self.v3_auth_pass = Value::Null;
        }
        if self.v3_priv_pass.is_unknown() {
            self.v3_priv_pass = Value::Null;
        }
    }
}

#[async_trait]
impl Resource for OrganizationSnmpResource {
    fn type_name(&self) -> &str {
        "meraki_organization_snmp"
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
            .description("Manages the SNMP settings of an organization")
            .attribute(
                AttributeBuilder::new("organization_id", AttributeType::String)
                    .description("Organization ID")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("v2c_enabled", AttributeType::Bool)
                    .description("Whether SNMP v2c is enabled")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("v3_enabled", AttributeType::Bool)
                    .description("Whether SNMP v3 is enabled")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("v3_auth_mode", AttributeType::String)
                    .description("SNMP v3 authentication mode: MD5 or SHA")
                    .optional()
                    .computed()
                    .validator(StringOneOfValidator::new(&["MD5", "SHA"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("v3_auth_pass", AttributeType::String)
                    .description("SNMP v3 authentication password, at least 8 characters")
                    .optional()
                    .sensitive()
                    .validator(StringLengthValidator::between(8, 256))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("v3_priv_mode", AttributeType::String)
                    .description("SNMP v3 privacy mode: DES or AES128")
                    .optional()
                    .computed()
                    .validator(StringOneOfValidator::new(&["DES", "AES128"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("v3_priv_pass", AttributeType::String)
                    .description("SNMP v3 privacy password, at least 8 characters")
                    .optional()
                    .sensitive()
                    .validator(StringLengthValidator::between(8, 256))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("peer_ips", AttributeType::list_of(AttributeType::String))
                    .description("IPs allowed to query SNMP")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("hostname", AttributeType::String)
                    .description("Hostname of the SNMP server")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("port", AttributeType::Number)
                    .description("Port of the SNMP server")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("v2_community_string", AttributeType::String)
                    .description("SNMP v2c community string")
                    .computed()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("v3_user", AttributeType::String)
                    .description("SNMP v3 username")
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
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        let v3_enabled = attr::<bool>(&request.config, "v3_enabled");
        if let Ok(Value::Known(true)) = v3_enabled {
            for name in ["v3_auth_pass", "v3_priv_pass"] {
                if let Ok(Value::Null) = attr::<String>(&request.config, name) {
                    diagnostics.push(
                        Diagnostic::error(
                            "Missing SNMP v3 password",
                            format!("'{}' is required when v3_enabled is true", name),
                        )
                        .with_attribute(AttributePath::new(name)),
                    );
                }
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

impl OrganizationSnmpResource {
    async fn put_settings(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model = OrganizationSnmpModel::from_value(planned)
            .map_err(|e| invalid_value("planned state", e))?;
        let organization_id = required(&model.organization_id, "organization_id")?.to_string();

        let snmp = data
            .client
            .snmp()
            .update_organization(&organization_id, &model.settings())
            .await
            .map_err(|e| api_error("Failed to update organization SNMP settings", &e))?;

        model.apply(snmp);
        Ok(model.to_value())
    }

    async fn read_settings(
        &self,
        current: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            OrganizationSnmpModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let organization_id = required(&model.organization_id, "organization_id")?.to_string();

        match data.client.snmp().get_organization(&organization_id).await {
            Ok(snmp) => {
                model.apply(snmp);
                Ok(Some(model.to_value()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(api_error("Failed to read organization SNMP settings", &e)),
        }
    }

    async fn disable(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let model =
            OrganizationSnmpModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let organization_id = required(&model.organization_id, "organization_id")?;

        let settings = OrganizationSnmp {
            v2c_enabled: Some(false),
            v3_enabled: Some(false),
            ..Default::default()
        };
        match data
            .client
            .snmp()
            .update_organization(organization_id, &settings)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(api_error("Failed to disable organization SNMP", &e)),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for OrganizationSnmpResource {
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
impl ResourceWithImportState for OrganizationSnmpResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        import_state_passthrough_id(
            &ctx,
            AttributePath::new("organization_id"),
            &request,
            &mut response,
        );
        response
    }
}
