//! Switch port configuration
//!
//! Ports always exist on the switch, so create and update both PUT the port
//! and delete leaves it as configured.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import::import_state_composite_id;
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
use tfplug::validator::{NumberRangeValidator, StringOneOfValidator};
use tfplug::value::{ObjectBuilder, Value};

use super::common::{api_error, attr, configure, invalid_value, provider_data, required};
use crate::api::switch::{SwitchPort, UpdateSwitchPortRequest};
use crate::MerakiProviderData;

const PORT_TYPES: &[&str] = &["trunk", "access"];
const STP_GUARDS: &[&str] = &["disabled", "root guard", "bpdu guard", "loop guard"];
const UDLD_MODES: &[&str] = &["Alert only", "Enforce"];

#[derive(Default)]
pub struct SwitchPortResource {
    provider_data: Option<MerakiProviderData>,
}

impl SwitchPortResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
struct SwitchPortModel {
    serial: Value<String>,
    port_id: Value<String>,
    name: Value<String>,
    tags: Value<Vec<String>>,
    enabled: Value<bool>,
    poe_enabled: Value<bool>,
    port_type: Value<String>,
    vlan: Value<i64>,
    voice_vlan: Value<i64>,
    allowed_vlans: Value<String>,
    isolation_enabled: Value<bool>,
    rstp_enabled: Value<bool>,
    stp_guard: Value<String>,
    link_negotiation: Value<String>,
    access_policy_type: Value<String>,
    udld: Value<String>,
}

impl SwitchPortModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            serial: attr(value, "serial")?,
            port_id: attr(value, "port_id")?,
            name: attr(value, "name")?,
            tags: attr(value, "tags")?,
            enabled: attr(value, "enabled")?,
            poe_enabled: attr(value, "poe_enabled")?,
            port_type: attr(value, "type")?,
            vlan: attr(value, "vlan")?,
            voice_vlan: attr(value, "voice_vlan")?,
            allowed_vlans: attr(value, "allowed_vlans")?,
            isolation_enabled: attr(value, "isolation_enabled")?,
            rstp_enabled: attr(value, "rstp_enabled")?,
            stp_guard: attr(value, "stp_guard")?,
            link_negotiation: attr(value, "link_negotiation")?,
            access_policy_type: attr(value, "access_policy_type")?,
            udld: attr(value, "udld")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("serial", self.serial.clone())
            .set("port_id", self.port_id.clone())
            .set("name", self.name.clone())
            .set("tags", self.tags.clone())
            .set("enabled", self.enabled.clone())
            .set("poe_enabled", self.poe_enabled.clone())
            .set("type", self.port_type.clone())
            .set("vlan", self.vlan.clone())
            .set("voice_vlan", self.voice_vlan.clone())
            .set("allowed_vlans", self.allowed_vlans.clone())
            .set("isolation_enabled", self.isolation_enabled.clone())
            .set("rstp_enabled", self.rstp_enabled.clone())
            .set("stp_guard", self.stp_guard.clone())
            .set("link_negotiation", self.link_negotiation.clone())
            .set("access_policy_type", self.access_policy_type.clone())
            .set("udld", self.udld.clone())
            .into()
    }

    /// Only known values are sent; everything else keeps the port's setting
    fn update_request(&self) -> UpdateSwitchPortRequest {
        UpdateSwitchPortRequest {
            name: self.name.cloned_option(),
            tags: self.tags.cloned_option(),
            enabled: self.enabled.cloned_option(),
            poe_enabled: self.poe_enabled.cloned_option(),
            port_type: self.port_type.cloned_option(),
            vlan: self.vlan.cloned_option(),
            voice_vlan: self.voice_vlan.cloned_option(),
            allowed_vlans: self.allowed_vlans.cloned_option(),
            isolation_enabled: self.isolation_enabled.cloned_option(),
            rstp_enabled: self.rstp_enabled.cloned_option(),
            stp_guard: self.stp_guard.cloned_option(),
            link_negotiation: self.link_negotiation.cloned_option(),
            access_policy_type: self.access_policy_type.cloned_option(),
            udld: self.udld.cloned_option(),
        }
    }

    fn apply(&mut self, port: SwitchPort) {
        self.port_id = Value::Known(port.port_id);
        self.name = port.name.into();
        self.tags = Value::Known(port.tags);
        self.enabled = port.enabled.into();
        self.poe_enabled = port.poe_enabled.into();
        self.port_type = port.port_type.into();
        self.vlan = port.vlan.into();
        self.voice_vlan = port.voice_vlan.into();
        self.allowed_vlans = port.allowed_vlans.into();
        self.isolation_enabled = port.isolation_enabled.into();
        self.rstp_enabled = port.rstp_enabled.into();
        self.stp_guard = port.stp_guard.into();
        self.link_negotiation = port.link_negotiation.into();
        self.access_policy_type = port.access_policy_type.into();
        self.udld = port.udld.into();
    }

    fn keys(&self) -> Result<(&str, &str), Diagnostic> {
        Ok((
            required(&self.serial, "serial")?,
            required(&self.port_id, "port_id")?,
        ))
    }
}

fn optional(name: &str, type_: AttributeType, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, type_)
        .description(description)
        .optional()
        .computed()
}

#[async_trait]
impl Resource for SwitchPortResource {
    fn type_name(&self) -> &str {
        "meraki_device_switch_port"
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
            .description("Configures a port of a switch")
            .attribute(
                AttributeBuilder::new("serial", AttributeType::String)
                    .description("Serial of the switch")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("port_id", AttributeType::String)
                    .description("Port identifier, e.g. \"1\"")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(optional("name", AttributeType::String, "Port name").build())
            .attribute(
                optional(
                    "tags",
                    AttributeType::set_of(AttributeType::String),
                    "Port tags",
                )
                .build(),
            )
            .attribute(optional("enabled", AttributeType::Bool, "Whether the port is enabled").build())
            .attribute(optional("poe_enabled", AttributeType::Bool, "Whether PoE is enabled").build())
            .attribute(
                optional("type", AttributeType::String, "Port type: trunk or access")
                    .validator(StringOneOfValidator::new(PORT_TYPES))
                    .build(),
            )
            .attribute(
                optional("vlan", AttributeType::Number, "Native VLAN (trunk) or access VLAN")
                    .validator(NumberRangeValidator::between(1.0, 4094.0))
                    .build(),
            )
            .attribute(
                optional("voice_vlan", AttributeType::Number, "Voice VLAN of an access port")
                    .validator(NumberRangeValidator::between(1.0, 4094.0))
                    .build(),
            )
            .attribute(
                optional(
                    "allowed_vlans",
                    AttributeType::String,
                    "VLANs allowed on a trunk port, e.g. \"1,3,5-10\" or \"all\"",
                )
                .build(),
            )
            .attribute(
                optional("isolation_enabled", AttributeType::Bool, "Whether port isolation is enabled")
                    .build(),
            )
            .attribute(
                optional("rstp_enabled", AttributeType::Bool, "Whether spanning tree is enabled")
                    .build(),
            )
            .attribute(
                optional("stp_guard", AttributeType::String, "Spanning tree guard")
                    .validator(StringOneOfValidator::new(STP_GUARDS))
                    .build(),
            )
            .attribute(
                optional("link_negotiation", AttributeType::String, "Link speed negotiation")
                    .build(),
            )
            .attribute(
                optional("access_policy_type", AttributeType::String, "Access policy type")
                    .build(),
            )
            .attribute(
                optional("udld", AttributeType::String, "UDLD action: Alert only or Enforce")
                    .validator(StringOneOfValidator::new(UDLD_MODES))
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

        let port_type = attr::<String>(&request.config, "type");
        let voice_vlan = attr::<i64>(&request.config, "voice_vlan");
        if let (Ok(Value::Known(port_type)), Ok(Value::Known(_))) = (port_type, voice_vlan) {
            if port_type == "trunk" {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid voice VLAN",
                        "voice_vlan can only be set on access ports",
                    )
                    .with_attribute(AttributePath::new("voice_vlan")),
                );
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        CreateResourceResponse::from_result(self.put_port(&request.planned_state).await)
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_port(&request.current_state).await;
        ReadResourceResponse::from_result(result, request)
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self.put_port(&request.planned_state).await;
        UpdateResourceResponse::from_result(result, request.prior_state)
    }

    async fn delete(&self, _ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl SwitchPortResource {
    async fn put_port(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            SwitchPortModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let (serial, port_id) = model.keys()?;
        let (serial, port_id) = (serial.to_string(), port_id.to_string());

        let port = data
            .client
            .switch()
            .update_port(&serial, &port_id, &model.update_request())
            .await
            .map_err(|e| api_error("Failed to update switch port", &e))?;

        tracing::info!(%serial, %port_id, "updated switch port");
        model.apply(port);
        Ok(model.to_value())
    }

    async fn read_port(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            SwitchPortModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let (serial, port_id) = model.keys()?;
        let (serial, port_id) = (serial.to_string(), port_id.to_string());

        match data.client.switch().get_port(&serial, &port_id).await {
            Ok(port) => {
                model.apply(port);
                Ok(Some(model.to_value()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(api_error("Failed to read switch port", &e)),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for SwitchPortResource {
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
impl ResourceWithImportState for SwitchPortResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        import_state_composite_id(&ctx, &["serial", "port_id"], &request, &mut response);
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

    const PORT_JSON: &str = r#"{
        "portId": "1",
        "name": "Uplink",
        "tags": [],
        "enabled": true,
        "poeEnabled": false,
        "type": "trunk",
        "vlan": 1,
        "voiceVlan": null,
        "allowedVlans": "1,3,5-10",
        "isolationEnabled": false,
        "rstpEnabled": true,
        "stpGuard": "disabled",
        "linkNegotiation": "Auto negotiate",
        "accessPolicyType": "Open",
        "udld": "Alert only"
    }"#;

    async fn configured(server: &Server) -> SwitchPortResource {
        let mut resource = SwitchPortResource::new();
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
    async fn create_sends_only_configured_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/devices/Q234-ABCD-5678/switch/ports/1")
            .match_body(Matcher::Json(json!({
                "name": "Uplink",
                "type": "trunk",
                "allowedVlans": "1,3,5-10"
            })))
            .with_body(PORT_JSON)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let mut builder = ObjectBuilder::new()
            .set("serial", "Q234-ABCD-5678")
            .set("port_id", "1")
            .set("name", "Uplink")
            .set("type", "trunk")
            .set("allowed_vlans", "1,3,5-10");
        for computed in [
            "tags",
            "enabled",
            "poe_enabled",
            "vlan",
            "voice_vlan",
            "isolation_enabled",
            "rstp_enabled",
            "stp_guard",
            "link_negotiation",
            "access_policy_type",
            "udld",
        ] {
            builder = builder.set(computed, Dynamic::Unknown);
        }
        let planned: DynamicValue = builder.into();

        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "meraki_device_switch_port".into(),
                    config: planned.clone(),
                    planned_state: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = &response.new_state;
        assert_eq!(state.get_i64(&AttributePath::new("vlan")).unwrap(), 1);
        assert!(state.get::<i64>(&AttributePath::new("voice_vlan")).unwrap().is_null());
        assert_eq!(
            state.get_string(&AttributePath::new("udld")).unwrap(),
            "Alert only"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn import_splits_serial_and_port() {
        let resource = SwitchPortResource::new();
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "meraki_device_switch_port".into(),
                    id: "Q234-ABCD-5678/1".into(),
                    client_capabilities: Default::default(),
                },
            )
            .await;
        let state = &response.imported_resources[0].state;
        assert_eq!(state.get_string(&AttributePath::new("serial")).unwrap(), "Q234-ABCD-5678");
        assert_eq!(state.get_string(&AttributePath::new("port_id")).unwrap(), "1");
    }

    #[tokio::test]
    async fn voice_vlan_rejected_on_trunks() {
        let resource = SwitchPortResource::new();
        let response = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "meraki_device_switch_port".into(),
                    config: ObjectBuilder::new()
                        .set("type", "trunk")
                        .set("voice_vlan", 20i64)
                        .into(),
                    client_capabilities: Default::default(),
                },
            )
            .await;
        assert_eq!(response.diagnostics.len(), 1);
    }
}
