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
use tfplug::value::{ObjectBuilder, Value};

use super::common::{api_error, attr, configure, invalid_value, provider_data, required};
use crate::api::appliance::VlansSettings;
use crate::MerakiProviderData;

/// Toggles VLAN mode on a network's appliance.
///
/// Deleting only forgets the setting; turning VLANs off would drop every
/// VLAN the network still has.
#[derive(Default)]
pub struct ApplianceVlansSettingsResource {
    provider_data: Option<MerakiProviderData>,
}

impl ApplianceVlansSettingsResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
struct VlansSettingsModel {
    network_id: Value<String>,
    vlans_enabled: Value<bool>,
}

impl VlansSettingsModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            network_id: attr(value, "network_id")?,
            vlans_enabled: attr(value, "vlans_enabled")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("network_id", self.network_id.clone())
            .set("vlans_enabled", self.vlans_enabled.clone())
            .into()
    }
}

#[async_trait]
impl Resource for ApplianceVlansSettingsResource {
    fn type_name(&self) -> &str {
        "meraki_network_appliance_vlans_settings"
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
            .description("Enables or disables VLANs on a network's security appliance")
            .attribute(
                AttributeBuilder::new("network_id", AttributeType::String)
                    .description("Network ID")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vlans_enabled", AttributeType::Bool)
                    .description("Whether VLANs are enabled")
                    .required()
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

    async fn delete(&self, _ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl ApplianceVlansSettingsResource {
    async fn put_settings(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model = VlansSettingsModel::from_value(planned)
            .map_err(|e| invalid_value("planned state", e))?;
        let network_id = required(&model.network_id, "network_id")?.to_string();
        let settings = VlansSettings {
            vlans_enabled: model.vlans_enabled.cloned_option().unwrap_or(false),
        };

        let settings = data
            .client
            .appliance()
            .update_vlans_settings(&network_id, &settings)
            .await
            .map_err(|e| api_error("Failed to update VLAN settings", &e))?;

        model.vlans_enabled = Value::Known(settings.vlans_enabled);
        Ok(model.to_value())
    }

    async fn read_settings(
        &self,
        current: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            VlansSettingsModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let network_id = required(&model.network_id, "network_id")?.to_string();

        match data.client.appliance().get_vlans_settings(&network_id).await {
            Ok(settings) => {
                model.vlans_enabled = Value::Known(settings.vlans_enabled);
                Ok(Some(model.to_value()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(api_error("Failed to read VLAN settings", &e)),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for ApplianceVlansSettingsResource {
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
impl ResourceWithImportState for ApplianceVlansSettingsResource {
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
