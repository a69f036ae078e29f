//! Network resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
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
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::ListLengthValidator;
use tfplug::value::{ObjectBuilder, Value};

use super::common::{
    api_error, attr, configure, invalid_value, list_like_prior, provider_data, required,
    string_like_prior,
};
use crate::api::networks::{CreateNetworkRequest, Network, UpdateNetworkRequest};
use crate::MerakiProviderData;

pub const PRODUCT_TYPES: &[&str] = &[
    "appliance",
    "camera",
    "cellularGateway",
    "sensor",
    "switch",
    "systemsManager",
    "wireless",
];

#[derive(Default)]
pub struct NetworkResource {
    provider_data: Option<MerakiProviderData>,
}

impl NetworkResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct NetworkModel {
    id: Value<String>,
    organization_id: Value<String>,
    name: Value<String>,
    product_types: Value<Vec<String>>,
    time_zone: Value<String>,
    tags: Value<Vec<String>>,
    notes: Value<String>,
    url: Value<String>,
    is_bound_to_config_template: Value<bool>,
}

impl NetworkModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            id: attr(value, "id")?,
            organization_id: attr(value, "organization_id")?,
            name: attr(value, "name")?,
            product_types: attr(value, "product_types")?,
            time_zone: attr(value, "time_zone")?,
            tags: attr(value, "tags")?,
            notes: attr(value, "notes")?,
            url: attr(value, "url")?,
            is_bound_to_config_template: attr(value, "is_bound_to_config_template")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("id", self.id.clone())
            .set("organization_id", self.organization_id.clone())
            .set("name", self.name.clone())
            .set("product_types", self.product_types.clone())
            .set("time_zone", self.time_zone.clone())
            .set("tags", self.tags.clone())
            .set("notes", self.notes.clone())
            .set("url", self.url.clone())
            .set(
                "is_bound_to_config_template",
                self.is_bound_to_config_template.clone(),
            )
            .into()
    }

    /// Copies the API view of the network over this model
    fn apply(&mut self, network: Network) {
        self.id = Value::Known(network.id);
        self.organization_id = Value::Known(network.organization_id);
        self.name = Value::Known(network.name);
        self.product_types = Value::Known(network.product_types);
        self.time_zone = network.time_zone.into();
        self.tags = list_like_prior(&self.tags, network.tags);
        self.notes = string_like_prior(&self.notes, network.notes);
        self.url = network.url.into();
        self.is_bound_to_config_template =
            Value::Known(network.is_bound_to_config_template.unwrap_or(false));
    }

    fn update_request(&self) -> UpdateNetworkRequest {
        UpdateNetworkRequest {
            name: self.name.cloned_option(),
            time_zone: self.time_zone.cloned_option(),
            // Null clears
            tags: Some(self.tags.cloned_option().unwrap_or_default()),
            notes: Some(self.notes.cloned_option().unwrap_or_default()),
        }
    }
}

#[async_trait]
impl Resource for NetworkResource {
    fn type_name(&self) -> &str {
        "meraki_network"
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
            .description("Manages a Meraki network")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Network ID")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_id", AttributeType::String)
                    .description("Organization the network belongs to")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Network name")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("product_types", AttributeType::set_of(AttributeType::String))
                    .description("Product types of the network (appliance, switch, wireless, ...)")
                    .required()
                    .validator(ListLengthValidator {
                        min: Some(1),
                        max: None,
                    })
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("time_zone", AttributeType::String)
                    .description("Timezone of the network, e.g. America/Los_Angeles")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tags", AttributeType::set_of(AttributeType::String))
                    .description("Network tags")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("notes", AttributeType::String)
                    .description("Notes for the network")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("url", AttributeType::String)
                    .description("Dashboard URL of the network")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("is_bound_to_config_template", AttributeType::Bool)
                    .description("Whether the network is bound to a configuration template")
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
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        if let Ok(Value::Known(types)) =
            attr::<Vec<String>>(&request.config, "product_types")
        {
            for product_type in types {
                if !PRODUCT_TYPES.contains(&product_type.as_str()) {
                    diagnostics.push(
                        Diagnostic::error(
                            "Invalid product type",
                            format!(
                                "'{}' is not one of: {}",
                                product_type,
                                PRODUCT_TYPES.join(", ")
                            ),
                        )
                        .with_attribute(AttributePath::new("product_types")),
                    );
                }
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        CreateResourceResponse::from_result(self.create_network(&request.planned_state).await)
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_network(&request.current_state).await;
        ReadResourceResponse::from_result(result, request)
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_network(&request.prior_state, &request.planned_state)
            .await;
        UpdateResourceResponse::from_result(result, request.prior_state)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse::from_result(self.delete_network(&ctx, &request.prior_state).await)
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl NetworkResource {
    async fn create_network(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            NetworkModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let organization_id = required(&model.organization_id, "organization_id")?.to_string();

        let request = CreateNetworkRequest {
            name: required(&model.name, "name")?.to_string(),
            product_types: model.product_types.cloned_option().unwrap_or_default(),
            time_zone: model.time_zone.cloned_option(),
            tags: model.tags.cloned_option(),
            notes: model.notes.cloned_option(),
        };

        let network = data
            .client
            .networks()
            .create(&organization_id, &request)
            .await
            .map_err(|e| api_error("Failed to create network", &e))?;

        tracing::info!(network_id = %network.id, "created network");
        model.apply(network);
        Ok(model.to_value())
    }

    async fn read_network(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model = NetworkModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let network_id = required(&model.id, "id")?.to_string();

        match data.client.networks().get(&network_id).await {
            Ok(network) => {
                model.apply(network);
                Ok(Some(model.to_value()))
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(%network_id, "network no longer exists, removing from state");
                Ok(None)
            }
            Err(e) => Err(api_error("Failed to read network", &e)),
        }
    }

    async fn update_network(
        &self,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let prior = NetworkModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let mut model =
            NetworkModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let network_id = required(&prior.id, "id")?.to_string();

        let network = data
            .client
            .networks()
            .update(&network_id, &model.update_request())
            .await
            .map_err(|e| api_error("Failed to update network", &e))?;

        model.apply(network);
        Ok(model.to_value())
    }

    async fn delete_network(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let model = NetworkModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let network_id = required(&model.id, "id")?;

        data.client
            .networks()
            .delete_with_retry(ctx, network_id, data.network_delete_retry_interval)
            .await
            .map_err(|e| api_error("Failed to delete network", &e))
    }
}

#[async_trait]
impl ResourceWithConfigure for NetworkResource {
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
impl ResourceWithImportState for NetworkResource {
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
