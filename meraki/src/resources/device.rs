//! Device attributes resource
//!
//! Devices are claimed into networks elsewhere; this resource only edits
//! the attributes of an existing device. Deleting it forgets the device.

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
use tfplug::validator::NumberRangeValidator;
use tfplug::value::{ObjectBuilder, Value};

use super::common::{
    api_error, attr, configure, invalid_value, list_like_prior, provider_data, required,
    string_like_prior,
};
use crate::api::devices::{Device, UpdateDeviceRequest};
use crate::MerakiProviderData;

#[derive(Default)]
pub struct DeviceResource {
    provider_data: Option<MerakiProviderData>,
}

impl DeviceResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
struct DeviceModel {
    serial: Value<String>,
    name: Value<String>,
    tags: Value<Vec<String>>,
    lat: Value<f64>,
    lng: Value<f64>,
    address: Value<String>,
    notes: Value<String>,
    move_map_marker: Value<bool>,
    mac: Value<String>,
    model: Value<String>,
    network_id: Value<String>,
    firmware: Value<String>,
    lan_ip: Value<String>,
    url: Value<String>,
    product_type: Value<String>,
}

impl DeviceModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            serial: attr(value, "serial")?,
            name: attr(value, "name")?,
            tags: attr(value, "tags")?,
            lat: attr(value, "lat")?,
            lng: attr(value, "lng")?,
            address: attr(value, "address")?,
            notes: attr(value, "notes")?,
            move_map_marker: attr(value, "move_map_marker")?,
            mac: attr(value, "mac")?,
            model: attr(value, "model")?,
            network_id: attr(value, "network_id")?,
            firmware: attr(value, "firmware")?,
            lan_ip: attr(value, "lan_ip")?,
            url: attr(value, "url")?,
            product_type: attr(value, "product_type")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("serial", self.serial.clone())
            .set("name", self.name.clone())
            .set("tags", self.tags.clone())
            .set("lat", self.lat.clone())
            .set("lng", self.lng.clone())
            .set("address", self.address.clone())
            .set("notes", self.notes.clone())
            .set("move_map_marker", self.move_map_marker.clone())
            .set("mac", self.mac.clone())
            .set("model", self.model.clone())
            .set("network_id", self.network_id.clone())
            .set("firmware", self.firmware.clone())
            .set("lan_ip", self.lan_ip.clone())
            .set("url", self.url.clone())
            .set("product_type", self.product_type.clone())
            .into()
    }

    fn update_request(&self) -> UpdateDeviceRequest {
        UpdateDeviceRequest {
            name: self.name.cloned_option(),
            tags: Some(self.tags.cloned_option().unwrap_or_default()),
            lat: self.lat.cloned_option(),
            lng: self.lng.cloned_option(),
            address: self.address.cloned_option(),
            notes: Some(self.notes.cloned_option().unwrap_or_default()),
            move_map_marker: self.move_map_marker.cloned_option(),
        }
    }

    fn apply(&mut self, device: Device) {
        self.serial = Value::Known(device.serial);
        self.name = string_like_prior(&self.name, device.name);
        self.tags = list_like_prior(&self.tags, device.tags);
        self.lat = device.lat.into();
        self.lng = device.lng.into();
        self.address = device.address.into();
        self.notes = string_like_prior(&self.notes, device.notes);
        // Write-only; the API never echoes it
        if self.move_map_marker.is_unknown() {
            self.move_map_marker = Value::Null;
        }
        self.mac = device.mac.into();
        self.model = device.model.into();
        self.network_id = device.network_id.into();
        self.firmware = device.firmware.into();
        self.lan_ip = device.lan_ip.into();
        self.url = device.url.into();
        self.product_type = device.product_type.into();
    }
}

fn computed_string(name: &str, description: &str) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .computed()
        .plan_modifier(UseStateForUnknown)
        .build()
}

#[async_trait]
impl Resource for DeviceResource {
    fn type_name(&self) -> &str {
        "meraki_device"
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
            .description("Manages the attributes of a device")
            .attribute(
                AttributeBuilder::new("serial", AttributeType::String)
                    .description("Device serial")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Device name")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tags", AttributeType::set_of(AttributeType::String))
                    .description("Device tags")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("lat", AttributeType::Number)
                    .description("Latitude of the device")
                    .optional()
                    .computed()
                    .validator(NumberRangeValidator::between(-90.0, 90.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("lng", AttributeType::Number)
                    .description("Longitude of the device")
                    .optional()
                    .computed()
                    .validator(NumberRangeValidator::between(-180.0, 180.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("address", AttributeType::String)
                    .description("Physical address of the device")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("notes", AttributeType::String)
                    .description("Notes for the device")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("move_map_marker", AttributeType::Bool)
                    .description("Move the map marker to the address when it changes")
                    .optional()
                    .build(),
            )
            .attribute(computed_string("mac", "MAC address"))
            .attribute(computed_string("model", "Device model"))
            .attribute(
                AttributeBuilder::new("network_id", AttributeType::String)
                    .description("Network the device belongs to")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("firmware", AttributeType::String)
                    .description("Firmware version")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("lan_ip", AttributeType::String)
                    .description("LAN IP address")
                    .computed()
                    .build(),
            )
            .attribute(computed_string("url", "Dashboard URL of the device"))
            .attribute(computed_string("product_type", "Product type of the device"))
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
        CreateResourceResponse::from_result(self.update_device(&request.planned_state).await)
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_device(&request.current_state).await;
        ReadResourceResponse::from_result(result, request)
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self.update_device(&request.planned_state).await;
        UpdateResourceResponse::from_result(result, request.prior_state)
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        if let Ok(Value::Known(serial)) = attr::<String>(&request.prior_state, "serial") {
            tracing::debug!(%serial, "removing device from state; the device is unchanged");
        }
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl DeviceResource {
    async fn update_device(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            DeviceModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let serial = required(&model.serial, "serial")?.to_string();

        let device = data
            .client
            .devices()
            .update(&serial, &model.update_request())
            .await
            .map_err(|e| api_error("Failed to update device", &e))?;

        model.apply(device);
        Ok(model.to_value())
    }

    async fn read_device(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model = DeviceModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let serial = required(&model.serial, "serial")?.to_string();

        match data.client.devices().get(&serial).await {
            Ok(device) => {
                model.apply(device);
                Ok(Some(model.to_value()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(api_error("Failed to read device", &e)),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for DeviceResource {
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
impl ResourceWithImportState for DeviceResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        import_state_passthrough_id(&ctx, AttributePath::new("serial"), &request, &mut response);
        response
    }
}
