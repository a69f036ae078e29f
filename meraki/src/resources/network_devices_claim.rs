//! Claims devices into a network
//!
//! The resource owns only the serials it lists; other devices in the network
//! are left alone except after an import, where every device is adopted.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::RequiresReplace;
use tfplug::resource::{
    ApplyFailure, ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
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
use crate::MerakiProviderData;

#[derive(Default)]
pub struct NetworkDevicesClaimResource {
    provider_data: Option<MerakiProviderData>,
}

impl NetworkDevicesClaimResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
struct ClaimModel {
    network_id: Value<String>,
    serials: Value<Vec<String>>,
}

impl ClaimModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            network_id: attr(value, "network_id")?,
            serials: attr(value, "serials")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("network_id", self.network_id.clone())
            .set("serials", self.serials.clone())
            .into()
    }

    fn serials(&self) -> Vec<String> {
        self.serials.cloned_option().unwrap_or_default()
    }
}

#[async_trait]
impl Resource for NetworkDevicesClaimResource {
    fn type_name(&self) -> &str {
        "meraki_network_devices_claim"
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
            .description("Claims devices into a network by serial")
            .attribute(
                AttributeBuilder::new("network_id", AttributeType::String)
                    .description("Network ID")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("serials", AttributeType::set_of(AttributeType::String))
                    .description("Serials of the devices to claim")
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
        CreateResourceResponse::from_result(self.claim(&request.planned_state).await)
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_claimed(&request.current_state).await;
        ReadResourceResponse::from_result(result, request)
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_claimed(&request.prior_state, &request.planned_state)
            .await;
        UpdateResourceResponse::from_result(result, request.prior_state)
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse::from_result(self.release(&request.prior_state).await)
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl NetworkDevicesClaimResource {
    async fn claim(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let model = ClaimModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let network_id = required(&model.network_id, "network_id")?;
        let serials = model.serials();

        data.client
            .devices()
            .claim(network_id, &serials)
            .await
            .map_err(|e| api_error("Failed to claim devices", &e))?;

        tracing::info!(network_id, count = serials.len(), "claimed devices");
        Ok(model.to_value())
    }

    async fn read_claimed(
        &self,
        current: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model = ClaimModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let network_id = required(&model.network_id, "network_id")?.to_string();

        let devices = match data.client.devices().list_network(&network_id).await {
            Ok(devices) => devices,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(api_error("Failed to list network devices", &e)),
        };
        let present: Vec<String> = devices.into_iter().map(|d| d.serial).collect();

        model.serials = match model.serials {
            Value::Known(serials) => Value::Known(
                serials
                    .into_iter()
                    .filter(|serial| present.contains(serial))
                    .collect(),
            ),
            // Imported: adopt everything in the network
            _ => Value::Known(present),
        };
        Ok(Some(model.to_value()))
    }

    async fn update_claimed(
        &self,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, ApplyFailure> {
        let data = provider_data(&self.provider_data)?;
        let prior = ClaimModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let mut model =
            ClaimModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let network_id = required(&model.network_id, "network_id")?;

        let before = prior.serials();
        let after = model.serials();
        let added: Vec<String> = after
            .iter()
            .filter(|serial| !before.contains(serial))
            .cloned()
            .collect();

        data.client
            .devices()
            .claim(network_id, &added)
            .await
            .map_err(|e| api_error("Failed to claim devices", &e))?;

        let dropped: Vec<&String> = before.iter().filter(|serial| !after.contains(serial)).collect();
        for (i, serial) in dropped.iter().enumerate() {
            if let Err(diagnostic) = self.remove(data, network_id, serial).await {
                // New claims went through; serials not yet removed stay owned
                let mut reached = after.clone();
                reached.extend(dropped[i..].iter().map(|serial| serial.to_string()));
                model.serials = Value::Known(reached);
                return Err(ApplyFailure::partial(diagnostic, model.to_value()));
            }
        }

        Ok(model.to_value())
    }

    async fn release(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let model = ClaimModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let network_id = required(&model.network_id, "network_id")?;

        for serial in model.serials() {
            self.remove(data, network_id, &serial).await?;
        }
        Ok(())
    }

    async fn remove(
        &self,
        data: &MerakiProviderData,
        network_id: &str,
        serial: &str,
    ) -> Result<(), Diagnostic> {
        match data.client.devices().remove(network_id, serial).await {
            Ok(()) => {
                tracing::info!(network_id, serial, "removed device from network");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(api_error(format!("Failed to remove device {}", serial), &e)),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for NetworkDevicesClaimResource {
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
impl ResourceWithImportState for NetworkDevicesClaimResource {
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

    const DEVICES_JSON: &str = r#"[
        {"serial":"Q2AA-AAAA-AAAA","networkId":"N_1"},
        {"serial":"Q2BB-BBBB-BBBB","networkId":"N_1"}
    ]"#;

    async fn configured(server: &Server) -> NetworkDevicesClaimResource {
        let mut resource = NetworkDevicesClaimResource::new();
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

    fn claim_state(serials: Option<Vec<&str>>) -> DynamicValue {
        ObjectBuilder::new()
            .set("network_id", "N_1")
            .set("serials", serials)
            .into()
    }

    fn read_request(current_state: DynamicValue) -> ReadResourceRequest {
        ReadResourceRequest {
            type_name: "meraki_network_devices_claim".into(),
            current_state,
            private: vec![],
            provider_meta: None,
            client_capabilities: Default::default(),
        }
    }

    #[tokio::test]
    async fn read_drops_serials_no_longer_in_network() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/networks/N_1/devices")
            .with_body(DEVICES_JSON)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource
            .read(
                Context::new(),
                read_request(claim_state(Some(vec!["Q2AA-AAAA-AAAA", "Q2CC-CCCC-CCCC"]))),
            )
            .await;

        let state = response.new_state.unwrap();
        assert_eq!(
            state.get::<Vec<String>>(&AttributePath::new("serials")).unwrap(),
            Value::Known(vec!["Q2AA-AAAA-AAAA".to_string()])
        );
    }

    #[tokio::test]
    async fn read_after_import_adopts_all_devices() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/networks/N_1/devices")
            .with_body(DEVICES_JSON)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource.read(Context::new(), read_request(claim_state(None))).await;

        let state = response.new_state.unwrap();
        assert_eq!(
            state.get::<Vec<String>>(&AttributePath::new("serials")).unwrap(),
            Value::Known(vec![
                "Q2AA-AAAA-AAAA".to_string(),
                "Q2BB-BBBB-BBBB".to_string()
            ])
        );
    }

    #[tokio::test]
    async fn update_claims_added_and_removes_dropped() {
        let mut server = Server::new_async().await;
        let claim = server
            .mock("POST", "/networks/N_1/devices/claim")
            .match_body(Matcher::Json(json!({"serials": ["Q2CC-CCCC-CCCC"]})))
            .with_body("{}")
            .create_async()
            .await;
        let remove = server
            .mock("POST", "/networks/N_1/devices/remove")
            .match_body(Matcher::Json(json!({"serial": "Q2AA-AAAA-AAAA"})))
            .with_status(204)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let planned = claim_state(Some(vec!["Q2BB-BBBB-BBBB", "Q2CC-CCCC-CCCC"]));
        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "meraki_network_devices_claim".into(),
                    prior_state: claim_state(Some(vec!["Q2AA-AAAA-AAAA", "Q2BB-BBBB-BBBB"])),
                    planned_state: planned.clone(),
                    config: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        claim.assert_async().await;
        remove.assert_async().await;
    }

    #[tokio::test]
    async fn failed_remove_keeps_new_claims_in_state() {
        let mut server = Server::new_async().await;
        let claim = server
            .mock("POST", "/networks/N_1/devices/claim")
            .match_body(Matcher::Json(json!({"serials": ["Q2CC-CCCC-CCCC"]})))
            .with_body("{}")
            .create_async()
            .await;
        let remove = server
            .mock("POST", "/networks/N_1/devices/remove")
            .match_body(Matcher::Json(json!({"serial": "Q2AA-AAAA-AAAA"})))
            .with_status(500)
            .with_body(r#"{"errors":["Device is busy"]}"#)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let prior = claim_state(Some(vec!["Q2AA-AAAA-AAAA", "Q2BB-BBBB-BBBB"]));
        let planned = claim_state(Some(vec!["Q2BB-BBBB-BBBB", "Q2CC-CCCC-CCCC"]));
        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "meraki_network_devices_claim".into(),
                    prior_state: prior,
                    planned_state: planned.clone(),
                    config: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].summary,
            "Failed to remove device Q2AA-AAAA-AAAA"
        );
        assert_eq!(
            response
                .new_state
                .get::<Vec<String>>(&AttributePath::new("serials"))
                .unwrap(),
            Value::Known(vec![
                "Q2BB-BBBB-BBBB".to_string(),
                "Q2CC-CCCC-CCCC".to_string(),
                "Q2AA-AAAA-AAAA".to_string()
            ])
        );
        claim.assert_async().await;
        remove.assert_async().await;
    }

    #[tokio::test]
    async fn failed_claim_keeps_prior_state() {
        let mut server = Server::new_async().await;
        let _claim = server
            .mock("POST", "/networks/N_1/devices/claim")
            .with_status(400)
            .with_body(r#"{"errors":["Device already claimed"]}"#)
            .create_async()
            .await;
        let remove = server
            .mock("POST", "/networks/N_1/devices/remove")
            .expect(0)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let prior = claim_state(Some(vec!["Q2AA-AAAA-AAAA"]));
        let planned = claim_state(Some(vec!["Q2CC-CCCC-CCCC"]));
        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "meraki_network_devices_claim".into(),
                    prior_state: prior.clone(),
                    planned_state: planned.clone(),
                    config: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.new_state, prior);
        remove.assert_async().await;
    }

    #[tokio::test]
    async fn delete_removes_every_claimed_device() {
        let mut server = Server::new_async().await;
        let remove = server
            .mock("POST", "/networks/N_1/devices/remove")
            .with_status(204)
            .expect(2)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "meraki_network_devices_claim".into(),
                    prior_state: claim_state(Some(vec!["Q2AA-AAAA-AAAA", "Q2BB-BBBB-BBBB"])),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        remove.assert_async().await;
    }
}
