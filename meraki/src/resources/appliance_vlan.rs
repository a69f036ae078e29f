//! Appliance VLAN resource implementation
//!
//! The create endpoint only accepts the addressing fields; DHCP settings,
//! reservations and fixed assignments are applied with a follow-up PUT.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tfplug::context::Context;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ApplyFailure, ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource,
    ReadResourceRequest, ReadResourceResponse, Resource, ResourceMetadataRequest,
    ResourceMetadataResponse, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedTypeBuilder, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{NumberRangeValidator, StringOneOfValidator};
use tfplug::value::{FromDynamic, IntoDynamic, ObjectBuilder, ObjectReader, Value};

use super::common::{
    api_error, attr, configure, invalid_value, list_like_prior, provider_data, required,
    split_import_id, string_like_prior,
};
use crate::api::appliance::{
    CreateVlanRequest, FixedIpAssignment, ReservedIpRange, UpdateVlanRequest, Vlan,
};
use crate::MerakiProviderData;

const DHCP_HANDLING: &[&str] = &[
    "Run a DHCP server",
    "Relay DHCP to another server",
    "Do not respond to DHCP requests",
];

const DHCP_LEASE_TIMES: &[&str] = &[
    "30 minutes",
    "1 hour",
    "4 hours",
    "12 hours",
    "1 day",
    "1 week",
];

#[derive(Default)]
pub struct ApplianceVlanResource {
    provider_data: Option<MerakiProviderData>,
}

impl ApplianceVlanResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FixedIp {
    ip: Value<String>,
    name: Value<String>,
}

impl FromDynamic for FixedIp {
    fn from_dynamic(value: &Dynamic) -> tfplug::Result<Self> {
        let obj = ObjectReader::new(value)?;
        Ok(Self {
            ip: obj.get("ip")?,
            name: obj.get("name")?,
        })
    }
}

impl IntoDynamic for FixedIp {
    fn into_dynamic(self) -> Dynamic {
        ObjectBuilder::new()
            .set("ip", self.ip)
            .set("name", self.name)
            .build()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ReservedRange {
    start: Value<String>,
    end: Value<String>,
    comment: Value<String>,
}

impl FromDynamic for ReservedRange {
    fn from_dynamic(value: &Dynamic) -> tfplug::Result<Self> {
        let obj = ObjectReader::new(value)?;
        Ok(Self {
            start: obj.get("start")?,
            end: obj.get("end")?,
            comment: obj.get("comment")?,
        })
    }
}

impl IntoDynamic for ReservedRange {
    fn into_dynamic(self) -> Dynamic {
        ObjectBuilder::new()
            .set("start", self.start)
            .set("end", self.end)
            .set("comment", self.comment)
            .build()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct VlanModel {
    id: Value<String>,
    network_id: Value<String>,
    vlan_id: Value<i64>,
    name: Value<String>,
    subnet: Value<String>,
    appliance_ip: Value<String>,
    group_policy_id: Value<String>,
    fixed_ip_assignments: Value<BTreeMap<String, FixedIp>>,
    reserved_ip_ranges: Value<Vec<ReservedRange>>,
    dns_nameservers: Value<Vec<String>>,
    dhcp_handling: Value<String>,
    dhcp_lease_time: Value<String>,
    dhcp_boot_options_enabled: Value<bool>,
    interface_id: Value<String>,
}

impl VlanModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            id: attr(value, "id")?,
            network_id: attr(value, "network_id")?,
            vlan_id: attr(value, "vlan_id")?,
            name: attr(value, "name")?,
            subnet: attr(value, "subnet")?,
            appliance_ip: attr(value, "appliance_ip")?,
            group_policy_id: attr(value, "group_policy_id")?,
            fixed_ip_assignments: attr(value, "fixed_ip_assignments")?,
            reserved_ip_ranges: attr(value, "reserved_ip_ranges")?,
            dns_nameservers: attr(value, "dns_nameservers")?,
            dhcp_handling: attr(value, "dhcp_handling")?,
            dhcp_lease_time: attr(value, "dhcp_lease_time")?,
            dhcp_boot_options_enabled: attr(value, "dhcp_boot_options_enabled")?,
            interface_id: attr(value, "interface_id")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("id", self.id.clone())
            .set("network_id", self.network_id.clone())
            .set("vlan_id", self.vlan_id.clone())
            .set("name", self.name.clone())
            .set("subnet", self.subnet.clone())
            .set("appliance_ip", self.appliance_ip.clone())
            .set("group_policy_id", self.group_policy_id.clone())
            .set("fixed_ip_assignments", self.fixed_ip_assignments.clone())
            .set("reserved_ip_ranges", self.reserved_ip_ranges.clone())
            .set("dns_nameservers", self.dns_nameservers.clone())
            .set("dhcp_handling", self.dhcp_handling.clone())
            .set("dhcp_lease_time", self.dhcp_lease_time.clone())
            .set("dhcp_boot_options_enabled", self.dhcp_boot_options_enabled.clone())
            .set("interface_id", self.interface_id.clone())
            .into()
    }

    fn keys(&self) -> Result<(String, String), Diagnostic> {
        let network_id = required(&self.network_id, "network_id")?.to_string();
        let vlan_id = match self.vlan_id {
            Value::Known(id) => id.to_string(),
            _ => {
                return Err(Diagnostic::error(
                    "Missing vlan_id",
                    "The 'vlan_id' attribute must be known",
                ))
            }
        };
        Ok((network_id, vlan_id))
    }

    fn create_request(&self, vlan_id: String) -> CreateVlanRequest {
        CreateVlanRequest {
            id: vlan_id,
            name: self.name.cloned_option().unwrap_or_default(),
            subnet: self.subnet.cloned_option(),
            appliance_ip: self.appliance_ip.cloned_option(),
            group_policy_id: self.group_policy_id.cloned_option(),
        }
    }

    /// Full update; unset collections are sent empty so they get cleared.
    /// A group policy dropped from the configuration is sent as null.
    fn update_request(&self, prior: &VlanModel) -> UpdateVlanRequest {
        let group_policy_id = match (&self.group_policy_id, &prior.group_policy_id) {
            (Value::Known(id), _) => Some(Some(id.clone())),
            (Value::Null, Value::Known(_)) => Some(None),
            _ => None,
        };
        UpdateVlanRequest {
            name: self.name.cloned_option(),
            subnet: self.subnet.cloned_option(),
            appliance_ip: self.appliance_ip.cloned_option(),
            group_policy_id,
            fixed_ip_assignments: Some(
                self.fixed_ip_assignments
                    .as_option()
                    .map(|assignments| {
                        assignments
                            .iter()
                            .map(|(mac, fixed)| {
                                (
                                    mac.clone(),
                                    FixedIpAssignment {
                                        ip: fixed.ip.cloned_option().unwrap_or_default(),
                                        name: fixed.name.cloned_option(),
                                    },
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            reserved_ip_ranges: Some(
                self.reserved_ip_ranges
                    .as_option()
                    .map(|ranges| {
                        ranges
                            .iter()
                            .map(|range| ReservedIpRange {
                                start: range.start.cloned_option().unwrap_or_default(),
                                end: range.end.cloned_option().unwrap_or_default(),
                                comment: range.comment.cloned_option(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            dns_nameservers: self
                .dns_nameservers
                .as_option()
                .map(|servers| join_nameservers(servers)),
            dhcp_handling: self.dhcp_handling.cloned_option(),
            dhcp_lease_time: self.dhcp_lease_time.cloned_option(),
            dhcp_boot_options_enabled: self.dhcp_boot_options_enabled.cloned_option(),
        }
    }

    /// Settings the create call cannot carry
    fn create_follow_up(&self) -> UpdateVlanRequest {
        let mut request = self.update_request(&VlanModel::default());
        request.name = None;
        request.subnet = None;
        request.appliance_ip = None;
        request.group_policy_id = None;
        if self.fixed_ip_assignments.is_null() {
            request.fixed_ip_assignments = None;
        }
        if self.reserved_ip_ranges.is_null() {
            request.reserved_ip_ranges = None;
        }
        request
    }

    fn apply(&mut self, network_id: &str, vlan: Vlan) {
        let vlan_id = vlan.id.parse::<i64>().map(Value::Known).unwrap_or(Value::Null);
        self.id = Value::Known(format!("{}/{}", network_id, vlan.id));
        self.network_id = Value::Known(network_id.to_string());
        self.vlan_id = vlan_id.or(self.vlan_id.clone());
        self.name = Value::Known(vlan.name);
        self.subnet = vlan.subnet.into();
        self.appliance_ip = vlan.appliance_ip.into();
        self.group_policy_id = string_like_prior(&self.group_policy_id, vlan.group_policy_id);
        self.interface_id = vlan.interface_id.into();

        let fixed: BTreeMap<String, FixedIp> = vlan
            .fixed_ip_assignments
            .unwrap_or_default()
            .into_iter()
            .map(|(mac, assignment)| {
                let prior_name = self
                    .fixed_ip_assignments
                    .as_option()
                    .and_then(|prior| prior.get(&mac))
                    .map(|prior| prior.name.clone())
                    .unwrap_or_default();
                (
                    mac,
                    FixedIp {
                        ip: Value::Known(assignment.ip),
                        name: string_like_prior(&prior_name, assignment.name),
                    },
                )
            })
            .collect();
        self.fixed_ip_assignments = if fixed.is_empty() && !self.fixed_ip_assignments.is_known() {
            Value::Null
        } else {
            Value::Known(fixed)
        };

        let prior_ranges = self.reserved_ip_ranges.cloned_option().unwrap_or_default();
        let ranges = vlan
            .reserved_ip_ranges
            .into_iter()
            .enumerate()
            .map(|(i, range)| {
                let prior_comment = prior_ranges
                    .get(i)
                    .map(|prior| prior.comment.clone())
                    .unwrap_or_default();
                ReservedRange {
                    start: Value::Known(range.start),
                    end: Value::Known(range.end),
                    comment: string_like_prior(&prior_comment, range.comment),
                }
            })
            .collect();
        self.reserved_ip_ranges = list_like_prior(&self.reserved_ip_ranges, ranges);

        self.dns_nameservers = vlan
            .dns_nameservers
            .map(|servers| split_nameservers(&servers))
            .into();
        self.dhcp_handling = vlan.dhcp_handling.into();
        self.dhcp_lease_time = vlan.dhcp_lease_time.into();
        self.dhcp_boot_options_enabled = vlan.dhcp_boot_options_enabled.into();
    }
}

/// The API takes name servers as one newline separated string
fn join_nameservers(servers: &[String]) -> String {
    servers.join("\n")
}

pub(crate) fn split_nameservers(servers: &str) -> Vec<String> {
    servers
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Resource for ApplianceVlanResource {
    fn type_name(&self) -> &str {
        "meraki_network_appliance_vlan"
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
            .description("Manages a VLAN on a network's security appliance")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Identifier in the form network_id/vlan_id")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("network_id", AttributeType::String)
                    .description("Network ID")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vlan_id", AttributeType::Number)
                    .description("VLAN ID (1-4094)")
                    .required()
                    .validator(NumberRangeValidator::between(1.0, 4094.0))
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("VLAN name")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("subnet", AttributeType::String)
                    .description("Subnet of the VLAN, e.g. 192.168.10.0/24")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("appliance_ip", AttributeType::String)
                    .description("Local IP of the appliance on the VLAN")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("group_policy_id", AttributeType::String)
                    .description("Group policy applied to the VLAN")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "fixed_ip_assignments",
                    NestedTypeBuilder::map()
                        .attribute(
                            AttributeBuilder::new("ip", AttributeType::String)
                                .description("Fixed IP address")
                                .required()
                                .build(),
                        )
                        .attribute(
                            AttributeBuilder::new("name", AttributeType::String)
                                .description("Client name")
                                .optional()
                                .build(),
                        )
                        .build(),
                )
                .description("Fixed DHCP assignments keyed by client MAC address")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "reserved_ip_ranges",
                    NestedTypeBuilder::list()
                        .attribute(
                            AttributeBuilder::new("start", AttributeType::String)
                                .description("First address of the range")
                                .required()
                                .build(),
                        )
                        .attribute(
                            AttributeBuilder::new("end", AttributeType::String)
                                .description("Last address of the range")
                                .required()
                                .build(),
                        )
                        .attribute(
                            AttributeBuilder::new("comment", AttributeType::String)
                                .description("Comment for the range")
                                .optional()
                                .build(),
                        )
                        .build(),
                )
                .description("Address ranges DHCP will not hand out")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("dns_nameservers", AttributeType::list_of(AttributeType::String))
                    .description(
                        "Name servers handed out by DHCP: upstream_dns, google_dns, opendns or addresses",
                    )
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("dhcp_handling", AttributeType::String)
                    .description("How the appliance handles DHCP on this VLAN")
                    .optional()
                    .computed()
                    .validator(StringOneOfValidator::new(DHCP_HANDLING))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("dhcp_lease_time", AttributeType::String)
                    .description("DHCP lease time")
                    .optional()
                    .computed()
                    .validator(StringOneOfValidator::new(DHCP_LEASE_TIMES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("dhcp_boot_options_enabled", AttributeType::Bool)
                    .description("Whether DHCP boot options are enabled")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("interface_id", AttributeType::String)
                    .description("Interface ID of the VLAN")
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
        CreateResourceResponse::from_result(self.create_vlan(&request.planned_state).await)
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_vlan(&request.current_state).await;
        ReadResourceResponse::from_result(result, request)
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_vlan(&request.prior_state, &request.planned_state)
            .await;
        UpdateResourceResponse::from_result(result, request.prior_state)
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse::from_result(self.delete_vlan(&request.prior_state).await)
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl ApplianceVlanResource {
    /// When the follow-up PUT fails the VLAN already exists, so the failure
    /// carries the state returned by the POST
    async fn create_vlan(&self, planned: &DynamicValue) -> Result<DynamicValue, ApplyFailure> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            VlanModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let (network_id, vlan_id) = model.keys()?;
        let appliance = data.client.appliance();

        let created = appliance
            .create_vlan(&network_id, &model.create_request(vlan_id.clone()))
            .await
            .map_err(|e| api_error("Failed to create VLAN", &e))?;
        tracing::info!(%network_id, %vlan_id, "created appliance VLAN");

        let follow_up = model.create_follow_up();
        if !follow_up.has_extended_fields() {
            model.apply(&network_id, created);
            return Ok(model.to_value());
        }

        match appliance.update_vlan(&network_id, &vlan_id, &follow_up).await {
            Ok(vlan) => {
                model.apply(&network_id, vlan);
                Ok(model.to_value())
            }
            Err(e) => {
                tracing::warn!(%network_id, %vlan_id, error = %e, "VLAN created but not configured");
                let diagnostic = api_error("Failed to configure VLAN after creation", &e);
                let mut reached = VlanModel {
                    network_id: model.network_id.clone(),
                    vlan_id: model.vlan_id.clone(),
                    ..VlanModel::default()
                };
                reached.apply(&network_id, created);
                Err(ApplyFailure::partial(diagnostic, reached.to_value()))
            }
        }
    }

    async fn read_vlan(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model = VlanModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let (network_id, vlan_id) = model.keys()?;

        match data.client.appliance().get_vlan(&network_id, &vlan_id).await {
            Ok(vlan) => {
                model.apply(&network_id, vlan);
                Ok(Some(model.to_value()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(api_error("Failed to read VLAN", &e)),
        }
    }

    async fn update_vlan(
        &self,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let prior = VlanModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let mut model =
            VlanModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let (network_id, vlan_id) = model.keys()?;

        let vlan = data
            .client
            .appliance()
            .update_vlan(&network_id, &vlan_id, &model.update_request(&prior))
            .await
            .map_err(|e| api_error("Failed to update VLAN", &e))?;

        let cleared_policy = model.group_policy_id.is_null();
        model.apply(&network_id, vlan);
        // The PUT response may still echo a policy that was just cleared; the
        // next read reports it if the clear did not take
        if cleared_policy {
            model.group_policy_id = Value::Null;
        }
        Ok(model.to_value())
    }

    async fn delete_vlan(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let model = VlanModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let (network_id, vlan_id) = model.keys()?;

        match data.client.appliance().delete_vlan(&network_id, &vlan_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(api_error("Failed to delete VLAN", &e)),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for ApplianceVlanResource {
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
impl ResourceWithImportState for ApplianceVlanResource {
    /// Import ID is "network_id/vlan_id"; vlan_id must be numeric
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();

        let (network_id, vlan_id) = match split_import_id(&request.id, "network_id/vlan_id") {
            Ok(parts) => parts,
            Err(diag) => {
                response.diagnostics.push(diag);
                return response;
            }
        };
        let Ok(vlan_number) = vlan_id.parse::<i64>() else {
            response.diagnostics.push(Diagnostic::error(
                "Invalid import ID",
                format!("vlan_id must be a number, got '{}'", vlan_id),
            ));
            return response;
        };

        response.imported_resources.push(ImportedResource {
            type_name: request.type_name.clone(),
            state: ObjectBuilder::new()
                .set("id", format!("{}/{}", network_id, vlan_number))
                .set("network_id", network_id)
                .set("vlan_id", vlan_number)
                .into(),
            private: vec![],
        });
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::provider_data_for;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tfplug::types::{AttributePath, ClientCapabilities};

    const VLAN_JSON: &str = r#"{
        "id": 10,
        "networkId": "N_1",
        "name": "My VLAN",
        "subnet": "192.168.10.0/24",
        "applianceIp": "192.168.10.1",
        "interfaceId": "1284392014819",
        "fixedIpAssignments": {},
        "reservedIpRanges": [],
        "dnsNameservers": "upstream_dns",
        "dhcpHandling": "Run a DHCP server",
        "dhcpLeaseTime": "1 day",
        "dhcpBootOptionsEnabled": false
    }"#;

    async fn configured(server: &Server) -> ApplianceVlanResource {
        let mut resource = ApplianceVlanResource::new();
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

    fn planned(extra: Vec<(&str, Dynamic)>) -> DynamicValue {
        let mut builder = ObjectBuilder::new()
            .set("id", Dynamic::Unknown)
            .set("network_id", "N_1")
            .set("vlan_id", 10i64)
            .set("name", "My VLAN")
            .set("subnet", "192.168.10.0/24")
            .set("appliance_ip", "192.168.10.1")
            .set("dns_nameservers", Dynamic::Unknown)
            .set("dhcp_handling", Dynamic::Unknown)
            .set("dhcp_lease_time", Dynamic::Unknown)
            .set("dhcp_boot_options_enabled", Dynamic::Unknown)
            .set("interface_id", Dynamic::Unknown);
        for (name, value) in extra {
            builder = builder.set(name, value);
        }
        builder.into()
    }

    fn create_request(planned_state: DynamicValue) -> CreateResourceRequest {
        CreateResourceRequest {
            type_name: "meraki_network_appliance_vlan".into(),
            config: planned_state.clone(),
            planned_state,
            planned_private: vec![],
            provider_meta: None,
        }
    }

    #[tokio::test]
    async fn create_without_extended_settings_is_one_call() {
        let mut server = Server::new_async().await;
        let post = server
            .mock("POST", "/networks/N_1/appliance/vlans")
            .match_body(Matcher::Json(json!({
                "id": "10",
                "name": "My VLAN",
                "subnet": "192.168.10.0/24",
                "applianceIp": "192.168.10.1"
            })))
            .with_status(201)
            .with_body(VLAN_JSON)
            .create_async()
            .await;
        let put = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource.create(Context::new(), create_request(planned(vec![]))).await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = &response.new_state;
        assert_eq!(state.get_i64(&AttributePath::new("vlan_id")).unwrap(), 10);
        assert_eq!(state.get_string(&AttributePath::new("name")).unwrap(), "My VLAN");
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "N_1/10");
        assert_eq!(
            state
                .get::<Vec<String>>(&AttributePath::new("dns_nameservers"))
                .unwrap(),
            Value::Known(vec!["upstream_dns".to_string()])
        );
        assert!(state
            .get::<Vec<Dynamic>>(&AttributePath::new("reserved_ip_ranges"))
            .unwrap()
            .is_null());
        post.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn create_applies_dhcp_settings_with_follow_up_update() {
        let mut server = Server::new_async().await;
        let _post = server
            .mock("POST", "/networks/N_1/appliance/vlans")
            .with_status(201)
            .with_body(VLAN_JSON)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/networks/N_1/appliance/vlans/10")
            .match_body(Matcher::Json(json!({
                "reservedIpRanges": [{"start": "192.168.10.20", "end": "192.168.10.30"}],
                "dnsNameservers": "8.8.8.8\n8.8.4.4"
            })))
            .with_body(
                VLAN_JSON
                    .replace(
                        r#""reservedIpRanges": []"#,
                        r#""reservedIpRanges": [{"start":"192.168.10.20","end":"192.168.10.30","comment":""}]"#,
                    )
                    .replace("upstream_dns", r"8.8.8.8\n8.8.4.4"),
            )
            .create_async()
            .await;

        let resource = configured(&server).await;
        let ranges = Dynamic::List(vec![ObjectBuilder::new()
            .set("start", "192.168.10.20")
            .set("end", "192.168.10.30")
            .set("comment", Dynamic::Null)
            .build()]);
        let servers = vec!["8.8.8.8", "8.8.4.4"].into_dynamic();
        let response = resource
            .create(
                Context::new(),
                create_request(planned(vec![
                    ("reserved_ip_ranges", ranges),
                    ("dns_nameservers", servers),
                ])),
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = &response.new_state;
        assert_eq!(
            state
                .get::<Vec<String>>(&AttributePath::new("dns_nameservers"))
                .unwrap(),
            Value::Known(vec!["8.8.8.8".to_string(), "8.8.4.4".to_string()])
        );
        // An empty comment from the API stays null
        let comment = state
            .lookup(&AttributePath::new("reserved_ip_ranges").index(0).attribute("comment"))
            .unwrap();
        assert_eq!(comment, Some(&Dynamic::Null));
        put.assert_async().await;
    }

    #[tokio::test]
    async fn failed_follow_up_keeps_created_vlan_in_state() {
        let mut server = Server::new_async().await;
        let _post = server
            .mock("POST", "/networks/N_1/appliance/vlans")
            .with_status(201)
            .with_body(VLAN_JSON)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/networks/N_1/appliance/vlans/10")
            .with_status(400)
            .with_body(r#"{"errors":["Invalid DHCP lease time"]}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource
            .create(
                Context::new(),
                create_request(planned(vec![("dhcp_lease_time", "2 weeks".into_dynamic())])),
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].summary,
            "Failed to configure VLAN after creation"
        );
        assert!(response.diagnostics[0].detail.contains("Invalid DHCP lease time"));
        let state = &response.new_state;
        assert!(!state.is_null());
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "N_1/10");
        assert_eq!(state.get_i64(&AttributePath::new("vlan_id")).unwrap(), 10);
        // What the POST returned, not the planned value
        assert_eq!(
            state.get_string(&AttributePath::new("dhcp_lease_time")).unwrap(),
            "1 day"
        );
        put.assert_async().await;
        delete.assert_async().await;
    }

    fn update_request(prior: DynamicValue, planned_state: DynamicValue) -> UpdateResourceRequest {
        UpdateResourceRequest {
            type_name: "meraki_network_appliance_vlan".into(),
            prior_state: prior,
            config: planned_state.clone(),
            planned_state,
            planned_private: vec![],
            provider_meta: None,
        }
    }

    fn known(extra: Vec<(&str, Dynamic)>) -> DynamicValue {
        let mut fields = vec![
            ("id", "N_1/10".into_dynamic()),
            ("dns_nameservers", vec!["upstream_dns"].into_dynamic()),
            ("dhcp_handling", "Run a DHCP server".into_dynamic()),
            ("dhcp_lease_time", "1 day".into_dynamic()),
            ("dhcp_boot_options_enabled", false.into_dynamic()),
            ("interface_id", "1284392014819".into_dynamic()),
        ];
        fields.extend(extra);
        planned(fields)
    }

    #[tokio::test]
    async fn update_sends_changed_name() {
        let mut server = Server::new_async().await;
        let put = server
            .mock("PUT", "/networks/N_1/appliance/vlans/10")
            .match_body(Matcher::PartialJson(json!({
                "name": "Guests",
                "dhcpLeaseTime": "1 day",
                "fixedIpAssignments": {},
                "reservedIpRanges": []
            })))
            .with_body(VLAN_JSON.replace("My VLAN", "Guests"))
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource
            .update(
                Context::new(),
                update_request(known(vec![]), known(vec![("name", "Guests".into_dynamic())])),
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response.new_state.get_string(&AttributePath::new("name")).unwrap(),
            "Guests"
        );
        put.assert_async().await;
    }

    #[tokio::test]
    async fn removing_group_policy_clears_it() {
        let mut server = Server::new_async().await;
        // The response still carries the old policy
        let put = server
            .mock("PUT", "/networks/N_1/appliance/vlans/10")
            .match_body(Matcher::PartialJson(json!({"groupPolicyId": null})))
            .with_body(VLAN_JSON.replace(
                r#""dhcpBootOptionsEnabled": false"#,
                r#""dhcpBootOptionsEnabled": false, "groupPolicyId": "101""#,
            ))
            .create_async()
            .await;

        let resource = configured(&server).await;
        let prior = known(vec![("group_policy_id", "101".into_dynamic())]);
        let response = resource
            .update(Context::new(), update_request(prior, known(vec![])))
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert!(response
            .new_state
            .get::<String>(&AttributePath::new("group_policy_id"))
            .unwrap()
            .is_null());
        put.assert_async().await;
    }

    #[test]
    fn unchanged_unset_group_policy_is_not_sent() {
        let request = VlanModel::from_value(&known(vec![])).unwrap();
        let body = serde_json::to_value(request.update_request(&request)).unwrap();
        assert!(body.get("groupPolicyId").is_none());

        let prior = VlanModel::from_value(&known(vec![("group_policy_id", "101".into_dynamic())]))
            .unwrap();
        let body = serde_json::to_value(request.update_request(&prior)).unwrap();
        assert_eq!(body.get("groupPolicyId"), Some(&serde_json::Value::Null));
    }

    #[tokio::test]
    async fn deleted_vlan_is_removed_from_state() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/networks/N_1/appliance/vlans/10")
            .with_status(404)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "meraki_network_appliance_vlan".into(),
                    current_state: planned(vec![]),
                    private: vec![],
                    provider_meta: None,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;
        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.is_none());
    }

    #[tokio::test]
    async fn import_parses_numeric_vlan_id() {
        let resource = ApplianceVlanResource::new();
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "meraki_network_appliance_vlan".into(),
                    id: "N_1/10".into(),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let state = &response.imported_resources[0].state;
        assert_eq!(state.get_i64(&AttributePath::new("vlan_id")).unwrap(), 10);
        assert_eq!(state.get_string(&AttributePath::new("network_id")).unwrap(), "N_1");
    }

    #[tokio::test]
    async fn import_rejects_non_numeric_vlan_id() {
        let resource = ApplianceVlanResource::new();
        for id in ["N_1/ten", "N_1", "N_1/10/x"] {
            let response = resource
                .import_state(
                    Context::new(),
                    ImportResourceStateRequest {
                        type_name: "meraki_network_appliance_vlan".into(),
                        id: id.into(),
                        client_capabilities: ClientCapabilities::default(),
                    },
                )
                .await;
            assert_eq!(response.diagnostics.len(), 1, "{}", id);
            assert!(response.imported_resources.is_empty());
        }
    }

    #[test]
    fn nameservers_round_trip_through_newlines() {
        assert_eq!(
            split_nameservers("8.8.8.8\n 8.8.4.4\n"),
            vec!["8.8.8.8".to_string(), "8.8.4.4".to_string()]
        );
        assert_eq!(
            join_nameservers(&["1.1.1.1".to_string(), "9.9.9.9".to_string()]),
            "1.1.1.1\n9.9.9.9"
        );
    }
}
