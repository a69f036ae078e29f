//! Layer 3 firewall rules of a network's appliance
//!
//! The API always appends an allow-all "Default rule"; it is stripped from
//! state and never sent back.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
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
    string_like_prior,
};
use crate::api::appliance::{FirewallRule, FirewallRules};
use crate::MerakiProviderData;

const POLICIES: &[&str] = &["allow", "deny"];
const PROTOCOLS: &[&str] = &["tcp", "udp", "icmp", "icmp6", "any"];

#[derive(Default)]
pub struct ApplianceFirewallL3RulesResource {
    provider_data: Option<MerakiProviderData>,
}

impl ApplianceFirewallL3RulesResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct RuleModel {
    comment: Value<String>,
    policy: Value<String>,
    protocol: Value<String>,
    src_port: Value<String>,
    src_cidr: Value<String>,
    dest_port: Value<String>,
    dest_cidr: Value<String>,
    syslog_enabled: Value<bool>,
}

impl FromDynamic for RuleModel {
    fn from_dynamic(value: &Dynamic) -> tfplug::Result<Self> {
        let obj = ObjectReader::new(value)?;
        Ok(Self {
            comment: obj.get("comment")?,
            policy: obj.get("policy")?,
            protocol: obj.get("protocol")?,
            src_port: obj.get("src_port")?,
            src_cidr: obj.get("src_cidr")?,
            dest_port: obj.get("dest_port")?,
            dest_cidr: obj.get("dest_cidr")?,
            syslog_enabled: obj.get("syslog_enabled")?,
        })
    }
}

impl IntoDynamic for RuleModel {
    fn into_dynamic(self) -> Dynamic {
        ObjectBuilder::new()
            .set("comment", self.comment)
            .set("policy", self.policy)
            .set("protocol", self.protocol)
            .set("src_port", self.src_port)
            .set("src_cidr", self.src_cidr)
            .set("dest_port", self.dest_port)
            .set("dest_cidr", self.dest_cidr)
            .set("syslog_enabled", self.syslog_enabled)
            .build()
    }
}

impl RuleModel {
    fn to_api(&self) -> FirewallRule {
        FirewallRule {
            comment: self.comment.cloned_option(),
            policy: self.policy.cloned_option().unwrap_or_default(),
            protocol: self.protocol.cloned_option().unwrap_or_default(),
            src_port: self.src_port.cloned_option(),
            src_cidr: self.src_cidr.cloned_option().unwrap_or_default(),
            dest_port: self.dest_port.cloned_option(),
            dest_cidr: self.dest_cidr.cloned_option().unwrap_or_default(),
            syslog_enabled: self.syslog_enabled.cloned_option(),
        }
    }

    fn from_api(rule: FirewallRule, prior: Option<&RuleModel>) -> Self {
        let prior_comment = prior.map(|p| p.comment.clone()).unwrap_or_default();
        Self {
            comment: string_like_prior(&prior_comment, rule.comment),
            policy: Value::Known(rule.policy),
            protocol: Value::Known(rule.protocol),
            src_port: rule.src_port.into(),
            src_cidr: Value::Known(rule.src_cidr),
            dest_port: rule.dest_port.into(),
            dest_cidr: Value::Known(rule.dest_cidr),
            syslog_enabled: rule.syslog_enabled.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct RulesModel {
    network_id: Value<String>,
    rules: Value<Vec<RuleModel>>,
}

impl RulesModel {
    fn from_value(value: &DynamicValue) -> tfplug::Result<Self> {
        Ok(Self {
            network_id: attr(value, "network_id")?,
            rules: attr(value, "rules")?,
        })
    }

    fn to_value(&self) -> DynamicValue {
        ObjectBuilder::new()
            .set("network_id", self.network_id.clone())
            .set("rules", self.rules.clone())
            .into()
    }

    fn to_api(&self) -> FirewallRules {
        FirewallRules {
            rules: self
                .rules
                .as_option()
                .map(|rules| rules.iter().map(RuleModel::to_api).collect())
                .unwrap_or_default(),
        }
    }

    fn apply(&mut self, rules: FirewallRules) {
        let prior = self.rules.cloned_option().unwrap_or_default();
        let rules = rules
            .user_rules()
            .into_iter()
            .enumerate()
            .map(|(i, rule)| RuleModel::from_api(rule, prior.get(i)))
            .collect();
        self.rules = list_like_prior(&self.rules, rules);
    }
}

#[async_trait]
impl Resource for ApplianceFirewallL3RulesResource {
    fn type_name(&self) -> &str {
        "meraki_network_appliance_firewall_l3_rules"
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
        let rule = NestedTypeBuilder::list()
            .attribute(
                AttributeBuilder::new("comment", AttributeType::String)
                    .description("Description of the rule")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("policy", AttributeType::String)
                    .description("allow or deny")
                    .required()
                    .validator(StringOneOfValidator::new(POLICIES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("protocol", AttributeType::String)
                    .description("tcp, udp, icmp, icmp6 or any")
                    .required()
                    .validator(StringOneOfValidator::new(PROTOCOLS))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("src_port", AttributeType::String)
                    .description("Source port(s), or Any")
                    .optional()
                    .computed()
                    .default(StaticDefault::string("Any"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("src_cidr", AttributeType::String)
                    .description("Comma separated source CIDRs, or Any")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("dest_port", AttributeType::String)
                    .description("Destination port(s), or Any")
                    .optional()
                    .computed()
                    .default(StaticDefault::string("Any"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("dest_cidr", AttributeType::String)
                    .description("Comma separated destination CIDRs, or Any")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("syslog_enabled", AttributeType::Bool)
                    .description("Log matches to syslog")
                    .optional()
                    .computed()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .build();

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages the layer 3 firewall rules of a network's appliance")
            .attribute(
                AttributeBuilder::new("network_id", AttributeType::String)
                    .description("Network ID")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested("rules", rule)
                    .description("Ordered firewall rules, excluding the default rule")
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
        CreateResourceResponse::from_result(self.put_rules(&request.planned_state).await)
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_rules(&request.current_state).await;
        ReadResourceResponse::from_result(result, request)
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self.put_rules(&request.planned_state).await;
        UpdateResourceResponse::from_result(result, request.prior_state)
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse::from_result(self.clear(&request.prior_state).await)
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl ApplianceFirewallL3RulesResource {
    async fn put_rules(&self, planned: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model =
            RulesModel::from_value(planned).map_err(|e| invalid_value("planned state", e))?;
        let network_id = required(&model.network_id, "network_id")?.to_string();

        let rules = data
            .client
            .appliance()
            .update_l3_firewall_rules(&network_id, &model.to_api())
            .await
            .map_err(|e| api_error("Failed to update L3 firewall rules", &e))?;

        model.apply(rules);
        Ok(model.to_value())
    }

    async fn read_rules(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let mut model = RulesModel::from_value(current).map_err(|e| invalid_value("state", e))?;
        let network_id = required(&model.network_id, "network_id")?.to_string();

        match data.client.appliance().get_l3_firewall_rules(&network_id).await {
            Ok(rules) => {
                model.apply(rules);
                Ok(Some(model.to_value()))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(api_error("Failed to read L3 firewall rules", &e)),
        }
    }

    async fn clear(&self, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let data = provider_data(&self.provider_data)?;
        let model = RulesModel::from_value(prior).map_err(|e| invalid_value("prior state", e))?;
        let network_id = required(&model.network_id, "network_id")?;

        match data
            .client
            .appliance()
            .update_l3_firewall_rules(network_id, &FirewallRules { rules: vec![] })
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(api_error("Failed to clear L3 firewall rules", &e)),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for ApplianceFirewallL3RulesResource {
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
impl ResourceWithImportState for ApplianceFirewallL3RulesResource {
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

    const RULES_JSON: &str = r#"{"rules":[
        {"comment":"Block telnet","policy":"deny","protocol":"tcp","srcPort":"Any",
         "srcCidr":"Any","destPort":"23","destCidr":"10.0.0.0/8","syslogEnabled":false},
        {"comment":"Default rule","policy":"allow","protocol":"Any","srcPort":"Any",
         "srcCidr":"Any","destPort":"Any","destCidr":"Any","syslogEnabled":false}
    ]}"#;

    async fn configured(server: &Server) -> ApplianceFirewallL3RulesResource {
        let mut resource = ApplianceFirewallL3RulesResource::new();
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
    async fn read_strips_default_rule() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/networks/N_1/appliance/firewall/l3FirewallRules")
            .with_body(RULES_JSON)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "meraki_network_appliance_firewall_l3_rules".into(),
                    current_state: ObjectBuilder::new().set("network_id", "N_1").into(),
                    private: vec![],
                    provider_meta: None,
                    client_capabilities: Default::default(),
                },
            )
            .await;

        let state = response.new_state.unwrap();
        let rules = state.get_list(&AttributePath::new("rules")).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(
            state
                .get_string(&AttributePath::new("rules").index(0).attribute("comment"))
                .unwrap(),
            "Block telnet"
        );
        assert_eq!(
            state
                .get_string(&AttributePath::new("rules").index(0).attribute("src_port"))
                .unwrap(),
            "Any"
        );
    }

    #[tokio::test]
    async fn create_sends_rules_without_computed_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/networks/N_1/appliance/firewall/l3FirewallRules")
            .match_body(Matcher::Json(json!({"rules": [{
                "comment": "Block telnet",
                "policy": "deny",
                "protocol": "tcp",
                "srcCidr": "Any",
                "destPort": "23",
                "destCidr": "10.0.0.0/8"
            }]})))
            .with_body(RULES_JSON)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let rules = Dynamic::List(vec![ObjectBuilder::new()
            .set("comment", "Block telnet")
            .set("policy", "deny")
            .set("protocol", "tcp")
            .set("src_port", Dynamic::Unknown)
            .set("src_cidr", "Any")
            .set("dest_port", "23")
            .set("dest_cidr", "10.0.0.0/8")
            .set("syslog_enabled", Dynamic::Unknown)
            .build()]);
        let planned: DynamicValue = ObjectBuilder::new()
            .set("network_id", "N_1")
            .set("rules", rules)
            .into();
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "meraki_network_appliance_firewall_l3_rules".into(),
                    config: planned.clone(),
                    planned_state: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert!(!response
            .new_state
            .get_bool(&AttributePath::new("rules").index(0).attribute("syslog_enabled"))
            .unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn user_rule_named_default_rule_is_kept() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/networks/N_1/appliance/firewall/l3FirewallRules")
            .with_body(RULES_JSON.replace("Block telnet", "Default rule"))
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "meraki_network_appliance_firewall_l3_rules".into(),
                    current_state: ObjectBuilder::new().set("network_id", "N_1").into(),
                    private: vec![],
                    provider_meta: None,
                    client_capabilities: Default::default(),
                },
            )
            .await;

        let state = response.new_state.unwrap();
        assert_eq!(state.get_list(&AttributePath::new("rules")).unwrap().len(), 1);
        assert_eq!(
            state
                .get_string(&AttributePath::new("rules").index(0).attribute("policy"))
                .unwrap(),
            "deny"
        );
    }

    fn rule(comment: &str, dest_port: &str) -> Dynamic {
        ObjectBuilder::new()
            .set("comment", comment)
            .set("policy", "deny")
            .set("protocol", "tcp")
            .set("src_port", "Any")
            .set("src_cidr", "Any")
            .set("dest_port", dest_port)
            .set("dest_cidr", "10.0.0.0/8")
            .set("syslog_enabled", false)
            .build()
    }

    #[tokio::test]
    async fn update_replaces_whole_rule_list() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/networks/N_1/appliance/firewall/l3FirewallRules")
            .match_body(Matcher::Json(json!({"rules": [
                {"comment": "Block telnet", "policy": "deny", "protocol": "tcp", "srcPort": "Any",
                 "srcCidr": "Any", "destPort": "23", "destCidr": "10.0.0.0/8", "syslogEnabled": false},
                {"comment": "Block ssh", "policy": "deny", "protocol": "tcp", "srcPort": "Any",
                 "srcCidr": "Any", "destPort": "22", "destCidr": "10.0.0.0/8", "syslogEnabled": false}
            ]})))
            .with_body(RULES_JSON.replace(
                r#"{"comment":"Default rule""#,
                r#"{"comment":"Block ssh","policy":"deny","protocol":"tcp","srcPort":"Any",
                   "srcCidr":"Any","destPort":"22","destCidr":"10.0.0.0/8","syslogEnabled":false},
                  {"comment":"Default rule""#,
            ))
            .create_async()
            .await;

        let resource = configured(&server).await;
        let prior: DynamicValue = ObjectBuilder::new()
            .set("network_id", "N_1")
            .set("rules", Dynamic::List(vec![rule("Block telnet", "23")]))
            .into();
        let planned: DynamicValue = ObjectBuilder::new()
            .set("network_id", "N_1")
            .set(
                "rules",
                Dynamic::List(vec![rule("Block telnet", "23"), rule("Block ssh", "22")]),
            )
            .into();
        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "meraki_network_appliance_firewall_l3_rules".into(),
                    prior_state: prior,
                    planned_state: planned.clone(),
                    config: planned.clone(),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(response.new_state, planned);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn import_takes_network_id() {
        let resource = ApplianceFirewallL3RulesResource::new();
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "meraki_network_appliance_firewall_l3_rules".into(),
                    id: "N_1".into(),
                    client_capabilities: Default::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response.imported_resources[0]
                .state
                .get_string(&AttributePath::new("network_id"))
                .unwrap(),
            "N_1"
        );
    }

    #[tokio::test]
    async fn delete_sends_empty_rule_list() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/networks/N_1/appliance/firewall/l3FirewallRules")
            .match_body(Matcher::Json(json!({"rules": []})))
            .with_body(r#"{"rules":[]}"#)
            .create_async()
            .await;

        let resource = configured(&server).await;
        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "meraki_network_appliance_firewall_l3_rules".into(),
                    prior_state: ObjectBuilder::new().set("network_id", "N_1").into(),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        mock.assert_async().await;
    }
}
