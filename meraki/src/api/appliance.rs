//! Security appliance endpoints: VLANs, VLAN settings and L3 firewall rules

use super::common::{null_as_empty, segment, string_or_number};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vlan {
    #[serde(with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub network_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub subnet: Option<String>,
    #[serde(default)]
    pub appliance_ip: Option<String>,
    #[serde(default, with = "string_or_number::option")]
    pub group_policy_id: Option<String>,
    #[serde(default, with = "string_or_number::option")]
    pub interface_id: Option<String>,
    #[serde(default)]
    pub fixed_ip_assignments: Option<BTreeMap<String, FixedIpAssignment>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reserved_ip_ranges: Vec<ReservedIpRange>,
    /// "upstream_dns", "google_dns", "opendns" or newline separated addresses
    #[serde(default)]
    pub dns_nameservers: Option<String>,
    #[serde(default)]
    pub dhcp_handling: Option<String>,
    #[serde(default)]
    pub dhcp_lease_time: Option<String>,
    #[serde(default)]
    pub dhcp_boot_options_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedIpAssignment {
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservedIpRange {
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVlanRequest {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appliance_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_policy_id: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVlanRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appliance_ip: Option<String>,
    /// `Some(None)` clears the policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_policy_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_ip_assignments: Option<BTreeMap<String, FixedIpAssignment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_ip_ranges: Option<Vec<ReservedIpRange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_nameservers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_handling: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_lease_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_boot_options_enabled: Option<bool>,
}

impl UpdateVlanRequest {
    /// True when the request carries fields the create call cannot set
    pub fn has_extended_fields(&self) -> bool {
        self.fixed_ip_assignments.is_some()
            || self.reserved_ip_ranges.is_some()
            || self.dns_nameservers.is_some()
            || self.dhcp_handling.is_some()
            || self.dhcp_lease_time.is_some()
            || self.dhcp_boot_options_enabled.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlansSettings {
    pub vlans_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub policy: String,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_port: Option<String>,
    pub src_cidr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_port: Option<String>,
    pub dest_cidr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog_enabled: Option<bool>,
}

impl FirewallRule {
    /// The implicit allow-all rule the API appends to every rule list
    pub fn is_default_rule(&self) -> bool {
        let any = |value: &str| value.eq_ignore_ascii_case("any");
        self.comment.as_deref() == Some("Default rule")
            && self.policy.eq_ignore_ascii_case("allow")
            && any(&self.protocol)
            && any(&self.src_cidr)
            && any(&self.dest_cidr)
            && self.src_port.as_deref().map_or(true, any)
            && self.dest_port.as_deref().map_or(true, any)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRules {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rules: Vec<FirewallRule>,
}

impl FirewallRules {
    /// User rules only; the API always reports the default rule last
    pub fn user_rules(mut self) -> Vec<FirewallRule> {
        if self.rules.last().is_some_and(FirewallRule::is_default_rule) {
            self.rules.pop();
        }
        self.rules
    }
}

pub struct ApplianceApi<'a> {
    client: &'a Client,
}

impl<'a> ApplianceApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn vlans_path(network_id: &str) -> String {
        format!("/networks/{}/appliance/vlans", segment(network_id))
    }

    /// GET /networks/{networkId}/appliance/vlans
    pub async fn list_vlans(&self, network_id: &str) -> Result<Vec<Vlan>, ApiError> {
        self.client.get(&Self::vlans_path(network_id)).await
    }

    /// GET /networks/{networkId}/appliance/vlans/{vlanId}
    pub async fn get_vlan(&self, network_id: &str, vlan_id: &str) -> Result<Vlan, ApiError> {
        self.client
            .get(&format!("{}/{}", Self::vlans_path(network_id), segment(vlan_id)))
            .await
    }

    /// POST /networks/{networkId}/appliance/vlans
    pub async fn create_vlan(
        &self,
        network_id: &str,
        request: &CreateVlanRequest,
    ) -> Result<Vlan, ApiError> {
        self.client.post(&Self::vlans_path(network_id), request).await
    }

    /// PUT /networks/{networkId}/appliance/vlans/{vlanId}
    pub async fn update_vlan(
        &self,
        network_id: &str,
        vlan_id: &str,
        request: &UpdateVlanRequest,
    ) -> Result<Vlan, ApiError> {
        self.client
            .put(
                &format!("{}/{}", Self::vlans_path(network_id), segment(vlan_id)),
                request,
            )
            .await
    }

    /// DELETE /networks/{networkId}/appliance/vlans/{vlanId}
    pub async fn delete_vlan(&self, network_id: &str, vlan_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{}/{}", Self::vlans_path(network_id), segment(vlan_id)))
            .await
    }

    /// GET /networks/{networkId}/appliance/vlans/settings
    pub async fn get_vlans_settings(&self, network_id: &str) -> Result<VlansSettings, ApiError> {
        self.client
            .get(&format!("{}/settings", Self::vlans_path(network_id)))
            .await
    }

    /// PUT /networks/{networkId}/appliance/vlans/settings
    pub async fn update_vlans_settings(
        &self,
        network_id: &str,
        settings: &VlansSettings,
    ) -> Result<VlansSettings, ApiError> {
        self.client
            .put(&format!("{}/settings", Self::vlans_path(network_id)), settings)
            .await
    }

    /// GET /networks/{networkId}/appliance/firewall/l3FirewallRules
    pub async fn get_l3_firewall_rules(&self, network_id: &str) -> Result<FirewallRules, ApiError> {
        self.client
            .get(&format!(
                "/networks/{}/appliance/firewall/l3FirewallRules",
                segment(network_id)
            ))
            .await
    }

    /// PUT /networks/{networkId}/appliance/firewall/l3FirewallRules
    pub async fn update_l3_firewall_rules(
        &self,
        network_id: &str,
        rules: &FirewallRules,
    ) -> Result<FirewallRules, ApiError> {
        self.client
            .put(
                &format!(
                    "/networks/{}/appliance/firewall/l3FirewallRules",
                    segment(network_id)
                ),
                rules,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client_for;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn vlan_ids_may_be_numbers() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/networks/N_1/appliance/vlans/10")
            .with_body(
                r#"{"id":10,"networkId":"N_1","name":"My VLAN","subnet":"192.168.10.0/24",
                    "applianceIp":"192.168.10.1","groupPolicyId":101,"interfaceId":"1284392014819",
                    "fixedIpAssignments":{"22:33:44:55:66:77":{"ip":"192.168.10.5","name":"printer"}},
                    "reservedIpRanges":[{"start":"192.168.10.20","end":"192.168.10.30","comment":"static"}],
                    "dnsNameservers":"upstream_dns","dhcpHandling":"Run a DHCP server"}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let vlan = client.appliance().get_vlan("N_1", "10").await.unwrap();

        assert_eq!(vlan.id, "10");
        assert_eq!(vlan.group_policy_id.as_deref(), Some("101"));
        let fixed = vlan.fixed_ip_assignments.unwrap();
        assert_eq!(fixed["22:33:44:55:66:77"].ip, "192.168.10.5");
        assert_eq!(vlan.reserved_ip_ranges[0].comment.as_deref(), Some("static"));
    }

    #[tokio::test]
    async fn firewall_rules_put_omits_unset_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/networks/N_1/appliance/firewall/l3FirewallRules")
            .match_body(Matcher::Json(json!({"rules": [{
                "policy": "deny",
                "protocol": "tcp",
                "srcCidr": "Any",
                "destPort": "23",
                "destCidr": "10.0.0.0/8"
            }]})))
            .with_body(r#"{"rules":[]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        client
            .appliance()
            .update_l3_firewall_rules(
                "N_1",
                &FirewallRules {
                    rules: vec![FirewallRule {
                        comment: None,
                        policy: "deny".into(),
                        protocol: "tcp".into(),
                        src_port: None,
                        src_cidr: "Any".into(),
                        dest_port: Some("23".into()),
                        dest_cidr: "10.0.0.0/8".into(),
                        syslog_enabled: None,
                    }],
                },
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    fn rule(comment: &str, policy: &str) -> FirewallRule {
        FirewallRule {
            comment: Some(comment.into()),
            policy: policy.into(),
            protocol: "Any".into(),
            src_port: Some("Any".into()),
            src_cidr: "Any".into(),
            dest_port: Some("Any".into()),
            dest_cidr: "Any".into(),
            syslog_enabled: Some(false),
        }
    }

    #[test]
    fn only_trailing_default_rule_is_dropped() {
        let rules = FirewallRules {
            rules: vec![
                rule("Default rule", "deny"),
                rule("Default rule", "allow"),
                rule("Default rule", "allow"),
            ],
        };
        let kept = rules.user_rules();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].policy, "deny");

        let mut narrowed = rule("Default rule", "allow");
        narrowed.dest_cidr = "10.0.0.0/8".into();
        let rules = FirewallRules {
            rules: vec![narrowed],
        };
        assert_eq!(rules.user_rules().len(), 1);
        assert!(FirewallRules { rules: vec![] }.user_rules().is_empty());
    }

    #[test]
    fn extended_fields_need_a_follow_up_update() {
        let mut request = UpdateVlanRequest {
            name: Some("v".into()),
            ..Default::default()
        };
        assert!(!request.has_extended_fields());
        request.dhcp_lease_time = Some("1 day".into());
        assert!(request.has_extended_fields());
    }
}
