//! Organization and network SNMP settings

use super::common::{null_as_empty, segment};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSnmp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v2c_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v3_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v3_auth_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v3_auth_pass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v3_priv_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v3_priv_pass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_ips: Option<Vec<String>>,
    // Read-only
    #[serde(default, skip_serializing)]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing)]
    pub port: Option<i64>,
    #[serde(default, skip_serializing)]
    pub v2_community_string: Option<String>,
    #[serde(default, skip_serializing)]
    pub v3_user: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnmp {
    pub access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_string: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<SnmpUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnmpUser {
    pub username: String,
    pub passphrase: String,
}

pub struct SnmpApi<'a> {
    client: &'a Client,
}

impl<'a> SnmpApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /organizations/{organizationId}/snmp
    pub async fn get_organization(&self, organization_id: &str) -> Result<OrganizationSnmp, ApiError> {
        self.client
            .get(&format!("/organizations/{}/snmp", segment(organization_id)))
            .await
    }

    /// PUT /organizations/{organizationId}/snmp
    pub async fn update_organization(
        &self,
        organization_id: &str,
        settings: &OrganizationSnmp,
    ) -> Result<OrganizationSnmp, ApiError> {
        self.client
            .put(
                &format!("/organizations/{}/snmp", segment(organization_id)),
                settings,
            )
            .await
    }

    /// GET /networks/{networkId}/snmp
    pub async fn get_network(&self, network_id: &str) -> Result<NetworkSnmp, ApiError> {
        self.client
            .get(&format!("/networks/{}/snmp", segment(network_id)))
            .await
    }

    /// PUT /networks/{networkId}/snmp
    pub async fn update_network(
        &self,
        network_id: &str,
        settings: &NetworkSnmp,
    ) -> Result<NetworkSnmp, ApiError> {
        self.client
            .put(&format!("/networks/{}/snmp", segment(network_id)), settings)
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
    async fn organization_update_skips_read_only_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/organizations/O1/snmp")
            .match_body(Matcher::Json(json!({"v2cEnabled": false, "v3Enabled": false})))
            .with_body(r#"{"v2cEnabled":false,"v3Enabled":false,"hostname":"snmp.meraki.com","port":16100}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let settings = client
            .snmp()
            .update_organization(
                "O1",
                &OrganizationSnmp {
                    v2c_enabled: Some(false),
                    v3_enabled: Some(false),
                    hostname: Some("ignored".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(settings.port, Some(16100));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn network_snmp_users_default_to_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/networks/N_1/snmp")
            .with_body(r#"{"access":"community","communityString":"public","users":null}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let settings = client.snmp().get_network("N_1").await.unwrap();
        assert_eq!(settings.access, "community");
        assert!(settings.users.is_empty());
    }
}
