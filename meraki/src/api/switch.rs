//! Switch port endpoints

use super::common::{null_as_empty, segment, string_or_number};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchPort {
    #[serde(with = "string_or_number")]
    pub port_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub poe_enabled: Option<bool>,
    #[serde(default, rename = "type")]
    pub port_type: Option<String>,
    #[serde(default)]
    pub vlan: Option<i64>,
    #[serde(default)]
    pub voice_vlan: Option<i64>,
    #[serde(default)]
    pub allowed_vlans: Option<String>,
    #[serde(default)]
    pub isolation_enabled: Option<bool>,
    #[serde(default)]
    pub rstp_enabled: Option<bool>,
    #[serde(default)]
    pub stp_guard: Option<String>,
    #[serde(default)]
    pub link_negotiation: Option<String>,
    #[serde(default)]
    pub access_policy_type: Option<String>,
    #[serde(default)]
    pub udld: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSwitchPortRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poe_enabled: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_vlan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_vlans: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolation_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rstp_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stp_guard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_negotiation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_policy_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udld: Option<String>,
}

pub struct SwitchApi<'a> {
    client: &'a Client,
}

impl<'a> SwitchApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /devices/{serial}/switch/ports
    pub async fn list_ports(&self, serial: &str) -> Result<Vec<SwitchPort>, ApiError> {
        self.client
            .get(&format!("/devices/{}/switch/ports", segment(serial)))
            .await
    }

    /// GET /devices/{serial}/switch/ports/{portId}
    pub async fn get_port(&self, serial: &str, port_id: &str) -> Result<SwitchPort, ApiError> {
        self.client
            .get(&format!(
                "/devices/{}/switch/ports/{}",
                segment(serial),
                segment(port_id)
            ))
            .await
    }

    /// PUT /devices/{serial}/switch/ports/{portId}
    pub async fn update_port(
        &self,
        serial: &str,
        port_id: &str,
        request: &UpdateSwitchPortRequest,
    ) -> Result<SwitchPort, ApiError> {
        self.client
            .put(
                &format!(
                    "/devices/{}/switch/ports/{}",
                    segment(serial),
                    segment(port_id)
                ),
                request,
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
    async fn update_port_renames_type_field() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/devices/Q2SW/switch/ports/3")
            .match_body(Matcher::Json(json!({"type": "access", "vlan": 20})))
            .with_body(r#"{"portId":"3","type":"access","vlan":20,"enabled":true}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let port = client
            .switch()
            .update_port(
                "Q2SW",
                "3",
                &UpdateSwitchPortRequest {
                    port_type: Some("access".into()),
                    vlan: Some(20),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(port.port_id, "3");
        assert_eq!(port.port_type.as_deref(), Some("access"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_accepts_numeric_port_ids() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/devices/Q2SW/switch/ports")
            .with_body(r#"[{"portId":1,"name":"uplink"},{"portId":"2"}]"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let ports = client.switch().list_ports("Q2SW").await.unwrap();
        assert_eq!(ports[0].port_id, "1");
        assert_eq!(ports[1].port_id, "2");
    }
}
