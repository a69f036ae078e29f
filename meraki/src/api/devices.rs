//! Device endpoints: per-device attributes and network claim/remove

use super::common::{null_as_empty, segment};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub serial: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub firmware: Option<String>,
    #[serde(default)]
    pub lan_ip: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_map_marker: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ClaimRequest<'a> {
    serials: &'a [String],
}

#[derive(Debug, Serialize)]
struct RemoveRequest<'a> {
    serial: &'a str,
}

pub struct DevicesApi<'a> {
    client: &'a Client,
}

impl<'a> DevicesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /devices/{serial}
    pub async fn get(&self, serial: &str) -> Result<Device, ApiError> {
        self.client
            .get(&format!("/devices/{}", segment(serial)))
            .await
    }

    /// PUT /devices/{serial}
    pub async fn update(
        &self,
        serial: &str,
        request: &UpdateDeviceRequest,
    ) -> Result<Device, ApiError> {
        self.client
            .put(&format!("/devices/{}", segment(serial)), request)
            .await
    }

    /// GET /networks/{networkId}/devices
    pub async fn list_network(&self, network_id: &str) -> Result<Vec<Device>, ApiError> {
        self.client
            .get(&format!("/networks/{}/devices", segment(network_id)))
            .await
    }

    /// POST /networks/{networkId}/devices/claim
    pub async fn claim(&self, network_id: &str, serials: &[String]) -> Result<(), ApiError> {
        if serials.is_empty() {
            return Ok(());
        }
        let _: serde_json::Value = self
            .client
            .post(
                &format!("/networks/{}/devices/claim", segment(network_id)),
                &ClaimRequest { serials },
            )
            .await?;
        Ok(())
    }

    /// POST /networks/{networkId}/devices/remove
    pub async fn remove(&self, network_id: &str, serial: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .client
            .post(
                &format!("/networks/{}/devices/remove", segment(network_id)),
                &RemoveRequest { serial },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client_for;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn claim_posts_serials() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/networks/N_1/devices/claim")
            .match_body(Matcher::Json(json!({"serials": ["Q2AA-AAAA-AAAA"]})))
            .with_body(r#"{"serials":["Q2AA-AAAA-AAAA"]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        client
            .devices()
            .claim("N_1", &["Q2AA-AAAA-AAAA".to_string()])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn claiming_nothing_sends_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server);
        client.devices().claim("N_1", &[]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn remove_accepts_empty_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/networks/N_1/devices/remove")
            .match_body(Matcher::Json(json!({"serial": "Q2AA-AAAA-AAAA"})))
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        client
            .devices()
            .remove("N_1", "Q2AA-AAAA-AAAA")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn device_fields_are_optional() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/devices/Q2AA-AAAA-AAAA")
            .with_body(r#"{"serial":"Q2AA-AAAA-AAAA","model":"MS120-8","tags":null,"lat":37.4,"lng":-122.1}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let device = client.devices().get("Q2AA-AAAA-AAAA").await.unwrap();
        assert_eq!(device.model.as_deref(), Some("MS120-8"));
        assert!(device.tags.is_empty());
        assert!(device.name.is_none());
    }
}
