//! Network endpoints
//!
//! Network deletion is eventually consistent: right after devices are removed
//! or settings change the API may reject the delete, so it is retried with a
//! linear backoff.

use super::common::{null_as_empty, segment};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tfplug::Context;

/// Upper bound on DELETE attempts for one network
pub const NETWORK_DELETE_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub product_types: Vec<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_bound_to_config_template: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNetworkRequest {
    pub name: String,
    pub product_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNetworkRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub struct NetworksApi<'a> {
    client: &'a Client,
}

impl<'a> NetworksApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /organizations/{organizationId}/networks
    pub async fn list(&self, organization_id: &str) -> Result<Vec<Network>, ApiError> {
        self.client
            .get(&format!(
                "/organizations/{}/networks",
                segment(organization_id)
            ))
            .await
    }

    /// GET /networks/{networkId}
    pub async fn get(&self, network_id: &str) -> Result<Network, ApiError> {
        self.client
            .get(&format!("/networks/{}", segment(network_id)))
            .await
    }

    /// POST /organizations/{organizationId}/networks
    pub async fn create(
        &self,
        organization_id: &str,
        request: &CreateNetworkRequest,
    ) -> Result<Network, ApiError> {
        self.client
            .post(
                &format!("/organizations/{}/networks", segment(organization_id)),
                request,
            )
            .await
    }

    /// PUT /networks/{networkId}
    pub async fn update(
        &self,
        network_id: &str,
        request: &UpdateNetworkRequest,
    ) -> Result<Network, ApiError> {
        self.client
            .put(&format!("/networks/{}", segment(network_id)), request)
            .await
    }

    /// DELETE /networks/{networkId}
    pub async fn delete(&self, network_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/networks/{}", segment(network_id)))
            .await
    }

    /// Deletes a network, retrying until the API accepts it
    ///
    /// Attempt `n` (starting at 0) waits `n * step` first. A 2xx or a 404
    /// ends the loop; any other failure is retried. When every attempt fails
    /// the last error is returned.
    pub async fn delete_with_retry(
        &self,
        ctx: &Context,
        network_id: &str,
        step: Duration,
    ) -> Result<(), ApiError> {
        let mut last_error = ApiError::Cancelled;

        for attempt in 0..NETWORK_DELETE_ATTEMPTS {
            ctx.sleep(retry_delay(step, attempt))
                .await
                .map_err(|_| ApiError::Cancelled)?;

            match self.delete(network_id).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(network_id, "network already deleted");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        network_id,
                        attempt = attempt + 1,
                        error = %e,
                        "network delete failed, retrying"
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

/// Linear backoff, saturating for steps too large to multiply
fn retry_delay(step: Duration, attempt: u32) -> Duration {
    step.saturating_mul(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client_for;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn create_posts_to_organization() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/organizations/O1/networks")
            .match_body(Matcher::Json(json!({
                "name": "Branch",
                "productTypes": ["appliance", "switch"],
                "tags": ["west"]
            })))
            .with_status(201)
            .with_body(
                r#"{"id":"N_1","organizationId":"O1","name":"Branch",
                    "productTypes":["appliance","switch"],"timeZone":"America/Los_Angeles",
                    "tags":["west"],"notes":null,"url":"https://n1.meraki.com/n"}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let network = client
            .networks()
            .create(
                "O1",
                &CreateNetworkRequest {
                    name: "Branch".into(),
                    product_types: vec!["appliance".into(), "switch".into()],
                    time_zone: None,
                    tags: Some(vec!["west".into()]),
                    notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(network.id, "N_1");
        assert_eq!(network.time_zone.as_deref(), Some("America/Los_Angeles"));
        assert!(network.notes.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_retries_until_success() {
        let mut server = Server::new_async().await;
        let busy = server
            .mock("DELETE", "/networks/N_1")
            .with_status(400)
            .with_body(r#"{"errors":["Network has devices"]}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        let ctx = Context::new();

        // Attempts land at roughly 0ms, 50ms and 150ms
        let handle = {
            let client = client.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                client
                    .networks()
                    .delete_with_retry(&ctx, "N_1", Duration::from_millis(50))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        busy.assert_async().await;
        busy.remove_async().await;
        let done = server
            .mock("DELETE", "/networks/N_1")
            .with_status(204)
            .create_async()
            .await;

        assert!(handle.await.unwrap().is_ok());
        done.assert_async().await;
    }

    #[tokio::test]
    async fn delete_treats_not_found_as_done() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/networks/N_1")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        client
            .networks()
            .delete_with_retry(&Context::new(), "N_1", Duration::from_millis(1))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_returns_last_error_when_attempts_run_out() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/networks/N_1")
            .with_status(500)
            .with_body("still busy")
            .expect(NETWORK_DELETE_ATTEMPTS as usize)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .networks()
            .delete_with_retry(&Context::new(), "N_1", Duration::ZERO)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_stops_when_cancelled() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/networks/N_1")
            .with_status(400)
            .create_async()
            .await;

        let client = client_for(&server);
        let ctx = Context::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            canceller.cancel();
        });

        let err = client
            .networks()
            .delete_with_retry(&ctx, "N_1", Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
    }

    #[test]
    fn retry_delay_grows_linearly_and_saturates() {
        assert_eq!(retry_delay(Duration::from_secs(1), 0), Duration::ZERO);
        assert_eq!(retry_delay(Duration::from_secs(2), 3), Duration::from_secs(6));
        assert_eq!(retry_delay(Duration::MAX, 2), Duration::MAX);
        assert_eq!(
            retry_delay(Duration::from_secs(u64::MAX / 2), NETWORK_DELETE_ATTEMPTS - 1),
            Duration::MAX
        );
    }
}
