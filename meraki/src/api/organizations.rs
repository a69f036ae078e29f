//! Organization endpoints

use super::common::segment;
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api: Option<OrganizationApi>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationApi {
    pub enabled: bool,
}

/// Body for POST /organizations and PUT /organizations/{id}
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<OrganizationApi>,
}

pub struct OrganizationsApi<'a> {
    client: &'a Client,
}

impl<'a> OrganizationsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /organizations
    pub async fn list(&self) -> Result<Vec<Organization>, ApiError> {
        self.client.get("/organizations").await
    }

    /// GET /organizations/{organizationId}
    pub async fn get(&self, organization_id: &str) -> Result<Organization, ApiError> {
        self.client
            .get(&format!("/organizations/{}", segment(organization_id)))
            .await
    }

    /// POST /organizations
    pub async fn create(&self, request: &OrganizationRequest) -> Result<Organization, ApiError> {
        self.client.post("/organizations", request).await
    }

    /// PUT /organizations/{organizationId}
    pub async fn update(
        &self,
        organization_id: &str,
        request: &OrganizationRequest,
    ) -> Result<Organization, ApiError> {
        self.client
            .put(&format!("/organizations/{}", segment(organization_id)), request)
            .await
    }

    /// DELETE /organizations/{organizationId}
    pub async fn delete(&self, organization_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/organizations/{}", segment(organization_id)))
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
    async fn create_sends_only_set_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/organizations")
            .match_body(Matcher::Json(json!({"name": "Acme"})))
            .with_status(201)
            .with_body(r#"{"id":"2930418","name":"Acme","url":"https://n1.meraki.com/o/x","api":{"enabled":true}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let org = client
            .organizations()
            .create(&OrganizationRequest {
                name: Some("Acme".into()),
                api: None,
            })
            .await
            .unwrap();

        assert_eq!(org.id, "2930418");
        assert!(org.api.unwrap().enabled);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_missing_organization_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/organizations/404")
            .with_status(404)
            .with_body(r#"{"errors":["Not found"]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.organizations().get("404").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
