//! Organization administrator endpoints
//!
//! The API has no single-admin GET; reads list and filter by id.

use super::common::{null_as_empty, segment};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub name: String,
    pub email: String,
    pub org_access: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<AdminTag>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub networks: Vec<AdminNetwork>,
    #[serde(default)]
    pub authentication_method: Option<String>,
    #[serde(default)]
    pub account_status: Option<String>,
    #[serde(default)]
    pub two_factor_auth_enabled: Option<bool>,
    #[serde(default)]
    pub has_api_key: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminTag {
    pub tag: String,
    pub access: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminNetwork {
    pub id: String,
    pub access: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    pub email: String,
    pub name: String,
    pub org_access: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<AdminTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networks: Option<Vec<AdminNetwork>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_method: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<AdminTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networks: Option<Vec<AdminNetwork>>,
}

pub struct AdminsApi<'a> {
    client: &'a Client,
}

impl<'a> AdminsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn base(organization_id: &str) -> String {
        format!("/organizations/{}/admins", segment(organization_id))
    }

    /// GET /organizations/{organizationId}/admins
    pub async fn list(&self, organization_id: &str) -> Result<Vec<Admin>, ApiError> {
        self.client.get(&Self::base(organization_id)).await
    }

    /// Finds one admin in the organization listing
    pub async fn find(
        &self,
        organization_id: &str,
        admin_id: &str,
    ) -> Result<Option<Admin>, ApiError> {
        Ok(self
            .list(organization_id)
            .await?
            .into_iter()
            .find(|admin| admin.id == admin_id))
    }

    /// POST /organizations/{organizationId}/admins
    pub async fn create(
        &self,
        organization_id: &str,
        request: &CreateAdminRequest,
    ) -> Result<Admin, ApiError> {
        self.client.post(&Self::base(organization_id), request).await
    }

    /// PUT /organizations/{organizationId}/admins/{adminId}
    pub async fn update(
        &self,
        organization_id: &str,
        admin_id: &str,
        request: &UpdateAdminRequest,
    ) -> Result<Admin, ApiError> {
        self.client
            .put(
                &format!("{}/{}", Self::base(organization_id), segment(admin_id)),
                request,
            )
            .await
    }

    /// DELETE /organizations/{organizationId}/admins/{adminId}
    pub async fn delete(&self, organization_id: &str, admin_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{}/{}", Self::base(organization_id), segment(admin_id)))
            .await
    }
}
