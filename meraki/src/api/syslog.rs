//! Network syslog servers

use super::common::{null_as_empty, segment, string_or_number};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyslogServer {
    pub host: String,
    /// Sent as a string, returned as either a string or a number
    #[serde(with = "string_or_number")]
    pub port: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyslogServers {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub servers: Vec<SyslogServer>,
}

pub struct SyslogApi<'a> {
    client: &'a Client,
}

impl<'a> SyslogApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /networks/{networkId}/syslogServers
    pub async fn get(&self, network_id: &str) -> Result<SyslogServers, ApiError> {
        self.client
            .get(&format!("/networks/{}/syslogServers", segment(network_id)))
            .await
    }

    /// PUT /networks/{networkId}/syslogServers
    pub async fn update(
        &self,
        network_id: &str,
        servers: &SyslogServers,
    ) -> Result<SyslogServers, ApiError> {
        self.client
            .put(
                &format!("/networks/{}/syslogServers", segment(network_id)),
                servers,
            )
            .await
    }
}
