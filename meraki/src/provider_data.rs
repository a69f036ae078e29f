//! Provider data structure passed to resources and data sources

use crate::api::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct MerakiProviderData {
    pub client: Arc<Client>,
    /// Step of the linear backoff used while deleting networks
    pub network_delete_retry_interval: Duration,
}

impl MerakiProviderData {
    pub fn new(client: Client, network_delete_retry_interval: Duration) -> Self {
        Self {
            client: Arc::new(client),
            network_delete_retry_interval,
        }
    }
}

impl std::fmt::Debug for MerakiProviderData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerakiProviderData")
            .field("network_delete_retry_interval", &self.network_delete_retry_interval)
            .finish_non_exhaustive()
    }
}
