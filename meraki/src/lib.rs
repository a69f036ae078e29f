//! Terraform provider for the Cisco Meraki Dashboard API

pub mod api;
pub mod config;
pub mod data_sources;
pub mod provider_data;
pub mod resources;

pub use provider_data::MerakiProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetaSchemaRequest, ProviderMetaSchemaResponse, ProviderMetadataRequest,
    ProviderMetadataResponse, ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
    StopProviderRequest, StopProviderResponse, ValidateProviderConfigRequest,
    ValidateProviderConfigResponse,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Diagnostic, ServerCapabilities};
use tfplug::validator::NumberRangeValidator;

use crate::config::MerakiConfig;

#[derive(Default)]
pub struct MerakiProvider;

impl MerakiProvider {
    pub fn new() -> Self {
        Self
    }
}

fn resource<R>(make: fn() -> R) -> ResourceFactory
where
    R: ResourceWithConfigure + 'static,
{
    Box::new(move || Box::new(make()) as Box<dyn ResourceWithConfigure>)
}

fn data_source<D>(make: fn() -> D) -> DataSourceFactory
where
    D: DataSourceWithConfigure + 'static,
{
    Box::new(move || Box::new(make()) as Box<dyn DataSourceWithConfigure>)
}

#[async_trait]
impl Provider for MerakiProvider {
    fn type_name(&self) -> &str {
        "meraki"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
            server_capabilities: ServerCapabilities {
                plan_destroy: false,
                get_provider_schema_optional: false,
                move_resource_state: false,
            },
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages Cisco Meraki organizations, networks and devices")
            .attribute(
                AttributeBuilder::new("api_key", AttributeType::String)
                    .description(&format!(
                        "Dashboard API key. Can also be set with {}",
                        config::ENV_API_KEY
                    ))
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("base_url", AttributeType::String)
                    .description(&format!(
                        "API base URL, defaults to {}. Can also be set with {}",
                        api::DEFAULT_BASE_URL,
                        config::ENV_BASE_URL
                    ))
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("request_timeout", AttributeType::Number)
                    .description(&format!(
                        "HTTP request timeout in seconds, defaults to {}. Can also be set with {}",
                        config::DEFAULT_REQUEST_TIMEOUT_SECS,
                        config::ENV_REQUEST_TIMEOUT
                    ))
                    .optional()
                    .validator(NumberRangeValidator::at_least(1.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("network_delete_retry_interval", AttributeType::Number)
                    .description(&format!(
                        "Seconds added to the wait between network delete retries, defaults to {}",
                        config::DEFAULT_NETWORK_DELETE_RETRY_INTERVAL_SECS
                    ))
                    .optional()
                    .validator(NumberRangeValidator::at_least(0.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("insecure", AttributeType::Bool)
                    .description(&format!(
                        "Skip TLS certificate verification. Can also be set with {}",
                        config::ENV_INSECURE
                    ))
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn meta_schema(
        &self,
        _ctx: Context,
        _request: ProviderMetaSchemaRequest,
    ) -> ProviderMetaSchemaResponse {
        ProviderMetaSchemaResponse::default()
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let config = match MerakiConfig::from_config(&request.config) {
            Ok(config) => config,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        };

        tracing::info!(
            base_url = %config.base_url,
            terraform_version = %request.terraform_version,
            "configuring Meraki provider"
        );
        if config.insecure {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let client = match api::Client::new(
            &config.base_url,
            &config.api_key,
            config.request_timeout,
            config.insecure,
        ) {
            Ok(client) => client,
            Err(e) => {
                return ConfigureProviderResponse {
                    diagnostics: vec![Diagnostic::error(
                        "Failed to create API client",
                        e.to_string(),
                    )],
                    provider_data: None,
                }
            }
        };

        let data = MerakiProviderData::new(client, config.network_delete_retry_interval);

        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(data)),
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse::default()
    }

    async fn stop(&self, _ctx: Context, _request: StopProviderRequest) -> StopProviderResponse {
        StopProviderResponse::default()
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let factories = [
            ("meraki_organization", resource(resources::OrganizationResource::new)),
            (
                "meraki_organization_admin",
                resource(resources::OrganizationAdminResource::new),
            ),
            (
                "meraki_organization_snmp",
                resource(resources::OrganizationSnmpResource::new),
            ),
            ("meraki_network", resource(resources::NetworkResource::new)),
            (
                "meraki_network_devices_claim",
                resource(resources::NetworkDevicesClaimResource::new),
            ),
            ("meraki_network_snmp", resource(resources::NetworkSnmpResource::new)),
            (
                "meraki_network_syslog_servers",
                resource(resources::NetworkSyslogServersResource::new),
            ),
            (
                "meraki_network_appliance_vlan",
                resource(resources::ApplianceVlanResource::new),
            ),
            (
                "meraki_network_appliance_vlans_settings",
                resource(resources::ApplianceVlansSettingsResource::new),
            ),
            (
                "meraki_network_appliance_firewall_l3_rules",
                resource(resources::ApplianceFirewallL3RulesResource::new),
            ),
            ("meraki_device", resource(resources::DeviceResource::new)),
            (
                "meraki_device_switch_port",
                resource(resources::SwitchPortResource::new),
            ),
        ];

        factories
            .into_iter()
            .map(|(name, factory)| (name.to_string(), factory))
            .collect()
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let factories = [
            (
                "meraki_organizations",
                data_source(data_sources::OrganizationsDataSource::new),
            ),
            ("meraki_networks", data_source(data_sources::NetworksDataSource::new)),
            (
                "meraki_network_devices",
                data_source(data_sources::NetworkDevicesDataSource::new),
            ),
            (
                "meraki_device_switch_ports",
                data_source(data_sources::DeviceSwitchPortsDataSource::new),
            ),
            (
                "meraki_network_appliance_vlans",
                data_source(data_sources::NetworkApplianceVlansDataSource::new),
            ),
        ];

        factories
            .into_iter()
            .map(|(name, factory)| (name.to_string(), factory))
            .collect()
    }
}
