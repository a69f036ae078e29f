//! gRPC service implementation
//!
//! Implements the tfplugin6 `Provider` service on top of the [`Provider`]
//! trait. Resources and data sources are created from their factories for
//! every call, configured with the shared provider data, then invoked.
//! Wire decoding problems are reported as diagnostics, never as gRPC errors.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceSchemaRequest, DataSourceWithConfigure,
    ReadDataSourceRequest, ValidateDataSourceConfigRequest,
};
use crate::plan::plan_resource_change;
use crate::proto;
use crate::provider::{
    ConfigureProviderRequest, DataSourceFactory, Provider, ProviderMetaSchemaRequest,
    ProviderMetadataRequest, ProviderSchemaRequest, ResourceFactory, StopProviderRequest,
    ValidateProviderConfigRequest,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ModifyPlanRequest, ReadResourceRequest, ResourceSchemaRequest,
    ResourceWithConfigure, UpdateResourceRequest, UpgradeResourceStateRequest,
    ValidateResourceConfigRequest,
};
use crate::schema::{
    Attribute, Block, NestingMode, ObjectNestingMode, Schema, StringKind,
};
use crate::types::{
    has_errors, AttributePath, AttributePathStep, ClientCapabilities, Deferred, DeferredReason,
    Diagnostic, DiagnosticSeverity, Dynamic, DynamicValue, RawState,
};
use crate::validator::validate_config;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tonic::{Request, Response, Status};

type ProviderData = Option<Arc<dyn Any + Send + Sync>>;
type RpcResult<T> = std::result::Result<Response<T>, Status>;

/// Returns early from an RPC with a single error diagnostic
macro_rules! or_respond {
    ($expr:expr, $resp:ty) => {
        match $expr {
            Ok(v) => v,
            Err(diag) => {
                type Resp = $resp;
                return Ok(Response::new(Resp {
                    diagnostics: diagnostics_to_proto(vec![diag]),
                    ..Default::default()
                }))
            }
        }
    };
}

/// tfplugin6 service wrapping a [`Provider`]
pub struct GrpcProviderServer<P: Provider> {
    provider: Arc<RwLock<P>>,
    provider_data: Arc<RwLock<ProviderData>>,
    resources: HashMap<String, ResourceFactory>,
    data_sources: HashMap<String, DataSourceFactory>,
    ctx: Context,
}

impl<P: Provider + 'static> GrpcProviderServer<P> {
    pub fn new(provider: P) -> Self {
        let resources = provider.resources();
        let data_sources = provider.data_sources();
        Self {
            provider: Arc::new(RwLock::new(provider)),
            provider_data: Arc::new(RwLock::new(None)),
            resources,
            data_sources,
            ctx: Context::new(),
        }
    }

    /// Context shared by all operations; cancelled by StopProvider
    pub fn context(&self) -> Context {
        self.ctx.clone()
    }

    fn new_resource(
        &self,
        type_name: &str,
    ) -> std::result::Result<Box<dyn ResourceWithConfigure>, Diagnostic> {
        self.resources
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| {
                Diagnostic::error(
                    "Unknown resource type",
                    format!("The resource type {} is not supported by this provider", type_name),
                )
            })
    }

    fn new_data_source(
        &self,
        type_name: &str,
    ) -> std::result::Result<Box<dyn DataSourceWithConfigure>, Diagnostic> {
        self.data_sources
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| {
                Diagnostic::error(
                    "Unknown data source type",
                    format!(
                        "The data source type {} is not supported by this provider",
                        type_name
                    ),
                )
            })
    }

    async fn configured_resource(
        &self,
        type_name: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Box<dyn ResourceWithConfigure>> {
        let mut resource = match self.new_resource(type_name) {
            Ok(r) => r,
            Err(d) => {
                diagnostics.push(d);
                return None;
            }
        };
        let provider_data = self.provider_data.read().await.clone();
        let response = resource
            .configure(self.ctx.clone(), ConfigureResourceRequest { provider_data })
            .await;
        let failed = has_errors(&response.diagnostics);
        diagnostics.extend(response.diagnostics);
        (!failed).then_some(resource)
    }

    async fn configured_data_source(
        &self,
        type_name: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Box<dyn DataSourceWithConfigure>> {
        let mut data_source = match self.new_data_source(type_name) {
            Ok(d) => d,
            Err(d) => {
                diagnostics.push(d);
                return None;
            }
        };
        let provider_data = self.provider_data.read().await.clone();
        let response = data_source
            .configure(self.ctx.clone(), ConfigureDataSourceRequest { provider_data })
            .await;
        let failed = has_errors(&response.diagnostics);
        diagnostics.extend(response.diagnostics);
        (!failed).then_some(data_source)
    }

    async fn resource_schema(&self, resource: &dyn ResourceWithConfigure) -> Schema {
        resource
            .schema(self.ctx.clone(), ResourceSchemaRequest)
            .await
            .schema
    }
}

#[tonic::async_trait]
impl<P: Provider + 'static> proto::ProviderService for GrpcProviderServer<P> {
    async fn get_metadata(
        &self,
        _request: Request<proto::get_metadata::Request>,
    ) -> RpcResult<proto::get_metadata::Response> {
        let provider = self.provider.read().await;
        let metadata = provider
            .metadata(self.ctx.clone(), ProviderMetadataRequest)
            .await;

        let mut resources: Vec<_> = self.resources.keys().cloned().collect();
        resources.sort();
        let mut data_sources: Vec<_> = self.data_sources.keys().cloned().collect();
        data_sources.sort();

        Ok(Response::new(proto::get_metadata::Response {
            server_capabilities: Some(proto::ServerCapabilities {
                plan_destroy: metadata.server_capabilities.plan_destroy,
                get_provider_schema_optional: metadata
                    .server_capabilities
                    .get_provider_schema_optional,
                move_resource_state: metadata.server_capabilities.move_resource_state,
            }),
            diagnostics: vec![],
            data_sources: data_sources
                .into_iter()
                .map(|type_name| proto::get_metadata::DataSourceMetadata { type_name })
                .collect(),
            resources: resources
                .into_iter()
                .map(|type_name| proto::get_metadata::ResourceMetadata { type_name })
                .collect(),
            functions: vec![],
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<proto::get_provider_schema::Request>,
    ) -> RpcResult<proto::get_provider_schema::Response> {
        let provider = self.provider.read().await;
        let mut diagnostics = vec![];

        let schema_response = provider.schema(self.ctx.clone(), ProviderSchemaRequest).await;
        diagnostics.extend(schema_response.diagnostics);
        let meta_response = provider
            .meta_schema(self.ctx.clone(), ProviderMetaSchemaRequest)
            .await;
        diagnostics.extend(meta_response.diagnostics);
        let metadata = provider
            .metadata(self.ctx.clone(), ProviderMetadataRequest)
            .await;

        let mut resource_schemas = HashMap::new();
        for (type_name, factory) in &self.resources {
            let resource = factory();
            let response = resource.schema(self.ctx.clone(), ResourceSchemaRequest).await;
            diagnostics.extend(response.diagnostics);
            resource_schemas.insert(type_name.clone(), schema_to_proto(&response.schema));
        }

        let mut data_source_schemas = HashMap::new();
        for (type_name, factory) in &self.data_sources {
            let data_source = factory();
            let response = data_source
                .schema(self.ctx.clone(), DataSourceSchemaRequest)
                .await;
            diagnostics.extend(response.diagnostics);
            data_source_schemas.insert(type_name.clone(), schema_to_proto(&response.schema));
        }

        tracing::debug!(
            resources = resource_schemas.len(),
            data_sources = data_source_schemas.len(),
            "GetProviderSchema"
        );

        Ok(Response::new(proto::get_provider_schema::Response {
            provider: Some(schema_to_proto(&schema_response.schema)),
            resource_schemas,
            data_source_schemas,
            diagnostics: diagnostics_to_proto(diagnostics),
            provider_meta: meta_response.schema.as_ref().map(schema_to_proto),
            server_capabilities: Some(proto::ServerCapabilities {
                plan_destroy: metadata.server_capabilities.plan_destroy,
                get_provider_schema_optional: metadata
                    .server_capabilities
                    .get_provider_schema_optional,
                move_resource_state: metadata.server_capabilities.move_resource_state,
            }),
            functions: HashMap::new(),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<proto::validate_provider_config::Request>,
    ) -> RpcResult<proto::validate_provider_config::Response> {
        let req = request.into_inner();
        let config = or_respond!(
            decode_value(&req.config, "provider configuration"),
            proto::validate_provider_config::Response
        );

        let provider = self.provider.read().await;
        let schema = provider
            .schema(self.ctx.clone(), ProviderSchemaRequest)
            .await
            .schema;
        let mut diagnostics = validate_config(&schema.block, &config);
        let response = provider
            .validate(self.ctx.clone(), ValidateProviderConfigRequest { config })
            .await;
        diagnostics.extend(response.diagnostics);

        Ok(Response::new(proto::validate_provider_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<proto::validate_resource_config::Request>,
    ) -> RpcResult<proto::validate_resource_config::Response> {
        let req = request.into_inner();
        let resource = or_respond!(
            self.new_resource(&req.type_name),
            proto::validate_resource_config::Response
        );
        let config = or_respond!(
            decode_value(&req.config, "resource configuration"),
            proto::validate_resource_config::Response
        );

        let schema = self.resource_schema(resource.as_ref()).await;
        let mut diagnostics = validate_config(&schema.block, &config);
        let response = resource
            .validate(
                self.ctx.clone(),
                ValidateResourceConfigRequest {
                    type_name: req.type_name,
                    config,
                    client_capabilities: client_capabilities(req.client_capabilities),
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        Ok(Response::new(proto::validate_resource_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<proto::validate_data_resource_config::Request>,
    ) -> RpcResult<proto::validate_data_resource_config::Response> {
        let req = request.into_inner();
        let data_source = or_respond!(
            self.new_data_source(&req.type_name),
            proto::validate_data_resource_config::Response
        );
        let config = or_respond!(
            decode_value(&req.config, "data source configuration"),
            proto::validate_data_resource_config::Response
        );

        let schema = data_source
            .schema(self.ctx.clone(), DataSourceSchemaRequest)
            .await
            .schema;
        let mut diagnostics = validate_config(&schema.block, &config);
        let response = data_source
            .validate(
                self.ctx.clone(),
                ValidateDataSourceConfigRequest {
                    type_name: req.type_name,
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        Ok(Response::new(proto::validate_data_resource_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<proto::upgrade_resource_state::Request>,
    ) -> RpcResult<proto::upgrade_resource_state::Response> {
        let req = request.into_inner();
        let resource = or_respond!(
            self.new_resource(&req.type_name),
            proto::upgrade_resource_state::Response
        );
        let schema = self.resource_schema(resource.as_ref()).await;
        let raw_state = raw_state(req.raw_state);

        let (upgraded, diagnostics) = if let Some(upgrader) = resource.as_upgrade_state() {
            let response = upgrader
                .upgrade_state(
                    self.ctx.clone(),
                    UpgradeResourceStateRequest {
                        type_name: req.type_name.clone(),
                        version: req.version,
                        raw_state,
                    },
                )
                .await;
            (response.upgraded_state, response.diagnostics)
        } else if req.version == schema.version {
            let json = raw_state.json.unwrap_or_default();
            let state = or_respond!(
                DynamicValue::decode_json(&json).map_err(|e| Diagnostic::error(
                    "Unable to read prior state",
                    e.to_string()
                )),
                proto::upgrade_resource_state::Response
            );
            (state, vec![])
        } else {
            (
                DynamicValue::null(),
                vec![Diagnostic::error(
                    "Unable to upgrade resource state",
                    format!(
                        "{} has no state upgrader from version {} to version {}",
                        req.type_name, req.version, schema.version
                    ),
                )],
            )
        };

        let upgraded_state = or_respond!(
            encode_value(&schema.conform(&upgraded)),
            proto::upgrade_resource_state::Response
        );

        Ok(Response::new(proto::upgrade_resource_state::Response {
            upgraded_state: Some(upgraded_state),
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<proto::configure_provider::Request>,
    ) -> RpcResult<proto::configure_provider::Response> {
        let req = request.into_inner();
        let config = or_respond!(
            decode_value(&req.config, "provider configuration"),
            proto::configure_provider::Response
        );

        tracing::debug!(terraform_version = %req.terraform_version, "ConfigureProvider");

        let mut provider = self.provider.write().await;
        let response = provider
            .configure(
                self.ctx.clone(),
                ConfigureProviderRequest {
                    terraform_version: req.terraform_version,
                    config,
                    client_capabilities: client_capabilities(req.client_capabilities),
                },
            )
            .await;

        *self.provider_data.write().await = response.provider_data;

        Ok(Response::new(proto::configure_provider::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn read_resource(
        &self,
        request: Request<proto::read_resource::Request>,
    ) -> RpcResult<proto::read_resource::Response> {
        let req = request.into_inner();
        let current_state = or_respond!(
            decode_value(&req.current_state, "current state"),
            proto::read_resource::Response
        );
        let provider_meta = or_respond!(
            decode_optional(&req.provider_meta),
            proto::read_resource::Response
        );

        tracing::debug!(type_name = %req.type_name, "ReadResource");

        let mut diagnostics = vec![];
        let Some(resource) = self.configured_resource(&req.type_name, &mut diagnostics).await
        else {
            return Ok(Response::new(proto::read_resource::Response {
                new_state: req.current_state,
                diagnostics: diagnostics_to_proto(diagnostics),
                private: req.private,
                deferred: None,
            }));
        };

        let schema = self.resource_schema(resource.as_ref()).await;
        let response = resource
            .read(
                self.ctx.clone(),
                ReadResourceRequest {
                    type_name: req.type_name.clone(),
                    current_state,
                    private: req.private,
                    provider_meta,
                    client_capabilities: client_capabilities(req.client_capabilities),
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        let new_state = match response.new_state {
            Some(state) => schema.conform(&state),
            None => {
                tracing::debug!(type_name = %req.type_name, "resource no longer exists");
                DynamicValue::null()
            }
        };
        let new_state = or_respond!(encode_value(&new_state), proto::read_resource::Response);

        Ok(Response::new(proto::read_resource::Response {
            new_state: Some(new_state),
            diagnostics: diagnostics_to_proto(diagnostics),
            private: response.private,
            deferred: response.deferred.map(deferred_to_proto),
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<proto::plan_resource_change::Request>,
    ) -> RpcResult<proto::plan_resource_change::Response> {
        let req = request.into_inner();
        let prior_state = or_respond!(
            decode_value(&req.prior_state, "prior state"),
            proto::plan_resource_change::Response
        );
        let proposed_new_state = or_respond!(
            decode_value(&req.proposed_new_state, "proposed new state"),
            proto::plan_resource_change::Response
        );
        let config = or_respond!(
            decode_value(&req.config, "configuration"),
            proto::plan_resource_change::Response
        );
        let provider_meta = or_respond!(
            decode_optional(&req.provider_meta),
            proto::plan_resource_change::Response
        );

        tracing::debug!(type_name = %req.type_name, "PlanResourceChange");

        let mut diagnostics = vec![];
        let Some(resource) = self.configured_resource(&req.type_name, &mut diagnostics).await
        else {
            return Ok(Response::new(proto::plan_resource_change::Response {
                diagnostics: diagnostics_to_proto(diagnostics),
                ..Default::default()
            }));
        };

        let schema = self.resource_schema(resource.as_ref()).await;
        let planned = plan_resource_change(&schema, &prior_state, &proposed_new_state, &config);
        diagnostics.extend(planned.diagnostics);
        let mut planned_state = planned.planned_state;
        let mut requires_replace = planned.requires_replace;
        let mut planned_private = req.prior_private.clone();

        if !planned_state.is_null() && !has_errors(&diagnostics) {
            if let Some(modifier) = resource.as_modify_plan() {
                let response = modifier
                    .modify_plan(
                        self.ctx.clone(),
                        ModifyPlanRequest {
                            type_name: req.type_name.clone(),
                            config,
                            prior_state,
                            proposed_new_state: planned_state.clone(),
                            prior_private: req.prior_private,
                            provider_meta,
                        },
                    )
                    .await;
                diagnostics.extend(response.diagnostics);
                planned_state = response.planned_state;
                planned_private = response.planned_private;
                for path in response.requires_replace {
                    if !requires_replace.contains(&path) {
                        requires_replace.push(path);
                    }
                }
            }
        }

        let planned_state = or_respond!(
            encode_value(&schema.conform(&planned_state)),
            proto::plan_resource_change::Response
        );

        Ok(Response::new(proto::plan_resource_change::Response {
            planned_state: Some(planned_state),
            requires_replace: requires_replace.iter().map(path_to_proto).collect(),
            planned_private,
            diagnostics: diagnostics_to_proto(diagnostics),
            legacy_type_system: false,
            deferred: None,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<proto::apply_resource_change::Request>,
    ) -> RpcResult<proto::apply_resource_change::Response> {
        let req = request.into_inner();
        let prior_state = or_respond!(
            decode_value(&req.prior_state, "prior state"),
            proto::apply_resource_change::Response
        );
        let planned_state = or_respond!(
            decode_value(&req.planned_state, "planned state"),
            proto::apply_resource_change::Response
        );
        let config = or_respond!(
            decode_value(&req.config, "configuration"),
            proto::apply_resource_change::Response
        );
        let provider_meta = or_respond!(
            decode_optional(&req.provider_meta),
            proto::apply_resource_change::Response
        );

        let mut diagnostics = vec![];
        let Some(resource) = self.configured_resource(&req.type_name, &mut diagnostics).await
        else {
            return Ok(Response::new(proto::apply_resource_change::Response {
                new_state: req.prior_state,
                diagnostics: diagnostics_to_proto(diagnostics),
                ..Default::default()
            }));
        };
        let schema = self.resource_schema(resource.as_ref()).await;

        let (new_state, private) = if planned_state.is_null() {
            tracing::debug!(type_name = %req.type_name, "ApplyResourceChange: delete");
            let response = resource
                .delete(
                    self.ctx.clone(),
                    DeleteResourceRequest {
                        type_name: req.type_name.clone(),
                        prior_state: prior_state.clone(),
                        planned_private: req.planned_private.clone(),
                        provider_meta,
                    },
                )
                .await;
            let failed = has_errors(&response.diagnostics);
            diagnostics.extend(response.diagnostics);
            if failed {
                (prior_state, req.planned_private)
            } else {
                (DynamicValue::null(), vec![])
            }
        } else if prior_state.is_null() {
            tracing::debug!(type_name = %req.type_name, "ApplyResourceChange: create");
            let response = resource
                .create(
                    self.ctx.clone(),
                    CreateResourceRequest {
                        type_name: req.type_name.clone(),
                        planned_state,
                        config,
                        planned_private: req.planned_private,
                        provider_meta,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            (settle_unknowns(response.new_state), response.private)
        } else {
            tracing::debug!(type_name = %req.type_name, "ApplyResourceChange: update");
            let response = resource
                .update(
                    self.ctx.clone(),
                    UpdateResourceRequest {
                        type_name: req.type_name.clone(),
                        prior_state,
                        planned_state,
                        config,
                        planned_private: req.planned_private,
                        provider_meta,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            (settle_unknowns(response.new_state), response.private)
        };

        let new_state = or_respond!(
            encode_value(&schema.conform(&new_state)),
            proto::apply_resource_change::Response
        );

        Ok(Response::new(proto::apply_resource_change::Response {
            new_state: Some(new_state),
            private,
            diagnostics: diagnostics_to_proto(diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<proto::import_resource_state::Request>,
    ) -> RpcResult<proto::import_resource_state::Response> {
        let req = request.into_inner();

        tracing::debug!(type_name = %req.type_name, id = %req.id, "ImportResourceState");

        let mut diagnostics = vec![];
        let Some(resource) = self.configured_resource(&req.type_name, &mut diagnostics).await
        else {
            return Ok(Response::new(proto::import_resource_state::Response {
                diagnostics: diagnostics_to_proto(diagnostics),
                ..Default::default()
            }));
        };

        let Some(importer) = resource.as_import_state() else {
            diagnostics.push(Diagnostic::error(
                "Resource Import Not Implemented",
                format!("{} does not support import", req.type_name),
            ));
            return Ok(Response::new(proto::import_resource_state::Response {
                diagnostics: diagnostics_to_proto(diagnostics),
                ..Default::default()
            }));
        };

        let schema = self.resource_schema(resource.as_ref()).await;
        let response = importer
            .import_state(
                self.ctx.clone(),
                ImportResourceStateRequest {
                    type_name: req.type_name,
                    id: req.id,
                    client_capabilities: client_capabilities(req.client_capabilities),
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        let mut imported_resources = Vec::with_capacity(response.imported_resources.len());
        for imported in response.imported_resources {
            let state = or_respond!(
                encode_value(&schema.conform(&imported.state)),
                proto::import_resource_state::Response
            );
            imported_resources.push(proto::import_resource_state::ImportedResource {
                type_name: imported.type_name,
                state: Some(state),
                private: imported.private,
            });
        }

        Ok(Response::new(proto::import_resource_state::Response {
            imported_resources,
            diagnostics: diagnostics_to_proto(diagnostics),
            deferred: response.deferred.map(deferred_to_proto),
        }))
    }

    async fn move_resource_state(
        &self,
        request: Request<proto::move_resource_state::Request>,
    ) -> RpcResult<proto::move_resource_state::Response> {
        let req = request.into_inner();
        Ok(Response::new(proto::move_resource_state::Response {
            diagnostics: diagnostics_to_proto(vec![Diagnostic::error(
                "Move Resource State Not Supported",
                format!(
                    "Moving {} from {} is not supported",
                    req.target_type_name, req.source_type_name
                ),
            )]),
            ..Default::default()
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<proto::read_data_source::Request>,
    ) -> RpcResult<proto::read_data_source::Response> {
        let req = request.into_inner();
        let config = or_respond!(
            decode_value(&req.config, "data source configuration"),
            proto::read_data_source::Response
        );
        let provider_meta = or_respond!(
            decode_optional(&req.provider_meta),
            proto::read_data_source::Response
        );

        tracing::debug!(type_name = %req.type_name, "ReadDataSource");

        let mut diagnostics = vec![];
        let Some(data_source) = self
            .configured_data_source(&req.type_name, &mut diagnostics)
            .await
        else {
            return Ok(Response::new(proto::read_data_source::Response {
                diagnostics: diagnostics_to_proto(diagnostics),
                ..Default::default()
            }));
        };

        let schema = data_source
            .schema(self.ctx.clone(), DataSourceSchemaRequest)
            .await
            .schema;
        let response = data_source
            .read(
                self.ctx.clone(),
                ReadDataSourceRequest {
                    type_name: req.type_name,
                    config,
                    provider_meta,
                    client_capabilities: client_capabilities(req.client_capabilities),
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        let state = or_respond!(
            encode_value(&schema.conform(&response.state)),
            proto::read_data_source::Response
        );

        Ok(Response::new(proto::read_data_source::Response {
            state: Some(state),
            diagnostics: diagnostics_to_proto(diagnostics),
            deferred: response.deferred.map(deferred_to_proto),
        }))
    }

    async fn get_functions(
        &self,
        _request: Request<proto::get_functions::Request>,
    ) -> RpcResult<proto::get_functions::Response> {
        Ok(Response::new(proto::get_functions::Response {
            functions: HashMap::new(),
            diagnostics: vec![],
        }))
    }

    async fn call_function(
        &self,
        request: Request<proto::call_function::Request>,
    ) -> RpcResult<proto::call_function::Response> {
        let req = request.into_inner();
        Ok(Response::new(proto::call_function::Response {
            result: None,
            error: Some(proto::FunctionError {
                text: format!("Function not found: {}", req.name),
                function_argument: None,
            }),
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<proto::stop_provider::Request>,
    ) -> RpcResult<proto::stop_provider::Response> {
        tracing::info!("StopProvider: cancelling in-flight operations");
        self.ctx.cancel();

        let provider = self.provider.read().await;
        let response = provider.stop(self.ctx.clone(), StopProviderRequest).await;

        Ok(Response::new(proto::stop_provider::Response {
            error: response.error.unwrap_or_default(),
        }))
    }
}

fn decode_value(
    value: &Option<proto::DynamicValue>,
    what: &str,
) -> std::result::Result<DynamicValue, Diagnostic> {
    let Some(value) = value else {
        return Ok(DynamicValue::null());
    };
    let decoded = if !value.msgpack.is_empty() {
        DynamicValue::decode_msgpack(&value.msgpack)
    } else {
        DynamicValue::decode_json(&value.json)
    };
    decoded.map_err(|e| Diagnostic::error(format!("Failed to decode {}", what), e.to_string()))
}

fn decode_optional(
    value: &Option<proto::DynamicValue>,
) -> std::result::Result<Option<DynamicValue>, Diagnostic> {
    match value {
        Some(_) => decode_value(value, "provider_meta").map(Some),
        None => Ok(None),
    }
}

fn encode_value(value: &DynamicValue) -> std::result::Result<proto::DynamicValue, Diagnostic> {
    let msgpack = value
        .encode_msgpack()
        .map_err(|e| Diagnostic::error("Failed to encode state", e.to_string()))?;
    Ok(proto::DynamicValue {
        msgpack,
        json: vec![],
    })
}

/// Values left unknown after apply are invalid; Terraform reports them as
/// inconsistent results once they come back null
fn settle_unknowns(value: DynamicValue) -> DynamicValue {
    fn settle(value: Dynamic) -> Dynamic {
        match value {
            Dynamic::Unknown => Dynamic::Null,
            Dynamic::List(items) => Dynamic::List(items.into_iter().map(settle).collect()),
            Dynamic::Map(entries) => {
                Dynamic::Map(entries.into_iter().map(|(k, v)| (k, settle(v))).collect())
            }
            other => other,
        }
    }
    if value.value.contains_unknown() {
        tracing::warn!("apply result still contains unknown values, replacing with null");
    }
    DynamicValue::new(settle(value.value))
}

fn client_capabilities(caps: Option<proto::ClientCapabilities>) -> ClientCapabilities {
    caps.map(|c| ClientCapabilities {
        deferral_allowed: c.deferral_allowed,
        write_only_attributes_allowed: c.write_only_attributes_allowed,
    })
    .unwrap_or_default()
}

fn raw_state(raw: Option<proto::RawState>) -> RawState {
    match raw {
        Some(raw) => RawState {
            json: (!raw.json.is_empty()).then_some(raw.json),
            flatmap: (!raw.flatmap.is_empty()).then_some(raw.flatmap),
        },
        None => RawState::default(),
    }
}

fn deferred_to_proto(deferred: Deferred) -> proto::Deferred {
    let reason = match deferred.reason {
        DeferredReason::Unknown => proto::deferred::Reason::Unknown,
        DeferredReason::ResourceConfigUnknown => proto::deferred::Reason::ResourceConfigUnknown,
        DeferredReason::ProviderConfigUnknown => proto::deferred::Reason::ProviderConfigUnknown,
        DeferredReason::AbsentPrereq => proto::deferred::Reason::AbsentPrereq,
    };
    proto::Deferred {
        reason: reason as i32,
    }
}

pub(crate) fn path_to_proto(path: &AttributePath) -> proto::AttributePath {
    use proto::attribute_path::step::Selector;
    proto::AttributePath {
        steps: path
            .steps
            .iter()
            .map(|step| proto::attribute_path::Step {
                selector: Some(match step {
                    AttributePathStep::AttributeName(name) => Selector::AttributeName(name.clone()),
                    AttributePathStep::ElementKeyString(key) => {
                        Selector::ElementKeyString(key.clone())
                    }
                    AttributePathStep::ElementKeyInt(idx) => Selector::ElementKeyInt(*idx),
                }),
            })
            .collect(),
    }
}

pub(crate) fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| proto::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Invalid => proto::diagnostic::Severity::Invalid,
                DiagnosticSeverity::Error => proto::diagnostic::Severity::Error,
                DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning,
            } as i32,
            summary: d.summary,
            detail: d.detail,
            attribute: d.attribute.as_ref().map(path_to_proto),
        })
        .collect()
}

fn string_kind(kind: StringKind) -> i32 {
    match kind {
        StringKind::Plain => proto::StringKind::Plain as i32,
        StringKind::Markdown => proto::StringKind::Markdown as i32,
    }
}

pub(crate) fn schema_to_proto(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version,
        block: Some(block_to_proto(&schema.block)),
    }
}

fn block_to_proto(block: &Block) -> proto::schema::Block {
    use proto::schema::nested_block::NestingMode as ProtoNesting;
    proto::schema::Block {
        version: block.version,
        attributes: block.attributes.iter().map(attribute_to_proto).collect(),
        block_types: block
            .block_types
            .iter()
            .map(|nested| proto::schema::NestedBlock {
                type_name: nested.type_name.clone(),
                block: Some(block_to_proto(&nested.block)),
                nesting: match nested.nesting {
                    NestingMode::Invalid => ProtoNesting::Invalid,
                    NestingMode::Single => ProtoNesting::Single,
                    NestingMode::List => ProtoNesting::List,
                    NestingMode::Set => ProtoNesting::Set,
                    NestingMode::Map => ProtoNesting::Map,
                    NestingMode::Group => ProtoNesting::Group,
                } as i32,
                min_items: nested.min_items,
                max_items: nested.max_items,
            })
            .collect(),
        description: block.description.clone(),
        description_kind: string_kind(block.description_kind),
        deprecated: block.deprecated,
    }
}

fn attribute_to_proto(attr: &Attribute) -> proto::schema::Attribute {
    use proto::schema::object::NestingMode as ProtoNesting;
    let (r#type, nested_type) = match &attr.nested_type {
        Some(nested) => (
            Vec::new(),
            Some(proto::schema::Object {
                attributes: nested.attributes.iter().map(attribute_to_proto).collect(),
                nesting: match nested.nesting {
                    ObjectNestingMode::Invalid => ProtoNesting::Invalid,
                    ObjectNestingMode::Single => ProtoNesting::Single,
                    ObjectNestingMode::List => ProtoNesting::List,
                    ObjectNestingMode::Set => ProtoNesting::Set,
                    ObjectNestingMode::Map => ProtoNesting::Map,
                } as i32,
            }),
        ),
        None => (attr.r#type.to_bytes(), None),
    };

    proto::schema::Attribute {
        name: attr.name.clone(),
        r#type,
        nested_type,
        description: attr.description.clone(),
        required: attr.required,
        optional: attr.optional,
        computed: attr.computed,
        sensitive: attr.sensitive,
        description_kind: string_kind(StringKind::Plain),
        deprecated: attr.deprecated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeBuilder, AttributeType, NestedTypeBuilder, SchemaBuilder};

    #[test]
    fn nested_attributes_use_object_type() {
        let schema = SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("network_id", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "servers",
                    NestedTypeBuilder::list()
                        .attribute(
                            AttributeBuilder::new("host", AttributeType::String)
                                .required()
                                .build(),
                        )
                        .build(),
                )
                .optional()
                .build(),
            )
            .build();

        let proto_schema = schema_to_proto(&schema);
        let block = proto_schema.block.unwrap();
        assert_eq!(block.attributes[0].r#type, b"\"string\"".to_vec());
        assert!(block.attributes[1].r#type.is_empty());
        let nested = block.attributes[1].nested_type.as_ref().unwrap();
        assert_eq!(nested.nesting, proto::schema::object::NestingMode::List as i32);
        assert_eq!(nested.attributes[0].name, "host");
    }

    #[test]
    fn diagnostics_keep_attribute_paths() {
        let diags = diagnostics_to_proto(vec![Diagnostic::error("bad", "worse")
            .with_attribute(AttributePath::new("rules").index(0).attribute("policy"))]);

        assert_eq!(diags[0].severity, proto::diagnostic::Severity::Error as i32);
        let steps = &diags[0].attribute.as_ref().unwrap().steps;
        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps[1].selector,
            Some(proto::attribute_path::step::Selector::ElementKeyInt(0))
        );
    }

    #[test]
    fn undecodable_values_become_diagnostics() {
        let value = Some(proto::DynamicValue {
            msgpack: vec![0xc1],
            json: vec![],
        });
        let err = decode_value(&value, "prior state").unwrap_err();
        assert_eq!(err.summary, "Failed to decode prior state");
    }

    #[test]
    fn missing_values_decode_as_null() {
        assert!(decode_value(&None, "config").unwrap().is_null());
    }

    #[test]
    fn settle_unknowns_replaces_nested_unknowns() {
        let value = DynamicValue::new(Dynamic::List(vec![Dynamic::Unknown]));
        assert_eq!(
            settle_unknowns(value).value,
            Dynamic::List(vec![Dynamic::Null])
        );
    }
}
