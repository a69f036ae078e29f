//! Resource traits and their request/response types
//!
//! A resource is created fresh by its factory for every gRPC call, configured
//! with the provider data, then asked to perform exactly one operation.
//! Optional capabilities (import, plan modification, state upgrades) are
//! discovered through the `as_*` accessors on [`Resource`].

use crate::context::Context;
use crate::schema::Schema;
use crate::types::{
    AttributePath, ClientCapabilities, Deferred, Diagnostic, DynamicValue, RawState,
};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// CRUD half of a managed resource
#[async_trait]
pub trait Resource: Send + Sync {
    /// Full type name including the provider prefix, e.g. "meraki_network".
    /// Must equal the key the provider registers the factory under.
    fn type_name(&self) -> &str;

    async fn metadata(
        &self,
        ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse;

    async fn schema(&self, ctx: Context, request: ResourceSchemaRequest) -> ResourceSchemaResponse;

    /// Cross-attribute checks; per-attribute validators run in the framework
    async fn validate(
        &self,
        ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse;

    /// new_state must carry every computed attribute as a known value
    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse;

    /// Returning `new_state: None` drops the resource from state
    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse;

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse;

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse;

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        None
    }

    fn as_modify_plan(&self) -> Option<&dyn ResourceWithModifyPlan> {
        None
    }

    fn as_upgrade_state(&self) -> Option<&dyn ResourceWithUpgradeState> {
        None
    }
}

pub struct ResourceMetadataRequest;

#[derive(Default)]
pub struct ResourceMetadataResponse {
    pub type_name: String,
}

pub struct ResourceSchemaRequest;

pub struct ResourceSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ValidateResourceConfigRequest {
    pub type_name: String,
    pub config: DynamicValue,
    pub client_capabilities: ClientCapabilities,
}

#[derive(Default)]
pub struct ValidateResourceConfigResponse {
    pub diagnostics: Vec<Diagnostic>,
}

pub struct CreateResourceRequest {
    pub type_name: String,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
    pub planned_private: Vec<u8>,
    pub provider_meta: Option<DynamicValue>,
}

#[derive(Default)]
pub struct CreateResourceResponse {
    pub new_state: DynamicValue,
    pub private: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CreateResourceResponse {
    /// A failed create leaves nothing in state unless the failure carries
    /// the state already reached; Terraform then records the object as
    /// tainted.
    pub fn from_result<E: Into<ApplyFailure>>(result: Result<DynamicValue, E>) -> Self {
        match result {
            Ok(new_state) => Self {
                new_state,
                ..Self::default()
            },
            Err(failure) => {
                let failure = failure.into();
                Self {
                    new_state: failure.reached.unwrap_or_else(DynamicValue::null),
                    diagnostics: vec![failure.diagnostic],
                    ..Self::default()
                }
            }
        }
    }
}

/// Create or update failure
///
/// `reached` is set when some remote calls already succeeded, so state can
/// follow what actually exists instead of the plan or the prior state.
#[derive(Debug)]
pub struct ApplyFailure {
    pub diagnostic: Diagnostic,
    pub reached: Option<DynamicValue>,
}

impl ApplyFailure {
    pub fn partial(diagnostic: Diagnostic, reached: DynamicValue) -> Self {
        Self {
            diagnostic,
            reached: Some(reached),
        }
    }
}

impl From<Diagnostic> for ApplyFailure {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostic,
            reached: None,
        }
    }
}

pub struct ReadResourceRequest {
    pub type_name: String,
    pub current_state: DynamicValue,
    pub private: Vec<u8>,
    pub provider_meta: Option<DynamicValue>,
    pub client_capabilities: ClientCapabilities,
}

#[derive(Default)]
pub struct ReadResourceResponse {
    pub new_state: Option<DynamicValue>,
    pub diagnostics: Vec<Diagnostic>,
    pub private: Vec<u8>,
    pub deferred: Option<Deferred>,
}

impl ReadResourceResponse {
    /// Ok(None) removes the resource; an error keeps the current state
    pub fn from_result(
        result: Result<Option<DynamicValue>, Diagnostic>,
        request: ReadResourceRequest,
    ) -> Self {
        match result {
            Ok(new_state) => Self {
                new_state,
                private: request.private,
                ..Self::default()
            },
            Err(diagnostic) => Self {
                new_state: Some(request.current_state),
                diagnostics: vec![diagnostic],
                private: request.private,
                deferred: None,
            },
        }
    }
}

pub struct UpdateResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
    pub planned_private: Vec<u8>,
    pub provider_meta: Option<DynamicValue>,
}

#[derive(Default)]
pub struct UpdateResourceResponse {
    pub new_state: DynamicValue,
    pub private: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

impl UpdateResourceResponse {
    /// A failed update keeps the prior state, or the reached state when
    /// the failure carries one
    pub fn from_result<E: Into<ApplyFailure>>(
        result: Result<DynamicValue, E>,
        prior_state: DynamicValue,
    ) -> Self {
        match result {
            Ok(new_state) => Self {
                new_state,
                ..Self::default()
            },
            Err(failure) => {
                let failure = failure.into();
                Self {
                    new_state: failure.reached.unwrap_or(prior_state),
                    diagnostics: vec![failure.diagnostic],
                    ..Self::default()
                }
            }
        }
    }
}

pub struct DeleteResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub planned_private: Vec<u8>,
    pub provider_meta: Option<DynamicValue>,
}

#[derive(Default)]
pub struct DeleteResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

impl DeleteResourceResponse {
    pub fn from_result(result: Result<(), Diagnostic>) -> Self {
        Self {
            diagnostics: result.err().into_iter().collect(),
        }
    }
}

/// Receives the provider data right after the factory builds the resource.
/// Every registered resource implements it.
#[async_trait]
pub trait ResourceWithConfigure: Resource {
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse;
}

pub struct ConfigureResourceRequest {
    /// `ConfigureProviderResponse::provider_data`; None before the provider
    /// is configured (validation runs first)
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

#[derive(Default)]
pub struct ConfigureResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Adjusts a plan after defaults, computed-unknown marking and attribute
/// plan modifiers have run
#[async_trait]
pub trait ResourceWithModifyPlan: Resource {
    async fn modify_plan(&self, ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse;
}

pub struct ModifyPlanRequest {
    pub type_name: String,
    pub config: DynamicValue,
    pub prior_state: DynamicValue,
    /// Plan produced by the framework so far
    pub proposed_new_state: DynamicValue,
    pub prior_private: Vec<u8>,
    pub provider_meta: Option<DynamicValue>,
}

#[derive(Default)]
pub struct ModifyPlanResponse {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub planned_private: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Migrates stored state written under an older schema version.
/// Without it, state from another version is rejected.
#[async_trait]
pub trait ResourceWithUpgradeState: Resource {
    async fn upgrade_state(
        &self,
        ctx: Context,
        request: UpgradeResourceStateRequest,
    ) -> UpgradeResourceStateResponse;
}

pub struct UpgradeResourceStateRequest {
    pub type_name: String,
    pub version: i64,
    pub raw_state: RawState,
}

#[derive(Default)]
pub struct UpgradeResourceStateResponse {
    pub upgraded_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

/// `terraform import`: turns an ID into enough state for a read to fill in
#[async_trait]
pub trait ResourceWithImportState: Resource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse;
}

pub struct ImportResourceStateRequest {
    pub type_name: String,
    pub id: String,
    pub client_capabilities: ClientCapabilities,
}

#[derive(Default)]
pub struct ImportResourceStateResponse {
    pub imported_resources: Vec<ImportedResource>,
    pub diagnostics: Vec<Diagnostic>,
    pub deferred: Option<Deferred>,
}

pub struct ImportedResource {
    pub type_name: String,
    pub state: DynamicValue,
    pub private: Vec<u8>,
}
