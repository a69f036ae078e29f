//! tfplug: a small framework for Terraform providers speaking plugin protocol 6
//!
//! A provider implements [`Provider`] and hands out [`Resource`] and
//! [`DataSource`] factories. [`serve`] performs the go-plugin handshake and
//! runs the gRPC service that Terraform talks to.

pub mod context;
pub mod error;
pub mod schema;
pub mod types;
pub mod value;

pub mod data_source;
pub mod provider;
pub mod resource;

pub mod defaults;
pub mod import;
pub mod plan;
pub mod plan_modifier;
pub mod validator;

pub mod grpc;
pub mod proto;
pub mod server;

pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use grpc::GrpcProviderServer;
pub use import::{import_state_composite_id, import_state_passthrough_id};
pub use provider::Provider;
pub use resource::{Resource, ResourceWithConfigure, ResourceWithImportState};
pub use schema::{AttributeBuilder, AttributeType, NestedTypeBuilder, Schema, SchemaBuilder};
pub use server::{serve, LogLevel, ServerConfig};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
pub use value::{FromDynamic, IntoDynamic, ObjectBuilder, ObjectReader, Value};
