//! Generated protobuf types for the Terraform plugin protocol (v6)
//!
//! `build.rs` compiles `proto/tfplugin6.proto` with tonic-build. RPC
//! request/response pairs live in snake_case modules
//! (`read_resource::Request`), nested messages in sub-modules
//! (`diagnostic::Severity`).
//!
//! Several names collide with framework types (`DynamicValue`, `Diagnostic`,
//! `Schema`). Refer to these through `proto::` everywhere.

include!(concat!(env!("OUT_DIR"), "/tfplugin6.rs"));

pub use provider_server::{Provider as ProviderService, ProviderServer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_types_are_reachable() {
        let _ = diagnostic::Severity::Warning;
        let _ = attribute_path::step::Selector::ElementKeyInt(3);
        let _ = schema::object::NestingMode::List;
    }

    #[test]
    fn request_defaults_are_empty() {
        let req = plan_resource_change::Request::default();
        assert!(req.type_name.is_empty());
        assert!(req.prior_state.is_none());

        let resp = stop_provider::Response::default();
        assert!(resp.error.is_empty());
    }
}
