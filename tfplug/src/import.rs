//! Import helpers for simplifying resource import implementations

use crate::context::Context;
use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Sets the import ID to a specific attribute in state
///
/// This is useful for simple resources where the import ID maps directly to
/// a single attribute in the resource state. The framework reads the
/// resource afterwards to fill in the rest.
///
/// Example: ID "N_1234" -> state.network_id = "N_1234"
pub fn import_state_passthrough_id(
    _ctx: &Context,
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    let mut state = DynamicValue::object();

    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        response.diagnostics.push(
            Diagnostic::error(
                format!("Failed to set import ID: {}", e),
                format!("Could not set attribute '{}' to value '{}'", attr_path, request.id),
            )
            .with_attribute(attr_path),
        );
        return;
    }

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
        private: Vec::new(),
    });
}

/// Splits a composite import ID such as "network_id/vlan_id" and writes each
/// part into the attribute of the same position
pub fn import_state_composite_id(
    _ctx: &Context,
    attributes: &[&str],
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    let parts: Vec<&str> = request.id.split('/').collect();
    if parts.len() != attributes.len() || parts.iter().any(|p| p.is_empty()) {
        response.diagnostics.push(Diagnostic::error(
            "Invalid import ID",
            format!(
                "Expected import ID in the format '{}', got '{}'",
                attributes.join("/"),
                request.id
            ),
        ));
        return;
    }

    let mut state = DynamicValue::object();
    for (attr, part) in attributes.iter().zip(parts) {
        let path = AttributePath::new(attr);
        if let Err(e) = state.set_string(&path, part.to_string()) {
            response.diagnostics.push(
                Diagnostic::error(format!("Failed to set import ID: {}", e), "")
                    .with_attribute(path),
            );
            return;
        }
    }

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
        private: Vec::new(),
    });
}
