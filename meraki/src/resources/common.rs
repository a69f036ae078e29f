//! Helpers shared by every resource and data source

use crate::api::ApiError;
use crate::provider_data::MerakiProviderData;
use std::any::Any;
use std::sync::Arc;
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::value::{FromDynamic, Value};
use tfplug::TfplugError;

/// Stores provider data handed over by configure
///
/// Missing provider data is accepted here; Terraform validates resources
/// before the provider is configured. Operations report it instead.
pub(crate) fn configure(
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
    slot: &mut Option<MerakiProviderData>,
) -> Vec<Diagnostic> {
    let Some(data) = provider_data else {
        return vec![];
    };

    match data.downcast_ref::<MerakiProviderData>() {
        Some(provider_data) => {
            *slot = Some(provider_data.clone());
            vec![]
        }
        None => vec![Diagnostic::error(
            "Unexpected provider data type",
            "Expected MerakiProviderData; this is a bug in the provider",
        )],
    }
}

pub(crate) fn provider_data(
    slot: &Option<MerakiProviderData>,
) -> Result<&MerakiProviderData, Diagnostic> {
    slot.as_ref().ok_or_else(|| {
        Diagnostic::error(
            "Provider not configured",
            "Provider data was not properly configured",
        )
    })
}

/// Error diagnostic carrying the raw API status and body
pub(crate) fn api_error(summary: impl Into<String>, err: &ApiError) -> Diagnostic {
    Diagnostic::error(summary, format!("API error: {}", err))
}

pub(crate) fn invalid_value(what: &str, err: TfplugError) -> Diagnostic {
    Diagnostic::error(format!("Failed to read {}", what), err.to_string())
}

/// Typed read of a top-level attribute
pub(crate) fn attr<T: FromDynamic>(value: &DynamicValue, name: &str) -> tfplug::Result<Value<T>> {
    value.get(&AttributePath::new(name))
}

/// Value of an attribute the operation cannot proceed without
pub(crate) fn required<'a>(value: &'a Value<String>, name: &str) -> Result<&'a str, Diagnostic> {
    match value {
        Value::Known(v) if !v.is_empty() => Ok(v),
        _ => Err(Diagnostic::error(
            format!("Missing {}", name),
            format!("The '{}' attribute must be known", name),
        )
        .with_attribute(AttributePath::new(name))),
    }
}

/// Splits "a/b" import IDs
pub(crate) fn split_import_id<'a>(id: &'a str, format: &str) -> Result<(&'a str, &'a str), Diagnostic> {
    match id.split_once('/') {
        Some((a, b)) if !a.is_empty() && !b.is_empty() && !b.contains('/') => Ok((a, b)),
        _ => Err(Diagnostic::error(
            "Invalid import ID",
            format!("Expected import ID in the format '{}', got '{}'", format, id),
        )),
    }
}

/// API list as state: an empty list stays whatever the prior value was, so an
/// unset optional attribute does not flip between null and `[]`
pub(crate) fn list_like_prior<T>(prior: &Value<Vec<T>>, items: Vec<T>) -> Value<Vec<T>> {
    if items.is_empty() && !prior.is_known() {
        Value::Null
    } else {
        Value::Known(items)
    }
}

/// API string as state, with the same treatment for empty strings
pub(crate) fn string_like_prior(prior: &Value<String>, value: Option<String>) -> Value<String> {
    match value {
        Some(v) if !v.is_empty() => Value::Known(v),
        _ if prior.is_known() => Value::Known(String::new()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_tolerates_missing_provider_data() {
        let mut slot = None;
        assert!(configure(None, &mut slot).is_empty());
        assert!(slot.is_none());

        let err = provider_data(&slot).unwrap_err();
        assert_eq!(err.summary, "Provider not configured");
    }

    #[test]
    fn configure_rejects_foreign_provider_data() {
        let mut slot = None;
        let data = Arc::new(42u32) as Arc<dyn Any + Send + Sync>;
        let diagnostics = configure(Some(data), &mut slot);
        assert_eq!(diagnostics.len(), 1);
        assert!(slot.is_none());
    }

    #[test]
    fn api_errors_keep_status_and_body() {
        let err = ApiError::Status {
            status: 400,
            body: r#"{"errors":["Invalid subnet"]}"#.to_string(),
        };
        let diag = api_error("Failed to create VLAN", &err);
        assert!(diag.detail.contains("HTTP 400"));
        assert!(diag.detail.contains("Invalid subnet"));
    }

    #[test]
    fn import_ids_split_in_two() {
        assert_eq!(split_import_id("N_1/10", "network_id/vlan_id").unwrap(), ("N_1", "10"));
        for bad in ["N_1", "/10", "N_1/", "a/b/c"] {
            assert!(split_import_id(bad, "network_id/vlan_id").is_err(), "{}", bad);
        }
    }

    #[test]
    fn empty_api_values_follow_prior_state() {
        let none: Value<Vec<String>> = Value::Null;
        assert_eq!(list_like_prior(&none, vec![]), Value::Null);
        assert_eq!(
            list_like_prior(&Value::Known(vec![]), Vec::<String>::new()),
            Value::Known(vec![])
        );
        assert_eq!(
            list_like_prior(&none, vec!["a".to_string()]),
            Value::Known(vec!["a".to_string()])
        );

        assert_eq!(string_like_prior(&Value::Null, Some(String::new())), Value::Null);
        assert_eq!(
            string_like_prior(&Value::Known(String::new()), None),
            Value::Known(String::new())
        );
    }

    #[test]
    fn required_values_must_be_known() {
        assert_eq!(required(&Value::Known("N_1".to_string()), "network_id").unwrap(), "N_1");
        assert!(required(&Value::Unknown, "network_id").is_err());
        assert!(required(&Value::Known(String::new()), "network_id").is_err());
    }
}
