//! Plan-time defaults for optional attributes
//!
//! A default fills an attribute the configuration leaves null. Pair it with
//! `.optional().computed()`, otherwise Terraform rejects the planned value as
//! inconsistent with the configuration.

use crate::schema::{Default, DefaultRequest, DefaultResponse};
use crate::types::{Dynamic, DynamicValue};

/// A fixed value used whenever the attribute is unset
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn string(value: &str) -> Self {
        Self {
            value: Dynamic::String(value.to_string()),
        }
    }

    pub fn number(value: f64) -> Self {
        Self {
            value: Dynamic::Number(value),
        }
    }

    pub fn bool(value: bool) -> Self {
        Self {
            value: Dynamic::Bool(value),
        }
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        match &self.value {
            Dynamic::String(s) => format!("defaults to \"{}\"", s),
            Dynamic::Number(n) => format!("defaults to {}", n),
            Dynamic::Bool(b) => format!("defaults to {}", b),
            other => format!("defaults to {:?}", other),
        }
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: DynamicValue::new(self.value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributePath;

    fn value_of(default: StaticDefault) -> Dynamic {
        default
            .default_value(DefaultRequest {
                path: AttributePath::new("rules").index(0).attribute("src_port"),
            })
            .value
            .value
    }

    #[test]
    fn yields_configured_value() {
        assert_eq!(
            value_of(StaticDefault::string("Any")),
            Dynamic::String("Any".into())
        );
        assert_eq!(value_of(StaticDefault::bool(false)), Dynamic::Bool(false));
        assert_eq!(value_of(StaticDefault::number(1.0)), Dynamic::Number(1.0));
    }

    #[test]
    fn description_names_the_value() {
        assert_eq!(StaticDefault::string("Any").description(), "defaults to \"Any\"");
        assert_eq!(StaticDefault::bool(false).description(), "defaults to false");
    }
}
