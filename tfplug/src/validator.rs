//! Configuration validation
//!
//! `validate_config` walks a configuration against its schema (required
//! attributes, types, undeclared attributes) and runs the validators attached
//! to each attribute. Unknown values are skipped; they are checked again once
//! known.

use crate::schema::{
    Attribute, Block, ObjectNestingMode, Validator, ValidatorRequest, ValidatorResponse,
};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Validates a full configuration object against a schema block
pub fn validate_config(block: &Block, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    validate_object(
        &block.attributes,
        &config.value,
        &AttributePath::root(),
        &mut diagnostics,
    );
    diagnostics
}

fn validate_object(
    attributes: &[Attribute],
    value: &Dynamic,
    path: &AttributePath,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let entries = match value {
        Dynamic::Map(entries) => entries,
        Dynamic::Null | Dynamic::Unknown => return,
        other => {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid configuration",
                    format!("Expected an object, got {}", other.type_name()),
                )
                .with_attribute(path.clone()),
            );
            return;
        }
    };

    for key in entries.keys() {
        if !attributes.iter().any(|a| &a.name == key) {
            diagnostics.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named \"{}\" is not expected here.", key),
                )
                .with_attribute(path.clone().attribute(key)),
            );
        }
    }

    for attr in attributes {
        let attr_path = path.clone().attribute(&attr.name);
        let attr_value = entries.get(&attr.name).unwrap_or(&Dynamic::Null);
        validate_attribute(attr, attr_value, &attr_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: &Dynamic,
    path: &AttributePath,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        Dynamic::Null => {
            if attr.required {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!(
                            "The argument \"{}\" is required, but no definition was found.",
                            attr.name
                        ),
                    )
                    .with_attribute(path.clone()),
                );
            }
            return;
        }
        Dynamic::Unknown => return,
        _ => {}
    }

    if !attr.attribute_type().matches(value) {
        diagnostics.push(
            Diagnostic::error(
                "Incorrect attribute value type",
                format!(
                    "Inappropriate value for attribute \"{}\": got {}",
                    attr.name,
                    value.type_name()
                ),
            )
            .with_attribute(path.clone()),
        );
        return;
    }

    if let Some(nested) = &attr.nested_type {
        match (nested.nesting, value) {
            (ObjectNestingMode::List, Dynamic::List(items))
            | (ObjectNestingMode::Set, Dynamic::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = path.clone().index(i as i64);
                    validate_object(&nested.attributes, item, &item_path, diagnostics);
                }
            }
            (ObjectNestingMode::Map, Dynamic::Map(items)) => {
                for (k, item) in items {
                    validate_object(&nested.attributes, item, &path.clone().key(k), diagnostics);
                }
            }
            (_, other) => validate_object(&nested.attributes, other, path, diagnostics),
        }
    }

    if value.contains_unknown() {
        return;
    }

    for validator in &attr.validators {
        let response = validator.validate(ValidatorRequest {
            config_value: DynamicValue::new(value.clone()),
            path: path.clone(),
        });
        diagnostics.extend(response.diagnostics);
    }
}

fn error_at(path: &AttributePath, summary: String, detail: String) -> ValidatorResponse {
    ValidatorResponse {
        diagnostics: vec![Diagnostic::error(summary, detail).with_attribute(path.clone())],
    }
}

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLengthValidator {
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        format!("string length must be between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(s) = request.config_value.value.as_str() else {
            return ValidatorResponse::default();
        };
        let len = s.chars().count();
        if let Some(min) = self.min {
            if len < min {
                return error_at(
                    &request.path,
                    format!("{} must have minimum length of {}", request.path, min),
                    format!("Got length {}", len),
                );
            }
        }
        if let Some(max) = self.max {
            if len > max {
                return error_at(
                    &request.path,
                    format!("{} must have maximum length of {}", request.path, max),
                    format!("Got length {}", len),
                );
            }
        }
        ValidatorResponse::default()
    }
}

/// Accepts only the listed strings
pub struct StringOneOfValidator {
    pub values: Vec<String>,
}

impl StringOneOfValidator {
    pub fn new(values: &[&str]) -> Self {
        Self {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl Validator for StringOneOfValidator {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.values.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        match request.config_value.value.as_str() {
            Some(s) if !self.values.iter().any(|v| v == s) => error_at(
                &request.path,
                format!("Invalid value for {}", request.path),
                format!("Value '{}' must be one of: {}", s, self.values.join(", ")),
            ),
            _ => ValidatorResponse::default(),
        }
    }
}

pub struct StringPatternValidator {
    pub pattern: regex::Regex,
    pub description: String,
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        format!("value must match {}", self.description)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        match request.config_value.value.as_str() {
            Some(s) if !self.pattern.is_match(s) => error_at(
                &request.path,
                format!("{} must match {}", request.path, self.description),
                format!("Value '{}' does not match pattern", s),
            ),
            _ => ValidatorResponse::default(),
        }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRangeValidator {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        format!("value must be between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(n) = request.config_value.value.as_number() else {
            return ValidatorResponse::default();
        };
        if let Some(min) = self.min {
            if n < min {
                return error_at(
                    &request.path,
                    format!("{} must be at least {}", request.path, min),
                    format!("Got {}", n),
                );
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return error_at(
                    &request.path,
                    format!("{} must be at most {}", request.path, max),
                    format!("Got {}", n),
                );
            }
        }
        ValidatorResponse::default()
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn description(&self) -> String {
        format!("list length must be between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(items) = request.config_value.value.as_list() else {
            return ValidatorResponse::default();
        };
        if let Some(min) = self.min {
            if items.len() < min {
                return error_at(
                    &request.path,
                    format!("{} must have at least {} items", request.path, min),
                    format!("Got {} items", items.len()),
                );
            }
        }
        if let Some(max) = self.max {
            if items.len() > max {
                return error_at(
                    &request.path,
                    format!("{} must have at most {} items", request.path, max),
                    format!("Got {} items", items.len()),
                );
            }
        }
        ValidatorResponse::default()
    }
}
