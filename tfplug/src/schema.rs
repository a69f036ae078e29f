//! Attribute types, schemas and their builders
//!
//! Schemas travel to Terraform through GetProviderSchema and also drive the
//! framework's own planning: validators, plan modifiers and defaults hang off
//! individual attributes.

use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Terraform's value types. Objects and tuples of mixed types only appear
/// as the implied type of nested attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
    List(Box<AttributeType>),               // Ordered, allows duplicates
    Set(Box<AttributeType>),                // Unordered, no duplicates
    Map(Box<AttributeType>),                // String keys only
    Object(HashMap<String, AttributeType>), // Fixed structure
}

impl AttributeType {
    pub fn list_of(elem: AttributeType) -> Self {
        AttributeType::List(Box::new(elem))
    }

    pub fn set_of(elem: AttributeType) -> Self {
        AttributeType::Set(Box::new(elem))
    }

    pub fn map_of(elem: AttributeType) -> Self {
        AttributeType::Map(Box::new(elem))
    }

    /// Terraform's JSON type syntax, e.g. `["list","string"]`
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            AttributeType::String => json!("string"),
            AttributeType::Number => json!("number"),
            AttributeType::Bool => json!("bool"),
            AttributeType::List(elem) => json!(["list", elem.to_json()]),
            AttributeType::Set(elem) => json!(["set", elem.to_json()]),
            AttributeType::Map(elem) => json!(["map", elem.to_json()]),
            AttributeType::Object(attrs) => {
                let fields: serde_json::Map<String, serde_json::Value> = attrs
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.to_json()))
                    .collect();
                json!(["object", fields])
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }

    /// Whether `value` has the shape of this type. Null and unknown match
    /// any type; unknown elements are accepted inside collections.
    pub fn matches(&self, value: &Dynamic) -> bool {
        match (self, value) {
            (_, Dynamic::Null) | (_, Dynamic::Unknown) => true,
            (AttributeType::String, Dynamic::String(_)) => true,
            (AttributeType::Number, Dynamic::Number(_)) => true,
            (AttributeType::Bool, Dynamic::Bool(_)) => true,
            (AttributeType::List(elem), Dynamic::List(items))
            | (AttributeType::Set(elem), Dynamic::List(items)) => {
                items.iter().all(|item| elem.matches(item))
            }
            (AttributeType::Map(elem), Dynamic::Map(entries)) => {
                entries.values().all(|v| elem.matches(v))
            }
            (AttributeType::Object(attrs), Dynamic::Map(entries)) => entries
                .iter()
                .all(|(k, v)| attrs.get(k).map(|ty| ty.matches(v)).unwrap_or(false)),
            _ => false,
        }
    }

    /// Reshapes `value` so every object carries exactly the declared fields
    pub fn conform(&self, value: &Dynamic) -> Dynamic {
        match (self, value) {
            (AttributeType::List(elem), Dynamic::List(items))
            | (AttributeType::Set(elem), Dynamic::List(items)) => {
                Dynamic::List(items.iter().map(|item| elem.conform(item)).collect())
            }
            (AttributeType::Map(elem), Dynamic::Map(entries)) => Dynamic::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), elem.conform(v)))
                    .collect(),
            ),
            (AttributeType::Object(attrs), Dynamic::Map(entries)) => Dynamic::Map(
                attrs
                    .iter()
                    .map(|(name, ty)| {
                        let v = entries.get(name).unwrap_or(&Dynamic::Null);
                        (name.clone(), ty.conform(v))
                    })
                    .collect(),
            ),
            (_, other) => other.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    /// Stored with the state; a mismatch routes through UpgradeResourceState
    pub version: i64,
    pub block: Block,
}

impl Schema {
    /// Conforms a full object value to this schema
    pub fn conform(&self, value: &DynamicValue) -> DynamicValue {
        DynamicValue::new(self.block.conform(&value.value))
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub version: i64,
    pub attributes: Vec<Attribute>,
    pub block_types: Vec<NestedBlock>,
    pub description: String,
    pub description_kind: StringKind,
    pub deprecated: bool,
}

impl Block {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Object type equivalent of this block
    pub fn object_type(&self) -> AttributeType {
        let mut fields: HashMap<String, AttributeType> = self
            .attributes
            .iter()
            .map(|a| (a.name.clone(), a.attribute_type()))
            .collect();
        for nested in &self.block_types {
            let inner = nested.block.object_type();
            let ty = match nested.nesting {
                NestingMode::Single | NestingMode::Group | NestingMode::Invalid => inner,
                NestingMode::List => AttributeType::list_of(inner),
                NestingMode::Set => AttributeType::set_of(inner),
                NestingMode::Map => AttributeType::map_of(inner),
            };
            fields.insert(nested.type_name.clone(), ty);
        }
        AttributeType::Object(fields)
    }

    /// Fills missing attributes with null and drops undeclared keys.
    /// Null and unknown objects pass through untouched.
    pub fn conform(&self, value: &Dynamic) -> Dynamic {
        let Dynamic::Map(entries) = value else {
            return value.clone();
        };

        let mut out = HashMap::with_capacity(self.attributes.len());
        for attr in &self.attributes {
            let v = entries.get(&attr.name).unwrap_or(&Dynamic::Null);
            out.insert(attr.name.clone(), attr.attribute_type().conform(v));
        }
        for nested in &self.block_types {
            let v = entries.get(&nested.type_name).unwrap_or(&Dynamic::Null);
            let conformed = match (nested.nesting, v) {
                (NestingMode::List, Dynamic::Null) | (NestingMode::Set, Dynamic::Null) => {
                    Dynamic::List(Vec::new())
                }
                (NestingMode::List, Dynamic::List(items))
                | (NestingMode::Set, Dynamic::List(items)) => {
                    Dynamic::List(items.iter().map(|i| nested.block.conform(i)).collect())
                }
                (NestingMode::Map, Dynamic::Map(items)) => Dynamic::Map(
                    items
                        .iter()
                        .map(|(k, i)| (k.clone(), nested.block.conform(i)))
                        .collect(),
                ),
                (_, other) => nested.block.conform(other),
            };
            out.insert(nested.type_name.clone(), conformed);
        }
        Dynamic::Map(out)
    }
}

#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub default: Option<Arc<dyn Default>>,
    pub nested_type: Option<NestedType>,
    pub deprecated: bool,
}

impl Attribute {
    /// Effective type, derived from the nested attributes when present
    pub fn attribute_type(&self) -> AttributeType {
        match &self.nested_type {
            Some(nested) => nested.attribute_type(),
            None => self.r#type.clone(),
        }
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .field(
                "plan_modifiers",
                &format!("{} plan modifiers", self.plan_modifiers.len()),
            )
            .field("default", &self.default.is_some())
            .field("nested_type", &self.nested_type)
            .finish()
    }
}

/// Block-syntax nesting (`rule { ... }`). Nested attributes are preferred.
#[derive(Debug, Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: i64,
    pub max_items: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NestingMode {
    Invalid,
    Single,
    List,
    Set,
    Map,
    Group,
}

/// Attributes of an object-typed attribute
#[derive(Debug, Clone)]
pub struct NestedType {
    pub attributes: Vec<Attribute>,
    pub nesting: ObjectNestingMode,
}

impl NestedType {
    pub fn object_type(&self) -> AttributeType {
        AttributeType::Object(
            self.attributes
                .iter()
                .map(|a| (a.name.clone(), a.attribute_type()))
                .collect(),
        )
    }

    pub fn attribute_type(&self) -> AttributeType {
        let object = self.object_type();
        match self.nesting {
            ObjectNestingMode::Single | ObjectNestingMode::Invalid => object,
            ObjectNestingMode::List => AttributeType::list_of(object),
            ObjectNestingMode::Set => AttributeType::set_of(object),
            ObjectNestingMode::Map => AttributeType::map_of(object),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectNestingMode {
    Invalid,
    Single,
    List,
    Set,
    Map,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StringKind {
    Plain,
    Markdown,
}

/// Checks a configured value during config validation. Values that are
/// still unknown are not passed in.
pub trait Validator: Send + Sync {
    fn description(&self) -> String;
    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse;
}

pub struct ValidatorRequest {
    pub config_value: DynamicValue,
    pub path: AttributePath,
}

#[derive(Default)]
pub struct ValidatorResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Adjusts one attribute of an update plan, or flags it for replacement
pub trait PlanModifier: Send + Sync {
    fn description(&self) -> String;
    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse;
}

pub struct PlanModifierRequest {
    pub config_value: DynamicValue,
    pub state_value: DynamicValue,
    pub plan_value: DynamicValue,
    pub path: AttributePath,
}

pub struct PlanModifierResponse {
    pub plan_value: DynamicValue,
    pub requires_replace: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Value planned for an attribute left null in configuration
pub trait Default: Send + Sync {
    fn description(&self) -> String;
    fn default_value(&self, request: DefaultRequest) -> DefaultResponse;
}

pub struct DefaultRequest {
    pub path: AttributePath,
}

pub struct DefaultResponse {
    pub value: DynamicValue,
}

pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
                default: None,
                nested_type: None,
                deprecated: false,
            },
        }
    }

    /// Attribute made of nested attributes
    pub fn nested(name: &str, nested: NestedType) -> Self {
        let ty = nested.attribute_type();
        Self::new(name, ty).nested_type(nested)
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    /// Clears `optional`; the two are exclusive
    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    /// Redacted from plan output
    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    /// Modifiers run in the order they are added
    pub fn plan_modifier(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.attribute.plan_modifiers.push(Arc::new(modifier));
        self
    }

    pub fn default(mut self, default: impl Default + 'static) -> Self {
        self.attribute.default = Some(Arc::new(default));
        self
    }

    pub fn nested_type(mut self, nested: NestedType) -> Self {
        self.attribute.nested_type = Some(nested);
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// Builds the nested attributes of an object-typed attribute
pub struct NestedTypeBuilder {
    nested: NestedType,
}

impl NestedTypeBuilder {
    pub fn new(nesting: ObjectNestingMode) -> Self {
        Self {
            nested: NestedType {
                attributes: Vec::new(),
                nesting,
            },
        }
    }

    pub fn single() -> Self {
        Self::new(ObjectNestingMode::Single)
    }

    pub fn list() -> Self {
        Self::new(ObjectNestingMode::List)
    }

    pub fn set() -> Self {
        Self::new(ObjectNestingMode::Set)
    }

    pub fn map() -> Self {
        Self::new(ObjectNestingMode::Map)
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.nested.attributes.push(attr);
        self
    }

    pub fn build(self) -> NestedType {
        self.nested
    }
}

pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block {
                    version: 0,
                    attributes: Vec::new(),
                    block_types: Vec::new(),
                    description: String::new(),
                    description_kind: StringKind::Plain,
                    deprecated: false,
                },
            },
        }
    }

    /// Also stamps the root block
    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self.schema.block.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.schema.block.block_types.push(block);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn description_kind(mut self, kind: StringKind) -> Self {
        self.schema.block.description_kind = kind;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.schema.block.deprecated = true;
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectBuilder;

    fn vlan_schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "reserved_ip_ranges",
                    NestedTypeBuilder::list()
                        .attribute(
                            AttributeBuilder::new("start", AttributeType::String)
                                .required()
                                .build(),
                        )
                        .attribute(
                            AttributeBuilder::new("comment", AttributeType::String)
                                .optional()
                                .build(),
                        )
                        .build(),
                )
                .optional()
                .build(),
            )
            .build()
    }

    #[test]
    fn attribute_builder_creates_required_string() {
        let attr = AttributeBuilder::new("name", AttributeType::String)
            .description("The name of the resource")
            .required()
            .build();

        assert_eq!(attr.name, "name");
        assert!(matches!(attr.r#type, AttributeType::String));
        assert!(attr.required);
        assert!(!attr.optional);
        assert_eq!(attr.description, "The name of the resource");
    }

    #[test]
    fn type_json_matches_terraform_syntax() {
        assert_eq!(AttributeType::String.to_bytes(), b"\"string\"".to_vec());
        assert_eq!(
            AttributeType::set_of(AttributeType::String).to_bytes(),
            br#"["set","string"]"#.to_vec()
        );

        let obj = AttributeType::Object(HashMap::from([(
            "port".to_string(),
            AttributeType::Number,
        )]));
        assert_eq!(obj.to_bytes(), br#"["object",{"port":"number"}]"#.to_vec());
    }

    #[test]
    fn nested_attribute_derives_its_type() {
        let schema = vlan_schema();
        let attr = schema.block.attribute("reserved_ip_ranges").unwrap();
        match attr.attribute_type() {
            AttributeType::List(inner) => match *inner {
                AttributeType::Object(fields) => {
                    assert_eq!(fields.len(), 2);
                    assert_eq!(fields.get("start"), Some(&AttributeType::String));
                }
                other => panic!("expected object, got {:?}", other),
            },
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn conform_fills_missing_and_drops_extra() {
        let schema = vlan_schema();
        let value = DynamicValue::new(
            ObjectBuilder::new()
                .set("name", "My VLAN")
                .set("bogus", true)
                .set(
                    "reserved_ip_ranges",
                    vec![ObjectBuilder::new().set("start", "10.0.0.2").build()],
                )
                .build(),
        );

        let conformed = schema.conform(&value);
        let map = conformed.value.as_map().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("id"), Some(&Dynamic::Null));
        assert!(!map.contains_key("bogus"));

        let ranges = map["reserved_ip_ranges"].as_list().unwrap();
        assert_eq!(ranges[0].attribute("comment"), Some(&Dynamic::Null));
    }

    #[test]
    fn conform_leaves_null_objects_alone() {
        let schema = vlan_schema();
        assert!(schema.conform(&DynamicValue::null()).is_null());
    }

    #[test]
    fn matches_rejects_wrong_primitive() {
        assert!(!AttributeType::Number.matches(&Dynamic::String("x".into())));
        assert!(AttributeType::Number.matches(&Dynamic::Unknown));
        assert!(AttributeType::list_of(AttributeType::String)
            .matches(&Dynamic::List(vec![Dynamic::String("a".into())])));
    }
}
