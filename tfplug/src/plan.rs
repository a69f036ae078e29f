//! Framework planning for managed resources
//!
//! Given the prior state, Terraform's proposed new state and the raw config,
//! produce the planned state:
//! 1. Destroy (proposed null) plans null.
//! 2. Defaults fill attributes whose config is null.
//! 3. On create, or when the plan differs from prior state, computed
//!    attributes without config become unknown.
//! 4. Attribute plan modifiers run in declaration order and collect
//!    requires-replace paths.

use crate::schema::{
    Attribute, DefaultRequest, NestedType, ObjectNestingMode, PlanModifierRequest, Schema,
};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Output of framework planning
#[derive(Debug)]
pub struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn plan_resource_change(
    schema: &Schema,
    prior_state: &DynamicValue,
    proposed_new_state: &DynamicValue,
    config: &DynamicValue,
) -> PlannedChange {
    if proposed_new_state.is_null() {
        return PlannedChange {
            planned_state: DynamicValue::null(),
            requires_replace: vec![],
            diagnostics: vec![],
        };
    }

    let attributes = &schema.block.attributes;
    let mut planned = proposed_new_state.value.clone();

    apply_defaults(attributes, &config.value, &mut planned, &AttributePath::root());

    if prior_state.is_null() || planned != prior_state.value {
        mark_computed_unknown(attributes, &config.value, &mut planned);
    } else {
        planned = prior_state.value.clone();
    }

    let mut planned_state = DynamicValue::new(planned);
    let mut requires_replace = vec![];
    let mut diagnostics = vec![];

    for attr in attributes {
        if attr.plan_modifiers.is_empty() {
            continue;
        }
        let path = AttributePath::new(&attr.name);
        for modifier in &attr.plan_modifiers {
            let response = modifier.modify(PlanModifierRequest {
                config_value: attribute_value(config, &attr.name),
                state_value: attribute_value(prior_state, &attr.name),
                plan_value: attribute_value(&planned_state, &attr.name),
                path: path.clone(),
            });
            diagnostics.extend(response.diagnostics);
            if response.requires_replace && !requires_replace.contains(&path) {
                requires_replace.push(path.clone());
            }
            if let Err(e) = planned_state.set_value(&path, response.plan_value.value) {
                diagnostics.push(Diagnostic::from(e).with_attribute(path.clone()));
            }
        }
    }

    PlannedChange {
        planned_state,
        requires_replace,
        diagnostics,
    }
}

fn attribute_value(value: &DynamicValue, name: &str) -> DynamicValue {
    DynamicValue::new(value.value.attribute(name).cloned().unwrap_or(Dynamic::Null))
}

fn apply_defaults(
    attributes: &[Attribute],
    config: &Dynamic,
    planned: &mut Dynamic,
    path: &AttributePath,
) {
    let Dynamic::Map(entries) = planned else {
        return;
    };

    for attr in attributes {
        let config_value = config.attribute(&attr.name).unwrap_or(&Dynamic::Null);
        let attr_path = path.clone().attribute(&attr.name);

        if config_value.is_null() {
            if let Some(default) = &attr.default {
                let response = default.default_value(DefaultRequest {
                    path: attr_path.clone(),
                });
                entries.insert(attr.name.clone(), response.value.value);
            }
            continue;
        }

        if let (Some(nested), Some(planned_value)) =
            (&attr.nested_type, entries.get_mut(&attr.name))
        {
            for_each_nested_object(
                nested,
                config_value,
                planned_value,
                &attr_path,
                &mut |a, c, p, pa| apply_defaults(a, c, p, pa),
            );
        }
    }
}

fn mark_computed_unknown(attributes: &[Attribute], config: &Dynamic, planned: &mut Dynamic) {
    let Dynamic::Map(entries) = planned else {
        return;
    };

    for attr in attributes {
        let config_value = config.attribute(&attr.name).unwrap_or(&Dynamic::Null);

        if config_value.is_null() {
            if attr.computed && attr.default.is_none() {
                entries.insert(attr.name.clone(), Dynamic::Unknown);
            }
            continue;
        }

        if let (Some(nested), Some(planned_value)) =
            (&attr.nested_type, entries.get_mut(&attr.name))
        {
            let path = AttributePath::new(&attr.name);
            for_each_nested_object(
                nested,
                config_value,
                planned_value,
                &path,
                &mut |a, c, p, _| mark_computed_unknown(a, c, p),
            );
        }
    }
}

/// Visits each nested object, pairing config objects with planned objects
fn for_each_nested_object<F>(
    nested: &NestedType,
    config: &Dynamic,
    planned: &mut Dynamic,
    path: &AttributePath,
    visit: &mut F,
) where
    F: FnMut(&[Attribute], &Dynamic, &mut Dynamic, &AttributePath),
{
    match (nested.nesting, config, planned) {
        (ObjectNestingMode::List, Dynamic::List(configs), Dynamic::List(plans))
        | (ObjectNestingMode::Set, Dynamic::List(configs), Dynamic::List(plans)) => {
            for (i, (c, p)) in configs.iter().zip(plans.iter_mut()).enumerate() {
                visit(&nested.attributes, c, p, &path.clone().index(i as i64));
            }
        }
        (ObjectNestingMode::Map, Dynamic::Map(configs), Dynamic::Map(plans)) => {
            for (key, p) in plans.iter_mut() {
                if let Some(c) = configs.get(key) {
                    visit(&nested.attributes, c, p, &path.clone().key(key));
                }
            }
        }
        (ObjectNestingMode::Single, c, p) => visit(&nested.attributes, c, p, path),
        _ => {}
    }
}
