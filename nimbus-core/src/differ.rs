//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the desired topology with the current state fetched from the
//! Provider and generates the list of required Effects. References must be
//! resolved (at least leniently) before diffing so declared values compare
//! against live ones.

use std::collections::HashMap;

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
    /// Resource exists but not in desired state -> needs deletion
    Delete(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes);

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        // Skip internal attributes (starting with _)
        if key.starts_with('_') {
            continue;
        }

        match current.get(key) {
            Some(current_value) if values_match(desired_value, current_value) => {}
            _ => changed.push(key.clone()),
        }
    }

    changed.sort();
    changed
}

/// Desired-subset comparison: map keys the topology does not declare are
/// provider defaults, not drift. Numbers compare across Int/Float because
/// the wire format does not preserve the distinction.
fn values_match(desired: &Value, current: &Value) -> bool {
    match (desired, current) {
        (Value::Map(d), Value::Map(c)) => d
            .iter()
            .all(|(k, dv)| c.get(k).is_some_and(|cv| values_match(dv, cv))),
        (Value::List(d), Value::List(c)) => {
            d.len() == c.len() && d.iter().zip(c).all(|(dv, cv)| values_match(dv, cv))
        }
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => *i as f64 == *f,
        _ => desired == current,
    }
}

/// Compute Diff for multiple resources and generate a Plan
pub fn create_plan(desired: &[Resource], current_states: &HashMap<ResourceId, State>) -> Plan {
    let mut plan = Plan::new();

    for resource in desired {
        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        match diff(resource, &current) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update { id, from, to, .. } => {
                plan.add(Effect::Update { id, from, to });
            }
            Diff::NoChange(_) => {}
            Diff::Delete(id) => plan.add(Effect::Delete(id)),
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_create_when_not_exists() {
        let desired = Resource::new("vpc", "main");
        let current = State::not_found(ResourceId::new("vpc", "main"));

        let result = diff(&desired, &current);
        assert!(matches!(result, Diff::Create(_)));
    }

    #[test]
    fn diff_no_change_when_same() {
        let desired =
            Resource::new("vpc", "main").with_attribute("cidr_block", Value::string("10.0.0.0/16"));

        let mut attrs = HashMap::new();
        attrs.insert("cidr_block".to_string(), Value::string("10.0.0.0/16"));
        let current = State::existing(ResourceId::new("vpc", "main"), attrs);

        let result = diff(&desired, &current);
        assert!(matches!(result, Diff::NoChange(_)));
    }

    #[test]
    fn diff_update_when_different() {
        let desired =
            Resource::new("vpc", "main").with_attribute("cidr_block", Value::string("10.1.0.0/16"));

        let mut attrs = HashMap::new();
        attrs.insert("cidr_block".to_string(), Value::string("10.0.0.0/16"));
        let current = State::existing(ResourceId::new("vpc", "main"), attrs);

        match diff(&desired, &current) {
            Diff::Update {
                changed_attributes, ..
            } => {
                assert_eq!(changed_attributes, vec!["cidr_block".to_string()]);
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn provider_defaults_are_not_drift() {
        let mut declared = HashMap::new();
        declared.insert("image_id".to_string(), Value::string("ami-0abc"));
        let desired = Resource::new("launch_template", "demo-launch-template")
            .with_attribute("launch_template_data", Value::Map(declared));

        // The provider reads back extra defaulted fields
        let mut observed = HashMap::new();
        observed.insert("image_id".to_string(), Value::string("ami-0abc"));
        observed.insert("ebs_optimized".to_string(), Value::Bool(false));
        let mut attrs = HashMap::new();
        attrs.insert("launch_template_data".to_string(), Value::Map(observed));
        let current = State::existing(
            ResourceId::new("launch_template", "demo-launch-template"),
            attrs,
        );

        assert!(matches!(diff(&desired, &current), Diff::NoChange(_)));
    }

    #[test]
    fn numbers_compare_across_int_and_float() {
        let desired =
            Resource::new("cloudwatch_alarm", "demo-cpu-high").with_attribute("threshold", Value::Float(80.0));

        let mut attrs = HashMap::new();
        attrs.insert("threshold".to_string(), Value::Int(80));
        let current = State::existing(ResourceId::new("cloudwatch_alarm", "demo-cpu-high"), attrs);

        assert!(matches!(diff(&desired, &current), Diff::NoChange(_)));
    }

    #[test]
    fn internal_attributes_are_ignored() {
        let desired = Resource::new("vpc", "main")
            .with_binding("vpc")
            .with_attribute("cidr_block", Value::string("10.0.0.0/16"));

        let mut attrs = HashMap::new();
        attrs.insert("cidr_block".to_string(), Value::string("10.0.0.0/16"));
        let current = State::existing(ResourceId::new("vpc", "main"), attrs);

        assert!(matches!(diff(&desired, &current), Diff::NoChange(_)));
    }

    #[test]
    fn create_plan_from_resources() {
        let resources = vec![
            Resource::new("vpc", "new-vpc"),
            Resource::new("subnet", "existing-subnet")
                .with_attribute("map_public_ip_on_launch", Value::Bool(true)),
        ];

        let mut current_states = HashMap::new();
        let mut attrs = HashMap::new();
        attrs.insert("map_public_ip_on_launch".to_string(), Value::Bool(false));
        current_states.insert(
            ResourceId::new("subnet", "existing-subnet"),
            State::existing(ResourceId::new("subnet", "existing-subnet"), attrs),
        );

        let plan = create_plan(&resources, &current_states);

        assert_eq!(plan.effects().len(), 2);
        assert!(matches!(plan.effects()[0], Effect::Create(_)));
        assert!(matches!(plan.effects()[1], Effect::Update { .. }));
    }
}
