//! Bindings - resolve inter-resource references against live attributes
//!
//! Each declared resource carries a binding name; other resources refer to
//! its attributes with `Value::Ref(binding, attribute)`. The binding map is
//! seeded with declared attributes and enriched with observed state as
//! resources are read or created, so references resolve to real identifiers
//! in creation order.

use std::collections::HashMap;

use thiserror::Error;

use crate::resource::{Resource, State, Value};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("Unresolved reference {binding}.{attribute}")]
    Unresolved { binding: String, attribute: String },

    #[error("Reference {binding}.{attribute} is not a scalar value")]
    NotScalar { binding: String, attribute: String },

    #[error("Malformed placeholder '{0}': expected ${{binding.attribute}}")]
    MalformedPlaceholder(String),
}

#[derive(Debug, Clone, Default)]
pub struct BindingMap {
    entries: HashMap<String, HashMap<String, Value>>,
}

impl BindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the map with the declared attributes of every bound resource
    pub fn seed(&mut self, resources: &[Resource]) {
        for resource in resources {
            if let Some(binding) = resource.binding() {
                self.entries
                    .entry(binding.to_string())
                    .or_default()
                    .extend(resource.attributes.clone());
            }
        }
    }

    /// Merge observed state attributes into a binding, overwriting declared
    /// values with what the provider actually reported
    pub fn record_state(&mut self, binding: &str, state: &State) {
        let entry = self.entries.entry(binding.to_string()).or_default();
        for (key, value) in &state.attributes {
            entry.insert(key.clone(), value.clone());
        }
        if let Some(identifier) = &state.identifier {
            entry.insert("identifier".to_string(), Value::string(identifier));
        }
    }

    pub fn get(&self, binding: &str, attribute: &str) -> Option<&Value> {
        self.entries.get(binding).and_then(|attrs| attrs.get(attribute))
    }

    /// Resolve a value strictly: any reference that does not reach a concrete
    /// value is an error
    pub fn resolve(&self, value: &Value) -> Result<Value, BindingError> {
        match value {
            Value::Ref(binding, attribute) => {
                let target = self.get(binding, attribute).ok_or_else(|| {
                    BindingError::Unresolved {
                        binding: binding.clone(),
                        attribute: attribute.clone(),
                    }
                })?;
                // References can chain (declared attributes may themselves be refs)
                self.resolve(target)
            }
            Value::Template(text) => Ok(Value::String(self.resolve_template(text)?)),
            Value::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|v| self.resolve(v))
                    .collect::<Result<_, _>>()?,
            )),
            Value::Map(map) => {
                let mut resolved = HashMap::new();
                for (k, v) in map {
                    resolved.insert(k.clone(), self.resolve(v)?);
                }
                Ok(Value::Map(resolved))
            }
            other => Ok(other.clone()),
        }
    }

    /// Resolve a value leniently: unresolved references pass through
    /// unchanged. Used for previewing a plan before anything exists.
    pub fn resolve_lenient(&self, value: &Value) -> Value {
        match value {
            Value::Ref(binding, attribute) => match self.get(binding, attribute) {
                Some(target) if target != value => self.resolve_lenient(target),
                _ => value.clone(),
            },
            Value::Template(text) => match self.resolve_template(text) {
                Ok(resolved) => Value::String(resolved),
                Err(_) => value.clone(),
            },
            Value::List(items) => {
                Value::List(items.iter().map(|v| self.resolve_lenient(v)).collect())
            }
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve_lenient(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Resolve every attribute of a resource strictly
    pub fn resolve_resource(&self, resource: &Resource) -> Result<Resource, BindingError> {
        let mut resolved = resource.clone();
        for (key, value) in &resource.attributes {
            resolved.attributes.insert(key.clone(), self.resolve(value)?);
        }
        Ok(resolved)
    }

    /// Resolve every attribute of a resource leniently
    pub fn resolve_resource_lenient(&self, resource: &Resource) -> Resource {
        let mut resolved = resource.clone();
        for (key, value) in &resource.attributes {
            resolved
                .attributes
                .insert(key.clone(), self.resolve_lenient(value));
        }
        resolved
    }

    /// Interpolate `${binding.attribute}` placeholders in a template string
    fn resolve_template(&self, text: &str) -> Result<String, BindingError> {
        let mut output = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| BindingError::MalformedPlaceholder(rest[start..].to_string()))?;
            let placeholder = &after[..end];

            let (binding, attribute) = placeholder
                .split_once('.')
                .ok_or_else(|| BindingError::MalformedPlaceholder(placeholder.to_string()))?;

            let value = self.get(binding, attribute).ok_or_else(|| {
                BindingError::Unresolved {
                    binding: binding.to_string(),
                    attribute: attribute.to_string(),
                }
            })?;

            match self.resolve(value)? {
                Value::String(s) => output.push_str(&s),
                Value::Int(i) => output.push_str(&i.to_string()),
                Value::Float(f) => output.push_str(&f.to_string()),
                Value::Bool(b) => output.push_str(&b.to_string()),
                _ => {
                    return Err(BindingError::NotScalar {
                        binding: binding.to_string(),
                        attribute: attribute.to_string(),
                    });
                }
            }

            rest = &after[end + 1..];
        }

        output.push_str(rest);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceId;

    fn map_with_vpc() -> BindingMap {
        let mut bindings = BindingMap::new();
        let state = State::existing(
            ResourceId::new("vpc", "demo-vpc"),
            [("vpc_id".to_string(), Value::string("vpc-0abc"))].into(),
        )
        .with_identifier("vpc-0abc");
        bindings.record_state("vpc", &state);
        bindings
    }

    #[test]
    fn resolves_reference_from_state() {
        let bindings = map_with_vpc();
        let resolved = bindings.resolve(&Value::reference("vpc", "vpc_id")).unwrap();
        assert_eq!(resolved, Value::string("vpc-0abc"));
    }

    #[test]
    fn unresolved_reference_is_an_error() {
        let bindings = BindingMap::new();
        let err = bindings
            .resolve(&Value::reference("vpc", "vpc_id"))
            .unwrap_err();
        assert_eq!(
            err,
            BindingError::Unresolved {
                binding: "vpc".to_string(),
                attribute: "vpc_id".to_string(),
            }
        );
    }

    #[test]
    fn lenient_resolution_passes_unresolved_through() {
        let bindings = BindingMap::new();
        let value = Value::reference("vpc", "vpc_id");
        assert_eq!(bindings.resolve_lenient(&value), value);
    }

    #[test]
    fn resolves_nested_collections() {
        let bindings = map_with_vpc();
        let value = Value::List(vec![Value::reference("vpc", "vpc_id"), Value::Int(5)]);
        let resolved = bindings.resolve(&value).unwrap();
        assert_eq!(
            resolved,
            Value::List(vec![Value::string("vpc-0abc"), Value::Int(5)])
        );
    }

    #[test]
    fn seeds_declared_attributes() {
        let mut bindings = BindingMap::new();
        let resource = Resource::new("security_group", "demo-app-sg")
            .with_binding("app_sg")
            .with_attribute("group_name", Value::string("demo-app-sg"));
        bindings.seed(std::slice::from_ref(&resource));

        let resolved = bindings
            .resolve(&Value::reference("app_sg", "group_name"))
            .unwrap();
        assert_eq!(resolved, Value::string("demo-app-sg"));
    }

    #[test]
    fn interpolates_template_placeholders() {
        let mut bindings = map_with_vpc();
        let state = State::existing(
            ResourceId::new("db_instance", "demo-db"),
            [
                ("endpoint_address".to_string(), Value::string("demo.rds.local")),
                ("endpoint_port".to_string(), Value::Int(3306)),
            ]
            .into(),
        );
        bindings.record_state("db_instance", &state);

        let template = Value::Template(
            "DB_HOST=${db_instance.endpoint_address}\nDB_PORT=${db_instance.endpoint_port}\n"
                .to_string(),
        );
        let resolved = bindings.resolve(&template).unwrap();
        assert_eq!(
            resolved,
            Value::string("DB_HOST=demo.rds.local\nDB_PORT=3306\n")
        );
    }

    #[test]
    fn template_without_placeholders_is_untouched() {
        let bindings = BindingMap::new();
        let template = Value::Template("#!/bin/bash\necho ok\n".to_string());
        assert_eq!(
            bindings.resolve(&template).unwrap(),
            Value::string("#!/bin/bash\necho ok\n")
        );
    }

    #[test]
    fn malformed_placeholder_is_an_error() {
        let bindings = map_with_vpc();
        let err = bindings
            .resolve(&Value::Template("${vpc.vpc_id".to_string()))
            .unwrap_err();
        assert!(matches!(err, BindingError::MalformedPlaceholder(_)));

        let err = bindings
            .resolve(&Value::Template("${novalue}".to_string()))
            .unwrap_err();
        assert!(matches!(err, BindingError::MalformedPlaceholder(_)));
    }
}
