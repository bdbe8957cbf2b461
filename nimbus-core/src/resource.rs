//! Resource - declared resources and their observed state

use std::collections::HashMap;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "vpc", "subnet", "db_instance")
    pub resource_type: String,
    /// Logical resource name (stack-prefixed display name)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    /// Reference to another resource's attribute (binding name, attribute name).
    /// Resolved against live attributes at execution time.
    Ref(String, String),
    /// String with embedded `${binding.attribute}` placeholders, resolved at
    /// execution time. User-data scripts reference the database endpoint this
    /// way because the endpoint only exists once the instance is up.
    Template(String),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn reference(binding: impl Into<String>, attribute: impl Into<String>) -> Self {
        Value::Ref(binding.into(), attribute.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert to a plain JSON value. References and templates have no JSON
    /// form and yield `None`; resolve them first.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Int(i) => Some(serde_json::json!(i)),
            Value::Float(f) => Some(serde_json::json!(f)),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::List(items) => Some(serde_json::Value::Array(
                items.iter().filter_map(|v| v.to_json()).collect(),
            )),
            Value::Map(map) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in map {
                    if let Some(j) = v.to_json() {
                        obj.insert(k.clone(), j);
                    }
                }
                Some(serde_json::Value::Object(obj))
            }
            Value::Ref(_, _) | Value::Template(_) => None,
        }
    }

    /// Convert from a plain JSON value. JSON nulls have no attribute form.
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(Value::Float)
                }
            }
            serde_json::Value::Array(arr) => Some(Value::List(
                arr.iter().filter_map(Value::from_json).collect(),
            )),
            serde_json::Value::Object(obj) => {
                let mut map = HashMap::new();
                for (k, v) in obj {
                    if let Some(value) = Value::from_json(v) {
                        map.insert(k.clone(), value);
                    }
                }
                Some(Value::Map(map))
            }
            serde_json::Value::Null => None,
        }
    }
}

/// Attribute key that carries the binding name other resources refer to
pub const BINDING_ATTR: &str = "_binding";

/// Desired state of a single resource
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Set the binding name other resources use in `Value::Ref` to this one
    pub fn with_binding(self, binding: impl Into<String>) -> Self {
        self.with_attribute(BINDING_ATTR, Value::String(binding.into()))
    }

    pub fn binding(&self) -> Option<&str> {
        self.attributes.get(BINDING_ATTR).and_then(Value::as_str)
    }
}

/// Current state fetched from actual infrastructure
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// AWS identifier (e.g., vpc-xxx, subnet-xxx, an ARN)
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_round_trip() {
        let resource = Resource::new("vpc", "demo-vpc").with_binding("vpc");
        assert_eq!(resource.binding(), Some("vpc"));

        let unbound = Resource::new("vpc", "demo-vpc");
        assert_eq!(unbound.binding(), None);
    }

    #[test]
    fn value_json_round_trip() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::string("demo"));
        map.insert("count".to_string(), Value::Int(3));
        let value = Value::Map(map);

        let json = value.to_json().unwrap();
        assert_eq!(json["name"], "demo");
        assert_eq!(json["count"], 3);

        let back = Value::from_json(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn refs_have_no_json_form() {
        assert!(Value::reference("vpc", "vpc_id").to_json().is_none());
        assert!(Value::Template("${vpc.vpc_id}".to_string()).to_json().is_none());
    }

    #[test]
    fn float_from_json() {
        let json = serde_json::json!(72.5);
        assert_eq!(Value::from_json(&json), Some(Value::Float(72.5)));
    }
}
