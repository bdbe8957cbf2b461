//! Effect - side effects as values
//!
//! An Effect describes one mutation (or read) of real infrastructure.
//! Effects are inert data; nothing happens until an Interpreter executes
//! them through a Provider.

use crate::resource::{Resource, ResourceId, State};

#[derive(Debug, Clone)]
pub enum Effect {
    /// Read the current state of a resource
    Read(ResourceId),
    /// Create a resource that does not exist yet
    Create(Resource),
    /// Update an existing resource in place
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    /// Delete an existing resource
    Delete(ResourceId),
}

impl Effect {
    /// Whether executing this Effect changes infrastructure
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(id) => id,
            Effect::Create(resource) => &resource.id,
            Effect::Update { id, .. } => id,
            Effect::Delete(id) => id,
        }
    }
}
