//! Process-wide registry of schemas, resources, and default value
//! processors.
//!
//! The registry is populated while schemas are constructed, during library
//! initialization, and is only read afterwards. Validation code never
//! writes to it, so concurrent validation from many threads is safe.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::attrs::AttrType;
use crate::error::{ScimError, ScimResult};
use crate::scim_data::ScimValue;

/// Routine applied to a single attribute value during (de)serialization.
pub type ValueMapper = fn(&ScimValue) -> ScimValue;

#[derive(Default)]
struct Registry {
    /// Resource name -> endpoint, used by SCIM reference validation and
    /// bulk path resolution.
    resources: HashMap<String, String>,
    /// Lowercased schema URI -> whether the schema is an extension.
    schemas: HashMap<String, bool>,
    serializers: HashMap<AttrType, ValueMapper>,
    deserializers: HashMap<AttrType, ValueMapper>,
}

fn registry() -> &'static RwLock<Registry> {
    static REGISTRY: std::sync::OnceLock<RwLock<Registry>> = std::sync::OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(Registry::default()))
}

/// Registers a resource name with its endpoint. Registering the same name
/// with the same endpoint again is a no-op; a different endpoint is a usage
/// error.
pub fn register_resource(name: &str, endpoint: &str) -> ScimResult<()> {
    let mut guard = registry().write().expect("registry lock poisoned");
    match guard.resources.get(name) {
        Some(existing) if existing != endpoint => Err(ScimError::ConflictingResource {
            resource: name.to_owned(),
            endpoint: existing.clone(),
        }),
        _ => {
            guard.resources.insert(name.to_owned(), endpoint.to_owned());
            Ok(())
        }
    }
}

/// Registers a schema URI, marking whether it is an extension.
pub fn register_schema(uri: &str, extension: bool) {
    let mut guard = registry().write().expect("registry lock poisoned");
    guard.schemas.insert(uri.to_lowercase(), extension);
}

/// Returns whether the URI names a registered schema, and if so, whether it
/// is an extension.
pub fn schema_kind(uri: &str) -> Option<bool> {
    let guard = registry().read().expect("registry lock poisoned");
    guard.schemas.get(&uri.to_lowercase()).copied()
}

/// Snapshot of registered resources as `(name, endpoint)` pairs.
pub fn resources() -> Vec<(String, String)> {
    let guard = registry().read().expect("registry lock poisoned");
    let mut entries: Vec<_> = guard
        .resources
        .iter()
        .map(|(name, endpoint)| (name.clone(), endpoint.clone()))
        .collect();
    entries.sort();
    entries
}

/// Installs a process-wide serializer for all attributes of the given type.
/// Intended to be called once, during initialization, before any concurrent
/// validation starts.
pub fn set_default_serializer(attr_type: AttrType, mapper: ValueMapper) {
    let mut guard = registry().write().expect("registry lock poisoned");
    guard.serializers.insert(attr_type, mapper);
}

/// Installs a process-wide deserializer for all attributes of the given
/// type. Same initialization contract as [`set_default_serializer`].
pub fn set_default_deserializer(attr_type: AttrType, mapper: ValueMapper) {
    let mut guard = registry().write().expect("registry lock poisoned");
    guard.deserializers.insert(attr_type, mapper);
}

pub(crate) fn default_serializer(attr_type: AttrType) -> Option<ValueMapper> {
    let guard = registry().read().expect("registry lock poisoned");
    guard.serializers.get(&attr_type).copied()
}

pub(crate) fn default_deserializer(attr_type: AttrType) -> Option<ValueMapper> {
    let guard = registry().read().expect("registry lock poisoned");
    guard.deserializers.get(&attr_type).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_registration_is_idempotent() {
        register_resource("TestResource", "/TestResources").unwrap();
        register_resource("TestResource", "/TestResources").unwrap();
        assert!(register_resource("TestResource", "/Elsewhere").is_err());
    }

    #[test]
    fn schema_kind_is_case_insensitive() {
        register_schema("urn:test:REGISTRY:schema", false);
        assert_eq!(schema_kind("urn:test:registry:SCHEMA"), Some(false));
        assert_eq!(schema_kind("urn:test:registry:absent"), None);
    }
}
