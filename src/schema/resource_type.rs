//! The ResourceType schema
//! (`urn:ietf:params:scim:schemas:core:2.0:ResourceType`), served from the
//! `/ResourceTypes` endpoint.

use serde_json::{json, Value};

use crate::attrs::{Attribute, AttributeIssuer, Mutability};

use super::{ResourceSchema, Schema};

pub const RESOURCE_TYPE_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:ResourceType";

/// Builds the ResourceType resource schema.
#[derive(Debug, Clone)]
pub struct ResourceTypeSchema {
    schema: ResourceSchema,
}

impl Default for ResourceTypeSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTypeSchema {
    pub fn new() -> Self {
        let schema = ResourceSchema::builder(RESOURCE_TYPE_URI, "ResourceType")
            .plural_name("ResourceTypes")
            .endpoint("/ResourceTypes")
            .description("Specifies the schema that describes a SCIM resource type")
            .attrs(vec![
                Attribute::string("name")
                    .description("The resource type name, e.g. 'User'.")
                    .required(true)
                    .issuer(AttributeIssuer::ServiceProvider)
                    .mutability(Mutability::ReadOnly),
                Attribute::string("description")
                    .description("The resource type's human-readable description.")
                    .issuer(AttributeIssuer::ServiceProvider)
                    .mutability(Mutability::ReadOnly),
                Attribute::uri_reference("endpoint")
                    .description("The resource type's HTTP-addressable endpoint relative to the base URL.")
                    .required(true)
                    .issuer(AttributeIssuer::ServiceProvider)
                    .mutability(Mutability::ReadOnly),
                Attribute::uri_reference("schema")
                    .description("The resource type's primary/base schema URI.")
                    .required(true)
                    .issuer(AttributeIssuer::ServiceProvider)
                    .mutability(Mutability::ReadOnly),
                Attribute::complex(
                    "schemaExtensions",
                    vec![
                        Attribute::uri_reference("schema")
                            .description("The URI of a schema extension.")
                            .required(true)
                            .mutability(Mutability::ReadOnly),
                        Attribute::boolean("required")
                            .description(
                                "Whether the schema extension is required for the resource type.",
                            )
                            .required(true)
                            .mutability(Mutability::ReadOnly),
                    ],
                )
                .multi_valued(true)
                .issuer(AttributeIssuer::ServiceProvider)
                .mutability(Mutability::ReadOnly)
                .description("A list of URIs of the resource type's schema extensions."),
            ])
            .build()
            .expect("the built-in ResourceType schema definition is valid");
        Self { schema }
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Renders the representation of a resource schema the way the
    /// `/ResourceTypes` endpoint returns it.
    pub fn get_repr(&self, resource: &ResourceSchema) -> Value {
        json!({
            "schemas": [RESOURCE_TYPE_URI],
            "id": resource.name(),
            "name": resource.name(),
            "endpoint": resource.endpoint(),
            "description": resource.description(),
            "schema": resource.uri().as_str(),
            "schemaExtensions": resource
                .extensions()
                .iter()
                .map(|extension| {
                    json!({
                        "schema": extension.uri().as_str(),
                        "required": extension.is_required(),
                    })
                })
                .collect::<Vec<_>>(),
            "meta": {
                "location": format!("/ResourceTypes/{}", resource.name()),
                "resourceType": "ResourceType",
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{enterprise_user_extension, user_schema};

    #[test]
    fn renders_resource_type_representation() {
        let resource_types = ResourceTypeSchema::new();
        let mut user = user_schema();
        user.extend(&enterprise_user_extension(), true).unwrap();
        let repr = resource_types.get_repr(&user);
        assert_eq!(repr["id"], "User");
        assert_eq!(repr["endpoint"], "/Users");
        assert_eq!(
            repr["schemaExtensions"][0]["schema"],
            "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User",
        );
        assert_eq!(repr["schemaExtensions"][0]["required"], true);
    }

    #[test]
    fn representation_passes_own_validation() {
        let resource_types = ResourceTypeSchema::new();
        let user = user_schema();
        let repr = resource_types.get_repr(&user);
        let data = crate::scim_data::ScimData::from_json(&repr).unwrap();
        assert!(!resource_types.schema().validate(&data, None).has_errors());
    }
}
