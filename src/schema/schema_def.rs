//! The Schema meta-schema (`urn:ietf:params:scim:schemas:core:2.0:Schema`),
//! served from the `/Schemas` endpoint.

use serde_json::{json, Value};

use crate::attrs::{Attribute, AttributeIssuer, Mutability};
use crate::issues::{ValidationError, ValidationIssues, ValidationWarning};
use crate::loc;
use crate::scim_data::ScimValue;

use super::{ResourceSchema, Schema, SchemaExtension};

pub const SCHEMA_DEFINITION_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:Schema";

fn validate_attribute_definitions(value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let Some(items) = value.as_array() else {
        return issues;
    };
    for (i, item) in items.iter().enumerate() {
        let Some(definition) = item.as_object() else {
            continue;
        };
        let attr_type = definition.get_key("type").and_then(ScimValue::as_str);
        if attr_type == Some("complex") {
            match definition.get_key("subAttributes") {
                None => issues.add_warning_at(loc![i, "subAttributes"], ValidationWarning::missing()),
                Some(sub) => {
                    issues.merge_at(loc![i, "subAttributes"], validate_attribute_definitions(sub));
                }
            }
        }
        if attr_type == Some("string") && definition.get_key("caseExact").is_none() {
            issues.add_error_at(loc![i, "caseExact"], ValidationError::missing(), false);
        }
    }
    issues
}

fn attribute_definitions() -> Attribute {
    Attribute::complex(
        "attributes",
        vec![
            Attribute::string("name")
                .description("The attribute's name.")
                .required(true)
                .mutability(Mutability::ReadOnly),
            Attribute::string("type")
                .description("The attribute's data type.")
                .required(true)
                .canonical_values(&[
                    "string",
                    "integer",
                    "boolean",
                    "decimal",
                    "dateTime",
                    "binary",
                    "reference",
                    "complex",
                ])
                .mutability(Mutability::ReadOnly),
            Attribute::unknown("subAttributes")
                .description("Used to define the sub-attributes of a complex attribute.")
                .mutability(Mutability::ReadOnly),
            Attribute::boolean("multiValued")
                .description("A Boolean value indicating an attribute's plurality.")
                .required(true)
                .mutability(Mutability::ReadOnly),
            Attribute::string("description")
                .description("A human-readable description of the attribute.")
                .mutability(Mutability::ReadOnly),
            Attribute::boolean("required")
                .description("A Boolean value indicating whether the attribute is required.")
                .required(true)
                .mutability(Mutability::ReadOnly),
            Attribute::unknown("canonicalValues")
                .description("A collection of suggested canonical values.")
                .multi_valued(true)
                .mutability(Mutability::ReadOnly),
            Attribute::boolean("caseExact")
                .description("A Boolean value specifying whether string comparison is case-exact.")
                .mutability(Mutability::ReadOnly),
            Attribute::string("mutability")
                .description("A single keyword indicating the circumstances under which the value may be (re)defined.")
                .canonical_values(&["readOnly", "readWrite", "immutable", "writeOnly"])
                .mutability(Mutability::ReadOnly),
            Attribute::string("returned")
                .description("A single keyword indicating when an attribute is returned in a response.")
                .canonical_values(&["always", "never", "default", "request"])
                .mutability(Mutability::ReadOnly),
            Attribute::string("uniqueness")
                .description("A single keyword indicating how the service provider enforces uniqueness.")
                .canonical_values(&["none", "server", "global"])
                .mutability(Mutability::ReadOnly),
            Attribute::string("referenceTypes")
                .description("A multi-valued array of JSON strings indicating the SCIM resource types that may be referenced.")
                .multi_valued(true)
                .mutability(Mutability::ReadOnly),
        ],
    )
    .multi_valued(true)
    .required(true)
    .mutability(Mutability::ReadOnly)
    .validator(validate_attribute_definitions)
    .description("A complex attribute that includes the attributes of a schema.")
}

/// Schema describing schema definitions themselves.
#[derive(Debug, Clone)]
pub struct SchemaDefinitionSchema {
    schema: ResourceSchema,
}

impl Default for SchemaDefinitionSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaDefinitionSchema {
    pub fn new() -> Self {
        let schema = ResourceSchema::builder(SCHEMA_DEFINITION_URI, "Schema")
            .plural_name("Schemas")
            .endpoint("/Schemas")
            .description("Specifies the schema that describes a SCIM schema")
            .attrs(vec![
                Attribute::string("name")
                    .description("The schema's human-readable name.")
                    .issuer(AttributeIssuer::ServiceProvider)
                    .mutability(Mutability::ReadOnly),
                Attribute::string("description")
                    .description("The schema's human-readable description.")
                    .issuer(AttributeIssuer::ServiceProvider)
                    .mutability(Mutability::ReadOnly),
                attribute_definitions(),
            ])
            .build()
            .expect("the built-in Schema definition schema is valid");
        Self { schema }
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Renders a resource schema the way the `/Schemas` endpoint returns
    /// it.
    pub fn get_repr(&self, resource: &ResourceSchema) -> Value {
        let attributes: Vec<Value> = resource
            .attrs()
            .core_attrs()
            .map(|(_, attr)| attr.to_json())
            .collect();
        json!({
            "schemas": [SCHEMA_DEFINITION_URI],
            "id": resource.uri().as_str(),
            "name": resource.name(),
            "description": resource.description(),
            "attributes": attributes,
            "meta": {
                "resourceType": "Schema",
                "location": format!("/Schemas/{}", resource.uri()),
            },
        })
    }

    /// Renders a schema extension the way the `/Schemas` endpoint returns
    /// it.
    pub fn get_extension_repr(&self, extension: &SchemaExtension) -> Value {
        let attributes: Vec<Value> =
            extension.attrs().iter().map(Attribute::to_json).collect();
        json!({
            "schemas": [SCHEMA_DEFINITION_URI],
            "id": extension.uri().as_str(),
            "name": extension.name(),
            "description": extension.description(),
            "attributes": attributes,
            "meta": {
                "resourceType": "Schema",
                "location": format!("/Schemas/{}", extension.uri()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::user_schema;
    use crate::scim_data::ScimData;

    #[test]
    fn user_schema_representation_is_valid() {
        let schemas = SchemaDefinitionSchema::new();
        let repr = schemas.get_repr(&user_schema());
        let data = ScimData::from_json(&repr).unwrap();
        let issues = schemas.schema().validate(&data, None);
        assert!(!issues.has_errors(), "{}", issues.to_json(true));
    }
}
