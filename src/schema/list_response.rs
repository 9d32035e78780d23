//! The ListResponse API message schema
//! (`urn:ietf:params:scim:api:messages:2.0:ListResponse`).

use crate::attrs::Attribute;
use crate::issues::{ValidationError, ValidationIssues};
use crate::loc;
use crate::presence::AttrValuePresenceConfig;
use crate::scim_data::{ScimData, ScimValue};

use super::{ResourceSchema, Schema, SchemaCore};

pub const LIST_RESPONSE_URI: &str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";

fn validate_resources_type(value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let Some(items) = value.as_array() else {
        return issues;
    };
    for (i, item) in items.iter().enumerate() {
        if item.as_object().is_none() {
            issues.add_error_at(loc![i], ValidationError::bad_type("complex"), true);
        }
    }
    issues
}

/// Schema of resource listings. Dispatches each entry of `Resources` to
/// the resource schema its `schemas` attribute declares, and checks
/// `itemsPerPage` consistency.
#[derive(Debug, Clone)]
pub struct ListResponseSchema {
    core: SchemaCore,
    resource_schemas: Vec<ResourceSchema>,
}

impl ListResponseSchema {
    pub fn new(resource_schemas: Vec<ResourceSchema>) -> Self {
        Self {
            core: SchemaCore::new(
                LIST_RESPONSE_URI,
                vec![
                    Attribute::integer("totalResults")
                        .description("The total number of results returned by the query.")
                        .required(true),
                    Attribute::integer("startIndex")
                        .description("The 1-based index of the first result in the current set."),
                    Attribute::integer("itemsPerPage")
                        .description("The number of query results returned in a query response page."),
                    Attribute::unknown("Resources")
                        .description("A multi-valued list of complex objects containing the requested resources.")
                        .multi_valued(true)
                        .validator(validate_resources_type),
                ],
                &[],
            ),
            resource_schemas,
        }
    }

    /// Resource schemas this listing can contain.
    pub fn supported_schemas(&self) -> &[ResourceSchema] {
        &self.resource_schemas
    }

    /// Resolves the schema of one listed resource through its `schemas`
    /// attribute. With a single supported schema every resource resolves
    /// to it.
    pub fn schema_for(&self, resource: &ScimData) -> Option<&ResourceSchema> {
        if self.resource_schemas.len() == 1 {
            return self.resource_schemas.first();
        }
        let declared = resource.get_key("schemas")?.as_array()?;
        self.resource_schemas.iter().find(|schema| {
            declared
                .iter()
                .any(|item| item.as_str().is_some_and(|text| *Schema::uri(*schema) == *text))
        })
    }

    /// Schemas for every entry of `Resources`; `None` marks entries whose
    /// schema is not supported by this listing.
    pub fn schemas_for(&self, resources: &[ScimValue]) -> Vec<Option<&ResourceSchema>> {
        resources
            .iter()
            .map(|item| item.as_object().and_then(|resource| self.schema_for(resource)))
            .collect()
    }

    /// Full listing validation: the envelope plus each resource validated
    /// against its own schema with the given presence configuration.
    pub fn validate_listing(
        &self,
        data: &ScimData,
        presence: Option<&AttrValuePresenceConfig>,
        resource_presence: Option<&AttrValuePresenceConfig>,
    ) -> ValidationIssues {
        let mut issues = self.validate(data, presence);
        let Some(ScimValue::Array(resources)) = data.get_key("Resources") else {
            return issues;
        };
        let default_presence = AttrValuePresenceConfig::response();
        let resource_presence = resource_presence.unwrap_or(&default_presence);
        for (i, item) in resources.iter().enumerate() {
            let Some(resource) = item.as_object() else {
                continue;
            };
            match self.schema_for(resource) {
                Some(schema) => {
                    issues.merge_at(
                        loc!["Resources", i],
                        schema.validate(resource, Some(resource_presence)),
                    );
                }
                None => {
                    issues.add_error_at(
                        loc!["Resources", i],
                        ValidationError::unknown_schema(),
                        false,
                    );
                }
            }
        }
        issues
    }

    fn process_resources(&self, data: ScimData, serializing: bool) -> ScimData {
        let mut data = data;
        let Some(ScimValue::Array(resources)) = data.get_key("Resources").cloned() else {
            return data;
        };
        let processed: Vec<ScimValue> = resources
            .iter()
            .map(|item| match item.as_object().and_then(|r| self.schema_for(r)) {
                Some(schema) => {
                    let resource = item.as_object().expect("schema resolved from an object");
                    if serializing {
                        ScimValue::Object(schema.serialize(resource))
                    } else {
                        ScimValue::Object(schema.deserialize(resource))
                    }
                }
                None => item.clone(),
            })
            .collect();
        data.insert_key("Resources", ScimValue::Array(processed));
        data
    }
}

impl Schema for ListResponseSchema {
    fn core(&self) -> &SchemaCore {
        &self.core
    }

    /// Checks that `itemsPerPage` matches the number of returned
    /// resources.
    fn validate_extra(&self, data: &ScimData) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let Some(ScimValue::Array(resources)) = data.get_key("Resources") else {
            return issues;
        };
        if let Some(items_per_page) = data.get_key("itemsPerPage").and_then(ScimValue::as_i64) {
            if items_per_page != resources.len() as i64 {
                issues.add_error_at(
                    loc!["itemsPerPage"],
                    ValidationError::must_be_equal_to("number of resources"),
                    true,
                );
                issues.add_error_at(
                    loc!["Resources"],
                    ValidationError::must_be_equal_to("'itemsPerPage'"),
                    true,
                );
            }
        }
        issues
    }

    fn post_serialize(&self, data: ScimData) -> ScimData {
        self.process_resources(data, true)
    }

    fn post_deserialize(&self, data: ScimData) -> ScimData {
        self.process_resources(data, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{group_schema, user_schema};
    use serde_json::json;

    fn data(value: serde_json::Value) -> ScimData {
        ScimData::from_json(&value).unwrap()
    }

    #[test]
    fn resources_are_validated_against_their_own_schema() {
        let schema = ListResponseSchema::new(vec![user_schema(), group_schema()]);
        let body = data(json!({
            "schemas": [LIST_RESPONSE_URI],
            "totalResults": 2,
            "itemsPerPage": 2,
            "Resources": [
                {
                    "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                    "id": 42,
                    "userName": "bjensen",
                    "meta": {"resourceType": "User"},
                },
                {
                    "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"],
                    "displayName": "Tour Guides",
                    "meta": {"resourceType": "Group"},
                },
            ],
        }));
        let issues = schema.validate_listing(&body, None, None);
        assert_eq!(issues.error_codes_at(&loc!["Resources", 0, "id"]), vec![2]);
        assert_eq!(issues.error_codes_at(&loc!["Resources", 1, "id"]), vec![5]);
    }

    #[test]
    fn items_per_page_mismatch_is_code_8() {
        let schema = ListResponseSchema::new(vec![user_schema()]);
        let body = data(json!({
            "schemas": [LIST_RESPONSE_URI],
            "totalResults": 1,
            "itemsPerPage": 3,
            "Resources": [],
        }));
        let issues = schema.validate(&body, None);
        assert_eq!(issues.error_codes_at(&loc!["itemsPerPage"]), vec![8]);
        assert_eq!(issues.error_codes_at(&loc!["Resources"]), vec![8]);
    }
}
