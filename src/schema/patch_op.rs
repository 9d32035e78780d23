//! The PatchOp API message schema
//! (`urn:ietf:params:scim:api:messages:2.0:PatchOp`).

use crate::attrs::{AttrType, Attribute, Mutability};
use crate::issues::{Location, ValidationError, ValidationIssues};
use crate::loc;
use crate::patch::{PatchOperations, PatchPath};
use crate::scim_data::{ScimData, ScimValue};

use super::{ResourceSchema, Schema, SchemaCore};

pub const PATCH_OP_URI: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

fn validate_operations(value: &ScimValue) -> ValidationIssues {
    match value.as_array() {
        Some(items) => PatchOperations::validate(items),
        None => ValidationIssues::new(),
    }
}

/// Schema of PATCH request bodies. Validates the operation envelopes and
/// the operation semantics against the targeted resource schema: unknown
/// modification targets (28), modification of read-only attributes (29),
/// and removal of required attributes (30).
#[derive(Debug, Clone)]
pub struct PatchOpSchema {
    core: SchemaCore,
    resource_schema: ResourceSchema,
}

impl PatchOpSchema {
    pub fn new(resource_schema: ResourceSchema) -> Self {
        Self {
            core: SchemaCore::new(
                PATCH_OP_URI,
                vec![Attribute::complex(
                    "Operations",
                    vec![
                        Attribute::string("op")
                            .required(true)
                            .canonical_values(&["add", "remove", "replace"])
                            .restrict_canonical_values(true),
                        Attribute::string("path"),
                        Attribute::unknown("value"),
                    ],
                )
                .required(true)
                .multi_valued(true)
                .validator(validate_operations)],
                &[],
            ),
            resource_schema,
        }
    }

    pub fn resource_schema(&self) -> &ResourceSchema {
        &self.resource_schema
    }

    fn validate_operation(&self, operation: &ScimData, location: Location) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let kind = operation
            .get_key("op")
            .and_then(ScimValue::as_str)
            .map(str::to_ascii_lowercase);
        let path = match operation.get_key("path").and_then(ScimValue::as_str) {
            Some(path_exp) => match PatchPath::parse(path_exp) {
                Ok(path) => Some(path),
                // envelope validation reported the syntax problem already
                Err(_) => return issues,
            },
            None => None,
        };
        let value = operation.get_key("value");

        match kind.as_deref() {
            Some("remove") => {
                if let Some(path) = &path {
                    issues.merge_at(
                        location.child("path"),
                        self.validate_remove_target(path),
                    );
                }
            }
            Some("add") | Some("replace") => {
                issues.merge_at(
                    location,
                    self.validate_modify_target(path.as_ref(), value),
                );
            }
            _ => {}
        }
        issues
    }

    fn validate_remove_target(&self, path: &PatchPath) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let attrs = self.resource_schema.attrs();
        let Some(target) = attrs.get_by_path(path) else {
            issues.add_error(ValidationError::unknown_modification_target(), false);
            return issues;
        };
        let parent = attrs
            .get(&path.attr_path().parent())
            .expect("parent of a resolved path exists");
        if target.get_mutability() == Mutability::ReadOnly
            || parent.get_mutability() == Mutability::ReadOnly
        {
            issues.add_error(ValidationError::attribute_cannot_be_modified(), true);
        }
        let removing_required = match path.sub_attr_name() {
            None => target.is_required(),
            Some(_) => target.is_required() && !target.is_multi_valued(),
        };
        if removing_required {
            issues.add_error(ValidationError::attribute_cannot_be_deleted(), true);
        }
        issues
    }

    fn validate_modify_target(
        &self,
        path: Option<&PatchPath>,
        value: Option<&ScimValue>,
    ) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let Some(value) = value else {
            // missing value was reported by the envelope validator
            return issues;
        };
        match path {
            None => issues.merge_at(loc!["value"], self.validate_root_value(value)),
            Some(path) => {
                let attrs = self.resource_schema.attrs();
                let Some(target) = attrs.get_by_path(path) else {
                    issues.add_error_at(
                        loc!["path"],
                        ValidationError::unknown_modification_target(),
                        false,
                    );
                    return issues;
                };
                let parent = attrs
                    .get(&path.attr_path().parent())
                    .expect("parent of a resolved path exists");
                if target.get_mutability() == Mutability::ReadOnly
                    || parent.get_mutability() == Mutability::ReadOnly
                {
                    issues.add_error_at(
                        loc!["value"],
                        ValidationError::attribute_cannot_be_modified(),
                        false,
                    );
                    return issues;
                }
                issues.merge_at(
                    loc!["value"],
                    self.validate_target_value(path, target, value),
                );
            }
        }
        issues
    }

    /// A path-less add or replace takes a partial resource object.
    fn validate_root_value(&self, value: &ScimValue) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let Some(data) = value.as_object() else {
            issues.add_error(ValidationError::bad_type("complex"), false);
            return issues;
        };
        for (rep, attr) in self.resource_schema.attrs().iter() {
            if *attr.name() == "schemas" {
                continue;
            }
            let Some(attr_value) = data.get_rep(&rep) else {
                continue;
            };
            let location = rep.location();
            if attr.get_mutability() == Mutability::ReadOnly {
                issues.add_error_at(
                    location,
                    ValidationError::attribute_cannot_be_modified(),
                    false,
                );
                continue;
            }
            let attr_issues = attr.validate(&attr_value);
            let value_valid = !attr_issues.has_errors();
            issues.merge_at(location.clone(), attr_issues);
            if value_valid {
                issues.merge_at(location, read_only_sub_attr_issues(attr, &attr_value));
            }
        }
        issues
    }

    fn validate_target_value(
        &self,
        path: &PatchPath,
        target: &Attribute,
        value: &ScimValue,
    ) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        // e.g. emails[value ew '.com'] with a single object updates the
        // matched elements, so the value is one element
        let updates_matched_elements =
            path.has_filter() && path.sub_attr_name().is_none() && value.as_array().is_none();
        let attr_issues = if updates_matched_elements {
            target.as_single().validate(value)
        } else {
            target.validate(value)
        };
        let value_valid = !attr_issues.has_errors();
        issues.merge(attr_issues);
        if value_valid && (updates_matched_elements || !target.is_multi_valued()) {
            issues.merge(read_only_sub_attr_issues(target, value));
        }
        issues
    }
}

fn read_only_sub_attr_issues(attr: &Attribute, value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    if attr.attr_type() != AttrType::Complex {
        return issues;
    }
    let mut check = |location: Location, element: &ScimData| {
        for sub_attr in attr.sub_attrs() {
            if sub_attr.get_mutability() == Mutability::ReadOnly
                && element.get_key(sub_attr.name().as_str()).is_some()
            {
                issues.add_error_at(
                    location.child(sub_attr.name().as_str()),
                    ValidationError::attribute_cannot_be_modified(),
                    false,
                );
            }
        }
    };
    match value {
        ScimValue::Object(element) => check(loc![], element),
        ScimValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if let Some(element) = item.as_object() {
                    check(loc![i], element);
                }
            }
        }
        _ => {}
    }
    issues
}

impl Schema for PatchOpSchema {
    fn core(&self) -> &SchemaCore {
        &self.core
    }

    fn validate_extra(&self, data: &ScimData) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let Some(ScimValue::Array(operations)) = data.get_key("Operations") else {
            return issues;
        };
        for (i, item) in operations.iter().enumerate() {
            if let Some(operation) = item.as_object() {
                issues.merge(self.validate_operation(operation, loc!["Operations", i]));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::user_schema;
    use serde_json::json;

    fn schema() -> PatchOpSchema {
        PatchOpSchema::new(user_schema())
    }

    fn body(operations: serde_json::Value) -> ScimData {
        ScimData::from_json(&json!({
            "schemas": [PATCH_OP_URI],
            "Operations": operations,
        }))
        .unwrap()
    }

    #[test]
    fn bad_path_and_missing_value_are_reported_together() {
        let issues = schema().validate(&body(json!([{"op": "replace", "path": "ims[ty"}])), None);
        assert_eq!(
            issues.error_codes_at(&loc!["Operations", 0, "path"]),
            vec![1],
        );
        assert_eq!(
            issues.error_codes_at(&loc!["Operations", 0, "value"]),
            vec![5],
        );
    }

    #[test]
    fn unknown_target_is_code_28() {
        let issues = schema().validate(
            &body(json!([{"op": "remove", "path": "shoeSize"}])),
            None,
        );
        assert_eq!(
            issues.error_codes_at(&loc!["Operations", 0, "path"]),
            vec![28],
        );
    }

    #[test]
    fn read_only_target_is_code_29() {
        let issues = schema().validate(
            &body(json!([{"op": "replace", "path": "groups", "value": []}])),
            None,
        );
        assert_eq!(
            issues.error_codes_at(&loc!["Operations", 0, "value"]),
            vec![29],
        );
    }

    #[test]
    fn removing_required_attribute_is_code_30() {
        let issues = schema().validate(
            &body(json!([{"op": "remove", "path": "userName"}])),
            None,
        );
        assert_eq!(
            issues.error_codes_at(&loc!["Operations", 0, "path"]),
            vec![30],
        );
    }

    #[test]
    fn unknown_op_is_code_9() {
        let issues = schema().validate(
            &body(json!([{"op": "merge", "path": "nickName", "value": "Bob"}])),
            None,
        );
        assert_eq!(
            issues.error_codes_at(&loc!["Operations", 0, "op"]),
            vec![9],
        );
    }

    #[test]
    fn read_only_sub_attribute_in_value_is_code_29() {
        let issues = schema().validate(
            &body(json!([{
                "op": "replace",
                "path": "name",
                "value": {"givenName": "Barbara"},
            }])),
            None,
        );
        assert!(issues.error_codes_at(&loc!["Operations", 0, "value"]).is_empty());

        let issues = schema().validate(
            &body(json!([{
                "op": "add",
                "value": {"meta": {"resourceType": "User"}},
            }])),
            None,
        );
        assert_eq!(
            issues.error_codes_at(&loc!["Operations", 0, "value", "meta"]),
            vec![29],
        );
    }
}
