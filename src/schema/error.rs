//! The Error API message schema
//! (`urn:ietf:params:scim:api:messages:2.0:Error`).

use crate::attrs::{Attribute, Returned};
use crate::issues::{ValidationError, ValidationIssues};
use crate::scim_data::ScimValue;

use super::{Schema, SchemaCore};

pub const ERROR_URI: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

fn validate_error_status(value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let Some(text) = value.as_str() else {
        return issues;
    };
    match text.parse::<i64>() {
        Err(_) => issues.add_error(ValidationError::bad_value_syntax(), false),
        Ok(status) => {
            if !(300..600).contains(&status) {
                issues.add_error(ValidationError::bad_error_status(), true);
            }
        }
    }
    issues
}

/// Schema of SCIM error bodies. Checks that `status` holds a numeric
/// value in the error range and that `scimType` is one of the error types
/// defined by RFC 7644.
#[derive(Debug, Clone)]
pub struct ErrorSchema {
    core: SchemaCore,
}

impl Default for ErrorSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorSchema {
    pub fn new() -> Self {
        Self {
            core: SchemaCore::new(
                ERROR_URI,
                vec![
                    Attribute::string("status")
                        .description("The HTTP status code expressed as a JSON string.")
                        .required(true)
                        .returned(Returned::Always)
                        .validator(validate_error_status),
                    Attribute::string("scimType")
                        .description("A SCIM detail error keyword.")
                        .canonical_values(&[
                            "invalidFilter",
                            "tooMany",
                            "uniqueness",
                            "mutability",
                            "invalidSyntax",
                            "invalidPath",
                            "noTarget",
                            "invalidValue",
                            "invalidVers",
                            "sensitive",
                        ])
                        .restrict_canonical_values(true)
                        .returned(Returned::Always),
                    Attribute::string("detail")
                        .description("A detailed human-readable message.")
                        .returned(Returned::Always),
                ],
                &[],
            ),
        }
    }
}

impl Schema for ErrorSchema {
    fn core(&self) -> &SchemaCore {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc;
    use crate::scim_data::ScimData;
    use serde_json::json;

    #[test]
    fn out_of_range_status_is_code_18() {
        let schema = ErrorSchema::new();
        let body = ScimData::from_json(&json!({
            "schemas": [ERROR_URI],
            "status": "200",
            "detail": "not actually an error",
        }))
        .unwrap();
        let issues = schema.validate(&body, None);
        assert_eq!(issues.error_codes_at(&loc!["status"]), vec![18]);
    }

    #[test]
    fn unknown_scim_type_is_code_9() {
        let schema = ErrorSchema::new();
        let body = ScimData::from_json(&json!({
            "schemas": [ERROR_URI],
            "status": "400",
            "scimType": "notAType",
        }))
        .unwrap();
        let issues = schema.validate(&body, None);
        assert_eq!(issues.error_codes_at(&loc!["scimType"]), vec![9]);
    }
}
