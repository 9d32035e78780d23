//! The BulkRequest and BulkResponse API message schemas
//! (`urn:ietf:params:scim:api:messages:2.0:BulkRequest` / `BulkResponse`).

use crate::attrs::Attribute;
use crate::issues::{ValidationError, ValidationIssues};
use crate::loc;
use crate::scim_data::{ScimData, ScimValue};

use super::{Schema, SchemaCore};

pub const BULK_REQUEST_URI: &str = "urn:ietf:params:scim:api:messages:2.0:BulkRequest";
pub const BULK_RESPONSE_URI: &str = "urn:ietf:params:scim:api:messages:2.0:BulkResponse";

const METHODS: &[&str] = &["GET", "POST", "PATCH", "PUT", "DELETE"];

/// `/ResourceTypeEndpoint` with exactly one non-empty segment.
fn is_resource_type_path(path: &str) -> bool {
    match path.strip_prefix('/') {
        Some(rest) => !rest.is_empty() && !rest.contains('/'),
        None => false,
    }
}

/// `/ResourceTypeEndpoint/id`.
fn is_resource_object_path(path: &str) -> bool {
    match path.strip_prefix('/') {
        Some(rest) => match rest.split_once('/') {
            Some((endpoint, id)) => !endpoint.is_empty() && !id.is_empty(),
            None => false,
        },
        None => false,
    }
}

/// Endpoint of a resource type, extracted from an operation path.
pub(crate) fn resource_type_endpoint(method: &str, path: &str) -> Option<String> {
    if method.eq_ignore_ascii_case("POST") {
        return Some(path.to_owned());
    }
    let rest = path.strip_prefix('/')?;
    let endpoint = rest.split('/').next()?;
    Some(format!("/{endpoint}"))
}

fn validate_request_operations(value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let Some(items) = value.as_array() else {
        return issues;
    };
    for (i, item) in items.iter().enumerate() {
        let Some(operation) = item.as_object() else {
            continue;
        };
        let method = operation.get_key("method").and_then(ScimValue::as_str);
        if method.is_none() {
            issues.add_error_at(loc![i, "method"], ValidationError::missing(), false);
        }
        if method == Some("POST")
            && !operation
                .get_key("bulkId")
                .is_some_and(ScimValue::is_present)
        {
            issues.add_error_at(loc![i, "bulkId"], ValidationError::missing(), false);
        }
        match operation.get_key("path").and_then(ScimValue::as_str) {
            None => {
                issues.add_error_at(loc![i, "path"], ValidationError::missing(), false);
            }
            Some(path) => {
                let well_formed = match method {
                    Some("POST") => is_resource_type_path(path),
                    Some("GET") | Some("PATCH") | Some("PUT") | Some("DELETE") => {
                        is_resource_object_path(path)
                    }
                    _ => true,
                };
                if !well_formed {
                    issues.add_error_at(loc![i, "path"], ValidationError::bad_value_syntax(), false);
                }
            }
        }
        if matches!(method, Some("POST") | Some("PUT") | Some("PATCH"))
            && !operation.get_key("data").is_some_and(ScimValue::is_present)
        {
            issues.add_error_at(loc![i, "data"], ValidationError::missing(), false);
        }
    }
    issues
}

/// Schema of bulk request bodies. Beyond the envelope checks, it reports
/// operations whose path designates an unsupported resource type
/// (code 25).
#[derive(Debug, Clone)]
pub struct BulkRequestSchema {
    core: SchemaCore,
    endpoints: Vec<String>,
}

impl BulkRequestSchema {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            core: SchemaCore::new(
                BULK_REQUEST_URI,
                vec![
                    Attribute::integer("failOnErrors").description(
                        "The number of errors the service provider will accept before \
                         the operation is terminated.",
                    ),
                    Attribute::complex(
                        "Operations",
                        vec![
                            Attribute::string("method")
                                .required(true)
                                .canonical_values(METHODS)
                                .restrict_canonical_values(true),
                            Attribute::string("bulkId"),
                            Attribute::string("version"),
                            Attribute::string("path").required(true),
                            Attribute::unknown("data"),
                        ],
                    )
                    .required(true)
                    .multi_valued(true)
                    .validator(validate_request_operations),
                ],
                &[],
            ),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

impl Schema for BulkRequestSchema {
    fn core(&self) -> &SchemaCore {
        &self.core
    }

    fn validate_extra(&self, data: &ScimData) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let Some(ScimValue::Array(operations)) = data.get_key("Operations") else {
            return issues;
        };
        for (i, item) in operations.iter().enumerate() {
            let Some(operation) = item.as_object() else {
                continue;
            };
            let method = operation.get_key("method").and_then(ScimValue::as_str);
            let path = operation.get_key("path").and_then(ScimValue::as_str);
            let (Some(method), Some(path)) = (method, path) else {
                continue;
            };
            let known = resource_type_endpoint(method, path)
                .is_some_and(|endpoint| self.endpoints.iter().any(|known| *known == endpoint));
            if !known {
                issues.add_error_at(
                    loc!["Operations", i, "path"],
                    ValidationError::unknown_operation_resource(),
                    false,
                );
            }
        }
        issues
    }
}

fn validate_response_operations(value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let Some(items) = value.as_array() else {
        return issues;
    };
    for (i, item) in items.iter().enumerate() {
        let Some(operation) = item.as_object() else {
            continue;
        };
        let method = operation.get_key("method").and_then(ScimValue::as_str);
        if method.is_none() {
            issues.add_error_at(loc![i, "method"], ValidationError::missing(), false);
        }
        if method == Some("POST")
            && !operation
                .get_key("bulkId")
                .is_some_and(ScimValue::is_present)
        {
            issues.add_error_at(loc![i, "bulkId"], ValidationError::missing(), false);
        }
        let status = operation
            .get_key("status")
            .and_then(ScimValue::as_str)
            .and_then(|text| text.parse::<i64>().ok());
        match (method, status) {
            (Some(method), Some(status)) => {
                let location_present = operation
                    .get_key("location")
                    .is_some_and(ScimValue::is_present);
                if !location_present && (method != "POST" || status < 300) {
                    issues.add_error_at(loc![i, "location"], ValidationError::missing(), false);
                }
                let response_present = operation
                    .get_key("response")
                    .is_some_and(ScimValue::is_present);
                if !response_present && status >= 300 {
                    issues.add_error_at(loc![i, "response"], ValidationError::missing(), false);
                }
            }
            (_, None) => {
                if !operation.get_key("status").is_some_and(ScimValue::is_present) {
                    issues.add_error_at(loc![i, "status"], ValidationError::missing(), false);
                }
            }
            _ => {}
        }
    }
    issues
}

fn validate_status_syntax(value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    if let Some(text) = value.as_str() {
        if text.parse::<i64>().is_err() {
            issues.add_error(ValidationError::bad_value_syntax(), false);
        }
    }
    issues
}

/// Schema of bulk response bodies. Beyond the envelope checks, it reports
/// operations whose location points at an unsupported resource type
/// (code 25).
#[derive(Debug, Clone)]
pub struct BulkResponseSchema {
    core: SchemaCore,
    endpoints: Vec<String>,
}

impl BulkResponseSchema {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            core: SchemaCore::new(
                BULK_RESPONSE_URI,
                vec![Attribute::complex(
                    "Operations",
                    vec![
                        Attribute::string("method")
                            .required(true)
                            .canonical_values(METHODS)
                            .restrict_canonical_values(true),
                        Attribute::string("bulkId"),
                        Attribute::string("version"),
                        Attribute::external_reference("location"),
                        Attribute::string("status")
                            .required(true)
                            .validator(validate_status_syntax),
                        Attribute::unknown("response"),
                    ],
                )
                .required(true)
                .multi_valued(true)
                .validator(validate_response_operations)],
                &[],
            ),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

impl Schema for BulkResponseSchema {
    fn core(&self) -> &SchemaCore {
        &self.core
    }

    fn validate_extra(&self, data: &ScimData) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let Some(ScimValue::Array(operations)) = data.get_key("Operations") else {
            return issues;
        };
        for (i, item) in operations.iter().enumerate() {
            let Some(operation) = item.as_object() else {
                continue;
            };
            let Some(location) = operation.get_key("location").and_then(ScimValue::as_str)
            else {
                continue;
            };
            if !self
                .endpoints
                .iter()
                .any(|endpoint| location.contains(endpoint.as_str()))
            {
                issues.add_error_at(
                    loc!["Operations", i, "location"],
                    ValidationError::unknown_operation_resource(),
                    false,
                );
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: serde_json::Value) -> ScimData {
        ScimData::from_json(&value).unwrap()
    }

    #[test]
    fn post_operation_requires_bulk_id_and_data() {
        let schema = BulkRequestSchema::new(vec!["/Users".into()]);
        let body = data(json!({
            "schemas": [BULK_REQUEST_URI],
            "Operations": [{"method": "POST", "path": "/Users"}],
        }));
        let issues = schema.validate(&body, None);
        assert_eq!(
            issues.error_codes_at(&loc!["Operations", 0, "bulkId"]),
            vec![5],
        );
        assert_eq!(
            issues.error_codes_at(&loc!["Operations", 0, "data"]),
            vec![5],
        );
    }

    #[test]
    fn unknown_resource_endpoint_is_code_25() {
        let schema = BulkRequestSchema::new(vec!["/Users".into()]);
        let body = data(json!({
            "schemas": [BULK_REQUEST_URI],
            "Operations": [{
                "method": "PUT",
                "path": "/Widgets/3",
                "data": {"userName": "bjensen"},
            }],
        }));
        let issues = schema.validate(&body, None);
        assert_eq!(
            issues.error_codes_at(&loc!["Operations", 0, "path"]),
            vec![25],
        );
    }

    #[test]
    fn error_operation_requires_response_body() {
        let schema = BulkResponseSchema::new(vec!["/Users".into()]);
        let body = data(json!({
            "schemas": [BULK_RESPONSE_URI],
            "Operations": [{
                "method": "PUT",
                "location": "https://example.com/v2/Users/3",
                "status": "400",
            }],
        }));
        let issues = schema.validate(&body, None);
        assert_eq!(
            issues.error_codes_at(&loc!["Operations", 0, "response"]),
            vec![5],
        );
    }
}
