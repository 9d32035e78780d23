//! Schema extensions and extension-aware data addressing.

use scim_validator::schema::{
    enterprise_user_extension, user_schema, Schema, ENTERPRISE_USER_URI, USER_URI,
};
use scim_validator::{loc, AttrValuePresenceConfig, BoundedAttrRep, ScimData, ScimValue};
use serde_json::json;

fn extended_user() -> scim_validator::ResourceSchema {
    let mut schema = user_schema();
    schema.extend(&enterprise_user_extension(), false).unwrap();
    schema
}

#[test]
fn extension_attributes_are_resolvable_and_validated() {
    let schema = extended_user();
    let body = ScimData::from_json(&json!({
        "schemas": [USER_URI, ENTERPRISE_USER_URI],
        "userName": "bjensen",
        "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {
            "employeeNumber": 701984,
        },
    }))
    .unwrap();
    let issues = schema.validate(&body, None);
    assert_eq!(
        issues.error_codes_at(&loc![ENTERPRISE_USER_URI, "employeeNumber"]),
        vec![2],
    );
}

#[test]
fn flat_write_through_bounded_rep_nests_under_uri() {
    let _schema = extended_user();
    let rep = BoundedAttrRep::new(ENTERPRISE_USER_URI, "employeeNumber").unwrap();
    let mut data = ScimData::new();
    data.set_rep(&rep, "701984").unwrap();
    assert_eq!(
        data.to_json(),
        json!({ENTERPRISE_USER_URI: {"employeeNumber": "701984"}}),
    );
}

#[test]
fn uri_prefixed_string_paths_reach_extension_data() {
    let _schema = extended_user();
    let data = ScimData::from_json(&json!({
        ENTERPRISE_USER_URI: {"manager": {"value": "26118915"}},
    }))
    .unwrap();
    assert_eq!(
        data.get(&format!("{ENTERPRISE_USER_URI}:manager.value")),
        Some(ScimValue::from("26118915")),
    );
}

#[test]
fn validation_codes_are_order_independent() {
    let schema = extended_user();
    let a = ScimData::from_json(&json!({
        "schemas": [USER_URI],
        "id": 42,
        "userName": 13,
        "nickName": true,
    }))
    .unwrap();
    let b = ScimData::from_json(&json!({
        "nickName": true,
        "userName": 13,
        "id": 42,
        "schemas": [USER_URI],
    }))
    .unwrap();
    let issues_a = schema.validate(&a, None);
    let issues_b = schema.validate(&b, None);
    let codes = |issues: &scim_validator::ValidationIssues| {
        let mut codes: Vec<(String, Vec<u16>)> = [
            loc!["id"],
            loc!["userName"],
            loc!["nickName"],
        ]
        .iter()
        .map(|location| (location.to_string(), issues.error_codes_at(location)))
        .collect();
        codes.sort();
        codes
    };
    assert_eq!(codes(&issues_a), codes(&issues_b));
}

#[test]
fn required_extension_attrs_not_enforced_when_extension_undeclared() {
    let mut schema = user_schema();
    let extension = scim_validator::SchemaExtension::new(
        "urn:test:ext:required:Strict",
        "Strict",
        vec![scim_validator::attrs::Attribute::string("badge").required(true)],
    )
    .unwrap();
    schema.extend(&extension, false).unwrap();
    let body = ScimData::from_json(&json!({
        "schemas": [USER_URI],
        "userName": "bjensen",
        "id": "1",
    }))
    .unwrap();
    let issues = schema.validate(&body, Some(&AttrValuePresenceConfig::response()));
    assert!(
        issues
            .error_codes_at(&loc!["urn:test:ext:required:Strict", "badge"])
            .is_empty(),
        "{}",
        issues.to_json(true),
    );
}
