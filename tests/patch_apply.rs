//! Applying PATCH operations to resource data.

use scim_validator::schema::user_schema;
use scim_validator::{loc, PatchOperations, ScimData, ScimValue};
use serde_json::json;

fn resource() -> ScimData {
    ScimData::from_json(&json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "id": "2819c223",
        "userName": "bjensen",
        "nickName": "Babs",
        "name": {"givenName": "Barbara", "familyName": "Jensen"},
        "emails": [
            {"type": "work", "value": "bjensen@example.com"},
            {"type": "home", "value": "babs@jensen.org"},
        ],
    }))
    .unwrap()
}

fn ops(value: serde_json::Value) -> PatchOperations {
    let items: Vec<ScimValue> = value
        .as_array()
        .unwrap()
        .iter()
        .map(ScimValue::from_json)
        .collect();
    PatchOperations::parse(&items).unwrap()
}

#[test]
fn replace_singular_attribute() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([{"op": "replace", "path": "nickName", "value": "Bobbi"}]))
        .apply(&mut data, &schema);
    assert!(!issues.has_errors(), "{}", issues.to_json(true));
    assert_eq!(data.get("nickName"), Some(ScimValue::from("Bobbi")));
}

#[test]
fn add_appends_to_multi_valued() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([{
        "op": "add",
        "path": "emails",
        "value": [{"type": "other", "value": "third@example.com"}],
    }]))
    .apply(&mut data, &schema);
    assert!(!issues.has_errors(), "{}", issues.to_json(true));
    let emails = data.get("emails").unwrap();
    assert_eq!(emails.as_array().unwrap().len(), 3);
}

#[test]
fn replace_filtered_element_sub_value() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([{
        "op": "replace",
        "path": "emails[type eq 'home'].value",
        "value": "new-home@jensen.org",
    }]))
    .apply(&mut data, &schema);
    assert!(!issues.has_errors(), "{}", issues.to_json(true));
    let values = data.get("emails.value").unwrap();
    assert_eq!(
        values,
        ScimValue::Array(vec![
            ScimValue::from("bjensen@example.com"),
            ScimValue::from("new-home@jensen.org"),
        ]),
    );
}

#[test]
fn remove_filtered_elements() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([{"op": "remove", "path": "emails[type eq 'home']"}]))
        .apply(&mut data, &schema);
    assert!(!issues.has_errors(), "{}", issues.to_json(true));
    let emails = data.get("emails").unwrap();
    assert_eq!(emails.as_array().unwrap().len(), 1);
}

#[test]
fn remove_required_attribute_is_code_30() {
    let schema = user_schema();
    let mut data = resource();
    let issues =
        ops(json!([{"op": "remove", "path": "userName"}])).apply(&mut data, &schema);
    assert_eq!(issues.error_codes_at(&loc![0, "path"]), vec![30]);
    // the resource is untouched on error
    assert_eq!(data.get("userName"), Some(ScimValue::from("bjensen")));
}

#[test]
fn modify_read_only_attribute_is_code_29() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([{"op": "replace", "path": "groups", "value": []}]))
        .apply(&mut data, &schema);
    assert_eq!(issues.error_codes_at(&loc![0, "path"]), vec![29]);
}

#[test]
fn unknown_target_is_code_28() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([{"op": "replace", "path": "shoeSize", "value": 42}]))
        .apply(&mut data, &schema);
    assert_eq!(issues.error_codes_at(&loc![0, "path"]), vec![28]);
}

#[test]
fn filter_matching_nothing_is_code_28() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([{
        "op": "replace",
        "path": "emails[type eq 'fax'].value",
        "value": "nope@example.com",
    }]))
    .apply(&mut data, &schema);
    assert_eq!(issues.error_codes_at(&loc![0, "path"]), vec![28]);
}

#[test]
fn add_without_path_merges_into_resource() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([{
        "op": "add",
        "value": {"title": "Tour Guide", "nickName": "Bobbi"},
    }]))
    .apply(&mut data, &schema);
    assert!(!issues.has_errors(), "{}", issues.to_json(true));
    assert_eq!(data.get("title"), Some(ScimValue::from("Tour Guide")));
    assert_eq!(data.get("nickName"), Some(ScimValue::from("Bobbi")));
}

#[test]
fn root_value_with_read_only_attribute_is_code_29() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([{
        "op": "add",
        "value": {"groups": [{"value": "abc"}]},
    }]))
    .apply(&mut data, &schema);
    assert_eq!(issues.error_codes_at(&loc![0, "value", "groups"]), vec![29]);
}

#[test]
fn all_operation_errors_are_collected() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([
        {"op": "remove", "path": "userName"},
        {"op": "replace", "path": "shoeSize", "value": 42},
    ]))
    .apply(&mut data, &schema);
    assert_eq!(issues.error_codes_at(&loc![0, "path"]), vec![30]);
    assert_eq!(issues.error_codes_at(&loc![1, "path"]), vec![28]);
}

#[test]
fn sub_attribute_write_without_filter() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([{
        "op": "replace",
        "path": "name.familyName",
        "value": "Johnson",
    }]))
    .apply(&mut data, &schema);
    assert!(!issues.has_errors(), "{}", issues.to_json(true));
    assert_eq!(data.get("name.familyName"), Some(ScimValue::from("Johnson")));
    assert_eq!(data.get("name.givenName"), Some(ScimValue::from("Barbara")));
}

#[test]
fn value_type_errors_are_reported_under_value() {
    let schema = user_schema();
    let mut data = resource();
    let issues = ops(json!([{"op": "replace", "path": "nickName", "value": 7}]))
        .apply(&mut data, &schema);
    assert_eq!(issues.error_codes_at(&loc![0, "value"]), vec![2]);
}
