//! Filter evaluation against resource data.

use scim_validator::schema::{user_schema, Schema};
use scim_validator::{Filter, ScimData};
use serde_json::json;

fn data(value: serde_json::Value) -> ScimData {
    ScimData::from_json(&value).unwrap()
}

fn matches(expression: &str, value: serde_json::Value) -> bool {
    let schema = user_schema();
    let filter = Filter::parse(expression).unwrap();
    filter.matches(&data(value), schema.attrs())
}

#[test]
fn complex_group_matches_any_element() {
    let expression = "emails[type eq 'work' and value co '@example.com']";
    assert!(matches(
        expression,
        json!({"emails": [{"type": "work", "value": "a@example.com"}]}),
    ));
    assert!(!matches(
        expression,
        json!({"emails": [{"type": "home", "value": "a@example.com"}]}),
    ));
}

#[test]
fn string_comparison_is_case_insensitive_by_default() {
    assert!(matches("userName eq 'BJENSEN'", json!({"userName": "bjensen"})));
    // `id` is caseExact
    assert!(!matches("id eq 'ABC'", json!({"id": "abc"})));
}

#[test]
fn sub_attribute_of_multi_valued_means_any_element() {
    assert!(matches(
        "emails.value sw 'a@'",
        json!({"emails": [{"value": "zzz"}, {"value": "a@example.com"}]}),
    ));
}

#[test]
fn unknown_attributes_evaluate_to_not_present() {
    assert!(!matches("shoeSize eq 42", json!({"userName": "b"})));
    assert!(!matches("shoeSize pr", json!({"userName": "b"})));
    assert!(matches("not shoeSize pr", json!({"userName": "b"})));
}

#[test]
fn evaluation_is_total_boolean() {
    let schema = user_schema();
    let cases = [
        "userName eq 'b'",
        "emails[type eq 'work']",
        "nickName pr",
        "name.givenName co 'ar'",
        "active eq true",
    ];
    let payloads = [
        json!({}),
        json!({"userName": "b"}),
        json!({"emails": "not-a-list"}),
        json!({"name": {"givenName": "Barbara"}, "active": true}),
    ];
    for case in cases {
        let filter = Filter::parse(case).unwrap();
        let negated = Filter::parse(&format!("not ({case})")).unwrap();
        for payload in &payloads {
            let value = data(payload.clone());
            let outcome = filter.matches(&value, schema.attrs());
            let negated_outcome = negated.matches(&value, schema.attrs());
            assert_ne!(outcome, negated_outcome, "filter: {case}, payload: {payload}");
        }
    }
}

#[test]
fn date_time_ordering_uses_time_semantics() {
    let schema = user_schema();
    let filter = Filter::parse("meta.lastModified gt '2011-05-13T04:42:34Z'").unwrap();
    assert!(filter.matches(
        &data(json!({"meta": {"lastModified": "2012-01-01T00:00:00Z"}})),
        schema.attrs(),
    ));
    assert!(!filter.matches(
        &data(json!({"meta": {"lastModified": "2010-01-01T00:00:00Z"}})),
        schema.attrs(),
    ));
    // same instant, different offsets
    let filter = Filter::parse("meta.lastModified eq '2011-05-13T05:42:34+01:00'").unwrap();
    assert!(filter.matches(
        &data(json!({"meta": {"lastModified": "2011-05-13T04:42:34Z"}})),
        schema.attrs(),
    ));
}

#[test]
fn presence_requires_non_empty_values() {
    assert!(!matches("nickName pr", json!({"nickName": ""})));
    assert!(!matches("nickName pr", json!({"nickName": null})));
    assert!(!matches("emails pr", json!({"emails": []})));
    assert!(matches("nickName pr", json!({"nickName": "Bob"})));
}

#[test]
fn multi_valued_complex_compares_through_value_sub_attribute() {
    assert!(matches(
        "emails eq 'a@example.com'",
        json!({"emails": [{"type": "work", "value": "a@example.com"}]}),
    ));
}

#[test]
fn serialized_filter_reparses_to_equivalent_filter() {
    let schema = user_schema();
    let expressions = [
        "userName eq 'bjensen'",
        "userName eq 'bjensen' and (nickName pr or title sw 'Vice')",
        "not emails[type eq 'work' and value co '@x']",
        "meta.lastModified ge '2011-05-13T04:42:34Z'",
    ];
    let payloads = [
        json!({"userName": "bjensen", "title": "Vice President"}),
        json!({"emails": [{"type": "work", "value": "a@x.org"}]}),
        json!({"nickName": "Bob", "meta": {"lastModified": "2015-02-01T00:00:00Z"}}),
    ];
    for expression in expressions {
        let parsed = Filter::parse(expression).unwrap();
        let reparsed = Filter::parse(&parsed.serialize()).unwrap();
        let from_json = Filter::from_json(&parsed.to_json()).unwrap();
        for payload in &payloads {
            let value = data(payload.clone());
            assert_eq!(
                parsed.matches(&value, schema.attrs()),
                reparsed.matches(&value, schema.attrs()),
                "serialize round-trip diverged for {expression}",
            );
            assert_eq!(
                parsed.matches(&value, schema.attrs()),
                from_json.matches(&value, schema.attrs()),
                "json round-trip diverged for {expression}",
            );
        }
    }
}
