//! Sorter semantics over resource listings.

use scim_validator::schema::{group_schema, user_schema};
use scim_validator::{AttrPath, ScimData, Sorter};
use serde_json::json;

fn resources(values: &[serde_json::Value]) -> Vec<ScimData> {
    values
        .iter()
        .map(|value| ScimData::from_json(value).unwrap())
        .collect()
}

fn user_names(sorted: &[ScimData]) -> Vec<String> {
    sorted
        .iter()
        .map(|resource| {
            resource
                .get("userName")
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn sorts_ascending_case_insensitively() {
    let schema = user_schema();
    let sorter = Sorter::new(AttrPath::parse("userName").unwrap(), true);
    let data = resources(&[
        json!({"userName": "Charlie"}),
        json!({"userName": "alice"}),
        json!({"userName": "Bob"}),
    ]);
    let sorted = sorter.sort(&data, &schema);
    assert_eq!(user_names(&sorted), vec!["alice", "Bob", "Charlie"]);
}

#[test]
fn missing_values_sort_last_regardless_of_direction() {
    let schema = user_schema();
    let data = resources(&[
        json!({"nickName": "bb", "userName": "1"}),
        json!({"userName": "2"}),
        json!({"nickName": "aa", "userName": "3"}),
    ]);

    let ascending = Sorter::new(AttrPath::parse("nickName").unwrap(), true);
    assert_eq!(user_names(&ascending.sort(&data, &schema)), vec!["3", "1", "2"]);

    let descending = Sorter::new(AttrPath::parse("nickName").unwrap(), false);
    assert_eq!(user_names(&descending.sort(&data, &schema)), vec!["1", "3", "2"]);
}

#[test]
fn multi_valued_complex_sorts_by_primary_value() {
    let schema = user_schema();
    let sorter = Sorter::new(AttrPath::parse("emails").unwrap(), true);
    let data = resources(&[
        json!({
            "userName": "1",
            "emails": [
                {"value": "aaa@example.com"},
                {"value": "zzz@example.com", "primary": true},
            ],
        }),
        json!({
            "userName": "2",
            "emails": [{"value": "mmm@example.com"}],
        }),
    ]);
    // resource 1 sorts by its primary email (zzz), so it comes second
    assert_eq!(user_names(&sorter.sort(&data, &schema)), vec!["2", "1"]);
}

#[test]
fn attribute_absent_everywhere_preserves_input_order() {
    let schema = user_schema();
    let sorter = Sorter::new(AttrPath::parse("title").unwrap(), true);
    let data = resources(&[
        json!({"userName": "b"}),
        json!({"userName": "a"}),
    ]);
    assert_eq!(user_names(&sorter.sort(&data, &schema)), vec!["b", "a"]);
}

#[test]
fn sorting_is_stable_and_idempotent() {
    let schema = user_schema();
    let sorter = Sorter::new(AttrPath::parse("title").unwrap(), true);
    let data = resources(&[
        json!({"userName": "1", "title": "B"}),
        json!({"userName": "2", "title": "A"}),
        json!({"userName": "3", "title": "B"}),
    ]);
    let once = sorter.sort(&data, &schema);
    assert_eq!(user_names(&once), vec!["2", "1", "3"]);
    let twice = sorter.sort(&once, &schema);
    assert_eq!(once, twice);
}

#[test]
fn sorts_heterogeneous_listings_per_schema() {
    let user = user_schema();
    let group = group_schema();
    let sorter = Sorter::new(AttrPath::parse("externalId").unwrap(), true);
    let data = resources(&[
        json!({"externalId": "2", "userName": "u"}),
        json!({"externalId": "1", "displayName": "g"}),
        json!({"externalId": "3", "userName": "v"}),
    ]);
    let schemas = vec![&user, &group, &user];
    let sorted = sorter.sort_mixed(&data, &schemas);
    let ids: Vec<String> = sorted
        .iter()
        .map(|r| r.get("externalId").and_then(|v| v.as_str().map(str::to_owned)).unwrap())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}
