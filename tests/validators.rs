//! Endpoint validator behavior: status codes, presence rules, listing
//! consistency, and bulk dispatch.

use std::collections::HashMap;

use scim_validator::schema::{group_schema, user_schema, LIST_RESPONSE_URI, PATCH_OP_URI};
use scim_validator::validator::{
    BulkOperations, ErrorValidator, RequestContext, ResourceObjectDelete, ResourceObjectGet,
    ResourceObjectPatch, ResourceObjectPut, ResourcesPost, ResourcesQuery, ScimValidator,
    SearchRequestPost,
};
use scim_validator::{
    loc, AttrPath, AttrValuePresenceConfig, DataDirection, Filter, ServiceProviderConfig, Sorter,
};
use serde_json::{json, Value};

fn config() -> ServiceProviderConfig {
    ServiceProviderConfig {
        patch: scim_validator::config::GenericOption::enabled(),
        bulk: scim_validator::config::BulkOption::enabled(10, 1048576),
        filter: scim_validator::config::FilterOption::enabled(100),
        sort: scim_validator::config::GenericOption::enabled(),
        ..Default::default()
    }
}

fn user_body() -> Value {
    json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "id": "2819c223",
        "userName": "bjensen",
        "meta": {"resourceType": "User"},
    })
}

#[test]
fn get_response_expects_status_200() {
    let validator = ResourceObjectGet::new(config(), user_schema()).unwrap();
    let body = user_body();
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(404).with_body(&body),
    );
    assert_eq!(issues.error_codes_at(&loc!["status"]), vec![19]);
}

#[test]
fn write_only_attribute_must_not_be_returned() {
    let validator = ResourceObjectGet::new(config(), user_schema()).unwrap();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "id": "2819c223",
        "userName": "bjensen",
        "password": "t1meMa$heen",
    });
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(200).with_body(&body),
    );
    assert_eq!(issues.error_codes_at(&loc!["body", "password"]), vec![7]);
}

#[test]
fn post_request_forbids_server_issued_attributes() {
    let validator = ResourcesPost::new(config(), user_schema()).unwrap();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "id": "client-made-this-up",
        "userName": "bjensen",
    });
    let issues = validator.validate_request(&RequestContext::empty().with_body(&body));
    assert_eq!(issues.error_codes_at(&loc!["body", "id"]), vec![6]);
}

#[test]
fn post_request_requires_required_attributes() {
    let validator = ResourcesPost::new(config(), user_schema()).unwrap();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "nickName": "Babs",
    });
    let issues = validator.validate_request(&RequestContext::empty().with_body(&body));
    assert_eq!(issues.error_codes_at(&loc!["body", "userName"]), vec![5]);
}

#[test]
fn post_response_expects_201_and_location_header() {
    let validator = ResourcesPost::new(config(), user_schema()).unwrap();
    let body = user_body();
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(200).with_body(&body),
    );
    assert_eq!(issues.error_codes_at(&loc!["status"]), vec![19]);
    assert_eq!(issues.error_codes_at(&loc!["headers", "Location"]), vec![5]);
}

#[test]
fn location_header_must_match_meta_location() {
    let validator = ResourcesPost::new(config(), user_schema()).unwrap();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "id": "2819c223",
        "userName": "bjensen",
        "meta": {
            "resourceType": "User",
            "location": "https://example.com/v2/Users/2819c223",
        },
    });
    let mut headers = HashMap::new();
    headers.insert(
        "Location".to_owned(),
        "https://example.com/v2/Users/elsewhere".to_owned(),
    );
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(201)
            .with_body(&body)
            .with_headers(&headers),
    );
    assert_eq!(
        issues.error_codes_at(&loc!["body", "meta", "location"]),
        vec![8],
    );
    assert_eq!(
        issues.error_codes_at(&loc!["headers", "Location"]),
        vec![8],
    );
}

#[test]
fn put_request_requires_id() {
    let validator = ResourceObjectPut::new(config(), user_schema()).unwrap();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "userName": "bjensen",
    });
    let issues = validator.validate_request(&RequestContext::empty().with_body(&body));
    assert_eq!(issues.error_codes_at(&loc!["body", "id"]), vec![5]);
}

#[test]
fn delete_response_expects_204() {
    let validator = ResourceObjectDelete::new();
    let issues = validator.validate_response(&scim_validator::ResponseContext::new(200));
    assert_eq!(issues.error_codes_at(&loc!["status"]), vec![19]);
    let issues = validator.validate_response(&scim_validator::ResponseContext::new(204));
    assert!(issues.is_empty());
}

#[test]
fn patch_unsupported_is_a_usage_error() {
    assert!(ResourceObjectPatch::new(ServiceProviderConfig::minimal(), user_schema()).is_err());
}

#[test]
fn patch_request_validates_operations() {
    let validator = ResourceObjectPatch::new(config(), user_schema()).unwrap();
    let body = json!({
        "schemas": [PATCH_OP_URI],
        "Operations": [{"op": "replace", "path": "ims[ty"}],
    });
    let issues = validator.validate_request(&RequestContext::empty().with_body(&body));
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Operations", 0, "path"]),
        vec![1],
    );
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Operations", 0, "value"]),
        vec![5],
    );
}

#[test]
fn patch_204_with_body_expects_200() {
    let validator = ResourceObjectPatch::new(config(), user_schema()).unwrap();
    let body = user_body();
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(204).with_body(&body),
    );
    assert_eq!(issues.error_codes_at(&loc!["status"]), vec![19]);
    let issues = validator.validate_response(&scim_validator::ResponseContext::new(204));
    assert!(issues.is_empty());
}

fn listing(resources: Value, total: i64) -> Value {
    let count = resources.as_array().map(|a| a.len()).unwrap_or(0);
    json!({
        "schemas": [LIST_RESPONSE_URI],
        "totalResults": total,
        "itemsPerPage": count,
        "startIndex": 1,
        "Resources": resources,
    })
}

#[test]
fn listing_reports_each_resource_issue() {
    let validator = ResourcesQuery::new(config(), vec![user_schema(), group_schema()]).unwrap();
    let body = listing(
        json!([
            {
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "id": 42,
                "userName": "bjensen",
            },
            {
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "userName": "jsmith",
            },
        ]),
        2,
    );
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(200).with_body(&body),
    );
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Resources", 0, "id"]),
        vec![2],
    );
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Resources", 1, "id"]),
        vec![5],
    );
}

#[test]
fn too_many_resources_is_code_20() {
    let validator = ResourcesQuery::new(config(), vec![user_schema()]).unwrap();
    let body = listing(
        json!([
            {"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"], "id": "1", "userName": "a"},
            {"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"], "id": "2", "userName": "b"},
        ]),
        1,
    );
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(200).with_body(&body),
    );
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Resources"]),
        vec![20],
    );
}

#[test]
fn unfiltered_resource_is_code_21() {
    let validator = ResourcesQuery::new(config(), vec![user_schema()]).unwrap();
    let filter = Filter::parse("userName sw 'b'").unwrap();
    let body = listing(
        json!([
            {"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"], "id": "1", "userName": "bjensen"},
            {"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"], "id": "2", "userName": "jsmith"},
        ]),
        2,
    );
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(200)
            .with_body(&body)
            .with_filter(&filter),
    );
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Resources", 1]),
        vec![21],
    );
    assert!(issues.error_codes_at(&loc!["body", "Resources", 0]).is_empty());
}

#[test]
fn unsorted_resources_is_code_22() {
    let validator = ResourcesQuery::new(config(), vec![user_schema()]).unwrap();
    let sorter = Sorter::new(AttrPath::parse("userName").unwrap(), true);
    let body = listing(
        json!([
            {"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"], "id": "1", "userName": "zoe"},
            {"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"], "id": "2", "userName": "adam"},
        ]),
        2,
    );
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(200)
            .with_body(&body)
            .with_sorter(&sorter),
    );
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Resources"]),
        vec![22],
    );
}

#[test]
fn pagination_requires_start_index_and_items_per_page() {
    let validator = ResourcesQuery::new(config(), vec![user_schema()]).unwrap();
    let body = json!({
        "schemas": [LIST_RESPONSE_URI],
        "totalResults": 100,
        "Resources": [
            {"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"], "id": "1", "userName": "a"},
        ],
    });
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(200)
            .with_body(&body)
            .with_count(10),
    );
    assert_eq!(
        issues.error_codes_at(&loc!["body", "startIndex"]),
        vec![5],
    );
    assert_eq!(
        issues.error_codes_at(&loc!["body", "itemsPerPage"]),
        vec![5],
    );
}

#[test]
fn query_string_with_unsupported_filter_is_code_31() {
    let mut config = config();
    config.filter.supported = false;
    let validator = ResourcesQuery::new(config, vec![user_schema()]).unwrap();
    let query = json!({"filter": "userName eq 'b'"});
    let issues =
        validator.validate_request(&RequestContext::empty().with_query_string(&query));
    assert_eq!(
        issues.error_codes_at(&loc!["query_string", "filter"]),
        vec![31],
    );
}

#[test]
fn search_request_validates_body_parameters() {
    let validator = SearchRequestPost::new(config(), vec![user_schema()]).unwrap();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:SearchRequest"],
        "attributes": ["userName"],
        "excludedAttributes": ["nickName"],
    });
    let issues = validator.validate_request(&RequestContext::empty().with_body(&body));
    assert_eq!(
        issues.error_codes_at(&loc!["body", "attributes"]),
        vec![11],
    );
    assert_eq!(
        issues.error_codes_at(&loc!["body", "excludedAttributes"]),
        vec![11],
    );
}

#[test]
fn error_response_status_must_match_body() {
    let validator = ErrorValidator::new();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:Error"],
        "status": "404",
        "detail": "Resource not found",
    });
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(400).with_body(&body),
    );
    assert_eq!(issues.error_codes_at(&loc!["body", "status"]), vec![8]);
    assert_eq!(issues.error_codes_at(&loc!["status"]), vec![8]);
}

#[test]
fn bulk_request_over_operation_limit_is_code_26() {
    let mut config = config();
    config.bulk = scim_validator::config::BulkOption::enabled(1, 1048576);
    let validator = BulkOperations::new(config, vec![user_schema()]).unwrap();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:BulkRequest"],
        "Operations": [
            {"method": "DELETE", "path": "/Users/1"},
            {"method": "DELETE", "path": "/Users/2"},
        ],
    });
    let issues = validator.validate_request(&RequestContext::empty().with_body(&body));
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Operations"]),
        vec![26],
    );
}

#[test]
fn bulk_request_unknown_resource_is_code_25() {
    let validator = BulkOperations::new(config(), vec![user_schema()]).unwrap();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:BulkRequest"],
        "Operations": [
            {"method": "PUT", "path": "/Widgets/3", "data": {"userName": "b"}},
        ],
    });
    let issues = validator.validate_request(&RequestContext::empty().with_body(&body));
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Operations", 0, "path"]),
        vec![25],
    );
}

#[test]
fn bulk_request_validates_inner_payloads() {
    let validator = BulkOperations::new(config(), vec![user_schema()]).unwrap();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:BulkRequest"],
        "Operations": [{
            "method": "POST",
            "bulkId": "qwerty",
            "path": "/Users",
            "data": {
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "nickName": "no userName here",
            },
        }],
    });
    let issues = validator.validate_request(&RequestContext::empty().with_body(&body));
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Operations", 0, "data", "userName"]),
        vec![5],
    );
}

#[test]
fn bulk_response_error_count_over_fail_on_errors_is_code_27() {
    let validator = BulkOperations::new(config(), vec![user_schema()]).unwrap();
    let error_body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:Error"],
        "status": "400",
        "detail": "bad",
    });
    let body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:BulkResponse"],
        "Operations": [
            {
                "method": "PUT",
                "location": "https://example.com/v2/Users/1",
                "status": "400",
                "response": error_body,
            },
            {
                "method": "PUT",
                "location": "https://example.com/v2/Users/2",
                "status": "400",
                "response": error_body,
            },
        ],
    });
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(200)
            .with_body(&body)
            .with_fail_on_errors(1),
    );
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Operations"]),
        vec![27],
    );
}

#[test]
fn bulk_response_dispatches_successful_operations() {
    let validator = BulkOperations::new(config(), vec![user_schema()]).unwrap();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:BulkResponse"],
        "Operations": [{
            "method": "PUT",
            "location": "https://example.com/v2/Users/2819c223",
            "version": "W/\"a330bc54f0671c9\"",
            "status": "200",
            "response": {
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "id": "2819c223",
                "userName": "bjensen",
                "meta": {
                    "resourceType": "User",
                    "location": "https://example.com/v2/Users/elsewhere",
                    "version": "W/\"a330bc54f0671c9\"",
                },
            },
        }],
    });
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(200).with_body(&body),
    );
    // the operation's location disagrees with the returned resource, so
    // the dispatched PUT validator flags both sides of the mismatch
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Operations", 0, "location"]),
        vec![8],
    );
    assert_eq!(
        issues.error_codes_at(&loc![
            "body",
            "Operations",
            0,
            "response",
            "meta",
            "location"
        ]),
        vec![8],
    );
}

#[test]
fn bulk_response_flags_wrong_operation_status() {
    let validator = BulkOperations::new(config(), vec![user_schema()]).unwrap();
    let body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:BulkResponse"],
        "Operations": [{
            "method": "DELETE",
            "location": "https://example.com/v2/Users/2819c223",
            "status": "200",
            "response": {},
        }],
    });
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(200).with_body(&body),
    );
    // a deletion must complete with 204
    assert_eq!(
        issues.error_codes_at(&loc!["body", "Operations", 0, "status"]),
        vec![19],
    );
}

#[test]
fn bulk_unsupported_is_a_usage_error() {
    assert!(BulkOperations::new(ServiceProviderConfig::minimal(), vec![user_schema()]).is_err());
}

#[test]
fn filter_capability_without_max_results_is_a_usage_error() {
    let mut config = config();
    config.filter.max_results = None;
    assert!(ResourcesQuery::new(config.clone(), vec![user_schema()]).is_err());
    assert!(SearchRequestPost::new(config.clone(), vec![user_schema()]).is_err());
    assert!(ResourceObjectGet::new(config, user_schema()).is_err());
}

#[test]
fn response_presence_config_excludes_listed_attributes() {
    let validator = ResourceObjectGet::new(config(), user_schema()).unwrap();
    let presence = AttrValuePresenceConfig::new(
        DataDirection::Response,
        vec![AttrPath::parse("nickName").unwrap()],
        false,
    );
    let body = json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "id": "2819c223",
        "userName": "bjensen",
        "nickName": "Babs",
    });
    let issues = validator.validate_response(
        &scim_validator::ResponseContext::new(200)
            .with_body(&body)
            .with_presence_config(&presence),
    );
    assert_eq!(issues.error_codes_at(&loc!["body", "nickName"]), vec![7]);
}
