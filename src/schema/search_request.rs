//! The SearchRequest API message schema
//! (`urn:ietf:params:scim:api:messages:2.0:SearchRequest`).

use crate::attrs::{AttrFilter, Attribute};
use crate::config::ServiceProviderConfig;
use crate::filter::Filter;
use crate::ident::AttrPath;
use crate::issues::{ValidationError, ValidationIssues};
use crate::loc;
use crate::scim_data::{ScimData, ScimValue};

use super::{Schema, SchemaCore};

pub const SEARCH_REQUEST_URI: &str = "urn:ietf:params:scim:api:messages:2.0:SearchRequest";

fn validate_attr_reps(value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let Some(items) = value.as_array() else {
        return issues;
    };
    for (i, item) in items.iter().enumerate() {
        if let Some(text) = item.as_str() {
            issues.merge_at(loc![i], AttrPath::validate(text));
        }
    }
    issues
}

fn validate_filter_value(value: &ScimValue) -> ValidationIssues {
    match value.as_str() {
        Some(text) => Filter::validate(text),
        None => ValidationIssues::new(),
    }
}

fn validate_sort_by(value: &ScimValue) -> ValidationIssues {
    match value.as_str() {
        Some(text) => AttrPath::validate(text),
        None => ValidationIssues::new(),
    }
}

/// Schema of query requests sent with `POST /.search` or expressed as
/// query-string parameters. `attributes` and `excludedAttributes` are
/// mutually exclusive.
#[derive(Debug, Clone)]
pub struct SearchRequestSchema {
    core: SchemaCore,
}

impl Default for SearchRequestSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchRequestSchema {
    pub fn new() -> Self {
        Self::with_attr_filter(None)
    }

    /// Builds the schema with the parameters unsupported by the provider
    /// removed: no `filter` when filtering is off, no `sortBy` /
    /// `sortOrder` when sorting is off.
    pub fn from_config(config: &ServiceProviderConfig) -> Self {
        let mut excluded: Vec<&str> = Vec::new();
        if !config.filter.supported {
            excluded.push("filter");
        }
        if !config.sort.supported {
            excluded.push("sortBy");
            excluded.push("sortOrder");
        }
        if excluded.is_empty() {
            return Self::new();
        }
        let filter = AttrFilter::exclude(&excluded)
            .expect("parameter names are valid attribute names");
        Self::with_attr_filter(Some(&filter))
    }

    fn with_attr_filter(attr_filter: Option<&AttrFilter>) -> Self {
        let attrs = vec![
            Attribute::string("attributes")
                .description("Names of resource attributes to return in the response.")
                .multi_valued(true)
                .validator(validate_attr_reps),
            Attribute::string("excludedAttributes")
                .description("Names of resource attributes to be removed from the default set.")
                .multi_valued(true)
                .validator(validate_attr_reps),
            Attribute::string("filter")
                .description("The filter string used to request a subset of resources.")
                .validator(validate_filter_value),
            Attribute::string("sortBy")
                .description("The attribute whose value shall order the returned responses.")
                .validator(validate_sort_by),
            Attribute::string("sortOrder")
                .description("The order in which the sortBy parameter is applied.")
                .canonical_values(&["ascending", "descending"]),
            Attribute::integer("startIndex")
                .description("The 1-based index of the first query result."),
            Attribute::integer("count")
                .description("Non-negative integer specifying the maximum number of results."),
        ];
        let attrs = match attr_filter {
            Some(filter) => filter.apply_to(&attrs),
            None => attrs,
        };
        Self {
            core: SchemaCore::new(SEARCH_REQUEST_URI, attrs, &[]),
        }
    }
}

impl Schema for SearchRequestSchema {
    fn core(&self) -> &SchemaCore {
        &self.core
    }

    fn validate_extra(&self, data: &ScimData) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let has_included = data
            .get_key("attributes")
            .is_some_and(ScimValue::is_present);
        let has_excluded = data
            .get_key("excludedAttributes")
            .is_some_and(ScimValue::is_present);
        if has_included && has_excluded {
            issues.add_error_at(
                loc!["attributes"],
                ValidationError::cannot_be_used_together("excludedAttributes"),
                false,
            );
            issues.add_error_at(
                loc!["excludedAttributes"],
                ValidationError::cannot_be_used_together("attributes"),
                false,
            );
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
    fn attribute_selections_are_mutually_exclusive() {
        let schema = SearchRequestSchema::new();
        let body = data(json!({
            "schemas": [SEARCH_REQUEST_URI],
            "attributes": ["userName"],
            "excludedAttributes": ["nickName"],
        }));
        let issues = schema.validate(&body, None);
        assert_eq!(issues.error_codes_at(&loc!["attributes"]), vec![11]);
        assert_eq!(issues.error_codes_at(&loc!["excludedAttributes"]), vec![11]);
    }

    #[test]
    fn bad_filter_in_body_is_reported_under_filter() {
        let schema = SearchRequestSchema::new();
        let body = data(json!({
            "schemas": [SEARCH_REQUEST_URI],
            "filter": "userName xx 'a'",
        }));
        let issues = schema.validate(&body, None);
        assert_eq!(issues.error_codes_at(&loc!["filter"]), vec![104]);
    }

    #[test]
    fn from_config_drops_unsupported_parameters() {
        let schema = SearchRequestSchema::from_config(&ServiceProviderConfig::minimal());
        assert!(schema.attrs().get_name("filter").is_none());
        assert!(schema.attrs().get_name("sortBy").is_none());
        assert!(schema.attrs().get_name("attributes").is_some());
    }
}
