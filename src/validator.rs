//! Request and response validators, one per SCIM endpoint flavor.
//!
//! Each validator combines schema validation, presence rules, and the
//! protocol contracts of its endpoint: expected status codes, header
//! consistency, pagination, filtering, and sorting semantics. Issues are
//! keyed under `body`, `status`, `headers`, and `query_string`.

use std::collections::HashMap;

use log::debug;
use serde_json::Value;

use crate::attrs::{AttrType, Mutability, Returned};
use crate::config::ServiceProviderConfig;
use crate::error::{ScimError, ScimResult};
use crate::filter::Filter;
use crate::ident::AttrPath;
use crate::issues::{Location, ValidationError, ValidationIssues, ValidationWarning};
use crate::loc;
use crate::presence::AttrValuePresenceConfig;
use crate::schema::{
    BulkRequestSchema, BulkResponseSchema, ErrorSchema, ListResponseSchema, PatchOpSchema,
    ResourceSchema, Schema, SearchRequestSchema,
};
use crate::scim_data::{ScimData, ScimValue};
use crate::sorter::Sorter;

/// Inputs of a request validation.
#[derive(Default, Clone, Copy)]
pub struct RequestContext<'a> {
    pub body: Option<&'a Value>,
    pub headers: Option<&'a HashMap<String, String>>,
    pub query_string: Option<&'a Value>,
}

impl<'a> RequestContext<'a> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: &'a Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_headers(mut self, headers: &'a HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_query_string(mut self, query_string: &'a Value) -> Self {
        self.query_string = Some(query_string);
        self
    }
}

/// Inputs of a response validation.
#[derive(Default, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub status_code: u16,
    pub body: Option<&'a Value>,
    pub headers: Option<&'a HashMap<String, String>>,
    pub presence_config: Option<&'a AttrValuePresenceConfig>,
    pub start_index: Option<i64>,
    pub count: Option<i64>,
    pub filter: Option<&'a Filter>,
    pub sorter: Option<&'a Sorter>,
    pub fail_on_errors: Option<i64>,
}

impl<'a> ResponseContext<'a> {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: &'a Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_headers(mut self, headers: &'a HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_presence_config(mut self, config: &'a AttrValuePresenceConfig) -> Self {
        self.presence_config = Some(config);
        self
    }

    pub fn with_start_index(mut self, start_index: i64) -> Self {
        self.start_index = Some(start_index);
        self
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_filter(mut self, filter: &'a Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sorter(mut self, sorter: &'a Sorter) -> Self {
        self.sorter = Some(sorter);
        self
    }

    pub fn with_fail_on_errors(mut self, fail_on_errors: i64) -> Self {
        self.fail_on_errors = Some(fail_on_errors);
        self
    }
}

/// Common interface of all endpoint validators.
pub trait ScimValidator {
    fn validate_request(&self, ctx: &RequestContext) -> ValidationIssues;
    fn validate_response(&self, ctx: &ResponseContext) -> ValidationIssues;
}

fn body_data(body: Option<&Value>) -> ScimData {
    body.and_then(ScimData::from_json).unwrap_or_default()
}

fn header<'a>(headers: Option<&'a HashMap<String, String>>, name: &str) -> Option<&'a str> {
    headers?.get(name).map(String::as_str)
}

fn validate_status_code(expected: u16, actual: u16) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    if expected != actual {
        issues.add_error(ValidationError::bad_status_code(expected), true);
    }
    issues
}

/// Filter used to derive response schemas: attributes that are never
/// returned or write-only have no place in response payloads.
fn response_attr_predicate(attr: &crate::attrs::Attribute) -> bool {
    attr.get_returned() != Returned::Never && attr.get_mutability() != Mutability::WriteOnly
}

fn response_schema_of(schema: &ResourceSchema) -> ResourceSchema {
    schema.clone_filtered(&crate::attrs::AttrFilter::matching(response_attr_predicate))
}

/// Shared checks for endpoints that return a single resource body.
fn validate_resource_output_body(
    schema: &ResourceSchema,
    config: &ServiceProviderConfig,
    location_header_required: bool,
    expected_status_code: u16,
    ctx: &ResponseContext,
) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let body = body_data(ctx.body);
    let default_presence = AttrValuePresenceConfig::response();
    let presence = ctx.presence_config.unwrap_or(&default_presence);

    issues.merge_at(loc!["body"], schema.validate(&body, Some(presence)));
    issues.merge_at(
        loc!["status"],
        validate_status_code(expected_status_code, ctx.status_code),
    );

    let location_header = header(ctx.headers, "Location");
    if location_header.is_none() && location_header_required {
        issues.add_error_at(loc!["headers", "Location"], ValidationError::missing(), false);
    }
    let meta_location = body.get("meta.location");
    if let (Some(header_value), Some(meta_location)) = (location_header, &meta_location) {
        if meta_location.as_str() != Some(header_value) && meta_location.is_present() {
            issues.add_error_at(
                loc!["body", "meta", "location"],
                ValidationError::must_be_equal_to("'Location' header"),
                true,
            );
            issues.add_error_at(
                loc!["headers", "Location"],
                ValidationError::must_be_equal_to("'meta.location'"),
                true,
            );
        }
    }

    let etag = header(ctx.headers, "ETag");
    let version = body.get("meta.version");
    let version_str = version.as_ref().and_then(|v| v.as_str().map(str::to_owned));
    match (etag, version_str) {
        (Some(etag), Some(version)) => {
            if etag != version {
                issues.add_error_at(
                    loc!["body", "meta", "version"],
                    ValidationError::must_be_equal_to("'ETag' header"),
                    true,
                );
                issues.add_error_at(
                    loc!["headers", "ETag"],
                    ValidationError::must_be_equal_to("'meta.version'"),
                    true,
                );
            }
        }
        _ if config.etag.supported => {
            if etag.is_none() {
                issues.add_error_at(loc!["headers", "ETag"], ValidationError::missing(), false);
            }
            let version_rep = AttrPath::parse("meta.version").expect("a valid attribute path");
            if version.is_none() && presence.allowed(&version_rep) {
                issues.add_error_at(
                    loc!["body", "meta", "version"],
                    ValidationError::missing(),
                    false,
                );
            }
        }
        _ => {}
    }
    issues
}

/// Validates query-string parameters against the service provider
/// capabilities; issues are located under `query_string`.
fn validate_query_string(config: &ServiceProviderConfig, query: Option<&Value>) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let query = body_data(query);
    if query.is_empty() {
        return issues;
    }

    let attributes = query.get_key("attributes");
    let excluded = query.get_key("excludedAttributes");
    if attributes.is_some_and(ScimValue::is_present) && excluded.is_some_and(ScimValue::is_present)
    {
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
    for (name, value) in [("attributes", attributes), ("excludedAttributes", excluded)] {
        let Some(value) = value else { continue };
        for (i, rep) in attr_rep_list(value).iter().enumerate() {
            issues.merge_at(loc![name, i], AttrPath::validate(rep));
        }
    }

    if let Some(filter) = query.get_key("filter") {
        if !config.filter.supported {
            issues.add_error_at(loc!["filter"], ValidationError::not_supported(), false);
        } else if let Some(expression) = filter.as_str() {
            issues.merge_at(loc!["filter"], Filter::validate(expression));
        }
    }
    for name in ["sortBy", "sortOrder"] {
        if query.get_key(name).is_some() && !config.sort.supported {
            issues.add_error_at(loc![name], ValidationError::not_supported(), false);
        }
    }
    if config.sort.supported {
        if let Some(sort_by) = query.get_key("sortBy").and_then(|v| v.as_str().map(str::to_owned)) {
            issues.merge_at(loc!["sortBy"], AttrPath::validate(&sort_by));
        }
    }
    issues
}

/// Query-string attribute selections arrive either as comma-separated
/// strings or as arrays.
fn attr_rep_list(value: &ScimValue) -> Vec<String> {
    match value {
        ScimValue::String(text) => text.split(',').map(|part| part.trim().to_owned()).collect(),
        ScimValue::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect(),
        _ => Vec::new(),
    }
}

/// Validator for SCIM error responses.
#[derive(Debug, Clone)]
pub struct ErrorValidator {
    schema: ErrorSchema,
}

impl Default for ErrorValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorValidator {
    pub fn new() -> Self {
        Self {
            schema: ErrorSchema::new(),
        }
    }

    pub fn response_schema(&self) -> &ErrorSchema {
        &self.schema
    }
}

impl ScimValidator for ErrorValidator {
    fn validate_request(&self, _ctx: &RequestContext) -> ValidationIssues {
        ValidationIssues::new()
    }

    /// Checks the error body, that `status` in the body matches the
    /// response status code, and that the status code is an error code.
    fn validate_response(&self, ctx: &ResponseContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let body = body_data(ctx.body);
        issues.merge_at(
            loc!["body"],
            self.schema
                .validate(&body, Some(&AttrValuePresenceConfig::response())),
        );
        if let Some(status_in_body) = body.get_key("status").and_then(ScimValue::as_str) {
            if status_in_body != ctx.status_code.to_string() {
                issues.add_error_at(
                    loc!["body", "status"],
                    ValidationError::must_be_equal_to("response status code"),
                    true,
                );
                issues.add_error_at(
                    loc!["status"],
                    ValidationError::must_be_equal_to("'status' attribute"),
                    true,
                );
            }
        }
        if !(300..600).contains(&ctx.status_code) {
            issues.add_error_at(loc!["status"], ValidationError::bad_error_status(), true);
        }
        issues
    }
}

/// Validator for `GET /Resource/{id}`.
#[derive(Debug, Clone)]
pub struct ResourceObjectGet {
    config: ServiceProviderConfig,
    schema: ResourceSchema,
    response_schema: ResourceSchema,
}

impl ResourceObjectGet {
    /// Fails when the configuration does not satisfy its own invariants.
    pub fn new(config: ServiceProviderConfig, schema: ResourceSchema) -> ScimResult<Self> {
        config.ensure_valid()?;
        let response_schema = response_schema_of(&schema);
        Ok(Self {
            config,
            schema,
            response_schema,
        })
    }

    /// Schema projection suitable for response (de)serialization.
    pub fn response_schema(&self) -> &ResourceSchema {
        &self.response_schema
    }
}

impl ScimValidator for ResourceObjectGet {
    fn validate_request(&self, ctx: &RequestContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        issues.merge_at(
            loc!["query_string"],
            validate_query_string(&self.config, ctx.query_string),
        );
        issues
    }

    fn validate_response(&self, ctx: &ResponseContext) -> ValidationIssues {
        validate_resource_output_body(&self.schema, &self.config, false, 200, ctx)
    }
}

/// Validator for `POST /Resources`.
#[derive(Debug, Clone)]
pub struct ResourcesPost {
    config: ServiceProviderConfig,
    schema: ResourceSchema,
    request_schema: ResourceSchema,
    response_schema: ResourceSchema,
}

impl ResourcesPost {
    /// Fails when the configuration does not satisfy its own invariants.
    pub fn new(config: ServiceProviderConfig, schema: ResourceSchema) -> ScimResult<Self> {
        config.ensure_valid()?;
        let request_schema = schema.clone_filtered(&crate::attrs::AttrFilter::matching(|attr| {
            attr.get_mutability() != Mutability::ReadOnly
                && attr.get_issuer() != crate::attrs::AttributeIssuer::ServiceProvider
        }));
        let response_schema = response_schema_of(&schema);
        Ok(Self {
            config,
            schema,
            request_schema,
            response_schema,
        })
    }

    /// Schema projection suitable for request (de)serialization.
    pub fn request_schema(&self) -> &ResourceSchema {
        &self.request_schema
    }

    pub fn response_schema(&self) -> &ResourceSchema {
        &self.response_schema
    }
}

impl ScimValidator for ResourcesPost {
    /// Required attributes must be present; attributes issued by the
    /// service provider must not be.
    fn validate_request(&self, ctx: &RequestContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let body = body_data(ctx.body);
        issues.merge_at(
            loc!["body"],
            self.schema
                .validate(&body, Some(&AttrValuePresenceConfig::request())),
        );
        issues
    }

    /// The created resource must be returned with status 201, a Location
    /// header, and `meta.created` equal to `meta.lastModified`.
    fn validate_response(&self, ctx: &ResponseContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        if ctx.body.is_none() {
            issues.add_warning_at(loc!["body"], ValidationWarning::missing());
            return issues;
        }
        issues.merge(validate_resource_output_body(
            &self.schema,
            &self.config,
            true,
            201,
            ctx,
        ));
        let body = body_data(ctx.body);
        let created = body.get("meta.created");
        let last_modified = body.get("meta.lastModified");
        if created != last_modified {
            issues.add_error_at(
                loc!["body", "meta", "lastModified"],
                ValidationError::must_be_equal_to("'meta.created'"),
                true,
            );
        }
        issues
    }
}

/// Validator for `PUT /Resource/{id}`.
#[derive(Debug, Clone)]
pub struct ResourceObjectPut {
    config: ServiceProviderConfig,
    schema: ResourceSchema,
    request_schema: ResourceSchema,
    response_schema: ResourceSchema,
}

impl ResourceObjectPut {
    /// Fails when the configuration does not satisfy its own invariants.
    pub fn new(config: ServiceProviderConfig, schema: ResourceSchema) -> ScimResult<Self> {
        config.ensure_valid()?;
        let request_schema = schema.clone_filtered(&crate::attrs::AttrFilter::matching(|attr| {
            attr.get_mutability() != Mutability::ReadOnly || attr.is_required()
        }));
        let response_schema = response_schema_of(&schema);
        Ok(Self {
            config,
            schema,
            request_schema,
            response_schema,
        })
    }

    pub fn request_schema(&self) -> &ResourceSchema {
        &self.request_schema
    }

    pub fn response_schema(&self) -> &ResourceSchema {
        &self.response_schema
    }
}

impl ScimValidator for ResourceObjectPut {
    /// All required attributes must be provided, regardless of their
    /// issuer: a PUT body carries the full resource, including `id`.
    fn validate_request(&self, ctx: &RequestContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let body = body_data(ctx.body);
        let ignore_issuer: Vec<AttrPath> = self
            .schema
            .attrs()
            .iter()
            .filter(|(_, attr)| attr.is_required())
            .map(|(rep, _)| AttrPath::Bounded(rep))
            .collect();
        let presence = AttrValuePresenceConfig::request().with_ignore_issuer(ignore_issuer);
        issues.merge_at(loc!["body"], self.schema.validate(&body, Some(&presence)));
        issues
    }

    fn validate_response(&self, ctx: &ResponseContext) -> ValidationIssues {
        validate_resource_output_body(&self.schema, &self.config, false, 200, ctx)
    }
}

/// Validator for `PATCH /Resource/{id}`.
#[derive(Debug, Clone)]
pub struct ResourceObjectPatch {
    config: ServiceProviderConfig,
    schema: PatchOpSchema,
    resource_schema: ResourceSchema,
    response_schema: ResourceSchema,
}

impl ResourceObjectPatch {
    /// Fails when the service provider configuration does not support
    /// PATCH or does not satisfy its own invariants.
    pub fn new(config: ServiceProviderConfig, schema: ResourceSchema) -> ScimResult<Self> {
        config.ensure_valid()?;
        if !config.patch.supported {
            return Err(ScimError::UnsupportedOperation(
                "patch operation is not supported".into(),
            ));
        }
        let response_schema = response_schema_of(&schema);
        Ok(Self {
            config,
            schema: PatchOpSchema::new(schema.clone()),
            resource_schema: schema,
            response_schema,
        })
    }

    pub fn request_schema(&self) -> &PatchOpSchema {
        &self.schema
    }

    pub fn response_schema(&self) -> &ResourceSchema {
        &self.response_schema
    }
}

impl ScimValidator for ResourceObjectPatch {
    fn validate_request(&self, ctx: &RequestContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let body = body_data(ctx.body);
        issues.merge_at(
            loc!["body"],
            self.schema
                .validate(&body, Some(&AttrValuePresenceConfig::request())),
        );
        issues
    }

    /// 204 is expected only when no body is returned and no attributes
    /// were requested; otherwise the updated resource comes back as 200.
    fn validate_response(&self, ctx: &ResponseContext) -> ValidationIssues {
        if ctx.status_code == 204 {
            let mut issues = ValidationIssues::new();
            let attrs_requested = ctx
                .presence_config
                .is_some_and(|config| !config.attr_paths().is_empty());
            if ctx.body.is_some() || attrs_requested {
                issues.add_error_at(
                    loc!["status"],
                    ValidationError::bad_status_code(200),
                    true,
                );
            }
            return issues;
        }
        validate_resource_output_body(&self.resource_schema, &self.config, false, 200, ctx)
    }
}

/// Validator for `DELETE /Resource/{id}`.
#[derive(Debug, Clone, Default)]
pub struct ResourceObjectDelete;

impl ResourceObjectDelete {
    pub fn new() -> Self {
        Self
    }
}

impl ScimValidator for ResourceObjectDelete {
    fn validate_request(&self, _ctx: &RequestContext) -> ValidationIssues {
        ValidationIssues::new()
    }

    fn validate_response(&self, ctx: &ResponseContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        if ctx.status_code != 204 {
            issues.add_error_at(loc!["status"], ValidationError::bad_status_code(204), true);
        }
        issues
    }
}

/// Validator for `GET /Resources` queries; handles heterogeneous
/// listings, so it also fits the resource root endpoint.
#[derive(Debug, Clone)]
pub struct ResourcesQuery {
    config: ServiceProviderConfig,
    validation_schema: ListResponseSchema,
    response_schema: ListResponseSchema,
}

impl ResourcesQuery {
    /// Fails when the configuration does not satisfy its own invariants.
    pub fn new(config: ServiceProviderConfig, schemas: Vec<ResourceSchema>) -> ScimResult<Self> {
        config.ensure_valid()?;
        let response_schemas = schemas.iter().map(response_schema_of).collect();
        Ok(Self {
            config,
            validation_schema: ListResponseSchema::new(schemas),
            response_schema: ListResponseSchema::new(response_schemas),
        })
    }

    pub fn response_schema(&self) -> &ListResponseSchema {
        &self.response_schema
    }

    fn validate_listing_response(&self, ctx: &ResponseContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let body = body_data(ctx.body);
        issues.merge_at(
            loc!["body"],
            self.validation_schema.validate_listing(
                &body,
                Some(&AttrValuePresenceConfig::response()),
                ctx.presence_config,
            ),
        );
        issues.merge_at(loc!["status"], validate_status_code(200, ctx.status_code));

        let start_index_body = body.get_key("startIndex").and_then(ScimValue::as_i64);
        if let (Some(in_body), Some(requested)) = (start_index_body, ctx.start_index) {
            if in_body > requested {
                issues.add_error_at(
                    loc!["body", "startIndex"],
                    ValidationError::bad_value_content(),
                    true,
                );
            }
        }

        let resources = match body.get_key("Resources") {
            Some(ScimValue::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        let total_results = body.get_key("totalResults").and_then(ScimValue::as_i64);
        let items_per_page = body.get_key("itemsPerPage").and_then(ScimValue::as_i64);

        if let Some(total_results) = total_results {
            issues.merge_at(
                loc!["body", "Resources"],
                validate_number_of_resources(ctx.count, total_results, resources.len()),
            );
            let is_paginated =
                ctx.count.unwrap_or(0) > 0 && total_results > resources.len() as i64;
            if is_paginated {
                if start_index_body.is_none() {
                    issues.add_error_at(
                        loc!["body", "startIndex"],
                        ValidationError::missing(),
                        false,
                    );
                }
                if items_per_page.is_none() {
                    issues.add_error_at(
                        loc!["body", "itemsPerPage"],
                        ValidationError::missing(),
                        false,
                    );
                }
            }
        }
        if issues.has_errors_at(&loc!["body", "Resources"]) {
            return issues;
        }

        let default_presence = AttrValuePresenceConfig::response();
        let presence = ctx.presence_config.unwrap_or(&default_presence);
        let schemas = self.validation_schema.schemas_for(&resources);

        if let Some(filter) = ctx.filter {
            if schemas
                .iter()
                .flatten()
                .all(|schema| can_validate_filtering(filter, presence, schema))
            {
                for (i, (item, schema)) in resources.iter().zip(&schemas).enumerate() {
                    let (Some(resource), Some(schema)) = (item.as_object(), schema) else {
                        continue;
                    };
                    if !filter.matches(resource, schema.attrs()) {
                        issues.add_error_at(
                            loc!["body", "Resources", i],
                            ValidationError::resources_not_filtered(),
                            true,
                        );
                    }
                }
            }
        }

        if let Some(sorter) = ctx.sorter {
            let sortable: Vec<(&ScimData, &ResourceSchema)> = resources
                .iter()
                .zip(&schemas)
                .filter_map(|(item, schema)| Some((item.as_object()?, (*schema)?)))
                .collect();
            if sortable.len() == resources.len()
                && sortable
                    .iter()
                    .all(|(_, schema)| can_validate_sorting(sorter, presence, schema))
            {
                let data: Vec<ScimData> =
                    sortable.iter().map(|(resource, _)| (*resource).clone()).collect();
                let per_resource: Vec<&ResourceSchema> =
                    sortable.iter().map(|(_, schema)| *schema).collect();
                if data != sorter.sort_mixed(&data, &per_resource) {
                    issues.add_error_at(
                        loc!["body", "Resources"],
                        ValidationError::resources_not_sorted(),
                        true,
                    );
                }
            }
        }

        if self.config.etag.supported {
            for (i, item) in resources.iter().enumerate() {
                let Some(resource) = item.as_object() else {
                    continue;
                };
                if resource.get("meta.version").is_none() {
                    issues.add_error_at(
                        loc!["body", "Resources", i, "meta", "version"],
                        ValidationError::missing(),
                        true,
                    );
                }
            }
        }
        issues
    }
}

impl ScimValidator for ResourcesQuery {
    fn validate_request(&self, ctx: &RequestContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        issues.merge_at(
            loc!["query_string"],
            validate_query_string(&self.config, ctx.query_string),
        );
        issues
    }

    fn validate_response(&self, ctx: &ResponseContext) -> ValidationIssues {
        self.validate_listing_response(ctx)
    }
}

fn validate_number_of_resources(
    count: Option<i64>,
    total_results: i64,
    n_resources: usize,
) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let n_resources = n_resources as i64;
    if total_results < n_resources {
        issues.add_error(
            ValidationError::bad_number_of_resources("must not be greater than 'totalResults'"),
            true,
        );
    } else if count.is_none() && total_results > n_resources {
        issues.add_error(
            ValidationError::bad_number_of_resources("must be equal to 'totalResults'"),
            true,
        );
    }
    if count.is_some_and(|count| count < n_resources) {
        issues.add_error(
            ValidationError::bad_number_of_resources("must be lesser or equal to 'count' parameter"),
            true,
        );
    }
    issues
}

/// Filtering cannot be judged when the filter refers to attributes the
/// presence configuration excludes from the response.
fn can_validate_filtering(
    filter: &Filter,
    presence: &AttrValuePresenceConfig,
    schema: &ResourceSchema,
) -> bool {
    for path in filter.attr_paths() {
        if !presence.allowed(&path) {
            return false;
        }
        let Some(attr) = schema.attrs().get(&path) else {
            continue;
        };
        if attr.attr_type() == AttrType::Complex && attr.is_multi_valued() {
            if let Some(value_rep) = schema.attrs().rep(&format!("{}.value", attr.name())) {
                if !presence.allowed(&AttrPath::Bounded(value_rep)) {
                    return false;
                }
            }
        }
    }
    true
}

/// Sorting cannot be judged when the sort attribute, or the `value` /
/// `primary` sub-attributes it resolves through, are excluded.
fn can_validate_sorting(
    sorter: &Sorter,
    presence: &AttrValuePresenceConfig,
    schema: &ResourceSchema,
) -> bool {
    if !presence.allowed(sorter.attr_path()) {
        return false;
    }
    let Some(attr) = schema.attrs().get(sorter.attr_path()) else {
        return true;
    };
    if !(attr.attr_type() == AttrType::Complex && attr.is_multi_valued()) {
        return true;
    }
    for sub in ["value", "primary"] {
        if let Some(rep) = schema.attrs().rep(&format!("{}.{sub}", attr.name())) {
            if !presence.allowed(&AttrPath::Bounded(rep)) {
                return false;
            }
        }
    }
    true
}

/// Validator for `POST /.search` queries.
#[derive(Debug, Clone)]
pub struct SearchRequestPost {
    query: ResourcesQuery,
    request_schema: SearchRequestSchema,
}

impl SearchRequestPost {
    /// Fails when the configuration does not satisfy its own invariants.
    pub fn new(config: ServiceProviderConfig, schemas: Vec<ResourceSchema>) -> ScimResult<Self> {
        let request_schema = SearchRequestSchema::from_config(&config);
        Ok(Self {
            query: ResourcesQuery::new(config, schemas)?,
            request_schema,
        })
    }

    pub fn request_schema(&self) -> &SearchRequestSchema {
        &self.request_schema
    }

    pub fn response_schema(&self) -> &ListResponseSchema {
        self.query.response_schema()
    }
}

impl ScimValidator for SearchRequestPost {
    fn validate_request(&self, ctx: &RequestContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let body = body_data(ctx.body);
        issues.merge_at(
            loc!["body"],
            self.request_schema
                .validate(&body, Some(&AttrValuePresenceConfig::request())),
        );
        issues
    }

    fn validate_response(&self, ctx: &ResponseContext) -> ValidationIssues {
        self.query.validate_response(ctx)
    }
}

enum BulkSubValidator {
    Get(ResourceObjectGet),
    Post(ResourcesPost),
    Put(ResourceObjectPut),
    Patch(ResourceObjectPatch),
    Delete(ResourceObjectDelete),
}

impl BulkSubValidator {
    fn validate_request(&self, ctx: &RequestContext) -> ValidationIssues {
        match self {
            Self::Get(v) => v.validate_request(ctx),
            Self::Post(v) => v.validate_request(ctx),
            Self::Put(v) => v.validate_request(ctx),
            Self::Patch(v) => v.validate_request(ctx),
            Self::Delete(v) => v.validate_request(ctx),
        }
    }

    fn validate_response(&self, ctx: &ResponseContext) -> ValidationIssues {
        match self {
            Self::Get(v) => v.validate_response(ctx),
            Self::Post(v) => v.validate_response(ctx),
            Self::Put(v) => v.validate_response(ctx),
            Self::Patch(v) => v.validate_response(ctx),
            Self::Delete(v) => v.validate_response(ctx),
        }
    }
}

/// Validator for the `/Bulk` endpoint. Dispatches every inner operation
/// to the validator of its method and resource type.
pub struct BulkOperations {
    config: ServiceProviderConfig,
    request_schema: BulkRequestSchema,
    response_schema: BulkResponseSchema,
    error_validator: ErrorValidator,
    validators: HashMap<(String, String), BulkSubValidator>,
}

impl BulkOperations {
    /// Fails when the configuration does not support bulk operations.
    pub fn new(config: ServiceProviderConfig, schemas: Vec<ResourceSchema>) -> ScimResult<Self> {
        if !config.bulk.supported {
            return Err(ScimError::UnsupportedOperation(
                "bulk operations are not supported".into(),
            ));
        }
        config.ensure_valid()?;
        let endpoints: Vec<String> = schemas
            .iter()
            .map(|schema| schema.endpoint().to_owned())
            .collect();
        let mut validators = HashMap::new();
        for schema in &schemas {
            let endpoint = schema.endpoint().to_owned();
            validators.insert(
                ("GET".to_owned(), endpoint.clone()),
                BulkSubValidator::Get(ResourceObjectGet::new(config.clone(), schema.clone())?),
            );
            validators.insert(
                ("POST".to_owned(), endpoint.clone()),
                BulkSubValidator::Post(ResourcesPost::new(config.clone(), schema.clone())?),
            );
            validators.insert(
                ("PUT".to_owned(), endpoint.clone()),
                BulkSubValidator::Put(ResourceObjectPut::new(config.clone(), schema.clone())?),
            );
            if config.patch.supported {
                validators.insert(
                    ("PATCH".to_owned(), endpoint.clone()),
                    BulkSubValidator::Patch(ResourceObjectPatch::new(
                        config.clone(),
                        schema.clone(),
                    )?),
                );
            }
            validators.insert(
                ("DELETE".to_owned(), endpoint),
                BulkSubValidator::Delete(ResourceObjectDelete::new()),
            );
        }
        Ok(Self {
            config,
            request_schema: BulkRequestSchema::new(endpoints.clone()),
            response_schema: BulkResponseSchema::new(endpoints),
            error_validator: ErrorValidator::new(),
            validators,
        })
    }

    pub fn request_schema(&self) -> &BulkRequestSchema {
        &self.request_schema
    }

    pub fn response_schema(&self) -> &BulkResponseSchema {
        &self.response_schema
    }

    /// Request operations carry resource-relative paths; the target
    /// endpoint is parsed out of the path.
    fn sub_validator(&self, method: &str, path: &str) -> Option<&BulkSubValidator> {
        let endpoint = crate::schema::bulk_endpoint_of(method, path)?;
        self.validators.get(&(method.to_uppercase(), endpoint))
    }

    /// Response operations carry absolute URLs in `location`; the target
    /// endpoint is resolved by matching the registered endpoints against
    /// the URL.
    fn sub_validator_for_location(
        &self,
        method: &str,
        location: &str,
    ) -> Option<&BulkSubValidator> {
        let method = method.to_uppercase();
        self.validators
            .iter()
            .find(|((known_method, endpoint), _)| {
                *known_method == method && location.contains(endpoint.as_str())
            })
            .map(|(_, validator)| validator)
    }

    fn validate_response_operation(
        &self,
        operation: &ScimData,
        location: Location,
    ) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let method = operation.get_key("method").and_then(ScimValue::as_str);
        let status = operation
            .get_key("status")
            .and_then(ScimValue::as_str)
            .and_then(|text| text.parse::<u16>().ok());
        let response = operation.get_key("response").and_then(ScimValue::as_object);
        let (Some(method), Some(status), Some(response)) = (method, status, response) else {
            return issues;
        };
        let response_json = response.to_json();

        if status >= 300 {
            let inner = self
                .error_validator
                .validate_response(&ResponseContext::new(status).with_body(&response_json));
            issues.merge_at(location.child("response"), inner.get(&loc!["body"]));
            issues.merge_at(location.child("status"), inner.get(&loc!["status"]));
            return issues;
        }

        let Some(op_location) = operation
            .get_key("location")
            .and_then(|v| v.as_str().map(str::to_owned))
        else {
            return issues;
        };
        let Some(validator) = self.sub_validator_for_location(method, &op_location) else {
            return issues;
        };

        let mut headers = HashMap::new();
        headers.insert("Location".to_owned(), op_location);
        let version = operation
            .get_key("version")
            .and_then(|v| v.as_str().map(str::to_owned));
        if let Some(version) = &version {
            headers.insert("ETag".to_owned(), version.clone());
        }
        let mut inner = validator.validate_response(
            &ResponseContext::new(status)
                .with_body(&response_json)
                .with_headers(&headers),
        );
        // header mismatches map back to the operation's own attributes
        let location_mismatch = inner.take_errors(&[8], &loc!["headers", "Location"]);
        if !location_mismatch.is_empty() {
            issues.add_error_at(
                location.child("location"),
                ValidationError::must_be_equal_to("'response.meta.location'"),
                true,
            );
        }
        let version_mismatch = inner.take_errors(&[8], &loc!["headers", "ETag"]);
        if !version_mismatch.is_empty() {
            issues.add_error_at(
                location.child("version"),
                ValidationError::must_be_equal_to("'response.meta.version'"),
                true,
            );
        }
        issues.merge_at(location.child("response"), inner.get(&loc!["body"]));
        issues.merge_at(location.child("status"), inner.get(&loc!["status"]));
        issues
    }
}

impl ScimValidator for BulkOperations {
    /// Validates the envelope, the operation count against the configured
    /// maximum, and each operation's payload with the validator of its
    /// target endpoint.
    fn validate_request(&self, ctx: &RequestContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let body = body_data(ctx.body);
        issues.merge_at(
            loc!["body"],
            self.request_schema
                .validate(&body, Some(&AttrValuePresenceConfig::request())),
        );
        let Some(ScimValue::Array(operations)) = body.get_key("Operations") else {
            return issues;
        };
        if let Some(max_operations) = self.config.bulk.max_operations {
            if operations.len() > max_operations {
                issues.add_error_at(
                    loc!["body", "Operations"],
                    ValidationError::too_many_bulk_operations(max_operations),
                    true,
                );
            }
        }
        for (i, item) in operations.iter().enumerate() {
            let Some(operation) = item.as_object() else {
                continue;
            };
            let method = operation.get_key("method").and_then(ScimValue::as_str);
            let path = operation.get_key("path").and_then(ScimValue::as_str);
            let data = operation.get_key("data");
            let (Some(method), Some(path), Some(data)) = (method, path, data) else {
                continue;
            };
            if method.eq_ignore_ascii_case("DELETE") || method.eq_ignore_ascii_case("GET") {
                continue;
            }
            let Some(validator) = self.sub_validator(method, path) else {
                continue;
            };
            let data_json = data.to_json();
            let inner =
                validator.validate_request(&RequestContext::empty().with_body(&data_json));
            issues.merge_at(
                loc!["body", "Operations", i, "data"],
                inner.get(&loc!["body"]),
            );
        }
        debug!(
            "bulk request validated: {} operation(s)",
            operations.len(),
        );
        issues
    }

    /// Validates the envelope, each operation's response, and the error
    /// count against `failOnErrors`.
    fn validate_response(&self, ctx: &ResponseContext) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let body = body_data(ctx.body);
        issues.merge_at(
            loc!["body"],
            self.response_schema
                .validate(&body, Some(&AttrValuePresenceConfig::response())),
        );
        issues.merge_at(loc!["status"], validate_status_code(200, ctx.status_code));

        let Some(ScimValue::Array(operations)) = body.get_key("Operations") else {
            return issues;
        };
        let mut n_errors = 0i64;
        for (i, item) in operations.iter().enumerate() {
            let Some(operation) = item.as_object() else {
                continue;
            };
            issues.merge(
                self.validate_response_operation(operation, loc!["body", "Operations", i]),
            );
            let status = operation
                .get_key("status")
                .and_then(ScimValue::as_str)
                .and_then(|text| text.parse::<i64>().ok());
            if status.is_some_and(|status| status >= 300) {
                n_errors += 1;
            }
        }
        if let Some(fail_on_errors) = ctx.fail_on_errors {
            if n_errors > fail_on_errors {
                issues.add_error_at(
                    loc!["body", "Operations"],
                    ValidationError::too_many_errors_in_bulk(fail_on_errors as usize),
                    true,
                );
            }
        }
        issues
    }
}
