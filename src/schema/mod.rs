//! Schema engine: validated contracts for resources and API messages.
//!
//! Every schema is built from a [`SchemaCore`] (its URI plus bounded
//! attributes) and implements the [`Schema`] trait, which provides
//! validation, serialization, deserialization, and attribute filtering.
//! [`ResourceSchema`] adds resource semantics: a name, an endpoint, and
//! schema extensions layered under their own URIs.

mod bulk;
mod error;
mod group;
mod list_response;
mod patch_op;
mod provider_config;
mod resource_type;
mod schema_def;
mod search_request;
mod user;

pub use bulk::{BulkRequestSchema, BulkResponseSchema, BULK_REQUEST_URI, BULK_RESPONSE_URI};
pub(crate) use bulk::resource_type_endpoint as bulk_endpoint_of;
pub use error::{ErrorSchema, ERROR_URI};
pub use group::{group_schema, GROUP_URI};
pub use list_response::{ListResponseSchema, LIST_RESPONSE_URI};
pub use patch_op::{PatchOpSchema, PATCH_OP_URI};
pub use provider_config::{ServiceProviderConfigSchema, SERVICE_PROVIDER_CONFIG_URI};
pub use resource_type::{ResourceTypeSchema, RESOURCE_TYPE_URI};
pub use schema_def::{SchemaDefinitionSchema, SCHEMA_DEFINITION_URI};
pub use search_request::{SearchRequestSchema, SEARCH_REQUEST_URI};
pub use user::{enterprise_user_extension, user_schema, ENTERPRISE_USER_URI, USER_URI};

use crate::attrs::{AttrFilter, AttrType, Attribute, AttributeIssuer, Attrs, BoundedAttrs, Mutability, Returned, Uniqueness};
use crate::error::{ScimError, ScimResult};
use crate::ident::{AttrPath, BoundedAttrRep, SchemaUri};
use crate::issues::{ValidationError, ValidationIssues};
use crate::loc;
use crate::presence::{AttrValuePresenceConfig, validate_presence};
use crate::registry;
use crate::scim_data::{ScimData, ScimValue};

/// URI and attributes shared by every schema kind.
#[derive(Debug, Clone)]
pub struct SchemaCore {
    uri: SchemaUri,
    attrs: BoundedAttrs,
}

impl SchemaCore {
    /// Builds a schema core, registering the URI and guaranteeing the
    /// `schemas` attribute is part of the attribute set.
    pub(crate) fn new(uri: &str, mut attrs: Vec<Attribute>, common: &[&str]) -> Self {
        let uri = SchemaUri::new(uri)
            .unwrap_or_else(|e| panic!("invalid schema URI in schema definition: {e}"));
        registry::register_schema(uri.as_str(), false);
        if !attrs.iter().any(|attr| *attr.name() == "schemas") {
            attrs.insert(0, schemas_attr());
        }
        let mut common_names = vec!["schemas"];
        common_names.extend_from_slice(common);
        Self {
            attrs: BoundedAttrs::new(uri.clone(), Attrs::new(attrs), &common_names),
            uri,
        }
    }

    fn clone_filtered(&self, filter: &AttrFilter, keep: &[&str]) -> Self {
        let mut keep_names = vec!["schemas"];
        keep_names.extend_from_slice(keep);
        Self {
            uri: self.uri.clone(),
            attrs: self.attrs.clone_filtered(filter, &keep_names),
        }
    }
}

fn schemas_attr() -> Attribute {
    Attribute::uri_reference("schemas")
        .required(true)
        .multi_valued(true)
        .mutability(Mutability::ReadOnly)
        .returned(Returned::Always)
}

/// Common behavior of all schemas.
///
/// The provided methods traverse the attributes in registration order, so
/// issue locations are deterministic for a given input.
pub trait Schema {
    fn core(&self) -> &SchemaCore;

    /// All URIs this schema answers to; resource schemas add their
    /// extension URIs.
    fn schema_uris(&self) -> Vec<SchemaUri> {
        vec![self.core().uri.clone()]
    }

    /// Hook for schema-specific validation, merged at the top level.
    fn validate_extra(&self, _data: &ScimData) -> ValidationIssues {
        ValidationIssues::new()
    }

    /// Hook for additional `schemas` attribute validation, merged at the
    /// `schemas` location.
    fn validate_schemas_extra(&self, _data: &ScimData) -> ValidationIssues {
        ValidationIssues::new()
    }

    /// Whether the attribute's requiredness applies for this payload.
    /// Resource schemas relax requiredness of non-required extensions.
    fn required_by_schema(&self, _rep: &BoundedAttrRep, _data: &ScimData) -> bool {
        true
    }

    /// Hook applied after the attribute-wise serialization pass.
    fn post_serialize(&self, data: ScimData) -> ScimData {
        data
    }

    /// Hook applied after the attribute-wise deserialization pass.
    fn post_deserialize(&self, data: ScimData) -> ScimData {
        data
    }

    fn uri(&self) -> &SchemaUri {
        &self.core().uri
    }

    fn attrs(&self) -> &BoundedAttrs {
        &self.core().attrs
    }

    /// Validates the payload: per-attribute type and content checks, the
    /// `schemas` attribute integrity, and, when a presence configuration
    /// is given, per-direction presence rules. Every independent problem
    /// is reported.
    fn validate(
        &self,
        data: &ScimData,
        presence: Option<&AttrValuePresenceConfig>,
    ) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        for (rep, attr) in self.attrs().iter() {
            let value = data.get_rep(&rep);
            let location = rep.location();
            let mut value_valid = true;
            if let Some(value) = &value {
                let attr_issues = attr.validate(value);
                value_valid = !attr_issues.has_errors();
                issues.merge_at(location.clone(), attr_issues);
            }
            if let Some(config) = presence {
                if value_valid {
                    let required = self.required_by_schema(&rep, data);
                    issues.merge_at(
                        location,
                        validate_attr_presence(attr, &rep, value.as_ref(), config, required),
                    );
                }
            }
        }
        if data.get_key("schemas").is_some() {
            let mut schemas_issues =
                validate_schemas_field(data, &self.schema_uris(), self.uri());
            schemas_issues.merge(self.validate_schemas_extra(data));
            issues.merge_at(loc!["schemas"], schemas_issues);
        }
        issues.merge(self.validate_extra(data));
        issues
    }

    /// Applies per-attribute serializers; unknown attributes are dropped.
    fn serialize(&self, data: &ScimData) -> ScimData {
        let mut output = ScimData::new();
        for (rep, attr) in self.attrs().iter() {
            if let Some(value) = data.get_rep(&rep) {
                let _ = output.set_rep(&rep, attr.serialize(&value));
            }
        }
        self.post_serialize(output)
    }

    /// Applies per-attribute deserializers; unknown attributes are
    /// dropped.
    fn deserialize(&self, data: &ScimData) -> ScimData {
        let mut output = ScimData::new();
        for (rep, attr) in self.attrs().iter() {
            if let Some(value) = data.get_rep(&rep) {
                let _ = output.set_rep(&rep, attr.deserialize(&value));
            }
        }
        self.post_deserialize(output)
    }

    /// Keeps only the data of attributes matching the filter.
    fn filter(&self, data: &ScimData, attr_filter: &AttrFilter) -> ScimData {
        let filtered = self.attrs().clone_filtered(attr_filter, &[]);
        let mut output = ScimData::new();
        for (rep, attr) in filtered.iter() {
            if let Some(value) = data.get_rep(&rep) {
                let _ = output.set_rep(&rep, project_value(attr, &value));
            }
        }
        output
    }
}

/// Reduces a complex value to the sub-attributes the (possibly filtered)
/// attribute definition still knows about.
fn project_value(attr: &Attribute, value: &ScimValue) -> ScimValue {
    if attr.attr_type() != AttrType::Complex {
        return value.clone();
    }
    let project_one = |element: &ScimData| {
        let mut projected = ScimData::new();
        for sub_attr in attr.sub_attrs() {
            if let Some(sub_value) = element.get_key(sub_attr.name().as_str()) {
                projected.insert_key(sub_attr.name().as_str(), sub_value.clone());
            }
        }
        ScimValue::Object(projected)
    };
    match value {
        ScimValue::Object(element) => project_one(element),
        ScimValue::Array(items) => ScimValue::Array(
            items
                .iter()
                .map(|item| match item.as_object() {
                    Some(element) => project_one(element),
                    None => item.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Validates the `schemas` attribute value: URI syntax per item,
/// duplicates, base schema membership, and unknown entries.
fn validate_schemas_field(
    data: &ScimData,
    known: &[SchemaUri],
    base: &SchemaUri,
) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let Some(ScimValue::Array(items)) = data.get_key("schemas") else {
        return issues;
    };
    let mut parsed: Vec<SchemaUri> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let uri = item.as_str().and_then(|text| SchemaUri::new(text).ok());
        match uri {
            Some(uri) => parsed.push(uri),
            None => issues.add_error_at(loc![i], ValidationError::bad_value_syntax(), false),
        }
    }
    for (i, uri) in parsed.iter().enumerate() {
        if parsed[..i].contains(uri) {
            issues.add_error(ValidationError::duplicated_values(), true);
            break;
        }
    }
    let mut unknown_reported = false;
    let mut base_included = false;
    for uri in &parsed {
        if uri == base {
            base_included = true;
        } else if !known.contains(uri) && !unknown_reported {
            issues.add_error(ValidationError::unknown_schema(), true);
            unknown_reported = true;
        }
    }
    if !base_included {
        issues.add_error(ValidationError::missing_main_schema(), true);
    }
    issues
}

/// Presence validation of one attribute and, for complex attributes, its
/// sub-attributes. Locations are relative to the attribute.
fn validate_attr_presence(
    attr: &Attribute,
    rep: &BoundedAttrRep,
    value: Option<&ScimValue>,
    config: &AttrValuePresenceConfig,
    required_by_schema: bool,
) -> ValidationIssues {
    let path = AttrPath::Bounded(rep.clone());
    if attr.attr_type() == AttrType::Complex {
        let inclusivity = config.inclusivity_for(attr, &path, true);
        let mut issues = validate_presence(
            attr,
            value,
            config.direction(),
            config.ignores_issuer_of(&path),
            inclusivity,
            required_by_schema,
        );
        if issues.has_errors() {
            return issues;
        }
        for sub_attr in attr.sub_attrs() {
            let sub_rep = rep.child(sub_attr.name().clone());
            let sub_path = AttrPath::Bounded(sub_rep);
            let sub_inclusivity = config.inclusivity_for(sub_attr, &sub_path, false);
            let ignore_issuer = config.ignores_issuer_of(&sub_path);
            if attr.is_multi_valued() {
                let Some(ScimValue::Array(items)) = value else {
                    continue;
                };
                for (i, item) in items.iter().enumerate() {
                    let sub_value = item
                        .as_object()
                        .and_then(|element| element.get_key(sub_attr.name().as_str()));
                    issues.merge_at(
                        loc![i, sub_attr.name().as_str()],
                        validate_presence(
                            sub_attr,
                            sub_value,
                            config.direction(),
                            ignore_issuer,
                            sub_inclusivity,
                            required_by_schema,
                        ),
                    );
                }
            } else {
                let sub_value = value
                    .and_then(ScimValue::as_object)
                    .and_then(|element| element.get_key(sub_attr.name().as_str()));
                issues.merge_at(
                    loc![sub_attr.name().as_str()],
                    validate_presence(
                        sub_attr,
                        sub_value,
                        config.direction(),
                        ignore_issuer,
                        sub_inclusivity,
                        required_by_schema,
                    ),
                );
            }
        }
        return issues;
    }

    let inclusivity = config.inclusivity_for(attr, &path, false);
    let ignore_issuer = config.ignores_issuer_of(&path);
    if attr.is_multi_valued() {
        if let Some(ScimValue::Array(items)) = value {
            if !items.is_empty() {
                let mut issues = ValidationIssues::new();
                for item in items {
                    issues.merge(validate_presence(
                        attr,
                        Some(item),
                        config.direction(),
                        ignore_issuer,
                        inclusivity,
                        required_by_schema,
                    ));
                }
                return issues;
            }
        }
    }
    validate_presence(
        attr,
        value,
        config.direction(),
        ignore_issuer,
        inclusivity,
        required_by_schema,
    )
}

/// Entry describing one extension registered on a resource schema.
#[derive(Debug, Clone)]
pub struct ExtensionEntry {
    uri: SchemaUri,
    name: String,
    required: bool,
}

impl ExtensionEntry {
    pub fn uri(&self) -> &SchemaUri {
        &self.uri
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Schema of a SCIM resource type, e.g. User or Group.
///
/// The SCIM-mandated attributes `schemas`, `id`, `externalId`, and `meta`
/// are always part of the schema, regardless of user filtering.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    core: SchemaCore,
    name: String,
    plural_name: String,
    endpoint: String,
    description: String,
    extensions: Vec<ExtensionEntry>,
}

impl ResourceSchema {
    pub fn builder(uri: &str, name: &str) -> ResourceSchemaBuilder {
        ResourceSchemaBuilder {
            uri: uri.to_owned(),
            name: name.to_owned(),
            plural_name: None,
            endpoint: None,
            description: String::new(),
            attrs: Vec::new(),
            attr_filter: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plural_name(&self) -> &str {
        &self.plural_name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn extensions(&self) -> &[ExtensionEntry] {
        &self.extensions
    }

    /// Registers a schema extension. Its attributes become part of the
    /// effective attribute set, nested under the extension URI in data.
    pub fn extend(&mut self, extension: &SchemaExtension, required: bool) -> ScimResult<()> {
        if self
            .schema_uris()
            .iter()
            .any(|uri| uri == extension.uri())
        {
            return Err(ScimError::DuplicateExtension {
                resource: self.name.clone(),
                extension: extension.uri().to_string(),
            });
        }
        if self
            .extensions
            .iter()
            .any(|entry| entry.name.eq_ignore_ascii_case(extension.name()))
        {
            return Err(ScimError::DuplicateExtension {
                resource: self.name.clone(),
                extension: extension.name().to_owned(),
            });
        }
        self.extensions.push(ExtensionEntry {
            uri: extension.uri().clone(),
            name: extension.name().to_owned(),
            required,
        });
        self.core
            .attrs
            .extend(extension.uri().clone(), extension.attrs().clone());
        Ok(())
    }

    /// Returns a copy whose attributes are reduced to those passing the
    /// filter; `schemas` always survives.
    pub fn clone_filtered(&self, filter: &AttrFilter) -> ResourceSchema {
        ResourceSchema {
            core: self.core.clone_filtered(filter, &[]),
            name: self.name.clone(),
            plural_name: self.plural_name.clone(),
            endpoint: self.endpoint.clone(),
            description: self.description.clone(),
            extensions: self.extensions.clone(),
        }
    }

    fn extension_required(&self, uri: &SchemaUri) -> Option<bool> {
        self.extensions
            .iter()
            .find(|entry| entry.uri == *uri)
            .map(|entry| entry.required)
    }
}

impl Schema for ResourceSchema {
    fn core(&self) -> &SchemaCore {
        &self.core
    }

    fn schema_uris(&self) -> Vec<SchemaUri> {
        let mut uris = vec![self.core.uri.clone()];
        uris.extend(self.extensions.iter().map(|entry| entry.uri.clone()));
        uris
    }

    /// Checks `meta.resourceType` consistency with the schema's name.
    fn validate_extra(&self, data: &ScimData) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let resource_type = data
            .get("meta.resourceType")
            .and_then(|value| value.as_str().map(str::to_owned));
        if let Some(resource_type) = resource_type {
            if resource_type != self.name {
                issues.add_error_at(
                    loc!["meta", "resourceType"],
                    ValidationError::must_be_equal_to(format!("'{}'", self.name)),
                    true,
                );
            }
        }
        issues
    }

    /// Reports extensions whose data is present in the payload but whose
    /// URI is missing from the `schemas` attribute.
    fn validate_schemas_extra(&self, data: &ScimData) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let provided: Vec<SchemaUri> = match data.get_key("schemas") {
            Some(ScimValue::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().and_then(|text| SchemaUri::new(text).ok()))
                .collect(),
            _ => return issues,
        };
        for key in data.keys() {
            let Ok(uri) = SchemaUri::new(key) else {
                continue;
            };
            if self.schema_uris().contains(&uri) && !provided.contains(&uri) {
                issues.add_error(ValidationError::missing_schema_extension(key), true);
            }
        }
        issues
    }

    /// Attributes of a non-required extension are not required when the
    /// payload does not declare the extension.
    fn required_by_schema(&self, rep: &BoundedAttrRep, data: &ScimData) -> bool {
        if !rep.is_extension() {
            return true;
        }
        if self.extension_required(rep.schema()) != Some(false) {
            return true;
        }
        match data.get_key("schemas") {
            Some(ScimValue::Array(items)) => items.iter().any(|item| {
                item.as_str()
                    .is_some_and(|text| *rep.schema() == *text)
            }),
            _ => false,
        }
    }
}

/// Builder for [`ResourceSchema`].
pub struct ResourceSchemaBuilder {
    uri: String,
    name: String,
    plural_name: Option<String>,
    endpoint: Option<String>,
    description: String,
    attrs: Vec<Attribute>,
    attr_filter: Option<AttrFilter>,
}

impl ResourceSchemaBuilder {
    pub fn plural_name(mut self, plural_name: &str) -> Self {
        self.plural_name = Some(plural_name.to_owned());
        self
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_owned());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    pub fn attrs(mut self, attrs: Vec<Attribute>) -> Self {
        self.attrs = attrs;
        self
    }

    /// Filters the schema-specific attributes at construction time. The
    /// SCIM-mandated `schemas`, `id`, `externalId`, and `meta` attributes
    /// survive regardless.
    pub fn attr_filter(mut self, filter: AttrFilter) -> Self {
        self.attr_filter = Some(filter);
        self
    }

    pub fn build(self) -> ScimResult<ResourceSchema> {
        let plural_name = self.plural_name.unwrap_or_else(|| self.name.clone());
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| format!("/{plural_name}"));
        registry::register_resource(&self.name, &endpoint)?;

        let user_attrs = match &self.attr_filter {
            Some(filter) => filter.apply_to(&self.attrs),
            None => self.attrs,
        };
        let mut attrs = vec![schemas_attr(), id_attr(), external_id_attr(), meta_attr()];
        for attr in user_attrs {
            if attrs.iter().any(|existing| existing.name() == attr.name()) {
                return Err(ScimError::DuplicateAttribute {
                    schema: self.uri,
                    attribute: attr.name().to_string(),
                });
            }
            attrs.push(attr);
        }
        Attrs::try_new(attrs.clone()).map_err(|_| ScimError::DuplicateAttribute {
            schema: self.uri.clone(),
            attribute: "duplicate".into(),
        })?;

        Ok(ResourceSchema {
            core: SchemaCore::new(&self.uri, attrs, &["id", "externalId", "meta"]),
            name: self.name,
            plural_name,
            endpoint,
            description: self.description,
            extensions: Vec::new(),
        })
    }
}

fn bulk_id_validator(value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    if value.as_str().is_some_and(|text| text.contains("bulkId")) {
        issues.add_error(ValidationError::bad_value_content(), false);
    }
    issues
}

fn id_attr() -> Attribute {
    Attribute::string("id")
        .description("A unique identifier for a SCIM resource as defined by the service provider.")
        .required(true)
        .issuer(AttributeIssuer::ServiceProvider)
        .case_exact(true)
        .mutability(Mutability::ReadOnly)
        .returned(Returned::Always)
        .uniqueness(Uniqueness::Server)
        .validator(bulk_id_validator)
}

fn external_id_attr() -> Attribute {
    Attribute::string("externalId")
        .description("An identifier for the resource as defined by the provisioning client.")
        .issuer(AttributeIssuer::ProvisioningClient)
        .case_exact(true)
}

fn meta_attr() -> Attribute {
    Attribute::complex(
        "meta",
        vec![
            Attribute::string("resourceType")
                .case_exact(true)
                .issuer(AttributeIssuer::ServiceProvider)
                .mutability(Mutability::ReadOnly),
            Attribute::date_time("created")
                .issuer(AttributeIssuer::ServiceProvider)
                .mutability(Mutability::ReadOnly),
            Attribute::date_time("lastModified")
                .issuer(AttributeIssuer::ServiceProvider)
                .mutability(Mutability::ReadOnly),
            Attribute::uri_reference("location")
                .issuer(AttributeIssuer::ServiceProvider)
                .mutability(Mutability::ReadOnly),
            Attribute::string("version")
                .case_exact(true)
                .issuer(AttributeIssuer::ServiceProvider)
                .mutability(Mutability::ReadOnly),
        ],
    )
    .description("A complex attribute containing resource metadata.")
    .issuer(AttributeIssuer::ServiceProvider)
    .mutability(Mutability::ReadOnly)
}

/// Additional attributes layered on a base resource schema under a
/// distinct URI.
#[derive(Debug, Clone)]
pub struct SchemaExtension {
    uri: SchemaUri,
    name: String,
    description: String,
    attrs: Attrs,
}

impl SchemaExtension {
    pub fn new(uri: &str, name: &str, attrs: Vec<Attribute>) -> ScimResult<Self> {
        let uri = SchemaUri::new(uri)?;
        registry::register_schema(uri.as_str(), true);
        Ok(Self {
            uri,
            name: name.to_owned(),
            description: String::new(),
            attrs: Attrs::try_new(attrs)?,
        })
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    pub fn uri(&self) -> &SchemaUri {
        &self.uri
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
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
    fn wrong_type_is_reported_without_suppressing_other_checks() {
        let schema = user_schema();
        let body = data(json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "username": "Pagerous",
            "id": 42,
        }));
        let issues = schema.validate(&body, None);
        assert_eq!(issues.error_codes_at(&loc!["id"]), vec![2]);
        // without a presence configuration, missing userName is not flagged
        assert!(issues.error_codes_at(&loc!["userName"]).is_empty());
    }

    #[test]
    fn empty_schemas_array_misses_main_schema() {
        let schema = user_schema();
        let body = data(json!({"schemas": [], "userName": "bjensen"}));
        let issues = schema.validate(&body, None);
        assert_eq!(issues.error_codes_at(&loc!["schemas"]), vec![12]);
    }

    #[test]
    fn unknown_schema_entry_is_code_14() {
        let schema = user_schema();
        let body = data(json!({
            "schemas": [
                "urn:ietf:params:scim:schemas:core:2.0:User",
                "urn:unknown:schema",
            ],
            "userName": "bjensen",
        }));
        let issues = schema.validate(&body, None);
        assert_eq!(issues.error_codes_at(&loc!["schemas"]), vec![14]);
    }

    #[test]
    fn extension_data_missing_from_schemas_is_code_13() {
        let mut schema = user_schema();
        schema.extend(&enterprise_user_extension(), false).unwrap();
        let body = data(json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "userName": "bjensen",
            "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {
                "employeeNumber": "701984",
            },
        }));
        let issues = schema.validate(&body, None);
        assert_eq!(issues.error_codes_at(&loc!["schemas"]), vec![13]);
    }

    #[test]
    fn declared_extension_is_not_code_13() {
        let mut schema = user_schema();
        schema.extend(&enterprise_user_extension(), false).unwrap();
        let body = data(json!({
            "schemas": [
                "urn:ietf:params:scim:schemas:core:2.0:User",
                "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User",
            ],
            "userName": "bjensen",
            "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {
                "employeeNumber": "701984",
            },
        }));
        let issues = schema.validate(&body, None);
        assert!(issues.error_codes_at(&loc!["schemas"]).is_empty());
    }

    #[test]
    fn serialization_round_trips_canonical_data() {
        let schema = user_schema();
        let body = data(json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "userName": "bjensen",
            "name": {"givenName": "Barbara", "familyName": "Jensen"},
            "emails": [{"type": "work", "value": "bjensen@example.com"}],
        }));
        assert!(!schema.validate(&body, None).has_errors());
        let round_tripped = schema.serialize(&schema.deserialize(&body));
        assert_eq!(round_tripped.to_json(), body.to_json());
    }

    #[test]
    fn duplicate_extension_is_a_usage_error() {
        let mut schema = user_schema();
        schema.extend(&enterprise_user_extension(), true).unwrap();
        assert!(schema.extend(&enterprise_user_extension(), true).is_err());
    }

    #[test]
    fn meta_resource_type_mismatch_is_code_8() {
        let schema = user_schema();
        let body = data(json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "userName": "bjensen",
            "meta": {"resourceType": "Group"},
        }));
        let issues = schema.validate(&body, None);
        assert_eq!(issues.error_codes_at(&loc!["meta", "resourceType"]), vec![8]);
    }
}
