//! Attribute definitions and attribute collections.
//!
//! An [`Attribute`] is an immutable description of one schema attribute:
//! its type, cardinality, mutability, returnability, uniqueness, canonical
//! values, and optional custom validators and (de)serializers. The deep
//! class hierarchy of RFC 7643 attribute kinds is flattened into a single
//! struct with an [`AttrType`] tag; validators dispatch on the tag.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ScimResult;
use crate::ident::{AttrName, AttrPath, BoundedAttrRep, SchemaUri};
use crate::issues::{ValidationError, ValidationIssues, ValidationWarning};
use crate::loc;
use crate::patch::PatchPath;
use crate::registry::{self, ValueMapper};
use crate::scim_data::ScimValue;

/// SCIM attribute data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttrType {
    String,
    Boolean,
    Decimal,
    Integer,
    DateTime,
    Binary,
    Reference,
    Complex,
    /// Attribute with varying content, e.g. `PatchOp:Operations.value`.
    /// Never used in resource schemas.
    Unknown,
}

impl AttrType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::DateTime => "dateTime",
            Self::Binary => "binary",
            Self::Reference => "reference",
            Self::Complex => "complex",
            Self::Unknown => "unknown",
        }
    }
}

/// Attribute mutability, as defined in RFC 7643.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mutability {
    ReadOnly,
    ReadWrite,
    Immutable,
    WriteOnly,
}

/// Attribute returnability, as defined in RFC 7643.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Returned {
    Always,
    Never,
    Default,
    Request,
}

/// Attribute uniqueness scope, as defined in RFC 7643.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Uniqueness {
    None,
    Server,
    Global,
}

/// Which party issues the attribute value. The resource `id`, for example,
/// is always issued by the service provider and must not appear in POST
/// request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeIssuer {
    ServiceProvider,
    ProvisioningClient,
    NotSpecified,
}

/// Reference flavor for `reference` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Reference to an external resource; must be a URL.
    External,
    /// Any URI.
    Uri,
    /// Reference to a SCIM resource of one of the allowed types.
    Scim,
}

/// Custom per-value validator attached to an attribute.
pub type ValueValidator = fn(&ScimValue) -> ValidationIssues;

/// Immutable description of a single schema attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: AttrName,
    typ: AttrType,
    description: String,
    issuer: AttributeIssuer,
    required: bool,
    multi_valued: bool,
    case_exact: bool,
    canonical_values: Vec<String>,
    restrict_canonical_values: bool,
    mutability: Mutability,
    returned: Returned,
    uniqueness: Uniqueness,
    reference_kind: Option<ReferenceKind>,
    reference_types: Vec<String>,
    sub_attrs: Vec<Attribute>,
    validators: Vec<ValueValidator>,
    serializer: Option<ValueMapper>,
    deserializer: Option<ValueMapper>,
}

impl Attribute {
    fn base(name: &str, typ: AttrType) -> Self {
        let name = AttrName::new(name)
            .unwrap_or_else(|e| panic!("invalid attribute name in schema definition: {e}"));
        Self {
            name,
            typ,
            description: String::new(),
            issuer: AttributeIssuer::NotSpecified,
            required: false,
            multi_valued: false,
            case_exact: false,
            canonical_values: Vec::new(),
            restrict_canonical_values: false,
            mutability: Mutability::ReadWrite,
            returned: Returned::Default,
            uniqueness: Uniqueness::None,
            reference_kind: None,
            reference_types: Vec::new(),
            sub_attrs: Vec::new(),
            validators: Vec::new(),
            serializer: None,
            deserializer: None,
        }
    }

    /// A `string` attribute.
    ///
    /// # Panics
    /// Panics if `name` is not a valid attribute name. Schema definitions
    /// are programmer-provided; use [`AttrName::new`] to validate untrusted
    /// names first.
    pub fn string(name: &str) -> Self {
        Self::base(name, AttrType::String)
    }

    /// A `boolean` attribute. Panics on an invalid name, like
    /// [`Attribute::string`].
    pub fn boolean(name: &str) -> Self {
        Self::base(name, AttrType::Boolean)
    }

    /// An `integer` attribute. Panics on an invalid name.
    pub fn integer(name: &str) -> Self {
        Self::base(name, AttrType::Integer)
    }

    /// A `decimal` attribute. Panics on an invalid name.
    pub fn decimal(name: &str) -> Self {
        Self::base(name, AttrType::Decimal)
    }

    /// A `dateTime` attribute. Panics on an invalid name.
    pub fn date_time(name: &str) -> Self {
        Self::base(name, AttrType::DateTime)
    }

    /// A `binary` attribute; values are base64-encoded strings and compare
    /// case-exactly. Panics on an invalid name.
    pub fn binary(name: &str) -> Self {
        let mut attr = Self::base(name, AttrType::Binary);
        attr.case_exact = true;
        attr
    }

    /// A `reference` attribute pointing at an external resource. Panics on
    /// an invalid name.
    pub fn external_reference(name: &str) -> Self {
        let mut attr = Self::base(name, AttrType::Reference);
        attr.case_exact = true;
        attr.reference_kind = Some(ReferenceKind::External);
        attr.reference_types = vec!["external".to_owned()];
        attr
    }

    /// A `reference` attribute holding any URI. Panics on an invalid name.
    pub fn uri_reference(name: &str) -> Self {
        let mut attr = Self::base(name, AttrType::Reference);
        attr.case_exact = true;
        attr.reference_kind = Some(ReferenceKind::Uri);
        attr.reference_types = vec!["uri".to_owned()];
        attr
    }

    /// A `reference` attribute pointing at SCIM resources of the allowed
    /// types. Panics on an invalid name.
    pub fn scim_reference(name: &str, reference_types: &[&str]) -> Self {
        let mut attr = Self::base(name, AttrType::Reference);
        attr.case_exact = true;
        attr.reference_kind = Some(ReferenceKind::Scim);
        attr.reference_types = reference_types.iter().map(|s| (*s).to_owned()).collect();
        attr
    }

    /// A `complex` attribute with the given sub-attributes.
    ///
    /// # Panics
    /// Panics if `name` is invalid, if any sub-attribute is itself complex,
    /// or if two sub-attributes share a name.
    pub fn complex(name: &str, sub_attrs: Vec<Attribute>) -> Self {
        let mut attr = Self::base(name, AttrType::Complex);
        for sub in &sub_attrs {
            assert!(
                sub.typ != AttrType::Complex,
                "complex attributes can not contain complex sub-attributes",
            );
        }
        assert_unique_names(&sub_attrs, name);
        attr.sub_attrs = sub_attrs;
        attr
    }

    /// An attribute with varying content. Panics on an invalid name.
    pub fn unknown(name: &str) -> Self {
        Self::base(name, AttrType::Unknown)
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Marks the attribute as multi-valued. A multi-valued complex
    /// attribute without explicit sub-attributes receives the default
    /// `value` / `display` / `type` / `primary` / `$ref` set from
    /// RFC 7643 section 2.4.
    pub fn multi_valued(mut self, multi_valued: bool) -> Self {
        self.multi_valued = multi_valued;
        if multi_valued && self.typ == AttrType::Complex && self.sub_attrs.is_empty() {
            self.sub_attrs = default_multi_valued_sub_attrs();
        }
        self
    }

    pub fn case_exact(mut self, case_exact: bool) -> Self {
        self.case_exact = case_exact;
        self
    }

    pub fn mutability(mut self, mutability: Mutability) -> Self {
        self.mutability = mutability;
        self
    }

    pub fn returned(mut self, returned: Returned) -> Self {
        self.returned = returned;
        self
    }

    pub fn uniqueness(mut self, uniqueness: Uniqueness) -> Self {
        self.uniqueness = uniqueness;
        self
    }

    pub fn issuer(mut self, issuer: AttributeIssuer) -> Self {
        self.issuer = issuer;
        self
    }

    /// Sets canonical values. Values outside the set produce warning 1, or
    /// error 9 when [`Attribute::restrict_canonical_values`] is set.
    pub fn canonical_values(mut self, values: &[&str]) -> Self {
        self.canonical_values = values.iter().map(|s| (*s).to_owned()).collect();
        self
    }

    pub fn restrict_canonical_values(mut self, restrict: bool) -> Self {
        self.restrict_canonical_values = restrict;
        self
    }

    /// Adds a custom validator, run after the built-in validation passes.
    pub fn validator(mut self, validator: ValueValidator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn serializer(mut self, serializer: ValueMapper) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn deserializer(mut self, deserializer: ValueMapper) -> Self {
        self.deserializer = Some(deserializer);
        self
    }

    pub fn name(&self) -> &AttrName {
        &self.name
    }

    pub fn attr_type(&self) -> AttrType {
        self.typ
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_issuer(&self) -> AttributeIssuer {
        self.issuer
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_multi_valued(&self) -> bool {
        self.multi_valued
    }

    pub fn is_case_exact(&self) -> bool {
        self.case_exact
    }

    pub fn get_mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn get_returned(&self) -> Returned {
        self.returned
    }

    pub fn get_uniqueness(&self) -> Uniqueness {
        self.uniqueness
    }

    pub fn get_canonical_values(&self) -> &[String] {
        &self.canonical_values
    }

    pub fn get_reference_types(&self) -> &[String] {
        &self.reference_types
    }

    pub fn get_reference_kind(&self) -> Option<ReferenceKind> {
        self.reference_kind
    }

    /// Sub-attributes of a complex attribute; empty for other types.
    pub fn sub_attrs(&self) -> &[Attribute] {
        &self.sub_attrs
    }

    /// Case-insensitive sub-attribute lookup.
    pub fn sub_attr(&self, name: &str) -> Option<&Attribute> {
        self.sub_attrs.iter().find(|attr| attr.name == name)
    }

    pub(crate) fn has_custom_processing(&self) -> bool {
        self.serializer.is_some() || self.deserializer.is_some()
    }

    /// A single-valued copy, used to validate one element of a
    /// multi-valued attribute.
    pub(crate) fn as_single(&self) -> Attribute {
        let mut single = self.clone();
        single.multi_valued = false;
        single
    }

    /// A renamed copy, used to synthesize a `value` sub-attribute when a
    /// patch path filters a simple multi-valued attribute.
    pub(crate) fn with_name(&self, name: &str) -> Attribute {
        let mut renamed = self.clone();
        renamed.name = AttrName::new(name)
            .unwrap_or_else(|e| panic!("invalid attribute name: {e}"));
        renamed
    }

    /// Returns a copy with sub-attributes reduced to those passing the
    /// filter, or `None` when nothing survives.
    pub(crate) fn clone_with_sub_filter(&self, filter: &AttrFilter) -> Option<Attribute> {
        let mut cloned = self.clone();
        cloned.sub_attrs = filter.apply_to(&self.sub_attrs);
        if cloned.sub_attrs.is_empty() {
            None
        } else {
            Some(cloned)
        }
    }

    /// Validates a value against this attribute: type and encoding, then
    /// canonical values, duplicates, complex sub-attributes, and custom
    /// validators. Requiredness is not checked here; presence is a
    /// schema-level concern.
    pub fn validate(&self, value: &ScimValue) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        if value.is_null() {
            return issues;
        }
        if self.multi_valued {
            let Some(items) = value.as_array() else {
                issues.add_error(ValidationError::bad_type("list"), false);
                return issues;
            };
            for (i, item) in items.iter().enumerate() {
                issues.merge_at(loc![i], self.validate_single(item));
            }
            if self.typ == AttrType::Complex {
                self.validate_multi_complex(items, &mut issues);
            } else {
                self.validate_no_duplicates(items, &mut issues);
            }
        } else {
            issues.merge(self.validate_single(value));
        }
        for validator in &self.validators {
            if !issues.can_proceed() {
                break;
            }
            issues.merge(validator(value));
        }
        issues
    }

    fn validate_single(&self, value: &ScimValue) -> ValidationIssues {
        let mut issues = self.validate_type(value);
        if !issues.can_proceed() {
            return issues;
        }
        self.validate_canonical(value, &mut issues);
        if self.typ == AttrType::Complex {
            if let Some(data) = value.as_object() {
                for sub_attr in &self.sub_attrs {
                    if let Some(sub_value) = data.get_key(sub_attr.name.as_str()) {
                        issues.merge_at(loc![sub_attr.name.as_str()], sub_attr.validate(sub_value));
                    }
                }
            }
        }
        issues
    }

    fn validate_type(&self, value: &ScimValue) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        match self.typ {
            AttrType::Unknown => {}
            AttrType::String => {
                if value.as_str().is_none() {
                    issues.add_error(ValidationError::bad_type("string"), false);
                }
            }
            AttrType::Boolean => {
                if value.as_bool().is_none() {
                    issues.add_error(ValidationError::bad_type("boolean"), false);
                }
            }
            AttrType::Integer => {
                if value.as_i64().is_none() {
                    issues.add_error(ValidationError::bad_type("integer"), false);
                }
            }
            AttrType::Decimal => {
                if value.as_f64().is_none() {
                    issues.add_error(ValidationError::bad_type("decimal"), false);
                }
            }
            AttrType::DateTime => match value.as_str() {
                None => issues.add_error(ValidationError::bad_type("dateTime"), false),
                Some(text) => {
                    if parse_datetime(text).is_none() {
                        issues.add_error(ValidationError::bad_value_syntax(), false);
                    }
                }
            },
            AttrType::Binary => match value.as_str() {
                None => issues.add_error(ValidationError::bad_type("binary"), false),
                Some(text) => {
                    if !is_valid_base64(text) {
                        issues.add_error(ValidationError::bad_encoding("base64"), false);
                    }
                }
            },
            AttrType::Reference => match value.as_str() {
                None => issues.add_error(ValidationError::bad_type("reference"), false),
                Some(text) => self.validate_reference(text, &mut issues),
            },
            AttrType::Complex => {
                if value.as_object().is_none() {
                    issues.add_error(ValidationError::bad_type("complex"), false);
                }
            }
        }
        issues
    }

    fn validate_reference(&self, value: &str, issues: &mut ValidationIssues) {
        match self.reference_kind {
            Some(ReferenceKind::External) => {
                if !is_url_shaped(value) {
                    issues.add_error(ValidationError::bad_value_syntax(), false);
                }
            }
            Some(ReferenceKind::Scim) => {
                let known = registry::resources();
                let target_known = known.iter().any(|(name, endpoint)| {
                    self.reference_types.iter().any(|t| t == name) && value.contains(endpoint)
                });
                if !target_known {
                    issues.add_error(
                        ValidationError::bad_scim_reference(&self.reference_types),
                        false,
                    );
                }
            }
            _ => {}
        }
    }

    fn validate_canonical(&self, value: &ScimValue, issues: &mut ValidationIssues) {
        if self.canonical_values.is_empty() {
            return;
        }
        let Some(text) = value.as_str() else {
            return;
        };
        let canonical = self.canonical_values.iter().any(|allowed| {
            if self.case_exact {
                allowed == text
            } else {
                allowed.eq_ignore_ascii_case(text)
            }
        });
        if !canonical {
            if self.restrict_canonical_values {
                issues.add_error(ValidationError::must_be_one_of(&self.canonical_values), false);
            } else {
                issues.add_warning(ValidationWarning::should_be_one_of(&self.canonical_values));
            }
        }
    }

    fn validate_no_duplicates(&self, items: &[ScimValue], issues: &mut ValidationIssues) {
        for (i, item) in items.iter().enumerate() {
            if items[..i].contains(item) {
                issues.add_error(ValidationError::duplicated_values(), true);
                return;
            }
        }
    }

    fn validate_multi_complex(&self, items: &[ScimValue], issues: &mut ValidationIssues) {
        let objects: Vec<_> = items.iter().filter_map(ScimValue::as_object).collect();
        if self.sub_attr("primary").is_some() {
            let primaries = objects
                .iter()
                .filter(|item| item.get_key("primary").and_then(ScimValue::as_bool) == Some(true))
                .count();
            for _ in 1..primaries.max(1) {
                issues.add_error(ValidationError::multiple_primary_values(), true);
            }
        }
        if self.sub_attr("type").is_some() && self.sub_attr("value").is_some() {
            let mut pairs: Vec<(&ScimValue, &ScimValue)> = Vec::new();
            for item in &objects {
                let (Some(type_), Some(value)) =
                    (item.get_key("type"), item.get_key("value"))
                else {
                    continue;
                };
                if pairs.iter().any(|(t, v)| *t == type_ && *v == value) {
                    issues.add_warning(ValidationWarning::multiple_type_value_pairs());
                } else {
                    pairs.push((type_, value));
                }
            }
        }
    }

    /// Serializes a value according to this attribute's configuration.
    pub fn serialize(&self, value: &ScimValue) -> ScimValue {
        if let Some(custom) = self.serializer {
            return custom(value);
        }
        if self.multi_valued {
            if let Some(items) = value.as_array() {
                return ScimValue::Array(items.iter().map(|item| self.process_single(item, true)).collect());
            }
        }
        self.process_single(value, true)
    }

    /// Deserializes a value according to this attribute's configuration.
    pub fn deserialize(&self, value: &ScimValue) -> ScimValue {
        if let Some(custom) = self.deserializer {
            return custom(value);
        }
        if self.multi_valued {
            if let Some(items) = value.as_array() {
                return ScimValue::Array(
                    items.iter().map(|item| self.process_single(item, false)).collect(),
                );
            }
        }
        self.process_single(value, false)
    }

    fn process_single(&self, value: &ScimValue, serializing: bool) -> ScimValue {
        if self.typ == AttrType::Complex {
            if let Some(data) = value.as_object() {
                let mut processed = crate::scim_data::ScimData::new();
                for sub_attr in &self.sub_attrs {
                    if let Some(sub_value) = data.get_key(sub_attr.name.as_str()) {
                        let mapped = if serializing {
                            sub_attr.serialize(sub_value)
                        } else {
                            sub_attr.deserialize(sub_value)
                        };
                        processed.insert_key(sub_attr.name.as_str(), mapped);
                    }
                }
                return ScimValue::Object(processed);
            }
            return value.clone();
        }
        if self.has_custom_processing() {
            return value.clone();
        }
        let global = if serializing {
            registry::default_serializer(self.typ)
        } else {
            registry::default_deserializer(self.typ)
        };
        match global {
            Some(mapper) => mapper(value),
            None => value.clone(),
        }
    }

    /// Renders the attribute definition the way the `/Schemas` endpoint
    /// describes it.
    pub fn to_json(&self) -> Value {
        let mut output = Map::new();
        output.insert("name".into(), json!(self.name.as_str()));
        output.insert("type".into(), json!(self.typ.as_str()));
        output.insert("multiValued".into(), json!(self.multi_valued));
        output.insert("description".into(), json!(self.description));
        output.insert("required".into(), json!(self.required));
        if matches!(self.typ, AttrType::String | AttrType::Reference | AttrType::Binary) {
            output.insert("caseExact".into(), json!(self.case_exact));
        }
        output.insert("mutability".into(), serde_json::to_value(self.mutability).unwrap_or_default());
        output.insert("returned".into(), serde_json::to_value(self.returned).unwrap_or_default());
        if matches!(self.typ, AttrType::String | AttrType::Integer | AttrType::Decimal) {
            output.insert(
                "uniqueness".into(),
                serde_json::to_value(self.uniqueness).unwrap_or_default(),
            );
        }
        if !self.canonical_values.is_empty() {
            output.insert("canonicalValues".into(), json!(self.canonical_values));
        }
        if self.typ == AttrType::Reference {
            output.insert("referenceTypes".into(), json!(self.reference_types));
        }
        if self.typ == AttrType::Complex {
            output.insert(
                "subAttributes".into(),
                Value::Array(self.sub_attrs.iter().map(Attribute::to_json).collect()),
            );
        }
        Value::Object(output)
    }
}

fn default_multi_valued_sub_attrs() -> Vec<Attribute> {
    vec![
        Attribute::string("value"),
        Attribute::string("display").mutability(Mutability::Immutable),
        Attribute::string("type"),
        Attribute::boolean("primary"),
        Attribute::uri_reference("$ref"),
    ]
}

fn assert_unique_names(attrs: &[Attribute], owner: &str) {
    for (i, attr) in attrs.iter().enumerate() {
        assert!(
            !attrs[..i].iter().any(|other| other.name == attr.name),
            "duplicate attribute '{}' in '{owner}'",
            attr.name,
        );
    }
}

/// Parses a SCIM dateTime: RFC 3339, with the timezone offset optional.
pub(crate) fn parse_datetime(value: &str) -> Option<chrono::NaiveDateTime> {
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

fn is_valid_base64(value: &str) -> bool {
    let padded;
    let candidate = if value.len() % 4 != 0 {
        padded = format!("{value}{}", "=".repeat(4 - value.len() % 4));
        &padded
    } else {
        value
    };
    base64::engine::general_purpose::STANDARD.decode(candidate).is_ok()
}

fn is_url_shaped(value: &str) -> bool {
    match value.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split('/').next().unwrap_or("");
            !scheme.is_empty() && !host.is_empty()
        }
        None => false,
    }
}

/// Ordered collection of attributes addressable by name, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Attrs {
    attrs: Vec<Attribute>,
}

impl Attrs {
    /// Builds a collection.
    ///
    /// # Panics
    /// Panics when two attributes share a (case-insensitive) name. Use
    /// [`Attrs::try_new`] for untrusted definitions.
    pub fn new(attrs: Vec<Attribute>) -> Self {
        assert_unique_names(&attrs, "attrs");
        Self { attrs }
    }

    /// Fallible variant of [`Attrs::new`].
    pub fn try_new(attrs: Vec<Attribute>) -> ScimResult<Self> {
        for (i, attr) in attrs.iter().enumerate() {
            if attrs[..i].iter().any(|other| other.name == attr.name) {
                return Err(crate::error::ScimError::DuplicateAttribute {
                    schema: "attrs".into(),
                    attribute: attr.name.to_string(),
                });
            }
        }
        Ok(Self { attrs })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Case-insensitive lookup by attribute name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|attr| *attr.name() == name)
    }

    /// Returns a copy containing only attributes passing the filter.
    pub fn clone_filtered(&self, filter: &AttrFilter) -> Attrs {
        Attrs {
            attrs: filter.apply_to(&self.attrs),
        }
    }
}

/// Selects attributes by name lists and/or a metadata predicate.
///
/// Name entries may address whole attributes (`emails`) or single
/// sub-attributes (`name.givenName`). Complex attributes are filtered
/// recursively and dropped entirely when no sub-attribute survives.
#[derive(Debug, Clone, Default)]
pub struct AttrFilter {
    direct: Vec<AttrName>,
    sub_entries: Vec<(AttrName, AttrName)>,
    include: Option<bool>,
    predicate: Option<fn(&Attribute) -> bool>,
}

impl AttrFilter {
    /// A filter that keeps everything.
    pub fn none() -> Self {
        Self::default()
    }

    /// Keeps only the listed attributes and sub-attributes.
    pub fn include(names: &[&str]) -> ScimResult<Self> {
        Self::from_names(names, true)
    }

    /// Drops the listed attributes and sub-attributes.
    pub fn exclude(names: &[&str]) -> ScimResult<Self> {
        Self::from_names(names, false)
    }

    /// Keeps attributes satisfying the predicate. For complex attributes
    /// the predicate is applied to sub-attributes; a complex attribute with
    /// no surviving sub-attributes is dropped.
    pub fn matching(predicate: fn(&Attribute) -> bool) -> Self {
        Self {
            predicate: Some(predicate),
            ..Self::default()
        }
    }

    pub fn with_predicate(mut self, predicate: fn(&Attribute) -> bool) -> Self {
        self.predicate = Some(predicate);
        self
    }

    fn from_names(names: &[&str], include: bool) -> ScimResult<Self> {
        let mut filter = Self {
            include: Some(include),
            ..Self::default()
        };
        for name in names {
            let path = AttrPath::parse(name)?;
            match path.sub_attr() {
                Some(sub) => filter
                    .sub_entries
                    .push((path.attr().clone(), sub.clone())),
                None => filter.direct.push(path.attr().clone()),
            }
        }
        Ok(filter)
    }

    fn sub_names_for(&self, name: &AttrName) -> Vec<AttrName> {
        self.sub_entries
            .iter()
            .filter(|(attr, _)| attr == name)
            .map(|(_, sub)| sub.clone())
            .collect()
    }

    fn passes_predicate(&self, attr: &Attribute) -> bool {
        self.predicate.map_or(true, |p| p(attr))
    }

    /// Applies the filter to a list of attributes, returning the kept ones.
    pub(crate) fn apply_to(&self, attrs: &[Attribute]) -> Vec<Attribute> {
        let mut kept = Vec::new();
        for attr in attrs {
            let in_direct = self.direct.iter().any(|name| name == attr.name());
            let sub_names = self.sub_names_for(attr.name());

            if self.include == Some(false) && in_direct {
                continue;
            }

            if attr.attr_type() == AttrType::Complex {
                let sub_filter = match self.include {
                    Some(true) if in_direct => AttrFilter {
                        predicate: self.predicate,
                        ..AttrFilter::default()
                    },
                    Some(true) => {
                        if sub_names.is_empty() {
                            continue;
                        }
                        AttrFilter {
                            direct: sub_names,
                            include: Some(true),
                            predicate: self.predicate,
                            ..AttrFilter::default()
                        }
                    }
                    Some(false) => AttrFilter {
                        direct: sub_names,
                        include: Some(false),
                        predicate: self.predicate,
                        ..AttrFilter::default()
                    },
                    None => AttrFilter {
                        predicate: self.predicate,
                        ..AttrFilter::default()
                    },
                };
                if let Some(filtered) = attr.clone_with_sub_filter(&sub_filter) {
                    kept.push(filtered);
                }
                continue;
            }

            if !self.passes_predicate(attr) {
                continue;
            }
            if self.include == Some(true) && !in_direct && sub_names.is_empty() {
                continue;
            }
            kept.push(attr.clone());
        }
        kept
    }
}

/// Attributes bound to a schema URI, partitioned into the base schema and
/// its extensions. Iteration follows registration order: base attributes
/// first, then each extension's attributes.
#[derive(Debug, Clone)]
pub struct BoundedAttrs {
    schema: SchemaUri,
    common: Vec<AttrName>,
    base: Attrs,
    extensions: Vec<(SchemaUri, Attrs)>,
}

impl BoundedAttrs {
    pub fn new(schema: SchemaUri, attrs: Attrs, common: &[&str]) -> Self {
        let common = common
            .iter()
            .map(|name| {
                AttrName::new(name)
                    .unwrap_or_else(|e| panic!("invalid common attribute name: {e}"))
            })
            .collect();
        Self {
            schema,
            common,
            base: attrs,
            extensions: Vec::new(),
        }
    }

    pub fn schema(&self) -> &SchemaUri {
        &self.schema
    }

    /// Adds extension attributes under their own schema URI.
    pub fn extend(&mut self, schema: SchemaUri, attrs: Attrs) {
        self.extensions.push((schema, attrs));
    }

    pub fn extensions(&self) -> &[(SchemaUri, Attrs)] {
        &self.extensions
    }

    /// Iterates over all attributes, base first, with their bounded
    /// representations.
    pub fn iter(&self) -> impl Iterator<Item = (BoundedAttrRep, &Attribute)> {
        let base = self.base.iter().map(move |attr| {
            (
                BoundedAttrRep::bound(self.schema.clone(), false, attr.name().clone(), None),
                attr,
            )
        });
        let extensions = self.extensions.iter().flat_map(move |(uri, attrs)| {
            attrs.iter().map(move |attr| {
                (
                    BoundedAttrRep::bound(uri.clone(), true, attr.name().clone(), None),
                    attr,
                )
            })
        });
        base.chain(extensions)
    }

    /// Iterates over base attributes that are specific to this schema,
    /// excluding common ones like `id` or `meta`.
    pub fn core_attrs(&self) -> impl Iterator<Item = (BoundedAttrRep, &Attribute)> {
        let common = self.common.clone();
        self.base
            .iter()
            .filter(move |attr| !common.iter().any(|name| name == attr.name()))
            .map(move |attr| {
                (
                    BoundedAttrRep::bound(self.schema.clone(), false, attr.name().clone(), None),
                    attr,
                )
            })
    }

    /// Case-insensitive lookup of a top-level attribute by bare name,
    /// searching the base schema first, then extensions.
    pub fn get_name(&self, name: &str) -> Option<&Attribute> {
        self.base
            .get(name)
            .or_else(|| self.extensions.iter().find_map(|(_, attrs)| attrs.get(name)))
    }

    /// Resolves an attribute path to its attribute definition. Bounded
    /// paths only match the partition carrying their schema URI.
    pub fn get(&self, path: &AttrPath) -> Option<&Attribute> {
        let attr = match path {
            AttrPath::Bounded(rep) => {
                let attrs = if rep.schema() == &self.schema {
                    Some(&self.base)
                } else {
                    self.extensions
                        .iter()
                        .find(|(uri, _)| uri == rep.schema())
                        .map(|(_, attrs)| attrs)
                };
                attrs?.get(rep.attr().as_str())?
            }
            AttrPath::Unbounded(rep) => self.get_name(rep.attr().as_str())?,
        };
        match path.sub_attr() {
            Some(sub) => attr.sub_attr(sub.as_str()),
            None => Some(attr),
        }
    }

    /// Resolves a patch path to its attribute definition. A path with a
    /// value selection filter only matches multi-valued attributes.
    pub fn get_by_path(&self, path: &PatchPath) -> Option<&Attribute> {
        let attr = self.get(path.attr_path())?;
        if path.has_filter() && !attr.is_multi_valued() {
            return None;
        }
        match path.sub_attr_name() {
            Some(sub) => attr.sub_attr(sub.as_str()),
            None => Some(attr),
        }
    }

    /// Builds the canonical bounded representation for `attr[.sub]`,
    /// preserving the declared casing. Returns `None` when the attribute
    /// does not exist in the schema or its extensions.
    pub fn rep(&self, dotted: &str) -> Option<BoundedAttrRep> {
        let (attr_name, sub_name) = match dotted.split_once('.') {
            Some((attr, sub)) => (attr, Some(sub)),
            None => (dotted, None),
        };
        let partitions = std::iter::once((&self.schema, false, &self.base)).chain(
            self.extensions
                .iter()
                .map(|(uri, attrs)| (uri, true, attrs)),
        );
        for (uri, extension, attrs) in partitions {
            if let Some(attr) = attrs.get(attr_name) {
                let sub_attr = match sub_name {
                    Some(sub) => Some(attr.sub_attr(sub)?.name().clone()),
                    None => None,
                };
                return Some(BoundedAttrRep::bound(
                    uri.clone(),
                    extension,
                    attr.name().clone(),
                    sub_attr,
                ));
            }
        }
        None
    }

    /// Returns a copy with attributes reduced to those passing the filter.
    /// Attributes named in `keep` survive regardless. Extensions are
    /// filtered as well.
    pub fn clone_filtered(&self, filter: &AttrFilter, keep: &[&str]) -> BoundedAttrs {
        let mut filtered = filter.apply_to(
            &self.base.iter().cloned().collect::<Vec<_>>(),
        );
        let mut kept_in_front = Vec::new();
        for name in keep {
            if filtered.iter().any(|attr| *attr.name() == *name) {
                continue;
            }
            if let Some(attr) = self.base.get(name) {
                kept_in_front.push(attr.clone());
            }
        }
        kept_in_front.append(&mut filtered);
        let mut cloned = BoundedAttrs {
            schema: self.schema.clone(),
            common: self.common.clone(),
            base: Attrs::new(kept_in_front),
            extensions: Vec::new(),
        };
        for (uri, attrs) in &self.extensions {
            cloned
                .extensions
                .push((uri.clone(), attrs.clone_filtered(filter)));
        }
        cloned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(v: Value) -> ScimValue {
        ScimValue::from_json(&v)
    }

    #[test]
    fn type_mismatch_yields_code_2() {
        let attr = Attribute::string("userName");
        let issues = attr.validate(&value(json!(42)));
        assert_eq!(issues.error_codes_at(&loc![]), vec![2]);
    }

    #[test]
    fn date_time_syntax_yields_code_1() {
        let attr = Attribute::date_time("created");
        assert!(attr.validate(&value(json!("2011-05-13T04:42:34Z"))).is_empty());
        assert!(attr
            .validate(&value(json!("2011-05-13T04:42:34+01:00")))
            .is_empty());
        let issues = attr.validate(&value(json!("not-a-date")));
        assert_eq!(issues.error_codes_at(&loc![]), vec![1]);
    }

    #[test]
    fn binary_encoding_yields_code_3() {
        let attr = Attribute::binary("x509Certificate");
        assert!(attr.validate(&value(json!("QmFyYmFyYQ"))).is_empty());
        let issues = attr.validate(&value(json!("!!not-base64!!")));
        assert_eq!(issues.error_codes_at(&loc![]), vec![3]);
    }

    #[test]
    fn canonical_values_warn_unless_restricted() {
        let attr = Attribute::string("type").canonical_values(&["work", "home"]);
        let issues = attr.validate(&value(json!("other")));
        assert!(!issues.has_errors());
        assert_eq!(issues.warning_codes_at(&loc![]), vec![1]);

        let strict = Attribute::string("op")
            .canonical_values(&["add", "remove", "replace"])
            .restrict_canonical_values(true);
        let issues = strict.validate(&value(json!("merge")));
        assert_eq!(issues.error_codes_at(&loc![]), vec![9]);
    }

    #[test]
    fn multi_valued_items_are_validated_by_index() {
        let attr = Attribute::string("aliases").multi_valued(true);
        let issues = attr.validate(&value(json!(["ok", 13])));
        assert_eq!(issues.error_codes_at(&loc![1]), vec![2]);
        assert!(issues.error_codes_at(&loc![0]).is_empty());
    }

    #[test]
    fn duplicated_simple_values_yield_code_10() {
        let attr = Attribute::string("aliases").multi_valued(true);
        let issues = attr.validate(&value(json!(["a", "b", "a"])));
        assert_eq!(issues.error_codes_at(&loc![]), vec![10]);
    }

    #[test]
    fn surplus_primary_values_yield_code_15() {
        let attr = Attribute::complex("emails", vec![]).multi_valued(true);
        let issues = attr.validate(&value(json!([
            {"value": "a@x.com", "primary": true},
            {"value": "b@x.com", "primary": true},
            {"value": "c@x.com", "primary": true},
        ])));
        assert_eq!(issues.error_codes_at(&loc![]), vec![15, 15]);
    }

    #[test]
    fn complex_sub_attributes_are_validated() {
        let attr = Attribute::complex(
            "name",
            vec![Attribute::string("givenName"), Attribute::string("familyName")],
        );
        let issues = attr.validate(&value(json!({"givenName": 1, "familyName": "Jensen"})));
        assert_eq!(issues.error_codes_at(&loc!["givenName"]), vec![2]);
    }

    #[test]
    fn attr_filter_excludes_sub_attributes() {
        let attrs = Attrs::new(vec![
            Attribute::string("userName"),
            Attribute::complex(
                "name",
                vec![Attribute::string("givenName"), Attribute::string("familyName")],
            ),
        ]);
        let filter = AttrFilter::exclude(&["name.givenName"]).unwrap();
        let filtered = attrs.clone_filtered(&filter);
        let name = filtered.get("name").unwrap();
        assert!(name.sub_attr("givenName").is_none());
        assert!(name.sub_attr("familyName").is_some());
    }

    #[test]
    fn include_filter_keeps_only_listed() {
        let attrs = Attrs::new(vec![
            Attribute::string("userName"),
            Attribute::string("nickName"),
        ]);
        let filter = AttrFilter::include(&["nickName"]).unwrap();
        let filtered = attrs.clone_filtered(&filter);
        assert!(filtered.get("userName").is_none());
        assert!(filtered.get("nickName").is_some());
    }

    #[test]
    fn process_wide_default_serializer_applies_per_type() {
        fn strip_padding(value: &ScimValue) -> ScimValue {
            match value.as_str() {
                Some(text) => ScimValue::from(text.trim_end_matches('=')),
                None => value.clone(),
            }
        }
        registry::set_default_serializer(AttrType::Binary, strip_padding);

        let attr = Attribute::binary("photo");
        let serialized = attr.serialize(&value(json!("QmFyYmFyYQ==")));
        assert_eq!(serialized, ScimValue::from("QmFyYmFyYQ"));

        // a custom per-attribute serializer takes precedence
        fn identity(value: &ScimValue) -> ScimValue {
            value.clone()
        }
        let custom = Attribute::binary("photo").serializer(identity);
        let serialized = custom.serialize(&value(json!("QmFyYmFyYQ==")));
        assert_eq!(serialized, ScimValue::from("QmFyYmFyYQ=="));
    }

    #[test]
    fn predicate_filter_drops_emptied_complex() {
        let attrs = Attrs::new(vec![Attribute::complex(
            "meta",
            vec![
                Attribute::string("resourceType").mutability(Mutability::ReadOnly),
                Attribute::string("version").mutability(Mutability::ReadOnly),
            ],
        )]);
        let filter = AttrFilter::matching(|attr| attr.get_mutability() != Mutability::ReadOnly);
        assert!(attrs.clone_filtered(&filter).get("meta").is_none());
    }
}
