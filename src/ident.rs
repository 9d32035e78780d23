//! Canonical identifiers for attributes, sub-attributes, and schemas.
//!
//! Attribute names and schema URIs compare case-insensitively but preserve
//! the casing they were created with, as RFC 7643 requires.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{ScimError, ScimResult};
use crate::issues::{Location, ValidationError, ValidationIssues};
use crate::registry;

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_uri_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
}

/// A validated SCIM attribute name.
///
/// Must match `ALPHA (ALPHA | DIGIT | '-' | '_')*`; the special `$ref`
/// name from RFC 7643 is also accepted.
#[derive(Debug, Clone)]
pub struct AttrName(String);

impl AttrName {
    pub fn new(value: &str) -> ScimResult<Self> {
        let valid = value == "$ref"
            || (value
                .chars()
                .next()
                .is_some_and(is_name_start)
                && value.chars().skip(1).all(is_name_char));
        if valid {
            Ok(Self(value.to_owned()))
        } else {
            Err(ScimError::InvalidAttrName(value.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for AttrName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for AttrName {}

impl PartialEq<str> for AttrName {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq<&str> for AttrName {
    fn eq(&self, other: &&str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl Hash for AttrName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated SCIM schema URI: colon-separated segments of word
/// characters, dots, and dashes.
#[derive(Debug, Clone)]
pub struct SchemaUri(String);

impl SchemaUri {
    pub fn new(value: &str) -> ScimResult<Self> {
        let valid = !value.is_empty()
            && value
                .split(':')
                .all(|segment| !segment.is_empty() && segment.chars().all(is_uri_segment_char));
        if valid {
            Ok(Self(value.to_owned()))
        } else {
            Err(ScimError::InvalidSchemaUri(value.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for SchemaUri {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for SchemaUri {}

impl PartialEq<str> for SchemaUri {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl Hash for SchemaUri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for SchemaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Representation of an attribute or sub-attribute with no schema
/// association.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrRep {
    attr: AttrName,
    sub_attr: Option<AttrName>,
}

impl AttrRep {
    pub fn new(attr: &str) -> ScimResult<Self> {
        Ok(Self {
            attr: AttrName::new(attr)?,
            sub_attr: None,
        })
    }

    pub fn with_sub(attr: &str, sub_attr: &str) -> ScimResult<Self> {
        Ok(Self {
            attr: AttrName::new(attr)?,
            sub_attr: Some(AttrName::new(sub_attr)?),
        })
    }

    pub(crate) fn from_parts(attr: AttrName, sub_attr: Option<AttrName>) -> Self {
        Self { attr, sub_attr }
    }

    pub fn attr(&self) -> &AttrName {
        &self.attr
    }

    pub fn sub_attr(&self) -> Option<&AttrName> {
        self.sub_attr.as_ref()
    }

    pub fn is_sub_attr(&self) -> bool {
        self.sub_attr.is_some()
    }

    /// Issue location for this representation.
    pub fn location(&self) -> Location {
        let mut location = Location::root().child(self.attr.as_str());
        if let Some(sub) = &self.sub_attr {
            location = location.child(sub.as_str());
        }
        location
    }

    /// This representation without its sub-attribute.
    pub fn parent(&self) -> AttrRep {
        AttrRep {
            attr: self.attr.clone(),
            sub_attr: None,
        }
    }
}

impl fmt::Display for AttrRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_attr {
            Some(sub) => write!(f, "{}.{}", self.attr, sub),
            None => write!(f, "{}", self.attr),
        }
    }
}

/// Representation of an attribute or sub-attribute bound to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundedAttrRep {
    schema: SchemaUri,
    extension: bool,
    attr: AttrName,
    sub_attr: Option<AttrName>,
}

impl BoundedAttrRep {
    /// Creates a bounded representation, resolving the extension flag from
    /// the registry. The schema must have been registered, which happens
    /// when a schema object carrying it is constructed.
    pub fn new(schema: &str, attr: &str) -> ScimResult<Self> {
        Self::build(schema, attr, None)
    }

    /// Like [`BoundedAttrRep::new`], for a sub-attribute.
    pub fn with_sub(schema: &str, attr: &str, sub_attr: &str) -> ScimResult<Self> {
        Self::build(schema, attr, Some(sub_attr))
    }

    fn build(schema: &str, attr: &str, sub_attr: Option<&str>) -> ScimResult<Self> {
        let schema = SchemaUri::new(schema)?;
        let extension = registry::schema_kind(schema.as_str())
            .ok_or_else(|| ScimError::UnknownSchema(schema.as_str().to_owned()))?;
        Ok(Self {
            schema,
            extension,
            attr: AttrName::new(attr)?,
            sub_attr: sub_attr.map(AttrName::new).transpose()?,
        })
    }

    /// Creates a bounded representation with a known extension flag,
    /// bypassing the registry. Used by schema internals, which know which
    /// partition an attribute belongs to.
    pub(crate) fn bound(
        schema: SchemaUri,
        extension: bool,
        attr: AttrName,
        sub_attr: Option<AttrName>,
    ) -> Self {
        Self {
            schema,
            extension,
            attr,
            sub_attr,
        }
    }

    pub fn schema(&self) -> &SchemaUri {
        &self.schema
    }

    pub fn is_extension(&self) -> bool {
        self.extension
    }

    pub fn attr(&self) -> &AttrName {
        &self.attr
    }

    pub fn sub_attr(&self) -> Option<&AttrName> {
        self.sub_attr.as_ref()
    }

    pub fn is_sub_attr(&self) -> bool {
        self.sub_attr.is_some()
    }

    /// Issue location for this representation. Extension attributes are
    /// located under their schema URI namespace.
    pub fn location(&self) -> Location {
        let mut location = Location::root();
        if self.extension {
            location = location.child(self.schema.as_str());
        }
        location = location.child(self.attr.as_str());
        if let Some(sub) = &self.sub_attr {
            location = location.child(sub.as_str());
        }
        location
    }

    /// This representation without its sub-attribute.
    pub fn parent(&self) -> BoundedAttrRep {
        BoundedAttrRep {
            schema: self.schema.clone(),
            extension: self.extension,
            attr: self.attr.clone(),
            sub_attr: None,
        }
    }

    pub(crate) fn child(&self, sub_attr: AttrName) -> BoundedAttrRep {
        BoundedAttrRep {
            schema: self.schema.clone(),
            extension: self.extension,
            attr: self.attr.clone(),
            sub_attr: Some(sub_attr),
        }
    }

    /// The unbounded form of this representation.
    pub fn unbounded(&self) -> AttrRep {
        AttrRep {
            attr: self.attr.clone(),
            sub_attr: self.sub_attr.clone(),
        }
    }
}

impl fmt::Display for BoundedAttrRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.schema, self.attr)?;
        if let Some(sub) = &self.sub_attr {
            write!(f, ".{sub}")?;
        }
        Ok(())
    }
}

/// Either an unbounded or a schema-bound attribute representation, as
/// produced by parsing `[uri:]attr[.sub]` strings from filters, patch
/// paths, sort parameters, and attribute selections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrPath {
    Unbounded(AttrRep),
    Bounded(BoundedAttrRep),
}

impl AttrPath {
    /// Parses an attribute representation. Strings with a URI prefix yield
    /// the bounded variant; the URI must be registered.
    pub fn parse(value: &str) -> ScimResult<Self> {
        let (schema, rep) = split_attr_rep(value)?;
        let (attr, sub_attr) = split_attr_name(rep)?;
        match schema {
            Some(uri) => Ok(Self::Bounded(BoundedAttrRep::build(
                uri,
                attr,
                sub_attr,
            )?)),
            None => {
                let attr = AttrName::new(attr)?;
                let sub_attr = sub_attr.map(AttrName::new).transpose()?;
                Ok(Self::Unbounded(AttrRep::from_parts(attr, sub_attr)))
            }
        }
    }

    /// Validates an attribute representation, reporting issue code 17 when
    /// it is malformed or names an unknown schema.
    pub fn validate(value: &str) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        if Self::parse(value).is_err() {
            issues.add_error(ValidationError::bad_attribute_name(value), false);
        }
        issues
    }

    pub fn attr(&self) -> &AttrName {
        match self {
            Self::Unbounded(rep) => rep.attr(),
            Self::Bounded(rep) => rep.attr(),
        }
    }

    pub fn sub_attr(&self) -> Option<&AttrName> {
        match self {
            Self::Unbounded(rep) => rep.sub_attr(),
            Self::Bounded(rep) => rep.sub_attr(),
        }
    }

    pub fn is_sub_attr(&self) -> bool {
        self.sub_attr().is_some()
    }

    pub fn schema(&self) -> Option<&SchemaUri> {
        match self {
            Self::Unbounded(_) => None,
            Self::Bounded(rep) => Some(rep.schema()),
        }
    }

    /// Issue location for this representation.
    pub fn location(&self) -> Location {
        match self {
            Self::Unbounded(rep) => rep.location(),
            Self::Bounded(rep) => rep.location(),
        }
    }

    /// This path without its sub-attribute.
    pub fn parent(&self) -> AttrPath {
        match self {
            Self::Unbounded(rep) => Self::Unbounded(rep.parent()),
            Self::Bounded(rep) => Self::Bounded(rep.parent()),
        }
    }

    /// Whether two paths designate the same attribute. Schema URIs are
    /// compared only when both paths carry one.
    pub fn designates_same(&self, other: &AttrPath) -> bool {
        if self.attr() != other.attr() {
            return false;
        }
        if self.sub_attr() != other.sub_attr() {
            return false;
        }
        match (self.schema(), other.schema()) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Whether two paths designate the same top-level attribute, ignoring
    /// sub-attributes.
    pub fn same_parent(&self, other: &AttrPath) -> bool {
        self.parent().designates_same(&other.parent())
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded(rep) => write!(f, "{rep}"),
            Self::Bounded(rep) => write!(f, "{rep}"),
        }
    }
}

/// Splits `[uri:]attr[.sub]` into the optional URI prefix and the
/// attribute part.
fn split_attr_rep(value: &str) -> ScimResult<(Option<&str>, &str)> {
    match value.rfind(':') {
        Some(index) => {
            let (schema, rest) = value.split_at(index);
            let rep = &rest[1..];
            if schema.is_empty() || rep.is_empty() {
                return Err(ScimError::InvalidAttrRep(value.to_owned()));
            }
            Ok((Some(schema), rep))
        }
        None => Ok((None, value)),
    }
}

/// Splits `attr[.sub]` into the attribute and the optional sub-attribute.
fn split_attr_name(value: &str) -> ScimResult<(&str, Option<&str>)> {
    match value.split_once('.') {
        Some((attr, sub_attr)) => {
            if sub_attr.contains('.') {
                return Err(ScimError::InvalidAttrRep(value.to_owned()));
            }
            Ok((attr, Some(sub_attr)))
        }
        None => Ok((value, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_names_are_case_insensitive() {
        let a = AttrName::new("userName").unwrap();
        let b = AttrName::new("USERNAME").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "userName");
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(AttrName::new("").is_err());
        assert!(AttrName::new("2fast").is_err());
        assert!(AttrName::new("user name").is_err());
        assert!(AttrName::new("$ref").is_ok());
        assert!(AttrName::new("a-b_c1").is_ok());
    }

    #[test]
    fn parses_dotted_reps() {
        let path = AttrPath::parse("name.givenName").unwrap();
        assert_eq!(path.attr(), &AttrName::new("name").unwrap());
        assert_eq!(path.sub_attr().unwrap().as_str(), "givenName");
        assert!(path.schema().is_none());
    }

    #[test]
    fn parses_uri_prefixed_reps() {
        crate::registry::register_schema("urn:test:ident:Thing", false);
        let path = AttrPath::parse("urn:test:ident:Thing:field.sub").unwrap();
        assert_eq!(path.schema().unwrap().as_str(), "urn:test:ident:Thing");
        assert_eq!(path.attr().as_str(), "field");
        assert_eq!(path.sub_attr().unwrap().as_str(), "sub");
    }

    #[test]
    fn unknown_schema_fails_validation() {
        let issues = AttrPath::validate("urn:never:registered:attr");
        assert_eq!(issues.error_codes_at(&crate::loc![]), vec![17]);
    }

    #[test]
    fn designates_same_ignores_schema_when_one_side_unbounded() {
        crate::registry::register_schema("urn:test:ident:Other", false);
        let bounded = AttrPath::parse("urn:test:ident:Other:field").unwrap();
        let unbounded = AttrPath::parse("Field").unwrap();
        assert!(bounded.designates_same(&unbounded));
    }
}
