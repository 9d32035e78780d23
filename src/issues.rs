//! Collection of coded validation errors and warnings.
//!
//! Validation never short-circuits: every independent problem found in a
//! payload is recorded in a [`ValidationIssues`] tree, tagged with the
//! location (attribute names and array indices) it was found at. Issues can
//! be merged into a parent collection under a location prefix, inspected by
//! code, and rendered to a nested JSON structure for display.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// SCIM error types, as defined in RFC 7644 section 3.12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScimErrorType {
    InvalidFilter,
    TooMany,
    Uniqueness,
    Mutability,
    InvalidSyntax,
    InvalidPath,
    NoTarget,
    InvalidValue,
    InvalidVers,
    Sensitive,
}

impl ScimErrorType {
    /// The wire form of the error type (`scimType` attribute value).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFilter => "invalidFilter",
            Self::TooMany => "tooMany",
            Self::Uniqueness => "uniqueness",
            Self::Mutability => "mutability",
            Self::InvalidSyntax => "invalidSyntax",
            Self::InvalidPath => "invalidPath",
            Self::NoTarget => "noTarget",
            Self::InvalidValue => "invalidValue",
            Self::InvalidVers => "invalidVers",
            Self::Sensitive => "sensitive",
        }
    }
}

impl fmt::Display for ScimErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One segment of an issue location: an attribute name or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocationKey {
    Attr(String),
    Index(usize),
}

impl From<&str> for LocationKey {
    fn from(value: &str) -> Self {
        Self::Attr(value.to_owned())
    }
}

impl From<String> for LocationKey {
    fn from(value: String) -> Self {
        Self::Attr(value)
    }
}

impl From<usize> for LocationKey {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attr(name) => f.write_str(name),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Path of keys identifying where in the payload an issue was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location(Vec<LocationKey>);

impl Location {
    /// The top-level location.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_keys(keys: Vec<LocationKey>) -> Self {
        Self(keys)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[LocationKey] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns this location extended with one more key.
    pub fn child(&self, key: impl Into<LocationKey>) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Self(keys)
    }

    /// Returns this location followed by all keys of `other`.
    pub fn join(&self, other: &Location) -> Self {
        let mut keys = self.0.clone();
        keys.extend(other.0.iter().cloned());
        Self(keys)
    }

    pub fn starts_with(&self, prefix: &Location) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Strips `prefix` from the front of this location.
    pub fn strip_prefix(&self, prefix: &Location) -> Option<Location> {
        if self.starts_with(prefix) {
            Some(Location(self.0[prefix.0.len()..].to_vec()))
        } else {
            None
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Builds a [`Location`] from a list of attribute names and indices.
///
/// ```
/// use scim_validator::loc;
///
/// let location = loc!["emails", 0, "value"];
/// assert_eq!(location.to_string(), "emails.0.value");
/// ```
#[macro_export]
macro_rules! loc {
    () => { $crate::issues::Location::root() };
    ($($key:expr),+ $(,)?) => {
        $crate::issues::Location::from_keys(
            vec![$($crate::issues::LocationKey::from($key)),+],
        )
    };
}

/// A single coded validation error.
///
/// Errors are identified by stable numeric codes; each code has a fixed
/// human-readable message template. Two errors are considered equal when
/// their codes match.
#[derive(Debug, Clone)]
pub struct ValidationError {
    code: u16,
    message: String,
    scim_type: ScimErrorType,
}

impl PartialEq for ValidationError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl ValidationError {
    fn new(code: u16, scim_type: ScimErrorType, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            scim_type,
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn scim_type(&self) -> ScimErrorType {
        self.scim_type
    }

    pub(crate) fn set_scim_type(&mut self, scim_type: ScimErrorType) {
        self.scim_type = scim_type;
    }

    pub fn bad_value_syntax() -> Self {
        Self::new(1, ScimErrorType::InvalidSyntax, "bad value syntax")
    }

    pub fn bad_type(expected: &str) -> Self {
        Self::new(
            2,
            ScimErrorType::InvalidValue,
            format!("bad type, expecting '{expected}'"),
        )
    }

    pub fn bad_encoding(expected: &str) -> Self {
        Self::new(
            3,
            ScimErrorType::InvalidValue,
            format!("bad encoding, expecting '{expected}'"),
        )
    }

    pub fn bad_value_content() -> Self {
        Self::new(4, ScimErrorType::InvalidValue, "bad value content")
    }

    pub fn missing() -> Self {
        Self::new(5, ScimErrorType::InvalidValue, "missing")
    }

    pub fn must_not_be_provided() -> Self {
        Self::new(6, ScimErrorType::InvalidValue, "must not be provided")
    }

    pub fn must_not_be_returned() -> Self {
        Self::new(7, ScimErrorType::InvalidValue, "must not be returned")
    }

    pub fn must_be_equal_to(value: impl fmt::Display) -> Self {
        Self::new(
            8,
            ScimErrorType::InvalidValue,
            format!("must be equal to {value}"),
        )
    }

    pub fn must_be_one_of(expected: &[impl fmt::Display]) -> Self {
        let rendered: Vec<String> = expected.iter().map(|v| format!("'{v}'")).collect();
        Self::new(
            9,
            ScimErrorType::InvalidValue,
            format!("must be one of: {}", rendered.join(", ")),
        )
    }

    pub fn duplicated_values() -> Self {
        Self::new(
            10,
            ScimErrorType::InvalidValue,
            "contains duplicates, which are not allowed",
        )
    }

    pub fn cannot_be_used_together(other: &str) -> Self {
        Self::new(
            11,
            ScimErrorType::InvalidValue,
            format!("can not be used together with '{other}'"),
        )
    }

    pub fn missing_main_schema() -> Self {
        Self::new(12, ScimErrorType::InvalidValue, "missing main schema")
    }

    pub fn missing_schema_extension(extension: &str) -> Self {
        Self::new(
            13,
            ScimErrorType::InvalidValue,
            format!("missing schema extension '{extension}'"),
        )
    }

    pub fn unknown_schema() -> Self {
        Self::new(14, ScimErrorType::InvalidValue, "unknown schema")
    }

    pub fn multiple_primary_values() -> Self {
        Self::new(
            15,
            ScimErrorType::InvalidValue,
            "'primary' attribute set to 'true' MUST appear no more than once",
        )
    }

    pub fn bad_scim_reference(allowed: &[impl fmt::Display]) -> Self {
        let rendered: Vec<String> = allowed.iter().map(|v| format!("'{v}'")).collect();
        Self::new(
            16,
            ScimErrorType::InvalidValue,
            format!("bad SCIM reference, allowed resources: {}", rendered.join(", ")),
        )
    }

    pub fn bad_attribute_name(attribute: &str) -> Self {
        Self::new(
            17,
            ScimErrorType::InvalidValue,
            format!("bad attribute name '{attribute}'"),
        )
    }

    pub fn bad_error_status() -> Self {
        Self::new(
            18,
            ScimErrorType::InvalidValue,
            "error status must be greater or equal to 300 and lesser than 600",
        )
    }

    pub fn bad_status_code(expected: u16) -> Self {
        Self::new(
            19,
            ScimErrorType::InvalidValue,
            format!("bad status code, expecting '{expected}'"),
        )
    }

    pub fn bad_number_of_resources(reason: &str) -> Self {
        Self::new(
            20,
            ScimErrorType::InvalidValue,
            format!("bad number of resources, {reason}"),
        )
    }

    pub fn resources_not_filtered() -> Self {
        Self::new(21, ScimErrorType::InvalidValue, "does not match the filter")
    }

    pub fn resources_not_sorted() -> Self {
        Self::new(22, ScimErrorType::InvalidValue, "resources are not sorted")
    }

    pub fn unknown_operation_resource() -> Self {
        Self::new(
            25,
            ScimErrorType::InvalidValue,
            "unknown bulk operation resource",
        )
    }

    pub fn too_many_bulk_operations(max: usize) -> Self {
        Self::new(
            26,
            ScimErrorType::InvalidValue,
            format!("too many operations in bulk (max {max})"),
        )
    }

    pub fn too_many_errors_in_bulk(max: usize) -> Self {
        Self::new(
            27,
            ScimErrorType::InvalidValue,
            format!("too many errors in bulk (max {max})"),
        )
    }

    pub fn unknown_modification_target() -> Self {
        Self::new(28, ScimErrorType::NoTarget, "unknown modification target")
    }

    pub fn attribute_cannot_be_modified() -> Self {
        Self::new(29, ScimErrorType::Mutability, "attribute can not be modified")
    }

    pub fn attribute_cannot_be_deleted() -> Self {
        Self::new(30, ScimErrorType::Mutability, "attribute can not be deleted")
    }

    pub fn not_supported() -> Self {
        Self::new(
            31,
            ScimErrorType::InvalidValue,
            "value or operation not supported",
        )
    }

    pub fn bracket_not_opened_or_closed() -> Self {
        Self::new(
            100,
            ScimErrorType::InvalidFilter,
            "one of brackets is not opened / closed",
        )
    }

    pub fn complex_bracket_not_opened_or_closed() -> Self {
        Self::new(
            101,
            ScimErrorType::InvalidFilter,
            "one of complex attribute brackets is not opened / closed",
        )
    }

    pub fn complex_sub_attribute(attr: &str, sub_attr: &str) -> Self {
        Self::new(
            102,
            ScimErrorType::InvalidFilter,
            format!("sub-attribute '{sub_attr}' of '{attr}' can not be complex"),
        )
    }

    pub fn missing_operand(operator: &str, expression: &str) -> Self {
        Self::new(
            103,
            ScimErrorType::InvalidFilter,
            format!("missing operand for operator '{operator}' in expression '{expression}'"),
        )
    }

    pub fn unknown_operator(operator: &str, expression: &str) -> Self {
        Self::new(
            104,
            ScimErrorType::InvalidFilter,
            format!("unknown operator '{operator}' in expression '{expression}'"),
        )
    }

    pub fn empty_filter_expression() -> Self {
        Self::new(
            105,
            ScimErrorType::InvalidFilter,
            "no expression or empty expression inside grouping operator",
        )
    }

    pub fn unknown_expression(expression: &str) -> Self {
        Self::new(
            106,
            ScimErrorType::InvalidFilter,
            format!("unknown expression '{expression}'"),
        )
    }

    pub fn inner_complex_group() -> Self {
        Self::new(
            107,
            ScimErrorType::InvalidFilter,
            "complex attribute group can not contain inner complex attributes or square brackets",
        )
    }

    pub fn empty_complex_group(attribute: &str) -> Self {
        Self::new(
            108,
            ScimErrorType::InvalidFilter,
            format!("complex attribute group '{attribute}' has no expression"),
        )
    }

    pub fn bad_operand(value: &str) -> Self {
        Self::new(
            109,
            ScimErrorType::InvalidFilter,
            format!("bad operand '{value}'"),
        )
    }

    pub fn non_compatible_operand(value: &str, operator: &str) -> Self {
        Self::new(
            110,
            ScimErrorType::InvalidFilter,
            format!("operand '{value}' is not compatible with '{operator}' operator"),
        )
    }
}

/// A single coded validation warning.
///
/// Warnings are informational; they never gate downstream behavior.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    code: u16,
    message: String,
}

impl PartialEq for ValidationWarning {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl ValidationWarning {
    fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn should_be_one_of(expected: &[impl fmt::Display]) -> Self {
        let rendered: Vec<String> = expected.iter().map(|v| format!("'{v}'")).collect();
        Self::new(1, format!("value should be one of: {}", rendered.join(", ")))
    }

    pub fn multiple_type_value_pairs() -> Self {
        Self::new(
            2,
            "multi-valued complex attribute should contain a given type-value pair \
             no more than once",
        )
    }

    pub fn unexpected_content(reason: &str) -> Self {
        Self::new(3, format!("unexpected content, {reason}"))
    }

    pub fn missing() -> Self {
        Self::new(4, "missing")
    }

    pub fn should_not_equal_to(value: impl fmt::Display) -> Self {
        Self::new(5, format!("should not equal to {value}"))
    }
}

/// Tree of validation errors and warnings, keyed by location.
///
/// Errors added with `proceed = false` mark their location as terminal:
/// [`ValidationIssues::can_proceed_at`] reports whether further checks at a
/// location (or below it) still make sense.
#[derive(Debug, Clone, Default)]
pub struct ValidationIssues {
    errors: Vec<(Location, Vec<ValidationError>)>,
    warnings: Vec<(Location, Vec<ValidationWarning>)>,
    stop: Vec<Location>,
}

impl ValidationIssues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Adds an error at the top level.
    pub fn add_error(&mut self, error: ValidationError, proceed: bool) {
        self.add_error_at(Location::root(), error, proceed);
    }

    /// Adds an error at the given location. `proceed = false` marks the
    /// location as not worth validating further.
    pub fn add_error_at(&mut self, location: Location, error: ValidationError, proceed: bool) {
        if !proceed && !self.stop.contains(&location) {
            self.stop.push(location.clone());
        }
        match self.errors.iter_mut().find(|(loc, _)| *loc == location) {
            Some((_, errors)) => errors.push(error),
            None => self.errors.push((location, vec![error])),
        }
    }

    /// Adds a warning at the top level.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.add_warning_at(Location::root(), warning);
    }

    /// Adds a warning at the given location.
    pub fn add_warning_at(&mut self, location: Location, warning: ValidationWarning) {
        match self.warnings.iter_mut().find(|(loc, _)| *loc == location) {
            Some((_, warnings)) => warnings.push(warning),
            None => self.warnings.push((location, vec![warning])),
        }
    }

    /// Merges `other` into this collection at the top level.
    pub fn merge(&mut self, other: ValidationIssues) {
        self.merge_at(Location::root(), other);
    }

    /// Merges `other` into this collection, prefixing every location with
    /// `prefix`.
    pub fn merge_at(&mut self, prefix: Location, other: ValidationIssues) {
        for (location, errors) in other.errors {
            let location = prefix.join(&location);
            match self.errors.iter_mut().find(|(loc, _)| *loc == location) {
                Some((_, existing)) => existing.extend(errors),
                None => self.errors.push((location, errors)),
            }
        }
        for (location, warnings) in other.warnings {
            let location = prefix.join(&location);
            match self.warnings.iter_mut().find(|(loc, _)| *loc == location) {
                Some((_, existing)) => existing.extend(warnings),
                None => self.warnings.push((location, warnings)),
            }
        }
        for location in other.stop {
            let location = prefix.join(&location);
            if !self.stop.contains(&location) {
                self.stop.push(location);
            }
        }
    }

    /// Whether any error has been recorded anywhere.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether any error has been recorded at `prefix` or below.
    pub fn has_errors_at(&self, prefix: &Location) -> bool {
        self.errors.iter().any(|(loc, _)| loc.starts_with(prefix))
    }

    /// Whether validation may continue at the top level.
    pub fn can_proceed(&self) -> bool {
        self.can_proceed_at(&Location::root())
    }

    /// Whether validation may continue at the given location. Returns false
    /// when the location, or any of its ancestors, was marked terminal.
    pub fn can_proceed_at(&self, location: &Location) -> bool {
        !self
            .stop
            .iter()
            .any(|stopped| location.starts_with(stopped))
    }

    /// Iterates over all errors with their locations.
    pub fn errors(&self) -> impl Iterator<Item = (&Location, &ValidationError)> {
        self.errors
            .iter()
            .flat_map(|(loc, errors)| errors.iter().map(move |e| (loc, e)))
    }

    /// Iterates over all warnings with their locations.
    pub fn warnings(&self) -> impl Iterator<Item = (&Location, &ValidationWarning)> {
        self.warnings
            .iter()
            .flat_map(|(loc, warnings)| warnings.iter().map(move |w| (loc, w)))
    }

    /// Error codes recorded exactly at `location`.
    pub fn error_codes_at(&self, location: &Location) -> Vec<u16> {
        self.errors
            .iter()
            .filter(|(loc, _)| loc == location)
            .flat_map(|(_, errors)| errors.iter().map(|e| e.code()))
            .collect()
    }

    /// Warning codes recorded exactly at `location`.
    pub fn warning_codes_at(&self, location: &Location) -> Vec<u16> {
        self.warnings
            .iter()
            .filter(|(loc, _)| loc == location)
            .flat_map(|(_, warnings)| warnings.iter().map(|w| w.code()))
            .collect()
    }

    /// Returns a copy of the subtree under `prefix`, re-rooted at `prefix`.
    pub fn get(&self, prefix: &Location) -> ValidationIssues {
        let mut copy = ValidationIssues::new();
        for (location, errors) in &self.errors {
            if let Some(stripped) = location.strip_prefix(prefix) {
                copy.errors.push((stripped, errors.clone()));
            }
        }
        for (location, warnings) in &self.warnings {
            if let Some(stripped) = location.strip_prefix(prefix) {
                copy.warnings.push((stripped, warnings.clone()));
            }
        }
        for location in &self.stop {
            if let Some(stripped) = location.strip_prefix(prefix) {
                copy.stop.push(stripped);
            }
        }
        copy
    }

    /// Removes and returns errors with the given codes recorded exactly at
    /// `location`.
    pub fn take_errors(&mut self, codes: &[u16], location: &Location) -> Vec<ValidationError> {
        let mut taken = Vec::new();
        for (loc, errors) in &mut self.errors {
            if loc == location {
                let mut kept = Vec::new();
                for error in errors.drain(..) {
                    if codes.contains(&error.code()) {
                        taken.push(error);
                    } else {
                        kept.push(error);
                    }
                }
                *errors = kept;
            }
        }
        self.errors.retain(|(_, errors)| !errors.is_empty());
        if !taken.is_empty() {
            self.stop.retain(|loc| loc != location);
        }
        taken
    }

    /// Maps the SCIM error type of every recorded error, e.g. to re-tag
    /// filter errors found inside a patch path as `invalidPath`.
    pub(crate) fn retag_scim_type(&mut self, scim_type: ScimErrorType) {
        for (_, errors) in &mut self.errors {
            for error in errors {
                error.set_scim_type(scim_type);
            }
        }
    }

    /// Renders the issues as a nested JSON structure. Leaves are objects
    /// with `_errors` / `_warnings` arrays of `{code}` entries; when
    /// `with_messages` is set, each entry also carries an `error` message.
    pub fn to_json(&self, with_messages: bool) -> Value {
        let mut output = Value::Object(Map::new());
        for (location, errors) in &self.errors {
            let leaves: Vec<Value> = errors
                .iter()
                .map(|e| {
                    if with_messages {
                        json!({"code": e.code(), "error": e.message()})
                    } else {
                        json!({"code": e.code()})
                    }
                })
                .collect();
            Self::insert_leaf(&mut output, location, "_errors", Value::Array(leaves));
        }
        for (location, warnings) in &self.warnings {
            let leaves: Vec<Value> = warnings
                .iter()
                .map(|w| {
                    if with_messages {
                        json!({"code": w.code(), "error": w.message()})
                    } else {
                        json!({"code": w.code()})
                    }
                })
                .collect();
            Self::insert_leaf(&mut output, location, "_warnings", Value::Array(leaves));
        }
        output
    }

    fn insert_leaf(output: &mut Value, location: &Location, key: &str, leaves: Value) {
        let mut current = output;
        for part in location.keys() {
            let map = current
                .as_object_mut()
                .expect("issue tree nodes are objects");
            current = map
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        current
            .as_object_mut()
            .expect("issue tree nodes are objects")
            .insert(key.to_owned(), leaves);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_errors_by_location() {
        let mut issues = ValidationIssues::new();
        issues.add_error_at(loc!["id"], ValidationError::bad_type("integer"), true);
        issues.add_error_at(loc!["emails", 1], ValidationError::missing(), false);

        assert!(issues.has_errors());
        assert_eq!(issues.error_codes_at(&loc!["id"]), vec![2]);
        assert_eq!(issues.error_codes_at(&loc!["emails", 1]), vec![5]);
        assert!(issues.can_proceed_at(&loc!["id"]));
        assert!(!issues.can_proceed_at(&loc!["emails", 1]));
        assert!(!issues.can_proceed_at(&loc!["emails", 1, "value"]));
    }

    #[test]
    fn merge_applies_location_prefix() {
        let mut inner = ValidationIssues::new();
        inner.add_error_at(loc!["value"], ValidationError::missing(), false);

        let mut outer = ValidationIssues::new();
        outer.merge_at(loc!["Operations", 0], inner);

        assert_eq!(
            outer.error_codes_at(&loc!["Operations", 0, "value"]),
            vec![5],
        );
        assert!(!outer.can_proceed_at(&loc!["Operations", 0, "value"]));
    }

    #[test]
    fn to_json_renders_nested_tree() {
        let mut issues = ValidationIssues::new();
        issues.add_error_at(loc!["Resources", 0, "id"], ValidationError::bad_type("string"), true);
        issues.add_warning_at(loc!["nickName"], ValidationWarning::missing());

        let rendered = issues.to_json(false);
        assert_eq!(
            rendered["Resources"]["0"]["id"]["_errors"][0]["code"],
            json!(2),
        );
        assert_eq!(rendered["nickName"]["_warnings"][0]["code"], json!(4));
    }

    #[test]
    fn take_errors_removes_matching_codes() {
        let mut issues = ValidationIssues::new();
        issues.add_error_at(loc!["schemas"], ValidationError::missing_main_schema(), true);
        issues.add_error_at(loc!["schemas"], ValidationError::duplicated_values(), true);

        let taken = issues.take_errors(&[12], &loc!["schemas"]);
        assert_eq!(taken.len(), 1);
        assert_eq!(issues.error_codes_at(&loc!["schemas"]), vec![10]);
    }

    #[test]
    fn subtree_is_rerooted() {
        let mut issues = ValidationIssues::new();
        issues.add_error_at(loc!["body", "userName"], ValidationError::missing(), false);
        let body = issues.get(&loc!["body"]);
        assert_eq!(body.error_codes_at(&loc!["userName"]), vec![5]);
    }
}
