//! Patch paths and patch operations (RFC 7644 section 3.5.2).
//!
//! A [`PatchPath`] targets an attribute, optionally narrowed by a value
//! selection filter (`emails[type eq 'work']`) and a sub-attribute.
//! [`PatchOperations`] validates operation envelopes and applies them to
//! [`ScimData`] guided by a resource schema, collecting every
//! per-operation problem before reporting.

use std::fmt;

use log::debug;

use crate::attrs::{AttrType, Attribute, Mutability};
use crate::error::{ScimError, ScimResult};
use crate::filter::{Filter, FilterExpr};
use crate::ident::{AttrName, AttrPath};
use crate::issues::{ScimErrorType, ValidationError, ValidationIssues};
use crate::loc;
use crate::schema::{ResourceSchema, Schema};
use crate::scim_data::{ScimData, ScimValue};

/// Target modification path of a PATCH operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchPath {
    attr_path: AttrPath,
    sub_attr_name: Option<AttrName>,
    filter: Option<Filter>,
}

impl PatchPath {
    /// The targeted attribute; never a sub-attribute representation.
    pub fn attr_path(&self) -> &AttrPath {
        &self.attr_path
    }

    /// The targeted sub-attribute, if any.
    pub fn sub_attr_name(&self) -> Option<&AttrName> {
        self.sub_attr_name.as_ref()
    }

    /// Whether the path carries a value selection filter.
    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Validates a path expression, reporting code 1 for structural
    /// problems and the filter error codes for a malformed value selection
    /// filter. All issues are tagged `invalidPath`.
    pub fn validate(path_exp: &str) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        match scan_brackets(path_exp) {
            BracketScan::None => {
                issues.merge(AttrPath::validate(path_exp));
            }
            BracketScan::Complex { close } => {
                let filter_exp = &path_exp[..=close];
                let filter_issues = Filter::validate(filter_exp);
                if filter_issues.has_errors() {
                    issues.merge(filter_issues);
                } else {
                    let rest = &path_exp[close + 1..];
                    if !rest.is_empty() {
                        let sub = rest.strip_prefix('.').unwrap_or(rest);
                        if AttrName::new(sub).is_err() {
                            issues.add_error(ValidationError::bad_attribute_name(sub), false);
                        }
                    }
                }
            }
            BracketScan::Malformed => {
                issues.add_error(ValidationError::bad_value_syntax(), false);
            }
        }
        issues.retag_scim_type(ScimErrorType::InvalidPath);
        issues
    }

    /// Parses a path expression.
    pub fn parse(path_exp: &str) -> ScimResult<Self> {
        match scan_brackets(path_exp) {
            BracketScan::None => {
                let path = AttrPath::parse(path_exp)
                    .map_err(|e| ScimError::InvalidPath(e.to_string()))?;
                let sub_attr_name = path.sub_attr().cloned();
                Ok(Self {
                    attr_path: path.parent(),
                    sub_attr_name,
                    filter: None,
                })
            }
            BracketScan::Complex { close } => {
                let filter = Filter::parse(&path_exp[..=close])
                    .map_err(|e| ScimError::InvalidPath(e.to_string()))?;
                let FilterExpr::Complex { path, .. } = filter.expr() else {
                    return Err(ScimError::InvalidPath(
                        "value selection filter must be a complex attribute group".into(),
                    ));
                };
                let attr_path = path.clone();
                let rest = &path_exp[close + 1..];
                let sub_attr_name = if rest.is_empty() {
                    None
                } else {
                    let sub = rest.strip_prefix('.').unwrap_or(rest);
                    Some(
                        AttrName::new(sub)
                            .map_err(|e| ScimError::InvalidPath(e.to_string()))?,
                    )
                };
                Ok(Self {
                    attr_path,
                    sub_attr_name,
                    filter: Some(filter),
                })
            }
            BracketScan::Malformed => {
                Err(ScimError::InvalidPath(format!("'{path_exp}' is malformed")))
            }
        }
    }

    /// Serializes the path back to its textual form.
    pub fn serialize(&self) -> String {
        let mut out = match &self.filter {
            Some(filter) => filter.serialize(),
            None => self.attr_path.to_string(),
        };
        if let Some(sub) = &self.sub_attr_name {
            out.push('.');
            out.push_str(sub.as_str());
        }
        out
    }

    /// Tests one element of the targeted multi-valued attribute against
    /// the value selection filter. A path without a filter matches any
    /// element.
    pub fn matches_element(
        &self,
        element: &ScimValue,
        schema: &ResourceSchema,
    ) -> ScimResult<bool> {
        let attr = schema
            .attrs()
            .get(&self.attr_path)
            .ok_or_else(|| ScimError::NoSuchAttribute(self.attr_path.to_string()))?;
        let Some(filter) = &self.filter else {
            return Ok(true);
        };
        if attr.attr_type() == AttrType::Complex {
            let mut data = ScimData::new();
            data.set_path(&self.attr_path, ScimValue::Array(vec![element.clone()]))
                .map_err(|e| ScimError::internal(e.to_string()))?;
            return Ok(filter.matches(&data, schema.attrs()));
        }
        // A simple multi-valued attribute filters through a synthetic
        // "value" sub-attribute: simpleAttr[value ge 42].
        let value_attr = attr.with_name("value");
        let synthetic = Attribute::complex(attr.name().as_str(), vec![value_attr]);
        let mut data = ScimData::new();
        data.insert_key("value", element.clone());
        let inner: &FilterExpr = match filter.expr() {
            FilterExpr::Complex { inner, .. } => inner.as_ref(),
            other => other,
        };
        Ok(Filter::from_expr(inner.clone()).matches_complex(&data, &synthetic))
    }
}

impl fmt::Display for PatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

enum BracketScan {
    None,
    Complex { close: usize },
    Malformed,
}

/// Locates the value selection filter brackets, ignoring brackets inside
/// string literals. More than one bracket of either kind, a lone bracket,
/// or a close before an open is malformed.
fn scan_brackets(path_exp: &str) -> BracketScan {
    let mut opens = Vec::new();
    let mut closes = Vec::new();
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for (i, c) in path_exp.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => in_string = Some(c),
            '[' => opens.push(i),
            ']' => closes.push(i),
            _ => {}
        }
    }
    match (opens.len(), closes.len()) {
        (0, 0) => BracketScan::None,
        (1, 1) if opens[0] < closes[0] => BracketScan::Complex { close: closes[0] },
        _ => BracketScan::Malformed,
    }
}

/// PATCH operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOpKind {
    Add,
    Replace,
    Remove,
}

impl PatchOpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Remove => "remove",
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "add" => Some(Self::Add),
            "replace" => Some(Self::Replace),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }
}

impl fmt::Display for PatchOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One PATCH operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    kind: PatchOpKind,
    path: Option<PatchPath>,
    value: Option<ScimValue>,
}

impl PatchOperation {
    pub fn new(kind: PatchOpKind, path: Option<PatchPath>, value: Option<ScimValue>) -> Self {
        let value = if kind == PatchOpKind::Remove { None } else { value };
        Self { kind, path, value }
    }

    pub fn kind(&self) -> PatchOpKind {
        self.kind
    }

    pub fn path(&self) -> Option<&PatchPath> {
        self.path.as_ref()
    }

    pub fn value(&self) -> Option<&ScimValue> {
        self.value.as_ref()
    }

    /// Validates an operation envelope: path syntax (code 1), mandatory
    /// `path` for remove and mandatory non-null `value` for add/replace
    /// (code 5).
    pub fn validate(data: &ScimData) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let kind = data
            .get_key("op")
            .and_then(ScimValue::as_str)
            .and_then(PatchOpKind::from_str);
        let path = data.get_key("path");
        match path.and_then(ScimValue::as_str) {
            Some(path_exp) => {
                issues.merge_at(loc!["path"], PatchPath::validate(path_exp));
            }
            None => {
                if kind == Some(PatchOpKind::Remove) {
                    issues.add_error_at(loc!["path"], ValidationError::missing(), false);
                }
            }
        }
        if matches!(kind, Some(PatchOpKind::Add) | Some(PatchOpKind::Replace)) {
            let value = data.get_key("value");
            if value.is_none() || value.is_some_and(ScimValue::is_null) {
                issues.add_error_at(loc!["value"], ValidationError::missing(), false);
            }
        }
        issues
    }

    /// Builds an operation from its wire form.
    pub fn parse(data: &ScimData) -> ScimResult<Self> {
        let kind = data
            .get_key("op")
            .and_then(ScimValue::as_str)
            .and_then(PatchOpKind::from_str)
            .ok_or_else(|| {
                ScimError::InvalidPath("operation 'op' must be add, replace, or remove".into())
            })?;
        let path = match data.get_key("path").and_then(ScimValue::as_str) {
            Some(path_exp) => Some(PatchPath::parse(path_exp)?),
            None => None,
        };
        if kind == PatchOpKind::Remove && path.is_none() {
            return Err(ScimError::InvalidPath(
                "'path' must be specified for remove operation".into(),
            ));
        }
        Ok(Self::new(kind, path, data.get_key("value").cloned()))
    }

    /// Renders the operation back to its wire form.
    pub fn serialize(&self) -> ScimData {
        let mut data = ScimData::new();
        data.insert_key("op", ScimValue::from(self.kind.as_str()));
        if let Some(path) = &self.path {
            data.insert_key("path", ScimValue::from(path.serialize()));
        }
        if self.kind != PatchOpKind::Remove {
            if let Some(value) = &self.value {
                data.insert_key("value", value.clone());
            }
        }
        data
    }
}

/// An ordered list of PATCH operations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchOperations {
    operations: Vec<PatchOperation>,
}

impl PatchOperations {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self { operations }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatchOperation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Validates every operation envelope, locations keyed by index.
    pub fn validate(items: &[ScimValue]) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        for (i, item) in items.iter().enumerate() {
            match item.as_object() {
                Some(operation) => {
                    issues.merge_at(loc![i], PatchOperation::validate(operation));
                }
                None => {
                    issues.add_error_at(loc![i], ValidationError::bad_type("complex"), false);
                }
            }
        }
        issues
    }

    /// Builds operations from their wire form.
    pub fn parse(items: &[ScimValue]) -> ScimResult<Self> {
        let operations: ScimResult<Vec<_>> = items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or_else(|| ScimError::InvalidPath("operation must be an object".into()))
                    .and_then(PatchOperation::parse)
            })
            .collect();
        Ok(Self {
            operations: operations?,
        })
    }

    pub fn serialize(&self) -> ScimValue {
        ScimValue::Array(
            self.operations
                .iter()
                .map(|op| ScimValue::Object(op.serialize()))
                .collect(),
        )
    }

    /// Applies the operations to `data`, guided by `schema`. Every
    /// per-operation problem is collected first; when any error is found
    /// the data is left untouched.
    pub fn apply(&self, data: &mut ScimData, schema: &ResourceSchema) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let mut working = data.clone();
        for (i, operation) in self.operations.iter().enumerate() {
            let op_issues = apply_operation(operation, &mut working, schema);
            issues.merge_at(loc![i], op_issues);
        }
        if issues.has_errors() {
            debug!(
                "patch against '{}' rejected with {} issue location(s)",
                schema.name(),
                issues.errors().count(),
            );
        } else {
            *data = working;
        }
        issues
    }
}

fn apply_operation(
    operation: &PatchOperation,
    data: &mut ScimData,
    schema: &ResourceSchema,
) -> ValidationIssues {
    match &operation.path {
        None => apply_at_root(operation, data, schema),
        Some(path) => apply_at_path(operation, path, data, schema),
    }
}

/// Without a path, add and replace take an object whose attributes are
/// applied at the resource root.
fn apply_at_root(
    operation: &PatchOperation,
    data: &mut ScimData,
    schema: &ResourceSchema,
) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let Some(value) = &operation.value else {
        issues.add_error_at(loc!["value"], ValidationError::missing(), false);
        return issues;
    };
    let Some(value) = value.as_object() else {
        issues.add_error_at(loc!["value"], ValidationError::bad_type("complex"), false);
        return issues;
    };

    let mut writes: Vec<(crate::ident::BoundedAttrRep, ScimValue)> = Vec::new();
    for (rep, attr) in schema.attrs().iter() {
        // providing 'schemas' in a patch value is tolerated and ignored
        if *attr.name() == "schemas" {
            continue;
        }
        let Some(attr_value) = value.get_rep(&rep) else {
            continue;
        };
        let value_location = loc!["value"].join(&rep.location());
        if attr.get_mutability() == Mutability::ReadOnly {
            issues.add_error_at(value_location, ValidationError::attribute_cannot_be_modified(), false);
            continue;
        }
        let attr_issues = attr.validate(&attr_value);
        let failed = attr_issues.has_errors();
        issues.merge_at(value_location.clone(), attr_issues);
        issues.merge_at(
            value_location,
            validate_read_only_sub_attrs(attr, &attr_value),
        );
        if !failed {
            writes.push((rep, attr_value));
        }
    }
    if issues.has_errors() {
        return issues;
    }
    for (rep, attr_value) in writes {
        let attr = schema
            .attrs()
            .get(&AttrPath::Bounded(rep.clone()))
            .expect("attribute resolved above");
        let merged = merge_value(operation.kind, attr, data.get_rep(&rep), attr_value);
        if data.set_rep(&rep, merged).is_err() {
            issues.add_error_at(
                loc!["value"].join(&rep.location()),
                ValidationError::bad_value_content(),
                true,
            );
        }
    }
    issues
}

/// An add on a multi-valued attribute appends; everything else replaces.
fn merge_value(
    kind: PatchOpKind,
    attr: &Attribute,
    existing: Option<ScimValue>,
    incoming: ScimValue,
) -> ScimValue {
    if kind == PatchOpKind::Add && attr.is_multi_valued() {
        let mut items = existing
            .and_then(|v| v.as_array().map(|a| a.to_vec()))
            .unwrap_or_default();
        match incoming {
            ScimValue::Array(new_items) => items.extend(new_items),
            single => items.push(single),
        }
        return ScimValue::Array(items);
    }
    incoming
}

fn validate_read_only_sub_attrs(attr: &Attribute, value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    if attr.attr_type() != AttrType::Complex {
        return issues;
    }
    let mut check = |location: crate::issues::Location, element: &ScimData| {
        for sub_attr in attr.sub_attrs() {
            if sub_attr.get_mutability() == Mutability::ReadOnly
                && element.get_key(sub_attr.name().as_str()).is_some()
            {
                issues.add_error_at(
                    location.child(sub_attr.name().as_str()),
                    ValidationError::attribute_cannot_be_modified(),
                    false,
                );
            }
        }
    };
    match value {
        ScimValue::Object(element) => check(loc![], element),
        ScimValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if let Some(element) = item.as_object() {
                    check(loc![i], element);
                }
            }
        }
        _ => {}
    }
    issues
}

fn apply_at_path(
    operation: &PatchOperation,
    path: &PatchPath,
    data: &mut ScimData,
    schema: &ResourceSchema,
) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let Some(target) = schema.attrs().get_by_path(path) else {
        issues.add_error_at(loc!["path"], ValidationError::unknown_modification_target(), false);
        return issues;
    };
    let parent = schema
        .attrs()
        .get(&path.attr_path().parent())
        .expect("parent of a resolved path exists");
    let Some(rep) = resolve_rep(schema, path) else {
        issues.add_error_at(loc!["path"], ValidationError::unknown_modification_target(), false);
        return issues;
    };

    match operation.kind {
        PatchOpKind::Remove => {
            apply_remove(path, target, parent, &rep, data, schema, &mut issues);
        }
        PatchOpKind::Add | PatchOpKind::Replace => {
            apply_add_or_replace(operation, path, target, parent, &rep, data, schema, &mut issues);
        }
    }
    issues
}

/// Canonical bounded representation of the path's top-level attribute.
fn resolve_rep(schema: &ResourceSchema, path: &PatchPath) -> Option<crate::ident::BoundedAttrRep> {
    schema.attrs().rep(path.attr_path().attr().as_str())
}

fn check_not_modifiable(
    target: &Attribute,
    parent: &Attribute,
    existing: Option<&ScimValue>,
    issues: &mut ValidationIssues,
) -> bool {
    if target.get_mutability() == Mutability::ReadOnly
        || parent.get_mutability() == Mutability::ReadOnly
    {
        issues.add_error_at(loc!["path"], ValidationError::attribute_cannot_be_modified(), false);
        return false;
    }
    if target.get_mutability() == Mutability::Immutable
        && existing.is_some_and(ScimValue::is_present)
    {
        issues.add_error_at(loc!["path"], ValidationError::attribute_cannot_be_modified(), false);
        return false;
    }
    true
}

#[allow(clippy::too_many_arguments)]
fn apply_remove(
    path: &PatchPath,
    target: &Attribute,
    parent: &Attribute,
    rep: &crate::ident::BoundedAttrRep,
    data: &mut ScimData,
    schema: &ResourceSchema,
    issues: &mut ValidationIssues,
) {
    if target.get_mutability() == Mutability::ReadOnly
        || parent.get_mutability() == Mutability::ReadOnly
    {
        issues.add_error_at(loc!["path"], ValidationError::attribute_cannot_be_modified(), false);
    }
    let removing_required = match path.sub_attr_name() {
        None => target.is_required(),
        Some(_) => target.is_required() && !target.is_multi_valued(),
    };
    if removing_required {
        issues.add_error_at(loc!["path"], ValidationError::attribute_cannot_be_deleted(), false);
    }
    if issues.has_errors() {
        return;
    }

    match (path.has_filter(), path.sub_attr_name()) {
        (false, None) => {
            data.remove_rep(rep);
        }
        (false, Some(sub)) => {
            data.remove_rep(&rep.child(sub.clone()));
        }
        (true, sub) => {
            let Some(ScimValue::Array(items)) = data.get_rep(rep) else {
                issues.add_error_at(
                    loc!["path"],
                    ValidationError::unknown_modification_target(),
                    false,
                );
                return;
            };
            let mut matched_any = false;
            let mut kept = Vec::new();
            for item in items {
                let matched = path.matches_element(&item, schema).unwrap_or(false);
                matched_any |= matched;
                match (matched, sub) {
                    (true, None) => {}
                    (true, Some(sub)) => {
                        let mut item = item;
                        if let Some(element) = item.as_object_mut() {
                            element.remove_key(sub.as_str());
                        }
                        kept.push(item);
                    }
                    (false, _) => kept.push(item),
                }
            }
            if !matched_any {
                issues.add_error_at(
                    loc!["path"],
                    ValidationError::unknown_modification_target(),
                    false,
                );
                return;
            }
            if kept.is_empty() {
                data.remove_rep(rep);
            } else {
                let _ = data.set_rep(rep, ScimValue::Array(kept));
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_add_or_replace(
    operation: &PatchOperation,
    path: &PatchPath,
    target: &Attribute,
    parent: &Attribute,
    rep: &crate::ident::BoundedAttrRep,
    data: &mut ScimData,
    schema: &ResourceSchema,
    issues: &mut ValidationIssues,
) {
    let Some(value) = &operation.value else {
        issues.add_error_at(loc!["value"], ValidationError::missing(), false);
        return;
    };
    let existing = data.get_rep(rep);
    if !check_not_modifiable(target, parent, existing.as_ref(), issues) {
        return;
    }

    // emails[type eq 'work'] with a single object updates the matched
    // elements, so the value is validated as one element.
    let updates_matched_elements =
        path.has_filter() && path.sub_attr_name().is_none() && value.as_array().is_none();
    let value_issues = if updates_matched_elements {
        target.as_single().validate(value)
    } else {
        target.validate(value)
    };
    let value_invalid = value_issues.has_errors();
    issues.merge_at(loc!["value"], value_issues);
    if updates_matched_elements || !target.is_multi_valued() {
        issues.merge_at(loc!["value"], validate_read_only_sub_attrs(target, value));
    }
    if issues.has_errors() || value_invalid {
        return;
    }

    match (path.has_filter(), path.sub_attr_name()) {
        (false, None) => {
            let merged = merge_value(operation.kind, target, existing, value.clone());
            let _ = data.set_rep(rep, merged);
        }
        (false, Some(sub)) => {
            if parent.is_multi_valued() && data.get_rep(rep).is_none() {
                issues.add_error_at(
                    loc!["path"],
                    ValidationError::unknown_modification_target(),
                    false,
                );
                return;
            }
            let _ = data.set_rep(&rep.child(sub.clone()), distribute_sub_value(parent, data.get_rep(rep), value.clone()));
        }
        (true, sub) => {
            let Some(ScimValue::Array(items)) = data.get_rep(rep) else {
                issues.add_error_at(
                    loc!["path"],
                    ValidationError::unknown_modification_target(),
                    false,
                );
                return;
            };
            let mut matched_any = false;
            let mut updated = Vec::with_capacity(items.len());
            for item in items {
                let matched = path.matches_element(&item, schema).unwrap_or(false);
                matched_any |= matched;
                if !matched {
                    updated.push(item);
                    continue;
                }
                match sub {
                    Some(sub) => {
                        let mut item = item;
                        if let Some(element) = item.as_object_mut() {
                            element.insert_key(sub.as_str(), value.clone());
                        }
                        updated.push(item);
                    }
                    None => match operation.kind {
                        PatchOpKind::Replace => updated.push(value.clone()),
                        PatchOpKind::Add => {
                            let mut item = item;
                            if let (Some(element), Some(incoming)) =
                                (item.as_object_mut(), value.as_object())
                            {
                                for (key, sub_value) in incoming.iter() {
                                    element.insert_key(key, sub_value.clone());
                                }
                            }
                            updated.push(item);
                        }
                        PatchOpKind::Remove => unreachable!("remove handled separately"),
                    },
                }
            }
            if !matched_any {
                issues.add_error_at(
                    loc!["path"],
                    ValidationError::unknown_modification_target(),
                    false,
                );
                return;
            }
            let _ = data.set_rep(rep, ScimValue::Array(updated));
        }
    }
}

/// A sub-attribute write on a multi-valued parent distributes the value
/// to every element.
fn distribute_sub_value(
    parent: &Attribute,
    parent_value: Option<ScimValue>,
    value: ScimValue,
) -> ScimValue {
    if !parent.is_multi_valued() {
        return value;
    }
    let count = parent_value
        .and_then(|v| v.as_array().map(<[ScimValue]>::len))
        .unwrap_or(0);
    ScimValue::Array(vec![value; count])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_dotted_paths() {
        let path = PatchPath::parse("nickName").unwrap();
        assert!(path.sub_attr_name().is_none());
        assert!(!path.has_filter());

        let path = PatchPath::parse("name.familyName").unwrap();
        assert_eq!(path.attr_path().attr().as_str(), "name");
        assert_eq!(path.sub_attr_name().unwrap().as_str(), "familyName");
    }

    #[test]
    fn parses_filtered_paths() {
        let path = PatchPath::parse("emails[type eq 'work'].value").unwrap();
        assert_eq!(path.attr_path().attr().as_str(), "emails");
        assert_eq!(path.sub_attr_name().unwrap().as_str(), "value");
        assert!(path.has_filter());
        assert_eq!(path.serialize(), "emails[type eq 'work'].value");
    }

    #[test]
    fn malformed_brackets_yield_code_1() {
        for bad in ["ims[ty", "ims]x[", "a[b][c]", "emails]"] {
            let issues = PatchPath::validate(bad);
            assert_eq!(
                issues.error_codes_at(&loc![]),
                vec![1],
                "expected code 1 for {bad:?}",
            );
        }
    }

    #[test]
    fn filter_errors_surface_through_path_validation() {
        let issues = PatchPath::validate("emails[type xx 'work']");
        assert_eq!(issues.error_codes_at(&loc![]), vec![104]);
    }

    #[test]
    fn remove_without_path_is_code_5() {
        let data = ScimData::from_json(&serde_json::json!({"op": "remove"})).unwrap();
        let issues = PatchOperation::validate(&data);
        assert_eq!(issues.error_codes_at(&loc!["path"]), vec![5]);
    }

    #[test]
    fn add_without_value_is_code_5() {
        let data =
            ScimData::from_json(&serde_json::json!({"op": "add", "path": "nickName"})).unwrap();
        let issues = PatchOperation::validate(&data);
        assert_eq!(issues.error_codes_at(&loc!["value"]), vec![5]);

        let data = ScimData::from_json(
            &serde_json::json!({"op": "replace", "path": "nickName", "value": null}),
        )
        .unwrap();
        let issues = PatchOperation::validate(&data);
        assert_eq!(issues.error_codes_at(&loc!["value"]), vec![5]);
    }

    #[test]
    fn bad_path_and_missing_value_are_both_reported() {
        let data =
            ScimData::from_json(&serde_json::json!({"op": "replace", "path": "ims[ty"})).unwrap();
        let issues = PatchOperation::validate(&data);
        assert_eq!(issues.error_codes_at(&loc!["path"]), vec![1]);
        assert_eq!(issues.error_codes_at(&loc!["value"]), vec![5]);
    }
}
