//! Filter evaluation against [`ScimData`].
//!
//! Evaluation is total: unknown attributes count as "not present", and
//! comparisons against incompatible values are simply false. Multi-valued
//! attributes match when any element matches.

use crate::attrs::{parse_datetime, AttrType, Attribute, BoundedAttrs};
use crate::ident::AttrPath;
use crate::scim_data::{ScimData, ScimValue};

use super::{CompValue, CompareOp, FilterExpr};

/// The attribute definitions a filter is evaluated against: a whole
/// schema, or a single complex attribute inside a complex group.
pub(crate) enum AttrsView<'a> {
    Schema(&'a BoundedAttrs),
    Complex(&'a Attribute),
}

impl<'a> AttrsView<'a> {
    fn get(&self, path: &AttrPath) -> Option<&'a Attribute> {
        match self {
            Self::Schema(attrs) => attrs.get(path),
            Self::Complex(attr) => {
                let sub = attr.sub_attr(path.attr().as_str())?;
                match path.sub_attr() {
                    Some(_) => None,
                    None => Some(sub),
                }
            }
        }
    }
}

impl FilterExpr {
    pub(crate) fn matches(&self, data: &ScimData, view: &AttrsView) -> bool {
        match self {
            Self::Or(subs) => subs.iter().any(|sub| sub.matches(data, view)),
            Self::And(subs) => subs.iter().all(|sub| sub.matches(data, view)),
            Self::Not(sub) => !sub.matches(data, view),
            Self::Present(path) => eval_present(path, data, view),
            Self::Compare { path, op, value } => eval_compare(path, *op, value, data, view),
            Self::Complex { path, inner } => eval_complex(path, inner, data, view),
        }
    }
}

/// `pr` truthiness: non-null, non-empty, present. A multi-valued value is
/// present when any element is; a complex value when any sub-value is.
fn value_present(value: &ScimValue) -> bool {
    match value {
        ScimValue::Null => false,
        ScimValue::String(text) => !text.is_empty(),
        ScimValue::Array(items) => items.iter().any(value_present),
        ScimValue::Object(data) => data.iter().any(|(_, v)| value_present(v)),
        _ => true,
    }
}

fn eval_present(path: &AttrPath, data: &ScimData, view: &AttrsView) -> bool {
    if view.get(path).is_none() {
        return false;
    }
    match data.get_path(path) {
        Some(value) => value_present(&value),
        None => false,
    }
}

fn eval_compare(
    path: &AttrPath,
    op: CompareOp,
    op_value: &CompValue,
    data: &ScimData,
    view: &AttrsView,
) -> bool {
    let Some(attr) = view.get(path) else {
        return false;
    };
    let Some(raw) = data.get_path(path) else {
        return false;
    };
    if raw.is_null() {
        return false;
    }
    if !op_supports_type(op, attr.attr_type()) {
        return false;
    }

    // A multi-valued complex attribute compares through its "value"
    // sub-attribute.
    let (candidates, attr) = if attr.attr_type() == AttrType::Complex {
        if !attr.is_multi_valued() {
            return false;
        }
        let Some(value_attr) = attr.sub_attr("value") else {
            return false;
        };
        let Some(items) = raw.as_array() else {
            return false;
        };
        let values: Vec<ScimValue> = items
            .iter()
            .filter_map(ScimValue::as_object)
            .filter_map(|item| item.get_key("value").cloned())
            .collect();
        (values, value_attr)
    } else {
        match raw {
            ScimValue::Array(items) => (items, attr),
            single => (vec![single], attr),
        }
    };

    candidates
        .iter()
        .any(|candidate| compare_single(candidate, op, op_value, attr))
}

fn op_supports_type(op: CompareOp, typ: AttrType) -> bool {
    match op {
        CompareOp::Eq | CompareOp::Ne => true,
        CompareOp::Co | CompareOp::Sw | CompareOp::Ew => matches!(
            typ,
            AttrType::String | AttrType::Reference | AttrType::Complex | AttrType::Unknown
        ),
        CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le => matches!(
            typ,
            AttrType::String
                | AttrType::DateTime
                | AttrType::Integer
                | AttrType::Decimal
                | AttrType::Complex
                | AttrType::Unknown
        ),
    }
}

fn compare_single(
    candidate: &ScimValue,
    op: CompareOp,
    op_value: &CompValue,
    attr: &Attribute,
) -> bool {
    match op_value {
        CompValue::Null => match op {
            CompareOp::Eq => candidate.is_null(),
            CompareOp::Ne => !candidate.is_null(),
            _ => false,
        },
        CompValue::Bool(expected) => {
            let Some(actual) = candidate.as_bool() else {
                return false;
            };
            match op {
                CompareOp::Eq => actual == *expected,
                CompareOp::Ne => actual != *expected,
                _ => false,
            }
        }
        CompValue::Int(_) | CompValue::Decimal(_) => {
            let expected = match op_value {
                CompValue::Int(i) => *i as f64,
                CompValue::Decimal(d) => *d,
                _ => unreachable!(),
            };
            let Some(actual) = candidate.as_f64() else {
                return false;
            };
            ordering_matches(op, actual.partial_cmp(&expected))
        }
        CompValue::Str(expected) => {
            let Some(actual) = candidate.as_str() else {
                return false;
            };
            if attr.attr_type() == AttrType::DateTime {
                let (Some(actual), Some(expected)) =
                    (parse_datetime(actual), parse_datetime(expected))
                else {
                    return false;
                };
                return ordering_matches(op, actual.partial_cmp(&expected));
            }
            let (actual, expected) = if attr.is_case_exact() {
                (actual.to_owned(), expected.clone())
            } else {
                (actual.to_lowercase(), expected.to_lowercase())
            };
            match op {
                CompareOp::Eq => actual == expected,
                CompareOp::Ne => actual != expected,
                CompareOp::Co => actual.contains(&expected),
                CompareOp::Sw => actual.starts_with(&expected),
                CompareOp::Ew => actual.ends_with(&expected),
                _ => ordering_matches(op, actual.partial_cmp(&expected)),
            }
        }
    }
}

fn ordering_matches(op: CompareOp, ordering: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::*;
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        CompareOp::Eq => ordering == Equal,
        CompareOp::Ne => ordering != Equal,
        CompareOp::Gt => ordering == Greater,
        CompareOp::Ge => ordering != Less,
        CompareOp::Lt => ordering == Less,
        CompareOp::Le => ordering != Greater,
        _ => false,
    }
}

fn eval_complex(
    path: &AttrPath,
    inner: &FilterExpr,
    data: &ScimData,
    view: &AttrsView,
) -> bool {
    let Some(attr) = view.get(path) else {
        return false;
    };
    if attr.attr_type() != AttrType::Complex {
        return false;
    }
    let Some(value) = data.get_path(path) else {
        return false;
    };
    let elements: Vec<&ScimData> = match (&value, attr.is_multi_valued()) {
        (ScimValue::Array(items), true) => {
            items.iter().filter_map(ScimValue::as_object).collect()
        }
        (ScimValue::Object(item), false) => vec![item],
        _ => return false,
    };
    elements
        .iter()
        .any(|element| inner.matches(element, &AttrsView::Complex(attr)))
}
