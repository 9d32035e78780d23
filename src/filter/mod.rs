//! SCIM filter expressions (RFC 7644 section 3.4.2.2).
//!
//! A [`Filter`] is parsed from the textual grammar, serialized back, and
//! evaluated against [`ScimData`] guided by schema attribute definitions.
//! [`Filter::validate`] reports every discoverable syntax problem;
//! [`Filter::parse`] builds the AST only from well-formed expressions.

mod eval;
mod parser;

use std::fmt;

use serde_json::{json, Value};

use crate::attrs::{Attribute, BoundedAttrs};
use crate::error::{ScimError, ScimResult};
use crate::ident::{AttrPath, AttrRep};
use crate::issues::{ScimErrorType, ValidationIssues};
use crate::scim_data::ScimData;

pub(crate) use eval::AttrsView;

/// Comparison operators of the filter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Co,
    Sw,
    Ew,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Co => "co",
            Self::Sw => "sw",
            Self::Ew => "ew",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "co" => Some(Self::Co),
            "sw" => Some(Self::Sw),
            "ew" => Some(Self::Ew),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            _ => None,
        }
    }

    /// Operand-type matrix: `eq`/`ne` accept any literal, the substring
    /// operators accept strings only, and the ordering operators accept
    /// strings and numbers.
    pub(crate) fn accepts(&self, value: &CompValue) -> bool {
        match self {
            Self::Eq | Self::Ne => true,
            Self::Co | Self::Sw | Self::Ew => matches!(value, CompValue::Str(_)),
            Self::Gt | Self::Ge | Self::Lt | Self::Le => {
                matches!(value, CompValue::Str(_) | CompValue::Int(_) | CompValue::Decimal(_))
            }
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal right-hand operand of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum CompValue {
    Str(String),
    Int(i64),
    Decimal(f64),
    Bool(bool),
    Null,
}

impl CompValue {
    pub(crate) fn display(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Decimal(d) => d.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_owned(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Str(s) => json!(s),
            Self::Int(i) => json!(i),
            Self::Decimal(d) => json!(d),
            Self::Bool(b) => json!(b),
            Self::Null => Value::Null,
        }
    }

    fn from_json(value: &Value) -> ScimResult<Self> {
        match value {
            Value::String(s) => Ok(Self::Str(s.clone())),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Null => Ok(Self::Null),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else {
                    Ok(Self::Decimal(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            _ => Err(ScimError::InvalidFilter(format!(
                "'{value}' is not a valid comparison value"
            ))),
        }
    }

    fn serialize(&self) -> String {
        match self {
            Self::Str(s) => {
                let escaped = s.replace('\\', "\\\\").replace('\'', "\\'");
                format!("'{escaped}'")
            }
            other => other.display(),
        }
    }
}

/// Abstract syntax of a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Or(Vec<FilterExpr>),
    And(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
    Present(AttrPath),
    Compare {
        path: AttrPath,
        op: CompareOp,
        value: CompValue,
    },
    /// Existential match over elements of a multi-valued complex
    /// attribute: `attr[sub-filter]`.
    Complex {
        path: AttrPath,
        inner: Box<FilterExpr>,
    },
}

/// A parsed SCIM filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    expr: FilterExpr,
}

impl Filter {
    pub(crate) fn from_expr(expr: FilterExpr) -> Self {
        Self { expr }
    }

    pub(crate) fn expr(&self) -> &FilterExpr {
        &self.expr
    }

    /// Validates a filter expression, reporting all discovered syntax
    /// errors (codes 100-110 and 17 for bad attribute names).
    pub fn validate(expression: &str) -> ValidationIssues {
        let tokens = parser::tokenize(expression);
        let mut issues = ValidationIssues::new();
        parser::parse_filter(&tokens, false, &mut issues);
        issues.retag_scim_type(ScimErrorType::InvalidFilter);
        issues
    }

    /// Parses a filter expression into its AST.
    pub fn parse(expression: &str) -> ScimResult<Self> {
        let tokens = parser::tokenize(expression);
        let mut issues = ValidationIssues::new();
        let expr = parser::parse_filter(&tokens, false, &mut issues);
        match expr {
            Some(expr) if !issues.has_errors() => Ok(Self { expr }),
            _ => {
                let detail = issues
                    .errors()
                    .next()
                    .map(|(_, error)| error.message().to_owned())
                    .unwrap_or_else(|| "malformed expression".to_owned());
                Err(ScimError::InvalidFilter(detail))
            }
        }
    }

    /// Serializes the filter back to the textual grammar. The result
    /// reparses to an equivalent filter; redundant outer parentheses are
    /// stripped.
    pub fn serialize(&self) -> String {
        let rendered = Self::serialize_expr(&self.expr);
        if rendered.starts_with('(') && rendered.ends_with(')') {
            rendered[1..rendered.len() - 1].to_owned()
        } else {
            rendered
        }
    }

    fn serialize_expr(expr: &FilterExpr) -> String {
        match expr {
            FilterExpr::Or(subs) => {
                let parts: Vec<String> = subs.iter().map(Self::serialize_expr).collect();
                format!("({})", parts.join(" or "))
            }
            FilterExpr::And(subs) => {
                let parts: Vec<String> = subs.iter().map(Self::serialize_expr).collect();
                format!("({})", parts.join(" and "))
            }
            FilterExpr::Not(sub) => format!("not {}", Self::serialize_expr(sub)),
            FilterExpr::Present(path) => format!("{path} pr"),
            FilterExpr::Compare { path, op, value } => {
                format!("{path} {op} {}", value.serialize())
            }
            FilterExpr::Complex { path, inner } => {
                format!("{path}[{}]", Self::serialize_expr(inner))
            }
        }
    }

    /// Structured form of the filter, round-trippable through
    /// [`Filter::from_json`].
    pub fn to_json(&self) -> Value {
        Self::expr_to_json(&self.expr)
    }

    fn expr_to_json(expr: &FilterExpr) -> Value {
        match expr {
            FilterExpr::Or(subs) => json!({
                "op": "or",
                "sub_ops": subs.iter().map(Self::expr_to_json).collect::<Vec<_>>(),
            }),
            FilterExpr::And(subs) => json!({
                "op": "and",
                "sub_ops": subs.iter().map(Self::expr_to_json).collect::<Vec<_>>(),
            }),
            FilterExpr::Not(sub) => json!({
                "op": "not",
                "sub_op": Self::expr_to_json(sub),
            }),
            FilterExpr::Present(path) => json!({
                "op": "pr",
                "attr": path.to_string(),
            }),
            FilterExpr::Compare { path, op, value } => json!({
                "op": op.as_str(),
                "attr": path.to_string(),
                "value": value.to_json(),
            }),
            FilterExpr::Complex { path, inner } => json!({
                "op": "complex",
                "attr": path.to_string(),
                "sub_op": Self::expr_to_json(inner),
            }),
        }
    }

    /// Rebuilds a filter from its structured form.
    pub fn from_json(value: &Value) -> ScimResult<Self> {
        Ok(Self {
            expr: Self::expr_from_json(value)?,
        })
    }

    fn expr_from_json(value: &Value) -> ScimResult<FilterExpr> {
        let op = value
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| ScimError::InvalidFilter("missing 'op' key".into()))?;
        let sub_op = |value: &Value| -> ScimResult<FilterExpr> {
            let sub = value
                .get("sub_op")
                .ok_or_else(|| ScimError::InvalidFilter(format!("missing 'sub_op' for '{op}'")))?;
            Self::expr_from_json(sub)
        };
        let attr_path = |value: &Value| -> ScimResult<AttrPath> {
            let attr = value
                .get("attr")
                .and_then(Value::as_str)
                .ok_or_else(|| ScimError::InvalidFilter(format!("missing 'attr' for '{op}'")))?;
            AttrPath::parse(attr)
        };
        match op {
            "or" | "and" => {
                let subs = value
                    .get("sub_ops")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        ScimError::InvalidFilter(format!("missing 'sub_ops' for '{op}'"))
                    })?;
                let parsed: ScimResult<Vec<_>> =
                    subs.iter().map(Self::expr_from_json).collect();
                let parsed = parsed?;
                if parsed.is_empty() {
                    return Err(ScimError::InvalidFilter(format!("empty 'sub_ops' for '{op}'")));
                }
                Ok(if op == "or" {
                    FilterExpr::Or(parsed)
                } else {
                    FilterExpr::And(parsed)
                })
            }
            "not" => Ok(FilterExpr::Not(Box::new(sub_op(value)?))),
            "complex" => Ok(FilterExpr::Complex {
                path: attr_path(value)?,
                inner: Box::new(sub_op(value)?),
            }),
            "pr" => Ok(FilterExpr::Present(attr_path(value)?)),
            other => match CompareOp::from_str(other) {
                Some(op) => Ok(FilterExpr::Compare {
                    path: attr_path(value)?,
                    op,
                    value: CompValue::from_json(
                        value.get("value").unwrap_or(&Value::Null),
                    )?,
                }),
                None => Err(ScimError::InvalidFilter(format!("unknown operator '{other}'"))),
            },
        }
    }

    /// Evaluates the filter against resource data described by the given
    /// schema attributes. Unknown attributes evaluate to "not present".
    pub fn matches(&self, data: &ScimData, attrs: &BoundedAttrs) -> bool {
        self.expr.matches(data, &AttrsView::Schema(attrs))
    }

    /// Evaluates the filter against a single element of a complex
    /// attribute.
    pub fn matches_complex(&self, data: &ScimData, attr: &Attribute) -> bool {
        self.expr.matches(data, &AttrsView::Complex(attr))
    }

    /// All attribute paths referenced by the filter. Paths inside complex
    /// groups are reported as sub-attributes of the group attribute.
    pub fn attr_paths(&self) -> Vec<AttrPath> {
        let mut paths = Vec::new();
        Self::collect_paths(&self.expr, &mut paths);
        paths
    }

    fn collect_paths(expr: &FilterExpr, out: &mut Vec<AttrPath>) {
        let mut push = |path: AttrPath| {
            if !out.contains(&path) {
                out.push(path);
            }
        };
        match expr {
            FilterExpr::Or(subs) | FilterExpr::And(subs) => {
                for sub in subs {
                    Self::collect_paths(sub, out);
                }
            }
            FilterExpr::Not(sub) => Self::collect_paths(sub, out),
            FilterExpr::Present(path) | FilterExpr::Compare { path, .. } => push(path.clone()),
            FilterExpr::Complex { path, inner } => {
                let mut inner_paths = Vec::new();
                Self::collect_paths(inner, &mut inner_paths);
                for inner_path in inner_paths {
                    let sub_name = inner_path
                        .sub_attr()
                        .unwrap_or(inner_path.attr())
                        .clone();
                    let combined = match path {
                        AttrPath::Bounded(rep) => {
                            AttrPath::Bounded(rep.parent().child(sub_name))
                        }
                        AttrPath::Unbounded(rep) => AttrPath::Unbounded(
                            AttrRep::from_parts(rep.attr().clone(), Some(sub_name)),
                        ),
                    };
                    push(combined);
                }
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc;

    fn codes(issues: &ValidationIssues) -> Vec<u16> {
        let mut codes: Vec<u16> = issues.errors().map(|(_, e)| e.code()).collect();
        codes.sort();
        codes
    }

    #[test]
    fn parses_logical_precedence() {
        let filter = Filter::parse("a eq 1 or b eq 2 and c eq 3").unwrap();
        match filter.expr() {
            FilterExpr::Or(subs) => {
                assert_eq!(subs.len(), 2);
                assert!(matches!(subs[1], FilterExpr::And(_)));
            }
            other => panic!("expected top-level or, got {other:?}"),
        }
    }

    #[test]
    fn reports_all_errors_in_one_pass() {
        let issues =
            Filter::validate("userName eq 'johndoe' or (emails[type neq 'home'] and nickName sw 15)");
        assert_eq!(codes(&issues), vec![104, 110]);
    }

    #[test]
    fn unbalanced_parentheses_yield_100() {
        assert_eq!(codes(&Filter::validate("(userName eq 'a'")), vec![100]);
        assert_eq!(codes(&Filter::validate("userName eq 'a')")), vec![106]);
    }

    #[test]
    fn unbalanced_complex_brackets_yield_101() {
        assert_eq!(codes(&Filter::validate("emails[type eq 'work'")), vec![101]);
    }

    #[test]
    fn nested_complex_group_yields_107() {
        let issues = Filter::validate("emails[type eq 'work' and emails[type eq 'home']]");
        assert_eq!(codes(&issues), vec![107]);
    }

    #[test]
    fn empty_groups_yield_105_and_108() {
        assert_eq!(codes(&Filter::validate("() and a eq 1")), vec![105]);
        assert_eq!(codes(&Filter::validate("emails[]")), vec![108]);
    }

    #[test]
    fn complex_group_on_sub_attribute_yields_102() {
        let issues = Filter::validate("emails.type[value eq 'work']");
        assert!(codes(&issues).contains(&102));
    }

    #[test]
    fn missing_operands_yield_103() {
        assert_eq!(codes(&Filter::validate("userName eq")), vec![103]);
        assert_eq!(codes(&Filter::validate("or userName pr")), vec![103]);
        assert_eq!(codes(&Filter::validate("userName pr and")), vec![103]);
        assert_eq!(codes(&Filter::validate("not")), vec![103]);
    }

    #[test]
    fn unquoted_text_operand_yields_109() {
        assert_eq!(codes(&Filter::validate("userName eq johndoe")), vec![109]);
    }

    #[test]
    fn round_trip_serialization_is_stable() {
        let source = "userName eq 'bjensen' and (emails[type eq 'work'] or nickName pr)";
        let filter = Filter::parse(source).unwrap();
        let reparsed = Filter::parse(&filter.serialize()).unwrap();
        assert_eq!(filter, reparsed);

        let from_json = Filter::from_json(&filter.to_json()).unwrap();
        assert_eq!(filter, from_json);
    }

    #[test]
    fn string_escapes_survive_round_trip() {
        let filter = Filter::parse(r"userName eq 'it\'s \\ tricky'").unwrap();
        let reparsed = Filter::parse(&filter.serialize()).unwrap();
        assert_eq!(filter, reparsed);
    }

    #[test]
    fn validate_reports_at_root_location() {
        let issues = Filter::validate("userName xx 'a'");
        assert_eq!(issues.error_codes_at(&loc![]), vec![104]);
    }
}
