//! Lexer and error-collecting parser for the SCIM filter grammar.
//!
//! Parsing never stops at the first problem: operands of logical operators
//! are parsed independently, so every discoverable error in an expression
//! is reported. [`parse_filter`] returns the AST only when no errors were
//! found.

use crate::ident::AttrPath;
use crate::issues::{ValidationError, ValidationIssues};

use super::{CompValue, CompareOp, FilterExpr};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Word(String),
    Str(String),
    Unterminated(String),
}

/// Splits a filter expression into tokens. String literals may be single-
/// or double-quoted, with backslash escapes.
pub(crate) fn tokenize(input: &str) -> Vec<Tok> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '(' => {
                chars.next();
                tokens.push(Tok::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Tok::RParen);
            }
            '[' => {
                chars.next();
                tokens.push(Tok::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Tok::RBracket);
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut text = String::new();
                let mut terminated = false;
                while let Some(c) = chars.next() {
                    if c == '\\' {
                        match chars.next() {
                            Some(escaped) => text.push(escaped),
                            None => break,
                        }
                    } else if c == quote {
                        terminated = true;
                        break;
                    } else {
                        text.push(c);
                    }
                }
                if terminated {
                    tokens.push(Tok::Str(text));
                } else {
                    tokens.push(Tok::Unterminated(text));
                }
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '\'' | '"') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Tok::Word(word));
            }
        }
    }
    tokens
}

/// Renders a token slice back to display text for error messages.
fn render(tokens: &[Tok]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && !matches!(token, Tok::RParen | Tok::RBracket) {
            match tokens[i - 1] {
                Tok::LParen | Tok::LBracket => {}
                _ => out.push(' '),
            }
        }
        match token {
            Tok::LParen => out.push('('),
            Tok::RParen => out.push(')'),
            Tok::LBracket => out.push('['),
            Tok::RBracket => out.push(']'),
            Tok::Word(w) => out.push_str(w),
            Tok::Str(s) | Tok::Unterminated(s) => {
                out.push('\'');
                out.push_str(s);
                out.push('\'');
            }
        }
    }
    out
}

fn is_keyword(token: &Tok, keyword: &str) -> bool {
    matches!(token, Tok::Word(w) if w.eq_ignore_ascii_case(keyword))
}

const BINARY_OPS: &[(&str, CompareOp)] = &[
    ("eq", CompareOp::Eq),
    ("ne", CompareOp::Ne),
    ("co", CompareOp::Co),
    ("sw", CompareOp::Sw),
    ("ew", CompareOp::Ew),
    ("gt", CompareOp::Gt),
    ("ge", CompareOp::Ge),
    ("lt", CompareOp::Lt),
    ("le", CompareOp::Le),
];

fn binary_op(word: &str) -> Option<CompareOp> {
    let lower = word.to_ascii_lowercase();
    BINARY_OPS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, op)| *op)
}

/// Parses a whole filter expression, collecting every discovered error
/// into `issues`. Returns the AST when the expression is well-formed.
pub(crate) fn parse_filter(
    tokens: &[Tok],
    in_complex: bool,
    issues: &mut ValidationIssues,
) -> Option<FilterExpr> {
    if tokens.is_empty() || tokens.iter().all(|t| matches!(t, Tok::Word(w) if w.is_empty())) {
        issues.add_error(ValidationError::empty_filter_expression(), false);
        return None;
    }
    for token in tokens {
        if let Tok::Unterminated(text) = token {
            issues.add_error(ValidationError::unknown_expression(text), false);
            return None;
        }
    }
    parse_or(tokens, in_complex, issues)
}

fn parse_or(
    tokens: &[Tok],
    in_complex: bool,
    issues: &mut ValidationIssues,
) -> Option<FilterExpr> {
    let parts = split_keyword(tokens, "or");
    parse_logical(tokens, parts, "or", in_complex, issues, FilterExpr::Or, parse_and)
}

fn parse_and(
    tokens: &[Tok],
    in_complex: bool,
    issues: &mut ValidationIssues,
) -> Option<FilterExpr> {
    let parts = split_keyword(tokens, "and");
    parse_logical(tokens, parts, "and", in_complex, issues, FilterExpr::And, parse_not)
}

#[allow(clippy::too_many_arguments)]
fn parse_logical<'a>(
    tokens: &'a [Tok],
    parts: Vec<&'a [Tok]>,
    operator: &str,
    in_complex: bool,
    issues: &mut ValidationIssues,
    combine: fn(Vec<FilterExpr>) -> FilterExpr,
    parse_operand: fn(&[Tok], bool, &mut ValidationIssues) -> Option<FilterExpr>,
) -> Option<FilterExpr> {
    let mut failed = false;
    if parts.iter().any(|part| part.is_empty()) {
        issues.add_error(
            ValidationError::missing_operand(operator, &render(tokens)),
            false,
        );
        failed = true;
    }
    let mut operands = Vec::new();
    for part in parts {
        if part.is_empty() {
            continue;
        }
        match parse_operand(part, in_complex, issues) {
            Some(expr) => operands.push(expr),
            None => failed = true,
        }
    }
    if failed {
        return None;
    }
    match operands.len() {
        0 => None,
        1 => operands.pop(),
        _ => Some(combine(operands)),
    }
}

/// Splits on a logical keyword occurring outside any parentheses or
/// brackets.
fn split_keyword<'a>(tokens: &'a [Tok], keyword: &str) -> Vec<&'a [Tok]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Tok::LParen | Tok::LBracket => depth += 1,
            Tok::RParen | Tok::RBracket => depth = depth.saturating_sub(1),
            _ if depth == 0 && is_keyword(token, keyword) => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

fn parse_not(
    tokens: &[Tok],
    in_complex: bool,
    issues: &mut ValidationIssues,
) -> Option<FilterExpr> {
    if is_keyword(&tokens[0], "not") {
        let rest = &tokens[1..];
        if rest.is_empty() {
            issues.add_error(ValidationError::missing_operand("not", &render(tokens)), false);
            return None;
        }
        return parse_term(rest, in_complex, issues).map(|expr| FilterExpr::Not(Box::new(expr)));
    }
    parse_term(tokens, in_complex, issues)
}

fn parse_term(
    tokens: &[Tok],
    in_complex: bool,
    issues: &mut ValidationIssues,
) -> Option<FilterExpr> {
    match &tokens[0] {
        Tok::LParen => parse_group(tokens, in_complex, issues),
        Tok::RParen => {
            issues.add_error(ValidationError::bracket_not_opened_or_closed(), false);
            None
        }
        Tok::LBracket | Tok::RBracket => {
            issues.add_error(
                if in_complex {
                    ValidationError::inner_complex_group()
                } else {
                    ValidationError::complex_bracket_not_opened_or_closed()
                },
                false,
            );
            None
        }
        Tok::Word(_) if tokens.len() > 1 && tokens[1] == Tok::LBracket => {
            parse_complex_group(tokens, in_complex, issues)
        }
        Tok::Word(_) | Tok::Str(_) | Tok::Unterminated(_) => {
            parse_attr_expr(tokens, in_complex, issues)
        }
    }
}

fn parse_group(
    tokens: &[Tok],
    in_complex: bool,
    issues: &mut ValidationIssues,
) -> Option<FilterExpr> {
    let mut depth = 0usize;
    let mut close = None;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Tok::LParen => depth += 1,
            Tok::RParen => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(close) = close else {
        issues.add_error(ValidationError::bracket_not_opened_or_closed(), false);
        return None;
    };
    if close != tokens.len() - 1 {
        issues.add_error(ValidationError::unknown_expression(&render(tokens)), false);
        return None;
    }
    let inner = &tokens[1..close];
    if inner.is_empty() {
        issues.add_error(ValidationError::empty_filter_expression(), false);
        return None;
    }
    parse_filter(inner, in_complex, issues)
}

fn parse_complex_group(
    tokens: &[Tok],
    in_complex: bool,
    issues: &mut ValidationIssues,
) -> Option<FilterExpr> {
    let Tok::Word(attr_text) = &tokens[0] else {
        unreachable!("caller checked the first token is a word");
    };
    if in_complex {
        issues.add_error(ValidationError::inner_complex_group(), false);
        return None;
    }

    let mut close = None;
    let mut nested = false;
    for (i, token) in tokens.iter().enumerate().skip(2) {
        match token {
            Tok::LBracket => nested = true,
            Tok::RBracket => {
                close = Some(i);
                break;
            }
            _ => {}
        }
    }
    if nested {
        issues.add_error(ValidationError::inner_complex_group(), false);
        return None;
    }
    let Some(close) = close else {
        issues.add_error(ValidationError::complex_bracket_not_opened_or_closed(), false);
        return None;
    };
    if close != tokens.len() - 1 {
        issues.add_error(ValidationError::unknown_expression(&render(tokens)), false);
        return None;
    }

    let mut failed = false;
    let path = match AttrPath::parse(attr_text) {
        Ok(path) => {
            if let Some(sub) = path.sub_attr() {
                issues.add_error(
                    ValidationError::complex_sub_attribute(path.attr().as_str(), sub.as_str()),
                    false,
                );
                failed = true;
            }
            Some(path)
        }
        Err(_) => {
            issues.add_error(ValidationError::bad_attribute_name(attr_text), false);
            failed = true;
            None
        }
    };

    let inner_tokens = &tokens[2..close];
    if inner_tokens.is_empty() {
        issues.add_error(ValidationError::empty_complex_group(attr_text), false);
        return None;
    }
    let inner = parse_filter(inner_tokens, true, issues);
    if failed {
        return None;
    }
    Some(FilterExpr::Complex {
        path: path?,
        inner: Box::new(inner?),
    })
}

fn parse_attr_expr(
    tokens: &[Tok],
    in_complex: bool,
    issues: &mut ValidationIssues,
) -> Option<FilterExpr> {
    match tokens.len() {
        1 => {
            issues.add_error(ValidationError::unknown_expression(&render(tokens)), false);
            None
        }
        2 => {
            let (Tok::Word(attr_text), Tok::Word(op_text)) = (&tokens[0], &tokens[1]) else {
                issues.add_error(ValidationError::unknown_expression(&render(tokens)), false);
                return None;
            };
            if op_text.eq_ignore_ascii_case("pr") {
                let path = parse_attr_path(attr_text, in_complex, issues)?;
                return Some(FilterExpr::Present(path));
            }
            if binary_op(op_text).is_some() {
                issues.add_error(
                    ValidationError::missing_operand(&op_text.to_ascii_lowercase(), &render(tokens)),
                    false,
                );
            } else {
                issues.add_error(
                    ValidationError::unknown_operator(op_text, &render(tokens)),
                    false,
                );
            }
            parse_attr_path(attr_text, in_complex, issues);
            None
        }
        3 => {
            let Tok::Word(attr_text) = &tokens[0] else {
                issues.add_error(ValidationError::unknown_expression(&render(tokens)), false);
                return None;
            };
            let Tok::Word(op_text) = &tokens[1] else {
                issues.add_error(ValidationError::unknown_expression(&render(tokens)), false);
                return None;
            };
            let op = binary_op(op_text);
            if op.is_none() {
                issues.add_error(
                    ValidationError::unknown_operator(op_text, &render(tokens)),
                    false,
                );
            }
            let path = parse_attr_path(attr_text, in_complex, issues);
            let value = parse_comp_value(&tokens[2], issues);
            let (op, value) = (op?, value?);
            if !op.accepts(&value) {
                issues.add_error(
                    ValidationError::non_compatible_operand(&value.display(), op.as_str()),
                    false,
                );
                return None;
            }
            Some(FilterExpr::Compare {
                path: path?,
                op,
                value,
            })
        }
        _ => {
            issues.add_error(ValidationError::unknown_expression(&render(tokens)), false);
            None
        }
    }
}

fn parse_attr_path(
    text: &str,
    in_complex: bool,
    issues: &mut ValidationIssues,
) -> Option<AttrPath> {
    match AttrPath::parse(text) {
        Ok(path) => {
            // Inside a complex group, `a.b` designates the sub-attribute
            // `b` of the group attribute.
            if in_complex {
                if let AttrPath::Unbounded(rep) = &path {
                    if let Some(sub) = rep.sub_attr() {
                        return Some(AttrPath::Unbounded(
                            crate::ident::AttrRep::from_parts(sub.clone(), None),
                        ));
                    }
                }
            }
            Some(path)
        }
        Err(_) => {
            issues.add_error(ValidationError::bad_attribute_name(text), false);
            None
        }
    }
}

fn parse_comp_value(token: &Tok, issues: &mut ValidationIssues) -> Option<CompValue> {
    match token {
        Tok::Str(text) => Some(CompValue::Str(text.clone())),
        Tok::Word(word) => match word.as_str() {
            "true" => Some(CompValue::Bool(true)),
            "false" => Some(CompValue::Bool(false)),
            "null" => Some(CompValue::Null),
            _ => {
                if let Ok(int) = word.parse::<i64>() {
                    Some(CompValue::Int(int))
                } else if let Ok(dec) = word.parse::<f64>() {
                    Some(CompValue::Decimal(dec))
                } else {
                    issues.add_error(ValidationError::bad_operand(word), false);
                    None
                }
            }
        },
        _ => {
            issues.add_error(ValidationError::bad_operand(&render(std::slice::from_ref(token))), false);
            None
        }
    }
}
