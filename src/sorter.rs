//! Sorting of resource listings (RFC 7644 section 3.4.2.3).

use std::cmp::Ordering;

use crate::attrs::{parse_datetime, AttrType, Attribute};
use crate::ident::AttrPath;
use crate::schema::{ResourceSchema, Schema};
use crate::scim_data::{ScimData, ScimValue};

/// Produces a stable total order over resources by one attribute.
///
/// Resources missing the sort attribute order last regardless of the
/// direction. A multi-valued complex sort attribute sorts by the
/// `primary == true` element's `value`, falling back to the first
/// element.
#[derive(Debug, Clone)]
pub struct Sorter {
    attr_path: AttrPath,
    ascending: bool,
}

/// Comparable key extracted from one resource.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Missing,
    Bool(bool),
    Number(f64),
    Str { value: String, case_exact: bool },
    DateTime(chrono::NaiveDateTime),
}

impl Sorter {
    pub fn new(attr_path: AttrPath, ascending: bool) -> Self {
        Self {
            attr_path,
            ascending,
        }
    }

    pub fn attr_path(&self) -> &AttrPath {
        &self.attr_path
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// Sorts resources that all belong to the same schema.
    pub fn sort(&self, resources: &[ScimData], schema: &ResourceSchema) -> Vec<ScimData> {
        let schemas: Vec<&ResourceSchema> = resources.iter().map(|_| schema).collect();
        self.sort_mixed(resources, &schemas)
    }

    /// Sorts resources with one schema per resource, for heterogeneous
    /// listings. When no resource carries the sort attribute the input
    /// order is preserved.
    pub fn sort_mixed(
        &self,
        resources: &[ScimData],
        schemas: &[&ResourceSchema],
    ) -> Vec<ScimData> {
        let mut keyed: Vec<(SortKey, &ScimData)> = resources
            .iter()
            .zip(schemas)
            .map(|(resource, schema)| (self.sort_key(resource, schema), resource))
            .collect();
        if keyed.iter().all(|(key, _)| *key == SortKey::Missing) {
            return resources.to_vec();
        }
        keyed.sort_by(|(a, _), (b, _)| self.compare(a, b));
        keyed.into_iter().map(|(_, resource)| resource.clone()).collect()
    }

    fn sort_key(&self, resource: &ScimData, schema: &ResourceSchema) -> SortKey {
        let Some(attr) = schema.attrs().get(&self.attr_path) else {
            return SortKey::Missing;
        };
        let Some(value) = resource.get_path(&self.attr_path) else {
            return SortKey::Missing;
        };
        let (value, attr) = if attr.is_multi_valued() {
            match self.multi_valued_sort_value(&value, attr) {
                Some(resolved) => resolved,
                None => return SortKey::Missing,
            }
        } else {
            (value, attr.clone())
        };
        Self::key_for(&value, &attr)
    }

    /// The `primary == true` element wins; otherwise the first element is
    /// used.
    fn multi_valued_sort_value(
        &self,
        value: &ScimValue,
        attr: &Attribute,
    ) -> Option<(ScimValue, Attribute)> {
        let items = value.as_array()?;
        if attr.attr_type() == AttrType::Complex {
            let value_attr = attr.sub_attr("value")?.clone();
            let mut chosen = None;
            for (i, item) in items.iter().enumerate() {
                let Some(element) = item.as_object() else {
                    continue;
                };
                if i == 0 || chosen.is_none() {
                    chosen = element.get_key("value").cloned();
                }
                if element.get_key("primary").and_then(ScimValue::as_bool) == Some(true) {
                    chosen = element.get_key("value").cloned();
                    break;
                }
            }
            Some((chosen?, value_attr))
        } else {
            Some((items.first()?.clone(), attr.clone()))
        }
    }

    fn key_for(value: &ScimValue, attr: &Attribute) -> SortKey {
        match value {
            ScimValue::Null => SortKey::Missing,
            ScimValue::Bool(b) => SortKey::Bool(*b),
            ScimValue::Integer(i) => SortKey::Number(*i as f64),
            ScimValue::Decimal(d) => SortKey::Number(*d),
            ScimValue::String(s) => {
                if s.is_empty() {
                    return SortKey::Missing;
                }
                if attr.attr_type() == AttrType::DateTime {
                    if let Some(parsed) = parse_datetime(s) {
                        return SortKey::DateTime(parsed);
                    }
                }
                SortKey::Str {
                    value: s.clone(),
                    case_exact: attr.is_case_exact(),
                }
            }
            _ => SortKey::Missing,
        }
    }

    fn compare(&self, a: &SortKey, b: &SortKey) -> Ordering {
        // present values sort before missing ones regardless of direction
        match (a, b) {
            (SortKey::Missing, SortKey::Missing) => return Ordering::Equal,
            (SortKey::Missing, _) => return Ordering::Greater,
            (_, SortKey::Missing) => return Ordering::Less,
            _ => {}
        }
        let ordering = Self::compare_present(a, b);
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }

    fn compare_present(a: &SortKey, b: &SortKey) -> Ordering {
        match (a, b) {
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (SortKey::DateTime(a), SortKey::DateTime(b)) => a.cmp(b),
            (
                SortKey::Str {
                    value: a,
                    case_exact,
                },
                SortKey::Str { value: b, .. },
            ) => {
                if *case_exact {
                    a.cmp(b)
                } else {
                    a.to_lowercase().cmp(&b.to_lowercase())
                }
            }
            // mixed types order by a fixed type rank so the order is total
            _ => Self::type_rank(a).cmp(&Self::type_rank(b)),
        }
    }

    fn type_rank(key: &SortKey) -> u8 {
        match key {
            SortKey::Bool(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::DateTime(_) => 2,
            SortKey::Str { .. } => 3,
            SortKey::Missing => 4,
        }
    }
}
