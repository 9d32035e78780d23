//! Case-insensitive, path-addressable container for SCIM payloads.
//!
//! [`ScimData`] keeps keys in insertion order and preserves the casing a
//! key was first seen with, while lookups ignore case. Values are the
//! JSON-compatible [`ScimValue`] union. A lookup that finds nothing returns
//! `None`, which is distinct from an explicit JSON `null` (SCIM uses null
//! to request clearing an attribute).

use serde_json::{Map, Number, Value};

use crate::error::{ScimError, ScimResult};
use crate::ident::{AttrName, AttrPath, BoundedAttrRep, SchemaUri};
use crate::registry;

/// A JSON-compatible SCIM value.
#[derive(Debug, Clone)]
pub enum ScimValue {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    Array(Vec<ScimValue>),
    Object(ScimData),
}

impl PartialEq for ScimValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Integer(a), Self::Decimal(b)) | (Self::Decimal(b), Self::Integer(a)) => {
                *a as f64 == *b
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl ScimValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ScimValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<ScimValue>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ScimData> {
        match self {
            Self::Object(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ScimData> {
        match self {
            Self::Object(data) => Some(data),
            _ => None,
        }
    }

    /// SCIM "presence": null, empty strings, and empty arrays count as
    /// absent values.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Null => false,
            Self::String(value) => !value.is_empty(),
            Self::Array(items) => !items.is_empty(),
            _ => true,
        }
    }

    /// Converts a decoded JSON value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::from_number(n),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Object(ScimData::from_map(map)),
        }
    }

    fn from_number(number: &Number) -> Self {
        if let Some(i) = number.as_i64() {
            Self::Integer(i)
        } else {
            Self::Decimal(number.as_f64().unwrap_or(f64::NAN))
        }
    }

    /// Renders the value back to JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::Number((*i).into()),
            Self::Decimal(d) => Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(ScimValue::to_json).collect()),
            Self::Object(data) => data.to_json(),
        }
    }
}

impl From<&str> for ScimValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ScimValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ScimValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ScimValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ScimValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<ScimData> for ScimValue {
    fn from(value: ScimData) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<ScimValue>> for ScimValue {
    fn from(value: Vec<ScimValue>) -> Self {
        Self::Array(value)
    }
}

/// Interpreted form of a data access key.
enum DataKey {
    /// A whole extension namespace, addressed by its schema URI.
    Namespace(SchemaUri),
    /// A plain attribute, optionally with a sub-attribute.
    Attr {
        attr: AttrName,
        sub_attr: Option<AttrName>,
    },
    /// A schema-bound attribute; extension attributes live nested under
    /// their schema URI.
    Bounded {
        schema: SchemaUri,
        extension: bool,
        attr: AttrName,
        sub_attr: Option<AttrName>,
    },
}

impl DataKey {
    fn parse(key: &str) -> ScimResult<Self> {
        if key.contains(':') {
            if let Ok(uri) = SchemaUri::new(key) {
                match registry::schema_kind(uri.as_str()) {
                    Some(true) => return Ok(Self::Namespace(uri)),
                    Some(false) => {
                        return Err(ScimError::InvalidAttrRep(format!(
                            "'{key}' is a base schema URI and has no own subspace in the data"
                        )));
                    }
                    None => {}
                }
            }
        }
        match AttrPath::parse(key)? {
            AttrPath::Unbounded(rep) => {
                let sub_attr = rep.sub_attr().cloned();
                Ok(Self::Attr {
                    attr: rep.attr().clone(),
                    sub_attr,
                })
            }
            AttrPath::Bounded(rep) => Ok(Self::from_bounded(&rep)),
        }
    }

    fn from_bounded(rep: &BoundedAttrRep) -> Self {
        Self::Bounded {
            schema: rep.schema().clone(),
            extension: rep.is_extension(),
            attr: rep.attr().clone(),
            sub_attr: rep.sub_attr().cloned(),
        }
    }

    fn from_path(path: &AttrPath) -> Self {
        match path {
            AttrPath::Unbounded(rep) => Self::Attr {
                attr: rep.attr().clone(),
                sub_attr: rep.sub_attr().cloned(),
            },
            AttrPath::Bounded(rep) => Self::from_bounded(rep),
        }
    }
}

/// Ordered, case-insensitive mapping from attribute names (and extension
/// URIs) to SCIM values.
#[derive(Debug, Clone, Default)]
pub struct ScimData {
    entries: Vec<(String, ScimValue)>,
}

impl PartialEq for ScimData {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get_key(key).is_some_and(|v| v == value))
    }
}

impl ScimData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a container from a decoded JSON object. Returns `None` when
    /// the value is not an object.
    pub fn from_json(value: &Value) -> Option<Self> {
        value.as_object().map(Self::from_map)
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let mut data = Self::new();
        for (key, value) in map {
            data.insert_key(key, ScimValue::from_json(value));
        }
        data
    }

    /// Renders the container back to a JSON object, extensions nested
    /// under their URI keys.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.entries {
            map.insert(key.clone(), value.to_json());
        }
        Value::Object(map)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over top-level entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScimValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Looks up a single top-level key, ignoring case, without path
    /// interpretation.
    pub fn get_key(&self, key: &str) -> Option<&ScimValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    pub fn get_key_mut(&mut self, key: &str) -> Option<&mut ScimValue> {
        self.entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    /// Inserts a single top-level key without path interpretation. The
    /// first-seen casing of an existing key is preserved.
    pub fn insert_key(&mut self, key: &str, value: ScimValue) {
        match self.get_key_mut(key) {
            Some(existing) => *existing = value,
            None => self.entries.push((key.to_owned(), value)),
        }
    }

    /// Removes a single top-level key without path interpretation.
    pub fn remove_key(&mut self, key: &str) -> Option<ScimValue> {
        let index = self
            .entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(key))?;
        Some(self.entries.remove(index).1)
    }

    /// Path-aware lookup. The key may be a plain attribute name, a dotted
    /// path, a URI-prefixed path, or an extension URI. A dotted path into a
    /// multi-valued complex attribute projects the sub-attribute across all
    /// elements.
    pub fn get(&self, key: &str) -> Option<ScimValue> {
        let key = DataKey::parse(key).ok()?;
        self.get_data_key(&key)
    }

    /// Path-aware lookup through a parsed attribute path.
    pub fn get_path(&self, path: &AttrPath) -> Option<ScimValue> {
        self.get_data_key(&DataKey::from_path(path))
    }

    /// Path-aware lookup through a bounded attribute representation.
    pub fn get_rep(&self, rep: &BoundedAttrRep) -> Option<ScimValue> {
        self.get_data_key(&DataKey::from_bounded(rep))
    }

    fn get_data_key(&self, key: &DataKey) -> Option<ScimValue> {
        match key {
            DataKey::Namespace(uri) => self.get_key(uri.as_str()).cloned(),
            DataKey::Attr { attr, sub_attr } => self.get_attr(attr, sub_attr.as_ref()),
            DataKey::Bounded {
                schema,
                extension,
                attr,
                sub_attr,
            } => {
                if *extension {
                    let namespace = self.get_key(schema.as_str())?.as_object()?;
                    namespace.get_attr(attr, sub_attr.as_ref())
                } else {
                    self.get_attr(attr, sub_attr.as_ref())
                }
            }
        }
    }

    fn get_attr(&self, attr: &AttrName, sub_attr: Option<&AttrName>) -> Option<ScimValue> {
        let value = self.get_key(attr.as_str())?;
        let Some(sub_attr) = sub_attr else {
            return Some(value.clone());
        };
        match value {
            ScimValue::Object(data) => data.get_key(sub_attr.as_str()).cloned(),
            ScimValue::Array(items) => Some(ScimValue::Array(
                items
                    .iter()
                    .map(|item| match item {
                        ScimValue::Object(data) => data
                            .get_key(sub_attr.as_str())
                            .cloned()
                            .unwrap_or(ScimValue::Null),
                        _ => ScimValue::Null,
                    })
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Path-aware store. Fails on keys that cannot be interpreted; base
    /// schema URIs have no own subspace in the data.
    pub fn set(&mut self, key: &str, value: impl Into<ScimValue>) -> ScimResult<()> {
        let key = DataKey::parse(key)?;
        self.set_data_key(&key, value.into())
    }

    /// Path-aware store through a parsed attribute path.
    pub fn set_path(&mut self, path: &AttrPath, value: impl Into<ScimValue>) -> ScimResult<()> {
        self.set_data_key(&DataKey::from_path(path), value.into())
    }

    /// Path-aware store through a bounded representation. Extension
    /// attributes are nested under their schema URI automatically.
    pub fn set_rep(&mut self, rep: &BoundedAttrRep, value: impl Into<ScimValue>) -> ScimResult<()> {
        self.set_data_key(&DataKey::from_bounded(rep), value.into())
    }

    fn set_data_key(&mut self, key: &DataKey, value: ScimValue) -> ScimResult<()> {
        match key {
            DataKey::Namespace(uri) => {
                self.insert_key(uri.as_str(), value);
                Ok(())
            }
            DataKey::Attr { attr, sub_attr } => self.set_attr(attr, sub_attr.as_ref(), value),
            DataKey::Bounded {
                schema,
                extension,
                attr,
                sub_attr,
            } => {
                if *extension {
                    if self.get_key(schema.as_str()).is_none() {
                        self.insert_key(schema.as_str(), ScimValue::Object(ScimData::new()));
                    }
                    let namespace = self
                        .get_key_mut(schema.as_str())
                        .and_then(ScimValue::as_object_mut)
                        .ok_or_else(|| {
                            ScimError::internal(format!(
                                "extension namespace '{schema}' is not an object"
                            ))
                        })?;
                    namespace.set_attr(attr, sub_attr.as_ref(), value)
                } else {
                    self.set_attr(attr, sub_attr.as_ref(), value)
                }
            }
        }
    }

    fn set_attr(
        &mut self,
        attr: &AttrName,
        sub_attr: Option<&AttrName>,
        value: ScimValue,
    ) -> ScimResult<()> {
        let Some(sub_attr) = sub_attr else {
            self.insert_key(attr.as_str(), value);
            return Ok(());
        };
        if self.get_key(attr.as_str()).is_none() {
            self.insert_key(attr.as_str(), ScimValue::Object(ScimData::new()));
        }
        let parent = self
            .get_key_mut(attr.as_str())
            .expect("parent attribute just ensured");
        match parent {
            ScimValue::Object(data) => {
                data.insert_key(sub_attr.as_str(), value);
                Ok(())
            }
            ScimValue::Array(items) => {
                let ScimValue::Array(sub_values) = value else {
                    return Err(ScimError::InvalidAttrRep(format!(
                        "can not assign a single value to sub-attribute '{sub_attr}' of \
                         multi-valued '{attr}'"
                    )));
                };
                for (item, sub_value) in items.iter_mut().zip(sub_values) {
                    if let ScimValue::Object(data) = item {
                        data.insert_key(sub_attr.as_str(), sub_value);
                    }
                }
                Ok(())
            }
            _ => Err(ScimError::InvalidAttrRep(format!(
                "can not assign sub-attribute '{sub_attr}' to non-complex '{attr}'"
            ))),
        }
    }

    /// Path-aware removal; returns the removed value.
    pub fn remove(&mut self, key: &str) -> Option<ScimValue> {
        let key = DataKey::parse(key).ok()?;
        self.remove_data_key(&key)
    }

    /// Path-aware removal through a bounded representation.
    pub fn remove_rep(&mut self, rep: &BoundedAttrRep) -> Option<ScimValue> {
        self.remove_data_key(&DataKey::from_bounded(rep))
    }

    fn remove_data_key(&mut self, key: &DataKey) -> Option<ScimValue> {
        match key {
            DataKey::Namespace(uri) => self.remove_key(uri.as_str()),
            DataKey::Attr { attr, sub_attr } => self.remove_attr(attr, sub_attr.as_ref()),
            DataKey::Bounded {
                schema,
                extension,
                attr,
                sub_attr,
            } => {
                if *extension {
                    let namespace = self
                        .get_key_mut(schema.as_str())
                        .and_then(ScimValue::as_object_mut)?;
                    namespace.remove_attr(attr, sub_attr.as_ref())
                } else {
                    self.remove_attr(attr, sub_attr.as_ref())
                }
            }
        }
    }

    fn remove_attr(&mut self, attr: &AttrName, sub_attr: Option<&AttrName>) -> Option<ScimValue> {
        let Some(sub_attr) = sub_attr else {
            return self.remove_key(attr.as_str());
        };
        match self.get_key_mut(attr.as_str())? {
            ScimValue::Object(data) => data.remove_key(sub_attr.as_str()),
            ScimValue::Array(items) => Some(ScimValue::Array(
                items
                    .iter_mut()
                    .map(|item| match item {
                        ScimValue::Object(data) => data
                            .remove_key(sub_attr.as_str())
                            .unwrap_or(ScimValue::Null),
                        _ => ScimValue::Null,
                    })
                    .collect(),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> ScimData {
        ScimData::from_json(&value).unwrap()
    }

    #[test]
    fn lookup_is_case_insensitive_and_preserves_casing() {
        let d = data(json!({"userName": "bjensen"}));
        assert_eq!(d.get("USERNAME"), Some(ScimValue::from("bjensen")));
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["userName"]);
    }

    #[test]
    fn dotted_path_reaches_into_complex() {
        let d = data(json!({"name": {"givenName": "Barbara"}}));
        assert_eq!(d.get("name.givenname"), Some(ScimValue::from("Barbara")));
        assert_eq!(d.get("name.familyName"), None);
    }

    #[test]
    fn dotted_path_projects_across_multi_valued() {
        let d = data(json!({
            "emails": [
                {"type": "work", "value": "a@example.com"},
                {"type": "home"},
            ]
        }));
        let projected = d.get("emails.value").unwrap();
        assert_eq!(
            projected,
            ScimValue::Array(vec![ScimValue::from("a@example.com"), ScimValue::Null]),
        );
    }

    #[test]
    fn extension_rep_auto_nests() {
        registry::register_schema("urn:test:data:Ext", true);
        let rep = BoundedAttrRep::new("urn:test:data:Ext", "employeeNumber").unwrap();
        let mut d = ScimData::new();
        d.set_rep(&rep, "701984").unwrap();
        assert_eq!(
            d.to_json(),
            json!({"urn:test:data:Ext": {"employeeNumber": "701984"}}),
        );
        assert_eq!(d.get_rep(&rep), Some(ScimValue::from("701984")));
        assert_eq!(
            d.get("urn:test:data:Ext:employeeNumber"),
            Some(ScimValue::from("701984")),
        );
    }

    #[test]
    fn missing_differs_from_null() {
        let d = data(json!({"nickName": null}));
        assert_eq!(d.get("nickName"), Some(ScimValue::Null));
        assert_eq!(d.get("displayName"), None);
    }

    #[test]
    fn equality_ignores_key_case_and_order() {
        let a = data(json!({"a": 1, "b": [{"x": "y"}]}));
        let b = data(json!({"B": [{"X": "y"}], "A": 1}));
        assert_eq!(a, b);
    }
}
