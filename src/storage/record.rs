//! Records and the field template they conform to
//!
//! A record is an integer id plus an ordered set of named string fields.
//! The [`Template`] fixes which field names exist and in which order; the
//! first template field is the searchable one.

use crate::error::{Error, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Record identifier (valid ids start at 1)
pub type RecordId = u64;

/// Name reserved for the identifier; never allowed as a field name
pub const ID_FIELD: &str = "id";

/// Ordered field-name → value mapping
///
/// Serializes as a JSON object whose keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Get a field value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set a field, replacing the value in place if the name already exists
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((name, value));
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = Fields;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Fields, A::Error> {
                let mut fields = Fields::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    fields.insert(key, value);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

/// A stored record
///
/// Renders as a flat object: `{"id": 1, "title": "...", "value": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    pub fn new(id: RecordId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Get a field value by name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    /// Case-sensitive substring match on one field
    pub fn matches(&self, field: &str, query: &str) -> bool {
        self.fields
            .get(field)
            .map(|value| value.contains(query))
            .unwrap_or(false)
    }
}

/// Ordered list of the field names every record carries (excluding `id`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Template {
    names: Vec<String>,
}

impl Template {
    /// Create a template, rejecting empty, duplicate or reserved names
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(Error::InvalidArgument(
                "template needs at least one field".to_string(),
            ));
        }
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(Error::InvalidArgument("empty field name".to_string()));
            }
            if name == ID_FIELD {
                return Err(Error::InvalidArgument(format!(
                    "'{}' is reserved for the record identifier",
                    ID_FIELD
                )));
            }
            if names[..i].contains(name) {
                return Err(Error::InvalidArgument(format!(
                    "duplicate field name '{}'",
                    name
                )));
            }
        }
        Ok(Self { names })
    }

    /// Field names in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of non-id fields
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The field matched by `search` (first template field)
    pub fn searchable_field(&self) -> &str {
        &self.names[0]
    }

    /// Build a record in template order
    ///
    /// Fields not given default to the empty string. Unknown names are rejected.
    pub fn record<I, K, V>(&self, id: RecordId, pairs: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let given: Fields = pairs.into_iter().collect();
        if let Some(unknown) = given.names().find(|name| !self.names.contains(&name.to_string())) {
            return Err(Error::InvalidArgument(format!("unknown field '{}'", unknown)));
        }

        let fields = self
            .names
            .iter()
            .map(|name| (name.clone(), given.get(name).unwrap_or_default().to_string()))
            .collect();
        Ok(Record::new(id, fields))
    }

    /// Record whose searchable field is `first`, all other fields empty
    pub fn blank(&self, id: RecordId, first: impl Into<String>) -> Record {
        let first = first.into();
        let fields = self
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = if i == 0 { first.clone() } else { String::new() };
                (name.clone(), value)
            })
            .collect();
        Record::new(id, fields)
    }

    /// Reorder fields into template order, rejecting unknown or missing ones
    pub fn conform(&self, fields: &Fields) -> Result<Fields> {
        if let Some(unknown) = fields.names().find(|name| !self.names.contains(&name.to_string())) {
            return Err(Error::InvalidArgument(format!("unknown field '{}'", unknown)));
        }
        self.names
            .iter()
            .map(|name| {
                fields
                    .get(name)
                    .map(|value| (name.clone(), value.to_string()))
                    .ok_or_else(|| Error::InvalidArgument(format!("missing field '{}'", name)))
            })
            .collect::<Result<Vec<_>>>()
            .map(|pairs| pairs.into_iter().collect())
    }

    /// Same as [`Template::conform`] for a whole record
    pub fn normalize(&self, record: &Record) -> Result<Record> {
        Ok(Record::new(record.id, self.conform(&record.fields)?))
    }
}

impl Default for Template {
    fn default() -> Self {
        Self {
            names: vec!["title".to_string(), "value".to_string()],
        }
    }
}

impl TryFrom<Vec<String>> for Template {
    type Error = Error;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Template::new(names)
    }
}

impl From<Template> for Vec<String> {
    fn from(template: Template) -> Self {
        template.names
    }
}
