use std::collections::HashMap;

use bytes::Bytes;

/// An uploaded file taken from a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// One decoded form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    /// Single occurrence of a field.
    Text(String),
    /// Field seen more than once, values in arrival order.
    List(Vec<String>),
    File(FilePart),
    /// Several files under the same name.
    Files(Vec<FilePart>),
    /// Non-string JSON member.
    Json(serde_json::Value),
}

impl FormValue {
    /// The scalar text, or the first value of a list.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::List(values) => values.first().map(String::as_str),
            FormValue::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FormValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FilePart> {
        match self {
            FormValue::File(file) => Some(file),
            FormValue::Files(files) => files.first(),
            _ => None,
        }
    }
}

impl PartialEq<&str> for FormValue {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, FormValue::Text(s) if s == other)
    }
}

impl<const N: usize> PartialEq<[&str; N]> for FormValue {
    fn eq(&self, other: &[&str; N]) -> bool {
        matches!(self, FormValue::List(values) if values.iter().eq(other.iter()))
    }
}

/// Decoded field name → value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
    fields: HashMap<String, FormValue>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects `(name, value)` pairs; repeated names become lists.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut form = Self::new();
        for (name, value) in pairs {
            form.append(name.into(), FormValue::Text(value.into()));
        }
        form
    }

    /// Adds a value, merging with one already stored under `name`.
    ///
    /// Texts merge into a list and files into a file list. Mixing a text and
    /// a file under one name keeps the newer value.
    pub fn append(&mut self, name: String, value: FormValue) {
        use FormValue::*;

        let merged = match (self.fields.remove(&name), value) {
            (None, value) => value,
            (Some(Text(first)), Text(next)) => List(vec![first, next]),
            (Some(List(mut values)), Text(next)) => {
                values.push(next);
                List(values)
            }
            (Some(File(first)), File(next)) => Files(vec![first, next]),
            (Some(Files(mut files)), File(next)) => {
                files.push(next);
                Files(files)
            }
            (Some(_), value) => value,
        };
        self.fields.insert(name, merged);
    }

    /// Stores `value` under `name`, dropping anything already there.
    pub fn insert(&mut self, name: impl Into<String>, value: FormValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FormValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl std::ops::Index<&str> for Form {
    type Output = FormValue;

    /// Panics when the field is missing, like `HashMap` indexing.
    fn index(&self, name: &str) -> &FormValue {
        &self.fields[name]
    }
}
