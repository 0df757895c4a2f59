// Columnar result frames returned to the visualization host
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub const TIME_FIELD: &str = "time";

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("field {field} has {actual} rows, expected {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
    #[error("cannot store {actual} value in {expected:?} field")]
    TypeMismatch {
        expected: FieldType,
        actual: &'static str,
    },
    #[error("row has {actual} values but frame has {expected} fields")]
    RowWidth { expected: usize, actual: usize },
    #[error("unsupported column type {0}")]
    UnsupportedType(String),
    #[error("failed to decode value {value:?} as {expected}")]
    Decode { value: String, expected: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Time,
    Bool,
    Int64,
    Float64,
    String,
}

/// A single cell value, used when building or editing columns row by row.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Time(DateTime<Utc>),
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
}

impl Scalar {
    fn kind(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Time(_) => "time",
            Scalar::Bool(_) => "bool",
            Scalar::Int64(_) => "int64",
            Scalar::Float64(_) => "float64",
            Scalar::String(_) => "string",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

/// Column storage. Every column is nullable at the storage level; the owning
/// [`Field`] records whether nulls are expected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum FieldValues {
    Time(Vec<Option<DateTime<Utc>>>),
    Bool(Vec<Option<bool>>),
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    String(Vec<Option<String>>),
}

impl FieldValues {
    pub fn with_capacity(field_type: FieldType, capacity: usize) -> Self {
        match field_type {
            FieldType::Time => FieldValues::Time(Vec::with_capacity(capacity)),
            FieldType::Bool => FieldValues::Bool(Vec::with_capacity(capacity)),
            FieldType::Int64 => FieldValues::Int64(Vec::with_capacity(capacity)),
            FieldType::Float64 => FieldValues::Float64(Vec::with_capacity(capacity)),
            FieldType::String => FieldValues::String(Vec::with_capacity(capacity)),
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValues::Time(_) => FieldType::Time,
            FieldValues::Bool(_) => FieldType::Bool,
            FieldValues::Int64(_) => FieldType::Int64,
            FieldValues::Float64(_) => FieldType::Float64,
            FieldValues::String(_) => FieldType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldValues::Time(v) => v.len(),
            FieldValues::Bool(v) => v.len(),
            FieldValues::Int64(v) => v.len(),
            FieldValues::Float64(v) => v.len(),
            FieldValues::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, value: Scalar) -> Result<(), FrameError> {
        let len = self.len();
        self.insert(len, value)
    }

    /// Inserts at `index`, shifting later rows. Integers widen into float columns.
    pub fn insert(&mut self, index: usize, value: Scalar) -> Result<(), FrameError> {
        let expected = self.field_type();
        let mismatch = |v: &Scalar| FrameError::TypeMismatch {
            expected,
            actual: v.kind(),
        };
        match (self, value) {
            (FieldValues::Time(v), Scalar::Null) => v.insert(index, None),
            (FieldValues::Bool(v), Scalar::Null) => v.insert(index, None),
            (FieldValues::Int64(v), Scalar::Null) => v.insert(index, None),
            (FieldValues::Float64(v), Scalar::Null) => v.insert(index, None),
            (FieldValues::String(v), Scalar::Null) => v.insert(index, None),
            (FieldValues::Time(v), Scalar::Time(t)) => v.insert(index, Some(t)),
            (FieldValues::Bool(v), Scalar::Bool(b)) => v.insert(index, Some(b)),
            (FieldValues::Int64(v), Scalar::Int64(i)) => v.insert(index, Some(i)),
            (FieldValues::Float64(v), Scalar::Float64(f)) => v.insert(index, Some(f)),
            (FieldValues::Float64(v), Scalar::Int64(i)) => v.insert(index, Some(i as f64)),
            (FieldValues::String(v), Scalar::String(s)) => v.insert(index, Some(s)),
            (_, other) => return Err(mismatch(&other)),
        }
        Ok(())
    }

    /// Whether `insert` would take `value`.
    pub fn accepts(&self, value: &Scalar) -> bool {
        matches!(
            (self, value),
            (_, Scalar::Null)
                | (FieldValues::Time(_), Scalar::Time(_))
                | (FieldValues::Bool(_), Scalar::Bool(_))
                | (FieldValues::Int64(_), Scalar::Int64(_))
                | (FieldValues::Float64(_), Scalar::Float64(_) | Scalar::Int64(_))
                | (FieldValues::String(_), Scalar::String(_))
        )
    }

    /// Overwrites the value at `index` with a nullable scalar.
    pub fn set(&mut self, index: usize, value: Scalar) -> Result<(), FrameError> {
        if index >= self.len() {
            return Err(FrameError::RowWidth {
                expected: self.len(),
                actual: index + 1,
            });
        }
        self.insert(index, value)?;
        self.remove(index + 1);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Scalar {
        match self {
            FieldValues::Time(v) => v.get(index).copied().flatten().map_or(Scalar::Null, Scalar::Time),
            FieldValues::Bool(v) => v.get(index).copied().flatten().map_or(Scalar::Null, Scalar::Bool),
            FieldValues::Int64(v) => v.get(index).copied().flatten().map_or(Scalar::Null, Scalar::Int64),
            FieldValues::Float64(v) => v
                .get(index)
                .copied()
                .flatten()
                .map_or(Scalar::Null, Scalar::Float64),
            FieldValues::String(v) => v
                .get(index)
                .cloned()
                .flatten()
                .map_or(Scalar::Null, Scalar::String),
        }
    }

    fn remove(&mut self, index: usize) {
        match self {
            FieldValues::Time(v) => {
                v.remove(index);
            }
            FieldValues::Bool(v) => {
                v.remove(index);
            }
            FieldValues::Int64(v) => {
                v.remove(index);
            }
            FieldValues::Float64(v) => {
                v.remove(index);
            }
            FieldValues::String(v) => {
                v.remove(index);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<FieldConfig>,
    #[serde(flatten)]
    pub values: FieldValues,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            nullable: true,
            labels: BTreeMap::new(),
            config: None,
            values: FieldValues::with_capacity(field_type, 0),
        }
    }

    pub fn time(name: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldType::Time);
        field.nullable = false;
        field
    }

    pub fn from_values(name: impl Into<String>, values: FieldValues) -> Self {
        Self {
            name: name.into(),
            nullable: true,
            labels: BTreeMap::new(),
            config: None,
            values,
        }
    }

    pub fn with_unit(mut self, unit: Option<String>) -> Self {
        if let Some(unit) = unit.filter(|u| !u.is_empty()) {
            self.config.get_or_insert_with(FieldConfig::default).unit = Some(unit);
        }
        self
    }

    pub fn unit(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.unit.as_deref())
    }

    pub fn field_type(&self) -> FieldType {
        self.values.field_type()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: Scalar) -> Result<(), FrameError> {
        self.values.push(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregates: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub custom: CustomMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub name: String,
    pub fields: Vec<Field>,
    pub meta: FrameMeta,
}

impl Frame {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn rows(&self) -> usize {
        self.fields.first().map(Field::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    /// All columns of a frame must have the same length.
    pub fn validate(&self) -> Result<(), FrameError> {
        let expected = self.rows();
        for field in &self.fields {
            if field.len() != expected {
                return Err(FrameError::LengthMismatch {
                    field: field.name.clone(),
                    expected,
                    actual: field.len(),
                });
            }
        }
        Ok(())
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Same number of fields with the same names and types, in order.
    pub fn same_schema(&self, other: &Frame) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.name == b.name && a.field_type() == b.field_type())
    }

    pub fn row(&self, index: usize) -> Vec<Scalar> {
        self.fields.iter().map(|f| f.values.get(index)).collect()
    }

    pub fn append_row(&mut self, row: Vec<Scalar>) -> Result<(), FrameError> {
        let rows = self.rows();
        self.insert_row(rows, row)
    }

    pub fn insert_row(&mut self, index: usize, row: Vec<Scalar>) -> Result<(), FrameError> {
        if row.len() != self.fields.len() {
            return Err(FrameError::RowWidth {
                expected: self.fields.len(),
                actual: row.len(),
            });
        }
        // Checked up front so a rejected row leaves every column untouched.
        if let Some((field, value)) = self
            .fields
            .iter()
            .zip(&row)
            .find(|(field, value)| !field.values.accepts(value))
        {
            return Err(FrameError::TypeMismatch {
                expected: field.field_type(),
                actual: value.kind(),
            });
        }
        for (field, value) in self.fields.iter_mut().zip(row) {
            field.values.insert(index, value)?;
        }
        Ok(())
    }

    pub fn time_values(&self) -> Option<&[Option<DateTime<Utc>>]> {
        self.fields.iter().find_map(|f| match &f.values {
            FieldValues::Time(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.time_values()?.iter().flatten().max().copied()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.time_values()?.iter().flatten().min().copied()
    }

    pub fn contains_timestamp(&self, ts: DateTime<Utc>) -> bool {
        self.time_values()
            .map(|values| values.iter().flatten().any(|t| *t == ts))
            .unwrap_or(false)
    }
}
