// Property and asset-model descriptors resolved from the service
use serde::{Deserialize, Serialize};

use super::frame::FieldType;
use super::sitewise::Variant;

/// Wire spelling of a data type that has not been observed yet.
pub const UNKNOWN_DATA_TYPE: &str = "?";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Boolean,
    Integer,
    Double,
    String,
    Struct,
    #[default]
    Unknown,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Integer => "INTEGER",
            DataType::Double => "DOUBLE",
            DataType::String => "STRING",
            DataType::Struct => "STRUCT",
            DataType::Unknown => UNKNOWN_DATA_TYPE,
        }
    }

    /// An unknown type takes the type of the first observed value. Known types
    /// never change.
    pub fn widen(self, observed: &Variant) -> DataType {
        match (self, observed.data_type()) {
            (DataType::Unknown, Some(observed)) => observed,
            (current, _) => current,
        }
    }

    pub fn field_type(self) -> FieldType {
        match self {
            DataType::Boolean => FieldType::Bool,
            DataType::Integer => FieldType::Int64,
            DataType::String => FieldType::String,
            DataType::Double | DataType::Struct | DataType::Unknown => FieldType::Float64,
        }
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "BOOLEAN" => DataType::Boolean,
            "INTEGER" | "INT" => DataType::Integer,
            "DOUBLE" => DataType::Double,
            "STRING" => DataType::String,
            "STRUCT" => DataType::Struct,
            _ => DataType::Unknown,
        }
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub asset_id: String,
    pub asset_name: String,
    pub property_id: String,
    pub property_name: String,
    #[serde(default)]
    pub alias: Option<String>,
    pub data_type: DataType,
    #[serde(default)]
    pub unit: String,
}

impl PropertyDescriptor {
    /// Stand-in for an alias that is not associated with any asset property.
    pub fn for_unassociated_alias(alias: &str) -> Self {
        Self {
            property_name: alias.to_string(),
            alias: Some(alias.to_string()),
            data_type: DataType::Unknown,
            ..Self::default()
        }
    }

    /// Sticky widening: once the type is known it is kept for the request.
    pub fn widen<'a>(&mut self, values: impl IntoIterator<Item = &'a Variant>) {
        if self.data_type != DataType::Unknown {
            return;
        }
        if let Some(first) = values.into_iter().find(|v| v.data_type().is_some()) {
            self.data_type = self.data_type.widen(first);
        }
    }

    /// Frame name: the alias when the property was addressed by alias.
    pub fn frame_name(&self) -> &str {
        match &self.alias {
            Some(alias) if self.asset_name.is_empty() => alias,
            _ => &self.asset_name,
        }
    }
}

/// Asset models are described by the service response itself.
pub type AssetModelDescriptor = super::sitewise::DescribeAssetModelResponse;
