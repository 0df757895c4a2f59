// Request and response shapes of the IoT SiteWise REST API
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::frame::Scalar;
use super::property::DataType;
use super::query::{AggregateType, Quality, Resolution, TimeOrdering};

/// Builds a UTC time from the service's split second/nanosecond representation.
pub fn get_time(time_in_seconds: i64, offset_in_nanos: i64) -> DateTime<Utc> {
    Utc.timestamp_nanos(
        time_in_seconds
            .saturating_mul(1_000_000_000)
            .saturating_add(offset_in_nanos),
    )
}

/// Service timestamps in JSON bodies are epoch seconds with a fractional part.
pub mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        let seconds = value.timestamp() as f64 + f64::from(value.timestamp_subsec_nanos()) / 1e9;
        serializer.serialize_f64(seconds)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        Ok(from_f64(seconds))
    }

    pub fn from_f64(seconds: f64) -> DateTime<Utc> {
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1e9).round() as i64;
        super::get_time(whole as i64, nanos)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Ok(Option::<f64>::deserialize(deserializer)?.map(super::from_f64))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInNanos {
    pub time_in_seconds: i64,
    #[serde(default)]
    pub offset_in_nanos: i64,
}

impl TimeInNanos {
    pub fn to_datetime(self) -> DateTime<Utc> {
        get_time(self.time_in_seconds, self.offset_in_nanos)
    }

    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self {
            time_in_seconds: value.timestamp(),
            offset_in_nanos: i64::from(value.timestamp_subsec_nanos()),
        }
    }
}

/// Exactly one member is set on a well-formed variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integer_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_value: Option<bool>,
}

impl Variant {
    pub fn double(value: f64) -> Self {
        Self {
            double_value: Some(value),
            ..Self::default()
        }
    }

    pub fn integer(value: i64) -> Self {
        Self {
            integer_value: Some(value),
            ..Self::default()
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            boolean_value: Some(value),
            ..Self::default()
        }
    }

    /// The data type carried by this variant, if any member is set.
    pub fn data_type(&self) -> Option<DataType> {
        if self.boolean_value.is_some() {
            Some(DataType::Boolean)
        } else if self.integer_value.is_some() {
            Some(DataType::Integer)
        } else if self.double_value.is_some() {
            Some(DataType::Double)
        } else if self.string_value.is_some() {
            Some(DataType::String)
        } else {
            None
        }
    }

    /// Value coerced into the column type of `data_type`. Incompatible members
    /// become null.
    pub fn scalar_for(&self, data_type: DataType) -> Scalar {
        match data_type {
            DataType::Boolean => self.boolean_value.map_or(Scalar::Null, Scalar::Bool),
            DataType::Integer => self.integer_value.map_or(Scalar::Null, Scalar::Int64),
            DataType::String => self
                .string_value
                .clone()
                .map_or(Scalar::Null, Scalar::String),
            DataType::Double | DataType::Struct | DataType::Unknown => {
                match (self.double_value, self.integer_value) {
                    (Some(d), _) => Scalar::Float64(d),
                    (None, Some(i)) => Scalar::Float64(i as f64),
                    _ => Scalar::Null,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPropertyValue {
    pub value: Variant,
    pub timestamp: TimeInNanos,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_deviation: Option<f64>,
}

impl Aggregates {
    pub fn get(&self, aggregate: AggregateType) -> Option<f64> {
        match aggregate {
            AggregateType::Average => self.average,
            AggregateType::Minimum => self.minimum,
            AggregateType::Maximum => self.maximum,
            AggregateType::Sum => self.sum,
            AggregateType::Count => self.count,
            AggregateType::StandardDeviation => self.standard_deviation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedValue {
    #[serde(with = "epoch_seconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    pub value: Aggregates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolatedAssetPropertyValue {
    pub timestamp: TimeInNanos,
    pub value: Variant,
}

/// Identifies a property either by asset and property id or by alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_alias: Option<String>,
}

impl PropertyRef {
    pub fn by_id(asset_id: impl Into<String>, property_id: impl Into<String>) -> Self {
        Self {
            asset_id: Some(asset_id.into()),
            property_id: Some(property_id.into()),
            property_alias: None,
        }
    }

    pub fn by_alias(alias: impl Into<String>) -> Self {
        Self {
            property_alias: Some(alias.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryError {
    pub entry_id: String,
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub error_message: String,
}

// Latest value

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAssetPropertyValueResponse {
    #[serde(default)]
    pub property_value: Option<AssetPropertyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValueEntry {
    pub entry_id: String,
    #[serde(flatten)]
    pub property: PropertyRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetAssetPropertyValueRequest {
    pub entries: Vec<BatchValueEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValueSuccessEntry {
    pub entry_id: String,
    #[serde(default)]
    pub asset_property_value: Option<AssetPropertyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetAssetPropertyValueResponse {
    #[serde(default)]
    pub success_entries: Vec<BatchValueSuccessEntry>,
    #[serde(default)]
    pub error_entries: Vec<EntryError>,
    #[serde(default)]
    pub next_token: Option<String>,
}

// History

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAssetPropertyValueHistoryRequest {
    #[serde(flatten)]
    pub property: PropertyRef,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    pub time_ordering: TimeOrdering,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    pub max_results: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAssetPropertyValueHistoryResponse {
    #[serde(default)]
    pub asset_property_value_history: Vec<AssetPropertyValue>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchHistoryEntry {
    pub entry_id: String,
    #[serde(flatten)]
    pub property: PropertyRef,
    #[serde(with = "epoch_seconds")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "epoch_seconds")]
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualities: Vec<Quality>,
    pub time_ordering: TimeOrdering,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetAssetPropertyValueHistoryRequest {
    pub entries: Vec<BatchHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    pub max_results: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchHistorySuccessEntry {
    pub entry_id: String,
    #[serde(default)]
    pub asset_property_value_history: Vec<AssetPropertyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetAssetPropertyValueHistoryResponse {
    #[serde(default)]
    pub success_entries: Vec<BatchHistorySuccessEntry>,
    #[serde(default)]
    pub error_entries: Vec<EntryError>,
    #[serde(default)]
    pub next_token: Option<String>,
}

// Aggregates

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAssetPropertyAggregatesRequest {
    #[serde(flatten)]
    pub property: PropertyRef,
    pub aggregate_types: Vec<AggregateType>,
    pub resolution: Resolution,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    pub time_ordering: TimeOrdering,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    pub max_results: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAssetPropertyAggregatesResponse {
    #[serde(default)]
    pub aggregated_values: Vec<AggregatedValue>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAggregatesEntry {
    pub entry_id: String,
    #[serde(flatten)]
    pub property: PropertyRef,
    pub aggregate_types: Vec<AggregateType>,
    pub resolution: Resolution,
    #[serde(with = "epoch_seconds")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "epoch_seconds")]
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualities: Vec<Quality>,
    pub time_ordering: TimeOrdering,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetAssetPropertyAggregatesRequest {
    pub entries: Vec<BatchAggregatesEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    pub max_results: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAggregatesSuccessEntry {
    pub entry_id: String,
    #[serde(default)]
    pub aggregated_values: Vec<AggregatedValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetAssetPropertyAggregatesResponse {
    #[serde(default)]
    pub success_entries: Vec<BatchAggregatesSuccessEntry>,
    #[serde(default)]
    pub error_entries: Vec<EntryError>,
    #[serde(default)]
    pub next_token: Option<String>,
}

// Interpolation

pub const LINEAR_INTERPOLATION: &str = "LINEAR_INTERPOLATION";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInterpolatedAssetPropertyValuesRequest {
    #[serde(flatten)]
    pub property: PropertyRef,
    pub start_time: TimeInNanos,
    pub end_time: TimeInNanos,
    pub quality: Quality,
    pub interval_in_seconds: i64,
    #[serde(rename = "type")]
    pub interpolation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    pub max_results: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInterpolatedAssetPropertyValuesResponse {
    #[serde(default)]
    pub interpolated_asset_property_values: Vec<InterpolatedAssetPropertyValue>,
    #[serde(default)]
    pub next_token: Option<String>,
}

// Assets and models

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetProperty {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetHierarchy {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_asset_model_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCompositeModel {
    pub name: String,
    #[serde(rename = "type", default)]
    pub composite_type: String,
    #[serde(default)]
    pub properties: Vec<AssetProperty>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeAssetResponse {
    pub asset_id: String,
    #[serde(default)]
    pub asset_arn: String,
    pub asset_name: String,
    #[serde(default)]
    pub asset_model_id: String,
    #[serde(default)]
    pub asset_description: Option<String>,
    #[serde(default)]
    pub asset_properties: Vec<AssetProperty>,
    #[serde(default)]
    pub asset_hierarchies: Vec<AssetHierarchy>,
    #[serde(default)]
    pub asset_composite_models: Vec<AssetCompositeModel>,
    #[serde(default)]
    pub asset_status: Status,
    #[serde(default, with = "epoch_seconds::option")]
    pub asset_creation_date: Option<DateTime<Utc>>,
    #[serde(default, with = "epoch_seconds::option")]
    pub asset_last_update_date: Option<DateTime<Utc>>,
}

impl DescribeAssetResponse {
    /// Looks in top-level and composite model properties.
    pub fn find_property(&self, property_id: &str) -> Option<&AssetProperty> {
        self.asset_properties
            .iter()
            .chain(
                self.asset_composite_models
                    .iter()
                    .flat_map(|c| c.properties.iter()),
            )
            .find(|p| p.id == property_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetModelProperty {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeAssetModelResponse {
    pub asset_model_id: String,
    #[serde(default)]
    pub asset_model_arn: String,
    pub asset_model_name: String,
    #[serde(default)]
    pub asset_model_description: Option<String>,
    #[serde(default)]
    pub asset_model_properties: Vec<AssetModelProperty>,
    #[serde(default)]
    pub asset_model_hierarchies: Vec<AssetHierarchy>,
    #[serde(default)]
    pub asset_model_status: Status,
    #[serde(default, with = "epoch_seconds::option")]
    pub asset_model_creation_date: Option<DateTime<Utc>>,
    #[serde(default, with = "epoch_seconds::option")]
    pub asset_model_last_update_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub id: String,
    #[serde(default)]
    pub arn: String,
    pub name: String,
    #[serde(default)]
    pub asset_model_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub hierarchies: Vec<AssetHierarchy>,
    #[serde(default, with = "epoch_seconds::option")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default, with = "epoch_seconds::option")]
    pub last_update_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetModelSummary {
    pub id: String,
    #[serde(default)]
    pub arn: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, with = "epoch_seconds::option")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default, with = "epoch_seconds::option")]
    pub last_update_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPropertySummary {
    pub id: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub asset_composite_model_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesSummary {
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    pub time_series_id: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub data_type_spec: Option<String>,
    #[serde(default)]
    pub time_series_arn: String,
    #[serde(default, with = "epoch_seconds::option")]
    pub time_series_creation_date: Option<DateTime<Utc>>,
    #[serde(default, with = "epoch_seconds::option")]
    pub time_series_last_update_date: Option<DateTime<Utc>>,
}

pub type DescribeTimeSeriesResponse = TimeSeriesSummary;

// List requests are sent as query string parameters.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListAssetsRequest {
    pub asset_model_id: Option<String>,
    pub filter: Option<String>,
    pub next_token: Option<String>,
    pub max_results: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssetsResponse {
    #[serde(default)]
    pub asset_summaries: Vec<AssetSummary>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListAssetModelsRequest {
    pub next_token: Option<String>,
    pub max_results: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssetModelsResponse {
    #[serde(default)]
    pub asset_model_summaries: Vec<AssetModelSummary>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDirection {
    Parent,
    Child,
}

impl TraversalDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TraversalDirection::Parent => "PARENT",
            TraversalDirection::Child => "CHILD",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListAssociatedAssetsRequest {
    pub asset_id: String,
    pub hierarchy_id: Option<String>,
    pub traversal_direction: TraversalDirection,
    pub next_token: Option<String>,
    pub max_results: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListAssetPropertiesRequest {
    pub asset_id: String,
    pub next_token: Option<String>,
    pub max_results: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssetPropertiesResponse {
    #[serde(default)]
    pub asset_property_summaries: Vec<AssetPropertySummary>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListTimeSeriesRequest {
    pub asset_id: Option<String>,
    pub alias_prefix: Option<String>,
    pub time_series_type: Option<String>,
    pub next_token: Option<String>,
    pub max_results: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTimeSeriesResponse {
    #[serde(default)]
    pub time_series_summaries: Vec<TimeSeriesSummary>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescribeTimeSeriesRequest {
    pub alias: Option<String>,
    pub asset_id: Option<String>,
    pub property_id: Option<String>,
}

// SQL-style queries

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteQueryRequest {
    pub query_statement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnType {
    #[serde(default)]
    pub scalar_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datum {
    #[serde(default)]
    pub scalar_value: Option<String>,
    #[serde(default)]
    pub null_value: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default)]
    pub data: Vec<Datum>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteQueryResponse {
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub next_token: Option<String>,
}
