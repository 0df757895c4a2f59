// Typed queries decoded from the per-panel JSON sent by the visualization host
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_STREAMING_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_HISTORY_DATA_POINTS: i64 = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryType {
    PropertyValue,
    PropertyValueHistory,
    PropertyAggregate,
    PropertyInterpolated,
    PropertyValuesForTimeRange,
    ListAssets,
    ListAssetModels,
    ListAssetProperties,
    ListAssociatedAssets,
    ListTimeSeries,
    DescribeAsset,
    DescribeAssetModel,
    ExecuteQuery,
}

impl QueryType {
    pub fn is_property_query(self) -> bool {
        matches!(
            self,
            QueryType::PropertyValue
                | QueryType::PropertyValueHistory
                | QueryType::PropertyAggregate
                | QueryType::PropertyInterpolated
                | QueryType::PropertyValuesForTimeRange
        )
    }

    /// Kinds whose responses can be extended with the nearest points outside the window.
    pub fn supports_last_observation(self) -> bool {
        matches!(
            self,
            QueryType::PropertyValueHistory
                | QueryType::PropertyAggregate
                | QueryType::PropertyValuesForTimeRange
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregateType {
    Average,
    Minimum,
    Maximum,
    Sum,
    Count,
    StandardDeviation,
}

impl AggregateType {
    /// Column order of aggregate frames.
    pub const ORDER: [AggregateType; 6] = [
        AggregateType::Average,
        AggregateType::Minimum,
        AggregateType::Maximum,
        AggregateType::Sum,
        AggregateType::Count,
        AggregateType::StandardDeviation,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            AggregateType::Average => "avg",
            AggregateType::Minimum => "min",
            AggregateType::Maximum => "max",
            AggregateType::Sum => "sum",
            AggregateType::Count => "count",
            AggregateType::StandardDeviation => "stddev",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AggregateType::Average => "AVERAGE",
            AggregateType::Minimum => "MINIMUM",
            AggregateType::Maximum => "MAXIMUM",
            AggregateType::Sum => "SUM",
            AggregateType::Count => "COUNT",
            AggregateType::StandardDeviation => "STANDARD_DEVIATION",
        }
    }
}

/// Bucket size of aggregated or interpolated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    Raw,
    OneSecond,
    TenSeconds,
    OneMinute,
    TenMinutes,
    OneHour,
    TenHours,
    OneDay,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Raw => "RAW",
            Resolution::OneSecond => "1s",
            Resolution::TenSeconds => "10s",
            Resolution::OneMinute => "1m",
            Resolution::TenMinutes => "10m",
            Resolution::OneHour => "1h",
            Resolution::TenHours => "10h",
            Resolution::OneDay => "1d",
        }
    }

    /// Bucket width; `None` for raw data.
    pub fn duration(self) -> Option<Duration> {
        let secs = match self {
            Resolution::Raw => return None,
            Resolution::OneSecond => 1,
            Resolution::TenSeconds => 10,
            Resolution::OneMinute => 60,
            Resolution::TenMinutes => 600,
            Resolution::OneHour => 3_600,
            Resolution::TenHours => 36_000,
            Resolution::OneDay => 86_400,
        };
        Some(Duration::from_secs(secs))
    }

    pub fn parse(value: &str) -> Option<Resolution> {
        match value {
            "RAW" | "raw" => Some(Resolution::Raw),
            "1s" => Some(Resolution::OneSecond),
            "10s" => Some(Resolution::TenSeconds),
            "1m" => Some(Resolution::OneMinute),
            "10m" => Some(Resolution::TenMinutes),
            "1h" => Some(Resolution::OneHour),
            "10h" => Some(Resolution::TenHours),
            "1d" => Some(Resolution::OneDay),
            _ => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Resolution::parse(&value).ok_or_else(|| format!("unknown resolution {value:?}"))
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSetting {
    Auto,
    Fixed(Resolution),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quality {
    #[default]
    #[serde(alias = "")]
    Any,
    Good,
    Bad,
    Uncertain,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Any => "ANY",
            Quality::Good => "GOOD",
            Quality::Bad => "BAD",
            Quality::Uncertain => "UNCERTAIN",
        }
    }

    /// Singleton endpoints take no filter for ANY.
    pub fn for_single(self) -> Option<Quality> {
        match self {
            Quality::Any => None,
            other => Some(other),
        }
    }

    /// Batched endpoints prefer GOOD when the caller did not choose.
    pub fn for_batch(self) -> Quality {
        match self {
            Quality::Any => Quality::Good,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeOrdering {
    #[default]
    Ascending,
    Descending,
}

impl TimeOrdering {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeOrdering::Ascending => "ASCENDING",
            TimeOrdering::Descending => "DESCENDING",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Table,
    #[serde(alias = "timeSeries", alias = "time_series")]
    Timeseries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn duration(&self) -> Duration {
        (self.to - self.from).to_std().unwrap_or_default()
    }
}

/// One query of a batch as sent by the host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    pub ref_id: String,
    pub time_range: TimeRange,
    #[serde(default)]
    pub interval_ms: i64,
    #[serde(default)]
    pub max_data_points: i64,
    /// Opaque per-panel model.
    #[serde(default)]
    pub json: serde_json::Value,
}

/// Fields shared by every query kind.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseQuery {
    pub ref_id: String,
    pub query_type: QueryType,
    pub region: Option<String>,
    pub asset_ids: Vec<String>,
    pub property_id: Option<String>,
    pub property_alias: Option<String>,
    pub next_token: Option<String>,
    pub time_range: TimeRange,
    pub interval: Duration,
    pub max_data_points: i64,
    pub max_page_aggregations: i64,
}

impl BaseQuery {
    /// History budget: values outside [1, 20000] fall back to the maximum.
    pub fn history_max_points(&self) -> i64 {
        if (1..=MAX_HISTORY_DATA_POINTS).contains(&self.max_data_points) {
            self.max_data_points
        } else {
            MAX_HISTORY_DATA_POINTS
        }
    }

    pub fn max_pages(&self) -> usize {
        self.max_page_aggregations.max(1) as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetPropertyValueQuery {
    pub base: BaseQuery,
    pub aggregate_types: Vec<AggregateType>,
    pub resolution: ResolutionSetting,
    pub quality: Quality,
    pub time_ordering: TimeOrdering,
    pub last_observation: bool,
    pub response_format: ResponseFormat,
    pub is_streaming: bool,
    pub interval_streaming: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub base: BaseQuery,
    pub asset_model_id: Option<String>,
    pub filter: Option<String>,
    pub hierarchy_id: Option<String>,
    pub alias_prefix: Option<String>,
    pub time_series_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteQueryStatement {
    pub base: BaseQuery,
    pub query_statement: String,
}

/// A decoded query, closed over the supported kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum SitewiseQuery {
    PropertyValue(AssetPropertyValueQuery),
    List(ListQuery),
    Statement(ExecuteQueryStatement),
}

impl SitewiseQuery {
    pub fn base(&self) -> &BaseQuery {
        match self {
            SitewiseQuery::PropertyValue(q) => &q.base,
            SitewiseQuery::List(q) => &q.base,
            SitewiseQuery::Statement(q) => &q.base,
        }
    }

    pub fn query_type(&self) -> QueryType {
        self.base().query_type
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, SitewiseQuery::PropertyValue(q) if q.is_streaming)
    }

    pub fn response_format(&self) -> ResponseFormat {
        match self {
            SitewiseQuery::PropertyValue(q) => q.response_format,
            _ => ResponseFormat::Table,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Raw panel JSON; every option is optional on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QueryModel {
    query_type: Option<QueryType>,
    region: Option<String>,
    asset_ids: Vec<String>,
    asset_id: Option<String>,
    property_id: Option<String>,
    property_alias: Option<String>,
    next_token: Option<String>,
    aggregate_types: Vec<AggregateType>,
    resolution: Option<String>,
    quality: Option<Quality>,
    time_ordering: Option<TimeOrdering>,
    last_observation: bool,
    response_format: Option<ResponseFormat>,
    is_streaming: bool,
    interval_streaming: Option<String>,
    query_statement: Option<String>,
    max_page_aggregations: Option<i64>,
    max_data_points: Option<i64>,
    asset_model_id: Option<String>,
    filter: Option<String>,
    hierarchy_id: Option<String>,
    alias_prefix: Option<String>,
    time_series_type: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SitewiseQuery {
    pub fn decode(query: &DataQuery) -> Result<SitewiseQuery, DecodeError> {
        let model: QueryModel = serde_json::from_value(query.json.clone())?;
        let query_type = model
            .query_type
            .ok_or_else(|| DecodeError::Invalid("missing queryType".into()))?;

        let mut asset_ids: Vec<String> = model
            .asset_ids
            .into_iter()
            .filter(|id| !id.is_empty())
            .collect();
        if let Some(asset_id) = non_empty(model.asset_id) {
            if !asset_ids.contains(&asset_id) {
                asset_ids.push(asset_id);
            }
        }

        let base = BaseQuery {
            ref_id: query.ref_id.clone(),
            query_type,
            region: non_empty(model.region),
            asset_ids,
            property_id: non_empty(model.property_id),
            property_alias: non_empty(model.property_alias),
            next_token: non_empty(model.next_token),
            time_range: query.time_range,
            interval: Duration::from_millis(query.interval_ms.max(0) as u64),
            max_data_points: model.max_data_points.unwrap_or(query.max_data_points),
            max_page_aggregations: model.max_page_aggregations.unwrap_or(1),
        };

        if base.time_range.from > base.time_range.to {
            return Err(DecodeError::Invalid("time range ends before it starts".into()));
        }

        if query_type == QueryType::ExecuteQuery {
            let statement = non_empty(model.query_statement)
                .ok_or_else(|| DecodeError::Invalid("missing queryStatement".into()))?;
            return Ok(SitewiseQuery::Statement(ExecuteQueryStatement {
                base,
                query_statement: statement,
            }));
        }

        if !query_type.is_property_query() {
            if model.is_streaming {
                return Err(DecodeError::Invalid(format!(
                    "{query_type:?} queries cannot be streamed"
                )));
            }
            return Ok(SitewiseQuery::List(ListQuery {
                base,
                asset_model_id: non_empty(model.asset_model_id),
                filter: non_empty(model.filter),
                hierarchy_id: non_empty(model.hierarchy_id),
                alias_prefix: non_empty(model.alias_prefix),
                time_series_type: non_empty(model.time_series_type),
            }));
        }

        if base.property_alias.is_none() && (base.asset_ids.is_empty() || base.property_id.is_none()) {
            return Err(DecodeError::Invalid(
                "either propertyAlias or assetIds with propertyId is required".into(),
            ));
        }

        let resolution = match non_empty(model.resolution) {
            None => ResolutionSetting::Auto,
            Some(label) if label.eq_ignore_ascii_case("AUTO") => ResolutionSetting::Auto,
            Some(label) => ResolutionSetting::Fixed(
                Resolution::parse(&label).ok_or_else(|| {
                    DecodeError::Invalid(format!("unknown resolution {label:?}"))
                })?,
            ),
        };
        if query_type == QueryType::PropertyInterpolated
            && resolution == ResolutionSetting::Fixed(Resolution::Raw)
        {
            return Err(DecodeError::Invalid(
                "interpolated queries need a bucket resolution".into(),
            ));
        }

        let interval_streaming = match non_empty(model.interval_streaming) {
            Some(text) => humantime::parse_duration(&text)
                .map_err(|err| DecodeError::Invalid(format!("invalid intervalStreaming: {err}")))?,
            None => DEFAULT_STREAMING_INTERVAL,
        };

        Ok(SitewiseQuery::PropertyValue(AssetPropertyValueQuery {
            base,
            aggregate_types: model.aggregate_types,
            resolution,
            quality: model.quality.unwrap_or_default(),
            time_ordering: model.time_ordering.unwrap_or_default(),
            last_observation: model.last_observation,
            response_format: model.response_format.unwrap_or_default(),
            is_streaming: model.is_streaming,
            interval_streaming,
        }))
    }
}
