// Per-query dispatch: decode, execute, frame, extend, register streams
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::application::api::aggregate::{effective_resolution, get_asset_property_aggregates};
use crate::application::api::describe::{describe_asset, describe_asset_model};
use crate::application::api::execute_query::execute_query;
use crate::application::api::history::get_asset_property_values;
use crate::application::api::interpolated::get_interpolated_asset_property_values;
use crate::application::api::list::{
    list_asset_models, list_asset_properties, list_assets, list_associated_assets,
    list_time_series,
};
use crate::application::api::property_value::get_asset_property_value;
use crate::application::api::time_range::{
    TimeRangeResponse, get_asset_property_values_for_time_range,
};
use crate::application::framer::Framer;
use crate::application::framer::last_observation::{after_window, before_window, merge_frames};
use crate::application::framer::reshape;
use crate::application::resolution::pick_resolution;
use crate::application::resource_cache::ResourceCache;
use crate::application::resource_provider::ResourceProvider;
use crate::application::sitewise_client::{ApiError, ApiResult, ClientProvider};
use crate::application::streaming_service::{StreamRegistry, StreamState};
use crate::domain::frame::Frame;
use crate::domain::query::{
    AssetPropertyValueQuery, DataQuery, DecodeError, ListQuery, QueryType, Resolution,
    ResolutionSetting, ResponseFormat, SitewiseQuery, TimeOrdering, TimeRange,
};
use crate::domain::sitewise::ListAssetModelsRequest;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to unmarshal JSON request into query: {0}")]
    Unmarshal(#[from] DecodeError),
    #[error("failed to fetch query data: {0}")]
    RequestFailed(#[from] ApiError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryDataRequest {
    pub queries: Vec<DataQuery>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DataResponse {
    pub frames: Vec<Frame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryDataResponse {
    pub results: BTreeMap<String, DataResponse>,
}

/// Frames of one upstream round and the token to continue it with.
#[derive(Debug, Clone, Default)]
pub struct Round {
    pub frames: Vec<Frame>,
    pub next_token: Option<String>,
}

fn framed<R: Framer>(response: &R, next_token: Option<&str>) -> ApiResult<Round> {
    Ok(Round {
        frames: response.frames()?,
        next_token: next_token.filter(|t| !t.is_empty()).map(String::from),
    })
}

/// Latest timestamp over every time column of `frames`.
pub fn latest_timestamp(frames: &[Frame]) -> Option<DateTime<Utc>> {
    frames
        .iter()
        .filter_map(Frame::time_values)
        .flat_map(|values| values.iter().flatten())
        .max()
        .copied()
}

/// Runs the API operation of the query's kind and frames its response.
pub async fn execute(provider: &ResourceProvider, query: &SitewiseQuery) -> ApiResult<Round> {
    match query {
        SitewiseQuery::PropertyValue(q) => execute_property(provider, q).await,
        SitewiseQuery::List(q) => execute_list(provider, q).await,
        SitewiseQuery::Statement(q) => {
            let response = execute_query(provider, q).await?;
            framed(&response, response.next_token.as_deref())
        }
    }
}

async fn execute_property(
    provider: &ResourceProvider,
    query: &AssetPropertyValueQuery,
) -> ApiResult<Round> {
    match query.base.query_type {
        QueryType::PropertyValue => {
            let response = get_asset_property_value(provider, query).await?;
            framed(&response, response.next_token.as_deref())
        }
        QueryType::PropertyValueHistory => {
            let response = get_asset_property_values(provider, query).await?;
            framed(&response, response.next_token.as_deref())
        }
        QueryType::PropertyAggregate => {
            let response = get_asset_property_aggregates(provider, query).await?;
            framed(&response, response.next_token.as_deref())
        }
        QueryType::PropertyInterpolated => {
            let response = get_interpolated_asset_property_values(provider, query).await?;
            framed(&response, response.next_token.as_deref())
        }
        QueryType::PropertyValuesForTimeRange => {
            let response = get_asset_property_values_for_time_range(provider, query).await?;
            let next_token = match &response {
                TimeRangeResponse::History(r) => r.next_token.clone(),
                TimeRangeResponse::Aggregate(r) => r.next_token.clone(),
            };
            framed(&response, next_token.as_deref())
        }
        other => Err(ApiError::InvalidRequest(format!(
            "{other:?} is not a property query"
        ))),
    }
}

async fn execute_list(provider: &ResourceProvider, query: &ListQuery) -> ApiResult<Round> {
    match query.base.query_type {
        QueryType::ListAssets => {
            let response = list_assets(provider, query).await?;
            framed(&response, response.next_token.as_deref())
        }
        QueryType::ListAssetModels => {
            let response = list_asset_models(provider, query).await?;
            framed(&response, response.next_token.as_deref())
        }
        QueryType::ListAssetProperties => {
            let response = list_asset_properties(provider, query).await?;
            framed(&response, response.next_token.as_deref())
        }
        QueryType::ListAssociatedAssets => {
            let response = list_associated_assets(provider, query).await?;
            framed(&response, response.next_token.as_deref())
        }
        QueryType::ListTimeSeries => {
            let response = list_time_series(provider, query).await?;
            framed(&response, response.next_token.as_deref())
        }
        QueryType::DescribeAsset => framed(&describe_asset(provider, query).await?, None),
        QueryType::DescribeAssetModel => {
            framed(&describe_asset_model(provider, query).await?, None)
        }
        other => Err(ApiError::InvalidRequest(format!(
            "{other:?} is not a resource query"
        ))),
    }
}

/// Query for the single nearest point on one side of the window. The side
/// takes the same history or aggregate path as the primary so both frame
/// with the same columns.
fn side_query(
    query: &AssetPropertyValueQuery,
    window: TimeRange,
    time_ordering: TimeOrdering,
) -> SitewiseQuery {
    let mut side = query.clone();
    match query.base.query_type {
        QueryType::PropertyAggregate => {
            side.resolution = ResolutionSetting::Fixed(effective_resolution(query));
        }
        QueryType::PropertyValuesForTimeRange => {
            let resolution = match query.resolution {
                ResolutionSetting::Fixed(resolution) => resolution,
                ResolutionSetting::Auto => {
                    pick_resolution(&query.base.time_range, query.base.max_data_points)
                }
            };
            if resolution == Resolution::Raw {
                side.base.query_type = QueryType::PropertyValueHistory;
            } else {
                side.base.query_type = QueryType::PropertyAggregate;
                side.resolution = ResolutionSetting::Fixed(resolution);
            }
        }
        _ => {}
    }
    side.base.time_range = window;
    side.base.next_token = None;
    side.base.max_data_points = 1;
    side.base.max_page_aggregations = 1;
    side.time_ordering = time_ordering;
    side.last_observation = false;
    side.is_streaming = false;
    SitewiseQuery::PropertyValue(side)
}

async fn side_frames(provider: &ResourceProvider, query: &SitewiseQuery) -> Option<Vec<Frame>> {
    match execute(provider, query).await {
        Ok(round) => Some(round.frames),
        Err(err) => {
            tracing::debug!(
                "Last observation lookup for {} failed: {}",
                query.base().ref_id,
                err
            );
            None
        }
    }
}

/// Extends the frames with the nearest point before and after the window.
/// Only first pages are extended.
async fn with_last_observation(
    provider: &ResourceProvider,
    query: &AssetPropertyValueQuery,
    frames: Vec<Frame>,
) -> ApiResult<Vec<Frame>> {
    if !query.last_observation
        || !query.base.query_type.supports_last_observation()
        || query.base.next_token.is_some()
    {
        return Ok(frames);
    }

    let range = query.base.time_range;
    let before_query = side_query(query, before_window(&range), TimeOrdering::Descending);
    let after_query = after_window(&range, Utc::now())
        .map(|window| side_query(query, window, TimeOrdering::Ascending));

    let before = side_frames(provider, &before_query).await;
    let after = match &after_query {
        Some(after_query) => side_frames(provider, after_query).await,
        None => None,
    };
    Ok(merge_frames(frames, before.as_deref(), after.as_deref())?)
}

fn apply_format(query: &SitewiseQuery, frames: Vec<Frame>) -> ApiResult<Vec<Frame>> {
    match query.response_format() {
        ResponseFormat::Timeseries => Ok(reshape::to_wide(frames)?),
        ResponseFormat::Table => Ok(frames),
    }
}

/// Dispatches queries of one data-source instance.
pub struct QueryService {
    clients: Arc<dyn ClientProvider>,
    cache: Arc<ResourceCache>,
    instance_id: String,
    streams: Arc<StreamRegistry>,
}

impl QueryService {
    pub fn new(
        clients: Arc<dyn ClientProvider>,
        cache: Arc<ResourceCache>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            clients,
            cache,
            instance_id: instance_id.into(),
            streams: Arc::new(StreamRegistry::default()),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn streams(&self) -> &Arc<StreamRegistry> {
        &self.streams
    }

    async fn provider(&self, region: Option<&str>) -> ApiResult<ResourceProvider> {
        let client = self.clients.client(region).await?;
        let region = region.unwrap_or_else(|| self.clients.default_region());
        Ok(ResourceProvider::new(client, self.cache.clone(), region))
    }

    /// Runs every query of the batch. Failures stay on their own ref id.
    pub async fn query_data(&self, request: QueryDataRequest) -> QueryDataResponse {
        let runs = request.queries.iter().map(|query| async move {
            (query.ref_id.clone(), self.handle_query(query).await)
        });

        let mut results = BTreeMap::new();
        for (ref_id, result) in join_all(runs).await {
            let response = match result {
                Ok(frames) => DataResponse {
                    frames,
                    error: None,
                },
                Err(err) => {
                    tracing::warn!("Query {} failed: {}", ref_id, err);
                    DataResponse {
                        frames: Vec::new(),
                        error: Some(err.to_string()),
                    }
                }
            };
            results.insert(ref_id, response);
        }
        QueryDataResponse { results }
    }

    pub async fn handle_query(&self, data_query: &DataQuery) -> Result<Vec<Frame>, QueryError> {
        let query = SitewiseQuery::decode(data_query)?;
        tracing::debug!(
            "Dispatching {:?} query {}",
            query.query_type(),
            data_query.ref_id
        );

        let provider = self.provider(query.base().region.as_deref()).await?;
        let round = execute(&provider, &query).await?;
        let mut frames = match &query {
            SitewiseQuery::PropertyValue(q) => {
                with_last_observation(&provider, q, round.frames).await?
            }
            _ => round.frames,
        };
        let latest = latest_timestamp(&frames);
        frames = apply_format(&query, frames)?;

        if let Some(first) = frames.first_mut() {
            first.meta.custom.query_id = Some(data_query.ref_id.clone());
        }

        if let SitewiseQuery::PropertyValue(q) = query {
            if q.is_streaming {
                let channel = self.register_stream(q, round.next_token, latest);
                if frames.is_empty() {
                    frames.push(Frame::new(""));
                }
                frames[0].meta.channel = Some(channel);
            }
        }
        Ok(frames)
    }

    /// One round of a registered stream: execute and format, no extension.
    pub async fn run_round(&self, query: &SitewiseQuery) -> Result<Round, QueryError> {
        let provider = self.provider(query.base().region.as_deref()).await?;
        let round = execute(&provider, query).await?;
        Ok(Round {
            frames: apply_format(query, round.frames)?,
            next_token: round.next_token,
        })
    }

    fn register_stream(
        &self,
        query: AssetPropertyValueQuery,
        next_token: Option<String>,
        latest: Option<DateTime<Utc>>,
    ) -> String {
        let uid = Uuid::new_v4().to_string();
        let mut state = StreamState::new(query);
        match next_token {
            Some(token) => state.next_token = Some(token),
            None => state.advance(latest, Utc::now()),
        }
        self.streams.insert(&uid, state);
        let channel = format!("ds/{}/{}", self.instance_id, uid);
        tracing::info!("Registered stream {}", channel);
        channel
    }

    /// One cheap call against the default region.
    pub async fn check_health(&self) -> ApiResult<()> {
        let provider = self.provider(None).await?;
        let request = ListAssetModelsRequest {
            next_token: None,
            max_results: Some(1),
        };
        provider.client().list_asset_models(&request).await?;
        Ok(())
    }
}
