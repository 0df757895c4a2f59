// In-memory SiteWise double shared by the unit tests
use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::application::resource_cache::ResourceCache;
use crate::application::resource_provider::ResourceProvider;
use crate::application::sitewise_client::{ApiError, ApiResult, ClientProvider, SitewiseClient};
use crate::domain::property::DataType;
use crate::domain::query::{
    AssetPropertyValueQuery, BaseQuery, ListQuery, Quality, QueryType, ResolutionSetting,
    ResponseFormat, TimeOrdering, TimeRange, DEFAULT_STREAMING_INTERVAL,
};
use crate::domain::sitewise::*;

type Handler<Req, Resp> = Box<dyn Fn(&Req) -> ApiResult<Resp> + Send + Sync>;

/// Canned responses and a request log. Queued pages are served first, then
/// the installed handler, then an empty page.
pub struct FakeSitewise {
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, String>>,
    assets: Mutex<HashMap<String, DescribeAssetResponse>>,
    models: Mutex<HashMap<String, DescribeAssetModelResponse>>,
    time_series: Mutex<Vec<TimeSeriesSummary>>,
    latest: Mutex<HashMap<PropertyRef, AssetPropertyValue>>,

    history_pages: Mutex<VecDeque<GetAssetPropertyValueHistoryResponse>>,
    history_handler: Mutex<Option<Handler<GetAssetPropertyValueHistoryRequest, GetAssetPropertyValueHistoryResponse>>>,
    batch_history_pages: Mutex<VecDeque<BatchGetAssetPropertyValueHistoryResponse>>,
    aggregate_pages: Mutex<VecDeque<GetAssetPropertyAggregatesResponse>>,
    aggregate_handler: Mutex<Option<Handler<GetAssetPropertyAggregatesRequest, GetAssetPropertyAggregatesResponse>>>,
    batch_aggregate_pages: Mutex<VecDeque<BatchGetAssetPropertyAggregatesResponse>>,
    interpolated_pages: Mutex<VecDeque<GetInterpolatedAssetPropertyValuesResponse>>,
    execute_pages: Mutex<VecDeque<ExecuteQueryResponse>>,

    history_requests: Mutex<Vec<GetAssetPropertyValueHistoryRequest>>,
    batch_history_requests: Mutex<Vec<BatchGetAssetPropertyValueHistoryRequest>>,
    aggregate_requests: Mutex<Vec<GetAssetPropertyAggregatesRequest>>,
    interpolated_requests: Mutex<Vec<GetInterpolatedAssetPropertyValuesRequest>>,
    batch_value_requests: Mutex<Vec<BatchGetAssetPropertyValueRequest>>,
    list_assets_requests: Mutex<Vec<ListAssetsRequest>>,
    associated_requests: Mutex<Vec<ListAssociatedAssetsRequest>>,
}

impl Default for FakeSitewise {
    fn default() -> Self {
        let mut models = HashMap::new();
        models.insert("m-turbine".to_string(), turbine_model());
        Self {
            calls: Mutex::default(),
            failures: Mutex::default(),
            assets: Mutex::default(),
            models: Mutex::new(models),
            time_series: Mutex::default(),
            latest: Mutex::default(),
            history_pages: Mutex::default(),
            history_handler: Mutex::default(),
            batch_history_pages: Mutex::default(),
            aggregate_pages: Mutex::default(),
            aggregate_handler: Mutex::default(),
            batch_aggregate_pages: Mutex::default(),
            interpolated_pages: Mutex::default(),
            execute_pages: Mutex::default(),
            history_requests: Mutex::default(),
            batch_history_requests: Mutex::default(),
            aggregate_requests: Mutex::default(),
            interpolated_requests: Mutex::default(),
            batch_value_requests: Mutex::default(),
            list_assets_requests: Mutex::default(),
            associated_requests: Mutex::default(),
        }
    }
}

impl FakeSitewise {
    pub fn add_asset(&self, asset: DescribeAssetResponse) {
        self.assets.lock().insert(asset.asset_id.clone(), asset);
    }

    pub fn add_time_series(&self, summary: TimeSeriesSummary) {
        self.time_series.lock().push(summary);
    }

    pub fn set_latest(&self, property: PropertyRef, value: AssetPropertyValue) {
        self.latest.lock().insert(property, value);
    }

    /// Makes every later call of `method` fail with a service error.
    pub fn fail(&self, method: &'static str, message: &str) {
        self.failures.lock().insert(method, message.to_string());
    }

    pub fn push_history(&self, values: Vec<AssetPropertyValue>, next_token: Option<String>) {
        self.history_pages
            .lock()
            .push_back(GetAssetPropertyValueHistoryResponse {
                asset_property_value_history: values,
                next_token,
            });
    }

    pub fn on_history(
        &self,
        handler: impl Fn(&GetAssetPropertyValueHistoryRequest) -> ApiResult<GetAssetPropertyValueHistoryResponse>
        + Send
        + Sync
        + 'static,
    ) {
        *self.history_handler.lock() = Some(Box::new(handler));
    }

    pub fn push_batch_history(&self, response: BatchGetAssetPropertyValueHistoryResponse) {
        self.batch_history_pages.lock().push_back(response);
    }

    pub fn push_aggregates(&self, values: Vec<AggregatedValue>, next_token: Option<String>) {
        self.aggregate_pages
            .lock()
            .push_back(GetAssetPropertyAggregatesResponse {
                aggregated_values: values,
                next_token,
            });
    }

    pub fn on_aggregates(
        &self,
        handler: impl Fn(&GetAssetPropertyAggregatesRequest) -> ApiResult<GetAssetPropertyAggregatesResponse>
        + Send
        + Sync
        + 'static,
    ) {
        *self.aggregate_handler.lock() = Some(Box::new(handler));
    }

    pub fn push_batch_aggregates(&self, response: BatchGetAssetPropertyAggregatesResponse) {
        self.batch_aggregate_pages.lock().push_back(response);
    }

    pub fn push_interpolated(
        &self,
        values: Vec<InterpolatedAssetPropertyValue>,
        next_token: Option<String>,
    ) {
        self.interpolated_pages
            .lock()
            .push_back(GetInterpolatedAssetPropertyValuesResponse {
                interpolated_asset_property_values: values,
                next_token,
            });
    }

    pub fn push_execute(&self, response: ExecuteQueryResponse) {
        self.execute_pages.lock().push_back(response);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == method).count()
    }

    pub fn history_requests(&self) -> Vec<GetAssetPropertyValueHistoryRequest> {
        self.history_requests.lock().clone()
    }

    pub fn batch_history_requests(&self) -> Vec<BatchGetAssetPropertyValueHistoryRequest> {
        self.batch_history_requests.lock().clone()
    }

    pub fn aggregate_requests(&self) -> Vec<GetAssetPropertyAggregatesRequest> {
        self.aggregate_requests.lock().clone()
    }

    pub fn interpolated_requests(&self) -> Vec<GetInterpolatedAssetPropertyValuesRequest> {
        self.interpolated_requests.lock().clone()
    }

    pub fn batch_value_requests(&self) -> Vec<BatchGetAssetPropertyValueRequest> {
        self.batch_value_requests.lock().clone()
    }

    pub fn list_assets_requests(&self) -> Vec<ListAssetsRequest> {
        self.list_assets_requests.lock().clone()
    }

    pub fn associated_requests(&self) -> Vec<ListAssociatedAssetsRequest> {
        self.associated_requests.lock().clone()
    }

    fn record(&self, method: &'static str) -> ApiResult<()> {
        self.calls.lock().push(method);
        match self.failures.lock().get(method) {
            Some(message) => Err(ApiError::Service {
                status: 500,
                code: "InternalFailureException".into(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SitewiseClient for FakeSitewise {
    async fn describe_asset(&self, asset_id: &str) -> ApiResult<DescribeAssetResponse> {
        self.record("describe_asset")?;
        self.assets
            .lock()
            .get(asset_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("asset {asset_id}")))
    }

    async fn describe_asset_model(
        &self,
        asset_model_id: &str,
    ) -> ApiResult<DescribeAssetModelResponse> {
        self.record("describe_asset_model")?;
        self.models
            .lock()
            .get(asset_model_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("asset model {asset_model_id}")))
    }

    async fn describe_time_series(
        &self,
        request: &DescribeTimeSeriesRequest,
    ) -> ApiResult<DescribeTimeSeriesResponse> {
        self.record("describe_time_series")?;
        self.time_series
            .lock()
            .iter()
            .find(|ts| request.alias.is_some() && ts.alias == request.alias)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("time series {:?}", request.alias)))
    }

    async fn list_assets(&self, request: &ListAssetsRequest) -> ApiResult<ListAssetsResponse> {
        self.record("list_assets")?;
        self.list_assets_requests.lock().push(request.clone());
        let asset_summaries = self
            .assets
            .lock()
            .values()
            .filter(|a| {
                request
                    .asset_model_id
                    .as_ref()
                    .is_none_or(|m| *m == a.asset_model_id)
            })
            .map(|a| AssetSummary {
                id: a.asset_id.clone(),
                name: a.asset_name.clone(),
                asset_model_id: a.asset_model_id.clone(),
                ..AssetSummary::default()
            })
            .collect();
        Ok(ListAssetsResponse {
            asset_summaries,
            next_token: None,
        })
    }

    async fn list_asset_models(
        &self,
        _request: &ListAssetModelsRequest,
    ) -> ApiResult<ListAssetModelsResponse> {
        self.record("list_asset_models")?;
        let asset_model_summaries = self
            .models
            .lock()
            .values()
            .map(|m| AssetModelSummary {
                id: m.asset_model_id.clone(),
                name: m.asset_model_name.clone(),
                ..AssetModelSummary::default()
            })
            .collect();
        Ok(ListAssetModelsResponse {
            asset_model_summaries,
            next_token: None,
        })
    }

    async fn list_associated_assets(
        &self,
        request: &ListAssociatedAssetsRequest,
    ) -> ApiResult<ListAssetsResponse> {
        self.record("list_associated_assets")?;
        self.associated_requests.lock().push(request.clone());
        Ok(ListAssetsResponse::default())
    }

    async fn list_asset_properties(
        &self,
        request: &ListAssetPropertiesRequest,
    ) -> ApiResult<ListAssetPropertiesResponse> {
        self.record("list_asset_properties")?;
        let assets = self.assets.lock();
        let asset = assets
            .get(&request.asset_id)
            .ok_or_else(|| ApiError::NotFound(format!("asset {}", request.asset_id)))?;
        Ok(ListAssetPropertiesResponse {
            asset_property_summaries: asset
                .asset_properties
                .iter()
                .map(|p| AssetPropertySummary {
                    id: p.id.clone(),
                    alias: p.alias.clone(),
                    unit: p.unit.clone(),
                    asset_composite_model_id: None,
                })
                .collect(),
            next_token: None,
        })
    }

    async fn list_time_series(
        &self,
        _request: &ListTimeSeriesRequest,
    ) -> ApiResult<ListTimeSeriesResponse> {
        self.record("list_time_series")?;
        Ok(ListTimeSeriesResponse {
            time_series_summaries: self.time_series.lock().clone(),
            next_token: None,
        })
    }

    async fn get_asset_property_value(
        &self,
        property: &PropertyRef,
    ) -> ApiResult<GetAssetPropertyValueResponse> {
        self.record("get_asset_property_value")?;
        Ok(GetAssetPropertyValueResponse {
            property_value: self.latest.lock().get(property).cloned(),
        })
    }

    async fn batch_get_asset_property_value(
        &self,
        request: &BatchGetAssetPropertyValueRequest,
    ) -> ApiResult<BatchGetAssetPropertyValueResponse> {
        self.record("batch_get_asset_property_value")?;
        self.batch_value_requests.lock().push(request.clone());
        let latest = self.latest.lock();
        Ok(BatchGetAssetPropertyValueResponse {
            success_entries: request
                .entries
                .iter()
                .map(|e| BatchValueSuccessEntry {
                    entry_id: e.entry_id.clone(),
                    asset_property_value: latest.get(&e.property).cloned(),
                })
                .collect(),
            error_entries: Vec::new(),
            next_token: None,
        })
    }

    async fn get_asset_property_value_history(
        &self,
        request: &GetAssetPropertyValueHistoryRequest,
    ) -> ApiResult<GetAssetPropertyValueHistoryResponse> {
        self.record("get_asset_property_value_history")?;
        self.history_requests.lock().push(request.clone());
        if let Some(page) = self.history_pages.lock().pop_front() {
            return Ok(page);
        }
        match self.history_handler.lock().as_ref() {
            Some(handler) => handler(request),
            None => Ok(GetAssetPropertyValueHistoryResponse::default()),
        }
    }

    async fn batch_get_asset_property_value_history(
        &self,
        request: &BatchGetAssetPropertyValueHistoryRequest,
    ) -> ApiResult<BatchGetAssetPropertyValueHistoryResponse> {
        self.record("batch_get_asset_property_value_history")?;
        self.batch_history_requests.lock().push(request.clone());
        if let Some(page) = self.batch_history_pages.lock().pop_front() {
            return Ok(page);
        }
        Ok(BatchGetAssetPropertyValueHistoryResponse {
            success_entries: request
                .entries
                .iter()
                .map(|e| BatchHistorySuccessEntry {
                    entry_id: e.entry_id.clone(),
                    asset_property_value_history: Vec::new(),
                })
                .collect(),
            ..Default::default()
        })
    }

    async fn get_asset_property_aggregates(
        &self,
        request: &GetAssetPropertyAggregatesRequest,
    ) -> ApiResult<GetAssetPropertyAggregatesResponse> {
        self.record("get_asset_property_aggregates")?;
        self.aggregate_requests.lock().push(request.clone());
        if let Some(page) = self.aggregate_pages.lock().pop_front() {
            return Ok(page);
        }
        match self.aggregate_handler.lock().as_ref() {
            Some(handler) => handler(request),
            None => Ok(GetAssetPropertyAggregatesResponse::default()),
        }
    }

    async fn batch_get_asset_property_aggregates(
        &self,
        request: &BatchGetAssetPropertyAggregatesRequest,
    ) -> ApiResult<BatchGetAssetPropertyAggregatesResponse> {
        self.record("batch_get_asset_property_aggregates")?;
        if let Some(page) = self.batch_aggregate_pages.lock().pop_front() {
            return Ok(page);
        }
        Ok(BatchGetAssetPropertyAggregatesResponse {
            success_entries: request
                .entries
                .iter()
                .map(|e| BatchAggregatesSuccessEntry {
                    entry_id: e.entry_id.clone(),
                    aggregated_values: Vec::new(),
                })
                .collect(),
            ..Default::default()
        })
    }

    async fn get_interpolated_asset_property_values(
        &self,
        request: &GetInterpolatedAssetPropertyValuesRequest,
    ) -> ApiResult<GetInterpolatedAssetPropertyValuesResponse> {
        self.record("get_interpolated_asset_property_values")?;
        self.interpolated_requests.lock().push(request.clone());
        Ok(self.interpolated_pages.lock().pop_front().unwrap_or_default())
    }

    async fn execute_query(&self, _request: &ExecuteQueryRequest) -> ApiResult<ExecuteQueryResponse> {
        self.record("execute_query")?;
        Ok(self.execute_pages.lock().pop_front().unwrap_or_default())
    }
}

/// Hands out the same fake for every region.
pub struct FakeClients(pub Arc<FakeSitewise>);

#[async_trait]
impl ClientProvider for FakeClients {
    async fn client(&self, _region: Option<&str>) -> ApiResult<Arc<dyn SitewiseClient>> {
        Ok(self.0.clone())
    }

    fn default_region(&self) -> &str {
        "us-east-1"
    }
}

pub fn turbine_asset(asset_id: &str, asset_name: &str) -> DescribeAssetResponse {
    DescribeAssetResponse {
        asset_id: asset_id.to_string(),
        asset_name: asset_name.to_string(),
        asset_model_id: "m-turbine".into(),
        asset_properties: vec![
            AssetProperty {
                id: "p-avg-wind".into(),
                name: "Average Wind Speed".into(),
                alias: None,
                data_type: DataType::Double,
                unit: Some("m/s".into()),
            },
            AssetProperty {
                id: "p-status".into(),
                name: "Status".into(),
                alias: None,
                data_type: DataType::String,
                unit: None,
            },
            AssetProperty {
                id: "p-torque".into(),
                name: "Torque".into(),
                alias: None,
                data_type: DataType::Double,
                unit: Some("Newton Meters".into()),
            },
        ],
        ..DescribeAssetResponse::default()
    }
}

pub fn turbine_model() -> DescribeAssetModelResponse {
    DescribeAssetModelResponse {
        asset_model_id: "m-turbine".into(),
        asset_model_name: "Wind Turbine".into(),
        ..DescribeAssetModelResponse::default()
    }
}

pub fn provider(fake: Arc<FakeSitewise>) -> ResourceProvider {
    ResourceProvider::new(fake, Arc::new(ResourceCache::default()), "us-east-1")
}

pub fn value_at(seconds: i64, value: f64) -> AssetPropertyValue {
    AssetPropertyValue {
        value: Variant::double(value),
        timestamp: TimeInNanos {
            time_in_seconds: seconds,
            offset_in_nanos: 0,
        },
        quality: Some("GOOD".into()),
    }
}

pub fn base_query(query_type: QueryType) -> BaseQuery {
    let now = Utc::now();
    BaseQuery {
        ref_id: "A".into(),
        query_type,
        region: None,
        asset_ids: Vec::new(),
        property_id: None,
        property_alias: None,
        next_token: None,
        time_range: TimeRange::new(now - Duration::hours(3), now),
        interval: std::time::Duration::from_secs(1),
        max_data_points: 720,
        max_page_aggregations: 1,
    }
}

pub fn property_query(
    query_type: QueryType,
    asset_ids: &[&str],
    property_id: Option<&str>,
) -> AssetPropertyValueQuery {
    let mut base = base_query(query_type);
    base.asset_ids = asset_ids.iter().map(|s| s.to_string()).collect();
    base.property_id = property_id.map(String::from);
    AssetPropertyValueQuery {
        base,
        aggregate_types: Vec::new(),
        resolution: ResolutionSetting::Auto,
        quality: Quality::Any,
        time_ordering: TimeOrdering::Ascending,
        last_observation: false,
        response_format: ResponseFormat::Table,
        is_streaming: false,
        interval_streaming: DEFAULT_STREAMING_INTERVAL,
    }
}

pub fn alias_query(query_type: QueryType, alias: &str) -> AssetPropertyValueQuery {
    let mut query = property_query(query_type, &[], None);
    query.base.property_alias = Some(alias.to_string());
    query
}

pub fn list_query(query_type: QueryType) -> ListQuery {
    ListQuery {
        base: base_query(query_type),
        asset_model_id: None,
        filter: None,
        hierarchy_id: None,
        alias_prefix: None,
        time_series_type: None,
    }
}
