// Client trait for the IoT SiteWise service
use crate::domain::frame::FrameError;
use crate::domain::sitewise::*;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode service response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::NotFound(_) => true,
            ApiError::Service { status, code, .. } => {
                *status == 404 || code == "ResourceNotFoundException"
            }
            _ => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// One method per service endpoint used by the data source.
#[async_trait]
pub trait SitewiseClient: Send + Sync {
    async fn describe_asset(&self, asset_id: &str) -> ApiResult<DescribeAssetResponse>;

    async fn describe_asset_model(&self, asset_model_id: &str)
    -> ApiResult<DescribeAssetModelResponse>;

    async fn describe_time_series(
        &self,
        request: &DescribeTimeSeriesRequest,
    ) -> ApiResult<DescribeTimeSeriesResponse>;

    async fn list_assets(&self, request: &ListAssetsRequest) -> ApiResult<ListAssetsResponse>;

    async fn list_asset_models(
        &self,
        request: &ListAssetModelsRequest,
    ) -> ApiResult<ListAssetModelsResponse>;

    async fn list_associated_assets(
        &self,
        request: &ListAssociatedAssetsRequest,
    ) -> ApiResult<ListAssetsResponse>;

    async fn list_asset_properties(
        &self,
        request: &ListAssetPropertiesRequest,
    ) -> ApiResult<ListAssetPropertiesResponse>;

    async fn list_time_series(
        &self,
        request: &ListTimeSeriesRequest,
    ) -> ApiResult<ListTimeSeriesResponse>;

    async fn get_asset_property_value(
        &self,
        property: &PropertyRef,
    ) -> ApiResult<GetAssetPropertyValueResponse>;

    async fn batch_get_asset_property_value(
        &self,
        request: &BatchGetAssetPropertyValueRequest,
    ) -> ApiResult<BatchGetAssetPropertyValueResponse>;

    async fn get_asset_property_value_history(
        &self,
        request: &GetAssetPropertyValueHistoryRequest,
    ) -> ApiResult<GetAssetPropertyValueHistoryResponse>;

    async fn batch_get_asset_property_value_history(
        &self,
        request: &BatchGetAssetPropertyValueHistoryRequest,
    ) -> ApiResult<BatchGetAssetPropertyValueHistoryResponse>;

    async fn get_asset_property_aggregates(
        &self,
        request: &GetAssetPropertyAggregatesRequest,
    ) -> ApiResult<GetAssetPropertyAggregatesResponse>;

    async fn batch_get_asset_property_aggregates(
        &self,
        request: &BatchGetAssetPropertyAggregatesRequest,
    ) -> ApiResult<BatchGetAssetPropertyAggregatesResponse>;

    async fn get_interpolated_asset_property_values(
        &self,
        request: &GetInterpolatedAssetPropertyValuesRequest,
    ) -> ApiResult<GetInterpolatedAssetPropertyValuesResponse>;

    async fn execute_query(&self, request: &ExecuteQueryRequest) -> ApiResult<ExecuteQueryResponse>;
}

/// Hands out a client for a region, refreshing credentials first when needed.
#[async_trait]
pub trait ClientProvider: Send + Sync {
    async fn client(&self, region: Option<&str>) -> ApiResult<Arc<dyn SitewiseClient>>;

    fn default_region(&self) -> &str;
}
