// Paged listings of assets, models, properties and time series
use crate::application::api::describe::target_asset_id;
use crate::application::resource_provider::ResourceProvider;
use crate::application::sitewise_client::ApiResult;
use crate::domain::query::ListQuery;
use crate::domain::sitewise::{
    AssetPropertySummary, ListAssetModelsRequest, ListAssetModelsResponse,
    ListAssetPropertiesRequest, ListAssetsRequest, ListAssetsResponse,
    ListAssociatedAssetsRequest, ListTimeSeriesRequest, ListTimeSeriesResponse,
    TraversalDirection,
};

pub const TOP_LEVEL_FILTER: &str = "TOP_LEVEL";
pub const ALL_FILTER: &str = "ALL";

pub async fn list_assets(
    provider: &ResourceProvider,
    query: &ListQuery,
) -> ApiResult<ListAssetsResponse> {
    let filter = match (&query.asset_model_id, &query.filter) {
        (None, _) => Some(TOP_LEVEL_FILTER.to_string()),
        (Some(_), filter) => Some(filter.clone().unwrap_or_else(|| ALL_FILTER.to_string())),
    };
    let request = ListAssetsRequest {
        asset_model_id: query.asset_model_id.clone(),
        filter,
        next_token: query.base.next_token.clone(),
        max_results: None,
    };
    provider.client().list_assets(&request).await
}

pub async fn list_asset_models(
    provider: &ResourceProvider,
    query: &ListQuery,
) -> ApiResult<ListAssetModelsResponse> {
    let request = ListAssetModelsRequest {
        next_token: query.base.next_token.clone(),
        max_results: None,
    };
    provider.client().list_asset_models(&request).await
}

/// Children through the hierarchy when one is given, otherwise the parent.
pub async fn list_associated_assets(
    provider: &ResourceProvider,
    query: &ListQuery,
) -> ApiResult<ListAssetsResponse> {
    let asset_id = target_asset_id(provider, &query.base).await?;
    let traversal_direction = if query.hierarchy_id.is_some() {
        TraversalDirection::Child
    } else {
        TraversalDirection::Parent
    };
    let request = ListAssociatedAssetsRequest {
        asset_id,
        hierarchy_id: query.hierarchy_id.clone(),
        traversal_direction,
        next_token: query.base.next_token.clone(),
        max_results: None,
    };
    provider.client().list_associated_assets(&request).await
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedPropertySummary {
    pub summary: AssetPropertySummary,
    /// Property name from the asset description; the id when unknown.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetPropertiesResponse {
    pub asset_id: String,
    pub properties: Vec<NamedPropertySummary>,
    pub next_token: Option<String>,
}

pub async fn list_asset_properties(
    provider: &ResourceProvider,
    query: &ListQuery,
) -> ApiResult<AssetPropertiesResponse> {
    let asset_id = target_asset_id(provider, &query.base).await?;
    let request = ListAssetPropertiesRequest {
        asset_id: asset_id.clone(),
        next_token: query.base.next_token.clone(),
        max_results: None,
    };
    let response = provider.client().list_asset_properties(&request).await?;
    let names = match provider.asset_property_names(&asset_id).await {
        Ok(names) => names,
        Err(err) => {
            tracing::warn!("No property names for asset {}: {}", asset_id, err);
            Default::default()
        }
    };

    let properties = response
        .asset_property_summaries
        .into_iter()
        .map(|summary| NamedPropertySummary {
            name: names
                .get(&summary.id)
                .cloned()
                .unwrap_or_else(|| summary.id.clone()),
            summary,
        })
        .collect();
    Ok(AssetPropertiesResponse {
        asset_id,
        properties,
        next_token: response.next_token.filter(|t| !t.is_empty()),
    })
}

pub async fn list_time_series(
    provider: &ResourceProvider,
    query: &ListQuery,
) -> ApiResult<ListTimeSeriesResponse> {
    let request = ListTimeSeriesRequest {
        asset_id: query.base.asset_ids.first().cloned(),
        alias_prefix: query.alias_prefix.clone(),
        time_series_type: query.time_series_type.clone(),
        next_token: query.base.next_token.clone(),
        max_results: None,
    };
    provider.client().list_time_series(&request).await
}
