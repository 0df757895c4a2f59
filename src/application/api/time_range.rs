// Values for a time range: raw history when it fits the budget, aggregates otherwise
use crate::application::api::aggregate::get_asset_property_aggregates;
use crate::application::api::history::get_asset_property_values;
use crate::application::api::{AggregateResponse, HistoryResponse};
use crate::application::resolution::pick_resolution;
use crate::application::resource_provider::ResourceProvider;
use crate::application::sitewise_client::ApiResult;
use crate::domain::query::{AssetPropertyValueQuery, Resolution, ResolutionSetting};

#[derive(Debug, Clone, PartialEq)]
pub enum TimeRangeResponse {
    History(HistoryResponse),
    Aggregate(AggregateResponse),
}

pub async fn get_asset_property_values_for_time_range(
    provider: &ResourceProvider,
    query: &AssetPropertyValueQuery,
) -> ApiResult<TimeRangeResponse> {
    let resolution = match query.resolution {
        ResolutionSetting::Fixed(resolution) => resolution,
        ResolutionSetting::Auto => {
            pick_resolution(&query.base.time_range, query.base.max_data_points)
        }
    };
    tracing::debug!("Time range query {} uses {}", query.base.ref_id, resolution);

    if resolution == Resolution::Raw {
        let mut response = get_asset_property_values(provider, query).await?;
        response.resolution = Some(Resolution::Raw);
        return Ok(TimeRangeResponse::History(response));
    }

    let mut aggregate_query = query.clone();
    aggregate_query.resolution = ResolutionSetting::Fixed(resolution);
    get_asset_property_aggregates(provider, &aggregate_query)
        .await
        .map(TimeRangeResponse::Aggregate)
}
