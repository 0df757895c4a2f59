// Linearly interpolated values at a fixed interval
use crate::application::api::{
    INTERPOLATED_MAX_RESULTS, InterpolatedResponse, PropertyEntry, PropertyResponse,
    finish_entries, property_targets,
};
use crate::application::paginator::{Page, PageBudget, paginate};
use crate::application::resolution::pick_interpolation_resolution;
use crate::application::resource_provider::ResourceProvider;
use crate::application::sitewise_client::{ApiError, ApiResult};
use crate::domain::query::{AssetPropertyValueQuery, Resolution, ResolutionSetting};
use crate::domain::sitewise::{
    GetInterpolatedAssetPropertyValuesRequest, LINEAR_INTERPOLATION, TimeInNanos,
};

pub fn interpolation_resolution(query: &AssetPropertyValueQuery) -> Resolution {
    match query.resolution {
        ResolutionSetting::Fixed(resolution) if resolution != Resolution::Raw => resolution,
        _ => pick_interpolation_resolution(&query.base.time_range, query.base.max_data_points),
    }
}

pub async fn get_interpolated_asset_property_values(
    provider: &ResourceProvider,
    query: &AssetPropertyValueQuery,
) -> ApiResult<InterpolatedResponse> {
    let targets = property_targets(&query.base);
    if targets.is_empty() {
        return Err(ApiError::InvalidRequest("no property selected".into()));
    }

    let resolution = interpolation_resolution(query);
    let interval_in_seconds = resolution
        .duration()
        .map(|d| d.as_secs() as i64)
        .unwrap_or(1)
        .max(1);
    let range = query.base.time_range;
    let client = provider.client();
    // A token only makes sense when a single property is paged.
    let initial_token = (targets.len() == 1)
        .then(|| query.base.next_token.clone())
        .flatten();

    let mut entries = Vec::with_capacity(targets.len());
    let mut next_token = None;
    for (entry_id, property) in &targets {
        let descriptor = provider.property(property).await?;
        let budget = PageBudget::new(
            query.base.max_pages(),
            query.base.history_max_points() as usize,
        );
        tracing::debug!(
            "Fetching interpolated values for {} every {}s",
            entry_id,
            interval_in_seconds
        );
        let result = paginate(budget, initial_token.clone(), |token| {
            let request = GetInterpolatedAssetPropertyValuesRequest {
                property: property.clone(),
                start_time: TimeInNanos::from_datetime(range.from),
                end_time: TimeInNanos::from_datetime(range.to),
                quality: query.quality.for_batch(),
                interval_in_seconds,
                interpolation_type: LINEAR_INTERPOLATION.to_string(),
                next_token: token,
                max_results: INTERPOLATED_MAX_RESULTS,
            };
            async move {
                let response = client.get_interpolated_asset_property_values(&request).await?;
                Ok(Page::new(
                    response.interpolated_asset_property_values,
                    response.next_token,
                ))
            }
        })
        .await?;
        if targets.len() == 1 {
            next_token = result.next_token;
        }
        entries.push(PropertyEntry::new(entry_id, descriptor, result.items));
    }

    let mut response = PropertyResponse::new(entries, next_token);
    response.resolution = Some(resolution);
    finish_entries(provider, &mut response.entries, |v| &v.value).await;
    Ok(response)
}
