// Pre-computed aggregates, single and batched
use crate::application::api::{
    AGGREGATE_MAX_RESULTS, AggregateResponse, BATCH_HISTORY_ENTRIES, BatchItem, PropertyEntry,
    PropertyResponse, merge_batch, property_targets, resolve_targets,
};
use crate::application::paginator::{Page, PageBudget, paginate};
use crate::application::resolution::{aggregate_resolution, pick_resolution};
use crate::application::resource_provider::ResourceProvider;
use crate::application::sitewise_client::{ApiError, ApiResult};
use crate::domain::query::{AggregateType, AssetPropertyValueQuery, Resolution, ResolutionSetting};
use crate::domain::sitewise::{
    BatchAggregatesEntry, BatchGetAssetPropertyAggregatesRequest,
    GetAssetPropertyAggregatesRequest, PropertyRef,
};

/// Bucket size actually requested from the service.
pub fn effective_resolution(query: &AssetPropertyValueQuery) -> Resolution {
    let picked = match query.resolution {
        ResolutionSetting::Fixed(resolution) => resolution,
        ResolutionSetting::Auto => {
            pick_resolution(&query.base.time_range, query.base.max_data_points)
        }
    };
    aggregate_resolution(picked)
}

/// Requested aggregate types, deduplicated; averages when none were chosen.
pub fn requested_aggregates(query: &AssetPropertyValueQuery) -> Vec<AggregateType> {
    if query.aggregate_types.is_empty() {
        return vec![AggregateType::Average];
    }
    AggregateType::ORDER
        .into_iter()
        .filter(|a| query.aggregate_types.contains(a))
        .collect()
}

pub async fn get_asset_property_aggregates(
    provider: &ResourceProvider,
    query: &AssetPropertyValueQuery,
) -> ApiResult<AggregateResponse> {
    let resolution = effective_resolution(query);
    let aggregate_types = requested_aggregates(query);
    let targets = property_targets(&query.base);

    let mut response = match targets.as_slice() {
        [] => return Err(ApiError::InvalidRequest("no property selected".into())),
        [(entry_id, property)] => {
            aggregates_single(provider, query, entry_id, property, resolution, &aggregate_types)
                .await?
        }
        _ => aggregates_batch(provider, query, &targets, resolution, &aggregate_types).await?,
    };
    response.resolution = Some(resolution);
    response.aggregate_types = aggregate_types;
    Ok(response)
}

fn max_results(query: &AssetPropertyValueQuery) -> i64 {
    query.base.history_max_points().min(AGGREGATE_MAX_RESULTS)
}

async fn aggregates_single(
    provider: &ResourceProvider,
    query: &AssetPropertyValueQuery,
    entry_id: &str,
    property: &PropertyRef,
    resolution: Resolution,
    aggregate_types: &[AggregateType],
) -> ApiResult<AggregateResponse> {
    let descriptor = provider.property(property).await?;
    let budget = PageBudget::new(
        query.base.max_pages(),
        query.base.history_max_points() as usize,
    );
    let client = provider.client();
    let range = query.base.time_range;

    tracing::debug!(
        "Fetching {} aggregates for {} at {}",
        aggregate_types.len(),
        entry_id,
        resolution
    );
    let result = paginate(budget, query.base.next_token.clone(), |token| {
        let request = GetAssetPropertyAggregatesRequest {
            property: property.clone(),
            aggregate_types: aggregate_types.to_vec(),
            resolution,
            start_date: range.from,
            end_date: range.to,
            quality: query.quality.for_single(),
            time_ordering: query.time_ordering,
            next_token: token,
            max_results: max_results(query),
        };
        async move {
            let response = client.get_asset_property_aggregates(&request).await?;
            Ok(Page::new(response.aggregated_values, response.next_token))
        }
    })
    .await?;

    Ok(PropertyResponse::new(
        vec![PropertyEntry::new(entry_id, descriptor, result.items)],
        result.next_token,
    ))
}

async fn aggregates_batch(
    provider: &ResourceProvider,
    query: &AssetPropertyValueQuery,
    targets: &[(String, PropertyRef)],
    resolution: Resolution,
    aggregate_types: &[AggregateType],
) -> ApiResult<AggregateResponse> {
    let descriptors = provider.properties(targets, true).await?;
    let (known, missing) = resolve_targets(targets, &descriptors);
    let client = provider.client();
    let range = query.base.time_range;
    let single_chunk = known.len() <= BATCH_HISTORY_ENTRIES;

    let mut items = Vec::new();
    let mut next_token = None;
    for chunk in known.chunks(BATCH_HISTORY_ENTRIES) {
        let entries: Vec<BatchAggregatesEntry> = chunk
            .iter()
            .map(|(entry_id, property)| BatchAggregatesEntry {
                entry_id: entry_id.clone(),
                property: property.clone(),
                aggregate_types: aggregate_types.to_vec(),
                resolution,
                start_date: range.from,
                end_date: range.to,
                qualities: vec![query.quality.for_batch()],
                time_ordering: query.time_ordering,
            })
            .collect();
        let initial_token = single_chunk.then(|| query.base.next_token.clone()).flatten();
        let budget = PageBudget::new(
            query.base.max_pages(),
            query.base.history_max_points() as usize,
        );

        let result = paginate(budget, initial_token, |token| {
            let request = BatchGetAssetPropertyAggregatesRequest {
                entries: entries.clone(),
                next_token: token,
                max_results: max_results(query),
            };
            async move {
                let response = client.batch_get_asset_property_aggregates(&request).await?;
                let points = response
                    .success_entries
                    .iter()
                    .map(|e| e.aggregated_values.len())
                    .sum();
                let mut items: Vec<_> = response
                    .success_entries
                    .into_iter()
                    .map(|e| BatchItem::Success {
                        entry_id: e.entry_id,
                        values: e.aggregated_values,
                    })
                    .collect();
                items.extend(response.error_entries.into_iter().map(BatchItem::Error));
                Ok(Page {
                    items,
                    points,
                    next_token: response.next_token.filter(|t| !t.is_empty()),
                })
            }
        })
        .await?;

        items.extend(result.items);
        next_token = result.next_token;
    }

    Ok(PropertyResponse::new(
        merge_batch(targets, &descriptors, items, missing),
        next_token,
    ))
}
