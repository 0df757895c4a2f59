// Raw property value history, single and batched
use crate::application::api::{
    BATCH_HISTORY_ENTRIES, BatchItem, HistoryResponse, PropertyEntry, PropertyResponse,
    finish_entries, merge_batch, property_targets, resolve_targets,
};
use crate::application::paginator::{Page, PageBudget, paginate};
use crate::application::resource_provider::ResourceProvider;
use crate::application::sitewise_client::{ApiError, ApiResult};
use crate::domain::query::AssetPropertyValueQuery;
use crate::domain::sitewise::{
    BatchGetAssetPropertyValueHistoryRequest, BatchHistoryEntry,
    GetAssetPropertyValueHistoryRequest, PropertyRef,
};

pub async fn get_asset_property_values(
    provider: &ResourceProvider,
    query: &AssetPropertyValueQuery,
) -> ApiResult<HistoryResponse> {
    let targets = property_targets(&query.base);
    let mut response = match targets.as_slice() {
        [] => return Err(ApiError::InvalidRequest("no property selected".into())),
        [(entry_id, property)] => history_single(provider, query, entry_id, property).await?,
        _ => history_batch(provider, query, &targets).await?,
    };
    finish_entries(provider, &mut response.entries, |v| &v.value).await;
    Ok(response)
}

async fn history_single(
    provider: &ResourceProvider,
    query: &AssetPropertyValueQuery,
    entry_id: &str,
    property: &PropertyRef,
) -> ApiResult<HistoryResponse> {
    let descriptor = provider.property(property).await?;
    let max_points = query.base.history_max_points();
    let budget = PageBudget::new(query.base.max_pages(), max_points as usize);
    let client = provider.client();
    let range = query.base.time_range;

    tracing::debug!(
        "Fetching history for {} from {} to {}",
        entry_id,
        range.from,
        range.to
    );
    let result = paginate(budget, query.base.next_token.clone(), |token| {
        let request = GetAssetPropertyValueHistoryRequest {
            property: property.clone(),
            start_date: range.from,
            end_date: range.to,
            quality: query.quality.for_single(),
            time_ordering: query.time_ordering,
            next_token: token,
            max_results: max_points,
        };
        async move {
            let response = client.get_asset_property_value_history(&request).await?;
            Ok(Page::new(
                response.asset_property_value_history,
                response.next_token,
            ))
        }
    })
    .await?;

    Ok(PropertyResponse::new(
        vec![PropertyEntry::new(entry_id, descriptor, result.items)],
        result.next_token,
    ))
}

async fn history_batch(
    provider: &ResourceProvider,
    query: &AssetPropertyValueQuery,
    targets: &[(String, PropertyRef)],
) -> ApiResult<HistoryResponse> {
    let descriptors = provider.properties(targets, true).await?;
    let (known, missing) = resolve_targets(targets, &descriptors);
    let max_points = query.base.history_max_points();
    let client = provider.client();
    let range = query.base.time_range;
    let single_chunk = known.len() <= BATCH_HISTORY_ENTRIES;

    let mut items = Vec::new();
    let mut next_token = None;
    for chunk in known.chunks(BATCH_HISTORY_ENTRIES) {
        let entries: Vec<BatchHistoryEntry> = chunk
            .iter()
            .map(|(entry_id, property)| BatchHistoryEntry {
                entry_id: entry_id.clone(),
                property: property.clone(),
                start_date: range.from,
                end_date: range.to,
                qualities: vec![query.quality.for_batch()],
                time_ordering: query.time_ordering,
            })
            .collect();
        let initial_token = single_chunk.then(|| query.base.next_token.clone()).flatten();
        let budget = PageBudget::new(query.base.max_pages(), max_points as usize);

        let result = paginate(budget, initial_token, |token| {
            let request = BatchGetAssetPropertyValueHistoryRequest {
                entries: entries.clone(),
                next_token: token,
                max_results: max_points,
            };
            async move {
                let response = client.batch_get_asset_property_value_history(&request).await?;
                let points = response
                    .success_entries
                    .iter()
                    .map(|e| e.asset_property_value_history.len())
                    .sum();
                let mut items: Vec<_> = response
                    .success_entries
                    .into_iter()
                    .map(|e| BatchItem::Success {
                        entry_id: e.entry_id,
                        values: e.asset_property_value_history,
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
