// Latest property value, single and batched
use crate::application::api::{
    BATCH_VALUE_ENTRIES, BatchItem, PropertyEntry, PropertyResponse, ValueResponse,
    finish_entries, merge_batch, property_targets, resolve_targets,
};
use crate::application::resource_provider::ResourceProvider;
use crate::application::sitewise_client::{ApiError, ApiResult};
use crate::domain::query::AssetPropertyValueQuery;
use crate::domain::sitewise::{BatchGetAssetPropertyValueRequest, BatchValueEntry, PropertyRef};

pub async fn get_asset_property_value(
    provider: &ResourceProvider,
    query: &AssetPropertyValueQuery,
) -> ApiResult<ValueResponse> {
    let targets = property_targets(&query.base);
    let mut response = match targets.as_slice() {
        [] => return Err(ApiError::InvalidRequest("no property selected".into())),
        [(entry_id, property)] => value_single(provider, entry_id, property).await?,
        _ => batch_get_asset_property_value(provider, &targets).await?,
    };
    finish_entries(provider, &mut response.entries, |v| &v.value).await;
    Ok(response)
}

async fn value_single(
    provider: &ResourceProvider,
    entry_id: &str,
    property: &PropertyRef,
) -> ApiResult<ValueResponse> {
    let descriptor = provider.property(property).await?;
    let response = provider.client().get_asset_property_value(property).await?;
    let values = response.property_value.into_iter().collect();
    Ok(PropertyResponse::new(
        vec![PropertyEntry::new(entry_id, descriptor, values)],
        None,
    ))
}

/// Latest values for many properties, 128 entries per call, following each
/// chunk's continuation tokens to the end.
pub async fn batch_get_asset_property_value(
    provider: &ResourceProvider,
    targets: &[(String, PropertyRef)],
) -> ApiResult<ValueResponse> {
    let descriptors = provider.properties(targets, true).await?;
    let (known, missing) = resolve_targets(targets, &descriptors);
    let client = provider.client();

    let mut items = Vec::new();
    for chunk in known.chunks(BATCH_VALUE_ENTRIES) {
        let mut request = BatchGetAssetPropertyValueRequest {
            entries: chunk
                .iter()
                .map(|(entry_id, property)| BatchValueEntry {
                    entry_id: entry_id.clone(),
                    property: property.clone(),
                })
                .collect(),
            next_token: None,
        };
        loop {
            let response = client.batch_get_asset_property_value(&request).await?;
            items.extend(response.success_entries.into_iter().map(|e| {
                BatchItem::Success {
                    entry_id: e.entry_id,
                    values: e.asset_property_value.into_iter().collect(),
                }
            }));
            items.extend(response.error_entries.into_iter().map(BatchItem::Error));
            match response.next_token.filter(|t| !t.is_empty()) {
                Some(token) => request.next_token = Some(token),
                None => break,
            }
        }
    }
    tracing::debug!("Fetched latest values for {} entries", known.len());

    Ok(PropertyResponse::new(
        merge_batch(targets, &descriptors, items, missing),
        None,
    ))
}
