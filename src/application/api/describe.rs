use crate::application::resource_provider::ResourceProvider;
use crate::application::sitewise_client::{ApiError, ApiResult};
use crate::domain::property::AssetModelDescriptor;
use crate::domain::query::{BaseQuery, ListQuery};
use crate::domain::sitewise::{DescribeAssetResponse, PropertyRef};

/// The asset a query targets: the first asset id, or the asset owning the alias.
pub async fn target_asset_id(provider: &ResourceProvider, base: &BaseQuery) -> ApiResult<String> {
    if let Some(asset_id) = base.asset_ids.first() {
        return Ok(asset_id.clone());
    }
    if let Some(alias) = &base.property_alias {
        let descriptor = provider.property(&PropertyRef::by_alias(alias)).await?;
        if !descriptor.asset_id.is_empty() {
            return Ok(descriptor.asset_id);
        }
        return Err(ApiError::NotFound(format!(
            "alias {alias} is not associated with an asset"
        )));
    }
    Err(ApiError::InvalidRequest("an asset id is required".into()))
}

pub async fn describe_asset(
    provider: &ResourceProvider,
    query: &ListQuery,
) -> ApiResult<DescribeAssetResponse> {
    let asset_id = target_asset_id(provider, &query.base).await?;
    provider.asset(&asset_id).await
}

pub async fn describe_asset_model(
    provider: &ResourceProvider,
    query: &ListQuery,
) -> ApiResult<AssetModelDescriptor> {
    match &query.asset_model_id {
        Some(asset_model_id) => provider.asset_model_by_id(asset_model_id).await,
        None => {
            let asset_id = target_asset_id(provider, &query.base).await?;
            provider.asset_model(&asset_id).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakeSitewise, list_query, provider, turbine_asset};
    use crate::domain::query::QueryType;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_describe_asset_model_via_asset() {
        let fake = Arc::new(FakeSitewise::default());
        fake.add_asset(turbine_asset("a1", "Turbine 1"));
        let provider = provider(fake);

        let mut query = list_query(QueryType::DescribeAssetModel);
        query.base.asset_ids = vec!["a1".into()];
        let model = describe_asset_model(&provider, &query).await.unwrap();
        assert_eq!(model.asset_model_name, "Wind Turbine");

        let query = list_query(QueryType::DescribeAsset);
        let err = describe_asset(&provider, &query).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
