// Name and metadata lookups for assets, asset models and properties
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::resource_cache::ResourceCache;
use crate::application::sitewise_client::{ApiError, ApiResult, SitewiseClient};
use crate::domain::property::{AssetModelDescriptor, PropertyDescriptor};
use crate::domain::sitewise::{DescribeAssetResponse, DescribeTimeSeriesRequest, PropertyRef};

/// Resolves descriptors through one regional client, sharing the instance cache.
#[derive(Clone)]
pub struct ResourceProvider {
    client: Arc<dyn SitewiseClient>,
    cache: Arc<ResourceCache>,
    region: String,
}

impl ResourceProvider {
    pub fn new(client: Arc<dyn SitewiseClient>, cache: Arc<ResourceCache>, region: &str) -> Self {
        Self {
            client,
            cache,
            region: region.to_string(),
        }
    }

    pub fn client(&self) -> &Arc<dyn SitewiseClient> {
        &self.client
    }

    fn key(&self, parts: &[&str]) -> String {
        format!("{}|{}", self.region, parts.join("|"))
    }

    pub async fn asset(&self, asset_id: &str) -> ApiResult<DescribeAssetResponse> {
        let key = self.key(&[asset_id]);
        self.cache
            .assets
            .get_or_load(&key, || async {
                tracing::debug!("Describing asset {}", asset_id);
                self.client.describe_asset(asset_id).await
            })
            .await
    }

    /// Property id to property name for every property of the asset.
    pub async fn asset_property_names(&self, asset_id: &str) -> ApiResult<HashMap<String, String>> {
        let asset = self.asset(asset_id).await?;
        Ok(asset
            .asset_properties
            .iter()
            .chain(asset.asset_composite_models.iter().flat_map(|c| c.properties.iter()))
            .map(|p| (p.id.clone(), p.name.clone()))
            .collect())
    }

    /// Model of an asset: the asset is described first, then its model.
    pub async fn asset_model(&self, asset_id: &str) -> ApiResult<AssetModelDescriptor> {
        let asset = self.asset(asset_id).await?;
        self.asset_model_by_id(&asset.asset_model_id).await
    }

    pub async fn asset_model_by_id(&self, asset_model_id: &str) -> ApiResult<AssetModelDescriptor> {
        let key = self.key(&["model", asset_model_id]);
        self.cache
            .asset_models
            .get_or_load(&key, || async {
                tracing::debug!("Describing asset model {}", asset_model_id);
                self.client.describe_asset_model(asset_model_id).await
            })
            .await
    }

    /// Descriptor for a property addressed by ids or by alias.
    pub async fn property(&self, property: &PropertyRef) -> ApiResult<PropertyDescriptor> {
        match (&property.asset_id, &property.property_id, &property.property_alias) {
            (Some(asset_id), Some(property_id), alias) => {
                let mut descriptor = self.property_by_id(asset_id, property_id).await?;
                if descriptor.alias.is_none() {
                    descriptor.alias = alias.clone();
                }
                Ok(descriptor)
            }
            (_, _, Some(alias)) => self.property_by_alias(alias).await,
            _ => Err(ApiError::InvalidRequest(
                "a property needs an alias or an asset and property id".into(),
            )),
        }
    }

    async fn property_by_id(&self, asset_id: &str, property_id: &str) -> ApiResult<PropertyDescriptor> {
        let key = self.key(&[asset_id, property_id]);
        self.cache
            .properties
            .get_or_load(&key, || async {
                let asset = self.asset(asset_id).await?;
                let property = asset.find_property(property_id).ok_or_else(|| {
                    ApiError::NotFound(format!("property {property_id} on asset {asset_id}"))
                })?;
                Ok(PropertyDescriptor {
                    asset_id: asset.asset_id.clone(),
                    asset_name: asset.asset_name.clone(),
                    property_id: property.id.clone(),
                    property_name: property.name.clone(),
                    alias: property.alias.clone(),
                    data_type: property.data_type,
                    unit: property.unit.clone().unwrap_or_default(),
                })
            })
            .await
    }

    async fn property_by_alias(&self, alias: &str) -> ApiResult<PropertyDescriptor> {
        let key = self.key(&["alias", alias]);
        self.cache
            .properties
            .get_or_load(&key, || async {
                let request = DescribeTimeSeriesRequest {
                    alias: Some(alias.to_string()),
                    ..DescribeTimeSeriesRequest::default()
                };
                let series = match self.client.describe_time_series(&request).await {
                    Ok(series) => series,
                    Err(err) if err.is_not_found() => {
                        tracing::debug!("Alias {} has no time series: {}", alias, err);
                        return Ok(PropertyDescriptor::for_unassociated_alias(alias));
                    }
                    Err(err) => return Err(err),
                };
                match (series.asset_id, series.property_id) {
                    (Some(asset_id), Some(property_id)) => {
                        let mut descriptor = self.property_by_id(&asset_id, &property_id).await?;
                        descriptor.alias = Some(alias.to_string());
                        Ok(descriptor)
                    }
                    _ => {
                        tracing::debug!("Alias {} is not associated with an asset property", alias);
                        Ok(PropertyDescriptor::for_unassociated_alias(alias))
                    }
                }
            })
            .await
    }

    /// Descriptors for batch entries keyed by entry id. With `best_effort`,
    /// failed lookups are left out instead of failing the whole call.
    pub async fn properties(
        &self,
        entries: &[(String, PropertyRef)],
        best_effort: bool,
    ) -> ApiResult<HashMap<String, PropertyDescriptor>> {
        let lookups = entries.iter().map(|(entry_id, property)| async move {
            (entry_id.clone(), self.property(property).await)
        });

        let mut descriptors = HashMap::with_capacity(entries.len());
        for (entry_id, result) in join_all(lookups).await {
            match result {
                Ok(descriptor) => {
                    descriptors.insert(entry_id, descriptor);
                }
                Err(err) if best_effort => {
                    tracing::warn!("Property lookup for entry {} failed: {}", entry_id, err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(descriptors)
    }
}
