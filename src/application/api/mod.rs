// One operation per supported query kind, returning framer-ready responses
pub mod aggregate;
pub mod describe;
pub mod execute_query;
pub mod history;
pub mod interpolated;
pub mod list;
pub mod property_value;
pub mod time_range;

use std::collections::HashMap;

use crate::application::resource_provider::ResourceProvider;
use crate::domain::property::{DataType, PropertyDescriptor};
use crate::domain::query::{AggregateType, BaseQuery, Resolution};
use crate::domain::sitewise::{
    AggregatedValue, AssetPropertyValue, EntryError, InterpolatedAssetPropertyValue, PropertyRef,
    Variant,
};

/// Entries per call accepted by the batched latest-value endpoint.
pub const BATCH_VALUE_ENTRIES: usize = 128;
/// Entries per call accepted by the batched history and aggregate endpoints.
pub const BATCH_HISTORY_ENTRIES: usize = 16;

pub const AGGREGATE_MAX_RESULTS: i64 = 2_500;
pub const INTERPOLATED_MAX_RESULTS: i64 = 250;

/// Values returned for one property, plus what is needed to frame them.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry<T> {
    pub entry_id: String,
    pub property: PropertyDescriptor,
    pub values: Vec<T>,
    pub error: Option<EntryError>,
    /// Names of the sibling properties of the entry's asset, keyed by id.
    pub related_names: HashMap<String, String>,
}

impl<T> PropertyEntry<T> {
    pub fn new(entry_id: impl Into<String>, property: PropertyDescriptor, values: Vec<T>) -> Self {
        Self {
            entry_id: entry_id.into(),
            property,
            values,
            error: None,
            related_names: HashMap::new(),
        }
    }

    pub fn failed(entry_id: impl Into<String>, property: PropertyDescriptor, error: EntryError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(entry_id, property, Vec::new())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyResponse<T> {
    pub entries: Vec<PropertyEntry<T>>,
    pub next_token: Option<String>,
    pub resolution: Option<Resolution>,
    pub aggregate_types: Vec<AggregateType>,
}

impl<T> PropertyResponse<T> {
    pub fn new(entries: Vec<PropertyEntry<T>>, next_token: Option<String>) -> Self {
        Self {
            entries,
            next_token,
            resolution: None,
            aggregate_types: Vec::new(),
        }
    }
}

pub type ValueResponse = PropertyResponse<AssetPropertyValue>;
pub type HistoryResponse = PropertyResponse<AssetPropertyValue>;
pub type AggregateResponse = PropertyResponse<AggregatedValue>;
pub type InterpolatedResponse = PropertyResponse<InterpolatedAssetPropertyValue>;

/// Properties a query targets, with the entry id each is reported under.
/// Asset and property ids win over an alias.
pub fn property_targets(base: &BaseQuery) -> Vec<(String, PropertyRef)> {
    match (&base.property_id, &base.property_alias) {
        (Some(property_id), _) if !base.asset_ids.is_empty() => base
            .asset_ids
            .iter()
            .map(|asset_id| (asset_id.clone(), PropertyRef::by_id(asset_id, property_id)))
            .collect(),
        (_, Some(alias)) => vec![(alias.clone(), PropertyRef::by_alias(alias))],
        _ => Vec::new(),
    }
}

/// One success or error entry of a batched page.
#[derive(Debug)]
pub enum BatchItem<T> {
    Success { entry_id: String, values: Vec<T> },
    Error(EntryError),
}

/// Splits targets by whether their descriptor could be resolved; unresolved
/// targets become error entries.
pub fn resolve_targets(
    targets: &[(String, PropertyRef)],
    descriptors: &HashMap<String, PropertyDescriptor>,
) -> (Vec<(String, PropertyRef)>, Vec<EntryError>) {
    let mut known = Vec::new();
    let mut missing = Vec::new();
    for (entry_id, property) in targets {
        if descriptors.contains_key(entry_id) {
            known.push((entry_id.clone(), property.clone()));
        } else {
            missing.push(EntryError {
                entry_id: entry_id.clone(),
                error_code: "ResourceNotFoundException".into(),
                error_message: format!("property not found for entry {entry_id}"),
            });
        }
    }
    (known, missing)
}

/// Stitches batched pages back into one entry per target, in target order.
pub fn merge_batch<T>(
    targets: &[(String, PropertyRef)],
    descriptors: &HashMap<String, PropertyDescriptor>,
    items: Vec<BatchItem<T>>,
    mut errors: Vec<EntryError>,
) -> Vec<PropertyEntry<T>> {
    let mut values: HashMap<String, Vec<T>> = HashMap::new();
    for item in items {
        match item {
            BatchItem::Success { entry_id, values: v } => {
                values.entry(entry_id).or_default().extend(v);
            }
            BatchItem::Error(error) => errors.push(error),
        }
    }

    targets
        .iter()
        .map(|(entry_id, property)| {
            let descriptor = descriptors
                .get(entry_id)
                .cloned()
                .unwrap_or_else(|| fallback_descriptor(property));
            match errors.iter().find(|e| &e.entry_id == entry_id) {
                Some(error) => PropertyEntry::failed(entry_id, descriptor, error.clone()),
                None => PropertyEntry::new(
                    entry_id,
                    descriptor,
                    values.remove(entry_id).unwrap_or_default(),
                ),
            }
        })
        .collect()
}

fn fallback_descriptor(property: &PropertyRef) -> PropertyDescriptor {
    PropertyDescriptor {
        asset_id: property.asset_id.clone().unwrap_or_default(),
        property_id: property.property_id.clone().unwrap_or_default(),
        property_name: property
            .property_alias
            .clone()
            .or_else(|| property.property_id.clone())
            .unwrap_or_default(),
        alias: property.property_alias.clone(),
        ..PropertyDescriptor::default()
    }
}

/// Widens unknown data types from the returned values and, for string
/// properties, loads sibling property names for JSON value expansion.
pub async fn finish_entries<T>(
    provider: &ResourceProvider,
    entries: &mut [PropertyEntry<T>],
    variant: impl Fn(&T) -> &Variant,
) {
    for entry in entries.iter_mut() {
        entry.property.widen(entry.values.iter().map(&variant));
        if entry.property.data_type == DataType::String && !entry.property.asset_id.is_empty() {
            match provider.asset_property_names(&entry.property.asset_id).await {
                Ok(names) => entry.related_names = names,
                Err(err) => tracing::debug!(
                    "No property names for asset {}: {}",
                    entry.property.asset_id,
                    err
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::{QueryType, TimeRange};
    use chrono::Utc;
    use std::time::Duration;

    fn base(asset_ids: &[&str], property_id: Option<&str>, alias: Option<&str>) -> BaseQuery {
        BaseQuery {
            ref_id: "A".into(),
            query_type: QueryType::PropertyValue,
            region: None,
            asset_ids: asset_ids.iter().map(|s| s.to_string()).collect(),
            property_id: property_id.map(String::from),
            property_alias: alias.map(String::from),
            next_token: None,
            time_range: TimeRange::new(Utc::now(), Utc::now()),
            interval: Duration::from_secs(1),
            max_data_points: 100,
            max_page_aggregations: 1,
        }
    }

    #[test]
    fn test_property_targets() {
        let targets = property_targets(&base(&["a1", "a2"], Some("p1"), Some("/x")));
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1], ("a2".to_string(), PropertyRef::by_id("a2", "p1")));

        let targets = property_targets(&base(&[], None, Some("/x")));
        assert_eq!(targets, vec![("/x".to_string(), PropertyRef::by_alias("/x"))]);
    }

    #[test]
    fn test_merge_batch_keeps_target_order_and_errors() {
        let targets = vec![
            ("a1".to_string(), PropertyRef::by_id("a1", "p1")),
            ("a2".to_string(), PropertyRef::by_id("a2", "p1")),
        ];
        let mut descriptors = HashMap::new();
        descriptors.insert("a1".to_string(), PropertyDescriptor::default());
        descriptors.insert("a2".to_string(), PropertyDescriptor::default());
        let items = vec![
            BatchItem::Error(EntryError {
                entry_id: "a2".into(),
                error_code: "AccessDeniedException".into(),
                error_message: "denied".into(),
            }),
            BatchItem::Success {
                entry_id: "a1".into(),
                values: vec![1, 2],
            },
            BatchItem::Success {
                entry_id: "a1".into(),
                values: vec![3],
            },
        ];

        let entries = merge_batch(&targets, &descriptors, items, Vec::new());
        assert_eq!(entries[0].entry_id, "a1");
        assert_eq!(entries[0].values, vec![1, 2, 3]);
        assert_eq!(entries[1].error.as_ref().unwrap().error_message, "denied");
        assert!(entries[1].values.is_empty());
    }
}
