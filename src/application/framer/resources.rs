// Frames for describe and list responses
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::application::api::list::AssetPropertiesResponse;
use crate::application::framer::{Framer, attach_next_token};
use crate::domain::frame::{Field, FieldValues, Frame, FrameError};
use crate::domain::sitewise::{
    AssetHierarchy, DescribeAssetModelResponse, DescribeAssetResponse, ListAssetModelsResponse,
    ListAssetsResponse, ListTimeSeriesResponse,
};

fn strings<I, S>(name: &str, values: I) -> Field
where
    I: IntoIterator<Item = Option<S>>,
    S: Into<String>,
{
    Field::from_values(
        name,
        FieldValues::String(values.into_iter().map(|v| v.map(Into::into)).collect()),
    )
}

fn times<I>(name: &str, values: I) -> Field
where
    I: IntoIterator<Item = Option<DateTime<Utc>>>,
{
    Field::from_values(name, FieldValues::Time(values.into_iter().collect()))
}

fn hierarchies_json(hierarchies: &[AssetHierarchy]) -> String {
    json!(hierarchies
        .iter()
        .map(|h| json!({"id": h.id, "name": h.name}))
        .collect::<Vec<_>>())
    .to_string()
}

fn single(name: &str, fields: Vec<Field>) -> Result<Vec<Frame>, FrameError> {
    let frame = Frame::new(name).with_fields(fields);
    frame.validate()?;
    Ok(vec![frame])
}

impl Framer for DescribeAssetResponse {
    fn frames(&self) -> Result<Vec<Frame>, FrameError> {
        single(
            &self.asset_name,
            vec![
                strings("name", [Some(self.asset_name.as_str())]),
                strings("id", [Some(self.asset_id.as_str())]),
                strings("arn", [Some(self.asset_arn.as_str())]),
                strings("model_id", [Some(self.asset_model_id.as_str())]),
                strings("description", [self.asset_description.as_deref()]),
                strings("state", [Some(self.asset_status.state.as_str())]),
                strings("hierarchies", [Some(hierarchies_json(&self.asset_hierarchies))]),
                times("creation_date", [self.asset_creation_date]),
                times("last_update_date", [self.asset_last_update_date]),
            ],
        )
    }
}

impl Framer for DescribeAssetModelResponse {
    fn frames(&self) -> Result<Vec<Frame>, FrameError> {
        let properties = json!(self
            .asset_model_properties
            .iter()
            .map(|p| json!({
                "id": p.id,
                "name": p.name,
                "dataType": p.data_type.as_str(),
                "unit": p.unit,
            }))
            .collect::<Vec<_>>())
        .to_string();
        single(
            &self.asset_model_name,
            vec![
                strings("name", [Some(self.asset_model_name.as_str())]),
                strings("id", [Some(self.asset_model_id.as_str())]),
                strings("arn", [Some(self.asset_model_arn.as_str())]),
                strings("description", [self.asset_model_description.as_deref()]),
                strings("state", [Some(self.asset_model_status.state.as_str())]),
                strings("properties", [Some(properties)]),
                strings("hierarchies", [Some(hierarchies_json(&self.asset_model_hierarchies))]),
                times("creation_date", [self.asset_model_creation_date]),
                times("last_update_date", [self.asset_model_last_update_date]),
            ],
        )
    }
}

impl Framer for ListAssetsResponse {
    fn frames(&self) -> Result<Vec<Frame>, FrameError> {
        let assets = &self.asset_summaries;
        let mut frames = single(
            "",
            vec![
                strings("name", assets.iter().map(|a| Some(a.name.as_str()))),
                strings("id", assets.iter().map(|a| Some(a.id.as_str()))),
                strings("model_id", assets.iter().map(|a| Some(a.asset_model_id.as_str()))),
                strings("arn", assets.iter().map(|a| Some(a.arn.as_str()))),
                strings("description", assets.iter().map(|a| a.description.as_deref())),
                strings("state", assets.iter().map(|a| Some(a.status.state.as_str()))),
                strings(
                    "hierarchies",
                    assets.iter().map(|a| Some(hierarchies_json(&a.hierarchies))),
                ),
                times("creation_date", assets.iter().map(|a| a.creation_date)),
                times("last_update_date", assets.iter().map(|a| a.last_update_date)),
            ],
        )?;
        attach_next_token(&mut frames, self.next_token.as_deref());
        Ok(frames)
    }
}

impl Framer for ListAssetModelsResponse {
    fn frames(&self) -> Result<Vec<Frame>, FrameError> {
        let models = &self.asset_model_summaries;
        let mut frames = single(
            "",
            vec![
                strings("name", models.iter().map(|m| Some(m.name.as_str()))),
                strings("id", models.iter().map(|m| Some(m.id.as_str()))),
                strings("arn", models.iter().map(|m| Some(m.arn.as_str()))),
                strings("description", models.iter().map(|m| m.description.as_deref())),
                strings("state", models.iter().map(|m| Some(m.status.state.as_str()))),
                times("creation_date", models.iter().map(|m| m.creation_date)),
                times("last_update_date", models.iter().map(|m| m.last_update_date)),
            ],
        )?;
        attach_next_token(&mut frames, self.next_token.as_deref());
        Ok(frames)
    }
}

impl Framer for AssetPropertiesResponse {
    fn frames(&self) -> Result<Vec<Frame>, FrameError> {
        let properties = &self.properties;
        let mut frames = single(
            "",
            vec![
                strings("name", properties.iter().map(|p| Some(p.name.as_str()))),
                strings("id", properties.iter().map(|p| Some(p.summary.id.as_str()))),
                strings("alias", properties.iter().map(|p| p.summary.alias.as_deref())),
                strings("unit", properties.iter().map(|p| p.summary.unit.as_deref())),
                strings(
                    "asset_composite_model_id",
                    properties
                        .iter()
                        .map(|p| p.summary.asset_composite_model_id.as_deref()),
                ),
            ],
        )?;
        frames[0].meta.custom.entry_id = Some(self.asset_id.clone());
        attach_next_token(&mut frames, self.next_token.as_deref());
        Ok(frames)
    }
}

impl Framer for ListTimeSeriesResponse {
    fn frames(&self) -> Result<Vec<Frame>, FrameError> {
        let series = &self.time_series_summaries;
        let mut frames = single(
            "",
            vec![
                strings("alias", series.iter().map(|s| s.alias.as_deref())),
                strings("asset_id", series.iter().map(|s| s.asset_id.as_deref())),
                strings("property_id", series.iter().map(|s| s.property_id.as_deref())),
                strings("data_type", series.iter().map(|s| Some(s.data_type.as_str()))),
                strings("time_series_id", series.iter().map(|s| Some(s.time_series_id.as_str()))),
                strings("time_series_arn", series.iter().map(|s| Some(s.time_series_arn.as_str()))),
                times("creation_date", series.iter().map(|s| s.time_series_creation_date)),
                times("last_update_date", series.iter().map(|s| s.time_series_last_update_date)),
            ],
        )?;
        attach_next_token(&mut frames, self.next_token.as_deref());
        Ok(frames)
    }
}
