use crate::application::api::{AggregateResponse, PropertyEntry};
use crate::application::framer::{Framer, attach_next_token, entry_frame, time_field, units};
use crate::domain::frame::{Field, FieldType, Frame, FrameError, Scalar};
use crate::domain::query::AggregateType;
use crate::domain::sitewise::AggregatedValue;

/// Aggregate columns of an entry in fixed order: requested ones, narrowed to
/// those present in the buckets once any bucket arrived.
fn present_aggregates(
    requested: &[AggregateType],
    values: &[AggregatedValue],
) -> Vec<AggregateType> {
    AggregateType::ORDER
        .into_iter()
        .filter(|a| requested.is_empty() || requested.contains(a))
        .filter(|a| values.is_empty() || values.iter().any(|v| v.value.get(*a).is_some()))
        .collect()
}

fn aggregate_frame(
    entry: &PropertyEntry<AggregatedValue>,
    requested: &[AggregateType],
) -> Result<Frame, FrameError> {
    let aggregates = present_aggregates(requested, &entry.values);
    let unit = units::display_unit(&entry.property.unit);

    let mut time = time_field();
    let mut columns: Vec<Field> = aggregates
        .iter()
        .map(|a| {
            let field = Field::new(a.column_name(), FieldType::Float64);
            match a {
                AggregateType::Count => field,
                _ => field.with_unit(unit.clone()),
            }
        })
        .collect();

    for bucket in &entry.values {
        time.push(Scalar::Time(bucket.timestamp))?;
        for (column, aggregate) in columns.iter_mut().zip(&aggregates) {
            column.push(bucket.value.get(*aggregate).map_or(Scalar::Null, Scalar::Float64))?;
        }
    }

    let mut fields = Vec::with_capacity(columns.len() + 1);
    fields.push(time);
    fields.extend(columns);
    let mut frame = entry_frame(entry, fields);
    frame.meta.custom.aggregates = aggregates.iter().map(|a| a.as_str().to_string()).collect();
    frame.validate()?;
    Ok(frame)
}

impl Framer for AggregateResponse {
    fn frames(&self) -> Result<Vec<Frame>, FrameError> {
        let mut frames = self
            .entries
            .iter()
            .map(|entry| aggregate_frame(entry, &self.aggregate_types))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(resolution) = self.resolution {
            for frame in &mut frames {
                frame.meta.custom.resolution = Some(resolution.to_string());
            }
        }
        attach_next_token(&mut frames, self.next_token.as_deref());
        Ok(frames)
    }
}
