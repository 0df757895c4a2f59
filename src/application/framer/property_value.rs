// Frames for latest, historical and interpolated values
use chrono::{DateTime, Utc};

use crate::application::api::time_range::TimeRangeResponse;
use crate::application::api::{InterpolatedResponse, PropertyEntry, ValueResponse};
use crate::application::framer::{Framer, anomaly, attach_next_token, entry_frame, time_field, value_field};
use crate::domain::frame::{Frame, FrameError, Scalar};
use crate::domain::property::DataType;
use crate::domain::sitewise::Variant;

/// One `[time, <property name>]` frame for an entry.
pub fn variant_frame<'a, T: 'a>(
    entry: &'a PropertyEntry<T>,
    point: impl Fn(&'a T) -> (DateTime<Utc>, &'a Variant),
) -> Result<Frame, FrameError> {
    let data_type = entry.property.data_type;
    let mut time = time_field();
    let mut value = value_field(&entry.property);
    for item in &entry.values {
        let (timestamp, variant) = point(item);
        time.push(Scalar::Time(timestamp))?;
        value.push(variant.scalar_for(data_type))?;
    }

    let mut frame = entry_frame(entry, vec![time, value]);
    if data_type == DataType::String {
        anomaly::expand(&mut frame, 1, &entry.related_names)?;
    }
    frame.validate()?;
    Ok(frame)
}

impl Framer for ValueResponse {
    fn frames(&self) -> Result<Vec<Frame>, FrameError> {
        let mut frames = self
            .entries
            .iter()
            .map(|entry| variant_frame(entry, |v| (v.timestamp.to_datetime(), &v.value)))
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

impl Framer for InterpolatedResponse {
    fn frames(&self) -> Result<Vec<Frame>, FrameError> {
        let mut frames = self
            .entries
            .iter()
            .map(|entry| variant_frame(entry, |v| (v.timestamp.to_datetime(), &v.value)))
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

impl Framer for TimeRangeResponse {
    fn frames(&self) -> Result<Vec<Frame>, FrameError> {
        match self {
            TimeRangeResponse::History(response) => response.frames(),
            TimeRangeResponse::Aggregate(response) => response.frames(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::api::PropertyResponse;
    use crate::application::testing::value_at;
    use crate::domain::frame::FieldType;
    use crate::domain::property::PropertyDescriptor;
    use crate::domain::sitewise::{AssetPropertyValue, EntryError, TimeInNanos};

    fn wind_speed() -> PropertyDescriptor {
        PropertyDescriptor {
            asset_id: "a1".into(),
            asset_name: "Turbine 1".into(),
            property_id: "p-avg-wind".into(),
            property_name: "Average Wind Speed".into(),
            alias: None,
            data_type: DataType::Double,
            unit: "m/s".into(),
        }
    }

    #[test]
    fn test_history_frame_shape() {
        let values = (0..36).map(|i| value_at(1_700_000_000 + i * 300, i as f64)).collect();
        let response = PropertyResponse::new(
            vec![PropertyEntry::new("a1", wind_speed(), values)],
            Some("more".into()),
        );

        let frames = response.frames().unwrap();
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.name, "Turbine 1");
        assert_eq!(frame.field_names(), vec!["time", "Average Wind Speed"]);
        assert_eq!(frame.rows(), 36);
        assert_eq!(frame.fields[1].unit(), Some("m/s"));
        assert_eq!(frame.meta.custom.entry_id.as_deref(), Some("a1"));
        assert_eq!(frame.meta.custom.next_token.as_deref(), Some("more"));
    }

    #[test]
    fn test_nanosecond_timestamps_and_integer_columns() {
        let mut property = wind_speed();
        property.data_type = DataType::Integer;
        let value = AssetPropertyValue {
            value: Variant::integer(7),
            timestamp: TimeInNanos {
                time_in_seconds: 10,
                offset_in_nanos: 5,
            },
            quality: None,
        };
        let response = PropertyResponse::new(vec![PropertyEntry::new("a1", property, vec![value])], None);

        let frame = &response.frames().unwrap()[0];
        assert_eq!(frame.fields[1].field_type(), FieldType::Int64);
        assert_eq!(
            frame.first_timestamp().unwrap().timestamp_nanos_opt(),
            Some(10_000_000_005)
        );
    }

    #[test]
    fn test_failed_entry_is_empty_with_notice() {
        let response: ValueResponse = PropertyResponse::new(
            vec![PropertyEntry::failed(
                "a2",
                wind_speed(),
                EntryError {
                    entry_id: "a2".into(),
                    error_code: "AccessDeniedException".into(),
                    error_message: "not authorized".into(),
                },
            )],
            None,
        );

        let frame = &response.frames().unwrap()[0];
        assert_eq!(frame.rows(), 0);
        assert_eq!(frame.meta.custom.notices[0].text, "not authorized");
    }
}
