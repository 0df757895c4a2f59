// Long to wide reshaping for the time series response format
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::domain::frame::{
    Field, FieldType, FieldValues, Frame, FrameError, Notice, Scalar, TIME_FIELD,
};

/// Dimension column added when per-entry frames are stacked.
pub const SOURCE_DIMENSION: &str = "source";
/// Entry id dimension; keeps entries that share a display name apart.
pub const ENTRY_DIMENSION: &str = "entry";

fn time_index(frame: &Frame) -> Option<usize> {
    frame
        .fields
        .iter()
        .position(|f| f.field_type() == FieldType::Time)
}

/// Stacks frames into one long frame: time, a dimension column holding each
/// frame's name, an `entry` column with the entry id when any frame has one,
/// then the union of the value columns. Missing values are null; a column
/// whose type differs from the first one seen is dropped with a warning.
pub fn stack(frames: &[Frame], dimension: &str) -> Result<Frame, FrameError> {
    let mut value_columns: Vec<Field> = Vec::new();
    for frame in frames {
        for field in &frame.fields {
            if field.field_type() == FieldType::Time || value_columns.iter().any(|f| f.name == field.name) {
                continue;
            }
            let mut column = Field::new(field.name.clone(), field.field_type());
            column.config = field.config.clone();
            value_columns.push(column);
        }
    }

    let with_entries = frames.iter().any(|f| f.meta.custom.entry_id.is_some());
    let mut notices = Vec::new();
    let mut time = Field::time(TIME_FIELD);
    let mut source = Field::new(dimension, FieldType::String);
    let mut entry = Field::new(ENTRY_DIMENSION, FieldType::String);
    for frame in frames {
        let Some(time_at) = time_index(frame) else {
            continue;
        };
        for column in &value_columns {
            if let Some(field) = frame.field(&column.name) {
                if field.field_type() != column.field_type() {
                    notices.push(Notice::warning(format!(
                        "column {} of {} is {:?} but {:?} was expected; its values are omitted",
                        column.name,
                        frame.name,
                        field.field_type(),
                        column.field_type()
                    )));
                }
            }
        }
        let entry_id = frame.meta.custom.entry_id.clone().unwrap_or_default();
        for row in 0..frame.rows() {
            time.push(frame.fields[time_at].values.get(row))?;
            source.push(Scalar::String(frame.name.clone()))?;
            entry.push(Scalar::String(entry_id.clone()))?;
            for column in &mut value_columns {
                let value = frame
                    .field(&column.name)
                    .filter(|f| f.field_type() == column.field_type())
                    .map_or(Scalar::Null, |f| f.values.get(row));
                column.push(value)?;
            }
        }
    }

    let mut long = Frame::new(frames.first().map(|f| f.name.clone()).unwrap_or_default());
    if let Some(first) = frames.first() {
        long.meta = first.meta.clone();
    }
    long.meta.custom.notices.extend(notices);
    long.fields.push(time);
    long.fields.push(source);
    if with_entries {
        long.fields.push(entry);
    }
    long.fields.extend(value_columns);
    long.validate()?;
    Ok(long)
}

/// Pivots a long frame on its time column. Each value column splits into one
/// column per distinct combination of the dimension columns, labelled with
/// that combination; rows align on sorted unique timestamps.
pub fn long_to_wide(frame: &Frame, dimensions: &[&str]) -> Result<Frame, FrameError> {
    let Some(time_at) = time_index(frame) else {
        return Ok(frame.clone());
    };
    let FieldValues::Time(times) = &frame.fields[time_at].values else {
        return Ok(frame.clone());
    };
    let dimension_at: Vec<usize> = frame
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.field_type() == FieldType::String && dimensions.contains(&f.name.as_str()))
        .map(|(i, _)| i)
        .collect();
    let value_at: Vec<usize> = (0..frame.fields.len())
        .filter(|i| *i != time_at && !dimension_at.contains(i))
        .collect();

    let mut timestamps: Vec<DateTime<Utc>> = times.iter().flatten().copied().collect();
    timestamps.sort();
    timestamps.dedup();
    let slot: HashMap<DateTime<Utc>, usize> =
        timestamps.iter().enumerate().map(|(i, t)| (*t, i)).collect();

    // (value column, dimension key) in first-seen order.
    let mut columns: Vec<(usize, Vec<String>, Vec<Scalar>)> = Vec::new();
    for (row, timestamp) in times.iter().enumerate() {
        let Some(index) = timestamp.and_then(|t| slot.get(&t).copied()) else {
            continue;
        };
        let key: Vec<String> = dimension_at
            .iter()
            .map(|d| match frame.fields[*d].values.get(row) {
                Scalar::String(s) => s,
                _ => String::new(),
            })
            .collect();
        for value in &value_at {
            let position = match columns.iter().position(|(v, k, _)| v == value && *k == key) {
                Some(position) => position,
                None => {
                    columns.push((*value, key.clone(), vec![Scalar::Null; timestamps.len()]));
                    columns.len() - 1
                }
            };
            columns[position].2[index] = frame.fields[*value].values.get(row);
        }
    }

    let mut time = Field::time(TIME_FIELD);
    for timestamp in &timestamps {
        time.push(Scalar::Time(*timestamp))?;
    }
    let mut fields = vec![time];
    for (value, key, cells) in columns {
        if cells.iter().all(Scalar::is_null) {
            continue;
        }
        let source = &frame.fields[value];
        let mut field = Field::new(source.name.clone(), source.field_type());
        field.config = source.config.clone();
        for (d, label) in dimension_at.iter().zip(key) {
            if !label.is_empty() {
                field.labels.insert(frame.fields[*d].name.clone(), label);
            }
        }
        for cell in cells {
            field.push(cell)?;
        }
        fields.push(field);
    }

    let mut wide = Frame::new(frame.name.clone()).with_fields(fields);
    wide.meta = frame.meta.clone();
    wide.validate()?;
    Ok(wide)
}

/// Time series layout: data frames are stacked by entry and name and pivoted
/// wide.
/// Frames carrying notices or lacking a time column pass through.
pub fn to_wide(frames: Vec<Frame>) -> Result<Vec<Frame>, FrameError> {
    let (data, passthrough): (Vec<Frame>, Vec<Frame>) = frames
        .into_iter()
        .partition(|f| f.meta.custom.notices.is_empty() && time_index(f).is_some());
    if data.is_empty() {
        return Ok(passthrough);
    }

    let long = stack(&data, SOURCE_DIMENSION)?;
    let mut wide = long_to_wide(&long, &[SOURCE_DIMENSION, ENTRY_DIMENSION])?;
    wide.meta.custom.entry_id = None;
    let mut result = vec![wide];
    result.extend(passthrough);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn frame(name: &str, points: &[(i64, f64)]) -> Frame {
        let mut time = Field::time(TIME_FIELD);
        let mut value = Field::new("Average Wind Speed", FieldType::Float64).with_unit(Some("m/s".into()));
        for (secs, v) in points {
            time.push(Scalar::Time(ts(*secs))).unwrap();
            value.push(Scalar::Float64(*v)).unwrap();
        }
        Frame::new(name).with_fields(vec![time, value])
    }

    #[test]
    fn test_wide_frame_aligns_timestamps_with_null_fill() {
        let frames = vec![
            frame("Turbine 1", &[(10, 1.0), (20, 2.0)]),
            frame("Turbine 2", &[(20, 5.0), (30, 6.0)]),
        ];

        let wide = to_wide(frames).unwrap();
        assert_eq!(wide.len(), 1);
        let wide = &wide[0];
        assert_eq!(wide.rows(), 3);
        assert_eq!(wide.fields.len(), 3);
        assert_eq!(wide.fields[1].labels.get(SOURCE_DIMENSION).map(String::as_str), Some("Turbine 1"));
        assert_eq!(wide.fields[1].values.get(2), Scalar::Null);
        assert_eq!(wide.fields[2].values.get(0), Scalar::Null);
        assert_eq!(wide.fields[2].values.get(1), Scalar::Float64(5.0));
        assert_eq!(wide.fields[2].unit(), Some("m/s"));
    }

    #[test]
    fn test_frame_without_dimensions_is_sorted_only() {
        let long = frame("Turbine 1", &[(20, 2.0), (10, 1.0)]);
        let wide = long_to_wide(&long, &[]).unwrap();
        assert_eq!(wide.field_names(), vec!["time", "Average Wind Speed"]);
        assert_eq!(wide.fields[1].values.get(0), Scalar::Float64(1.0));
    }

    #[test]
    fn test_entries_with_the_same_name_stay_apart() {
        let mut first = frame("Turbine", &[(10, 1.0)]);
        first.meta.custom.entry_id = Some("e0".into());
        let mut second = frame("Turbine", &[(10, 2.0)]);
        second.meta.custom.entry_id = Some("e1".into());

        let wide = to_wide(vec![first, second]).unwrap();
        let wide = &wide[0];
        assert_eq!(wide.fields.len(), 3);
        assert_eq!(wide.fields[1].values.get(0), Scalar::Float64(1.0));
        assert_eq!(wide.fields[2].values.get(0), Scalar::Float64(2.0));
        assert_eq!(wide.fields[2].labels.get(ENTRY_DIMENSION).map(String::as_str), Some("e1"));
        assert_eq!(wide.fields[2].labels.get(SOURCE_DIMENSION).map(String::as_str), Some("Turbine"));
    }

    #[test]
    fn test_retyped_column_is_reported() {
        let mut text = Field::new("Average Wind Speed", FieldType::String);
        text.push(Scalar::String("calm".into())).unwrap();
        let mut time = Field::time(TIME_FIELD);
        time.push(Scalar::Time(ts(20))).unwrap();
        let retyped = Frame::new("Turbine 2").with_fields(vec![time, text]);

        let long = stack(&[frame("Turbine 1", &[(10, 1.0)]), retyped], SOURCE_DIMENSION).unwrap();
        assert_eq!(long.rows(), 2);
        assert_eq!(long.fields[2].values.get(1), Scalar::Null);
        assert_eq!(long.meta.custom.notices.len(), 1);
        assert_eq!(long.meta.custom.notices[0].severity, crate::domain::frame::Severity::Warning);
        assert!(long.meta.custom.notices[0].text.contains("Turbine 2"));
    }

    #[test]
    fn test_error_frames_pass_through() {
        let mut failed = frame("Turbine 2", &[]);
        failed.meta.custom.notices.push(crate::domain::frame::Notice::error("denied"));
        let frames = to_wide(vec![frame("Turbine 1", &[(10, 1.0)]), failed]).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].meta.custom.notices.len(), 1);
    }
}
