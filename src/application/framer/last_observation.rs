// Nearest points outside a time window, merged into the window's frames
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

use crate::domain::frame::{Frame, FrameError};
use crate::domain::query::TimeRange;

/// How far before the window start the previous observation is searched.
pub const LAST_OBSERVATION_LOOKBACK: Duration = Duration::from_secs(365 * 24 * 60 * 60);
/// Gap kept between the window edges and the side searches.
pub const LAST_OBSERVATION_GAP: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Latest point before the window, searched in descending order.
    Before,
    /// Earliest point after the window, searched in ascending order.
    After,
}

fn delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// `[from - 1y, from - 1s]`.
pub fn before_window(range: &TimeRange) -> TimeRange {
    TimeRange::new(
        range.from - delta(LAST_OBSERVATION_LOOKBACK),
        range.from - delta(LAST_OBSERVATION_GAP),
    )
}

/// `[to + 1s, now]`, or nothing when the window already reaches now.
pub fn after_window(range: &TimeRange, now: DateTime<Utc>) -> Option<TimeRange> {
    let from = range.to + delta(LAST_OBSERVATION_GAP);
    (from < now).then(|| TimeRange::new(from, now))
}

/// Merges the single-point side frame into `primary`. The primary is returned
/// unchanged when the schemas differ or the point would duplicate or reorder
/// an existing timestamp.
pub fn merge(primary: Frame, side: &Frame, position: Side) -> Result<Frame, FrameError> {
    if side.is_empty() || !primary.same_schema(side) {
        return Ok(primary);
    }

    let nearest = match position {
        Side::Before => side.last_timestamp(),
        Side::After => side.first_timestamp(),
    };
    let Some(timestamp) = nearest else {
        return Ok(primary);
    };
    let row_index = side
        .time_values()
        .and_then(|values| values.iter().position(|t| *t == Some(timestamp)))
        .unwrap_or(0);
    let row = side.row(row_index);

    let in_order = primary.is_empty()
        || match position {
            Side::Before => primary.first_timestamp().is_some_and(|first| timestamp < first),
            Side::After => primary.last_timestamp().is_some_and(|last| timestamp > last),
        };
    if !in_order || primary.contains_timestamp(timestamp) {
        return Ok(primary);
    }

    let mut merged = primary.clone();
    let index = match position {
        Side::Before => 0,
        Side::After => merged.rows(),
    };
    match merged.insert_row(index, row).and_then(|_| merged.validate()) {
        Ok(()) => Ok(merged),
        Err(err) => {
            tracing::debug!("Skipping last observation for {}: {}", primary.name, err);
            Ok(primary)
        }
    }
}

/// Applies the before and after side results to each primary frame. Frames
/// pair by entry id, or by position when they have none. A missing side
/// leaves the primary frames as they are.
pub fn merge_frames(
    primary: Vec<Frame>,
    before: Option<&[Frame]>,
    after: Option<&[Frame]>,
) -> Result<Vec<Frame>, FrameError> {
    let pick = |sides: &[Frame], index: usize, frame: &Frame| -> Option<Frame> {
        match &frame.meta.custom.entry_id {
            Some(entry_id) => sides
                .iter()
                .find(|s| s.meta.custom.entry_id.as_ref() == Some(entry_id))
                .cloned(),
            None => sides.get(index).cloned(),
        }
    };

    primary
        .into_iter()
        .enumerate()
        .map(|(index, frame)| {
            let mut merged = frame;
            if let Some(side) = before.and_then(|s| pick(s, index, &merged)) {
                merged = merge(merged, &side, Side::Before)?;
            }
            if let Some(side) = after.and_then(|s| pick(s, index, &merged)) {
                merged = merge(merged, &side, Side::After)?;
            }
            Ok(merged)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::{Field, FieldType, Scalar, TIME_FIELD};
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn frame(value_name: &str, points: &[(i64, f64)]) -> Frame {
        let mut time = Field::time(TIME_FIELD);
        let mut value = Field::new(value_name, FieldType::Float64);
        for (secs, v) in points {
            time.push(Scalar::Time(ts(*secs))).unwrap();
            value.push(Scalar::Float64(*v)).unwrap();
        }
        Frame::new("Turbine 1").with_fields(vec![time, value])
    }

    #[test]
    fn test_empty_primary_takes_side() {
        let merged = merge(frame("speed", &[]), &frame("speed", &[(50, 1.0)]), Side::Before).unwrap();
        assert_eq!(merged.rows(), 1);
        assert_eq!(merged.first_timestamp(), Some(ts(50)));
    }

    #[test]
    fn test_empty_primary_keeps_its_column_types() {
        let mut side = frame("speed", &[]);
        side.fields[1] = Field::new("speed", FieldType::String);
        side.fields[0].push(Scalar::Time(ts(50))).unwrap();
        side.fields[1].push(Scalar::String("x".into())).unwrap();

        let primary = frame("speed", &[]);
        let merged = merge(primary.clone(), &side, Side::Before).unwrap();
        assert_eq!(merged, primary);
    }

    #[test]
    fn test_schema_mismatch_keeps_primary() {
        let primary = frame("speed", &[(100, 1.0)]);
        let merged = merge(primary.clone(), &frame("torque", &[(50, 2.0)]), Side::Before).unwrap();
        assert_eq!(merged, primary);
    }

    #[test]
    fn test_prepended_row_is_strictly_earlier() {
        let primary = frame("speed", &[(100, 1.0), (200, 2.0)]);
        let merged = merge(primary.clone(), &frame("speed", &[(40, 0.5)]), Side::Before).unwrap();
        assert_eq!(merged.rows(), 3);
        assert!(merged.time_values().unwrap()[0].unwrap() < primary.first_timestamp().unwrap());

        let duplicate = merge(primary.clone(), &frame("speed", &[(100, 9.0)]), Side::Before).unwrap();
        assert_eq!(duplicate, primary);
    }

    #[test]
    fn test_appended_row_and_windows() {
        let primary = frame("speed", &[(100, 1.0)]);
        let merged = merge(primary, &frame("speed", &[(300, 3.0)]), Side::After).unwrap();
        assert_eq!(merged.last_timestamp(), Some(ts(300)));

        let range = TimeRange::new(ts(1_000), ts(2_000));
        let before = before_window(&range);
        assert_eq!(before.to, ts(999));
        assert_eq!(before.from, ts(1_000 - 365 * 86_400));
        assert_eq!(after_window(&range, ts(2_000)), None);
        assert_eq!(after_window(&range, ts(3_000)).unwrap().from, ts(2_001));
    }

    #[test]
    fn test_merge_frames_pairs_by_entry() {
        let mut primary = frame("speed", &[(100, 1.0)]);
        primary.meta.custom.entry_id = Some("a1".into());
        let mut other = frame("speed", &[(100, 1.0)]);
        other.meta.custom.entry_id = Some("a2".into());
        let mut side = frame("speed", &[(10, 0.1)]);
        side.meta.custom.entry_id = Some("a2".into());

        let merged = merge_frames(vec![primary, other], Some(std::slice::from_ref(&side)), None).unwrap();
        assert_eq!(merged[0].rows(), 1);
        assert_eq!(merged[1].rows(), 2);
    }
}
