// Expansion of JSON anomaly records stored in string properties
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::domain::frame::{Field, FieldType, FieldValues, Frame, FrameError, Scalar};

const REQUIRED_KEYS: [&str; 3] = ["timestamp", "prediction", "prediction_reason"];
const DIAGNOSTICS_KEY: &str = "diagnostics";
pub const CONTRIBUTION_PREFIX: &str = "contrib_";

fn parse_record(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) if REQUIRED_KEYS.iter().all(|k| map.contains_key(*k)) => Some(map),
        _ => None,
    }
}

/// Columns discovered while walking the rows; late columns are back-filled
/// with nulls.
struct Columns {
    fields: Vec<Field>,
    rows: usize,
}

impl Columns {
    fn set(&mut self, name: &str, field_type: FieldType, value: Scalar) -> Result<(), FrameError> {
        let index = match self.fields.iter().position(|f| f.name == name) {
            Some(index) => index,
            None => {
                let mut field = Field::new(name, field_type);
                for _ in 0..self.rows {
                    field.push(Scalar::Null)?;
                }
                self.fields.push(field);
                self.fields.len() - 1
            }
        };
        let field = &mut self.fields[index];
        if field.len() > self.rows {
            return Ok(());
        }
        if field.field_type() != field_type {
            return field.push(Scalar::Null);
        }
        field.push(value)
    }

    fn end_row(&mut self) -> Result<(), FrameError> {
        self.rows += 1;
        for field in &mut self.fields {
            while field.len() < self.rows {
                field.push(Scalar::Null)?;
            }
        }
        Ok(())
    }
}

fn contributions(
    diagnostics: Option<&Value>,
    names: &HashMap<String, String>,
) -> Vec<(String, f64)> {
    let Some(Value::Array(items)) = diagnostics else {
        return Vec::new();
    };
    let raw: Vec<(String, f64)> = items
        .iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?;
            let value = item.get("value")?.as_f64()?;
            let property_id = name.rsplit('\\').next().unwrap_or(name);
            let label = names
                .get(property_id)
                .map(String::as_str)
                .unwrap_or(property_id);
            Some((format!("{CONTRIBUTION_PREFIX}{label}"), value))
        })
        .collect();

    let total: f64 = raw.iter().map(|(_, v)| v).sum();
    if total == 0.0 {
        return raw;
    }
    raw.into_iter()
        .map(|(name, value)| (name, value / total * 100.0))
        .collect()
}

/// Appends one column per record key to `frame` when the string column at
/// `column` holds anomaly records. Other frames are left untouched.
pub fn expand(
    frame: &mut Frame,
    column: usize,
    names: &HashMap<String, String>,
) -> Result<(), FrameError> {
    let Some(FieldValues::String(texts)) = frame.fields.get(column).map(|f| &f.values) else {
        return Ok(());
    };
    let records: Vec<Option<Map<String, Value>>> = texts
        .iter()
        .map(|t| t.as_deref().and_then(parse_record))
        .collect();
    let present = texts.iter().filter(|t| t.is_some()).count();
    let parsed = records.iter().filter(|r| r.is_some()).count();
    if present == 0 || parsed != present {
        return Ok(());
    }

    let mut columns = Columns {
        fields: Vec::new(),
        rows: 0,
    };
    for record in &records {
        if let Some(record) = record {
            for (key, value) in record {
                match value {
                    Value::Number(n) => {
                        columns.set(key, FieldType::Float64, n.as_f64().map_or(Scalar::Null, Scalar::Float64))?
                    }
                    Value::Bool(b) => columns.set(key, FieldType::Bool, Scalar::Bool(*b))?,
                    Value::String(s) => columns.set(key, FieldType::String, Scalar::String(s.clone()))?,
                    _ => {}
                }
            }
            for (name, share) in contributions(record.get(DIAGNOSTICS_KEY), names) {
                columns.set(&name, FieldType::Float64, Scalar::Float64(share))?;
            }
        }
        columns.end_row()?;
    }

    tracing::debug!(
        "Expanded {} anomaly records into {} columns",
        parsed,
        columns.fields.len()
    );
    frame.fields.extend(columns.fields);
    frame.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::TIME_FIELD;
    use chrono::Utc;

    fn frame_of(values: &[Option<&str>]) -> Frame {
        let mut time = Field::time(TIME_FIELD);
        let mut text = Field::new("Anomaly", FieldType::String);
        for value in values {
            time.push(Scalar::Time(Utc::now())).unwrap();
            text.push(value.map_or(Scalar::Null, |v| Scalar::String(v.to_string())))
                .unwrap();
        }
        Frame::new("Turbine 1").with_fields(vec![time, text])
    }

    const RECORD: &str = r#"{
        "timestamp": "2024-01-01T00:00:00Z",
        "prediction": 1,
        "prediction_reason": "ANOMALY_DETECTED",
        "anomaly_score": 0.42,
        "diagnostics": [
            {"name": "wind\\p-avg-wind", "value": 0.3},
            {"name": "torque\\p-unknown", "value": 0.1}
        ]
    }"#;

    #[test]
    fn test_expands_record_and_normalizes_contributions() {
        let mut frame = frame_of(&[Some(RECORD), None]);
        let mut names = HashMap::new();
        names.insert("p-avg-wind".to_string(), "Average Wind Speed".to_string());

        expand(&mut frame, 1, &names).unwrap();

        let score = frame.field("anomaly_score").unwrap();
        assert_eq!(score.values.get(0), Scalar::Float64(0.42));
        assert_eq!(score.values.get(1), Scalar::Null);
        let wind = frame.field("contrib_Average Wind Speed").unwrap();
        let unknown = frame.field("contrib_p-unknown").unwrap();
        match (wind.values.get(0), unknown.values.get(0)) {
            (Scalar::Float64(a), Scalar::Float64(b)) => {
                assert!((a - 75.0).abs() < 1e-9);
                assert!((a + b - 100.0).abs() < 1e-9);
            }
            other => panic!("unexpected contributions {other:?}"),
        }
        assert_eq!(
            frame.field("prediction_reason").unwrap().values.get(0),
            Scalar::String("ANOMALY_DETECTED".into())
        );
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_plain_strings_are_left_alone() {
        let mut frame = frame_of(&[Some("running"), Some(RECORD)]);
        expand(&mut frame, 1, &HashMap::new()).unwrap();
        assert_eq!(frame.fields.len(), 2);
    }
}
