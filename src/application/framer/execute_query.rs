// Frames for SQL-style query results typed by the column metadata
use crate::application::framer::{Framer, attach_next_token};
use crate::domain::frame::{Field, FieldType, Frame, FrameError, Scalar};
use crate::domain::sitewise::{ColumnInfo, Datum, ExecuteQueryResponse, epoch_seconds};

fn column_type(column: &ColumnInfo) -> Result<FieldType, FrameError> {
    let scalar_type = column.column_type.scalar_type.as_deref().unwrap_or_default();
    match scalar_type {
        "BOOLEAN" => Ok(FieldType::Bool),
        "INT" | "INTEGER" => Ok(FieldType::Int64),
        "STRING" => Ok(FieldType::String),
        "DOUBLE" => Ok(FieldType::Float64),
        "TIMESTAMP" => Ok(FieldType::Time),
        other => Err(FrameError::UnsupportedType(format!(
            "{other:?} for column {}",
            column.name
        ))),
    }
}

fn decode_error(value: &str, field_type: FieldType) -> FrameError {
    FrameError::Decode {
        value: value.to_string(),
        expected: format!("{field_type:?}"),
    }
}

fn decode(datum: &Datum, field_type: FieldType) -> Result<Scalar, FrameError> {
    let Some(text) = datum.scalar_value.as_deref() else {
        return Ok(Scalar::Null);
    };
    if datum.null_value == Some(true) {
        return Ok(Scalar::Null);
    }
    let scalar = match field_type {
        FieldType::Bool => match text {
            "true" => Scalar::Bool(true),
            "false" => Scalar::Bool(false),
            _ => return Err(decode_error(text, field_type)),
        },
        FieldType::Int64 => Scalar::Int64(text.parse().map_err(|_| decode_error(text, field_type))?),
        FieldType::Float64 => {
            Scalar::Float64(text.parse().map_err(|_| decode_error(text, field_type))?)
        }
        FieldType::Time => {
            let seconds: f64 = text.parse().map_err(|_| decode_error(text, field_type))?;
            Scalar::Time(epoch_seconds::from_f64(seconds))
        }
        FieldType::String => Scalar::String(text.to_string()),
    };
    Ok(scalar)
}

impl Framer for ExecuteQueryResponse {
    fn frames(&self) -> Result<Vec<Frame>, FrameError> {
        let types = self
            .columns
            .iter()
            .map(column_type)
            .collect::<Result<Vec<_>, _>>()?;
        let mut fields: Vec<Field> = self
            .columns
            .iter()
            .zip(&types)
            .map(|(column, field_type)| Field::new(column.name.clone(), *field_type))
            .collect();

        for row in &self.rows {
            if row.data.len() != fields.len() {
                return Err(FrameError::RowWidth {
                    expected: fields.len(),
                    actual: row.data.len(),
                });
            }
            for ((field, field_type), datum) in fields.iter_mut().zip(&types).zip(&row.data) {
                field.push(decode(datum, *field_type)?)?;
            }
        }

        let mut frames = vec![Frame::new("").with_fields(fields)];
        attach_next_token(&mut frames, self.next_token.as_deref());
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sitewise::{ColumnType, Row};

    fn column(name: &str, scalar_type: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.into(),
            column_type: ColumnType {
                scalar_type: Some(scalar_type.into()),
            },
        }
    }

    fn datum(value: Option<&str>) -> Datum {
        Datum {
            scalar_value: value.map(String::from),
            null_value: value.is_none().then_some(true),
        }
    }

    #[test]
    fn test_typed_columns() {
        let response = ExecuteQueryResponse {
            columns: vec![
                column("asset_name", "STRING"),
                column("running", "BOOLEAN"),
                column("count", "INT"),
                column("total", "INTEGER"),
                column("value", "DOUBLE"),
                column("event_time", "TIMESTAMP"),
            ],
            rows: vec![
                Row {
                    data: vec![
                        datum(Some("Turbine 1")),
                        datum(Some("true")),
                        datum(Some("3")),
                        datum(Some("4")),
                        datum(Some("1.5")),
                        datum(Some("1700000000")),
                    ],
                },
                Row {
                    data: vec![datum(None), datum(None), datum(None), datum(None), datum(None), datum(None)],
                },
            ],
            next_token: Some("page-2".into()),
        };

        let frame = &response.frames().unwrap()[0];
        assert_eq!(frame.rows(), 2);
        assert_eq!(frame.fields[1].values.get(0), Scalar::Bool(true));
        assert_eq!(frame.fields[2].values.get(0), Scalar::Int64(3));
        assert_eq!(frame.fields[3].field_type(), FieldType::Int64);
        assert_eq!(frame.fields[4].values.get(0), Scalar::Float64(1.5));
        assert_eq!(frame.fields[5].values.get(0).is_null(), false);
        assert!(frame.fields[0].values.get(1).is_null());
        assert_eq!(frame.meta.custom.next_token.as_deref(), Some("page-2"));
    }

    #[test]
    fn test_unknown_column_type_fails() {
        let response = ExecuteQueryResponse {
            columns: vec![column("blob", "BINARY")],
            ..ExecuteQueryResponse::default()
        };
        assert!(matches!(response.frames(), Err(FrameError::UnsupportedType(_))));
    }

    #[test]
    fn test_bad_boolean_fails() {
        let response = ExecuteQueryResponse {
            columns: vec![column("flag", "BOOLEAN")],
            rows: vec![Row {
                data: vec![datum(Some("yes"))],
            }],
            next_token: None,
        };
        assert!(matches!(response.frames(), Err(FrameError::Decode { .. })));
    }
}
