// Conversion of API responses into typed frames
pub mod aggregate;
pub mod anomaly;
pub mod execute_query;
pub mod last_observation;
pub mod property_value;
pub mod reshape;
pub mod resources;
pub mod units;

use crate::application::api::PropertyEntry;
use crate::domain::frame::{Field, Frame, FrameError, Notice, TIME_FIELD};
use crate::domain::property::PropertyDescriptor;

pub trait Framer {
    fn frames(&self) -> Result<Vec<Frame>, FrameError>;
}

/// Value column typed by the property's data type, with its display unit.
pub fn value_field(property: &PropertyDescriptor) -> Field {
    Field::new(property.property_name.clone(), property.data_type.field_type())
        .with_unit(units::display_unit(&property.unit))
}

/// Empty frame for an entry, meta filled in. Failed entries carry their
/// service error as a notice.
pub fn entry_frame<T>(entry: &PropertyEntry<T>, fields: Vec<Field>) -> Frame {
    let mut frame = Frame::new(entry.property.frame_name()).with_fields(fields);
    frame.meta.custom.entry_id = Some(entry.entry_id.clone());
    if let Some(error) = &entry.error {
        frame.meta.custom.notices.push(Notice::error(error.error_message.clone()));
    }
    frame
}

pub fn time_field() -> Field {
    Field::time(TIME_FIELD)
}

/// Puts the continuation token on the first frame able to carry it, which is
/// one with at least one field and one row.
pub fn attach_next_token(frames: &mut [Frame], next_token: Option<&str>) {
    let Some(token) = next_token.filter(|t| !t.is_empty()) else {
        return;
    };
    if let Some(frame) = frames
        .iter_mut()
        .find(|f| !f.fields.is_empty() && f.rows() > 0)
    {
        frame.meta.custom.next_token = Some(token.to_string());
    }
}
