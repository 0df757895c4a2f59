// Resolution picker for history, aggregate and interpolation queries
use crate::domain::query::{Resolution, TimeRange};

pub const MAX_RESPONSE_SIZE: i64 = 250;
pub const MAX_HISTORY_PAGES: i64 = 4;

pub const MAX_INTERPOLATED_RESPONSE_SIZE: i64 = 10;
pub const MAX_INTERPOLATED_PAGES: i64 = 10;

const HISTORY_CANDIDATES: [Resolution; 3] = [
    Resolution::OneSecond,
    Resolution::OneMinute,
    Resolution::OneHour,
];

const INTERPOLATED_CANDIDATES: [Resolution; 6] = [
    Resolution::OneSecond,
    Resolution::TenSeconds,
    Resolution::OneMinute,
    Resolution::TenMinutes,
    Resolution::OneHour,
    Resolution::TenHours,
];

fn first_fit(
    candidates: &[Resolution],
    range: &TimeRange,
    max_points: i64,
    response_size: i64,
    max_pages: i64,
) -> Resolution {
    let range_secs = range.duration().as_secs_f64();
    candidates
        .iter()
        .copied()
        .find(|candidate| {
            let bucket = candidate
                .duration()
                .map(|d| d.as_secs_f64())
                .unwrap_or(1.0);
            let points = (range_secs / bucket).floor() as i64;
            let pages = (points + response_size - 1) / response_size;
            points < max_points && pages <= max_pages
        })
        .unwrap_or(Resolution::OneDay)
}

/// Picks the coarsest bucket needed to keep a history-style query under the
/// point budget. One-second buckets mean the raw values fit.
pub fn pick_resolution(range: &TimeRange, max_points: i64) -> Resolution {
    match first_fit(
        &HISTORY_CANDIDATES,
        range,
        max_points,
        MAX_RESPONSE_SIZE,
        MAX_HISTORY_PAGES,
    ) {
        Resolution::OneSecond => Resolution::Raw,
        other => other,
    }
}

pub fn pick_interpolation_resolution(range: &TimeRange, max_points: i64) -> Resolution {
    first_fit(
        &INTERPOLATED_CANDIDATES,
        range,
        max_points,
        MAX_INTERPOLATED_RESPONSE_SIZE,
        MAX_INTERPOLATED_PAGES,
    )
}

/// Aggregates below one minute are not offered by the service.
pub fn aggregate_resolution(resolution: Resolution) -> Resolution {
    match resolution {
        Resolution::Raw | Resolution::OneSecond | Resolution::TenSeconds => Resolution::OneMinute,
        other => other,
    }
}
