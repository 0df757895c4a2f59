// Display units for service unit names
/// Service unit names with a dedicated display unit in the host.
const UNIT_MAPPINGS: &[(&str, &str)] = &[
    ("BitsPerSecond", "bps"),
    ("Bytes", "decbytes"),
    ("Kilobytes", "deckbytes"),
    ("Megabytes", "decmbytes"),
    ("Gigabytes", "decgbytes"),
    ("Percent", "percent"),
    ("Seconds", "s"),
    ("Milliseconds", "ms"),
    ("Microseconds", "µs"),
    ("Celsius", "celsius"),
    ("Fahrenheit", "fahrenheit"),
    ("Hertz", "hertz"),
    ("Watts", "watt"),
    ("Kilowatts", "kwatt"),
];

/// Display unit for a property unit. Unknown units pass through unchanged.
pub fn display_unit(unit: &str) -> Option<String> {
    if unit.is_empty() {
        return None;
    }
    let mapped = UNIT_MAPPINGS
        .iter()
        .find(|(from, _)| *from == unit)
        .map(|(_, to)| *to)
        .unwrap_or(unit);
    Some(mapped.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_units() {
        for (from, to) in UNIT_MAPPINGS {
            assert_eq!(display_unit(from).as_deref(), Some(*to));
        }
    }

    #[test]
    fn test_other_units_pass_through() {
        assert_eq!(display_unit("m/s").as_deref(), Some("m/s"));
        assert_eq!(display_unit("Newton Meters").as_deref(), Some("Newton Meters"));
        assert_eq!(display_unit(""), None);
    }
}
