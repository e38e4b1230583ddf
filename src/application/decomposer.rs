// Decomposer - Flattens composite readings into per-field series items
use crate::domain::reading::{Reading, TelemetryValue};

/// One value destined for exactly one series
#[derive(Debug, Clone, PartialEq)]
pub struct FlatItem {
    pub id: String,
    pub value: Reading,
}

impl FlatItem {
    pub fn new(id: impl Into<String>, value: impl Into<Reading>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// Expand a reading of `id` into flat items.
///
/// Readings for any id other than `watched` produce nothing. Composite
/// fields become `<id>.<field>` in field order.
pub fn decompose(watched: &str, id: &str, value: &TelemetryValue) -> Vec<FlatItem> {
    if id != watched {
        return Vec::new();
    }

    match value {
        TelemetryValue::Scalar(reading) => vec![FlatItem::new(id, reading.clone())],
        TelemetryValue::Composite(fields) => fields
            .iter()
            .map(|(field, reading)| FlatItem::new(format!("{}.{}", id, field), reading.clone()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_passes_through() {
        let items = decompose("temperature", "temperature", &TelemetryValue::from(21.5));
        assert_eq!(items, vec![FlatItem::new("temperature", 21.5)]);

        let items = decompose("status", "status", &TelemetryValue::from("ok"));
        assert_eq!(items, vec![FlatItem::new("status", "ok")]);
    }

    #[test]
    fn test_composite_fans_out() {
        let value = TelemetryValue::composite([("x", 1.0), ("y", 2.0), ("z", 3.0)]);
        let items = decompose("accel", "accel", &value);
        assert_eq!(
            items,
            vec![
                FlatItem::new("accel.x", 1.0),
                FlatItem::new("accel.y", 2.0),
                FlatItem::new("accel.z", 3.0),
            ]
        );
    }

    #[test]
    fn test_other_id_is_discarded() {
        assert!(decompose("temperature", "humidity", &TelemetryValue::from(40.0)).is_empty());
    }

    #[test]
    fn test_empty_composite_yields_nothing() {
        assert!(decompose("accel", "accel", &TelemetryValue::Composite(Vec::new())).is_empty());
    }
}
