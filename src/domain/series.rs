// Series domain models
use super::reading::Reading;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lighter (or darker) variant, shifting every channel by `amount`
    pub fn shade(&self, amount: u8, lighten: bool) -> Rgb {
        let shift = |c: u8| {
            if lighten {
                c.saturating_add(amount)
            } else {
                c.saturating_sub(amount)
            }
        };
        Rgb::new(shift(self.r), shift(self.g), shift(self.b))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub elapsed_ms: u64,
    pub value: Reading,
}

impl Point {
    pub fn new(elapsed_ms: u64, value: Reading) -> Self {
        Self { elapsed_ms, value }
    }
}

/// One plotted line: a telemetry leaf with its point history
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub id: String,
    pub label: String,
    pub color: Rgb,
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(id: String, color: Rgb, first: Point) -> Self {
        Self {
            label: id.clone(),
            id,
            color,
            points: vec![first],
        }
    }

    pub fn latest(&self) -> Option<&Point> {
        self.points.last()
    }

    fn with_point(&self, point: Point) -> Series {
        let mut points = Vec::with_capacity(self.points.len() + 1);
        points.extend_from_slice(&self.points);
        points.push(point);
        Series {
            id: self.id.clone(),
            label: self.label.clone(),
            color: self.color,
            points,
        }
    }
}

/// Series in discovery order.
///
/// Values are never mutated in place: every change yields a new collection
/// that shares the untouched series with its predecessor, so a consumer can
/// detect which series changed with [`Arc::ptr_eq`].
#[derive(Debug, Clone, Default)]
pub struct SeriesCollection {
    series: Vec<Arc<Series>>,
}

impl SeriesCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Series>> {
        self.series.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Series>> {
        self.series.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.id.as_str()).collect()
    }

    /// New collection with `series` appended at the end of discovery order
    pub fn with_series(&self, series: Series) -> SeriesCollection {
        debug_assert!(self.get(&series.id).is_none(), "duplicate series id {}", series.id);
        let mut next = self.series.clone();
        next.push(Arc::new(series));
        SeriesCollection { series: next }
    }

    /// New collection where the series `id` gained `point`
    pub fn with_point(&self, id: &str, point: Point) -> SeriesCollection {
        let series = self
            .series
            .iter()
            .map(|s| {
                if s.id == id {
                    Arc::new(s.with_point(point.clone()))
                } else {
                    Arc::clone(s)
                }
            })
            .collect();
        SeriesCollection { series }
    }
}
