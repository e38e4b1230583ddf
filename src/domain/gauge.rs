// Latest-value summary for gauge widgets
use super::reading::Reading;
use super::series::{Rgb, Series, SeriesCollection};

const CAPTION_MAX_CHARS: usize = 6;
const BACKGROUND_LIGHTEN: u8 = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub id: String,
    pub label: String,
    pub value: Reading,
    pub fill: f64,
    pub tint: Rgb,
    pub background: Rgb,
    pub caption: String,
}

/// Fill amount for a gauge scaled roughly 0-100.
///
/// Small fractional readings are magnified so they stay visible.
pub fn gauge_fill(value: f64) -> f64 {
    if value.abs() > 1.0 {
        value
    } else {
        (value * 1000.0).abs()
    }
}

fn caption(value: &Reading) -> String {
    let text = value.to_string();
    if text.chars().count() > CAPTION_MAX_CHARS {
        let head: String = text.chars().take(CAPTION_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        text
    }
}

pub fn project_series(series: &Series) -> Option<Gauge> {
    let latest = series.latest()?;
    let fill = latest.value.as_f64().map(gauge_fill).unwrap_or(0.0);
    Some(Gauge {
        id: series.id.clone(),
        label: series.label.clone(),
        value: latest.value.clone(),
        fill,
        tint: series.color,
        background: series.color.shade(BACKGROUND_LIGHTEN, true),
        caption: caption(&latest.value),
    })
}

/// One gauge per series, in discovery order
pub fn project(collection: &SeriesCollection) -> Vec<Gauge> {
    collection.iter().filter_map(|s| project_series(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::Point;

    #[test]
    fn test_gauge_fill() {
        assert_eq!(gauge_fill(42.0), 42.0);
        assert_eq!(gauge_fill(-3.5), -3.5);
        assert_eq!(gauge_fill(0.012), 12.0);
        assert_eq!(gauge_fill(-0.05), 50.0);
        assert_eq!(gauge_fill(1.0), 1000.0);
    }

    #[test]
    fn test_projects_latest_point() {
        let color = Rgb::new(20, 40, 60);
        let collection = SeriesCollection::new()
            .with_series(Series::new("temperature".to_string(), color, Point::new(0, 21.5.into())))
            .with_point("temperature", Point::new(1_000, 22.123456.into()));

        let gauges = project(&collection);

        assert_eq!(gauges.len(), 1);
        let gauge = &gauges[0];
        assert_eq!(gauge.value, Reading::Number(22.123456));
        assert_eq!(gauge.fill, 22.123456);
        assert_eq!(gauge.caption, "22.123...");
        assert_eq!(gauge.background, Rgb::new(110, 130, 150));
        // read-only
        assert_eq!(collection.get("temperature").unwrap().points.len(), 2);
    }

    #[test]
    fn test_text_reading_fill() {
        let collection = SeriesCollection::new()
            .with_series(Series::new("mode".to_string(), Rgb::new(0, 0, 0), Point::new(0, "idle".into())));
        let gauge = &project(&collection)[0];
        assert_eq!(gauge.fill, 0.0);
        assert_eq!(gauge.caption, "idle");
    }
}
