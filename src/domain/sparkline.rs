// Sparkline geometry - smoothed curve through a rolling sample window
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const PADDING: f64 = 6.0;
pub const DEFAULT_COLOR: &str = "rgba(0, 122, 255, 1)";
pub const DEFAULT_THRESHOLD: f64 = 75.0;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SparklineOptions {
    pub color: String,
    pub show_grid: bool,
    pub show_threshold: bool,
    pub threshold_value: f64,
}

impl Default for SparklineOptions {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            show_grid: true,
            show_threshold: false,
            threshold_value: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One cubic Bezier segment; its start is the previous segment's end
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CubicSegment {
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizontalLine {
    pub x1: f64,
    pub x2: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SparklineGeometry {
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub min: f64,
    pub max: f64,
    pub points: Vec<Point>,
    pub segments: Vec<CubicSegment>,
    pub grid: Option<HorizontalLine>,
    pub threshold: Option<HorizontalLine>,
    pub marker: Point,
}

impl SparklineGeometry {
    /// SVG path data for the stroked curve
    pub fn line_path(&self) -> String {
        let first = self.points[0];
        let mut path = format!("M {},{}", fmt_num(first.x), fmt_num(first.y));
        for s in &self.segments {
            let _ = write!(
                path,
                " C {},{} {},{} {},{}",
                fmt_num(s.c1.x),
                fmt_num(s.c1.y),
                fmt_num(s.c2.x),
                fmt_num(s.c2.y),
                fmt_num(s.end.x),
                fmt_num(s.end.y)
            );
        }
        path
    }

    /// The curve closed down to the bottom edge, for the gradient fill
    pub fn area_path(&self) -> String {
        let first = self.points[0];
        let last = self.marker;
        format!(
            "{} L {},{} L {},{} Z",
            self.line_path(),
            fmt_num(last.x),
            fmt_num(self.height),
            fmt_num(first.x),
            fmt_num(self.height)
        )
    }
}

/// Maps sample values into the drawing box. A flat series gets a unit range
/// centred on its value so it renders at mid-height.
#[derive(Debug, Clone, Copy)]
struct Domain {
    low: f64,
    range: f64,
    inner_height: f64,
}

impl Domain {
    fn new(min: f64, max: f64, inner_height: f64) -> Self {
        let range = max - min;
        if range == 0.0 {
            Self {
                low: min - 0.5,
                range: 1.0,
                inner_height,
            }
        } else {
            Self {
                low: min,
                range,
                inner_height,
            }
        }
    }

    fn y(&self, value: f64) -> f64 {
        let normalized = (value - self.low) / self.range;
        PADDING + self.inner_height - normalized * self.inner_height
    }
}

/// Lay out `data` as a smoothed sparkline. Returns `None` when there is
/// nothing to draw: fewer than two finite samples or a degenerate box.
pub fn render(
    data: &[f64],
    width: f64,
    height: f64,
    options: &SparklineOptions,
) -> Option<SparklineGeometry> {
    if !(width > 0.0 && height > 0.0) {
        return None;
    }
    let inner_width = width - PADDING * 2.0;
    let inner_height = height - PADDING * 2.0;
    if inner_width <= 0.0 || inner_height <= 0.0 {
        return None;
    }

    let valid: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if valid.len() < 2 {
        return None;
    }

    let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let domain = Domain::new(min, max, inner_height);

    let last_index = (valid.len() - 1) as f64;
    let points: Vec<Point> = valid
        .iter()
        .enumerate()
        .map(|(i, &v)| Point::new(PADDING + (i as f64 / last_index) * inner_width, domain.y(v)))
        .collect();

    let segments = smooth(&points);

    let grid = options.show_grid.then(|| HorizontalLine {
        x1: 0.0,
        x2: width,
        y: height / 2.0,
    });
    let show_threshold = options.show_threshold && options.threshold_value.is_finite();
    let threshold = show_threshold.then(|| HorizontalLine {
        x1: 0.0,
        x2: width,
        y: domain.y(options.threshold_value),
    });
    let marker = points[points.len() - 1];

    Some(SparklineGeometry {
        width,
        height,
        color: options.color.clone(),
        min,
        max,
        points,
        segments,
        grid,
        threshold,
        marker,
    })
}

/// Catmull-Rom style tangents expressed as cubic Bezier control points.
/// Neighbours are clamped at both ends, and every segment ends on a sample.
fn smooth(points: &[Point]) -> Vec<CubicSegment> {
    let last = points.len() - 1;
    (0..last)
        .map(|i| {
            let p0 = points[i.saturating_sub(1)];
            let p1 = points[i];
            let p2 = points[i + 1];
            let p3 = points[(i + 2).min(last)];
            CubicSegment {
                c1: Point::new(p1.x + (p2.x - p0.x) / 6.0, p1.y + (p2.y - p0.y) / 6.0),
                c2: Point::new(p2.x - (p3.x - p1.x) / 6.0, p2.y - (p3.y - p1.y) / 6.0),
                end: p2,
            }
        })
        .collect()
}

fn fmt_num(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_fewer_than_two_points_draws_nothing() {
        let opts = SparklineOptions::default();
        assert!(render(&[], 100.0, 40.0, &opts).is_none());
        assert!(render(&[3.0], 100.0, 40.0, &opts).is_none());
        assert!(render(&[f64::NAN, f64::INFINITY, 1.0], 100.0, 40.0, &opts).is_none());
    }

    #[test]
    fn test_degenerate_box_draws_nothing() {
        let opts = SparklineOptions::default();
        assert!(render(&[1.0, 2.0], 0.0, 40.0, &opts).is_none());
        assert!(render(&[1.0, 2.0], 100.0, -1.0, &opts).is_none());
        assert!(render(&[1.0, 2.0], 12.0, 40.0, &opts).is_none());
    }

    #[test]
    fn test_flat_series_renders_mid_height() {
        let geometry =
            render(&[7.0, 7.0, 7.0, 7.0], 100.0, 40.0, &SparklineOptions::default()).unwrap();
        for p in &geometry.points {
            assert!(p.y.is_finite());
            assert!(approx(p.y, 20.0));
        }
        for s in &geometry.segments {
            assert!(approx(s.c1.y, 20.0));
            assert!(approx(s.c2.y, 20.0));
        }
    }

    #[test]
    fn test_curve_passes_through_every_point() {
        let data = [3.0, 9.0, 1.0, 4.0, 4.0, 12.0];
        let geometry = render(&data, 200.0, 60.0, &SparklineOptions::default()).unwrap();
        assert_eq!(geometry.segments.len(), data.len() - 1);
        for (i, segment) in geometry.segments.iter().enumerate() {
            assert_eq!(segment.end, geometry.points[i + 1]);
        }
        assert!(geometry.line_path().starts_with(&format!(
            "M {},{}",
            fmt_num(geometry.points[0].x),
            fmt_num(geometry.points[0].y)
        )));
    }

    #[test]
    fn test_invalid_samples_are_filtered() {
        let data = [1.0, f64::NAN, 2.0, f64::NEG_INFINITY, 3.0];
        let geometry = render(&data, 100.0, 40.0, &SparklineOptions::default()).unwrap();
        assert_eq!(geometry.points.len(), 3);
    }

    #[test]
    fn test_rolling_window_end_to_end() {
        let mut buffer = crate::domain::rolling_buffer::RollingBuffer::new(5);
        for v in [10.0, 20.0, 15.0, 40.0, 5.0, 8.0] {
            buffer.push(v);
        }
        let geometry = render(&buffer.values(), 100.0, 40.0, &SparklineOptions::default()).unwrap();

        assert_eq!(geometry.points.len(), 5);
        assert!(approx(geometry.points[3].y, 40.0 - PADDING));
        assert!(approx(geometry.points[2].y, PADDING));
        assert!(approx(geometry.points[0].x, PADDING));
        assert!(approx(geometry.points[4].x, 100.0 - PADDING));
        assert_eq!(geometry.marker, geometry.points[4]);
    }

    #[test]
    fn test_overlays() {
        let opts = SparklineOptions {
            show_threshold: true,
            threshold_value: 50.0,
            ..SparklineOptions::default()
        };
        let geometry = render(&[0.0, 100.0], 100.0, 40.0, &opts).unwrap();
        assert!(approx(geometry.grid.unwrap().y, 20.0));
        assert!(approx(geometry.threshold.unwrap().y, 20.0));

        let plain = SparklineOptions {
            show_grid: false,
            ..SparklineOptions::default()
        };
        let geometry = render(&[0.0, 100.0], 100.0, 40.0, &plain).unwrap();
        assert!(geometry.grid.is_none());
        assert!(geometry.threshold.is_none());
    }

    #[test]
    fn test_non_finite_threshold_is_skipped() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let opts = SparklineOptions {
                show_threshold: true,
                threshold_value: value,
                ..SparklineOptions::default()
            };
            let geometry = render(&[0.0, 100.0], 100.0, 40.0, &opts).unwrap();
            assert!(geometry.threshold.is_none());
        }
    }

    #[test]
    fn test_area_closes_to_baseline() {
        let geometry = render(&[1.0, 2.0, 3.0], 100.0, 40.0, &SparklineOptions::default()).unwrap();
        let area = geometry.area_path();
        assert!(area.starts_with(&geometry.line_path()));
        assert!(area.ends_with("L 94,40 L 6,40 Z"));
    }
}
