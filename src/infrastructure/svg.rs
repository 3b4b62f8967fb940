// SVG serialization for sparkline geometry
use crate::domain::sparkline::SparklineGeometry;
use std::fmt::Write;

const THRESHOLD_STROKE: &str = "rgba(255, 59, 48, 0.4)";

/// Standalone `<svg>` document; `id` keeps the gradient reference unique on a page
pub fn render_svg(geometry: &SparklineGeometry, id: &str) -> String {
    let gradient_id = format!("sparkline-gradient-{}", sanitize_id(id));
    let color = escape_attr(&geometry.color);
    let mut svg = String::with_capacity(1024);

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = geometry.width,
        h = geometry.height
    );
    let _ = write!(
        svg,
        r#"<defs><linearGradient id="{gradient_id}" x1="0%" y1="0%" x2="0%" y2="100%"><stop offset="0%" stop-color="{color}" stop-opacity="0.3"/><stop offset="100%" stop-color="{color}" stop-opacity="0.05"/></linearGradient></defs>"#
    );

    if let Some(grid) = geometry.grid {
        let _ = write!(
            svg,
            r#"<g opacity="0.1"><line x1="{}" y1="{}" x2="{}" y2="{}" stroke="currentColor" stroke-width="0.5"/></g>"#,
            grid.x1, grid.y, grid.x2, grid.y
        );
    }
    if let Some(threshold) = geometry.threshold {
        let _ = write!(
            svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1" stroke-dasharray="2,2"/>"#,
            threshold.x1, threshold.y, threshold.x2, threshold.y, THRESHOLD_STROKE
        );
    }

    let _ = write!(svg, r#"<path d="{}" fill="url(#{gradient_id})"/>"#, geometry.area_path());
    let _ = write!(
        svg,
        r#"<path d="{}" fill="none" stroke="{color}" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"/>"#,
        geometry.line_path()
    );
    let _ = write!(
        svg,
        r#"<circle cx="{}" cy="{}" r="2" fill="{color}"/>"#,
        geometry.marker.x, geometry.marker.y
    );
    svg.push_str("</svg>");
    svg
}

fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
