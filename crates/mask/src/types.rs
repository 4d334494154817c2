use geo_types::{Coord, LineString, Polygon as GeoPolygon};
use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::error::{MaskError, Result};

/// A binary raster (0 or 255) aligned to its source image.
pub type Mask = GrayImage;

/// Canvas dimensions as `(width, height)`, the same order `image` uses.
pub type CanvasSize = (u32, u32);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One annotated region. The ring is implicitly closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Convert to geo-types Polygon for geometric operations
    pub fn to_geo_polygon(&self) -> GeoPolygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect();
        GeoPolygon::new(LineString::new(coords), vec![])
    }

    /// Fewer than three vertices cannot enclose anything.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }

    /// True when some vertex lies outside a `width` x `height` canvas.
    pub fn extends_beyond(&self, (width, height): CanvasSize) -> bool {
        use geo::BoundingRect;
        match self.to_geo_polygon().bounding_rect() {
            Some(rect) => {
                rect.min().x < 0.0
                    || rect.min().y < 0.0
                    || rect.max().x > f64::from(width.saturating_sub(1))
                    || rect.max().y > f64::from(height.saturating_sub(1))
            }
            None => false,
        }
    }
}

/// A single annotation mark. `svg` holds JSON text that decodes to the
/// mark's polygons; it is decoded on demand so one bad mark stays isolated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mark {
    pub svg: Option<String>,
}

impl Mark {
    pub fn new(svg: impl Into<String>) -> Self {
        Self {
            svg: Some(svg.into()),
        }
    }

    /// Decode the `svg` payload into polygons, in document order.
    pub fn polygons(&self, case_id: &str, mark_index: usize) -> Result<Vec<Polygon>> {
        let decode_error = |reason: String| MaskError::PolygonDecode {
            case_id: case_id.to_string(),
            mark_index,
            reason,
        };

        let svg = self
            .svg
            .as_deref()
            .ok_or_else(|| decode_error("mark has no `svg` field".to_string()))?;

        serde_json::from_str::<Vec<Polygon>>(svg).map_err(|e| decode_error(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// The case `number`, used verbatim in file names.
    pub id: String,
    pub marks: Vec<Mark>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationDocument {
    pub cases: Vec<Case>,
    /// Cases dropped during decoding because they carried no `number`.
    pub unnamed_cases: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ])
    }

    #[test]
    fn test_polygon_bounds() {
        let polygon = square(3.0);
        assert!(!polygon.is_degenerate());
        assert!(!polygon.extends_beyond((4, 4)));
        assert!(polygon.extends_beyond((3, 3)));
    }

    #[test]
    fn test_mark_decodes_polygons_in_order() {
        let mark = Mark::new(
            r#"[{"points":[{"x":1,"y":2},{"x":3,"y":4},{"x":5,"y":0}]},
                {"points":[{"x":9.5,"y":9.5}], "label": "extra fields are ignored"}]"#,
        );
        let polygons = mark.polygons("7", 0).expect("Should decode");
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].points[1], Point::new(3.0, 4.0));
        assert!(polygons[1].is_degenerate());
    }

    #[test]
    fn test_mark_decode_failure_names_case_and_mark() {
        let mark = Mark::new("not json");
        let err = mark.polygons("12", 3).unwrap_err();
        match err {
            MaskError::PolygonDecode {
                case_id,
                mark_index,
                ..
            } => {
                assert_eq!(case_id, "12");
                assert_eq!(mark_index, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        let empty = Mark::default();
        assert!(matches!(
            empty.polygons("12", 0),
            Err(MaskError::PolygonDecode { .. })
        ));
    }
}
