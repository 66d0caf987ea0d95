//! Polygon annotation parsing.
//!
//! Annotations arrive as XML documents in the layout slide-annotation tools
//! export: any number of `<Coordinates>` groups, each holding `<Coordinate>`
//! elements with floating-point `X`/`Y` attributes in level-0 pixel space.
//! Parsing rescales every coordinate into the pixel space of a target
//! resolution level, so the rasterizer can consume the polygons directly.

use std::fs;
use std::path::Path;

use geo_types::Coord;
use imageproc::point::Point;
use roxmltree::Document;
use tracing::debug;

use crate::{MaskingError, Result};

/// An ordered polygon in a resolution level's integer pixel space.
///
/// Order is document order; it groups the vertices but carries no further
/// meaning. Polygons with fewer than three distinct vertices are degenerate
/// and rasterize to nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polygon {
    points: Vec<Point<i32>>,
}

impl Polygon {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn is_degenerate(&self) -> bool {
        self.fill_points().is_none()
    }

    /// Vertices in the form the polygon filler wants: no repeated vertices,
    /// no explicit closing vertex. Some tools repeat the first vertex at the
    /// end, and coarse-level rescaling can merge several trailing vertices
    /// onto it, so consecutive duplicates and every trailing vertex equal to
    /// the first are collapsed before the degeneracy check. `None` for
    /// degenerate polygons.
    pub(crate) fn fill_points(&self) -> Option<Vec<Point<i32>>> {
        let mut pts: Vec<Point<i32>> = Vec::with_capacity(self.points.len());
        for &p in &self.points {
            if pts.last() != Some(&p) {
                pts.push(p);
            }
        }
        while pts.len() > 1 && pts.last() == pts.first() {
            pts.pop();
        }
        (pts.len() >= 3).then_some(pts)
    }

    /// Closed boundary segments `(from, to)`, including the wrap-around edge.
    pub(crate) fn closed_segments(&self) -> impl Iterator<Item = (Point<i32>, Point<i32>)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }
}

/// Read a slide's annotation file and rescale it into `level` pixel space.
///
/// A missing file is [`MaskingError::AnnotationNotFound`]; callers skip the
/// slide on that. An annotation document with no coordinate groups is an
/// empty vector, not an error.
pub fn read_annotation(path: &Path, level: u32) -> Result<Vec<Polygon>> {
    if !path.is_file() {
        return Err(MaskingError::AnnotationNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let polygons = parse_annotation(&text, level)?;
    debug!(
        "parsed {} polygon(s) from {} at level {level}",
        polygons.len(),
        path.display()
    );
    Ok(polygons)
}

/// Parse an annotation document; each `<Coordinates>` group becomes one
/// [`Polygon`] with coordinates divided by `2^level` and rounded.
pub fn parse_annotation(xml: &str, level: u32) -> Result<Vec<Polygon>> {
    let doc =
        Document::parse(xml).map_err(|e| MaskingError::MalformedAnnotation(e.to_string()))?;

    let mut polygons = Vec::new();
    for group in doc.descendants().filter(|n| n.has_tag_name("Coordinates")) {
        let mut points = Vec::new();
        for node in group.children().filter(|n| n.is_element()) {
            let raw = Coord {
                x: coord_attr(&node, "X")?,
                y: coord_attr(&node, "Y")?,
            };
            points.push(scale_coord(raw, level));
        }
        polygons.push(Polygon::new(points));
    }
    Ok(polygons)
}

fn coord_attr(node: &roxmltree::Node<'_, '_>, name: &str) -> Result<f64> {
    let value = node.attribute(name).ok_or_else(|| {
        MaskingError::MalformedAnnotation(format!("coordinate missing '{name}' attribute"))
    })?;
    value.parse::<f64>().map_err(|_| {
        MaskingError::MalformedAnnotation(format!("non-numeric {name} coordinate '{value}'"))
    })
}

/// The one place rescale rounding happens: divide by the level downsample,
/// round half away from zero.
fn scale_coord(raw: Coord<f64>, level: u32) -> Point<i32> {
    let factor = 2f64.powi(level as i32);
    Point::new((raw.x / factor).round() as i32, (raw.y / factor).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_GROUPS: &str = r#"
        <ASAP_Annotations>
          <Annotations>
            <Annotation>
              <Coordinates>
                <Coordinate Order="0" X="128.0" Y="0.0"/>
                <Coordinate Order="1" X="160.4" Y="0.0"/>
                <Coordinate Order="2" X="160.4" Y="95.9"/>
              </Coordinates>
            </Annotation>
            <Annotation>
              <Coordinates>
                <Coordinate Order="0" X="0" Y="0"/>
                <Coordinate Order="1" X="32" Y="0"/>
                <Coordinate Order="2" X="32" Y="32"/>
                <Coordinate Order="3" X="0" Y="32"/>
              </Coordinates>
            </Annotation>
          </Annotations>
        </ASAP_Annotations>"#;

    #[test]
    fn test_groups_become_polygons() {
        let polygons = parse_annotation(TWO_GROUPS, 0).unwrap();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].points().len(), 3);
        assert_eq!(polygons[1].points().len(), 4);
    }

    #[test]
    fn test_rescale_divides_and_rounds() {
        let polygons = parse_annotation(TWO_GROUPS, 5).unwrap();
        // 128 / 32 = 4; 160.4 / 32 = 5.0125 -> 5; 95.9 / 32 = 2.997 -> 3
        assert_eq!(polygons[0].points()[0], Point::new(4, 0));
        assert_eq!(polygons[0].points()[1], Point::new(5, 0));
        assert_eq!(polygons[0].points()[2], Point::new(5, 3));
    }

    #[test]
    fn test_empty_document_is_empty_not_error() {
        let polygons = parse_annotation("<ASAP_Annotations/>", 6).unwrap();
        assert!(polygons.is_empty());
    }

    #[test]
    fn test_missing_attribute_is_malformed() {
        let xml = r#"<Coordinates><Coordinate X="1.0"/></Coordinates>"#;
        assert!(matches!(
            parse_annotation(xml, 0),
            Err(MaskingError::MalformedAnnotation(_))
        ));
    }

    #[test]
    fn test_non_numeric_attribute_is_malformed() {
        let xml = r#"<Coordinates><Coordinate X="abc" Y="2.0"/></Coordinates>"#;
        assert!(matches!(
            parse_annotation(xml, 0),
            Err(MaskingError::MalformedAnnotation(_))
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_annotation(Path::new("/nonexistent/TS-0042.xml"), 6).unwrap_err();
        assert!(matches!(err, MaskingError::AnnotationNotFound(_)));
    }

    #[test]
    fn test_closing_vertex_is_dropped_for_fill() {
        let poly = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 0),
        ]);
        assert_eq!(poly.fill_points().unwrap().len(), 3);
    }

    #[test]
    fn test_rounding_collapsed_trailing_vertices_are_merged() {
        // at level 6 coordinates divide by 64, so the last two vertices land
        // on the first one; the fill vertices must collapse to the triangle
        let xml = r#"<Coordinates>
            <Coordinate Order="0" X="0" Y="0"/>
            <Coordinate Order="1" X="640" Y="0"/>
            <Coordinate Order="2" X="640" Y="640"/>
            <Coordinate Order="3" X="10" Y="10"/>
            <Coordinate Order="4" X="20" Y="20"/>
        </Coordinates>"#;
        let polygons = parse_annotation(xml, 6).unwrap();
        assert_eq!(polygons[0].points().len(), 5);
        assert_eq!(
            polygons[0].fill_points().unwrap(),
            vec![Point::new(0, 0), Point::new(10, 0), Point::new(10, 10)]
        );
    }

    #[test]
    fn test_consecutive_duplicate_vertices_are_merged() {
        let poly = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(8, 0),
            Point::new(8, 0),
            Point::new(8, 8),
            Point::new(0, 0),
            Point::new(0, 0),
        ]);
        assert_eq!(
            poly.fill_points().unwrap(),
            vec![Point::new(0, 0), Point::new(8, 0), Point::new(8, 8)]
        );
    }

    #[test]
    fn test_degenerate_polygons() {
        assert!(Polygon::new(vec![]).is_degenerate());
        assert!(Polygon::new(vec![Point::new(1, 1), Point::new(2, 2)]).is_degenerate());
        // closed pair: first == last, only two distinct vertices
        assert!(
            Polygon::new(vec![Point::new(1, 1), Point::new(2, 2), Point::new(1, 1)])
                .is_degenerate()
        );
        // many vertices, all on one point
        assert!(Polygon::new(vec![Point::new(3, 3); 5]).is_degenerate());
    }
}
