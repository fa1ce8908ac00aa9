use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Maximum vertex count accepted for a polygon shape.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Polygons with |signed area| below this (in the space the vertices are
/// given in) are rejected as degenerate.
pub const MIN_POLYGON_AREA: f32 = 1e-6;

/// How polygon vertices are interpreted relative to the measured element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexSpace {
    /// Coordinates in `[-0.5, 0.5]`, scaled by the measured width/height.
    Normalized,
    /// Raw pixel offsets from the element center.
    Pixels,
}

/// Collision shape descriptor for a registered body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    /// Rectangle derived from the element's measured bounds.
    Box,
    /// Circle. With `radius_px: None` the radius is half of the smaller
    /// measured dimension.
    Circle { radius_px: Option<f32> },
    /// Convex polygon with at most [`MAX_POLYGON_VERTICES`] vertices.
    /// Winding is normalized internally; callers may supply CW or CCW.
    Polygon {
        vertices: Vec<Vec2>,
        space: VertexSpace,
    },
}

impl BodyShape {
    pub fn circle() -> Self {
        BodyShape::Circle { radius_px: None }
    }

    pub fn circle_with_radius(radius_px: f32) -> Self {
        BodyShape::Circle {
            radius_px: Some(radius_px),
        }
    }

    /// Resolve polygon vertices to pixel offsets from the element center.
    ///
    /// Returns `None` for non-polygon shapes.
    pub(crate) fn polygon_vertices_px(&self, width_px: f32, height_px: f32) -> Option<Vec<Vec2>> {
        let BodyShape::Polygon { vertices, space } = self else {
            return None;
        };
        let resolved = match space {
            VertexSpace::Normalized => vertices
                .iter()
                .map(|v| Vec2::new(v.x * width_px, v.y * height_px))
                .collect(),
            VertexSpace::Pixels => vertices.clone(),
        };
        Some(resolved)
    }
}

/// Signed area of the polygon (shoelace formula). The sign encodes winding;
/// the magnitude is the enclosed area.
pub(crate) fn signed_area(points: &[Vec2]) -> f32 {
    let mut doubled = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        doubled += a.x * b.y - b.x * a.y;
    }
    doubled * 0.5
}

/// Normalize winding to counter-clockwise (positive signed area), rejecting
/// polygons that are too small, too large, or degenerate.
pub(crate) fn normalize_winding(mut points: Vec<Vec2>) -> Option<Vec<Vec2>> {
    if points.len() < 3 || points.len() > MAX_POLYGON_VERTICES {
        return None;
    }
    let area = signed_area(&points);
    if area.abs() < MIN_POLYGON_AREA {
        return None;
    }
    if area < 0.0 {
        points.reverse();
    }
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_ccw() -> Vec<Vec2> {
        vec![
            Vec2::new(-0.5, -0.5),
            Vec2::new(0.5, -0.5),
            Vec2::new(0.5, 0.5),
            Vec2::new(-0.5, 0.5),
        ]
    }

    #[test]
    fn normalized_vertices_scale_by_measured_size() {
        let shape = BodyShape::Polygon {
            vertices: unit_square_ccw(),
            space: VertexSpace::Normalized,
        };
        let px = shape.polygon_vertices_px(100.0, 40.0).unwrap();
        assert_eq!(px[2], Vec2::new(50.0, 20.0));
    }

    #[test]
    fn pixel_vertices_pass_through() {
        let verts = vec![Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 12.0)];
        let shape = BodyShape::Polygon {
            vertices: verts.clone(),
            space: VertexSpace::Pixels,
        };
        assert_eq!(shape.polygon_vertices_px(999.0, 999.0).unwrap(), verts);
    }

    #[test]
    fn clockwise_input_is_reversed() {
        let mut cw = unit_square_ccw();
        cw.reverse();
        let fixed = normalize_winding(cw).unwrap();
        assert!(signed_area(&fixed) > 0.0);
    }

    #[test]
    fn counter_clockwise_input_is_kept() {
        let ccw = unit_square_ccw();
        let out = normalize_winding(ccw.clone()).unwrap();
        assert_eq!(out, ccw);
    }

    #[test]
    fn degenerate_polygons_are_rejected() {
        // Collinear points: zero area.
        let line = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)];
        assert!(normalize_winding(line).is_none());

        // Too few vertices.
        let two = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)];
        assert!(normalize_winding(two).is_none());

        // Too many vertices.
        let many: Vec<Vec2> = (0..9)
            .map(|i| {
                let angle = i as f32 / 9.0 * std::f32::consts::TAU;
                Vec2::new(angle.cos(), angle.sin())
            })
            .collect();
        assert!(normalize_winding(many).is_none());
    }
}
