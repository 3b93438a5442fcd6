use geo::{Area, BoundingRect, MultiPolygon};

/// Fixed factor applied to planar (degree²) areas so that footprint sizes are
/// not vanishingly small numbers. It is not a unit conversion.
pub const AREA_SCALE: f64 = 1e10;

/// Shape and size metrics of one footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintShape {
    /// Footprint area over the area of its axis-aligned bounding box, in (0, 1].
    pub rectangularity: f64,
    /// Planar footprint area scaled by [`AREA_SCALE`].
    pub surface_area: f64,
}

/// Compute rectangularity and surface area of a footprint.
///
/// Returns `None` for degenerate footprints (empty, or zero-area bounding box
/// or footprint), for which rectangularity is undefined.
pub fn shape_size(footprint: &MultiPolygon<f64>) -> Option<FootprintShape> {
    let bbox = footprint.bounding_rect()?;
    let bbox_area = bbox.to_polygon().unsigned_area() * AREA_SCALE;
    let surface_area = footprint.unsigned_area() * AREA_SCALE;
    if !(bbox_area > 0.0 && surface_area > 0.0) || !bbox_area.is_finite() { return None }

    Some(FootprintShape {
        rectangularity: (surface_area / bbox_area).min(1.0),
        surface_area,
    })
}

/// Floor area over all levels; `levels` below one count as one.
#[inline]
pub fn total_area(surface_area: f64, levels: i64) -> f64 {
    surface_area * levels.max(1) as f64
}

/// Building-level count from its raw text: integral part of a number, or 1
/// when missing, unparseable or below one.
pub fn parse_levels(raw: Option<&str>) -> i64 {
    raw.and_then(|text| text.trim().parse::<f64>().ok())
        .filter(|levels| levels.is_finite())
        .map(|levels| (levels.trunc() as i64).max(1))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::{polygon, MultiPolygon};

    use super::*;

    fn multi(polygon: geo::Polygon<f64>) -> MultiPolygon<f64> { MultiPolygon::new(vec![polygon]) }

    #[test]
    fn axis_aligned_rectangle_is_fully_rectangular() {
        let rect = multi(polygon![
            (x: 11.0, y: 48.0), (x: 11.0002, y: 48.0), (x: 11.0002, y: 48.0001), (x: 11.0, y: 48.0001),
        ]);
        let shape = shape_size(&rect).unwrap();
        assert_relative_eq!(shape.rectangularity, 1.0, epsilon = 1e-9);
        assert_relative_eq!(shape.surface_area, 0.0002 * 0.0001 * AREA_SCALE, max_relative = 1e-6);
    }

    #[test]
    fn triangle_fills_half_its_box() {
        let triangle = multi(polygon![(x: 0.0, y: 0.0), (x: 1e-4, y: 0.0), (x: 0.0, y: 1e-4)]);
        let shape = shape_size(&triangle).unwrap();
        assert_relative_eq!(shape.rectangularity, 0.5, epsilon = 1e-9);
        assert_relative_eq!(shape.surface_area, 0.5e-8 * AREA_SCALE, max_relative = 1e-9);
    }

    #[test]
    fn l_shape_is_within_unit_interval() {
        let l_shape = multi(polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0),
            (x: 1.0, y: 1.0), (x: 1.0, y: 2.0), (x: 0.0, y: 2.0),
        ]);
        let shape = shape_size(&l_shape).unwrap();
        assert!(shape.rectangularity > 0.0 && shape.rectangularity <= 1.0);
        assert_relative_eq!(shape.rectangularity, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn surface_area_scales_with_planar_area() {
        let small = multi(polygon![(x: 0.0, y: 0.0), (x: 1e-4, y: 0.0), (x: 1e-4, y: 1e-4), (x: 0.0, y: 1e-4)]);
        let large = multi(polygon![(x: 0.0, y: 0.0), (x: 2e-4, y: 0.0), (x: 2e-4, y: 2e-4), (x: 0.0, y: 2e-4)]);
        let ratio = shape_size(&large).unwrap().surface_area / shape_size(&small).unwrap().surface_area;
        assert_relative_eq!(ratio, 4.0, max_relative = 1e-9);
    }

    #[test]
    fn degenerate_footprints() {
        assert!(shape_size(&MultiPolygon::new(vec![])).is_none());
        let flat = multi(polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)]);
        assert!(shape_size(&flat).is_none());
    }

    #[test]
    fn levels_and_total_area() {
        assert_eq!(parse_levels(None), 1);
        assert_eq!(parse_levels(Some("")), 1);
        assert_eq!(parse_levels(Some("3")), 3);
        assert_eq!(parse_levels(Some("2.7")), 2);
        assert_eq!(parse_levels(Some("0")), 1);
        assert_eq!(parse_levels(Some("3;4")), 1);
        assert_eq!(total_area(10.0, 3), 30.0);
        assert_eq!(total_area(10.0, 0), 10.0);
    }
}
