use geo::{BooleanOps, Geometry, MultiPolygon};

/// Dissolves every polygonal part into a single multipolygon. Non-polygonal
/// geometries (points, lines) carry no area and are dropped.
pub fn union_all<I>(parts: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = Geometry<f64>>,
{
    parts
        .into_iter()
        .filter_map(polygonal)
        .reduce(|acc, next| acc.union(&next))
        .unwrap_or_else(|| MultiPolygon::new(Vec::new()))
}

fn polygonal(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi) => Some(multi),
        Geometry::Rect(rect) => Some(MultiPolygon::new(vec![rect.to_polygon()])),
        Geometry::Triangle(triangle) => Some(MultiPolygon::new(vec![triangle.to_polygon()])),
        Geometry::GeometryCollection(collection) => {
            let merged = union_all(collection.0);
            (!merged.0.is_empty()).then_some(merged)
        }
        _ => None,
    }
}
