use std::collections::HashMap;
use std::f64::consts::PI;

use crate::model::{Model, VertexIndex};
use crate::topology::Polygon;
use crate::geometry::{Plane, GeometryError};
use crate::inertia::center_of_mass;

/// Count, mean and standard deviation of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub count: usize,
    pub mean: f64,
    pub std: f64
}

impl Statistics {
    pub fn from_values<I: IntoIterator<Item=f64>>(values: I) -> Statistics {
        let (count, sum, sum_of_squares) = values.into_iter()
            .fold((0, 0.0, 0.0), |(n, s, s2), x| (n + 1, s + x, s2 + x * x));
        if count == 0 {
            return Statistics {count, mean: 0.0, std: 0.0};
        }

        let mean = sum / count as f64;
        let variance = sum_of_squares / count as f64 - mean * mean;
        Statistics {count, mean, std: variance.max(0.0).sqrt()}
    }
}

/// Statistics of the current link lengths
pub fn link_statistics(model: &Model) -> Statistics {
    Statistics::from_values(model.links().iter().map(|link| {
        let [a, b] = link.vertices();
        (model.location(a) - model.location(b)).norm()
    }))
}

/// Interior angles of a polygon, one per vertex
pub fn polygon_angles(model: &Model, polygon: &Polygon) -> Vec<f64> {
    let n = polygon.order();
    (0..n)
        .map(|i| {
            let previous = model.location(polygon.vertices[(i + n - 1) % n]);
            let current = model.location(polygon.vertices[i]);
            let next = model.location(polygon.vertices[(i + 1) % n]);
            (previous - current).angle(&(next - current))
        })
        .collect()
}

/// Statistics of all polygon interior angles
pub fn polygon_angle_statistics(model: &Model, polygons: &[Polygon]) -> Statistics {
    Statistics::from_values(polygons.iter().flat_map(|p| polygon_angles(model, p)))
}

/// Deviation of a polygon from its regular counterpart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonRegularity {
    /// Standard deviation of the vertex distances from the polygon center
    pub deviation: f64,
    /// Side length of the regular polygon with the mean center distance
    pub spar: f64,
    /// Area of that regular polygon
    pub area: f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct Regularity {
    pub polygons: Vec<PolygonRegularity>,
    /// Root mean square of the per-polygon deviations
    pub deviation: f64,
    pub area: f64,
    /// Sum of the pyramids spanned by each polygon and the model center
    pub volume: f64
}

/// Adherence of the polygons to a constant vertex distance from their centers
///
/// A regular n-gon with side s has area n s² / 4 · sqrt((1 + cos 2π/n) / (1 - cos 2π/n)).
pub fn regularity(model: &Model, polygons: &[Polygon]) -> Regularity {
    let model_center = center_of_mass(&model.locations());
    let mut per_polygon = Vec::with_capacity(polygons.len());
    let mut volume = 0.0;

    for polygon in polygons.iter().filter(|p| p.order() > 2) {
        let center = polygon.centroid(model);
        let distances = Statistics::from_values(
            polygon.vertices.iter().map(|&v| (model.location(v) - center).norm())
        );

        let n = polygon.order() as f64;
        let spar = distances.mean * 2.0 * (PI / n).sin();
        let cosine = (2.0 * PI / n).cos();
        let area = n * spar * spar / 4.0 * ((1.0 + cosine) / (1.0 - cosine)).sqrt();
        volume += area * (center - model_center).norm() / 3.0;

        per_polygon.push(PolygonRegularity {deviation: distances.std, spar, area});
    }

    let deviation = match per_polygon.len() {
        0 => 0.0,
        count => (per_polygon.iter().map(|p| p.deviation.powi(2)).sum::<f64>() / count as f64).sqrt()
    };
    let area = per_polygon.iter().map(|p| p.area).sum();
    log::debug!("Polygon regularity deviation {:.4}, area {:.4}, volume {:.4}", deviation, area, volume);

    Regularity {polygons: per_polygon, deviation, area, volume}
}

/// Root mean square distance of a polygon's vertices from their best fit plane
pub fn planarity(model: &Model, polygon: &Polygon) -> Result<f64, GeometryError> {
    let locations = model.locations();
    let plane = Plane::fit_matrix_points(&locations, &polygon.vertices)?;
    Ok(plane.rmsd(&locations, &polygon.vertices))
}

/// Dual network with a vertex at each polygon center
///
/// Polygons of the given order only, or all closed polygons if no order is
/// given. Dual vertices are linked if their polygons share an edge.
pub fn dual(model: &Model, polygons: &[Polygon], order: Option<usize>) -> Model {
    let selected: Vec<&Polygon> = polygons.iter()
        .filter(|p| p.closed && order.map_or(true, |o| p.order() == o))
        .collect();

    let mut dual = Model::new();
    dual.symmetry = model.symmetry.clone();
    let mut edge_owner: HashMap<(VertexIndex, VertexIndex), VertexIndex> = HashMap::new();
    for polygon in selected.iter() {
        let center = dual.add_vertex(polygon.centroid(model));
        dual.vertex_mut(center).view = crate::quaternions::View::from_vector(&polygon.normal, 0.0);

        let n = polygon.order();
        for i in 0..n {
            edge_owner.insert((polygon.vertices[i], polygon.vertices[(i + 1) % n]), center);
        }
    }

    let mut edges: Vec<_> = edge_owner.iter()
        .filter_map(|(&(a, b), &owner)| edge_owner.get(&(b, a)).map(|&other| (owner, other)))
        .filter(|(owner, other)| owner < other)
        .collect();
    edges.sort();
    for (a, b) in edges {
        if let Err(e) = dual.add_link(a, b) {
            log::debug!("Skipped dual link: {}", e);
        }
    }

    log::debug!("Dual with {} vertices and {} links", dual.vertex_count(), dual.link_count());
    dual
}

#[cfg(test)]
mod tests {
    use crate::topology::analysis::*;
    use crate::topology::trace_faces;
    use crate::config::TopologyParameters;
    use crate::model::solids;

    #[test]
    fn statistics() {
        let stats = Statistics::from_values([1.0, 2.0, 3.0]);
        assert_eq!(stats.count, 3);
        approx::assert_relative_eq!(stats.mean, 2.0);
        approx::assert_relative_eq!(stats.std, (2.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_eq!(Statistics::from_values(Vec::new()).count, 0);
    }

    #[test]
    fn cube_analysis() {
        let model = solids::cube();
        let polygons = trace_faces(&model, &TopologyParameters::default());

        let links = link_statistics(&model);
        assert_eq!(links.count, 12);
        approx::assert_relative_eq!(links.mean, 2.0, epsilon = 1e-12);
        approx::assert_relative_eq!(links.std, 0.0, epsilon = 1e-6);

        let angles = polygon_angle_statistics(&model, &polygons);
        assert_eq!(angles.count, 24);
        approx::assert_relative_eq!(angles.mean, PI / 2.0, epsilon = 1e-12);

        let regular = regularity(&model, &polygons);
        approx::assert_relative_eq!(regular.deviation, 0.0, epsilon = 1e-6);
        approx::assert_relative_eq!(regular.polygons[0].spar, 2.0, epsilon = 1e-12);
        approx::assert_relative_eq!(regular.area, 24.0, epsilon = 1e-10);
        approx::assert_relative_eq!(regular.volume, 8.0, epsilon = 1e-10);

        for polygon in polygons.iter() {
            approx::assert_relative_eq!(planarity(&model, polygon).expect("Square faces"), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn warped_face_planarity() {
        let mut model = solids::cube();
        let polygons = trace_faces(&model, &TopologyParameters::default());
        let face = polygons[0].clone();
        let lifted = face.vertices[0];
        let normal = face.normal;
        model.vertex_mut(lifted).location += 0.4 * normal;
        assert!(planarity(&model, &face).expect("Four points") > 0.05);
    }

    #[test]
    fn dual_of_cube_is_octahedron() {
        let model = solids::cube();
        let polygons = trace_faces(&model, &TopologyParameters::default());
        let octahedron = dual(&model, &polygons, None);
        assert_eq!(octahedron.vertex_count(), 6);
        assert_eq!(octahedron.link_count(), 12);
        assert!(octahedron.vertex_indices().all(|v| octahedron.valence(v) == 4));
        for vertex in octahedron.vertices() {
            approx::assert_relative_eq!(vertex.location.norm(), 1.0, epsilon = 1e-12);
        }

        assert_eq!(dual(&model, &polygons, Some(3)).vertex_count(), 0);
    }
}
