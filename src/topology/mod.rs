extern crate nalgebra as na;
type Vector3 = na::Vector3<f64>;

use std::collections::HashSet;
use std::f64::consts::{FRAC_PI_2, TAU};

use crate::model::{Model, VertexIndex, Index};
use crate::geometry::{normalize_or_z, triangle_normal};
use crate::inertia::center_of_mass;
use crate::config::TopologyParameters;

/// Face of a linked model
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Cyclic vertex sequence without repeats
    pub vertices: Vec<VertexIndex>,
    pub closed: bool,
    /// Outward unit normal
    pub normal: Vector3
}

impl Polygon {
    pub fn order(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the polygon traverses the directed edge from a to b
    pub fn has_edge(&self, a: VertexIndex, b: VertexIndex) -> bool {
        let n = self.vertices.len();
        (0..n).any(|i| self.vertices[i] == a && self.vertices[(i + 1) % n] == b)
    }

    pub fn centroid(&self, model: &Model) -> Vector3 {
        let sum: Vector3 = self.vertices.iter().map(|&v| model.location(v)).sum();
        sum / self.vertices.len().max(1) as f64
    }
}

/// Outward unit normal of every vertex
///
/// Each pair of links at a vertex enclosing an angle between the minimum pair
/// angle and 2π / (valence - 1) contributes the normal of the triangle they
/// span, turned to face away from the center of mass. Vertices without
/// contributing pairs fall back to their direction from the center of mass.
pub fn compute_normals(model: &Model, params: &TopologyParameters) -> Vec<Vector3> {
    let center = center_of_mass(&model.locations());

    model.vertex_indices()
        .map(|v| {
            let location = model.location(v);
            let radial = location - center;
            let neighbors = model.neighbors(v);
            let valence = neighbors.len();

            let mut sum = Vector3::zeros();
            if valence > 1 {
                let max_angle = TAU / (valence - 1) as f64;
                for i in 0..valence {
                    let a = model.location(neighbors[i]);
                    for &k in neighbors.iter().skip(i + 1) {
                        let b = model.location(k);
                        let angle = (a - location).angle(&(b - location));
                        if angle <= params.min_pair_angle || angle >= max_angle {
                            continue;
                        }

                        // Straight pairs span no plane
                        if (a - location).cross(&(b - location)).norm() < 1e-12 {
                            continue;
                        }
                        let normal = triangle_normal(&location, &a, &b);
                        if normal.angle(&radial) > FRAC_PI_2 {
                            sum -= normal;
                        } else {
                            sum += normal;
                        }
                    }
                }
            }

            if sum.norm() < 1e-12 {
                sum = radial;
            }
            normalize_or_z(&sum)
        })
        .collect()
}

/// Outward normal of a closed vertex sequence
///
/// Sums the triangle normals of consecutive vertex triples and orients the
/// result away from the center.
pub fn polygon_normal(model: &Model, vertices: &[VertexIndex], center: &Vector3) -> Vector3 {
    let n = vertices.len();
    let mut sum = Vector3::zeros();
    let mut centroid = Vector3::zeros();
    for i in 0..n {
        let a = model.location(vertices[i]);
        let b = model.location(vertices[(i + 1) % n]);
        let c = model.location(vertices[(i + 2) % n]);
        sum += triangle_normal(&b, &a, &c);
        centroid += a;
    }
    centroid /= n.max(1) as f64;

    let normal = normalize_or_z(&sum);
    if normal.dot(&(centroid - center)) < 0.0 {
        -normal
    } else {
        normal
    }
}

/// Pick the link at `v` turning least from the incoming neighbor slot
///
/// Turning angles are measured counter-clockwise about the vertex normal.
fn next_slot(model: &Model, v: VertexIndex, incoming: usize, normal: &Vector3) -> Option<usize> {
    let location = model.location(v);
    let neighbors = model.neighbors(v);
    let e1 = model.location(neighbors[incoming]) - location;
    let side = normal.cross(&e1);

    neighbors.iter()
        .enumerate()
        .filter(|&(j, _)| j != incoming)
        .map(|(j, &w)| {
            let e2 = model.location(w) - location;
            let angle = e1.angle(&e2);
            let turn = match e2.angle(&side) > FRAC_PI_2 {
                true => TAU - angle,
                false => angle
            };
            (j, turn)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(j, _)| j)
}

/// Find the faces of a linked model
///
/// Starting from every vertex and every link slot taken as the incoming
/// direction, the boundary is walked by repeatedly taking the link turning
/// least from the incoming one. Each directed link is walked at most once per
/// call. A walk ends closed on returning to its start vertex and is abandoned
/// at a dead end, on revisiting any other vertex, on reaching an already
/// walked link, or on reaching the maximum polygon size. Only closed polygons of at least three vertices are
/// returned.
pub fn trace_faces(model: &Model, params: &TopologyParameters) -> Vec<Polygon> {
    let normals = compute_normals(model, params);
    let center = center_of_mass(&model.locations());
    let mut visited: HashSet<(VertexIndex, usize)> = HashSet::new();
    let mut polygons = Vec::new();
    let mut abandoned = 0;

    for start in model.vertex_indices() {
        for first_incoming in 0..model.valence(start) {
            let mut vertices = Vec::new();
            let mut v = start;
            let mut incoming = first_incoming;
            let closed = loop {
                vertices.push(v);
                if vertices.len() >= params.max_links {
                    break false;
                }

                let slot = match next_slot(model, v, incoming, &normals[v.get()]) {
                    Some(slot) => slot,
                    None => break false
                };
                if !visited.insert((v, slot)) {
                    break false;
                }

                let next = model.neighbors(v)[slot];
                if next == start {
                    break true;
                }
                if vertices.contains(&next) {
                    break false;
                }
                incoming = match model.neighbors(next).iter().position(|&w| w == v) {
                    Some(back) => back,
                    None => break false
                };
                v = next;
            };

            if closed && vertices.len() >= 3 {
                let normal = polygon_normal(model, &vertices, &center);
                polygons.push(Polygon {vertices, closed, normal});
            } else {
                abandoned += 1;
            }
        }
    }

    log::debug!("Traced {} polygons, abandoned {} walks", polygons.len(), abandoned);
    polygons
}

pub mod vertex_types;
pub mod analysis;

#[cfg(test)]
mod tests {
    use crate::topology::*;
    use crate::model::solids;
    use itertools::Itertools;

    fn orders(polygons: &[Polygon]) -> Vec<usize> {
        polygons.iter().map(|p| p.order()).sorted().collect()
    }

    #[test]
    fn platonic_faces() {
        let params = TopologyParameters::default();
        assert_eq!(orders(&trace_faces(&solids::tetrahedron(), &params)), vec![3; 4]);
        assert_eq!(orders(&trace_faces(&solids::octahedron(), &params)), vec![3; 8]);
        assert_eq!(orders(&trace_faces(&solids::cube(), &params)), vec![4; 6]);
        assert_eq!(orders(&trace_faces(&solids::icosahedron(), &params)), vec![3; 20]);
        assert_eq!(orders(&trace_faces(&solids::dodecahedron(), &params)), vec![5; 12]);
    }

    #[test]
    fn faces_are_simple_and_outward() {
        let model = solids::cube();
        let polygons = trace_faces(&model, &TopologyParameters::default());
        let mut edges = HashSet::new();
        for polygon in polygons.iter() {
            assert!(polygon.closed);
            assert_eq!(polygon.vertices.iter().unique().count(), polygon.order());
            approx::assert_relative_eq!(polygon.normal.norm(), 1.0, epsilon = 1e-12);
            approx::assert_relative_eq!(polygon.normal, polygon.centroid(&model), epsilon = 1e-12);
            for i in 0..polygon.order() {
                let edge = (polygon.vertices[i], polygon.vertices[(i + 1) % polygon.order()]);
                assert!(polygon.has_edge(edge.0, edge.1));
                // Every directed edge belongs to one face only
                assert!(edges.insert(edge));
            }
        }
        assert_eq!(edges.len(), 2 * model.link_count());
    }

    #[test]
    fn mixed_faces() {
        let mut model = Model::new();
        let apex = model.add_vertex(Vector3::z());
        let base: Vec<VertexIndex> = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)].iter()
            .map(|&(x, y)| model.add_vertex(Vector3::new(x, y, 0.0)))
            .collect();
        for i in 0..4 {
            model.add_link(base[i], base[(i + 1) % 4]).expect("Fresh link");
            model.add_link(apex, base[i]).expect("Fresh link");
        }

        let polygons = trace_faces(&model, &TopologyParameters::default());
        assert_eq!(orders(&polygons), vec![3, 3, 3, 3, 4]);
        let square = polygons.iter().find(|p| p.order() == 4).expect("Base face");
        approx::assert_relative_eq!(square.normal, -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn open_graphs_have_no_faces() {
        let mut model = Model::new();
        let path: Vec<VertexIndex> = (0..5)
            .map(|i| model.add_vertex(Vector3::new(i as f64, (i % 2) as f64, 0.0)))
            .collect();
        for (&a, &b) in path.iter().tuple_windows() {
            model.add_link(a, b).expect("Fresh link");
        }
        assert!(trace_faces(&model, &TopologyParameters::default()).is_empty());
        assert!(trace_faces(&Model::new(), &TopologyParameters::default()).is_empty());
    }

    #[test]
    fn shared_apex_faces_stay_simple() {
        // Two tetrahedra joined at vertex 0
        let mut model = Model::new();
        let apex = model.add_vertex(Vector3::zeros());
        for side in [1.0, -1.0] {
            let base: Vec<VertexIndex> = [(1.0, 1.0), (1.0, -1.0), (-1.0, 0.0)].iter()
                .map(|&(y, z)| model.add_vertex(Vector3::new(side * 1.5, y, z)))
                .collect();
            for i in 0..3 {
                model.add_link(apex, base[i]).expect("Fresh link");
                model.add_link(base[i], base[(i + 1) % 3]).expect("Fresh link");
            }
        }

        let polygons = trace_faces(&model, &TopologyParameters::default());
        for polygon in polygons.iter() {
            assert!(polygon.closed);
            assert!(polygon.order() >= 3);
            assert_eq!(polygon.vertices.iter().unique().count(), polygon.order(), "{:?}", polygon.vertices);
        }
    }

    #[test]
    fn straight_chains_use_radial_normals() {
        let mut model = Model::new();
        let middle = model.add_vertex(Vector3::new(0.0, 2.0, 0.0));
        let left = model.add_vertex(Vector3::new(-1.0, 2.0, 0.0));
        let right = model.add_vertex(Vector3::new(1.0, 2.0, 0.0));
        model.add_vertex(Vector3::new(0.0, -6.0, 0.0));
        model.add_link(middle, left).expect("Fresh link");
        model.add_link(middle, right).expect("Fresh link");

        let normals = compute_normals(&model, &TopologyParameters::default());
        approx::assert_relative_eq!(normals[middle.get()], Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn size_cap() {
        let model = solids::dodecahedron();
        let params = TopologyParameters {max_links: 5, ..TopologyParameters::default()};
        assert!(trace_faces(&model, &params).is_empty());
    }

    #[test]
    fn normals_point_outward() {
        let model = solids::icosahedron();
        let normals = compute_normals(&model, &TopologyParameters::default());
        for (v, normal) in model.vertex_indices().zip(normals.iter()) {
            approx::assert_relative_eq!(*normal, model.location(v).normalize(), epsilon = 1e-10);
        }

        // Lone vertices fall back to their radial direction
        let mut sparse = Model::new();
        sparse.add_vertex(Vector3::new(2.0, 0.0, 0.0));
        sparse.add_vertex(Vector3::new(-2.0, 0.0, 0.0));
        let normals = compute_normals(&sparse, &TopologyParameters::default());
        approx::assert_relative_eq!(normals[0], Vector3::x(), epsilon = 1e-12);
    }
}
