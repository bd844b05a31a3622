extern crate nalgebra as na;
type Vector3 = na::Vector3<f64>;

use std::collections::HashMap;
use std::cmp::Ordering;

use crate::model::{Model, VertexIndex, Index};
use crate::topology::Polygon;

/// Smallest rotation of a code, rotating by whole chunks of digits
pub fn canonical(code: &str, chunk: usize) -> String {
    let chunk = chunk.max(1);
    let n = code.len();
    if n == 0 || n % chunk != 0 {
        return code.to_string();
    }

    (0..n).step_by(chunk)
        .map(|shift| format!("{}{}", &code[shift..], &code[..shift]))
        .min()
        .unwrap_or_else(|| code.to_string())
}

/// Chunks of a code in reverse sequence, each chunk kept intact
fn reverse_chunks(code: &str, chunk: usize) -> String {
    let chunk = chunk.max(1);
    let bytes = code.as_bytes();
    bytes.chunks(chunk)
        .rev()
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect()
}

/// Chirality of a vertex configuration code
///
/// Compares the canonical code with the canonical code of its mirror image,
/// i.e. its chunk sequence reversed. Codes equal to their mirror image are
/// achiral.
pub fn hand(code: &str, chunk: usize) -> i8 {
    let forward = canonical(code, chunk);
    let mirrored = canonical(&reverse_chunks(code, chunk), chunk);
    match forward.cmp(&mirrored) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1
    }
}

/// Canonical description of the faces surrounding a vertex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexType {
    /// Digit string in canonical rotation
    pub code: String,
    /// Digits per link
    pub chunk: usize
}

impl VertexType {
    pub fn hand(&self) -> i8 {
        hand(&self.code, self.chunk)
    }
}

impl std::fmt::Display for VertexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Lookup of polygons by the directed edges they traverse
pub struct EdgeFaces<'a> {
    polygons: &'a [Polygon],
    faces: HashMap<(VertexIndex, VertexIndex), usize>
}

impl<'a> EdgeFaces<'a> {
    pub fn new(polygons: &'a [Polygon]) -> EdgeFaces<'a> {
        let mut faces = HashMap::new();
        for (p, polygon) in polygons.iter().enumerate() {
            let n = polygon.order();
            for i in 0..n {
                faces.insert((polygon.vertices[i], polygon.vertices[(i + 1) % n]), p);
            }
        }
        EdgeFaces {polygons, faces}
    }

    /// Polygon traversing the directed edge from a to b
    pub fn face(&self, a: VertexIndex, b: VertexIndex) -> Option<&'a Polygon> {
        self.faces.get(&(a, b)).map(|&p| &self.polygons[p])
    }

    fn order_digit(&self, a: VertexIndex, b: VertexIndex) -> char {
        self.face(a, b)
            .and_then(|p| std::char::from_digit(p.order() as u32, 10))
            .unwrap_or('0')
    }
}

/// Neighbors of a vertex sorted counter-clockwise about its direction from the center
pub fn ordered_neighbors(model: &Model, v: VertexIndex, normal: &Vector3) -> Vec<VertexIndex> {
    let location = model.location(v);
    let project = |w: VertexIndex| {
        let e = model.location(w) - location;
        e - e.dot(normal) * normal
    };

    let neighbors = model.neighbors(v);
    let reference = match neighbors.first() {
        Some(&w) => project(w),
        None => return Vec::new()
    };

    let mut keyed: Vec<(f64, VertexIndex)> = neighbors.iter()
        .map(|&w| {
            let e = project(w);
            let angle = reference.cross(&e).dot(normal).atan2(reference.dot(&e));
            (angle.rem_euclid(std::f64::consts::TAU), w)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, w)| w).collect()
}

/// Orders of the faces to the right of each link at a vertex
///
/// Links are taken counter-clockwise about the vertex normal. Links without an
/// adjacent face contribute a zero.
pub fn classify_vertex_type(model: &Model, v: VertexIndex, normal: &Vector3, faces: &EdgeFaces) -> VertexType {
    let code: String = ordered_neighbors(model, v, normal).into_iter()
        .map(|w| faces.order_digit(v, w))
        .collect();
    VertexType {code: canonical(&code, 1), chunk: 1}
}

/// Right face order and opposed face order of each link at a vertex
///
/// The opposed face lies across the far end of a link: for a link from v to b
/// whose right face continues to c, it is the face to the right of the first
/// other link at b, counter-clockwise, leading neither back to v nor on to c.
pub fn classify_extended_vertex_type(model: &Model, v: VertexIndex, normals: &[Vector3], faces: &EdgeFaces) -> VertexType {
    let mut code = String::new();
    for b in ordered_neighbors(model, v, &normals[v.get()]) {
        code.push(faces.order_digit(v, b));

        let next = faces.face(v, b).and_then(|polygon| {
            let n = polygon.order();
            polygon.vertices.iter()
                .position(|&u| u == b)
                .map(|i| polygon.vertices[(i + 1) % n])
        });
        let opposed = ordered_neighbors(model, b, &normals[b.get()]).into_iter()
            .find(|&k| k != v && Some(k) != next);
        code.push(match opposed {
            Some(k) => faces.order_digit(b, k),
            None => '0'
        });
    }
    VertexType {code: canonical(&code, 2), chunk: 2}
}

/// Vertex types of all vertices of a model
pub fn vertex_types(model: &Model, normals: &[Vector3], polygons: &[Polygon], extended: bool) -> Vec<VertexType> {
    let faces = EdgeFaces::new(polygons);
    model.vertex_indices()
        .map(|v| match extended {
            true => classify_extended_vertex_type(model, v, normals, &faces),
            false => classify_vertex_type(model, v, &normals[v.get()], &faces)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::topology::vertex_types::*;
    use crate::topology::{compute_normals, trace_faces};
    use crate::config::TopologyParameters;
    use crate::model::solids;

    #[test]
    fn canonical_rotation() {
        assert_eq!(canonical("543", 1), "354");
        assert_eq!(canonical("434", 1), "344");
        assert_eq!(canonical("564534", 2), "345645");
        assert_eq!(canonical("", 1), "");
    }

    #[test]
    fn handedness_of_codes() {
        assert_eq!(hand("345", 1), -1);
        assert_eq!(hand("354", 1), 1);
        assert_eq!(hand("344", 1), 0);
        assert_eq!(hand("3333", 1), 0);
        // Chunks keep their digit order when mirrored
        assert_eq!(hand("344556", 2), -1);
        assert_eq!(hand("344556", 2), -hand(&reverse_chunks("344556", 2), 2));
    }

    #[test]
    fn platonic_vertex_types() {
        let params = TopologyParameters::default();
        let cases = [
            (solids::cube(), "444", "444444"),
            (solids::icosahedron(), "33333", "3333333333"),
            (solids::dodecahedron(), "555", "555555")
        ];
        for (model, simple, extended) in cases {
            let normals = compute_normals(&model, &params);
            let polygons = trace_faces(&model, &params);
            for t in vertex_types(&model, &normals, &polygons, false) {
                assert_eq!(t.code, simple);
                assert_eq!(t.hand(), 0);
            }
            for t in vertex_types(&model, &normals, &polygons, true) {
                assert_eq!(t.code, extended);
            }
        }
    }

    #[test]
    fn pyramid_vertex_types() {
        let mut model = Model::new();
        let apex = model.add_vertex(Vector3::z());
        let base: Vec<VertexIndex> = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)].iter()
            .map(|&(x, y)| model.add_vertex(Vector3::new(x, y, 0.0)))
            .collect();
        for i in 0..4 {
            model.add_link(base[i], base[(i + 1) % 4]).expect("Fresh link");
            model.add_link(apex, base[i]).expect("Fresh link");
        }

        let params = TopologyParameters::default();
        let normals = compute_normals(&model, &params);
        let polygons = trace_faces(&model, &params);
        let types = vertex_types(&model, &normals, &polygons, false);
        assert_eq!(types[apex.get()].code, "3333");
        for &b in base.iter() {
            assert_eq!(types[b.get()].code, "334");
        }
    }
}
