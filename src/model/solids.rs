//! Platonic solids as linked models centered on the origin

extern crate nalgebra as na;
type Vector3 = na::Vector3<f64>;

use crate::model::Model;
use crate::symmetry::PHI;

fn linked(locations: Vec<Vector3>) -> Model {
    let mut model = Model::new();
    for location in locations {
        model.add_vertex(location);
    }
    model.link_hull();
    model
}

fn cube_corners() -> Vec<Vector3> {
    let mut corners = Vec::with_capacity(8);
    for x in [1.0, -1.0] {
        for y in [1.0, -1.0] {
            for z in [1.0, -1.0] {
                corners.push(Vector3::new(x, y, z));
            }
        }
    }
    corners
}

/// Cyclic permutations of (0, a, b) for every sign combination
fn cyclic_triples(a: f64, b: f64) -> Vec<Vector3> {
    let mut triples = Vec::with_capacity(12);
    for sa in [1.0, -1.0] {
        for sb in [1.0, -1.0] {
            triples.push(Vector3::new(0.0, sa * a, sb * b));
            triples.push(Vector3::new(sa * a, sb * b, 0.0));
            triples.push(Vector3::new(sb * b, 0.0, sa * a));
        }
    }
    triples
}

pub fn tetrahedron() -> Model {
    linked(vec![
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(1.0, -1.0, -1.0),
        Vector3::new(-1.0, 1.0, -1.0),
        Vector3::new(-1.0, -1.0, 1.0)
    ])
}

pub fn octahedron() -> Model {
    let mut locations = Vec::with_capacity(6);
    for axis in 0..3 {
        for sign in [1.0, -1.0] {
            let mut location = Vector3::zeros();
            location[axis] = sign;
            locations.push(location);
        }
    }
    linked(locations)
}

pub fn cube() -> Model {
    linked(cube_corners())
}

pub fn icosahedron() -> Model {
    linked(cyclic_triples(1.0, PHI))
}

pub fn dodecahedron() -> Model {
    let mut locations = cube_corners();
    locations.extend(cyclic_triples(1.0 / PHI, PHI));
    linked(locations)
}
