//! Point group detection of linked models
//!
//! Candidate symmetry elements are derived from the model's own topology:
//! mirror planes from links, two-fold axes through link midpoints and
//! n-fold axes through vertices and polygon centers. Each candidate is
//! accepted if the transformed copy of the model lies within a threshold
//! RMSD of the original, relative to the radius of gyration. The accepted
//! elements are then counted by order to classify the group.

extern crate nalgebra as na;
type Vector3 = na::Vector3<f64>;

use std::f64::consts::{PI, TAU};

use crate::model::{Model, Index};
use crate::topology::{Polygon, trace_faces};
use crate::geometry::{GeometryError, normalize_or_z, collinear, perpendicular};
use crate::inertia::{center_of_mass, gyration_radius, orientation_from_axes};
use crate::quaternions::Rotation;
use crate::symmetry::has_reflection;
use crate::fingerprint::spectrum;
use crate::config::{DetectionParameters, Parameters};

/// Accepted mirror plane or rotation axis
///
/// Mirror planes are stored by their normal with order one.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryElement {
    pub axis: Vector3,
    pub order: u32
}

impl SymmetryElement {
    pub fn is_reflection(&self) -> bool {
        self.order == 1
    }
}

/// Result of point group detection
#[derive(Debug, Clone)]
pub struct Symmetry {
    pub label: String,
    /// Rotation bringing the model into the group's standard frame
    pub orientation: Rotation,
    pub handedness: i8,
    pub elements: Vec<SymmetryElement>
}

impl Symmetry {
    fn trivial() -> Symmetry {
        Symmetry {
            label: "C1".to_string(),
            orientation: Rotation::identity(),
            handedness: 0,
            elements: Vec::new()
        }
    }

    /// Number of accepted elements of an order
    pub fn count(&self, order: u32) -> usize {
        count(&self.elements, order)
    }
}

/// Distinct prime factors in ascending order
fn prime_factors(mut n: u32) -> Vec<u32> {
    let mut factors = Vec::new();
    let mut p = 2;
    while p * p <= n {
        if n % p == 0 {
            factors.push(p);
            while n % p == 0 {
                n /= p;
            }
        }
        p += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

struct Detector<'a> {
    model: &'a Model,
    origin: Vector3,
    radius: f64,
    params: &'a DetectionParameters,
    elements: Vec<SymmetryElement>
}

impl<'a> Detector<'a> {
    fn fits_reflection(&self, normal: &Vector3) -> bool {
        match na::Unit::try_new(*normal, 1e-12) {
            Some(normal) => self.model.reflect_and_compare(&normal, &self.origin) / self.radius < self.params.threshold,
            None => {
                log::trace!("Skipped null mirror normal");
                false
            }
        }
    }

    fn fits_rotation(&self, axis: &Vector3, order: u32) -> bool {
        match na::Unit::try_new(*axis, 1e-12) {
            Some(axis) => {
                let angle = TAU / order as f64;
                self.model.rotate_and_compare(&axis, angle, &self.origin) / self.radius < self.params.threshold
            },
            None => {
                log::trace!("Skipped null {}-fold axis", order);
                false
            }
        }
    }

    /// Keep an element unless one of the same order lies along the same line
    fn add(&mut self, axis: &Vector3, order: u32) {
        let axis = normalize_or_z(axis);
        let tolerance = self.params.angular_tolerance;
        let known = self.elements.iter()
            .any(|e| e.order == order && collinear(&e.axis, &axis, tolerance));
        if !known {
            log::debug!("Accepted {}-fold element along {:?}", order, axis.as_slice());
            self.elements.push(SymmetryElement {axis, order});
        }
    }

    /// Test an axis for rotations dividing a valence
    ///
    /// Every prime factor is tried, and the full valence if it is composite.
    /// The highest accepted order is kept.
    fn test_axis(&mut self, axis: &Vector3, valence: usize) {
        if valence < 2 {
            return;
        }

        let valence = valence as u32;
        let factors = prime_factors(valence);
        let mut order = 0;
        for &p in factors.iter() {
            if self.fits_rotation(axis, p) {
                order = p;
            }
        }
        if factors.first() != Some(&valence) && self.fits_rotation(axis, valence) {
            order = valence;
        }

        if order > 1 {
            self.add(axis, order);
        }
    }

    fn collect(&mut self, polygons: &[Polygon]) {
        let model = self.model;
        for link in model.links() {
            let [a, b] = link.vertices();
            let (first, second) = (model.location(a), model.location(b));

            let along = second - first;
            if self.fits_reflection(&along) {
                self.add(&along, 1);
            }
            let across = along.cross(&(first - self.origin));
            if self.fits_reflection(&across) {
                self.add(&across, 1);
            }

            let midpoint = (first + second) / 2.0 - self.origin;
            if self.fits_rotation(&midpoint, 2) {
                self.add(&midpoint, 2);
            }
        }

        for v in model.vertex_indices() {
            let axis = model.location(v) - self.origin;
            self.test_axis(&axis, model.valence(v));
        }

        for polygon in polygons {
            let axis = polygon.centroid(model) - self.origin;
            self.test_axis(&axis, polygon.order());
        }
    }
}

fn count(elements: &[SymmetryElement], order: u32) -> usize {
    elements.iter().filter(|e| e.order == order).count()
}

/// Group label and its primary and secondary axes from accepted elements
fn classify(elements: &[SymmetryElement], tolerance: f64) -> (String, Vector3, Vector3) {
    let mut vecz = Vector3::z();
    let mut vecx = Vector3::x();
    let reflections: Vec<&SymmetryElement> = elements.iter().filter(|e| e.is_reflection()).collect();
    let of_order = |order: u32| elements.iter().filter(move |e| e.order == order);

    let perpendicular_twofold = |z: &Vector3| of_order(2)
        .filter(|e| perpendicular(&e.axis, z, tolerance))
        .last()
        .map(|e| e.axis);

    let suffix = |z: &Vector3, perpendicular_suffix: &'static str, collinear_suffix: &'static str| {
        let mut chosen = "";
        if reflections.iter().any(|r| perpendicular(&r.axis, z, tolerance)) {
            chosen = perpendicular_suffix;
        }
        if reflections.iter().any(|r| collinear(&r.axis, z, tolerance)) {
            chosen = collinear_suffix;
        }
        chosen
    };

    let (n2, n3, n4, n5) = (count(elements, 2), count(elements, 3), count(elements, 4), count(elements, 5));
    let highest = elements.iter().map(|e| e.order).max().unwrap_or(0);

    let label = if n5 > 3 && n3 > 5 && n2 > 7 {
        if let Some(twofold) = of_order(2).next() {
            vecz = twofold.axis;
        }
        for fivefold in of_order(5) {
            let angle = vecz.angle(&fivefold.axis);
            if angle < PI / 5.0 {
                vecx = vecz.cross(&fivefold.axis);
            } else if angle > PI - PI / 5.0 {
                vecx = vecz.cross(&-fivefold.axis);
            }
        }
        format!("I{}", if reflections.is_empty() { "" } else { "h" })
    } else if n4 > 1 && n3 > 2 && n2 > 3 {
        if let Some(fourfold) = of_order(4).next() {
            vecz = fourfold.axis;
        }
        if let Some(other) = of_order(4).filter(|e| perpendicular(&e.axis, &vecz, tolerance)).last() {
            vecx = other.axis;
        }
        format!("O{}", if reflections.is_empty() { "" } else { "h" })
    } else if n3 > 2 && n2 > 1 {
        if let Some(twofold) = of_order(2).next() {
            vecz = twofold.axis;
        }
        if let Some(other) = perpendicular_twofold(&vecz) {
            vecx = other;
        }
        format!("T{}", suffix(&vecz, "d", "h"))
    } else if n2 > 1 {
        let main = match (highest, reflections.first()) {
            (2, Some(mirror)) => of_order(2)
                .find(|e| collinear(&e.axis, &mirror.axis, tolerance) || perpendicular(&e.axis, &mirror.axis, tolerance)),
            _ => of_order(highest).next()
        };
        if let Some(main) = main {
            vecz = main.axis;
        }
        if let Some(other) = perpendicular_twofold(&vecz) {
            vecx = other;
        }
        format!("D{}{}", highest, suffix(&vecz, "d", "h"))
    } else if highest > 0 {
        if let Some(main) = of_order(highest).next() {
            vecz = main.axis;
            if let Some(x) = main.axis.cross(&Vector3::z()).try_normalize(1e-12) {
                vecx = x;
            }
        }
        match highest {
            1 => "Cs".to_string(),
            n => {
                if let Some(mirror) = reflections.iter().find(|r| perpendicular(&r.axis, &vecz, tolerance)) {
                    vecx = mirror.axis;
                }
                format!("C{}{}", n, suffix(&vecz, "v", "h"))
            }
        }
    } else {
        "C1".to_string()
    };

    (label, vecz, vecx)
}

/// Chirality of a linked model without mirror symmetry
///
/// Vertex directions from the center of mass are weighted by the two leading
/// adjacency eigenvectors. The sign of the product of the weighted direction
/// sum with the weighted sum of cross products along links distinguishes
/// mirror images, which share their adjacency spectrum. Models whose label
/// contains a mirror operation, and models with fewer than two vertices, are
/// achiral.
pub fn handedness(model: &Model, label: &str) -> i8 {
    if has_reflection(label) || model.vertex_count() < 2 {
        return 0;
    }

    let (_, vectors) = spectrum(model);
    let center = center_of_mass(&model.locations());
    let directions: Vec<Vector3> = model.vertex_indices()
        .map(|v| normalize_or_z(&(model.location(v) - center)))
        .collect();
    let (first, second) = (vectors.column(0), vectors.column(1));

    let v1: Vector3 = directions.iter()
        .enumerate()
        .map(|(i, d)| d * (first[i] * second[i]))
        .sum();
    let v2: Vector3 = model.vertex_indices()
        .flat_map(|v| model.neighbors(v).iter().map(move |&w| (v.get(), w.get())))
        .map(|(i, k)| directions[i].cross(&directions[k]) * (first[i] * second[k]))
        .sum();

    let product = v1.dot(&v2);
    log::debug!("Handedness product {:.6}", product);
    match product {
        p if p > 0.0 => 1,
        p if p < 0.0 => -1,
        _ => 0
    }
}

/// Detect the point group of a linked model
///
/// Polygons are the model's traced faces and supply candidate axes through
/// their centers. Empty models and models collapsed onto a point are C1.
pub fn find_symmetry(model: &Model, polygons: &[Polygon], params: &DetectionParameters) -> Result<Symmetry, GeometryError> {
    model.ensure_finite()?;
    let locations = model.locations();
    if locations.ncols() == 0 {
        return Ok(Symmetry::trivial());
    }

    let radius = gyration_radius(&locations);
    if radius < 1e-10 {
        return Ok(Symmetry::trivial());
    }

    let mut detector = Detector {
        model,
        origin: center_of_mass(&locations),
        radius,
        params,
        elements: Vec::new()
    };
    detector.collect(polygons);

    let (label, vecz, vecx) = classify(&detector.elements, params.angular_tolerance);
    let orientation = orientation_from_axes(&vecz, &vecx);
    let handedness = handedness(model, &label);
    log::info!("Found point group {} with {} elements", label, detector.elements.len());

    Ok(Symmetry {label, orientation, handedness, elements: detector.elements})
}

/// Detect the point group and rotate the model into its standard frame
///
/// Rotation is about the center of mass. The model's symmetry label and
/// handedness are updated.
pub fn standardize(model: &mut Model, params: &Parameters) -> Result<Symmetry, GeometryError> {
    let polygons = trace_faces(model, &params.topology);
    let symmetry = find_symmetry(model, &polygons, &params.detection)?;

    let center = center_of_mass(&model.locations());
    model.rotate(&symmetry.orientation, &center);
    model.symmetry = symmetry.label.clone();
    model.handedness = symmetry.handedness;
    Ok(symmetry)
}

#[cfg(test)]
mod tests {
    use crate::detection::*;
    use crate::symmetry::SymmetryGroup;
    use crate::expansion::apply_point_group;
    use crate::config::ExpansionParameters;
    use crate::quaternions::{View, random_rotation};
    use crate::model::{VertexIndex, solids};

    fn detect(model: &Model) -> Symmetry {
        let params = Parameters::default();
        let polygons = trace_faces(model, &params.topology);
        find_symmetry(model, &polygons, &params.detection).expect("Finite model")
    }

    fn expanded(label: &str, seeds: &[Vector3]) -> Model {
        let mut model = Model::new();
        for seed in seeds {
            model.add_vertex(*seed);
        }
        let group = SymmetryGroup::new(label).expect("Valid label");
        apply_point_group(&mut model, &group, &Vector3::zeros(), &View::default(), &ExpansionParameters::default()).expect("Finite model");
        model
    }

    fn point_class(label: &str) -> u32 {
        SymmetryGroup::new(label).expect("Detected labels parse").point_class()
    }

    /// Whether every group rotation maps the vertex set onto itself
    fn invariant_under(model: &Model, group: &SymmetryGroup) -> bool {
        let locations = model.locations();
        group.matrices().iter().all(|m| {
            locations.column_iter().all(|c| {
                let image = m * c;
                locations.column_iter().any(|d| (image - d).norm() < 1e-6)
            })
        })
    }

    #[test]
    fn prime_factorization() {
        assert_eq!(prime_factors(1), Vec::<u32>::new());
        assert_eq!(prime_factors(4), vec![2]);
        assert_eq!(prime_factors(5), vec![5]);
        assert_eq!(prime_factors(6), vec![2, 3]);
        assert_eq!(prime_factors(12), vec![2, 3]);
    }

    #[test]
    fn polyhedral_groups() {
        let mut tetrahedron = expanded("T", &[Vector3::new(1.0, 1.0, 1.0)]);
        tetrahedron.link_hull();
        let symmetry = detect(&tetrahedron);
        assert_eq!(symmetry.label, "Td");
        assert_eq!(symmetry.count(3), 4);
        assert_eq!(symmetry.count(2), 3);
        assert_eq!(symmetry.count(1), 6);

        let mut octahedron = expanded("O", &[Vector3::z()]);
        octahedron.link_hull();
        let symmetry = detect(&octahedron);
        assert_eq!(symmetry.label, "Oh");
        assert_eq!(symmetry.count(4), 3);

        let mut icosahedron = expanded("I", &[Vector3::new(1.0 / crate::symmetry::PHI, 1.0, 0.0)]);
        assert_eq!(icosahedron.vertex_count(), 12);
        icosahedron.link_hull();
        let symmetry = detect(&icosahedron);
        assert_eq!(symmetry.label, "Ih");
        assert_eq!(symmetry.count(5), 6);
        assert_eq!(symmetry.count(3), 10);
        assert_eq!(symmetry.count(2), 15);
        assert_eq!(point_class(&symmetry.label), point_class("I"));
    }

    #[test]
    fn dihedral_groups() {
        let mut prism = expanded("D3", &[Vector3::new(1.0, 0.0, 0.8)]);
        assert_eq!(prism.vertex_count(), 6);
        prism.link_hull();
        assert_eq!(prism.link_count(), 9);
        let symmetry = detect(&prism);
        assert_eq!(symmetry.label, "D3h");
        assert_eq!(point_class(&symmetry.label), point_class("D3"));

        let mut disphenoid = expanded("D2", &[Vector3::new(1.0, 0.55, 0.3)]);
        assert_eq!(disphenoid.vertex_count(), 4);
        disphenoid.link_by_distance(3.0);
        assert_eq!(disphenoid.link_count(), 6);
        let symmetry = detect(&disphenoid);
        assert_eq!(symmetry.label, "D2");
        assert_eq!(symmetry.handedness, handedness(&disphenoid, "D2"));
    }

    #[test]
    fn cyclic_groups() {
        for n in [2, 3, 4] {
            let label = format!("C{}", n);
            let mut model = Model::new();
            let apex = model.add_vertex(Vector3::z());
            let base = model.add_vertex(Vector3::x());
            model.add_link(apex, base).expect("Fresh link");
            let group = SymmetryGroup::new(&label).expect("Valid label");
            apply_point_group(&mut model, &group, &Vector3::zeros(), &View::default(), &ExpansionParameters::default()).expect("Finite model");
            assert_eq!(model.vertex_count(), n + 1);

            let symmetry = detect(&model);
            assert_eq!(symmetry.label, format!("C{}v", n));
            assert_eq!(point_class(&symmetry.label), group.point_class());
            assert_eq!(symmetry.handedness, 0);
        }
    }

    #[test]
    fn degenerate_models() {
        assert_eq!(detect(&Model::new()).label, "C1");

        let mut single = Model::new();
        single.add_vertex(Vector3::new(1.0, 2.0, 3.0));
        let symmetry = detect(&single);
        assert_eq!(symmetry.label, "C1");
        approx::assert_relative_eq!(symmetry.orientation, Rotation::identity());

        let mut broken = Model::new();
        broken.add_vertex(Vector3::new(f64::NAN, 0.0, 0.0));
        let result = find_symmetry(&broken, &[], &DetectionParameters::default());
        assert!(matches!(result, Err(GeometryError::NonFinite(_))));
    }

    #[test]
    fn standard_orientations() {
        let params = Parameters::default();
        for (model, label) in [(solids::octahedron(), "O"), (solids::icosahedron(), "I")] {
            let mut model = model;
            let rotation = random_rotation().to_rotation_matrix();
            model.rotate(&rotation, &Vector3::zeros());

            let group = SymmetryGroup::new(label).expect("Valid label");
            assert!(!invariant_under(&model, &group) || rotation.angle() < 1e-3);

            let symmetry = standardize(&mut model, &params).expect("Finite model");
            assert_eq!(model.symmetry, symmetry.label);
            assert_eq!(point_class(&model.symmetry), group.point_class());
            assert!(invariant_under(&model, &group), "{} not in standard frame", label);
        }
    }

    fn helix(turn: f64) -> Model {
        let mut model = Model::new();
        let vertices: Vec<VertexIndex> = (0..7)
            .map(|i| {
                let t = turn * i as f64;
                model.add_vertex(Vector3::new(2.0 * t.cos(), 2.0 * t.sin(), 0.7 * (i as f64 - 3.0)))
            })
            .collect();
        for pair in vertices.windows(2) {
            model.add_link(pair[0], pair[1]).expect("Fresh link");
        }
        model
    }

    #[test]
    fn mirror_images_have_opposite_hands() {
        for turn in [0.6, 1.0, 1.2] {
            let model = helix(turn);
            let hand = handedness(&model, "C1");
            assert_ne!(hand, 0);

            let mut mirrored = model.clone();
            mirrored.reflect(&Vector3::z_axis(), &Vector3::zeros());
            assert_eq!(handedness(&mirrored, "C1"), -hand);
        }
    }

    #[test]
    fn achiral_labels() {
        let model = helix(1.0);
        for label in ["Cs", "C2v", "D3h", "Td", "Oh", "Ih"] {
            assert_eq!(handedness(&model, label), 0);
        }
        let mut single = Model::new();
        single.add_vertex(Vector3::x());
        assert_eq!(handedness(&single, "C1"), 0);
    }
}
