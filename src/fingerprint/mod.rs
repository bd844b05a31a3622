extern crate nalgebra as na;
type DMatrix = na::DMatrix<f64>;
type DVector = na::DVector<f64>;

use crate::model::{Model, Index};
use crate::config::FingerprintParameters;

/// Symmetric 0/1 matrix of linked vertex pairs
pub fn adjacency_matrix(model: &Model) -> DMatrix {
    let n = model.vertex_count();
    let mut adjacency = DMatrix::zeros(n, n);
    for link in model.links() {
        let [a, b] = link.vertices();
        adjacency[(a.get(), b.get())] = 1.0;
        adjacency[(b.get(), a.get())] = 1.0;
    }
    adjacency
}

/// Adjacency eigenvalues in descending order with their eigenvectors as columns
pub fn spectrum(model: &Model) -> (DVector, DMatrix) {
    let n = model.vertex_count();
    if n == 0 {
        return (DVector::zeros(0), DMatrix::zeros(0, 0));
    }

    let decomposition = na::SymmetricEigen::new(adjacency_matrix(model));
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| decomposition.eigenvalues[j].total_cmp(&decomposition.eigenvalues[i]));

    let values = DVector::from_iterator(n, order.iter().map(|&i| decomposition.eigenvalues[i]));
    let mut vectors = DMatrix::zeros(n, n);
    for (column, &i) in order.iter().enumerate() {
        vectors.set_column(column, &decomposition.eigenvectors.column(i));
    }
    (values, vectors)
}

/// Adjacency eigenvalues in descending order
pub fn eigenvalues(model: &Model) -> Vec<f64> {
    spectrum(model).0.iter().copied().collect()
}

/// Whether two descending spectra agree value by value
pub fn match_spectrum(a: &[f64], b: &[f64], tolerance: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < tolerance)
}

/// Named spectrum of a known shape
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub label: String,
    pub eigenvalues: Vec<f64>,
    /// Number of models matched so far
    pub matches: usize
}

impl Reference {
    pub fn new(label: &str, eigenvalues: Vec<f64>) -> Reference {
        Reference {label: label.to_string(), eigenvalues, matches: 0}
    }

    pub fn from_model(label: &str, model: &Model) -> Reference {
        Reference::new(label, eigenvalues(model))
    }
}

/// Ordered collection of references, first match wins
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    pub references: Vec<Reference>
}

impl ReferenceLibrary {
    pub fn new() -> ReferenceLibrary {
        ReferenceLibrary::default()
    }

    /// Library of the five Platonic solids
    pub fn platonic() -> ReferenceLibrary {
        ReferenceLibrary {references: statics::PLATONIC.clone()}
    }

    pub fn push(&mut self, reference: Reference) {
        self.references.push(reference);
    }

    /// Find the first reference with the model's spectrum
    ///
    /// On a match, the reference's counter is incremented and its label is
    /// recorded as the model's shape.
    pub fn classify(&mut self, model: &mut Model, params: &FingerprintParameters) -> Option<String> {
        let spectrum = eigenvalues(model);
        let reference = self.references.iter_mut()
            .find(|r| match_spectrum(&r.eigenvalues, &spectrum, params.tolerance))?;

        reference.matches += 1;
        model.shape = Some(reference.label.clone());
        log::debug!("Model matches {} ({} so far)", reference.label, reference.matches);
        Some(reference.label.clone())
    }
}

pub mod statics;

#[cfg(test)]
mod tests {
    use crate::fingerprint::*;
    use crate::model::solids;

    type Vector3 = nalgebra::Vector3<f64>;

    fn assert_spectrum(model: &Model, expected: &[f64]) {
        let values = eigenvalues(model);
        assert_eq!(values.len(), expected.len());
        for (value, target) in values.iter().zip(expected.iter()) {
            approx::assert_relative_eq!(*value, *target, epsilon = 1e-9);
        }
    }

    #[test]
    fn platonic_spectra() {
        let root5 = 5f64.sqrt();
        assert_spectrum(&solids::tetrahedron(), &[3.0, -1.0, -1.0, -1.0]);
        assert_spectrum(&solids::octahedron(), &[4.0, 0.0, 0.0, 0.0, -2.0, -2.0]);
        assert_spectrum(&solids::cube(), &[3.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0, -3.0]);

        let mut icosahedron = vec![5.0];
        icosahedron.extend([root5; 3]);
        icosahedron.extend([-1.0; 5]);
        icosahedron.extend([-root5; 3]);
        assert_spectrum(&solids::icosahedron(), &icosahedron);

        let mut dodecahedron = vec![3.0];
        dodecahedron.extend([root5; 3]);
        dodecahedron.extend([1.0; 5]);
        dodecahedron.extend([0.0; 4]);
        dodecahedron.extend([-2.0; 4]);
        dodecahedron.extend([-root5; 3]);
        assert_spectrum(&solids::dodecahedron(), &dodecahedron);
    }

    #[test]
    fn eigenvectors_match_eigenvalues() {
        let model = solids::octahedron();
        let adjacency = adjacency_matrix(&model);
        approx::assert_relative_eq!(adjacency.clone(), adjacency.transpose());

        let (values, vectors) = spectrum(&model);
        for i in 0..values.len() {
            let v = vectors.column(i);
            approx::assert_relative_eq!(&adjacency * v, values[i] * v, epsilon = 1e-9);
        }
    }

    #[test]
    fn relabeling_invariance() {
        let cube = solids::cube();
        let mut shuffled = Model::new();
        let order = [5, 2, 7, 0, 3, 6, 1, 4];
        let mut position = [0; 8];
        for (new, &old) in order.iter().enumerate() {
            shuffled.add_vertex(cube.location(old.into()));
            position[old] = new;
        }
        for link in cube.links() {
            let [a, b] = link.vertices();
            shuffled.add_link(position[a.get()].into(), position[b.get()].into()).expect("Fresh link");
        }

        assert!(match_spectrum(&eigenvalues(&cube), &eigenvalues(&shuffled), 1e-9));
    }

    #[test]
    fn classification_counts_matches() {
        let params = FingerprintParameters::default();
        let mut library = ReferenceLibrary::platonic();

        let mut cube = solids::cube();
        assert_eq!(library.classify(&mut cube, &params).as_deref(), Some("cube"));
        assert_eq!(cube.shape.as_deref(), Some("cube"));
        let mut other = solids::cube();
        library.classify(&mut other, &params);

        let counter = |label: &str| library.references.iter()
            .find(|r| r.label == label)
            .map(|r| r.matches);
        assert_eq!(counter("cube"), Some(2));
        assert_eq!(counter("octahedron"), Some(0));

        let mut path = Model::new();
        let a = path.add_vertex(Vector3::zeros());
        let b = path.add_vertex(Vector3::x());
        path.add_link(a, b).expect("Fresh link");
        assert_eq!(library.classify(&mut path, &params), None);
        assert_eq!(path.shape, None);
    }
}
