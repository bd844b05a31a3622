use crate::fingerprint::Reference;
use crate::model::solids;

lazy_static! {
    /// Spectra of the Platonic solids, ordered by vertex count
    pub static ref PLATONIC: Vec<Reference> = vec![
        Reference::from_model("tetrahedron", &solids::tetrahedron()),
        Reference::from_model("octahedron", &solids::octahedron()),
        Reference::from_model("cube", &solids::cube()),
        Reference::from_model("icosahedron", &solids::icosahedron()),
        Reference::from_model("dodecahedron", &solids::dodecahedron())
    ];
}
