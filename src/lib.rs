//! Symmetry and topology analysis of polyhedral point models
//!
//! Models are sets of vertices in three dimensions, optionally linked into a
//! network. Point groups are parsed from their labels and expanded onto
//! models, faces and vertex configurations are traced from the link network,
//! and the point group of a linked model is detected from its own topology.

#[macro_use]
extern crate lazy_static;

pub mod index;
pub mod quaternions;
pub mod geometry;
pub mod inertia;
pub mod config;
pub mod model;
pub mod symmetry;
pub mod expansion;
pub mod topology;
pub mod fingerprint;
pub mod detection;
