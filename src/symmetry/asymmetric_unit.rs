extern crate nalgebra as na;
type Vector3 = na::Vector3<f64>;

use std::f64::consts::PI;

use crate::symmetry::{SymmetryGroup, Family, PHI};
use crate::quaternions::{Rotation, View};
use crate::model::Model;

const TOLERANCE: f64 = 1e-10;

/// Whether a group's orbit is reduced by asymmetric unit mapping at all
fn reduces(group: &SymmetryGroup) -> bool {
    group.point_class() >= 102 && !matches!(group.family(), Family::Helical {..})
}

fn direction_in_asymmetric_unit(group: &SymmetryGroup, direction: &Vector3) -> bool {
    if !reduces(group) {
        return true;
    }

    let (x, y, z) = (direction.x, direction.y, direction.z);
    // Resolve the mirror ambiguity first
    if !(x - TOLERANCE >= 0.0 || (x + TOLERANCE >= 0.0 && y >= 0.0)) {
        return false;
    }

    let primary_order = group.operations().first().map_or(1, |op| op.order);
    let within_wedge = || primary_order == 2 || y.abs() <= x * (PI / primary_order as f64).tan() + TOLERANCE;

    match group.family() {
        Family::Cyclic {..} => within_wedge(),
        Family::Dihedral {..} => z + TOLERANCE >= 0.0 && within_wedge(),
        Family::Tetrahedral {..} => y.abs() <= x + TOLERANCE && y.abs() <= z + TOLERANCE,
        Family::Octahedral {..} => y.abs() <= x + TOLERANCE && x <= z + TOLERANCE,
        Family::Icosahedral {rot90: false, ..} => z + TOLERANCE >= 0.0 && y.abs() <= z / PHI - x * PHI + TOLERANCE,
        Family::Icosahedral {rot90: true, ..} => z + TOLERANCE >= 0.0 && y.abs() <= (z / PHI - x) / PHI + TOLERANCE,
        Family::Helical {..} => true
    }
}

/// Whether a view direction lies in the group's asymmetric unit
pub fn in_asymmetric_unit(group: &SymmetryGroup, view: &View) -> bool {
    direction_in_asymmetric_unit(group, &view.vector())
}

/// First orbit matrix mapping a view into the asymmetric unit
///
/// The identity is tried first, so views already inside are left alone.
/// Groups without reduction always yield the identity.
pub fn asymmetric_unit_rotation(group: &SymmetryGroup, view: &View) -> Option<Rotation> {
    if !reduces(group) {
        return Some(Rotation::identity());
    }

    let direction = view.vector();
    group.matrices().iter()
        .find(|m| direction_in_asymmetric_unit(group, &(*m * direction)))
        .copied()
}

/// Representative of a view's orbit inside the group's asymmetric unit
///
/// Returns the view itself if no orbit member qualifies.
pub fn find_asymmetric_unit_view(group: &SymmetryGroup, view: &View) -> View {
    match asymmetric_unit_rotation(group, view) {
        Some(rotation) => view.rotate(&rotation),
        None => {
            log::warn!("ASU view not found for {} in {}", view, group);
            *view
        }
    }
}

/// Orbit member of a view closest in orientation to a reference view
pub fn closest_symmetric_view(group: &SymmetryGroup, reference: &View, view: &View) -> View {
    group.view_orbit(view).into_iter()
        .min_by(|a, b| a.angular_distance(reference).total_cmp(&b.angular_distance(reference)))
        .unwrap_or(*view)
}

/// Map every vertex view of a model into the asymmetric unit
pub fn change_views_to_asymmetric_unit(model: &mut Model, group: &SymmetryGroup) {
    for v in model.vertex_indices() {
        let vertex = model.vertex_mut(v);
        vertex.view = find_asymmetric_unit_view(group, &vertex.view);
    }
}
