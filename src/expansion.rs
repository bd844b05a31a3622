extern crate nalgebra as na;
type Vector3 = na::Vector3<f64>;

use crate::model::{Model, VertexIndex, LinkIndex, Index};
use crate::quaternions::{Rotation, View};
use crate::geometry::GeometryError;
use crate::symmetry::SymmetryGroup;
use crate::symmetry::asymmetric_unit::asymmetric_unit_rotation;
use crate::config::ExpansionParameters;

/// Half the smallest vertex separation, or half the radius of a sole vertex
fn overlap_tolerance(model: &Model, origin: &Vector3) -> f64 {
    let locations = model.locations();
    let n = locations.ncols();
    if n < 2 {
        return locations.column_iter()
            .map(|c| (c - origin).norm())
            .next()
            .unwrap_or(0.0) / 2.0;
    }

    let mut minimum = f64::INFINITY;
    for i in 0..n {
        for j in (i + 1)..n {
            minimum = minimum.min((locations.column(i) - locations.column(j)).norm());
        }
    }
    minimum / 2.0
}

/// Group rotation expressed in the frame of a reference orientation
fn conjugate(reference: &Rotation, matrix: &Rotation) -> Rotation {
    reference * matrix * reference.inverse()
}

/// Move a vertex location and its view into the asymmetric unit about origin
///
/// Returns false if no orbit member qualifies, leaving the vertex in place.
fn snap_vertex(model: &mut Model, v: VertexIndex, group: &SymmetryGroup, origin: &Vector3, reference: &Rotation) -> bool {
    let relative = model.location(v) - origin;
    let direction = View::from_vector(&(reference.inverse() * relative), 0.0);
    match asymmetric_unit_rotation(group, &direction) {
        Some(matrix) => {
            let rotation = conjugate(reference, &matrix);
            let vertex = model.vertex_mut(v);
            vertex.location = rotation * relative + origin;
            vertex.view = vertex.view.rotate(&rotation);
            true
        },
        None => {
            log::warn!("ASU view not found for vertex {} in {}", model.vertex(v).id(), group);
            false
        }
    }
}

/// Append a rotated copy of the first `vertex_count` vertices and `link_count` links
fn duplicate(model: &mut Model, vertex_count: usize, link_count: usize, rotation: &Rotation, origin: &Vector3) {
    let offset = model.vertex_count();
    for i in 0..vertex_count {
        let source = model.vertex(VertexIndex::from(i)).clone();
        let copy = model.add_vertex(rotation * (source.location - origin) + origin);
        let vertex = model.vertex_mut(copy);
        vertex.view = source.view.rotate(rotation);
        vertex.selected = source.selected;
        vertex.fom = source.fom;
    }

    for l in 0..link_count {
        let source = model.link(LinkIndex::from(l)).clone();
        let [a, b] = source.vertices();
        let (a, b) = (VertexIndex::from(a.get() + offset), VertexIndex::from(b.get() + offset));
        match model.add_link(a, b) {
            Ok(copy) => {
                let link = model.link_mut(copy);
                link.radius = source.radius;
                link.selected = source.selected;
            },
            Err(e) => log::debug!("Skipped copying link: {}", e)
        }
    }
}

fn expand(
    model: &mut Model,
    group: &SymmetryGroup,
    origin: &Vector3,
    reference: &View,
    snap: bool,
    tolerance: f64
) -> usize {
    let reference = reference.rotation();
    if snap {
        for v in model.vertex_indices() {
            snap_vertex(model, v, group, origin, &reference);
        }
    }

    for operation in group.operations() {
        let vertex_count = model.vertex_count();
        let link_count = model.link_count();
        for power in 1..operation.order {
            // Rotation about the reference-frame axis, followed by the reference rotation
            let rotation = conjugate(&reference, &operation.matrix(power)) * reference;
            duplicate(model, vertex_count, link_count, &rotation, origin);
        }
    }

    let expanded = model.vertex_count();
    let remaining = model.consolidate(tolerance);
    log::info!("Applied {} to model: {} copies consolidated into {} vertices", group, expanded, remaining);
    remaining
}

/// Replicate a model under a point group and merge overlapping copies
///
/// Every generator's non-trivial powers are applied in turn to all vertices
/// and links present before that generator, so counts grow by each
/// generator's order. Each operation rotates about its axis carried into the
/// reference frame and is then followed by the reference rotation itself, all
/// about origin. Copies closer than half the smallest original vertex
/// separation are merged afterwards. If the parameters ask for it, vertices
/// are first moved into the asymmetric unit.
///
/// Groups of order below two leave the model untouched. Returns the resulting
/// vertex count.
pub fn apply_point_group(
    model: &mut Model,
    group: &SymmetryGroup,
    origin: &Vector3,
    reference: &View,
    params: &ExpansionParameters
) -> Result<usize, GeometryError> {
    model.ensure_finite()?;
    if group.order() < 2 || model.is_empty() {
        return Ok(model.vertex_count());
    }

    let tolerance = overlap_tolerance(model, origin);
    Ok(expand(model, group, origin, reference, params.snap_to_asymmetric_unit, tolerance))
}

/// Move every vertex of a model into the group's asymmetric unit about origin
///
/// Returns the number of vertices for which no representative was found.
pub fn find_asymmetric_unit(model: &mut Model, group: &SymmetryGroup, origin: &Vector3) -> Result<usize, GeometryError> {
    model.ensure_finite()?;
    let identity = Rotation::identity();
    let missing = model.vertex_indices()
        .filter(|&v| !snap_vertex(model, v, group, origin, &identity))
        .count();
    Ok(missing)
}

/// Average symmetry mates onto the asymmetric unit and regenerate the rest
///
/// Vertices whose direction from origin already lies in the asymmetric unit
/// (within the symmetrize tolerance) are kept as representatives. Every other vertex is
/// mapped into the asymmetric unit and averaged into the representative with
/// the closest direction. Non-representatives are then deleted and the group
/// applied again.
///
/// Returns the root mean square deviation of the mates from their
/// representatives.
pub fn symmetrize(
    model: &mut Model,
    group: &SymmetryGroup,
    origin: &Vector3,
    params: &ExpansionParameters
) -> Result<f64, GeometryError> {
    model.ensure_finite()?;
    if group.order() < 2 || model.is_empty() {
        return Ok(0.0);
    }

    let overlap = overlap_tolerance(model, origin);
    let n = model.vertex_count();
    let mut mapped: Vec<Vector3> = Vec::with_capacity(n);
    let mut radii: Vec<f64> = Vec::with_capacity(n);
    let mut representative = vec![false; n];
    for v in model.vertex_indices() {
        let relative = model.location(v) - origin;
        let direction = View::from_vector(&relative, 0.0);
        let inside = match asymmetric_unit_rotation(group, &direction) {
            Some(matrix) => matrix * direction.vector(),
            None => direction.vector()
        };
        representative[v.get()] = (inside - direction.vector()).norm() < params.symmetrize_tolerance;
        mapped.push(inside);
        radii.push(relative.norm());
    }

    let members: Vec<usize> = (0..n).filter(|&i| representative[i]).collect();
    if members.is_empty() {
        log::warn!("No vertices found in the asymmetric unit of {}", group);
        return Ok(0.0);
    }

    let mut sums: Vec<Vector3> = members.iter().map(|&i| mapped[i] * radii[i]).collect();
    let mut counts = vec![1usize; members.len()];
    let mut sum_of_squares = 0.0;
    let mut mates = 0;
    for i in (0..n).filter(|&i| !representative[i]) {
        let (closest, distance) = members.iter()
            .enumerate()
            .map(|(k, &m)| (k, (mapped[m] - mapped[i]).norm()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));
        sums[closest] += mapped[i] * radii[i];
        counts[closest] += 1;
        sum_of_squares += (distance * radii[i]).powi(2);
        mates += 1;
    }

    for (k, &m) in members.iter().enumerate() {
        model.vertex_mut(VertexIndex::from(m)).location = origin + sums[k] / counts[k] as f64;
    }

    let deviation = match mates {
        0 => 0.0,
        _ => (sum_of_squares / mates as f64).sqrt()
    };
    log::info!("Symmetrized {} vertices onto {} representatives, deviation {:.4}", n, members.len(), deviation);

    model.retain_vertices(&representative);
    expand(model, group, origin, &View::default(), false, overlap);
    Ok(deviation)
}
