extern crate nalgebra as na;
type Matrix3N = na::Matrix3xX<f64>;
type Vector3 = na::Vector3<f64>;

use crate::geometry::normalize_or_z;

/// Unweighted centroid of a point cloud
pub fn center_of_mass(particles: &Matrix3N) -> Vector3 {
    if particles.ncols() == 0 {
        return Vector3::zeros();
    }

    particles.column_mean()
}

/// Root mean square distance of the particles from their centroid
pub fn gyration_radius(particles: &Matrix3N) -> f64 {
    if particles.ncols() == 0 {
        return 0.0;
    }

    let center = center_of_mass(particles);
    let sum_of_squares: f64 = particles.column_iter()
        .map(|col| (col - center).norm_squared())
        .sum();
    (sum_of_squares / particles.ncols() as f64).sqrt()
}

pub struct Moments(pub Vector3);
pub struct Axes(pub na::Matrix3<f64>);

/// Principal moments of inertia about the centroid, ascending, with their axes as columns
pub fn moments_axes(particles: &Matrix3N) -> (Moments, Axes) {
    let center = center_of_mass(particles);
    let mut inertial_mat = na::Matrix3::<f64>::zeros();

    for col in particles.column_iter() {
        let r = col - center;
        inertial_mat[(0, 0)] += r.y.powi(2) + r.z.powi(2);
        inertial_mat[(1, 1)] += r.x.powi(2) + r.z.powi(2);
        inertial_mat[(2, 2)] += r.x.powi(2) + r.y.powi(2);

        let xy = r.x * r.y;
        inertial_mat[(1, 0)] -= xy;
        inertial_mat[(0, 1)] -= xy;

        let xz = r.x * r.z;
        inertial_mat[(2, 0)] -= xz;
        inertial_mat[(0, 2)] -= xz;

        let yz = r.y * r.z;
        inertial_mat[(2, 1)] -= yz;
        inertial_mat[(1, 2)] -= yz;
    }

    let decomposition = na::SymmetricEigen::new(inertial_mat);
    let mut order = [0, 1, 2];
    order.sort_by(|&a, &b| decomposition.eigenvalues[a].total_cmp(&decomposition.eigenvalues[b]));

    let moments = Vector3::from_fn(|i, _| decomposition.eigenvalues[order[i]]);
    let columns: Vec<_> = order.iter()
        .map(|&i| decomposition.eigenvectors.column(i).into_owned())
        .collect();

    (Moments(moments), Axes(na::Matrix3::from_columns(&columns)))
}

/// Point minimizing the sum of distances to all particles
///
/// Weiszfeld iteration starting from the centroid, bounded to a fixed number
/// of iterations. Stops once an update moves the estimate less than
/// `tolerance`.
pub fn geometric_median(particles: &Matrix3N, tolerance: f64) -> Vector3 {
    const MAX_ITERATIONS: usize = 1000;

    let mut median = center_of_mass(particles);
    for _ in 0..MAX_ITERATIONS {
        let mut weighted_sum = Vector3::zeros();
        let mut weight_total = 0.0;
        for col in particles.column_iter() {
            let distance = (col - median).norm();
            // Sitting on a particle: Weiszfeld weight is singular, stay put
            if distance < 1e-12 {
                return median;
            }
            weighted_sum += col / distance;
            weight_total += 1.0 / distance;
        }

        if weight_total == 0.0 {
            break;
        }

        let updated = weighted_sum / weight_total;
        let shift = (updated - median).norm();
        median = updated;
        if shift < tolerance {
            break;
        }
    }

    median
}

/// Rotation bringing a primary axis onto +z and a secondary axis into the +x half of the xz-plane
///
/// The primary axis is first tilted onto z about the axis (z_y, -z_x, 0).
/// The tilted secondary axis then fixes the remaining rotation about z.
pub fn orientation_from_axes(primary: &Vector3, secondary: &Vector3) -> na::Rotation3<f64> {
    let z = normalize_or_z(primary);
    let tilt = {
        let tilt_axis = Vector3::new(z.y, -z.x, 0.0);
        match na::Unit::try_new(tilt_axis, 1e-12) {
            Some(axis) => na::Rotation3::from_axis_angle(&axis, z.z.clamp(-1.0, 1.0).acos()),
            // Primary axis lies along ±z
            None if z.z > 0.0 => na::Rotation3::identity(),
            None => na::Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI)
        }
    };

    let x = tilt * secondary;
    let spin = na::Rotation3::from_axis_angle(&Vector3::z_axis(), (-x.y).atan2(x.x));
    spin * tilt
}
