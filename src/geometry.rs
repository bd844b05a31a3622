use thiserror::Error;

extern crate nalgebra as na;
type Matrix3N = na::Matrix3xX<f64>;
type Vector3 = na::Vector3<f64>;

type Vec3StoredBy<S> = na::Matrix<f64, na::Const<3>, na::Const<1>, S>;

#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("Non-finite coordinates encountered in {0}")]
    NonFinite(&'static str),
    #[error("Degenerate geometry: {0}")]
    Degenerate(&'static str)
}

/// Fail fast if any coordinate is NaN or infinite
pub fn ensure_finite(points: &Matrix3N, context: &'static str) -> Result<(), GeometryError> {
    if points.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(GeometryError::NonFinite(context))
    }
}

/// Normalize a vector, falling back to +z for null vectors
pub fn normalize_or_z(v: &Vector3) -> Vector3 {
    v.try_normalize(1e-30).unwrap_or_else(Vector3::z)
}

/// Unit normal of the triangle spanned by a point and two others
///
/// Orientation follows (point - a) × (point - b).
pub fn triangle_normal<S1, S2, S3>(point: &Vec3StoredBy<S1>, a: &Vec3StoredBy<S2>, b: &Vec3StoredBy<S3>) -> Vector3
where S1: na::Storage<f64, na::Const<3>, na::Const<1>>,
    S2: na::Storage<f64, na::Const<3>, na::Const<1>>,
    S3: na::Storage<f64, na::Const<3>, na::Const<1>>
{
    let edge_a = point - a;
    let edge_b = point - b;
    normalize_or_z(&edge_a.cross(&edge_b))
}

/// Reflect a point through the plane with given normal containing origin
pub fn reflect_point(point: &Vector3, normal: &na::Unit<Vector3>, origin: &Vector3) -> Vector3 {
    let relative = point - origin;
    point - 2.0 * relative.dot(normal) * normal.into_inner()
}

/// Root mean square of nearest-neighbor distances from reference points into a cloud
///
/// Each reference point is matched to its closest counterpart, without
/// requiring the matching to be one-to-one.
pub fn nearest_neighbor_rmsd(reference: &Matrix3N, cloud: &Matrix3N) -> f64 {
    if reference.ncols() == 0 || cloud.ncols() == 0 {
        return 0.0;
    }

    let sum_of_squares: f64 = reference.column_iter()
        .map(|r| {
            cloud.column_iter()
                .map(|c| (r - c).norm_squared())
                .fold(f64::INFINITY, f64::min)
        })
        .sum();

    (sum_of_squares / reference.ncols() as f64).sqrt()
}

/// Three-dimensional plane
pub struct Plane {
    /// Normal vector
    pub normal: Vector3,
    /// Offset vector
    pub offset: Vector3
}

impl Plane {
    /// Find the plane of best fit to a cloud of particles
    pub fn fit_matrix(mut cloud: Matrix3N) -> Result<Plane, GeometryError> {
        if cloud.ncols() < 3 {
            return Err(GeometryError::Degenerate("plane fit needs three points"));
        }

        // Remove centroid
        let centroid: Vector3 = cloud.column_sum() / (cloud.ncols() as f64);
        for mut col in cloud.column_iter_mut() {
            col -= centroid;
        }

        // Normal is left singular vector of least singular value
        let u = cloud.svd(true, false).u
            .ok_or(GeometryError::Degenerate("plane fit decomposition"))?;
        // NOTE: guaranteed sorted descending, take last column of u
        let normal: Vector3 = u.column(u.ncols() - 1).into();
        Ok(Plane {normal, offset: centroid})
    }

    /// Find the plane of best fit to a subset of particles in a matrix
    pub fn fit_matrix_points<T: Copy + Into<usize>>(matrix: &Matrix3N, particle_indices: &[T]) -> Result<Plane, GeometryError> {
        let n = particle_indices.len();
        let mut plane_vertices = Matrix3N::zeros(n);
        for (i, &v) in particle_indices.iter().enumerate() {
            plane_vertices.set_column(i, &matrix.column(v.into()));
        }

        Self::fit_matrix(plane_vertices)
    }

    /// Signed distance of a point to the plane
    ///
    /// Points in the halfspace indicated by the plane normal have positive distance.
    pub fn signed_distance<S>(&self, point: &Vec3StoredBy<S>) -> f64 where S: na::Storage<f64, na::Const<3>, na::Const<1>> {
        self.normal.dot(&(point - self.offset))
    }

    /// Root-mean-square deviation of plane fit
    pub fn rmsd<T: Copy + Into<usize>>(&self, cloud: &Matrix3N, vertices: &[T]) -> f64 {
        if vertices.is_empty() {
            return 0.0;
        }

        let sum_of_squares: f64 = vertices.iter()
            .map(|&v| self.signed_distance(&cloud.column(v.into())).powi(2))
            .sum();
        (sum_of_squares / (vertices.len() as f64)).sqrt()
    }
}

/// Whether two axes are parallel or antiparallel within an angular tolerance
pub fn collinear(a: &Vector3, b: &Vector3, tolerance: f64) -> bool {
    let angle = a.angle(b);
    angle < tolerance || (std::f64::consts::PI - angle).abs() < tolerance
}

/// Whether two axes are perpendicular within an angular tolerance
pub fn perpendicular(a: &Vector3, b: &Vector3, tolerance: f64) -> bool {
    (std::f64::consts::FRAC_PI_2 - a.angle(b)).abs() < tolerance
}
