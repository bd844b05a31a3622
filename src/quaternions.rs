extern crate nalgebra as na;

pub type Matrix3N = na::Matrix3xX<f64>;
pub type Vector3 = na::Vector3<f64>;
pub type Quaternion = na::UnitQuaternion<f64>;
pub type Rotation = na::Rotation3<f64>;

use std::f64::consts::{PI, TAU};

/// Axes closer than this to ±z are treated as lying on z
const AXIS_EPSILON: f64 = 1e-10;

pub fn random_rotation() -> Quaternion {
    let random_axis = na::Unit::new_normalize(na::Vector3::new_random() - na::Vector3::repeat(0.5));
    let random_angle = rand::random::<f64>() * TAU;
    Quaternion::from_axis_angle(&random_axis, random_angle)
}

/// Wrap an angle into [-π, π]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut wrapped = angle % TAU;
    if wrapped > PI {
        wrapped -= TAU;
    } else if wrapped < -PI {
        wrapped += TAU;
    }
    wrapped
}

/// Orientation expressed as a unit direction and a rotation about it
///
/// The direction is where the orientation sends +z. The angle is the residual
/// rotation about that direction. A view is interchangeable with a unit
/// quaternion, see [`View::quaternion`] and [`View::from_quaternion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    axis: na::Unit<Vector3>,
    angle: f64
}

impl View {
    /// Construct from direction components and an angle in radians
    ///
    /// A zero-length direction falls back to +z.
    pub fn new(x: f64, y: f64, z: f64, angle: f64) -> View {
        View::from_vector(&Vector3::new(x, y, z), angle)
    }

    pub fn from_vector(direction: &Vector3, angle: f64) -> View {
        let axis = na::Unit::try_new(*direction, AXIS_EPSILON).unwrap_or_else(Vector3::z_axis);
        View {axis, angle: normalize_angle(angle)}
    }

    pub fn axis(&self) -> &na::Unit<Vector3> {
        &self.axis
    }

    pub fn vector(&self) -> Vector3 {
        self.axis.into_inner()
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn is_finite(&self) -> bool {
        self.axis.iter().all(|c| c.is_finite()) && self.angle.is_finite()
    }

    /// Rotation taking +z onto an axis with no twist about it
    fn alignment(axis: &na::Unit<Vector3>) -> Quaternion {
        let flip = || Quaternion::from_axis_angle(&Vector3::y_axis(), PI);

        if axis.z >= 1.0 - AXIS_EPSILON {
            Quaternion::identity()
        } else if axis.z <= -1.0 + AXIS_EPSILON {
            flip()
        } else {
            Quaternion::rotation_between_axis(&Vector3::z_axis(), axis).unwrap_or_else(flip)
        }
    }

    pub fn quaternion(&self) -> Quaternion {
        View::alignment(&self.axis) * Quaternion::from_axis_angle(&Vector3::z_axis(), self.angle)
    }

    pub fn from_quaternion(q: &Quaternion) -> View {
        let axis = na::Unit::new_normalize(q * Vector3::z());
        // What remains after undoing the alignment is a pure rotation about z
        let residual = View::alignment(&axis).inverse() * q;
        let angle = 2.0 * residual.k.atan2(residual.w);
        View {axis, angle: normalize_angle(angle)}
    }

    pub fn rotation(&self) -> Rotation {
        self.quaternion().to_rotation_matrix()
    }

    /// Apply a rotation to this orientation
    pub fn rotate(&self, rotation: &Rotation) -> View {
        let q = Quaternion::from_rotation_matrix(rotation);
        View::from_quaternion(&(q * self.quaternion()))
    }

    /// Angle of the rotation separating two orientations
    pub fn angular_distance(&self, other: &View) -> f64 {
        self.quaternion().angle_to(&other.quaternion())
    }

    /// Euclidean distance between the two view directions
    pub fn distance(&self, other: &View) -> f64 {
        (self.vector() - other.vector()).norm()
    }
}

impl Default for View {
    fn default() -> View {
        View {axis: Vector3::z_axis(), angle: 0.0}
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4} {:.4} {:.4} {:.2}", self.axis.x, self.axis.y, self.axis.z, self.angle.to_degrees())
    }
}

pub fn random_view() -> View {
    View::from_quaternion(&random_rotation())
}
