extern crate nalgebra as na;
type Vector3 = na::Vector3<f64>;

use crate::model::Model;
use crate::quaternions::{Rotation, View};
use crate::geometry::{reflect_point, nearest_neighbor_rmsd};

impl Model {
    /// Rotate vertex locations about an origin, views alongside
    pub fn rotate(&mut self, rotation: &Rotation, origin: &Vector3) {
        for vertex in self.vertices.iter_mut() {
            vertex.location = rotation * (vertex.location - origin) + origin;
            vertex.view = vertex.view.rotate(rotation);
        }
    }

    /// Reflect vertex locations through the plane with `normal` containing `origin`
    ///
    /// View directions are mirrored and their angles reversed.
    pub fn reflect(&mut self, normal: &na::Unit<Vector3>, origin: &Vector3) {
        for vertex in self.vertices.iter_mut() {
            vertex.location = reflect_point(&vertex.location, normal, origin);
            let direction = reflect_point(&vertex.view.vector(), normal, &Vector3::zeros());
            vertex.view = View::from_vector(&direction, -vertex.view.angle());
        }
    }

    pub fn translate(&mut self, shift: &Vector3) {
        for vertex in self.vertices.iter_mut() {
            vertex.location += shift;
        }
    }

    /// Nearest neighbor RMSD between the vertices and a rotated copy of them
    pub fn rotate_and_compare(&self, axis: &na::Unit<Vector3>, angle: f64, origin: &Vector3) -> f64 {
        let rotation = Rotation::from_axis_angle(axis, angle);
        let original = self.locations();
        let mut rotated = original.clone();
        for mut col in rotated.column_iter_mut() {
            let moved = rotation * (col.clone_owned() - origin) + origin;
            col.copy_from(&moved);
        }
        nearest_neighbor_rmsd(&rotated, &original)
    }

    /// Nearest neighbor RMSD between the vertices and a mirrored copy of them
    pub fn reflect_and_compare(&self, normal: &na::Unit<Vector3>, origin: &Vector3) -> f64 {
        let original = self.locations();
        let mut reflected = original.clone();
        for mut col in reflected.column_iter_mut() {
            let moved = reflect_point(&col.clone_owned(), normal, origin);
            col.copy_from(&moved);
        }
        nearest_neighbor_rmsd(&reflected, &original)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::*;
    use crate::quaternions::Rotation;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn rotation_about_origin() {
        let mut model = Model::new();
        let v = model.add_vertex(Vector3::new(2.0, 0.0, 1.0));
        model.vertex_mut(v).view = View::new(1.0, 0.0, 0.0, 0.0);

        let quarter = Rotation::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        model.rotate(&quarter, &Vector3::new(1.0, 0.0, 0.0));
        approx::assert_relative_eq!(model.location(v), Vector3::new(1.0, 1.0, 1.0), epsilon = 1e-12);
        approx::assert_relative_eq!(model.vertex(v).view.vector(), Vector3::y(), epsilon = 1e-8);
    }

    #[test]
    fn reflection_is_involution() {
        let mut model = Model::new();
        let v = model.add_vertex(Vector3::new(0.3, -1.0, 2.0));
        model.vertex_mut(v).view = View::new(0.0, 1.0, 1.0, 0.5);
        let original = model.clone();

        let normal = nalgebra::Unit::new_normalize(Vector3::new(1.0, 1.0, 0.0));
        let origin = Vector3::new(0.0, 0.0, 1.0);
        model.reflect(&normal, &origin);
        assert!((model.location(v) - original.location(v)).norm() > 0.1);
        model.reflect(&normal, &origin);
        approx::assert_relative_eq!(model.location(v), original.location(v), epsilon = 1e-12);
        approx::assert_relative_eq!(model.vertex(v).view.vector(), original.vertex(v).view.vector(), epsilon = 1e-8);
        approx::assert_relative_eq!(model.vertex(v).view.angle(), 0.5, epsilon = 1e-12);

        model.translate(&Vector3::x());
        approx::assert_relative_eq!(model.location(v).x, 1.3, epsilon = 1e-12);
    }

    #[test]
    fn transformed_copies() {
        let square = Model::from_locations(&nalgebra::Matrix3xX::from_column_slice(&[
             1.0,  0.0, 0.0,
             0.0,  1.0, 0.0,
            -1.0,  0.0, 0.0,
             0.0, -1.0, 0.0
        ]));
        let origin = Vector3::zeros();
        approx::assert_relative_eq!(square.rotate_and_compare(&Vector3::z_axis(), FRAC_PI_2, &origin), 0.0, epsilon = 1e-12);
        approx::assert_relative_eq!(square.reflect_and_compare(&Vector3::x_axis(), &origin), 0.0, epsilon = 1e-12);
        assert!(square.rotate_and_compare(&Vector3::z_axis(), FRAC_PI_2 / 2.0, &origin) > 0.5);

        let diagonal = nalgebra::Unit::new_normalize(Vector3::new(1.0, 2.0, 0.0));
        assert!(square.reflect_and_compare(&diagonal, &origin) > 0.1);
    }
}
