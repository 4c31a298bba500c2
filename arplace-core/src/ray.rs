//! Screen-to-world rays and ground-plane intersection.
//!
//! Everything here is pure: inputs by reference, new values out.

use nalgebra::{Matrix4, Point3, Unit, Vector3, Vector4};

use crate::error::GeometryError;

/// NDC depth at which screen points are unprojected.
const UNPROJECT_DEPTH: f32 = 0.5;

/// Below this `|direction.y|` a ray counts as parallel to the ground. Such a
/// ray would land kilometres away, and matrix round-off keeps a level gaze
/// from ever being exactly zero.
pub const PARALLEL_EPSILON: f32 = 1e-4;

/// A world-space half line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    /// Normalizes `direction`; a zero or non-finite vector is rejected.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Result<Self, GeometryError> {
        if !direction.iter().all(|c| c.is_finite()) {
            return Err(GeometryError::DegenerateRay);
        }
        let direction = Unit::try_new(direction, f32::EPSILON).ok_or(GeometryError::DegenerateRay)?;
        Ok(Self { origin, direction })
    }

    pub fn point_at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction.into_inner() * t
    }
}

/// Cast a ray from the viewer through the NDC point `(screen_x, screen_y)`.
///
/// `view` is the world-to-view matrix; its inverse gives the viewer
/// position, which becomes the ray origin.
pub fn derive_view_ray(
    projection: &Matrix4<f32>,
    view: &Matrix4<f32>,
    screen_x: f32,
    screen_y: f32,
) -> Result<Ray, GeometryError> {
    let inverse_view_projection = (projection * view)
        .try_inverse()
        .ok_or(GeometryError::SingularMatrix)?;
    let view_inverse = view.try_inverse().ok_or(GeometryError::SingularMatrix)?;

    let origin = Point3::new(view_inverse[(0, 3)], view_inverse[(1, 3)], view_inverse[(2, 3)]);

    let clip = Vector4::new(screen_x, screen_y, UNPROJECT_DEPTH, 1.0);
    let target = Point3::from_homogeneous(inverse_view_projection * clip)
        .ok_or(GeometryError::DegenerateRay)?;

    Ray::new(origin, target - origin)
}

/// Intersect `ray` with the horizontal plane `y = ground_height`.
///
/// Only forward hits count: `None` when the ray is (nearly) parallel to the plane,
/// when the plane is behind or at the origin, or when the parameter
/// overflows.
pub fn intersect_ground_plane(ray: &Ray, ground_height: f32) -> Option<Point3<f32>> {
    let dy = ray.direction.y;
    if dy.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t = (ground_height - ray.origin.y) / dy;
    if t.is_finite() && t > 0.0 {
        Some(ray.point_at(t))
    } else {
        None
    }
}
