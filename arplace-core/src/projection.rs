//! Viewer poses and projection utilities

use nalgebra::{Isometry3, Matrix4, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Perspective frustum parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Frustum {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            fov_y: std::f32::consts::PI / 3.0, // 60 degrees, roughly a phone camera
            aspect: width as f32 / height.max(1) as f32,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov_y, self.near, self.far)
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// One view of the device for the current frame, expressed in the
/// reference frame it was queried against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerPose {
    /// Host projection, without depth correction.
    pub projection: Matrix4<f32>,
    /// Viewer-to-world rigid transform.
    pub transform: Isometry3<f32>,
}

impl ViewerPose {
    pub fn new(projection: Matrix4<f32>, transform: Isometry3<f32>) -> Self {
        Self {
            projection,
            transform,
        }
    }

    /// Pose of a viewer at `eye` looking at `target`.
    pub fn look_at(
        projection: Matrix4<f32>,
        eye: &Point3<f32>,
        target: &Point3<f32>,
        up: &Vector3<f32>,
    ) -> Self {
        // look_at_rh yields world-to-view; the pose stores its inverse
        let view = Isometry3::look_at_rh(eye, target, up);
        Self::new(projection, view.inverse())
    }

    /// World-to-view matrix (the inverse of the pose transform).
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.transform.inverse().to_homogeneous()
    }

    /// Viewer position in world space.
    pub fn position(&self) -> Point3<f32> {
        Point3::from(self.transform.translation.vector)
    }
}

/// Read a rigid transform out of a column-major 4x4 matrix, as hosts
/// deliver poses and reset offsets. `None` unless the matrix is affine
/// and finite. Any scale or shear in the upper 3x3 is projected away.
pub fn rigid_from_matrix(matrix: &Matrix4<f32>) -> Option<Isometry3<f32>> {
    if !matrix.iter().all(|v| v.is_finite()) {
        return None;
    }
    let bottom = matrix.fixed_view::<1, 4>(3, 0);
    if (bottom - nalgebra::RowVector4::new(0.0, 0.0, 0.0, 1.0)).norm() > 1e-5 {
        return None;
    }

    let rotation = Rotation3::from_matrix(&matrix.fixed_view::<3, 3>(0, 0).into_owned());
    let translation = Translation3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
    Some(Isometry3::from_parts(
        translation,
        UnitQuaternion::from_rotation_matrix(&rotation),
    ))
}
