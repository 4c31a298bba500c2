//! Tunables for placement and rendering.

use nalgebra::{Point3, Vector3};

/// Upper bound applied to the device pixel ratio on resize.
pub const MAX_DEVICE_PIXEL_RATIO: f32 = 2.0;

/// Where the marker goes when the center ray misses the ground. This does
/// not hide it from the frustum: at this distance a 0.1-unit marker covers
/// far less than a pixel, so it never shows up on screen.
pub const MARKER_MISS_SENTINEL: f32 = 99_999.0;

/// Placement and rendering configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementConfig {
    /// Height of the assumed flat ground plane (world Y).
    pub ground_height: f32,
    /// Scale applied to every placed object.
    pub object_scale: Vector3<f32>,
    /// Scale applied to the aim marker.
    pub marker_scale: Vector3<f32>,
    /// Marker position used on a ground miss.
    pub marker_miss_position: Point3<f32>,
    /// Z scale folded into the projection before rendering.
    pub depth_correction: f32,
    /// Clamp for the device pixel ratio.
    pub max_device_pixel_ratio: f32,
}

impl PlacementConfig {
    pub fn with_ground_height(mut self, ground_height: f32) -> Self {
        self.ground_height = ground_height;
        self
    }

    pub fn with_object_scale(mut self, scale: f32) -> Self {
        self.object_scale = Vector3::repeat(scale);
        self
    }

    pub fn with_marker_scale(mut self, scale: f32) -> Self {
        self.marker_scale = Vector3::repeat(scale);
        self
    }

    pub fn with_max_device_pixel_ratio(mut self, max_ratio: f32) -> Self {
        self.max_device_pixel_ratio = max_ratio;
        self
    }

    pub fn with_depth_correction(mut self, depth_correction: f32) -> Self {
        self.depth_correction = depth_correction;
        self
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            ground_height: 0.0,
            object_scale: Vector3::repeat(0.1),
            marker_scale: Vector3::repeat(0.1),
            marker_miss_position: Point3::new(
                MARKER_MISS_SENTINEL,
                MARKER_MISS_SENTINEL,
                MARKER_MISS_SENTINEL,
            ),
            depth_correction: 0.001,
            max_device_pixel_ratio: MAX_DEVICE_PIXEL_RATIO,
        }
    }
}
