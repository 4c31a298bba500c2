//! Marker, placed objects and the pending tap.

use nalgebra::{Point3, Vector3};

use crate::config::PlacementConfig;
use crate::input::ScreenPoint;
use crate::ray::{intersect_ground_plane, Ray};
use crate::transform::{compose_placement_transform, Transform};

/// Append-only list of placed object transforms, in placement order.
#[derive(Debug, Clone, Default)]
pub struct PlacementList {
    transforms: Vec<Transform>,
}

impl PlacementList {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, transform: Transform) {
        self.transforms.push(transform);
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transform> {
        self.transforms.iter()
    }

    pub fn as_slice(&self) -> &[Transform] {
        &self.transforms
    }
}

impl<'a> IntoIterator for &'a PlacementList {
    type Item = &'a Transform;
    type IntoIter = std::slice::Iter<'a, Transform>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Everything the frame loop knows about what is on the ground.
///
/// On a ground miss the marker is parked at
/// [`PlacementConfig::marker_miss_position`] instead of carrying a
/// visibility flag. Rendering stays branch-free but relies on the marker
/// being sub-pixel at that distance.
#[derive(Debug, Clone)]
pub struct PlacementState {
    ground_height: f32,
    object_scale: Vector3<f32>,
    marker_scale: Vector3<f32>,
    marker_miss_position: Point3<f32>,
    marker: Transform,
    placements: PlacementList,
    pending_click: Option<ScreenPoint>,
}

impl PlacementState {
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            ground_height: config.ground_height,
            object_scale: config.object_scale,
            marker_scale: config.marker_scale,
            marker_miss_position: config.marker_miss_position,
            marker: compose_placement_transform(config.marker_miss_position, config.marker_scale),
            placements: PlacementList::new(),
            pending_click: None,
        }
    }

    /// Re-aim the marker along `ray`, which should be the screen-center ray.
    pub fn update_marker(&mut self, ray: &Ray) {
        let point =
            intersect_ground_plane(ray, self.ground_height).unwrap_or(self.marker_miss_position);
        self.marker = compose_placement_transform(point, self.marker_scale);
    }

    /// Park the marker at the miss position, for frames where no ray
    /// could be derived at all.
    pub fn hide_marker(&mut self) {
        self.marker = compose_placement_transform(self.marker_miss_position, self.marker_scale);
    }

    /// Place an object where `ray` meets the ground. Returns whether
    /// anything was placed. The pending click is consumed either way.
    pub fn try_place_at(&mut self, ray: &Ray) -> bool {
        self.pending_click = None;

        match intersect_ground_plane(ray, self.ground_height) {
            Some(point) => {
                self.placements
                    .push(compose_placement_transform(point, self.object_scale));
                tracing::debug!(
                    x = point.x,
                    y = point.y,
                    z = point.z,
                    count = self.placements.len(),
                    "object placed"
                );
                true
            }
            None => {
                tracing::debug!("tap ray missed the ground");
                false
            }
        }
    }

    /// Record a tap, replacing any tap not yet consumed.
    pub fn enqueue_click(&mut self, x: f32, y: f32) {
        self.pending_click = Some(ScreenPoint::new(x, y));
    }

    pub fn drain_click(&mut self) -> Option<ScreenPoint> {
        self.pending_click.take()
    }

    pub fn pending_click(&self) -> Option<ScreenPoint> {
        self.pending_click
    }

    pub fn marker(&self) -> &Transform {
        &self.marker
    }

    pub fn placements(&self) -> &PlacementList {
        &self.placements
    }

    /// Marker first, then every placement in order.
    pub fn render_transforms(&self) -> impl Iterator<Item = &Transform> {
        std::iter::once(&self.marker).chain(self.placements.iter())
    }
}

impl Default for PlacementState {
    fn default() -> Self {
        Self::new(&PlacementConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray(origin: (f32, f32, f32), direction: (f32, f32, f32)) -> Ray {
        Ray::new(
            Point3::new(origin.0, origin.1, origin.2),
            Vector3::new(direction.0, direction.1, direction.2),
        )
        .unwrap()
    }

    #[test]
    fn test_drain_with_nothing_pending() {
        let mut state = PlacementState::default();
        assert_eq!(state.drain_click(), None);
        assert_eq!(state.drain_click(), None);
        assert!(state.placements().is_empty());
    }

    #[test]
    fn test_second_click_overwrites_first() {
        let mut state = PlacementState::default();
        state.enqueue_click(0.1, 0.2);
        state.enqueue_click(-0.5, 0.75);
        assert_eq!(state.drain_click(), Some(ScreenPoint::new(-0.5, 0.75)));
        assert_eq!(state.drain_click(), None);
    }

    #[test]
    fn test_misses_leave_list_untouched() {
        let mut state = PlacementState::default();
        state.enqueue_click(0.0, 0.0);

        assert!(!state.try_place_at(&ray((0.0, 1.0, 0.0), (0.0, 0.0, -1.0))));
        assert!(!state.try_place_at(&ray((0.0, 1.0, 0.0), (0.0, 1.0, -1.0))));
        assert!(!state.try_place_at(&ray((0.0, -1.0, 0.0), (0.0, -1.0, 0.0))));

        assert!(state.placements().is_empty());
        assert_eq!(state.drain_click(), None);
    }

    #[test]
    fn test_hits_append_in_order() {
        let mut state = PlacementState::default();
        let targets = [(0.0, -1.0), (2.0, 3.0), (-4.0, 0.5)];

        for (x, z) in targets {
            assert!(state.try_place_at(&ray((x, 5.0, z), (0.0, -1.0, 0.0))));
        }

        assert_eq!(state.placements().len(), targets.len());
        for (placed, (x, z)) in state.placements().iter().zip(targets) {
            assert_eq!(placed.translation, Point3::new(x, 0.0, z));
            assert_eq!(placed.scale, Vector3::repeat(0.1));
        }
    }

    #[test]
    fn test_click_ray_scenario() {
        let mut state = PlacementState::default();
        state.enqueue_click(0.0, 0.0);

        assert!(state.try_place_at(&ray((0.0, 1.0, 0.0), (0.0, -1.0, -1.0))));
        assert_eq!(state.pending_click(), None);

        let placed = state.placements().as_slice()[0].translation;
        assert!((placed - Point3::new(0.0, 0.0, -1.0)).norm() < 1e-5);
    }

    #[test]
    fn test_marker_tracks_hits_and_parks_on_miss() {
        let config = PlacementConfig::default();
        let mut state = PlacementState::new(&config);
        assert_eq!(state.marker().translation, config.marker_miss_position);

        state.update_marker(&ray((1.0, 2.0, 1.0), (0.0, -1.0, 0.0)));
        assert_eq!(state.marker().translation, Point3::new(1.0, 0.0, 1.0));
        assert_eq!(state.marker().scale, config.marker_scale);

        state.update_marker(&ray((1.0, 2.0, 1.0), (1.0, 0.0, 0.0)));
        assert_eq!(state.marker().translation, config.marker_miss_position);
        assert!(state.placements().is_empty());
    }

    #[test]
    fn test_render_transforms_put_marker_first() {
        let mut state = PlacementState::default();
        state.update_marker(&ray((0.0, 1.0, 0.0), (0.0, -1.0, 0.0)));
        state.try_place_at(&ray((3.0, 1.0, 0.0), (0.0, -1.0, 0.0)));

        let order: Vec<_> = state.render_transforms().map(|t| t.translation).collect();
        assert_eq!(order, vec![Point3::origin(), Point3::new(3.0, 0.0, 0.0)]);
    }
}
