//! A pretend AR device: a camera walking over a flat floor.
//!
//! It plays every host role the frame loop needs. Session and reference
//! frame requests resolve on the next tick, frame callbacks fire once per
//! tick, and tracking drift can be injected to exercise resets.

use arplace_core::{
    FrameHandle, FrameScheduler, FrameSource, Frustum, LightEstimate, ReferenceFrame,
    TrackingHost, ViewerPose,
};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

use crate::renderer::CELL_ASPECT;

/// Pitch is kept off the vertical so look-at stays well defined.
const PITCH_LIMIT: f32 = 1.4;

/// Ground-truth pose of the handheld device plus its tracking quirks.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    pub position: Point3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub frustum: Frustum,
    /// While set, the device reports no pose.
    pub tracking_lost: bool,
    /// Where the device's own tracking thinks the world is.
    pub native_from_world: Isometry3<f32>,
    drift_count: u32,
}

impl SimulatedDevice {
    pub fn new(eye_height: f32, columns: u16, rows: u16) -> Self {
        let mut frustum = Frustum::new(columns as u32, rows as u32);
        frustum.aspect /= CELL_ASPECT;
        Self {
            position: Point3::new(0.0, eye_height, 0.0),
            yaw: 0.0,
            pitch: -0.6,
            frustum,
            tracking_lost: false,
            native_from_world: Isometry3::identity(),
            drift_count: 0,
        }
    }

    /// Walk relative to the current heading, staying at eye height.
    pub fn walk(&mut self, forward: f32, strafe: f32) {
        let heading = Vector3::new(-self.yaw.sin(), 0.0, -self.yaw.cos());
        let right = Vector3::new(self.yaw.cos(), 0.0, -self.yaw.sin());
        self.position += heading * forward + right * strafe;
    }

    pub fn look(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.frustum.aspect = columns as f32 / (rows.max(1) as f32 * CELL_ASPECT);
    }

    /// Pose in world coordinates, ignoring drift.
    pub fn world_pose(&self) -> ViewerPose {
        let direction = Vector3::new(
            -self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            -self.yaw.cos() * self.pitch.cos(),
        );
        let target = self.position + direction;
        ViewerPose::look_at(
            self.frustum.projection_matrix(),
            &self.position,
            &target,
            &Vector3::y(),
        )
    }

    /// Let the device's tracking jump, as after relocalization. Returns the
    /// correction a host would attach to the reset event for `frame`.
    pub fn drift(&mut self, frame: &ReferenceFrame) -> Isometry3<f32> {
        self.drift_count += 1;
        let step = self.drift_count as f32;
        let jump = Isometry3::from_parts(
            Translation3::new(0.3 * step.sin(), 0.0, 0.2 * step.cos()),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.15 * step),
        );
        self.native_from_world = jump * self.native_from_world;
        frame.origin_offset().inverse() * self.native_from_world
    }

    /// Snapshot handed to the frame callback.
    pub fn frame(&self) -> SimulatedFrame {
        SimulatedFrame {
            world_pose: (!self.tracking_lost).then(|| self.world_pose()),
            native_from_world: self.native_from_world,
            light: LightEstimate {
                intensity: 1.0,
                color: [1.0, 1.0, 1.0],
            },
        }
    }
}

/// One frame of the simulated device.
#[derive(Debug, Clone)]
pub struct SimulatedFrame {
    world_pose: Option<ViewerPose>,
    native_from_world: Isometry3<f32>,
    light: LightEstimate,
}

impl FrameSource for SimulatedFrame {
    fn viewer_pose(&self, frame: &ReferenceFrame) -> Option<ViewerPose> {
        let pose = self.world_pose?;
        let native = self.native_from_world * pose.transform;
        Some(ViewerPose::new(
            pose.projection,
            frame.origin_offset().inverse() * native,
        ))
    }

    fn light_estimate(&self) -> Option<LightEstimate> {
        Some(self.light)
    }
}

/// Session bookkeeping; requests resolve when the app polls them.
#[derive(Debug, Default)]
pub struct SimulatedHost {
    session_requested: bool,
    frame_requested: bool,
    pub active: bool,
}

impl SimulatedHost {
    pub fn take_session_request(&mut self) -> bool {
        std::mem::take(&mut self.session_requested)
    }

    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }
}

impl TrackingHost for SimulatedHost {
    fn is_supported(&self) -> bool {
        true
    }

    fn request_session(&mut self) {
        self.session_requested = true;
    }

    fn request_reference_frame(&mut self) {
        self.frame_requested = true;
    }

    fn end_session(&mut self) {
        self.active = false;
        self.session_requested = false;
        self.frame_requested = false;
    }
}

/// Holds at most one outstanding frame callback.
#[derive(Debug, Default)]
pub struct TickScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl TickScheduler {
    /// The callback to fire this tick, if any.
    pub fn take_due(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for TickScheduler {
    fn schedule_next(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}
