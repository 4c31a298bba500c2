#![allow(dead_code)]

use arplace_core::{
    FrameHandle, FrameLoop, FrameScheduler, FrameSource, Frustum, LightEstimate, PlacementConfig,
    ReferenceFrame, SceneRenderer, TrackingHost, ViewerPose, Viewport,
};
use nalgebra::{Isometry3, Matrix4, Point3, Vector3};

#[derive(Debug, Default)]
pub struct FakeHost {
    pub unsupported: bool,
    pub session_requests: usize,
    pub frame_requests: usize,
    pub sessions_ended: usize,
}

impl TrackingHost for FakeHost {
    fn is_supported(&self) -> bool {
        !self.unsupported
    }

    fn request_session(&mut self) {
        self.session_requests += 1;
    }

    fn request_reference_frame(&mut self) {
        self.frame_requests += 1;
    }

    fn end_session(&mut self) {
        self.sessions_ended += 1;
    }
}

/// Scheduler driven by hand: the test decides when a frame fires.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pub scheduled: Vec<FrameHandle>,
    pub cancelled: Vec<FrameHandle>,
}

impl ManualScheduler {
    pub fn take_next(&mut self) -> Option<FrameHandle> {
        if self.scheduled.is_empty() {
            None
        } else {
            Some(self.scheduled.remove(0))
        }
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_next(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.scheduled.push(handle);
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        self.scheduled.retain(|h| *h != handle);
        self.cancelled.push(handle);
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub projection: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub models: Vec<Matrix4<f32>>,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub submissions: Vec<Submission>,
    pub viewports: Vec<Viewport>,
}

impl SceneRenderer for RecordingRenderer {
    fn submit(&mut self, projection: &Matrix4<f32>, view: &Matrix4<f32>, models: &[Matrix4<f32>]) {
        self.submissions.push(Submission {
            projection: *projection,
            view: *view,
            models: models.to_vec(),
        });
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewports.push(viewport);
    }
}

/// One host frame. Poses are tracked in the host's native space, which can
/// drift away from the world by `native_from_world`.
#[derive(Debug, Clone)]
pub struct FakeFrame {
    pub world_pose: Option<ViewerPose>,
    pub native_from_world: Isometry3<f32>,
    pub light: Option<LightEstimate>,
}

impl FakeFrame {
    pub fn gap() -> Self {
        Self {
            world_pose: None,
            native_from_world: Isometry3::identity(),
            light: None,
        }
    }

    pub fn looking(eye: Point3<f32>, target: Point3<f32>) -> Self {
        Self {
            world_pose: Some(ViewerPose::look_at(
                Frustum::default().projection_matrix(),
                &eye,
                &target,
                &Vector3::y(),
            )),
            native_from_world: Isometry3::identity(),
            light: None,
        }
    }

    pub fn drifted(mut self, native_from_world: Isometry3<f32>) -> Self {
        self.native_from_world = native_from_world;
        self
    }
}

impl FrameSource for FakeFrame {
    fn viewer_pose(&self, frame: &ReferenceFrame) -> Option<ViewerPose> {
        self.world_pose.map(|pose| {
            let native = self.native_from_world * pose.transform;
            ViewerPose::new(pose.projection, frame.origin_offset().inverse() * native)
        })
    }

    fn light_estimate(&self) -> Option<LightEstimate> {
        self.light
    }
}

pub type TestLoop = FrameLoop<FakeHost, ManualScheduler, RecordingRenderer>;

pub fn new_loop() -> TestLoop {
    FrameLoop::new(
        FakeHost::default(),
        ManualScheduler::default(),
        RecordingRenderer::default(),
        PlacementConfig::default(),
    )
}

/// A loop already in `Tracking` with its first frame scheduled.
pub fn tracking_loop() -> TestLoop {
    let mut frame_loop = new_loop();
    frame_loop.start().expect("fake host supports AR");
    frame_loop.session_ready();
    frame_loop.reference_frame_ready(ReferenceFrame::base());
    frame_loop
}

/// Fire the next scheduled frame.
pub fn step(frame_loop: &mut TestLoop, frame: &FakeFrame) -> arplace_core::FrameOutcome {
    let handle = frame_loop
        .scheduler_mut()
        .take_next()
        .expect("a frame should be scheduled");
    frame_loop.on_frame(handle, frame)
}

pub fn translation_of(matrix: &Matrix4<f32>) -> Point3<f32> {
    Point3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)])
}

pub fn assert_near(actual: Point3<f32>, expected: Point3<f32>) {
    assert!(
        (actual - expected).norm() < 1e-4,
        "expected {expected:?}, got {actual:?}"
    );
}
