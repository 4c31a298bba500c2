//! The per-frame driver and its session state machine.
//!
//! ```text
//!  Idle ──start()──▶ WaitingForSession ──session + frame ready──▶ Tracking
//!    │                      │                                        │
//!    └──────────────────────┴──────────────── stop() ───────────────▶ Ended
//! ```
//!
//! Everything is single-threaded and run-to-completion. Host glue calls
//! into the driver for taps, resets, readiness and frame callbacks; none of
//! these can interleave with a running `on_frame`.

use nalgebra::{Isometry3, Matrix4};

use crate::config::PlacementConfig;
use crate::error::{ArError, ArResult};
use crate::host::{FrameHandle, FrameScheduler, FrameSource, LightEstimate, SceneRenderer, TrackingHost};
use crate::input::{ScreenPoint, Viewport};
use crate::placement::PlacementState;
use crate::projection::ViewerPose;
use crate::ray::derive_view_ray;
use crate::reference::{ReferenceFrame, ReferenceFrameTracker};
use crate::transform::depth_corrected;

/// Lifecycle of the AR session as seen by the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    WaitingForSession,
    Tracking,
    Ended,
}

/// What one frame callback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not tracking, or the handle was stale. Nothing rescheduled.
    Ignored,
    /// No pose this frame. Rescheduled without rendering.
    TrackingGap,
    /// Rendered; `placed` tells whether a tap produced a new object.
    Rendered { placed: bool },
}

/// Drives placement and rendering from host frame callbacks.
pub struct FrameLoop<H, S, R> {
    host: H,
    scheduler: S,
    renderer: R,
    config: PlacementConfig,
    state: SessionState,
    session_ready: bool,
    tracker: Option<ReferenceFrameTracker>,
    placement: PlacementState,
    pending_frame: Option<FrameHandle>,
    tracking_acquired: bool,
    light_estimate: Option<LightEstimate>,
    frames_rendered: u64,
}

impl<H, S, R> FrameLoop<H, S, R>
where
    H: TrackingHost,
    S: FrameScheduler,
    R: SceneRenderer,
{
    pub fn new(host: H, scheduler: S, renderer: R, config: PlacementConfig) -> Self {
        let placement = PlacementState::new(&config);
        Self {
            host,
            scheduler,
            renderer,
            config,
            state: SessionState::Idle,
            session_ready: false,
            tracker: None,
            placement,
            pending_frame: None,
            tracking_acquired: false,
            light_estimate: None,
            frames_rendered: 0,
        }
    }

    /// Begin a session. Only meaningful from `Idle`.
    ///
    /// An unsupported host ends the loop for good.
    pub fn start(&mut self) -> ArResult<()> {
        if self.state != SessionState::Idle {
            tracing::warn!(state = ?self.state, "start ignored");
            return Ok(());
        }

        if !self.host.is_supported() {
            self.state = SessionState::Ended;
            tracing::info!("immersive AR unsupported, session ended");
            return Err(ArError::UnsupportedEnvironment(
                "host does not offer immersive-ar sessions".to_string(),
            ));
        }

        self.host.request_session();
        self.host.request_reference_frame();
        self.state = SessionState::WaitingForSession;
        tracing::info!("session requested");
        Ok(())
    }

    /// The host finished creating the session.
    pub fn session_ready(&mut self) {
        if self.state != SessionState::WaitingForSession {
            tracing::warn!(state = ?self.state, "unexpected session readiness");
            return;
        }
        self.session_ready = true;
        self.try_begin_tracking();
    }

    /// The host handed out the reference frame to query poses in.
    pub fn reference_frame_ready(&mut self, frame: ReferenceFrame) {
        if self.state != SessionState::WaitingForSession {
            tracing::warn!(state = ?self.state, "unexpected reference frame");
            return;
        }
        self.tracker = Some(ReferenceFrameTracker::new(frame));
        self.try_begin_tracking();
    }

    fn try_begin_tracking(&mut self) {
        if !self.session_ready || self.tracker.is_none() {
            return;
        }
        self.state = SessionState::Tracking;
        self.pending_frame = Some(self.scheduler.schedule_next());
        tracing::info!("tracking started");
    }

    /// Host reset notification. May arrive between any two frames.
    pub fn reset(&mut self, correction: Option<&Isometry3<f32>>) {
        match self.tracker.as_mut() {
            Some(tracker) => tracker.on_reset(correction),
            None => tracing::warn!("reset before a reference frame exists"),
        }
    }

    /// A tap in normalized device coordinates. Overwrites an unconsumed tap.
    pub fn tap(&mut self, x: f32, y: f32) {
        self.placement.enqueue_click(x, y);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.renderer.resize(viewport);
    }

    /// Resize from a CSS size, capping the pixel ratio at the configured
    /// maximum. Returns the drawing-buffer size handed to the renderer.
    pub fn resize_css(&mut self, css_width: f32, css_height: f32, device_pixel_ratio: f32) -> Viewport {
        let viewport = Viewport::from_css_clamped(
            css_width,
            css_height,
            device_pixel_ratio,
            self.config.max_device_pixel_ratio,
        );
        self.resize(viewport);
        viewport
    }

    /// The frame callback for `handle`.
    pub fn on_frame<F: FrameSource + ?Sized>(&mut self, handle: FrameHandle, frame: &F) -> FrameOutcome {
        if self.state != SessionState::Tracking {
            return FrameOutcome::Ignored;
        }
        if self.pending_frame != Some(handle) {
            tracing::warn!(?handle, "stale frame callback");
            return FrameOutcome::Ignored;
        }
        self.pending_frame = None;

        let pose = self
            .tracker
            .as_ref()
            .and_then(|tracker| frame.viewer_pose(tracker.current_frame()));
        self.light_estimate = frame.light_estimate();

        let outcome = match pose {
            Some(pose) => {
                let placed = self.process_pose(&pose);
                FrameOutcome::Rendered { placed }
            }
            None => {
                tracing::trace!("no viewer pose this frame");
                FrameOutcome::TrackingGap
            }
        };

        if self.state == SessionState::Tracking {
            self.pending_frame = Some(self.scheduler.schedule_next());
        }
        outcome
    }

    fn process_pose(&mut self, pose: &ViewerPose) -> bool {
        if !self.tracking_acquired {
            self.tracking_acquired = true;
            tracing::info!("found a suitable pose");
        }

        let view = pose.view_matrix();

        match derive_view_ray(&pose.projection, &view, ScreenPoint::CENTER.x, ScreenPoint::CENTER.y) {
            Ok(ray) => self.placement.update_marker(&ray),
            Err(err) => {
                tracing::warn!(%err, "cannot aim marker");
                self.placement.hide_marker();
            }
        }

        let mut placed = false;
        if let Some(click) = self.placement.drain_click() {
            match derive_view_ray(&pose.projection, &view, click.x, click.y) {
                Ok(ray) => placed = self.placement.try_place_at(&ray),
                Err(err) => tracing::warn!(%err, x = click.x, y = click.y, "tap ignored"),
            }
        }

        let projection = depth_corrected(&pose.projection, self.config.depth_correction);
        let models: Vec<Matrix4<f32>> = self
            .placement
            .render_transforms()
            .map(|transform| transform.to_matrix())
            .collect();
        self.renderer.submit(&projection, &view, &models);
        self.frames_rendered += 1;

        placed
    }

    /// End the session. Safe from any state and safe to repeat.
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel(handle);
        }
        if self.state == SessionState::Ended {
            return;
        }
        if self.state != SessionState::Idle {
            self.host.end_session();
        }
        self.state = SessionState::Ended;
        tracing::info!(placed = self.placement.placements().len(), "session ended");
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// One-shot flag raised by the first frame with a pose.
    pub fn tracking_acquired(&self) -> bool {
        self.tracking_acquired
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending_frame
    }

    pub fn placement(&self) -> &PlacementState {
        &self.placement
    }

    pub fn reference_frame(&self) -> Option<&ReferenceFrame> {
        self.tracker.as_ref().map(ReferenceFrameTracker::current_frame)
    }

    /// What the most recent frame reported; `None` if it reported nothing.
    pub fn last_light_estimate(&self) -> Option<LightEstimate> {
        self.light_estimate
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
