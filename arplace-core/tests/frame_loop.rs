mod common;

use arplace_core::transform::depth_corrected;
use arplace_core::{
    ArError, FrameHandle, FrameLoop, FrameOutcome, LightEstimate, PlacementConfig,
    ReferenceFrame, SessionState, ViewerPose, Viewport,
};
use common::*;
use nalgebra::{Isometry3, Matrix4, Point3, Translation3, UnitQuaternion, Vector3};

fn looking_down_the_hall() -> FakeFrame {
    FakeFrame::looking(Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 0.0, -1.0))
}

#[test]
fn test_unsupported_host_ends_session() {
    let mut frame_loop = new_loop();
    frame_loop.host_mut().unsupported = true;

    let err = frame_loop.start().unwrap_err();
    assert!(matches!(err, ArError::UnsupportedEnvironment(_)));
    assert_eq!(frame_loop.state(), SessionState::Ended);
    assert_eq!(frame_loop.host().session_requests, 0);

    // No retry
    assert!(frame_loop.start().is_ok());
    assert_eq!(frame_loop.state(), SessionState::Ended);
}

#[test]
fn test_tracking_needs_session_and_frame_in_any_order() {
    let mut frame_loop = new_loop();
    assert_eq!(frame_loop.state(), SessionState::Idle);

    frame_loop.start().unwrap();
    assert_eq!(frame_loop.state(), SessionState::WaitingForSession);
    assert_eq!(frame_loop.host().session_requests, 1);
    assert_eq!(frame_loop.host().frame_requests, 1);

    frame_loop.reference_frame_ready(ReferenceFrame::base());
    assert_eq!(frame_loop.state(), SessionState::WaitingForSession);
    assert!(frame_loop.scheduler().scheduled.is_empty());

    frame_loop.session_ready();
    assert_eq!(frame_loop.state(), SessionState::Tracking);
    assert_eq!(frame_loop.scheduler().scheduled.len(), 1);
    assert_eq!(frame_loop.pending_frame(), Some(frame_loop.scheduler().scheduled[0]));
}

#[test]
fn test_frames_before_tracking_are_ignored() {
    let mut frame_loop = new_loop();
    frame_loop.start().unwrap();
    let outcome = frame_loop.on_frame(FrameHandle(1), &looking_down_the_hall());
    assert_eq!(outcome, FrameOutcome::Ignored);
    assert!(frame_loop.renderer().submissions.is_empty());
}

#[test]
fn test_tracking_gap_skips_render_but_reschedules() {
    let mut frame_loop = tracking_loop();

    let outcome = step(&mut frame_loop, &FakeFrame::gap());
    assert_eq!(outcome, FrameOutcome::TrackingGap);
    assert!(frame_loop.renderer().submissions.is_empty());
    assert!(!frame_loop.tracking_acquired());
    assert_eq!(frame_loop.scheduler().scheduled.len(), 1);
}

#[test]
fn test_first_pose_acquires_tracking_and_draws_marker() {
    let mut frame_loop = tracking_loop();

    let outcome = step(&mut frame_loop, &looking_down_the_hall());
    assert_eq!(outcome, FrameOutcome::Rendered { placed: false });
    assert!(frame_loop.tracking_acquired());

    let submission = &frame_loop.renderer().submissions[0];
    assert_eq!(submission.models.len(), 1);
    assert_near(translation_of(&submission.models[0]), Point3::new(0.0, 0.0, -1.0));

    // Still raised after a gap
    step(&mut frame_loop, &FakeFrame::gap());
    assert!(frame_loop.tracking_acquired());
}

#[test]
fn test_tap_places_object_where_the_ray_lands() {
    let mut frame_loop = tracking_loop();
    frame_loop.tap(0.0, 0.0);

    let outcome = step(&mut frame_loop, &looking_down_the_hall());
    assert_eq!(outcome, FrameOutcome::Rendered { placed: true });

    let placements = frame_loop.placement().placements();
    assert_eq!(placements.len(), 1);
    assert_near(placements.as_slice()[0].translation, Point3::new(0.0, 0.0, -1.0));
    assert_eq!(frame_loop.placement().pending_click(), None);

    let submission = frame_loop.renderer().submissions.last().unwrap();
    assert_eq!(submission.models.len(), 2);
    assert_eq!(submission.models[1], placements.as_slice()[0].to_matrix());
}

#[test]
fn test_horizontal_tap_misses_and_is_consumed() {
    let mut frame_loop = tracking_loop();
    let config = PlacementConfig::default();
    frame_loop.tap(0.0, 0.0);

    let level_gaze = FakeFrame::looking(Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 1.0, -1.0));
    let outcome = step(&mut frame_loop, &level_gaze);

    assert_eq!(outcome, FrameOutcome::Rendered { placed: false });
    assert!(frame_loop.placement().placements().is_empty());
    assert_eq!(frame_loop.placement().pending_click(), None);
    assert_eq!(
        frame_loop.placement().marker().translation,
        config.marker_miss_position
    );
}

#[test]
fn test_tap_survives_tracking_gap() {
    let mut frame_loop = tracking_loop();
    frame_loop.tap(0.0, 0.0);

    step(&mut frame_loop, &FakeFrame::gap());
    assert!(frame_loop.placement().pending_click().is_some());

    step(&mut frame_loop, &looking_down_the_hall());
    assert_eq!(frame_loop.placement().placements().len(), 1);
}

#[test]
fn test_second_tap_before_frame_wins() {
    let mut frame_loop = tracking_loop();
    frame_loop.tap(0.9, 0.9);
    frame_loop.tap(0.0, 0.0);

    step(&mut frame_loop, &looking_down_the_hall());
    let placements = frame_loop.placement().placements();
    assert_eq!(placements.len(), 1);
    assert_near(placements.as_slice()[0].translation, Point3::new(0.0, 0.0, -1.0));
}

#[test]
fn test_placements_accumulate_in_tap_order() {
    let mut frame_loop = tracking_loop();
    let taps = [(0.0, 0.0), (0.3, -0.2), (-0.4, -0.5)];

    for (x, y) in taps {
        frame_loop.tap(x, y);
        step(&mut frame_loop, &looking_down_the_hall());
    }

    let placements = frame_loop.placement().placements();
    assert_eq!(placements.len(), taps.len());
    assert!(placements.as_slice()[1].translation.x > 0.0);
    assert!(placements.as_slice()[2].translation.x < 0.0);

    let submission = frame_loop.renderer().submissions.last().unwrap();
    assert_eq!(submission.models.len(), 1 + taps.len());
    for (model, placed) in submission.models[1..].iter().zip(placements) {
        assert_eq!(*model, placed.to_matrix());
    }
}

#[test]
fn test_stale_handle_is_ignored() {
    let mut frame_loop = tracking_loop();
    let outcome = frame_loop.on_frame(FrameHandle(999), &looking_down_the_hall());
    assert_eq!(outcome, FrameOutcome::Ignored);
    assert!(frame_loop.renderer().submissions.is_empty());
    assert_eq!(frame_loop.scheduler().scheduled.len(), 1);
}

#[test]
fn test_stop_cancels_pending_frame_once() {
    let mut frame_loop = tracking_loop();
    let pending = frame_loop.pending_frame().unwrap();

    frame_loop.stop();
    assert_eq!(frame_loop.state(), SessionState::Ended);
    assert_eq!(frame_loop.scheduler().cancelled, vec![pending]);
    assert!(frame_loop.scheduler().scheduled.is_empty());
    assert_eq!(frame_loop.host().sessions_ended, 1);

    frame_loop.stop();
    assert_eq!(frame_loop.scheduler().cancelled.len(), 1);
    assert_eq!(frame_loop.host().sessions_ended, 1);

    let outcome = frame_loop.on_frame(pending, &looking_down_the_hall());
    assert_eq!(outcome, FrameOutcome::Ignored);
}

#[test]
fn test_stop_while_waiting_ends_session_and_ignores_late_readiness() {
    let mut frame_loop = new_loop();
    frame_loop.start().unwrap();
    assert_eq!(frame_loop.state(), SessionState::WaitingForSession);

    // Declined or abandoned request: the host still has to end whatever
    // session eventually resolves
    frame_loop.stop();
    assert_eq!(frame_loop.state(), SessionState::Ended);
    assert_eq!(frame_loop.host().sessions_ended, 1);

    frame_loop.session_ready();
    frame_loop.reference_frame_ready(ReferenceFrame::base());
    assert_eq!(frame_loop.state(), SessionState::Ended);
    assert!(frame_loop.scheduler().scheduled.is_empty());
    assert_eq!(frame_loop.pending_frame(), None);
}

#[test]
fn test_stop_from_idle_needs_no_host() {
    let mut frame_loop = new_loop();
    frame_loop.stop();
    assert_eq!(frame_loop.state(), SessionState::Ended);
    assert_eq!(frame_loop.host().sessions_ended, 0);
    assert!(frame_loop.scheduler().cancelled.is_empty());
}

#[test]
fn test_reset_keeps_placements_and_marker_anchored() {
    let mut frame_loop = tracking_loop();
    frame_loop.tap(0.0, 0.0);
    step(&mut frame_loop, &looking_down_the_hall());

    let placed_before: Vec<_> = frame_loop.placement().placements().iter().copied().collect();
    let marker_before = frame_loop.placement().marker().translation;

    // Tracking drifts, and the host reports the correction
    let drift = Isometry3::from_parts(
        Translation3::new(0.4, 0.0, -0.7),
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5),
    );
    frame_loop.reset(Some(&drift));
    assert_eq!(frame_loop.reference_frame().unwrap().generation(), 1);

    let placed_after: Vec<_> = frame_loop.placement().placements().iter().copied().collect();
    assert_eq!(placed_before, placed_after);

    step(&mut frame_loop, &looking_down_the_hall().drifted(drift));
    assert_near(frame_loop.placement().marker().translation, marker_before);
    assert_eq!(frame_loop.placement().placements().as_slice(), &placed_before[..]);
}

#[test]
fn test_reset_without_correction_keeps_frame() {
    let mut frame_loop = tracking_loop();
    frame_loop.reset(None);
    assert_eq!(frame_loop.reference_frame(), Some(&ReferenceFrame::base()));
}

#[test]
fn test_rendering_uses_depth_corrected_projection() {
    let mut frame_loop = tracking_loop();
    let frame = looking_down_the_hall();
    step(&mut frame_loop, &frame);

    let pose = frame.world_pose.unwrap();
    let submission = &frame_loop.renderer().submissions[0];
    assert_eq!(submission.projection, depth_corrected(&pose.projection, 0.001));
    assert!((submission.view - pose.view_matrix()).norm() < 1e-6);
}

#[test]
fn test_light_estimate_is_optional() {
    let mut frame_loop = tracking_loop();
    step(&mut frame_loop, &looking_down_the_hall());
    assert_eq!(frame_loop.last_light_estimate(), None);

    let estimate = LightEstimate {
        intensity: 0.8,
        color: [1.0, 0.9, 0.8],
    };
    let mut frame = looking_down_the_hall();
    frame.light = Some(estimate);
    step(&mut frame_loop, &frame);
    assert_eq!(frame_loop.last_light_estimate(), Some(estimate));

    // A frame without an estimate clears the old one
    step(&mut frame_loop, &looking_down_the_hall());
    assert_eq!(frame_loop.last_light_estimate(), None);
    assert_eq!(frame_loop.frames_rendered(), 3);
}

#[test]
fn test_resize_reaches_renderer() {
    let mut frame_loop = new_loop();
    frame_loop.resize(Viewport::from_css(390.0, 844.0, 3.0));
    assert_eq!(frame_loop.renderer().viewports, vec![Viewport::new(780, 1688)]);
}

#[test]
fn test_css_resize_uses_configured_pixel_ratio_cap() {
    let mut frame_loop = FrameLoop::new(
        FakeHost::default(),
        ManualScheduler::default(),
        RecordingRenderer::default(),
        PlacementConfig::default().with_max_device_pixel_ratio(1.5),
    );

    let viewport = frame_loop.resize_css(400.0, 800.0, 3.0);
    assert_eq!(viewport, Viewport::new(600, 1200));
    assert_eq!(frame_loop.renderer().viewports, vec![viewport]);

    // Ratios under the cap pass through
    assert_eq!(frame_loop.resize_css(400.0, 800.0, 1.0), Viewport::new(400, 800));
}

#[test]
fn test_singular_projection_consumes_tap_and_parks_marker() {
    let mut frame_loop = tracking_loop();
    frame_loop.tap(0.2, -0.3);

    let mut frame = looking_down_the_hall();
    let pose = frame.world_pose.unwrap();
    frame.world_pose = Some(ViewerPose::new(Matrix4::zeros(), pose.transform));

    let outcome = step(&mut frame_loop, &frame);
    assert_eq!(outcome, FrameOutcome::Rendered { placed: false });
    assert_eq!(frame_loop.placement().pending_click(), None);
    assert!(frame_loop.placement().placements().is_empty());

    let miss = PlacementConfig::default().marker_miss_position;
    assert_eq!(frame_loop.placement().marker().translation, miss);

    // Still drawn: the marker alone
    assert_eq!(frame_loop.renderer().submissions[0].models.len(), 1);
}
