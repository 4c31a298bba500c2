//! Host capabilities backed by callbacks from the JS WebXR shim.

use arplace_core::{
    FrameHandle, FrameScheduler, FrameSource, LightEstimate, ReferenceFrame, TrackingHost,
    ViewerPose,
};
use js_sys::Function;
use nalgebra::Isometry3;
use wasm_bindgen::JsValue;

fn call(name: &str, function: &Function, arg: Option<&JsValue>) -> Option<JsValue> {
    let result = match arg {
        Some(arg) => function.call1(&JsValue::NULL, arg),
        None => function.call0(&JsValue::NULL),
    };
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(hook = name, error = ?err, "host callback threw");
            None
        }
    }
}

/// `navigator.xr` as seen through the shim.
pub struct JsTrackingHost {
    pub supported: bool,
    pub request_session: Function,
    pub request_reference_space: Function,
    pub end_session: Function,
}

impl TrackingHost for JsTrackingHost {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn request_session(&mut self) {
        call("requestSession", &self.request_session, None);
    }

    fn request_reference_frame(&mut self) {
        call("requestReferenceSpace", &self.request_reference_space, None);
    }

    fn end_session(&mut self) {
        call("endSession", &self.end_session, None);
    }
}

/// `session.requestAnimationFrame` / `cancelAnimationFrame`.
pub struct JsFrameScheduler {
    pub request_frame: Function,
    pub cancel_frame: Function,
}

impl FrameScheduler for JsFrameScheduler {
    fn schedule_next(&mut self) -> FrameHandle {
        let id = call("requestFrame", &self.request_frame, None)
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0);
        FrameHandle(id as u64)
    }

    fn cancel(&mut self, handle: FrameHandle) {
        call("cancelFrame", &self.cancel_frame, Some(&JsValue::from_f64(handle.0 as f64)));
    }
}

/// One XR frame. The shim always queries poses against the session's base
/// reference space; re-basing onto the live frame happens here.
pub struct WebFrame {
    pub native_pose: Option<ViewerPose>,
    pub light: Option<LightEstimate>,
}

impl FrameSource for WebFrame {
    fn viewer_pose(&self, frame: &ReferenceFrame) -> Option<ViewerPose> {
        let pose = self.native_pose?;
        let offset: &Isometry3<f32> = frame.origin_offset();
        Some(ViewerPose::new(pose.projection, offset.inverse() * pose.transform))
    }

    fn light_estimate(&self) -> Option<LightEstimate> {
        self.light
    }
}
