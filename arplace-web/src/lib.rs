//! arplace Web - WebXR tap-to-place over WebGL2
//!
//! The page-side shim owns the `XRSession` and forwards session events,
//! frame callbacks and input into `ArPlacementApp`, which drives the shared
//! frame loop and draws through WebGL2.

mod bindings;
mod logging;
mod webgl;

use arplace_core::{
    rigid_from_matrix, FrameHandle, FrameLoop, FrameOutcome, LightEstimate, PlacementConfig,
    PyramidRenderer, ReferenceFrame, ScreenPoint, SessionState, ViewerPose,
};
use js_sys::{Function, Object, Reflect};
use nalgebra::Matrix4;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext};

pub use bindings::{JsFrameScheduler, JsTrackingHost, WebFrame};
pub use webgl::{LinkedProgram, WebGlBackend};

type WebLoop = FrameLoop<JsTrackingHost, JsFrameScheduler, PyramidRenderer<WebGlBackend>>;

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn matrix_from_slice(values: &[f32]) -> Option<Matrix4<f32>> {
    (values.len() == 16).then(|| Matrix4::from_column_slice(values))
}

fn xr_compatible_context(canvas: &HtmlCanvasElement) -> Result<WebGl2RenderingContext, JsValue> {
    let options = Object::new();
    Reflect::set(&options, &"xrCompatible".into(), &JsValue::TRUE)?;
    canvas
        .get_context_with_context_options("webgl2", &options)?
        .ok_or_else(|| JsValue::from_str("WebGL2 is not available"))?
        .dyn_into::<WebGl2RenderingContext>()
        .map_err(|_| JsValue::from_str("context is not WebGL2"))
}

/// Callbacks into the page. Each is a zero- or one-argument function.
#[wasm_bindgen]
pub struct HostHooks {
    request_session: Function,
    request_reference_space: Function,
    end_session: Function,
    request_frame: Function,
    cancel_frame: Function,
}

#[wasm_bindgen]
impl HostHooks {
    #[wasm_bindgen(constructor)]
    pub fn new(
        request_session: Function,
        request_reference_space: Function,
        end_session: Function,
        request_frame: Function,
        cancel_frame: Function,
    ) -> HostHooks {
        HostHooks {
            request_session,
            request_reference_space,
            end_session,
            request_frame,
            cancel_frame,
        }
    }
}

#[wasm_bindgen]
pub struct ArPlacementApp {
    canvas: HtmlCanvasElement,
    frame_loop: WebLoop,
}

#[wasm_bindgen]
impl ArPlacementApp {
    /// Set up WebGL2 on `canvas` and wire the host hooks. `supported` is the
    /// result of `navigator.xr.isSessionSupported('immersive-ar')`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        supported: bool,
        hooks: HostHooks,
    ) -> Result<ArPlacementApp, JsValue> {
        let gl = xr_compatible_context(&canvas)?;
        let renderer = PyramidRenderer::new(WebGlBackend::new(gl)).map_err(to_js)?;

        let host = JsTrackingHost {
            supported,
            request_session: hooks.request_session,
            request_reference_space: hooks.request_reference_space,
            end_session: hooks.end_session,
        };
        let scheduler = JsFrameScheduler {
            request_frame: hooks.request_frame,
            cancel_frame: hooks.cancel_frame,
        };

        let frame_loop = FrameLoop::new(host, scheduler, renderer, PlacementConfig::default());
        Ok(ArPlacementApp { canvas, frame_loop })
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.frame_loop.start().map_err(to_js)
    }

    #[wasm_bindgen(js_name = sessionReady)]
    pub fn session_ready(&mut self) {
        self.frame_loop.session_ready();
    }

    /// The `local` reference space resolved. Poses passed to `frame` must be
    /// queried against this same space for the rest of the session.
    #[wasm_bindgen(js_name = referenceFrameReady)]
    pub fn reference_frame_ready(&mut self) {
        self.frame_loop.reference_frame_ready(ReferenceFrame::base());
    }

    /// One `XRFrame`. `projection` and `transform` are the first view's
    /// column-major matrices; an empty `transform` means no pose this frame.
    /// Returns whether anything was drawn.
    pub fn frame(
        &mut self,
        handle: f64,
        projection: &[f32],
        transform: &[f32],
        light_intensity: Option<f32>,
    ) -> bool {
        let native_pose = match (matrix_from_slice(projection), matrix_from_slice(transform)) {
            (Some(projection), Some(transform)) => match rigid_from_matrix(&transform) {
                Some(pose) => Some(ViewerPose::new(projection, pose)),
                None => {
                    tracing::warn!("viewer transform is not rigid, treating as no pose");
                    None
                }
            },
            _ => None,
        };
        let light = light_intensity.map(|intensity| LightEstimate {
            intensity,
            color: [1.0, 1.0, 1.0],
        });

        let frame = WebFrame { native_pose, light };
        matches!(
            self.frame_loop.on_frame(FrameHandle(handle as u64), &frame),
            FrameOutcome::Rendered { .. }
        )
    }

    /// A tap already in normalized device coordinates.
    pub fn tap(&mut self, x: f32, y: f32) {
        self.frame_loop.tap(x, y);
    }

    /// A tap in canvas pixels, top-left origin.
    #[wasm_bindgen(js_name = tapPixels)]
    pub fn tap_pixels(&mut self, px: f32, py: f32) {
        let width = self.canvas.client_width() as f32;
        let height = self.canvas.client_height() as f32;
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let point = ScreenPoint::from_pixels(px, py, width, height);
        self.frame_loop.tap(point.x, point.y);
    }

    /// `XRReferenceSpace` reset. `transform` is the event's column-major
    /// matrix, empty when the event carried none.
    pub fn reset(&mut self, transform: &[f32]) {
        let correction = matrix_from_slice(transform).and_then(|m| rigid_from_matrix(&m));
        if !transform.is_empty() && correction.is_none() {
            tracing::warn!("reset transform rejected");
        }
        self.frame_loop.reset(correction.as_ref());
    }

    /// Size the drawing buffer for the canvas' CSS size.
    pub fn resize(&mut self, css_width: f32, css_height: f32, device_pixel_ratio: f32) {
        let viewport = self
            .frame_loop
            .resize_css(css_width, css_height, device_pixel_ratio);
        self.canvas.set_width(viewport.width);
        self.canvas.set_height(viewport.height);
    }

    pub fn stop(&mut self) {
        self.frame_loop.stop();
    }

    #[wasm_bindgen(js_name = placementCount)]
    pub fn placement_count(&self) -> usize {
        self.frame_loop.placement().placements().len()
    }

    #[wasm_bindgen(js_name = trackingAcquired)]
    pub fn tracking_acquired(&self) -> bool {
        self.frame_loop.tracking_acquired()
    }

    pub fn state(&self) -> String {
        match self.frame_loop.state() {
            SessionState::Idle => "idle",
            SessionState::WaitingForSession => "waiting",
            SessionState::Tracking => "tracking",
            SessionState::Ended => "ended",
        }
        .to_string()
    }
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    logging::init();
    Ok(())
}
