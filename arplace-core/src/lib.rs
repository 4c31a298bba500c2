//! arplace core - tap-to-place AR pipeline
//!
//! Pure geometry, placement state, reference-frame tracking, the frame loop
//! state machine and draw submission. Everything host-specific (tracking
//! runtime, GPU, input) comes in through the traits in [`host`] and
//! [`render::GlBackend`].

pub mod config;
pub mod error;
pub mod geometry;
pub mod host;
pub mod input;
pub mod placement;
pub mod projection;
pub mod ray;
pub mod reference;
pub mod render;
pub mod session;
pub mod transform;

// Re-export commonly used types
pub use config::PlacementConfig;
pub use error::{ArError, ArResult, GeometryError};
pub use geometry::{Mesh, Triangle, Vertex};
pub use host::{FrameHandle, FrameScheduler, FrameSource, LightEstimate, SceneRenderer, TrackingHost};
pub use input::{ScreenPoint, Viewport};
pub use placement::{PlacementList, PlacementState};
pub use projection::{rigid_from_matrix, Frustum, ViewerPose};
pub use ray::{derive_view_ray, intersect_ground_plane, Ray};
pub use reference::{ReferenceFrame, ReferenceFrameTracker};
pub use render::{GlBackend, MatrixUniform, PyramidRenderer};
pub use session::{FrameLoop, FrameOutcome, SessionState};
pub use transform::{compose_placement_transform, Transform};
