//! Draw submission for the placed-object pyramids.
//!
//! [`PyramidRenderer`] owns the fixed program and vertex array and turns
//! one `submit` into the minimal sequence of GPU commands. The commands
//! themselves go through [`GlBackend`], so the same renderer drives WebGL2
//! in the browser and the ASCII rasterizer in the terminal.

use nalgebra::Matrix4;

use crate::error::{ArError, ArResult};
use crate::geometry::Mesh;
use crate::host::SceneRenderer;
use crate::input::Viewport;

/// Vertex shader (GLSL ES 3.00)
pub const VERTEX_SHADER_SOURCE: &str = r#"#version 300 es

in vec4 a_position;
in vec3 a_color;

out vec3 v_color;

uniform mat4 u_projectionMatrix;
uniform mat4 u_viewMatrix;
uniform mat4 u_modelMatrix;

void main() {
  gl_Position = u_projectionMatrix * u_viewMatrix * u_modelMatrix * a_position;
  v_color = a_color;
}
"#;

/// Fragment shader: unlit vertex color
pub const FRAGMENT_SHADER_SOURCE: &str = r#"#version 300 es
precision highp float;

in vec3 v_color;

out vec4 outColor;

void main() {
  outColor = vec4(v_color, 1.0);
}
"#;

/// The three matrices the program consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixUniform {
    Projection,
    View,
    Model,
}

impl MatrixUniform {
    pub const ALL: [MatrixUniform; 3] = [Self::Projection, Self::View, Self::Model];

    /// Uniform name in the shader sources above.
    pub fn name(self) -> &'static str {
        match self {
            Self::Projection => "u_projectionMatrix",
            Self::View => "u_viewMatrix",
            Self::Model => "u_modelMatrix",
        }
    }
}

/// Attribute names in the vertex shader.
pub const POSITION_ATTRIBUTE: &str = "a_position";
pub const COLOR_ATTRIBUTE: &str = "a_color";

/// Low-level command surface of a rasterization backend.
///
/// Setup calls may fail; per-frame calls may not.
pub trait GlBackend {
    type Program;
    type VertexArray;

    /// Compile both stages and link them.
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str)
        -> ArResult<Self::Program>;

    /// Upload packed `xyz` positions and `rgb` colors for `program`'s attributes.
    fn create_vertex_array(
        &mut self,
        program: &Self::Program,
        positions: &[f32],
        colors: &[f32],
    ) -> ArResult<Self::VertexArray>;

    /// Clear color and depth.
    fn clear(&mut self);

    /// Depth test on with less-than, face culling off.
    fn set_depth_state(&mut self);

    fn use_program(&mut self, program: &Self::Program);

    fn bind_vertex_array(&mut self, vertex_array: Option<&Self::VertexArray>);

    fn set_matrix(&mut self, program: &Self::Program, uniform: MatrixUniform, matrix: &Matrix4<f32>);

    /// Draw `vertex_count` vertices of the bound array as triangles.
    fn draw_triangles(&mut self, vertex_count: usize);

    fn set_viewport(&mut self, viewport: Viewport);
}

/// Renders one tri-pyramid per model matrix.
pub struct PyramidRenderer<G: GlBackend> {
    backend: G,
    program: G::Program,
    vertex_array: G::VertexArray,
    vertex_count: usize,
    viewport: Option<Viewport>,
}

impl<G: GlBackend> PyramidRenderer<G> {
    /// Build the program and upload the mesh. Any failure here is fatal.
    pub fn new(mut backend: G) -> ArResult<Self> {
        let program = backend.create_program(VERTEX_SHADER_SOURCE, FRAGMENT_SHADER_SOURCE)?;

        let mesh = Mesh::tri_pyramid();
        let vertex_array =
            backend.create_vertex_array(&program, &mesh.positions(), &mesh.colors())?;
        backend.bind_vertex_array(None);

        tracing::info!(vertices = mesh.vertex_count(), "pyramid renderer ready");

        Ok(Self {
            backend,
            program,
            vertex_array,
            vertex_count: mesh.vertex_count(),
            viewport: None,
        })
    }

    pub fn backend(&self) -> &G {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut G {
        &mut self.backend
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }
}

impl<G: GlBackend> SceneRenderer for PyramidRenderer<G> {
    fn submit(&mut self, projection: &Matrix4<f32>, view: &Matrix4<f32>, models: &[Matrix4<f32>]) {
        let gl = &mut self.backend;

        gl.clear();
        gl.set_depth_state();
        gl.use_program(&self.program);
        gl.bind_vertex_array(Some(&self.vertex_array));

        gl.set_matrix(&self.program, MatrixUniform::Projection, projection);
        gl.set_matrix(&self.program, MatrixUniform::View, view);

        for model in models {
            gl.set_matrix(&self.program, MatrixUniform::Model, model);
            gl.draw_triangles(self.vertex_count);
        }

        gl.bind_vertex_array(None);
        tracing::trace!(objects = models.len(), "frame submitted");
    }

    fn resize(&mut self, viewport: Viewport) {
        self.backend.set_viewport(viewport);
        self.viewport = Some(viewport);
        tracing::debug!(width = viewport.width, height = viewport.height, "viewport resized");
    }
}

/// Turn a compile or link log into the fatal setup error.
pub fn setup_error(stage: &str, log: impl AsRef<str>) -> ArError {
    ArError::Setup(format!("{stage}: {}", log.as_ref()))
}
