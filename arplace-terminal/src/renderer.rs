//! ASCII rasterizer standing in for the GPU

use arplace_core::render::{setup_error, MatrixUniform, COLOR_ATTRIBUTE, POSITION_ATTRIBUTE};
use arplace_core::{ArResult, GlBackend, Viewport};
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector4};
use std::io::Write;

/// Character density ramp, far to near
const DEPTH_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide.
pub const CELL_ASPECT: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
struct Cell {
    glyph: char,
    color: Color,
}

const EMPTY: Cell = Cell {
    glyph: ' ',
    color: Color::Reset,
};

#[derive(Debug, Clone, Copy)]
struct ColoredVertex {
    position: Point3<f32>,
    color: [f32; 3],
}

/// Software backend that draws triangles into a character grid.
///
/// Commands mirror a GL context: the bound program's matrices are latched
/// by `set_matrix` and consumed by `draw_triangles`.
pub struct AsciiRasterizer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
    vertex_arrays: Vec<Vec<ColoredVertex>>,
    bound: Option<usize>,
    projection: Matrix4<f32>,
    view: Matrix4<f32>,
    model: Matrix4<f32>,
    depth_test: bool,
    draw_calls: usize,
}

impl AsciiRasterizer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![EMPTY; size],
            vertex_arrays: Vec::new(),
            bound: None,
            projection: Matrix4::identity(),
            view: Matrix4::identity(),
            model: Matrix4::identity(),
            depth_test: false,
            draw_calls: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Draw calls issued since the last clear.
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    /// Whether any fragment landed in the cell at (`x`, `y`).
    pub fn is_covered(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x].glyph != ' '
    }

    fn rasterize_triangle(&mut self, vertices: &[ColoredVertex], mvp: &Matrix4<f32>) {
        let mut screen = [(0.0f32, 0.0f32, 0.0f32); 3];
        for (out, vertex) in screen.iter_mut().zip(vertices) {
            let clip = mvp * Vector4::new(vertex.position.x, vertex.position.y, vertex.position.z, 1.0);
            // Anything touching the viewer plane is dropped rather than clipped
            if clip.w <= 1e-6 {
                return;
            }
            let ndc = clip.xyz() / clip.w;
            *out = (
                (ndc.x + 1.0) * 0.5 * self.width as f32,
                (1.0 - ndc.y) * 0.5 * self.height as f32,
                ndc.z,
            );
        }

        let color = shade(vertices[0].color);
        let (v0, v1, v2) = (screen[0], screen[1], screen[2]);

        // Bounding box, clipped to the screen
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i64).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i64).min(self.width as i64 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i64).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i64).min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                if !(-1.0..=1.0).contains(&depth) {
                    continue;
                }

                let idx = y as usize * self.width + x as usize;
                if !self.depth_test || depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.cells[idx] = Cell {
                        glyph: depth_glyph(depth),
                        color,
                    };
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let center = (self.width / 2, self.height / 2);
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                if (x, y) == center && cell.glyph == ' ' {
                    writer.queue(SetForegroundColor(Color::Yellow))?;
                    writer.queue(Print('+'))?;
                    continue;
                }
                writer.queue(SetForegroundColor(cell.color))?;
                writer.queue(Print(cell.glyph))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl GlBackend for AsciiRasterizer {
    type Program = ();
    type VertexArray = usize;

    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> ArResult<()> {
        // No compiler here, but the interface the rasterizer emulates must be present
        for uniform in MatrixUniform::ALL {
            if !vertex_source.contains(uniform.name()) {
                return Err(setup_error("vertex shader", format!("missing {}", uniform.name())));
            }
        }
        for attribute in [POSITION_ATTRIBUTE, COLOR_ATTRIBUTE] {
            if !vertex_source.contains(attribute) {
                return Err(setup_error("vertex shader", format!("missing {attribute}")));
            }
        }
        if !fragment_source.contains("void main") {
            return Err(setup_error("fragment shader", "no entry point"));
        }
        Ok(())
    }

    fn create_vertex_array(&mut self, _program: &(), positions: &[f32], colors: &[f32]) -> ArResult<usize> {
        if positions.len() != colors.len() || positions.len() % 9 != 0 {
            return Err(setup_error(
                "vertex array",
                format!("{} positions for {} colors", positions.len(), colors.len()),
            ));
        }
        let vertices = positions
            .chunks_exact(3)
            .zip(colors.chunks_exact(3))
            .map(|(p, c)| ColoredVertex {
                position: Point3::new(p[0], p[1], p[2]),
                color: [c[0], c[1], c[2]],
            })
            .collect();
        self.vertex_arrays.push(vertices);
        Ok(self.vertex_arrays.len() - 1)
    }

    fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(EMPTY);
        self.draw_calls = 0;
    }

    fn set_depth_state(&mut self) {
        self.depth_test = true;
    }

    fn use_program(&mut self, _program: &()) {}

    fn bind_vertex_array(&mut self, vertex_array: Option<&usize>) {
        self.bound = vertex_array.copied();
    }

    fn set_matrix(&mut self, _program: &(), uniform: MatrixUniform, matrix: &Matrix4<f32>) {
        match uniform {
            MatrixUniform::Projection => self.projection = *matrix,
            MatrixUniform::View => self.view = *matrix,
            MatrixUniform::Model => self.model = *matrix,
        }
    }

    fn draw_triangles(&mut self, vertex_count: usize) {
        let Some(bound) = self.bound else {
            tracing::warn!("draw without a bound vertex array");
            return;
        };
        self.draw_calls += 1;

        let mvp = self.projection * self.view * self.model;
        let vertices = std::mem::take(&mut self.vertex_arrays[bound]);
        for triangle in vertices[..vertex_count.min(vertices.len())].chunks_exact(3) {
            self.rasterize_triangle(triangle, &mvp);
        }
        self.vertex_arrays[bound] = vertices;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        let (width, height) = (viewport.width as usize, viewport.height as usize);
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; width * height];
        self.cells = vec![EMPTY; width * height];
    }
}

/// Brighten the mesh's dark face colors so they read on a terminal.
fn shade(color: [f32; 3]) -> Color {
    let channel = |c: f32| ((c * 2.0).min(1.0) * 255.0) as u8;
    Color::Rgb {
        r: channel(color[0]),
        g: channel(color[1]),
        b: channel(color[2]),
    }
}

fn depth_glyph(depth: f32) -> char {
    // NDC depth in [-1, 1]; nearer fragments get denser glyphs
    let nearness = (1.0 - (depth + 1.0) * 0.5).clamp(0.0, 1.0);
    let index = (nearness * (DEPTH_RAMP.len() - 1) as f32).round() as usize;
    DEPTH_RAMP[index.min(DEPTH_RAMP.len() - 1)]
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arplace_core::{PyramidRenderer, SceneRenderer};

    #[test]
    fn test_barycentric_inside_and_degenerate() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!(w0 > 0.0 && w1 > 0.0 && w2 > 0.0);
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);

        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 0.0)).is_none());
    }

    #[test]
    fn test_rejects_shader_without_model_matrix() {
        let mut rasterizer = AsciiRasterizer::new(10, 10);
        let err = rasterizer
            .create_program("in vec4 a_position; in vec3 a_color; uniform mat4 u_viewMatrix;", "void main() {}")
            .unwrap_err();
        assert!(err.to_string().contains("u_projectionMatrix"));
    }

    #[test]
    fn test_pyramid_in_front_is_drawn() {
        let mut renderer = PyramidRenderer::new(AsciiRasterizer::new(40, 20)).unwrap();
        let projection = Matrix4::new_perspective(2.0, 1.0, 0.1, 100.0);
        let view = Matrix4::new_translation(&nalgebra::Vector3::new(-0.3, -0.3, -2.0));

        renderer.submit(&projection, &view, &[Matrix4::identity()]);

        let rasterizer = renderer.backend();
        assert_eq!(rasterizer.draw_calls(), 1);
        let covered = (0..rasterizer.height())
            .flat_map(|y| (0..rasterizer.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| rasterizer.is_covered(x, y))
            .count();
        assert!(covered > 0);
    }

    #[test]
    fn test_pyramid_behind_viewer_is_not_drawn() {
        let mut renderer = PyramidRenderer::new(AsciiRasterizer::new(40, 20)).unwrap();
        let projection = Matrix4::new_perspective(2.0, 1.0, 0.1, 100.0);
        let view = Matrix4::new_translation(&nalgebra::Vector3::new(0.0, 0.0, 5.0));

        renderer.submit(&projection, &view, &[Matrix4::identity()]);

        let rasterizer = renderer.backend();
        assert!((0..20).all(|y| (0..40).all(|x| !rasterizer.is_covered(x, y))));
    }
}
