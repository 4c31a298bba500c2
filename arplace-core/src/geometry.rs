//! Mesh primitives for the placed-object geometry

use nalgebra::Point3;

/// A vertex with position and flat color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub color: [f32; 3],
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, color: [f32; 3]) -> Self {
        Self {
            position: Point3::new(x, y, z),
            color,
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }
}

/// A non-indexed triangle list
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Number of vertices a `TRIANGLES` draw of this mesh consumes.
    pub fn vertex_count(&self) -> usize {
        self.triangles.len() * 3
    }

    /// Tightly packed `xyz` positions, ready for a vertex buffer.
    pub fn positions(&self) -> Vec<f32> {
        self.vertices()
            .flat_map(|v| [v.position.x, v.position.y, v.position.z])
            .collect()
    }

    /// Tightly packed `rgb` colors, parallel to [`Mesh::positions`].
    pub fn colors(&self) -> Vec<f32> {
        self.vertices().flat_map(|v| v.color).collect()
    }

    fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.triangles.iter().flat_map(|t| t.vertices.iter())
    }

    /// Open three-faced pyramid spanning the unit corner at the origin.
    ///
    /// The apex sits on +Y, so with the origin on the ground the object
    /// stands up from the hit point. Each face has its own flat color.
    pub fn tri_pyramid() -> Self {
        const BLUE: [f32; 3] = [0.0, 0.3, 0.5];
        const GREEN: [f32; 3] = [0.3, 0.5, 0.0];
        const PURPLE: [f32; 3] = [0.3, 0.0, 0.5];

        let mut mesh = Self::new();

        mesh.add_triangle(Triangle::new(
            Vertex::new(0.0, 1.0, 0.0, BLUE),
            Vertex::new(0.0, 0.0, 1.0, BLUE),
            Vertex::new(0.0, 0.0, 0.0, BLUE),
        ));
        mesh.add_triangle(Triangle::new(
            Vertex::new(0.0, 1.0, 0.0, GREEN),
            Vertex::new(1.0, 0.0, 0.0, GREEN),
            Vertex::new(0.0, 0.0, 0.0, GREEN),
        ));
        mesh.add_triangle(Triangle::new(
            Vertex::new(0.0, 0.0, 1.0, PURPLE),
            Vertex::new(1.0, 0.0, 0.0, PURPLE),
            Vertex::new(0.0, 0.0, 0.0, PURPLE),
        ));

        mesh
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
