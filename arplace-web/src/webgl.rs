//! WebGL2 implementation of the draw backend.

use arplace_core::render::{setup_error, MatrixUniform, COLOR_ATTRIBUTE, POSITION_ATTRIBUTE};
use arplace_core::{ArResult, GlBackend, Viewport};
use nalgebra::Matrix4;
use web_sys::{
    WebGl2RenderingContext as Gl, WebGlProgram, WebGlShader, WebGlUniformLocation,
    WebGlVertexArrayObject,
};

/// Linked program plus its matrix uniform locations.
pub struct LinkedProgram {
    program: WebGlProgram,
    uniforms: [Option<WebGlUniformLocation>; 3],
}

impl LinkedProgram {
    fn location(&self, uniform: MatrixUniform) -> Option<&WebGlUniformLocation> {
        let slot = match uniform {
            MatrixUniform::Projection => 0,
            MatrixUniform::View => 1,
            MatrixUniform::Model => 2,
        };
        self.uniforms[slot].as_ref()
    }
}

pub struct WebGlBackend {
    gl: Gl,
}

impl WebGlBackend {
    pub fn new(gl: Gl) -> Self {
        Self { gl }
    }

    fn upload_attribute(&self, program: &WebGlProgram, name: &str, data: &[f32]) -> ArResult<()> {
        let location = self.gl.get_attrib_location(program, name);
        if location < 0 {
            return Err(setup_error("vertex array", format!("attribute {name} not found")));
        }

        let buffer = self
            .gl
            .create_buffer()
            .ok_or_else(|| setup_error("vertex array", "failed to create buffer"))?;
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));

        let array = js_sys::Float32Array::from(data);
        self.gl
            .buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, Gl::STATIC_DRAW);

        let location = location as u32;
        self.gl.enable_vertex_attrib_array(location);
        self.gl
            .vertex_attrib_pointer_with_i32(location, 3, Gl::FLOAT, false, 0, 0);
        Ok(())
    }
}

impl GlBackend for WebGlBackend {
    type Program = LinkedProgram;
    type VertexArray = WebGlVertexArrayObject;

    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> ArResult<LinkedProgram> {
        let vertex = compile_shader(&self.gl, Gl::VERTEX_SHADER, vertex_source)?;
        let fragment = compile_shader(&self.gl, Gl::FRAGMENT_SHADER, fragment_source)?;

        let program = self
            .gl
            .create_program()
            .ok_or_else(|| setup_error("program", "failed to create program"))?;
        self.gl.attach_shader(&program, &vertex);
        self.gl.attach_shader(&program, &fragment);
        self.gl.link_program(&program);

        let linked = self
            .gl
            .get_program_parameter(&program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        if !linked {
            let log = self
                .gl
                .get_program_info_log(&program)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(setup_error("link", log));
        }

        let uniforms = MatrixUniform::ALL.map(|u| self.gl.get_uniform_location(&program, u.name()));
        Ok(LinkedProgram { program, uniforms })
    }

    fn create_vertex_array(
        &mut self,
        program: &LinkedProgram,
        positions: &[f32],
        colors: &[f32],
    ) -> ArResult<WebGlVertexArrayObject> {
        let vao = self
            .gl
            .create_vertex_array()
            .ok_or_else(|| setup_error("vertex array", "failed to create vertex array"))?;
        self.gl.bind_vertex_array(Some(&vao));

        self.upload_attribute(&program.program, POSITION_ATTRIBUTE, positions)?;
        self.upload_attribute(&program.program, COLOR_ATTRIBUTE, colors)?;

        Ok(vao)
    }

    fn clear(&mut self) {
        self.gl
            .clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
    }

    fn set_depth_state(&mut self) {
        self.gl.enable(Gl::DEPTH_TEST);
        self.gl.depth_func(Gl::LESS);
        self.gl.disable(Gl::CULL_FACE);
    }

    fn use_program(&mut self, program: &LinkedProgram) {
        self.gl.use_program(Some(&program.program));
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<&WebGlVertexArrayObject>) {
        self.gl.bind_vertex_array(vertex_array);
    }

    fn set_matrix(&mut self, program: &LinkedProgram, uniform: MatrixUniform, matrix: &Matrix4<f32>) {
        // nalgebra storage is column-major, as GL expects
        self.gl
            .uniform_matrix4fv_with_f32_array(program.location(uniform), false, matrix.as_slice());
    }

    fn draw_triangles(&mut self, vertex_count: usize) {
        self.gl.draw_arrays(Gl::TRIANGLES, 0, vertex_count as i32);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.gl
            .viewport(0, 0, viewport.width as i32, viewport.height as i32);
    }
}

fn compile_shader(gl: &Gl, shader_type: u32, source: &str) -> ArResult<WebGlShader> {
    let stage = if shader_type == Gl::VERTEX_SHADER {
        "vertex shader"
    } else {
        "fragment shader"
    };

    let shader = gl
        .create_shader(shader_type)
        .ok_or_else(|| setup_error(stage, "failed to create shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let compiled = gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if compiled {
        Ok(shader)
    } else {
        let log = gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "unknown error".to_string());
        Err(setup_error(stage, log))
    }
}
