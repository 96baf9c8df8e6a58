use std::rc::Rc;

use glow::HasContext;

use super::error::RenderError;

const VERTEX_SHADER: &str = "#version 330
layout(location = 0) in vec4 vposition;
layout(location = 1) in vec2 vtexcoord;
out vec2 ftexcoord;
void main() {
    ftexcoord = vtexcoord;
    gl_Position = vposition;
}
";

const FRAGMENT_SHADER: &str = "#version 330
uniform sampler2D tex;
in vec2 ftexcoord;
layout(location = 0) out vec4 fcolor;
void main() {
    fcolor = texture(tex, ftexcoord);
}
";

#[rustfmt::skip]
const QUAD_VERTICES: [f32; 20] = [
    // x     y     z    u    v
     1.0,  1.0, 0.0, 1.0, 1.0,
    -1.0,  1.0, 0.0, 0.0, 1.0,
     1.0, -1.0, 0.0, 1.0, 0.0,
    -1.0, -1.0, 0.0, 0.0, 0.0,
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

pub fn gl_error_string(code: u32) -> &'static str {
    match code {
        glow::NO_ERROR => "GL_NO_ERROR",
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown GL error",
    }
}

/// Fail with the oldest pending GL error, draining the rest
pub(crate) fn check_gl_error(gl: &glow::Context, context: &'static str) -> Result<(), RenderError> {
    let code = unsafe { gl.get_error() };
    if code == glow::NO_ERROR {
        return Ok(());
    }
    while unsafe { gl.get_error() } != glow::NO_ERROR {}
    Err(RenderError::Gl { context, code })
}

fn gl_object<T>(object: &'static str, result: Result<T, String>) -> Result<T, RenderError> {
    result.map_err(|message| RenderError::GlObject { object, message })
}

/// Passthrough program that samples one texture onto the quad
pub struct GlProgram {
    gl: Rc<glow::Context>,
    program: glow::Program,
    texture_location: Option<glow::UniformLocation>,
}

impl GlProgram {
    pub fn passthrough(gl: Rc<glow::Context>) -> Result<GlProgram, RenderError> {
        unsafe {
            let program = gl_object("program", gl.create_program())?;
            // own the program before anything else can fail so it is deleted on error
            let mut owned = GlProgram { gl: Rc::clone(&gl), program, texture_location: None };

            let vertex = compile_shader(&gl, glow::VERTEX_SHADER, "vertex", VERTEX_SHADER)?;
            let fragment = match compile_shader(&gl, glow::FRAGMENT_SHADER, "fragment", FRAGMENT_SHADER) {
                Ok(fragment) => fragment,
                Err(err) => {
                    gl.delete_shader(vertex);
                    return Err(err);
                }
            };

            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            for shader in [vertex, fragment] {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }
            if !linked {
                return Err(RenderError::ShaderLink { log: gl.get_program_info_log(program) });
            }

            owned.texture_location = gl.get_uniform_location(program, "tex");
            Ok(owned)
        }
    }

    /// Bind the program and point its sampler at texture unit 0
    pub fn bind(&self) {
        unsafe {
            self.gl.use_program(Some(self.program));
            self.gl.uniform_1_i32(self.texture_location.as_ref(), 0);
        }
    }
}

impl Drop for GlProgram {
    fn drop(&mut self) {
        unsafe { self.gl.delete_program(self.program) }
    }
}

unsafe fn compile_shader(
    gl: &glow::Context,
    kind: u32,
    stage: &'static str,
    source: &str,
) -> Result<glow::Shader, RenderError> {
    let shader = gl_object("shader", gl.create_shader(kind))?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(RenderError::ShaderCompile { stage, log });
    }
    Ok(shader)
}

/// Full-screen quad: positions at attribute 0, texture coordinates at attribute 1
pub struct QuadMesh {
    gl: Rc<glow::Context>,
    vao: glow::VertexArray,
    vertices: Option<glow::Buffer>,
    indices: Option<glow::Buffer>,
}

impl QuadMesh {
    pub fn new(gl: Rc<glow::Context>) -> Result<QuadMesh, RenderError> {
        unsafe {
            let vao = gl_object("vertex array", gl.create_vertex_array())?;
            let mut quad = QuadMesh { gl: Rc::clone(&gl), vao, vertices: None, indices: None };
            gl.bind_vertex_array(Some(vao));

            let vertices = gl_object("vertex buffer", gl.create_buffer())?;
            quad.vertices = Some(vertices);
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertices));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck::cast_slice(&QUAD_VERTICES), glow::STATIC_DRAW);

            let stride = 5 * std::mem::size_of::<f32>() as i32;
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, stride, 3 * std::mem::size_of::<f32>() as i32);
            gl.enable_vertex_attrib_array(1);

            let indices = gl_object("index buffer", gl.create_buffer())?;
            quad.indices = Some(indices);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(indices));
            gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(&QUAD_INDICES), glow::STATIC_DRAW);

            gl.bind_vertex_array(None);
            check_gl_error(&gl, "quad upload")?;
            Ok(quad)
        }
    }

    pub fn draw(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.draw_elements(glow::TRIANGLES, QUAD_INDICES.len() as i32, glow::UNSIGNED_INT, 0);
            self.gl.bind_vertex_array(None);
        }
    }
}

impl Drop for QuadMesh {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.vao);
            for buffer in [self.vertices, self.indices].into_iter().flatten() {
                self.gl.delete_buffer(buffer);
            }
        }
    }
}

/// RGBA8 texture with linear filtering and clamped edges
pub struct GlTexture {
    gl: Rc<glow::Context>,
    texture: glow::Texture,
    width: i32,
    height: i32,
}

impl GlTexture {
    pub fn new(gl: Rc<glow::Context>, width: i32, height: i32) -> Result<GlTexture, RenderError> {
        unsafe {
            let texture = gl_object("texture", gl.create_texture())?;
            let owned = GlTexture { gl: Rc::clone(&gl), texture, width, height };

            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                None,
            );
            gl.bind_texture(glow::TEXTURE_2D, None);
            check_gl_error(&gl, "glTexImage2D")?;
            Ok(owned)
        }
    }

    /// GL object name, as the interop API wants it
    pub fn name(&self) -> u32 {
        self.texture.0.get()
    }

    pub fn bind(&self, unit: u32) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }
}

impl Drop for GlTexture {
    fn drop(&mut self) {
        unsafe { self.gl.delete_texture(self.texture) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_strings_name_known_codes() {
        assert_eq!(gl_error_string(glow::INVALID_ENUM), "GL_INVALID_ENUM");
        assert_eq!(gl_error_string(glow::OUT_OF_MEMORY), "GL_OUT_OF_MEMORY");
        assert_eq!(gl_error_string(0xdead), "unknown GL error");
    }

    #[test]
    fn quad_covers_clip_space_with_two_triangles() {
        let corners: Vec<(f32, f32)> = QUAD_VERTICES.chunks(5).map(|v| (v[0], v[1])).collect();
        for corner in [(1.0, 1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
            assert!(corners.contains(&corner));
        }
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < corners.len()));
        // texture coordinates follow clip space so the image is not mirrored
        for v in QUAD_VERTICES.chunks(5) {
            assert_eq!(v[3], (v[0] + 1.0) / 2.0);
            assert_eq!(v[4], (v[1] + 1.0) / 2.0);
        }
    }
}
