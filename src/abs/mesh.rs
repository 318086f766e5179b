//! Mesh management module.
//!
//! This module defines the [`Mesh`] struct for managing mesh data on the GPU side.
//! Vertices should implement the [`Vertex`] trait.

use std::sync::Arc;

use glow::HasContext;

use crate::error::{HarnessError, Result};

/// Trait that defines the necessary methods for a vertex.
pub trait Vertex {
    /// Sets up the vertex attribute pointers for the vertex.
    fn vertex_attribs(gl: &glow::Context);
}

/// Represents an immutable mesh stored on the GPU side.
pub struct Mesh {
    gl: Arc<glow::Context>,
    draw_mode: u32,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
    index_count: usize,
}

impl Mesh {
    /// Uploads the given vertex and index data once.
    pub fn new<V: Vertex>(
        gl: &Arc<glow::Context>,
        vertices: &[V],
        indices: &[u32],
        draw_mode: u32,
    ) -> Result<Self> {
        unsafe {
            let (vao, vbo, ebo) = allocate_objects(
                || gl.create_vertex_array(),
                || gl.create_buffer(),
                |vao| gl.delete_vertex_array(vao),
                |buffer| gl.delete_buffer(buffer),
            )?;

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                std::slice::from_raw_parts(
                    vertices.as_ptr() as *const u8,
                    std::mem::size_of_val(vertices),
                ),
                glow::STATIC_DRAW,
            );

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                std::slice::from_raw_parts(
                    indices.as_ptr() as *const u8,
                    std::mem::size_of_val(indices),
                ),
                glow::STATIC_DRAW,
            );

            V::vertex_attribs(gl);

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

            Ok(Self {
                gl: Arc::clone(gl),
                draw_mode,
                vao,
                vbo,
                ebo,
                index_count: indices.len(),
            })
        }
    }

    /// Draws the mesh.
    pub fn draw(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl
                .draw_elements(self.draw_mode, self.index_count as i32, glow::UNSIGNED_INT, 0);
            self.gl.bind_vertex_array(None);
        }
    }

    /// Number of indices drawn per call.
    pub fn index_count(&self) -> usize {
        self.index_count
    }
}

/// Creates a vertex array and two buffers. If a later creation fails, the
/// objects already created are deleted before the error is returned.
fn allocate_objects<A, B>(
    create_array: impl FnOnce() -> std::result::Result<A, String>,
    mut create_buffer: impl FnMut() -> std::result::Result<B, String>,
    delete_array: impl FnOnce(A),
    mut delete_buffer: impl FnMut(B),
) -> Result<(A, B, B)> {
    let array = create_array().map_err(HarnessError::GpuAllocationFailed)?;
    let vertices = match create_buffer() {
        Ok(buffer) => buffer,
        Err(e) => {
            delete_array(array);
            return Err(HarnessError::GpuAllocationFailed(e));
        }
    };
    let indices = match create_buffer() {
        Ok(buffer) => buffer,
        Err(e) => {
            delete_buffer(vertices);
            delete_array(array);
            return Err(HarnessError::GpuAllocationFailed(e));
        }
    };
    Ok((array, vertices, indices))
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_buffer(self.ebo);
            self.gl.delete_vertex_array(self.vao);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Hands out ids from a counter and fails the `fail_at`-th buffer.
    fn run(fail_at: Option<u32>) -> (Result<(u32, u32, u32)>, Vec<String>) {
        let deleted = RefCell::new(Vec::new());
        let next = RefCell::new(10);
        let mut buffers = 0;
        let result = allocate_objects(
            || Ok(1),
            || {
                buffers += 1;
                if Some(buffers) == fail_at {
                    return Err("out of memory".to_string());
                }
                let mut id = next.borrow_mut();
                *id += 1;
                Ok(*id)
            },
            |vao| deleted.borrow_mut().push(format!("vao {vao}")),
            |buffer| deleted.borrow_mut().push(format!("buffer {buffer}")),
        );
        (result, deleted.into_inner())
    }

    #[test]
    fn all_objects_created() {
        let (result, deleted) = run(None);
        assert_eq!(result.unwrap(), (1, 11, 12));
        assert!(deleted.is_empty());
    }

    #[test]
    fn failed_vertex_buffer_deletes_array() {
        let (result, deleted) = run(Some(1));
        assert!(matches!(result, Err(HarnessError::GpuAllocationFailed(_))));
        assert_eq!(deleted, vec!["vao 1"]);
    }

    #[test]
    fn failed_index_buffer_deletes_array_and_vertex_buffer() {
        let (result, deleted) = run(Some(2));
        assert!(matches!(result, Err(HarnessError::GpuAllocationFailed(_))));
        assert_eq!(deleted, vec!["buffer 11", "vao 1"]);
    }
}
