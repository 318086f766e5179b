//! Structs and functions for handling textures.
//!
//! The module provides the [`Texture`] struct which is a CPU representation of a GPU texture.

use std::sync::Arc;

use glow::HasContext;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Channel order of a raw pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Rgb,
    Bgr,
    Rgba,
    Bgra,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
        }
    }

    /// Byte length of a tightly packed `width * height` buffer.
    pub fn expected_len(self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.channels()
    }

    /// Checks that a buffer of `len` bytes holds exactly one non-empty
    /// `width * height` image in this format.
    pub fn validate(self, width: u32, height: u32, len: usize) -> Result<()> {
        let expected = self.expected_len(width, height);
        if expected == 0 || len != expected {
            return Err(HarnessError::InvalidPixelData {
                expected,
                actual: len,
            });
        }
        Ok(())
    }

    fn gl_format(self) -> u32 {
        match self {
            PixelFormat::Rgb => glow::RGB,
            PixelFormat::Bgr => glow::BGR,
            PixelFormat::Rgba => glow::RGBA,
            PixelFormat::Bgra => glow::BGRA,
        }
    }
}

/// Who deletes a texture's GL name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    /// Another object (e.g. the GUI painter) deletes it.
    Released,
}

impl Ownership {
    pub fn deletes_on_drop(self) -> bool {
        self == Ownership::Owned
    }
}

/// Represents a texture stored on the GPU side.
pub struct Texture {
    pub(super) gl: Arc<glow::Context>,
    pub(super) id: glow::Texture,
    pub(super) width: u32,
    pub(super) height: u32,
    pub(super) ownership: Ownership,
}

impl Texture {
    /// Uploads a row-major pixel buffer as a mipmapped RGBA8 texture.
    pub fn from_pixels(
        gl: &Arc<glow::Context>,
        width: u32,
        height: u32,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<Self> {
        format.validate(width, height, data.len())?;
        unsafe {
            let texture = gl
                .create_texture()
                .map_err(HarnessError::GpuAllocationFailed)?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            // Three-channel rows are not 4-byte aligned in general.
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                format.gl_format(),
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(data)),
            );
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
            gl.generate_mipmap(glow::TEXTURE_2D);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.bind_texture(glow::TEXTURE_2D, None);

            Ok(Self {
                gl: Arc::clone(gl),
                id: texture,
                width,
                height,
                ownership: Ownership::Owned,
            })
        }
    }

    /// Returns the width of the texture.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The underlying GL texture name.
    pub fn raw(&self) -> glow::Texture {
        self.id
    }

    /// Hands the GL name over to whoever deletes it; dropping this handle
    /// no longer deletes the texture.
    pub fn release(&mut self) {
        self.ownership = Ownership::Released;
    }

    /// Binds the texture to the specified texture unit.
    pub fn bind(&self, unit: u32) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(self.id));
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if self.ownership.deletes_on_drop() {
            unsafe {
                self.gl.delete_texture(self.id);
            }
        }
    }
}
