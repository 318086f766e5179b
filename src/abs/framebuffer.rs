//! Module to work with OpenGL framebuffers.
//!
//! [`OffscreenSurface`] is a framebuffer with a single color texture that
//! follows the size of whatever region displays it. Storage is only
//! re-specified when the requested [`Extent`] actually changes; the texture
//! name stays the same, so handles given out to the GUI stay valid.

use std::sync::Arc;

use glam::Vec2;
use glow::HasContext;

use crate::abs::{Ownership, Texture};

/// A non-zero size in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    width: u32,
    height: u32,
}

impl Extent {
    /// Returns `None` if either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// Converts a size in GUI points to pixels.
    ///
    /// Collapsed or degenerate regions (any side below one pixel, or a
    /// non-finite size) yield `None` so callers keep their previous extent.
    pub fn from_points(size: Vec2, pixels_per_point: f32) -> Option<Self> {
        let px = size * pixels_per_point;
        if !px.is_finite() || px.x < 1.0 || px.y < 1.0 {
            return None;
        }
        Self::new(px.x.round() as u32, px.y.round() as u32)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Remembers the current extent of a render target and counts how often its
/// storage had to be re-specified.
#[derive(Debug, Clone, Copy)]
pub struct ExtentTracker {
    current: Extent,
    reallocations: u64,
}

impl ExtentTracker {
    pub fn new(initial: Extent) -> Self {
        Self {
            current: initial,
            reallocations: 0,
        }
    }

    /// Records a request. Returns `true` if the storage must change.
    pub fn request(&mut self, extent: Extent) -> bool {
        if extent == self.current {
            return false;
        }
        self.current = extent;
        self.reallocations += 1;
        true
    }

    pub fn current(&self) -> Extent {
        self.current
    }

    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }
}

/// Result of the last completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    Complete,
    /// Holds the status value returned by the driver.
    Incomplete(u32),
}

/// An offscreen render target with one RGB color attachment.
pub struct OffscreenSurface {
    gl: Arc<glow::Context>,
    fbo: glow::Framebuffer,
    color_tex: Texture,
    tracker: ExtentTracker,
    status: SurfaceStatus,
}

impl OffscreenSurface {
    /// Creates the framebuffer and its color texture at `extent`.
    pub fn new(gl: &Arc<glow::Context>, extent: Extent) -> Result<Self, String> {
        unsafe {
            let fbo = gl.create_framebuffer()?;
            let tex = match gl.create_texture() {
                Ok(tex) => tex,
                Err(e) => {
                    gl.delete_framebuffer(fbo);
                    return Err(e);
                }
            };

            let mut surface = Self {
                gl: Arc::clone(gl),
                fbo,
                color_tex: Texture {
                    gl: Arc::clone(gl),
                    id: tex,
                    width: extent.width(),
                    height: extent.height(),
                    ownership: Ownership::Owned,
                },
                tracker: ExtentTracker::new(extent),
                status: SurfaceStatus::Complete,
            };
            surface.allocate_storage();
            log::debug!(
                "Created offscreen surface {}x{}",
                extent.width(),
                extent.height()
            );
            Ok(surface)
        }
    }

    /// Matches the color storage to `extent`. Does nothing if the size is
    /// unchanged. Returns whether storage was re-specified.
    pub fn resize(&mut self, extent: Extent) -> bool {
        if !self.tracker.request(extent) {
            return false;
        }
        self.color_tex.width = extent.width();
        self.color_tex.height = extent.height();
        self.allocate_storage();
        log::debug!(
            "Resized offscreen surface to {}x{}",
            extent.width(),
            extent.height()
        );
        true
    }

    fn allocate_storage(&mut self) {
        let gl = &self.gl;
        let extent = self.tracker.current();
        let status = unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
            gl.bind_texture(glow::TEXTURE_2D, Some(self.color_tex.id));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGB8 as i32,
                extent.width() as i32,
                extent.height() as i32,
                0,
                glow::RGB,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(None),
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(self.color_tex.id),
                0,
            );
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            status
        };

        self.status = if status == glow::FRAMEBUFFER_COMPLETE {
            SurfaceStatus::Complete
        } else {
            // Not fatal: the image just won't show anything useful.
            let err = crate::error::HarnessError::FramebufferIncomplete { status };
            log::error!("{err}");
            SurfaceStatus::Incomplete(status)
        };
    }

    /// Binds the framebuffer for rendering and sets the viewport to cover it.
    pub fn bind(&self) {
        let extent = self.tracker.current();
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
            self.gl
                .viewport(0, 0, extent.width() as i32, extent.height() as i32);
        }
    }

    /// Unbinds the framebuffer, reverting to the default framebuffer.
    pub fn unbind(gl: &glow::Context) {
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    /// Returns the color texture of the framebuffer.
    pub fn texture(&self) -> &Texture {
        &self.color_tex
    }

    /// Gives up deleting the color texture, once another owner (the GUI
    /// painter it was registered with) has deleted it.
    pub fn release_texture(&mut self) {
        self.color_tex.release();
    }

    pub fn extent(&self) -> Extent {
        self.tracker.current()
    }

    pub fn status(&self) -> SurfaceStatus {
        self.status
    }

    /// How many times storage was re-specified since creation.
    pub fn reallocations(&self) -> u64 {
        self.tracker.reallocations()
    }
}

impl Drop for OffscreenSurface {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_framebuffer(self.fbo);
        }
    }
}
