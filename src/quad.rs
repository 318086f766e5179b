//! The textured quad drawn into the offscreen surface.

use glam::{Vec2, Vec3};
use glow::HasContext;

use crate::abs::{PixelFormat, Vertex};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadVertex {
    pub position: Vec3,
    pub uv: Vec2,
}

impl Vertex for QuadVertex {
    fn vertex_attribs(gl: &glow::Context) {
        let stride = std::mem::size_of::<QuadVertex>() as i32;
        unsafe {
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(
                1,
                2,
                glow::FLOAT,
                false,
                stride,
                std::mem::size_of::<Vec3>() as i32,
            );
        }
    }
}

pub const QUAD_VERTICES: [QuadVertex; 4] = [
    // top right
    QuadVertex {
        position: Vec3::new(0.5, 0.5, 0.0),
        uv: Vec2::new(1.0, 1.0),
    },
    // bottom right
    QuadVertex {
        position: Vec3::new(0.5, -0.5, 0.0),
        uv: Vec2::new(1.0, 0.0),
    },
    // bottom left
    QuadVertex {
        position: Vec3::new(-0.5, -0.5, 0.0),
        uv: Vec2::new(0.0, 0.0),
    },
    // top left
    QuadVertex {
        position: Vec3::new(-0.5, 0.5, 0.0),
        uv: Vec2::new(0.0, 1.0),
    },
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// A `size`x`size` checkerboard with `cell`-pixel squares, laid out in
/// `format`'s channel order. Alpha, when present, is opaque.
pub fn checkerboard(
    size: u32,
    cell: u32,
    light: [u8; 3],
    dark: [u8; 3],
    format: PixelFormat,
) -> Vec<u8> {
    let cell = cell.max(1);
    let mut data = Vec::with_capacity(format.expected_len(size, size));
    for y in 0..size {
        for x in 0..size {
            let [r, g, b] = if (x / cell + y / cell) % 2 == 0 {
                light
            } else {
                dark
            };
            match format {
                PixelFormat::Rgb => data.extend_from_slice(&[r, g, b]),
                PixelFormat::Bgr => data.extend_from_slice(&[b, g, r]),
                PixelFormat::Rgba => data.extend_from_slice(&[r, g, b, 255]),
                PixelFormat::Bgra => data.extend_from_slice(&[b, g, r, 255]),
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 5 * 4);
    }

    #[test]
    fn indices_form_two_triangles_over_four_corners() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
        let mut used: Vec<u32> = QUAD_INDICES.to_vec();
        used.sort_unstable();
        used.dedup();
        assert_eq!(used, vec![0, 1, 2, 3]);
    }

    #[test]
    fn checkerboard_is_bgr_and_alternates() {
        let data = checkerboard(4, 2, [255, 0, 0], [0, 0, 255], PixelFormat::Bgr);
        assert!(PixelFormat::Bgr.validate(4, 4, data.len()).is_ok());
        // (0, 0) light red, stored as B, G, R
        assert_eq!(&data[0..3], &[0, 0, 255]);
        // (2, 0) dark blue
        assert_eq!(&data[6..9], &[255, 0, 0]);
        // (2, 2) back to light
        let idx = (2 * 4 + 2) * 3;
        assert_eq!(&data[idx..idx + 3], &[0, 0, 255]);
    }

    #[test]
    fn checkerboard_follows_requested_channel_order() {
        let light = [10, 20, 30];
        let dark = [0, 0, 0];
        let rgba = checkerboard(2, 1, light, dark, PixelFormat::Rgba);
        assert!(PixelFormat::Rgba.validate(2, 2, rgba.len()).is_ok());
        assert_eq!(&rgba[0..4], &[10, 20, 30, 255]);

        let bgra = checkerboard(2, 1, light, dark, PixelFormat::Bgra);
        assert_eq!(&bgra[0..4], &[30, 20, 10, 255]);

        let rgb = checkerboard(2, 1, light, dark, PixelFormat::Rgb);
        assert_eq!(rgb.len(), 12);
        assert_eq!(&rgb[0..3], &[10, 20, 30]);
    }
}
