//! Secondary OS windows for egui viewports.
//!
//! Every secondary window shares the main window's GL context. Painting one
//! makes the context current on it, so the caller must restore the main
//! window afterwards.

use std::sync::Arc;

use egui::{DeferredViewportUiCallback, ViewportId, ViewportIdMap, ViewportOutput};
use fxhash::FxHashMap;
use glow::HasContext;

use super::input::InputTranslator;

const DEFAULT_SIZE: (u32, u32) = (320, 240);

struct SecondaryWindow {
    window: sdl2::video::Window,
    input: InputTranslator,
    ui_cb: Option<Arc<DeferredViewportUiCallback>>,
}

#[derive(Default)]
pub struct SecondaryViewports {
    windows: FxHashMap<ViewportId, SecondaryWindow>,
}

impl SecondaryViewports {
    /// Hands an event to the secondary window it belongs to. Returns
    /// `false` if no secondary window claims it.
    pub fn route_event(&mut self, event: &sdl2::event::Event) -> bool {
        let Some(window_id) = event.get_window_id() else {
            return false;
        };
        match self
            .windows
            .values_mut()
            .find(|w| w.window.id() == window_id)
        {
            Some(target) => {
                target.input.push(event);
                true
            }
            None => false,
        }
    }

    /// Opens windows for new viewports and closes those egui no longer shows.
    pub fn sync(
        &mut self,
        video: &sdl2::VideoSubsystem,
        outputs: &ViewportIdMap<ViewportOutput>,
    ) {
        self.windows
            .retain(|id, _| outputs.contains_key(id) && *id != ViewportId::ROOT);

        for (id, output) in outputs {
            if *id == ViewportId::ROOT {
                continue;
            }
            if let Some(existing) = self.windows.get_mut(id) {
                existing.ui_cb = output.viewport_ui_cb.clone();
                continue;
            }
            let title = output
                .builder
                .title
                .clone()
                .unwrap_or_else(|| "dockview".to_string());
            let (width, height) = output
                .builder
                .inner_size
                .map(|s| (s.x.max(1.0) as u32, s.y.max(1.0) as u32))
                .unwrap_or(DEFAULT_SIZE);
            match video
                .window(&title, width, height)
                .opengl()
                .resizable()
                .allow_highdpi()
                .build()
            {
                Ok(window) => {
                    log::debug!("Opened viewport window '{title}'");
                    self.windows.insert(
                        *id,
                        SecondaryWindow {
                            window,
                            input: InputTranslator::default(),
                            ui_cb: output.viewport_ui_cb.clone(),
                        },
                    );
                }
                Err(e) => log::error!("Failed to open viewport window '{title}': {e}"),
            }
        }
    }

    /// Runs and paints every secondary viewport.
    pub fn render(
        &mut self,
        ctx: &egui::Context,
        painter: &mut egui_glow::Painter,
        gl_context: &sdl2::video::GLContext,
        time: f64,
    ) {
        for (id, secondary) in &mut self.windows {
            let Some(ui_cb) = secondary.ui_cb.clone() else {
                continue;
            };
            let (w, h) = secondary.window.size();
            let (dw, dh) = secondary.window.drawable_size();
            let pixels_per_point = if w == 0 { 1.0 } else { dw as f32 / w as f32 };

            let raw_input = secondary.input.take_raw_input(
                *id,
                egui::vec2(w as f32, h as f32),
                pixels_per_point,
                time,
                painter.max_texture_side(),
            );
            let output = ctx.run(raw_input, |ctx| ui_cb(ctx));
            let primitives = ctx.tessellate(output.shapes, output.pixels_per_point);

            if let Err(e) = secondary.window.gl_make_current(gl_context) {
                log::error!("Failed to make viewport window current: {e}");
                continue;
            }
            unsafe {
                let gl = painter.gl();
                gl.viewport(0, 0, dw as i32, dh as i32);
                gl.clear_color(0.0, 0.0, 0.0, 1.0);
                gl.clear(glow::COLOR_BUFFER_BIT);
            }
            painter.paint_and_update_textures(
                [dw, dh],
                output.pixels_per_point,
                &primitives,
                &output.textures_delta,
            );
            secondary.window.gl_swap_window();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn clear(&mut self) {
        self.windows.clear();
    }
}
