//! Immediate-mode GUI overlay.
//!
//! [`GuiOverlay`] ties egui to the SDL window: it turns the frame's SDL
//! events into egui input, lays out the dockspace whose scene tab shows the
//! offscreen surface, and paints the result with `egui_glow`. A frame is
//! `begin_frame` → `draw_dockspace` → `end_frame` → `present`.

pub mod input;
pub mod panels;
pub mod viewports;

use std::sync::Arc;

use egui::mutex::Mutex;
use egui::{ClippedPrimitive, TexturesDelta, ViewportBuilder, ViewportClass, ViewportId};
use egui_dock::{DockArea, DockState};

use crate::abs::{OffscreenSurface, Texture, WindowContext};
use crate::error::{HarnessError, Result};

use self::input::InputTranslator;
use self::panels::{FrameStats, Panel, PanelViewer};
use self::viewports::SecondaryViewports;

/// State shared with the stats viewport, whose callback may run outside the
/// main frame.
#[derive(Debug, Default)]
struct SharedStats {
    stats: FrameStats,
    open: bool,
}

/// Tessellated output of one GUI frame, ready to paint.
pub struct FrameOutput {
    pub primitives: Vec<ClippedPrimitive>,
    pub textures_delta: TexturesDelta,
    pub pixels_per_point: f32,
    viewports: egui::ViewportIdMap<egui::ViewportOutput>,
}

pub struct GuiOverlay {
    ctx: egui::Context,
    painter: egui_glow::Painter,
    input: InputTranslator,
    dock: DockState<Panel>,
    scene_texture: egui::TextureId,
    multi_viewport: bool,
    viewports: SecondaryViewports,
    shared: Arc<Mutex<SharedStats>>,
}

impl GuiOverlay {
    /// Sets up egui and its GL painter. `scene` is the texture the scene tab
    /// displays; its GL name must stay valid for the overlay's lifetime.
    pub fn new(window: &WindowContext, scene: &Texture, multi_viewport: bool) -> Result<Self> {
        let mut painter = egui_glow::Painter::new(Arc::clone(&window.gl), "", None, false)
            .map_err(|e| HarnessError::GuiInitFailed(format!("{e:?}")))?;
        let scene_texture = painter.register_native_texture(scene.raw());

        let ctx = egui::Context::default();
        ctx.set_visuals(egui::Visuals::dark());
        ctx.set_embed_viewports(!multi_viewport);

        log::info!(
            "GUI initialized (multi-viewport {})",
            if multi_viewport { "on" } else { "off" }
        );

        Ok(Self {
            ctx,
            painter,
            input: InputTranslator::default(),
            dock: panels::default_layout(),
            scene_texture,
            multi_viewport,
            viewports: SecondaryViewports::default(),
            shared: Arc::new(Mutex::new(SharedStats::default())),
        })
    }

    /// Feeds this frame's window events to egui and starts a GUI pass.
    pub fn begin_frame(&mut self, window: &WindowContext) {
        for event in window.events() {
            if !self.viewports.route_event(event) {
                self.input.push(event);
            }
        }
        let (w, h) = window.size();
        let raw_input = self.input.take_raw_input(
            ViewportId::ROOT,
            egui::vec2(w as f32, h as f32),
            window.pixels_per_point(),
            window.elapsed().as_secs_f64(),
            self.painter.max_texture_side(),
        );
        self.ctx.begin_pass(raw_input);
    }

    /// Lays out the dockspace over the whole window.
    ///
    /// Returns the scene tab's content size in points if it was visible.
    pub fn draw_dockspace(&mut self) -> Option<egui::Vec2> {
        let (stats, mut open) = {
            let shared = self.shared.lock();
            (shared.stats.clone(), shared.open)
        };
        let mut viewer = PanelViewer::new(self.scene_texture, &stats, &mut open);
        DockArea::new(&mut self.dock)
            .style(egui_dock::Style::from_egui(self.ctx.style().as_ref()))
            .show_close_buttons(false)
            .show(&self.ctx, &mut viewer);
        let scene_size = viewer.scene_size();
        self.shared.lock().open = open;
        scene_size
    }

    /// Shows the frame stats viewport if it is open. With multi-viewport on
    /// it becomes its own OS window, otherwise an embedded GUI window.
    pub fn draw_stats_window(&mut self) {
        if !self.shared.lock().open {
            return;
        }
        let shared = Arc::clone(&self.shared);
        self.ctx.show_viewport_deferred(
            ViewportId::from_hash_of("frame_stats"),
            ViewportBuilder::default()
                .with_title("Frame Stats")
                .with_inner_size([280.0, 120.0]),
            move |ctx, class| {
                let stats = shared.lock().stats.clone();
                match class {
                    ViewportClass::Embedded => {
                        let mut open = true;
                        egui::Window::new("Frame Stats")
                            .open(&mut open)
                            .resizable(false)
                            .show(ctx, |ui| stats.ui(ui));
                        if !open {
                            shared.lock().open = false;
                        }
                    }
                    _ => {
                        egui::CentralPanel::default().show(ctx, |ui| stats.ui(ui));
                        if ctx.input(|i| i.viewport().close_requested()) {
                            shared.lock().open = false;
                        }
                    }
                }
            },
        );
    }

    /// Ends the GUI pass and tessellates it.
    pub fn end_frame(&mut self) -> FrameOutput {
        let output = self.ctx.end_pass();
        let primitives = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        FrameOutput {
            primitives,
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
            viewports: output.viewport_output,
        }
    }

    /// Paints the GUI into the window's default framebuffer, then any
    /// secondary viewport windows.
    pub fn present(&mut self, window: &WindowContext, output: FrameOutput) {
        let (width, height) = window.drawable_size();
        self.painter.paint_and_update_textures(
            [width, height],
            output.pixels_per_point,
            &output.primitives,
            &output.textures_delta,
        );

        if self.multi_viewport {
            self.viewports.sync(&window.video_subsystem, &output.viewports);
            if !self.viewports.is_empty() {
                self.viewports.render(
                    &self.ctx,
                    &mut self.painter,
                    &window.gl_context,
                    window.elapsed().as_secs_f64(),
                );
                // The secondary windows left the context current on themselves.
                window.make_current();
            }
        }
    }

    /// Publishes this frame's numbers to the inspector and stats window.
    pub fn set_stats(&mut self, stats: FrameStats) {
        self.shared.lock().stats = stats;
    }

    /// Closes secondary windows and frees the painter's GL objects. Must
    /// run while the GL context is still alive.
    ///
    /// The painter deletes the registered scene texture, so `scene` stops
    /// owning it.
    pub fn destroy(&mut self, scene: &mut OffscreenSurface) {
        self.viewports.clear();
        self.painter.destroy();
        scene.release_texture();
        log::info!("GUI shut down");
    }
}
