//! The harness application: a textured quad rendered offscreen and shown in
//! a docked GUI panel.

use std::sync::Arc;
use std::time::Duration;

use glam::{Vec2, Vec4};
use glow::HasContext;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use crate::abs::{
    ContextHints, Extent, Mesh, OffscreenSurface, ShaderProgram, SurfaceStatus, Texture,
    WindowContext,
};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::gui::GuiOverlay;
use crate::gui::panels::FrameStats;
use crate::hotreload::{HotProgram, ReloadOutcome, SourceWatch};
use crate::lifecycle::Lifecycle;
use crate::quad::{QUAD_INDICES, QUAD_VERTICES, checkerboard};

const CHECKER_SIZE: u32 = 64;
const CHECKER_CELL: u32 = 8;

/// Animation timing.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<Duration>,
    elapsed: f32,
    delta: f32,
    fps: f32,
    frame: u64,
}

impl FrameClock {
    /// Advances the clock to `now`, measured from any fixed origin.
    pub fn tick(&mut self, now: Duration) {
        let delta = match self.last {
            Some(last) => now.saturating_sub(last).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        self.elapsed = now.as_secs_f32();
        self.delta = delta;
        self.frame += 1;
        if delta > 0.0 {
            let instant = 1.0 / delta;
            self.fps = if self.fps == 0.0 {
                instant
            } else {
                self.fps * 0.9 + instant * 0.1
            };
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// Every GPU-side object created by [`Viewer::load_content`].
pub struct RenderResources {
    gui: GuiOverlay,
    program: HotProgram<ShaderProgram>,
    surface: OffscreenSurface,
    quad: Mesh,
    checker: Texture,
    last_reload: ReloadOutcome,
}

pub struct Viewer {
    config: HarnessConfig,
    clock: FrameClock,
    gl_version: String,
}

impl Viewer {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            clock: FrameClock::default(),
            gl_version: String::new(),
        }
    }

    fn stats(&self, res: &RenderResources) -> FrameStats {
        let extent = res.surface.extent();
        FrameStats {
            frame: self.clock.frame(),
            fps: self.clock.fps(),
            frame_time_ms: self.clock.delta() * 1000.0,
            surface_size: (extent.width(), extent.height()),
            surface_reallocations: res.surface.reallocations(),
            surface_complete: res.surface.status() == SurfaceStatus::Complete,
            program_id: res.program.program().raw_id(),
            shader_generation: res.program.generation(),
            shader_error: res.program.last_error().map(str::to_string),
            gl_version: self.gl_version.clone(),
        }
    }

    fn draw_scene(&self, gl: &glow::Context, res: &RenderResources) {
        let extent = res.surface.extent();
        let [r, g, b, a] = self.config.scene_clear_color;

        res.surface.bind();
        unsafe {
            // The GUI painter leaves these enabled.
            gl.disable(glow::SCISSOR_TEST);
            gl.disable(glow::BLEND);
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }

        let program = res.program.program();
        program.use_program();
        program.set_uniform("u_time", self.clock.elapsed());
        program.set_uniform(
            "u_resolution",
            Vec2::new(extent.width() as f32, extent.height() as f32),
        );
        program.set_uniform("u_texture", 0);
        program.set_uniform("u_tint", Vec4::ONE);
        res.checker.bind(0);
        res.quad.draw();

        OffscreenSurface::unbind(gl);
    }
}

impl Lifecycle for Viewer {
    type Window = WindowContext;
    type Resources = RenderResources;

    fn initialize(&mut self, hints: &mut ContextHints) {
        *hints = ContextHints::default();
        log::debug!(
            "Requesting OpenGL {}.{} context ({})",
            hints.major,
            hints.minor,
            hints.glsl_version()
        );
    }

    fn load_content(&mut self, window: &mut WindowContext) -> Result<RenderResources> {
        let gl = Arc::clone(&window.gl);
        self.gl_version = unsafe { gl.get_parameter_string(glow::VERSION) };
        match window.monitor_workarea() {
            Ok(area) => log::info!(
                "Display work area {}x{} at ({}, {})",
                area.width(),
                area.height(),
                area.x(),
                area.y()
            ),
            Err(e) => log::warn!("Display work area unavailable: {e}"),
        }

        let shaders = &self.config.shaders;
        let watch = SourceWatch::new(&shaders.vertex, &shaders.fragment);
        let program = HotProgram::load(watch, |src| {
            ShaderProgram::from_sources(&gl, &src.vertex, &src.fragment)
        })?;
        let (vertex, fragment) = program.watch().paths();
        log::info!(
            "Loaded shader program {} from {} and {}",
            program.program().raw_id(),
            vertex.display(),
            fragment.display()
        );

        let quad = Mesh::new(&gl, &QUAD_VERTICES, &QUAD_INDICES, glow::TRIANGLES)?;

        let format = self.config.checker_format;
        let pixels = checkerboard(
            CHECKER_SIZE,
            CHECKER_CELL,
            [230, 230, 230],
            [200, 60, 40],
            format,
        );
        let checker = Texture::from_pixels(&gl, CHECKER_SIZE, CHECKER_SIZE, format, &pixels)?;
        log::debug!(
            "Uploaded {}x{} checker texture and {}-index quad",
            checker.width(),
            checker.height(),
            quad.index_count()
        );

        // The panel reports its real size on the first frame.
        let (w, h) = window.drawable_size();
        let initial = Extent::new(w.max(1), h.max(1)).ok_or_else(|| {
            HarnessError::GpuAllocationFailed(format!("invalid surface size {w}x{h}"))
        })?;
        let surface =
            OffscreenSurface::new(&gl, initial).map_err(HarnessError::GpuAllocationFailed)?;

        let gui = GuiOverlay::new(window, surface.texture(), self.config.multi_viewport)?;

        Ok(RenderResources {
            gui,
            program,
            surface,
            quad,
            checker,
            last_reload: ReloadOutcome::Unchanged,
        })
    }

    fn update(&mut self, window: &mut WindowContext, res: &mut RenderResources) {
        self.clock.tick(window.elapsed());

        let escape = window.events().iter().any(|e| {
            matches!(
                e,
                Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    window_id,
                    ..
                } if *window_id == window.window.id()
            )
        });
        if escape {
            window.request_close();
        }

        if self.config.hot_reload {
            let gl = Arc::clone(&window.gl);
            let outcome = res.program.update(|src| {
                ShaderProgram::from_sources(&gl, &src.vertex, &src.fragment)
            });
            if outcome != ReloadOutcome::Unchanged {
                res.last_reload = outcome;
            }
        }

        let stats = self.stats(res);
        res.gui.set_stats(stats);
    }

    fn render(&mut self, window: &mut WindowContext, res: &mut RenderResources) {
        let gl = Arc::clone(&window.gl);
        let (width, height) = window.drawable_size();
        let [r, g, b, a] = self.config.clear_color;
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.viewport(0, 0, width as i32, height as i32);
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }

        res.gui.begin_frame(window);
        let panel_size = res.gui.draw_dockspace();
        res.gui.draw_stats_window();
        let output = res.gui.end_frame();

        if let Some(extent) = panel_extent(panel_size, output.pixels_per_point) {
            res.surface.resize(extent);
        }
        self.draw_scene(&gl, res);

        res.gui.present(window, output);
        window.swap_buffers();
    }

    fn unload(&mut self, _window: &mut WindowContext, mut res: RenderResources) {
        res.gui.destroy(&mut res.surface);
        if res.last_reload == ReloadOutcome::Failed {
            log::warn!("Exiting with the last shader edit still failing to compile");
        }
        drop(res);
        log::info!("Released GPU resources");
    }
}

/// Pixel extent for the scene panel's reported size, if it has one.
fn panel_extent(size: Option<egui::Vec2>, pixels_per_point: f32) -> Option<Extent> {
    size.and_then(|s| Extent::from_points(Vec2::new(s.x, s.y), pixels_per_point))
}
