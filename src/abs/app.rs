//! SDL2 and OpenGL window management.
//!
//! This module defines the [`WindowContext`] struct which owns the OS
//! window, its OpenGL context and the SDL event pump.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glow::HasContext;
use sdl2::event::{Event, WindowEvent};

use crate::config::WindowConfig;
use crate::error::{HarnessError, Result};

/// Context creation hints, gathered before any window exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextHints {
    pub major: u8,
    pub minor: u8,
    pub core_profile: bool,
    pub forward_compatible: bool,
}

impl Default for ContextHints {
    fn default() -> Self {
        Self {
            major: 3,
            minor: 3,
            core_profile: true,
            forward_compatible: true,
        }
    }
}

impl ContextHints {
    /// The `#version` line matching these hints.
    pub fn glsl_version(&self) -> String {
        let profile = if self.core_profile { " core" } else { "" };
        format!("#version {}{}0{}", self.major, self.minor, profile)
    }
}

/// The [`WindowContext`] struct encapsulates the SDL2 window and OpenGL context.
///
/// Fields drop in declaration order: GL function table, GL context,
/// window, event pump, then SDL itself.
pub struct WindowContext {
    pub gl: Arc<glow::Context>,
    pub gl_context: sdl2::video::GLContext,
    pub window: sdl2::video::Window,
    pub event_pump: sdl2::EventPump,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub sdl: sdl2::Sdl,
    events: Vec<Event>,
    size: (u32, u32),
    close_requested: bool,
    started: Instant,
}

impl WindowContext {
    /// Opens the window and makes its OpenGL context current.
    ///
    /// Any failure here is fatal; nothing is retried.
    pub fn open(config: &WindowConfig, hints: &ContextHints) -> Result<Self> {
        let sdl = sdl2::init().map_err(HarnessError::ContextCreationFailed)?;
        let video_subsystem = sdl.video().map_err(HarnessError::ContextCreationFailed)?;

        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(if hints.core_profile {
            sdl2::video::GLProfile::Core
        } else {
            sdl2::video::GLProfile::Compatibility
        });
        gl_attr.set_context_version(hints.major, hints.minor);
        if hints.forward_compatible {
            gl_attr.set_context_flags().forward_compatible().set();
        }

        let (width, height) = Self::initial_size(&video_subsystem, config)?;

        let mut window = video_subsystem
            .window(&config.title, width, height)
            .opengl()
            .resizable()
            .allow_highdpi()
            .position_centered()
            .build()
            .map_err(|e| HarnessError::ContextCreationFailed(e.to_string()))?;
        window
            .set_fullscreen(if config.fullscreen {
                sdl2::video::FullscreenType::Desktop
            } else {
                sdl2::video::FullscreenType::Off
            })
            .map_err(HarnessError::ContextCreationFailed)?;

        let gl_context = window
            .gl_create_context()
            .map_err(HarnessError::ContextCreationFailed)?;
        window
            .gl_make_current(&gl_context)
            .map_err(HarnessError::ContextCreationFailed)?;

        if video_subsystem.gl_get_proc_address("glGetString").is_null() {
            return Err(HarnessError::GraphicsLoaderFailed(
                "glGetString is not available".to_string(),
            ));
        }
        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let version = unsafe { gl.get_parameter_string(glow::VERSION) };
        if version.is_empty() {
            return Err(HarnessError::GraphicsLoaderFailed(
                "driver reported no OpenGL version".to_string(),
            ));
        }
        log::info!("OpenGL {version} context created");

        let interval = if config.vsync {
            sdl2::video::SwapInterval::VSync
        } else {
            sdl2::video::SwapInterval::Immediate
        };
        if let Err(e) = video_subsystem.gl_set_swap_interval(interval) {
            log::warn!("Failed to set swap interval: {e}");
        }

        let event_pump = sdl
            .event_pump()
            .map_err(HarnessError::ContextCreationFailed)?;

        let mut context = Self {
            gl: Arc::new(gl),
            gl_context,
            size: window.size(),
            window,
            event_pump,
            video_subsystem,
            sdl,
            events: Vec::new(),
            close_requested: false,
            started: Instant::now(),
        };
        context.apply_resize();
        log::info!(
            "Window '{}' opened at {}x{}",
            config.title,
            context.size.0,
            context.size.1
        );
        Ok(context)
    }

    fn initial_size(video: &sdl2::VideoSubsystem, config: &WindowConfig) -> Result<(u32, u32)> {
        if config.fullscreen {
            let mode = video
                .current_display_mode(0)
                .map_err(HarnessError::ContextCreationFailed)?;
            return Ok((mode.w.max(1) as u32, mode.h.max(1) as u32));
        }
        if config.fit_to_workarea {
            match video.display_usable_bounds(0) {
                Ok(area) => {
                    log::debug!(
                        "Sizing window to work area {}x{} at ({}, {})",
                        area.width(),
                        area.height(),
                        area.x(),
                        area.y()
                    );
                    return Ok((area.width(), area.height()));
                }
                Err(e) => log::warn!("Could not query display work area, using configured size: {e}"),
            }
        }
        Ok((config.width, config.height))
    }

    /// Drains pending OS events into this frame's event buffer.
    ///
    /// Main-window size changes update the GL viewport right away.
    pub fn poll_events(&mut self) {
        self.events.clear();
        let events: Vec<Event> = self.event_pump.poll_iter().collect();
        let main_id = self.window.id();
        for event in &events {
            match event {
                Event::Quit { .. } => self.close_requested = true,
                Event::Window {
                    window_id,
                    win_event,
                    ..
                } if *window_id == main_id => match win_event {
                    WindowEvent::SizeChanged(..) | WindowEvent::Resized(..) => self.apply_resize(),
                    WindowEvent::Close => self.close_requested = true,
                    _ => {}
                },
                _ => {}
            }
        }
        self.events = events;
    }

    fn apply_resize(&mut self) {
        self.size = self.window.size();
        let (width, height) = self.window.drawable_size();
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
        }
        log::debug!("Window resized to {}x{} ({width}x{height} px)", self.size.0, self.size.1);
    }

    /// Events collected by the last [`WindowContext::poll_events`].
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn swap_buffers(&self) {
        self.window.gl_swap_window();
    }

    pub fn should_close(&self) -> bool {
        self.close_requested
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Window size in screen coordinates.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Window size in framebuffer pixels.
    pub fn drawable_size(&self) -> (u32, u32) {
        self.window.drawable_size()
    }

    /// Framebuffer pixels per screen coordinate.
    pub fn pixels_per_point(&self) -> f32 {
        let (w, _) = self.size;
        let (dw, _) = self.drawable_size();
        if w == 0 { 1.0 } else { dw as f32 / w as f32 }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Makes this window's context current again, e.g. after drawing to a
    /// secondary window.
    pub fn make_current(&self) {
        if let Err(e) = self.window.gl_make_current(&self.gl_context) {
            log::error!("Failed to restore main OpenGL context: {e}");
        }
    }

    /// Usable bounds of the primary display.
    pub fn monitor_workarea(&self) -> std::result::Result<sdl2::rect::Rect, String> {
        self.video_subsystem.display_usable_bounds(0)
    }
}

impl Drop for WindowContext {
    fn drop(&mut self) {
        log::info!("Window closed");
    }
}
