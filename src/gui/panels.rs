//! Dock tabs and their contents.

use egui::load::SizedTexture;
use egui::{Rect, TextureId, Ui, Vec2, WidgetText, pos2};
use egui_dock::{DockState, NodeIndex, TabViewer};

/// Per-frame numbers shown by the inspector and the stats window.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    pub frame: u64,
    pub fps: f32,
    pub frame_time_ms: f32,
    pub surface_size: (u32, u32),
    pub surface_reallocations: u64,
    pub surface_complete: bool,
    pub program_id: u32,
    pub shader_generation: u64,
    pub shader_error: Option<String>,
    pub gl_version: String,
}

impl FrameStats {
    pub fn ui(&self, ui: &mut Ui) {
        egui::Grid::new("frame_stats")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Frame");
                ui.label(self.frame.to_string());
                ui.end_row();
                ui.label("FPS");
                ui.label(format!("{:.1} ({:.2} ms)", self.fps, self.frame_time_ms));
                ui.end_row();
                ui.label("Surface");
                ui.label(format!(
                    "{}x{} ({} resizes)",
                    self.surface_size.0, self.surface_size.1, self.surface_reallocations
                ));
                ui.end_row();
            });
    }

    fn inspector_ui(&self, ui: &mut Ui) {
        self.ui(ui);
        ui.separator();
        ui.label(format!("OpenGL {}", self.gl_version));
        if !self.surface_complete {
            ui.colored_label(ui.visuals().warn_fg_color, "Framebuffer incomplete");
        }
        ui.label(format!(
            "Program {} (reloaded {} times)",
            self.program_id, self.shader_generation
        ));
        if let Some(err) = &self.shader_error {
            ui.colored_label(ui.visuals().error_fg_color, "Last reload failed:");
            ui.monospace(err);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Scene,
    Inspector,
}

impl Panel {
    pub fn title(self) -> &'static str {
        match self {
            Panel::Scene => "Game Window",
            Panel::Inspector => "Inspector",
        }
    }
}

/// The scene tab fills most of the area with the inspector docked right.
pub fn default_layout() -> DockState<Panel> {
    let mut state = DockState::new(vec![Panel::Scene]);
    state
        .main_surface_mut()
        .split_right(NodeIndex::root(), 0.75, vec![Panel::Inspector]);
    state
}

/// Fills the dock tabs for one frame and remembers the scene tab's size.
pub struct PanelViewer<'a> {
    scene_texture: TextureId,
    stats: &'a FrameStats,
    show_stats_window: &'a mut bool,
    scene_size: Option<Vec2>,
}

impl<'a> PanelViewer<'a> {
    pub fn new(
        scene_texture: TextureId,
        stats: &'a FrameStats,
        show_stats_window: &'a mut bool,
    ) -> Self {
        Self {
            scene_texture,
            stats,
            show_stats_window,
            scene_size: None,
        }
    }

    /// Content size of the scene tab, in points. `None` if the tab was not
    /// visible this frame.
    pub fn scene_size(&self) -> Option<Vec2> {
        self.scene_size
    }
}

impl TabViewer for PanelViewer<'_> {
    type Tab = Panel;

    fn title(&mut self, tab: &mut Panel) -> WidgetText {
        tab.title().into()
    }

    fn ui(&mut self, ui: &mut Ui, tab: &mut Panel) {
        match tab {
            Panel::Scene => {
                self.scene_size = Some(draw_image_panel(ui, self.scene_texture));
            }
            Panel::Inspector => {
                self.stats.inspector_ui(ui);
                ui.separator();
                ui.checkbox(self.show_stats_window, "Frame stats window");
            }
        }
    }
}

/// Shows `texture` filling the remaining space of `ui` and returns that
/// space's size in points.
///
/// The V axis is flipped because GL textures start at the bottom row.
pub fn draw_image_panel(ui: &mut Ui, texture: TextureId) -> Vec2 {
    let size = ui.available_size();
    if size.x >= 1.0 && size.y >= 1.0 {
        ui.add(
            egui::Image::new(SizedTexture::new(texture, size))
                .uv(Rect::from_min_max(pos2(0.0, 1.0), pos2(1.0, 0.0)))
                .fit_to_exact_size(size),
        );
    }
    size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_holds_both_tabs() {
        let state = default_layout();
        let tabs: Vec<Panel> = state.iter_all_tabs().map(|(_, tab)| *tab).collect();
        assert_eq!(tabs.len(), 2);
        assert!(tabs.contains(&Panel::Scene));
        assert!(tabs.contains(&Panel::Inspector));
    }

    #[test]
    fn scene_tab_reports_its_content_size() {
        let ctx = egui::Context::default();
        let mut state = default_layout();
        let stats = FrameStats::default();
        let mut show = false;
        let mut reported = None;

        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(egui::Pos2::ZERO, Vec2::new(800.0, 600.0))),
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            let mut viewer = PanelViewer::new(TextureId::User(7), &stats, &mut show);
            egui_dock::DockArea::new(&mut state).show(ctx, &mut viewer);
            reported = viewer.scene_size();
        });

        let size = reported.expect("scene tab was drawn");
        assert!(size.x > 0.0 && size.y > 0.0);
        // The panel, not the 800x600 window, decides the size.
        assert!(size.x < 800.0 && size.y < 600.0);
    }
}
