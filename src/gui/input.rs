//! Translation of SDL2 events into egui input.
//!
//! SDL reports mouse positions in screen coordinates, which are exactly
//! egui points, so no scaling is applied here. The pixels-per-point factor
//! only enters through [`InputTranslator::take_raw_input`].

use egui::{Modifiers, PointerButton, Pos2, RawInput, Rect, Vec2, ViewportId, ViewportIdMap};
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::{Keycode, Mod};
use sdl2::mouse::MouseButton;

/// Collects one viewport's input between GUI frames.
#[derive(Debug)]
pub struct InputTranslator {
    events: Vec<egui::Event>,
    modifiers: Modifiers,
    focused: bool,
    close_requested: bool,
}

impl Default for InputTranslator {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            modifiers: Modifiers::default(),
            focused: true,
            close_requested: false,
        }
    }
}

impl InputTranslator {
    pub fn push(&mut self, event: &Event) {
        match event {
            Event::MouseMotion { x, y, .. } => {
                self.events.push(egui::Event::PointerMoved(point(*x, *y)));
            }
            Event::MouseButtonDown {
                mouse_btn, x, y, ..
            } => self.push_button(*mouse_btn, *x, *y, true),
            Event::MouseButtonUp {
                mouse_btn, x, y, ..
            } => self.push_button(*mouse_btn, *x, *y, false),
            Event::MouseWheel { x, y, .. } => {
                self.events.push(egui::Event::MouseWheel {
                    unit: egui::MouseWheelUnit::Line,
                    delta: Vec2::new(*x as f32, *y as f32),
                    modifiers: self.modifiers,
                });
            }
            Event::TextInput { text, .. } => {
                // Shortcuts also produce text on some platforms.
                if !self.modifiers.ctrl && !self.modifiers.mac_cmd {
                    self.events.push(egui::Event::Text(text.clone()));
                }
            }
            Event::KeyDown {
                keycode,
                keymod,
                repeat,
                ..
            } => self.push_key(*keycode, *keymod, true, *repeat),
            Event::KeyUp {
                keycode, keymod, ..
            } => self.push_key(*keycode, *keymod, false, false),
            Event::Window { win_event, .. } => match win_event {
                WindowEvent::Leave => self.events.push(egui::Event::PointerGone),
                WindowEvent::FocusGained => {
                    self.focused = true;
                    self.events.push(egui::Event::WindowFocused(true));
                }
                WindowEvent::FocusLost => {
                    self.focused = false;
                    self.events.push(egui::Event::WindowFocused(false));
                }
                WindowEvent::Close => self.close_requested = true,
                _ => {}
            },
            _ => {}
        }
    }

    fn push_button(&mut self, button: MouseButton, x: i32, y: i32, pressed: bool) {
        if let Some(button) = map_button(button) {
            self.events.push(egui::Event::PointerButton {
                pos: point(x, y),
                button,
                pressed,
                modifiers: self.modifiers,
            });
        }
    }

    fn push_key(&mut self, keycode: Option<Keycode>, keymod: Mod, pressed: bool, repeat: bool) {
        self.modifiers = map_modifiers(keymod);
        let Some(key) = keycode.and_then(map_key) else {
            return;
        };
        self.events.push(egui::Event::Key {
            key,
            physical_key: None,
            pressed,
            repeat,
            modifiers: self.modifiers,
        });
    }

    /// Drains the collected events into a [`RawInput`] for `viewport_id`.
    ///
    /// `screen_size` is in points; `pixels_per_point` converts it to the
    /// drawable size.
    pub fn take_raw_input(
        &mut self,
        viewport_id: ViewportId,
        screen_size: Vec2,
        pixels_per_point: f32,
        time: f64,
        max_texture_side: usize,
    ) -> RawInput {
        let screen_rect = Rect::from_min_size(Pos2::ZERO, screen_size);
        let mut info = egui::ViewportInfo {
            native_pixels_per_point: Some(pixels_per_point),
            inner_rect: Some(screen_rect),
            focused: Some(self.focused),
            ..Default::default()
        };
        if std::mem::take(&mut self.close_requested) {
            info.events.push(egui::ViewportEvent::Close);
        }
        let mut viewports = ViewportIdMap::default();
        viewports.insert(viewport_id, info);

        RawInput {
            viewport_id,
            viewports,
            screen_rect: Some(screen_rect),
            max_texture_side: Some(max_texture_side),
            time: Some(time),
            modifiers: self.modifiers,
            events: std::mem::take(&mut self.events),
            focused: self.focused,
            ..Default::default()
        }
    }
}

fn point(x: i32, y: i32) -> Pos2 {
    Pos2::new(x as f32, y as f32)
}

pub fn map_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::X1 => Some(PointerButton::Extra1),
        MouseButton::X2 => Some(PointerButton::Extra2),
        _ => None,
    }
}

pub fn map_modifiers(keymod: Mod) -> Modifiers {
    let ctrl = keymod.intersects(Mod::LCTRLMOD | Mod::RCTRLMOD);
    let gui = keymod.intersects(Mod::LGUIMOD | Mod::RGUIMOD);
    let mac = cfg!(target_os = "macos");
    Modifiers {
        alt: keymod.intersects(Mod::LALTMOD | Mod::RALTMOD),
        ctrl,
        shift: keymod.intersects(Mod::LSHIFTMOD | Mod::RSHIFTMOD),
        mac_cmd: mac && gui,
        command: if mac { gui } else { ctrl },
    }
}

pub fn map_key(keycode: Keycode) -> Option<egui::Key> {
    use egui::Key;
    let key = match keycode {
        Keycode::Escape => Key::Escape,
        Keycode::Tab => Key::Tab,
        Keycode::Backspace => Key::Backspace,
        Keycode::Return | Keycode::KpEnter => Key::Enter,
        Keycode::Space => Key::Space,
        Keycode::Insert => Key::Insert,
        Keycode::Delete => Key::Delete,
        Keycode::Home => Key::Home,
        Keycode::End => Key::End,
        Keycode::PageUp => Key::PageUp,
        Keycode::PageDown => Key::PageDown,
        Keycode::Left => Key::ArrowLeft,
        Keycode::Right => Key::ArrowRight,
        Keycode::Up => Key::ArrowUp,
        Keycode::Down => Key::ArrowDown,
        // Letters, digits and function keys share names with egui.
        other => return Key::from_name(&other.name()),
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_keys_map_to_egui_names() {
        assert_eq!(map_key(Keycode::Return), Some(egui::Key::Enter));
        assert_eq!(map_key(Keycode::Left), Some(egui::Key::ArrowLeft));
        assert_eq!(map_key(Keycode::Tab), Some(egui::Key::Tab));
        assert_eq!(map_key(Keycode::A), Some(egui::Key::A));
        assert_eq!(map_key(Keycode::F5), Some(egui::Key::F5));
        assert_eq!(map_key(Keycode::LCtrl), None);
    }

    #[test]
    fn modifiers_merge_left_and_right() {
        let m = map_modifiers(Mod::RSHIFTMOD | Mod::LALTMOD);
        assert!(m.shift && m.alt);
        assert!(!m.ctrl);

        let m = map_modifiers(Mod::RCTRLMOD);
        assert!(m.ctrl);
        assert_eq!(m.command, !cfg!(target_os = "macos"));
    }

    #[test]
    fn buttons_map_to_pointer_buttons() {
        assert_eq!(map_button(MouseButton::Left), Some(PointerButton::Primary));
        assert_eq!(map_button(MouseButton::Right), Some(PointerButton::Secondary));
        assert_eq!(map_button(MouseButton::Unknown), None);
    }

    #[test]
    fn raw_input_drains_events_once() {
        let mut input = InputTranslator::default();
        input.push(&Event::TextInput {
            timestamp: 0,
            window_id: 1,
            text: "hi".to_string(),
        });
        input.push(&Event::Quit { timestamp: 0 });

        let raw = input.take_raw_input(
            ViewportId::ROOT,
            Vec2::new(640.0, 480.0),
            2.0,
            1.5,
            4096,
        );
        assert_eq!(raw.events, vec![egui::Event::Text("hi".to_string())]);
        assert_eq!(
            raw.screen_rect,
            Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(640.0, 480.0)))
        );
        assert_eq!(
            raw.viewports[&ViewportId::ROOT].native_pixels_per_point,
            Some(2.0)
        );
        assert_eq!(raw.time, Some(1.5));

        let raw = input.take_raw_input(ViewportId::ROOT, Vec2::new(640.0, 480.0), 2.0, 1.6, 4096);
        assert!(raw.events.is_empty());
    }

    #[test]
    fn close_request_is_reported_once() {
        let mut input = InputTranslator::default();
        input.push(&Event::Window {
            timestamp: 0,
            window_id: 2,
            win_event: WindowEvent::Close,
        });
        let id = ViewportId::from_hash_of("frame_stats");
        let raw = input.take_raw_input(id, Vec2::new(200.0, 100.0), 1.0, 0.0, 4096);
        assert_eq!(raw.viewports[&id].events, vec![egui::ViewportEvent::Close]);

        let raw = input.take_raw_input(id, Vec2::new(200.0, 100.0), 1.0, 0.0, 4096);
        assert!(raw.viewports[&id].events.is_empty());
    }
}
