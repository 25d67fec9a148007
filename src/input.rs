/// Input handling
/// Translates window events into camera motion and scene actions
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pixels per wheel line for touchpads reporting pixel deltas
const PIXELS_PER_LINE: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    /// Yaw and pitch by a pixel drag
    Orbit { dx: f64, dy: f64 },
    Pan { dx: f64, dy: f64 },
    /// Wheel steps, positive towards the screen
    Zoom(f64),
    SetWireframe(bool),
    /// Multiply the far plane distance
    ScaleFar(f64),
    ResetCamera,
    ShowMorePlanets,
    ShowFewerPlanets,
    Quit,
}

pub struct InputHandler {
    left_pressed: bool,
    right_pressed: bool,
    last_cursor: Option<(f64, f64)>,
    inverted: bool,
    far_step: f64,
}

impl InputHandler {
    pub fn new(far_step: f64) -> Self {
        Self {
            left_pressed: false,
            right_pressed: false,
            last_cursor: None,
            inverted: false,
            far_step,
        }
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn handle_event(&mut self, event: &WindowEvent) -> Vec<InputAction> {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(*code, *state).into_iter().collect(),
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(*button, *state);
                Vec::new()
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor(position.x, position.y)
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                Vec::new()
            }
            WindowEvent::MouseWheel { delta, .. } => self.handle_scroll(delta).into_iter().collect(),
            WindowEvent::Focused(false) => {
                self.left_pressed = false;
                self.right_pressed = false;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Actions fire on press; releases are ignored
    pub fn handle_key(&mut self, code: KeyCode, state: ElementState) -> Option<InputAction> {
        if state != ElementState::Pressed {
            return None;
        }

        match code {
            KeyCode::KeyW => Some(InputAction::SetWireframe(true)),
            KeyCode::KeyF => Some(InputAction::SetWireframe(false)),
            KeyCode::Escape | KeyCode::KeyQ => Some(InputAction::Quit),
            KeyCode::KeyY => {
                self.inverted = !self.inverted;
                log::info!(
                    "Mouse orbit {}",
                    if self.inverted { "inverted" } else { "normal" }
                );
                None
            }
            KeyCode::KeyZ => Some(InputAction::ScaleFar(self.far_step)),
            KeyCode::KeyX => Some(InputAction::ScaleFar(1.0 / self.far_step)),
            KeyCode::KeyC => Some(InputAction::ResetCamera),
            KeyCode::KeyT => Some(InputAction::ShowMorePlanets),
            KeyCode::KeyG => Some(InputAction::ShowFewerPlanets),
            _ => None,
        }
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.left_pressed = pressed,
            MouseButton::Right => self.right_pressed = pressed,
            _ => {}
        }
    }

    pub fn handle_cursor(&mut self, x: f64, y: f64) -> Vec<InputAction> {
        let previous = self.last_cursor.replace((x, y));
        let Some((last_x, last_y)) = previous else {
            return Vec::new();
        };

        let (dx, dy) = (x - last_x, y - last_y);
        if dx == 0.0 && dy == 0.0 {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if self.left_pressed {
            let sign = if self.inverted { -1.0 } else { 1.0 };
            actions.push(InputAction::Orbit {
                dx: sign * dx,
                dy: sign * dy,
            });
        }
        if self.right_pressed {
            actions.push(InputAction::Pan { dx, dy });
        }
        actions
    }

    pub fn handle_scroll(&mut self, delta: &MouseScrollDelta) -> Option<InputAction> {
        let steps = match delta {
            MouseScrollDelta::LineDelta(_, y) => *y as f64,
            MouseScrollDelta::PixelDelta(position) => position.y / PIXELS_PER_LINE,
        };
        (steps != 0.0).then_some(InputAction::Zoom(steps))
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new(crate::config::CameraConfig::default().far_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    fn press(handler: &mut InputHandler, code: KeyCode) -> Option<InputAction> {
        handler.handle_key(code, ElementState::Pressed)
    }

    #[test]
    fn test_key_mapping() {
        let mut input = InputHandler::new(0.9);

        assert_eq!(
            press(&mut input, KeyCode::KeyW),
            Some(InputAction::SetWireframe(true))
        );
        assert_eq!(
            press(&mut input, KeyCode::KeyF),
            Some(InputAction::SetWireframe(false))
        );
        assert_eq!(press(&mut input, KeyCode::Escape), Some(InputAction::Quit));
        assert_eq!(press(&mut input, KeyCode::KeyQ), Some(InputAction::Quit));
        assert_eq!(press(&mut input, KeyCode::KeyC), Some(InputAction::ResetCamera));
        assert_eq!(
            press(&mut input, KeyCode::KeyT),
            Some(InputAction::ShowMorePlanets)
        );
        assert_eq!(
            press(&mut input, KeyCode::KeyG),
            Some(InputAction::ShowFewerPlanets)
        );
        assert_eq!(press(&mut input, KeyCode::KeyA), None);
    }

    #[test]
    fn test_far_plane_keys_are_inverse() {
        let mut input = InputHandler::new(0.8);

        let Some(InputAction::ScaleFar(shrink)) = press(&mut input, KeyCode::KeyZ) else {
            panic!("Z should scale the far plane");
        };
        let Some(InputAction::ScaleFar(grow)) = press(&mut input, KeyCode::KeyX) else {
            panic!("X should scale the far plane");
        };

        assert_eq!(shrink, 0.8);
        approx::assert_relative_eq!(shrink * grow, 1.0);
    }

    #[test]
    fn test_release_does_nothing() {
        let mut input = InputHandler::default();
        assert_eq!(input.handle_key(KeyCode::KeyQ, ElementState::Released), None);
    }

    #[test]
    fn test_no_motion_without_buttons() {
        let mut input = InputHandler::default();
        assert!(input.handle_cursor(10.0, 10.0).is_empty());
        assert!(input.handle_cursor(30.0, 50.0).is_empty());
    }

    #[test]
    fn test_left_drag_orbits() {
        let mut input = InputHandler::default();
        input.handle_cursor(100.0, 100.0);
        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);

        assert_eq!(
            input.handle_cursor(110.0, 95.0),
            vec![InputAction::Orbit { dx: 10.0, dy: -5.0 }]
        );

        input.handle_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(input.handle_cursor(120.0, 95.0).is_empty());
    }

    #[test]
    fn test_inverted_orbit() {
        let mut input = InputHandler::default();
        assert_eq!(press(&mut input, KeyCode::KeyY), None);
        assert!(input.is_inverted());

        input.handle_cursor(0.0, 0.0);
        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert_eq!(
            input.handle_cursor(4.0, 2.0),
            vec![InputAction::Orbit { dx: -4.0, dy: -2.0 }]
        );

        press(&mut input, KeyCode::KeyY);
        assert!(!input.is_inverted());
    }

    #[test]
    fn test_right_drag_pans() {
        let mut input = InputHandler::default();
        input.handle_mouse_button(MouseButton::Right, ElementState::Pressed);
        // First position only seeds the cursor
        assert!(input.handle_cursor(50.0, 50.0).is_empty());

        assert_eq!(
            input.handle_cursor(47.0, 58.0),
            vec![InputAction::Pan { dx: -3.0, dy: 8.0 }]
        );
    }

    #[test]
    fn test_scroll() {
        let mut input = InputHandler::default();

        assert_eq!(
            input.handle_scroll(&MouseScrollDelta::LineDelta(0.0, -2.0)),
            Some(InputAction::Zoom(-2.0))
        );
        assert_eq!(
            input.handle_scroll(&MouseScrollDelta::PixelDelta(PhysicalPosition::new(
                0.0, 80.0
            ))),
            Some(InputAction::Zoom(2.0))
        );
        assert_eq!(
            input.handle_scroll(&MouseScrollDelta::LineDelta(1.0, 0.0)),
            None
        );
    }
}
