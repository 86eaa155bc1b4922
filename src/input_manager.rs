use std::collections::VecDeque;

use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Raw pointer deltas, queued as they arrive and drained once per frame
/// before the camera matrices are computed. This keeps the frame loop
/// deterministic with respect to input timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Drag { dx: f32, dy: f32 },
    Wheel { delta: f32 },
}

pub struct InputManager {
    events: VecDeque<InputEvent>,
    dragging: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
            dragging: false,
            last_cursor: None,
        }
    }

    /// Translates window events into queued drag/wheel deltas.
    pub fn process_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
                if !self.dragging {
                    self.last_cursor = None;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.dragging {
                    if let Some(last) = self.last_cursor {
                        self.queue_drag(
                            (position.x - last.x) as f32,
                            (position.y - last.y) as f32,
                        );
                    }
                }
                self.last_cursor = Some(*position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // Normalize line scrolling to roughly pixel-sized notches, and
                // flip so that scrolling up zooms in.
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * 50.0,
                    MouseScrollDelta::PixelDelta(position) => -position.y as f32,
                };
                self.queue_wheel(delta);
            }
            _ => {}
        }
    }

    pub fn queue_drag(&mut self, dx: f32, dy: f32) {
        self.events.push_back(InputEvent::Drag { dx, dy });
    }

    pub fn queue_wheel(&mut self, delta: f32) {
        self.events.push_back(InputEvent::Wheel { delta });
    }

    /// Hands out everything queued since the last drain, in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_drain_in_order_and_once() {
        let mut input = InputManager::new();
        input.queue_drag(1.0, 2.0);
        input.queue_wheel(-3.0);
        input.queue_drag(4.0, 5.0);

        let drained: Vec<_> = input.drain().collect();
        assert_eq!(
            drained,
            vec![
                InputEvent::Drag { dx: 1.0, dy: 2.0 },
                InputEvent::Wheel { delta: -3.0 },
                InputEvent::Drag { dx: 4.0, dy: 5.0 },
            ]
        );
        assert_eq!(input.drain().count(), 0);
    }
}
