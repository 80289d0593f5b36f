//! Keyboard and mouse state fed by the window procedure.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
}

impl MouseButton {
    fn bit(self) -> u8 {
        match self {
            MouseButton::Left => 1 << 0,
            MouseButton::Right => 1 << 1,
            MouseButton::Middle => 1 << 2,
            MouseButton::X1 => 1 << 3,
            MouseButton::X2 => 1 << 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(u8),
    KeyUp(u8),
    MouseMove { x: i32, y: i32 },
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    /// Wheel delta in multiples of `WHEEL_DELTA` (120) per notch.
    Wheel(i32),
    FocusLost,
}

/// Pressed state of all 256 virtual keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardState {
    keys: [u64; 4],
}

impl KeyboardState {
    pub fn is_key_down(&self, key: u8) -> bool {
        self.keys[(key / 64) as usize] & (1 << (key % 64)) != 0
    }

    pub fn set_key(&mut self, key: u8, down: bool) {
        let mask = 1 << (key % 64);
        let word = &mut self.keys[(key / 64) as usize];
        if down {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    pub fn pressed_keys(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|key| self.is_key_down(*key))
    }

    pub fn release_all(&mut self) {
        self.keys = [0; 4];
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseState {
    pub x: i32,
    pub y: i32,
    buttons: u8,
    pub scroll_wheel_value: i32,
}

impl MouseState {
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons & button.bit() != 0
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        if down {
            self.buttons |= button.bit();
        } else {
            self.buttons &= !button.bit();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    pub keyboard: KeyboardState,
    pub mouse: MouseState,
}

impl InputState {
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => self.keyboard.set_key(key, true),
            InputEvent::KeyUp(key) => self.keyboard.set_key(key, false),
            InputEvent::MouseMove { x, y } => {
                self.mouse.x = x;
                self.mouse.y = y;
            }
            InputEvent::ButtonDown(button) => self.mouse.set_button(button, true),
            InputEvent::ButtonUp(button) => self.mouse.set_button(button, false),
            InputEvent::Wheel(delta) => {
                self.mouse.scroll_wheel_value = self.mouse.scroll_wheel_value.saturating_add(delta)
            }
            InputEvent::FocusLost => {
                self.keyboard.release_all();
                self.mouse.buttons = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VK_ESCAPE: u8 = 0x1B;
    const VK_W: u8 = b'W';

    #[test]
    fn key_repeat_is_idempotent() {
        let mut input = InputState::default();
        input.apply(InputEvent::KeyDown(VK_W));
        input.apply(InputEvent::KeyDown(VK_W));
        assert!(input.keyboard.is_key_down(VK_W));
        assert_eq!(input.keyboard.pressed_keys().collect::<Vec<_>>(), vec![VK_W]);

        input.apply(InputEvent::KeyUp(VK_W));
        assert!(!input.keyboard.is_key_down(VK_W));
        assert_eq!(input.keyboard.pressed_keys().count(), 0);
    }

    #[test]
    fn keys_span_all_words() {
        let mut keyboard = KeyboardState::default();
        for key in [0u8, 63, 64, 127, 128, 255] {
            keyboard.set_key(key, true);
        }
        assert_eq!(
            keyboard.pressed_keys().collect::<Vec<_>>(),
            vec![0, 63, 64, 127, 128, 255]
        );
        assert!(!keyboard.is_key_down(VK_ESCAPE));
    }

    #[test]
    fn mouse_tracks_position_buttons_and_wheel() {
        let mut input = InputState::default();
        input.apply(InputEvent::MouseMove { x: 10, y: -4 });
        input.apply(InputEvent::ButtonDown(MouseButton::Left));
        input.apply(InputEvent::ButtonDown(MouseButton::X2));
        input.apply(InputEvent::Wheel(120));
        input.apply(InputEvent::Wheel(-240));
        input.apply(InputEvent::ButtonUp(MouseButton::Left));

        assert_eq!((input.mouse.x, input.mouse.y), (10, -4));
        assert!(!input.mouse.is_button_down(MouseButton::Left));
        assert!(input.mouse.is_button_down(MouseButton::X2));
        assert_eq!(input.mouse.scroll_wheel_value, -120);
    }

    #[test]
    fn losing_focus_releases_everything() {
        let mut input = InputState::default();
        input.apply(InputEvent::KeyDown(VK_ESCAPE));
        input.apply(InputEvent::ButtonDown(MouseButton::Right));
        input.apply(InputEvent::MouseMove { x: 3, y: 4 });
        input.apply(InputEvent::FocusLost);

        assert!(!input.keyboard.is_key_down(VK_ESCAPE));
        assert!(!input.mouse.is_button_down(MouseButton::Right));
        assert_eq!((input.mouse.x, input.mouse.y), (3, 4));
    }
}
