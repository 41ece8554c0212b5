pub const KEY_COUNT: usize = 256;

/// Keyboard state sampled once per frame, with the previous frame's sample kept
/// for edge detection. Keys are indexed by Win32 virtual-key code.
pub struct Keyboard {
    keys: [bool; KEY_COUNT],
    keys_prev: [bool; KEY_COUNT],
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            keys: [false; KEY_COUNT],
            keys_prev: [false; KEY_COUNT],
        }
    }

    /// Replaces the current snapshot with `state`. A key is down when the high
    /// bit of its entry is set, as reported by `GetKeyboardState`.
    pub fn update(&mut self, state: &[u8; KEY_COUNT]) {
        self.keys_prev = self.keys;
        for (key, value) in self.keys.iter_mut().zip(state) {
            *key = value & 0x80 != 0;
        }
    }

    /// Clears the current snapshot, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys_prev = self.keys;
        self.keys = [false; KEY_COUNT];
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[key as usize]
    }

    pub fn is_triggered(&self, key: u8) -> bool {
        self.keys[key as usize] && !self.keys_prev[key as usize]
    }

    pub fn is_released(&self, key: u8) -> bool {
        !self.keys[key as usize] && self.keys_prev[key as usize]
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
pub fn poll(keyboard: &mut Keyboard) {
    use windows::Win32::UI::Input::KeyboardAndMouse::GetKeyboardState;

    let mut state = [0u8; KEY_COUNT];
    if let Err(e) = unsafe { GetKeyboardState(&mut state) } {
        tracing::debug!("GetKeyboardState failed: {e}");
        keyboard.release_all();
        return;
    }
    keyboard.update(&state);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPACE: u8 = 0x20;
    const ESCAPE: u8 = 0x1b;

    fn state_with(keys: &[u8]) -> [u8; KEY_COUNT] {
        let mut state = [0u8; KEY_COUNT];
        for &k in keys {
            state[k as usize] = 0x80;
        }
        state
    }

    #[test]
    fn trigger_fires_only_on_the_first_frame() {
        let mut keyboard = Keyboard::new();

        keyboard.update(&state_with(&[SPACE]));
        assert!(keyboard.is_pressed(SPACE));
        assert!(keyboard.is_triggered(SPACE));

        keyboard.update(&state_with(&[SPACE]));
        assert!(keyboard.is_pressed(SPACE));
        assert!(!keyboard.is_triggered(SPACE));

        keyboard.update(&state_with(&[]));
        assert!(!keyboard.is_pressed(SPACE));
        assert!(keyboard.is_released(SPACE));

        keyboard.update(&state_with(&[]));
        assert!(!keyboard.is_released(SPACE));
    }

    #[test]
    fn toggle_bit_alone_does_not_count_as_down() {
        let mut keyboard = Keyboard::new();
        let mut state = [0u8; KEY_COUNT];
        // low bit is the toggle state (e.g. caps lock), not "held"
        state[ESCAPE as usize] = 0x01;
        keyboard.update(&state);
        assert!(!keyboard.is_pressed(ESCAPE));
    }

    #[test]
    fn release_all_reports_releases() {
        let mut keyboard = Keyboard::new();
        keyboard.update(&state_with(&[SPACE, ESCAPE]));
        keyboard.release_all();
        assert!(keyboard.is_released(SPACE));
        assert!(keyboard.is_released(ESCAPE));
        assert!(!keyboard.is_pressed(SPACE));
    }
}
