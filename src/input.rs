use macroquad::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vertical {
    Up,
    Down,
}

/// Key state sampled once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub attack_left: bool,
    pub attack_right: bool,
    pub attack_up: bool,
    pub attack_down: bool,
    pub quit: bool,
}

impl InputState {
    /// WASD moves, arrow keys shoot, Escape quits.
    pub fn poll() -> Self {
        Self {
            move_left: is_key_down(KeyCode::A),
            move_right: is_key_down(KeyCode::D),
            move_up: is_key_down(KeyCode::W),
            move_down: is_key_down(KeyCode::S),
            attack_left: is_key_down(KeyCode::Left),
            attack_right: is_key_down(KeyCode::Right),
            attack_up: is_key_down(KeyCode::Up),
            attack_down: is_key_down(KeyCode::Down),
            quit: is_key_pressed(KeyCode::Escape),
        }
    }

    /// Opposite keys held together keep the previous heading.
    pub fn horizontal(&self, previous: Option<Horizontal>) -> Option<Horizontal> {
        match (self.move_left, self.move_right) {
            (true, false) => Some(Horizontal::Left),
            (false, true) => Some(Horizontal::Right),
            (false, false) => None,
            (true, true) => previous,
        }
    }

    pub fn vertical(&self, previous: Option<Vertical>) -> Option<Vertical> {
        match (self.move_up, self.move_down) {
            (true, false) => Some(Vertical::Up),
            (false, true) => Some(Vertical::Down),
            (false, false) => None,
            (true, true) => previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_keys_keep_heading() {
        let input = InputState {
            move_left: true,
            move_right: true,
            ..Default::default()
        };
        assert_eq!(
            input.horizontal(Some(Horizontal::Right)),
            Some(Horizontal::Right)
        );
        assert_eq!(input.vertical(Some(Vertical::Up)), None);
    }

    #[test]
    fn single_key_sets_heading() {
        let input = InputState {
            move_down: true,
            ..Default::default()
        };
        assert_eq!(input.vertical(None), Some(Vertical::Down));
        assert_eq!(input.horizontal(Some(Horizontal::Left)), None);
    }
}
