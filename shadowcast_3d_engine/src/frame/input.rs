/// Input commands delivered by the host

use bitflags::bitflags;

bitflags! {
    /// Movement and look commands currently held
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputCommands: u16 {
        const FORWARD = 1 << 0;
        const BACK = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
        const YAW_LEFT = 1 << 6;
        const YAW_RIGHT = 1 << 7;
        const PITCH_UP = 1 << 8;
        const PITCH_DOWN = 1 << 9;

        const MOVEMENT = Self::FORWARD.bits() | Self::BACK.bits()
            | Self::LEFT.bits() | Self::RIGHT.bits()
            | Self::UP.bits() | Self::DOWN.bits();
    }
}

impl InputCommands {
    /// +1 or -1 when exactly one of the pair is held, 0 otherwise
    pub fn axis(self, positive: InputCommands, negative: InputCommands) -> f32 {
        match (self.contains(positive), self.contains(negative)) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    pub fn any_movement(self) -> bool {
        self.intersects(InputCommands::MOVEMENT)
    }
}

/// One-shot toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleEvent {
    /// Switch between triangle and line primitives
    Wireframe,
    /// Switch between demo animation and keyboard control of the interactive node
    Interactive,
    /// Switch the spot light on or off
    SecondaryLight,
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
