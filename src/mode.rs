//! Mode-specific command mapping
//!
//! Each locked mode interprets the same action gestures differently:
//! open hand turns things on or opens them, a fist does the opposite, and
//! pointing nudges a level up or down.

use crate::types::{ActionGesture, Command, Mode};

/// Maps (mode, action) pairs to device commands
pub struct CommandMapper;

impl CommandMapper {
    /// Resolve the command for an action in a locked mode.
    ///
    /// Returns `None` when the mode has no meaning for the gesture
    /// (e.g. pointing at the door, or pinch/mode-switch which are navigation).
    pub fn map_to_command(mode: Mode, action: ActionGesture) -> Option<Command> {
        let value = match (mode, action) {
            (Mode::Temperature, ActionGesture::OpenHand) => "AC_ON",
            (Mode::Temperature, ActionGesture::Fist) => "AC_OFF",
            (Mode::Temperature, ActionGesture::PointRight) => "UP",
            (Mode::Temperature, ActionGesture::PointLeft) => "DOWN",

            (Mode::Lights, ActionGesture::OpenHand) => "ON",
            (Mode::Lights, ActionGesture::Fist) => "OFF",
            (Mode::Lights, ActionGesture::PointRight) => "BRIGHT",
            (Mode::Lights, ActionGesture::PointLeft) => "DIM",

            // Sliding right opens further, sliding left closes further
            (Mode::Blinds, ActionGesture::OpenHand | ActionGesture::PointRight) => "OPEN",
            (Mode::Blinds, ActionGesture::Fist | ActionGesture::PointLeft) => "CLOSE",

            (Mode::Door, ActionGesture::OpenHand) => "UNLOCK",
            (Mode::Door, ActionGesture::Fist) => "LOCK",

            _ => return None,
        };

        Some(Command {
            category: mode,
            action: mode.as_str().to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn value(mode: Mode, action: ActionGesture) -> Option<String> {
        CommandMapper::map_to_command(mode, action).map(|c| c.value)
    }

    #[test]
    fn test_command_table() {
        use ActionGesture::*;

        let table = [
            (Mode::Temperature, [Some("AC_ON"), Some("AC_OFF"), Some("UP"), Some("DOWN")]),
            (Mode::Lights, [Some("ON"), Some("OFF"), Some("BRIGHT"), Some("DIM")]),
            (Mode::Blinds, [Some("OPEN"), Some("CLOSE"), Some("OPEN"), Some("CLOSE")]),
            (Mode::Door, [Some("UNLOCK"), Some("LOCK"), None, None]),
        ];

        for (mode, expected) in table {
            let actual = [OpenHand, Fist, PointRight, PointLeft].map(|a| value(mode, a));
            let expected = expected.map(|v| v.map(str::to_string));
            assert_eq!(actual, expected, "mode {mode}");
        }
    }

    #[test]
    fn test_navigation_gestures_are_not_commands() {
        for mode in Mode::ALL {
            assert_eq!(value(mode, ActionGesture::Pinch), None);
            assert_eq!(value(mode, ActionGesture::ModeSwitch), None);
        }
    }

    #[test]
    fn test_action_field_is_category() {
        let command = CommandMapper::map_to_command(Mode::Lights, ActionGesture::OpenHand).unwrap();
        assert_eq!(command.category, Mode::Lights);
        assert_eq!(command.action, "LIGHTS");
        assert_eq!(command.value, "ON");
    }
}
