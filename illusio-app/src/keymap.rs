use illusio_core::InputEvent;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Fixed key bindings shared by both experiments.
pub fn translate(key: PhysicalKey) -> Option<InputEvent> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    Some(match code {
        KeyCode::Escape => InputEvent::Cancel,
        KeyCode::Space => InputEvent::Confirm,
        KeyCode::Enter | KeyCode::NumpadEnter => InputEvent::Begin,
        KeyCode::ArrowLeft => InputEvent::Decrease,
        KeyCode::ArrowRight => InputEvent::Increase,
        KeyCode::ArrowUp => InputEvent::ChoiceA,
        KeyCode::ArrowDown => InputEvent::ChoiceB,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NativeKeyCode;

    #[test]
    fn arrows_map_to_both_modalities() {
        let k = |c| translate(PhysicalKey::Code(c));
        assert_eq!(k(KeyCode::ArrowLeft), Some(InputEvent::Decrease));
        assert_eq!(k(KeyCode::ArrowRight), Some(InputEvent::Increase));
        assert_eq!(k(KeyCode::ArrowUp), Some(InputEvent::ChoiceA));
        assert_eq!(k(KeyCode::ArrowDown), Some(InputEvent::ChoiceB));
        assert_eq!(k(KeyCode::Space), Some(InputEvent::Confirm));
        assert_eq!(k(KeyCode::Escape), Some(InputEvent::Cancel));
        assert_eq!(k(KeyCode::KeyQ), None);
    }

    #[test]
    fn unidentified_keys_are_ignored() {
        assert_eq!(
            translate(PhysicalKey::Unidentified(NativeKeyCode::Unidentified)),
            None
        );
    }
}
