/// Discrete input reported by the presentation layer, one poll cycle at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// Window closed or a hard quit signal.
    Quit,
    /// Operator escape.
    Cancel,
    Confirm,
    Increase,
    Decrease,
    ChoiceA,
    ChoiceB,
    Begin,
}

impl InputEvent {
    /// True for events that end the session regardless of trial state.
    pub fn is_cancel(&self) -> bool {
        matches!(self, InputEvent::Quit | InputEvent::Cancel)
    }

    /// True for events accepted on the instruction screen.
    pub fn starts_session(&self) -> bool {
        matches!(self, InputEvent::Begin | InputEvent::Confirm)
    }
}
