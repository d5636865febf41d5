use crate::error::PresentationError;
use illusio_core::{InputEvent, Stimulus};

/// Presentation and input surface the trial logic drives once per frame.
///
/// Implementations hold no experiment state: they draw what they are told
/// and hand back whatever input arrived since the last poll.
pub trait RenderInputPort {
    fn draw_stimulus(&mut self, stimulus: &Stimulus) -> Result<(), PresentationError>;

    fn draw_fixation(&mut self) -> Result<(), PresentationError> {
        self.draw_stimulus(&Stimulus::Fixation)
    }

    /// Events in arrival order. Must not block beyond one frame interval.
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, PresentationError>;

    /// Caps the cycle rate.
    fn tick(&mut self, target_hz: u32);

    /// Tears down the display. Called once at session end.
    fn release(&mut self);
}

impl<P: RenderInputPort + ?Sized> RenderInputPort for &mut P {
    fn draw_stimulus(&mut self, stimulus: &Stimulus) -> Result<(), PresentationError> {
        (**self).draw_stimulus(stimulus)
    }

    fn draw_fixation(&mut self) -> Result<(), PresentationError> {
        (**self).draw_fixation()
    }

    fn poll_events(&mut self) -> Result<Vec<InputEvent>, PresentationError> {
        (**self).poll_events()
    }

    fn tick(&mut self, target_hz: u32) {
        (**self).tick(target_hz)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
