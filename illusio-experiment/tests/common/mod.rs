#![allow(dead_code)]

use illusio_core::{InputEvent, Stimulus};
use illusio_experiment::{PresentationError, RenderInputPort};
use illusio_timing::ManualTimer;
use std::collections::VecDeque;
use std::time::Duration;

/// Port that replays a fixed script of per-poll event batches and advances a
/// shared virtual clock on every tick. An exhausted script reports `Quit`.
pub struct ScriptedPort {
    pub timer: ManualTimer,
    pub script: VecDeque<Vec<InputEvent>>,
    pub drawn: Vec<Stimulus>,
    pub polls: usize,
    pub ticks: usize,
    pub released: bool,
    pub fail_on_draw: Option<usize>,
}

impl ScriptedPort {
    pub fn new(timer: &ManualTimer, script: Vec<Vec<InputEvent>>) -> Self {
        Self {
            timer: timer.clone(),
            script: script.into(),
            drawn: Vec::new(),
            polls: 0,
            ticks: 0,
            released: false,
            fail_on_draw: None,
        }
    }

    pub fn stimulus_frames(&self) -> usize {
        self.drawn
            .iter()
            .filter(|s| !matches!(s, Stimulus::Fixation | Stimulus::Text { .. }))
            .count()
    }
}

impl RenderInputPort for ScriptedPort {
    fn draw_stimulus(&mut self, stimulus: &Stimulus) -> Result<(), PresentationError> {
        if self.fail_on_draw == Some(self.drawn.len()) {
            return Err(PresentationError::Render("scripted failure".into()));
        }
        self.drawn.push(stimulus.clone());
        Ok(())
    }

    fn poll_events(&mut self) -> Result<Vec<InputEvent>, PresentationError> {
        self.polls += 1;
        Ok(self
            .script
            .pop_front()
            .unwrap_or_else(|| vec![InputEvent::Quit]))
    }

    fn tick(&mut self, target_hz: u32) {
        self.ticks += 1;
        self.timer
            .advance(Duration::from_nanos(1_000_000_000 / u64::from(target_hz)));
    }

    fn release(&mut self) {
        self.released = true;
    }
}

pub fn frame(hz: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(hz))
}
