use crate::trial::{Modality, Response};
use illusio_core::{InputEvent, Label, Phase, Stimulus, TrialPhase};

/// Result of feeding one event into a trial.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Pending(TrialMachine),
    Finalized(Response),
    Cancelled,
}

/// Pure per-trial state: `(state, event) -> state'`, no drawing, no clock.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialMachine {
    phase: TrialPhase,
    modality: Modality,
}

impl TrialMachine {
    pub fn new(modality: Modality) -> Self {
        Self {
            phase: TrialPhase::Fixation,
            modality,
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn modality(&self) -> &Modality {
        &self.modality
    }

    /// What should be on screen in the current phase.
    pub fn stimulus(&self) -> Stimulus {
        match self.phase {
            TrialPhase::Fixation => Stimulus::Fixation,
            _ => self.modality.stimulus(),
        }
    }

    /// Fixation delay is over; start collecting responses.
    pub fn fixation_elapsed(mut self) -> Self {
        if let (TrialPhase::Fixation, Some(next)) = (self.phase, self.phase.next()) {
            self.phase = next;
        }
        self
    }

    pub fn on_event(self, event: InputEvent) -> Transition {
        if event.is_cancel() {
            return Transition::Cancelled;
        }
        if !self.phase.allows_input() {
            return Transition::Pending(self);
        }

        let phase = self.phase;
        match (self.modality, event) {
            (Modality::Adjustment(a), InputEvent::Decrease) => Transition::Pending(Self {
                phase,
                modality: Modality::Adjustment(a.decrease()),
            }),
            (Modality::Adjustment(a), InputEvent::Increase) => Transition::Pending(Self {
                phase,
                modality: Modality::Adjustment(a.increase()),
            }),
            (Modality::Adjustment(a), InputEvent::Confirm) => {
                Transition::Finalized(Response::Adjusted(a))
            }
            (Modality::ForcedChoice(trial), InputEvent::ChoiceA) => {
                Transition::Finalized(Response::Chose {
                    trial,
                    label: Label::Top,
                })
            }
            (Modality::ForcedChoice(trial), InputEvent::ChoiceB) => {
                Transition::Finalized(Response::Chose {
                    trial,
                    label: Label::Bottom,
                })
            }
            (modality, _) => Transition::Pending(Self { phase, modality }),
        }
    }
}
